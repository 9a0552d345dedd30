use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub server: Option<ServerConfig>,
    pub classifier: Option<ClassifierConfig>,
    pub output: Option<OutputConfig>,
    pub extraction: Option<ExtractionConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: Option<String>,
    pub cors_origin: Option<String>,
    pub max_upload_mb: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// "heuristic" or "delegated".
    pub strategy: Option<String>,
    /// "weighted" or "simple".
    pub policy: Option<String>,
    pub min_sentence_len: Option<usize>,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_input_chars: Option<usize>,
    pub easy_keywords: Option<Vec<String>>,
    pub medium_keywords: Option<Vec<String>>,
    pub hard_keywords: Option<Vec<String>>,
    /// When true the keyword lists above replace the defaults instead of
    /// extending them.
    pub replace_keywords: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub dir: Option<String>,
    pub per_request_dirs: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub max_pages: Option<usize>,
}

/// Platform config directory path: `<config_dir>/tiernotes/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tiernotes").join("config.toml"))
}

/// Load config by cascading CWD `.tiernotes.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".tiernotes.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable config file");
            None
        }
    }
}

/// Overlay's field if set, otherwise base's.
fn pick<S, T>(overlay: &Option<S>, base: &Option<S>, field: impl Fn(&S) -> Option<T>) -> Option<T> {
    overlay
        .as_ref()
        .and_then(&field)
        .or_else(|| base.as_ref().and_then(&field))
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let (bs, os) = (&base.server, &overlay.server);
    let (bc, oc) = (&base.classifier, &overlay.classifier);
    let (bo, oo) = (&base.output, &overlay.output);
    let (be, oe) = (&base.extraction, &overlay.extraction);

    ConfigFile {
        server: Some(ServerConfig {
            bind: pick(os, bs, |s| s.bind.clone()),
            cors_origin: pick(os, bs, |s| s.cors_origin.clone()),
            max_upload_mb: pick(os, bs, |s| s.max_upload_mb),
        }),
        classifier: Some(ClassifierConfig {
            strategy: pick(oc, bc, |c| c.strategy.clone()),
            policy: pick(oc, bc, |c| c.policy.clone()),
            min_sentence_len: pick(oc, bc, |c| c.min_sentence_len),
            endpoint: pick(oc, bc, |c| c.endpoint.clone()),
            api_key: pick(oc, bc, |c| c.api_key.clone()),
            model: pick(oc, bc, |c| c.model.clone()),
            timeout_secs: pick(oc, bc, |c| c.timeout_secs),
            max_input_chars: pick(oc, bc, |c| c.max_input_chars),
            easy_keywords: pick(oc, bc, |c| c.easy_keywords.clone()),
            medium_keywords: pick(oc, bc, |c| c.medium_keywords.clone()),
            hard_keywords: pick(oc, bc, |c| c.hard_keywords.clone()),
            replace_keywords: pick(oc, bc, |c| c.replace_keywords),
        }),
        output: Some(OutputConfig {
            dir: pick(oo, bo, |o| o.dir.clone()),
            per_request_dirs: pick(oo, bo, |o| o.per_request_dirs),
        }),
        extraction: Some(ExtractionConfig {
            max_pages: pick(oe, be, |e| e.max_pages),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_parses() {
        let toml_str = "[classifier]\nstrategy = \"delegated\"\nendpoint = \"http://localhost:8080/generate\"\n";
        let parsed: ConfigFile = toml::from_str(toml_str).unwrap();
        let classifier = parsed.classifier.unwrap();
        assert_eq!(classifier.strategy.as_deref(), Some("delegated"));
        assert!(classifier.policy.is_none());
        assert!(parsed.output.is_none());
    }

    #[test]
    fn merge_overlay_wins() {
        let base = ConfigFile {
            output: Some(OutputConfig {
                dir: Some("/base/notes".to_string()),
                per_request_dirs: Some(true),
            }),
            ..Default::default()
        };
        let overlay = ConfigFile {
            output: Some(OutputConfig {
                dir: Some("/overlay/notes".to_string()),
                per_request_dirs: None,
            }),
            ..Default::default()
        };
        let merged = merge(base, overlay).output.unwrap();
        assert_eq!(merged.dir.as_deref(), Some("/overlay/notes"));
        // Unset overlay fields keep the base value.
        assert_eq!(merged.per_request_dirs, Some(true));
    }

    #[test]
    fn merge_base_preserved_when_overlay_absent() {
        let base = ConfigFile {
            extraction: Some(ExtractionConfig { max_pages: Some(5) }),
            ..Default::default()
        };
        let merged = merge(base, ConfigFile::default());
        assert_eq!(merged.extraction.unwrap().max_pages, Some(5));
    }

    #[test]
    fn keyword_lists_round_trip_toml() {
        let config = ConfigFile {
            classifier: Some(ClassifierConfig {
                hard_keywords: Some(vec!["eigenvalue".to_string()]),
                ..Default::default()
            }),
            ..Default::default()
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: ConfigFile = toml::from_str(&toml_str).unwrap();
        assert_eq!(
            parsed.classifier.unwrap().hard_keywords.unwrap(),
            vec!["eigenvalue".to_string()]
        );
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_from_path(&dir.path().join("absent.toml")).is_none());
    }

    #[test]
    fn unparseable_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();
        assert!(load_from_path(&path).is_none());
    }
}
