use std::collections::HashMap;

use tiernotes_core::classify::heuristic::HeuristicClassifier;
use tiernotes_core::config_file::{load_from_path, merge};
use tiernotes_core::{ClassifierKind, Config, ConfigError, Tier, TierPolicy, build_classifier};

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn project_file_overrides_platform_file_then_env_wins() {
    let dir = tempfile::tempdir().unwrap();
    let platform = dir.path().join("platform.toml");
    let project = dir.path().join(".tiernotes.toml");
    std::fs::write(
        &platform,
        "[output]\ndir = \"/srv/notes\"\n\n[extraction]\nmax_pages = 4\n\n\
         [classifier]\npolicy = \"simple\"\n",
    )
    .unwrap();
    std::fs::write(&project, "[output]\ndir = \"notes_here\"\n").unwrap();

    let merged = merge(
        load_from_path(&platform).unwrap(),
        load_from_path(&project).unwrap(),
    );
    let mut config = Config::from_file(&merged).unwrap();
    assert_eq!(config.output.dir.to_str(), Some("notes_here"));
    assert_eq!(config.max_pages, 4);
    assert_eq!(config.heuristic.policy, TierPolicy::Simple);

    config
        .apply_env(env(&[
            ("TIERNOTES_MAX_PAGES", "9"),
            ("TIERNOTES_TIER_POLICY", "weighted"),
        ]))
        .unwrap();
    assert_eq!(config.max_pages, 9);
    assert_eq!(config.heuristic.policy, TierPolicy::Weighted);
    assert_eq!(config.output.dir.to_str(), Some("notes_here"));
}

#[test]
fn delegated_without_endpoint_is_rejected_at_startup() {
    let mut config = Config::default();
    config
        .apply_env(env(&[("TIERNOTES_CLASSIFIER", "delegated")]))
        .unwrap();
    assert_eq!(config.classifier, ClassifierKind::Delegated);
    assert!(matches!(
        build_classifier(&config),
        Err(ConfigError::MissingEndpoint)
    ));

    config
        .apply_env(env(&[("TIERNOTES_AI_ENDPOINT", "http://127.0.0.1:9/generate")]))
        .unwrap();
    assert_eq!(build_classifier(&config).unwrap().name(), "delegated");
}

#[test]
fn replaced_keywords_drive_the_heuristic() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[classifier]\nreplace_keywords = true\nhard_keywords = [\"eigenvalue\"]\n",
    )
    .unwrap();

    let config = Config::from_file(&load_from_path(&path).unwrap()).unwrap();
    let classifier = HeuristicClassifier::new(config.heuristic.clone());
    let buckets = classifier
        .buckets("The eigenvalue of this matrix is positive. The theory framework is long.");

    assert_eq!(buckets.get(Tier::Hard), ["The eigenvalue of this matrix is positive."]);
    assert!(
        !buckets
            .get(Tier::Hard)
            .iter()
            .any(|s| s.contains("theory framework"))
    );
}
