use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;

use crate::config::OutputOptions;
use crate::{RenderedNotes, Tier};

/// Base64-encoded notes plus where copies were written.
#[derive(Debug, Clone, Serialize)]
pub struct EncodedNotes {
    pub easy: String,
    pub medium: String,
    pub hard: String,
    /// `None` when writing the copies failed.
    pub output_dir: Option<PathBuf>,
}

/// Directory this run writes to: the configured one, or a fresh
/// `<dir>/<uuid>/` when per-request directories are enabled.
pub fn run_output_dir(options: &OutputOptions) -> PathBuf {
    if options.per_request_dirs {
        options.dir.join(uuid::Uuid::new_v4().to_string())
    } else {
        options.dir.clone()
    }
}

/// Write `easy.pdf`, `medium.pdf` and `hard.pdf` into `dir`, creating it if
/// needed and overwriting earlier runs.
pub fn persist(notes: &RenderedNotes, dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    for tier in Tier::ALL {
        std::fs::write(dir.join(tier.file_name()), notes.get(tier))?;
    }
    Ok(())
}

/// Persist the notes and encode them for the response payload.
///
/// Persistence is a side effect: a failure is logged and reported as
/// `output_dir: None` rather than failing the run.
pub fn persist_and_encode(notes: &RenderedNotes, options: &OutputOptions) -> EncodedNotes {
    let dir = run_output_dir(options);
    let output_dir = match persist(notes, &dir) {
        Ok(()) => {
            tracing::info!(dir = %dir.display(), "notes written");
            Some(dir)
        }
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "failed to write notes");
            None
        }
    };

    EncodedNotes {
        easy: STANDARD.encode(&notes.easy),
        medium: STANDARD.encode(&notes.medium),
        hard: STANDARD.encode(&notes.hard),
        output_dir,
    }
}
