use serde::Serialize;

use tiernotes_core::EncodedNotes;

/// Body of a successful `POST /api/uploads`.
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub easy: String,
    pub medium: String,
    pub hard: String,
}

impl From<EncodedNotes> for UploadResponse {
    fn from(notes: EncodedNotes) -> Self {
        Self {
            message: "PDF processed and notes generated!".to_string(),
            easy: notes.easy,
            medium: notes.medium,
            hard: notes.hard,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub classifier: String,
}
