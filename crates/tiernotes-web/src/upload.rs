use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;

/// Form field carrying the document.
pub const FILE_FIELD: &str = "file";

/// An uploaded file with its data and metadata.
pub struct UploadedFile {
    pub filename: String,
    pub data: Vec<u8>,
}

/// A rejected upload and the status it maps to.
#[derive(Debug)]
pub struct UploadError {
    pub status: StatusCode,
    pub message: String,
}

impl UploadError {
    fn multipart(context: &str, e: MultipartError) -> Self {
        // Exceeding the body limit surfaces here as 413.
        Self {
            status: e.status(),
            message: format!("{}: {}", context, e.body_text()),
        }
    }
}

/// Pull the `file` field out of a multipart upload. Other fields are drained
/// and ignored.
///
/// Content is not inspected here; a non-PDF body is rejected by the pipeline.
pub async fn parse_multipart(mut multipart: Multipart) -> Result<UploadedFile, UploadError> {
    let mut file: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::multipart("Failed to read form field", e))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == FILE_FIELD {
            let filename = field.file_name().unwrap_or("upload.pdf").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| UploadError::multipart("Failed to read file data", e))?
                .to_vec();
            file = Some(UploadedFile { filename, data });
        } else {
            field
                .bytes()
                .await
                .map_err(|e| UploadError::multipart(&format!("Failed to read field '{name}'"), e))?;
        }
    }

    file.ok_or_else(|| UploadError {
        status: StatusCode::BAD_REQUEST,
        message: "No file uploaded".to_string(),
    })
}
