//! Crate error type.

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("invalid payload: {0}")]
    Payload(String),

    #[error("xlsx write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("pptx package error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("render failed: {0}")]
    Render(String),

    #[error("document already finished")]
    Finished,
}

impl From<String> for ReportError {
    fn from(msg: String) -> Self {
        ReportError::Render(msg)
    }
}
