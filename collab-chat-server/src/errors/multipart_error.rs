use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MultipartError {
    #[error("Content-Type must be multipart/form-data with a boundary")]
    MissingBoundary,
    #[error("Body does not contain the boundary delimiter")]
    NoDelimiter,
    #[error("Part {0} has no header terminator")]
    MissingHeaders(usize),
    #[error("Part {0} has no Content-Disposition name")]
    MissingName(usize),
    #[error("Body ends before the closing boundary")]
    Unterminated,
}
