use crate::errors::multipart_error::MultipartError;
use crate::errors::store_error::StoreError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::{error, warn};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileTransferError {
    #[error("Upload malformed: {0}")]
    UploadMalformed(#[from] MultipartError),
    #[error("Missing required fields: file, filename, or sender")]
    MissingFields,
    #[error("File {0} not found")]
    FileNotFound(String),
    #[error("User parameter required")]
    MissingUser,
    #[error("Group {0} not found")]
    GroupNotFound(String),
    #[error("{user} is not a member of group {group}")]
    NotAMember { user: String, group: String },
    #[error("Store failure: {0}")]
    Store(#[from] StoreError),
}

impl FileTransferError {
    pub fn status(&self) -> StatusCode {
        match self {
            FileTransferError::UploadMalformed(_)
            | FileTransferError::MissingFields
            | FileTransferError::MissingUser => StatusCode::BAD_REQUEST,
            FileTransferError::FileNotFound(_) | FileTransferError::GroupNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            FileTransferError::NotAMember { .. } => StatusCode::FORBIDDEN,
            FileTransferError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for FileTransferError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{self}");
            return (status, Json(String::from("Could not complete request"))).into_response();
        }

        warn!("{self}");
        (status, Json(self.to_string())).into_response()
    }
}
