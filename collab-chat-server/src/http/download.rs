use crate::errors::file_transfer_error::FileTransferError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::IntoResponse;
use log::debug;

pub(crate) async fn download(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<impl IntoResponse, FileTransferError> {
    let Some(file) = state.store.file(&file_id)? else {
        return Err(FileTransferError::FileNotFound(file_id));
    };

    debug!("Serving {} ({} bytes)", file.filename, file.size);

    let filename: String = file
        .filename
        .chars()
        .filter(|c| *c != '"' && !c.is_control())
        .collect();

    Ok((
        [
            (CONTENT_TYPE, file.mime_type),
            (
                CONTENT_DISPOSITION,
                format!(
                    "attachment; filename=\"{filename}\"; filename*=UTF-8''{}",
                    urlencoding::encode(&file.filename)
                ),
            ),
        ],
        file.content,
    ))
}
