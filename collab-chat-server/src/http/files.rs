use crate::errors::file_transfer_error::FileTransferError;
use crate::event::FileEntry;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct FilesQuery {
    user: Option<String>,
}

#[derive(Serialize)]
pub struct FilesResponse {
    status: &'static str,
    files: Vec<FileEntry>,
}

pub(crate) async fn files(
    State(state): State<AppState>,
    Query(query): Query<FilesQuery>,
) -> Result<Json<FilesResponse>, FileTransferError> {
    let Some(user) = query.user.filter(|user| !user.trim().is_empty()) else {
        return Err(FileTransferError::MissingUser);
    };

    let files = state
        .store
        .files_visible_to(&user)?
        .into_iter()
        .map(FileEntry::from)
        .collect();

    Ok(Json(FilesResponse {
        status: "success",
        files,
    }))
}
