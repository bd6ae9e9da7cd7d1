use super::multipart::{self, UploadForm};
use super::notify::notify_file_upload;
use crate::errors::file_transfer_error::FileTransferError;
use crate::models::message::NewMessage;
use crate::models::shared_file::NewSharedFile;
use crate::state::AppState;
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::CONTENT_TYPE;
use log::info;
use serde::Serialize;

#[derive(Serialize)]
pub struct UploadResponse {
    status: &'static str,
    file_id: String,
    filename: String,
    download_url: String,
}

pub(crate) async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<UploadResponse>, FileTransferError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    let boundary = multipart::boundary(content_type)?;
    let form = UploadForm::from_parts(multipart::parse(&body, &boundary)?)?;

    if let Some(group) = &form.group_name {
        if !state.store.group_exists(group)? {
            return Err(FileTransferError::GroupNotFound(group.clone()));
        }

        if !state.store.is_member(group, &form.sender)? {
            return Err(FileTransferError::NotAMember {
                user: form.sender,
                group: group.clone(),
            });
        }
    }

    let file_id = guid_create::GUID::rand().to_string().to_lowercase();
    let mime_type = mime_guess::from_path(&form.filename)
        .first_or_octet_stream()
        .to_string();

    let content = format!("shared a file: {}", form.filename);
    let message = match (&form.group_name, &form.recipient) {
        (Some(group), _) => NewMessage::group(&form.sender, group, &content),
        (None, Some(recipient)) => NewMessage::personal(&form.sender, recipient, &content),
        (None, None) => NewMessage::broadcast(&form.sender, &content),
    };

    let file = state.store.share_file(
        &NewSharedFile {
            file_id: &file_id,
            filename: &form.filename,
            content: &form.content,
            mime_type: &mime_type,
            sender: &form.sender,
            recipient: form.recipient.as_deref(),
            group_name: form.group_name.as_deref(),
        },
        message,
    )?;

    info!(
        "{} uploaded {} ({} bytes) as {file_id}",
        form.sender, form.filename, file.size
    );

    let download_url = file.download_url();
    tokio::spawn(notify_file_upload(state.clone(), file));

    Ok(Json(UploadResponse {
        status: "success",
        download_url,
        file_id,
        filename: form.filename,
    }))
}
