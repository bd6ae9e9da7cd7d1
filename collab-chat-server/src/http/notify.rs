use crate::event::{Event, FileNotification, format_timestamp};
use crate::models::shared_file::SharedFileInfo;
use crate::state::AppState;
use log::{error, info};

/// Tells the online users who can see `file` that it was uploaded
pub(crate) async fn notify_file_upload(state: AppState, file: SharedFileInfo) {
    let event = Event::FileNotification(FileNotification {
        download_url: file.download_url(),
        timestamp: format_timestamp(&file.timestamp),
        file_id: file.file_id.clone(),
        filename: file.filename.clone(),
        sender: file.sender.clone(),
        recipient: file.recipient.clone(),
        group_name: file.group_name.clone(),
        file_size: file.size,
        mime_type: file.mime_type.clone(),
    });

    let delivered = if let Some(group) = &file.group_name {
        match state.store.group_members(group) {
            Ok(members) => state.sessions.send_to_many(&members, &event),
            Err(error) => {
                error!("Could not get members of {group} to announce {}: {error}", file.file_id);
                return;
            }
        }
    } else if let Some(recipient) = &file.recipient {
        let mut targets = vec![recipient.clone()];
        if *recipient != file.sender {
            targets.push(file.sender.clone());
        }
        state.sessions.send_to_many(&targets, &event)
    } else {
        state.sessions.send_to_all(&event, None)
    };

    info!("Announced {} to {delivered} sessions", file.file_id);
}
