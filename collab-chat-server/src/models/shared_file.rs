use crate::event::{FileEntry, format_timestamp};
use chrono::NaiveDateTime;
use diesel::prelude::*;

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::shared_files)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SharedFile {
    pub id: i32,
    pub file_id: String,
    pub filename: String,
    pub content: Vec<u8>,
    pub size: i64,
    pub mime_type: String,
    pub sender: String,
    pub recipient: Option<String>,
    pub group_name: Option<String>,
    pub timestamp: NaiveDateTime,
}

/// Everything about a shared file except its bytes
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::shared_files)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SharedFileInfo {
    pub file_id: String,
    pub filename: String,
    pub size: i64,
    pub mime_type: String,
    pub sender: String,
    pub recipient: Option<String>,
    pub group_name: Option<String>,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewSharedFile<'a> {
    pub file_id: &'a str,
    pub filename: &'a str,
    pub content: &'a [u8],
    pub mime_type: &'a str,
    pub sender: &'a str,
    pub recipient: Option<&'a str>,
    pub group_name: Option<&'a str>,
}

impl SharedFileInfo {
    /// Path of the file on the side-channel, relative to its base URL
    pub fn download_url(&self) -> String {
        format!("/download/{}", self.file_id)
    }
}

impl From<SharedFileInfo> for FileEntry {
    fn from(file: SharedFileInfo) -> Self {
        FileEntry {
            download_url: file.download_url(),
            file_id: file.file_id,
            filename: file.filename,
            sender: file.sender,
            recipient: file.recipient,
            group_name: file.group_name,
            file_size: file.size,
            mime_type: file.mime_type,
            timestamp: format_timestamp(&file.timestamp),
        }
    }
}
