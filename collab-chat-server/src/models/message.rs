use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    Broadcast,
    Personal,
    Group,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Broadcast => "BROADCAST",
            MessageKind::Personal => "PERSONAL",
            MessageKind::Group => "GROUP",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = String;

    fn from_str(kind: &str) -> Result<Self, Self::Err> {
        match kind.trim().to_ascii_uppercase().as_str() {
            "BROADCAST" => Ok(MessageKind::Broadcast),
            "PERSONAL" => Ok(MessageKind::Personal),
            "GROUP" => Ok(MessageKind::Group),
            _ => Err(kind.to_string()),
        }
    }
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::messages)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Message {
    pub id: i32,
    pub sender: String,
    pub recipient: Option<String>,
    pub group_name: Option<String>,
    pub content: String,
    pub kind: String,
    pub timestamp: NaiveDateTime,
    pub file_ref: Option<String>,
}

/// A message about to be appended to the history
#[derive(Debug, Clone)]
pub struct NewMessage<'a> {
    pub sender: &'a str,
    pub kind: MessageKind,
    pub recipient: Option<&'a str>,
    pub group_name: Option<&'a str>,
    pub content: &'a str,
    pub file_ref: Option<&'a str>,
}

impl<'a> NewMessage<'a> {
    pub fn broadcast(sender: &'a str, content: &'a str) -> Self {
        NewMessage {
            sender,
            kind: MessageKind::Broadcast,
            recipient: None,
            group_name: None,
            content,
            file_ref: None,
        }
    }

    pub fn personal(sender: &'a str, recipient: &'a str, content: &'a str) -> Self {
        NewMessage {
            recipient: Some(recipient),
            kind: MessageKind::Personal,
            ..NewMessage::broadcast(sender, content)
        }
    }

    pub fn group(sender: &'a str, group_name: &'a str, content: &'a str) -> Self {
        NewMessage {
            group_name: Some(group_name),
            kind: MessageKind::Group,
            ..NewMessage::broadcast(sender, content)
        }
    }

    pub fn with_file(mut self, file_id: &'a str) -> Self {
        self.file_ref = Some(file_id);
        self
    }
}

/// Which slice of the history a GET_MESSAGES request asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryQuery {
    Broadcast,
    Personal { user: String, peer: String },
    Group(String),
}

impl HistoryQuery {
    pub fn kind(&self) -> MessageKind {
        match self {
            HistoryQuery::Broadcast => MessageKind::Broadcast,
            HistoryQuery::Personal { .. } => MessageKind::Personal,
            HistoryQuery::Group(_) => MessageKind::Group,
        }
    }
}
