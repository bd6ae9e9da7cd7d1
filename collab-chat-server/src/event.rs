use crate::errors::protocol_parse_error::ProtocolParseError;
use crate::executor::ExecutionResult;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServerInfo {
    pub supported_languages: Vec<String>,
    pub active_users: Vec<String>,
    pub http_port: u16,
    pub file_upload_url: String,
    pub file_download_url: String,
    pub file_list_url: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserList {
    pub users: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserGroups {
    pub groups: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GroupCreated {
    pub group_name: String,
    pub creator: String,
    pub members: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub sender: String,
    pub content: String,
    pub timestamp: String,
    pub file_ref: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MessageHistory {
    pub msg_type: String,
    pub target: Option<String>,
    pub messages: Vec<HistoryEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FileNotification {
    pub file_id: String,
    pub filename: String,
    pub sender: String,
    pub recipient: Option<String>,
    pub group_name: Option<String>,
    pub file_size: i64,
    pub mime_type: String,
    pub download_url: String,
    pub timestamp: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub file_id: String,
    pub filename: String,
    pub sender: String,
    pub recipient: Option<String>,
    pub group_name: Option<String>,
    pub file_size: i64,
    pub mime_type: String,
    pub download_url: String,
    pub timestamp: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FileList {
    pub files: Vec<FileEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FileDeleteResponse {
    pub file_id: String,
    pub success: bool,
}

/// Events carried by `CODE_SESSION` records, discriminated by their JSON `type`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CodeSessionEvent {
    SessionCreated {
        session_id: String,
        language: String,
        code: String,
    },
    SessionJoined {
        session_id: String,
        language: String,
        code: String,
        participants: Vec<String>,
    },
    UserJoined {
        session_id: String,
        user: String,
        participants: Vec<String>,
    },
    UserLeft {
        session_id: String,
        user: String,
        participants: Vec<String>,
    },
    CodeUpdate {
        session_id: String,
        code: String,
        user: String,
        #[serde(default)]
        cursor_pos: Option<Value>,
    },
    ExecutionResult {
        session_id: String,
        result: ExecutionResult,
        executed_by: String,
    },
    CodeInvitation {
        from: String,
        session_id: String,
        language: String,
    },
    Error {
        message: String,
    },
}

impl CodeSessionEvent {
    pub fn error(message: impl Into<String>) -> Self {
        CodeSessionEvent::Error {
            message: message.into(),
        }
    }
}

/// Human readable lines shown as-is by clients
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatLine {
    Broadcast {
        sender: String,
        text: String,
    },
    PersonalFrom {
        sender: String,
        text: String,
    },
    PersonalTo {
        recipient: String,
        text: String,
    },
    Group {
        group: String,
        sender: String,
        text: String,
    },
    Server(String),
}

impl fmt::Display for ChatLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatLine::Broadcast { sender, text } => write!(f, "{sender}: {text}"),
            ChatLine::PersonalFrom { sender, text } => write!(f, "PM from {sender}: {text}"),
            ChatLine::PersonalTo { recipient, text } => write!(f, "PM to {recipient}: {text}"),
            ChatLine::Group {
                group,
                sender,
                text,
            } => write!(f, "[{group}] {sender}: {text}"),
            ChatLine::Server(text) => write!(f, "SERVER: {text}"),
        }
    }
}

impl ChatLine {
    fn parse(record: &str) -> Option<Self> {
        if let Some(text) = record.strip_prefix("SERVER: ") {
            return Some(ChatLine::Server(text.to_string()));
        }

        if let Some(rest) = record.strip_prefix("PM from ") {
            let (sender, text) = rest.split_once(": ")?;
            return Some(ChatLine::PersonalFrom {
                sender: sender.to_string(),
                text: text.to_string(),
            });
        }

        if let Some(rest) = record.strip_prefix("PM to ") {
            let (recipient, text) = rest.split_once(": ")?;
            return Some(ChatLine::PersonalTo {
                recipient: recipient.to_string(),
                text: text.to_string(),
            });
        }

        if let Some(rest) = record.strip_prefix('[') {
            let (group, rest) = rest.split_once("] ")?;
            let (sender, text) = rest.split_once(": ")?;
            return Some(ChatLine::Group {
                group: group.to_string(),
                sender: sender.to_string(),
                text: text.to_string(),
            });
        }

        let (sender, text) = record.split_once(": ")?;
        Some(ChatLine::Broadcast {
            sender: sender.to_string(),
            text: text.to_string(),
        })
    }
}

/// Everything the server writes to a control connection
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Connected,
    NameTaken,
    NameInvalid,
    ServerInfo(ServerInfo),
    UserList(UserList),
    UserGroups(UserGroups),
    GroupCreated(GroupCreated),
    MessageHistory(MessageHistory),
    FileNotification(FileNotification),
    FileList(FileList),
    FileDeleteResponse(FileDeleteResponse),
    CodeSession(CodeSessionEvent),
    Chat(ChatLine),
}

impl Event {
    pub fn notice(text: impl Into<String>) -> Self {
        Event::Chat(ChatLine::Server(text.into()))
    }

    pub fn code_session_error(message: impl Into<String>) -> Self {
        Event::CodeSession(CodeSessionEvent::error(message))
    }

    /// Record type written before the first `|`, if the event has one
    pub fn kind(&self) -> Option<&'static str> {
        Some(match self {
            Event::Connected => "CONNECTED",
            Event::NameTaken => "NAME_TAKEN",
            Event::NameInvalid => "NAME_INVALID",
            Event::ServerInfo(_) => "SERVER_INFO",
            Event::UserList(_) => "USER_LIST",
            Event::UserGroups(_) => "USER_GROUPS",
            Event::GroupCreated(_) => "GROUP_CREATED",
            Event::MessageHistory(_) => "MESSAGE_HISTORY",
            Event::FileNotification(_) => "FILE_NOTIFICATION",
            Event::FileList(_) => "FILE_LIST",
            Event::FileDeleteResponse(_) => "FILE_DELETE_RESPONSE",
            Event::CodeSession(_) => "CODE_SESSION",
            Event::Chat(_) => return None,
        })
    }

    /// Renders the event as an unescaped record
    pub fn encode(&self) -> String {
        let payload = match self {
            Event::Connected | Event::NameTaken | Event::NameInvalid => {
                return self.kind().unwrap_or_default().to_string();
            }
            Event::Chat(line) => return line.to_string(),
            Event::ServerInfo(info) => serde_json::to_string(info),
            Event::UserList(list) => serde_json::to_string(list),
            Event::UserGroups(groups) => serde_json::to_string(groups),
            Event::GroupCreated(group) => serde_json::to_string(group),
            Event::MessageHistory(history) => serde_json::to_string(history),
            Event::FileNotification(notification) => serde_json::to_string(notification),
            Event::FileList(list) => serde_json::to_string(list),
            Event::FileDeleteResponse(response) => serde_json::to_string(response),
            Event::CodeSession(event) => serde_json::to_string(event),
        };

        // Derived serializers over strings and numbers cannot fail
        let payload = payload.unwrap_or_else(|_| String::from("{}"));
        format!("{}|{payload}", self.kind().unwrap_or_default())
    }

    /// Parses a record written by `encode` back into an event
    pub fn decode(record: &str) -> Result<Self, ProtocolParseError> {
        match record {
            "CONNECTED" => return Ok(Event::Connected),
            "NAME_TAKEN" => return Ok(Event::NameTaken),
            "NAME_INVALID" => return Ok(Event::NameInvalid),
            _ => (),
        }

        if let Some((kind, payload)) = record.split_once('|') {
            let event = match kind {
                "SERVER_INFO" => parse_payload("SERVER_INFO", payload).map(Event::ServerInfo),
                "USER_LIST" => parse_payload("USER_LIST", payload).map(Event::UserList),
                "USER_GROUPS" => parse_payload("USER_GROUPS", payload).map(Event::UserGroups),
                "GROUP_CREATED" => {
                    parse_payload("GROUP_CREATED", payload).map(Event::GroupCreated)
                }
                "MESSAGE_HISTORY" => {
                    parse_payload("MESSAGE_HISTORY", payload).map(Event::MessageHistory)
                }
                "FILE_NOTIFICATION" => {
                    parse_payload("FILE_NOTIFICATION", payload).map(Event::FileNotification)
                }
                "FILE_LIST" => parse_payload("FILE_LIST", payload).map(Event::FileList),
                "FILE_DELETE_RESPONSE" => {
                    parse_payload("FILE_DELETE_RESPONSE", payload).map(Event::FileDeleteResponse)
                }
                "CODE_SESSION" => parse_payload("CODE_SESSION", payload).map(Event::CodeSession),
                _ => return parse_chat_line(record),
            };

            return event;
        }

        parse_chat_line(record)
    }
}

fn parse_chat_line(record: &str) -> Result<Event, ProtocolParseError> {
    ChatLine::parse(record)
        .map(Event::Chat)
        .ok_or_else(|| ProtocolParseError::UnknownEvent(record.to_string()))
}

fn parse_payload<T: serde::de::DeserializeOwned>(
    command: &'static str,
    payload: &str,
) -> Result<T, ProtocolParseError> {
    serde_json::from_str(payload)
        .map_err(|source| ProtocolParseError::InvalidPayload { command, source })
}

pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub const MAX_NAME_LENGTH: usize = 64;

/// Checks a display name or group name for characters the record format reserves
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().count() <= MAX_NAME_LENGTH
        && name != "SERVER"
        && !name
            .chars()
            .any(|c| matches!(c, '|' | ',' | ':' | '[' | ']') || c.is_control())
}
