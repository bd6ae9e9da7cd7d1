use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodeSessionError {
    #[error("Code session {0} not found")]
    SessionNotFound(String),
    #[error("{user} is not a participant of code session {session_id}")]
    NotAParticipant { user: String, session_id: String },
}
