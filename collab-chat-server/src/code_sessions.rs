use crate::errors::code_session_error::CodeSessionError;
use crate::models::transient::code_session::CodeSession;
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub enum JoinOutcome {
    Joined(CodeSession),
    AlreadyParticipant(CodeSession),
}

/// Live collaborative editing sessions keyed by session id
#[derive(Debug, Clone, Default)]
pub struct CodeSessions {
    sessions: Arc<Mutex<HashMap<String, CodeSession>>>,
}

pub fn placeholder_code(language: &str, comment_prefix: &str) -> String {
    format!(
        "{comment_prefix} Welcome to collaborative {language} coding!\n{comment_prefix} Start writing your code here...\n\n"
    )
}

impl CodeSessions {
    pub fn new() -> Self {
        CodeSessions::default()
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<String, CodeSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens a session owned by `owner` with `code` as its initial buffer
    pub fn create(&self, owner: &str, language: &str, code: String) -> CodeSession {
        let mut sessions = self.sessions();

        let session_id = loop {
            let guid = guid_create::GUID::rand().to_string().to_lowercase();
            let candidate = guid[..8].to_string();
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
        };

        let session = CodeSession {
            session_id: session_id.clone(),
            language: language.to_string(),
            code,
            participants: vec![owner.to_string()],
            owner: owner.to_string(),
            created_at: chrono::Utc::now().naive_utc(),
        };

        sessions.insert(session_id, session.clone());
        session
    }

    pub fn get(&self, session_id: &str) -> Option<CodeSession> {
        self.sessions().get(session_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions().is_empty()
    }

    pub fn join(&self, user: &str, session_id: &str) -> Result<JoinOutcome, CodeSessionError> {
        let mut sessions = self.sessions();
        let Some(session) = sessions.get_mut(session_id) else {
            return Err(CodeSessionError::SessionNotFound(session_id.to_string()));
        };

        if session.is_participant(user) {
            return Ok(JoinOutcome::AlreadyParticipant(session.clone()));
        }

        session.participants.push(user.to_string());
        Ok(JoinOutcome::Joined(session.clone()))
    }

    /// Replaces the buffer and returns the participants other than `sender`
    pub fn update(
        &self,
        sender: &str,
        session_id: &str,
        code: String,
    ) -> Result<Vec<String>, CodeSessionError> {
        let mut sessions = self.sessions();
        let Some(session) = sessions.get_mut(session_id) else {
            return Err(CodeSessionError::SessionNotFound(session_id.to_string()));
        };

        if !session.is_participant(sender) {
            return Err(CodeSessionError::NotAParticipant {
                user: sender.to_string(),
                session_id: session_id.to_string(),
            });
        }

        session.code = code;
        Ok(session
            .participants
            .iter()
            .filter(|participant| *participant != sender)
            .cloned()
            .collect())
    }

    /// Session as seen by one of its participants
    pub fn get_for(&self, user: &str, session_id: &str) -> Result<CodeSession, CodeSessionError> {
        let Some(session) = self.get(session_id) else {
            return Err(CodeSessionError::SessionNotFound(session_id.to_string()));
        };

        if !session.is_participant(user) {
            return Err(CodeSessionError::NotAParticipant {
                user: user.to_string(),
                session_id: session_id.to_string(),
            });
        }

        Ok(session)
    }

    /// Drops `user` from every session, destroying the ones left empty.
    /// Returns the sessions that still have participants.
    pub fn remove_participant_everywhere(&self, user: &str) -> Vec<CodeSession> {
        let mut sessions = self.sessions();
        let mut remaining = Vec::new();

        sessions.retain(|session_id, session| {
            let before = session.participants.len();
            session.participants.retain(|participant| participant != user);
            if session.participants.len() == before {
                return true;
            }

            if session.participants.is_empty() {
                debug!("Code session {session_id} is empty, removing it");
                return false;
            }

            remaining.push(session.clone());
            true
        });

        remaining
    }
}
