use super::args::{required, split_args};
use super::traits::command::Command;
use crate::code_sessions::JoinOutcome;
use crate::errors::command_error::CommandError;
use crate::event::{CodeSessionEvent, Event};
use crate::models::transient::session::SessionHandle;
use crate::state::AppState;
use log::{debug, warn};

pub struct JoinCodeSession {
    state: AppState,
}

impl JoinCodeSession {
    pub fn new(state: AppState) -> Self {
        JoinCodeSession { state }
    }
}

impl Command for JoinCodeSession {
    async fn handle(&self, user: &SessionHandle, command: &str) -> Result<Vec<Event>, CommandError> {
        let args = split_args(command, 1);
        let session_id = required(&args, 0, "JOIN_CODE_SESSION", "session_id")?.trim();

        let session = match self.state.code_sessions.join(&user.name, session_id) {
            Ok(JoinOutcome::Joined(session)) => session,
            Ok(JoinOutcome::AlreadyParticipant(_)) => {
                debug!("{} is already in code session {session_id}", user.name);
                return Ok(vec![]);
            }
            Err(error) => {
                warn!("{error}");
                return Err(CommandError::Reply(Event::code_session_error(
                    "Code session not found",
                )));
            }
        };

        let others: Vec<String> = session
            .participants
            .iter()
            .filter(|participant| participant.as_str() != user.name.as_str())
            .cloned()
            .collect();

        self.state.sessions.send_to_many(
            &others,
            &Event::CodeSession(CodeSessionEvent::UserJoined {
                session_id: session.session_id.clone(),
                user: user.name.to_string(),
                participants: session.participants.clone(),
            }),
        );

        Ok(vec![Event::CodeSession(CodeSessionEvent::SessionJoined {
            session_id: session.session_id,
            language: session.language,
            code: session.code,
            participants: session.participants,
        })])
    }
}
