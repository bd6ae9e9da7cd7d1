use super::args::json_payload;
use super::traits::command::Command;
use crate::errors::command_error::CommandError;
use crate::event::{CodeSessionEvent, Event};
use crate::models::transient::session::SessionHandle;
use crate::state::AppState;
use log::{debug, warn};
use serde::Deserialize;

#[derive(Deserialize)]
struct InvitePayload {
    recipient: String,
    session_id: String,
}

pub struct InviteToCode {
    state: AppState,
}

impl InviteToCode {
    pub fn new(state: AppState) -> Self {
        InviteToCode { state }
    }
}

impl Command for InviteToCode {
    async fn handle(&self, user: &SessionHandle, command: &str) -> Result<Vec<Event>, CommandError> {
        let payload: InvitePayload = json_payload("INVITE_TO_CODE", command)?;

        let Some(session) = self.state.code_sessions.get(&payload.session_id) else {
            return Err(CommandError::Reply(Event::code_session_error(
                "Code session not found",
            )));
        };

        let invitation = Event::CodeSession(CodeSessionEvent::CodeInvitation {
            from: user.name.to_string(),
            session_id: session.session_id,
            language: session.language,
        });

        if let Err(error) = self.state.sessions.send_to(&payload.recipient, invitation) {
            warn!("Could not invite {}: {error}", payload.recipient);
            return Err(CommandError::Reply(Event::code_session_error(format!(
                "User '{}' not found or offline",
                payload.recipient
            ))));
        }

        debug!(
            "{} invited {} to {}",
            user.name, payload.recipient, payload.session_id
        );
        Ok(vec![])
    }
}
