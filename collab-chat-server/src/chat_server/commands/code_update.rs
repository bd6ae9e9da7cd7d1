use super::args::json_payload;
use super::traits::command::Command;
use crate::errors::command_error::CommandError;
use crate::event::{CodeSessionEvent, Event};
use crate::models::transient::session::SessionHandle;
use crate::state::AppState;
use log::{trace, warn};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
struct CodeUpdatePayload {
    session_id: String,
    #[serde(default)]
    code: String,
    #[serde(default)]
    cursor_pos: Option<Value>,
}

pub struct CodeUpdate {
    state: AppState,
}

impl CodeUpdate {
    pub fn new(state: AppState) -> Self {
        CodeUpdate { state }
    }
}

impl Command for CodeUpdate {
    async fn handle(&self, user: &SessionHandle, command: &str) -> Result<Vec<Event>, CommandError> {
        let payload: CodeUpdatePayload = json_payload("CODE_UPDATE", command)?;

        let others = match self.state.code_sessions.update(
            &user.name,
            &payload.session_id,
            payload.code.clone(),
        ) {
            Ok(others) => others,
            Err(error) => {
                warn!("Ignoring code update: {error}");
                return Ok(vec![]);
            }
        };

        let delivered = self.state.sessions.send_to_many(
            &others,
            &Event::CodeSession(CodeSessionEvent::CodeUpdate {
                session_id: payload.session_id.clone(),
                code: payload.code,
                user: user.name.to_string(),
                cursor_pos: payload.cursor_pos,
            }),
        );

        trace!(
            "Code update in {} relayed to {delivered} participants",
            payload.session_id
        );
        Ok(vec![])
    }
}
