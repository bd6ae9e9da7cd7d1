use super::args::json_payload;
use super::traits::command::Command;
use crate::errors::command_error::CommandError;
use crate::event::{CodeSessionEvent, Event};
use crate::models::transient::session::SessionHandle;
use crate::state::AppState;
use log::{info, warn};
use serde::Deserialize;

#[derive(Deserialize)]
struct ExecuteCodePayload {
    session_id: String,
    language: Option<String>,
    code: Option<String>,
    #[serde(default)]
    input: String,
}

pub struct ExecuteCode {
    state: AppState,
}

impl ExecuteCode {
    pub fn new(state: AppState) -> Self {
        ExecuteCode { state }
    }
}

impl Command for ExecuteCode {
    async fn handle(&self, user: &SessionHandle, command: &str) -> Result<Vec<Event>, CommandError> {
        let payload: ExecuteCodePayload = json_payload("EXECUTE_CODE", command)?;

        let session = match self
            .state
            .code_sessions
            .get_for(&user.name, &payload.session_id)
        {
            Ok(session) => session,
            Err(error) => {
                warn!("Refusing execution: {error}");
                return Err(CommandError::Reply(Event::code_session_error(
                    error.to_string(),
                )));
            }
        };

        let code = payload.code.unwrap_or(session.code);
        let language = payload.language.unwrap_or(session.language);
        let executed_by = user.name.to_string();
        let session_id = session.session_id;
        let state = self.state.clone();

        info!("{executed_by} is running {language} code in session {session_id}");

        // Runs on its own task so the connection keeps serving while the program runs
        tokio::spawn(async move {
            let result = state.executor.run(&code, &language, &payload.input).await;
            info!(
                "Execution in {session_id} finished in {:.2}s, success: {}",
                result.duration, result.success
            );

            // Participants may have changed while the program ran
            let Some(session) = state.code_sessions.get(&session_id) else {
                return;
            };

            state.sessions.send_to_many(
                &session.participants,
                &Event::CodeSession(CodeSessionEvent::ExecutionResult {
                    session_id: session_id.clone(),
                    result,
                    executed_by,
                }),
            );
        });

        Ok(vec![])
    }
}
