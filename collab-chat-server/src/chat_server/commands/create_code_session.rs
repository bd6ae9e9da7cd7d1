use super::args::split_args;
use super::traits::command::Command;
use crate::code_sessions::placeholder_code;
use crate::errors::command_error::CommandError;
use crate::event::{CodeSessionEvent, Event};
use crate::models::transient::session::SessionHandle;
use crate::state::AppState;
use log::info;

pub struct CreateCodeSession {
    state: AppState,
}

impl CreateCodeSession {
    pub fn new(state: AppState) -> Self {
        CreateCodeSession { state }
    }
}

impl Command for CreateCodeSession {
    async fn handle(&self, user: &SessionHandle, command: &str) -> Result<Vec<Event>, CommandError> {
        let args = split_args(command, 1);
        let language = args
            .first()
            .map(|language| language.trim().to_lowercase())
            .filter(|language| !language.is_empty())
            .unwrap_or_else(|| String::from("python"));

        let Some(definition) = self.state.executor.language(&language) else {
            return Err(CommandError::Reply(Event::code_session_error(format!(
                "Language \"{language}\" not supported"
            ))));
        };

        let code = placeholder_code(&language, &definition.comment_prefix);
        let session = self.state.code_sessions.create(&user.name, &language, code);
        info!(
            "{} opened {language} code session {}",
            user.name, session.session_id
        );

        Ok(vec![Event::CodeSession(CodeSessionEvent::SessionCreated {
            session_id: session.session_id,
            language: session.language,
            code: session.code,
        })])
    }
}
