use super::traits::command::Command;
use crate::errors::command_error::CommandError;
use crate::event::Event;
use crate::models::transient::session::SessionHandle;
use crate::state::AppState;

pub struct ListClients {
    state: AppState,
}

impl ListClients {
    pub fn new(state: AppState) -> Self {
        ListClients { state }
    }
}

impl Command for ListClients {
    async fn handle(&self, user: &SessionHandle, command: &str) -> Result<Vec<Event>, CommandError> {
        let _ = (user, command);
        let names = self.state.sessions.list_names();

        Ok(vec![
            Event::notice(format!("Connected clients: {}", names.join(", "))),
            self.state.user_list(),
        ])
    }
}
