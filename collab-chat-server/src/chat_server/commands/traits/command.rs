use crate::errors::command_error::CommandError;
use crate::event::Event;
use crate::models::transient::session::SessionHandle;

pub(crate) trait Command {
    /// Handles one record from `user`, returning the replies for the caller's own connection
    async fn handle(&self, user: &SessionHandle, command: &str) -> Result<Vec<Event>, CommandError>;
}
