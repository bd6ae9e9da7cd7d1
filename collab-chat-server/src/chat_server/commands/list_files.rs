use super::traits::command::Command;
use crate::errors::command_error::CommandError;
use crate::event::{Event, FileEntry, FileList};
use crate::models::transient::session::SessionHandle;
use crate::state::AppState;

pub struct ListFiles {
    state: AppState,
}

impl ListFiles {
    pub fn new(state: AppState) -> Self {
        ListFiles { state }
    }
}

impl Command for ListFiles {
    async fn handle(&self, user: &SessionHandle, command: &str) -> Result<Vec<Event>, CommandError> {
        let _ = command;
        let files = self
            .state
            .store
            .files_visible_to(&user.name)?
            .into_iter()
            .map(FileEntry::from)
            .collect();

        Ok(vec![Event::FileList(FileList { files })])
    }
}
