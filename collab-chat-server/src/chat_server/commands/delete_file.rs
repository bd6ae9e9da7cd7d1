use super::args::{required, split_args};
use super::traits::command::Command;
use crate::errors::command_error::CommandError;
use crate::event::{Event, FileDeleteResponse};
use crate::models::transient::session::SessionHandle;
use crate::state::AppState;
use log::info;

pub struct DeleteFile {
    state: AppState,
}

impl DeleteFile {
    pub fn new(state: AppState) -> Self {
        DeleteFile { state }
    }
}

impl Command for DeleteFile {
    async fn handle(&self, user: &SessionHandle, command: &str) -> Result<Vec<Event>, CommandError> {
        let args = split_args(command, 1);
        let file_id = required(&args, 0, "DELETE_FILE", "file_id")?.trim();

        let success = self.state.store.delete_file(file_id, &user.name)?;
        info!(
            "{} {} file {file_id}",
            user.name,
            if success { "deleted" } else { "could not delete" }
        );

        Ok(vec![Event::FileDeleteResponse(FileDeleteResponse {
            file_id: file_id.to_string(),
            success,
        })])
    }
}
