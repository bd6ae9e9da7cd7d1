use super::traits::command::Command;
use crate::errors::command_error::CommandError;
use crate::event::{Event, UserGroups};
use crate::models::transient::session::SessionHandle;
use crate::state::AppState;

pub struct ListGroups {
    state: AppState,
}

impl ListGroups {
    pub fn new(state: AppState) -> Self {
        ListGroups { state }
    }
}

impl Command for ListGroups {
    async fn handle(&self, user: &SessionHandle, command: &str) -> Result<Vec<Event>, CommandError> {
        let _ = command;
        let groups = self.state.store.user_groups(&user.name)?;

        let notice = if groups.is_empty() {
            Event::notice("You are not a member of any groups")
        } else {
            Event::notice(format!("Your groups: {}", groups.join(", ")))
        };

        Ok(vec![notice, Event::UserGroups(UserGroups { groups })])
    }
}
