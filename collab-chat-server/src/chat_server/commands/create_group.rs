use super::args::{required, split_args};
use super::traits::command::Command;
use crate::errors::command_error::CommandError;
use crate::errors::store_error::StoreError;
use crate::event::{Event, GroupCreated, is_valid_name};
use crate::models::transient::session::SessionHandle;
use crate::state::AppState;
use log::info;

pub struct CreateGroup {
    state: AppState,
}

impl CreateGroup {
    pub fn new(state: AppState) -> Self {
        CreateGroup { state }
    }
}

impl Command for CreateGroup {
    async fn handle(&self, user: &SessionHandle, command: &str) -> Result<Vec<Event>, CommandError> {
        let args = split_args(command, 2);
        let group = required(&args, 0, "CREATE_GROUP", "group")?.trim();
        let creator = user.name.as_str();

        if !is_valid_name(group) {
            return Err(CommandError::Reply(Event::notice(format!(
                "Invalid group name '{group}'"
            ))));
        }

        let mut added: Vec<String> = Vec::new();
        let mut not_found: Vec<String> = Vec::new();

        for member in args.get(1).unwrap_or(&"").split(',').map(str::trim) {
            if member.is_empty()
                || member == creator
                || added.iter().chain(&not_found).any(|seen| seen == member)
            {
                continue;
            }

            if self.state.sessions.contains(member) {
                added.push(member.to_string());
            } else {
                not_found.push(member.to_string());
            }
        }

        match self.state.store.create_group(group, creator, &added) {
            Err(StoreError::GroupExists(_)) => {
                return Err(CommandError::Reply(Event::notice(format!(
                    "Group '{group}' already exists"
                ))));
            }
            result => result?,
        }

        info!("{creator} created group {group} with {added:?}");

        let members: Vec<String> = std::iter::once(creator.to_string())
            .chain(added.iter().cloned())
            .collect();

        let notice = Event::notice(format!(
            "Group '{group}' created by {creator}\nMembers: {}",
            members.join(", ")
        ));
        let created = Event::GroupCreated(GroupCreated {
            group_name: group.to_string(),
            creator: creator.to_string(),
            members,
        });

        self.state.sessions.send_to_many(&added, &notice);
        self.state.sessions.send_to_many(&added, &created);

        let mut replies = vec![notice, created];
        if !not_found.is_empty() {
            replies.push(Event::notice(format!(
                "The following users were not found: {}",
                not_found.join(", ")
            )));
        }

        Ok(replies)
    }
}
