use super::args::{required, split_args};
use super::traits::command::Command;
use crate::errors::command_error::CommandError;
use crate::event::{ChatLine, Event};
use crate::models::message::NewMessage;
use crate::models::transient::session::SessionHandle;
use crate::state::AppState;
use log::debug;

pub struct Group {
    state: AppState,
}

impl Group {
    pub fn new(state: AppState) -> Self {
        Group { state }
    }
}

impl Command for Group {
    async fn handle(&self, user: &SessionHandle, command: &str) -> Result<Vec<Event>, CommandError> {
        let args = split_args(command, 2);
        let group = required(&args, 0, "GROUP", "group")?.trim();
        let text = required(&args, 1, "GROUP", "text")?;

        let members = self.state.store.group_members(group)?;
        if members.is_empty() && !self.state.store.group_exists(group)? {
            return Err(CommandError::Reply(Event::notice(format!(
                "Group '{group}' does not exist"
            ))));
        }

        if !members.iter().any(|member| member.as_str() == user.name.as_str()) {
            return Err(CommandError::Reply(Event::notice(format!(
                "You are not a member of group '{group}'"
            ))));
        }

        self.state
            .store
            .save_message(&NewMessage::group(&user.name, group, text))?;

        let line = Event::Chat(ChatLine::Group {
            group: group.to_string(),
            sender: user.name.to_string(),
            text: text.to_string(),
        });

        let others: Vec<String> = members
            .into_iter()
            .filter(|member| member.as_str() != user.name.as_str())
            .collect();

        let delivered = self.state.sessions.send_to_many(&others, &line);
        debug!(
            "Message to {group} delivered to {delivered}/{} other members",
            others.len()
        );

        Ok(vec![line])
    }
}
