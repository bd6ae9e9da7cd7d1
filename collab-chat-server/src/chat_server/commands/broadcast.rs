use super::args::{required, split_args};
use super::traits::command::Command;
use crate::errors::command_error::CommandError;
use crate::event::{ChatLine, Event};
use crate::models::message::NewMessage;
use crate::models::transient::session::SessionHandle;
use crate::state::AppState;
use log::debug;

pub struct Broadcast {
    state: AppState,
}

impl Broadcast {
    pub fn new(state: AppState) -> Self {
        Broadcast { state }
    }
}

impl Command for Broadcast {
    async fn handle(&self, user: &SessionHandle, command: &str) -> Result<Vec<Event>, CommandError> {
        let args = split_args(command, 1);
        let text = required(&args, 0, "BROADCAST", "text")?;

        self.state
            .store
            .save_message(&NewMessage::broadcast(&user.name, text))?;

        let line = Event::Chat(ChatLine::Broadcast {
            sender: user.name.to_string(),
            text: text.to_string(),
        });

        let delivered = self.state.sessions.send_to_all(&line, Some(user.name.as_str()));
        debug!("Broadcast from {} delivered to {delivered} sessions", user.name);
        Ok(vec![line])
    }
}
