use super::args::{required, split_args};
use super::traits::command::Command;
use crate::errors::command_error::CommandError;
use crate::event::{ChatLine, Event};
use crate::models::message::NewMessage;
use crate::models::transient::session::SessionHandle;
use crate::state::AppState;
use log::debug;

pub struct Personal {
    state: AppState,
}

impl Personal {
    pub fn new(state: AppState) -> Self {
        Personal { state }
    }
}

impl Command for Personal {
    async fn handle(&self, user: &SessionHandle, command: &str) -> Result<Vec<Event>, CommandError> {
        let args = split_args(command, 2);
        let recipient = required(&args, 0, "PERSONAL", "recipient")?.trim();
        let text = required(&args, 1, "PERSONAL", "text")?;

        self.state
            .store
            .save_message(&NewMessage::personal(&user.name, recipient, text))?;

        let delivery = self.state.sessions.send_to(
            recipient,
            Event::Chat(ChatLine::PersonalFrom {
                sender: user.name.to_string(),
                text: text.to_string(),
            }),
        );

        match delivery {
            Ok(()) => Ok(vec![Event::Chat(ChatLine::PersonalTo {
                recipient: recipient.to_string(),
                text: text.to_string(),
            })]),
            Err(error) => {
                debug!("{error}");
                Err(CommandError::Reply(Event::notice(format!(
                    "User '{recipient}' not found or offline"
                ))))
            }
        }
    }
}
