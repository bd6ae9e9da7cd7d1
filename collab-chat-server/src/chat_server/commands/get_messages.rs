use super::args::{required, split_args};
use super::traits::command::Command;
use crate::errors::command_error::CommandError;
use crate::errors::store_error::StoreError;
use crate::event::{Event, HistoryEntry, MessageHistory, format_timestamp};
use crate::models::message::{HistoryQuery, MessageKind};
use crate::models::transient::session::SessionHandle;
use crate::state::AppState;

pub struct GetMessages {
    state: AppState,
}

impl GetMessages {
    pub fn new(state: AppState) -> Self {
        GetMessages { state }
    }
}

/// Builds the `MESSAGE_HISTORY` event answering `query`
pub(crate) fn history(state: &AppState, query: &HistoryQuery) -> Result<Event, StoreError> {
    let messages = state
        .store
        .messages(query, state.config.history_limit)?
        .into_iter()
        .map(|message| HistoryEntry {
            timestamp: format_timestamp(&message.timestamp),
            sender: message.sender,
            content: message.content,
            file_ref: message.file_ref,
        })
        .collect();

    let target = match query {
        HistoryQuery::Broadcast => None,
        HistoryQuery::Personal { peer, .. } => Some(peer.clone()),
        HistoryQuery::Group(group) => Some(group.clone()),
    };

    Ok(Event::MessageHistory(MessageHistory {
        msg_type: query.kind().to_string(),
        target,
        messages,
    }))
}

impl Command for GetMessages {
    async fn handle(&self, user: &SessionHandle, command: &str) -> Result<Vec<Event>, CommandError> {
        let args = split_args(command, 2);
        let kind = required(&args, 0, "GET_MESSAGES", "kind")?;

        let Ok(kind) = kind.parse::<MessageKind>() else {
            return Err(CommandError::Reply(Event::notice(format!(
                "Invalid message type for history: {kind}"
            ))));
        };

        let target = args
            .get(1)
            .map(|target| target.trim())
            .filter(|target| !target.is_empty());

        let query = match (kind, target) {
            (MessageKind::Broadcast, _) => HistoryQuery::Broadcast,
            (MessageKind::Personal, Some(peer)) => HistoryQuery::Personal {
                user: user.name.to_string(),
                peer: peer.to_string(),
            },
            (MessageKind::Group, Some(group)) => {
                if !self.state.store.is_member(group, &user.name)? {
                    return Err(CommandError::Reply(Event::notice(format!(
                        "You are not a member of group '{group}'"
                    ))));
                }
                HistoryQuery::Group(group.to_string())
            }
            (kind, None) => {
                return Err(CommandError::Reply(Event::notice(format!(
                    "{kind} history needs a target"
                ))));
            }
        };

        Ok(vec![history(&self.state, &query)?])
    }
}
