use crate::chat_server::RecordWriter;
use crate::chat_server::commands::traits::command::Command;
use crate::errors::command_error::CommandError;
use crate::errors::server_error::ServerError;
use crate::event::Event;
use crate::models::transient::session::SessionHandle;
use futures::SinkExt;
use log::{error, trace, warn};

pub(crate) async fn process_command(
    wr: &mut RecordWriter,
    user: &SessionHandle,
    command: &impl Command,
    message: &str,
) -> Result<(), ServerError> {
    match command.handle(user, message).await {
        Ok(responses) => {
            for reply in responses {
                trace!("S: {}", reply.encode());
                wr.send(reply).await?;
            }
        }

        Err(CommandError::Reply(reply)) => {
            warn!("S: {}", reply.encode());
            wr.send(reply).await?;
        }

        Err(CommandError::Malformed(err)) => {
            warn!("Malformed command from {}: {err}", user.name);
            wr.send(Event::notice(err.to_string())).await?;
        }

        Err(CommandError::Store(err)) => {
            error!("Command from {} failed: {err}", user.name);
            wr.send(Event::notice("Could not complete request")).await?;
        }
    }

    Ok(())
}
