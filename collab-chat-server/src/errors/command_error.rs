use crate::errors::protocol_parse_error::ProtocolParseError;
use crate::errors::store_error::StoreError;
use crate::event::Event;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Sending notice to client")]
    Reply(Event),
    #[error("Malformed command: {0}")]
    Malformed(#[from] ProtocolParseError),
    #[error("Store failure: {0}")]
    Store(#[from] StoreError),
}
