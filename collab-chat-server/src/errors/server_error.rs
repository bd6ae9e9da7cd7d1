use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Connection lost: {0}")]
    ConnectionLost(#[from] io::Error),
    #[error("Client disconnected")]
    Disconnected,
    #[error("Client did not send a name in time")]
    HandshakeTimeout,
    #[error("Name {0} is already taken")]
    NameTaken(String),
    #[error("Name {0:?} is not allowed")]
    NameInvalid(String),
    #[error("Could not bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("Could not open the store: {0}")]
    Store(#[from] crate::errors::store_error::StoreError),
}
