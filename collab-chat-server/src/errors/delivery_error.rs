use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("{0} is not connected")]
    RecipientNotFound(String),
    #[error("{0} went offline before delivery")]
    RecipientOffline(String),
    #[error("Outbound queue of {0} is full, dropping event")]
    QueueFull(String),
}
