use crate::errors::delivery_error::DeliveryError;
use crate::event::Event;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// A connected user as seen by other connections
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub name: Arc<String>,
    pub remote_addr: SocketAddr,
    tx: mpsc::Sender<Event>,
}

impl SessionHandle {
    pub fn new(name: Arc<String>, remote_addr: SocketAddr, tx: mpsc::Sender<Event>) -> Self {
        SessionHandle {
            name,
            remote_addr,
            tx,
        }
    }

    /// Queues an event on the session's outbound channel without waiting.
    /// A reader that fell behind by a whole queue misses the event.
    pub fn send(&self, event: Event) -> Result<(), DeliveryError> {
        self.tx.try_send(event).map_err(|error| match error {
            TrySendError::Full(_) => DeliveryError::QueueFull(self.name.to_string()),
            TrySendError::Closed(_) => DeliveryError::RecipientOffline(self.name.to_string()),
        })
    }
}
