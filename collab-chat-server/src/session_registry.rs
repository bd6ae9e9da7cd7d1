use crate::errors::delivery_error::DeliveryError;
use crate::errors::registry_error::RegistryError;
use crate::event::Event;
use crate::models::transient::session::SessionHandle;
use log::warn;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Online users keyed by display name
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<BTreeMap<String, SessionHandle>>>,
    queue_capacity: usize,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        SessionRegistry::with_queue_capacity(DEFAULT_QUEUE_CAPACITY)
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        SessionRegistry::default()
    }

    /// Each session buffers at most `queue_capacity` undelivered events
    pub fn with_queue_capacity(queue_capacity: usize) -> Self {
        SessionRegistry {
            sessions: Arc::default(),
            queue_capacity: queue_capacity.max(1),
        }
    }

    fn sessions(&self) -> MutexGuard<'_, BTreeMap<String, SessionHandle>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims `name` for a new connection. An existing entry is never replaced.
    pub fn register(
        &self,
        name: &str,
        remote_addr: SocketAddr,
    ) -> Result<(SessionHandle, mpsc::Receiver<Event>), RegistryError> {
        let mut sessions = self.sessions();
        let Entry::Vacant(entry) = sessions.entry(name.to_string()) else {
            return Err(RegistryError::NameTaken(name.to_string()));
        };

        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let handle = SessionHandle::new(Arc::new(name.to_string()), remote_addr, tx);
        entry.insert(handle.clone());
        Ok((handle, rx))
    }

    pub fn unregister(&self, name: &str) -> Option<SessionHandle> {
        self.sessions().remove(name)
    }

    pub fn lookup(&self, name: &str) -> Option<SessionHandle> {
        self.sessions().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sessions().contains_key(name)
    }

    /// Names of everyone online, sorted
    pub fn list_names(&self) -> Vec<String> {
        self.sessions().keys().cloned().collect()
    }

    pub fn snapshot(&self) -> Vec<SessionHandle> {
        self.sessions().values().cloned().collect()
    }

    pub fn send_to(&self, name: &str, event: Event) -> Result<(), DeliveryError> {
        let Some(session) = self.lookup(name) else {
            return Err(DeliveryError::RecipientNotFound(name.to_string()));
        };

        session.send(event)
    }

    /// Sends to every online session except `except`, returning the number of deliveries
    pub fn send_to_all(&self, event: &Event, except: Option<&str>) -> usize {
        let sessions = self.snapshot();
        let mut delivered = 0;

        for session in sessions
            .iter()
            .filter(|session| except != Some(session.name.as_str()))
        {
            match session.send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(error) => warn!("{error}"),
            }
        }

        delivered
    }

    /// Sends to each named user that is online, returning the number of deliveries
    pub fn send_to_many<'a>(
        &self,
        names: impl IntoIterator<Item = &'a String>,
        event: &Event,
    ) -> usize {
        let mut delivered = 0;

        for name in names {
            match self.send_to(name, event.clone()) {
                Ok(()) => delivered += 1,
                Err(DeliveryError::RecipientNotFound(_)) => (),
                Err(error) => warn!("{error}"),
            }
        }

        delivered
    }
}
