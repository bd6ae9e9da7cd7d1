use crate::code_sessions::CodeSessions;
use crate::config::Config;
use crate::event::{Event, ServerInfo, UserGroups, UserList};
use crate::executor::CodeExecutor;
use crate::session_registry::SessionRegistry;
use crate::store::Store;
use std::sync::Arc;

/// Everything a connection or HTTP handler needs, cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Store,
    pub sessions: SessionRegistry,
    pub code_sessions: CodeSessions,
    pub executor: CodeExecutor,
    /// Base URL of the file side-channel as clients should reach it
    pub public_http_url: Arc<String>,
    pub http_port: u16,
}

impl AppState {
    pub fn server_info(&self) -> ServerInfo {
        let base = self.public_http_url.trim_end_matches('/');
        ServerInfo {
            supported_languages: self.executor.supported_languages(),
            active_users: self.sessions.list_names(),
            http_port: self.http_port,
            file_upload_url: format!("{base}/upload"),
            file_download_url: format!("{base}/download"),
            file_list_url: format!("{base}/files"),
        }
    }

    pub fn user_list(&self) -> Event {
        Event::UserList(UserList {
            users: self.sessions.list_names(),
        })
    }

    pub fn user_groups(&self, user: &str) -> Result<Event, crate::errors::store_error::StoreError> {
        Ok(Event::UserGroups(UserGroups {
            groups: self.store.user_groups(user)?,
        }))
    }
}
