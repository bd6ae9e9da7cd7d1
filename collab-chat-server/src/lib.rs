use code_sessions::CodeSessions;
use config::Config;
use errors::server_error::ServerError;
use executor::CodeExecutor;
use log::info;
use session_registry::SessionRegistry;
use state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use store::Store;
use tokio::net::TcpListener;

mod chat_server;
pub mod code_sessions;
pub mod codec;
pub mod config;
pub mod errors;
pub mod event;
pub mod executor;
mod http;
pub mod models;
pub mod schema;
pub mod session_registry;
pub mod state;
pub mod store;

/// Both listeners bound and ready to serve
pub struct Server {
    chat_listener: TcpListener,
    http_listener: TcpListener,
    state: AppState,
}

async fn bind_listener(host: &str, port: u16) -> Result<TcpListener, ServerError> {
    let addr = format!("{host}:{port}");
    TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

impl Server {
    pub async fn bind(config: Config) -> Result<Self, ServerError> {
        Server::bind_with_executor(config, CodeExecutor::default()).await
    }

    /// Binds the chat and file listeners and opens the store. Port 0 picks a free port.
    pub async fn bind_with_executor(
        config: Config,
        executor: CodeExecutor,
    ) -> Result<Self, ServerError> {
        let store = Store::open(&config.database_url, config.database_pool_size)?;
        let chat_listener = bind_listener(&config.host, config.port).await?;
        let http_listener = bind_listener(&config.http_host, config.http_port).await?;

        let http_addr = http_listener
            .local_addr()
            .map_err(ServerError::ConnectionLost)?;
        let public_http_url = config
            .public_http_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", config.http_host, http_addr.port()));

        let sessions = SessionRegistry::with_queue_capacity(config.outbound_queue_len);

        let state = AppState {
            config: Arc::new(config),
            store,
            sessions,
            code_sessions: CodeSessions::new(),
            executor,
            public_http_url: Arc::new(public_http_url),
            http_port: http_addr.port(),
        };

        Ok(Server {
            chat_listener,
            http_listener,
            state,
        })
    }

    pub fn chat_addr(&self) -> std::io::Result<SocketAddr> {
        self.chat_listener.local_addr()
    }

    pub fn http_addr(&self) -> std::io::Result<SocketAddr> {
        self.http_listener.local_addr()
    }

    /// Serves both listeners until the process exits
    pub async fn run(self) {
        info!("Supported languages: {:?}", self.state.executor.supported_languages());
        tokio::spawn(http::listen(self.http_listener, self.state.clone()));
        chat_server::listen(self.chat_listener, self.state).await;
    }
}
