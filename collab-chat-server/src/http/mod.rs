use crate::state::AppState;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use hyper::{Request, body::Incoming};
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server,
};
use log::{error, info};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_service::Service;

mod download;
mod files;
pub mod multipart;
mod notify;
mod upload;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/upload", post(upload::upload))
        .route("/download/{file_id}", get(download::download))
        .route("/files", get(files::files))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves the file side-channel with hyper so headers can be served with title case
pub async fn listen(listener: TcpListener, state: AppState) {
    let app = router(state);

    if let Ok(addr) = listener.local_addr() {
        info!("File transfer server listening on {addr}");
    }

    loop {
        let (socket, _remote_addr) = match listener.accept().await {
            Ok(l) => l,
            Err(error) => {
                error!("Could not get socket from accepted HTTP connection: {error}");
                continue;
            }
        };

        let tower_service = app.clone();
        tokio::spawn(async move {
            let socket = TokioIo::new(socket);
            let hyper_service = hyper::service::service_fn(move |request: Request<Incoming>| {
                tower_service.clone().call(request)
            });

            let mut builder = server::conn::auto::Builder::new(TokioExecutor::new());
            builder.http1().title_case_headers(true);

            if let Err(err) = builder
                .serve_connection_with_upgrades(socket, hyper_service)
                .await
            {
                error!("Failed to serve connection: {err:#}");
            }
        });
    }
}
