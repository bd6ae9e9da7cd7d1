use crate::codec::RecordCodec;
use crate::state::AppState;
use log::{error, info};
use tokio::net::TcpListener;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio_util::codec::{FramedRead, FramedWrite};

mod commands;
pub mod connection;
mod handlers;

pub(crate) type RecordReader = FramedRead<OwnedReadHalf, RecordCodec>;
pub(crate) type RecordWriter = FramedWrite<OwnedWriteHalf, RecordCodec>;

/// Accepts control connections, one task each
pub async fn listen(listener: TcpListener, state: AppState) {
    if let Ok(addr) = listener.local_addr() {
        info!("Chat server listening on {addr}");
    }

    loop {
        let (socket, remote_addr) = match listener.accept().await {
            Ok(c) => c,
            Err(error) => {
                error!("Could not get socket from accepted chat connection: {error}");
                continue;
            }
        };

        tokio::spawn(connection::handle_connection(
            state.clone(),
            socket,
            remote_addr,
        ));
    }
}
