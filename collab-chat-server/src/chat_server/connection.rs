use super::handlers::handle_command::handle_command;
use super::{RecordReader, RecordWriter};
use crate::chat_server::commands::get_messages::history;
use crate::codec::RecordCodec;
use crate::errors::registry_error::RegistryError;
use crate::errors::server_error::ServerError;
use crate::event::{CodeSessionEvent, Event, is_valid_name};
use crate::models::message::HistoryQuery;
use crate::models::transient::session::SessionHandle;
use crate::state::AppState;
use futures::{SinkExt, StreamExt};
use log::{error, info, trace, warn};
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::codec::{FramedRead, FramedWrite};

/// Drives one control connection from the name handshake until it closes
pub async fn handle_connection(state: AppState, socket: TcpStream, remote_addr: SocketAddr) {
    let (rd, wr) = socket.into_split();
    let mut rd = FramedRead::new(rd, RecordCodec::new(state.config.max_frame_bytes));
    let mut wr = FramedWrite::new(wr, RecordCodec::new(state.config.max_frame_bytes));

    let (user, rx) = match handshake(&state, &mut rd, &mut wr, remote_addr).await {
        Ok(session) => session,
        Err(error) => {
            warn!("Handshake with {remote_addr} failed: {error}");
            return;
        }
    };

    info!("{} connected from {remote_addr}", user.name);

    let result = match welcome(&state, &user, &mut wr).await {
        Ok(()) => {
            announce(&state, format!("{} has joined the chat!", user.name));
            listen(&state, &user, rx, &mut rd, &mut wr).await
        }
        Err(error) => Err(error),
    };

    match result {
        Err(ServerError::Disconnected) => info!("{} disconnected", user.name),
        Err(error) => error!("Connection with {} closed: {error}", user.name),
        Ok(()) => (),
    }

    disconnect(&state, &user);
}

async fn handshake(
    state: &AppState,
    rd: &mut RecordReader,
    wr: &mut RecordWriter,
    remote_addr: SocketAddr,
) -> Result<(SessionHandle, mpsc::Receiver<Event>), ServerError> {
    let record = match timeout(state.config.handshake_timeout, rd.next()).await {
        Err(_) => return Err(ServerError::HandshakeTimeout),
        Ok(None) => return Err(ServerError::Disconnected),
        Ok(Some(Err(error))) => return Err(ServerError::ConnectionLost(error)),
        Ok(Some(Ok(record))) => record,
    };

    let name = match record {
        Ok(record) => record.trim().to_string(),
        Err(error) => {
            warn!("Unreadable name from {remote_addr}: {error}");
            String::new()
        }
    };

    trace!("C: {name}");

    if !is_valid_name(&name) {
        wr.send(Event::NameInvalid).await?;
        return Err(ServerError::NameInvalid(name));
    }

    match state.sessions.register(&name, remote_addr) {
        Ok(session) => {
            wr.send(Event::Connected).await?;
            Ok(session)
        }
        Err(RegistryError::NameTaken(name)) => {
            wr.send(Event::NameTaken).await?;
            Err(ServerError::NameTaken(name))
        }
    }
}

/// Sends a newly registered user what they need before chatting
async fn welcome(
    state: &AppState,
    user: &SessionHandle,
    wr: &mut RecordWriter,
) -> Result<(), ServerError> {
    wr.send(Event::ServerInfo(state.server_info())).await?;

    match state.user_groups(&user.name) {
        Ok(groups) => wr.send(groups).await?,
        Err(error) => error!("Could not get groups of {}: {error}", user.name),
    }

    match history(state, &HistoryQuery::Broadcast) {
        Ok(history) => wr.send(history).await?,
        Err(error) => error!("Could not get history for {}: {error}", user.name),
    }

    Ok(())
}

async fn listen(
    state: &AppState,
    user: &SessionHandle,
    mut rx: mpsc::Receiver<Event>,
    rd: &mut RecordReader,
    wr: &mut RecordWriter,
) -> Result<(), ServerError> {
    loop {
        tokio::select! {
            record = rd.next() => {
                match record {
                    None => return Err(ServerError::Disconnected),
                    Some(Err(error)) => return Err(ServerError::ConnectionLost(error)),
                    Some(Ok(Err(error))) => {
                        warn!("Unreadable record from {}: {error}", user.name);
                        wr.send(Event::notice(error.to_string())).await?;
                    }
                    Some(Ok(Ok(record))) => handle_command(state, user, wr, &record).await?,
                }
            }

            event = rx.recv() => {
                let Some(event) = event else {
                    return Err(ServerError::Disconnected);
                };

                trace!("S: {}", event.encode());
                wr.send(event).await?;
            }
        }
    }
}

fn announce(state: &AppState, notice: String) {
    state.sessions.send_to_all(&Event::notice(notice), None);
    state.sessions.send_to_all(&state.user_list(), None);
}

fn disconnect(state: &AppState, user: &SessionHandle) {
    state.sessions.unregister(&user.name);

    for session in state.code_sessions.remove_participant_everywhere(&user.name) {
        state.sessions.send_to_many(
            &session.participants,
            &Event::CodeSession(CodeSessionEvent::UserLeft {
                session_id: session.session_id.clone(),
                user: user.name.to_string(),
                participants: session.participants.clone(),
            }),
        );
    }

    announce(state, format!("{} has left the chat", user.name));
}
