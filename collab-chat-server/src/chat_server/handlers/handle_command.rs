use super::process_command::process_command;
use crate::chat_server::RecordWriter;
use crate::chat_server::commands::{
    broadcast::Broadcast, code_update::CodeUpdate, create_code_session::CreateCodeSession,
    create_group::CreateGroup, delete_file::DeleteFile, execute_code::ExecuteCode,
    get_messages::GetMessages, group::Group, invite_to_code::InviteToCode,
    join_code_session::JoinCodeSession, list_clients::ListClients, list_files::ListFiles,
    list_groups::ListGroups, personal::Personal,
};
use crate::errors::server_error::ServerError;
use crate::models::transient::session::SessionHandle;
use crate::state::AppState;
use log::{trace, warn};

pub(crate) async fn handle_command(
    state: &AppState,
    user: &SessionHandle,
    wr: &mut RecordWriter,
    command: &str,
) -> Result<(), ServerError> {
    trace!("C: {command}");
    let kind = command.split('|').next().unwrap_or_default().trim();

    match kind {
        "BROADCAST" => {
            let broadcast = Broadcast::new(state.clone());
            process_command(wr, user, &broadcast, command).await
        }

        "PERSONAL" => {
            let personal = Personal::new(state.clone());
            process_command(wr, user, &personal, command).await
        }

        "GROUP" => {
            let group = Group::new(state.clone());
            process_command(wr, user, &group, command).await
        }

        "CREATE_GROUP" => {
            let create_group = CreateGroup::new(state.clone());
            process_command(wr, user, &create_group, command).await
        }

        "LIST_CLIENTS" => {
            let list_clients = ListClients::new(state.clone());
            process_command(wr, user, &list_clients, command).await
        }

        "LIST_GROUPS" => {
            let list_groups = ListGroups::new(state.clone());
            process_command(wr, user, &list_groups, command).await
        }

        "GET_MESSAGES" => {
            let get_messages = GetMessages::new(state.clone());
            process_command(wr, user, &get_messages, command).await
        }

        "CREATE_CODE_SESSION" => {
            let create_code_session = CreateCodeSession::new(state.clone());
            process_command(wr, user, &create_code_session, command).await
        }

        "JOIN_CODE_SESSION" => {
            let join_code_session = JoinCodeSession::new(state.clone());
            process_command(wr, user, &join_code_session, command).await
        }

        "CODE_UPDATE" => {
            let code_update = CodeUpdate::new(state.clone());
            process_command(wr, user, &code_update, command).await
        }

        "EXECUTE_CODE" => {
            let execute_code = ExecuteCode::new(state.clone());
            process_command(wr, user, &execute_code, command).await
        }

        "INVITE_TO_CODE" => {
            let invite_to_code = InviteToCode::new(state.clone());
            process_command(wr, user, &invite_to_code, command).await
        }

        "LIST_FILES" => {
            let list_files = ListFiles::new(state.clone());
            process_command(wr, user, &list_files, command).await
        }

        "DELETE_FILE" => {
            let delete_file = DeleteFile::new(state.clone());
            process_command(wr, user, &delete_file, command).await
        }

        _ => {
            warn!("Unknown command from {}: {kind}", user.name);
            Ok(())
        }
    }
}
