pub(crate) mod args;
pub mod broadcast;
pub mod code_update;
pub mod create_code_session;
pub mod create_group;
pub mod delete_file;
pub mod execute_code;
pub mod get_messages;
pub mod group;
pub mod invite_to_code;
pub mod join_code_session;
pub mod list_clients;
pub mod list_files;
pub mod list_groups;
pub mod personal;
pub(crate) mod traits;
