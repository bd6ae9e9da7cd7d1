pub mod code_session_error;
pub mod command_error;
pub mod config_error;
pub mod delivery_error;
pub mod execution_error;
pub mod file_transfer_error;
pub mod multipart_error;
pub mod protocol_parse_error;
pub mod registry_error;
pub mod server_error;
pub mod store_error;
