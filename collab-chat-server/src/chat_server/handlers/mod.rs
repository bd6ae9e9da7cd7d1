pub(crate) mod handle_command;
pub(crate) mod process_command;
