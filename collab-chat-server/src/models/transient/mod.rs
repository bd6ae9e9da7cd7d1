pub mod code_session;
pub mod session;
