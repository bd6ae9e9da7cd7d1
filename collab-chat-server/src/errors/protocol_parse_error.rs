use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolParseError {
    #[error("Record exceeds {0} bytes")]
    TooLong(usize),
    #[error("Record contained invalid UTF-8")]
    InvalidUtf8,
    #[error("{command} is missing its {argument} argument")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error("{command} carries an invalid JSON payload: {source}")]
    InvalidPayload {
        command: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("Unknown event type {0}")]
    UnknownEvent(String),
}
