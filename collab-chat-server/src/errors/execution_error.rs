use std::io;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Language \"{0}\" not supported")]
    UnsupportedLanguage(String),
    #[error("Compilation error: {stderr}")]
    CompileFailed {
        stdout: String,
        stderr: String,
        exit_status: Option<i32>,
    },
    #[error("Execution timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("Could not start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("Execution error: {0}")]
    Io(#[from] io::Error),
}
