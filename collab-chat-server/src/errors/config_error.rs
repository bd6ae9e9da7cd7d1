use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{key} has an invalid value: {value}")]
    InvalidValue { key: &'static str, value: String },
}
