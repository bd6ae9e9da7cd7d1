use crate::errors::protocol_parse_error::ProtocolParseError;
use serde::de::DeserializeOwned;

/// Arguments after the record type. The last one keeps any `|` it contains.
pub(crate) fn split_args(command: &str, count: usize) -> Vec<&str> {
    command.splitn(count + 1, '|').skip(1).collect()
}

pub(crate) fn required<'a>(
    args: &[&'a str],
    index: usize,
    command: &'static str,
    argument: &'static str,
) -> Result<&'a str, ProtocolParseError> {
    args.get(index)
        .copied()
        .filter(|arg| !arg.trim().is_empty())
        .ok_or(ProtocolParseError::MissingArgument { command, argument })
}

pub(crate) fn json_payload<T: DeserializeOwned>(
    command_name: &'static str,
    command: &str,
) -> Result<T, ProtocolParseError> {
    let args = split_args(command, 1);
    let payload = required(&args, 0, command_name, "payload")?;
    serde_json::from_str(payload).map_err(|source| ProtocolParseError::InvalidPayload {
        command: command_name,
        source,
    })
}
