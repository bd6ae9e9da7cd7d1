use crate::errors::protocol_parse_error::ProtocolParseError;
use crate::event::Event;
use bytes::{Buf, BufMut, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

/// Splits the control stream into LF terminated records.
///
/// A record that is too long or not UTF-8 is reported as an `Ok(Err(_))` item
/// so the connection can keep reading; only transport failures end the stream.
#[derive(Debug, Clone)]
pub struct RecordCodec {
    max_length: usize,
    next_index: usize,
    discarding: bool,
}

impl RecordCodec {
    pub fn new(max_length: usize) -> Self {
        RecordCodec {
            max_length,
            next_index: 0,
            discarding: false,
        }
    }
}

impl Decoder for RecordCodec {
    type Item = Result<String, ProtocolParseError>;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let newline = buf[self.next_index..]
                .iter()
                .position(|byte| *byte == b'\n')
                .map(|offset| self.next_index + offset);

            if self.discarding {
                match newline {
                    Some(index) => {
                        buf.advance(index + 1);
                        self.discarding = false;
                        self.next_index = 0;
                        continue;
                    }
                    None => {
                        buf.clear();
                        self.next_index = 0;
                        return Ok(None);
                    }
                }
            }

            return match newline {
                Some(index) => {
                    let record = buf.split_to(index + 1);
                    self.next_index = 0;

                    if index > self.max_length {
                        return Ok(Some(Err(ProtocolParseError::TooLong(self.max_length))));
                    }

                    Ok(Some(parse_record(&record[..index])))
                }
                None if buf.len() > self.max_length => {
                    buf.clear();
                    self.next_index = 0;
                    self.discarding = true;
                    Ok(Some(Err(ProtocolParseError::TooLong(self.max_length))))
                }
                None => {
                    self.next_index = buf.len();
                    Ok(None)
                }
            };
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(record) = self.decode(buf)? {
            return Ok(Some(record));
        }

        // A final record without its LF is still a record
        if buf.is_empty() || self.discarding {
            buf.clear();
            return Ok(None);
        }

        let record = buf.split();
        self.next_index = 0;
        Ok(Some(parse_record(&record)))
    }
}

impl Encoder<Event> for RecordCodec {
    type Error = io::Error;

    fn encode(&mut self, event: Event, buf: &mut BytesMut) -> Result<(), Self::Error> {
        let record = escape(&event.encode());
        buf.reserve(record.len() + 1);
        buf.put_slice(record.as_bytes());
        buf.put_u8(b'\n');
        Ok(())
    }
}

fn parse_record(bytes: &[u8]) -> Result<String, ProtocolParseError> {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    let record = std::str::from_utf8(bytes).or(Err(ProtocolParseError::InvalidUtf8))?;
    Ok(unescape(record))
}

/// Escapes `\`, LF and CR so a payload never contains the record delimiter
pub fn escape(record: &str) -> String {
    let mut escaped = String::with_capacity(record.len());
    for c in record.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn unescape(record: &str) -> String {
    let mut unescaped = String::with_capacity(record.len());
    let mut chars = record.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }

        match chars.next() {
            Some('\\') => unescaped.push('\\'),
            Some('n') => unescaped.push('\n'),
            Some('r') => unescaped.push('\r'),
            Some(other) => {
                unescaped.push('\\');
                unescaped.push(other);
            }
            None => unescaped.push('\\'),
        }
    }

    unescaped
}
