use crate::errors::file_transfer_error::FileTransferError;
use crate::errors::multipart_error::MultipartError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Extracts the boundary parameter from a `multipart/form-data` Content-Type
pub fn boundary(content_type: &str) -> Result<String, MultipartError> {
    let mut params = content_type.split(';').map(str::trim);

    let Some(mime) = params.next() else {
        return Err(MultipartError::MissingBoundary);
    };

    if !mime.eq_ignore_ascii_case("multipart/form-data") {
        return Err(MultipartError::MissingBoundary);
    }

    params
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("boundary"))
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|boundary| !boundary.is_empty())
        .ok_or(MultipartError::MissingBoundary)
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }

    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|position| from + position)
}

/// Splits a multipart body into its parts
pub fn parse(body: &[u8], boundary: &str) -> Result<Vec<Part>, MultipartError> {
    let delimiter = format!("--{boundary}");
    let next_delimiter = format!("\r\n--{boundary}");

    let Some(start) = find(body, delimiter.as_bytes(), 0) else {
        return Err(MultipartError::NoDelimiter);
    };

    let mut cursor = start + delimiter.len();
    let mut parts = Vec::new();

    loop {
        let rest = &body[cursor..];
        if rest.starts_with(b"--") {
            break;
        }

        if rest.starts_with(b"\r\n") {
            cursor += 2;
        } else if rest.is_empty() {
            return Err(MultipartError::Unterminated);
        }

        let index = parts.len();
        let Some(headers_end) = find(body, b"\r\n\r\n", cursor) else {
            return Err(MultipartError::MissingHeaders(index));
        };

        let data_start = headers_end + 4;
        let Some(data_end) = find(body, next_delimiter.as_bytes(), data_start) else {
            return Err(MultipartError::Unterminated);
        };

        let headers = String::from_utf8_lossy(&body[cursor..headers_end]);
        let mut part = Part {
            name: String::new(),
            filename: None,
            content_type: None,
            data: body[data_start..data_end].to_vec(),
        };

        for line in headers.split("\r\n") {
            let Some((header, value)) = line.split_once(':') else {
                continue;
            };

            if header.trim().eq_ignore_ascii_case("content-disposition") {
                for (key, param) in disposition_params(value) {
                    match key.as_str() {
                        "name" => part.name = param,
                        "filename" => part.filename = Some(param),
                        _ => (),
                    }
                }
            } else if header.trim().eq_ignore_ascii_case("content-type") {
                part.content_type = Some(value.trim().to_string());
            }
        }

        if part.name.is_empty() {
            return Err(MultipartError::MissingName(index));
        }

        parts.push(part);
        cursor = data_end + next_delimiter.len();
    }

    Ok(parts)
}

/// `key=value` parameters of a Content-Disposition value. Quoted values may
/// contain `;` and backslash escaped quotes.
fn disposition_params(value: &str) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let mut chars = value.chars().peekable();

    loop {
        while chars.next_if(|c| *c == ';' || c.is_whitespace()).is_some() {}

        let mut key = String::new();
        while let Some(c) = chars.next_if(|c| *c != '=' && *c != ';') {
            key.push(c);
        }

        if chars.peek().is_none() && key.is_empty() {
            return params;
        }

        let mut param = String::new();
        if chars.next_if_eq(&'=').is_some() {
            while chars.next_if(|c| *c == ' ' || *c == '\t').is_some() {}

            if chars.next_if_eq(&'"').is_some() {
                while let Some(c) = chars.next() {
                    match c {
                        '"' => break,
                        '\\' => param.extend(chars.next()),
                        c => param.push(c),
                    }
                }
                while chars.next_if(|c| *c != ';').is_some() {}
            } else {
                while let Some(c) = chars.next_if(|c| *c != ';') {
                    param.push(c);
                }
                param = param.trim_end().to_string();
            }
        }

        params.push((key.trim().to_ascii_lowercase(), param));
    }
}

/// Fields of a `POST /upload` body
#[derive(Debug, Clone)]
pub struct UploadForm {
    pub filename: String,
    pub content: Vec<u8>,
    pub sender: String,
    pub recipient: Option<String>,
    pub group_name: Option<String>,
}

impl UploadForm {
    pub fn from_parts(parts: Vec<Part>) -> Result<Self, FileTransferError> {
        let mut file = None;
        let mut sender = None;
        let mut recipient = None;
        let mut group_name = None;

        for part in parts {
            match part.name.as_str() {
                "file" => file = Some((part.filename, part.data)),
                "sender" => sender = text_field(part.data),
                "recipient" => recipient = text_field(part.data),
                "group_name" => group_name = text_field(part.data),
                _ => (),
            }
        }

        let Some((Some(filename), content)) = file else {
            return Err(FileTransferError::MissingFields);
        };

        let Some(sender) = sender else {
            return Err(FileTransferError::MissingFields);
        };

        if filename.is_empty() || content.is_empty() {
            return Err(FileTransferError::MissingFields);
        }

        Ok(UploadForm {
            filename,
            content,
            sender,
            recipient,
            group_name,
        })
    }
}

fn text_field(data: Vec<u8>) -> Option<String> {
    let text = String::from_utf8_lossy(&data).trim().to_string();
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &[u8] = b"--XyZ\r\n\
Content-Disposition: form-data; name=\"sender\"\r\n\
\r\n\
alice\r\n\
--XyZ\r\n\
Content-Disposition: form-data; name=\"file\"; filename=\"notes.txt\"\r\n\
Content-Type: text/plain\r\n\
\r\n\
line one\r\nline two\r\n\r\n\
--XyZ\r\n\
Content-Disposition: form-data; name=\"group_name\"\r\n\
\r\n\
\r\n\
--XyZ--\r\n";

    #[test]
    fn boundary_from_content_type() {
        assert_eq!(
            boundary("multipart/form-data; boundary=XyZ").unwrap(),
            "XyZ"
        );
        assert_eq!(
            boundary("Multipart/Form-Data; charset=utf-8; boundary=\"a b\"").unwrap(),
            "a b"
        );
        assert_eq!(
            boundary("application/json"),
            Err(MultipartError::MissingBoundary)
        );
        assert_eq!(
            boundary("multipart/form-data"),
            Err(MultipartError::MissingBoundary)
        );
    }

    #[test]
    fn parses_parts_with_binary_safe_data() {
        let parts = parse(BODY, "XyZ").unwrap();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].name, "sender");
        assert_eq!(parts[0].data, b"alice");
        assert_eq!(parts[1].filename.as_deref(), Some("notes.txt"));
        assert_eq!(parts[1].content_type.as_deref(), Some("text/plain"));
        assert_eq!(parts[1].data, b"line one\r\nline two\r\n");
        assert!(parts[2].data.is_empty());
    }

    #[test]
    fn upload_form() {
        let form = UploadForm::from_parts(parse(BODY, "XyZ").unwrap()).unwrap();

        assert_eq!(form.filename, "notes.txt");
        assert_eq!(form.sender, "alice");
        assert_eq!(form.recipient, None);
        assert_eq!(form.group_name, None);
    }

    #[test]
    fn quoted_filename_keeps_separators() {
        let body = b"--b\r\n\
Content-Disposition: form-data; name=\"file\"; filename=\"q1; final \\\"v2\\\".txt\"\r\n\
\r\n\
data\r\n\
--b\r\n\
Content-Disposition: form-data; name=sender\r\n\
\r\n\
bob\r\n\
--b--";

        let form = UploadForm::from_parts(parse(body, "b").unwrap()).unwrap();
        assert_eq!(form.filename, "q1; final \"v2\".txt");
        assert_eq!(form.sender, "bob");
    }

    #[test]
    fn disposition_parameters() {
        assert_eq!(
            disposition_params(" form-data; Name=\"a;b\" ; filename=plain.txt"),
            vec![
                ("form-data".to_string(), String::new()),
                ("name".to_string(), "a;b".to_string()),
                ("filename".to_string(), "plain.txt".to_string()),
            ]
        );
    }

    #[test]
    fn missing_sender() {
        let body = b"--b\r\n\
Content-Disposition: form-data; name=\"file\"; filename=\"a.bin\"\r\n\
\r\n\
\x00\x01\r\n\
--b--";

        let parts = parse(body, "b").unwrap();
        assert_eq!(parts[0].data, vec![0, 1]);
        assert!(matches!(
            UploadForm::from_parts(parts),
            Err(FileTransferError::MissingFields)
        ));
    }

    #[test]
    fn malformed_bodies() {
        assert_eq!(parse(b"no boundary here", "b"), Err(MultipartError::NoDelimiter));
        assert_eq!(
            parse(b"--b\r\nContent-Disposition: form-data; name=\"x\"", "b"),
            Err(MultipartError::MissingHeaders(0))
        );
        assert_eq!(
            parse(b"--b\r\nContent-Disposition: form-data; name=\"x\"\r\n\r\nabc", "b"),
            Err(MultipartError::Unterminated)
        );
        assert_eq!(
            parse(b"--b\r\nContent-Type: text/plain\r\n\r\nabc\r\n--b--", "b"),
            Err(MultipartError::MissingName(0))
        );
    }
}
