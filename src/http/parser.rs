use crate::http::request::{HTTP_VERSION, HeaderFields, Method, Request};

/// Upper bound on a request head that has not finished arriving.
pub const MAX_HEAD_BYTES: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("request line must have exactly three fields")]
    MalformedRequestLine,
    #[error("unsupported method")]
    UnsupportedMethod,
    #[error("request target must start with '/'")]
    InvalidTarget,
    #[error("unsupported protocol version")]
    UnsupportedVersion,
    #[error("header line is not `name: value`")]
    MalformedHeaderLine,
    #[error("stream ended before the end of the header block")]
    TruncatedHeaders,
    #[error("request head too large")]
    HeaderTooLarge,
    /// Not a failure: the buffer does not hold a full request yet.
    #[error("incomplete request")]
    Incomplete,
}

/// Parses one request from the front of `buf`.
///
/// Returns the request and the number of bytes it occupied. The request line
/// and each header line are validated as soon as they are complete, so a bad
/// request is reported without waiting for the rest of the head.
pub fn parse_http_request(buf: &[u8]) -> Result<(Request, usize), ParseError> {
    let mut lines = Lines { buf, pos: 0 };

    let request_line = match lines.next_line() {
        Some(line) => line,
        None => return Err(incomplete(buf)),
    };
    let (method, target, version) = parse_request_line(request_line)?;

    let mut fields = HeaderFields::default();
    loop {
        let line = match lines.next_line() {
            Some(line) => line,
            None => return Err(incomplete(buf)),
        };
        if line.iter().all(u8::is_ascii_whitespace) {
            break;
        }
        let (key, value) = parse_header_line(line)?;
        fields.insert(key, value);
    }

    let request = Request {
        method,
        target,
        version,
        headers: fields.headers,
        host: fields.host,
        close: fields.close,
    };
    Ok((request, lines.pos))
}

fn incomplete(buf: &[u8]) -> ParseError {
    if buf.len() > MAX_HEAD_BYTES {
        ParseError::HeaderTooLarge
    } else {
        ParseError::Incomplete
    }
}

fn parse_request_line(line: &[u8]) -> Result<(Method, String, String), ParseError> {
    let line = std::str::from_utf8(line).map_err(|_| ParseError::MalformedRequestLine)?;

    let parts: Vec<&str> = line.split(' ').collect();
    let [method, target, version] = parts[..] else {
        return Err(ParseError::MalformedRequestLine);
    };

    let method = Method::from_str(method).ok_or(ParseError::UnsupportedMethod)?;
    if !target.starts_with('/') {
        return Err(ParseError::InvalidTarget);
    }
    if version != HTTP_VERSION {
        return Err(ParseError::UnsupportedVersion);
    }

    Ok((method, target.to_string(), version.to_string()))
}

fn parse_header_line(line: &[u8]) -> Result<(String, String), ParseError> {
    let line = std::str::from_utf8(line).map_err(|_| ParseError::MalformedHeaderLine)?;

    let (key, value) = line.split_once(':').ok_or(ParseError::MalformedHeaderLine)?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ParseError::MalformedHeaderLine);
    }

    Ok((key.to_string(), value.trim().to_string()))
}

/// Splits complete lines off a buffer, accepting both CRLF and bare LF.
struct Lines<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Lines<'a> {
    fn next_line(&mut self) -> Option<&'a [u8]> {
        let rest = &self.buf[self.pos..];
        let end = rest.iter().position(|&b| b == b'\n')?;
        self.pos += end + 1;

        let line = &rest[..end];
        Some(line.strip_suffix(b"\r").unwrap_or(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";

        let (parsed, consumed) = parse_http_request(req).unwrap();

        assert_eq!(parsed.target, "/");
        assert_eq!(parsed.host, "example.com");
        assert_eq!(consumed, req.len());
    }

    #[test]
    fn bad_request_line_reported_before_headers_finish() {
        let req = b"DELETE / HTTP/1.1\r\nHost: exa";

        assert_eq!(parse_http_request(req).unwrap_err(), ParseError::UnsupportedMethod);
    }

    #[test]
    fn oversized_head_is_rejected() {
        let mut req = b"GET / HTTP/1.1\r\nX-Filler: ".to_vec();
        req.extend(std::iter::repeat_n(b'a', MAX_HEAD_BYTES));

        assert_eq!(parse_http_request(&req).unwrap_err(), ParseError::HeaderTooLarge);
    }
}
