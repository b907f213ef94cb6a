use bytes::Bytes;
use thiserror::Error;

use crate::http::request::{Headers, Method, Request, USER_AGENT};

/// Headers kept on the parsed request. Other lines are skipped unread.
const CAPTURED_HEADERS: &[&str] = &[USER_AGENT];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty request line")]
    Empty,

    #[error("request line is not valid UTF-8")]
    InvalidEncoding,

    /// Wrong number of tokens or stray whitespace.
    #[error("malformed request line: {0:?}")]
    InvalidRequestLine(String),

    #[error("unsupported method: {0:?}")]
    InvalidMethod(String),

    #[error("invalid request target: {0:?}")]
    InvalidTarget(String),

    #[error("invalid protocol version: {0:?}")]
    InvalidVersion(String),

    /// The size limit was reached before the request line ended.
    #[error("request line exceeds {0} bytes")]
    RequestLineTooLong(usize),
}

/// Parses a request head.
///
/// `buf` is whatever the connection collected: normally everything up to and
/// including `\r\n\r\n`, but a head cut short by end of stream is parsed as
/// far as it goes. Bytes after the blank line are ignored.
pub fn parse_http_request(buf: &[u8]) -> Result<Request, ParseError> {
    let head = match find_headers_end(buf) {
        Some(end) => &buf[..end],
        None => buf,
    };

    let (line, rest) = match head.iter().position(|&b| b == b'\n') {
        Some(nl) => (&head[..nl], &head[nl + 1..]),
        None => (head, &head[head.len()..]),
    };

    let (method, path, version) = parse_request_line(line)?;
    let headers = scan_headers(rest);

    Ok(Request {
        method,
        path,
        version,
        headers,
    })
}

/// Parses a head that filled the size limit without a blank line.
///
/// Only lines that ended with `\n` are used; the partial line the limit cut
/// through is dropped, so a half-received header is never captured.
pub fn parse_truncated_request(buf: &[u8]) -> Result<Request, ParseError> {
    let last_nl = buf
        .iter()
        .rposition(|&b| b == b'\n')
        .ok_or(ParseError::RequestLineTooLong(buf.len()))?;
    parse_http_request(&buf[..=last_nl])
}

/// Splits `<METHOD> <TARGET> HTTP/<version>` on its two single spaces.
///
/// A trailing `\r` is dropped before tokenizing.
pub fn parse_request_line(line: &[u8]) -> Result<(Method, String, String), ParseError> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    if line.is_empty() {
        return Err(ParseError::Empty);
    }

    let line = std::str::from_utf8(line).map_err(|_| ParseError::InvalidEncoding)?;

    let (method_str, rest) = line
        .split_once(' ')
        .ok_or_else(|| ParseError::InvalidRequestLine(line.to_string()))?;
    let (target, version) = rest
        .split_once(' ')
        .ok_or_else(|| ParseError::InvalidRequestLine(line.to_string()))?;

    if method_str.is_empty() || target.is_empty() || version.contains(' ') {
        return Err(ParseError::InvalidRequestLine(line.to_string()));
    }

    let method =
        Method::from_str(method_str).ok_or_else(|| ParseError::InvalidMethod(method_str.to_string()))?;

    if !target.starts_with('/') {
        return Err(ParseError::InvalidTarget(target.to_string()));
    }

    match version.strip_prefix("HTTP/") {
        Some(v) if !v.is_empty() && !v.chars().any(char::is_whitespace) => {}
        _ => return Err(ParseError::InvalidVersion(version.to_string())),
    }

    Ok((method, target.to_string(), version.to_string()))
}

/// Returns the request line if the first `\n` has arrived.
///
/// Lets the connection reject a bad request line before the rest of the
/// head shows up.
pub fn first_line(buf: &[u8]) -> Option<&[u8]> {
    buf.iter().position(|&b| b == b'\n').map(|nl| &buf[..nl])
}

/// Offset of the `\r\n\r\n` that ends the head, if present.
pub fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

fn scan_headers(block: &[u8]) -> Headers {
    let mut headers = Headers::new();

    for line in block.split(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        let Some(colon) = line.iter().position(|&b| b == b':') else {
            continue;
        };

        // Values are kept as raw octets; obs-text is reflected unchanged.
        let name = line[..colon].trim_ascii();
        if let Some(wanted) = CAPTURED_HEADERS
            .iter()
            .find(|h| h.as_bytes().eq_ignore_ascii_case(name))
        {
            let value = line[colon + 1..].trim_ascii();
            headers.insert(*wanted, Bytes::copy_from_slice(value));
        }
    }

    headers
}
