use minihttpd::http::parser::{ParseError, find_headers_end, parse_http_request, parse_request_line};
use minihttpd::http::request::Method;

#[test]
fn test_parse_simple_get_request() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let parsed = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, Method::GET);
    assert_eq!(parsed.path, "/");
    assert_eq!(parsed.version, "HTTP/1.1");
}

#[test]
fn test_parse_extracts_path_for_every_method() {
    for method in Method::ALL {
        let req = format!("{method} /some/where?x=1 HTTP/1.1\r\n\r\n");
        let parsed = parse_http_request(req.as_bytes()).unwrap();
        assert_eq!(parsed.method, method);
        assert_eq!(parsed.path, "/some/where?x=1");
    }
}

#[test]
fn test_parse_path_is_not_decoded() {
    let req = b"GET /echo/a%20b HTTP/1.1\r\n\r\n";
    let parsed = parse_http_request(req).unwrap();
    assert_eq!(parsed.path, "/echo/a%20b");
}

#[test]
fn test_parse_user_agent_case_insensitive() {
    let req = b"GET /user-agent HTTP/1.1\r\nHost: localhost\r\nuser-AGENT:   curl/8.4.0  \r\nAccept: */*\r\n\r\n";
    let parsed = parse_http_request(req).unwrap();

    assert_eq!(parsed.header("User-Agent"), Some(&b"curl/8.4.0"[..]));
    assert_eq!(parsed.header("user-agent"), Some(&b"curl/8.4.0"[..]));
    assert_eq!(parsed.user_agent(), Some(&b"curl/8.4.0"[..]));
    // Everything else is skipped
    assert_eq!(parsed.header("Host"), None);
    assert_eq!(parsed.header("Accept"), None);
}

#[test]
fn test_parse_ignores_bytes_after_head() {
    let req = b"POST /echo/x HTTP/1.1\r\nContent-Length: 26\r\n\r\nUser-Agent: from-the-body\r\n";
    let parsed = parse_http_request(req).unwrap();
    assert_eq!(parsed.method, Method::POST);
    assert_eq!(parsed.user_agent(), None);
}

#[test]
fn test_parse_head_without_terminator() {
    // What a connection hands over when the peer closes early.
    let parsed = parse_http_request(b"GET /echo/hi HTTP/1.1\r\nUser-Agent: x").unwrap();
    assert_eq!(parsed.path, "/echo/hi");
    assert_eq!(parsed.user_agent(), Some(&b"x"[..]));

    let parsed = parse_http_request(b"GET / HTTP/1.0").unwrap();
    assert_eq!(parsed.version, "HTTP/1.0");
}

#[test]
fn test_parse_unsupported_method() {
    let result = parse_http_request(b"FOO /x HTTP/1.1\r\n\r\n");
    assert_eq!(result, Err(ParseError::InvalidMethod("FOO".to_string())));

    // Methods are case-sensitive
    assert!(matches!(
        parse_http_request(b"get / HTTP/1.1\r\n\r\n"),
        Err(ParseError::InvalidMethod(_))
    ));
}

#[test]
fn test_parse_empty_first_line() {
    assert_eq!(parse_http_request(b"\n"), Err(ParseError::Empty));
    assert_eq!(parse_http_request(b"\r\n\r\n"), Err(ParseError::Empty));
    assert_eq!(parse_http_request(b""), Err(ParseError::Empty));
}

#[test]
fn test_parse_missing_tokens() {
    assert!(matches!(
        parse_request_line(b"GET"),
        Err(ParseError::InvalidRequestLine(_))
    ));
    assert!(matches!(
        parse_request_line(b"GET /"),
        Err(ParseError::InvalidRequestLine(_))
    ));
    assert!(matches!(
        parse_request_line(b"GET / "),
        Err(ParseError::InvalidVersion(_))
    ));
}

#[test]
fn test_parse_bad_version() {
    for line in [&b"GET / HTTP/"[..], b"GET / FTP/1.1", b"GET / http/1.1"] {
        assert!(
            matches!(parse_request_line(line), Err(ParseError::InvalidVersion(_))),
            "{:?}",
            String::from_utf8_lossy(line)
        );
    }
}

#[test]
fn test_parse_target_must_start_with_slash() {
    assert!(matches!(
        parse_request_line(b"GET echo/x HTTP/1.1"),
        Err(ParseError::InvalidTarget(_))
    ));
}

#[test]
fn test_parse_non_utf8_request_line() {
    assert_eq!(
        parse_request_line(b"GET /\xff HTTP/1.1"),
        Err(ParseError::InvalidEncoding)
    );
}

#[test]
fn test_find_headers_end() {
    assert_eq!(find_headers_end(b"GET / HTTP/1.1\r\n\r\n"), Some(14));
    assert_eq!(find_headers_end(b"GET / HTTP/1.1\r\n"), None);
}
