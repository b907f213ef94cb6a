mod common;

use minihttpd::files::FileStore;
use minihttpd::http::request::{Method, Request, RequestBuilder};
use minihttpd::http::response::StatusCode;
use minihttpd::routing::Router;

fn request(method: Method, path: &str) -> Request {
    RequestBuilder::new().method(method).path(path).build().unwrap()
}

fn router() -> Router {
    Router::new(FileStore::new(common::temp_root("router")))
}

#[tokio::test]
async fn test_root_ignores_headers() {
    let req = RequestBuilder::new()
        .method(Method::GET)
        .path("/")
        .header("User-Agent", "anything")
        .build()
        .unwrap();

    let resp = router().dispatch(&req).await;
    assert_eq!(resp.status, StatusCode::Ok);
    assert!(resp.headers.is_empty());
    assert!(resp.body.is_empty());
}

#[tokio::test]
async fn test_echo_returns_raw_remainder() {
    for s in ["abc", "hello%20world", "a/b/c", "ünïcödé", ""] {
        let resp = router().dispatch(&request(Method::GET, &format!("/echo/{s}"))).await;
        assert_eq!(resp.status, StatusCode::Ok);
        assert_eq!(resp.header("Content-Type"), Some("text/plain"));
        assert_eq!(&resp.body[..], s.as_bytes());
        assert_eq!(resp.header("Content-Length"), Some(s.len().to_string().as_str()));
    }
}

#[tokio::test]
async fn test_echo_without_trailing_slash_is_404() {
    let resp = router().dispatch(&request(Method::GET, "/echo")).await;
    assert_eq!(resp.status, StatusCode::NotFound);
}

#[tokio::test]
async fn test_user_agent_reflected() {
    let req = RequestBuilder::new()
        .method(Method::GET)
        .path("/user-agent")
        .header("user-agent", "foobar/1.2.3")
        .build()
        .unwrap();

    let resp = router().dispatch(&req).await;
    assert_eq!(resp.status, StatusCode::Ok);
    assert_eq!(resp.header("Content-Type"), Some("text/plain"));
    assert_eq!(&resp.body[..], b"foobar/1.2.3");
    assert_eq!(resp.header("Content-Length"), Some("12"));
}

#[tokio::test]
async fn test_user_agent_missing_is_404() {
    let resp = router().dispatch(&request(Method::GET, "/user-agent")).await;
    assert_eq!(resp.status, StatusCode::NotFound);
    assert!(resp.body.is_empty());
}

#[tokio::test]
async fn test_user_agent_path_must_match_exactly() {
    let req = RequestBuilder::new()
        .method(Method::GET)
        .path("/user-agent/extra")
        .header("User-Agent", "x")
        .build()
        .unwrap();
    let resp = router().dispatch(&req).await;
    assert_eq!(resp.status, StatusCode::NotFound);
}

#[tokio::test]
async fn test_files_served_as_octet_stream() {
    let root = common::temp_root("router-files");
    let data = b"line one\r\n\x00\x01binary\xfe\xff".to_vec();
    std::fs::write(root.join("report.txt"), &data).unwrap();
    let router = Router::new(FileStore::new(&root));

    let resp = router.dispatch(&request(Method::GET, "/files/report.txt")).await;
    assert_eq!(resp.status, StatusCode::Ok);
    assert_eq!(resp.header("Content-Type"), Some("application/octet-stream"));
    assert_eq!(resp.header("Content-Length"), Some(data.len().to_string().as_str()));
    assert_eq!(&resp.body[..], &data[..]);
}

#[tokio::test]
async fn test_files_missing_is_404() {
    let resp = router().dispatch(&request(Method::GET, "/files/nonexistent")).await;
    assert_eq!(resp.status, StatusCode::NotFound);
    assert!(resp.headers.is_empty());
}

#[tokio::test]
async fn test_files_traversal_is_404() {
    let parent = common::temp_root("router-escape");
    let root = parent.join("served");
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(parent.join("secret"), b"s").unwrap();
    let router = Router::new(FileStore::new(&root));

    for path in ["/files/../secret", "/files/a/../../secret", "/files/", "/files//etc/passwd"] {
        let resp = router.dispatch(&request(Method::GET, path)).await;
        assert_eq!(resp.status, StatusCode::NotFound, "{path}");
    }
}

#[tokio::test]
async fn test_unknown_path_is_404() {
    let resp = router().dispatch(&request(Method::GET, "/does-not-exist")).await;
    assert_eq!(resp.status, StatusCode::NotFound);
    assert!(resp.body.is_empty());
}

#[tokio::test]
async fn test_method_does_not_affect_routing() {
    for method in Method::ALL {
        let resp = router().dispatch(&request(method, "/echo/same")).await;
        assert_eq!(resp.status, StatusCode::Ok);
        assert_eq!(&resp.body[..], b"same");
    }
}
