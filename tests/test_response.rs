use std::time::{Duration, SystemTime};

use vhostd::http::response::{Response, ResponseBuilder, StatusCode, http_date};

#[test]
fn test_status_code_as_u16() {
    assert_eq!(StatusCode::Ok.as_u16(), 200);
    assert_eq!(StatusCode::BadRequest.as_u16(), 400);
    assert_eq!(StatusCode::NotFound.as_u16(), 404);
}

#[test]
fn test_status_code_reason_phrase() {
    assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    assert_eq!(StatusCode::BadRequest.reason_phrase(), "Bad Request");
    assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
}

#[test]
fn test_http_date_format() {
    let t = SystemTime::UNIX_EPOCH + Duration::from_secs(784111777);

    assert_eq!(http_date(t), "Sun, 06 Nov 1994 08:49:37 GMT");
}

#[test]
fn test_response_builder_always_sets_date() {
    let response = ResponseBuilder::new(StatusCode::Ok).build();

    assert_eq!(response.version, "HTTP/1.1");
    let date = response.headers.get("Date").unwrap();
    assert!(date.ends_with(" GMT"));
    assert!(httpdate::parse_http_date(date).is_ok());
}

#[test]
fn test_response_builder_keeps_explicit_date() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Date", "Sun, 06 Nov 1994 08:49:37 GMT")
        .build();

    assert_eq!(response.headers.get("Date").unwrap(), "Sun, 06 Nov 1994 08:49:37 GMT");
}

#[test]
fn test_response_builder_with_headers_and_payload() {
    let response = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", "text/plain")
        .header("Content-Length", "4")
        .payload("/srv/www/a.txt")
        .build();

    assert_eq!(response.headers.get("Content-Type").unwrap(), "text/plain");
    assert_eq!(response.headers.len(), 3); // 2 custom + Date
    assert_eq!(response.payload.as_deref(), Some(std::path::Path::new("/srv/www/a.txt")));
    assert!(!response.closes());
}

#[test]
fn test_response_bad_request_closes() {
    let response = Response::bad_request();

    assert_eq!(response.status, StatusCode::BadRequest);
    assert_eq!(response.headers.get("Connection").unwrap(), "close");
    assert!(response.closes());
    assert!(response.payload.is_none());
}

#[test]
fn test_response_not_found_follows_request_preference() {
    let open = Response::not_found(false);
    let closing = Response::not_found(true);

    assert_eq!(open.status, StatusCode::NotFound);
    assert!(!open.closes());
    assert!(!open.headers.contains_key("Connection"));
    assert!(closing.closes());
    assert!(open.payload.is_none());
}
