use std::collections::HashMap;
use std::path::PathBuf;
use std::time::SystemTime;

use crate::http::request::HTTP_VERSION;

/// HTTP status codes the server can answer with.
///
/// - `Ok` (200): File found and served
/// - `BadRequest` (400): Malformed request
/// - `NotFound` (404): Unknown host, missing file, or a target outside the root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use vhostd::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
        }
    }
}

/// Formats a timestamp as an HTTP date (`Sun, 06 Nov 1994 08:49:37 GMT`).
pub fn http_date(time: SystemTime) -> String {
    httpdate::fmt_http_date(time)
}

/// A response ready to be serialized.
///
/// The body is never held in memory: when `payload` is set, the writer
/// streams that file after the head.
#[derive(Debug, Clone)]
pub struct Response {
    pub version: &'static str,
    pub status: StatusCode,
    pub headers: HashMap<String, String>,
    /// File whose bytes form the body; only set on 200 responses
    pub payload: Option<PathBuf>,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```ignore
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .header("Content-Type", "text/html")
///     .payload(path)
///     .build();
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    headers: HashMap<String, String>,
    payload: Option<PathBuf>,
}

impl ResponseBuilder {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            payload: None,
        }
    }

    /// Adds or replaces a header.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets the file to stream as the body.
    pub fn payload(mut self, path: impl Into<PathBuf>) -> Self {
        self.payload = Some(path.into());
        self
    }

    /// Marks the response as the last one on its connection.
    pub fn close(self) -> Self {
        self.header("Connection", "close")
    }

    /// Builds the final Response, stamping `Date` if not already present.
    pub fn build(mut self) -> Response {
        self.headers
            .entry("Date".to_string())
            .or_insert_with(|| http_date(SystemTime::now()));

        Response {
            version: HTTP_VERSION,
            status: self.status,
            headers: self.headers,
            payload: self.payload,
        }
    }
}

impl Response {
    /// A 400 response. Always closes the connection, since nothing after a
    /// malformed request can be trusted to start a new one.
    pub fn bad_request() -> Self {
        ResponseBuilder::new(StatusCode::BadRequest).close().build()
    }

    /// A 404 response, closing the connection only if the client asked.
    pub fn not_found(close: bool) -> Self {
        let mut builder = ResponseBuilder::new(StatusCode::NotFound);
        if close {
            builder = builder.close();
        }
        builder.build()
    }

    /// Whether this response tells the client the connection is ending.
    pub fn closes(&self) -> bool {
        self.headers
            .get("Connection")
            .is_some_and(|v| v == "close")
    }
}
