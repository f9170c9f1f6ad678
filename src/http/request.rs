use std::collections::HashMap;

/// The protocol version token accepted on the request line.
pub const HTTP_VERSION: &str = "HTTP/1.1";

/// HTTP request methods.
///
/// The server is read-only, so `GET` is the only verb it accepts. Anything
/// else is rejected by the parser with a 400.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
}

/// Represents a parsed HTTP request from a client.
///
/// Contains all information extracted from the HTTP request line and headers.
/// Requests never carry a body.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method
    pub method: Method,
    /// The raw request target as received (e.g., "/index.html")
    pub target: String,
    /// HTTP version, always "HTTP/1.1" once parsed
    pub version: String,
    /// Request headers, names stored as received
    pub headers: HashMap<String, String>,
    /// Value of the `Host` header, empty if absent
    pub host: String,
    /// True iff the client sent `Connection: close`
    pub close: bool,
}

/// Builder for constructing Request objects.
pub struct RequestBuilder {
    method: Method,
    target: Option<String>,
    version: Option<String>,
    headers: Vec<(String, String)>,
}

impl Method {
    /// Parses an HTTP method from a string.
    ///
    /// # Example
    ///
    /// ```
    /// # use vhostd::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), None);
    /// assert_eq!(Method::from_str("POST"), None);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
        }
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: Method::GET,
            target: None,
            version: None,
            headers: Vec::new(),
        }
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        let target = self.target.ok_or("target missing")?;
        if !target.starts_with('/') {
            return Err("target must start with '/'");
        }

        let mut fields = HeaderFields::default();
        for (key, value) in self.headers {
            fields.insert(key, value);
        }

        Ok(Request {
            method: self.method,
            target,
            version: self.version.unwrap_or_else(|| HTTP_VERSION.to_string()),
            headers: fields.headers,
            host: fields.host,
            close: fields.close,
        })
    }
}

/// Header accumulator shared by the parser and the builder.
///
/// `Host` and `Connection` are tracked as they arrive so that the last
/// occurrence wins even when duplicates differ in case.
#[derive(Debug, Default)]
pub(crate) struct HeaderFields {
    pub(crate) headers: HashMap<String, String>,
    pub(crate) host: String,
    pub(crate) close: bool,
}

impl HeaderFields {
    pub(crate) fn insert(&mut self, key: String, value: String) {
        if key.eq_ignore_ascii_case("Host") {
            self.host = value.clone();
        } else if key.eq_ignore_ascii_case("Connection") {
            self.close = value == "close";
        }
        // One entry per name regardless of case, holding the last value
        self.headers.retain(|k, _| !k.eq_ignore_ascii_case(&key));
        self.headers.insert(key, value);
    }
}

impl Request {
    /// Retrieves a header value by name, ignoring ASCII case.
    ///
    /// # Returns
    ///
    /// `Some(&str)` with the header value if present, `None` otherwise.
    pub fn header(&self, key: &str) -> Option<&str> {
        if let Some(v) = self.headers.get(key) {
            return Some(v.as_str());
        }
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Whether the connection may stay open after answering this request.
    ///
    /// Only an explicit `Connection: close` ends it; any other value,
    /// including none at all, keeps the connection alive.
    pub fn keep_alive(&self) -> bool {
        !self.close
    }
}
