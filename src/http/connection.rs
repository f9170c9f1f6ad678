use std::sync::Arc;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{Instant, timeout_at};

use crate::config::VirtualHosts;
use crate::http::handler::build_response;
use crate::http::parser::{ParseError, parse_http_request};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;

const READ_CHUNK: usize = 4096;

/// One accepted connection, driven through request/response exchanges until
/// either side ends it.
pub struct Connection<S> {
    stream: S,
    buffer: BytesMut,
    hosts: Arc<VirtualHosts>,
    idle_timeout: Duration,
    state: ConnectionState,
}

pub enum ConnectionState {
    AwaitingRequest,
    Routing(Request),
    Responding(ResponseWriter, bool), // bool = close after writing?
    Closed,
}

/// What came off the wire while waiting for a request.
enum Incoming {
    Request(Request),
    Malformed(ParseError),
    /// Peer went quiet or hung up between requests
    Idle,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, hosts: Arc<VirtualHosts>, idle_timeout: Duration) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            hosts,
            idle_timeout,
            state: ConnectionState::AwaitingRequest,
        }
    }

    /// Serves requests until the connection closes. The stream is released
    /// when this returns, whether or not it returns an error.
    pub async fn run(mut self) -> anyhow::Result<()> {
        loop {
            let state = std::mem::replace(&mut self.state, ConnectionState::Closed);

            self.state = match state {
                ConnectionState::AwaitingRequest => match self.read_request().await? {
                    Incoming::Request(req) => ConnectionState::Routing(req),
                    Incoming::Malformed(e) => {
                        tracing::debug!(error = %e, "Malformed request");
                        let response = Response::bad_request();
                        ConnectionState::Responding(ResponseWriter::new(&response), true)
                    }
                    Incoming::Idle => ConnectionState::Closed,
                },

                ConnectionState::Routing(req) => {
                    let doc_root = self.hosts.lookup(&req.host);
                    let response = build_response(doc_root, &req).await;

                    tracing::info!(
                        host = %req.host,
                        request_target = %req.target,
                        status = response.status.as_u16(),
                        "Request served"
                    );

                    let close = req.close || response.closes();
                    ConnectionState::Responding(ResponseWriter::new(&response), close)
                }

                ConnectionState::Responding(writer, close) => {
                    writer.write_to_stream(&mut self.stream).await?;

                    if close {
                        ConnectionState::Closed
                    } else {
                        ConnectionState::AwaitingRequest
                    }
                }

                ConnectionState::Closed => {
                    let _ = self.stream.shutdown().await;
                    return Ok(());
                }
            };
        }
    }

    /// Reads until a full request head is buffered, a parse error shows up,
    /// or the idle deadline passes.
    ///
    /// The deadline is armed once per request and covers every read made
    /// while assembling it.
    async fn read_request(&mut self) -> anyhow::Result<Incoming> {
        let deadline = Instant::now() + self.idle_timeout;

        loop {
            // Try parsing whatever we already have
            match parse_http_request(&self.buffer) {
                Ok((request, consumed)) => {
                    self.buffer.advance(consumed);
                    return Ok(Incoming::Request(request));
                }
                Err(ParseError::Incomplete) => {}
                Err(e) => return Ok(Incoming::Malformed(e)),
            }

            self.buffer.reserve(READ_CHUNK);
            let n = match timeout_at(deadline, self.stream.read_buf(&mut self.buffer)).await {
                Ok(read) => read?,
                Err(_) => {
                    tracing::debug!(buffered = self.buffer.len(), "Idle timeout");
                    return Ok(Incoming::Idle);
                }
            };

            if n == 0 {
                if self.buffer.is_empty() {
                    // Client closed connection between requests
                    return Ok(Incoming::Idle);
                }
                return Ok(Incoming::Malformed(ParseError::TruncatedHeaders));
            }
        }
    }
}
