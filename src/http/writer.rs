use std::path::PathBuf;

use anyhow::Context;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::http::response::Response;

/// Renders the status line, sorted headers, and blank line.
pub fn serialize_head(resp: &Response) -> Vec<u8> {
    let mut buf = Vec::new();

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        resp.version,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers, in name order so output does not depend on map iteration
    let mut headers: Vec<_> = resp.headers.iter().collect();
    headers.sort_by(|a, b| a.0.cmp(b.0));

    for (k, v) in headers {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf
}

pub struct ResponseWriter {
    head: Vec<u8>,
    payload: Option<(PathBuf, u64)>,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        let payload = response.payload.clone().map(|path| {
            let len = response
                .headers
                .get("Content-Length")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            (path, len)
        });

        Self {
            head: serialize_head(response),
            payload,
        }
    }

    /// Writes the head, then exactly `Content-Length` bytes of the payload.
    ///
    /// Any failure here is a transport error: the response is abandoned
    /// part-way and the caller must drop the connection.
    pub async fn write_to_stream<W>(&self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        stream.write_all(&self.head).await?;

        if let Some((path, len)) = &self.payload {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening payload {}", path.display()))?;

            let copied = tokio::io::copy(&mut file.take(*len), stream)
                .await
                .with_context(|| format!("streaming payload {}", path.display()))?;
            if copied != *len {
                anyhow::bail!(
                    "payload {} shrank while streaming: wrote {copied} of {len} bytes",
                    path.display()
                );
            }
        }

        stream.flush().await?;
        Ok(())
    }
}
