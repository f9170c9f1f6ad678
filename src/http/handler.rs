//! Maps a parsed request onto a file under its host's document root.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tokio::fs;

use crate::http::mime;
use crate::http::request::Request;
use crate::http::response::{Response, ResponseBuilder, StatusCode, http_date};

const INDEX_FILE: &str = "index.html";

/// Builds the response for `req` against `doc_root`.
///
/// `None` means the host is not configured. That case, a missing file, a
/// directory, and any target escaping the root all produce the same 404.
pub async fn build_response(doc_root: Option<&Path>, req: &Request) -> Response {
    let Some(doc_root) = doc_root else {
        tracing::debug!(host = %req.host, "Unknown virtual host");
        return Response::not_found(req.close);
    };

    let Some(path) = resolve(doc_root, &req.target).await else {
        tracing::debug!(request_target = %req.target, "Target did not resolve to a file under the root");
        return Response::not_found(req.close);
    };

    let meta = match fs::File::open(&path).await {
        Ok(file) => match file.metadata().await {
            Ok(meta) => meta,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Stat failed");
                return Response::not_found(req.close);
            }
        },
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Open failed");
            return Response::not_found(req.close);
        }
    };
    if !meta.is_file() {
        return Response::not_found(req.close);
    }

    let modified = meta.modified().unwrap_or_else(|_| SystemTime::now());

    let mut builder = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Length", meta.len().to_string())
        .header("Content-Type", mime::type_for_path(&path))
        .header("Last-Modified", http_date(modified))
        .payload(path);
    if req.close {
        builder = builder.close();
    }
    builder.build()
}

/// Joins `target` onto `doc_root` and canonicalizes it, returning `None`
/// when the file does not exist or lies outside the root.
async fn resolve(doc_root: &Path, target: &str) -> Option<PathBuf> {
    let mut candidate = doc_root.join(target.trim_start_matches('/'));
    if target.ends_with('/') {
        candidate.push(INDEX_FILE);
    }

    let root = fs::canonicalize(doc_root).await.ok()?;
    let canonical = fs::canonicalize(&candidate).await.ok()?;

    canonical.starts_with(&root).then_some(canonical)
}
