//! Static file serving module
//!
//! Serves the built single-page application: the entry document for `/`
//! (and every forwarded client-side route) plus its assets.

use crate::config::AppState;
use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime, response, CachePolicy, RangeParseResult};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::{Path, PathBuf};
use tokio::fs;

/// A file read from the static root
#[derive(Debug)]
pub struct StaticFile {
    pub path: PathBuf,
    pub content: Vec<u8>,
    pub content_type: &'static str,
}

/// Serve `path` from the static root, answering 404 when nothing is there
pub async fn serve(ctx: &RequestContext, path: &str, state: &AppState) -> Response<Full<Bytes>> {
    match load_from_directory(&state.static_root, path, &state.config.spa.index_files).await {
        Some(file) => {
            logger::log_debug(&format!("[Static] {path} -> {}", file.path.display()));
            let policy = CachePolicy::for_content_type(file.content_type, state.config.spa.asset_max_age);
            build_static_file_response(file.content, file.content_type, policy, ctx)
        }
        None => http::build_404_response(),
    }
}

/// Load a file below `static_dir`, resolving directories through `index_files`
///
/// Returns `None` for missing files and for paths escaping the root.
pub async fn load_from_directory(
    static_dir: &Path,
    path: &str,
    index_files: &[String],
) -> Option<StaticFile> {
    let relative_path = path.trim_start_matches('/');

    let static_dir_canonical = match fs::canonicalize(static_dir).await {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Static directory not found or inaccessible '{}': {e}",
                static_dir.display()
            ));
            return None;
        }
    };

    let mut file_path = static_dir_canonical.join(relative_path);

    // Directory requests (including "/") resolve to the first index file present
    let is_dir = fs::metadata(&file_path).await.is_ok_and(|m| m.is_dir());
    if is_dir || relative_path.is_empty() || relative_path.ends_with('/') {
        let mut found = None;
        for index_file in index_files {
            let candidate = file_path.join(index_file);
            if fs::metadata(&candidate).await.is_ok_and(|m| m.is_file()) {
                found = Some(candidate);
                break;
            }
        }
        file_path = found?;
    }

    // File not found is common (404), no need to log at warning level
    let file_path_canonical = fs::canonicalize(&file_path).await.ok()?;
    if !file_path_canonical.starts_with(&static_dir_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            path,
            file_path_canonical.display()
        ));
        return None;
    }

    if !fs::metadata(&file_path_canonical).await.is_ok_and(|m| m.is_file()) {
        return None;
    }

    let content = match fs::read(&file_path_canonical).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read file '{}': {}",
                file_path_canonical.display(),
                e
            ));
            return None;
        }
    };

    let content_type =
        mime::get_content_type(file_path_canonical.extension().and_then(|e| e.to_str()));

    Some(StaticFile {
        path: file_path_canonical,
        content,
        content_type,
    })
}

/// Build static file response with `ETag` and Range support
fn build_static_file_response(
    data: Vec<u8>,
    content_type: &str,
    policy: CachePolicy,
    ctx: &RequestContext,
) -> Response<Full<Bytes>> {
    let etag = cache::generate_etag(&data);
    let total_size = data.len();

    // Check if client has cached version
    if cache::check_etag_match(ctx.if_none_match.as_deref(), &etag) {
        return response::build_304_response(&etag, policy);
    }

    match http::parse_range_header(ctx.range_header.as_deref(), total_size) {
        RangeParseResult::Valid(range) => {
            let body = if ctx.is_head {
                Bytes::new()
            } else {
                Bytes::copy_from_slice(&data[range.start..=range.end])
            };
            response::build_partial_response(
                body,
                content_type,
                &etag,
                policy,
                range.start,
                range.end,
                total_size,
                ctx.is_head,
            )
        }
        RangeParseResult::NotSatisfiable => response::build_416_response(total_size),
        RangeParseResult::None => {
            response::build_file_response(Bytes::from(data), content_type, &etag, policy, ctx.is_head)
        }
    }
}
