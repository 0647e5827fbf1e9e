//! Request routing dispatch module
//!
//! Entry point for HTTP request processing, responsible for method
//! validation, SPA forwarding and dispatching to the static file handler.

use crate::config::AppState;
use crate::handler::static_files;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderMap, HeaderValue};
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Upper bound on internal redispatches for a single request
const MAX_FORWARDS: usize = 8;

/// Request headers the static handler needs, extracted once
#[derive(Debug)]
pub struct RequestContext {
    pub is_head: bool,
    pub if_none_match: Option<String>,
    pub range_header: Option<String>,
}

impl RequestContext {
    fn from_headers(headers: &HeaderMap, is_head: bool) -> Self {
        Self {
            is_head,
            if_none_match: header_string(headers, "if-none-match"),
            range_header: header_string(headers, "range"),
        }
    }
}

/// Where a path is dispatched to
#[derive(Debug, PartialEq, Eq)]
pub enum Route<'a> {
    Liveness,
    Readiness,
    /// Client-side route: redispatch internally to the target path
    Forward(&'a str),
    /// Everything else goes to the static file handler
    Static,
}

/// Outcome of dispatching a request, including any internal forward taken
pub struct Dispatched {
    pub response: Response<Full<Bytes>>,
    pub forwarded_to: Option<String>,
}

/// Main entry point for HTTP request handling
///
/// Generic over the request body: bodies are never read, only their
/// declared length is checked.
pub async fn handle_request<B: Body>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = version_label(req.version()).to_string();
    entry.referer = header_string(req.headers(), "referer");
    entry.user_agent = header_string(req.headers(), "user-agent");

    let Dispatched {
        mut response,
        forwarded_to,
    } = process_request(&req, &state).await;

    if let Ok(server) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(hyper::header::SERVER, server);
    }

    if state.config.logging.access_log {
        entry.status = response.status().as_u16();
        entry.body_bytes = usize::try_from(response.body().size_hint().lower()).unwrap_or(0);
        entry.forwarded_to = forwarded_to;
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Run the request pipeline without access logging
pub async fn process_request<B>(req: &Request<B>, state: &AppState) -> Dispatched {
    let method = req.method();

    // 1. Check HTTP method
    if let Some(response) = check_http_method(method, state.config.http.enable_cors) {
        return Dispatched {
            response,
            forwarded_to: None,
        };
    }

    // 2. Check body size
    if let Some(response) = check_body_size(req.headers(), state.config.http.max_body_size) {
        return Dispatched {
            response,
            forwarded_to: None,
        };
    }

    // 3. Dispatch, following internal forwards
    let ctx = RequestContext::from_headers(req.headers(), *method == Method::HEAD);
    dispatch(&ctx, req.uri().path(), state).await
}

/// Resolve a path to its route
pub fn resolve_route<'a>(path: &str, state: &'a AppState) -> Route<'a> {
    let health = &state.config.health;
    if health.enabled {
        if path == health.liveness_path {
            return Route::Liveness;
        }
        if path == health.readiness_path {
            return Route::Readiness;
        }
    }

    match state.forwards.resolve(path) {
        Some(target) => Route::Forward(target),
        None => Route::Static,
    }
}

/// Dispatch `path`, redispatching internally while it resolves to a forward
async fn dispatch(ctx: &RequestContext, path: &str, state: &AppState) -> Dispatched {
    let mut current = path;
    let mut forwarded_to = None;

    for _ in 0..=MAX_FORWARDS {
        let response = match resolve_route(current, state) {
            Route::Liveness => http::build_health_response(true, ctx.is_head),
            Route::Readiness => {
                let ready = state.entry_document().await.is_some();
                if !ready {
                    logger::log_warning("Readiness probe failed: SPA entry document not found");
                }
                http::build_health_response(ready, ctx.is_head)
            }
            Route::Forward(target) => {
                if let Some(pattern) = state.forwards.matching_pattern(current) {
                    logger::log_forward(current, pattern, target);
                }
                forwarded_to = Some(target.to_string());
                current = target;
                continue;
            }
            Route::Static => static_files::serve(ctx, current, state).await,
        };
        return Dispatched {
            response,
            forwarded_to,
        };
    }

    logger::log_error(&format!(
        "Forward limit of {MAX_FORWARDS} exceeded for '{path}'"
    ));
    Dispatched {
        response: http::build_500_response(),
        forwarded_to,
    }
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method, enable_cors: bool) -> Option<Response<Full<Bytes>>> {
    match method {
        &Method::GET | &Method::HEAD => None,
        &Method::OPTIONS => Some(http::build_options_response(enable_cors)),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(headers: &HeaderMap, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = headers.get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use http_body_util::{BodyExt, Empty};
    use hyper::StatusCode;

    const INDEX: &str = "<!doctype html><div id=\"app\"></div>";

    struct Site {
        _dir: tempfile::TempDir,
        state: Arc<AppState>,
    }

    fn site_with(extra_toml: &str) -> Site {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), INDEX).unwrap();
        std::fs::create_dir(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets/app.js"), "boot()").unwrap();

        let toml = format!(
            "[logging]\naccess_log = false\n[spa]\nstatic_dir = {:?}\n{extra_toml}",
            dir.path().to_str().unwrap()
        );
        let cfg = Config::from_toml(&toml).unwrap();
        Site {
            _dir: dir,
            state: Arc::new(AppState::new(cfg).unwrap()),
        }
    }

    fn site() -> Site {
        site_with("")
    }

    fn get(path: &str) -> Request<Empty<Bytes>> {
        Request::get(path).body(Empty::new()).unwrap()
    }

    async fn send(site: &Site, req: Request<Empty<Bytes>>) -> Response<Full<Bytes>> {
        let peer: SocketAddr = "127.0.0.1:40000".parse().unwrap();
        handle_request(req, Arc::clone(&site.state), peer)
            .await
            .unwrap()
    }

    async fn body_string(resp: Response<Full<Bytes>>) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_literal_routes_serve_entry_document() {
        let site = site();
        for path in ["/search", "/reservations", "/dashboard", "/flights"] {
            let resp = send(&site, get(path)).await;
            assert_eq!(resp.status(), StatusCode::OK, "path {path}");
            assert!(resp.headers().get("location").is_none());
            assert_eq!(body_string(resp).await, INDEX);
        }
    }

    #[tokio::test]
    async fn test_booking_subtree_serves_entry_document() {
        let site = site();
        for path in ["/booking", "/booking/", "/booking/SKY42", "/booking/SKY42/seats?row=4"] {
            let resp = send(&site, get(path)).await;
            assert_eq!(resp.status(), StatusCode::OK, "path {path}");
            assert_eq!(body_string(resp).await, INDEX);
        }
    }

    #[tokio::test]
    async fn test_forward_matches_direct_root_request() {
        let site = site();
        let root = send(&site, get("/")).await;
        let forwarded = send(&site, get("/flights")).await;
        assert_eq!(root.headers()["etag"], forwarded.headers()["etag"]);
        assert_eq!(forwarded.headers()["cache-control"], "no-cache");
        assert_eq!(body_string(root).await, body_string(forwarded).await);
    }

    #[tokio::test]
    async fn test_forward_is_idempotent() {
        let site = site();
        let mut bodies = Vec::new();
        for _ in 0..5 {
            let dispatched = process_request(&get("/booking/abc"), &site.state).await;
            assert_eq!(dispatched.forwarded_to.as_deref(), Some("/"));
            bodies.push(body_string(dispatched.response).await);
        }
        assert!(bodies.iter().all(|b| b == INDEX));
    }

    #[tokio::test]
    async fn test_unrelated_path_not_forwarded() {
        let site = site();
        let dispatched = process_request(&get("/about"), &site.state).await;
        assert!(dispatched.forwarded_to.is_none());
        assert_eq!(dispatched.response.status(), StatusCode::NOT_FOUND);

        let dispatched = process_request(&get("/bookings"), &site.state).await;
        assert!(dispatched.forwarded_to.is_none());
        assert_eq!(dispatched.response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_assets_served_directly() {
        let site = site();
        let dispatched = process_request(&get("/assets/app.js"), &site.state).await;
        assert!(dispatched.forwarded_to.is_none());
        let resp = dispatched.response;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "application/javascript");
        assert_eq!(resp.headers()["cache-control"], "public, max-age=3600");
    }

    #[tokio::test]
    async fn test_head_forward_has_no_body() {
        let site = site();
        let req = Request::head("/dashboard").body(Empty::new()).unwrap();
        let resp = send(&site, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-length"], INDEX.len().to_string().as_str());
        assert!(body_string(resp).await.is_empty());
    }

    #[tokio::test]
    async fn test_conditional_forward_returns_304() {
        let site = site();
        let etag = send(&site, get("/search")).await.headers()["etag"].clone();
        let req = Request::get("/search")
            .header("if-none-match", etag)
            .body(Empty::new())
            .unwrap();
        assert_eq!(send(&site, req).await.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn test_method_checks() {
        let site = site();
        let req = Request::post("/search").body(Empty::new()).unwrap();
        assert_eq!(send(&site, req).await.status(), StatusCode::METHOD_NOT_ALLOWED);

        let req = Request::options("/search").body(Empty::new()).unwrap();
        assert_eq!(send(&site, req).await.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_body_size_limit() {
        let site = site_with("[http]\nmax_body_size = 10");
        let req = Request::get("/search")
            .header("content-length", "11")
            .body(Empty::new())
            .unwrap();
        assert_eq!(send(&site, req).await.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_health_probes() {
        let site = site();
        assert_eq!(send(&site, get("/healthz")).await.status(), StatusCode::OK);
        assert_eq!(send(&site, get("/readyz")).await.status(), StatusCode::OK);

        std::fs::remove_file(site.state.static_root.join("index.html")).unwrap();
        assert_eq!(
            send(&site, get("/readyz")).await.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        // Liveness does not depend on the document
        assert_eq!(send(&site, get("/healthz")).await.status(), StatusCode::OK);
        // Forwarded routes fall through to 404 once the document is gone
        assert_eq!(send(&site, get("/search")).await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_custom_forward_paths_and_target() {
        let site = site_with("forward_paths = [\"/app/**\"]\nforward_target = \"/index.html\"");
        let dispatched = process_request(&get("/app/profile"), &site.state).await;
        assert_eq!(dispatched.forwarded_to.as_deref(), Some("/index.html"));
        assert_eq!(body_string(dispatched.response).await, INDEX);

        // Defaults are replaced, not merged
        let dispatched = process_request(&get("/search"), &site.state).await;
        assert!(dispatched.forwarded_to.is_none());
    }

    #[tokio::test]
    async fn test_server_header() {
        let site = site_with("[http]\nserver_name = \"skyline-test\"");
        let resp = send(&site, get("/search")).await;
        assert_eq!(resp.headers()["server"], "skyline-test");
    }

    #[test]
    fn test_resolve_route() {
        let site = site();
        assert_eq!(resolve_route("/healthz", &site.state), Route::Liveness);
        assert_eq!(resolve_route("/readyz", &site.state), Route::Readiness);
        assert_eq!(resolve_route("/flights", &site.state), Route::Forward("/"));
        assert_eq!(resolve_route("/", &site.state), Route::Static);
        assert_eq!(resolve_route("/about", &site.state), Route::Static);
    }
}
