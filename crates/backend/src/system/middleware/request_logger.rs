use axum::body::{to_bytes, Body};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

/// Logs method, path, status, response size and latency of every request.
pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let start = std::time::Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;
    let (parts, body) = response.into_parts();

    // Buffer the body to report its real size.
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(b) => b,
        Err(e) => {
            tracing::error!(
                %method,
                %path,
                status = parts.status.as_u16(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "response body failed: {}",
                e
            );
            return Response::from_parts(parts, Body::default());
        }
    };

    let status = parts.status.as_u16();
    let elapsed_ms = start.elapsed().as_millis() as u64;
    if parts.status.is_server_error() {
        tracing::warn!(%method, %path, status, bytes = bytes.len(), elapsed_ms, "request");
    } else {
        tracing::info!(%method, %path, status, bytes = bytes.len(), elapsed_ms, "request");
    }

    Response::from_parts(parts, Body::from(bytes))
}
