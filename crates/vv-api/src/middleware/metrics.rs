//! # Request Metrics
//!
//! Per-request counters and latency histograms recorded through the
//! `metrics` facade. The Prometheus exporter installed in `main` picks
//! them up; tests run without a recorder and the macros become no-ops.

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

use vv_core::VibeId;

/// Middleware recording `http_requests_total` and
/// `http_request_duration_seconds`, labeled by method, path, and status.
///
/// Paths are normalized before labeling so each vibe id does not mint its
/// own metric series.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    let labels = [("method", method), ("path", path), ("status", status)];
    metrics::counter!("http_requests_total", &labels).increment(1);
    metrics::histogram!("http_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());

    response
}

/// Collapse vibe identifiers in a request path to a `{id}` placeholder.
///
/// Ids only ever appear directly after a `vibes` or `metadata` segment
/// (`/v1/vibes/{id}`, `/media/vibes/{id}.svg`, `/media/metadata/{id}.json`),
/// so only those positions are inspected. That positional check matters:
/// the literal segment "metadata" is itself eight characters of the id
/// alphabet and would otherwise be rewritten.
fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').collect();
    let mut out: Vec<String> = Vec::with_capacity(segments.len());

    for (i, segment) in segments.iter().enumerate() {
        let prev = if i > 0 { segments[i - 1] } else { "" };
        if (prev == "vibes" || prev == "metadata") && !segment.is_empty() {
            // Media filenames carry an extension; the id is the stem.
            let (stem, extension) = match segment.split_once('.') {
                Some((stem, ext)) => (stem, Some(ext)),
                None => (*segment, None),
            };
            if VibeId::parse(stem).is_ok() {
                out.push(match extension {
                    Some(ext) => format!("{{id}}.{ext}"),
                    None => "{id}".to_string(),
                });
                continue;
            }
        }
        out.push((*segment).to_string());
    }

    out.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_vibe_id() {
        assert_eq!(normalize_path("/v1/vibes/abcd2345"), "/v1/vibes/{id}");
    }

    #[test]
    fn test_normalize_keeps_metadata_suffix_literal() {
        // "metadata" is lexically a valid id; position must protect it.
        assert_eq!(
            normalize_path("/v1/vibes/abcd2345/metadata"),
            "/v1/vibes/{id}/metadata"
        );
    }

    #[test]
    fn test_normalize_leaves_static_routes_alone() {
        assert_eq!(normalize_path("/v1/vibes/prepare"), "/v1/vibes/prepare");
        assert_eq!(normalize_path("/v1/vibes/pending"), "/v1/vibes/pending");
        assert_eq!(
            normalize_path("/v1/vibes/claim/confirm"),
            "/v1/vibes/claim/confirm"
        );
        assert_eq!(normalize_path("/healthz"), "/healthz");
    }

    #[test]
    fn test_normalize_media_filenames() {
        assert_eq!(
            normalize_path("/media/vibes/abcd2345.svg"),
            "/media/vibes/{id}.svg"
        );
        assert_eq!(
            normalize_path("/media/metadata/abcd2345.json"),
            "/media/metadata/{id}.json"
        );
    }

    #[test]
    fn test_normalize_ignores_non_id_stems() {
        // Wrong length or out-of-alphabet stems stay verbatim.
        assert_eq!(
            normalize_path("/media/vibes/favicon.ico"),
            "/media/vibes/favicon.ico"
        );
        assert_eq!(
            normalize_path("/media/vibes/ABCD2345.svg"),
            "/media/vibes/ABCD2345.svg"
        );
    }
}
