use crate::multipart;
use crate::request::{Body, HttpRequest, Method};
use anyhow::{Context, anyhow};
use factify_core::social::NewPost;
use factify_core::types::{AnalysisKind, AnalysisRequest, JobHandle, UploadFile};
use serde_json::json;

pub const IMAGE_DETECT_PATH: &str = "/image/detect";
pub const USER_PROFILE_PATH: &str = "/user/profile";
pub const MY_ANALYSES_PATH: &str = "/social/my-analyses";
pub const FEED_PATH: &str = "/social/feed";

/// Checks that `base` is an absolute http(s) URL and returns it normalised
/// without a trailing slash.
pub fn validate_base_url(base: &str) -> anyhow::Result<String> {
    let parsed = url::Url::parse(base.trim()).with_context(|| format!("invalid URL: {base}"))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(anyhow!("unsupported URL scheme: {other}")),
    }
    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}

/// Appends `segments` to `base`, each percent-encoded as exactly one path
/// segment. Backend-issued ids go through here.
pub fn segment_url(base: &str, segments: &[&str]) -> anyhow::Result<String> {
    let mut url = url::Url::parse(base).with_context(|| format!("invalid base URL: {base}"))?;
    url.path_segments_mut()
        .map_err(|()| anyhow!("base URL cannot take a path: {base}"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url.into())
}

pub fn build_get(base_url: &str, path: &str) -> HttpRequest {
    HttpRequest::new(Method::Get, join_url(base_url, path))
}

/// Text goes out as `{"text": ...}`; files as a multipart `file` part.
pub fn build_submit_request(
    base_url: &str,
    kind: AnalysisKind,
    request: &AnalysisRequest,
) -> HttpRequest {
    let mut req = HttpRequest::new(Method::Post, join_url(base_url, &kind.submit_path()));
    match request {
        AnalysisRequest::Text(text) => set_json(&mut req, json!({ "text": text })),
        AnalysisRequest::File(file) => attach_file(&mut req, file),
    }
    req
}

pub fn build_status_request(base_url: &str, handle: &JobHandle) -> anyhow::Result<HttpRequest> {
    let url = segment_url(
        base_url,
        &["analysis", handle.kind.endpoint(), handle.job_id.as_str()],
    )?;
    Ok(HttpRequest::new(Method::Get, url))
}

pub fn build_predictions_request(base_url: &str, user_id: &str) -> anyhow::Result<HttpRequest> {
    let url = segment_url(base_url, &["nlp", "predictions", user_id])?;
    Ok(HttpRequest::new(Method::Get, url))
}

pub fn build_image_detect_request(base_url: &str, image: &UploadFile) -> HttpRequest {
    let mut req = HttpRequest::new(Method::Post, join_url(base_url, IMAGE_DETECT_PATH));
    attach_file(&mut req, image);
    req
}

pub fn build_share_request(base_url: &str, post: &NewPost) -> HttpRequest {
    let mut req = HttpRequest::new(Method::Post, join_url(base_url, FEED_PATH));
    set_json(&mut req, json!({ "content": post.content, "analysis_id": post.analysis_id }));
    req
}

pub fn build_edit_post_request(
    base_url: &str,
    post_id: &str,
    content: &str,
) -> anyhow::Result<HttpRequest> {
    let url = segment_url(base_url, &["social", "feed", post_id])?;
    let mut req = HttpRequest::new(Method::Put, url);
    set_json(&mut req, json!({ "content": content }));
    Ok(req)
}

pub fn build_delete_post_request(base_url: &str, post_id: &str) -> anyhow::Result<HttpRequest> {
    let url = segment_url(base_url, &["social", "feed", post_id])?;
    Ok(HttpRequest::new(Method::Delete, url))
}

/// Likes are a toggle; the same request likes and unlikes.
pub fn build_like_request(base_url: &str, post_id: &str) -> anyhow::Result<HttpRequest> {
    let url = segment_url(base_url, &["social", "feed", post_id, "like"])?;
    Ok(HttpRequest::new(Method::Post, url))
}

pub fn build_add_comment_request(
    base_url: &str,
    post_id: &str,
    text: &str,
) -> anyhow::Result<HttpRequest> {
    let url = segment_url(base_url, &["social", "feed", post_id, "comment"])?;
    let mut req = HttpRequest::new(Method::Post, url);
    set_json(&mut req, json!({ "text": text }));
    Ok(req)
}

pub fn build_comments_request(base_url: &str, post_id: &str) -> anyhow::Result<HttpRequest> {
    let url = segment_url(base_url, &["social", "feed", post_id, "comments"])?;
    Ok(HttpRequest::new(Method::Get, url))
}

pub fn build_edit_comment_request(
    base_url: &str,
    comment_id: &str,
    text: &str,
) -> anyhow::Result<HttpRequest> {
    let url = segment_url(base_url, &["social", "feed", "comments", comment_id])?;
    let mut req = HttpRequest::new(Method::Put, url);
    set_json(&mut req, json!({ "text": text }));
    Ok(req)
}

pub fn build_delete_comment_request(
    base_url: &str,
    comment_id: &str,
) -> anyhow::Result<HttpRequest> {
    let url = segment_url(base_url, &["social", "feed", "comments", comment_id])?;
    Ok(HttpRequest::new(Method::Delete, url))
}

fn set_json(req: &mut HttpRequest, value: serde_json::Value) {
    req.set_header("Content-Type", "application/json");
    req.body = Body::Json(value.to_string());
}

fn attach_file(req: &mut HttpRequest, file: &UploadFile) {
    let (body, content_type) = multipart::encode_file("file", file);
    req.set_header("Content-Type", content_type);
    req.body = body;
}
