use crate::request::{Body, HttpRequest, Method};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

/// Thin reqwest wrapper. One pooled client per executor.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: reqwest::Client,
}

impl HttpExecutor {
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> anyhow::Result<Self> {
        // Without an explicit timeout a stalled backend would hang a poll loop
        // past its attempt budget.
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .context("build http client")?;
        Ok(Self { client })
    }

    pub async fn execute(&self, req: &HttpRequest) -> anyhow::Result<HttpResponse> {
        let mut headers = HeaderMap::new();
        for (k, v) in &req.headers {
            let name = HeaderName::from_bytes(k.as_bytes())
                .with_context(|| format!("invalid header name: {k}"))?;
            let value = HeaderValue::from_str(v)
                .with_context(|| format!("invalid header value for {k}"))?;
            headers.insert(name, value);
        }

        let builder = match req.method {
            Method::Get => self.client.get(&req.url),
            Method::Post => self.client.post(&req.url),
            Method::Put => self.client.put(&req.url),
            Method::Delete => self.client.delete(&req.url),
        }
        .headers(headers);

        let builder = match &req.body {
            Body::Empty => builder,
            Body::Json(s) => builder.body(s.clone()),
            Body::MultipartFormData { bytes, .. } => builder.body(bytes.clone()),
        };

        let resp = builder
            .send()
            .await
            .with_context(|| format!("{} {} failed", req.method, req.url))?;
        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .await
            .context("failed reading response body")?
            .to_vec();

        Ok(HttpResponse { status, body })
    }
}
