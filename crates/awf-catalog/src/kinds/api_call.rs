// SPDX-License-Identifier: MIT OR Apache-2.0
//! `ApiCall` (`spec.md` §4.2).

use awf_core::collect_credential_refs;
use awf_error::{ErrorCode, WorkflowError};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Default `timeoutMs` when the operation does not specify one.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// HTTP method for an `ApiCall`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET.
    Get,
    /// POST.
    Post,
    /// PUT.
    Put,
    /// DELETE.
    Delete,
    /// PATCH.
    Patch,
}

impl HttpMethod {
    fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
            Self::Patch => reqwest::Method::PATCH,
        }
    }
}

/// Concrete arguments for `ApiCall`, deserialized after path and credential
/// resolution (header/body values are plain JSON by this point).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCallArgs {
    /// HTTP method.
    pub method: HttpMethod,
    /// Target URL.
    pub url: String,
    /// Request headers; values may have been credential-resolved strings.
    #[serde(default)]
    pub headers: Option<HashMap<String, serde_json::Value>>,
    /// Request body, sent as JSON if present.
    #[serde(default)]
    pub body: Option<serde_json::Value>,
    /// Where to write the result.
    pub output_path: String,
    /// Per-call timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Parse a `Retry-After` header (delta-seconds form only; an HTTP-date value
/// is left uninterpreted) into milliseconds, for `awf-retry`'s `429`
/// override (`spec.md` §4.7).
fn retry_after_ms(headers: &serde_json::Map<String, serde_json::Value>) -> Option<u64> {
    let raw = headers.get(reqwest::header::RETRY_AFTER.as_str()).and_then(|v| v.as_str())?;
    let seconds: u64 = raw.trim().parse().ok()?;
    Some(seconds.saturating_mul(1000))
}

/// `ApiCall` is cacheable for a given invocation iff the method is `GET`
/// and no credential reference appears in `body` (`spec.md` §4.2). Checked
/// against the *raw*, pre-resolution args so the marker is still visible.
#[must_use]
pub fn is_cacheable(raw_args: &serde_json::Value) -> bool {
    let method_is_get = raw_args.get("method").and_then(|m| m.as_str()) == Some("GET");
    let body_has_credential = raw_args
        .get("body")
        .map(|body| {
            let mut refs = Vec::new();
            collect_credential_refs(body, &mut refs);
            !refs.is_empty()
        })
        .unwrap_or(false);
    method_is_get && !body_has_credential
}

/// Execute an `ApiCall` against `client`, honoring `timeoutMs`.
pub async fn execute(args: &ApiCallArgs, client: &reqwest::Client) -> Result<serde_json::Value, WorkflowError> {
    let mut builder = client.request(args.method.as_reqwest(), &args.url);
    if let Some(headers) = &args.headers {
        for (name, value) in headers {
            let rendered = awf_datamodel::stringify(value);
            builder = builder.header(name, rendered);
        }
    }
    if let Some(body) = &args.body {
        builder = builder.json(body);
    }

    let timeout = Duration::from_millis(args.timeout_ms);
    let response = match tokio::time::timeout(timeout, builder.send()).await {
        Ok(Ok(resp)) => resp,
        Ok(Err(e)) => {
            return Err(WorkflowError::new(ErrorCode::Network, format!("request to {} failed: {e}", args.url))
                .with_context("url", args.url.clone()))
        }
        Err(_) => {
            return Err(
                WorkflowError::new(ErrorCode::Timeout, format!("request to {} timed out after {}ms", args.url, args.timeout_ms))
                    .with_context("timeout_ms", args.timeout_ms),
            )
        }
    };

    let status = response.status();
    let is_json = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.contains("json"))
        .unwrap_or(false);

    let response_headers: serde_json::Map<String, serde_json::Value> = response
        .headers()
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), serde_json::Value::String(v.to_string()))))
        .collect();

    if !status.is_success() {
        let mut err = WorkflowError::new(ErrorCode::Api, format!("{} returned status {}", args.url, status.as_u16()))
            .with_context("status", status.as_u16())
            .with_context("url", args.url.clone());
        if let Some(ms) = retry_after_ms(&response_headers) {
            err = err.with_context("retryAfterMs", ms);
        }
        return Err(err);
    }

    let body_value = if is_json {
        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| WorkflowError::new(ErrorCode::Network, "failed to decode JSON response body").with_source(e))?
    } else {
        let text = response
            .text()
            .await
            .map_err(|e| WorkflowError::new(ErrorCode::Network, "failed to read response body").with_source(e))?;
        serde_json::Value::String(text)
    };

    Ok(serde_json::json!({
        "statusCode": status.as_u16(),
        "headers": serde_json::Value::Object(response_headers),
        "body": body_value,
    }))
}
