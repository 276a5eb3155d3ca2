//! HTTP plumbing shared by the backend clients: client construction,
//! status-code mapping and response decoding.

use std::collections::HashMap;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::{ProviderError, Result};

/// Retry hint used when a 429 carries none.
const DEFAULT_RETRY_AFTER_MS: u64 = 1000;

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Map a transport error, surfacing timeouts as their own variant.
pub(crate) fn send_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Http(err)
    }
}

/// Pass a successful response through; turn any other status into an error.
pub(crate) async fn check_status(
    provider: &str,
    model: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status.as_u16() == 429 {
        let header_ms = parse_retry_after_header(&response);
        let body = response.text().await.unwrap_or_default();

        // Exhausted credit is reported as 429 by some backends but is not transient.
        if is_quota_exhausted(&body) {
            let msg = extract_error_message(&body)
                .unwrap_or_else(|| "credits exhausted or spending limit reached".into());
            warn!(provider = %provider, "quota exhausted");
            return Err(ProviderError::RequestFailed(msg));
        }

        let retry_ms = header_ms
            .or_else(|| parse_retry_after_ms(&body))
            .unwrap_or(DEFAULT_RETRY_AFTER_MS);
        warn!(provider = %provider, retry_after_ms = retry_ms, "rate limited");
        return Err(ProviderError::RateLimited {
            retry_after_ms: retry_ms,
        });
    }

    let body = response.text().await.unwrap_or_default();
    let detail = extract_error_message(&body).unwrap_or(body);

    match status.as_u16() {
        401 | 403 => Err(ProviderError::AuthFailed(detail)),
        404 => Err(ProviderError::ModelNotFound(format!(
            "model '{model}': {detail}"
        ))),
        _ => Err(ProviderError::RequestFailed(format!(
            "HTTP {status}: {detail}"
        ))),
    }
}

/// Decode a JSON body, reporting malformed payloads as `InvalidResponse`.
pub(crate) async fn decode_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let body = response.text().await.map_err(send_error)?;
    serde_json::from_str(&body)
        .map_err(|e| ProviderError::InvalidResponse(format!("failed to parse response: {e}")))
}

/// Copy provider-specific parameters into a JSON object body.
/// Keys already present in the body are left alone.
pub(crate) fn merge_extra(
    body: &mut serde_json::Value,
    extra: &HashMap<String, serde_json::Value>,
) {
    if let Some(obj) = body.as_object_mut() {
        for (k, v) in extra {
            obj.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }
}

fn is_quota_exhausted(body: &str) -> bool {
    let lower = body.to_lowercase();
    lower.contains("exhausted")
        || lower.contains("spending limit")
        || lower.contains("billing")
        || lower.contains("quota exceeded")
        || lower.contains("insufficient_quota")
}

/// Pull a readable message out of a JSON error body.
///
/// Handles `{"error": {"message": ".."}}` (OpenAI, Anthropic, Gemini) and
/// `{"error": ".."}` (Ollama).
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get("error").and_then(|v| {
        v.get("message")
            .and_then(|m| m.as_str())
            .map(String::from)
            .or_else(|| v.as_str().map(String::from))
    })
}

/// Numeric `Retry-After` header, in milliseconds. HTTP-date values are ignored.
fn parse_retry_after_header(response: &reqwest::Response) -> Option<u64> {
    let header_val = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())?;
    let secs = header_val.trim().parse::<f64>().ok()?;
    Some((secs * 1000.0).max(0.0) as u64)
}

fn parse_retry_after_ms(body: &str) -> Option<u64> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("retry_after_ms")
        .and_then(|v| v.as_u64())
        .or_else(|| {
            value
                .get("retry_after")
                .and_then(|v| v.as_f64())
                .map(|secs| (secs * 1000.0) as u64)
        })
}
