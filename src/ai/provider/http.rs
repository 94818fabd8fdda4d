//! Shared HTTP helpers for providers.
//!
//! Endpoint validation and mapping of transport/status failures to
//! categorized `LlmError`s.

use std::time::Duration;

use tracing::warn;

use crate::types::{ErrorCategory, ErrorClassifier, LlmError, Result, TierError};

/// Validate endpoint URL (SSRF prevention)
///
/// Only allows http/https schemes and warns for non-localhost endpoints
/// when `expect_local` is set. Trailing slash is removed.
pub fn validate_endpoint(endpoint: &str, provider: &str, expect_local: bool) -> Result<String> {
    let url = url::Url::parse(endpoint).map_err(|e| {
        TierError::Config(format!(
            "Invalid {} endpoint URL '{}': {}",
            provider, endpoint, e
        ))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(TierError::Config(format!(
            "{} endpoint must use http or https scheme, got: {}",
            provider,
            url.scheme()
        )));
    }

    if expect_local
        && let Some(host) = url.host_str()
        && !matches!(host, "localhost" | "127.0.0.1" | "::1" | "[::1]")
    {
        warn!(
            "{} endpoint is not localhost: {}. Ensure this is intentional.",
            provider, host
        );
    }

    let mut result = url.to_string();
    if result.ends_with('/') {
        result.pop();
    }
    Ok(result)
}

/// Build a reqwest client with the per-request timeout
pub fn build_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| TierError::LlmApi(format!("Failed to create HTTP client: {}", e)))
}

/// Map a reqwest send failure to a categorized error
pub fn send_error(provider: &str, api_base: &str, err: reqwest::Error) -> TierError {
    let llm_err = if err.is_timeout() {
        LlmError::with_provider(
            ErrorCategory::Timeout,
            format!("{} request to {} timed out: {}", provider, api_base, err),
            provider,
        )
    } else if err.is_connect() {
        LlmError::with_provider(
            ErrorCategory::Network,
            format!("Failed to connect to {} at {}: {}", provider, api_base, err),
            provider,
        )
    } else {
        ErrorClassifier::classify(&format!("{} request failed: {}", provider, err), provider)
    };
    TierError::Llm(llm_err)
}

/// Turn a non-success response into a categorized error
pub async fn status_error(provider: &str, response: reqwest::Response) -> TierError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    TierError::Llm(ErrorClassifier::classify_http_status(
        status.as_u16(),
        &format!("{} API error ({}): {}", provider, status, body),
        provider,
    ))
}

/// Map a body decoding failure to a parse error
pub fn parse_error(provider: &str, err: impl std::fmt::Display) -> TierError {
    TierError::Llm(LlmError::with_provider(
        ErrorCategory::ParseError,
        format!("Failed to parse {} response: {}", provider, err),
        provider,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_endpoint_strips_slash() {
        let url = validate_endpoint("http://localhost:11434/", "ollama", true).unwrap();
        assert_eq!(url, "http://localhost:11434");
    }

    #[test]
    fn test_validate_endpoint_keeps_path() {
        let url = validate_endpoint("https://api.openai.com/v1", "openai", false).unwrap();
        assert_eq!(url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_validate_endpoint_rejects_scheme() {
        let err = validate_endpoint("file:///etc/passwd", "ollama", true).unwrap_err();
        assert!(matches!(err, TierError::Config(_)));
    }

    #[test]
    fn test_validate_endpoint_rejects_garbage() {
        assert!(validate_endpoint("not a url", "ollama", true).is_err());
    }

    #[test]
    fn test_parse_error_category() {
        match parse_error("gemini", "missing field") {
            TierError::Llm(e) => assert_eq!(e.category, ErrorCategory::ParseError),
            other => panic!("unexpected error: {other}"),
        }
    }
}
