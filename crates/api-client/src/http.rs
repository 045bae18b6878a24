use crate::error::ApiError;
use crate::responses::ApiErrorResponse;
use configuration::HttpProviderSettings;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;

/// Builds a client carrying the bearer key and timeout of `settings`.
pub(crate) fn build_client(settings: &HttpProviderSettings) -> Result<reqwest::Client, ApiError> {
    let mut headers = HeaderMap::new();
    if !settings.api_key.is_empty() {
        let value = HeaderValue::from_str(&format!("Bearer {}", settings.api_key))
            .map_err(|e| ApiError::Configuration(format!("invalid API key: {e}")))?;
        headers.insert(AUTHORIZATION, value);
    }
    Ok(reqwest::Client::builder()
        .default_headers(headers)
        .timeout(settings.timeout)
        .build()?)
}

/// Joins `base_url` and `path` without doubling the slash.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Reads the body and deserializes it, or turns a non-2xx status into `ApiError::Api`.
pub(crate) async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let text = response.text().await?;

    if status.is_success() {
        serde_json::from_str::<T>(&text).map_err(|e| ApiError::Deserialization(e.to_string()))
    } else {
        let message = serde_json::from_str::<ApiErrorResponse>(&text)
            .map(|body| match body.code {
                Some(code) => format!("{code}: {}", body.message),
                None => body.message,
            })
            .unwrap_or(text);
        Err(ApiError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_cleanly() {
        assert_eq!(endpoint("https://bench.example/v1/", "/industries"), "https://bench.example/v1/industries");
        assert_eq!(endpoint("https://bench.example/v1", "summaries"), "https://bench.example/v1/summaries");
    }
}
