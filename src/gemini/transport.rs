use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

use super::wire::ApiErrorEnvelope;
use crate::{
    error::{Result, StudioError},
    storage::Credential,
};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Authenticated HTTP plumbing shared by the sub-clients.
#[derive(Clone)]
pub struct Transport {
    http: Client,
    api_base: String,
    credential: Credential,
}

impl Transport {
    pub fn new(http: Client, api_base: impl Into<String>, credential: Credential) -> Self {
        Self {
            http,
            api_base: api_base.into(),
            credential,
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    pub async fn post_json<B, R>(&self, operation: &str, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path);
        log::debug!("POST {}", url);
        let request = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, self.credential.expose())
            .json(body);
        let response = send(operation, request).await?;
        read_json(operation, response).await
    }

    pub async fn get_json<R: DeserializeOwned>(&self, operation: &str, path: &str) -> Result<R> {
        let url = self.endpoint(path);
        log::debug!("GET {}", url);
        let request = self
            .http
            .get(&url)
            .header(API_KEY_HEADER, self.credential.expose());
        let response = send(operation, request).await?;
        read_json(operation, response).await
    }

    /// Fetches an absolute URL with the key appended as a query parameter.
    pub async fn get_bytes(&self, operation: &str, url: &str) -> Result<Vec<u8>> {
        log::debug!("GET {}", url);
        let request = self
            .http
            .get(url)
            .query(&[("key", self.credential.expose())]);
        let response = send(operation, request).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify(operation, status, &body));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| StudioError::transport(operation, e.without_url().to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// Request URLs may carry the key, so reqwest errors are reported without them.
async fn send(operation: &str, request: RequestBuilder) -> Result<Response> {
    request
        .send()
        .await
        .map_err(|e| StudioError::transport(operation, e.without_url().to_string()))
}

async fn read_json<R: DeserializeOwned>(operation: &str, response: Response) -> Result<R> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| StudioError::transport(operation, e.without_url().to_string()))?;

    if !status.is_success() {
        return Err(classify(operation, status, &body));
    }

    serde_json::from_str(&body)
        .map_err(|e| StudioError::Decode(format!("unexpected response to {}: {}", operation, e)))
}

/// Maps a failed exchange onto the error taxonomy.
pub(crate) fn classify(operation: &str, status: StatusCode, body: &str) -> StudioError {
    if body.contains("API key not valid") || body.contains("API_KEY_INVALID") {
        log::error!("Provider rejected the API key while trying to {}", operation);
        return StudioError::InvalidCredential;
    }

    let detail = serde_json::from_str::<ApiErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .unwrap_or_else(|| body.trim().to_string());

    let message = if detail.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("HTTP {}: {}", status.as_u16(), detail)
    };
    log::error!("Failed to {}: {}", operation, message);
    StudioError::transport(operation, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_key_is_recognised() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT","details":[{"reason":"API_KEY_INVALID"}]}}"#;
        assert!(matches!(
            classify("edit image", StatusCode::BAD_REQUEST, body),
            StudioError::InvalidCredential
        ));
    }

    #[test]
    fn test_other_failures_name_the_operation() {
        let body = r#"{"error":{"code":429,"message":"Resource has been exhausted","status":"RESOURCE_EXHAUSTED"}}"#;
        let err = classify("generate video", StatusCode::TOO_MANY_REQUESTS, body);
        assert_eq!(
            err.to_string(),
            "Failed to generate video: HTTP 429: Resource has been exhausted"
        );

        let err = classify("edit image", StatusCode::BAD_GATEWAY, "");
        assert_eq!(err.to_string(), "Failed to edit image: HTTP 502");
    }
}
