use crate::config::constants::USER_AGENT;
use crate::network::errors::NetworkError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

// * Bodies longer than this are truncated in error messages
const ERROR_BODY_LIMIT: usize = 512;

// * Thin JSON-over-HTTP client shared by the loader and the billing backend.
#[derive(Debug, Clone)]
pub struct JsonClient {
    inner: Client,
}

impl JsonClient {
    // * Builds a client with a request timeout and optional default headers.
    pub fn new(timeout: Duration, default_headers: &[(&'static str, &str)]) -> Result<Self, NetworkError> {
        let mut headers = HeaderMap::new();
        for (name, value) in default_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| NetworkError::InvalidHeader(name.to_string()))?;
            let mut value = HeaderValue::from_str(value)
                .map_err(|_| NetworkError::InvalidHeader(format!("invalid value for {}", name)))?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { inner: client })
    }

    // * GETs a URL and decodes the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, NetworkError> {
        let resp = self.inner.get(url).send().await?;
        Self::decode(url, resp).await
    }

    // * POSTs a JSON payload and decodes the JSON response.
    pub async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T, NetworkError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self.inner.post(url).json(body).send().await?;
        Self::decode(url, resp).await
    }

    async fn decode<T: DeserializeOwned>(url: &str, resp: reqwest::Response) -> Result<T, NetworkError> {
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(NetworkError::Status {
                status: status.as_u16(),
                url: url.to_string(),
                body: truncate(&body),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

fn truncate(body: &str) -> String {
    if body.len() <= ERROR_BODY_LIMIT {
        return body.to_string();
    }
    let mut end = ERROR_BODY_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_initialization() {
        let client = JsonClient::new(Duration::from_secs(5), &[]);
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_with_auth_header() {
        let client = JsonClient::new(Duration::from_secs(5), &[("x-api-key", "secret")]);
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_header_value_rejected() {
        let client = JsonClient::new(Duration::from_secs(5), &[("x-api-key", "bad\nvalue")]);
        assert!(matches!(client, Err(NetworkError::InvalidHeader(_))));
    }

    #[test]
    fn test_truncate_long_body() {
        let body = "x".repeat(ERROR_BODY_LIMIT * 2);
        let truncated = truncate(&body);
        assert_eq!(truncated.len(), ERROR_BODY_LIMIT + 3);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_truncate_short_body_untouched() {
        assert_eq!(truncate("oops"), "oops");
    }
}
