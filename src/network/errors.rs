use thiserror::Error;

// * Unified Error type for the Network Layer.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}: {body}")]
    Status { status: u16, url: String, body: String },

    #[error("Malformed JSON body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

impl NetworkError {
    // * True when the server answered with 429 or a 5xx
    pub fn is_server_pressure(&self) -> bool {
        matches!(self, NetworkError::Status { status, .. } if *status == 429 || *status >= 500)
    }
}
