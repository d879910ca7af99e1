// * Upstream user payload and its validation
// * The dummy users API returns an array, or a bare object when size=1.

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PayloadError {
    #[error("upstream item {index}: missing or empty field '{field}'")]
    MissingField { index: usize, field: &'static str },
}

/// Raw upstream user; every field is optional until validated
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamUser {
    pub uid: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum UpstreamPayload {
    Many(Vec<UpstreamUser>),
    One(UpstreamUser),
}

impl UpstreamPayload {
    pub fn into_users(self) -> Vec<UpstreamUser> {
        match self {
            UpstreamPayload::Many(users) => users,
            UpstreamPayload::One(user) => vec![user],
        }
    }
}

/// Upstream user with every required field present
#[derive(Debug, Clone, PartialEq)]
pub struct ValidUser {
    pub uid: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl ValidUser {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl UpstreamUser {
    /// Checks required fields; `index` is the item's position in the payload
    pub fn validate(self, index: usize) -> Result<ValidUser, PayloadError> {
        let require = |value: Option<String>, field: &'static str| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(PayloadError::MissingField { index, field })
        };

        Ok(ValidUser {
            uid: require(self.uid, "uid")?,
            email: require(self.email, "email")?,
            first_name: require(self.first_name, "first_name")?,
            last_name: require(self.last_name, "last_name")?,
        })
    }
}
