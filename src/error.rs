// src/error.rs
use std::collections::BTreeMap;

use thiserror::Error;

/// Failure of a single backend call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },
    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("not authenticated")]
    NotAuthenticated,
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Per-field form errors, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", join_fields(.0))]
pub struct ValidationErrors(pub BTreeMap<&'static str, &'static str>);

impl ValidationErrors {
    pub fn add(&mut self, field: &'static str, message: &'static str) {
        self.0.entry(field).or_insert(message);
    }

    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.0.get(field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

fn join_fields(fields: &BTreeMap<&'static str, &'static str>) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("device not registered, register it first")]
    DeviceNotRegistered,
    #[error("verification code rejected: {0}")]
    OtpRejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(ApiError::Unauthorized { message: "x".into() }.status(), Some(401));
        assert_eq!(
            ApiError::Server { status: 503, message: "down".into() }.status(),
            Some(503)
        );
        assert_eq!(ApiError::Network("refused".into()).status(), None);
        assert!(!ApiError::NotAuthenticated.is_unauthorized());
    }

    #[test]
    fn validation_keeps_first_message_per_field() {
        let mut errs = ValidationErrors::default();
        errs.add("email", "Email is required");
        errs.add("email", "Please enter a valid email");
        errs.add("password", "Password is required");
        assert_eq!(errs.get("email"), Some("Email is required"));
        assert_eq!(
            errs.to_string(),
            "email: Email is required; password: Password is required"
        );
        assert!(errs.into_result().is_err());
        assert!(ValidationErrors::default().into_result().is_ok());
    }
}
