//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::io;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::api::types::UserProfile;
use crate::storage::{StorageBackend, StorageError};

/// A backend where every operation fails, for exercising fail-soft paths.
pub struct FailingBackend;

fn broken() -> StorageError {
    StorageError::Io(io::Error::new(io::ErrorKind::PermissionDenied, "disk says no"))
}

#[async_trait]
impl StorageBackend for FailingBackend {
    fn name(&self) -> &str {
        "failing"
    }

    async fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(broken())
    }

    async fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(broken())
    }

    async fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
        Err(broken())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        Err(broken())
    }
}

pub fn sample_user() -> UserProfile {
    UserProfile {
        id: "u-42".to_string(),
        name: "Ana Sousa".to_string(),
        email: "ana@example.com".to_string(),
        avatar_url: None,
        home_city: Some("Porto".to_string()),
        member_since: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).single(),
    }
}
