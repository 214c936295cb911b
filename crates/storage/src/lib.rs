// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Persistent storage used by the mobile authentication client
//!
//! The client keeps a small amount of state across restarts: the login
//! provider and token of the signed-in user, and the identity ID assigned by
//! the identity pool. This crate defines the [`KeyValueStore`] trait the
//! client reads and writes this state through, and two implementations of it:
//!
//!   - [`MemoryKeyValueStore`], which keeps everything in memory and is
//!     mostly useful for tests
//!   - [`FileKeyValueStore`], which persists the entries as a JSON object in a
//!     single file
//!
//! Both implementations allow concurrent reads, and serialize writes.
//!
//! On top of this, [`CredentialCache`] gives a typed view over the few keys
//! the client cares about.

#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]

use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

mod credential_cache;
mod file;
mod memory;

pub use self::{
    credential_cache::{CachedCredentials, CredentialCache},
    file::FileKeyValueStore,
    memory::MemoryKeyValueStore,
};

/// A type-erased error from a custom store backend
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All possible errors when accessing a [`KeyValueStore`]
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred reading or writing the backing file
    #[error("failed to access the store")]
    Io(#[from] std::io::Error),

    /// The content of the store could not be (de)serialized
    #[error("failed to (de)serialize the store content")]
    Serialization(#[from] serde_json::Error),

    /// An error from a custom backend
    #[error(transparent)]
    Backend(BoxError),
}

/// A [`KeyValueStore`] persists string values under string keys
///
/// Implementations must allow concurrent reads, and must make writes
/// exclusive.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Lookup the value stored under a key
    ///
    /// Returns `None` if nothing is stored under this key
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the underlying store fails
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Lookup multiple keys at once
    ///
    /// Keys with no value are absent from the returned map
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the underlying store fails
    async fn get_many(&self, keys: &[&str]) -> Result<BTreeMap<String, String>, StoreError> {
        let mut values = BTreeMap::new();
        for key in keys {
            if let Some(value) = self.get(key).await? {
                values.insert((*key).to_owned(), value);
            }
        }
        Ok(values)
    }

    /// Store a value under a key, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the underlying store fails
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Store multiple values at once
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the underlying store fails
    async fn set_many(&self, entries: BTreeMap<String, String>) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.set(&key, &value).await?;
        }
        Ok(())
    }

    /// Remove the value stored under a key, if any
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the underlying store fails
    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Remove every value from the store
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the underlying store fails
    async fn clear(&self) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key).await
    }

    async fn get_many(&self, keys: &[&str]) -> Result<BTreeMap<String, String>, StoreError> {
        (**self).get_many(keys).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value).await
    }

    async fn set_many(&self, entries: BTreeMap<String, String>) -> Result<(), StoreError> {
        (**self).set_many(entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        (**self).clear().await
    }
}
