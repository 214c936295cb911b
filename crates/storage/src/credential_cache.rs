// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::{collections::BTreeMap, sync::Arc};

use mac_data_model::keys;

use crate::{KeyValueStore, StoreError};

/// The login state persisted across restarts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CachedCredentials {
    /// The login provider which issued the token
    pub provider: Option<String>,

    /// The last known login token
    pub token: Option<String>,

    /// The identity ID assigned by the identity pool
    pub identity_id: Option<String>,
}

impl CachedCredentials {
    /// Returns the provider and token if both are present and non-empty
    #[must_use]
    pub fn login(&self) -> Option<(&str, &str)> {
        let provider = self.provider.as_deref().filter(|p| !p.is_empty())?;
        let token = self.token.as_deref().filter(|t| !t.is_empty())?;
        Some((provider, token))
    }

    /// Whether the cache holds a login token which can be used to sign in
    #[must_use]
    pub fn has_useful_token(&self) -> bool {
        self.login().is_some()
    }

    /// The cached identity ID, if present and non-empty
    #[must_use]
    pub fn identity_id(&self) -> Option<&str> {
        self.identity_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// A typed view over the credential entries of a [`KeyValueStore`]
#[derive(Clone)]
pub struct CredentialCache {
    store: Arc<dyn KeyValueStore>,
}

impl CredentialCache {
    /// Wrap a [`KeyValueStore`]
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The underlying store
    #[must_use]
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Read all the credential entries in one go
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the underlying store fails
    pub async fn load(&self) -> Result<CachedCredentials, StoreError> {
        let mut values = self.store.get_many(&keys::ALL).await?;
        Ok(CachedCredentials {
            provider: values.remove(keys::PROVIDER),
            token: values.remove(keys::TOKEN),
            identity_id: values.remove(keys::IDENTITY_ID),
        })
    }

    /// Persist the login provider and its token
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the underlying store fails
    pub async fn save_login(&self, provider: &str, token: &str) -> Result<(), StoreError> {
        self.store
            .set_many(BTreeMap::from([
                (keys::PROVIDER.to_owned(), provider.to_owned()),
                (keys::TOKEN.to_owned(), token.to_owned()),
            ]))
            .await
    }

    /// Persist the identity ID
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the underlying store fails
    pub async fn save_identity_id(&self, identity_id: &str) -> Result<(), StoreError> {
        self.store.set(keys::IDENTITY_ID, identity_id).await
    }

    /// Forget everything, including entries the cache does not know about
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the underlying store fails
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.store.clear().await
    }
}
