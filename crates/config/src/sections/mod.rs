// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use figment::Figment;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

mod identity_pool;
mod listeners;
mod sign_in;
mod storage;
mod telemetry;
mod user_pool;

pub use self::{
    identity_pool::IdentityPoolConfig,
    listeners::ListenersConfig,
    sign_in::{FederatedFailurePolicyKind, SignInConfig},
    storage::StorageConfig,
    telemetry::TelemetryConfig,
    user_pool::UserPoolConfig,
};
use crate::util::{BoxError, ConfigurationSection};

/// Application configuration root
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RootConfig {
    /// The user pool users sign in to. Without it, only federated sign-in
    /// and guest access are possible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_pool: Option<UserPoolConfig>,

    /// The identity pool handing out temporary credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_pool: Option<IdentityPoolConfig>,

    /// Configuration related to signing in
    #[serde(default, skip_serializing_if = "SignInConfig::is_default")]
    pub sign_in: SignInConfig,

    /// Configuration of the state change listeners
    #[serde(default, skip_serializing_if = "ListenersConfig::is_default")]
    pub listeners: ListenersConfig,

    /// Configuration of the credential cache
    #[serde(default, skip_serializing_if = "StorageConfig::is_default")]
    pub storage: StorageConfig,

    /// Configuration related to logging
    #[serde(default, skip_serializing_if = "TelemetryConfig::is_default")]
    pub telemetry: TelemetryConfig,
}

impl ConfigurationSection for RootConfig {
    fn validate(&self, figment: &Figment) -> Result<(), BoxError> {
        if let Some(user_pool) = &self.user_pool {
            user_pool.validate(figment)?;
        }
        if let Some(identity_pool) = &self.identity_pool {
            identity_pool.validate(figment)?;
        }
        self.sign_in.validate(figment)?;
        self.listeners.validate(figment)?;
        self.storage.validate(figment)?;
        self.telemetry.validate(figment)?;

        Ok(())
    }
}

impl RootConfig {
    /// Generate a sample configuration, to be filled with the actual pool
    /// IDs
    #[must_use]
    pub fn generate() -> Self {
        Self {
            user_pool: Some(UserPoolConfig::example()),
            identity_pool: Some(IdentityPoolConfig::example()),
            storage: StorageConfig {
                path: Some("credentials.json".into()),
            },
            ..Self::default()
        }
    }
}
