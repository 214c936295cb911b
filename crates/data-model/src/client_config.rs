// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::time::Duration;

use crate::user_pool_login_key;

/// What to conclude when federating a third-party token fails for a reason
/// other than the token being rejected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FederatedFailurePolicy {
    /// Consider the user signed in, the failure being likely transient
    #[default]
    Optimistic,

    /// Consider the federated tokens invalid
    Invalidate,
}

/// The user pool the client signs users in to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPoolSettings {
    pub pool_id: String,
    pub app_client_id: String,
    pub region: String,
}

impl UserPoolSettings {
    /// The key under which tokens of this user pool are federated
    #[must_use]
    pub fn login_key(&self) -> String {
        user_pool_login_key(&self.region, &self.pool_id)
    }
}

/// The identity pool the client gets credentials from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityPoolSettings {
    pub pool_id: String,
    pub region: String,
}

/// Settings of a mobile client, independent of where they were loaded from
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// The user pool, if user pool sign-in is used
    pub user_pool: Option<UserPoolSettings>,

    /// The identity pool, if credentials are needed
    pub identity_pool: Option<IdentityPoolSettings>,

    /// How long to wait for a sign-in to complete. `None` waits forever.
    pub wait_timeout: Option<Duration>,

    /// Whether user pool tokens are exchanged for identity pool credentials
    pub federation_enabled: bool,

    pub federated_failure_policy: FederatedFailurePolicy,

    /// How many state changes can be queued for the listeners
    pub listener_queue_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_pool: None,
            identity_pool: None,
            wait_timeout: Some(Duration::from_secs(300)),
            federation_enabled: true,
            federated_failure_policy: FederatedFailurePolicy::Optimistic,
            listener_queue_capacity: 64,
        }
    }
}

impl ClientConfig {
    /// The login key of the configured user pool
    #[must_use]
    pub fn user_pool_login_key(&self) -> Option<String> {
        self.user_pool.as_ref().map(UserPoolSettings::login_key)
    }

    /// Whether user pool tokens should be federated into the identity pool
    #[must_use]
    pub fn federates_user_pool(&self) -> bool {
        self.federation_enabled && self.identity_pool.is_some()
    }
}
