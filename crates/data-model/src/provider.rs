// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

/// Build the login key under which user pool tokens are federated.
#[must_use]
pub fn user_pool_login_key(region: &str, pool_id: &str) -> String {
    format!("cognito-idp.{region}.amazonaws.com/{pool_id}")
}

/// Where a cached login token comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// The token was issued by the configured user pool and must be fetched
    /// live before it can be trusted
    UserPool,

    /// The token was issued by a third-party identity provider
    Federated,
}

impl TokenSource {
    /// Classify a cached provider key against the user pool login key, if a
    /// user pool is configured.
    #[must_use]
    pub fn classify(provider: &str, user_pool_login_key: Option<&str>) -> Self {
        match user_pool_login_key {
            Some(key) if key == provider => Self::UserPool,
            _ => Self::Federated,
        }
    }
}
