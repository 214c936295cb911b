// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::{collections::BTreeMap, error::Error, fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::keys;

/// The authentication state of the user of the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserState {
    /// The user is signed in, either through the user pool or a federated
    /// identity provider
    SignedIn,

    /// Nobody is signed in, and there is no guest identity
    SignedOut,

    /// The cached user pool tokens could not be refreshed. The user has to
    /// sign in again.
    SignedOutUserPoolsTokensInvalid,

    /// The cached federated token was rejected. The application has to
    /// federate a fresh token.
    SignedOutFederatedTokensInvalid,

    /// Nobody is signed in, but an unauthenticated identity exists
    Guest,
}

impl UserState {
    /// Returns `true` for the states which are expected to be resolved by a
    /// later sign-in or sign-out
    #[must_use]
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            Self::SignedOutUserPoolsTokensInvalid | Self::SignedOutFederatedTokensInvalid
        )
    }

    /// Returns `true` if the user is signed in
    #[must_use]
    pub fn is_signed_in(self) -> bool {
        matches!(self, Self::SignedIn)
    }
}

impl fmt::Display for UserState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SignedIn => "SIGNED_IN",
            Self::SignedOut => "SIGNED_OUT",
            Self::SignedOutUserPoolsTokensInvalid => "SIGNED_OUT_USER_POOLS_TOKENS_INVALID",
            Self::SignedOutFederatedTokensInvalid => "SIGNED_OUT_FEDERATED_TOKENS_INVALID",
            Self::Guest => "GUEST",
        };
        f.write_str(s)
    }
}

/// A snapshot of the user state, with the details it was computed from
///
/// Two snapshots are equal if they have the same state and the same details.
/// The diagnostic error attached by [`UserStateDetails::with_error`] is not
/// part of the comparison.
#[derive(Clone, Serialize)]
pub struct UserStateDetails {
    state: UserState,
    details: BTreeMap<String, String>,
    #[serde(skip)]
    error: Option<Arc<dyn Error + Send + Sync + 'static>>,
}

impl UserStateDetails {
    #[must_use]
    pub fn new(state: UserState, details: BTreeMap<String, String>) -> Self {
        Self {
            state,
            details,
            error: None,
        }
    }

    /// A state without any details
    #[must_use]
    pub fn bare(state: UserState) -> Self {
        Self::new(state, BTreeMap::new())
    }

    /// A state carrying the login provider and its token
    #[must_use]
    pub fn with_login(state: UserState, provider: &str, token: &str) -> Self {
        let details = BTreeMap::from([
            (keys::PROVIDER.to_owned(), provider.to_owned()),
            (keys::TOKEN.to_owned(), token.to_owned()),
        ]);
        Self::new(state, details)
    }

    /// Attach an error explaining how this state was reached
    #[must_use]
    pub fn with_error(mut self, error: impl Error + Send + Sync + 'static) -> Self {
        self.error = Some(Arc::new(error));
        self
    }

    #[must_use]
    pub fn state(&self) -> UserState {
        self.state
    }

    #[must_use]
    pub fn details(&self) -> &BTreeMap<String, String> {
        &self.details
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.details.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn provider(&self) -> Option<&str> {
        self.get(keys::PROVIDER)
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.get(keys::TOKEN)
    }

    /// The error attached to this snapshot, if any
    #[must_use]
    pub fn error(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.error.as_deref()
    }
}

impl PartialEq for UserStateDetails {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state && self.details == other.details
    }
}

impl Eq for UserStateDetails {}

impl fmt::Debug for UserStateDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Tokens are secrets, only show which keys are set
        f.debug_struct("UserStateDetails")
            .field("state", &self.state)
            .field("details", &self.details.keys().collect::<Vec<_>>())
            .field("error", &self.error.as_ref().map(ToString::to_string))
            .finish()
    }
}
