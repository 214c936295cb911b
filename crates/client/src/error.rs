// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::time::Duration;

use mac_identity::IdentityError;
use mac_storage::StoreError;
use thiserror::Error;

/// Why waiting for a sign-in ended without an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignInWaitError {
    /// The sign-in did not complete in time
    #[error("sign-in did not complete within {0:?}")]
    TimedOut(Duration),

    /// The wait was cancelled, either by the caller or by the client
    /// shutting down
    #[error("waiting for the sign-in was cancelled")]
    Cancelled,
}

/// Errors returned by the operations of the [`MobileClient`]
///
/// [`MobileClient`]: crate::MobileClient
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no identity pool is configured")]
    IdentityPoolNotConfigured,

    #[error("no user pool is configured")]
    UserPoolNotConfigured,

    #[error("the user is not signed in")]
    NotSignedIn,

    #[error("the sign-in was cancelled")]
    SignInCancelled,

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("failed to access the credential cache")]
    Store(#[from] StoreError),

    #[error(transparent)]
    SignInWait(#[from] SignInWaitError),

    #[error("the client is shutting down")]
    ShuttingDown,
}

impl ClientError {
    /// Returns `true` if the error comes from a missing configuration
    #[must_use]
    pub fn is_misconfiguration(&self) -> bool {
        matches!(
            self,
            Self::IdentityPoolNotConfigured | Self::UserPoolNotConfigured
        )
    }
}
