// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use thiserror::Error;

/// A type-erased error coming from the identity provider SDK
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All possible errors reported by the identity provider
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The identity provider rejected the credentials or tokens
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// The user does not exist in the user pool
    #[error("user not found")]
    UserNotFound,

    /// The user exists but did not confirm their account yet
    #[error("user is not confirmed")]
    UserNotConfirmed,

    /// The identity provider could not be reached
    #[error("could not reach the identity provider")]
    Network(#[source] BoxError),

    /// No sign-in UI can be shown
    #[error("no sign-in UI is available")]
    UiUnavailable,

    /// The operation is not supported by this provider
    #[error("{0} is not supported by this identity provider")]
    Unsupported(&'static str),

    /// Any other error from the identity provider
    #[error(transparent)]
    Other(BoxError),
}

impl IdentityError {
    /// Wrap a transport error
    pub fn network(error: impl Into<BoxError>) -> Self {
        Self::Network(error.into())
    }

    /// Wrap any other error
    pub fn other(error: impl Into<BoxError>) -> Self {
        Self::Other(error.into())
    }

    /// Returns `true` if the identity provider refused to authorize the
    /// request, as opposed to failing to process it
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::NotAuthorized(_))
    }
}
