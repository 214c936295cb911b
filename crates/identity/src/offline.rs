// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::collections::BTreeMap;

use mac_data_model::{Credentials, SignInResult, SignOutOptions, Tokens};

use crate::{IdentityError, IdentityProvider, SignInNotifier, SignInPresenter, SignInUiOptions};

/// An [`IdentityProvider`] for when no identity provider SDK is available.
///
/// Every operation which would need to reach the identity services fails.
/// Signing out only has local effects, so it succeeds unless a global
/// sign-out is requested.
#[derive(Debug, Clone, Default)]
pub struct OfflineIdentityProvider {
    identity_id: Option<String>,
}

impl OfflineIdentityProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Report the given identity ID as the cached one
    #[must_use]
    pub fn with_identity_id(mut self, identity_id: impl Into<String>) -> Self {
        self.identity_id = Some(identity_id.into());
        self
    }
}

#[async_trait::async_trait]
impl IdentityProvider for OfflineIdentityProvider {
    async fn session(&self) -> Result<Tokens, IdentityError> {
        Err(IdentityError::Unsupported("fetching a session"))
    }

    async fn federate_logins(
        &self,
        _logins: &BTreeMap<String, String>,
    ) -> Result<Credentials, IdentityError> {
        Err(IdentityError::Unsupported("federating logins"))
    }

    async fn credentials(&self) -> Result<Credentials, IdentityError> {
        Err(IdentityError::Unsupported("fetching credentials"))
    }

    async fn refresh_credentials(&self) -> Result<Credentials, IdentityError> {
        Err(IdentityError::Unsupported("refreshing credentials"))
    }

    async fn clear_credentials(&self) {}

    fn cached_identity_id(&self) -> Option<String> {
        self.identity_id.clone()
    }

    async fn identity_id(&self) -> Result<String, IdentityError> {
        self.identity_id
            .clone()
            .ok_or(IdentityError::Unsupported("creating an identity"))
    }

    async fn sign_in(
        &self,
        _username: &str,
        _password: &str,
    ) -> Result<SignInResult, IdentityError> {
        Err(IdentityError::Unsupported("signing in"))
    }

    async fn confirm_sign_in(&self, _response: &str) -> Result<SignInResult, IdentityError> {
        Err(IdentityError::Unsupported("confirming a sign-in"))
    }

    async fn sign_out(&self, options: SignOutOptions) -> Result<(), IdentityError> {
        if options.global {
            return Err(IdentityError::Unsupported("global sign-out"));
        }

        Ok(())
    }

    fn username(&self) -> Option<String> {
        None
    }
}

/// A [`SignInPresenter`] for environments without any UI
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessSignInPresenter;

#[async_trait::async_trait]
impl SignInPresenter for HeadlessSignInPresenter {
    async fn present(
        &self,
        _options: &SignInUiOptions,
        _notifier: SignInNotifier,
    ) -> Result<(), IdentityError> {
        Err(IdentityError::UiUnavailable)
    }
}
