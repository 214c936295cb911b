// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Interfaces to the identity provider SDK
//!
//! The mobile authentication client does not talk to the identity services
//! itself. Token issuance, credential federation and the sign-in UI are
//! provided by an SDK, which the client reaches through the traits defined
//! here:
//!
//!   - [`IdentityProvider`] for the user pool and the identity pool
//!   - [`SignInPresenter`] for the drop-in sign-in UI
//!   - [`Reachability`] to know whether the network can be used

#![allow(clippy::module_name_repetitions)]

mod error;
mod mock;
mod offline;
mod presenter;
mod reachability;

use std::{collections::BTreeMap, sync::Arc};

use mac_data_model::{Credentials, SignInResult, SignOutOptions, Tokens};

pub use self::{
    error::{BoxError, IdentityError},
    mock::{
        IdentityProvider as MockIdentityProvider, MockCalls, MockFailure,
        SignInPresenter as MockSignInPresenter,
    },
    offline::{HeadlessSignInPresenter, OfflineIdentityProvider},
    presenter::{SignInEvent, SignInNotifier, SignInPresenter, SignInUiOptions},
    reachability::{AlwaysOnline, Reachability, StaticReachability},
};

#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Get the tokens of the current user pool session.
    ///
    /// Tokens which expired are refreshed first.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::NotAuthorized`] if there is no session or if
    /// it could not be refreshed, or another error if the user pool is
    /// unreachable.
    async fn session(&self) -> Result<Tokens, IdentityError>;

    /// Exchange login tokens for temporary credentials.
    ///
    /// # Parameters
    ///
    /// * `logins` - The tokens to federate, keyed by login provider.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::NotAuthorized`] if the identity pool rejected
    /// the tokens, or another error if it is unreachable.
    async fn federate_logins(
        &self,
        logins: &BTreeMap<String, String>,
    ) -> Result<Credentials, IdentityError>;

    /// Get the current credentials, without federating the logins again.
    ///
    /// # Errors
    ///
    /// Returns an error if no credentials can be obtained.
    async fn credentials(&self) -> Result<Credentials, IdentityError>;

    /// Get fresh credentials for the logins federated last.
    ///
    /// # Errors
    ///
    /// Returns an error if no credentials can be obtained.
    async fn refresh_credentials(&self) -> Result<Credentials, IdentityError>;

    /// Forget the credentials and the federated logins.
    async fn clear_credentials(&self);

    /// Get the identity ID without reaching the identity pool.
    fn cached_identity_id(&self) -> Option<String>;

    /// Get the identity ID, creating an identity if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity pool is unreachable.
    async fn identity_id(&self) -> Result<String, IdentityError>;

    /// Start a user pool sign-in.
    ///
    /// # Parameters
    ///
    /// * `username` - The name of the user signing in.
    /// * `password` - Their password.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the user pool is
    /// unreachable.
    async fn sign_in(&self, username: &str, password: &str)
    -> Result<SignInResult, IdentityError>;

    /// Answer the challenge of an ongoing sign-in.
    ///
    /// # Parameters
    ///
    /// * `response` - The answer to the challenge, e.g. an MFA code.
    ///
    /// # Errors
    ///
    /// Returns an error if the answer is rejected or the user pool is
    /// unreachable.
    async fn confirm_sign_in(&self, response: &str) -> Result<SignInResult, IdentityError>;

    /// Sign the user out of the user pool.
    ///
    /// # Errors
    ///
    /// Returns an error if a global sign-out was requested and the user pool
    /// could not be reached.
    async fn sign_out(&self, options: SignOutOptions) -> Result<(), IdentityError>;

    /// Get the name of the user signed in to the user pool.
    fn username(&self) -> Option<String>;
}

#[async_trait::async_trait]
impl<T: IdentityProvider + ?Sized> IdentityProvider for Arc<T> {
    async fn session(&self) -> Result<Tokens, IdentityError> {
        (**self).session().await
    }

    async fn federate_logins(
        &self,
        logins: &BTreeMap<String, String>,
    ) -> Result<Credentials, IdentityError> {
        (**self).federate_logins(logins).await
    }

    async fn credentials(&self) -> Result<Credentials, IdentityError> {
        (**self).credentials().await
    }

    async fn refresh_credentials(&self) -> Result<Credentials, IdentityError> {
        (**self).refresh_credentials().await
    }

    async fn clear_credentials(&self) {
        (**self).clear_credentials().await;
    }

    fn cached_identity_id(&self) -> Option<String> {
        (**self).cached_identity_id()
    }

    async fn identity_id(&self) -> Result<String, IdentityError> {
        (**self).identity_id().await
    }

    async fn sign_in(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SignInResult, IdentityError> {
        (**self).sign_in(username, password).await
    }

    async fn confirm_sign_in(&self, response: &str) -> Result<SignInResult, IdentityError> {
        (**self).confirm_sign_in(response).await
    }

    async fn sign_out(&self, options: SignOutOptions) -> Result<(), IdentityError> {
        (**self).sign_out(options).await
    }

    fn username(&self) -> Option<String> {
        (**self).username()
    }
}
