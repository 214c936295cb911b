// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use mac_data_model::{Credentials, SignInResult, SignOutOptions, Tokens, UserStateDetails};
use mac_identity::SignInUiOptions;
use tokio::runtime::Handle;

use crate::{ClientError, MobileClient, SignInWaitError};

/// Blocking variants of the [`MobileClient`] operations
///
/// Every method drives the corresponding operation to completion on the
/// runtime, blocking the current thread. They panic if called from within an
/// asynchronous context; use them from plain threads, or from
/// [`tokio::task::spawn_blocking`].
#[derive(Clone)]
pub struct BlockingMobileClient {
    client: MobileClient,
    handle: Handle,
}

impl BlockingMobileClient {
    #[must_use]
    pub fn new(client: MobileClient, handle: Handle) -> Self {
        Self { client, handle }
    }

    /// The asynchronous client this wraps
    #[must_use]
    pub fn client(&self) -> &MobileClient {
        &self.client
    }

    pub fn initialize(&self) -> UserStateDetails {
        self.handle.block_on(self.client.initialize())
    }

    pub fn current_user_state(&self) -> UserStateDetails {
        self.handle.block_on(self.client.current_user_state())
    }

    pub fn is_signed_in(&self) -> bool {
        self.handle.block_on(self.client.is_signed_in())
    }

    /// # Errors
    ///
    /// See [`MobileClient::wait_for_sign_in`]
    pub fn wait_for_sign_in(&self) -> Result<bool, SignInWaitError> {
        self.handle.block_on(self.client.wait_for_sign_in())
    }

    pub fn release_sign_in_wait(&self) {
        self.client.release_sign_in_wait();
    }

    /// # Errors
    ///
    /// See [`MobileClient::sign_in`]
    pub fn sign_in(&self, username: &str, password: &str) -> Result<SignInResult, ClientError> {
        self.handle.block_on(self.client.sign_in(username, password))
    }

    /// # Errors
    ///
    /// See [`MobileClient::confirm_sign_in`]
    pub fn confirm_sign_in(&self, response: &str) -> Result<SignInResult, ClientError> {
        self.handle.block_on(self.client.confirm_sign_in(response))
    }

    /// # Errors
    ///
    /// See [`MobileClient::federated_sign_in`]
    pub fn federated_sign_in(
        &self,
        provider: &str,
        token: &str,
    ) -> Result<UserStateDetails, ClientError> {
        self.handle
            .block_on(self.client.federated_sign_in(provider, token))
    }

    /// # Errors
    ///
    /// See [`MobileClient::sign_out`]
    pub fn sign_out(&self) -> Result<(), ClientError> {
        self.handle.block_on(self.client.sign_out())
    }

    /// # Errors
    ///
    /// See [`MobileClient::sign_out_with`]
    pub fn sign_out_with(&self, options: SignOutOptions) -> Result<(), ClientError> {
        self.handle.block_on(self.client.sign_out_with(options))
    }

    /// # Errors
    ///
    /// See [`MobileClient::tokens`]
    pub fn tokens(&self) -> Result<Tokens, ClientError> {
        self.handle.block_on(self.client.tokens())
    }

    /// # Errors
    ///
    /// See [`MobileClient::credentials`]
    pub fn credentials(&self) -> Result<Credentials, ClientError> {
        self.handle.block_on(self.client.credentials())
    }

    /// # Errors
    ///
    /// See [`MobileClient::identity_id`]
    pub fn identity_id(&self) -> Result<String, ClientError> {
        self.handle.block_on(self.client.identity_id())
    }

    /// # Errors
    ///
    /// See [`MobileClient::show_sign_in`]
    pub fn show_sign_in(&self, options: SignInUiOptions) -> Result<UserStateDetails, ClientError> {
        self.handle.block_on(self.client.show_sign_in(options))
    }

    #[must_use]
    pub fn username(&self) -> Option<String> {
        self.client.username()
    }
}
