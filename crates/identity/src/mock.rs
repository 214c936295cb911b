// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::{collections::BTreeMap, sync::Mutex, time::Duration};

use mac_data_model::{Credentials, SignInResult, SignOutOptions, Tokens};
use tokio::sync::Notify;

use crate::{IdentityError, SignInNotifier, SignInUiOptions};

/// How a mocked operation should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// Fail with [`IdentityError::NotAuthorized`]
    Unauthorized,

    /// Fail with [`IdentityError::Network`]
    Network,
}

impl MockFailure {
    fn into_error(self, what: &str) -> IdentityError {
        match self {
            Self::Unauthorized => IdentityError::NotAuthorized(format!("{what} rejected")),
            Self::Network => IdentityError::network(format!("{what} timed out")),
        }
    }
}

/// How many times each operation of the mock was called
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockCalls {
    pub session: usize,
    pub federate_logins: usize,
    pub credentials: usize,
    pub refresh_credentials: usize,
    pub clear_credentials: usize,
    pub cached_identity_id: usize,
    pub identity_id: usize,
    pub sign_in: usize,
    pub confirm_sign_in: usize,
    pub sign_out: usize,
}

impl MockCalls {
    /// The number of calls made to the mock, all operations combined
    #[must_use]
    pub fn total(&self) -> usize {
        self.session
            + self.federate_logins
            + self.credentials
            + self.refresh_credentials
            + self.clear_credentials
            + self.cached_identity_id
            + self.identity_id
            + self.sign_in
            + self.confirm_sign_in
            + self.sign_out
    }
}

struct MockState {
    session: Result<Tokens, MockFailure>,
    federation: Result<(), MockFailure>,
    sign_in: Result<SignInResult, MockFailure>,
    identity_id: Option<String>,
    username: Option<String>,
    federated_logins: BTreeMap<String, String>,
    delay: Option<Duration>,
    calls: MockCalls,
}

/// An in-memory identity provider, scripted by the tests
///
/// By default there is no user pool session, federation succeeds and sign-in
/// completes without any challenge.
pub struct IdentityProvider {
    state: Mutex<MockState>,
}

impl Default for IdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider {
    /// The credentials handed out by the mock
    pub const ACCESS_KEY_ID: &'static str = "AKIDMOCK";

    /// The identity ID assigned on the first federation
    pub const IDENTITY_ID: &'static str = "us-east-1:00000000-0000-0000-0000-000000000000";

    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                session: Err(MockFailure::Unauthorized),
                federation: Ok(()),
                sign_in: Ok(SignInResult::done()),
                identity_id: None,
                username: None,
                federated_logins: BTreeMap::new(),
                delay: None,
                calls: MockCalls::default(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // A test panicking while holding the lock should not cascade
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Set what [`session`](crate::IdentityProvider::session) returns
    pub fn set_session(&self, session: Result<Tokens, MockFailure>) {
        self.lock().session = session;
    }

    /// Set whether federating logins succeeds
    pub fn set_federation(&self, federation: Result<(), MockFailure>) {
        self.lock().federation = federation;
    }

    /// Set what [`sign_in`](crate::IdentityProvider::sign_in) returns
    pub fn set_sign_in(&self, sign_in: Result<SignInResult, MockFailure>) {
        self.lock().sign_in = sign_in;
    }

    /// Set the identity ID the mock knows about
    pub fn set_identity_id(&self, identity_id: Option<&str>) {
        self.lock().identity_id = identity_id.map(ToOwned::to_owned);
    }

    /// Make every network operation take this long
    pub fn set_delay(&self, delay: Duration) {
        self.lock().delay = Some(delay);
    }

    /// The calls made so far
    #[must_use]
    pub fn calls(&self) -> MockCalls {
        self.lock().calls.clone()
    }

    /// The logins federated last
    #[must_use]
    pub fn federated_logins(&self) -> BTreeMap<String, String> {
        self.lock().federated_logins.clone()
    }

    fn credentials_for(&self) -> Credentials {
        Credentials {
            access_key_id: Self::ACCESS_KEY_ID.to_owned(),
            secret_key: "mock-secret".to_owned(),
            session_token: Some("mock-session".to_owned()),
            expiration: None,
        }
    }

    async fn simulate_latency(&self) {
        let delay = self.lock().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait::async_trait]
impl crate::IdentityProvider for IdentityProvider {
    async fn session(&self) -> Result<Tokens, IdentityError> {
        self.lock().calls.session += 1;
        self.simulate_latency().await;
        self.lock()
            .session
            .clone()
            .map_err(|f| f.into_error("session"))
    }

    async fn federate_logins(
        &self,
        logins: &BTreeMap<String, String>,
    ) -> Result<Credentials, IdentityError> {
        self.lock().calls.federate_logins += 1;
        self.simulate_latency().await;

        let mut state = self.lock();
        state.federation.map_err(|f| f.into_error("federation"))?;
        state.federated_logins.clone_from(logins);
        if state.identity_id.is_none() {
            state.identity_id = Some(Self::IDENTITY_ID.to_owned());
        }
        drop(state);

        Ok(self.credentials_for())
    }

    async fn credentials(&self) -> Result<Credentials, IdentityError> {
        let mut state = self.lock();
        state.calls.credentials += 1;
        state.federation.map_err(|f| f.into_error("credentials"))?;
        drop(state);

        Ok(self.credentials_for())
    }

    async fn refresh_credentials(&self) -> Result<Credentials, IdentityError> {
        let mut state = self.lock();
        state.calls.refresh_credentials += 1;
        state.federation.map_err(|f| f.into_error("refresh"))?;
        drop(state);

        Ok(self.credentials_for())
    }

    async fn clear_credentials(&self) {
        let mut state = self.lock();
        state.calls.clear_credentials += 1;
        state.federated_logins.clear();
        state.identity_id = None;
    }

    fn cached_identity_id(&self) -> Option<String> {
        let mut state = self.lock();
        state.calls.cached_identity_id += 1;
        state.identity_id.clone()
    }

    async fn identity_id(&self) -> Result<String, IdentityError> {
        let mut state = self.lock();
        state.calls.identity_id += 1;
        state.federation.map_err(|f| f.into_error("identity"))?;
        Ok(state
            .identity_id
            .get_or_insert_with(|| Self::IDENTITY_ID.to_owned())
            .clone())
    }

    async fn sign_in(
        &self,
        username: &str,
        _password: &str,
    ) -> Result<SignInResult, IdentityError> {
        self.lock().calls.sign_in += 1;
        self.simulate_latency().await;

        let mut state = self.lock();
        let result = state
            .sign_in
            .clone()
            .map_err(|f| f.into_error("sign-in"))?;
        state.username = Some(username.to_owned());
        if result.is_done() {
            state.session = Ok(Tokens::new(
                format!("access-{username}"),
                format!("id-{username}"),
            ));
        }

        Ok(result)
    }

    async fn confirm_sign_in(&self, _response: &str) -> Result<SignInResult, IdentityError> {
        let mut state = self.lock();
        state.calls.confirm_sign_in += 1;
        let username = state.username.clone().unwrap_or_default();
        state.session = Ok(Tokens::new(
            format!("access-{username}"),
            format!("id-{username}"),
        ));
        Ok(SignInResult::done())
    }

    async fn sign_out(&self, _options: SignOutOptions) -> Result<(), IdentityError> {
        let mut state = self.lock();
        state.calls.sign_out += 1;
        state.session = Err(MockFailure::Unauthorized);
        state.username = None;
        Ok(())
    }

    fn username(&self) -> Option<String> {
        self.lock().username.clone()
    }
}

/// A sign-in UI which does nothing but hand its notifier to the tests
#[derive(Default)]
pub struct SignInPresenter {
    notifier: Mutex<Option<SignInNotifier>>,
    presented: Notify,
    unavailable: bool,
}

impl SignInPresenter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A presenter which fails to show the UI
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Wait for the UI to be shown, and get the notifier it was given
    pub async fn wait_presented(&self) -> SignInNotifier {
        loop {
            let presented = self.presented.notified();
            if let Some(notifier) = self.take_notifier() {
                return notifier;
            }
            presented.await;
        }
    }

    fn take_notifier(&self) -> Option<SignInNotifier> {
        self.notifier
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take()
    }
}

#[async_trait::async_trait]
impl crate::SignInPresenter for SignInPresenter {
    async fn present(
        &self,
        _options: &SignInUiOptions,
        notifier: SignInNotifier,
    ) -> Result<(), IdentityError> {
        if self.unavailable {
            return Err(IdentityError::UiUnavailable);
        }

        *self
            .notifier
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(notifier);
        self.presented.notify_one();
        Ok(())
    }
}
