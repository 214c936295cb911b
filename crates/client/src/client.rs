// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::{future::Future, sync::Arc, time::Duration};

use arc_swap::ArcSwapOption;
use chrono::Utc;
use mac_data_model::{
    ClientConfig, Credentials, SignInResult, SignOutOptions, Tokens, UserState, UserStateDetails,
};
use mac_identity::{
    AlwaysOnline, HeadlessSignInPresenter, IdentityProvider, Reachability, SignInEvent,
    SignInNotifier, SignInPresenter, SignInUiOptions,
};
use mac_storage::{CredentialCache, KeyValueStore};
use tokio::sync::{Mutex, oneshot, watch};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use crate::{
    Callback, ClientError, SignInWaitError, UserStateListener, gate::SignInGate,
    listeners::ListenerRegistry, state::StateEngine,
};

/// How long [`MobileClient::shutdown`] waits for the background tasks
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds a [`MobileClient`] out of its collaborators
pub struct MobileClientBuilder {
    config: ClientConfig,
    identity: Arc<dyn IdentityProvider>,
    store: Arc<dyn KeyValueStore>,
    reachability: Arc<dyn Reachability>,
    presenter: Arc<dyn SignInPresenter>,
}

impl MobileClientBuilder {
    /// Set how the client knows whether the network is available. Defaults
    /// to always online.
    #[must_use]
    pub fn reachability(mut self, reachability: Arc<dyn Reachability>) -> Self {
        self.reachability = reachability;
        self
    }

    /// Set the drop-in sign-in UI. Defaults to no UI at all.
    #[must_use]
    pub fn presenter(mut self, presenter: Arc<dyn SignInPresenter>) -> Self {
        self.presenter = presenter;
        self
    }

    /// Build the client.
    ///
    /// This spawns the listener dispatcher, so it must be called from within
    /// a Tokio runtime.
    #[must_use]
    pub fn build(self) -> MobileClient {
        let config = Arc::new(self.config);
        let task_tracker = TaskTracker::new();
        let cancellation_token = CancellationToken::new();

        let listeners = ListenerRegistry::new(
            config.listener_queue_capacity,
            &task_tracker,
            cancellation_token.child_token(),
        );

        let engine = StateEngine::new(
            Arc::clone(&config),
            Arc::clone(&self.identity),
            self.reachability,
            CredentialCache::new(self.store),
        );

        MobileClient {
            inner: Arc::new(Inner {
                config,
                engine,
                identity: self.identity,
                presenter: self.presenter,
                listeners,
                wait_lock: Mutex::new(()),
                current_gate: ArcSwapOption::empty(),
                task_tracker,
                cancellation_token,
            }),
        }
    }
}

struct Inner {
    config: Arc<ClientConfig>,
    engine: StateEngine,
    identity: Arc<dyn IdentityProvider>,
    presenter: Arc<dyn SignInPresenter>,
    listeners: ListenerRegistry,

    /// Serializes the state recomputations done by the waiters, and the
    /// lifecycle of the gates
    wait_lock: Mutex<()>,

    /// The gate the current waiter is blocked on, if any
    current_gate: ArcSwapOption<SignInGate>,

    task_tracker: TaskTracker,
    cancellation_token: CancellationToken,
}

/// Keeps track of who is signed in on the device
///
/// The client arbitrates between the cached login tokens, the identity
/// provider and the network reachability to tell whether the user is signed
/// in, a guest, or signed out. Callers can wait for an ongoing sign-in to
/// complete, and listeners get notified when the state changes.
///
/// It is cheap to clone, all clones sharing the same state.
#[derive(Clone)]
pub struct MobileClient {
    inner: Arc<Inner>,
}

impl MobileClient {
    /// Start building a client
    #[must_use]
    pub fn builder(
        config: ClientConfig,
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn KeyValueStore>,
    ) -> MobileClientBuilder {
        MobileClientBuilder {
            config,
            identity,
            store,
            reachability: Arc::new(AlwaysOnline),
            presenter: Arc::new(HeadlessSignInPresenter),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Derive the user state from the credential cache only, and publish it.
    ///
    /// If the credential cache could not be read, the state is derived as if
    /// it was empty, and the error is attached to the returned details.
    #[tracing::instrument(name = "client.initialize", skip_all)]
    pub async fn initialize(&self) -> UserStateDetails {
        let (cached, error) = match self.inner.engine.cache().load().await {
            Ok(cached) => (cached, None),
            Err(e) => {
                tracing::warn!(
                    error = &e as &dyn std::error::Error,
                    "Could not read the credential cache"
                );
                (mac_storage::CachedCredentials::default(), Some(e))
            }
        };

        let details = self.inner.engine.derive_from(&cached, true).await;
        self.publish(details.clone()).await;

        match error {
            Some(error) => details.with_error(error),
            None => details,
        }
    }

    /// Compute the user state, checking the cached tokens against the
    /// identity provider when the network is available.
    ///
    /// Does not wait for an ongoing sign-in, and does not notify the
    /// listeners.
    pub async fn current_user_state(&self) -> UserStateDetails {
        self.inner.engine.derive(false).await
    }

    /// Compute the user state.
    ///
    /// With `offline_check`, only the credential cache is looked at.
    pub async fn derive_user_state(&self, offline_check: bool) -> UserStateDetails {
        self.inner.engine.derive(offline_check).await
    }

    /// Whether the credential cache holds a login token
    pub async fn is_signed_in(&self) -> bool {
        self.inner.engine.derive(true).await.state().is_signed_in()
    }

    /// Wait until the user is signed in or out.
    ///
    /// Returns `true` if the user is signed in. If the cached tokens are
    /// invalid, this waits for a sign-in or a sign-out to complete, up to the
    /// configured timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SignInWaitError::TimedOut`] if nothing happened in time, or
    /// [`SignInWaitError::Cancelled`] if the client is shutting down.
    pub async fn wait_for_sign_in(&self) -> Result<bool, SignInWaitError> {
        self.wait_for_sign_in_with(&CancellationToken::new()).await
    }

    /// Same as [`MobileClient::wait_for_sign_in`], giving up as soon as the
    /// `cancellation_token` is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`SignInWaitError::TimedOut`] if nothing happened in time, or
    /// [`SignInWaitError::Cancelled`] if the wait was cancelled.
    #[tracing::instrument(name = "client.wait_for_sign_in", skip_all)]
    pub async fn wait_for_sign_in_with(
        &self,
        cancellation_token: &CancellationToken,
    ) -> Result<bool, SignInWaitError> {
        let _guard = tokio::select! {
            guard = self.inner.wait_lock.lock() => guard,
            () = cancellation_token.cancelled() => return Err(SignInWaitError::Cancelled),
            () = self.inner.cancellation_token.cancelled() => return Err(SignInWaitError::Cancelled),
        };

        // Install the gate before looking at the state, so that a sign-in
        // completing in the meantime is not missed
        let gate = Arc::new(SignInGate::new());
        self.inner.current_gate.store(Some(Arc::clone(&gate)));

        let details = self.inner.engine.derive(false).await;
        self.publish(details.clone()).await;

        match details.state() {
            UserState::SignedIn => Ok(true),
            UserState::Guest | UserState::SignedOut => Ok(false),
            state @ (UserState::SignedOutUserPoolsTokensInvalid
            | UserState::SignedOutFederatedTokensInvalid) => {
                tracing::info!(user.state = %state, "Waiting for the sign-in to complete");
                self.wait_for_gate(&gate, cancellation_token).await?;

                let details = self.inner.engine.derive(false).await;
                tracing::info!(user.state = %details.state(), "Done waiting for the sign-in");
                Ok(details.state().is_signed_in())
            }
        }
    }

    async fn wait_for_gate(
        &self,
        gate: &SignInGate,
        cancellation_token: &CancellationToken,
    ) -> Result<(), SignInWaitError> {
        let timeout = self.inner.config.wait_timeout;
        let released = async {
            match timeout {
                Some(timeout) => tokio::time::timeout(timeout, gate.wait())
                    .await
                    .map_err(|_| SignInWaitError::TimedOut(timeout)),
                None => {
                    gate.wait().await;
                    Ok(())
                }
            }
        };

        tokio::select! {
            res = released => res,
            () = cancellation_token.cancelled() => Err(SignInWaitError::Cancelled),
            () = self.inner.cancellation_token.cancelled() => Err(SignInWaitError::Cancelled),
        }
    }

    /// Release the caller waiting for a sign-in, if any.
    ///
    /// The waiter then computes the user state again to know whether the user
    /// is signed in.
    pub fn release_sign_in_wait(&self) {
        if let Some(gate) = self.inner.current_gate.load_full()
            && gate.release()
        {
            tracing::debug!("Released the sign-in gate");
        }
    }

    async fn publish(&self, details: UserStateDetails) {
        self.inner.listeners.publish(details).await;
    }

    /// Register a listener for the user state changes
    pub fn add_listener(&self, listener: Arc<dyn UserStateListener>) {
        self.inner.listeners.add(listener);
    }

    /// Unregister a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&self, listener: &Arc<dyn UserStateListener>) -> bool {
        self.inner.listeners.remove(listener)
    }

    /// Watch the user state published last.
    ///
    /// Until a state is published, this reports the user as signed out.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<UserStateDetails> {
        self.inner.listeners.subscribe()
    }

    fn user_pool_login_key(&self) -> Result<&str, ClientError> {
        self.inner
            .engine
            .user_pool_login_key()
            .ok_or(ClientError::UserPoolNotConfigured)
    }

    fn require_identity_pool(&self) -> Result<(), ClientError> {
        if self.inner.config.identity_pool.is_none() {
            return Err(ClientError::IdentityPoolNotConfigured);
        }
        Ok(())
    }

    /// Sign in to the user pool.
    ///
    /// When the sign-in completes without a challenge, the user is signed in
    /// and the waiters are released. Otherwise the challenge must be answered
    /// with [`MobileClient::confirm_sign_in`].
    ///
    /// # Errors
    ///
    /// Returns an error if no user pool is configured, or if the identity
    /// provider refused the sign-in.
    #[tracing::instrument(name = "client.sign_in", skip_all)]
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<SignInResult, ClientError> {
        let login_key = self.user_pool_login_key()?.to_owned();
        let result = self.inner.identity.sign_in(username, password).await?;

        if result.is_done() {
            self.complete_user_pool_sign_in(&login_key).await?;
        } else {
            tracing::info!(challenge = ?result.state, "Sign-in needs a challenge to be answered");
        }

        Ok(result)
    }

    /// Answer the challenge of an ongoing sign-in
    ///
    /// # Errors
    ///
    /// Returns an error if no user pool is configured, or if the identity
    /// provider refused the answer.
    #[tracing::instrument(name = "client.confirm_sign_in", skip_all)]
    pub async fn confirm_sign_in(&self, response: &str) -> Result<SignInResult, ClientError> {
        let login_key = self.user_pool_login_key()?.to_owned();
        let result = self.inner.identity.confirm_sign_in(response).await?;

        if result.is_done() {
            self.complete_user_pool_sign_in(&login_key).await?;
        }

        Ok(result)
    }

    async fn complete_user_pool_sign_in(
        &self,
        login_key: &str,
    ) -> Result<UserStateDetails, ClientError> {
        let tokens = self.inner.identity.session().await?;

        if self.inner.config.federates_user_pool() {
            self.inner.engine.federate(login_key, &tokens.id_token).await?;
        } else {
            self.inner
                .engine
                .remember_login(login_key, &tokens.id_token)
                .await?;
        }

        let details =
            UserStateDetails::with_login(UserState::SignedIn, login_key, &tokens.id_token);
        self.publish(details.clone()).await;
        self.release_sign_in_wait();

        Ok(details)
    }

    /// Sign in with a token issued by a third-party identity provider
    ///
    /// # Parameters
    ///
    /// * `provider` - The login provider which issued the token, e.g.
    ///   `accounts.google.com`.
    /// * `token` - The token to federate.
    ///
    /// # Errors
    ///
    /// Returns an error if no identity pool is configured, or if the token
    /// could not be federated.
    #[tracing::instrument(name = "client.federated_sign_in", skip_all, fields(%provider))]
    pub async fn federated_sign_in(
        &self,
        provider: &str,
        token: &str,
    ) -> Result<UserStateDetails, ClientError> {
        self.require_identity_pool()?;
        self.inner.engine.federate(provider, token).await?;

        let details = UserStateDetails::with_login(UserState::SignedIn, provider, token);
        self.publish(details.clone()).await;
        self.release_sign_in_wait();

        Ok(details)
    }

    /// Sign out on this device only
    ///
    /// # Errors
    ///
    /// See [`MobileClient::sign_out_with`].
    pub async fn sign_out(&self) -> Result<(), ClientError> {
        self.sign_out_with(SignOutOptions::default()).await
    }

    /// Sign out, forgetting the cached tokens and credentials.
    ///
    /// Failing to sign out of the identity provider is logged, the local
    /// sign-out happening regardless.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential cache could not be cleared. The
    /// user is considered signed out anyway.
    #[tracing::instrument(name = "client.sign_out", skip_all, fields(global = options.global))]
    pub async fn sign_out_with(&self, options: SignOutOptions) -> Result<(), ClientError> {
        if let Err(e) = self.inner.identity.sign_out(options).await {
            tracing::warn!(
                error = &e as &dyn std::error::Error,
                "Could not sign out of the identity provider, signing out locally"
            );
        }

        self.inner.identity.clear_credentials().await;
        self.inner.engine.forget_federated_logins();
        let cleared = self.inner.engine.cache().clear().await;

        self.publish(UserStateDetails::bare(UserState::SignedOut))
            .await;
        self.release_sign_in_wait();

        cleared.map_err(ClientError::from)
    }

    /// Get the tokens of the user pool session, waiting for an ongoing
    /// sign-in if needed
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotSignedIn`] if the user is not signed in to
    /// the user pool.
    #[tracing::instrument(name = "client.tokens", skip_all)]
    pub async fn tokens(&self) -> Result<Tokens, ClientError> {
        let login_key = self.user_pool_login_key()?.to_owned();

        if !self.wait_for_sign_in().await? {
            return Err(ClientError::NotSignedIn);
        }

        let cached = self.inner.engine.cache().load().await?;
        if cached.login().map(|(provider, _)| provider) != Some(login_key.as_str()) {
            return Err(ClientError::NotSignedIn);
        }

        Ok(self.inner.identity.session().await?)
    }

    /// Get credentials from the identity pool, refreshing them if they are
    /// about to expire
    ///
    /// # Errors
    ///
    /// Returns an error if no identity pool is configured, or if no
    /// credentials could be obtained.
    pub async fn credentials(&self) -> Result<Credentials, ClientError> {
        self.require_identity_pool()?;

        let credentials = self.inner.identity.credentials().await?;
        if credentials.is_expired(Utc::now()) {
            tracing::debug!("Credentials expired, refreshing");
            return Ok(self.inner.identity.refresh_credentials().await?);
        }

        Ok(credentials)
    }

    /// Get the identity ID, creating an identity if needed
    ///
    /// # Errors
    ///
    /// Returns an error if no identity pool is configured, or if the identity
    /// provider failed.
    pub async fn identity_id(&self) -> Result<String, ClientError> {
        self.require_identity_pool()?;

        let identity_id = self.inner.identity.identity_id().await?;
        self.inner.engine.cache().save_identity_id(&identity_id).await?;
        Ok(identity_id)
    }

    /// The name of the user signed in to the user pool
    #[must_use]
    pub fn username(&self) -> Option<String> {
        self.inner.identity.username()
    }

    /// Show the drop-in sign-in UI, and wait for the user to go through it.
    ///
    /// When the UI reports a sign-in, the login is recorded in the credential
    /// cache the same way [`MobileClient::sign_in`] or
    /// [`MobileClient::federated_sign_in`] would. Whatever the outcome, the
    /// callers waiting for a sign-in are released.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::SignInCancelled`] if the user dismissed the UI,
    /// or the error reported by the UI.
    #[tracing::instrument(name = "client.show_sign_in", skip_all)]
    pub async fn show_sign_in(
        &self,
        options: SignInUiOptions,
    ) -> Result<UserStateDetails, ClientError> {
        let (notifier, mut events) = SignInNotifier::channel();
        self.inner.presenter.present(&options, notifier).await?;

        // Handle the outcome in the background, so that it is taken into
        // account even if the caller stops waiting
        let (sender, receiver) = oneshot::channel();
        let client = self.clone();
        self.inner.task_tracker.spawn(async move {
            let event = tokio::select! {
                event = events.recv() => event,
                () = client.inner.cancellation_token.cancelled() => {
                    let _ = sender.send(Err(ClientError::ShuttingDown));
                    return;
                }
            };

            let outcome = client.handle_sign_in_event(event).await;
            let _ = sender.send(outcome);
        });

        receiver.await.map_err(|_| ClientError::ShuttingDown)?
    }

    async fn handle_sign_in_event(
        &self,
        event: Option<SignInEvent>,
    ) -> Result<UserStateDetails, ClientError> {
        let outcome = match event {
            Some(SignInEvent::SignedIn) => {
                tracing::info!("Signed in to the user pool through the sign-in UI");
                match self.user_pool_login_key().map(ToOwned::to_owned) {
                    Ok(login_key) => self.complete_user_pool_sign_in(&login_key).await,
                    Err(e) => Err(e),
                }
            }
            Some(SignInEvent::SignedInWith { provider, token }) => {
                tracing::info!(
                    %provider,
                    "Signed in with a third-party provider through the sign-in UI"
                );
                self.federated_sign_in(&provider, &token).await
            }
            Some(SignInEvent::Cancelled) | None => {
                tracing::info!("Sign-in UI was dismissed");
                Err(ClientError::SignInCancelled)
            }
            Some(SignInEvent::Failed(e)) => {
                tracing::warn!(
                    error = &e as &dyn std::error::Error,
                    "Sign-in UI reported a failure"
                );
                Err(e.into())
            }
        };

        self.release_sign_in_wait();
        outcome
    }

    /// Run an operation in the background, and hand its result to the
    /// `callback`
    ///
    /// The operation is tracked by the client, [`MobileClient::shutdown`]
    /// waiting for it to finish. Once the client is shut down, the operation
    /// is not started and the callback gets [`ClientError::ShuttingDown`]
    /// right away.
    pub fn spawn_with_callback<T, F, Fut, C>(&self, operation: F, callback: C)
    where
        F: FnOnce(MobileClient) -> Fut,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
        T: Send + 'static,
        C: Callback<T>,
    {
        if self.inner.cancellation_token.is_cancelled() {
            tracing::debug!("Client is shut down, not starting the operation");
            callback.call(Err(ClientError::ShuttingDown));
            return;
        }

        let operation = operation(self.clone());
        self.inner.task_tracker.spawn(async move {
            callback.call(operation.await);
        });
    }

    /// Stop the client, and wait for the pending notifications and
    /// background operations to finish.
    ///
    /// Callers waiting for a sign-in are released with
    /// [`SignInWaitError::Cancelled`].
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down the mobile client");
        self.inner.cancellation_token.cancel();
        self.inner.task_tracker.close();

        if tokio::time::timeout(SHUTDOWN_TIMEOUT, self.inner.task_tracker.wait())
            .await
            .is_err()
        {
            tracing::warn!(
                pending = self.inner.task_tracker.len(),
                "Some background tasks did not finish in time"
            );
        }
    }
}
