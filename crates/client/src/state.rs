// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, PoisonError},
};

use mac_data_model::{
    ClientConfig, Credentials, FederatedFailurePolicy, TokenSource, Tokens, UserState,
    UserStateDetails,
};
use mac_identity::{IdentityError, IdentityProvider, Reachability};
use mac_storage::{CachedCredentials, CredentialCache, StoreError};

/// Computes the user state out of the credential cache, the network
/// reachability and the identity provider
pub(crate) struct StateEngine {
    config: Arc<ClientConfig>,
    user_pool_login_key: Option<String>,
    identity: Arc<dyn IdentityProvider>,
    reachability: Arc<dyn Reachability>,
    cache: CredentialCache,

    /// The logins federated last, to avoid federating the same token twice
    federated_logins: Mutex<BTreeMap<String, String>>,
}

impl StateEngine {
    pub(crate) fn new(
        config: Arc<ClientConfig>,
        identity: Arc<dyn IdentityProvider>,
        reachability: Arc<dyn Reachability>,
        cache: CredentialCache,
    ) -> Self {
        let user_pool_login_key = config.user_pool_login_key();
        Self {
            config,
            user_pool_login_key,
            identity,
            reachability,
            cache,
            federated_logins: Mutex::new(BTreeMap::new()),
        }
    }

    pub(crate) fn cache(&self) -> &CredentialCache {
        &self.cache
    }

    pub(crate) fn user_pool_login_key(&self) -> Option<&str> {
        self.user_pool_login_key.as_deref()
    }

    /// Compute the user state.
    ///
    /// With `offline_check`, or when the network is unreachable, the state is
    /// derived from the cache alone and the identity provider is never
    /// called. Failures of the identity provider are reflected in the
    /// returned state, never returned.
    pub(crate) async fn derive(&self, offline_check: bool) -> UserStateDetails {
        let cached = match self.cache.load().await {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!(
                    error = &e as &dyn std::error::Error,
                    "Could not read the credential cache, considering it empty"
                );
                CachedCredentials::default()
            }
        };

        self.derive_from(&cached, offline_check).await
    }

    pub(crate) async fn derive_from(
        &self,
        cached: &CachedCredentials,
        offline_check: bool,
    ) -> UserStateDetails {
        let login = cached.login();

        if offline_check || !self.reachability.is_network_available() {
            tracing::debug!(
                offline_check,
                has_useful_token = login.is_some(),
                "Deriving the user state from the cache only"
            );

            return match (login, cached.identity_id()) {
                (Some((provider, token)), _) => {
                    UserStateDetails::with_login(UserState::SignedIn, provider, token)
                }
                (None, Some(_)) => UserStateDetails::bare(UserState::Guest),
                (None, None) => UserStateDetails::bare(UserState::SignedOut),
            };
        }

        if let Some((provider, token)) = login {
            return match TokenSource::classify(provider, self.user_pool_login_key()) {
                TokenSource::Federated => self.check_federated_token(provider, token).await,
                TokenSource::UserPool => self.check_user_pool_session(provider, token).await,
            };
        }

        if self.config.identity_pool.is_none() {
            return UserStateDetails::bare(UserState::SignedOut);
        }

        let identity_id = cached
            .identity_id()
            .map(ToOwned::to_owned)
            .or_else(|| self.identity.cached_identity_id());

        if identity_id.is_some() {
            UserStateDetails::bare(UserState::Guest)
        } else {
            UserStateDetails::bare(UserState::SignedOut)
        }
    }

    #[tracing::instrument(name = "client.state.check_federated", skip_all, fields(%provider))]
    async fn check_federated_token(&self, provider: &str, token: &str) -> UserStateDetails {
        let result = if self.is_federated(provider, token) {
            tracing::debug!("Token already federated, fetching the current credentials");
            self.identity.credentials().await.map(|_| ())
        } else {
            self.federate(provider, token).await.map(|_| ())
        };

        let signed_in = || UserStateDetails::with_login(UserState::SignedIn, provider, token);
        let invalid = || {
            UserStateDetails::with_login(UserState::SignedOutFederatedTokensInvalid, provider, token)
        };

        match result {
            Ok(()) => signed_in(),

            Err(e) if e.is_unauthorized() => {
                tracing::info!(
                    error = &e as &dyn std::error::Error,
                    "Federated token was rejected"
                );
                invalid()
            }

            Err(e) => match self.config.federated_failure_policy {
                FederatedFailurePolicy::Optimistic => {
                    tracing::warn!(
                        error = &e as &dyn std::error::Error,
                        "Could not check the federated token, assuming it is still valid"
                    );
                    signed_in()
                }
                FederatedFailurePolicy::Invalidate => {
                    tracing::warn!(
                        error = &e as &dyn std::error::Error,
                        "Could not check the federated token, considering it invalid"
                    );
                    invalid()
                }
            },
        }
    }

    #[tracing::instrument(name = "client.state.check_user_pool", skip_all)]
    async fn check_user_pool_session(&self, provider: &str, token: &str) -> UserStateDetails {
        match self.refresh_user_pool_session(provider).await {
            Ok(tokens) => {
                UserStateDetails::with_login(UserState::SignedIn, provider, &tokens.id_token)
            }
            Err(e) => {
                tracing::info!(
                    error = &e as &dyn std::error::Error,
                    "Could not get a user pool session"
                );
                UserStateDetails::with_login(
                    UserState::SignedOutUserPoolsTokensInvalid,
                    provider,
                    token,
                )
            }
        }
    }

    /// Get a live user pool session, and federate its ID token if needed
    async fn refresh_user_pool_session(&self, provider: &str) -> Result<Tokens, IdentityError> {
        let tokens = self.identity.session().await?;

        if self.config.federates_user_pool() && !self.is_federated(provider, &tokens.id_token) {
            self.federate(provider, &tokens.id_token).await?;
        }

        Ok(tokens)
    }

    fn federated_logins(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.federated_logins
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn is_federated(&self, provider: &str, token: &str) -> bool {
        self.federated_logins()
            .get(provider)
            .is_some_and(|federated| federated == token)
    }

    /// Forget which logins were federated
    pub(crate) fn forget_federated_logins(&self) {
        self.federated_logins().clear();
    }

    /// Exchange a login token for credentials, and remember it in the
    /// credential cache.
    ///
    /// Failing to write the credential cache is logged, not returned: the
    /// federation itself succeeded.
    pub(crate) async fn federate(
        &self,
        provider: &str,
        token: &str,
    ) -> Result<Credentials, IdentityError> {
        if self.config.identity_pool.is_none() {
            return Err(IdentityError::Unsupported(
                "federating a token without an identity pool",
            ));
        }

        let logins = BTreeMap::from([(provider.to_owned(), token.to_owned())]);
        let credentials = self.identity.federate_logins(&logins).await?;
        *self.federated_logins() = logins;

        if let Err(e) = self.remember_login(provider, token).await {
            tracing::warn!(
                error = &e as &dyn std::error::Error,
                "Could not write the federated login to the credential cache"
            );
        }

        Ok(credentials)
    }

    /// Persist a login, along with the identity ID known to the identity
    /// provider
    pub(crate) async fn remember_login(&self, provider: &str, token: &str) -> Result<(), StoreError> {
        self.cache.save_login(provider, token).await?;

        if let Some(identity_id) = self.identity.cached_identity_id() {
            self.cache.save_identity_id(&identity_id).await?;
        }

        Ok(())
    }
}
