// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::{sync::Arc, time::Duration};

use mac_client::{MobileClient, UserStateListener};
use mac_data_model::{
    ClientConfig, IdentityPoolSettings, UserPoolSettings, UserState, UserStateDetails,
};
use mac_identity::{MockIdentityProvider, MockSignInPresenter, StaticReachability};
use mac_storage::MemoryKeyValueStore;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

mod derivation;
mod listeners;
mod sign_in_ui;
mod wait;

const REGION: &str = "us-east-1";
const USER_POOL_ID: &str = "us-east-1_TestPool";
const IDENTITY_POOL_ID: &str = "us-east-1:11111111-2222-3333-4444-555555555555";
const FEDERATED_PROVIDER: &str = "accounts.google.com";
const FEDERATED_TOKEN: &str = "google-id-token";

/// How long to wait for something which is expected to happen
const PATIENCE: Duration = Duration::from_secs(5);

fn user_pool_login_key() -> String {
    format!("cognito-idp.{REGION}.amazonaws.com/{USER_POOL_ID}")
}

fn config() -> ClientConfig {
    ClientConfig {
        user_pool: Some(UserPoolSettings {
            pool_id: USER_POOL_ID.to_owned(),
            app_client_id: "test-app-client".to_owned(),
            region: REGION.to_owned(),
        }),
        identity_pool: Some(IdentityPoolSettings {
            pool_id: IDENTITY_POOL_ID.to_owned(),
            region: REGION.to_owned(),
        }),
        wait_timeout: Some(PATIENCE),
        ..ClientConfig::default()
    }
}

/// A client wired to mock collaborators
struct TestClient {
    client: MobileClient,
    identity: Arc<MockIdentityProvider>,
    store: Arc<MemoryKeyValueStore>,
    reachability: Arc<StaticReachability>,
    presenter: Arc<MockSignInPresenter>,
}

impl TestClient {
    fn new(config: ClientConfig) -> Self {
        Self::with_store(config, MemoryKeyValueStore::new())
    }

    fn with_store(config: ClientConfig, store: MemoryKeyValueStore) -> Self {
        let identity = Arc::new(MockIdentityProvider::new());
        let store = Arc::new(store);
        let reachability = Arc::new(StaticReachability::new(true));
        let presenter = Arc::new(MockSignInPresenter::new());

        let client = MobileClient::builder(config, identity.clone(), store.clone())
            .reachability(reachability.clone())
            .presenter(presenter.clone())
            .build();

        Self {
            client,
            identity,
            store,
            reachability,
            presenter,
        }
    }

    /// Register a listener forwarding every notification to a channel
    fn record_notifications(&self) -> UnboundedReceiver<UserStateDetails> {
        let (sender, receiver) = unbounded_channel();
        let listener: Arc<dyn UserStateListener> =
            Arc::new(move |details: &UserStateDetails| {
                let _ = sender.send(details.clone());
            });
        self.client.add_listener(listener);
        receiver
    }
}

/// Wait for the next notification
async fn next_state(receiver: &mut UnboundedReceiver<UserStateDetails>) -> UserState {
    tokio::time::timeout(PATIENCE, receiver.recv())
        .await
        .expect("no notification in time")
        .expect("the listener was dropped")
        .state()
}

/// Let the background tasks run for a bit
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
