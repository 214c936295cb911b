// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::sync::Arc;

use mac_client::UserStateListener;
use mac_data_model::{UserState, UserStateDetails};

use crate::{FEDERATED_PROVIDER, FEDERATED_TOKEN, PATIENCE, TestClient, config, next_state, settle};

#[tokio::test]
async fn test_one_notification_per_transition() {
    let test = TestClient::new(config());
    let mut notifications = test.record_notifications();

    // Publishing the same state again does not notify
    test.client.initialize().await;
    test.client.initialize().await;
    test.client.wait_for_sign_in().await.unwrap();
    assert_eq!(next_state(&mut notifications).await, UserState::SignedOut);

    test.client
        .federated_sign_in(FEDERATED_PROVIDER, FEDERATED_TOKEN)
        .await
        .unwrap();
    test.client.wait_for_sign_in().await.unwrap();
    assert_eq!(next_state(&mut notifications).await, UserState::SignedIn);

    test.client.sign_out().await.unwrap();
    assert_eq!(next_state(&mut notifications).await, UserState::SignedOut);

    settle().await;
    assert!(notifications.try_recv().is_err());
}

#[tokio::test]
async fn test_panicking_listener_does_not_affect_others() {
    let test = TestClient::new(config());

    let panicking: Arc<dyn UserStateListener> = Arc::new(|_: &UserStateDetails| {
        panic!("listener bug");
    });
    test.client.add_listener(panicking);
    let mut notifications = test.record_notifications();

    test.client.initialize().await;
    assert_eq!(next_state(&mut notifications).await, UserState::SignedOut);

    test.client
        .federated_sign_in(FEDERATED_PROVIDER, FEDERATED_TOKEN)
        .await
        .unwrap();
    assert_eq!(next_state(&mut notifications).await, UserState::SignedIn);
}

#[tokio::test]
async fn test_removed_listener_is_not_notified() {
    let test = TestClient::new(config());
    let (sender, mut receiver) = tokio::sync::mpsc::unbounded_channel();
    let listener: Arc<dyn UserStateListener> = Arc::new(move |details: &UserStateDetails| {
        let _ = sender.send(details.state());
    });

    test.client.add_listener(Arc::clone(&listener));
    test.client.initialize().await;
    assert_eq!(
        tokio::time::timeout(PATIENCE, receiver.recv()).await.unwrap(),
        Some(UserState::SignedOut)
    );

    assert!(test.client.remove_listener(&listener));
    test.client
        .federated_sign_in(FEDERATED_PROVIDER, FEDERATED_TOKEN)
        .await
        .unwrap();

    settle().await;
    assert!(receiver.try_recv().is_err());
}

#[tokio::test]
async fn test_subscribe() {
    let test = TestClient::new(config());
    let mut states = test.client.subscribe();

    test.client
        .federated_sign_in(FEDERATED_PROVIDER, FEDERATED_TOKEN)
        .await
        .unwrap();

    tokio::time::timeout(PATIENCE, states.changed())
        .await
        .unwrap()
        .unwrap();
    let latest = states.borrow_and_update().clone();
    assert_eq!(latest.state(), UserState::SignedIn);
    assert_eq!(latest.token(), Some(FEDERATED_TOKEN));
}

#[tokio::test]
async fn test_shutdown_delivers_pending_notifications() {
    let test = TestClient::new(config());
    let mut notifications = test.record_notifications();

    test.client.initialize().await;
    test.client.shutdown().await;

    // The notification went through before the shutdown completed
    assert_eq!(notifications.try_recv().map(|d| d.state()), Ok(UserState::SignedOut));
}
