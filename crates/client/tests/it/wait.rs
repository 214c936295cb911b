// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::time::Duration;

use assert_matches::assert_matches;
use mac_client::SignInWaitError;
use mac_data_model::{Tokens, keys};
use mac_identity::MockFailure;
use mac_storage::MemoryKeyValueStore;
use tokio_util::sync::CancellationToken;

use crate::{
    FEDERATED_PROVIDER, FEDERATED_TOKEN, PATIENCE, TestClient, config, settle,
    user_pool_login_key,
};

/// A client whose cached user pool tokens cannot be refreshed
fn client_with_invalid_tokens(config: mac_data_model::ClientConfig) -> TestClient {
    let test = TestClient::with_store(
        config,
        MemoryKeyValueStore::with_entries([
            (keys::PROVIDER, user_pool_login_key().as_str()),
            (keys::TOKEN, "expired-id-token"),
        ]),
    );
    test.identity.set_session(Err(MockFailure::Unauthorized));
    test
}

#[tokio::test]
async fn test_stable_states_do_not_wait() {
    let test = TestClient::new(config());
    assert_eq!(test.client.wait_for_sign_in().await, Ok(false));

    test.client
        .federated_sign_in(FEDERATED_PROVIDER, FEDERATED_TOKEN)
        .await
        .unwrap();
    assert_eq!(test.client.wait_for_sign_in().await, Ok(true));
}

#[tokio::test]
async fn test_waiter_released_after_refresh() {
    let test = client_with_invalid_tokens(config());

    let client = test.client.clone();
    let waiter = tokio::spawn(async move { client.wait_for_sign_in().await });
    settle().await;
    assert!(!waiter.is_finished());

    // The session can be refreshed now
    test.identity
        .set_session(Ok(Tokens::new("access-token", "fresh-id-token")));
    test.client.release_sign_in_wait();

    let res = tokio::time::timeout(PATIENCE, waiter).await.unwrap().unwrap();
    assert_eq!(res, Ok(true));
}

#[tokio::test]
async fn test_waiter_released_without_sign_in() {
    let test = client_with_invalid_tokens(config());

    let client = test.client.clone();
    let waiter = tokio::spawn(async move { client.wait_for_sign_in().await });
    settle().await;

    // Still no session, the tokens are still invalid
    test.client.release_sign_in_wait();

    let res = tokio::time::timeout(PATIENCE, waiter).await.unwrap().unwrap();
    assert_eq!(res, Ok(false));
}

#[tokio::test]
async fn test_sign_out_releases_waiter() {
    let test = client_with_invalid_tokens(config());

    let client = test.client.clone();
    let waiter = tokio::spawn(async move { client.wait_for_sign_in().await });
    settle().await;

    test.client.sign_out().await.unwrap();

    let res = tokio::time::timeout(PATIENCE, waiter).await.unwrap().unwrap();
    assert_eq!(res, Ok(false));
}

#[tokio::test]
async fn test_sign_in_releases_waiter() {
    let test = client_with_invalid_tokens(config());

    let client = test.client.clone();
    let waiter = tokio::spawn(async move { client.wait_for_sign_in().await });
    settle().await;

    // Signing in opens a session in the mock
    test.client.sign_in("alice", "hunter2").await.unwrap();

    let res = tokio::time::timeout(PATIENCE, waiter).await.unwrap().unwrap();
    assert_eq!(res, Ok(true));
}

#[tokio::test]
async fn test_wait_times_out() {
    let mut config = config();
    config.wait_timeout = Some(Duration::from_millis(50));
    let test = client_with_invalid_tokens(config);

    assert_eq!(
        test.client.wait_for_sign_in().await,
        Err(SignInWaitError::TimedOut(Duration::from_millis(50)))
    );

    // The lock was released, another waiter can go through
    test.identity
        .set_session(Ok(Tokens::new("access-token", "fresh-id-token")));
    assert_eq!(test.client.wait_for_sign_in().await, Ok(true));
}

#[tokio::test]
async fn test_wait_is_cancellable() {
    let mut config = config();
    config.wait_timeout = None;
    let test = client_with_invalid_tokens(config);

    let token = CancellationToken::new();
    let client = test.client.clone();
    let waiter = {
        let token = token.clone();
        tokio::spawn(async move { client.wait_for_sign_in_with(&token).await })
    };
    settle().await;
    assert!(!waiter.is_finished());

    token.cancel();
    let res = tokio::time::timeout(PATIENCE, waiter).await.unwrap().unwrap();
    assert_eq!(res, Err(SignInWaitError::Cancelled));
}

#[tokio::test]
async fn test_shutdown_cancels_waiters() {
    let mut config = config();
    config.wait_timeout = None;
    let test = client_with_invalid_tokens(config);

    let client = test.client.clone();
    let waiter = tokio::spawn(async move { client.wait_for_sign_in().await });
    settle().await;

    tokio::time::timeout(PATIENCE, test.client.shutdown())
        .await
        .unwrap();

    let res = tokio::time::timeout(PATIENCE, waiter).await.unwrap().unwrap();
    assert_matches!(res, Err(SignInWaitError::Cancelled));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_waiters_are_serialized() {
    let test = client_with_invalid_tokens(config());
    // Make the derivation slow enough for waiters to overlap
    test.identity.set_delay(Duration::from_millis(20));

    let waiters: Vec<_> = (0..3)
        .map(|_| {
            let client = test.client.clone();
            tokio::spawn(async move { client.wait_for_sign_in().await })
        })
        .collect();

    settle().await;

    // Only the first waiter got to look at the state so far: the others are
    // queued behind it
    assert_eq!(test.identity.calls().session, 1);

    // Each release lets exactly one waiter through, which looks at the state
    // twice: once before waiting, once after
    for round in 1..=3 {
        test.client.release_sign_in_wait();
        // The released waiter looks at the state again, then the next one
        // installs its gate and looks at the state
        let expected = if round < 3 { 2 * round + 1 } else { 2 * round };
        tokio::time::timeout(PATIENCE, async {
            loop {
                if test.identity.calls().session >= expected {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        settle().await;
    }

    for waiter in waiters {
        let res = tokio::time::timeout(PATIENCE, waiter).await.unwrap().unwrap();
        assert_eq!(res, Ok(false));
    }
    assert_eq!(test.identity.calls().session, 6);
}
