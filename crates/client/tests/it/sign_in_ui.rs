// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::sync::Arc;

use assert_matches::assert_matches;
use mac_client::{ClientError, MobileClient};
use mac_data_model::{Tokens, UserState, keys};
use mac_identity::{
    IdentityError, MockFailure, MockIdentityProvider, MockSignInPresenter, SignInUiOptions,
};
use mac_storage::MemoryKeyValueStore;
use tokio::task::JoinHandle;

use crate::{PATIENCE, TestClient, config, settle, user_pool_login_key};

/// A client whose cached user pool tokens cannot be refreshed, with a caller
/// blocked waiting for a sign-in
async fn blocked_waiter() -> (TestClient, JoinHandle<Result<bool, mac_client::SignInWaitError>>)
{
    let test = TestClient::with_store(
        config(),
        MemoryKeyValueStore::with_entries([
            (keys::PROVIDER, user_pool_login_key().as_str()),
            (keys::TOKEN, "expired-id-token"),
        ]),
    );
    test.identity.set_session(Err(MockFailure::Unauthorized));

    let client = test.client.clone();
    let waiter = tokio::spawn(async move { client.wait_for_sign_in().await });
    settle().await;
    assert!(!waiter.is_finished());

    (test, waiter)
}

fn show_sign_in(
    client: &MobileClient,
) -> JoinHandle<Result<mac_data_model::UserStateDetails, ClientError>> {
    let client = client.clone();
    tokio::spawn(async move {
        client
            .show_sign_in(SignInUiOptions {
                title: Some("Welcome back".to_owned()),
                can_cancel: true,
            })
            .await
    })
}

#[tokio::test]
async fn test_signed_in_through_ui() {
    let (test, waiter) = blocked_waiter().await;

    let ui = show_sign_in(&test.client);
    let notifier = test.presenter.wait_presented().await;

    test.identity
        .set_session(Ok(Tokens::new("access-token", "fresh-id-token")));
    notifier.signed_in();

    let details = tokio::time::timeout(PATIENCE, ui)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(details.state(), UserState::SignedIn);
    assert_eq!(details.token(), Some("fresh-id-token"));

    let res = tokio::time::timeout(PATIENCE, waiter).await.unwrap().unwrap();
    assert_eq!(res, Ok(true));
}

#[tokio::test]
async fn test_cancelled_ui_releases_waiter() {
    let (test, waiter) = blocked_waiter().await;

    let ui = show_sign_in(&test.client);
    test.presenter.wait_presented().await.cancelled();

    let res = tokio::time::timeout(PATIENCE, ui).await.unwrap().unwrap();
    assert_matches!(res, Err(ClientError::SignInCancelled));

    let res = tokio::time::timeout(PATIENCE, waiter).await.unwrap().unwrap();
    assert_eq!(res, Ok(false));
}

#[tokio::test]
async fn test_failed_ui_releases_waiter() {
    let (test, waiter) = blocked_waiter().await;

    let ui = show_sign_in(&test.client);
    test.presenter
        .wait_presented()
        .await
        .failed(IdentityError::NotAuthorized("wrong password".to_owned()));

    let res = tokio::time::timeout(PATIENCE, ui).await.unwrap().unwrap();
    assert_matches!(
        res,
        Err(ClientError::Identity(IdentityError::NotAuthorized(_)))
    );

    let res = tokio::time::timeout(PATIENCE, waiter).await.unwrap().unwrap();
    assert_eq!(res, Ok(false));
}

#[tokio::test]
async fn test_dropped_notifier_counts_as_cancelled() {
    let (test, waiter) = blocked_waiter().await;

    let ui = show_sign_in(&test.client);
    drop(test.presenter.wait_presented().await);

    let res = tokio::time::timeout(PATIENCE, ui).await.unwrap().unwrap();
    assert_matches!(res, Err(ClientError::SignInCancelled));

    let res = tokio::time::timeout(PATIENCE, waiter).await.unwrap().unwrap();
    assert_eq!(res, Ok(false));
}

#[tokio::test]
async fn test_outcome_handled_when_caller_gives_up() {
    let (test, waiter) = blocked_waiter().await;

    let ui = show_sign_in(&test.client);
    let notifier = test.presenter.wait_presented().await;

    // The caller stops waiting for the UI
    ui.abort();

    test.identity
        .set_session(Ok(Tokens::new("access-token", "fresh-id-token")));
    notifier.signed_in();

    let res = tokio::time::timeout(PATIENCE, waiter).await.unwrap().unwrap();
    assert_eq!(res, Ok(true));
}

#[tokio::test]
async fn test_unavailable_ui() {
    let client = MobileClient::builder(
        config(),
        Arc::new(MockIdentityProvider::new()),
        Arc::new(MemoryKeyValueStore::new()),
    )
    .presenter(Arc::new(MockSignInPresenter::unavailable()))
    .build();

    assert_matches!(
        client.show_sign_in(SignInUiOptions::default()).await,
        Err(ClientError::Identity(IdentityError::UiUnavailable))
    );

    // Without any presenter, there is no UI either
    let client = MobileClient::builder(
        config(),
        Arc::new(MockIdentityProvider::new()),
        Arc::new(MemoryKeyValueStore::new()),
    )
    .build();

    assert_matches!(
        client.show_sign_in(SignInUiOptions::default()).await,
        Err(ClientError::Identity(IdentityError::UiUnavailable))
    );
}

#[tokio::test]
async fn test_user_pool_sign_in_through_ui_is_recorded() {
    let test = TestClient::new(config());
    assert!(!test.client.is_signed_in().await);

    let ui = show_sign_in(&test.client);
    let notifier = test.presenter.wait_presented().await;

    test.identity
        .set_session(Ok(Tokens::new("access-token", "ui-id-token")));
    notifier.signed_in();

    let details = tokio::time::timeout(PATIENCE, ui)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(details.state(), UserState::SignedIn);
    assert_eq!(details.provider(), Some(user_pool_login_key().as_str()));
    assert_eq!(details.token(), Some("ui-id-token"));

    let snapshot = test.store.snapshot().await;
    assert_eq!(
        snapshot.get(keys::PROVIDER).map(String::as_str),
        Some(user_pool_login_key().as_str())
    );
    assert_eq!(
        snapshot.get(keys::TOKEN).map(String::as_str),
        Some("ui-id-token")
    );
    assert!(test.client.is_signed_in().await);
    assert_eq!(
        test.client.current_user_state().await.state(),
        UserState::SignedIn
    );
}

#[tokio::test]
async fn test_federated_sign_in_through_ui_is_recorded() {
    let test = TestClient::new(config());

    let ui = show_sign_in(&test.client);
    test.presenter
        .wait_presented()
        .await
        .signed_in_with(crate::FEDERATED_PROVIDER, crate::FEDERATED_TOKEN);

    let details = tokio::time::timeout(PATIENCE, ui)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(details.state(), UserState::SignedIn);
    assert_eq!(details.provider(), Some(crate::FEDERATED_PROVIDER));

    assert_eq!(test.identity.calls().federate_logins, 1);
    assert_eq!(
        test.store.snapshot().await.get(keys::TOKEN).map(String::as_str),
        Some(crate::FEDERATED_TOKEN)
    );
    assert!(test.client.is_signed_in().await);
}

#[tokio::test]
async fn test_user_pool_sign_in_through_ui_without_user_pool() {
    let mut config = config();
    config.user_pool = None;
    let test = TestClient::new(config);

    let ui = show_sign_in(&test.client);
    test.presenter.wait_presented().await.signed_in();

    let res = tokio::time::timeout(PATIENCE, ui).await.unwrap().unwrap();
    assert_matches!(res, Err(ClientError::UserPoolNotConfigured));
    assert!(!test.client.is_signed_in().await);
}
