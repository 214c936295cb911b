// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use mac_data_model::{Tokens, UserState, keys};
use mac_identity::MockFailure;
use mac_storage::MemoryKeyValueStore;

use crate::{FEDERATED_PROVIDER, FEDERATED_TOKEN, TestClient, config, user_pool_login_key};

#[tokio::test]
async fn test_offline_classification() {
    let cases = [
        (
            vec![(keys::PROVIDER, FEDERATED_PROVIDER), (keys::TOKEN, FEDERATED_TOKEN)],
            UserState::SignedIn,
        ),
        (vec![(keys::IDENTITY_ID, "us-east-1:guest")], UserState::Guest),
        (vec![], UserState::SignedOut),
        // A provider without a token is not useful
        (
            vec![(keys::PROVIDER, FEDERATED_PROVIDER), (keys::TOKEN, "")],
            UserState::SignedOut,
        ),
    ];

    for (entries, expected) in cases {
        let test = TestClient::with_store(config(), MemoryKeyValueStore::with_entries(entries));
        let details = test.client.derive_user_state(true).await;
        assert_eq!(details.state(), expected);
    }
}

#[tokio::test]
async fn test_offline_details_carry_the_login() {
    let test = TestClient::with_store(
        config(),
        MemoryKeyValueStore::with_entries([
            (keys::PROVIDER, FEDERATED_PROVIDER),
            (keys::TOKEN, FEDERATED_TOKEN),
        ]),
    );

    let details = test.client.derive_user_state(true).await;
    assert_eq!(details.provider(), Some(FEDERATED_PROVIDER));
    assert_eq!(details.token(), Some(FEDERATED_TOKEN));
}

#[tokio::test]
async fn test_offline_derivation_never_calls_identity_provider() {
    let test = TestClient::with_store(
        config(),
        MemoryKeyValueStore::with_entries([
            (keys::PROVIDER, user_pool_login_key().as_str()),
            (keys::TOKEN, "id-token"),
        ]),
    );

    test.client.derive_user_state(true).await;
    assert!(test.client.is_signed_in().await);
    test.client.initialize().await;

    // Same when the network is down, even for an online derivation
    test.reachability.set_available(false);
    test.client.derive_user_state(false).await;
    test.client.current_user_state().await;

    assert_eq!(test.identity.calls().total(), 0);
}

#[tokio::test]
async fn test_derivation_is_idempotent() {
    let test = TestClient::with_store(
        config(),
        MemoryKeyValueStore::with_entries([
            (keys::PROVIDER, FEDERATED_PROVIDER),
            (keys::TOKEN, FEDERATED_TOKEN),
        ]),
    );

    for offline_check in [true, false] {
        let first = test.client.derive_user_state(offline_check).await;
        let second = test.client.derive_user_state(offline_check).await;
        assert_eq!(first, second);
    }
}

#[tokio::test]
async fn test_empty_cache_without_network() {
    let test = TestClient::new(config());
    test.reachability.set_available(false);

    let details = test.client.derive_user_state(false).await;
    assert_eq!(details.state(), UserState::SignedOut);
    assert!(details.details().is_empty());
}

#[tokio::test]
async fn test_expired_user_pool_tokens() {
    let test = TestClient::with_store(
        config(),
        MemoryKeyValueStore::with_entries([
            (keys::PROVIDER, user_pool_login_key().as_str()),
            (keys::TOKEN, "expired-id-token"),
        ]),
    );
    test.identity.set_session(Err(MockFailure::Unauthorized));

    let details = test.client.derive_user_state(false).await;
    assert_eq!(details.state(), UserState::SignedOutUserPoolsTokensInvalid);
    assert!(details.state().is_transient());

    // A network failure is handled the same way
    test.identity.set_session(Err(MockFailure::Network));
    let details = test.client.derive_user_state(false).await;
    assert_eq!(details.state(), UserState::SignedOutUserPoolsTokensInvalid);
}

#[tokio::test]
async fn test_valid_user_pool_session() {
    let test = TestClient::with_store(
        config(),
        MemoryKeyValueStore::with_entries([
            (keys::PROVIDER, user_pool_login_key().as_str()),
            (keys::TOKEN, "old-id-token"),
        ]),
    );
    test.identity
        .set_session(Ok(Tokens::new("access-token", "new-id-token")));

    let details = test.client.current_user_state().await;
    assert_eq!(details.state(), UserState::SignedIn);
    assert_eq!(details.token(), Some("new-id-token"));
}

#[tokio::test]
async fn test_rejected_federated_token() {
    let test = TestClient::with_store(
        config(),
        MemoryKeyValueStore::with_entries([
            (keys::PROVIDER, FEDERATED_PROVIDER),
            (keys::TOKEN, FEDERATED_TOKEN),
        ]),
    );
    test.identity.set_federation(Err(MockFailure::Unauthorized));

    let details = test.client.current_user_state().await;
    assert_eq!(details.state(), UserState::SignedOutFederatedTokensInvalid);
}

#[tokio::test]
async fn test_guest() {
    let test = TestClient::with_store(
        config(),
        MemoryKeyValueStore::with_entries([(keys::IDENTITY_ID, "us-east-1:guest")]),
    );

    assert_eq!(
        test.client.current_user_state().await.state(),
        UserState::Guest
    );
}
