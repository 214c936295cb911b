// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::sync::Arc;

use anyhow::Context;
use mac_client::MobileClient;
use mac_config::{FederatedFailurePolicyKind, RootConfig, StorageConfig};
use mac_data_model::{
    ClientConfig, FederatedFailurePolicy, IdentityPoolSettings, UserPoolSettings,
};
use mac_identity::OfflineIdentityProvider;
use mac_storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};

pub fn client_config_from_config(config: &RootConfig) -> ClientConfig {
    let federated_failure_policy = match config.sign_in.federated_failure_policy {
        FederatedFailurePolicyKind::Optimistic => FederatedFailurePolicy::Optimistic,
        FederatedFailurePolicyKind::Invalidate => FederatedFailurePolicy::Invalidate,
    };

    ClientConfig {
        user_pool: config.user_pool.as_ref().map(|c| UserPoolSettings {
            pool_id: c.pool_id.clone(),
            app_client_id: c.app_client_id.clone(),
            region: c.region.clone(),
        }),
        identity_pool: config.identity_pool.as_ref().map(|c| IdentityPoolSettings {
            pool_id: c.pool_id.clone(),
            region: c.region.clone(),
        }),
        wait_timeout: config.sign_in.wait_timeout,
        federation_enabled: config.sign_in.federation_enabled,
        federated_failure_policy,
        listener_queue_capacity: config.listeners.queue_capacity,
    }
}

pub async fn store_from_config(
    config: &StorageConfig,
) -> Result<Arc<dyn KeyValueStore>, anyhow::Error> {
    let Some(path) = &config.path else {
        tracing::warn!("No storage path configured, the credential cache only lives in memory");
        return Ok(Arc::new(MemoryKeyValueStore::new()));
    };

    let store = FileKeyValueStore::open(path.clone())
        .await
        .with_context(|| format!("could not open the credential cache at {path}"))?;

    Ok(Arc::new(store))
}

/// Build a client which never reaches the network, to look at and act on
/// the credential cache
pub async fn offline_client_from_config(config: &RootConfig) -> Result<MobileClient, anyhow::Error> {
    let store = store_from_config(&config.storage).await?;
    let client = MobileClient::builder(
        client_config_from_config(config),
        Arc::new(OfflineIdentityProvider::new()),
        store,
    )
    .build();

    Ok(client)
}
