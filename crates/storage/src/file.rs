// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::collections::BTreeMap;

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use tokio::sync::RwLock;

use crate::{KeyValueStore, StoreError};

/// A [`KeyValueStore`] which persists its entries as a JSON object in a file
///
/// Entries are loaded once when opening the store, and the whole file is
/// rewritten on every write. Writes go to a temporary file first, which is
/// then renamed over the original one. A write which could not be persisted
/// leaves the entries untouched.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: Utf8PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileKeyValueStore {
    /// Open the store backed by the given file
    ///
    /// The file does not have to exist, it will be created on the first
    /// write.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but could not be read or parsed
    #[tracing::instrument(
        name = "storage.file.open",
        skip_all,
        fields(path = tracing::field::Empty)
    )]
    pub async fn open(path: impl Into<Utf8PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        tracing::Span::current().record("path", tracing::field::display(&path));
        let entries = match tokio::fs::read(&path).await {
            Ok(content) => serde_json::from_slice(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Store file does not exist yet, starting empty");
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// The path of the backing file
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    async fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let content = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");

        if let Some(parent) = self.path.parent().filter(|p| !p.as_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Apply a change to a copy of the entries, and only keep it once it is
    /// on disk
    async fn update(
        &self,
        change: impl FnOnce(&mut BTreeMap<String, String>) + Send,
    ) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        let mut updated = entries.clone();
        change(&mut updated);
        self.persist(&updated).await?;
        *entries = updated;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn get_many(&self, keys: &[&str]) -> Result<BTreeMap<String, String>, StoreError> {
        let entries = self.entries.read().await;
        Ok(keys
            .iter()
            .filter_map(|key| Some(((*key).to_owned(), entries.get(*key)?.clone())))
            .collect())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.insert(key.to_owned(), value.to_owned());
        })
        .await
    }

    async fn set_many(&self, new_entries: BTreeMap<String, String>) -> Result<(), StoreError> {
        self.update(|entries| entries.extend(new_entries)).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        if self.entries.read().await.contains_key(key) {
            self.update(|entries| {
                entries.remove(key);
            })
            .await?;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.update(BTreeMap::clear).await
    }
}
