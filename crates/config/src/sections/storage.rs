// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use camino::Utf8PathBuf;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ConfigurationSection;

/// Configuration of the credential cache
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StorageConfig {
    /// Path to the JSON file in which the credential cache is persisted. If
    /// not set, the cache only lives in memory.
    #[schemars(with = "Option<String>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Utf8PathBuf>,
}

impl StorageConfig {
    pub(crate) fn is_default(&self) -> bool {
        self.path.is_none()
    }
}

impl ConfigurationSection for StorageConfig {
    const PATH: Option<&'static str> = Some("storage");
}
