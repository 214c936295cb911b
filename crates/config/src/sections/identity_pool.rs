// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use figment::Figment;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    ConfigurationSection,
    util::{BoxError, invalid_field},
};

/// Configuration of the identity pool handing out temporary credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IdentityPoolConfig {
    /// ID of the identity pool, e.g.
    /// `us-east-1:01234567-89ab-cdef-0123-456789abcdef`
    pub pool_id: String,

    /// Region in which the identity pool lives
    pub region: String,
}

impl IdentityPoolConfig {
    pub(crate) fn example() -> Self {
        Self {
            pool_id: "us-east-1:00000000-0000-0000-0000-000000000000".to_owned(),
            region: "us-east-1".to_owned(),
        }
    }
}

impl ConfigurationSection for IdentityPoolConfig {
    const PATH: Option<&'static str> = Some("identity_pool");

    fn validate(&self, figment: &Figment) -> Result<(), BoxError> {
        if self.pool_id.trim().is_empty() {
            return Err(
                invalid_field(figment, "identity_pool", "pool_id", "must not be empty").into(),
            );
        }

        if self.region.trim().is_empty() {
            return Err(
                invalid_field(figment, "identity_pool", "region", "must not be empty").into(),
            );
        }

        Ok(())
    }
}
