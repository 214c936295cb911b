// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use figment::Figment;
use mac_data_model::user_pool_login_key;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    ConfigurationSection,
    util::{BoxError, invalid_field},
};

/// Configuration of the user pool users sign in to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UserPoolConfig {
    /// ID of the user pool, e.g. `us-east-1_aBcDeFgHi`
    pub pool_id: String,

    /// ID of the app client registered in the user pool
    pub app_client_id: String,

    /// Region in which the user pool lives, e.g. `us-east-1`
    pub region: String,
}

impl UserPoolConfig {
    /// The key under which the tokens of this user pool are federated
    #[must_use]
    pub fn login_key(&self) -> String {
        user_pool_login_key(&self.region, &self.pool_id)
    }

    pub(crate) fn example() -> Self {
        Self {
            pool_id: "us-east-1_EXAMPLE".to_owned(),
            app_client_id: "example-app-client".to_owned(),
            region: "us-east-1".to_owned(),
        }
    }
}

impl ConfigurationSection for UserPoolConfig {
    const PATH: Option<&'static str> = Some("user_pool");

    fn validate(&self, figment: &Figment) -> Result<(), BoxError> {
        let section = "user_pool";
        for (field, value) in [
            ("pool_id", &self.pool_id),
            ("app_client_id", &self.app_client_id),
            ("region", &self.region),
        ] {
            if value.trim().is_empty() {
                return Err(invalid_field(figment, section, field, "must not be empty").into());
            }
        }

        Ok(())
    }
}
