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

const fn default_queue_capacity() -> usize {
    64
}

/// Configuration of the delivery of user state changes to listeners
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ListenersConfig {
    /// How many state changes can be waiting for delivery before publishing
    /// one waits for the listeners to catch up. Defaults to 64.
    #[schemars(range(min = 1))]
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for ListenersConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl ListenersConfig {
    pub(crate) fn is_default(&self) -> bool {
        self.queue_capacity == default_queue_capacity()
    }
}

impl ConfigurationSection for ListenersConfig {
    const PATH: Option<&'static str> = Some("listeners");

    fn validate(&self, figment: &Figment) -> Result<(), BoxError> {
        if self.queue_capacity == 0 {
            return Err(invalid_field(
                figment,
                "listeners",
                "queue_capacity",
                "must be greater than zero",
            )
            .into());
        }

        Ok(())
    }
}
