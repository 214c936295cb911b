// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::time::Duration;

use figment::Figment;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::{
    ConfigurationSection,
    util::{BoxError, invalid_field},
};

#[allow(clippy::unnecessary_wraps)]
fn default_wait_timeout() -> Option<Duration> {
    Some(Duration::from_secs(300))
}

#[allow(clippy::ref_option)]
fn is_default_wait_timeout(value: &Option<Duration>) -> bool {
    *value == default_wait_timeout()
}

const fn default_true() -> bool {
    true
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_default_true(value: &bool) -> bool {
    *value
}

/// What to conclude when a third-party token could not be federated for a
/// reason other than the identity pool rejecting it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FederatedFailurePolicyKind {
    /// Consider the user signed in
    #[default]
    Optimistic,

    /// Consider the federated tokens invalid, and ask the user to sign in
    /// again
    Invalidate,
}

impl FederatedFailurePolicyKind {
    #[allow(clippy::trivially_copy_pass_by_ref)]
    fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Configuration related to signing in
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SignInConfig {
    /// How long callers waiting for a sign-in to complete are kept waiting,
    /// in seconds. Defaults to 5 minutes. Set to `null` to wait forever.
    #[schemars(with = "Option<u64>", range(min = 1))]
    #[serde(
        default = "default_wait_timeout",
        skip_serializing_if = "is_default_wait_timeout"
    )]
    #[serde_as(as = "Option<serde_with::DurationSeconds<u64>>")]
    pub wait_timeout: Option<Duration>,

    /// Whether user pool tokens are exchanged for identity pool credentials.
    /// Defaults to `true`.
    #[serde(default = "default_true", skip_serializing_if = "is_default_true")]
    pub federation_enabled: bool,

    /// What to do when a third-party token could not be federated because
    /// of a network or service error. Defaults to `optimistic`.
    #[serde(default, skip_serializing_if = "FederatedFailurePolicyKind::is_default")]
    pub federated_failure_policy: FederatedFailurePolicyKind,
}

impl Default for SignInConfig {
    fn default() -> Self {
        Self {
            wait_timeout: default_wait_timeout(),
            federation_enabled: default_true(),
            federated_failure_policy: FederatedFailurePolicyKind::default(),
        }
    }
}

impl SignInConfig {
    pub(crate) fn is_default(&self) -> bool {
        self == &Self::default()
    }
}

impl ConfigurationSection for SignInConfig {
    const PATH: Option<&'static str> = Some("sign_in");

    fn validate(&self, figment: &Figment) -> Result<(), BoxError> {
        if self.wait_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(invalid_field(
                figment,
                "sign_in",
                "wait_timeout",
                "must be greater than zero, or null to wait forever",
            )
            .into());
        }

        Ok(())
    }
}
