// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Where a user pool sign-in stands after a step of the flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignInState {
    /// The user is signed in
    Done,

    /// A code was sent by SMS and must be confirmed
    SmsMfa,

    /// The user must choose a new password
    NewPasswordRequired,

    /// A custom authentication challenge must be answered
    CustomChallenge,
}

/// The outcome of a sign-in step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInResult {
    pub state: SignInState,

    /// Challenge parameters, e.g. the destination the MFA code was sent to
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
}

impl SignInResult {
    #[must_use]
    pub fn done() -> Self {
        Self {
            state: SignInState::Done,
            parameters: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn challenge(state: SignInState, parameters: BTreeMap<String, String>) -> Self {
        Self { state, parameters }
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self.state, SignInState::Done)
    }
}

/// Options for signing out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignOutOptions {
    /// Invalidate the tokens on every device, not only locally
    pub global: bool,
}

impl SignOutOptions {
    #[must_use]
    pub fn global() -> Self {
        Self { global: true }
    }
}
