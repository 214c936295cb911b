// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

#![allow(clippy::module_name_repetitions)]

mod client_config;
pub mod keys;
mod provider;
mod sign_in;
pub(crate) mod tokens;
pub(crate) mod users;

pub use self::{
    client_config::{
        ClientConfig, FederatedFailurePolicy, IdentityPoolSettings, UserPoolSettings,
    },
    provider::{TokenSource, user_pool_login_key},
    sign_in::{SignInResult, SignInState, SignOutOptions},
    tokens::{Credentials, Tokens},
    users::{UserState, UserStateDetails},
};
