// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Keeps track of the authentication state of the user of a mobile device
//!
//! The [`MobileClient`] derives the [`UserState`] out of the cached login
//! tokens, the identity provider and the network reachability, lets callers
//! wait for an ongoing sign-in to complete, and notifies
//! [`UserStateListener`]s of every change.
//!
//! Every operation is asynchronous. [`MobileClient::spawn_with_callback`]
//! runs them in the background, and [`BlockingMobileClient`] runs them from
//! synchronous code.
//!
//! [`UserState`]: mac_data_model::UserState

#![allow(clippy::module_name_repetitions)]

mod blocking;
mod callback;
mod client;
mod error;
mod gate;
mod listeners;
mod state;

pub use self::{
    blocking::BlockingMobileClient,
    callback::Callback,
    client::{MobileClient, MobileClientBuilder},
    error::{ClientError, SignInWaitError},
    listeners::UserStateListener,
};
