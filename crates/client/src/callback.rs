// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use crate::ClientError;

/// Receives the result of an operation run with
/// [`MobileClient::spawn_with_callback`]
///
/// [`MobileClient::spawn_with_callback`]: crate::MobileClient::spawn_with_callback
pub trait Callback<T>: Send + 'static {
    fn call(self, result: Result<T, ClientError>);
}

impl<T, F> Callback<T> for F
where
    F: FnOnce(Result<T, ClientError>) + Send + 'static,
{
    fn call(self, result: Result<T, ClientError>) {
        self(result);
    }
}
