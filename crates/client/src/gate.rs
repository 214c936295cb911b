// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use tokio::sync::watch;

/// A one-shot latch on which callers wait for a sign-in to complete
pub(crate) struct SignInGate {
    released: watch::Sender<bool>,
}

impl SignInGate {
    pub(crate) fn new() -> Self {
        let (released, _) = watch::channel(false);
        Self { released }
    }

    /// Release everyone waiting on the gate. Returns `false` if the gate was
    /// already released.
    pub(crate) fn release(&self) -> bool {
        self.released.send_if_modified(|released| {
            let was_released = *released;
            *released = true;
            !was_released
        })
    }

    #[cfg(test)]
    pub(crate) fn is_released(&self) -> bool {
        *self.released.borrow()
    }

    /// Wait until the gate is released
    pub(crate) async fn wait(&self) {
        let mut receiver = self.released.subscribe();
        // The sender lives as long as `self`, so this cannot fail
        let _ = receiver.wait_for(|released| *released).await;
    }
}
