// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use tokio::sync::mpsc;

use crate::IdentityError;

/// Options for the drop-in sign-in UI
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignInUiOptions {
    /// Title shown above the sign-in form
    pub title: Option<String>,

    /// Whether the user can dismiss the sign-in UI
    pub can_cancel: bool,
}

/// How a drop-in UI sign-in ended
#[derive(Debug)]
pub enum SignInEvent {
    /// The user signed in to the user pool
    SignedIn,

    /// The user signed in with a third-party identity provider, which issued
    /// this token
    SignedInWith {
        /// The login provider, e.g. `accounts.google.com`
        provider: String,
        token: String,
    },

    /// The user dismissed the sign-in UI
    Cancelled,

    /// The sign-in failed
    Failed(IdentityError),
}

/// Handle given to the sign-in UI to report how the sign-in ended
///
/// It can be cloned and used from any thread. Only the first event reported
/// is taken into account.
#[derive(Debug, Clone)]
pub struct SignInNotifier {
    sender: mpsc::UnboundedSender<SignInEvent>,
}

impl SignInNotifier {
    /// Create a notifier, and the receiver on which its events are delivered
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SignInEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Report that the user signed in
    pub fn signed_in(&self) {
        self.send(SignInEvent::SignedIn);
    }

    /// Report that the user signed in with a third-party identity provider
    pub fn signed_in_with(&self, provider: impl Into<String>, token: impl Into<String>) {
        self.send(SignInEvent::SignedInWith {
            provider: provider.into(),
            token: token.into(),
        });
    }

    /// Report that the user dismissed the sign-in UI
    pub fn cancelled(&self) {
        self.send(SignInEvent::Cancelled);
    }

    /// Report that the sign-in failed
    pub fn failed(&self, error: IdentityError) {
        self.send(SignInEvent::Failed(error));
    }

    fn send(&self, event: SignInEvent) {
        if self.sender.send(event).is_err() {
            tracing::debug!("Nobody is listening to sign-in events anymore");
        }
    }
}

/// Shows the drop-in sign-in UI
#[async_trait::async_trait]
pub trait SignInPresenter: Send + Sync {
    /// Show the sign-in UI.
    ///
    /// This returns as soon as the UI is shown. The outcome of the sign-in
    /// is reported later through the `notifier`.
    ///
    /// # Errors
    ///
    /// Returns an error if the UI could not be shown.
    async fn present(
        &self,
        options: &SignInUiOptions,
        notifier: SignInNotifier,
    ) -> Result<(), IdentityError>;
}
