// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::sync::{Arc, Mutex, PoisonError};

use mac_data_model::{UserState, UserStateDetails};
use tokio::sync::{mpsc, watch};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

/// Gets notified when the user state changes
///
/// Notifications run on the blocking thread pool, one at a time per change
/// and listener, so listeners may block. The order in which listeners, and
/// changes published in quick succession, are delivered is unspecified.
pub trait UserStateListener: Send + Sync + 'static {
    fn on_user_state_changed(&self, details: &UserStateDetails);
}

impl<F> UserStateListener for F
where
    F: Fn(&UserStateDetails) + Send + Sync + 'static,
{
    fn on_user_state_changed(&self, details: &UserStateDetails) {
        self(details);
    }
}

struct Notification {
    details: UserStateDetails,
    listeners: Vec<Arc<dyn UserStateListener>>,
}

#[derive(Default)]
struct Listeners {
    registered: Vec<Arc<dyn UserStateListener>>,
    last_published: Option<UserStateDetails>,
}

/// Keeps track of the listeners, and hands them the state changes through a
/// bounded queue drained by a background dispatcher
pub(crate) struct ListenerRegistry {
    listeners: Mutex<Listeners>,
    queue: mpsc::Sender<Notification>,
    latest: watch::Sender<UserStateDetails>,
}

impl ListenerRegistry {
    /// Create the registry and spawn its dispatcher on the task tracker.
    ///
    /// The dispatcher stops once the cancellation token is cancelled, after
    /// handing out the notifications already queued.
    pub(crate) fn new(
        queue_capacity: usize,
        task_tracker: &TaskTracker,
        cancellation_token: CancellationToken,
    ) -> Self {
        let (queue, receiver) = mpsc::channel(queue_capacity.max(1));
        let (latest, _) = watch::channel(UserStateDetails::bare(UserState::SignedOut));

        task_tracker.spawn(dispatch(receiver, task_tracker.clone(), cancellation_token));

        Self {
            listeners: Mutex::new(Listeners::default()),
            queue,
            latest,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Listeners> {
        // Listeners run outside of the lock, nothing can poison it halfway
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn add(&self, listener: Arc<dyn UserStateListener>) {
        self.lock().registered.push(listener);
    }

    pub(crate) fn remove(&self, listener: &Arc<dyn UserStateListener>) -> bool {
        let target = Arc::as_ptr(listener).cast::<()>();
        let mut listeners = self.lock();
        let before = listeners.registered.len();
        listeners
            .registered
            .retain(|registered| Arc::as_ptr(registered).cast::<()>() != target);
        listeners.registered.len() != before
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<UserStateDetails> {
        self.latest.subscribe()
    }

    /// Publish a state to the listeners, unless it is the same as the one
    /// published last. Returns whether the listeners are notified.
    pub(crate) async fn publish(&self, details: UserStateDetails) -> bool {
        let notification = {
            let mut listeners = self.lock();
            if listeners.last_published.as_ref() == Some(&details) {
                return false;
            }

            listeners.last_published = Some(details.clone());
            self.latest.send_replace(details.clone());

            Notification {
                details,
                listeners: listeners.registered.clone(),
            }
        };

        tracing::info!(
            user.state = %notification.details.state(),
            listeners = notification.listeners.len(),
            "User state changed"
        );

        if self.queue.send(notification).await.is_err() {
            tracing::debug!("Listener dispatcher is shut down, dropping the notification");
        }

        true
    }
}

async fn dispatch(
    mut receiver: mpsc::Receiver<Notification>,
    task_tracker: TaskTracker,
    cancellation_token: CancellationToken,
) {
    loop {
        let notification = tokio::select! {
            () = cancellation_token.cancelled(), if !receiver.is_closed() => {
                // Closing the channel lets us drain what is already queued
                receiver.close();
                tracing::debug!("Shutting down listener dispatcher");
                continue;
            },

            notification = receiver.recv() => {
                let Some(notification) = notification else { break };
                notification
            }
        };

        for listener in notification.listeners {
            let details = notification.details.clone();
            task_tracker.spawn(async move {
                let state = details.state();
                let result =
                    tokio::task::spawn_blocking(move || listener.on_user_state_changed(&details))
                        .await;

                if let Err(e) = result {
                    tracing::error!(
                        error = &e as &dyn std::error::Error,
                        user.state = %state,
                        "User state listener failed"
                    );
                }
            });
        }
    }
}
