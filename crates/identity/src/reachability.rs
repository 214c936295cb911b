// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::sync::atomic::{AtomicBool, Ordering};

/// Tells whether the network can currently be used
pub trait Reachability: Send + Sync {
    /// Returns `true` if the identity services can be reached
    fn is_network_available(&self) -> bool;
}

/// A [`Reachability`] which always reports the network as available
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

impl Reachability for AlwaysOnline {
    fn is_network_available(&self) -> bool {
        true
    }
}

/// A [`Reachability`] which reports whatever it was last told
#[derive(Debug)]
pub struct StaticReachability {
    available: AtomicBool,
}

impl StaticReachability {
    #[must_use]
    pub fn new(available: bool) -> Self {
        Self {
            available: AtomicBool::new(available),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }
}

impl Reachability for StaticReachability {
    fn is_network_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }
}
