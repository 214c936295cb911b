// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Keys used in the credential cache and in [`UserStateDetails`] maps.
//!
//! [`UserStateDetails`]: crate::UserStateDetails

/// The login provider the cached token was issued by
pub const PROVIDER: &str = "provider";

/// The cached login token
pub const TOKEN: &str = "token";

/// The identity ID assigned by the identity pool
pub const IDENTITY_ID: &str = "identityId";

/// Every key the credential cache owns, in a stable order
pub const ALL: [&str; 3] = [PROVIDER, TOKEN, IDENTITY_ID];
