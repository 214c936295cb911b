// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::process::ExitCode;

fn main() -> ExitCode {
    let schema = schemars::schema_for!(mac_config::RootConfig);

    match serde_json::to_writer_pretty(std::io::stdout(), &schema) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Failed to serialize schema: {e}");
            ExitCode::FAILURE
        }
    }
}
