// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::process::ExitCode;

use clap::Parser;
use figment::Figment;
use mac_config::{ConfigurationSection, RootConfig};
use tokio::io::AsyncWriteExt;
use tracing::info_span;

use crate::util::offline_client_from_config;

#[derive(Parser, Debug)]
pub(super) struct Options {
    /// Exit with a non-zero code if nobody is signed in
    #[arg(long)]
    require_signed_in: bool,
}

impl Options {
    pub async fn run(self, figment: &Figment) -> anyhow::Result<ExitCode> {
        let _span = info_span!("cli.state").entered();

        let config = RootConfig::extract(figment).map_err(anyhow::Error::from_boxed)?;
        let client = offline_client_from_config(&config).await?;

        let details = client.initialize().await;
        client.shutdown().await;

        if let Some(error) = details.error() {
            tracing::warn!(
                error = error as &dyn std::error::Error,
                "The credential cache could not be read"
            );
        }

        let output = serde_yaml::to_string(&details)?;
        tokio::io::stdout().write_all(output.as_bytes()).await?;

        if self.require_signed_in && !details.state().is_signed_in() {
            return Ok(ExitCode::FAILURE);
        }

        Ok(ExitCode::SUCCESS)
    }
}
