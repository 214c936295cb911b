// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use figment::Figment;
use mac_config::{ConfigurationSection, RootConfig};
use tracing::{info, info_span};

use crate::util::offline_client_from_config;

#[derive(Parser, Debug)]
pub(super) struct Options {}

impl Options {
    pub async fn run(self, figment: &Figment) -> anyhow::Result<ExitCode> {
        let _span = info_span!("cli.sign_out").entered();

        let config = RootConfig::extract(figment).map_err(anyhow::Error::from_boxed)?;
        let client = offline_client_from_config(&config).await?;

        let previous = client.initialize().await;
        let res = client.sign_out().await;
        client.shutdown().await;
        res.context("could not clear the credential cache")?;

        info!(previous.state = %previous.state(), "Signed out");
        Ok(ExitCode::SUCCESS)
    }
}
