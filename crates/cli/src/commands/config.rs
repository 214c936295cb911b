// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use figment::Figment;
use mac_config::{ConfigurationSection, RootConfig};
use tokio::io::AsyncWriteExt;
use tracing::{info, info_span};

use crate::util::client_config_from_config;

#[derive(Parser, Debug)]
pub(super) struct Options {
    #[command(subcommand)]
    subcommand: Subcommand,
}

#[derive(Parser, Debug)]
enum Subcommand {
    /// Dump the current config as YAML
    Dump {
        /// The path to the config file to dump
        ///
        /// If not specified, the config will be written to stdout
        #[clap(short, long)]
        output: Option<Utf8PathBuf>,
    },

    /// Check a config file
    Check,

    /// Generate a new config file
    Generate {
        /// The path to the config file to generate
        ///
        /// If not specified, the config will be written to stdout
        #[clap(short, long)]
        output: Option<Utf8PathBuf>,
    },
}

impl Options {
    pub async fn run(self, figment: &Figment) -> anyhow::Result<ExitCode> {
        use Subcommand as SC;
        match self.subcommand {
            SC::Dump { output } => {
                let _span = info_span!("cli.config.dump").entered();

                let config = RootConfig::extract(figment).map_err(anyhow::Error::from_boxed)?;
                let config = serde_yaml::to_string(&config)?;
                write_output(output, &config).await?;
            }

            SC::Check => {
                let _span = info_span!("cli.config.check").entered();

                let config = RootConfig::extract(figment).map_err(anyhow::Error::from_boxed)?;
                let client_config = client_config_from_config(&config);

                if client_config.user_pool.is_none() && client_config.identity_pool.is_none() {
                    tracing::warn!(
                        "Neither a user pool nor an identity pool is configured, nobody will be able to sign in"
                    );
                }

                info!(
                    user_pool.login_key = client_config.user_pool_login_key().as_deref(),
                    federates_user_pool = client_config.federates_user_pool(),
                    "Configuration file looks good"
                );
            }

            SC::Generate { output } => {
                let _span = info_span!("cli.config.generate").entered();

                let config = RootConfig::generate();
                let config = serde_yaml::to_string(&config)?;
                write_output(output, &config).await?;
            }
        }

        Ok(ExitCode::SUCCESS)
    }
}

async fn write_output(output: Option<Utf8PathBuf>, content: &str) -> anyhow::Result<()> {
    if let Some(output) = output {
        info!("Writing configuration to {output:?}");
        let mut file = tokio::fs::File::create(output).await?;
        file.write_all(content.as_bytes()).await?;
    } else {
        info!("Writing configuration to standard output");
        tokio::io::stdout().write_all(content.as_bytes()).await?;
    }

    Ok(())
}
