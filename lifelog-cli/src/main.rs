// Copyright 2025 Lifelog Contributors (https://github.com/lifelog-dev/lifelog)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use anyhow::Result;
use clap::{Parser, Subcommand};
use lifelog_core::MonitorConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod monitor;

#[derive(Parser, Debug)]
#[command(name = "lifelog", author, version, about = "Continuous local activity capture and incremental summarization", long_about = None)]
struct Cli {
    /// Path to configuration file (TOML)
    #[arg(short, long, global = true, env = "LIFELOG_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the capture + summarization monitor loop
    Monitor {
        /// Archive path (overrides config file)
        #[arg(long, env = "LIFELOG_ARCHIVE_PATH")]
        archive: Option<PathBuf>,

        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,
    },

    /// Run one summarization cycle and exit
    Summarize,

    /// Print archive and cursor status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = MonitorConfig::load(cli.config)?;

    match cli.command {
        Command::Monitor { archive, once } => {
            if let Some(path) = archive {
                config.archive.path = path;
            }
            monitor::run(config, once).await
        }
        Command::Summarize => monitor::summarize_once(config).await,
        Command::Status => monitor::status(&config),
    }
}
