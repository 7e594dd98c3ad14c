/*
 * aursolve - Minimal AUR helper with recursive dependency resolution.
 * Copyright (C) 2026  aursolve contributors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use console::style;

mod build;
mod config;
mod error;
mod logging;
mod pacman;
mod prompt;
mod resolver;
mod rpc;
mod update;
mod workspace;

use build::{GpgKeyring, MakepkgBuilder};
use config::Config;
use error::SolverError;
use pacman::{Pacman, SystemIndex};
use prompt::StdinConfirm;
use resolver::{InstallReason, Resolver};
use rpc::AurClient;
use workspace::GitWorkspaces;

#[derive(Parser)]
#[command(name = "aursolve")]
#[command(version)]
#[command(about = "A minimal AUR helper that resolves, builds and installs dependency chains.")]
struct Cli {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Resolve and install AUR packages, dependencies first
    Install {
        #[arg(required = true, value_name = "PACKAGE")]
        packages: Vec<String>,
    },
    /// Remove installed packages with their unneeded dependencies
    Remove {
        #[arg(required = true, value_name = "PACKAGE")]
        packages: Vec<String>,
    },
    /// Compare installed foreign packages against the AUR and update them
    Update,
}

/// Everything here shells out; fail early with one diagnostic instead of
/// mid-resolution.
fn ensure_tools() -> Result<()> {
    let missing: Vec<String> = ["pacman", "git", "makepkg", "gpg", "sudo"]
        .iter()
        .filter(|tool| which::which(tool).is_err())
        .map(|tool| tool.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(SolverError::MissingTools { tools: missing }.into())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, warnings) = Config::load();
    logging::init(&config.logging.level);
    for warning in &warnings {
        tracing::warn!("{warning}");
    }
    config
        .validate()
        .map_err(|e| anyhow!("invalid configuration: {e}"))?;
    ensure_tools()?;

    let index = Pacman;
    let rpc = AurClient::new(&config.rpc_url);
    let workspaces = GitWorkspaces::new(config.state_dir.clone(), &config.clone_url);
    let confirm = StdinConfirm;
    let keyring = GpgKeyring;
    let builder = MakepkgBuilder::new(&confirm, &keyring);
    let resolver = Resolver::new(&rpc, &index, &workspaces, &builder, config.dependency_policy);

    match cli.action {
        Action::Install { packages } => {
            let installed = resolver.install(packages, InstallReason::Explicit)?;
            println!(
                "{} installed {} package(s): {}",
                style("::").green().bold(),
                installed.len(),
                installed.join(", ")
            );
            Ok(())
        }
        Action::Remove { packages } => index.remove(&packages),
        Action::Update => update::run(&index, &rpc, &resolver, &confirm),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_install_requires_at_least_one_package() {
        assert!(Cli::try_parse_from(["aursolve", "install"]).is_err());
        assert!(Cli::try_parse_from(["aursolve", "install", "ripgrep"]).is_ok());
    }

    #[test]
    fn test_remove_requires_at_least_one_package() {
        assert!(Cli::try_parse_from(["aursolve", "remove"]).is_err());
    }

    #[test]
    fn test_update_takes_no_arguments() {
        assert!(Cli::try_parse_from(["aursolve", "update", "extra"]).is_err());
        assert!(Cli::try_parse_from(["aursolve", "update"]).is_ok());
    }
}
