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

//! Persistent per-package build workspaces backed by git clones.

use anyhow::{Context, Result};
use console::style;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::SolverError;

/// Maps a package name to a materialized local source tree
pub trait Workspaces {
    fn materialize(&self, name: &str) -> Result<PathBuf>;
}

/// Workspaces kept as git working trees under one state root, reused
/// across invocations. `<root>/<name>` is the only durable state the
/// tool owns.
pub struct GitWorkspaces {
    root: PathBuf,
    base_url: String,
}

impl GitWorkspaces {
    pub fn new(root: PathBuf, base_url: &str) -> Self {
        Self {
            root,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn workspace_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn clone_url(&self, name: &str) -> String {
        format!("{}/{}.git", self.base_url, name)
    }

    fn run_git(&self, name: &str, args: &[&str], cwd: Option<&Path>) -> Result<()> {
        let mut cmd = Command::new("git");
        cmd.args(args);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        let status = cmd.status().context("failed to run git")?;
        if !status.success() {
            return Err(SolverError::VcsFailed {
                package: name.to_string(),
                reason: format!("git {} exited with code {:?}", args[0], status.code()),
            }
            .into());
        }
        Ok(())
    }
}

impl Workspaces for GitWorkspaces {
    /// Clone if absent, pull in place if present
    fn materialize(&self, name: &str) -> Result<PathBuf> {
        let dir = self.workspace_dir(name);
        if dir.join(".git").exists() {
            println!(
                "{} refreshing {}...",
                style("::").cyan().bold(),
                style(name).bold()
            );
            self.run_git(name, &["pull", "--ff-only"], Some(&dir))?;
        } else {
            fs::create_dir_all(&self.root)
                .with_context(|| format!("failed to create {}", self.root.display()))?;
            println!(
                "{} cloning {}...",
                style("::").cyan().bold(),
                style(name).bold()
            );
            let url = self.clone_url(name);
            let dest = dir.to_string_lossy().into_owned();
            self.run_git(name, &["clone", &url, &dest], None)?;
        }
        Ok(dir)
    }
}
