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

//! Read-only queries against pacman's package index, plus pass-through removal.

use anyhow::{anyhow, Context, Result};
use std::process::{Command, Stdio};

/// A package installed from outside the sync repositories (`pacman -Qm`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignPackage {
    pub name: String,
    pub version: String,
}

/// Narrow view of the system package index.
///
/// Every call re-queries live state; the resolver never caches the
/// installed set, so repeated lookups for one name are expected.
pub trait SystemIndex {
    /// Is this name installable from the sync repositories?
    fn is_available(&self, name: &str) -> Result<bool>;

    /// Installed version string, or None when the package is not installed
    fn installed_version(&self, name: &str) -> Result<Option<String>>;

    /// All installed packages that did not come from the sync repositories
    fn foreign_packages(&self) -> Result<Vec<ForeignPackage>>;

    /// Recursive removal; one invocation covering every name
    fn remove(&self, names: &[String]) -> Result<()>;
}

/// Real oracle shelling out to pacman
pub struct Pacman;

impl SystemIndex for Pacman {
    fn is_available(&self, name: &str) -> Result<bool> {
        let status = Command::new("pacman")
            .args(["-Si", name])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .context("failed to run pacman -Si")?;
        Ok(status.success())
    }

    fn installed_version(&self, name: &str) -> Result<Option<String>> {
        let output = Command::new("pacman")
            .args(["-Qi", name])
            .stderr(Stdio::null())
            .output()
            .context("failed to run pacman -Qi")?;
        if !output.status.success() {
            return Ok(None);
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_version_field(&stdout))
    }

    fn foreign_packages(&self) -> Result<Vec<ForeignPackage>> {
        let output = Command::new("pacman")
            .arg("-Qm")
            .stderr(Stdio::null())
            .output()
            .context("failed to run pacman -Qm")?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_foreign_list(&stdout))
    }

    fn remove(&self, names: &[String]) -> Result<()> {
        let status = Command::new("sudo")
            .args(removal_args(names))
            .status()
            .context("failed to run pacman -Rs")?;
        if !status.success() {
            return Err(anyhow!(
                "pacman -Rs exited with code {:?}",
                status.code()
            ));
        }
        Ok(())
    }
}

/// Argument vector for the single sudo-wrapped removal invocation
fn removal_args(names: &[String]) -> Vec<String> {
    let mut args = vec!["pacman".to_string(), "-Rs".to_string()];
    args.extend(names.iter().cloned());
    args
}

/// Pull the `Version : ...` field out of pacman -Qi output
fn parse_version_field(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let (field, value) = line.split_once(':')?;
        if field.trim() == "Version" {
            Some(value.trim().to_string())
        } else {
            None
        }
    })
}

/// Parse `pacman -Qm` lines of the form `name version`
fn parse_foreign_list(output: &str) -> Vec<ForeignPackage> {
    output
        .lines()
        .filter_map(|line| {
            let (name, version) = line.trim().split_once(' ')?;
            Some(ForeignPackage {
                name: name.to_string(),
                version: version.trim().to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version_field() {
        let output = "Name            : ripgrep\n\
                      Version         : 14.1.0-1\n\
                      Description     : A search tool\n";
        assert_eq!(parse_version_field(output), Some("14.1.0-1".to_string()));
        assert_eq!(parse_version_field("Name : x\n"), None);
    }

    #[test]
    fn test_removal_covers_all_names_in_one_invocation() {
        let names = vec!["paru".to_string(), "spotify".to_string()];
        let args = removal_args(&names);
        assert_eq!(args, vec!["pacman", "-Rs", "paru", "spotify"]);
    }

    #[test]
    fn test_parse_foreign_list() {
        let output = "paru 2.0.3-1\nspotify 1:1.2.31-1\n";
        let foreign = parse_foreign_list(output);
        assert_eq!(
            foreign,
            vec![
                ForeignPackage {
                    name: "paru".to_string(),
                    version: "2.0.3-1".to_string()
                },
                ForeignPackage {
                    name: "spotify".to_string(),
                    version: "1:1.2.31-1".to_string()
                },
            ]
        );
        assert!(parse_foreign_list("").is_empty());
    }
}
