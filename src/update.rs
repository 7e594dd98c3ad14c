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

//! Update planning: diff installed foreign packages against the AUR.

use anyhow::Result;
use chrono::DateTime;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::time::Duration;

use crate::pacman::{ForeignPackage, SystemIndex};
use crate::prompt::Confirm;
use crate::resolver::{InstallReason, Resolver};
use crate::rpc::{AurMetadata, PackageInfo};

/// A foreign package whose installed version differs from the AUR version.
/// Exact string comparison; no semantic version ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutdatedPackage {
    pub name: String,
    pub installed: String,
    pub remote: String,
}

/// A package the AUR flags as out-of-date upstream (informational only,
/// independent of any version mismatch)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlaggedPackage {
    pub name: String,
    pub since: u64,
}

#[derive(Debug, Default)]
pub struct UpdatePlan {
    pub outdated: Vec<OutdatedPackage>,
    pub flagged: Vec<FlaggedPackage>,
}

impl UpdatePlan {
    pub fn is_up_to_date(&self) -> bool {
        self.outdated.is_empty()
    }
}

/// Diff the installed foreign set against remote metadata, matched by name.
/// Foreign packages with no remote entry (deleted from the AUR) are skipped.
pub fn plan(foreign: &[ForeignPackage], remote: &HashMap<String, PackageInfo>) -> UpdatePlan {
    let mut plan = UpdatePlan::default();
    for pkg in foreign {
        let Some(meta) = remote.get(&pkg.name) else {
            tracing::debug!(package = %pkg.name, "installed foreign package has no AUR entry");
            continue;
        };
        if let Some(since) = meta.out_of_date {
            plan.flagged.push(FlaggedPackage {
                name: pkg.name.clone(),
                since,
            });
        }
        if pkg.version != meta.version {
            plan.outdated.push(OutdatedPackage {
                name: pkg.name.clone(),
                installed: pkg.version.clone(),
                remote: meta.version.clone(),
            });
        }
    }
    plan
}

/// Compare every installed foreign package against the AUR and, on
/// confirmation, install the full mismatch list through the resolver.
pub fn run(
    index: &dyn SystemIndex,
    rpc: &dyn AurMetadata,
    resolver: &Resolver<'_>,
    confirm: &dyn Confirm,
) -> Result<()> {
    let foreign = index.foreign_packages()?;
    if foreign.is_empty() {
        println!(
            "{} no foreign packages installed; up to date",
            style("::").green().bold()
        );
        return Ok(());
    }

    let names: Vec<String> = foreign.iter().map(|p| p.name.clone()).collect();
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner:.cyan} {msg}")?,
    );
    pb.set_message(format!("checking {} foreign package(s)...", names.len()));
    pb.enable_steady_tick(Duration::from_millis(80));
    let reply = rpc.info(&names);
    pb.finish_and_clear();
    let reply = reply?;

    // Match by name; the RPC result order is arbitrary
    let remote: HashMap<String, PackageInfo> = reply
        .results
        .into_iter()
        .map(|meta| (meta.name.clone(), meta))
        .collect();
    let plan = plan(&foreign, &remote);

    if !plan.flagged.is_empty() {
        println!("{}", style("flagged out-of-date upstream:").yellow().bold());
        for pkg in &plan.flagged {
            let date = DateTime::from_timestamp(pkg.since as i64, 0)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| pkg.since.to_string());
            println!("  {} (since {})", style(&pkg.name).bold(), date);
        }
    }

    if plan.is_up_to_date() {
        println!(
            "{} your AUR packages are up to date",
            style("::").green().bold()
        );
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Package").fg(Color::Cyan),
        Cell::new("Installed").fg(Color::Cyan),
        Cell::new("AUR").fg(Color::Cyan),
    ]);
    for pkg in &plan.outdated {
        table.add_row(vec![
            Cell::new(&pkg.name),
            Cell::new(&pkg.installed).fg(Color::Red),
            Cell::new(&pkg.remote).fg(Color::Green),
        ]);
    }
    println!("{table}");

    if !confirm.confirm("proceed with the update?")? {
        println!("{} abort", style("::").yellow().bold());
        return Ok(());
    }

    let to_update: Vec<String> = plan.outdated.iter().map(|p| p.name.clone()).collect();
    let installed = resolver.install(to_update, InstallReason::Explicit)?;
    println!(
        "{} updated {} package(s)",
        style("::").green().bold(),
        installed.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::PackageBuilder;
    use crate::resolver::DependencyPolicy;
    use crate::rpc::RpcReply;
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};

    fn foreign(name: &str, version: &str) -> ForeignPackage {
        ForeignPackage {
            name: name.to_string(),
            version: version.to_string(),
        }
    }

    fn remote(entries: &[(&str, &str, Option<u64>)]) -> HashMap<String, PackageInfo> {
        entries
            .iter()
            .map(|(name, version, out_of_date)| {
                (
                    name.to_string(),
                    PackageInfo {
                        name: name.to_string(),
                        version: version.to_string(),
                        out_of_date: *out_of_date,
                        depends: Vec::new(),
                        make_depends: Vec::new(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_plan_detects_version_string_mismatch() {
        let plan = plan(
            &[foreign("a", "1.0-1"), foreign("b", "2.0-1")],
            &remote(&[("a", "1.0-1", None), ("b", "2.1-1", None)]),
        );
        assert_eq!(
            plan.outdated,
            vec![OutdatedPackage {
                name: "b".to_string(),
                installed: "2.0-1".to_string(),
                remote: "2.1-1".to_string(),
            }]
        );
        assert!(plan.flagged.is_empty());
    }

    #[test]
    fn test_plan_flags_out_of_date_independently() {
        // Same version string, still flagged upstream
        let plan = plan(
            &[foreign("a", "1.0-1")],
            &remote(&[("a", "1.0-1", Some(1700000000))]),
        );
        assert!(plan.is_up_to_date());
        assert_eq!(
            plan.flagged,
            vec![FlaggedPackage {
                name: "a".to_string(),
                since: 1700000000,
            }]
        );
    }

    #[test]
    fn test_plan_skips_packages_missing_remotely() {
        let plan = plan(&[foreign("gone", "1.0-1")], &remote(&[]));
        assert!(plan.is_up_to_date());
        assert!(plan.flagged.is_empty());
    }

    #[test]
    fn test_plan_with_no_foreign_packages() {
        let plan = plan(&[], &remote(&[("a", "1.0-1", None)]));
        assert!(plan.is_up_to_date());
    }

    struct FakeSystem {
        foreign: Vec<ForeignPackage>,
    }

    impl SystemIndex for FakeSystem {
        fn is_available(&self, _name: &str) -> Result<bool> {
            Ok(false)
        }

        fn installed_version(&self, name: &str) -> Result<Option<String>> {
            Ok(self
                .foreign
                .iter()
                .find(|p| p.name == name)
                .map(|p| p.version.clone()))
        }

        fn foreign_packages(&self) -> Result<Vec<ForeignPackage>> {
            Ok(self.foreign.clone())
        }

        fn remove(&self, _names: &[String]) -> Result<()> {
            Ok(())
        }
    }

    struct FakeRpc {
        packages: HashMap<String, PackageInfo>,
    }

    impl AurMetadata for FakeRpc {
        fn info(&self, names: &[String]) -> Result<RpcReply> {
            let results: Vec<PackageInfo> = names
                .iter()
                .filter_map(|n| self.packages.get(n).cloned())
                .collect();
            Ok(RpcReply {
                resultcount: results.len(),
                results,
                error: None,
            })
        }
    }

    struct NullWorkspaces;

    impl crate::workspace::Workspaces for NullWorkspaces {
        fn materialize(&self, name: &str) -> Result<PathBuf> {
            Ok(PathBuf::from("/tmp/ws").join(name))
        }
    }

    struct CountingBuilder {
        builds: RefCell<Vec<String>>,
    }

    impl PackageBuilder for CountingBuilder {
        fn build_and_install(&self, workspace: &Path, _install_options: &str) -> Result<()> {
            self.builds
                .borrow_mut()
                .push(workspace.file_name().unwrap().to_string_lossy().into_owned());
            Ok(())
        }
    }

    struct Decision(bool);

    impl Confirm for Decision {
        fn confirm(&self, _prompt: &str) -> Result<bool> {
            Ok(self.0)
        }
    }

    fn update_fixture() -> (FakeSystem, FakeRpc) {
        let system = FakeSystem {
            foreign: vec![foreign("a", "1.0-1")],
        };
        let rpc = FakeRpc {
            packages: remote(&[("a", "2.0-1", None)]),
        };
        (system, rpc)
    }

    #[test]
    fn test_declining_confirmation_performs_no_installs() {
        let (system, rpc) = update_fixture();
        let workspaces = NullWorkspaces;
        let builder = CountingBuilder {
            builds: RefCell::new(Vec::new()),
        };
        let resolver = Resolver::new(
            &rpc,
            &system,
            &workspaces,
            &builder,
            DependencyPolicy::Lenient,
        );
        run(&system, &rpc, &resolver, &Decision(false)).unwrap();
        assert!(builder.builds.borrow().is_empty());
    }

    #[test]
    fn test_accepting_confirmation_updates_mismatched_packages() {
        let (system, rpc) = update_fixture();
        let workspaces = NullWorkspaces;
        let builder = CountingBuilder {
            builds: RefCell::new(Vec::new()),
        };
        let resolver = Resolver::new(
            &rpc,
            &system,
            &workspaces,
            &builder,
            DependencyPolicy::Lenient,
        );
        run(&system, &rpc, &resolver, &Decision(true)).unwrap();
        assert_eq!(*builder.builds.borrow(), vec!["a".to_string()]);
    }
}
