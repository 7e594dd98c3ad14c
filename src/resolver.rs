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

//! Recursive dependency resolution and installation ordering.
//!
//! Given a requested set of AUR package names, decides which transitive
//! dependencies must themselves be cloned, built and installed first, drives
//! the workspace/build collaborators in that order, and returns the full
//! ordered list of everything installed (dependencies before dependents).
//! Implemented as an explicit worklist rather than call-stack recursion, with
//! an in-flight chain guarding against dependency cycles between AUR packages.

use anyhow::Result;
use console::style;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use crate::build::PackageBuilder;
use crate::error::SolverError;
use crate::pacman::SystemIndex;
use crate::rpc::{AurMetadata, PackageInfo};
use crate::workspace::Workspaces;

/// What to do with a dependency that matches neither the sync repos nor
/// exactly one AUR entry. Lenient leaves it for makepkg to fail on if it
/// is truly required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyPolicy {
    #[default]
    Lenient,
    Strict,
}

/// Distinguishes an explicit top-level install from an implicit
/// dependency-only install; maps onto the pacman -U options string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallReason {
    Explicit,
    Dependency,
}

impl InstallReason {
    pub fn options(self) -> &'static str {
        match self {
            InstallReason::Explicit => "",
            InstallReason::Dependency => "--asdeps",
        }
    }
}

enum Frame {
    Visit {
        name: String,
        meta: PackageInfo,
        reason: InstallReason,
    },
    Build {
        name: String,
        dir: PathBuf,
        reason: InstallReason,
    },
}

/// The ordering core, wired to its collaborators through narrow traits
pub struct Resolver<'a> {
    rpc: &'a dyn AurMetadata,
    index: &'a dyn SystemIndex,
    workspaces: &'a dyn Workspaces,
    builder: &'a dyn PackageBuilder,
    policy: DependencyPolicy,
}

impl<'a> Resolver<'a> {
    pub fn new(
        rpc: &'a dyn AurMetadata,
        index: &'a dyn SystemIndex,
        workspaces: &'a dyn Workspaces,
        builder: &'a dyn PackageBuilder,
        policy: DependencyPolicy,
    ) -> Self {
        Self {
            rpc,
            index,
            workspaces,
            builder,
            policy,
        }
    }

    /// Resolve and install `requested`, dependencies first, left to right.
    ///
    /// Returns the installation order: every transitively installed
    /// dependency strictly before the package that needed it, and each
    /// requested name exactly once. Unknown requested names fail before
    /// any side effect; build failures propagate immediately.
    pub fn install(&self, requested: Vec<String>, reason: InstallReason) -> Result<Vec<String>> {
        let requested = dedup_preserving_order(requested);
        if requested.is_empty() {
            return Ok(Vec::new());
        }

        let mut metas = self.fetch_requested(&requested)?;
        let mut order = Vec::new();
        let mut done: HashSet<String> = HashSet::new();

        for name in &requested {
            if done.contains(name) {
                tracing::debug!(package = %name, "already installed as a dependency this run");
                continue;
            }
            let meta = match metas.remove(name) {
                Some(meta) => meta,
                // resultcount matched but the entry is absent: endpoint lied
                None => {
                    return Err(SolverError::UnknownPackages {
                        names: vec![name.clone()],
                    }
                    .into())
                }
            };
            self.drive(meta, reason, &mut order, &mut done)?;
        }
        Ok(order)
    }

    /// One batched metadata round-trip for the requested set.
    ///
    /// A count mismatch is fatal: each name is looked up individually to
    /// report every name with zero matches.
    fn fetch_requested(&self, requested: &[String]) -> Result<HashMap<String, PackageInfo>> {
        let reply = self.rpc.info(requested)?;
        if reply.resultcount != requested.len() {
            let mut unknown = Vec::new();
            for name in requested {
                if self.rpc.info(std::slice::from_ref(name))?.resultcount == 0 {
                    unknown.push(name.clone());
                }
            }
            if unknown.is_empty() {
                unknown = requested.to_vec();
            }
            return Err(SolverError::UnknownPackages { names: unknown }.into());
        }
        Ok(reply
            .results
            .into_iter()
            .map(|meta| (meta.name.clone(), meta))
            .collect())
    }

    /// Worklist for one target: clone, classify dependencies, build bottom-up
    fn drive(
        &self,
        target: PackageInfo,
        reason: InstallReason,
        order: &mut Vec<String>,
        done: &mut HashSet<String>,
    ) -> Result<()> {
        let mut stack = vec![Frame::Visit {
            name: target.name.clone(),
            meta: target,
            reason,
        }];
        // Names with a pending Build frame; membership means a cycle
        let mut chain: Vec<String> = Vec::new();

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Visit { name, meta, reason } => {
                    if done.contains(&name) {
                        continue;
                    }
                    if let Some(pos) = chain.iter().position(|n| n == &name) {
                        let mut cycle = chain[pos..].to_vec();
                        cycle.push(name);
                        return Err(SolverError::CircularDependency { cycle }.into());
                    }

                    let dir = self.workspaces.materialize(&name)?;
                    chain.push(name.clone());
                    stack.push(Frame::Build {
                        name: name.clone(),
                        dir,
                        reason,
                    });

                    let mut pending = Vec::new();
                    for dep in meta.dependency_names() {
                        if let Some(frame) = self.classify(&name, &dep, done)? {
                            pending.push(frame);
                        }
                    }
                    // reversed so the first declared dependency is processed first
                    stack.extend(pending.into_iter().rev());
                }
                Frame::Build { name, dir, reason } => {
                    self.builder.build_and_install(&dir, reason.options())?;
                    chain.pop();
                    done.insert(name.clone());
                    order.push(name);
                }
            }
        }
        Ok(())
    }

    /// Decide what a bare dependency name needs.
    ///
    /// Sync-repo packages are left to makepkg -s; a single AUR match that is
    /// not already installed at exactly the remote version becomes a Visit
    /// frame; anything else falls under the configured policy.
    fn classify(
        &self,
        package: &str,
        dep: &str,
        done: &HashSet<String>,
    ) -> Result<Option<Frame>> {
        if done.contains(dep) {
            tracing::debug!(dependency = %dep, "already installed this run");
            return Ok(None);
        }
        if self.index.is_available(dep)? {
            tracing::debug!(dependency = %dep, "satisfied by the sync repositories");
            return Ok(None);
        }

        let query = [dep.to_string()];
        let reply = self.rpc.info(&query)?;
        let meta = match reply.results.into_iter().next() {
            Some(meta) if reply.resultcount == 1 => meta,
            _ => {
                return match self.policy {
                    DependencyPolicy::Lenient => {
                        tracing::debug!(
                            package = %package,
                            dependency = %dep,
                            "unresolvable dependency, leaving it to the build tool"
                        );
                        Ok(None)
                    }
                    DependencyPolicy::Strict => Err(SolverError::MissingDependency {
                        package: package.to_string(),
                        dependency: dep.to_string(),
                    }
                    .into()),
                }
            }
        };

        if self.index.installed_version(dep)?.as_deref() == Some(meta.version.as_str()) {
            tracing::debug!(dependency = %dep, version = %meta.version, "already current");
            return Ok(None);
        }

        println!(
            "{} installing dependency {}",
            style("::").cyan().bold(),
            style(dep).bold()
        );
        Ok(Some(Frame::Visit {
            name: dep.to_string(),
            meta,
            reason: InstallReason::Dependency,
        }))
    }
}

fn dedup_preserving_order(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .collect()
}
