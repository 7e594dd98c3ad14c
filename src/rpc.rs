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

//! Blocking AUR RPC client for batched package metadata lookups.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::SolverError;

/// Package metadata from the AUR RPC v5 info endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
    pub out_of_date: Option<u64>,

    // Not every package declares both lists
    #[serde(default)]
    pub depends: Vec<String>,
    #[serde(default)]
    pub make_depends: Vec<String>,
}

impl PackageInfo {
    /// Union of runtime and build-time dependencies, constraint-stripped and
    /// deduplicated by bare name, preserving declaration order.
    pub fn dependency_names(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut names = Vec::new();
        for spec in self.depends.iter().chain(self.make_depends.iter()) {
            let bare = strip_version_constraint(spec);
            if !bare.is_empty() && seen.insert(bare.to_string()) {
                names.push(bare.to_string());
            }
        }
        names
    }
}

/// AUR RPC response wrapper; `results` come back in arbitrary order
#[derive(Debug, Clone, Deserialize)]
pub struct RpcReply {
    pub resultcount: usize,
    pub results: Vec<PackageInfo>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Read-only metadata lookup, one batched round-trip per call
pub trait AurMetadata {
    fn info(&self, names: &[String]) -> Result<RpcReply>;
}

/// Real client over the AUR RPC endpoint
pub struct AurClient {
    agent: ureq::Agent,
    base_url: String,
}

impl AurClient {
    pub fn new(base_url: &str) -> Self {
        // Deliberately no request timeout: the whole tool is blocking and
        // the operator interrupts it if the endpoint hangs.
        let agent = ureq::AgentBuilder::new()
            .user_agent(concat!("aursolve/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn info_url(&self, names: &[String]) -> String {
        let args: Vec<String> = names
            .iter()
            .map(|n| format!("arg[]={}", urlencoding::encode(n)))
            .collect();
        format!("{}?v=5&type=info&{}", self.base_url, args.join("&"))
    }
}

impl AurMetadata for AurClient {
    fn info(&self, names: &[String]) -> Result<RpcReply> {
        let url = self.info_url(names);
        tracing::debug!(url = %url, "querying AUR RPC");

        let reply: RpcReply = self
            .agent
            .get(&url)
            .call()
            .with_context(|| format!("AUR RPC request failed for {} package(s)", names.len()))?
            .into_json()
            .context("malformed AUR RPC response")?;

        if let Some(message) = reply.error.clone() {
            return Err(SolverError::Rpc { message }.into());
        }

        Ok(reply)
    }
}

/// Cut a raw dependency specifier down to its bare package name.
///
/// Specifiers embed optional version constraints (`python>=3.10`) and
/// occasionally a `:` description separator; constraint satisfaction is
/// never checked, only the name is used.
pub fn strip_version_constraint(spec: &str) -> &str {
    let spec = spec.trim();
    let cut = spec
        .find(|c| matches!(c, '>' | '<' | '=' | ':'))
        .unwrap_or(spec.len());
    spec[..cut].trim_end()
}
