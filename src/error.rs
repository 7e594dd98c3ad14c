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

//! Typed error variants for the resolution and build pipeline.

use thiserror::Error;

/// Main error type for aursolve operations
#[derive(Debug, Error)]
pub enum SolverError {
    /// Requested package names with no AUR match; fatal, nothing is installed
    #[error("not in the AUR: {}", .names.join(", "))]
    UnknownPackages { names: Vec<String> },

    /// A dependency matched neither the sync repos nor the AUR (strict policy only)
    #[error("'{package}' depends on '{dependency}', which is neither in the repositories nor the AUR")]
    MissingDependency { package: String, dependency: String },

    /// Circular dependency between AUR packages
    #[error("circular dependency detected: {}", .cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },

    /// AUR RPC endpoint returned an error payload
    #[error("AUR RPC error: {message}")]
    Rpc { message: String },

    /// makepkg exited non-zero
    #[error("build failed for '{package}' (makepkg exit code {code:?})")]
    BuildFailed { package: String, code: Option<i32> },

    /// pacman -U exited non-zero for the built artifacts
    #[error("install failed for '{package}' (pacman exit code {code:?})")]
    InstallFailed { package: String, code: Option<i32> },

    /// git clone/pull failed for a workspace
    #[error("could not materialize source tree for '{package}': {reason}")]
    VcsFailed { package: String, reason: String },

    /// Required external tools are not on PATH
    #[error("missing required tools: {}", .tools.join(", "))]
    MissingTools { tools: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_packages_display() {
        let err = SolverError::UnknownPackages {
            names: vec!["foo".to_string(), "bar".to_string()],
        };
        assert_eq!(format!("{}", err), "not in the AUR: foo, bar");
    }

    #[test]
    fn test_circular_dependency_display() {
        let err = SolverError::CircularDependency {
            cycle: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        assert_eq!(
            format!("{}", err),
            "circular dependency detected: a -> b -> a"
        );
    }
}
