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

//! Building and installing packages from a materialized workspace.

use anyhow::{anyhow, Context, Result};
use console::style;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::SolverError;
use crate::prompt::Confirm;

const KEYSERVERS: &[&str] = &["keyserver.ubuntu.com", "keys.openpgp.org", "pgp.mit.edu"];

/// Runs the build tool against a workspace and installs the result
pub trait PackageBuilder {
    fn build_and_install(&self, workspace: &Path, install_options: &str) -> Result<()>;
}

/// Membership check and keyserver import for PKGBUILD signing keys
pub trait Keyring {
    fn contains(&self, key: &str) -> Result<bool>;
    fn import(&self, key: &str) -> Result<bool>;
}

/// makepkg-based builder; installs artifacts via `sudo pacman -U`
pub struct MakepkgBuilder<'a> {
    confirm: &'a dyn Confirm,
    keyring: &'a dyn Keyring,
}

impl<'a> MakepkgBuilder<'a> {
    pub fn new(confirm: &'a dyn Confirm, keyring: &'a dyn Keyring) -> Self {
        Self { confirm, keyring }
    }

    /// Offer to import any PKGBUILD signing keys missing from the keyring.
    ///
    /// Declining is non-fatal: the build goes ahead and makepkg is free to
    /// fail on signature verification.
    fn import_missing_keys(&self, workspace: &Path) -> Result<()> {
        for key in required_pgp_keys(workspace)? {
            if self.keyring.contains(&key)? {
                continue;
            }
            let prompt = format!("import missing PGP key {}?", style(&key).bold());
            if !self.confirm.confirm(&prompt)? {
                tracing::debug!(key = %key, "key import declined");
                continue;
            }
            if !self.keyring.import(&key)? {
                println!(
                    "{} could not import key {}; the build may fail verification",
                    style("::").yellow().bold(),
                    style(&key).bold()
                );
            }
        }
        Ok(())
    }
}

impl PackageBuilder for MakepkgBuilder<'_> {
    fn build_and_install(&self, workspace: &Path, install_options: &str) -> Result<()> {
        let package = workspace
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| workspace.display().to_string());

        self.import_missing_keys(workspace)?;

        println!(
            "{} building {}...",
            style("::").cyan().bold(),
            style(&package).bold()
        );
        let status = Command::new("makepkg")
            .arg("-s")
            .current_dir(workspace)
            .status()
            .context("failed to run makepkg")?;
        if !status.success() {
            return Err(SolverError::BuildFailed {
                package,
                code: status.code(),
            }
            .into());
        }

        let artifacts = built_artifacts(workspace)?;
        if artifacts.is_empty() {
            return Err(anyhow!("makepkg produced no package artifacts in {}", workspace.display()));
        }

        let mut cmd = Command::new("sudo");
        cmd.args(["pacman", "-U"]);
        if !install_options.is_empty() {
            cmd.arg(install_options);
        }
        cmd.args(&artifacts);
        let status = cmd.status().context("failed to run pacman -U")?;
        if !status.success() {
            return Err(SolverError::InstallFailed {
                package,
                code: status.code(),
            }
            .into());
        }
        Ok(())
    }
}

/// Textual scan of PKGBUILD for the `validpgpkeys=(...)` array.
/// No PKGBUILD found, or no array, means no keys to care about.
pub fn required_pgp_keys(workspace: &Path) -> Result<Vec<String>> {
    let pkgbuild = workspace.join("PKGBUILD");
    if !pkgbuild.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(&pkgbuild)
        .with_context(|| format!("failed to read {}", pkgbuild.display()))?;

    let mut keys = Vec::new();
    if let Some(start) = content.find("validpgpkeys=(") {
        let rest = &content[start + "validpgpkeys=(".len()..];
        if let Some(end) = rest.find(')') {
            for line in rest[..end].lines() {
                let key = line
                    .split('#')
                    .next()
                    .unwrap_or("")
                    .trim()
                    .trim_matches('\'')
                    .trim_matches('"');
                if !key.is_empty() {
                    keys.push(key.to_string());
                }
            }
        }
    }
    Ok(keys)
}

/// The real keyring, backed by the user's gpg installation
pub struct GpgKeyring;

impl Keyring for GpgKeyring {
    fn contains(&self, key: &str) -> Result<bool> {
        let status = Command::new("gpg")
            .args(["--list-keys", key])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .context("failed to run gpg --list-keys")?;
        Ok(status.success())
    }

    fn import(&self, key: &str) -> Result<bool> {
        for server in KEYSERVERS {
            let status = Command::new("gpg")
                .args(["--keyserver", server, "--recv-keys", key])
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .context("failed to run gpg --recv-keys")?;
            if status.success() {
                println!(
                    "{} imported key {} from {}",
                    style("::").green().bold(),
                    style(key).bold(),
                    server
                );
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Collect makepkg output artifacts from the workspace
fn built_artifacts(workspace: &Path) -> Result<Vec<PathBuf>> {
    let mut artifacts = Vec::new();
    for entry in fs::read_dir(workspace)
        .with_context(|| format!("failed to read {}", workspace.display()))?
    {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.contains(".pkg.tar") && !name.ends_with(".sig") {
                artifacts.push(path);
            }
        }
    }
    artifacts.sort();
    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use tempfile::TempDir;

    struct Decision(bool);

    impl Confirm for Decision {
        fn confirm(&self, _prompt: &str) -> Result<bool> {
            Ok(self.0)
        }
    }

    struct FakeKeyring {
        present: HashSet<String>,
        imported: RefCell<Vec<String>>,
    }

    impl FakeKeyring {
        fn empty() -> Self {
            Self {
                present: HashSet::new(),
                imported: RefCell::new(Vec::new()),
            }
        }

        fn holding(keys: &[&str]) -> Self {
            Self {
                present: keys.iter().map(|k| k.to_string()).collect(),
                imported: RefCell::new(Vec::new()),
            }
        }
    }

    impl Keyring for FakeKeyring {
        fn contains(&self, key: &str) -> Result<bool> {
            Ok(self.present.contains(key))
        }

        fn import(&self, key: &str) -> Result<bool> {
            self.imported.borrow_mut().push(key.to_string());
            Ok(true)
        }
    }

    fn workspace_with_keys(keys: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        let quoted: Vec<String> = keys.iter().map(|k| format!("'{k}'")).collect();
        fs::write(
            dir.path().join("PKGBUILD"),
            format!("pkgname=demo\nvalidpgpkeys=({})\n", quoted.join(" ")),
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_declined_key_import_touches_nothing() {
        let dir = workspace_with_keys(&["ABCDEF0123456789"]);
        let keyring = FakeKeyring::empty();
        let confirm = Decision(false);
        let builder = MakepkgBuilder::new(&confirm, &keyring);

        builder.import_missing_keys(dir.path()).unwrap();
        assert!(keyring.imported.borrow().is_empty());
    }

    #[test]
    fn test_accepted_key_import_fetches_only_missing_keys() {
        let dir = workspace_with_keys(&["ABCDEF0123456789", "FEDCBA9876543210"]);
        let keyring = FakeKeyring::holding(&["ABCDEF0123456789"]);
        let confirm = Decision(true);
        let builder = MakepkgBuilder::new(&confirm, &keyring);

        builder.import_missing_keys(dir.path()).unwrap();
        assert_eq!(*keyring.imported.borrow(), vec!["FEDCBA9876543210"]);
    }

    #[test]
    fn test_required_pgp_keys_parsing() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("PKGBUILD"),
            "pkgname=demo\n\
             validpgpkeys=(\n\
               'ABCDEF0123456789'  # upstream\n\
               \"FEDCBA9876543210\"\n\
             )\n\
             source=()\n",
        )
        .unwrap();
        let keys = required_pgp_keys(dir.path()).unwrap();
        assert_eq!(keys, vec!["ABCDEF0123456789", "FEDCBA9876543210"]);
    }

    #[test]
    fn test_required_pgp_keys_absent() {
        let dir = TempDir::new().unwrap();
        assert!(required_pgp_keys(dir.path()).unwrap().is_empty());

        fs::write(dir.path().join("PKGBUILD"), "pkgname=demo\n").unwrap();
        assert!(required_pgp_keys(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_built_artifacts_filters_signatures() {
        let dir = TempDir::new().unwrap();
        for name in [
            "demo-1.0-1-x86_64.pkg.tar.zst",
            "demo-1.0-1-x86_64.pkg.tar.zst.sig",
            "PKGBUILD",
        ] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        let artifacts = built_artifacts(dir.path()).unwrap();
        assert_eq!(artifacts.len(), 1);
        assert!(artifacts[0].ends_with("demo-1.0-1-x86_64.pkg.tar.zst"));
    }
}
