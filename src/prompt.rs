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

//! Injected confirmation capability, so resolution logic never reads stdin.

use anyhow::{Context, Result};
use console::style;
use std::io::{self, Write};

/// Yes/no decision point. Implementations decide interactively or not;
/// callers treat a `false` as a clean, user-chosen abort.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

/// Interactive `[Y/n]` prompt on the controlling terminal.
/// Only an explicit `n` declines; any other input proceeds.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        print!("{} {} [Y/n] ", style("::").cyan().bold(), prompt);
        io::stdout().flush().context("failed to flush stdout")?;

        let mut input = String::new();
        io::stdin()
            .read_line(&mut input)
            .context("failed to read confirmation")?;
        Ok(!input.trim().eq_ignore_ascii_case("n"))
    }
}
