//! # Shell Completion Module
//!
//! Completion scripts via `clap_complete`. Mood arguments carry their
//! possible values, so the scripts complete mood names without calling
//! back into the binary.
//!
//! ## Usage
//!
//! ```bash
//! # Generate bash completions
//! mood-dj completion bash > ~/.local/share/bash-completion/completions/mood-dj
//!
//! # Generate zsh completions
//! mood-dj completion zsh > ~/.config/zsh/completions/_mood-dj
//! ```

use crate::cli::Shell;
use clap::Command;
use clap_complete::{generate, Generator, Shell as CompletionShell};
use std::io;

/// Generate shell completions for the given shell
pub fn generate_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

/// Convert our Shell enum to clap_complete's Shell enum
#[must_use]
pub fn shell_to_completion_shell(shell: Shell) -> CompletionShell {
    match shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    }
}
