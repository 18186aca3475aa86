//! # Command-Line Interface Module
//!
//! Clap derive definitions for the `mood-dj` binary.
//!
//! ## Commands
//!
//! - `run`: watch a classifier and keep a matching playlist playing
//! - `detect`: normalize a single classifier sample
//! - `params`: show the search parameters of a mood
//! - `curate`: search tracks for a mood without creating a playlist
//! - `completion`: generate shell completions
//!
//! ## Examples
//!
//! ```bash
//! mood-dj run --classifier-cmd "python3 classify.py --camera 0"
//! mood-dj run --scores-file session.jsonl
//! mood-dj detect '{"happy": 82.1, "neutral": 10.4}'
//! mood-dj params sad
//! ```

use crate::mood::Mood;
use clap::builder::PossibleValue;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

const MOOD_VALUES: [Mood; 8] = [
    Mood::Happy,
    Mood::Sad,
    Mood::Angry,
    Mood::Surprise,
    Mood::Fear,
    Mood::Disgust,
    Mood::Neutral,
    Mood::Unknown,
];

/// Mood names become possible values, so generated completion scripts
/// offer them for `params` and `curate`.
impl ValueEnum for Mood {
    fn value_variants<'a>() -> &'a [Self] {
        &MOOD_VALUES
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        Some(PossibleValue::new(self.name()))
    }
}

/// Main application arguments structure.
#[derive(Parser, Debug)]
#[command(name = "mood-dj")]
#[command(about = "Mood DJ: turns your facial expression into a matching playlist")]
#[command(version)]
pub struct Args {
    /// Settings file (JSON). Defaults to the platform config directory.
    #[arg(long, global = true, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Spotify access for commands that talk to the provider.
#[derive(ClapArgs, Debug, Clone)]
pub struct ProviderArgs {
    /// Spotify access token (OAuth is handled outside Mood DJ)
    #[arg(long, env = "SPOTIFY_ACCESS_TOKEN", hide_env_values = true)]
    pub token: String,
}

/// Enumeration of all available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Detect moods continuously and play matching playlists
    ///
    /// Reads emotion samples (one JSON object per line) from a classifier
    /// command or a recorded file. Whenever the stable mood changes, a new
    /// "Mood DJ - <Mood>" playlist is created and played.
    Run {
        /// Shell command that prints one emotion sample per line
        #[arg(
            long,
            value_name = "CMD",
            conflicts_with = "scores_file",
            required_unless_present = "scores_file"
        )]
        classifier_cmd: Option<String>,

        /// File of recorded emotion samples (JSON lines)
        #[arg(long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
        scores_file: Option<PathBuf>,

        #[command(flatten)]
        provider: ProviderArgs,
    },

    /// Print the dominant mood of one classifier sample
    ///
    /// Reads the sample from the argument, or from stdin when omitted.
    Detect {
        /// Emotion sample as JSON
        sample: Option<String>,
    },

    /// Print the music-search parameters for a mood as JSON
    Params {
        /// Mood to resolve
        #[arg(value_enum, ignore_case = true)]
        mood: Mood,
    },

    /// Search tracks for a mood and print their URIs
    Curate {
        /// Mood to curate for
        #[arg(value_enum, ignore_case = true)]
        mood: Mood,

        /// Maximum number of tracks
        #[arg(long, default_value = "20")]
        limit: usize,

        #[command(flatten)]
        provider: ProviderArgs,
    },

    /// Generate shell completions
    ///
    /// Usage: mood-dj completion bash > ~/.local/share/bash-completion/completions/mood-dj
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_params() {
        let args = Args::try_parse_from(["mood-dj", "params", "Happy"]).unwrap();
        assert!(matches!(args.command, Command::Params { mood: Mood::Happy }));
    }

    #[test]
    fn test_parse_rejects_unknown_mood() {
        assert!(Args::try_parse_from(["mood-dj", "params", "bored"]).is_err());
    }

    #[test]
    fn test_mood_values_cover_every_label() {
        let names: Vec<String> = Mood::value_variants()
            .iter()
            .filter_map(Mood::to_possible_value)
            .map(|value| value.get_name().to_string())
            .collect();
        assert_eq!(names.len(), 8);
        for name in &names {
            assert!(name.parse::<Mood>().is_ok(), "{name}");
        }
        assert_eq!(names[0], "happy");
    }

    #[test]
    fn test_run_needs_a_source() {
        assert!(Args::try_parse_from(["mood-dj", "run", "--token", "t"]).is_err());
        assert!(Args::try_parse_from([
            "mood-dj",
            "run",
            "--token",
            "t",
            "--classifier-cmd",
            "cat",
            "--scores-file",
            "x.jsonl",
        ])
        .is_err());

        let args =
            Args::try_parse_from(["mood-dj", "run", "--token", "t", "--scores-file", "x.jsonl"])
                .unwrap();
        match args.command {
            Command::Run { scores_file, provider, .. } => {
                assert_eq!(scores_file, Some(PathBuf::from("x.jsonl")));
                assert_eq!(provider.token, "t");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_curate_default_limit() {
        let args = Args::try_parse_from(["mood-dj", "curate", "sad", "--token", "t"]).unwrap();
        assert!(matches!(args.command, Command::Curate { limit: 20, .. }));
    }
}
