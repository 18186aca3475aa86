//! # Mood DJ
//!
//! Reads facial-expression emotion scores from a classifier, settles them
//! into a stable mood, and keeps a matching Spotify playlist playing.
//!
//! ## Pipeline Stages
//!
//! - [`normalizer`] - Dominant emotion of one sample
//! - [`stabilizer`] - Majority vote over a sliding window, with epochs
//! - [`resolver`] - Mood to music-search parameters
//! - [`curator`] - Catalog search and track selection
//! - [`session`] - Playlist creation and playback, once per epoch
//! - [`pipeline`] - Capture thread and the loop that drives the stages
//!
//! ### Supporting Modules
//!
//! - [`mood`] - Labels, score maps and identifiers shared by every stage
//! - [`services`] - Capability traits for external collaborators
//! - [`spotify`] - Spotify Web API implementation of those traits
//! - [`source`] - Classifier command and replay-file emotion sources
//! - [`mailbox`] - Single-slot, newest-wins hand-off between threads
//! - [`retry`] - Bounded exponential backoff
//! - [`error`] - Typed provider and sync errors
//! - [`config`] - Settings file and defaults
//! - [`cli`] - Command-line interface definitions
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```
//! use mood_dj::mood::{EmotionScores, Mood};
//! use mood_dj::stabilizer::MoodStabilizer;
//! use mood_dj::{normalizer, resolver};
//!
//! let mut stabilizer = MoodStabilizer::default();
//! let mut stable = stabilizer.current();
//! for _ in 0..3 {
//!     let sample = EmotionScores::from_json(r#"{"happy": 81.0, "neutral": 12.5}"#).unwrap();
//!     stable = stabilizer.observe(normalizer::normalize(Some(&sample)));
//! }
//!
//! assert_eq!(stable.label, Mood::Happy);
//! assert_eq!(stable.epoch, 1);
//! assert_eq!(resolver::resolve(stable.label).min_tempo, 120);
//! ```

pub mod cli;
pub mod completion;
pub mod config;
pub mod curator;
pub mod error;
pub mod mailbox;
pub mod mood;
pub mod normalizer;
pub mod pipeline;
pub mod resolver;
pub mod retry;
pub mod services;
pub mod session;
pub mod source;
pub mod spotify;
pub mod stabilizer;
