//! # Emotion Sources
//!
//! Adapters that feed classifier output into the pipeline. The classifier
//! itself is an external program; Mood DJ only reads what it prints.
//!
//! - [`LinesSource`] reads one JSON sample per line from any reader
//!   (recorded sessions, pipes, tests)
//! - [`CommandSource`] spawns the classifier command and reads its stdout
//!
//! A blank line is a frame without a usable face. Malformed lines are
//! errors, which the pipeline counts as absent samples.

use crate::mood::EmotionScores;
use crate::services::FrameEmotionSource;
use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};

/// Reads JSON emotion samples line by line.
pub struct LinesSource<R> {
    reader: R,
    line: String,
    exhausted: bool,
}

impl<R: BufRead> LinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            exhausted: false,
        }
    }

    /// `true` once the reader hit end of input.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

impl LinesSource<BufReader<File>> {
    /// Replay a recorded session file.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open scores file {}", path.display()))?;
        info!("Replaying emotion samples from {}", path.display());
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead + Send> FrameEmotionSource for LinesSource<R> {
    fn capture(&mut self) -> Result<Option<EmotionScores>> {
        if self.exhausted {
            bail!("emotion source exhausted");
        }

        self.line.clear();
        let read = self
            .reader
            .read_line(&mut self.line)
            .context("Failed to read classifier output")?;
        if read == 0 {
            self.exhausted = true;
            bail!("emotion source reached end of input");
        }

        let line = self.line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let scores = EmotionScores::from_json(line)
            .with_context(|| format!("Unreadable classifier output: {line}"))?;
        Ok(Some(scores))
    }

    fn is_finished(&self) -> bool {
        self.exhausted
    }
}

/// Runs an external classifier and reads its samples from stdout.
///
/// The command is run through `sh -c`, so pipelines and arguments work as
/// typed on a shell.
pub struct CommandSource {
    child: Child,
    lines: LinesSource<BufReader<ChildStdout>>,
}

impl CommandSource {
    pub fn spawn(command: &str) -> Result<Self> {
        info!("Starting classifier: {command}");
        let mut child = Command::new("sh")
            .args(["-c", command])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to start classifier command '{command}'"))?;

        let stdout = child
            .stdout
            .take()
            .context("Failed to capture classifier output")?;

        Ok(Self {
            child,
            lines: LinesSource::new(BufReader::new(stdout)),
        })
    }

    /// Process id of the classifier, for diagnostics.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.child.id()
    }
}

impl FrameEmotionSource for CommandSource {
    fn capture(&mut self) -> Result<Option<EmotionScores>> {
        let sample = self.lines.capture();
        if self.lines.is_exhausted() {
            if let Ok(Some(status)) = self.child.try_wait() {
                warn!("Classifier exited with {status}");
            }
        }
        sample
    }

    fn is_finished(&self) -> bool {
        self.lines.is_exhausted()
    }
}

impl Drop for CommandSource {
    fn drop(&mut self) {
        debug!("Stopping classifier (pid {})", self.child.id());
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
