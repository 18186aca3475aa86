//! # Detection Pipeline
//!
//! Wires the stages together and drives them from a frame source:
//!
//! ```text
//! capture thread ──(single-slot mailbox)──▶ pipeline thread
//!                                              │ normalize
//!                                              │ stabilize
//!                                              └ sync (on epoch change)
//! ```
//!
//! The capture thread never waits for the pipeline and the pipeline never
//! waits for the camera: the mailbox only ever holds the newest sample.
//!
//! ## Halt Policy
//!
//! - Absent samples are skipped ([`CycleOutcome::NoSample`])
//! - Catalog outages, empty playlists and exhausted retries are logged; the
//!   loop carries on with the next frame
//! - A permanent provider error (revoked token, missing permission) stops
//!   the loop with [`HaltReason::Rejected`] until someone fixes the setup

use crate::error::SyncError;
use crate::mailbox::{MailboxClosed, MailboxReceiver, MailboxSender};
use crate::mood::{EmotionScores, Mood, StableMood};
use crate::normalizer;
use crate::services::FrameEmotionSource;
use crate::session::{PlaybackResult, PlaylistSessionManager, SyncWarning};
use crate::stabilizer::MoodStabilizer;
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How long the pipeline waits for a frame before re-checking shutdown.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// What one frame did to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No sample this frame; nothing was observed.
    NoSample,
    /// Observed, stable mood unchanged since the last sync.
    Observed { label: Mood, stable: StableMood },
    /// The stable mood moved and the session was synced.
    Synced { stable: StableMood, result: PlaybackResult },
    /// The stable mood moved but the sync failed.
    SyncFailed { stable: StableMood, error: SyncError },
}

/// Why [`MoodPipeline::run`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HaltReason {
    Shutdown,
    SourceClosed,
    Rejected(SyncError),
}

/// Normalizer, stabilizer and session manager for one listener.
pub struct MoodPipeline {
    stabilizer: MoodStabilizer,
    sessions: Arc<PlaylistSessionManager>,
    synced_epoch: u64,
}

impl MoodPipeline {
    pub fn new(stabilizer: MoodStabilizer, sessions: Arc<PlaylistSessionManager>) -> Self {
        Self {
            stabilizer,
            sessions,
            synced_epoch: 0,
        }
    }

    #[must_use]
    pub fn stable(&self) -> StableMood {
        self.stabilizer.current()
    }

    #[must_use]
    pub fn sessions(&self) -> &Arc<PlaylistSessionManager> {
        &self.sessions
    }

    /// Run one frame through the pipeline.
    pub fn process(&mut self, sample: Option<EmotionScores>) -> CycleOutcome {
        let Some(scores) = sample else {
            debug!("No emotion sample this cycle");
            return CycleOutcome::NoSample;
        };

        let label = normalizer::normalize(Some(&scores));
        let stable = self.stabilizer.observe(label);
        if stable.epoch == self.synced_epoch {
            return CycleOutcome::Observed { label, stable };
        }

        self.synced_epoch = stable.epoch;
        match self.sessions.sync(stable) {
            Ok(result) => {
                report(&result);
                CycleOutcome::Synced { stable, result }
            }
            Err(error) => CycleOutcome::SyncFailed { stable, error },
        }
    }

    /// Consume samples until shutdown, source exhaustion, or a permanent
    /// provider error.
    pub fn run(
        &mut self,
        inbox: &MailboxReceiver<Option<EmotionScores>>,
        shutdown: &AtomicBool,
    ) -> HaltReason {
        info!("Mood pipeline running");
        loop {
            if shutdown.load(Ordering::SeqCst) {
                info!("Shutdown requested, stopping pipeline");
                return HaltReason::Shutdown;
            }

            let sample = match inbox.recv_timeout(POLL_INTERVAL) {
                Ok(Some(sample)) => sample,
                Ok(None) => continue,
                Err(MailboxClosed) => {
                    info!("Emotion source closed, stopping pipeline");
                    return HaltReason::SourceClosed;
                }
            };

            match self.process(sample) {
                CycleOutcome::SyncFailed { error, .. } if error.is_permanent() => {
                    error!(
                        "Automatic sync halted: {error}. \
                         Fix the provider setup (e.g. re-authenticate) and restart."
                    );
                    return HaltReason::Rejected(error);
                }
                CycleOutcome::SyncFailed { stable, error } => {
                    warn!("Sync for {} (epoch {}) gave up: {error}", stable.label, stable.epoch);
                }
                _ => {}
            }
        }
    }
}

fn report(result: &PlaybackResult) {
    match result {
        PlaybackResult::Active {
            session, warnings, ..
        } => {
            for warning in warnings {
                match warning {
                    SyncWarning::CatalogUnavailable(e) => warn!("{e}"),
                    SyncWarning::NoTracksFound => {
                        warn!("No tracks found for {} mood", session.mood);
                    }
                }
            }
        }
        PlaybackResult::Held { epoch } => debug!("Playback held at epoch {epoch}"),
        PlaybackResult::Superseded { epoch } => debug!("Epoch {epoch} superseded"),
    }
}

/// Start the capture thread.
///
/// Each capture is posted to `outbox`; failed captures are posted as absent
/// samples. The thread ends when the source is finished, the pipeline side
/// of the mailbox is gone, or `shutdown` is set.
pub fn spawn_capture<S>(
    mut source: S,
    outbox: MailboxSender<Option<EmotionScores>>,
    interval: Duration,
    shutdown: Arc<AtomicBool>,
) -> JoinHandle<()>
where
    S: FrameEmotionSource + 'static,
{
    thread::spawn(move || {
        while !shutdown.load(Ordering::SeqCst) {
            let sample = source.capture().unwrap_or_else(|e| {
                warn!("Emotion capture failed: {e:#}");
                None
            });

            if source.is_finished() {
                debug!("Emotion source finished");
                break;
            }
            if outbox.post(sample).is_err() {
                debug!("Pipeline gone, stopping capture");
                break;
            }
            if !interval.is_zero() {
                thread::sleep(interval);
            }
        }
    })
}
