//! # Playlist Session Manager
//!
//! Owns "the current mood playlist". Each stable-mood epoch gets at most one
//! run through:
//!
//! ```text
//! Idle → Resolving → Curating → Creating → Populating → Playing → Active
//! ```
//!
//! ## Guarantees
//!
//! - **Idempotent per epoch**: the outcome of an epoch (success or failure)
//!   is stored, and later calls with that epoch return it without touching
//!   the provider.
//! - **Serialized**: one sync runs at a time. A caller that arrives while
//!   another sync is in flight waits, then either observes the stored result
//!   (same epoch) or finds its request stale and gets
//!   [`PlaybackResult::Superseded`].
//! - **Newest epoch wins**: a cycle that finishes after a newer epoch was
//!   requested is discarded instead of promoted to `Active`.
//! - **Unknown holds**: an `unknown` epoch keeps the current session playing.
//!   The next real epoch is still a mood change, so `sad → unknown → sad`
//!   creates a second "Mood DJ - Sad" playlist with a fresh search.
//!
//! Every provider call goes through [`RetryPolicy::run`]: transient failures
//! back off and retry, permanent ones surface at once.

use crate::curator::{Curation, TrackCurator};
use crate::error::{CatalogUnavailable, SyncError};
use crate::mood::{Mood, PlaylistId, StableMood, TrackRef};
use crate::resolver;
use crate::retry::RetryPolicy;
use crate::services::{Services, Visibility};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Where the current sync cycle is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionPhase {
    Idle,
    Resolving,
    Curating,
    Creating,
    Populating,
    Playing,
    Active,
}

/// The playlist bound to one mood epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaylistSession {
    pub mood: Mood,
    pub playlist_id: Option<PlaylistId>,
    pub tracks: Vec<TrackRef>,
    /// Epoch this session was created for.
    pub created_at: u64,
}

/// Degraded-but-successful conditions of a sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncWarning {
    CatalogUnavailable(CatalogUnavailable),
    NoTracksFound,
}

/// What a sync did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackResult {
    /// A new playlist exists for this epoch. `started` is false when there
    /// was nothing to play.
    Active {
        session: PlaylistSession,
        started: bool,
        warnings: Vec<SyncWarning>,
    },
    /// Nothing to do (unseeded or unknown mood); the current session, if
    /// any, is left alone.
    Held { epoch: u64 },
    /// A newer epoch was requested; this one was dropped or its outcome
    /// discarded.
    Superseded { epoch: u64 },
}

pub type SyncOutcome = Result<PlaybackResult, SyncError>;

/// Tunables for one manager.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    pub track_limit: usize,
    pub visibility: Visibility,
    pub retry: RetryPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            track_limit: 20,
            visibility: Visibility::Private,
            retry: RetryPolicy::default(),
        }
    }
}

/// Title of the playlist created for `mood`.
#[must_use]
pub fn playlist_name(mood: Mood) -> String {
    format!("Mood DJ - {}", mood.capitalized())
}

/// Description of the playlist created for `mood`.
#[must_use]
pub fn playlist_description(mood: Mood) -> String {
    format!("Generated playlist for {} mood", mood.name())
}

#[derive(Debug)]
struct SessionState {
    phase: SessionPhase,
    active: Option<PlaylistSession>,
    /// Highest epoch that has been run (or deliberately skipped).
    handled_epoch: u64,
    last: Option<(u64, SyncOutcome)>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Idle,
            active: None,
            handled_epoch: 0,
            last: None,
        }
    }
}

/// Drives playlist creation and playback for stable-mood changes.
pub struct PlaylistSessionManager {
    services: Services,
    config: SessionConfig,
    state: Mutex<SessionState>,
    /// Held for the whole duration of a sync.
    operation: Mutex<()>,
    latest_requested: AtomicU64,
}

impl PlaylistSessionManager {
    pub fn new(services: Services, config: SessionConfig) -> Self {
        Self {
            services,
            config,
            state: Mutex::new(SessionState::default()),
            operation: Mutex::new(()),
            latest_requested: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.state().phase
    }

    #[must_use]
    pub fn active_session(&self) -> Option<PlaylistSession> {
        self.state().active.clone()
    }

    /// Forget the current session and every stored outcome, e.g. after the
    /// user re-authenticated. External playlists are not touched.
    pub fn reset(&self) {
        let _op = lock(&self.operation);
        *self.state() = SessionState::default();
        self.latest_requested.store(0, Ordering::SeqCst);
        info!("Playlist session reset");
    }

    /// Bring the session in line with `stable`.
    ///
    /// # Errors
    ///
    /// [`SyncError::Rejected`] when the provider refused an operation
    /// permanently, [`SyncError::RetriesExhausted`] when transient failures
    /// outlasted the retry budget. Either way the session is left `Idle`.
    pub fn sync(&self, stable: StableMood) -> SyncOutcome {
        self.latest_requested.fetch_max(stable.epoch, Ordering::SeqCst);
        let _op = lock(&self.operation);

        {
            let state = self.state();
            if let Some((epoch, outcome)) = &state.last {
                if *epoch == stable.epoch {
                    debug!("Epoch {epoch} already handled, returning stored outcome");
                    return outcome.clone();
                }
            }
            if stable.epoch < state.handled_epoch || self.is_stale(stable.epoch) {
                debug!("Dropping stale sync request for epoch {}", stable.epoch);
                return Ok(PlaybackResult::Superseded { epoch: stable.epoch });
            }
        }

        if stable.epoch == 0 {
            return Ok(PlaybackResult::Held { epoch: 0 });
        }

        if stable.label.is_unknown() {
            info!("Mood unknown at epoch {}, keeping current playback", stable.epoch);
            let outcome = Ok(PlaybackResult::Held { epoch: stable.epoch });
            self.record(stable.epoch, &outcome);
            return outcome;
        }

        let outcome = self.run_cycle(stable);

        if self.is_stale(stable.epoch) {
            warn!(
                "Epoch {} finished after a newer mood arrived, discarding its playlist",
                stable.epoch
            );
            let mut state = self.state();
            state.phase = SessionPhase::Idle;
            state.handled_epoch = state.handled_epoch.max(stable.epoch);
            return Ok(PlaybackResult::Superseded { epoch: stable.epoch });
        }

        {
            let mut state = self.state();
            match &outcome {
                Ok(PlaybackResult::Active { session, .. }) => {
                    state.phase = SessionPhase::Active;
                    state.active = Some(session.clone());
                }
                Ok(_) => {}
                Err(e) => {
                    error!("Sync for epoch {} failed: {e}", stable.epoch);
                    state.phase = SessionPhase::Idle;
                    state.active = None;
                }
            }
        }
        self.record(stable.epoch, &outcome);
        outcome
    }

    fn run_cycle(&self, stable: StableMood) -> SyncOutcome {
        let mood = stable.label;
        let retry = &self.config.retry;
        let mut warnings = Vec::new();

        {
            // a new epoch starts a fresh session; the old track list goes away
            let mut state = self.state();
            state.active = None;
            state.phase = SessionPhase::Idle;
        }

        self.enter(SessionPhase::Resolving);
        let params = resolver::resolve(mood);

        self.enter(SessionPhase::Curating);
        let tracks = match TrackCurator::new(self.services.catalog.as_ref())
            .curate(&params, self.config.track_limit)
        {
            Curation::Tracks(tracks) => tracks,
            Curation::CatalogUnavailable(e) => {
                warnings.push(SyncWarning::CatalogUnavailable(e));
                Vec::new()
            }
        };

        self.enter(SessionPhase::Creating);
        let owner = retry.run("look up current user", || self.services.identity.current_user_id())?;
        let name = playlist_name(mood);
        let description = playlist_description(mood);
        let playlist_id = retry.run("create playlist", || {
            self.services
                .playlists
                .create_playlist(&owner, &name, &description, self.config.visibility)
        })?;
        info!("Created playlist '{name}' ({playlist_id}) for epoch {}", stable.epoch);

        let session = PlaylistSession {
            mood,
            playlist_id: Some(playlist_id.clone()),
            tracks,
            created_at: stable.epoch,
        };

        if session.tracks.is_empty() {
            warn!("No tracks found for {mood}, playlist left empty and playback not started");
            warnings.push(SyncWarning::NoTracksFound);
            return Ok(PlaybackResult::Active {
                session,
                started: false,
                warnings,
            });
        }

        self.enter(SessionPhase::Populating);
        retry.run("add tracks", || {
            self.services.playlists.add_tracks(&playlist_id, &session.tracks)
        })?;

        self.enter(SessionPhase::Playing);
        retry.run("start playback", || self.services.playlists.start_playback(&playlist_id))?;
        info!("Playing {} tracks for {mood}", session.tracks.len());

        Ok(PlaybackResult::Active {
            session,
            started: true,
            warnings,
        })
    }

    fn enter(&self, phase: SessionPhase) {
        let mut state = self.state();
        debug!("Session phase {:?} -> {phase:?}", state.phase);
        state.phase = phase;
    }

    fn record(&self, epoch: u64, outcome: &SyncOutcome) {
        let mut state = self.state();
        state.handled_epoch = state.handled_epoch.max(epoch);
        state.last = Some((epoch, outcome.clone()));
    }

    fn is_stale(&self, epoch: u64) -> bool {
        self.latest_requested.load(Ordering::SeqCst) > epoch
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        lock(&self.state)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
