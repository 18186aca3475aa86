//! Capability traits for the external collaborators, plus the [`Services`]
//! context object that carries them through the pipeline.
//!
//! Implementations live in [`crate::spotify`] and [`crate::source`]; tests
//! substitute in-memory fakes.

use crate::error::{CatalogUnavailable, ExternalServiceError};
use crate::mood::{EmotionScores, PlaylistId, TrackRef, UserId};
use anyhow::Result;
use std::sync::Arc;

/// Produces one emotion sample per call.
///
/// `Ok(None)` means the frame had nothing usable (no face, blank line).
/// Errors mean the device or classifier failed; the pipeline treats them as
/// an absent sample.
pub trait FrameEmotionSource: Send {
    fn capture(&mut self) -> Result<Option<EmotionScores>>;

    /// `true` once the source can never produce another sample.
    fn is_finished(&self) -> bool {
        false
    }
}

/// Searchable track catalog.
pub trait CatalogSearch: Send + Sync {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<TrackRef>, CatalogUnavailable>;
}

/// Whether a created playlist is visible to other users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

impl Visibility {
    #[must_use]
    pub fn is_public(self) -> bool {
        self == Visibility::Public
    }
}

/// Playlist creation and playback control.
pub trait PlaylistProvider: Send + Sync {
    fn create_playlist(
        &self,
        owner: &UserId,
        name: &str,
        description: &str,
        visibility: Visibility,
    ) -> Result<PlaylistId, ExternalServiceError>;

    fn add_tracks(
        &self,
        playlist: &PlaylistId,
        tracks: &[TrackRef],
    ) -> Result<(), ExternalServiceError>;

    fn start_playback(&self, playlist: &PlaylistId) -> Result<(), ExternalServiceError>;
}

/// The account playlists are created under.
pub trait Identity: Send + Sync {
    fn current_user_id(&self) -> Result<UserId, ExternalServiceError>;
}

/// Handles to every external capability the session manager needs.
///
/// Built once by the driving code and passed in explicitly; nothing in the
/// crate reaches for global client state.
#[derive(Clone)]
pub struct Services {
    pub catalog: Arc<dyn CatalogSearch>,
    pub playlists: Arc<dyn PlaylistProvider>,
    pub identity: Arc<dyn Identity>,
}

impl Services {
    pub fn new(
        catalog: Arc<dyn CatalogSearch>,
        playlists: Arc<dyn PlaylistProvider>,
        identity: Arc<dyn Identity>,
    ) -> Self {
        Self {
            catalog,
            playlists,
            identity,
        }
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}
