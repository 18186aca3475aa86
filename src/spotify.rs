//! # Spotify Web API Adapter
//!
//! Implements [`CatalogSearch`], [`PlaylistProvider`] and [`Identity`] over
//! the Spotify Web API with a blocking HTTP client.
//!
//! The adapter takes an access token that was issued elsewhere; it does not
//! run an OAuth flow. The token needs these scopes:
//!
//! ```text
//! user-read-playback-state user-modify-playback-state
//! playlist-modify-public playlist-modify-private
//! ```
//!
//! ## Failure Classification
//!
//! | condition                         | reported as  |
//! |-----------------------------------|--------------|
//! | timeout, connection error         | transient    |
//! | HTTP 429, HTTP 5xx                | transient    |
//! | any other non-success status      | permanent    |
//!
//! Every request is bounded by the client timeout, so one attempt never
//! blocks the session manager longer than that.

use crate::error::{CatalogUnavailable, ExternalServiceError};
use crate::mood::{PlaylistId, TrackRef, UserId};
use crate::services::{CatalogSearch, Identity, PlaylistProvider, Visibility};
use anyhow::{Context, Result};
use log::{debug, warn};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

pub const SPOTIFY_API_BASE: &str = "https://api.spotify.com/v1";

/// Spotify caps search results per request.
const MAX_SEARCH_LIMIT: usize = 50;
/// Spotify caps track URIs per add-items request. Population is a single
/// request so a retried attempt never re-adds an earlier part.
const MAX_TRACKS_PER_REQUEST: usize = 100;

pub struct SpotifyClient {
    client: Client,
    base_url: String,
    token: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    tracks: Option<TrackPage>,
}

#[derive(Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<Option<TrackItem>>,
}

#[derive(Deserialize)]
struct TrackItem {
    uri: Option<String>,
}

#[derive(Deserialize)]
struct UserResponse {
    id: String,
}

#[derive(Deserialize)]
struct PlaylistResponse {
    id: String,
}

impl SpotifyClient {
    pub fn new(token: &str, timeout: Duration) -> Result<Self> {
        Self::with_base_url(SPOTIFY_API_BASE, token, timeout)
    }

    /// Point the client at another API root (a proxy or a local test server).
    pub fn with_base_url(base_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn send(&self, request: RequestBuilder) -> Result<Response, ExternalServiceError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .map_err(classify_transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        Err(classify_status(status, body.trim()))
    }

    fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ExternalServiceError> {
        self.send(request)?
            .json::<T>()
            .map_err(|e| ExternalServiceError::Permanent(format!("unexpected response body: {e}")))
    }
}

/// Map a non-success HTTP status onto the retry taxonomy.
#[must_use]
pub fn classify_status(status: StatusCode, body: &str) -> ExternalServiceError {
    let message = if body.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {body}")
    };

    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        ExternalServiceError::Transient(message)
    } else {
        ExternalServiceError::Permanent(message)
    }
}

/// JSON body of one add-items request.
fn add_tracks_body(tracks: &[TrackRef]) -> serde_json::Value {
    let uris: Vec<&str> = tracks
        .iter()
        .take(MAX_TRACKS_PER_REQUEST)
        .map(TrackRef::uri)
        .collect();
    json!({ "uris": uris })
}

fn classify_transport_error(error: reqwest::Error) -> ExternalServiceError {
    if error.is_timeout() || error.is_connect() || error.is_request() {
        ExternalServiceError::Transient(error.to_string())
    } else {
        ExternalServiceError::Permanent(error.to_string())
    }
}

impl CatalogSearch for SpotifyClient {
    fn search(&self, query: &str, limit: usize) -> Result<Vec<TrackRef>, CatalogUnavailable> {
        let limit = limit.clamp(1, MAX_SEARCH_LIMIT).to_string();
        let request = self
            .client
            .get(self.url("search"))
            .query(&[("q", query), ("type", "track"), ("limit", limit.as_str())]);

        let body: SearchResponse = self
            .send_json(request)
            .map_err(|e| CatalogUnavailable(e.to_string()))?;

        let tracks: Vec<TrackRef> = body
            .tracks
            .map(|page| page.items)
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .filter_map(|item| item.uri)
            .map(TrackRef)
            .collect();

        debug!("Spotify search '{query}' returned {} tracks", tracks.len());
        Ok(tracks)
    }
}

impl Identity for SpotifyClient {
    fn current_user_id(&self) -> Result<UserId, ExternalServiceError> {
        let user: UserResponse = self.send_json(self.client.get(self.url("me")))?;
        Ok(UserId(user.id))
    }
}

impl PlaylistProvider for SpotifyClient {
    fn create_playlist(
        &self,
        owner: &UserId,
        name: &str,
        description: &str,
        visibility: Visibility,
    ) -> Result<PlaylistId, ExternalServiceError> {
        let request = self
            .client
            .post(self.url(&format!("users/{owner}/playlists")))
            .json(&json!({
                "name": name,
                "description": description,
                "public": visibility.is_public(),
            }));

        let playlist: PlaylistResponse = self.send_json(request)?;
        Ok(PlaylistId(playlist.id))
    }

    fn add_tracks(
        &self,
        playlist: &PlaylistId,
        tracks: &[TrackRef],
    ) -> Result<(), ExternalServiceError> {
        if tracks.len() > MAX_TRACKS_PER_REQUEST {
            warn!(
                "Adding only the first {MAX_TRACKS_PER_REQUEST} of {} tracks to {playlist}",
                tracks.len()
            );
        }
        let request = self
            .client
            .post(self.url(&format!("playlists/{playlist}/tracks")))
            .json(&add_tracks_body(tracks));
        self.send(request)?;
        Ok(())
    }

    fn start_playback(&self, playlist: &PlaylistId) -> Result<(), ExternalServiceError> {
        let request = self
            .client
            .put(self.url("me/player/play"))
            .json(&json!({ "context_uri": format!("spotify:playlist:{playlist}") }));
        self.send(request)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_and_server_errors_are_transient() {
        assert!(classify_status(StatusCode::TOO_MANY_REQUESTS, "").is_transient());
        assert!(classify_status(StatusCode::BAD_GATEWAY, "").is_transient());
        assert!(classify_status(StatusCode::SERVICE_UNAVAILABLE, "try later").is_transient());
    }

    #[test]
    fn test_auth_errors_are_permanent() {
        for status in [
            StatusCode::UNAUTHORIZED,
            StatusCode::FORBIDDEN,
            StatusCode::NOT_FOUND,
            StatusCode::BAD_REQUEST,
        ] {
            assert!(!classify_status(status, "").is_transient(), "{status}");
        }
    }

    #[test]
    fn test_status_message_includes_body() {
        let error = classify_status(StatusCode::FORBIDDEN, "{\"error\": \"premium required\"}");
        assert_eq!(
            error,
            ExternalServiceError::Permanent(
                "403 Forbidden: {\"error\": \"premium required\"}".into()
            )
        );
    }

    #[test]
    fn test_add_tracks_is_one_bounded_request() {
        let tracks: Vec<TrackRef> = (0..150)
            .map(|i| TrackRef::new(format!("spotify:track:{i}")))
            .collect();
        let body = add_tracks_body(&tracks);
        let uris = body["uris"].as_array().unwrap();
        assert_eq!(uris.len(), MAX_TRACKS_PER_REQUEST);
        assert_eq!(uris[0], "spotify:track:0");

        let body = add_tracks_body(&tracks[..2]);
        assert_eq!(body, json!({ "uris": ["spotify:track:0", "spotify:track:1"] }));
    }

    #[test]
    fn test_url_joining() {
        let client = SpotifyClient::with_base_url(
            "http://localhost:9000/v1/",
            "token",
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(client.url("/me"), "http://localhost:9000/v1/me");
        assert_eq!(client.url("search"), "http://localhost:9000/v1/search");
    }

    #[test]
    fn test_search_response_skips_missing_items() {
        let body: SearchResponse = serde_json::from_str(
            r#"{"tracks": {"items": [{"uri": "spotify:track:1"}, null, {"name": "no uri"}]}}"#,
        )
        .unwrap();
        let uris: Vec<String> = body
            .tracks
            .unwrap()
            .items
            .into_iter()
            .flatten()
            .filter_map(|item| item.uri)
            .collect();
        assert_eq!(uris, ["spotify:track:1"]);
    }

    #[test]
    fn test_unreachable_server_is_transient() {
        // nothing listens on port 9 (discard) in the test environment
        let client = SpotifyClient::with_base_url(
            "http://127.0.0.1:9",
            "token",
            Duration::from_millis(500),
        )
        .unwrap();
        let error = client.current_user_id().unwrap_err();
        assert!(error.is_transient(), "{error}");
    }
}
