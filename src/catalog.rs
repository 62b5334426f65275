//! Spotify catalog client (Track Source)
//!
//! Issues catalog searches for either the target artist's tracks or tracks
//! tagged with one of a small set of adjacent genres. Handles the
//! client-credentials token flow itself, caching the token in-process until
//! shortly before expiry.

use crate::error::{Error, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const SEARCH_URL: &str = "https://api.spotify.com/v1/search";
const USER_AGENT: &str = concat!("chaser/", env!("CARGO_PKG_VERSION"));

/// Bounded result-set size per search
const SEARCH_LIMIT: &str = "50";

/// Slack subtracted from the advertised token lifetime so a cached token is
/// never presented right at its expiry edge
const TOKEN_EXPIRY_SLACK: Duration = Duration::from_secs(30);

/// Genres adjacent to the target artist's scene
pub const ADJACENT_GENRES: [&str; 3] = ["breakcore", "speedcore", "hyperpop"];

/// One candidate track from the catalog
///
/// Immutable once fetched; sourced per-request, never persisted.
#[derive(Debug, Clone)]
pub struct Track {
    /// Track title
    pub title: String,
    /// Credited artists, first-listed is primary
    pub artist_list: Vec<String>,
    /// Album title
    pub album_name: String,
    /// Largest album cover image, when the catalog has one
    pub cover_image_url: Option<String>,
}

impl Track {
    /// First-listed artist (empty string if the catalog returned none)
    pub fn primary_artist(&self) -> &str {
        self.artist_list.first().map(String::as_str).unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// Wire types (subset of the Spotify search response)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Option<Page<ApiTrack>>,
    albums: Option<Page<ApiAlbum>>,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ApiTrack {
    name: String,
    artists: Vec<ApiArtist>,
    album: ApiAlbum,
}

#[derive(Debug, Deserialize)]
struct ApiArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiAlbum {
    name: String,
    #[serde(default)]
    images: Vec<ApiImage>,
}

#[derive(Debug, Deserialize)]
struct ApiImage {
    url: String,
}

impl From<ApiTrack> for Track {
    fn from(api: ApiTrack) -> Self {
        Self {
            title: api.name,
            artist_list: api.artists.into_iter().map(|a| a.name).collect(),
            album_name: api.album.name,
            cover_image_url: api.album.images.into_iter().next().map(|i| i.url),
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Catalog search client
pub struct CatalogClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    target_artist: String,
    token: Mutex<Option<CachedToken>>,
}

impl CatalogClient {
    pub fn new(client_id: String, client_secret: String, target_artist: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| Error::Upstream(e.to_string()))?;

        Ok(Self {
            http,
            client_id,
            client_secret,
            target_artist,
            token: Mutex::new(None),
        })
    }

    /// Current access token, refreshed transparently when expired
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.access_token.clone());
            }
        }

        debug!("requesting new catalog access token");

        let response = self
            .http
            .post(TOKEN_URL)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream(format!(
                "token request failed: HTTP {}",
                status
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("token decode failed: {}", e)))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_SLACK);
        let access_token = token.access_token.clone();
        *cached = Some(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + lifetime,
        });

        info!(lifetime_secs = lifetime.as_secs(), "catalog token refreshed");
        Ok(access_token)
    }

    /// Issue a catalog search for the given query and entity kind
    async fn search(&self, query: &str, kind: &str) -> Result<SearchResponse> {
        let token = self.access_token().await?;

        let response = self
            .http
            .get(SEARCH_URL)
            .bearer_auth(token)
            .query(&[("q", query), ("type", kind), ("limit", SEARCH_LIMIT)])
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("search request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream(format!("search failed: HTTP {}", status)));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("search decode failed: {}", e)))
    }

    /// Fetch up to 50 candidate tracks
    ///
    /// 1-in-4 chance of searching the target artist directly; otherwise a
    /// uniformly chosen adjacent genre.
    pub async fn fetch_candidates(&self) -> Result<Vec<Track>> {
        // RNG is scoped so the handler future stays Send
        let query = {
            let mut rng = rand::thread_rng();
            choose_query(&mut rng, &self.target_artist)
        };

        debug!(query = %query, "catalog candidate search");

        let response = self.search(&query, "track").await?;
        let tracks: Vec<Track> = response
            .tracks
            .map(|page| page.items.into_iter().map(Track::from).collect())
            .unwrap_or_default();

        info!(query = %query, count = tracks.len(), "catalog candidates fetched");
        Ok(tracks)
    }

    /// All of the target artist's tracks (for cache generation)
    pub async fn target_artist_tracks(&self) -> Result<Vec<Track>> {
        let query = format!("artist:{}", self.target_artist);
        let response = self.search(&query, "track").await?;
        Ok(response
            .tracks
            .map(|page| page.items.into_iter().map(Track::from).collect())
            .unwrap_or_default())
    }

    /// All of the target artist's album titles (for cache generation)
    pub async fn target_artist_albums(&self) -> Result<Vec<String>> {
        let query = format!("artist:{}", self.target_artist);
        let response = self.search(&query, "album").await?;
        Ok(response
            .albums
            .map(|page| page.items.into_iter().map(|album| album.name).collect())
            .unwrap_or_default())
    }
}

/// Pick the search query: fixed 1-in-4 probability for the target-artist
/// branch, uniform genre choice otherwise
fn choose_query(rng: &mut impl Rng, target_artist: &str) -> String {
    if rng.gen_range(1..=4) == 1 {
        format!("artist:{}", target_artist)
    } else {
        let genre = ADJACENT_GENRES
            .choose(rng)
            .expect("genre list is non-empty");
        format!("genre:{}", genre)
    }
}
