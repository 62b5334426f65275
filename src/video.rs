//! Video resolver
//!
//! Scrapes the video-hosting search results page for the first embedded
//! video id and applies a conservative availability heuristic. Resolution
//! failures are never fatal to the caller: every network or parse error is
//! downgraded to "no playable video".

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use tracing::{debug, warn};

const RESULTS_URL: &str = "https://www.youtube.com/results";
const USER_AGENT: &str = concat!("chaser/", env!("CARGO_PKG_VERSION"));

/// Known-scene artists whose uploads are reliably playable
const KNOWN_SCENE_ARTISTS: [&str; 4] = ["bungex", "odetari", "kets4eki", "6arelyhuman"];

/// First embedded video-identifier token in a results page
static VIDEO_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""videoId":"([0-9A-Za-z_-]{11})""#).expect("video id regex"));

/// Video search resolver
pub struct VideoResolver {
    http: reqwest::Client,
    target_artist: String,
    results_url: String,
}

impl VideoResolver {
    pub fn new(target_artist: String) -> Result<Self> {
        Self::with_results_url(target_artist, RESULTS_URL.to_string())
    }

    fn with_results_url(target_artist: String, results_url: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| Error::Resolution(e.to_string()))?;

        Ok(Self {
            http,
            target_artist,
            results_url,
        })
    }

    /// Resolve a playable video for the given title/artist pair
    ///
    /// Returns `(video_id, is_playable)`. Any failure is logged and mapped
    /// to `(None, false)`.
    pub async fn resolve(&self, title: &str, artist: &str) -> (Option<String>, bool) {
        match self.try_resolve(title, artist).await {
            Ok(result) => result,
            Err(e) => {
                warn!(title = %title, artist = %artist, error = %e, "video resolution failed");
                (None, false)
            }
        }
    }

    async fn try_resolve(&self, title: &str, artist: &str) -> Result<(Option<String>, bool)> {
        let query = format!("{} {} audio", title, artist);

        let response = self
            .http
            .get(&self.results_url)
            .query(&[("search_query", query.as_str())])
            .send()
            .await
            .map_err(|e| Error::Resolution(format!("search request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Resolution(format!("search failed: HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Resolution(format!("body read failed: {}", e)))?;

        let video_id = match extract_video_id(&body) {
            Some(id) => id,
            None => {
                debug!(query = %query, "no video id in results page");
                return Ok((None, false));
            }
        };

        let playable = self.is_playable(title, artist, &body);
        debug!(video_id = %video_id, playable, "video resolved");
        Ok((Some(video_id), playable))
    }

    /// Availability heuristic, applied in order, first match wins
    ///
    /// Deliberately conservative; the ordering is part of the contract and
    /// must not be reordered to "improve" accuracy.
    fn is_playable(&self, title: &str, artist: &str, body: &str) -> bool {
        // 1. Target artist uploads are always playable
        if artist.eq_ignore_ascii_case(&self.target_artist) {
            return true;
        }

        // 2. Known-scene artist allow-list
        let artist_lower = artist.to_lowercase();
        if KNOWN_SCENE_ARTISTS
            .iter()
            .any(|known| artist_lower.contains(known))
        {
            return true;
        }

        // 3. Verbatim "title artist" appears in the results page
        let needle = format!("{} {}", title, artist).to_lowercase();
        if body.to_lowercase().contains(&needle) {
            return true;
        }

        // 4. Otherwise assume not playable
        false
    }
}

/// Extract the first embedded video id from a results page body
fn extract_video_id(body: &str) -> Option<String> {
    VIDEO_ID_RE
        .captures(body)
        .map(|caps| caps[1].to_string())
}
