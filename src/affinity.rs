//! Chaser affinity cache and classifier
//!
//! The cache is a plain-text file of lowercase title/album strings known to
//! belong to the target artist, one per line, with the target artist's name
//! as a trailing sentinel line. Created once if absent, read-only for the
//! rest of the process lifetime.
//!
//! Classification is a string heuristic: substring containment means short
//! or common cache entries cause false positives. That is an accepted
//! limitation of the design, not a bug to fix here.

use crate::catalog::{CatalogClient, Track};
use crate::error::Result;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tracing::{debug, info};

/// Chaser affinity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChaserStatus {
    /// Primary artist is the target artist
    Yes,
    /// Title, album, or a credited artist matches a known-affine entry
    Adjacent,
    /// No affinity found
    No,
}

impl fmt::Display for ChaserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChaserStatus::Yes => write!(f, "YES"),
            ChaserStatus::Adjacent => write!(f, "Chaser Adjacent"),
            ChaserStatus::No => write!(f, "NO"),
        }
    }
}

/// Set of lowercase strings known to belong to the target artist
pub struct AffinityCache {
    target_artist: String,
    entries: Vec<String>,
}

impl AffinityCache {
    /// Load the cache file
    ///
    /// Entries are lowercased and trimmed; empty lines are dropped. The
    /// target artist is always a member after load, even if the sentinel
    /// line is missing from the file.
    pub fn load(path: &Path, target_artist: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut entries: Vec<String> = content
            .lines()
            .map(|line| line.trim().to_lowercase())
            .filter(|line| !line.is_empty())
            .collect();

        let target_lower = target_artist.to_lowercase();
        if !entries.contains(&target_lower) {
            entries.push(target_lower);
        }

        debug!(path = %path.display(), entries = entries.len(), "affinity cache loaded");

        Ok(Self {
            target_artist: target_artist.to_string(),
            entries,
        })
    }

    /// Minimal in-memory cache holding only the target artist
    ///
    /// Used when cache generation is impossible (catalog unreachable at
    /// startup); classification still upholds the target-member invariant,
    /// only ADJACENT detection is degraded.
    pub fn sentinel_only(target_artist: &str) -> Self {
        Self {
            target_artist: target_artist.to_string(),
            entries: vec![target_artist.to_lowercase()],
        }
    }

    /// Generate the cache file from the catalog if it does not exist yet
    ///
    /// Returns the number of entries written, or 0 if the file already
    /// existed. Concurrent initializers are guarded by `create_new`: losing
    /// the race means another writer already produced the file.
    pub async fn generate(path: &Path, catalog: &CatalogClient, target_artist: &str) -> Result<usize> {
        if path.exists() {
            return Ok(0);
        }

        // Fetch before creating the file so an upstream failure leaves no
        // partial cache behind.
        let tracks = catalog.target_artist_tracks().await?;
        let albums = catalog.target_artist_albums().await?;

        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "affinity cache created by another writer");
                return Ok(0);
            }
            Err(e) => return Err(e.into()),
        };

        let mut written = 0usize;
        let mut track_titles: Vec<String> = Vec::new();

        for track in &tracks {
            if track.primary_artist() == target_artist {
                writeln!(file, "{}", track.title)?;
                track_titles.push(track.title.clone());
                written += 1;
            }
        }

        for album in &albums {
            if !track_titles.contains(album) {
                writeln!(file, "{}", album)?;
                written += 1;
            }
        }

        // Trailing sentinel line: the target artist is always a member
        write!(file, "{}", target_artist)?;
        written += 1;

        info!(
            path = %path.display(),
            tracks = tracks.len(),
            albums = albums.len(),
            entries = written,
            "affinity cache generated"
        );
        Ok(written)
    }

    /// Classify a track's chaser affinity
    ///
    /// YES when the primary (first-listed) artist is the target artist,
    /// case-insensitively. ADJACENT when any cache entry is a substring of
    /// the lowercased title, exactly equals any lowercased artist name, or
    /// is a substring of the lowercased album name. NO otherwise.
    ///
    /// Does not mutate the cache.
    pub fn classify(&self, track: &Track) -> ChaserStatus {
        if track.primary_artist().eq_ignore_ascii_case(&self.target_artist) {
            return ChaserStatus::Yes;
        }

        let title = track.title.to_lowercase();
        let album = track.album_name.to_lowercase();
        let artists: Vec<String> = track.artist_list.iter().map(|a| a.to_lowercase()).collect();

        for entry in &self.entries {
            if title.contains(entry.as_str())
                || artists.iter().any(|artist| artist == entry)
                || album.contains(entry.as_str())
            {
                return ChaserStatus::Adjacent;
            }
        }

        ChaserStatus::No
    }

    /// Number of entries currently loaded
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
