//! Affinity cache and classifier integration tests
//!
//! Covers the classification contract: primary-artist YES, cache-driven
//! ADJACENT, NO otherwise, and the cache file round trip.

use chaser::affinity::{AffinityCache, ChaserStatus};
use chaser::catalog::Track;
use std::io::Write;
use tempfile::NamedTempFile;

const TARGET: &str = "femtanyl";

fn track(title: &str, artists: &[&str], album: &str) -> Track {
    Track {
        title: title.to_string(),
        artist_list: artists.iter().map(|a| a.to_string()).collect(),
        album_name: album.to_string(),
        cover_image_url: None,
    }
}

/// Write entries plus the trailing sentinel line the way the generator does
fn cache_with(entries: &[&str]) -> AffinityCache {
    let mut file = NamedTempFile::new().unwrap();
    for entry in entries {
        writeln!(file, "{}", entry).unwrap();
    }
    write!(file, "{}", TARGET).unwrap();
    file.flush().unwrap();
    AffinityCache::load(file.path(), TARGET).unwrap()
}

#[test]
fn primary_artist_match_is_yes_any_case() {
    let cache = cache_with(&["CHASER", "M3TAL"]);

    for name in ["femtanyl", "FEMTANYL", "Femtanyl", "fEmTaNyL"] {
        let t = track("whatever", &[name, "someone"], "whatever album");
        assert_eq!(cache.classify(&t), ChaserStatus::Yes, "artist {}", name);
    }
}

#[test]
fn non_primary_target_credit_is_adjacent_not_yes() {
    let cache = cache_with(&[]);
    let t = track("collab", &["someone", "femtanyl"], "album");
    assert_eq!(cache.classify(&t), ChaserStatus::Adjacent);
}

#[test]
fn cache_title_substring_is_adjacent() {
    let cache = cache_with(&["M3TAL"]);
    let t = track("m3tal (nightcore edit)", &["someone"], "album");
    assert_eq!(cache.classify(&t), ChaserStatus::Adjacent);
}

#[test]
fn cache_album_substring_is_adjacent() {
    let cache = cache_with(&["CHASER"]);
    let t = track("some song", &["someone"], "the chaser compilation");
    assert_eq!(cache.classify(&t), ChaserStatus::Adjacent);
}

#[test]
fn cache_artist_match_is_exact_not_substring() {
    let cache = cache_with(&["M3TAL"]);

    let exact = track("song", &["m3tal"], "album");
    assert_eq!(cache.classify(&exact), ChaserStatus::Adjacent);

    // Artist comparison is exact equality; substring only applies to
    // title and album
    let partial = track("song", &["m3tal crew"], "album");
    assert_eq!(cache.classify(&partial), ChaserStatus::No);
}

#[test]
fn no_match_is_no() {
    let cache = cache_with(&["CHASER", "M3TAL"]);
    let t = track("unrelated", &["someone"], "nothing in common");
    assert_eq!(cache.classify(&t), ChaserStatus::No);
}

#[test]
fn short_entries_cause_accepted_false_positives() {
    // Substring containment means short cache entries over-match. That is
    // the documented behavior, asserted here so a silent "fix" shows up.
    let cache = cache_with(&["act"]);
    let t = track("exactly nothing related", &["someone"], "album");
    assert_eq!(cache.classify(&t), ChaserStatus::Adjacent);
}

#[test]
fn round_trip_album_match() {
    // Write N known-affine titles, classify a track using one as its album
    let titles = ["PUSH UR T3MPRR", "M3TAL", "CHOKECHAIN"];
    let cache = cache_with(&titles);

    for title in titles {
        let t = track("some song", &["someone"], title);
        assert_eq!(cache.classify(&t), ChaserStatus::Adjacent, "album {}", title);
    }

    assert_eq!(cache.len(), titles.len() + 1); // plus sentinel
}

#[test]
fn sentinel_restored_when_missing_from_file() {
    // A hand-edited file without the trailing sentinel still upholds the
    // target-member invariant after load
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "CHASER").unwrap();
    file.flush().unwrap();

    let cache = AffinityCache::load(file.path(), TARGET).unwrap();
    let t = track("song", &["someone", "femtanyl"], "album");
    assert_eq!(cache.classify(&t), ChaserStatus::Adjacent);
}

#[test]
fn blank_lines_are_ignored() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "CHASER").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "   ").unwrap();
    write!(file, "{}", TARGET).unwrap();
    file.flush().unwrap();

    let cache = AffinityCache::load(file.path(), TARGET).unwrap();
    assert_eq!(cache.len(), 2);

    // An empty entry would make everything ADJACENT via substring match
    let t = track("unrelated", &["someone"], "album");
    assert_eq!(cache.classify(&t), ChaserStatus::No);
}
