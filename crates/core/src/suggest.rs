//! "Artist - Title" suggestions offered while the player types.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::matcher::normalize;
use crate::model::Track;

/// Most suggestions ever shown at once.
pub const SUGGESTION_LIMIT: usize = 5;

/// Prefix similarity at which the current track is offered as a hint.
pub const HINT_SIMILARITY: f64 = 0.4;

/// Length of the common literal prefix divided by the longer length.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 0.0;
    }
    let common = a
        .chars()
        .zip(b.chars())
        .take_while(|(left, right)| left == right)
        .count();
    common as f64 / longest as f64
}

/// Suggestions drawn from today's playlist.
///
/// Playlist entries whose normalized `"artist - name"` contains the normalized
/// guess are sampled at random. Once the guess is close enough to the current
/// track, that track is always offered as well. An empty guess yields nothing.
pub fn local_suggestions<R: Rng + ?Sized>(
    guess: &str,
    tracks: &[Track],
    current: Option<&Track>,
    rng: &mut R,
) -> Vec<String> {
    let needle = normalize(guess);
    if needle.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<String> = tracks
        .iter()
        .map(Track::display_name)
        .filter(|full| normalize(full).contains(&needle))
        .collect();
    matches.shuffle(rng);

    let mut suggestions = dedupe_capped(matches);

    if let Some(current) = current {
        let full = current.display_name();
        let normalized = normalize(&full);
        let already = suggestions.iter().any(|s| normalize(s) == normalized);
        if !already && similarity(&normalized, &needle) >= HINT_SIMILARITY {
            if suggestions.len() >= SUGGESTION_LIMIT {
                suggestions.pop();
            }
            suggestions.push(full);
        }
    }

    suggestions
}

/// Suggestions from a live search provider, kept in provider order.
#[must_use]
pub fn remote_suggestions(guess: &str, candidates: impl IntoIterator<Item = String>) -> Vec<String> {
    if normalize(guess).is_empty() {
        return Vec::new();
    }
    dedupe_capped(candidates)
}

fn dedupe_capped(candidates: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|candidate| seen.insert(normalize(candidate)))
        .take(SUGGESTION_LIMIT)
        .collect()
}
