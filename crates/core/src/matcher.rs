//! Free-text guess normalization and matching against the current track.
//!
//! Matching is case- and diacritic-insensitive but otherwise exact; there is no
//! edit-distance scoring here (that only exists for suggestions).

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Which whole-string fallbacks count as a correct guess.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchPolicy {
    /// Accept the track name alone or the artist alone.
    pub accept_single_field: bool,
}

impl MatchPolicy {
    #[must_use]
    pub fn strict() -> Self {
        Self {
            accept_single_field: false,
        }
    }

    #[must_use]
    pub fn lenient() -> Self {
        Self {
            accept_single_field: true,
        }
    }
}

/// Lower-case, fold South Slavic letters, then strip remaining diacritics.
///
/// The explicit folding runs first: `đ` and the `ǆ` ligature have no canonical
/// decomposition and would survive the generic pass untouched.
#[must_use]
pub fn normalize(input: &str) -> String {
    let lowered = input.trim().to_lowercase();
    let folded = fold_letters(&lowered);
    let stripped: String = folded.nfd().filter(|c| !is_combining_mark(*c)).collect();
    stripped.trim().to_string()
}

fn fold_letters(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            'd' if chars.peek() == Some(&'ž') => {
                chars.next();
                out.push_str("dz");
            }
            'ǆ' => out.push_str("dz"),
            'č' | 'ć' => out.push('c'),
            'š' => out.push('s'),
            'ž' => out.push('z'),
            'đ' => out.push('d'),
            other => out.push(other),
        }
    }
    out
}

/// Decide whether `guess` names the track `artist` / `name`.
///
/// Rules are tried in order and the first acceptance wins:
/// 1. `"a - b"` split into exactly two parts, in either order;
/// 2. the same on a bare `-`;
/// 3. the whole guess equals `"artist name"` or `"name artist"` (or, with
///    [`MatchPolicy::accept_single_field`], either field alone).
#[must_use]
pub fn is_match(guess: &str, artist: &str, name: &str, policy: MatchPolicy) -> bool {
    let guess = normalize(guess);
    if guess.is_empty() {
        return false;
    }
    let artist = normalize(artist);
    let name = normalize(name);

    pair_matches(&guess, " - ", &artist, &name)
        || pair_matches(&guess, "-", &artist, &name)
        || whole_matches(&guess, &artist, &name, policy)
}

fn pair_matches(guess: &str, separator: &str, artist: &str, name: &str) -> bool {
    let parts: Vec<&str> = guess.split(separator).map(str::trim).collect();
    let [first, second] = parts.as_slice() else {
        return false;
    };
    (*first == artist && *second == name) || (*first == name && *second == artist)
}

fn whole_matches(guess: &str, artist: &str, name: &str, policy: MatchPolicy) -> bool {
    if guess == format!("{artist} {name}") || guess == format!("{name} {artist}") {
        return true;
    }
    policy.accept_single_field && (guess == name || guess == artist)
}
