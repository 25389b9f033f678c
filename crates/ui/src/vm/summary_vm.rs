use chrono::{DateTime, Utc};
use kviz_core::model::Resolution;
use kviz_core::quota::DailyProgress;

use crate::vm::time_fmt::countdown_label;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotState {
    Correct,
    Incorrect,
    Pending,
}

impl SlotState {
    #[must_use]
    pub fn symbol(self) -> char {
        match self {
            Self::Correct => '✓',
            Self::Incorrect => '✗',
            Self::Pending => '·',
        }
    }
}

/// One slot per daily track, filled in resolution order.
#[must_use]
pub fn progress_slots(progress: &DailyProgress) -> Vec<SlotState> {
    let max = usize::try_from(progress.max_daily()).unwrap_or(usize::MAX);
    let mut slots: Vec<SlotState> = progress
        .resolutions()
        .iter()
        .map(|r| {
            if r.is_correct() {
                SlotState::Correct
            } else {
                SlotState::Incorrect
            }
        })
        .collect();
    if slots.len() < max {
        slots.resize(max, SlotState::Pending);
    }
    slots
}

#[must_use]
pub fn score_label(correct: u32, total: u32) -> String {
    format!("{correct} od {total}")
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SummaryEntryVm {
    pub position: usize,
    pub label: String,
    pub correct: bool,
}

impl SummaryEntryVm {
    fn new(position: usize, resolution: &Resolution) -> Self {
        let label = if resolution.name().is_empty() {
            resolution.artist().to_string()
        } else {
            format!("{} - {}", resolution.artist(), resolution.name())
        };
        Self {
            position,
            label,
            correct: resolution.is_correct(),
        }
    }
}

/// End-of-day view shown once the quota is used.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SummaryVm {
    pub correct: u32,
    pub total: u32,
    pub score_label: String,
    pub entries: Vec<SummaryEntryVm>,
    pub countdown: Option<String>,
}

impl SummaryVm {
    #[must_use]
    pub fn from_progress(progress: &DailyProgress, now: DateTime<Utc>) -> Self {
        let correct = progress.correct_count();
        let total = progress.played_count();
        Self {
            correct,
            total,
            score_label: score_label(correct, total),
            entries: progress
                .resolutions()
                .iter()
                .enumerate()
                .map(|(index, r)| SummaryEntryVm::new(index + 1, r))
                .collect(),
            countdown: progress
                .cooldown_until()
                .map(|until| countdown_label(until, now)),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use kviz_core::model::Track;
    use kviz_core::time::fixed_now;

    use super::*;

    fn track(artist: &str, name: &str) -> Track {
        Track::new(artist, name, None, "").unwrap()
    }

    #[test]
    fn three_of_five_in_resolution_order() {
        let played = [
            (track("Miach", "Anđeo"), true),
            (track("Grše", "Forza"), false),
            (track("Elma", "Ah, Tugo, Tugo"), true),
            (track("Darko Lazić", "Idi Drugome"), false),
            (track("Devito", "Svemir"), true),
        ];
        let mut progress = DailyProgress::default();
        for (track, correct) in &played {
            let resolution = if *correct {
                Resolution::correct(track)
            } else {
                Resolution::incorrect(track)
            };
            progress.record(resolution).unwrap();
        }
        progress.set_cooldown_until(Some(fixed_now() + Duration::minutes(90)));

        let summary = SummaryVm::from_progress(&progress, fixed_now());
        assert_eq!(summary.score_label, "3 od 5");
        assert_eq!(summary.entries.len(), 5);
        for (entry, (track, correct)) in summary.entries.iter().zip(&played) {
            assert_eq!(entry.label, track.display_name());
            assert_eq!(entry.correct, *correct);
        }
        assert_eq!(summary.entries[4].position, 5);
        assert_eq!(
            summary.countdown.as_deref(),
            Some("Nove pjesme za 01:30:00")
        );

        let slots = progress_slots(&progress);
        let symbols: String = slots.iter().map(|s| s.symbol()).collect();
        assert_eq!(symbols, "✓✗✓✗✓");
    }

    #[test]
    fn unplayed_slots_are_pending() {
        let mut progress = DailyProgress::default();
        progress
            .record(Resolution::incorrect(&track("Nikolija", "Loš momak")))
            .unwrap();
        assert_eq!(
            progress_slots(&progress),
            vec![
                SlotState::Incorrect,
                SlotState::Pending,
                SlotState::Pending,
                SlotState::Pending,
                SlotState::Pending
            ]
        );
        let summary = SummaryVm::from_progress(&progress, fixed_now());
        assert_eq!(summary.score_label, "0 od 1");
        assert_eq!(summary.countdown, None);
    }
}
