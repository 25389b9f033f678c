//! Text rendering and a stand-in audio sink.

use services::{AudioSink, PlaybackError};
use ui::vm::{QuizScreen, SlotState, format_seconds};

/// Prints what a real player would do. Clips are never fetched.
#[derive(Debug, Default)]
pub struct TerminalSink;

impl AudioSink for TerminalSink {
    fn play_from_start(&self, url: &str) -> Result<(), PlaybackError> {
        println!("▶ {url}");
        Ok(())
    }

    fn pause(&self) {
        println!("⏸");
    }

    fn resume(&self) -> Result<(), PlaybackError> {
        println!("▶");
        Ok(())
    }

    fn stop(&self) {
        println!("⏹");
    }
}

fn slot_row(slots: &[SlotState]) -> String {
    slots
        .iter()
        .map(|slot| slot.symbol().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn render(screen: &QuizScreen) {
    match screen {
        QuizScreen::Listening {
            attempt_label,
            slots,
            ..
        } => {
            println!("[{}] {attempt_label}", slot_row(slots));
        }
        QuizScreen::Revealed {
            title,
            artist,
            album_image,
            correct,
            slots,
        } => {
            let mark = if *correct { '✓' } else { '✗' };
            println!("[{}] {mark} {artist} - {title}", slot_row(slots));
            if !album_image.is_empty() {
                println!("    {album_image}");
            }
            println!("    :next za sljedeću pjesmu");
        }
        QuizScreen::QuotaUsed(summary) => {
            println!("Današnji rezultat: {}", summary.score_label);
            for entry in &summary.entries {
                let mark = if entry.correct { '✓' } else { '✗' };
                println!("  {}. {mark} {}", entry.position, entry.label);
            }
            if let Some(countdown) = &summary.countdown {
                println!("{countdown}");
            }
        }
        QuizScreen::OutOfTracks { slots } => {
            println!("[{}] Nema više pjesama za danas.", slot_row(slots));
        }
    }
}

pub fn render_suggestions(suggestions: &[String]) {
    if suggestions.is_empty() {
        println!("  (nema prijedloga)");
        return;
    }
    for suggestion in suggestions {
        println!("  · {suggestion}");
    }
}

pub fn render_progress(elapsed: std::time::Duration, window: Option<std::time::Duration>) {
    match window {
        Some(window) => println!("{}", ui::vm::format_progress(elapsed, window)),
        None => println!("{} s", format_seconds(elapsed)),
    }
}
