//! One line of player input.

use ui::vm::QuizIntent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Intent(QuizIntent),
    /// Pause, resume or replay the current window.
    Toggle,
    Suggest(String),
    Status,
    Help,
    Quit,
    Unknown(String),
}

/// Commands start with `:`, suggestions with `?`; anything else is a guess.
#[must_use]
pub fn parse_line(line: &str) -> Input {
    let line = line.trim();
    if let Some(query) = line.strip_prefix('?') {
        return Input::Suggest(query.trim().to_string());
    }
    let Some(command) = line.strip_prefix(':') else {
        return Input::Intent(QuizIntent::Guess(line.to_string()));
    };
    match command.trim().to_lowercase().as_str() {
        "s" | "skip" | "preskoci" => Input::Intent(QuizIntent::Skip),
        "n" | "next" | "dalje" => Input::Intent(QuizIntent::Next),
        "p" | "play" | "pause" => Input::Toggle,
        "status" => Input::Status,
        "h" | "help" => Input::Help,
        "q" | "quit" => Input::Quit,
        other => Input::Unknown(other.to_string()),
    }
}

pub const HELP: &str = "\
Upiši pogodak kao \"izvođač - pjesma\".
  :skip   duži isječak
  :next   sljedeća pjesma
  :play   pauza / nastavak
  :status napredak isječka
  ?tekst  prijedlozi
  :quit   izlaz";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_guess() {
        assert_eq!(
            parse_line("  Dino Merlin - Sve je laž "),
            Input::Intent(QuizIntent::Guess("Dino Merlin - Sve je laž".into()))
        );
        assert_eq!(parse_line(""), Input::Intent(QuizIntent::Guess(String::new())));
    }

    #[test]
    fn commands_and_queries() {
        assert_eq!(parse_line(":skip"), Input::Intent(QuizIntent::Skip));
        assert_eq!(parse_line(":N"), Input::Intent(QuizIntent::Next));
        assert_eq!(parse_line(":play"), Input::Toggle);
        assert_eq!(parse_line("?sen"), Input::Suggest("sen".into()));
        assert_eq!(parse_line(":q"), Input::Quit);
        assert_eq!(parse_line(":dance"), Input::Unknown("dance".into()));
    }
}
