mod quiz_vm;
mod summary_vm;
mod time_fmt;

pub use quiz_vm::{
    Feedback, PlaybackCue, QuizIntent, QuizScreen, QuizVm, attempt_label, start_quiz,
};
pub use summary_vm::{SlotState, SummaryEntryVm, SummaryVm, progress_slots, score_label};
pub use time_fmt::{countdown_label, format_progress, format_seconds};
