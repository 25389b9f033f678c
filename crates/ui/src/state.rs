use services::SessionError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewError {
    /// Today's tracks could not be fetched; shown as a full-page error.
    LoadFailed,
    /// The action does not apply to the current screen.
    NotAvailable,
    Unknown,
}

impl ViewError {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::LoadFailed => "Greška pri dohvaćanju pjesama.",
            Self::NotAvailable => "Ta radnja trenutno nije dostupna.",
            Self::Unknown => "Došlo je do greške. Pokušaj ponovo.",
        }
    }
}

impl From<&SessionError> for ViewError {
    fn from(err: &SessionError) -> Self {
        match err {
            SessionError::Load(_) => Self::LoadFailed,
            SessionError::NoCurrentTrack | SessionError::InProgress => Self::NotAvailable,
            _ => Self::Unknown,
        }
    }
}
