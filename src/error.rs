use thiserror::Error;

/// Why a day has no bookable slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Closure {
    Holiday,
    Weekly,
}

impl Closure {
    pub fn reason(self) -> &'static str {
        match self {
            Closure::Holiday => "Chiuso per ferie",
            Closure::Weekly => "Chiuso in questo giorno",
        }
    }
}

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{}", .0.reason())]
    ClosedDay(Closure),

    #[error("Spiacente, orario già occupato! ({date} {time})")]
    SlotConflict { date: String, time: String },

    #[error("Appuntamento non trovato")]
    NotFound(i64),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Settings(#[from] anyhow::Error),
}

impl BookingError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        BookingError::InvalidInput(msg.into())
    }

    /// Errors the caller can act on, as opposed to infrastructure failures.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, BookingError::Database(_) | BookingError::Settings(_))
    }
}

pub type Result<T> = std::result::Result<T, BookingError>;
