// ********* Poll data structures ***********

use snafu::Snafu;
use std::hash::{Hash, Hasher};

/// One selectable choice of a poll.
///
/// The `id` is the token a respondent types to pick this option, the `text`
/// is what gets displayed next to it.
///
/// Two options are the same option when their ids match, whatever their text
/// says: `PartialEq` and `Hash` only look at the id. Compare `text()`
/// explicitly when the label matters.
#[derive(Debug, Clone)]
pub struct PollOption {
    id: String,
    text: String,
}

impl PollOption {
    /// Callers are expected to pass non-empty values; `Poll::set_option` checks this.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> PollOption {
        PollOption {
            id: id.into(),
            text: text.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl PartialEq for PollOption {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PollOption {}

impl Hash for PollOption {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// ******** Output data structures *********

/// The tally of one option, as reported by `Poll::calculate_scores`.
#[derive(Debug, Clone)]
pub struct Score {
    pub option: PollOption,
    pub votes: u64,
}

impl Score {
    /// The `(id, text, votes)` triple, handy when comparing full rows.
    pub fn as_row(&self) -> (&str, &str, u64) {
        (self.option.id(), self.option.text(), self.votes)
    }
}

// ******** Errors *********

/// Errors reported by the poll operations and by the poll file format.
///
/// None of them is fatal: callers can retry with other arguments or
/// another file.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PollError {
    /// A required value was empty.
    #[snafu(display("{field} must not be empty"))]
    InvalidArgument { field: &'static str },

    /// The poll file could not be opened, read or written.
    #[snafu(display("I/O failure on {target}: {source}"))]
    Io {
        source: std::io::Error,
        target: String,
    },

    /// The bytes do not follow the poll file layout.
    #[snafu(display("corrupt poll data: {reason}"))]
    CorruptData { reason: String },

    /// A value cannot be represented in the poll file layout.
    #[snafu(display("{field} is too large to be stored"))]
    Oversized { field: &'static str },
}

pub type PollResult<T> = Result<T, PollError>;
