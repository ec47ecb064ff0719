// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The ratings given by one rater, one entry per question.
///
/// A question left unanswered is `None`. Entries are never dropped so that
/// the rows of different raters stay aligned by position.
pub type RatingRow = Vec<Option<i64>>;

/// The comments given by one rater, one entry per question.
pub type CommentRow = Vec<Option<String>>;

// ******** Output data structures *********

/// The outcome of a statistic over a question.
///
/// `Empty` is the sentinel published when there are not enough samples:
/// no sample for the mean, fewer than two for the standard deviation.
#[derive(PartialEq, Debug, Clone, Copy)]
pub enum Stat {
    Value(f64),
    Empty,
}

impl Stat {
    pub fn value(&self) -> Option<f64> {
        match self {
            Stat::Value(x) => Some(*x),
            Stat::Empty => None,
        }
    }
}

/// Everything published for one team member (the subject).
///
/// All the vectors follow the question order of the form.
#[derive(PartialEq, Debug, Clone)]
pub struct AggregateResult {
    pub team_rating_mean: Vec<Stat>,
    pub team_rating_stddev: Vec<Stat>,
    /// The self-assessment, passed through as it was read.
    pub own_ratings: Vec<Option<i64>>,
    pub team_comments: Vec<String>,
}

/// Errors raised while reading a range address.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum RangeError {
    /// The address does not follow `Sheet!A1:B2` or the compact `start:end` row encoding.
    Malformed(String),
    /// A cell reference without column letters, without row digits, or pointing at row 0.
    InvalidCell(String),
    /// The end of the range comes before its start.
    Reversed(String),
}

impl Error for RangeError {}

impl Display for RangeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RangeError::Malformed(s) => write!(f, "malformed range address {:?}", s),
            RangeError::InvalidCell(s) => write!(f, "invalid cell reference {:?}", s),
            RangeError::Reversed(s) => write!(f, "range ends before it starts: {:?}", s),
        }
    }
}
