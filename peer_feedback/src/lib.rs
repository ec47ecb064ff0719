mod config;
pub mod manual;
pub mod range;

use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;

pub use crate::config::*;

/// The separator placed between the comments merged for one question.
pub const COMMENT_SEPARATOR: &str = "; ";

/// Aggregates what the peers of one team member wrote about them.
///
/// Arguments:
/// * `peer_ratings` one row per rater, one entry per question. The rows are expected
///   to be padded to the same length; extra trailing questions of longer rows are ignored.
/// * `peer_comments` same layout as the ratings, for the free-text answers.
/// * `own_ratings` the self-assessment of the subject. It is not mixed with the ratings
///   of the peers and is returned unchanged.
/// * `rng` the source of randomness used to shuffle the comments, so that the order
///   does not tell who wrote what.
pub fn aggregate_subject<R: Rng + ?Sized>(
    peer_ratings: &[RatingRow],
    peer_comments: &[CommentRow],
    own_ratings: &[Option<i64>],
    rng: &mut R,
) -> AggregateResult {
    info!(
        "Aggregating {:?} rating rows and {:?} comment rows",
        peer_ratings.len(),
        peer_comments.len()
    );

    let questions: Vec<Vec<i64>> = transpose(peer_ratings)
        .into_iter()
        .map(|column| column.into_iter().flatten().collect())
        .collect();
    debug!("aggregate_subject: ratings by question: {:?}", questions);

    let team_rating_mean: Vec<Stat> = questions.iter().map(|q| mean(q)).collect();
    let team_rating_stddev: Vec<Stat> = questions.iter().map(|q| stddev(q)).collect();

    let team_comments: Vec<String> = transpose(peer_comments)
        .iter()
        .map(|column| merge_comments(column, &mut *rng))
        .collect();

    AggregateResult {
        team_rating_mean,
        team_rating_stddev,
        own_ratings: own_ratings.to_vec(),
        team_comments,
    }
}

/// Turns rows into columns.
///
/// Like a zip over all the rows: the number of columns is the length of the shortest row,
/// and no rows gives no columns.
pub fn transpose<T: Clone>(rows: &[Vec<T>]) -> Vec<Vec<T>> {
    let width = match rows.iter().map(|r| r.len()).min() {
        Some(w) => w,
        None => return Vec::new(),
    };
    (0..width)
        .map(|idx| rows.iter().map(|r| r[idx].clone()).collect())
        .collect()
}

/// Arithmetic mean, or the empty sentinel without samples.
pub fn mean(samples: &[i64]) -> Stat {
    if samples.is_empty() {
        return Stat::Empty;
    }
    Stat::Value(sum_f64(samples) / samples.len() as f64)
}

// Ratings are arbitrary cell content, their sum may not fit in an i64.
fn sum_f64(samples: &[i64]) -> f64 {
    samples.iter().map(|x| *x as f64).sum()
}

/// Sample standard deviation (divided by n - 1).
///
/// It is not defined for a single sample, in which case the empty sentinel is returned.
pub fn stddev(samples: &[i64]) -> Stat {
    if samples.len() < 2 {
        return Stat::Empty;
    }
    let n = samples.len() as f64;
    let m = sum_f64(samples) / n;
    let sq: f64 = samples.iter().map(|x| (*x as f64 - m).powi(2)).sum();
    Stat::Value((sq / (n - 1.0)).sqrt())
}

/// Merges the comments written for one question.
///
/// The comments are first put in a random order, then the missing and blank ones are
/// removed and the rest is joined with [COMMENT_SEPARATOR].
pub fn merge_comments<R: Rng + ?Sized>(comments: &[Option<String>], rng: &mut R) -> String {
    let mut shuffled: Vec<&Option<String>> = comments.iter().collect();
    shuffled.shuffle(rng);
    let kept: Vec<&str> = shuffled
        .into_iter()
        .filter_map(|c| c.as_deref())
        .filter(|c| !c.trim().is_empty())
        .collect();
    kept.join(COMMENT_SEPARATOR)
}
