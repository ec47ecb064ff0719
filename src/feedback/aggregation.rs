use std::collections::HashMap;

use rand::Rng;

use crate::feedback::provisioning::PersonRecord;
use crate::feedback::*;

/// The aggregates of one team member.
#[derive(PartialEq, Debug, Clone)]
pub struct MemberResult {
    pub name: String,
    pub result: AggregateResult,
}

/// Reads back the roster filled during the provisioning.
pub fn read_roster<S: SpreadsheetStore + ?Sized>(
    store: &S,
    setup: &FeedbackSetup,
) -> FbResult<HashMap<String, PersonRecord>> {
    let rows = get_range(
        store,
        &setup.master_id,
        &setup.config.roster.roster_range(),
        false,
    )?
    .into_rows();
    let mut res: HashMap<String, PersonRecord> = HashMap::new();
    for row in rows.iter() {
        if let [name, input, results, ..] = row.as_slice() {
            if name.is_blank() || input.is_blank() || results.is_blank() {
                continue;
            }
            let record = PersonRecord {
                name: name.to_string().trim().to_string(),
                input_id: document_id_from_url(&input.to_string()).to_string(),
                results_id: document_id_from_url(&results.to_string()).to_string(),
            };
            debug!("read_roster: {:?}", record);
            res.insert(record.name.clone(), record);
        }
    }
    Ok(res)
}

/// Aggregates the feedback received by every team member and writes it to their
/// Results document.
pub fn evaluate_feedback_sheets<S: SpreadsheetStore + ?Sized, R: Rng + ?Sized>(
    store: &mut S,
    setup: &FeedbackSetup,
    rng: &mut R,
) -> FbResult<Vec<MemberResult>> {
    let roster = read_roster(&*store, setup)?;
    let rating_span = setup.rating_span();
    let comment_span = setup.comment_span();

    let mut res: Vec<MemberResult> = Vec::new();
    for subject in setup.members.iter() {
        info!("evaluating for {:?}", subject);
        let mut team_ratings: Vec<RatingRow> = Vec::new();
        let mut team_comments: Vec<CommentRow> = Vec::new();
        let mut own_ratings: Vec<Option<i64>> = Vec::new();

        for rater in setup.members.iter() {
            let input_id = &member(&roster, rater)?.input_id;
            if rater == subject {
                let range = qualify(SELF_SHEET, &rating_span);
                own_ratings = ratings(get_range(&*store, input_id, &range, false)?, &range)?;
            } else {
                let range = qualify(subject, &rating_span);
                team_ratings.push(ratings(get_range(&*store, input_id, &range, true)?, &range)?);
                let range = qualify(subject, &comment_span);
                team_comments.push(comments(get_range(&*store, input_id, &range, true)?));
            }
        }
        debug!(
            "evaluate_feedback_sheets: {:?}: team ratings: {:?}",
            subject, team_ratings
        );

        let result = aggregate_subject(&team_ratings, &team_comments, &own_ratings, &mut *rng);
        write_results(store, setup, &member(&roster, subject)?.results_id, &result)?;
        res.push(MemberResult {
            name: subject.clone(),
            result,
        });
    }
    Ok(res)
}

fn member<'a>(
    roster: &'a HashMap<String, PersonRecord>,
    name: &str,
) -> FbResult<&'a PersonRecord> {
    roster.get(name).context(MissingRosterEntrySnafu { name })
}

fn write_results<S: SpreadsheetStore + ?Sized>(
    store: &mut S,
    setup: &FeedbackSetup,
    results_id: &str,
    result: &AggregateResult,
) -> FbResult<()> {
    let cols = &setup.config.results;
    let blocks: Vec<(&String, Vec<CellValue>)> = vec![
        (
            &cols.team_rating_mean_col,
            result.team_rating_mean.iter().map(stat_cell).collect(),
        ),
        (
            &cols.team_rating_stddev_col,
            result.team_rating_stddev.iter().map(stat_cell).collect(),
        ),
        (
            &cols.own_rating_col,
            result
                .own_ratings
                .iter()
                .map(|r| match r {
                    Some(x) => CellValue::Int(*x),
                    None => CellValue::Text(String::new()),
                })
                .collect(),
        ),
        (
            &cols.team_comment_col,
            result
                .team_comments
                .iter()
                .map(|c| CellValue::Text(c.clone()))
                .collect(),
        ),
    ];
    for (col, values) in blocks {
        let range = qualify(RESULTS_SHEET, &setup.results.span(col));
        update_column(store, results_id, &range, values)?;
    }
    Ok(())
}

/// The empty sentinel is published as an empty cell.
pub fn stat_cell(stat: &Stat) -> CellValue {
    match stat {
        Stat::Value(x) => CellValue::Float(*x),
        Stat::Empty => CellValue::Text(String::new()),
    }
}
