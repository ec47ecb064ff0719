use serde_json::json;

use crate::feedback::aggregation::MemberResult;
use crate::feedback::*;

fn stat_to_json(stat: &Stat) -> JSValue {
    match stat {
        Stat::Value(x) => json!(x),
        Stat::Empty => json!(""),
    }
}

/// The aggregates of the whole team, in roster order.
pub fn build_summary_js(results: &[MemberResult]) -> JSValue {
    let mut l: Vec<JSValue> = Vec::new();
    for mr in results.iter() {
        let r = &mr.result;
        let own: Vec<JSValue> = r
            .own_ratings
            .iter()
            .map(|o| match o {
                Some(x) => json!(x),
                None => json!(""),
            })
            .collect();
        l.push(json!({
            "name": mr.name,
            "teamRatingMean": r.team_rating_mean.iter().map(stat_to_json).collect::<Vec<JSValue>>(),
            "teamRatingStddev": r.team_rating_stddev.iter().map(stat_to_json).collect::<Vec<JSValue>>(),
            "ownRatings": own,
            "teamComments": r.team_comments,
        }));
    }
    json!({ "results": l })
}

pub fn read_summary(path: &str) -> FbResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read_summary: {:?}", contents);
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}
