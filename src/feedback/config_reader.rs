use crate::feedback::*;
use peer_feedback::range::column_index;
use serde::{Deserialize, Serialize};

/// The content of `feedback.json`.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// The accounts given write access to every provisioned document.
    pub master_users: Vec<String>,
    pub input: InputSection,
    pub results: ResultsSection,
    #[serde(default)]
    pub roster: RosterConfig,
    #[serde(default)]
    pub readiness: ReadinessPolicy,
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,
    /// How far down the discovery column is scanned.
    #[serde(default = "default_discovery_rows")]
    pub discovery_rows: u32,
}

/// The template of the form filled by every member, one copy per colleague.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputSection {
    pub sheet_name: String,
    /// The column listing the questions. Its populated length sizes the section.
    pub topics_col: String,
    pub rating_col: String,
    pub comment_col: String,
}

/// The template of the sheet receiving the aggregates.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResultsSection {
    pub sheet_name: String,
    pub topics_col: String,
    pub team_rating_mean_col: String,
    pub team_rating_stddev_col: String,
    #[serde(alias = "oww_rating_col")]
    pub own_rating_col: String,
    pub team_comment_col: String,
}

/// Where the team members and their documents are listed in the master document.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RosterConfig {
    pub sheet_name: String,
    pub name_col: String,
    pub input_url_col: String,
    pub results_url_col: String,
    pub first_row: u32,
    pub last_row: u32,
}

impl Default for RosterConfig {
    fn default() -> Self {
        RosterConfig {
            sheet_name: "Names".to_string(),
            name_col: "A".to_string(),
            input_url_col: "B".to_string(),
            results_url_col: "C".to_string(),
            first_row: 2,
            last_row: 100,
        }
    }
}

impl RosterConfig {
    /// The member names: `Names!A2:A100`.
    pub fn name_range(&self) -> String {
        qualify(
            &self.sheet_name,
            &column_span(&self.name_col, self.first_row, self.last_row),
        )
    }

    /// The names with both document URLs: `Names!A2:C100`.
    pub fn roster_range(&self) -> String {
        qualify(
            &self.sheet_name,
            &format!(
                "{}{}:{}{}",
                self.name_col, self.first_row, self.results_url_col, self.last_row
            ),
        )
    }

    /// The block receiving the document URLs: `Names!B2:C100`.
    pub fn url_range(&self) -> String {
        qualify(
            &self.sheet_name,
            &format!(
                "{}{}:{}{}",
                self.input_url_col, self.first_row, self.results_url_col, self.last_row
            ),
        )
    }

    /// The URLs are written as one block, and read back along with the names.
    pub fn check_layout(&self) -> FbResult<()> {
        let name = column_index(&self.name_col);
        let input = column_index(&self.input_url_col);
        let results = column_index(&self.results_url_col);
        match (name, input, results) {
            (Some(n), Some(i), Some(r)) if i + 1 == r && n + 1 == i => Ok(()),
            _ => RosterLayoutSnafu {
                input_col: self.input_url_col.clone(),
                results_col: self.results_url_col.clone(),
            }
            .fail(),
        }
    }
}

/// How to wait for a new document before changing its permissions.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReadinessPolicy {
    /// Do not wait.
    Immediate,
    /// Pause once for the given time.
    Fixed { delay_ms: u64 },
    /// Ask the store until the document is ready, waiting longer each time.
    Backoff {
        initial_delay_ms: u64,
        factor: u32,
        max_attempts: u32,
    },
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        ReadinessPolicy::Fixed { delay_ms: 15_000 }
    }
}

fn default_url_prefix() -> String {
    "https://docs.google.com/spreadsheets/d/".to_string()
}

fn default_discovery_rows() -> u32 {
    500
}

/// The last segment of a document URL, which is the document id.
pub fn document_id_from_url(url: &str) -> &str {
    url.trim().trim_end_matches('/').rsplit('/').next().unwrap_or(url)
}
