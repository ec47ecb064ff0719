use log::{debug, info, warn};

use peer_feedback::range::{column_span, discovery_span, qualify, row_count};
use peer_feedback::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;

use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::feedback::config_reader::*;
use crate::feedback::local_store::LocalStore;
use crate::feedback::sheet_access::*;
use crate::feedback::store::*;

pub mod aggregation;
pub mod config_reader;
pub mod io_xlsx;
pub mod local_store;
pub mod provisioning;
pub mod sheet_access;
pub mod store;
pub mod summary;

/// The sheet of each Input document where a member rates themself.
pub const SELF_SHEET: &str = "Yourself";
/// The sheet of each Results document receiving the aggregates.
pub const RESULTS_SHEET: &str = "Results";
/// Data starts below the header row of every section.
pub const FIRST_DATA_ROW: u32 = 2;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum FeedbackError {
    #[snafu(display("Spreadsheet store failure"))]
    Store { source: StoreError },
    #[snafu(display("Cannot use range {range}"))]
    Range { source: RangeError, range: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing json file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing the summary"))]
    WritingJson { source: serde_json::Error },
    #[snafu(display("Error writing file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No worksheet found in {path}"))]
    EmptyExcel { path: String },
    #[snafu(display("Sheet {title:?} not found in document {document_id}"))]
    MissingSheet { document_id: String, title: String },
    #[snafu(display("No roster entry with both documents for {name:?}"))]
    MissingRosterEntry { name: String },
    #[snafu(display("Empty member name in row {row} of the roster"))]
    BlankRosterName { row: usize },
    #[snafu(display("Roster URL columns {input_col} and {results_col} must be adjacent"))]
    RosterLayout {
        input_col: String,
        results_col: String,
    },
    #[snafu(display("Rating {content:?} at position {position} of {range} is not an integer"))]
    InvalidRating {
        range: String,
        position: usize,
        content: String,
    },
    #[snafu(display("Document {document_id} still not ready after {attempts} attempts"))]
    DocumentNotReady { document_id: String, attempts: u32 },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type FbResult<T> = Result<T, FeedbackError>;

/// How the documents of each member are titled, derived from the title of
/// the master document.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TitlePattern {
    /// The first `Master` of the title gets replaced by `<name> - <kind>`.
    Around { prefix: String, suffix: String },
    /// The master title has no `Master` in it, every document gets it as is.
    Fixed(String),
}

impl TitlePattern {
    pub fn from_master_title(title: &str) -> TitlePattern {
        match title.split_once("Master") {
            Some((prefix, suffix)) => TitlePattern::Around {
                prefix: prefix.to_string(),
                suffix: suffix.to_string(),
            },
            None => {
                warn!(
                    "Master title {:?} does not contain 'Master', all the documents will share it",
                    title
                );
                TitlePattern::Fixed(title.to_string())
            }
        }
    }

    pub fn title(&self, name: &str, kind: &str) -> String {
        match self {
            TitlePattern::Around { prefix, suffix } => {
                format!("{}{} - {}{}", prefix, name, kind, suffix)
            }
            TitlePattern::Fixed(title) => title.clone(),
        }
    }
}

/// Where the template sheet of a section lives and how many rows it has.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ResolvedSection {
    pub sheet_name: String,
    pub sheet_id: u32,
    /// The last populated row of the discovery column, header included.
    pub last_row: u32,
    /// Number of questions, below the header. Every span of the section covers them.
    pub data_rows: usize,
}

impl ResolvedSection {
    /// The data rows of a column of this section, without sheet: `C2:C45`.
    pub fn span(&self, col: &str) -> String {
        column_span(col, FIRST_DATA_ROW, self.last_row)
    }
}

/// Everything read once from the master document, shared by the
/// provisioning and the aggregation.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FeedbackSetup {
    pub master_id: String,
    pub config: FeedbackConfig,
    pub input: ResolvedSection,
    pub results: ResolvedSection,
    pub title_pattern: TitlePattern,
    /// The team members, in roster order.
    pub members: Vec<String>,
}

impl FeedbackSetup {
    pub fn load<S: SpreadsheetStore + ?Sized>(
        store: &S,
        master_id: &str,
        config: &FeedbackConfig,
    ) -> FbResult<FeedbackSetup> {
        info!("reading master spreadsheet {}{}", config.url_prefix, master_id);
        config.roster.check_layout()?;

        let input = resolve_section(
            store,
            master_id,
            &config.input.sheet_name,
            &config.input.topics_col,
            config.discovery_rows,
        )?;
        let results = resolve_section(
            store,
            master_id,
            &config.results.sheet_name,
            &config.results.topics_col,
            config.discovery_rows,
        )?;

        let master_title = store.get_title(master_id).context(StoreSnafu {})?;
        let title_pattern = TitlePattern::from_master_title(&master_title);

        let members = read_members(store, master_id, &config.roster)?;
        info!("team members: {:?}", members);

        Ok(FeedbackSetup {
            master_id: master_id.to_string(),
            config: config.clone(),
            input,
            results,
            title_pattern,
            members,
        })
    }

    pub fn rating_span(&self) -> String {
        self.input.span(&self.config.input.rating_col)
    }

    pub fn comment_span(&self) -> String {
        self.input.span(&self.config.input.comment_col)
    }

    pub fn document_url(&self, document_id: &str) -> String {
        format!("{}{}", self.config.url_prefix, document_id)
    }
}

/// Finds the id of a sheet from its title.
pub fn find_sheet_id<S: SpreadsheetStore + ?Sized>(
    store: &S,
    document_id: &str,
    title: &str,
) -> FbResult<u32> {
    let sheets = store.list_sheets(document_id).context(StoreSnafu {})?;
    sheets
        .iter()
        .find(|s| s.title == title)
        .map(|s| s.sheet_id)
        .context(MissingSheetSnafu { document_id, title })
}

fn resolve_section<S: SpreadsheetStore + ?Sized>(
    store: &S,
    master_id: &str,
    sheet_name: &str,
    topics_col: &str,
    discovery_rows: u32,
) -> FbResult<ResolvedSection> {
    let sheet_id = find_sheet_id(store, master_id, sheet_name)?;
    let range = qualify(sheet_name, &discovery_span(topics_col, discovery_rows));
    let last_row = get_range(store, master_id, &range, false)?.len() as u32;
    let data_span = column_span(topics_col, FIRST_DATA_ROW, last_row);
    let data_rows = row_count(&data_span)
        .context(RangeSnafu { range: data_span })?
        .max(0) as usize;
    let section = ResolvedSection {
        sheet_name: sheet_name.to_string(),
        sheet_id,
        last_row,
        data_rows,
    };
    debug!("resolve_section: {:?}", section);
    Ok(section)
}

fn read_members<S: SpreadsheetStore + ?Sized>(
    store: &S,
    master_id: &str,
    roster: &RosterConfig,
) -> FbResult<Vec<String>> {
    let names = get_range(store, master_id, &roster.name_range(), false)?.into_column();
    let mut res: Vec<String> = Vec::new();
    for (idx, cell) in names.into_iter().enumerate() {
        let name = cell.map(|c| c.to_string()).unwrap_or_default();
        if name.trim().is_empty() {
            return BlankRosterNameSnafu {
                row: idx + roster.first_row as usize,
            }
            .fail();
        }
        res.push(name.trim().to_string());
    }
    Ok(res)
}

pub fn read_config(path: &str) -> FbResult<FeedbackConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read_config: {:?}", contents);
    let config: FeedbackConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(config)
}

/// Seeds the workspace store with a master document read from an Excel file.
pub fn run_import(xlsx_path: &str, store_path: &str, title: Option<String>) -> FbResult<()> {
    let mut store = LocalStore::open(Path::new(store_path)).context(StoreSnafu {})?;
    let document_id = io_xlsx::import_workbook(&mut store, xlsx_path, title)?;
    store.save().context(StoreSnafu {})?;
    println!("{}", document_id);
    Ok(())
}

/// Creates the Input and Results documents of every team member.
pub fn run_provision(master_id: &str, config_path: &str, store_path: &str) -> FbResult<()> {
    let config = read_config(config_path)?;
    info!("config: {:?}", config);
    let mut store = LocalStore::open(Path::new(store_path)).context(StoreSnafu {})?;
    let setup = FeedbackSetup::load(&store, master_id, &config)?;

    let records = provisioning::create_feedback_sheets(&mut store, &setup)?;
    for r in records.iter() {
        println!(
            "{}\t{}\t{}",
            r.name,
            setup.document_url(&r.input_id),
            setup.document_url(&r.results_id)
        );
    }
    store.save().context(StoreSnafu {})?;
    Ok(())
}

/// Aggregates the feedback of every team member into their Results document.
pub fn run_aggregate(
    master_id: &str,
    config_path: &str,
    store_path: &str,
    seed: Option<u64>,
    out: Option<String>,
    check_summary_path: Option<String>,
) -> FbResult<()> {
    let config = read_config(config_path)?;
    info!("config: {:?}", config);
    let mut store = LocalStore::open(Path::new(store_path)).context(StoreSnafu {})?;
    let setup = FeedbackSetup::load(&store, master_id, &config)?;

    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    let results = aggregation::evaluate_feedback_sheets(&mut store, &setup, &mut rng)?;
    store.save().context(StoreSnafu {})?;

    let result_js = summary::build_summary_js(&results);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(WritingJsonSnafu {})?;

    match out.as_deref() {
        Some("stdout") => println!("{}", pretty_js_stats),
        Some(path) => fs::write(path, &pretty_js_stats).context(WritingOutputSnafu { path })?,
        None => {}
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        let summary_ref: JSValue = summary::read_summary(&summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(WritingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference summary");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::feedback::store::CellValue::*;

    pub fn text(s: &str) -> Option<CellValue> {
        Some(Text(s.to_string()))
    }

    pub fn int(i: i64) -> Option<CellValue> {
        Some(Int(i))
    }

    pub fn test_config() -> FeedbackConfig {
        serde_json::from_str(
            r#"{
                "master_users": ["lead@example.com", "hr@example.com"],
                "input": {"sheet_name": "Input", "topics_col": "A", "rating_col": "B", "comment_col": "C"},
                "results": {
                    "sheet_name": "Results template",
                    "topics_col": "A",
                    "team_rating_mean_col": "B",
                    "team_rating_stddev_col": "C",
                    "oww_rating_col": "D",
                    "team_comment_col": "E"
                },
                "readiness": {"kind": "immediate"}
            }"#,
        )
        .unwrap()
    }

    /// A master document with a two-question form and the given members.
    pub fn master_store(members: &[&str]) -> (LocalStore, String) {
        let mut store = LocalStore::new();
        let input = vec![
            vec![text("Topic"), text("Rating"), text("Comment")],
            vec![text("Communication"), None, None],
            vec![text("Delivery"), None, None],
        ];
        let results = vec![
            vec![
                text("Topic"),
                text("Mean"),
                text("Std dev"),
                text("Own"),
                text("Comments"),
            ],
            vec![text("Communication")],
            vec![text("Delivery")],
        ];
        let mut names = vec![vec![text("Name"), text("Input"), text("Results")]];
        for m in members {
            names.push(vec![text(m)]);
        }
        let master_id = store.add_document(
            "Feedback Master 2024",
            vec![
                ("Names".to_string(), names),
                ("Input".to_string(), input),
                ("Results template".to_string(), results),
            ],
        );
        (store, master_id)
    }
}
