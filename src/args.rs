use clap::{Args as ClapArgs, Parser, Subcommand};

/// Provisions and aggregates peer feedback spreadsheets.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, global = true, takes_value = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Creates a master document in the workspace from an Excel workbook, and prints its id.
    Import {
        /// (file path) The Excel (.xlsx) file. Every worksheet becomes a sheet of the document.
        #[clap(long, value_parser)]
        xlsx: String,
        /// (file path) The JSON file holding the documents. It is created if missing.
        #[clap(short, long, value_parser)]
        store: String,
        /// (optional) The title of the document. Defaults to the name of the file.
        #[clap(short, long, value_parser)]
        title: Option<String>,
    },
    /// Creates the Input and Results documents of every team member listed in the master
    /// document, and records their URLs in the roster.
    Provision(MasterArgs),
    /// Aggregates the answers of the team into every Results document.
    Aggregate {
        #[clap(flatten)]
        master: MasterArgs,
        /// (integer, optional) Seed for the order of the comments. If not provided, every
        /// run mixes the comments differently.
        #[clap(long, value_parser)]
        seed: Option<u64>,
        /// (file path, 'stdout' or empty) If specified, the summary of all the aggregates
        /// will be written in JSON format to the given location.
        #[clap(short, long, value_parser)]
        out: Option<String>,
        /// (file path) A reference file containing the summary in JSON format. If provided,
        /// peerfb will check that the computed summary matches the reference.
        #[clap(short, long, value_parser)]
        reference: Option<String>,
    },
}

#[derive(ClapArgs, Debug, Clone)]
pub struct MasterArgs {
    /// The id of the master document.
    #[clap(short, long, value_parser)]
    pub master: String,
    /// (file path) The JSON configuration describing the layout of the master document.
    #[clap(short, long, value_parser)]
    pub config: String,
    /// (file path) The JSON file holding the documents.
    #[clap(short, long, value_parser)]
    pub store: String,
}
