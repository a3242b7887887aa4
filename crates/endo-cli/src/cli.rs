//! CLI argument definitions for the `endo` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use endo_model::ProcedureType;

#[derive(Parser)]
#[command(
    name = "endo",
    version,
    about = "Endoscopy reporting - inspect menus and render saved reports",
    long_about = "Inspect endoscopy and colonoscopy menu configurations and render saved reports.\n\n\
                  The menu CSV comes from --menu, the ENDO_MENU_CSV environment variable,\n\
                  or the menu.csv_path entry of the settings file, in that order."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Menu configuration CSV.
    #[arg(long = "menu", value_name = "CSV", global = true)]
    pub menu: Option<PathBuf>,

    /// Procedure type (defaults to the settings file, then endoscopy).
    #[arg(long = "procedure", value_enum, global = true)]
    pub procedure: Option<ProcedureArg>,

    /// Settings file to use instead of the platform default.
    #[arg(long = "settings", value_name = "PATH", global = true)]
    pub settings: Option<PathBuf>,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow patient identifiers (UHID, name) in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the main locations of the procedure and their sub-location layouts.
    Locations,

    /// Parse and compile the menu, reporting configuration warnings.
    Check,

    /// Show the compiled menu.
    Schema {
        /// Print the dictation schema export as JSON instead of a table.
        #[arg(long = "json")]
        json: bool,
    },

    /// Print the text summary of a saved report.
    Render {
        /// Saved report document (JSON).
        #[arg(value_name = "REPORT")]
        report: PathBuf,
    },

    /// List the rows currently shown for a disease of a saved report.
    Visible(VisibleArgs),

    /// Show the resolved settings file.
    Settings {
        /// Write the current settings to the settings file.
        #[arg(long = "init")]
        init: bool,
    },
}

#[derive(Parser)]
pub struct VisibleArgs {
    /// Saved report document (JSON).
    #[arg(value_name = "REPORT")]
    pub report: PathBuf,

    /// Location of the disease to open (defaults to the last active one).
    #[arg(long = "location", requires = "disease")]
    pub location: Option<String>,

    /// Disease to open at --location.
    #[arg(long = "disease", requires = "location")]
    pub disease: Option<String>,
}

/// CLI procedure choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum ProcedureArg {
    Endoscopy,
    Colonoscopy,
}

impl From<ProcedureArg> for ProcedureType {
    fn from(arg: ProcedureArg) -> Self {
        match arg {
            ProcedureArg::Endoscopy => ProcedureType::Endoscopy,
            ProcedureArg::Colonoscopy => ProcedureType::Colonoscopy,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
