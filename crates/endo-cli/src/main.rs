//! Endoscopy reporting CLI.

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{ColorChoice, Parser};
use endo_cli::commands::{
    CheckOutcome, load_menu, load_report, locations_table, render_report, schema_json,
    schema_table, visible_rows,
};
use endo_cli::logging::{LogConfig, LogFormat, init_logging};
use endo_cli::settings::{MENU_CSV_ENV, Settings, load_settings, save_settings, settings_path};
use endo_model::ProcedureType;
use tracing::level_filters::LevelFilter;

mod cli;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg, VisibleArgs};

/// Values every command resolves the same way.
struct RunContext {
    procedure: ProcedureType,
    menu: Option<PathBuf>,
    settings: Settings,
    settings_path: Option<PathBuf>,
}

impl RunContext {
    fn menu_path(&self) -> Result<&PathBuf> {
        self.menu.as_ref().ok_or_else(|| {
            anyhow!("no menu CSV given; pass --menu or set {MENU_CSV_ENV} or menu.csv_path in settings")
        })
    }
}

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }

    let settings_path = cli.settings.clone().or_else(settings_path);
    let settings = load_settings(settings_path.as_deref());
    let context = RunContext {
        procedure: cli
            .procedure
            .map_or(settings.general.procedure, ProcedureType::from),
        menu: settings.menu_csv(cli.menu.as_deref(), std::env::var_os(MENU_CSV_ENV)),
        settings,
        settings_path,
    };

    let exit_code = match run(&cli.command, &context) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(command: &Command, context: &RunContext) -> Result<i32> {
    match command {
        Command::Locations => {
            println!("{}", locations_table(context.procedure));
            Ok(0)
        }
        Command::Check => {
            let compilation = load_menu(context.menu_path()?, context.procedure)?;
            let outcome = CheckOutcome::from_compilation(&compilation);
            println!("{}", outcome.render());
            Ok(outcome.exit_code())
        }
        Command::Schema { json } => {
            let compilation = load_menu(context.menu_path()?, context.procedure)?;
            if *json {
                println!("{}", schema_json(&compilation.schema)?);
            } else {
                println!("{}", schema_table(&compilation.schema));
            }
            Ok(0)
        }
        Command::Render { report } => {
            let compilation = load_menu(context.menu_path()?, context.procedure)?;
            let document = load_report(report)?;
            println!("{}", render_report(compilation.schema, document));
            Ok(0)
        }
        Command::Visible(args) => run_visible(args, context),
        Command::Settings { init } => run_settings(*init, context),
    }
}

fn run_visible(args: &VisibleArgs, context: &RunContext) -> Result<i32> {
    let compilation = load_menu(context.menu_path()?, context.procedure)?;
    let document = load_report(&args.report)?;
    let target = args.location.as_deref().zip(args.disease.as_deref());
    let visible = visible_rows(compilation.schema, document, target)?;
    println!("{} / {}", visible.active.loc, visible.active.disease);
    println!("{}", visible.table);
    Ok(0)
}

fn run_settings(init: bool, context: &RunContext) -> Result<i32> {
    let path = context
        .settings_path
        .as_ref()
        .context("could not determine settings path")?;
    if init {
        save_settings(&context.settings, path)?;
    }
    println!("# {}", path.display());
    print!(
        "{}",
        toml::to_string_pretty(&context.settings).context("serialize settings")?
    );
    Ok(0)
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.log_data = cli.log_data;
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
