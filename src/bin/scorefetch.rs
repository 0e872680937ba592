use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use scorefetch::catalog;
use scorefetch::config::{ConfigLoader, RunSettings};
use scorefetch::domain::SourceTag;
use scorefetch::error::ScoreError;
use scorefetch::orchestrator::Acquirer;
use scorefetch::output::{ConsoleOutput, JsonOutput, OutputMode};
use scorefetch::report::RunSummary;
use scorefetch::store::ScoreStore;

#[derive(Parser)]
#[command(name = "scorefetch")]
#[command(about = "Acquire sheet-music PDFs for a catalog of pieces from public sources")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Work through the catalog and download missing scores")]
    Run(RunArgs),
    #[command(about = "Report per-entry completion from files on disk, no network")]
    Status(StatusArgs),
}

#[derive(Args, Clone, Default)]
struct RunArgs {
    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    catalog: Option<String>,

    #[arg(long)]
    output: Option<String>,

    #[arg(long)]
    quota: Option<u32>,

    #[arg(long)]
    dry_run: bool,
}

#[derive(Args, Clone, Default)]
struct StatusArgs {
    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    catalog: Option<String>,

    #[arg(long)]
    output: Option<String>,

    #[arg(long)]
    quota: Option<u32>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<ScoreError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &ScoreError) -> u8 {
    match error {
        ScoreError::CatalogRead(_)
        | ScoreError::CatalogParse(_)
        | ScoreError::CatalogWrite(_, _)
        | ScoreError::ConfigRead(_)
        | ScoreError::ConfigParse(_)
        | ScoreError::InvalidEntry(_) => 2,
        ScoreError::SearchHttp(_)
        | ScoreError::SearchStatus { .. }
        | ScoreError::ImslpHttp(_)
        | ScoreError::ImslpStatus { .. }
        | ScoreError::ArchiveHttp(_)
        | ScoreError::ArchiveStatus { .. }
        | ScoreError::MutopiaHttp(_)
        | ScoreError::MutopiaStatus { .. }
        | ScoreError::DownloadHttp(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    match cli.command.unwrap_or(Commands::Run(RunArgs::default())) {
        Commands::Run(args) => run_acquisition(args, output_mode),
        Commands::Status(args) => run_status(args, output_mode),
    }
}

fn resolve_settings(
    config: Option<&str>,
    catalog: Option<String>,
    output: Option<String>,
    quota: Option<u32>,
) -> miette::Result<RunSettings> {
    let mut settings = ConfigLoader::resolve(config).into_diagnostic()?;
    if let Some(catalog) = catalog {
        settings.catalog = catalog.into();
    }
    if let Some(output) = output {
        settings.output_dir = output.into();
    }
    if let Some(quota) = quota {
        settings.quota = quota;
    }
    Ok(settings)
}

fn run_acquisition(args: RunArgs, output_mode: OutputMode) -> miette::Result<()> {
    let settings = resolve_settings(
        args.config.as_deref(),
        args.catalog,
        args.output,
        args.quota,
    )?;
    let store = ScoreStore::new(&settings.output_dir).into_diagnostic()?;
    let entries = catalog::load(&settings.catalog).into_diagnostic()?;
    let acquirer = Acquirer::with_default_sources(store, settings.clone()).into_diagnostic()?;

    let summary = match output_mode {
        OutputMode::NonInteractive => {
            if args.dry_run {
                acquirer.plan(&entries, &JsonOutput).into_diagnostic()?
            } else {
                acquirer.run(&entries, &JsonOutput).into_diagnostic()?
            }
        }
        OutputMode::Interactive => {
            if args.dry_run {
                acquirer.plan(&entries, &ConsoleOutput).into_diagnostic()?
            } else {
                acquirer.run(&entries, &ConsoleOutput).into_diagnostic()?
            }
        }
    };

    if !args.dry_run {
        let complete: Vec<_> = summary
            .entries
            .iter()
            .filter(|result| result.outcome.is_complete())
            .map(|result| result.entry.clone())
            .collect();
        let incomplete: Vec<_> = summary
            .entries
            .iter()
            .filter(|result| !result.outcome.is_complete())
            .map(|result| result.entry.clone())
            .collect();
        catalog::rewrite(&settings.catalog, &complete, &incomplete).into_diagnostic()?;
    }

    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_summary(&summary).into_diagnostic()?,
        OutputMode::Interactive => print_run_summary(&summary),
    }
    Ok(())
}

fn run_status(args: StatusArgs, output_mode: OutputMode) -> miette::Result<()> {
    let settings = resolve_settings(
        args.config.as_deref(),
        args.catalog,
        args.output,
        args.quota,
    )?;
    let store = ScoreStore::new(&settings.output_dir).into_diagnostic()?;
    let entries = catalog::load(&settings.catalog).into_diagnostic()?;
    // Status never touches the network, so it gets no sources and a fetcher
    // that refuses to be called.
    let acquirer = Acquirer::new(store, Vec::new(), NopFetcher, settings);

    match output_mode {
        OutputMode::NonInteractive => {
            let summary = acquirer.plan(&entries, &JsonOutput).into_diagnostic()?;
            JsonOutput::print_summary(&summary).into_diagnostic()?;
        }
        OutputMode::Interactive => {
            let summary = acquirer.plan(&entries, &ConsoleOutput).into_diagnostic()?;
            print_run_summary(&summary);
        }
    }
    Ok(())
}

struct NopFetcher;

impl scorefetch::download::PdfFetcher for NopFetcher {
    fn probe_size(&self, _url: &str) -> Option<u64> {
        None
    }

    fn download(
        &self,
        _url: &str,
        _destination: &camino::Utf8Path,
    ) -> Result<Option<u64>, ScoreError> {
        Err(ScoreError::DownloadHttp(
            "download client not configured".to_string(),
        ))
    }
}

fn print_run_summary(summary: &RunSummary) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";

    println!("{cyan}scorefetch summary{reset}");
    println!(
        "{green}complete: {}  {yellow}incomplete: {}{reset}",
        summary.complete_count(),
        summary.incomplete_count()
    );
    for result in &summary.entries {
        let (icon, color) = if result.outcome.is_complete() {
            ("✔", green)
        } else {
            ("✘", yellow)
        };
        println!(
            "{color}{icon} {}: {}/{} scores{reset}",
            result.entry, result.achieved, result.quota
        );
    }
    if summary.report.total() > 0 {
        println!("{cyan}downloads by source:{reset}");
        for source in SourceTag::ALL {
            let count = summary.report.count(source);
            if count > 0 {
                println!("  {source}: {count}");
            }
        }
    }
}
