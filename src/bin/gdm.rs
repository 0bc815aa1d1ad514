use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing::info;
use tracing_subscriber::EnvFilter;

use graph_dataset_manager::app::{App, ProgressSink};
use graph_dataset_manager::bench::{BenchRunner, RunOptions};
use graph_dataset_manager::catalog::Catalog;
use graph_dataset_manager::cleaner::CleanMode;
use graph_dataset_manager::config::{ConfigLoader, Settings};
use graph_dataset_manager::converter::{Conversion, ConvertOptions};
use graph_dataset_manager::domain::{Algorithm, Filter, GraphSpec, OrderBy};
use graph_dataset_manager::error::GdmError;
use graph_dataset_manager::fetch::HttpArchiveClient;
use graph_dataset_manager::output::{JsonOutput, QuietProgress, TerminalProgress};
use graph_dataset_manager::plot;
use graph_dataset_manager::printer::{self, Printer};
use graph_dataset_manager::process::{StdinConfirm, SystemCommandRunner};
use graph_dataset_manager::report::{self, ResultSet};

#[derive(Parser)]
#[command(name = "gdm")]
#[command(about = "Graph dataset manager and BFS/SSSP benchmark harness")]
#[command(version, author)]
struct Cli {
    /// JSON config file (defaults to ./gdm.json, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Datasets root folder, overriding the config
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "List available graphs")]
    List(ListArgs),
    #[command(about = "Download and extract graphs")]
    Download(DownloadArgs),
    #[command(about = "Remove downloaded graph files")]
    Clean(CleanArgs),
    #[command(about = "Show a graph's manifest")]
    Info(InfoArgs),
    #[command(about = "Convert .mtx graphs to the binary format")]
    Convert(ConvertArgs),
    #[command(about = "Run BFS or SSSP benchmarks")]
    Run(RunArgs),
    #[command(about = "Draw a violin plot from a results CSV")]
    Plot(PlotArgs),
}

#[derive(Args)]
struct ListArgs {
    #[arg(long, value_enum, default_value = "name")]
    order_by: OrderBy,

    #[arg(long)]
    desc: bool,

    /// Expression like `nodes>1000` or `tags=social`; repeatable
    #[arg(long = "filter")]
    filters: Vec<String>,

    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct DownloadArgs {
    #[arg(short, long)]
    all: bool,

    graphs: Vec<String>,

    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct CleanArgs {
    #[arg(short, long)]
    all: bool,

    /// Only remove archives and partial downloads
    #[arg(long)]
    only_installation: bool,

    graphs: Vec<String>,

    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct InfoArgs {
    graph: String,

    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ConvertArgs {
    /// Converter executable
    converter: PathBuf,

    graphs: Vec<String>,

    #[arg(short, long)]
    all: bool,

    #[arg(short, long)]
    undirected: bool,

    /// Reconvert without asking when the binary file exists
    #[arg(long)]
    always: bool,

    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct RunArgs {
    #[arg(value_enum)]
    algorithm: Algorithm,

    /// Graph files, e.g. `road.mtx`, `road.bin[12]`, `web.mtx[:u]`
    #[arg(required = true)]
    graphs: Vec<String>,

    #[arg(long)]
    source: Option<u64>,

    /// Let the binary pick a new source on every iteration
    #[arg(short, long)]
    random_source: bool,

    #[arg(short = 'n', long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    num_iterations: u64,

    #[arg(short, long)]
    validate: bool,

    /// Folder holding the benchmark executables
    #[arg(short, long)]
    directory: Option<PathBuf>,

    /// Aggregate iterations per graph
    #[arg(short = 'P', long)]
    parse: bool,

    /// Write results as CSV instead of printing a table
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct PlotArgs {
    input: PathBuf,

    output: PathBuf,

    #[arg(long, default_value = "gpu_time_ms")]
    metric: String,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(report) => {
            eprintln!("{report:?}");
            if let Some(gdm) = report.downcast_ref::<GdmError>() {
                return ExitCode::from(map_exit_code(gdm));
            }
            ExitCode::from(1)
        }
    }
}

fn map_exit_code(error: &GdmError) -> u8 {
    match error {
        GdmError::DatasetNotFound(_)
        | GdmError::InvalidFilter(_)
        | GdmError::InvalidGraphSpec(_)
        | GdmError::InvalidManifest { .. }
        | GdmError::ConfigRead(_)
        | GdmError::ConfigParse(_)
        | GdmError::UnsupportedPlotFormat(_) => 2,
        GdmError::Http(_)
        | GdmError::HttpStatus { .. }
        | GdmError::Spawn { .. }
        | GdmError::Conversion { .. }
        | GdmError::BenchmarkFailed { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = ConfigLoader::resolve(cli.config.as_deref())?;
    let root = cli
        .root
        .clone()
        .unwrap_or_else(|| settings.datasets_dir.clone());

    match cli.command {
        Commands::List(args) => run_list(args, &root, settings),
        Commands::Download(args) => run_download(args, &root, settings),
        Commands::Clean(args) => run_clean(args, &root, settings),
        Commands::Info(args) => run_info(args, &root, settings),
        Commands::Convert(args) => run_convert(args, &root, settings),
        Commands::Run(args) => run_bench(args, &settings),
        Commands::Plot(args) => {
            plot::plot_csv(&args.input, &args.output, &args.metric)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn open_app(root: &Path, settings: Settings) -> miette::Result<App<HttpArchiveClient>> {
    let catalog = Catalog::load(root)?;
    let client = HttpArchiveClient::new(settings.connect_timeout)?;
    Ok(App::new(catalog, client, settings))
}

fn progress_sink() -> Box<dyn ProgressSink> {
    if std::io::stderr().is_terminal() {
        Box::new(TerminalProgress::new())
    } else {
        Box::new(QuietProgress)
    }
}

fn run_list(args: ListArgs, root: &Path, settings: Settings) -> miette::Result<ExitCode> {
    let filters = args
        .filters
        .iter()
        .map(|expr| expr.parse::<Filter>())
        .collect::<Result<Vec<_>, _>>()?;
    let app = open_app(root, settings)?;

    if args.json {
        let result = app.list(args.order_by, args.desc, &filters);
        JsonOutput::print(&result).into_diagnostic()?;
    } else {
        let manifests = app.catalog().list(args.order_by, args.desc, &filters);
        print!("{}", printer::list_lines(&manifests));
    }
    Ok(ExitCode::SUCCESS)
}

fn run_download(args: DownloadArgs, root: &Path, settings: Settings) -> miette::Result<ExitCode> {
    let app = open_app(root, settings)?;
    let sink = progress_sink();
    let result = app.download(args.all, &args.graphs, sink.as_ref())?;

    if args.json {
        JsonOutput::print(&result).into_diagnostic()?;
    } else {
        for item in &result.items {
            match (&item.outcome, &item.error) {
                (Some(outcome), _) => println!(
                    "{}: {} files from {} archive ({})",
                    item.name,
                    outcome.files.len(),
                    outcome.format.extension(),
                    printer::abbreviate(outcome.bytes)
                ),
                (None, Some(error)) => println!("{}: failed: {error}", item.name),
                (None, None) => {}
            }
        }
    }

    if result.failures() > 0 {
        return Ok(ExitCode::from(1));
    }
    Ok(ExitCode::SUCCESS)
}

fn run_clean(args: CleanArgs, root: &Path, settings: Settings) -> miette::Result<ExitCode> {
    let mode = if args.only_installation {
        CleanMode::InstallationOnly
    } else {
        CleanMode::Default
    };
    let app = open_app(root, settings)?;
    let result = app.clean(args.all, &args.graphs, mode, &QuietProgress)?;

    if args.json {
        JsonOutput::print(&result).into_diagnostic()?;
    } else {
        for item in &result.items {
            println!("{}: removed {} files", item.name, item.removed);
            for error in &item.errors {
                println!("  {error}");
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run_info(args: InfoArgs, root: &Path, settings: Settings) -> miette::Result<ExitCode> {
    let width = settings.panel_width;
    let app = open_app(root, settings)?;
    let manifest = app.info(&args.graph)?;

    if args.json {
        JsonOutput::print(manifest).into_diagnostic()?;
    } else {
        let printer = width.map(Printer::new).unwrap_or_default();
        println!("{}", printer.render(manifest));
    }
    Ok(ExitCode::SUCCESS)
}

fn run_convert(args: ConvertArgs, root: &Path, settings: Settings) -> miette::Result<ExitCode> {
    let app = open_app(root, settings)?;
    let options = ConvertOptions {
        undirected: args.undirected,
        always: args.always,
    };
    let result = app.convert(
        &SystemCommandRunner,
        &StdinConfirm,
        &args.converter,
        args.all,
        &args.graphs,
        options,
    )?;

    if args.json {
        JsonOutput::print(&result).into_diagnostic()?;
    } else {
        for item in &result.items {
            match &item.conversion {
                Conversion::Converted { output, .. } => {
                    println!("{}: wrote {}", item.name, output.display())
                }
                Conversion::NoMatrixMarket => println!("{}: no .mtx file found", item.name),
                Conversion::Declined { .. } => println!("{}: skipped", item.name),
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run_bench(args: RunArgs, settings: &Settings) -> miette::Result<ExitCode> {
    let graphs = args
        .graphs
        .iter()
        .map(|spec| spec.parse::<GraphSpec>())
        .collect::<Result<Vec<_>, _>>()?;

    let mut options = RunOptions::new(args.algorithm);
    options.directory = args
        .directory
        .unwrap_or_else(|| settings.bench_dir.clone());
    options.iterations = args.num_iterations as usize;
    options.source = args.source;
    options.random_source = args.random_source;
    options.validate = args.validate;

    let runner = SystemCommandRunner;
    let rows = BenchRunner::new(&runner, options).run(&graphs)?;
    let results = if args.parse {
        ResultSet::Aggregated(report::aggregate(&rows))
    } else {
        ResultSet::Raw(rows)
    };

    match args.output {
        Some(path) => {
            results.write_csv(&path)?;
            info!(output = %path.display(), "results written");
        }
        None => println!("{}", results.to_table()),
    }
    Ok(ExitCode::SUCCESS)
}
