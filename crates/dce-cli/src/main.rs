use anyhow::Context;
use clap::{value_parser, Arg, ArgMatches, Command};
use dce_cli::commands::{self, IngestOptions};
use dce_lifecycle::{EditingContext, EngineConfig};
use dce_model::ContractExpectation;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("dce")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Draft contract engine: extract, validate and diff assistant-authored API drafts")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Engine configuration (TOML)"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .help("Log filter, e.g. debug or dce_lifecycle=trace (overrides RUST_LOG)"),
        )
        .subcommand(
            Command::new("check")
                .about("Check a response against an output contract")
                .arg(
                    Arg::new("contract")
                        .long("contract")
                        .required(true)
                        .value_parser(value_parser!(ContractExpectation))
                        .help("api_draft, cep_draft, screen_patch or sim_draft"),
                )
                .arg(input_arg()),
        )
        .subcommand(
            Command::new("extract")
                .about("Print every JSON candidate found in a response")
                .arg(input_arg()),
        )
        .subcommand(
            Command::new("ingest")
                .about("Run a complete response through the draft lifecycle")
                .arg(input_arg())
                .arg(
                    Arg::new("base")
                        .long("base")
                        .value_parser(value_parser!(PathBuf))
                        .help("Draft currently in the form (JSON)"),
                )
                .arg(
                    Arg::new("context")
                        .long("context")
                        .default_value("new")
                        .help("Editing context: new or an entity id"),
                )
                .arg(
                    Arg::new("store")
                        .long("store")
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON file to persist drafts in"),
                ),
        )
        .subcommand(
            Command::new("sql")
                .about("Run the read-only SQL guard")
                .arg(Arg::new("query").required(true).help("SQL text")),
        )
        .subcommand(
            Command::new("diff")
                .about("List changes between two drafts")
                .arg(
                    Arg::new("draft")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("baseline")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
}

fn input_arg() -> Arg {
    Arg::new("file")
        .value_parser(value_parser!(PathBuf))
        .help("Input file (stdin when omitted)")
}

fn init_tracing(level: Option<&String>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_input(args: &ArgMatches) -> anyhow::Result<String> {
    match args.get_one::<PathBuf>("file") {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("reading stdin")?;
            Ok(text)
        }
    }
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<EngineConfig> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn run(matches: &ArgMatches, config: EngineConfig, out: &mut impl Write) -> anyhow::Result<bool> {
    match matches.subcommand() {
        Some(("check", args)) => {
            let contract = *args
                .get_one::<ContractExpectation>("contract")
                .context("missing --contract")?;
            commands::check(contract, &read_input(args)?, out)
        }
        Some(("extract", args)) => commands::extract(&read_input(args)?, out),
        Some(("ingest", args)) => {
            let base = args
                .get_one::<PathBuf>("base")
                .map(|path| commands::read_draft(path))
                .transpose()?;
            let context = args
                .get_one::<String>("context")
                .map_or(EditingContext::New, |label| EditingContext::from_label(label));
            let options = IngestOptions {
                base,
                context,
                store: args.get_one::<PathBuf>("store").cloned(),
            };
            commands::ingest(config, &read_input(args)?, options, out)
        }
        Some(("sql", args)) => {
            let query = args.get_one::<String>("query").context("missing query")?;
            commands::sql(query, out)
        }
        Some(("diff", args)) => {
            let draft = args.get_one::<PathBuf>("draft").context("missing draft")?;
            let baseline = args
                .get_one::<PathBuf>("baseline")
                .context("missing baseline")?;
            commands::diff_files(draft, baseline, out)
        }
        _ => unreachable!("subcommand_required"),
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let matches = cli().get_matches();
    init_tracing(matches.get_one::<String>("log-level"));

    let config = load_config(&matches)?;
    tracing::debug!(?config, "configuration loaded");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let ok = run(&matches, config, &mut out)?;

    out.flush()?;
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
