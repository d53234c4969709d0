//! `perspective` command line: annotate page documents and value single amounts.

use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use perspective_core::{
    equivalence, parse_amount, scan, ConversionMode, IncomeBreakdown, ValuationConfig,
};
use perspective_engine::{
    run_pass, DocumentNode, EngineConfig, EngineError, EngineState, JsonFileStore, MemoryTree,
    Settings,
};
use tracing_subscriber::{fmt, EnvFilter};

fn valuation_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("mode")
                .long("mode")
                .value_parser(value_parser!(ConversionMode))
                .help("Equivalence kind: time, item or life"),
        )
        .arg(
            Arg::new("income")
                .long("income")
                .value_parser(value_parser!(f64))
                .help("Monthly income in rupees"),
        )
        .arg(
            Arg::new("item-name")
                .long("item-name")
                .help("Item for item equivalence"),
        )
        .arg(
            Arg::new("item-cost")
                .long("item-cost")
                .value_parser(value_parser!(f64))
                .help("Unit cost of the item in rupees"),
        )
        .arg(
            Arg::new("settings")
                .long("settings")
                .help("JSON settings file to start from"),
        )
}

fn cli() -> Command {
    Command::new("perspective")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Annotate rupee prices with what they cost you")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("More log output (-v debug, -vv trace)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .action(ArgAction::SetTrue)
                .global(true)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(valuation_args(
            Command::new("scan")
                .about("Run one pass over a JSON page document")
                .arg(
                    Arg::new("document")
                        .required(true)
                        .help("Path to the page document"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output the report and annotated document as JSON"),
                ),
        ))
        .subcommand(valuation_args(
            Command::new("value")
                .about("Print the equivalence of one amount")
                .arg(
                    Arg::new("amount")
                        .required(true)
                        .help("Amount in rupees, e.g. 1,234.50"),
                ),
        ))
        .subcommand(
            Command::new("tokens")
                .about("List every price token in a text")
                .arg(Arg::new("text").required(true).help("Text to scan")),
        )
        .subcommand(
            Command::new("breakdown")
                .about("Split a monthly income into weekly, daily and hourly")
                .arg(
                    Arg::new("income")
                        .required(true)
                        .value_parser(value_parser!(f64))
                        .help("Monthly income in rupees"),
                ),
        )
}

fn init_tracing(verbosity: u8, json: bool) {
    let filter = match verbosity {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Settings file first, then flags; the result must validate
async fn resolve_config(args: &ArgMatches) -> anyhow::Result<ValuationConfig> {
    let mut settings = match args.get_one::<String>("settings") {
        Some(path) => Settings::load(&JsonFileStore::new(path))
            .await
            .map_err(EngineError::from)
            .with_context(|| format!("reading settings from {path}"))?,
        None => Settings::default(),
    };
    if let Some(mode) = args.get_one::<ConversionMode>("mode") {
        settings.conversion_mode = *mode;
    }
    if let Some(income) = args.get_one::<f64>("income") {
        settings.salary = *income;
    }
    if let Some(name) = args.get_one::<String>("item-name") {
        settings.item_name.clone_from(name);
    }
    if let Some(cost) = args.get_one::<f64>("item-cost") {
        settings.item_cost = *cost;
    }

    let config = settings.valuation_config();
    config
        .validate()
        .map_err(EngineError::from)?;
    Ok(config)
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> anyhow::Result<&'a String> {
    args.get_one::<String>(name)
        .with_context(|| format!("missing <{name}>"))
}

async fn run_scan(args: &ArgMatches) -> anyhow::Result<()> {
    let config = resolve_config(args).await?;
    let path = required(args, "document")?;
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {path}"))?;
    let document: DocumentNode =
        serde_json::from_str(&content).with_context(|| format!("parsing {path}"))?;

    let mut tree = MemoryTree::from_document(&document);
    let mut state = EngineState::new(config);
    let report = run_pass(&mut tree, &mut state, &EngineConfig::new());

    if args.get_flag("json") {
        let output = serde_json::json!({
            "report": report,
            "document": tree.to_document(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", tree.outline());
        println!();
        println!(
            "{} annotated, {} subsumed, {} without a valid amount",
            report.injected, report.subsumed, report.unpriced
        );
    }
    Ok(())
}

async fn run_value(args: &ArgMatches) -> anyhow::Result<()> {
    let config = resolve_config(args).await?;
    let raw = required(args, "amount")?;
    let Some(amount) = parse_amount(raw) else {
        bail!("{raw} is not an amount between ₹1 and ₹10,00,00,000");
    };
    println!("{}", equivalence(amount, &config));
    Ok(())
}

fn run_tokens(args: &ArgMatches) -> anyhow::Result<()> {
    let text = required(args, "text")?;
    let tokens = scan(text);
    if tokens.is_empty() {
        println!("no prices found");
    }
    for token in tokens {
        println!("{}\t{:.2}\t{}", token.raw, token.amount, token.source.as_str());
    }
    Ok(())
}

fn run_breakdown(args: &ArgMatches) -> anyhow::Result<()> {
    let income = *args
        .get_one::<f64>("income")
        .context("missing <income>")?;
    let config = ValuationConfig::new().with_income(income);
    config
        .validate()
        .map_err(EngineError::from)?;

    let breakdown = IncomeBreakdown::from_monthly(income);
    println!("weekly\t₹{:.2}", breakdown.weekly);
    println!("daily\t₹{:.2}", breakdown.daily);
    println!("hourly\t₹{:.2}", breakdown.hourly);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_count("verbose"), matches.get_flag("log-json"));

    match matches.subcommand() {
        Some(("scan", args)) => run_scan(args).await,
        Some(("value", args)) => run_value(args).await,
        Some(("tokens", args)) => run_tokens(args),
        Some(("breakdown", args)) => run_breakdown(args),
        _ => {
            cli().print_help()?;
            Ok(())
        }
    }
}
