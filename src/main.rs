mod card;
mod config;
mod error;
mod export;
mod extract;
mod qr;
mod render;
mod source;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use card::CardView;
use config::Config;
use render::Format;
use source::Source;

const LOG_ENV: &str = "BIZCARD_LOG";

#[derive(Parser, Debug)]
#[command(name = "bizcard", about = "Render a personal business card from a vCard file")]
struct Cli {
    /// Configuration file (defaults to <config dir>/bizcard/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log debug messages to stderr
    #[arg(long, short = 'v', global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a vCard and print the card
    Show(ShowArgs),
    /// Save the vCard as <Full_Name>.vcf
    Save(SaveArgs),
    /// Generate a QR code pointing at the card page
    Qr(QrArgs),
}

#[derive(Args, Debug)]
struct ShowArgs {
    /// vCard file path or http(s) URL (defaults to `source` from config)
    #[arg(value_name = "SOURCE")]
    source: Option<String>,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Args, Debug)]
struct SaveArgs {
    /// vCard file path or http(s) URL (defaults to `source` from config)
    #[arg(value_name = "SOURCE")]
    source: Option<String>,

    /// Directory the file is written to
    #[arg(long, value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,
}

#[derive(Args, Debug)]
struct QrArgs {
    /// Data to encode (defaults to `qr.data` from config)
    #[arg(value_name = "DATA")]
    data: Option<String>,

    /// PNG output path (defaults to `qr.output` from config)
    #[arg(long, short = 'o', value_name = "PATH")]
    output: Option<PathBuf>,

    /// Logo placed in the centre of the code
    #[arg(long, value_name = "PATH")]
    logo: Option<PathBuf>,

    /// Print the code to the terminal instead of writing a PNG
    #[arg(long, default_value_t = false)]
    terminal: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = config::load(cli.config.as_deref())?;
    if let Some(path) = &config.config_path {
        debug!(path = %path.display(), "loaded configuration");
    }
    debug!(slots = ?config.links.names().collect::<Vec<_>>(), "link slots");

    match cli.command {
        Command::Show(args) => handle_show(args, &config),
        Command::Save(args) => handle_save(args, &config),
        Command::Qr(args) => handle_qr(args, &config),
    }
}

fn resolve_source(arg: Option<String>, config: &Config) -> Result<Source> {
    let raw = arg
        .or_else(|| config.source.clone())
        .ok_or_else(|| anyhow!("no vCard source given and `source` is not set in configuration"))?;
    Ok(Source::parse(&raw))
}

/// Load the vCard text; load failures are reported apart from parsing.
fn load_text(source: &Source) -> Result<String> {
    source::load(source).context("error loading vCard data")
}

fn handle_show(args: ShowArgs, config: &Config) -> Result<()> {
    let source = resolve_source(args.source, config)?;
    let text = load_text(&source)?;

    let record = extract::extract(&text);
    let view = CardView::bind(&record, &config.links, &config.contact);
    print!("{}", render::render(args.format, &record, &view)?);
    Ok(())
}

fn handle_save(args: SaveArgs, config: &Config) -> Result<()> {
    let source = resolve_source(args.source, config)?;
    let text = load_text(&source)?;

    let record = extract::extract(&text);
    let view = CardView::bind(&record, &config.links, &config.contact);
    let path = export::save(&text, &view.download_name, &args.out_dir)?;
    println!("Saved {}", path.display());
    Ok(())
}

fn handle_qr(args: QrArgs, config: &Config) -> Result<()> {
    let data = args
        .data
        .or_else(|| config.qr.data.clone())
        .ok_or_else(|| anyhow!("no QR data given and `qr.data` is not set in configuration"))?;

    if args.terminal {
        print!("{}", qr::render_terminal(&data)?);
        return Ok(());
    }

    let mut settings = qr::QrSettings::from_config(data, &config.qr);
    if let Some(logo) = args.logo {
        settings.logo = Some(config::expand_tilde(&logo));
    }
    let output = args.output.unwrap_or_else(|| config.qr.output.clone());

    let img = qr::render_png(&settings)?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    img.save(&output)
        .with_context(|| format!("failed to write QR image to {}", output.display()))?;
    println!("QR generated: {}", output.display());
    Ok(())
}
