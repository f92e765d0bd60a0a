mod cli;
mod config;
mod form;
mod render;
mod tracker;
mod widget;

use anyhow::Result;
use clap::Parser;
use std::cell::RefCell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "codetrack", about = "Track who is using the shared gym access codes")]
pub struct Args {
    #[arg(long, help = "Config file path")]
    pub config: Option<PathBuf>,

    #[arg(
        long = "code",
        value_name = "NAME",
        action = clap::ArgAction::Append,
        help = "Tracked code (repeat to list several; replaces configured codes)"
    )]
    pub codes: Vec<String>,

    #[arg(long, help = "Show times in UTC instead of local time")]
    pub utc: bool,

    #[arg(long, help = "Verbose output (log check-ins and check-outs)")]
    pub verbose: bool,

    #[arg(long, help = "Debug output (log ignored input and config loading)")]
    pub debug: bool,
}

fn init_logging(args: &Args) {
    let level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_logging(&args);

    let mut cfg = if let Some(config_path) = &args.config {
        let mut cfg = config::Config::with_default_codes();
        cfg.merge(config::ConfigLayer::load_from(config_path)?);
        cfg
    } else {
        config::Config::load()?
    };

    if !args.codes.is_empty() {
        cfg.codes = args.codes.clone();
    }
    if args.utc {
        cfg.display.utc = true;
    }

    if let Err(errors) = cfg.validate() {
        for e in &errors {
            eprintln!("Config error {}", e);
        }
        return Err(anyhow::anyhow!(
            "Invalid configuration ({} error(s))",
            errors.len()
        ));
    }

    log::debug!("tracking codes: {:?}", cfg.codes);

    let ctx = cli::Context {
        widget: RefCell::new(widget::Widget::new(&cfg)),
        args,
    };

    cli::run_repl(ctx)
}
