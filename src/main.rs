//! CLI entry point for socialctl.

use anyhow::Result;
use clap::Parser;
use socialctl_core::runner::Action;
use tracing::debug;

mod app;
mod app_config;
mod cli;
mod commands;

use app::exit_handler::ProcessExit;
use app::settings::{EffectiveSettings, load_accounts, register_accounts};
use app::terminal;
use cli::{Args, Command};

#[tokio::main]
async fn main() {
    // Parse CLI arguments first (before tracing, so --help works without logs).
    // Usage errors exit 1 like every other failure.
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            std::process::exit(if err.use_stderr() { 1 } else { 0 });
        }
    };

    let exit = match run(args).await {
        Ok(exit) => exit,
        Err(err) => {
            eprintln!("error: {err:#}");
            ProcessExit::Failure
        }
    };
    std::process::exit(exit.code());
}

async fn run(args: Args) -> Result<ProcessExit> {
    // A broken config file must not hide the log level the user asked for.
    let file_config = app_config::load_default_file_config();
    let configured_verbosity = file_config
        .as_ref()
        .ok()
        .and_then(|config| config.verbosity);
    terminal::init_tracing(terminal::default_log_level(
        args.verbose,
        args.quiet,
        configured_verbosity,
    ));
    let file_config = file_config?;

    debug!(?args, "CLI arguments parsed");
    let settings = EffectiveSettings::resolve(&args.session, &file_config);
    debug!(
        base_url = %settings.client.base_url(),
        concurrency = settings.concurrency,
        max_retries = settings.max_retries,
        rate_limit_ms = settings.rate_limit_ms,
        "effective settings"
    );

    let action = match args.command {
        Command::Decode { targets } => return Ok(commands::run_decode_command(&targets)),
        Command::Accounts => {
            let set = register_accounts(&args.session, &settings)?;
            return commands::run_accounts_command(&set, &args.session.accounts);
        }
        Command::Follow { username } => Action::Follow { username },
        Command::Like { post } => Action::Like { post },
        Command::Comment { post, text } => Action::Comment { post, text },
        Command::Scrape { username } => Action::Scrape { username },
    };

    let accounts = load_accounts(&args.session, &settings)?;
    commands::run_action_command(action, &accounts, &settings, args.quiet).await
}
