use clap::Parser;
use std::io::{self, IsTerminal};
use yabt::cli::commands::{self, CommandContext};
use yabt::cli::{Cli, Commands};
use yabt::config::{self, CliOverrides};
use yabt::logging::init_logging;
use yabt::{StructuredError, YabtError};

fn main() {
    let cli = Cli::parse();

    let overrides = build_cli_overrides(&cli);
    let settings = match config::load_settings(&overrides) {
        Ok(settings) => settings,
        Err(e) => {
            let _ = init_logging(cli.verbose, cli.quiet, None);
            handle_error(&e, cli.json);
        }
    };

    if let Err(e) = init_logging(cli.verbose, cli.quiet, Some(settings.log_format)) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let ctx = CommandContext::new(settings, cli.json, cli.quiet, cli.no_color);

    let result = match &cli.command {
        Commands::Serve(args) => commands::serve::execute(args, &ctx),
        Commands::Item { command } => commands::item::execute(command, &ctx),
        Commands::Comment { command } => commands::comment::execute(command, &ctx),
        Commands::User { command } => commands::user::execute(command, &ctx),
        Commands::Field { command } => commands::field::execute(command, &ctx),
        Commands::Completions(args) => commands::completions::execute(args),
    };

    if let Err(e) = result {
        handle_error(&e, cli.json);
    }
}

/// Handle errors with structured output support.
///
/// When --json is set or stdout is not a TTY, outputs structured JSON to stderr.
/// Otherwise, outputs human-readable error with optional color.
fn handle_error(err: &YabtError, json_mode: bool) -> ! {
    let structured = StructuredError::from_error(err);
    let exit_code = structured.code.exit_code();

    let use_json = json_mode || !io::stdout().is_terminal();

    if use_json {
        let json = structured.to_json();
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
        );
    } else {
        let use_color = io::stderr().is_terminal();
        eprintln!("{}", structured.to_human(use_color));
    }

    std::process::exit(exit_code);
}

fn build_cli_overrides(cli: &Cli) -> CliOverrides {
    CliOverrides {
        db: cli.db.clone(),
        config: cli.config.clone(),
        user: cli.user.clone(),
        bind: match &cli.command {
            Commands::Serve(args) => args.bind.clone(),
            _ => None,
        },
        lock_timeout: cli.lock_timeout,
    }
}
