use std::io::{self, Write};

use beni_core::{CommandContext, ConfigOverrides, GenerateRequest, GlobalOptions};
use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use tracing::debug;

mod cli;

use cli::BeniCli;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = BeniCli::parse();
    init_tracing(cli.trace, cli.verbose, cli.quiet);

    let global = GlobalOptions { quiet: cli.quiet };
    let overrides = ConfigOverrides {
        cache_dir: cli.cache_dir.clone(),
        max_age: cli.max_age,
        offline: cli.offline,
    };
    let request = GenerateRequest {
        paths: cli.paths.clone(),
        format: cli.format.into(),
        deps: cli.deps.into(),
        extras: cli.extras.clone(),
        ignore: cli.ignore.clone(),
    };
    debug!(
        paths = ?request.paths,
        format = %request.format,
        deps = %request.deps,
        "starting"
    );

    let ctx = CommandContext::from_env(&global, &overrides).map_err(|err| eyre!("{err:?}"))?;
    let output = beni_core::generate(&ctx, &request).map_err(|err| eyre!("{err:?}"))?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn init_tracing(trace: bool, verbose: u8, quiet: bool) {
    let level = if trace {
        "trace"
    } else if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = format!("beni={level},beni_core={level},beni_domain={level},beni_cli={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
