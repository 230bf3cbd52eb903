mod args;
mod output;

use anyhow::{Context, Result};
use spf_flatten::Flattener;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::args::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    if cli.verify.is_none() && cli.cmd.is_none() {
        Cli::clap_command().print_help()?;
        println!();
        return Ok(());
    }

    let flattener =
        Flattener::from_choice(cli.resolver, cli.flatten_options()).context("DNS resolver")?;

    // --verify prend le pas sur la sous-commande
    if let Some(domain) = cli.verify.as_deref() {
        let report = flattener
            .verify(domain)
            .with_context(|| format!("verify {domain}"))?;
        output::write_report(&report, &cli)?;
        return output::ensure_record_found(&report);
    }

    if let Some(Commands::Flatten { domain, output: out }) = &cli.cmd {
        let result = flattener
            .flatten_domain(domain)
            .with_context(|| format!("flatten {domain}"))?;
        if result.limit_exceeded() {
            tracing::warn!(
                domain = %domain,
                skipped = result.skipped_lookups(),
                "lookup limit reached, flattened record is incomplete"
            );
        }
        output::write_flattened(&result, out.as_deref(), &cli)?;
    }

    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
