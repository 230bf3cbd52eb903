use clap::{Parser, Subcommand};
use spf_flatten::{FlattenOptions, LOOKUP_LIMIT, ResolverChoice};

#[derive(Parser)]
#[command(name = "spf-flatten-cli", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Option<Commands>,

    /// verify the SPF record of DOMAIN and print a report
    #[arg(long, value_name = "DOMAIN")]
    pub verify: Option<String>,

    /// format: human|json|csv
    #[arg(long, default_value = "human")]
    pub format: String,

    /// DNS servers: google|cloudflare|quad9|system
    #[arg(long, default_value = "google")]
    pub resolver: ResolverChoice,

    /// maximum number of TXT lookups per record tree
    #[arg(long, default_value_t = LOOKUP_LIMIT)]
    pub lookup_limit: usize,

    /// log level (error, warn, info, debug, trace); RUST_LOG wins when set
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// flatten the SPF record of a domain
    Flatten {
        domain: String,
        /// write the flattened record to this file instead of stdout
        output: Option<String>,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn clap_command() -> clap::Command {
        <Self as clap::CommandFactory>::command()
    }

    pub fn flatten_options(&self) -> FlattenOptions {
        FlattenOptions::new().with_lookup_limit(self.lookup_limit)
    }
}
