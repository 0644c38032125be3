//! ldap-quota: look up a user's filesystem quota in LDAP
//!
//! # Usage
//!
//! ```bash
//! # Use a config file
//! ldap-quota --config /etc/ldap-quota.toml
//!
//! # Override the target entry
//! ldap-quota --config /etc/ldap-quota.toml --uid 110
//!
//! # No config file
//! ldap-quota --url ldap://192.168.189.156:389 --base ou=people,dc=iasbs,dc=ac,dc=ir --uid 110
//! ```

use anyhow::Context;
use clap::{Parser, ValueEnum};
use ldap_quota::report::{self, OutputFormat};
use ldap_quota::{lookup_quota, LookupConfig, QuotaError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ldap-quota")]
#[command(about = "Look up a filesystem quota stored in LDAP", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory URL (e.g., ldap://localhost:389)
    #[arg(long)]
    url: Option<String>,

    /// Search base DN
    #[arg(short, long)]
    base: Option<String>,

    /// uidNumber of the target entry
    #[arg(short, long)]
    uid: Option<u32>,

    /// Full search filter (overrides --uid)
    #[arg(long)]
    filter: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        }
    }
}

impl Cli {
    fn load_config(&self) -> Result<LookupConfig, QuotaError> {
        let mut config = match &self.config {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                LookupConfig::from_file(path)?
            }
            None => {
                info!("No config file specified, using defaults");
                LookupConfig::development()
            }
        };

        if let Some(url) = &self.url {
            config.directory.url = url.clone();
        }
        if let Some(base) = &self.base {
            config.search.base_dn = base.clone();
        }
        if let Some(uid) = self.uid {
            config.search.uid_number = uid;
        }
        if let Some(filter) = &self.filter {
            config.search.filter = Some(filter.clone());
        }

        Ok(config)
    }
}

async fn run(cli: &Cli) -> anyhow::Result<String> {
    let config = cli
        .load_config()
        .context("Failed to load configuration")?;
    debug!(
        "Looking up {} under {} on {}",
        config.search.filter(),
        config.search.base_dn,
        config.directory.url
    );

    let outcome = lookup_quota(&config).await?;
    Ok(report::render(&outcome, cli.format.into())?)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ldap_quota=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(&cli).await {
        Ok(report) => {
            print!("{}", report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            debug!("Lookup failed: {:?}", e);
            eprintln!("{:#}", e);
            let code = e
                .downcast_ref::<QuotaError>()
                .map(QuotaError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}
