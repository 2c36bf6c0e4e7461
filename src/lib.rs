//! Proxy Sieve - Concurrent Proxy Checker
//!
//! Probes a list of proxies through an echo endpoint, classifies each
//! working proxy by port and grades how much client identity it leaks.

pub mod proxy;
pub mod tui;

pub use proxy::*;

use log::{info, warn};
use std::path::PathBuf;

/// Application result type
pub type Result<T> = anyhow::Result<T>;

/// Default proxy list path
const DEFAULT_INPUT: &str = "proxies.txt";

/// Default report path
const DEFAULT_OUTPUT: &str = "working_proxies.txt";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Proxy list, one `host:port` per line
    pub input: PathBuf,
    /// Report of working proxies
    pub output: PathBuf,
    /// Probe settings
    pub checker: CheckerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output: PathBuf::from(DEFAULT_OUTPUT),
            checker: CheckerConfig::default(),
        }
    }
}

/// Load the proxy list, probe it and write the report.
///
/// `on_outcome` sees every outcome as soon as it completes. A missing input
/// file fails before any probe starts. If the report cannot be written the
/// working proxies are printed to stdout before the error is returned.
pub async fn run_check<C, F>(config: &Config, client: C, on_outcome: F) -> Result<CheckSummary>
where
    C: ProbeClient + 'static,
    F: FnMut(&ProbeOutcome),
{
    let proxies = ProxyListParser::parse_file(&config.input)?;
    info!("Loaded {} proxies from {:?}", proxies.len(), config.input);

    let checker = ProxyChecker::with_client(config.checker.clone(), client);
    let (records, summary) = proxy::report::aggregate(checker.dispatch(proxies), on_outcome).await;

    info!(
        "Check finished: {} working, {} not working",
        summary.working, summary.not_working
    );

    save_report(config, &records)?;
    Ok(summary)
}

/// Write the report, falling back to stdout so results survive a failed write
pub fn save_report(config: &Config, records: &[WorkingProxyRecord]) -> Result<()> {
    if let Err(e) = proxy::report::write_report(&config.output, records) {
        warn!("Could not save report to {:?}: {:#}", config.output, e);
        for record in records {
            println!("{}", record);
        }
        return Err(e);
    }
    Ok(())
}
