use anyhow::Result;
use clap::{Parser, Subcommand};
use proxy_sieve::{
    classifier, run_check, tui::ProxyCheckerApp, CheckSummary, CheckerConfig, Config,
    ProbeOutcome, ProxyChecker, ProxyListParser,
};
use std::path::PathBuf;
use std::time::Duration;

/// A concurrent proxy checker that grades reachability, type and anonymity
#[derive(Parser)]
#[command(name = "proxy-sieve")]
#[command(about = "A concurrent proxy checker that grades reachability, type and anonymity")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check proxies and save the working ones
    Check {
        /// Input file containing one host:port per line
        #[arg(default_value = "proxies.txt")]
        input: PathBuf,
        /// Output file for working proxies
        #[arg(short, long, default_value = "working_proxies.txt")]
        output: PathBuf,
        /// Maximum number of proxies probed at once
        #[arg(short = 'n', long, default_value = "400")]
        concurrency: usize,
        /// Timeout per probe in seconds
        #[arg(long, default_value = "5")]
        timeout: u64,
        /// Echo URL to probe through each proxy
        #[arg(long, default_value = "http://httpbin.org/ip")]
        test_url: String,
        /// Grade anonymity from the reachability response instead of probing twice
        #[arg(long)]
        single_request: bool,
        /// Show progress in an interactive TUI
        #[arg(long)]
        tui: bool,
    },
    /// Parse a proxy list and show each entry's port-derived type
    Parse {
        /// Input file containing one host:port per line
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        None => check(Config::default(), false).await?,
        Some(Commands::Check {
            input,
            output,
            concurrency,
            timeout,
            test_url,
            single_request,
            tui,
        }) => {
            let config = Config {
                input,
                output,
                checker: CheckerConfig::new()
                    .with_concurrency(concurrency)
                    .with_timeout(Duration::from_secs(timeout))
                    .with_test_url(test_url)
                    .with_single_request(single_request),
            };
            check(config, tui).await?;
        }
        Some(Commands::Parse { input }) => {
            let proxies = ProxyListParser::parse_file(&input)?;
            println!("Parsed {} proxies from {:?}", proxies.len(), input);
            for proxy in &proxies {
                println!("{} | Type: {}", proxy, classifier::classify(proxy));
            }
        }
    }

    Ok(())
}

async fn check(config: Config, tui: bool) -> Result<()> {
    let summary = if tui {
        let proxies = ProxyListParser::parse_file(&config.input)?;
        let checker = ProxyChecker::with_config(config.checker.clone());
        ProxyCheckerApp::new(proxies, checker, config.clone())
            .run()
            .await?
    } else {
        println!(
            "Checking proxies from {:?} with concurrency {}, timeout {}s",
            config.input,
            config.checker.concurrency,
            config.checker.timeout.as_secs()
        );
        println!("Test URL: {}", config.checker.test_url);
        println!();

        let client = config.checker.http_client();
        run_check(&config, client, print_outcome).await?
    };

    print_summary(&config, &summary);
    Ok(())
}

fn print_outcome(outcome: &ProbeOutcome) {
    if outcome.is_working() {
        println!("Working proxy: {}", outcome.address);
        println!("  Type: {}", outcome.class);
        println!("  Category: {}", outcome.anonymity);
    } else {
        println!("Not working: {}", outcome.address);
    }
}

fn print_summary(config: &Config, summary: &CheckSummary) {
    println!();
    println!(
        "Results: {} working, {} not working",
        summary.working, summary.not_working
    );
    println!("Working proxies have been saved to {:?}", config.output);
}
