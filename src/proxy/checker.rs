//! Proxy checker module for probing proxies concurrently

use crate::proxy::anonymity;
use crate::proxy::classifier;
use crate::proxy::models::{AnonymityLevel, ProbeOutcome, ProxyAddress};
use crate::proxy::probe::{HttpProbeClient, ProbeClient};
use futures::stream::{self, Stream, StreamExt};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Default timeout for a single probe in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Default number of probes in flight
const DEFAULT_CONCURRENCY: usize = 400;

/// Default echo endpoint to probe through each proxy
const DEFAULT_TEST_URL: &str = "http://httpbin.org/ip";

/// Configuration for proxy checker
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Timeout for each probe attempt
    pub timeout: Duration,
    /// Maximum number of proxies probed at once
    pub concurrency: usize,
    /// Echo URL to test proxies against
    pub test_url: String,
    /// Grade anonymity from the reachability response instead of probing again
    pub single_request: bool,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            test_url: DEFAULT_TEST_URL.to_string(),
            single_request: false,
        }
    }
}

impl CheckerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_test_url(mut self, url: String) -> Self {
        self.test_url = url;
        self
    }

    pub fn with_single_request(mut self, single_request: bool) -> Self {
        self.single_request = single_request;
        self
    }

    /// Build the production probe client described by this configuration
    pub fn http_client(&self) -> HttpProbeClient {
        HttpProbeClient::new(self.test_url.clone(), self.timeout)
    }
}

/// Proxy checker running probe tasks under a concurrency ceiling
pub struct ProxyChecker<C> {
    config: CheckerConfig,
    client: Arc<C>,
}

impl ProxyChecker<HttpProbeClient> {
    /// Create a checker probing over HTTP as configured
    pub fn with_config(config: CheckerConfig) -> Self {
        let client = config.http_client();
        Self::with_client(config, client)
    }
}

impl<C: ProbeClient + 'static> ProxyChecker<C> {
    /// Create a checker around any probe client
    pub fn with_client(config: CheckerConfig, client: C) -> Self {
        Self {
            config,
            client: Arc::new(client),
        }
    }

    /// Probe one proxy and grade it.
    ///
    /// Unreachable proxies report `Unknown` for both class and anonymity. A
    /// failed second probe only downgrades anonymity.
    pub async fn check_proxy(&self, address: ProxyAddress) -> ProbeOutcome {
        let first = match self.client.probe(&address).await {
            Ok(response) => response,
            Err(e) => {
                debug!("{} not working: {}", address, e);
                return ProbeOutcome::unreachable(address);
            }
        };

        let class = classifier::classify(&address);

        let anonymity = if self.config.single_request {
            anonymity::evaluate(&first)
        } else {
            match self.client.probe(&address).await {
                Ok(response) => anonymity::evaluate(&response),
                Err(e) => {
                    debug!("{} anonymity probe failed: {}", address, e);
                    AnonymityLevel::Unknown
                }
            }
        };

        ProbeOutcome::working(address, class, anonymity)
    }

    /// Probe every address, yielding outcomes in completion order.
    ///
    /// At most `concurrency` probe tasks run at once; each completion admits
    /// the next address from the backlog. Repeated addresses are probed once,
    /// so every distinct address yields exactly one outcome. A task that
    /// panics yields an unreachable outcome for its address.
    pub fn dispatch(
        &self,
        addresses: Vec<ProxyAddress>,
    ) -> impl Stream<Item = ProbeOutcome> + Send + 'static {
        let limit = self.config.concurrency.max(1);
        let checker = self.clone();

        let mut seen = HashSet::with_capacity(addresses.len());
        let addresses: Vec<_> = addresses
            .into_iter()
            .filter(|address| seen.insert(address.clone()))
            .collect();

        info!(
            "Dispatching {} proxies with concurrency {}",
            addresses.len(),
            limit
        );

        stream::iter(addresses)
            .map(move |address| {
                let checker = checker.clone();
                async move {
                    let task = {
                        let address = address.clone();
                        tokio::spawn(async move { checker.check_proxy(address).await })
                    };
                    match task.await {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            warn!("Probe task for {} aborted: {}", address, e);
                            ProbeOutcome::unreachable(address)
                        }
                    }
                }
            })
            .buffer_unordered(limit)
    }

    /// Run `dispatch` on a background task and deliver outcomes over a channel.
    ///
    /// The channel closes once every outcome has been sent.
    pub fn check_proxies_stream(&self, addresses: Vec<ProxyAddress>) -> mpsc::Receiver<ProbeOutcome> {
        let (tx, rx) = mpsc::channel(self.config.concurrency.max(1));
        let outcomes = self.dispatch(addresses);

        tokio::spawn(async move {
            let mut outcomes = Box::pin(outcomes);
            while let Some(outcome) = outcomes.next().await {
                if tx.send(outcome).await.is_err() {
                    debug!("Outcome receiver dropped, stopping dispatch");
                    break;
                }
            }
        });

        rx
    }
}

impl<C> Clone for ProxyChecker<C> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            client: Arc::clone(&self.client),
        }
    }
}
