//! Scripted probe client for tests

use crate::proxy::models::ProxyAddress;
use crate::proxy::probe::{ProbeClient, ProbeError, ProbeResponse, ProbeResult};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// What the stub does when asked to probe an address
#[derive(Debug, Clone)]
pub enum Behavior {
    Respond {
        headers: Vec<(&'static str, &'static str)>,
        body: &'static str,
    },
    Status(u16),
    Timeout,
    Panic,
}

impl Behavior {
    pub fn origin() -> Self {
        Behavior::Respond {
            headers: vec![],
            body: r#"{"origin":"1.2.3.4"}"#,
        }
    }
}

pub struct StubClient {
    behaviors: HashMap<String, Vec<Behavior>>,
    fallback: Behavior,
    delays: HashMap<String, Duration>,
    default_delay: Duration,
    calls: Mutex<HashMap<String, usize>>,
    in_flight: AtomicUsize,
    high_water: AtomicUsize,
}

impl StubClient {
    pub fn new(fallback: Behavior) -> Self {
        Self {
            behaviors: HashMap::new(),
            fallback,
            delays: HashMap::new(),
            default_delay: Duration::ZERO,
            calls: Mutex::new(HashMap::new()),
            in_flight: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
        }
    }

    /// Script successive calls for one address; the last entry repeats
    pub fn on(mut self, address: &str, behaviors: Vec<Behavior>) -> Self {
        self.behaviors.insert(address.to_string(), behaviors);
        self
    }

    pub fn delay(mut self, address: &str, delay: Duration) -> Self {
        self.delays.insert(address.to_string(), delay);
        self
    }

    pub fn default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    pub fn calls(&self, address: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(address)
            .copied()
            .unwrap_or(0)
    }

    pub fn high_water(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }

    fn next_behavior(&self, address: &str) -> Behavior {
        let mut calls = self.calls.lock().unwrap();
        let n = calls.entry(address.to_string()).or_insert(0);
        let index = *n;
        *n += 1;

        match self.behaviors.get(address) {
            Some(script) if !script.is_empty() => script[index.min(script.len() - 1)].clone(),
            _ => self.fallback.clone(),
        }
    }
}

#[async_trait]
impl ProbeClient for StubClient {
    async fn probe(&self, address: &ProxyAddress) -> ProbeResult {
        let behavior = self.next_behavior(address.as_str());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now, Ordering::SeqCst);

        let delay = self
            .delays
            .get(address.as_str())
            .copied()
            .unwrap_or(self.default_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match behavior {
            Behavior::Respond { headers, body } => {
                let mut map = HeaderMap::new();
                for (name, value) in headers {
                    map.insert(
                        HeaderName::from_bytes(name.as_bytes()).unwrap(),
                        HeaderValue::from_static(value),
                    );
                }
                Ok(ProbeResponse {
                    headers: map,
                    body: body.as_bytes().to_vec(),
                })
            }
            Behavior::Status(code) => Err(ProbeError::Status(code)),
            Behavior::Timeout => Err(ProbeError::Timeout(Duration::from_secs(5))),
            Behavior::Panic => panic!("stub probe exploded for {}", address),
        }
    }
}
