//! Proxy module for probing and grading proxies
//!
//! This module provides functionality for:
//! - Loading `host:port` proxy lists
//! - Classifying proxies by port and grading their anonymity
//! - Probing many proxies concurrently under a fixed ceiling
//! - Aggregating working proxies into a report file

pub mod anonymity;
pub mod checker;
pub mod classifier;
pub mod models;
pub mod parser;
pub mod probe;
pub mod report;

#[cfg(test)]
pub(crate) mod testing;

pub use checker::{CheckerConfig, ProxyChecker};
pub use models::{
    AnonymityLevel, CheckSummary, ProbeOutcome, ProxyAddress, ProxyClass, WorkingProxyRecord,
};
pub use parser::ProxyListParser;
pub use probe::{HttpProbeClient, ProbeClient, ProbeError, ProbeResponse, ProbeResult};
pub use report::ReportAggregator;
