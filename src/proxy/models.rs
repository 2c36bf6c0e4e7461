//! Proxy data models

use std::fmt;
use std::str::FromStr;

/// A `host:port` proxy entry exactly as it appeared in the input list
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxyAddress(String);

impl ProxyAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into host and port.
    ///
    /// Returns `None` unless the address is exactly one `:`-delimited host and
    /// an integer port.
    pub fn host_port(&self) -> Option<(&str, u16)> {
        let mut parts = self.0.split(':');
        let host = parts.next()?;
        let port = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some((host, port))
    }

    pub fn port(&self) -> Option<u16> {
        self.host_port().map(|(_, port)| port)
    }

    /// Proxy URL handed to the HTTP client
    pub fn url(&self) -> String {
        format!("http://{}", self.0)
    }
}

impl fmt::Display for ProxyAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Protocol class derived from the proxy port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyClass {
    Http,
    Https,
    Socks,
    Unknown,
}

impl fmt::Display for ProxyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyClass::Http => write!(f, "HTTP"),
            ProxyClass::Https => write!(f, "HTTPS"),
            ProxyClass::Socks => write!(f, "SOCKS"),
            ProxyClass::Unknown => write!(f, "Unknown"),
        }
    }
}

impl FromStr for ProxyClass {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HTTP" => Ok(ProxyClass::Http),
            "HTTPS" => Ok(ProxyClass::Https),
            "SOCKS" => Ok(ProxyClass::Socks),
            "Unknown" => Ok(ProxyClass::Unknown),
            other => Err(anyhow::anyhow!("Invalid proxy type: {}", other)),
        }
    }
}

/// How much client-identifying information a proxy leaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnonymityLevel {
    Transparent,
    Anonymous,
    Elite,
    Unknown,
}

impl fmt::Display for AnonymityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnonymityLevel::Transparent => write!(f, "Transparent Proxy"),
            AnonymityLevel::Anonymous => write!(f, "Anonymous Proxy"),
            AnonymityLevel::Elite => write!(f, "Elite Proxy"),
            AnonymityLevel::Unknown => write!(f, "Unknown"),
        }
    }
}

impl FromStr for AnonymityLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Transparent Proxy" => Ok(AnonymityLevel::Transparent),
            "Anonymous Proxy" => Ok(AnonymityLevel::Anonymous),
            "Elite Proxy" => Ok(AnonymityLevel::Elite),
            "Unknown" => Ok(AnonymityLevel::Unknown),
            other => Err(anyhow::anyhow!("Invalid proxy category: {}", other)),
        }
    }
}

/// Result of probing a single proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub address: ProxyAddress,
    pub reachable: bool,
    pub class: ProxyClass,
    pub anonymity: AnonymityLevel,
}

impl ProbeOutcome {
    pub fn working(address: ProxyAddress, class: ProxyClass, anonymity: AnonymityLevel) -> Self {
        Self {
            address,
            reachable: true,
            class,
            anonymity,
        }
    }

    pub fn unreachable(address: ProxyAddress) -> Self {
        Self {
            address,
            reachable: false,
            class: ProxyClass::Unknown,
            anonymity: AnonymityLevel::Unknown,
        }
    }

    pub fn is_working(&self) -> bool {
        self.reachable
    }

    /// Convert into the persisted form, dropping unreachable outcomes
    pub fn into_record(self) -> Option<WorkingProxyRecord> {
        self.reachable.then(|| WorkingProxyRecord {
            address: self.address,
            class: self.class,
            anonymity: self.anonymity,
        })
    }
}

/// A reachable proxy as written to the report file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingProxyRecord {
    pub address: ProxyAddress,
    pub class: ProxyClass,
    pub anonymity: AnonymityLevel,
}

impl fmt::Display for WorkingProxyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | Type: {} | Category: {}",
            self.address, self.class, self.anonymity
        )
    }
}

impl FromStr for WorkingProxyRecord {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut fields = line.split(" | ");
        let (Some(address), Some(class), Some(anonymity), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(anyhow::anyhow!("Malformed report line: {}", line));
        };

        let class = class
            .strip_prefix("Type: ")
            .ok_or_else(|| anyhow::anyhow!("Missing type field: {}", line))?;
        let anonymity = anonymity
            .strip_prefix("Category: ")
            .ok_or_else(|| anyhow::anyhow!("Missing category field: {}", line))?;

        Ok(Self {
            address: ProxyAddress::new(address),
            class: class.parse()?,
            anonymity: anonymity.parse()?,
        })
    }
}

/// Counts reported once a run has drained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CheckSummary {
    pub total: usize,
    pub working: usize,
    pub not_working: usize,
}
