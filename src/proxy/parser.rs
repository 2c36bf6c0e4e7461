//! Proxy list parser for loading `host:port` entries

use crate::proxy::models::ProxyAddress;
use crate::Result;
use anyhow::Context;
use log::info;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Parser for plain proxy lists, one `host:port` per line
pub struct ProxyListParser;

impl ProxyListParser {
    /// Parse a single line, trimming surrounding whitespace.
    ///
    /// Lines are kept verbatim otherwise, so a malformed entry still reaches
    /// the checker and is reported as not working.
    pub fn parse_line(line: &str) -> Option<ProxyAddress> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        Some(ProxyAddress::new(line))
    }

    /// Parse proxies from a string, keeping the first occurrence of each address
    pub fn parse_string(content: &str) -> Vec<ProxyAddress> {
        let mut seen = HashSet::new();
        let mut proxies = Vec::new();
        let mut duplicates = 0;

        for proxy in content.lines().filter_map(Self::parse_line) {
            if seen.insert(proxy.clone()) {
                proxies.push(proxy);
            } else {
                duplicates += 1;
            }
        }

        if duplicates > 0 {
            info!("Dropped {} duplicate proxy entries", duplicates);
        }
        proxies
    }

    /// Parse proxies from a file
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Vec<ProxyAddress>> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read proxy list {:?}", path))?;
        Ok(Self::parse_string(&content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_simple_format() {
        let proxy = ProxyListParser::parse_line("192.168.1.1:8080").unwrap();
        assert_eq!(proxy.host_port(), Some(("192.168.1.1", 8080)));
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let proxy = ProxyListParser::parse_line("  192.168.1.1:8080 \t\r").unwrap();
        assert_eq!(proxy.as_str(), "192.168.1.1:8080");
    }

    #[test]
    fn test_parse_empty_line() {
        assert!(ProxyListParser::parse_line("").is_none());
        assert!(ProxyListParser::parse_line("   ").is_none());
    }

    #[test]
    fn test_parse_keeps_malformed_entries() {
        let proxy = ProxyListParser::parse_line("bad-entry").unwrap();
        assert_eq!(proxy.as_str(), "bad-entry");
        assert!(proxy.port().is_none());
    }

    #[test]
    fn test_parse_string() {
        let content = "192.168.1.1:8080\n\n192.168.1.2:80\r\n192.168.1.1:8080\nbad-entry\n";
        let proxies = ProxyListParser::parse_string(content);
        let proxies: Vec<_> = proxies.iter().map(|p| p.as_str()).collect();
        assert_eq!(proxies, vec!["192.168.1.1:8080", "192.168.1.2:80", "bad-entry"]);
    }

    #[test]
    fn test_parse_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proxies.txt");
        let err = ProxyListParser::parse_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to read proxy list"));
    }

    #[test]
    fn test_parse_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"1.1.1.1:80\n2.2.2.2:443\n").unwrap();
        let proxies = ProxyListParser::parse_file(file.path()).unwrap();
        assert_eq!(proxies.len(), 2);
    }
}
