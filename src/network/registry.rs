//! Registry of peer nodes
//!
//! Addresses are accepted either as full URLs (`http://10.0.0.7:5000/`) or
//! bare authorities (`10.0.0.7:5000`) and stored as `host[:port]`.

use std::collections::HashSet;
use thiserror::Error;

/// Registration errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Invalid node address: {0:?}")]
    InvalidAddress(String),
}

/// Set of known peer addresses
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    nodes: HashSet<String>,
}

/// Reduce a URL or bare address to its `host[:port]` authority
pub fn parse_node_address(address: &str) -> Result<String, RegistryError> {
    let invalid = || RegistryError::InvalidAddress(address.to_string());

    let trimmed = address.trim();
    let rest = match trimmed.split_once("://") {
        Some((scheme, rest)) if !scheme.is_empty() => rest,
        Some(_) => return Err(invalid()),
        None => trimmed,
    };

    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    // Drop any userinfo
    let authority = authority.rsplit('@').next().unwrap_or_default();

    if authority.is_empty() || authority.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    if let Some((host, port)) = authority.rsplit_once(':') {
        // IPv6 literals without a port contain colons but end in ']'
        let is_bare_ipv6 = authority.starts_with('[') && authority.ends_with(']');
        if !is_bare_ipv6 && (host.is_empty() || port.parse::<u16>().is_err()) {
            return Err(invalid());
        }
    }

    Ok(authority.to_string())
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node; returns `false` if it was already known
    pub fn register_node(&mut self, address: &str) -> Result<bool, RegistryError> {
        let node = parse_node_address(address)?;
        let added = self.nodes.insert(node.clone());
        if added {
            log::info!("Registered peer node {}", node);
        }
        Ok(added)
    }

    /// Current peer addresses, sorted for stable output
    pub fn nodes(&self) -> Vec<String> {
        let mut nodes: Vec<String> = self.nodes.iter().cloned().collect();
        nodes.sort();
        nodes
    }

    pub fn contains(&self, address: &str) -> bool {
        self.nodes.contains(address)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_addresses() {
        assert_eq!(
            parse_node_address("http://192.168.0.5:5000").unwrap(),
            "192.168.0.5:5000"
        );
        assert_eq!(
            parse_node_address("http://192.168.0.5:5000/chain?x=1").unwrap(),
            "192.168.0.5:5000"
        );
        assert_eq!(parse_node_address("192.168.0.5:5000").unwrap(), "192.168.0.5:5000");
        assert_eq!(parse_node_address(" localhost:5001 ").unwrap(), "localhost:5001");
        assert_eq!(parse_node_address("peer.example").unwrap(), "peer.example");
        assert_eq!(parse_node_address("http://[::1]:5000").unwrap(), "[::1]:5000");
    }

    #[test]
    fn test_reject_malformed_addresses() {
        for bad in ["", "   ", "http://", "://host:1", "host:port", ":5000", "a b:5000"] {
            assert_eq!(
                parse_node_address(bad),
                Err(RegistryError::InvalidAddress(bad.to_string())),
                "{:?}",
                bad
            );
        }
    }

    #[test]
    fn test_register_deduplicates() {
        let mut registry = NodeRegistry::new();

        assert!(registry.register_node("http://10.0.0.1:5000").unwrap());
        assert!(!registry.register_node("10.0.0.1:5000").unwrap());
        assert!(registry.register_node("10.0.0.2:5000").unwrap());

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("10.0.0.1:5000"));
        assert_eq!(registry.nodes(), vec!["10.0.0.1:5000", "10.0.0.2:5000"]);
    }

    #[test]
    fn test_register_rejects_invalid() {
        let mut registry = NodeRegistry::new();
        assert!(registry.register_node("not a node").is_err());
        assert!(registry.is_empty());
    }
}
