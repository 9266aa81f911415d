//! Signer IP address extraction.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use super::patterns::{IPV4, IPV6, IP_MARKER};
use super::{marker_windows, FieldRule, RuleMatch};

/// How far past a marker an address may appear, in bytes.
const WINDOW: usize = 200;

/// Finds an IPv4 or IPv6 address near an IP, signature or certificate marker.
pub struct IpAddressRule;

impl IpAddressRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for IpAddressRule {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldRule for IpAddressRule {
    fn find_all(&self, text: &str) -> Vec<RuleMatch> {
        let mut results: Vec<RuleMatch> = Vec::new();

        for (offset, window) in marker_windows(&IP_MARKER, text, WINDOW) {
            if let Some((start, end, _)) = first_address(window) {
                // Keep the address as written; Display would re-compress IPv6
                let value = &window[start..end];
                let start = offset + start;
                if results.iter().any(|r| r.position.0 == start) {
                    continue;
                }
                results.push(RuleMatch::new(value, start, offset + end));
            }
        }

        results
    }
}

/// First valid address in `window`, by position.
fn first_address(window: &str) -> Option<(usize, usize, IpAddr)> {
    let v4 = IPV4.find_iter(window).filter_map(|m| {
        m.as_str()
            .parse::<Ipv4Addr>()
            .ok()
            .map(|a| (m.start(), m.end(), IpAddr::V4(a)))
    });

    let v6 = IPV6.find_iter(window).filter_map(|m| {
        // A lone leading colon belongs to the label ("IP:2001:db8::1")
        let (skip, candidate) = match m.as_str().strip_prefix(':') {
            Some(rest) if !rest.starts_with(':') => (1, rest),
            _ => (0, m.as_str()),
        };
        let candidate = candidate.trim_end_matches(':');
        if !candidate.chars().any(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let start = m.start() + skip;
        candidate
            .parse::<Ipv6Addr>()
            .ok()
            .map(|a| (start, start + candidate.len(), IpAddr::V6(a)))
    });

    v4.chain(v6).min_by_key(|(start, _, _)| *start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_after_label() {
        let rule = IpAddressRule::new();
        assert_eq!(rule.find("IP: 192.168.1.1").unwrap().value, "192.168.1.1");
    }

    #[test]
    fn test_ipv4_on_next_line() {
        let rule = IpAddressRule::new();
        let text = "IP Address from signature location\n203.0.113.7";
        assert_eq!(rule.find(text).unwrap().value, "203.0.113.7");
    }

    #[test]
    fn test_ipv6_address() {
        let rule = IpAddressRule::new();
        let text = "Signature certificate\nIP 2001:db8:85a3::8a2e:370:7334";
        assert_eq!(rule.find(text).unwrap().value, "2001:db8:85a3::8a2e:370:7334");
    }

    #[test]
    fn test_ipv6_directly_after_label_colon() {
        let rule = IpAddressRule::new();
        assert_eq!(rule.find("IP:2001:db8::1").unwrap().value, "2001:db8::1");
        assert_eq!(
            rule.find("IP Address:2001:db8:85a3::7334").unwrap().value,
            "2001:db8:85a3::7334"
        );
        assert_eq!(rule.find("IP:192.168.1.1").unwrap().value, "192.168.1.1");
        assert_eq!(rule.find("IP: ::1").unwrap().value, "::1");
    }

    #[test]
    fn test_invalid_octets_rejected() {
        let rule = IpAddressRule::new();
        assert!(rule.find("IP: 999.1.1.1").is_none());
    }

    #[test]
    fn test_times_are_not_addresses() {
        let rule = IpAddressRule::new();
        assert!(rule.find("Signature recorded at 14:32:10").is_none());
    }

    #[test]
    fn test_address_without_marker_ignored() {
        let rule = IpAddressRule::new();
        assert!(rule.find("Server 10.0.0.1").is_none());
    }
}
