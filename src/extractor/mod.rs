//! Field extraction from scraped alert text
//!
//! The alert window is scraped into a flat bag of strings. This module
//! reassembles them into an [`AlertRecord`] by testing each fragment against
//! a fixed, ordered list of predicates:
//!
//! 1. IPv4 address
//! 2. `<port> (TCP|UDP)`
//! 3. 4-6 digit pid
//! 4. absolute path
//! 5. URL or `-flag` arguments
//! 6. reverse DNS hostname
//! 7. bare process name
//!
//! A fragment belongs to the first predicate it satisfies. If that field is
//! already filled, the fragment is kept only in `raw_fragments`.

pub mod fingerprint;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// UI chrome that never carries connection details
const SKIP_LIST: &[&str] = &[
    "lulu",
    "lulu alert",
    "process info",
    "process information",
    "connection info",
    "connection information",
    "details & options",
    "details and options",
    "rule scope",
    "rule duration",
    "remote endpoint",
    "process lifetime",
    "allow",
    "block",
    "always",
    "temporarily",
];

/// Tokens that look like names but are buttons, menu items or protocol words
const NAME_STOP_WORDS: &[&str] = &[
    "alert",
    "allow",
    "block",
    "always",
    "once",
    "process",
    "endpoint",
    "options",
    "details",
    "rule",
    "scope",
    "duration",
    "tcp",
    "udp",
    "unknown",
    "none",
    "ok",
    "cancel",
    "lulu",
];

const MAX_NAME_LEN: usize = 30;
const MAX_LABEL_LEN: usize = 24;

/// Structured view of one alert window
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertRecord {
    /// Fragments as scraped, in scrape order
    pub raw_fragments: Vec<String>,
    pub process_name: Option<String>,
    pub pid: Option<String>,
    pub path: Option<String>,
    pub args: Option<String>,
    pub ip_address: Option<String>,
    pub port: Option<String>,
    pub protocol: Option<String>,
    pub reverse_dns: Option<String>,
    /// De-duplication key, not an identity
    pub fingerprint: String,
}

impl AlertRecord {
    /// True when not a single field could be recognised
    pub fn is_unknown(&self) -> bool {
        self.process_name.is_none()
            && self.pid.is_none()
            && self.path.is_none()
            && self.args.is_none()
            && self.ip_address.is_none()
            && self.port.is_none()
            && self.reverse_dns.is_none()
    }

    /// `host:port` for display, with whatever parts are known
    pub fn remote_endpoint(&self) -> String {
        let host = self
            .ip_address
            .as_deref()
            .or(self.reverse_dns.as_deref())
            .unwrap_or("unknown");
        match &self.port {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }
}

/// Which field a fragment was classified as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    IpAddress,
    PortProtocol,
    Pid,
    Path,
    Args,
    ReverseDns,
    ProcessName,
}

/// Compiled extraction patterns
pub struct FieldExtractor {
    ipv4: Regex,
    port_protocol: Regex,
    pid: Regex,
    hostname: Regex,
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor {
    pub fn new() -> Self {
        Self {
            ipv4: Regex::new(
                r"^(?:(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\.){3}(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)$",
            )
            .expect("static ipv4 pattern"),
            port_protocol: RegexBuilder::new(r"^(\d{1,5})\s*\(?\s*(tcp|udp)\s*\)?$")
                .case_insensitive(true)
                .build()
                .expect("static port pattern"),
            pid: Regex::new(r"^\d{4,6}$").expect("static pid pattern"),
            hostname: RegexBuilder::new(
                r"^(?:[a-z0-9_](?:[a-z0-9_-]*[a-z0-9])?\.)+[a-z][a-z0-9-]*\.?$",
            )
            .case_insensitive(true)
            .build()
            .expect("static hostname pattern"),
        }
    }

    /// Build a record from scraped fragments. Never fails.
    pub fn extract<S: AsRef<str>>(&self, fragments: &[S]) -> AlertRecord {
        let mut record = AlertRecord {
            raw_fragments: fragments.iter().map(|f| f.as_ref().to_string()).collect(),
            ..Default::default()
        };

        for fragment in fragments {
            let text = fragment.as_ref().trim();
            if is_label(text) {
                continue;
            }
            let value = strip_inline_label(text);

            match self.classify(value) {
                Some(FieldKind::IpAddress) => fill(&mut record.ip_address, value),
                Some(FieldKind::PortProtocol) => {
                    if record.port.is_none() {
                        if let Some(caps) = self.port_protocol.captures(value) {
                            record.port = Some(caps[1].to_string());
                            record.protocol = Some(caps[2].to_uppercase());
                        }
                    }
                }
                Some(FieldKind::Pid) => fill(&mut record.pid, value),
                Some(FieldKind::Path) => {
                    if record.path.is_none() {
                        record.path = Some(value.to_string());
                        if record.process_name.is_none() {
                            record.process_name = process_name_from_path(value);
                        }
                    }
                }
                Some(FieldKind::Args) => fill(&mut record.args, value),
                Some(FieldKind::ReverseDns) => {
                    fill(&mut record.reverse_dns, value.trim_end_matches('.'))
                }
                Some(FieldKind::ProcessName) => fill(&mut record.process_name, value),
                None => {}
            }
        }

        record.fingerprint = fingerprint::compute(&record);
        record
    }

    /// First predicate a value satisfies, in priority order
    pub fn classify(&self, value: &str) -> Option<FieldKind> {
        if value.is_empty() {
            return None;
        }
        if self.ipv4.is_match(value) {
            return Some(FieldKind::IpAddress);
        }
        if self.port_protocol.is_match(value) {
            return Some(FieldKind::PortProtocol);
        }
        if self.pid.is_match(value) {
            return Some(FieldKind::Pid);
        }
        if value.starts_with('/') {
            return Some(FieldKind::Path);
        }
        if value.starts_with("http://") || value.starts_with("https://") || value.starts_with('-') {
            return Some(FieldKind::Args);
        }
        if self.hostname.is_match(value) {
            return Some(FieldKind::ReverseDns);
        }
        if is_bare_name(value) {
            return Some(FieldKind::ProcessName);
        }
        None
    }
}

/// Convenience wrapper over a freshly compiled [`FieldExtractor`]
pub fn extract<S: AsRef<str>>(fragments: &[S]) -> AlertRecord {
    FieldExtractor::new().extract(fragments)
}

fn fill(slot: &mut Option<String>, value: &str) {
    if slot.is_none() {
        *slot = Some(value.to_string());
    }
}

fn is_label(text: &str) -> bool {
    text.is_empty()
        || text.ends_with(':')
        || SKIP_LIST.iter().any(|s| s.eq_ignore_ascii_case(text))
}

/// `process id: 123` -> `123`. Leaves paths, URLs and flags alone.
fn strip_inline_label(text: &str) -> &str {
    if text.starts_with('/') || text.starts_with('-') || text.contains("://") {
        return text;
    }
    match text.split_once(": ") {
        Some((label, value))
            if !label.is_empty()
                && label.len() <= MAX_LABEL_LEN
                && label
                    .chars()
                    .all(|c| c.is_alphabetic() || c == ' ' || c == '/' || c == '-') =>
        {
            let value = value.trim();
            if value.is_empty() {
                text
            } else {
                value
            }
        }
        _ => text,
    }
}

fn is_bare_name(value: &str) -> bool {
    value.len() < MAX_NAME_LEN
        && value.chars().any(|c| c.is_alphabetic())
        && !value
            .chars()
            .any(|c| c.is_whitespace() || c == ':' || c == '/')
        && !NAME_STOP_WORDS.iter().any(|w| w.eq_ignore_ascii_case(value))
}

/// `/Applications/Foo.app/Contents/MacOS/foo-helper` -> `Foo`,
/// `/usr/bin/curl` -> `curl`
fn process_name_from_path(path: &str) -> Option<String> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if let Some(bundle) = segments.iter().find_map(|s| s.strip_suffix(".app")) {
        if !bundle.is_empty() {
            return Some(bundle.to_string());
        }
    }
    segments.last().map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_alert() {
        let record = extract(&["443 (TCP)", "8.8.8.8", "curl", "/usr/bin/curl", "12345"]);
        assert_eq!(record.port.as_deref(), Some("443"));
        assert_eq!(record.protocol.as_deref(), Some("TCP"));
        assert_eq!(record.ip_address.as_deref(), Some("8.8.8.8"));
        assert_eq!(record.pid.as_deref(), Some("12345"));
        assert_eq!(record.path.as_deref(), Some("/usr/bin/curl"));
        assert_eq!(record.process_name.as_deref(), Some("curl"));
        assert_eq!(record.args, None);
        assert_eq!(record.reverse_dns, None);
    }

    #[test]
    fn test_label_is_skipped() {
        let record = extract(&["pid:", "12345"]);
        assert_eq!(record.pid.as_deref(), Some("12345"));
        assert_eq!(record.process_name, None);
        assert_eq!(record.raw_fragments, vec!["pid:", "12345"]);
    }

    #[test]
    fn test_empty_input_is_unknown() {
        let record = extract::<&str>(&[]);
        assert!(record.is_unknown());
        assert_eq!(record.protocol, None);
        assert!(!record.fingerprint.is_empty());
    }

    #[test]
    fn test_first_match_wins() {
        let record = extract(&["1.1.1.1", "9.9.9.9", "4242", "31337", "/bin/a", "/bin/b"]);
        assert_eq!(record.ip_address.as_deref(), Some("1.1.1.1"));
        assert_eq!(record.pid.as_deref(), Some("4242"));
        assert_eq!(record.path.as_deref(), Some("/bin/a"));
        // later duplicates never leak into other fields
        assert_eq!(record.process_name.as_deref(), Some("a"));
        assert_eq!(record.reverse_dns, None);
    }

    #[test]
    fn test_priority_order() {
        let ex = FieldExtractor::new();
        assert_eq!(ex.classify("10.0.0.1"), Some(FieldKind::IpAddress));
        assert_eq!(ex.classify("53 (udp)"), Some(FieldKind::PortProtocol));
        assert_eq!(ex.classify("8080 TCP"), Some(FieldKind::PortProtocol));
        assert_eq!(ex.classify("8080"), Some(FieldKind::Pid));
        assert_eq!(ex.classify("/usr/sbin/ntpd"), Some(FieldKind::Path));
        assert_eq!(ex.classify("https://example.com/x"), Some(FieldKind::Args));
        assert_eq!(ex.classify("--silent"), Some(FieldKind::Args));
        assert_eq!(ex.classify("dns.google."), Some(FieldKind::ReverseDns));
        assert_eq!(ex.classify("ntpd"), Some(FieldKind::ProcessName));
        assert_eq!(ex.classify("443"), None);
        assert_eq!(ex.classify("Allow"), None);
        assert_eq!(ex.classify("is trying to connect to"), None);
        assert_eq!(ex.classify(&"x".repeat(40)), None);
    }

    #[test]
    fn test_reverse_dns_and_args() {
        let record = extract(&[
            "Process Info",
            "https://dl.example.org/pkg.tar.gz",
            "dns.google.",
            "wget",
            "Connection Info",
        ]);
        assert_eq!(record.args.as_deref(), Some("https://dl.example.org/pkg.tar.gz"));
        assert_eq!(record.reverse_dns.as_deref(), Some("dns.google"));
        assert_eq!(record.process_name.as_deref(), Some("wget"));
    }

    #[test]
    fn test_inline_labels() {
        let record = extract(&[
            "process id: 4711",
            "ip address: 17.253.144.10",
            "port/protocol: 443 (TCP)",
            "process path: /Applications/Safari.app/Contents/MacOS/Safari",
        ]);
        assert_eq!(record.pid.as_deref(), Some("4711"));
        assert_eq!(record.ip_address.as_deref(), Some("17.253.144.10"));
        assert_eq!(record.port.as_deref(), Some("443"));
        assert_eq!(record.process_name.as_deref(), Some("Safari"));
    }

    #[test]
    fn test_path_does_not_override_name() {
        let record = extract(&["Dropbox", "/Applications/Dropbox.app/Contents/MacOS/dbfseventsd"]);
        assert_eq!(record.process_name.as_deref(), Some("Dropbox"));
        assert_eq!(
            record.path.as_deref(),
            Some("/Applications/Dropbox.app/Contents/MacOS/dbfseventsd")
        );
    }

    #[test]
    fn test_populated_fields_satisfy_own_predicate() {
        let ex = FieldExtractor::new();
        let fragments = [
            "node", "-e", "127.0.0.1", "23456", "/opt/homebrew/bin/node", "3000 (TCP)",
            "localhost.localdomain", "Block", "Rule Scope:", "extra", "10.1.1.1",
        ];
        let record = ex.extract(&fragments);
        let check = |value: &Option<String>, kind: FieldKind| {
            if let Some(v) = value {
                assert_eq!(ex.classify(v), Some(kind), "{} misclassified", v);
            }
        };
        check(&record.ip_address, FieldKind::IpAddress);
        check(&record.pid, FieldKind::Pid);
        check(&record.path, FieldKind::Path);
        check(&record.args, FieldKind::Args);
        check(&record.reverse_dns, FieldKind::ReverseDns);
        check(&record.process_name, FieldKind::ProcessName);
        assert_eq!(record.process_name.as_deref(), Some("node"));
        assert_eq!(record.args.as_deref(), Some("-e"));
    }

    #[test]
    fn test_deterministic() {
        let fragments = ["x", "203.0.113.9", "80 (TCP)"];
        assert_eq!(extract(&fragments), extract(&fragments));
    }
}
