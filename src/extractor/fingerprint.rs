//! Alert fingerprints for de-duplication

use super::AlertRecord;
use sha2::{Digest, Sha256};

const RAW_DIGEST_LEN: usize = 16;

/// `process|ip|port` when any of those is known, otherwise a short digest
/// over all raw fragments.
pub fn compute(record: &AlertRecord) -> String {
    if record.process_name.is_some() || record.ip_address.is_some() || record.port.is_some() {
        return format!(
            "{}|{}|{}",
            record.process_name.as_deref().unwrap_or(""),
            record.ip_address.as_deref().unwrap_or(""),
            record.port.as_deref().unwrap_or(""),
        );
    }

    if record.raw_fragments.is_empty() {
        return "empty".to_string();
    }

    let mut hasher = Sha256::new();
    hasher.update(record.raw_fragments.join("|").as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("raw:{}", &digest[..RAW_DIGEST_LEN])
}
