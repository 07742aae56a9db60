//! Security identifier normalization.
//!
//! Directory sources hand out SIDs either as the textual form
//! (`S-1-5-21-...-RID`) or as the packed binary structure. Both are normalized
//! here into [`SecurityIdentifier`] before any mapping happens.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum number of dash-separated components in a textual SID:
/// `S`, revision, authority and at least five sub-authorities.
pub const MIN_TEXT_COMPONENTS: usize = 8;

/// Minimum length of a binary SID buffer.
pub const MIN_BINARY_LEN: usize = 12;

const HEADER_LEN: usize = 8;
const AUTHORITY_MAX: u64 = (1 << 48) - 1;

/// A SID as read from a source, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawSid {
    /// Textual form, e.g. `S-1-5-21-1-2-3-1105`.
    Text(String),
    /// Packed binary form as stored in `objectSid`.
    Binary(Vec<u8>),
}

impl RawSid {
    /// Normalize into the canonical representation.
    pub fn normalize(&self) -> Option<SecurityIdentifier> {
        match self {
            RawSid::Text(s) => SecurityIdentifier::parse(s),
            RawSid::Binary(b) => SecurityIdentifier::from_bytes(b),
        }
    }
}

/// Canonical security identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecurityIdentifier {
    revision: u8,
    authority: u64,
    sub_authorities: Vec<u32>,
}

impl SecurityIdentifier {
    /// Build a SID from its parts.
    ///
    /// Returns `None` if there are no sub-authorities or the authority does not
    /// fit in 48 bits.
    pub fn new(revision: u8, authority: u64, sub_authorities: Vec<u32>) -> Option<Self> {
        if sub_authorities.is_empty() || authority > AUTHORITY_MAX {
            return None;
        }
        Some(Self {
            revision,
            authority,
            sub_authorities,
        })
    }

    /// Parse the textual form.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let rest = text.strip_prefix("S-").or_else(|| text.strip_prefix("s-"))?;
        let parts: Vec<&str> = rest.split('-').collect();
        if parts.len() + 1 < MIN_TEXT_COMPONENTS {
            return None;
        }

        let revision = parts[0].parse::<u8>().ok()?;
        let authority = parse_authority(parts[1])?;
        let sub_authorities = parts[2..]
            .iter()
            .map(|p| p.parse::<u32>().ok())
            .collect::<Option<Vec<_>>>()?;

        Self::new(revision, authority, sub_authorities)
    }

    /// Decode the binary form.
    ///
    /// Layout: revision (1 byte), sub-authority count N (1 byte), 48-bit
    /// big-endian authority (6 bytes), then N little-endian `u32`
    /// sub-authorities. Truncated buffers yield `None`.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < MIN_BINARY_LEN {
            return None;
        }
        let revision = bytes[0];
        let count = usize::from(bytes[1]);
        if count == 0 || bytes.len() < HEADER_LEN + count * 4 {
            return None;
        }

        let authority = bytes[2..HEADER_LEN]
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));

        let sub_authorities = bytes[HEADER_LEN..HEADER_LEN + count * 4]
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        Self::new(revision, authority, sub_authorities)
    }

    /// Encode into the binary form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.sub_authorities.len() * 4);
        out.push(self.revision);
        // Sub-authority count is a single byte on the wire.
        out.push(self.sub_authorities.len().min(usize::from(u8::MAX)) as u8);
        out.extend_from_slice(&self.authority.to_be_bytes()[2..]);
        for sub in self.sub_authorities.iter().take(usize::from(u8::MAX)) {
            out.extend_from_slice(&sub.to_le_bytes());
        }
        out
    }

    /// Revision number.
    pub fn revision(&self) -> u8 {
        self.revision
    }

    /// 48-bit identifier authority.
    pub fn authority(&self) -> u64 {
        self.authority
    }

    /// Sub-authorities in order.
    pub fn sub_authorities(&self) -> &[u32] {
        &self.sub_authorities
    }

    /// Relative identifier: the last sub-authority.
    pub fn rid(&self) -> u32 {
        // `new` rejects empty sub-authority lists.
        self.sub_authorities.last().copied().unwrap_or_default()
    }
}

impl fmt::Display for SecurityIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}-{}", self.revision, self.authority)?;
        for sub in &self.sub_authorities {
            write!(f, "-{sub}")?;
        }
        Ok(())
    }
}

fn parse_authority(part: &str) -> Option<u64> {
    let value = match part.strip_prefix("0x").or_else(|| part.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok()?,
        None => part.parse::<u64>().ok()?,
    };
    (value <= AUTHORITY_MAX).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain_user_bytes(rid: u32) -> Vec<u8> {
        let mut bytes = vec![1, 5, 0, 0, 0, 0, 0, 5];
        for sub in [21u32, 1_004_336_348, 1_177_238_915, 682_003_330, rid] {
            bytes.extend_from_slice(&sub.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_parse_text() {
        let sid = SecurityIdentifier::parse("S-1-5-21-1-2-3-1105").unwrap();
        assert_eq!(sid.revision(), 1);
        assert_eq!(sid.authority(), 5);
        assert_eq!(sid.sub_authorities(), &[21, 1, 2, 3, 1105]);
        assert_eq!(sid.rid(), 1105);
    }

    #[test]
    fn test_parse_text_too_few_components() {
        assert!(SecurityIdentifier::parse("S-1-5-21-1-2-3").is_none());
        assert!(SecurityIdentifier::parse("S-1-5-32-544").is_none());
    }

    #[test]
    fn test_parse_text_rejects_garbage() {
        assert!(SecurityIdentifier::parse("S-1-5-21-1-2-3-abc").is_none());
        assert!(SecurityIdentifier::parse("X-1-5-21-1-2-3-1105").is_none());
        assert!(SecurityIdentifier::parse("").is_none());
    }

    #[test]
    fn test_parse_text_hex_authority() {
        let sid = SecurityIdentifier::parse("S-1-0x5-21-1-2-3-1105").unwrap();
        assert_eq!(sid.authority(), 5);
    }

    #[test]
    fn test_from_bytes() {
        let sid = SecurityIdentifier::from_bytes(&domain_user_bytes(1105)).unwrap();
        assert_eq!(
            sid.to_string(),
            "S-1-5-21-1004336348-1177238915-682003330-1105"
        );
        assert_eq!(sid.rid(), 1105);
    }

    #[test]
    fn test_from_bytes_short_buffer() {
        assert!(SecurityIdentifier::from_bytes(&[1, 1, 0, 0, 0, 0, 0, 5, 1]).is_none());
    }

    #[test]
    fn test_from_bytes_truncated_sub_authorities() {
        let mut bytes = domain_user_bytes(500);
        bytes.truncate(bytes.len() - 2);
        assert!(SecurityIdentifier::from_bytes(&bytes).is_none());
    }

    #[test]
    fn test_from_bytes_zero_sub_authorities() {
        let bytes = [1, 0, 0, 0, 0, 0, 0, 5, 0, 0, 0, 0];
        assert!(SecurityIdentifier::from_bytes(&bytes).is_none());
    }

    #[test]
    fn test_binary_round_trip() {
        let bytes = domain_user_bytes(42);
        let sid = SecurityIdentifier::from_bytes(&bytes).unwrap();
        assert_eq!(sid.to_bytes(), bytes);
    }

    #[test]
    fn test_raw_sid_normalize() {
        let text = RawSid::Text("S-1-5-21-1-2-3-1105".into()).normalize().unwrap();
        let binary = RawSid::Binary(domain_user_bytes(1105)).normalize().unwrap();
        assert_eq!(text.rid(), binary.rid());
    }
}
