//! Identifier mapping.
//!
//! Derives a stable numeric identity from a security identifier: the
//! identity is `base + RID`, where the RID is the last sub-authority. The
//! same SID and base always yield the same number.

use idsync_connector::sid::{RawSid, SecurityIdentifier};

/// Derive the numeric identity for a normalized SID.
///
/// Returns `None` if `base + RID` does not fit in a `u32`.
pub fn derive_identity(sid: &SecurityIdentifier, base: u32) -> Option<u32> {
    derive_from_relative(sid.rid(), base)
}

/// Normalize a raw SID and derive its numeric identity.
pub fn derive_from_raw(raw: &RawSid, base: u32) -> Option<u32> {
    raw.normalize().and_then(|sid| derive_identity(&sid, base))
}

/// Derive a numeric identity from a bare relative identifier.
///
/// Used for primary-group GIDs, where the source carries only the RID.
pub fn derive_from_relative(rid: u32, base: u32) -> Option<u32> {
    base.checked_add(rid)
}

/// Render a raw SID in canonical text form.
///
/// Text that already carries the `S-` prefix passes through unchanged.
pub fn identifier_to_string(raw: &RawSid) -> Option<String> {
    match raw {
        RawSid::Text(text) if text.starts_with("S-") => Some(text.clone()),
        other => other.normalize().map(|sid| sid.to_string()),
    }
}
