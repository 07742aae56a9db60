//! Property tests for the identifier mapper.

use idsync_connector::sid::{RawSid, SecurityIdentifier};
use idsync_engine::identity::{derive_from_raw, derive_identity, identifier_to_string};
use proptest::prelude::*;

fn domain_sid() -> impl Strategy<Value = SecurityIdentifier> {
    (
        any::<u32>(),
        any::<u32>(),
        any::<u32>(),
        0u32..=1_000_000,
    )
        .prop_map(|(a, b, c, rid)| {
            SecurityIdentifier::new(1, 5, vec![21, a, b, c, rid]).expect("valid sid")
        })
}

proptest! {
    #[test]
    fn derivation_is_deterministic(sid in domain_sid(), base in 0u32..1_000_000_000) {
        prop_assert_eq!(derive_identity(&sid, base), derive_identity(&sid.clone(), base));
    }

    #[test]
    fn shifting_the_base_shifts_the_identity(
        sid in domain_sid(),
        base in 0u32..1_000_000_000,
        k in 0u32..1_000_000,
    ) {
        let shifted = derive_identity(&sid, base + k);
        let plain = derive_identity(&sid, base).map(|v| v + k);
        prop_assert_eq!(shifted, plain);
    }

    #[test]
    fn binary_and_rendered_text_agree(sid in domain_sid(), base in 0u32..1_000_000_000) {
        let binary = RawSid::Binary(sid.to_bytes());
        let text = identifier_to_string(&binary).expect("renders");
        prop_assert_eq!(
            derive_from_raw(&RawSid::Text(text), base),
            derive_from_raw(&binary, base)
        );
    }

    #[test]
    fn arbitrary_bytes_never_panic(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let raw = RawSid::Binary(bytes.clone());
        let _ = derive_from_raw(&raw, 200_000);
        if bytes.len() < 12 {
            prop_assert_eq!(derive_from_raw(&raw, 200_000), None);
        }
    }

    #[test]
    fn arbitrary_text_never_panics(text in ".{0,80}") {
        let _ = derive_from_raw(&RawSid::Text(text), 200_000);
    }

    #[test]
    fn short_text_yields_none(parts in proptest::collection::vec(0u32..100_000, 0..5)) {
        let mut text = String::from("S-1-5");
        for p in &parts {
            text.push_str(&format!("-{p}"));
        }
        prop_assert_eq!(derive_from_raw(&RawSid::Text(text), 200_000), None);
    }
}

#[test]
fn reference_value() {
    let raw = RawSid::Text("S-1-5-21-1-2-3-1105".to_string());
    assert_eq!(derive_from_raw(&raw, 1_668_600_000), Some(1_668_601_105));
}
