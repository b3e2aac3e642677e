//! Ring Arithmetic Tests
//!
//! Validates the identifier space primitives every other module builds on.
//!
//! ## Test Scopes
//! - **Hashing**: determinism and fixed width of identifiers.
//! - **Jump**: finger targets, including wraparound past 2^160.
//! - **Between**: open/half-open intervals with and without wraparound.

#[cfg(test)]
mod tests {
    use crate::ring::{Edge, Identifier, KVPair, M, between, hash, jump};

    fn id(value: u64) -> Identifier {
        Identifier::from(value)
    }

    // ============================================================
    // HASHING TESTS
    // ============================================================

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash("127.0.0.1:5000"), hash("127.0.0.1:5000"));
        assert_ne!(hash("127.0.0.1:5000"), hash("127.0.0.1:5001"));
    }

    #[test]
    fn test_hash_matches_sha1() {
        // SHA-1("abc")
        assert_eq!(
            hash("abc").to_hex(),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn test_identifier_hex_roundtrip() {
        let original = hash("some-key");
        let parsed: Identifier = original.to_hex().parse().unwrap();
        assert_eq!(parsed, original);

        assert!("not-hex".parse::<Identifier>().is_err());
        assert!("abcd".parse::<Identifier>().is_err(), "wrong width must be rejected");
    }

    #[test]
    fn test_identifier_json_is_hex_string() {
        let value = id(255);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, format!("\"{}ff\"", "0".repeat(38)));
    }

    #[test]
    fn test_edge_id_is_hash_of_address() {
        let edge = Edge::new("10.0.0.1:7000");
        assert_eq!(edge.id, hash("10.0.0.1:7000"));
        assert!(edge.is(&Edge::new("10.0.0.1:7000")));
    }

    #[test]
    fn test_kvpair_json_shape() {
        let pair = KVPair::new("x", "1");
        let json = serde_json::to_value(&pair).unwrap();
        assert_eq!(json, serde_json::json!({"key": "x", "value": "1"}));
    }

    // ============================================================
    // JUMP TESTS
    // ============================================================

    #[test]
    fn test_jump_adds_power_of_two() {
        assert_eq!(jump(&id(0), 1), id(1));
        assert_eq!(jump(&id(0), 2), id(2));
        assert_eq!(jump(&id(5), 4), id(13));
        assert_eq!(jump(&id(0), 64), id(1 << 63));
    }

    #[test]
    fn test_jump_carries_across_bytes() {
        assert_eq!(jump(&id(0xff), 1), id(0x100));
        assert_eq!(jump(&id(u64::MAX), 1).as_bytes()[11], 1);
    }

    #[test]
    fn test_jump_highest_finger_sets_top_bit() {
        let target = jump(&id(0), M);
        assert_eq!(target.as_bytes()[0], 0x80);
    }

    #[test]
    fn test_jump_wraps_modulo_ring_size() {
        let max = Identifier::from_bytes([0xff; 20]);
        assert_eq!(jump(&max, 1), id(0));
        assert_eq!(jump(&max, 3), id(3));
    }

    // ============================================================
    // BETWEEN TESTS
    // ============================================================

    #[test]
    fn test_between_linear_interval() {
        assert!(between(&id(10), &id(15), &id(20), false));
        assert!(!between(&id(10), &id(10), &id(20), false));
        assert!(!between(&id(10), &id(20), &id(20), false));
        assert!(between(&id(10), &id(20), &id(20), true));
        assert!(!between(&id(10), &id(25), &id(20), true));
    }

    #[test]
    fn test_between_wrapping_interval() {
        // (200, 10] wraps past zero
        assert!(between(&id(200), &id(250), &id(10), true));
        assert!(between(&id(200), &id(0), &id(10), true));
        assert!(between(&id(200), &id(10), &id(10), true));
        assert!(!between(&id(200), &id(10), &id(10), false));
        assert!(!between(&id(200), &id(100), &id(10), true));
    }

    #[test]
    fn test_between_degenerate_interval_covers_ring() {
        // start == end: everything except start itself (singleton ring)
        assert!(between(&id(42), &id(7), &id(42), false));
        assert!(between(&id(42), &id(99), &id(42), false));
        assert!(!between(&id(42), &id(42), &id(42), false));
        assert!(between(&id(42), &id(42), &id(42), true));
    }
}
