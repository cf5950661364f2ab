use rashdb::{DatabaseError, storage::varint};

fn roundtrip(x: u64) -> u64 {
    let encoded = varint::encode_u64(x);
    assert_eq!(
        encoded.len(),
        varint::byte_length(x),
        "{}: byte_length disagrees with the encoder",
        x
    );
    varint::decode(&mut encoded.as_slice()).unwrap()
}

#[test]
fn test_one_byte_range() {
    for x in 0u64..=127 {
        let encoded = varint::encode_u64(x);
        assert_eq!(encoded.len(), 1, "{}: should encode in one byte", x);
        assert_eq!(encoded[0] as u64, x);
        assert_eq!(roundtrip(x), x);
    }
}

#[test]
fn test_two_byte_range() {
    for x in 128u64..=31103 {
        let encoded = varint::encode_u64(x);
        assert_eq!(encoded.len(), 2, "{}: should encode in two bytes", x);
        assert!(encoded[0] >= 128, "{}: first byte below two-byte range", x);
        assert!(encoded[0] <= 248, "{}: first byte in multi-byte range", x);
        assert_eq!(roundtrip(x), x);
    }
}

#[test]
fn test_three_byte_range() {
    for x in 31104u64..=65535 {
        let encoded = varint::encode_u64(x);
        assert_eq!(encoded.len(), 3, "{}: should encode in three bytes", x);
        assert_eq!(encoded[0], 249);
        assert_eq!(roundtrip(x), x);
    }
}

#[test]
fn test_length_boundaries() {
    let cases: &[(u64, usize)] = &[
        (0, 1),
        (127, 1),
        (128, 2),
        (31103, 2),
        (31104, 3),
        (65535, 3),
        (65536, 4),
        ((1 << 24) - 1, 4),
        (1 << 24, 5),
        ((1 << 32) - 1, 5),
        (1 << 32, 6),
        ((1 << 40) - 1, 6),
        (1 << 40, 7),
        ((1 << 48) - 1, 7),
        (1 << 48, 8),
        ((1 << 56) - 1, 8),
        (1 << 56, 9),
        (u64::MAX, 9),
    ];
    for &(x, expected_len) in cases {
        assert_eq!(varint::byte_length(x), expected_len, "byte_length({})", x);
        assert_eq!(varint::encode_u64(x).len(), expected_len, "encode({})", x);
        assert_eq!(roundtrip(x), x);
    }
}

#[test]
fn test_boundary_first_bytes() {
    assert_eq!(varint::encode_u64(31103), vec![248, 255]);
    assert_eq!(varint::encode_u64(31104)[0], 249);
    assert_eq!(varint::encode_u64(65536)[0], 250);
    assert_eq!(varint::encode_u64(1 << 32)[0], 252);
    assert_eq!(varint::encode_u64(u64::MAX)[0], 255);
    assert_eq!(varint::encode_u64(u64::MAX), vec![255; 9]);
}

#[test]
fn test_two_byte_encoding_bias() {
    // 128 + 256*(b0-128) + b1
    assert_eq!(varint::encode_u64(128), vec![128, 0]);
    assert_eq!(varint::encode_u64(383), vec![128, 255]);
    assert_eq!(varint::encode_u64(384), vec![129, 0]);
}

#[test]
fn test_decode_truncated() {
    for x in [31104u64, 65536, 1 << 32, u64::MAX] {
        let encoded = varint::encode_u64(x);
        for cut in 0..encoded.len() {
            let result = varint::decode(&mut &encoded[..cut]);
            assert!(
                matches!(result, Err(DatabaseError::Truncated { .. })),
                "{}: cut at {} should be truncated",
                x,
                cut
            );
        }
    }
}

#[test]
fn test_signed_helper_rejects_negative() {
    assert!(matches!(
        varint::encode(-1),
        Err(DatabaseError::NegativeInput(-1))
    ));
    assert_eq!(varint::encode(500).unwrap(), varint::encode_u64(500));
}

#[test]
fn test_decode_reads_exactly_one_value() {
    let mut bytes = varint::encode_u64(31104);
    bytes.extend_from_slice(&varint::encode_u64(7));
    let mut reader = bytes.as_slice();
    assert_eq!(varint::decode(&mut reader).unwrap(), 31104);
    assert_eq!(varint::decode(&mut reader).unwrap(), 7);
    assert!(reader.is_empty());
}
