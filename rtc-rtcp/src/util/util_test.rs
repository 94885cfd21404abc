use super::*;

#[test]
fn test_get_padding_size() {
    let tests = vec![(0, 0), (1, 3), (2, 2), (3, 1), (4, 0), (100, 0), (500, 0)];

    for (n, p) in tests {
        assert_eq!(
            get_padding_size(n),
            p,
            "Test case returned wrong value for input {n}"
        );
    }
}

#[test]
fn test_ntp_middle_truncated() {
    let tests = vec![
        ("whole", 0x0000AABBCCDD0000u64, 0x0000AABBCCDD0000u64),
        ("low bits", 0x0000AABBCCDD8888, 0x0000AABBCCDD0000),
        ("high bits", 0x1111AABBCCDD8888, 0x0000AABBCCDD0000),
        ("zero", 0, 0),
    ];

    for (name, input, want) in tests {
        let got = ntp_from_middle(ntp_middle_truncated(input));
        assert_eq!(got, want, "{name}: got {got:#x}, want {want:#x}");
    }
}

#[test]
fn test_ntp_middle_rounded() {
    let tests = vec![
        ("round down", 0x0000AABBCCDD1111u64, 0x0000AABBCCDD0000u64),
        ("round up", 0x0000AABBCCDD8888, 0x0000AABBCCDE0000),
        ("half", 0x0000AABBCCDD8000, 0x0000AABBCCDE0000),
        ("saturate high", 0x1111AABBCCDD0000, 0x0000FFFFFFFF0000),
        ("saturate carry", 0x0000FFFFFFFF8000, 0x0000FFFFFFFF0000),
        ("zero", 0, 0),
    ];

    for (name, input, want) in tests {
        let got = ntp_from_middle(ntp_middle_rounded(input));
        assert_eq!(got, want, "{name}: got {got:#x}, want {want:#x}");
    }
}

#[test]
fn test_ntp_middle_clamped() {
    let tests = vec![
        ("plain", 0x0000AABBCCDD8888u64, 0x0000AABBCCDE0000u64),
        ("saturate", 0x1111AABBCCDD0000, 0x0000FFFFFFFE0000),
        ("round into sentinel", 0x0000FFFFFFFE8000, 0x0000FFFFFFFE0000),
        ("sentinel", 0x0000FFFFFFFF0000, 0x0000FFFFFFFE0000),
    ];

    for (name, input, want) in tests {
        let got = ntp_from_middle(ntp_middle_clamped(input));
        assert_eq!(got, want, "{name}: got {got:#x}, want {want:#x}");
    }
}
