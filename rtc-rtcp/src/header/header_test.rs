use bytes::Bytes;

use super::*;

#[test]
fn test_get_bit_field() {
    let tests: Vec<(&str, u32, u32, u32, u32)> = vec![
        ("top byte", 0xAABBCCDD, 24, 0xffff, 0xAA),
        ("top twelve bits", 0xAABBCCDD, 20, 0xffff, 0xAAB),
        ("top half", 0xAABBCCDD, 16, 0xffff, 0xAABB),
        ("narrow mask", 0xAABBCCDD, 16, 0xfff, 0xABB),
        ("whole word", 0xAABBCCDD, 0, 0xffffffff, 0xAABBCCDD),
        ("empty mask", 0xAABBCCDD, 8, 0, 0),
    ];

    for (name, word, shift, mask, want) in tests {
        let got = get_bit_field(word, shift, mask);
        assert_eq!(got, want, "{name}: got {got:#x}, want {want:#x}");
    }
}

#[test]
fn test_set_bit_field() {
    let mut word = 0u32;

    set_bit_field(&mut word, 0xDD, 4, 0xf);
    assert_eq!(word, 0xD0, "value wider than mask");

    set_bit_field(&mut word, 0xC, 8, 0xf);
    assert_eq!(word, 0xCD0, "adjacent field");

    set_bit_field(&mut word, 0xE, 4, 0xf);
    assert_eq!(word, 0xCE0, "overwrite keeps neighbours");

    let mut small = 0xffu8;
    set_bit_field(&mut small, 0, 5, 0x1);
    assert_eq!(small, 0xdf, "single bit cleared");
}

#[test]
fn test_bit_field_random_round_trip() {
    use rand::Rng;

    let mut rng = rand::rng();
    for _ in 0..1000 {
        let word: u32 = rng.random();
        let value: u32 = rng.random();
        let width = rng.random_range(1..=16u32);
        let shift = rng.random_range(0..=(32 - width));
        let mask = (1u32 << width) - 1;

        let mut updated = word;
        set_bit_field(&mut updated, value, shift, mask);

        assert_eq!(get_bit_field(updated, shift, mask), value & mask);
        assert_eq!(
            updated & !(mask << shift),
            word & !(mask << shift),
            "bits outside the field changed"
        );
    }
}

#[test]
fn test_header_unmarshal() {
    let tests = vec![
        (
            "valid",
            Bytes::from_static(&[
                // v=2, p=0, count=1, RR, len=7
                0x81, 0xc9, 0x00, 0x07,
            ]),
            Header {
                padding: false,
                count: 1,
                packet_type: PacketType::ReceiverReport,
                length: 7,
            },
            None,
        ),
        (
            "also valid",
            Bytes::from_static(&[
                // v=2, p=1, count=1, BYE, len=7
                0xa1, 0xcb, 0x00, 0x07,
            ]),
            Header {
                padding: true,
                count: 1,
                packet_type: PacketType::Goodbye,
                length: 7,
            },
            None,
        ),
        (
            "bad version",
            Bytes::from_static(&[
                // v=0, p=0, count=0, RR, len=4
                0x00, 0xc9, 0x00, 0x04,
            ]),
            Header::default(),
            Some(Error::BadVersion),
        ),
        (
            "too short",
            Bytes::from_static(&[0x81, 0xc9, 0x00]),
            Header::default(),
            Some(Error::PacketTooShort),
        ),
    ];

    for (name, data, want, want_error) in tests {
        let buf = &mut data.clone();
        let got = Header::unmarshal(buf);

        assert_eq!(
            got.is_err(),
            want_error.is_some(),
            "Unmarshal {name}: err = {got:?}, want {want_error:?}"
        );

        if let Some(err) = want_error {
            let got_err = got.err().unwrap();
            assert_eq!(
                got_err, err,
                "Unmarshal {name}: err = {got_err:?}, want {err:?}",
            );
        } else {
            let actual = got.unwrap();
            assert_eq!(
                actual, want,
                "Unmarshal {name}: got {actual:?}, want {want:?}"
            );
        }
    }
}

#[test]
fn test_header_marshal() {
    let tests = vec![
        (
            "valid",
            Header {
                padding: false,
                count: 1,
                packet_type: PacketType::ReceiverReport,
                length: 7,
            },
            Some(Bytes::from_static(&[0x81, 0xc9, 0x00, 0x07])),
            None,
        ),
        (
            "padded sdes",
            Header {
                padding: true,
                count: 31,
                packet_type: PacketType::SourceDescription,
                length: 4,
            },
            Some(Bytes::from_static(&[0xbf, 0xca, 0x00, 0x04])),
            None,
        ),
        (
            "invalid count",
            Header {
                padding: false,
                count: 40,
                packet_type: PacketType::Unsupported,
                length: 0,
            },
            None,
            Some(Error::InvalidHeader),
        ),
    ];

    for (name, header, want, want_error) in tests {
        let got = header.marshal();

        assert_eq!(
            got.is_err(),
            want_error.is_some(),
            "Marshal {name}: err = {got:?}, want {want_error:?}"
        );

        if let Some(err) = want_error {
            assert_eq!(got.err().unwrap(), err, "Marshal {name}");
        } else {
            let data = got.unwrap();
            assert_eq!(Some(data), want, "Marshal {name}");
        }
    }
}

#[test]
fn test_header_marshal_buffer_too_short() {
    let header = Header {
        padding: false,
        count: 0,
        packet_type: PacketType::Goodbye,
        length: 0,
    };
    let mut buf = [0u8; 3];
    assert_eq!(header.marshal_to(&mut buf), Err(Error::BufferTooShort));
}
