use bytes::Bytes;

use super::*;

#[test]
fn test_goodbye_unmarshal() {
    let tests = vec![
        (
            "length past datagram",
            Bytes::from_static(&[
                0x81, 0xcb, 0x00, 0x0c, // v=2, p=0, count=1, BYE, len=12
                0x90, 0x2f, 0x9e, 0x2e, // source=0x902f9e2e
                0x03, 0x46, 0x4f, 0x4f, // len=3, text=FOO
            ]),
            Goodbye::default(),
            Some(Error::PacketLengthOverflow),
        ),
        (
            "valid with reason",
            Bytes::from_static(&[
                0x81, 0xcb, 0x00, 0x02, // v=2, p=0, count=1, BYE, len=2
                0x90, 0x2f, 0x9e, 0x2e, // source=0x902f9e2e
                0x03, 0x46, 0x4f, 0x4f, // len=3, text=FOO
            ]),
            Goodbye {
                sources: vec![0x902f9e2e],
                reason: Bytes::from_static(b"FOO"),
            },
            None,
        ),
        (
            "invalid octet count",
            Bytes::from_static(&[
                0x81, 0xcb, 0x00, 0x02, // v=2, p=0, count=1, BYE, len=2
                0x90, 0x2f, 0x9e, 0x2e, // source=0x902f9e2e
                0x04, 0x46, 0x4f, 0x4f, // len=4, text=FOO
            ]),
            Goodbye::default(),
            Some(Error::PacketTooShort),
        ),
        (
            "wrong type",
            Bytes::from_static(&[
                0x81, 0xca, 0x00, 0x01, // v=2, p=0, count=1, SDES, len=1
                0x90, 0x2f, 0x9e, 0x2e, // source=0x902f9e2e
            ]),
            Goodbye::default(),
            Some(Error::WrongType),
        ),
        (
            "count past length",
            Bytes::from_static(&[
                0x82, 0xcb, 0x00, 0x01, // v=2, p=0, count=2, BYE, len=1
                0x90, 0x2f, 0x9e, 0x2e, // source=0x902f9e2e
            ]),
            Goodbye::default(),
            Some(Error::PacketTooShort),
        ),
        (
            "no reason",
            Bytes::from_static(&[
                0x82, 0xcb, 0x00, 0x02, // v=2, p=0, count=2, BYE, len=2
                0x90, 0x2f, 0x9e, 0x2e, // source=0x902f9e2e
                0x01, 0x02, 0x03, 0x04, // source=0x01020304
            ]),
            Goodbye {
                sources: vec![0x902f9e2e, 0x01020304],
                reason: Bytes::new(),
            },
            None,
        ),
        (
            "padded reason",
            Bytes::from_static(&[
                0xa1, 0xcb, 0x00, 0x03, // v=2, p=1, count=1, BYE, len=3
                0x90, 0x2f, 0x9e, 0x2e, // source=0x902f9e2e
                0x01, 0x46, 0x00, 0x00, // len=1, text=F
                0x00, 0x00, 0x00, 0x04, // padding
            ]),
            Goodbye {
                sources: vec![0x902f9e2e],
                reason: Bytes::from_static(b"F"),
            },
            None,
        ),
    ];

    for (name, data, want, want_error) in tests {
        let buf = &mut data.clone();
        let got = Goodbye::unmarshal(buf);

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
fn test_goodbye_marshal() {
    let too_many_sources: Vec<u32> = (0..(COUNT_MAX as u32 + 1)).collect();
    let long_reason = Bytes::from(vec![b'x'; SDES_MAX_OCTET_COUNT + 1]);

    let tests = vec![
        (
            "empty",
            Goodbye {
                sources: vec![],
                reason: Bytes::new(),
            },
            Ok(Bytes::from_static(&[0x80, 0xcb, 0x00, 0x00])),
        ),
        (
            "single source",
            Goodbye {
                sources: vec![0x01020304],
                reason: Bytes::new(),
            },
            Ok(Bytes::from_static(&[
                0x81, 0xcb, 0x00, 0x01, 0x01, 0x02, 0x03, 0x04,
            ])),
        ),
        (
            "with reason",
            Goodbye {
                sources: vec![0x01020304],
                reason: Bytes::from_static(b"bye"),
            },
            Ok(Bytes::from_static(&[
                0x81, 0xcb, 0x00, 0x02, 0x01, 0x02, 0x03, 0x04, 0x03, b'b', b'y', b'e',
            ])),
        ),
        (
            "too many sources",
            Goodbye {
                sources: too_many_sources,
                reason: Bytes::new(),
            },
            Err(Error::TooManySources),
        ),
        (
            "reason too long",
            Goodbye {
                sources: vec![],
                reason: long_reason,
            },
            Err(Error::ReasonTooLong),
        ),
    ];

    for (name, bye, want) in tests {
        let got = bye.marshal();
        assert_eq!(got, want, "Marshal {name}");

        if let Ok(data) = got {
            let buf = &mut data.clone();
            let decoded = Goodbye::unmarshal(buf).expect("round trip");
            assert_eq!(decoded, bye, "Unmarshal {name}");
        }
    }
}
