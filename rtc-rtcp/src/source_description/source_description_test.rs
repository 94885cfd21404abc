use bytes::Bytes;

use super::*;

#[test]
fn test_source_description_unmarshal() {
    let tests = vec![
        (
            "nil",
            Bytes::from_static(&[]),
            SourceDescription::default(),
            Some(Error::PacketTooShort),
        ),
        (
            "no chunks",
            Bytes::from_static(&[
                // v=2, p=0, count=0, SDES, len=0
                0x80, 0xca, 0x00, 0x00,
            ]),
            SourceDescription { chunks: vec![] },
            None,
        ),
        (
            "missing type",
            Bytes::from_static(&[
                // v=2, p=0, count=1, SDES, len=2
                0x81, 0xca, 0x00, 0x02, // ssrc=0x00000000
                0x00, 0x00, 0x00, 0x00, // item without type and terminator
                0x00, 0x00, 0x00,
            ]),
            SourceDescription::default(),
            Some(Error::PacketLengthOverflow),
        ),
        (
            "bad cname length",
            Bytes::from_static(&[
                // v=2, p=0, count=1, SDES, len=2
                0x81, 0xca, 0x00, 0x02, // ssrc=0x00000000
                0x00, 0x00, 0x00, 0x00, // CNAME, len=5
                0x01, 0x05, 0x00, 0x00,
            ]),
            SourceDescription::default(),
            Some(Error::PacketTooShort),
        ),
        (
            "missing terminator",
            Bytes::from_static(&[
                // v=2, p=0, count=1, SDES, len=2
                0x81, 0xca, 0x00, 0x02, // ssrc=0x00000000
                0x00, 0x00, 0x00, 0x00, // CNAME, len=2, "a" "b"
                0x01, 0x02, 0x61, 0x62,
            ]),
            SourceDescription::default(),
            Some(Error::PacketTooShort),
        ),
        (
            "single cname",
            Bytes::from_static(&[
                // v=2, p=0, count=1, SDES, len=3
                0x81, 0xca, 0x00, 0x03, // ssrc=0x10000000
                0x10, 0x00, 0x00, 0x00, // CNAME, len=1, content=A
                0x01, 0x01, 0x41, // END + padding
                0x00, 0x00, 0x00, 0x00, 0x00,
            ]),
            SourceDescription {
                chunks: vec![SdesChunk {
                    source: 0x10000000,
                    items: vec![SdesItem::cname("A")],
                }],
            },
            None,
        ),
        (
            "two items",
            Bytes::from_static(&[
                // v=2, p=0, count=1, SDES, len=3
                0x81, 0xca, 0x00, 0x03, // ssrc=0x10000000
                0x10, 0x00, 0x00, 0x00, // CNAME, len=1, content=A
                0x01, 0x01, 0x41, // PHONE, len=1, content=B
                0x04, 0x01, 0x42, // END + padding
                0x00, 0x00,
            ]),
            SourceDescription {
                chunks: vec![SdesChunk {
                    source: 0x10000000,
                    items: vec![
                        SdesItem::cname("A"),
                        SdesItem {
                            item_type: 4,
                            text: Bytes::from_static(b"B"),
                        },
                    ],
                }],
            },
            None,
        ),
        (
            "two chunks",
            Bytes::from_static(&[
                // v=2, p=0, count=2, SDES, len=5
                0x82, 0xca, 0x00, 0x05, // ssrc=0x01020304
                0x01, 0x02, 0x03, 0x04,
                // Chunk 1
                // CNAME, len=1, content=A
                0x01, 0x01, 0x41, // END
                0x00, // Chunk 2
                // SSRC 0x05060708
                0x05, 0x06, 0x07, 0x08, // CNAME, len=3, content=BCD
                0x01, 0x03, 0x42, 0x43, 0x44, // END
                0x00, 0x00, 0x00,
            ]),
            SourceDescription {
                chunks: vec![
                    SdesChunk {
                        source: 0x01020304,
                        items: vec![SdesItem::cname("A")],
                    },
                    SdesChunk {
                        source: 0x05060708,
                        items: vec![SdesItem::cname("BCD")],
                    },
                ],
            },
            None,
        ),
    ];

    for (name, data, want, want_error) in tests {
        let buf = &mut data.clone();
        let got = SourceDescription::unmarshal(buf);

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
fn test_source_description_marshal() {
    let tests = vec![
        (
            "single cname",
            SourceDescription::with_cname(0x10000000, "A"),
            Ok(Bytes::from_static(&[
                0x81, 0xca, 0x00, 0x02, // v=2, p=0, count=1, SDES, len=2
                0x10, 0x00, 0x00, 0x00, // ssrc
                0x01, 0x01, 0x41, 0x00, // CNAME "A", END
            ])),
        ),
        (
            "missing type",
            SourceDescription {
                chunks: vec![SdesChunk {
                    source: 0x01020304,
                    items: vec![SdesItem {
                        item_type: SDES_END,
                        text: Bytes::new(),
                    }],
                }],
            },
            Err(Error::SdesMissingType),
        ),
        (
            "text too long",
            SourceDescription::with_cname(0x01020304, &"x".repeat(SDES_MAX_OCTET_COUNT + 1)),
            Err(Error::SdesTextTooLong),
        ),
        (
            "too many chunks",
            SourceDescription {
                chunks: vec![SdesChunk::default(); COUNT_MAX + 1],
            },
            Err(Error::TooManyChunks),
        ),
    ];

    for (name, sd, want) in tests {
        let got = sd.marshal();
        assert_eq!(got, want, "Marshal {name}");
    }
}

#[test]
fn test_chunk_cname() {
    let sd = SourceDescription::with_cname(7, "alice@example.com");
    assert_eq!(sd.chunks[0].cname(), Some(&Bytes::from_static(b"alice@example.com")));
    assert_eq!(SdesChunk::default().cname(), None);
    assert_eq!(sd.destination_ssrc(), vec![7]);

    // unknown item types are kept, the first CNAME wins
    let chunk = SdesChunk {
        source: 7,
        items: vec![
            SdesItem {
                item_type: 6,
                text: Bytes::from_static(b"tool"),
            },
            SdesItem::cname("first"),
            SdesItem::cname("second"),
        ],
    };
    assert_eq!(chunk.cname(), Some(&Bytes::from_static(b"first")));
    assert_eq!(
        SourceDescription {
            chunks: vec![chunk]
        }
        .to_string(),
        "SourceDescription:\n\t0x7\n\t\titem 6: tool\n\t\tCNAME: first\n\t\tCNAME: second\n"
    );
}
