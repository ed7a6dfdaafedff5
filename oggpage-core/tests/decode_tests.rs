//! Decoder behaviour against encoder output: framing, corruption, truncation and sync

use oggpage_core::{
    constants::{PageType, HEADER_SIZE, MAX_PAGE_SIZE, MAX_PAYLOAD_SIZE, MAX_SEGMENT_SIZE},
    Decoder, Encoder, PageError,
};
use rand::Rng;
use std::io::{Cursor, Read};

fn junk(len: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen_range(b'a'..=b'z')).collect()
}

fn bos_page<P: AsRef<[u8]>>(packets: &[P]) -> Vec<u8> {
    let mut encoder = Encoder::new(1, Vec::new());
    encoder.encode_bos(2, packets).unwrap();
    encoder.into_inner()
}

#[test]
fn test_basic_decode() {
    let stream = bos_page(&[b"hello"]);
    let mut decoder = Decoder::new(Cursor::new(stream));

    let (page, _) = decoder.decode().unwrap();
    assert_eq!(page.page_type().as_u8(), PageType::BOS);
    assert_eq!(page.serial(), 1);
    assert_eq!(page.granule(), 2);
    assert_eq!(page.packet_count(), 1);
    assert_eq!(page.packet(0), Some(&b"hello"[..]));
}

#[test]
fn test_basic_multi_decode() {
    let mut encoder = Encoder::new(1, Vec::new());
    encoder.encode_bos(2, &[b"hello"]).unwrap();
    encoder.encode(7, &[b"there"]).unwrap();

    let mut decoder = Decoder::new(Cursor::new(encoder.into_inner()));

    let (page, _) = decoder.decode().unwrap();
    assert_eq!(page.page_type().as_u8(), PageType::BOS);
    assert_eq!(page.granule(), 2);
    assert_eq!(page.packet(0), Some(&b"hello"[..]));

    let (page, _) = decoder.decode().unwrap();
    assert_eq!(page.page_type().as_u8(), PageType::NONE);
    assert_eq!(page.serial(), 1);
    assert_eq!(page.granule(), 7);
    assert_eq!(page.sequence(), 1);
    assert_eq!(page.packet(0), Some(&b"there"[..]));

    assert!(decoder.decode().unwrap_err().is_end_of_stream());
}

#[test]
fn test_multipacket_decode() {
    let stream = bos_page(&[b"hello", b"there"]);
    let mut decoder = Decoder::new(Cursor::new(stream));

    let (page, _) = decoder.decode().unwrap();
    assert_eq!(page.page_type().as_u8(), PageType::BOS);
    let packets: Vec<_> = page.packets().collect();
    assert_eq!(packets, vec![&b"hello"[..], &b"there"[..]]);
}

#[test]
fn test_bad_checksum_reports_stored_value() {
    let mut stream = bos_page(&[b"hello"]);
    let original = u32::from_le_bytes([stream[22], stream[23], stream[24], stream[25]]);
    stream[22] ^= 0xFF;
    let stored = u32::from_le_bytes([stream[22], stream[23], stream[24], stream[25]]);

    let mut decoder = Decoder::new(Cursor::new(stream));
    match decoder.decode() {
        Err(PageError::ChecksumMismatch { found, expected }) => {
            assert_eq!(found, stored);
            assert_eq!(expected, original);
        }
        other => panic!("expected checksum mismatch, got {:?}", other.map(|(_, n)| n)),
    }

    let err = PageError::ChecksumMismatch {
        found: 0xAB,
        expected: 0xCD,
    };
    assert!(err.to_string().starts_with("invalid crc in page"));
}

#[test]
fn test_short_decode() {
    let mut decoder = Decoder::new(Cursor::new(Vec::new()));
    assert!(matches!(decoder.decode(), Err(PageError::EndOfStream)));

    let mut encoder = Encoder::new(1, Vec::new());
    encoder.encode(2, &[b"hello"]).unwrap();
    let stream = encoder.into_inner();

    // Header complete, segment table read finds nothing at all
    let mut decoder = Decoder::new(Cursor::new(&stream).take(HEADER_SIZE as u64));
    assert!(matches!(decoder.decode(), Err(PageError::EndOfStream)));
    assert_eq!(decoder.last_consumed(), HEADER_SIZE);

    let mut decoder = Decoder::new(Cursor::new(&stream).take(10));
    assert!(matches!(
        decoder.decode(),
        Err(PageError::UnexpectedEof {
            expected: HEADER_SIZE,
            actual: 10
        })
    ));

    let mut decoder = Decoder::new(Cursor::new(&stream).take(stream.len() as u64 - 1));
    assert!(matches!(
        decoder.decode(),
        Err(PageError::UnexpectedEof {
            expected: 5,
            actual: 4
        })
    ));
    assert_eq!(decoder.last_consumed(), stream.len() - 1);
}

#[test]
fn test_bad_segment_table() {
    let mut stream = bos_page(&[b"hello"]);
    stream[26] = 0;

    let mut decoder = Decoder::new(Cursor::new(stream));
    let err = decoder.decode().unwrap_err();
    assert!(matches!(err, PageError::BadSegmentTable));
    assert!(err.is_recoverable());
    assert_eq!(decoder.last_consumed(), HEADER_SIZE);
}

#[test]
fn test_sync_decode() {
    let mut stream = Vec::new();
    stream.extend(std::iter::repeat(b'x').take(HEADER_SIZE - 1));
    stream.push(b'O');
    stream.extend(std::iter::repeat(b'x').take(HEADER_SIZE - 3));
    stream.extend_from_slice(b"Og");
    stream.extend(std::iter::repeat(b'x').take(HEADER_SIZE - 5));
    stream.extend_from_slice(b"Ogg");
    let garbage = stream.len();
    stream.extend_from_slice(&bos_page(&[b"hello"]));

    let mut decoder = Decoder::new(Cursor::new(&stream));
    let (page, consumed) = decoder.decode().unwrap();

    assert_eq!(page.page_type().as_u8(), PageType::BOS);
    assert_eq!(page.serial(), 1);
    assert_eq!(page.granule(), 2);
    assert_eq!(page.packet(0), Some(&b"hello"[..]));
    assert_eq!(consumed, stream.len());
    assert_eq!(page.encoded_len(), stream.len() - garbage);
}

#[test]
fn test_sync_past_garbage_between_pages() {
    let mut encoder = Encoder::new(1, Vec::new());
    encoder.encode_bos(0, &[b"first"]).unwrap();
    let mut stream = encoder.get_ref().clone();
    stream.extend_from_slice(b"\x00OgOggOg\xffO");

    let mut tail = Encoder::new(1, Vec::new()).starting_sequence(1);
    tail.encode_eos(1, &[b"second"]).unwrap();
    stream.extend_from_slice(tail.get_ref());

    let mut decoder = Decoder::new(Cursor::new(stream));
    decoder.decode().unwrap();
    let (page, _) = decoder.decode().unwrap();
    assert!(page.page_type().is_eos());
    assert_eq!(page.packet(0), Some(&b"second"[..]));
}

#[test]
fn test_long_decode() {
    let data = junk(MAX_PAGE_SIZE * 2);
    let mut encoder = Encoder::new(1, Vec::new());
    assert_eq!(encoder.encode(2, &[&data]).unwrap(), 3);

    let mut decoder = Decoder::new(Cursor::new(encoder.into_inner()));

    let (p1, _) = decoder.decode().unwrap();
    assert_eq!(p1.page_type().as_u8(), PageType::NONE);
    assert_eq!(p1.packet_count(), 1);
    assert!(p1.is_continued());
    assert_eq!(
        p1.packet(0),
        Some(&data[..MAX_PAYLOAD_SIZE]),
        "first page differs, starts {}",
        hex::encode(&p1.payload()[..16])
    );

    let (p2, _) = decoder.decode().unwrap();
    assert_eq!(p2.page_type().as_u8(), PageType::COP);
    assert_eq!(p2.packet_count(), 1);
    assert_eq!(p2.packet(0), Some(&data[MAX_PAYLOAD_SIZE..2 * MAX_PAYLOAD_SIZE]));

    let (p3, _) = decoder.decode().unwrap();
    assert_eq!(p3.page_type().as_u8(), PageType::COP);
    assert_eq!(p3.packet_count(), 1);
    assert!(!p3.is_continued());
    assert_eq!(p3.packet(0), Some(&data[2 * MAX_PAYLOAD_SIZE..]));
}

#[test]
fn test_long_multipacket_decode() {
    let data = junk(MAX_PAGE_SIZE * 2);
    let mut encoder = Encoder::new(1, Vec::new());
    encoder.encode(2, &[&data[..50], &data[50..]]).unwrap();

    let mut decoder = Decoder::new(Cursor::new(encoder.into_inner()));

    let (p1, _) = decoder.decode().unwrap();
    assert_eq!(p1.page_type().as_u8(), PageType::NONE);
    assert_eq!(p1.packet_count(), 2);
    assert_eq!(p1.packet(0), Some(&data[..50]));
    let first_fragment = MAX_PAYLOAD_SIZE - MAX_SEGMENT_SIZE;
    assert_eq!(p1.packet(1), Some(&data[50..50 + first_fragment]));

    let (p2, _) = decoder.decode().unwrap();
    assert_eq!(p2.page_type().as_u8(), PageType::COP);
    assert_eq!(p2.packet_count(), 1);
    let start = 50 + first_fragment;
    assert_eq!(p2.packet(0), Some(&data[start..start + MAX_PAYLOAD_SIZE]));

    let (p3, _) = decoder.decode().unwrap();
    assert_eq!(p3.page_type().as_u8(), PageType::COP);
    assert_eq!(p3.packet_count(), 1);
    assert_eq!(p3.packet(0), Some(&data[start + MAX_PAYLOAD_SIZE..]));
}

#[test]
fn test_even_longer_multipacket_decode() {
    let data = junk(MAX_PAGE_SIZE * 2);
    let tail = data.len() - 13;
    let mut encoder = Encoder::new(1, Vec::new());
    encoder
        .encode(2, &[&data[..50], &data[50..tail], &data[tail..]])
        .unwrap();

    let mut decoder = Decoder::new(Cursor::new(encoder.into_inner()));

    let (p1, _) = decoder.decode().unwrap();
    assert_eq!(p1.packet_count(), 2);
    let first_fragment = MAX_PAYLOAD_SIZE - MAX_SEGMENT_SIZE;
    assert_eq!(p1.packet(1).map(<[u8]>::len), Some(first_fragment));

    let (p2, _) = decoder.decode().unwrap();
    assert_eq!(p2.page_type().as_u8(), PageType::COP);
    assert_eq!(p2.packet(0).map(<[u8]>::len), Some(MAX_PAYLOAD_SIZE));

    let (p3, _) = decoder.decode().unwrap();
    assert_eq!(p3.page_type().as_u8(), PageType::COP);
    assert_eq!(p3.packet_count(), 2);
    let start = 50 + first_fragment + MAX_PAYLOAD_SIZE;
    assert_eq!(p3.packet(0), Some(&data[start..tail]));
    assert_eq!(p3.packet(1), Some(&data[tail..]));
}

#[test]
fn test_terminating_zero_segment() {
    let small = junk(50);
    let exact = junk(MAX_PAYLOAD_SIZE - MAX_SEGMENT_SIZE);
    let after = junk(10);

    let mut encoder = Encoder::new(1, Vec::new());
    assert_eq!(encoder.encode(0, &[&small, &exact, &after]).unwrap(), 2);
    let stream = encoder.into_inner();

    // The exact multiple fills the rest of the first table with 255s, so its
    // terminating zero segment opens the second page.
    let first_len = HEADER_SIZE + 255 + 50 + exact.len();
    let second = &stream[first_len..];
    assert_eq!(second[26], 2);
    assert_eq!(&second[HEADER_SIZE..HEADER_SIZE + 2], &[0, 10]);

    let mut decoder = Decoder::new(Cursor::new(&stream));
    let (p1, _) = decoder.decode().unwrap();
    assert!(p1.is_continued());
    assert_eq!(p1.packet(1), Some(&exact[..]));

    let (p2, _) = decoder.decode().unwrap();
    assert!(p2.page_type().is_continuation());
    assert_eq!(p2.packet(0), Some(&b""[..]));
    assert_eq!(p2.packet(1), Some(&after[..]));
}

#[test]
fn test_fragmentation_page_count() {
    for len in [MAX_PAYLOAD_SIZE + 1, MAX_PAYLOAD_SIZE * 3 + 100] {
        let data = junk(len);
        let mut encoder = Encoder::new(5, Vec::new());
        let pages = encoder.encode_bos(0, &[&data]).unwrap();
        assert_eq!(pages, len.div_ceil(MAX_PAYLOAD_SIZE));

        let mut decoder = Decoder::new(Cursor::new(encoder.into_inner()));
        let mut rebuilt = Vec::new();
        for i in 0..pages {
            let (page, _) = decoder.decode().unwrap();
            if i == 0 {
                assert_eq!(page.page_type().as_u8(), PageType::BOS);
            } else {
                assert_eq!(page.page_type().as_u8(), PageType::COP);
            }
            assert_eq!(page.packet_count(), 1);
            rebuilt.extend_from_slice(page.packet(0).unwrap());
        }
        assert_eq!(rebuilt, data);
        assert!(decoder.decode().unwrap_err().is_end_of_stream());
    }
}

#[test]
fn test_position_accumulates() {
    let mut encoder = Encoder::new(1, Vec::new());
    encoder.encode(0, &[b"one"]).unwrap();
    encoder.encode(0, &[b"two"]).unwrap();
    let stream = encoder.into_inner();

    let mut decoder = Decoder::new(stream.as_slice());
    let (_, a) = decoder.decode().unwrap();
    let (_, b) = decoder.decode().unwrap();
    assert_eq!(a + b, stream.len());
    assert_eq!(decoder.position(), stream.len() as u64);
    let mut rest = Vec::new();
    decoder.into_inner().read_to_end(&mut rest).unwrap();
    assert!(rest.is_empty());
}
