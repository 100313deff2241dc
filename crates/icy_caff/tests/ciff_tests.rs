mod common;

use common::*;
use icy_caff::*;
use pretty_assertions::assert_eq;

#[test]
fn test_decode_standalone_image() {
    let data = CiffBuilder::filled(2, 2, [10, 20, 30])
        .caption("Beautiful scenery")
        .tag(b"landscape")
        .tag(b"sunset")
        .tag(b"mountains")
        .build();

    let image = ciff_decode(&data).unwrap();
    assert_eq!(image.dimensions(), (2, 2));
    assert_eq!(image.caption(), "Beautiful scenery");
    assert_eq!(image.tags(), ["landscape", "sunset", "mountains"]);
    assert_eq!(image.pixels().len(), 4);
    assert!(image.pixels().iter().all(|p| *p == Pixel::rgb(10, 20, 30)));
    // alpha is not stored in the file
    assert_eq!(image.pixel(1, 1).map(Pixel::to_rgba), Some([10, 20, 30, 0]));
}

#[test]
fn test_pixels_are_row_major() {
    let mut builder = CiffBuilder::new(2, 2).tag(b"grid");
    builder.pixels = vec![
        1, 1, 1, 2, 2, 2, //
        3, 3, 3, 4, 4, 4,
    ];
    let image = ciff_decode(&builder.build()).unwrap();
    assert_eq!(image.pixel(1, 0), Some(Pixel::rgb(2, 2, 2)));
    assert_eq!(image.pixel(0, 1), Some(Pixel::rgb(3, 3, 3)));
    assert_eq!(image.pixel(0, 2), None);
}

#[test]
fn test_content_length_must_match_dimensions() {
    let mut builder = CiffBuilder::new(2, 1).tag(b"x");
    builder.content_length = Some(5);
    let err = ciff_decode(&builder.build()).unwrap_err();
    assert!(matches!(
        err,
        CaffError::ContentLengthMismatch {
            width: 2,
            height: 1,
            expected: 6,
            content_length: 5,
        }
    ));
    assert!(err
        .to_string()
        .starts_with("dimension/content-length mismatch"));

    // downstream bytes do not matter
    builder.pixels.clear();
    assert!(matches!(
        ciff_decode(&builder.build()),
        Err(CaffError::ContentLengthMismatch { .. })
    ));
}

#[test]
fn test_negative_fields() {
    let mut builder = CiffBuilder::new(0, 0).tag(b"x");
    builder.content_length = Some(-1);
    assert!(matches!(
        ciff_decode(&builder.build()),
        Err(CaffError::InvalidContentLength(-1))
    ));

    let mut builder = CiffBuilder::new(0, 0).tag(b"x");
    builder.width = -2;
    assert!(matches!(
        ciff_decode(&builder.build()),
        Err(CaffError::NegativeDimension {
            axis: "width",
            value: -2
        })
    ));

    let mut builder = CiffBuilder::new(0, 0).tag(b"x");
    builder.height = -3;
    assert!(matches!(
        ciff_decode(&builder.build()),
        Err(CaffError::NegativeDimension {
            axis: "height",
            value: -3
        })
    ));

    let mut builder = CiffBuilder::new(0, 0).tag(b"x");
    builder.header_length = Some(-1);
    assert!(matches!(
        ciff_decode(&builder.build()),
        Err(CaffError::InvalidCiffHeaderLength(-1))
    ));
}

#[test]
fn test_minimum_header() {
    let builder = CiffBuilder::new(0, 0).tag(b"");
    assert_eq!(builder.natural_header_length(), CIFF_MIN_HEADER_LENGTH as i64);

    let image = ciff_decode(&builder.build()).unwrap();
    assert_eq!(image.caption(), "");
    assert!(image.tags().is_empty());
}

#[test]
fn test_tag_with_newline_names_position() {
    let data = CiffBuilder::new(0, 0)
        .tag(b"first")
        .tag(b"")
        .tag(b"sec\nond")
        .build();
    let err = ciff_decode(&data).unwrap_err();
    assert!(matches!(err, CaffError::TagContainsNewline { index: 3 }));
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn test_empty_and_duplicate_tags() {
    let data = CiffBuilder::new(0, 0)
        .tag(b"dup")
        .tag(b"")
        .tag(b"")
        .tag(b"dup")
        .tag(b"other")
        .build();
    let image = ciff_decode(&data).unwrap();
    assert_eq!(image.tags(), ["dup", "dup", "other"]);
}

#[test]
fn test_tag_may_not_overrun_header() {
    let mut builder = CiffBuilder::new(1, 1).tag(b"abc");
    // declare two bytes fewer than the tag run actually needs
    builder.header_length = Some(builder.natural_header_length() - 2);
    assert!(matches!(
        ciff_decode(&builder.build()),
        Err(CaffError::UnterminatedTag { index: 1 })
    ));
}

#[test]
fn test_caption_longer_than_header() {
    let mut builder = CiffBuilder::new(0, 0).caption("a long caption").tag(b"x");
    builder.header_length = Some(CIFF_MIN_HEADER_LENGTH as i64 + 2);
    assert!(matches!(
        ciff_decode(&builder.build()),
        Err(CaffError::CaptionTooLong { max: 3 })
    ));
}

#[test]
fn test_caption_without_newline_at_end_of_data() {
    let mut data = CIFF_MAGIC.to_vec();
    data.extend_from_slice(&100i64.to_le_bytes());
    data.extend_from_slice(&0i64.to_le_bytes());
    data.extend_from_slice(&0i64.to_le_bytes());
    data.extend_from_slice(&0i64.to_le_bytes());
    data.extend_from_slice(b"no newline");
    let err = ciff_decode(&data).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn test_invalid_utf8_is_replaced() {
    let mut builder = CiffBuilder::new(0, 0).tag(b"caf\xe9");
    builder.caption = b"\xff".to_vec();
    let image = ciff_decode(&builder.build()).unwrap();
    assert_eq!(image.caption(), "\u{fffd}");
    assert_eq!(image.tags(), ["caf\u{fffd}"]);
}

#[test]
fn test_magic_mismatch() {
    let mut builder = CiffBuilder::new(0, 0).tag(b"x");
    builder.magic = *b"CIFX";
    let err = ciff_decode(&builder.build()).unwrap_err();
    assert!(matches!(
        err,
        CaffError::BadMagic {
            format: "CIFF",
            found: [b'C', b'I', b'F', b'X']
        }
    ));
    assert_eq!(err.to_string(), "CIFF magic header mismatch: found [67, 73, 70, 88]");
}
