//! Byte-level builders for CAFF and CIFF test data.
#![allow(dead_code)]

pub const CAPTION_START: usize = 36;

/// A CIFF image description that can be serialized with arbitrary (also invalid) fields.
#[derive(Clone)]
pub struct CiffBuilder {
    pub magic: [u8; 4],
    pub header_length: Option<i64>,
    pub content_length: Option<i64>,
    pub width: i64,
    pub height: i64,
    pub caption: Vec<u8>,
    pub tags: Vec<Vec<u8>>,
    pub pixels: Vec<u8>,
}

impl CiffBuilder {
    pub fn new(width: i64, height: i64) -> Self {
        Self {
            magic: *b"CIFF",
            header_length: None,
            content_length: None,
            width,
            height,
            caption: Vec::new(),
            tags: Vec::new(),
            pixels: vec![0; (width * height * 3) as usize],
        }
    }

    /// A `width` x `height` image filled with `rgb`.
    pub fn filled(width: i64, height: i64, rgb: [u8; 3]) -> Self {
        let mut builder = Self::new(width, height);
        builder.pixels = rgb.repeat((width * height) as usize);
        builder
    }

    pub fn caption(mut self, caption: &str) -> Self {
        self.caption = caption.as_bytes().to_vec();
        self
    }

    pub fn tag(mut self, tag: &[u8]) -> Self {
        self.tags.push(tag.to_vec());
        self
    }

    pub fn natural_header_length(&self) -> i64 {
        (CAPTION_START
            + self.caption.len()
            + 1
            + self.tags.iter().map(|t| t.len() + 1).sum::<usize>()) as i64
    }

    pub fn build(&self) -> Vec<u8> {
        let mut data = self.magic.to_vec();
        let header_length = self
            .header_length
            .unwrap_or_else(|| self.natural_header_length());
        let content_length = self.content_length.unwrap_or(self.pixels.len() as i64);
        data.extend_from_slice(&header_length.to_le_bytes());
        data.extend_from_slice(&content_length.to_le_bytes());
        data.extend_from_slice(&self.width.to_le_bytes());
        data.extend_from_slice(&self.height.to_le_bytes());
        data.extend_from_slice(&self.caption);
        data.push(b'\n');
        for tag in &self.tags {
            data.extend_from_slice(tag);
            data.push(0);
        }
        data.extend_from_slice(&self.pixels);
        data
    }
}

/// Appends raw blocks to a CAFF stream.
#[derive(Default, Clone)]
pub struct CaffBuilder {
    pub data: Vec<u8>,
}

impl CaffBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block(mut self, tag: u8, payload: &[u8]) -> Self {
        self.data.push(tag);
        self.data
            .extend_from_slice(&(payload.len() as i64).to_le_bytes());
        self.data.extend_from_slice(payload);
        self
    }

    pub fn block_with_length(mut self, tag: u8, length: i64, payload: &[u8]) -> Self {
        self.data.push(tag);
        self.data.extend_from_slice(&length.to_le_bytes());
        self.data.extend_from_slice(payload);
        self
    }

    pub fn header(self, frame_count: i64) -> Self {
        let payload = header_payload(b"CAFF", 20, frame_count);
        self.block(0x1, &payload)
    }

    pub fn credits(self, date: (i16, i8, i8, i8, i8), creator: &str) -> Self {
        let payload = credits_payload(date, creator.as_bytes().len() as i64, creator.as_bytes());
        self.block(0x2, &payload)
    }

    pub fn frame(self, duration: i64, image: &CiffBuilder) -> Self {
        let payload = frame_payload(duration, &image.build());
        self.block(0x3, &payload)
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }
}

pub fn header_payload(magic: &[u8; 4], header_length: i64, frame_count: i64) -> Vec<u8> {
    let mut payload = magic.to_vec();
    payload.extend_from_slice(&header_length.to_le_bytes());
    payload.extend_from_slice(&frame_count.to_le_bytes());
    payload
}

pub fn credits_payload(
    (year, month, day, hour, minute): (i16, i8, i8, i8, i8),
    creator_length: i64,
    creator: &[u8],
) -> Vec<u8> {
    let mut payload = year.to_le_bytes().to_vec();
    payload.extend_from_slice(&[month as u8, day as u8, hour as u8, minute as u8]);
    payload.extend_from_slice(&creator_length.to_le_bytes());
    payload.extend_from_slice(creator);
    payload
}

pub fn frame_payload(duration: i64, ciff: &[u8]) -> Vec<u8> {
    let mut payload = duration.to_le_bytes().to_vec();
    payload.extend_from_slice(ciff);
    payload
}

pub const DATE: (i16, i8, i8, i8, i8) = (2020, 7, 4, 13, 37);

/// The two-frame animation used throughout the tests: creator "Alice",
/// two 1x1 red frames with an empty caption and the tag "test".
pub fn two_red_frames() -> Vec<u8> {
    let frame = CiffBuilder::filled(1, 1, [255, 0, 0]).tag(b"test");
    CaffBuilder::new()
        .header(2)
        .credits(DATE, "Alice")
        .frame(100, &frame)
        .frame(100, &frame)
        .build()
}
