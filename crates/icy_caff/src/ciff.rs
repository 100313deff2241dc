use tracing::{debug, trace};

use crate::{ByteReader, CaffError, Pixel, Result};

/// Magic signature at the start of every CIFF image.
pub const CIFF_MAGIC: &[u8; 4] = b"CIFF";

/// Offset of the caption: magic, header length, content length, width, height.
const CAPTION_START: usize = CIFF_MAGIC.len() + 4 * 8;
const CAPTION_END: u8 = b'\n';
const TAG_END: u8 = b'\0';
const BYTES_PER_PIXEL: usize = 3;

/// Smallest valid header: the fixed fields plus the caption newline and one tag terminator.
pub const CIFF_MIN_HEADER_LENGTH: usize = CAPTION_START + 2;

/// A decoded CIFF image.
///
/// Values are only produced by a complete, successful decode and are
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CiffImage {
    width: u64,
    height: u64,
    caption: String,
    tags: Vec<String>,
    pixels: Vec<Pixel>,
}

/// Decodes a standalone CIFF image.
///
/// Bytes after the declared pixel data are ignored.
///
/// # Errors
///
/// Returns an error if:
/// - the magic signature is not `CIFF`
/// - a length or dimension field is out of range or inconsistent
/// - the caption or a tag overruns the declared header length
/// - a tag contains a newline
/// - the pixel buffer can not be allocated
/// - the data ends early
#[must_use = "this returns the decoded CiffImage"]
pub fn ciff_decode(data: &[u8]) -> Result<CiffImage> {
    CiffImage::decode(data)
}

impl CiffImage {
    pub fn decode(data: &[u8]) -> Result<Self> {
        Self::read(&mut ByteReader::new(data))
    }

    /// Decodes one image starting at the reader's position.
    ///
    /// On success the reader is positioned right after the pixel data.
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let start = reader.position();

        let header = Header::read(reader)?;
        let caption = read_caption(reader, header.max_caption_length())?;
        let tags = read_tags(reader, header.tags_length(caption.len()))?;
        let caption = String::from_utf8_lossy(caption).into_owned();
        let pixels = read_pixels(reader, header.content_length)?;

        debug!(
            offset = start,
            width = header.width,
            height = header.height,
            tags = tags.len(),
            "decoded CIFF image"
        );

        Ok(CiffImage {
            width: header.width,
            height: header.height,
            caption,
            tags,
            pixels,
        })
    }

    #[inline]
    pub fn width(&self) -> u64 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u64 {
        self.height
    }

    #[inline]
    pub fn dimensions(&self) -> (u64, u64) {
        (self.width, self.height)
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    /// Non-empty tags in the order they were stored.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Row-major pixel data, `width * height` entries.
    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixel(&self, x: u64, y: u64) -> Option<Pixel> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = usize::try_from(y * self.width + x).ok()?;
        self.pixels.get(idx).copied()
    }

    /// Flattens the pixels into RGBA bytes (4 bytes per pixel, alpha as decoded).
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.to_rgba()).collect()
    }
}

/// The fixed-size part of a CIFF header, validated.
struct Header {
    header_length: usize,
    content_length: usize,
    width: u64,
    height: u64,
}

impl Header {
    fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let magic: [u8; 4] = reader.read_array()?;
        if &magic != CIFF_MAGIC {
            return Err(CaffError::BadMagic {
                format: "CIFF",
                found: magic,
            });
        }

        let header_length = reader.read_i64_le()?;
        let header_length = usize::try_from(header_length)
            .ok()
            .filter(|&len| len >= CIFF_MIN_HEADER_LENGTH)
            .ok_or(CaffError::InvalidCiffHeaderLength(header_length))?;

        let content_length = reader.read_i64_le()?;
        if content_length < 0 {
            return Err(CaffError::InvalidContentLength(content_length));
        }

        let width = read_dimension(reader, "width")?;
        let height = read_dimension(reader, "height")?;

        let expected = width
            .checked_mul(height)
            .and_then(|pixels| pixels.checked_mul(BYTES_PER_PIXEL as i64))
            .ok_or(CaffError::DimensionOverflow { width, height })?;
        if expected != content_length {
            return Err(CaffError::ContentLengthMismatch {
                width,
                height,
                expected,
                content_length,
            });
        }

        // content_length only fits in memory if it fits in usize
        let content_length =
            usize::try_from(content_length).map_err(|_| CaffError::OutOfMemory {
                what: "image",
                bytes: content_length as u64,
            })?;

        Ok(Header {
            header_length,
            content_length,
            width: width as u64,
            height: height as u64,
        })
    }

    /// Longest caption that still leaves room for its newline.
    fn max_caption_length(&self) -> usize {
        self.header_length - CAPTION_START - 1
    }

    /// Bytes left in the header for tag runs after a caption of `caption_length`.
    fn tags_length(&self, caption_length: usize) -> usize {
        self.header_length - CAPTION_START - caption_length - 1
    }
}

fn read_dimension(reader: &mut ByteReader<'_>, axis: &'static str) -> Result<i64> {
    let value = reader.read_i64_le()?;
    if value < 0 {
        return Err(CaffError::NegativeDimension { axis, value });
    }
    Ok(value)
}

fn read_caption<'a>(reader: &mut ByteReader<'a>, max_length: usize) -> Result<&'a [u8]> {
    reader
        .read_delimited(CAPTION_END, max_length + 1)?
        .ok_or(CaffError::CaptionTooLong { max: max_length })
}

/// Reads NUL-terminated tag runs until exactly `needed` bytes are consumed.
///
/// At least one run is read. Empty runs count towards `needed` but are not
/// stored.
fn read_tags(reader: &mut ByteReader<'_>, needed: usize) -> Result<Vec<String>> {
    let mut tags = Vec::new();
    let mut consumed = 0;
    let mut index = 0;

    loop {
        index += 1;
        let tag = reader
            .read_delimited(TAG_END, needed - consumed)?
            .ok_or(CaffError::UnterminatedTag { index })?;
        if tag.contains(&b'\n') {
            return Err(CaffError::TagContainsNewline { index });
        }
        consumed += tag.len() + 1;

        if !tag.is_empty() {
            let tag = String::from_utf8_lossy(tag).into_owned();
            trace!(index, tag = %tag, "read tag");
            tags.push(tag);
        }

        if consumed >= needed {
            break;
        }
    }
    Ok(tags)
}

fn read_pixels(reader: &mut ByteReader<'_>, content_length: usize) -> Result<Vec<Pixel>> {
    // Check availability first so a forged length can not trigger a huge allocation.
    let data = reader.read_bytes(content_length)?;

    let count = content_length / BYTES_PER_PIXEL;
    let mut pixels = Vec::new();
    pixels
        .try_reserve_exact(count)
        .map_err(|_| CaffError::OutOfMemory {
            what: "image",
            bytes: (count as u64).saturating_mul(std::mem::size_of::<Pixel>() as u64),
        })?;
    pixels.extend(
        data.chunks_exact(BYTES_PER_PIXEL)
            .map(|rgb| Pixel::rgb(rgb[0], rgb[1], rgb[2])),
    );
    Ok(pixels)
}
