use std::io::Read;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use tracing::debug;

use crate::block::{read_block_header, BlockKind};
use crate::{ByteReader, CaffError, CiffImage, Result};

/// Magic signature inside the CAFF header block.
pub const CAFF_MAGIC: &[u8; 4] = b"CAFF";

/// Required size of the header block payload: magic, header length, frame count.
pub const CAFF_HEADER_LENGTH: u64 = CAFF_MAGIC.len() as u64 + 2 * 8;

/// Creator reported when the credits leave it empty or are missing.
pub const UNKNOWN_CREATOR: &str = "<unknown>";

/// year (2) + month, day, hour, minute (1 each)
const CREATED_AT_LENGTH: u64 = 2 + 4;
const CREATOR_LENGTH_FIELD: u64 = 8;

/// Converts the credits timestamp fields to a UTC instant.
///
/// `month` is 1-based. Seconds are always zero. Fields outside their natural
/// range roll over into the neighbouring unit, so month 13 is January of the
/// following year and day 0 is the last day of the previous month. The result
/// does not depend on the host timezone.
///
/// Returns `None` if the instant can not be represented.
pub fn creation_time(year: i16, month: i8, day: i8, hour: i8, minute: i8) -> Option<DateTime<Utc>> {
    let months = i64::from(year) * 12 + i64::from(month) - 1;
    let year = i32::try_from(months.div_euclid(12)).ok()?;
    let month = u32::try_from(months.rem_euclid(12) + 1).ok()?;

    let offset = TimeDelta::try_days(i64::from(day) - 1)?
        .checked_add(&TimeDelta::try_hours(i64::from(hour))?)?
        .checked_add(&TimeDelta::try_minutes(i64::from(minute))?)?;

    NaiveDate::from_ymd_opt(year, month, 1)?
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(offset)
        .map(|time| time.and_utc())
}

/// Authorship information from a credits block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credits {
    created_at: DateTime<Utc>,
    creator: String,
}

impl Credits {
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn creator(&self) -> &str {
        &self.creator
    }
}

/// One frame of an animation: how long it is shown and what it shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    duration_ms: u64,
    image: CiffImage,
}

impl Frame {
    #[inline]
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    #[inline]
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn image(&self) -> &CiffImage {
        &self.image
    }
}

/// A fully decoded and validated CAFF animation.
///
/// All frames are present and share the animation's dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaffAnimation {
    credits: Option<Credits>,
    frame_count: u64,
    width: u64,
    height: u64,
    frames: Vec<Frame>,
}

/// Decodes a complete CAFF animation.
///
/// # Errors
///
/// Returns an error if:
/// - the first block is not a header, or a block id is unknown
/// - a block length is not positive or disagrees with its content
/// - the magic signature of the container or of a frame image is wrong
/// - headers disagree on the frame count, or frames are missing
/// - frames have different dimensions
/// - an embedded CIFF image is invalid
/// - an input-sized buffer can not be allocated
/// - the data ends early
#[must_use = "this returns the decoded CaffAnimation"]
pub fn caff_decode(data: &[u8]) -> Result<CaffAnimation> {
    CaffAnimation::decode(data)
}

impl CaffAnimation {
    pub fn decode(data: &[u8]) -> Result<Self> {
        Self::read(&mut ByteReader::new(data))
    }

    /// Decodes blocks from `reader` until it is exhausted.
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let mut builder = Builder::default();

        // the first block must be a header
        let mut kind = BlockKind::Header;
        loop {
            let block = read_block(reader, kind, builder.frames.len() + 1)?;
            builder.apply(block)?;

            match reader.peek_u8() {
                Some(tag) => kind = BlockKind::try_from(tag)?,
                None => break,
            }
        }

        builder.finish()
    }

    /// Reads the whole stream into memory and decodes it.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::decode(&data)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::decode(&data)
    }

    /// The last credits block of the file, if any.
    pub fn credits(&self) -> Option<&Credits> {
        self.credits.as_ref()
    }

    /// The creator, or [`UNKNOWN_CREATOR`] if none was given.
    pub fn creator(&self) -> &str {
        self.credits
            .as_ref()
            .map_or(UNKNOWN_CREATOR, |credits| credits.creator())
    }

    /// Creation time in UTC. `None` if the file carries no credits block.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.credits.as_ref().map(Credits::created_at)
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn width(&self) -> u64 {
        self.width
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn dimensions(&self) -> (u64, u64) {
        (self.width, self.height)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Each frame's caption, in frame order.
    pub fn captions(&self) -> Vec<&str> {
        self.frames.iter().map(|f| f.image.caption()).collect()
    }

    /// Each frame's tag list, in frame order.
    pub fn tags(&self) -> Vec<&[String]> {
        self.frames.iter().map(|f| f.image.tags()).collect()
    }

    pub fn total_duration(&self) -> Duration {
        self.frames
            .iter()
            .fold(Duration::ZERO, |total, f| total.saturating_add(f.duration()))
    }
}

enum Block {
    Header { frame_count: u64 },
    Credits(Credits),
    Frame(Frame),
}

fn read_block(reader: &mut ByteReader<'_>, kind: BlockKind, frame_index: usize) -> Result<Block> {
    let offset = reader.position();
    let length = read_block_header(reader, kind)?;
    debug!(offset, length, block = %kind, "reading block");

    match kind {
        BlockKind::Header => read_header(reader, length),
        BlockKind::Credits => read_credits(reader, length).map(Block::Credits),
        BlockKind::Frame => read_frame(reader, length, frame_index).map(Block::Frame),
    }
}

fn read_header(reader: &mut ByteReader<'_>, block_length: u64) -> Result<Block> {
    if block_length != CAFF_HEADER_LENGTH {
        return Err(CaffError::HeaderBlockSize {
            expected: CAFF_HEADER_LENGTH,
            actual: block_length,
        });
    }

    let magic: [u8; 4] = reader.read_array()?;
    if &magic != CAFF_MAGIC {
        return Err(CaffError::BadMagic {
            format: "CAFF",
            found: magic,
        });
    }

    let header_length = reader.read_i64_le()?;
    if header_length != CAFF_HEADER_LENGTH as i64 {
        return Err(CaffError::InvalidCaffHeaderLength(header_length));
    }

    let frame_count = reader.read_i64_le()?;
    if frame_count <= 0 {
        return Err(CaffError::InvalidFrameCount(frame_count));
    }

    Ok(Block::Header {
        frame_count: frame_count as u64,
    })
}

fn read_credits(reader: &mut ByteReader<'_>, block_length: u64) -> Result<Credits> {
    let year = reader.read_i16_le()?;
    let month = reader.read_i8()?;
    let day = reader.read_i8()?;
    let hour = reader.read_i8()?;
    let minute = reader.read_i8()?;

    let creator_length = reader.read_i64_le()?;
    if creator_length < 0 {
        return Err(CaffError::NegativeCreatorLength(creator_length));
    }
    let creator_length = creator_length as u64;

    let accounted = creator_length.checked_add(CREATOR_LENGTH_FIELD);
    if block_length.checked_sub(CREATED_AT_LENGTH) != accounted {
        return Err(CaffError::CreditsSizeMismatch {
            block_length,
            creator_length,
        });
    }

    let created_at = creation_time(year, month, day, hour, minute).ok_or(
        CaffError::InvalidTimestamp {
            year,
            month,
            day,
            hour,
            minute,
        },
    )?;

    let out_of_memory = || CaffError::OutOfMemory {
        what: "creator",
        bytes: creator_length,
    };
    let len = usize::try_from(creator_length).map_err(|_| out_of_memory())?;
    let bytes = reader.read_bytes(len)?;

    let creator = if bytes.is_empty() {
        UNKNOWN_CREATOR.to_owned()
    } else {
        let mut creator = String::new();
        creator
            .try_reserve_exact(bytes.len())
            .map_err(|_| out_of_memory())?;
        creator.push_str(&String::from_utf8_lossy(bytes));
        creator
    };

    Ok(Credits {
        created_at,
        creator,
    })
}

fn read_frame(reader: &mut ByteReader<'_>, block_length: u64, index: usize) -> Result<Frame> {
    let start = reader.position();

    let duration = reader.read_i64_le()?;
    if duration < 0 {
        return Err(CaffError::NegativeDuration(duration));
    }

    let image = CiffImage::read(reader).map_err(|source| CaffError::InvalidFrame {
        index,
        source: Box::new(source),
    })?;

    let actual = (reader.position() - start) as u64;
    if actual != block_length {
        return Err(CaffError::FrameSizeMismatch {
            index,
            declared: block_length,
            actual,
        });
    }

    Ok(Frame {
        duration_ms: duration as u64,
        image,
    })
}

/// Accumulates blocks until the stream ends.
#[derive(Default)]
struct Builder {
    frame_count: Option<u64>,
    credits: Option<Credits>,
    frames: Vec<Frame>,
}

impl Builder {
    fn apply(&mut self, block: Block) -> Result<()> {
        match block {
            Block::Header { frame_count } => match self.frame_count {
                Some(previous) if previous != frame_count => {
                    return Err(CaffError::InconsistentFrameCounts {
                        previous,
                        found: frame_count,
                    });
                }
                _ => self.frame_count = Some(frame_count),
            },
            Block::Credits(credits) => self.credits = Some(credits),
            Block::Frame(frame) => self.frames.push(frame),
        }
        Ok(())
    }

    fn finish(self) -> Result<CaffAnimation> {
        let expected = self.frame_count.unwrap_or_default();
        let actual = self.frames.len() as u64;
        let Some(first) = self.frames.first().filter(|_| actual == expected) else {
            return Err(CaffError::FrameCountMismatch { expected, actual });
        };

        let (width, height) = first.image.dimensions();
        for (idx, frame) in self.frames.iter().enumerate() {
            let (w, h) = frame.image.dimensions();
            if (w, h) != (width, height) {
                return Err(CaffError::NonUniformFrames {
                    index: idx + 1,
                    width: w,
                    height: h,
                    expected_width: width,
                    expected_height: height,
                });
            }
        }

        debug!(frames = actual, width, height, "decoded CAFF animation");

        Ok(CaffAnimation {
            credits: self.credits,
            frame_count: expected,
            width,
            height,
            frames: self.frames,
        })
    }
}
