//! # icy_caff
//!
//! A 100% Rust decoder for CAFF animations and the CIFF still images embedded
//! in their frames.
//!
//! Every input is treated as untrusted: length fields, block sizes, string
//! boundaries and dimension arithmetic are validated and any deviation is
//! reported as a [`CaffError`]. Decoding is eager; a call either returns a
//! fully validated value or an error.
//!
//! ## Quick Start
//!
//! ### Decoding a CAFF animation
//!
//! ```ignore
//! use icy_caff::caff_decode;
//!
//! let data = std::fs::read("animation.caff")?;
//! let animation = caff_decode(&data)?;
//! println!("{} by {}", animation.frame_count(), animation.creator());
//! for (caption, tags) in animation.captions().iter().zip(animation.tags()) {
//!     println!("{caption}: {tags:?}");
//! }
//! ```
//!
//! ### Decoding a standalone CIFF image
//!
//! ```ignore
//! use icy_caff::ciff_decode;
//!
//! let image = ciff_decode(&std::fs::read("image.ciff")?)?;
//! println!("{}x{} \"{}\"", image.width(), image.height(), image.caption());
//! ```

use thiserror::Error;

pub mod block;
pub mod caff;
pub mod ciff;
pub mod pixel;
pub mod reader;

pub use block::{read_block_header, BlockKind};
pub use caff::{
    caff_decode, creation_time, CaffAnimation, Credits, Frame, CAFF_HEADER_LENGTH, CAFF_MAGIC,
    UNKNOWN_CREATOR,
};
pub use ciff::{ciff_decode, CiffImage, CIFF_MAGIC, CIFF_MIN_HEADER_LENGTH};
pub use pixel::Pixel;
pub use reader::ByteReader;

/// Broad classification of a [`CaffError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The block header protocol was violated (wrong block type, bad length).
    Structure,
    /// The content violates the CAFF or CIFF wire format.
    Format,
    /// An input-sized buffer could not be allocated.
    Resource,
    /// The stream ended early or could not be read.
    Io,
}

/// Errors that can occur while decoding CAFF or CIFF data.
#[derive(Debug, Error)]
pub enum CaffError {
    /// A block started with a different tag than the one required here
    #[error("unexpected block type {found:#04x}, expected {expected} (first block must be a header)")]
    UnexpectedBlock { expected: BlockKind, found: u8 },

    /// A block declared a zero or negative payload length
    #[error("block length must be positive, got {0}")]
    NonPositiveBlockLength(i64),

    /// The block tag is not one of the known block kinds
    #[error("invalid block id {0:#04x}")]
    InvalidBlockId(u8),

    /// Magic signature mismatch
    #[error("{format} magic header mismatch: found {found:?}")]
    BadMagic {
        format: &'static str,
        found: [u8; 4],
    },

    /// The CAFF header block does not have the fixed header size
    #[error("CAFF header block size must be {expected} bytes, got {actual}")]
    HeaderBlockSize { expected: u64, actual: u64 },

    /// The header-length field inside the CAFF header is wrong
    #[error("invalid CAFF header size {0}")]
    InvalidCaffHeaderLength(i64),

    /// The CAFF header declares zero or negative frames
    #[error("invalid frame count {0}")]
    InvalidFrameCount(i64),

    /// Two header blocks disagree on the number of frames
    #[error("inconsistent frame counts across headers: {previous} and {found}")]
    InconsistentFrameCounts { previous: u64, found: u64 },

    /// The creator length field is negative
    #[error("creator length can not be negative, got {0}")]
    NegativeCreatorLength(i64),

    /// The credits block size does not account for the creator exactly
    #[error("creator information ({creator_length} bytes) does not fit its block size of {block_length} bytes")]
    CreditsSizeMismatch {
        block_length: u64,
        creator_length: u64,
    },

    /// The creation date can not be represented
    #[error("invalid creation date {year:04}-{month:02}-{day:02} {hour:02}:{minute:02}")]
    InvalidTimestamp {
        year: i16,
        month: i8,
        day: i8,
        hour: i8,
        minute: i8,
    },

    /// A frame declares a negative duration
    #[error("frame duration can not be negative, got {0}")]
    NegativeDuration(i64),

    /// The CIFF image embedded in a frame failed to decode
    #[error("frame {index} is invalid: {source}")]
    InvalidFrame {
        index: usize,
        #[source]
        source: Box<CaffError>,
    },

    /// The bytes consumed by a frame differ from its declared block length
    #[error("embedded image size does not match container block size in frame {index}: block declares {declared} bytes, frame used {actual}")]
    FrameSizeMismatch {
        index: usize,
        declared: u64,
        actual: u64,
    },

    /// The number of frame blocks differs from the header's frame count
    #[error("missing frames, expected: {expected} got: {actual}")]
    FrameCountMismatch { expected: u64, actual: u64 },

    /// A frame's dimensions differ from the first frame's
    #[error("frame sizes are not uniform: frame {index} is {width}x{height}, expected {expected_width}x{expected_height}")]
    NonUniformFrames {
        index: usize,
        width: u64,
        height: u64,
        expected_width: u64,
        expected_height: u64,
    },

    /// The CIFF header-length field is below the minimum
    #[error("invalid CIFF header size {0}")]
    InvalidCiffHeaderLength(i64),

    /// The CIFF content-length field is negative
    #[error("invalid content length {0}")]
    InvalidContentLength(i64),

    /// Width or height is negative
    #[error("negative image {axis}: {value}")]
    NegativeDimension { axis: &'static str, value: i64 },

    /// `width * height * 3` does not fit into 64 bits
    #[error("image dimensions {width}x{height} overflow")]
    DimensionOverflow { width: i64, height: i64 },

    /// `width * height * 3` differs from the content length
    #[error("dimension/content-length mismatch: {width}x{height} needs {expected} bytes, content length is {content_length}")]
    ContentLengthMismatch {
        width: i64,
        height: i64,
        expected: i64,
        content_length: i64,
    },

    /// No caption terminator within the header bounds
    #[error("caption length exceeds limit of {max} bytes")]
    CaptionTooLong { max: usize },

    /// A tag run has no terminator within the header bounds
    #[error("tag {index} is not terminated within the header")]
    UnterminatedTag { index: usize },

    /// A tag contains a newline character
    #[error("tag {index} contains an invalid \\n character")]
    TagContainsNewline { index: usize },

    /// An input-sized buffer could not be allocated
    #[error("{what} exceeds memory limit ({bytes} bytes requested)")]
    OutOfMemory { what: &'static str, bytes: u64 },

    /// The stream ended before a complete value could be read
    #[error("unexpected end of data at offset {offset}: {needed} more bytes needed")]
    UnexpectedEof { offset: usize, needed: usize },

    /// Reading the input failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CaffError {
    /// Classifies this error. Frame errors report the kind of the image error they wrap.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CaffError::UnexpectedBlock { .. } | CaffError::NonPositiveBlockLength(_) => {
                ErrorKind::Structure
            }
            CaffError::InvalidFrame { source, .. } => source.kind(),
            CaffError::OutOfMemory { .. } => ErrorKind::Resource,
            CaffError::UnexpectedEof { .. } | CaffError::Io(_) => ErrorKind::Io,
            _ => ErrorKind::Format,
        }
    }

    /// Returns the innermost error, looking through frame wrappers.
    pub fn root_cause(&self) -> &CaffError {
        match self {
            CaffError::InvalidFrame { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Result type for CAFF and CIFF operations.
pub type Result<T> = core::result::Result<T, CaffError>;
