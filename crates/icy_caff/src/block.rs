//! The tagged, length-prefixed block header shared by all CAFF blocks.

use std::fmt;

use crate::{ByteReader, CaffError, Result};

/// Size of a block header: 1 byte tag + 8 byte length.
pub const BLOCK_HEADER_LENGTH: usize = 9;

/// The kinds of blocks a CAFF stream is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BlockKind {
    Header = 0x1,
    Credits = 0x2,
    Frame = 0x3,
}

impl BlockKind {
    #[inline]
    pub const fn tag(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for BlockKind {
    type Error = CaffError;

    fn try_from(tag: u8) -> Result<Self> {
        match tag {
            0x1 => Ok(BlockKind::Header),
            0x2 => Ok(BlockKind::Credits),
            0x3 => Ok(BlockKind::Frame),
            other => Err(CaffError::InvalidBlockId(other)),
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BlockKind::Header => "header",
            BlockKind::Credits => "credits",
            BlockKind::Frame => "frame",
        };
        write!(f, "{name} ({:#04x})", self.tag())
    }
}

/// Reads a block header and returns the payload length.
///
/// Fails if the tag differs from `expected` or if the declared length is not
/// positive. Consumes exactly [`BLOCK_HEADER_LENGTH`] bytes on success.
pub fn read_block_header(reader: &mut ByteReader<'_>, expected: BlockKind) -> Result<u64> {
    let found = reader.read_u8()?;
    if found != expected.tag() {
        return Err(CaffError::UnexpectedBlock { expected, found });
    }

    let length = reader.read_i64_le()?;
    if length <= 0 {
        return Err(CaffError::NonPositiveBlockLength(length));
    }
    Ok(length as u64)
}
