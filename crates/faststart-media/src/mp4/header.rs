//! Box header parsing and serialization.

use crate::{Error, Result};
use bytes::{BufMut, BytesMut};

/// Size of a plain header: 32-bit size + four-character type.
pub const BASIC_HEADER_SIZE: usize = 8;

/// Extra bytes taken by the 64-bit "large size" field.
const LARGE_SIZE_BYTES: usize = 8;

/// Extra bytes taken by the extended type of a `uuid` box.
const EXTENDED_TYPE_BYTES: usize = 16;

/// Four-character box type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoxType(pub [u8; 4]);

impl BoxType {
    pub const FTYP: Self = Self(*b"ftyp");
    pub const MOOV: Self = Self(*b"moov");
    pub const MDAT: Self = Self(*b"mdat");
    pub const MVHD: Self = Self(*b"mvhd");
    pub const TRAK: Self = Self(*b"trak");
    pub const TKHD: Self = Self(*b"tkhd");
    pub const MDIA: Self = Self(*b"mdia");
    pub const MDHD: Self = Self(*b"mdhd");
    pub const MINF: Self = Self(*b"minf");
    pub const STBL: Self = Self(*b"stbl");
    pub const STSD: Self = Self(*b"stsd");
    pub const STCO: Self = Self(*b"stco");
    pub const CO64: Self = Self(*b"co64");
    pub const FREE: Self = Self(*b"free");
    pub const UDTA: Self = Self(*b"udta");
    pub const UUID: Self = Self(*b"uuid");

    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Get the 4-char code as a string.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("????")
    }

    /// Whether every character is in `[A-Za-z0-9]`.
    pub fn is_valid(&self) -> bool {
        self.0.iter().all(u8::is_ascii_alphanumeric)
    }
}

impl std::fmt::Display for BoxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            write!(f, "{}", self.as_str())
        } else {
            write!(f, "{:02x?}", self.0)
        }
    }
}

/// Parsed box header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxHeader {
    /// Box type code.
    pub box_type: BoxType,
    /// Box size including header.
    pub size: u64,
    /// Extended type, present iff the type is `uuid`.
    pub extended_type: Option<[u8; 16]>,
    /// Whether the size is stored in the 64-bit form.
    pub large_size: bool,
}

impl BoxHeader {
    /// Create a header for a regular box.
    ///
    /// The 64-bit size form is picked only when `size` does not fit 32 bits.
    pub fn new(box_type: BoxType, size: u64) -> Self {
        Self {
            box_type,
            size,
            extended_type: None,
            large_size: size > u32::MAX as u64,
        }
    }

    /// Create a header for a `uuid` box.
    pub fn uuid(size: u64, extended_type: [u8; 16]) -> Self {
        Self {
            box_type: BoxType::UUID,
            size,
            extended_type: Some(extended_type),
            large_size: size > u32::MAX as u64,
        }
    }

    /// Force the 64-bit size form.
    pub fn with_large_size(mut self) -> Self {
        self.large_size = true;
        self
    }

    /// Number of header bytes (8, 16, 24 or 32).
    pub fn header_size(&self) -> usize {
        let mut len = BASIC_HEADER_SIZE;
        if self.large_size {
            len += LARGE_SIZE_BYTES;
        }
        if self.extended_type.is_some() {
            len += EXTENDED_TYPE_BYTES;
        }
        len
    }

    /// Payload size (size - header).
    pub fn payload_size(&self) -> u64 {
        self.size.saturating_sub(self.header_size() as u64)
    }

    /// Parse a header at the start of `buf`.
    ///
    /// Returns the header and the number of bytes consumed.
    pub fn parse(buf: &[u8]) -> Result<(Self, usize)> {
        if buf.len() < BASIC_HEADER_SIZE {
            return Err(Error::truncated(
                "header",
                BASIC_HEADER_SIZE as u64,
                buf.len() as u64,
            ));
        }

        let size32 = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
        let box_type = BoxType::from_bytes([buf[4], buf[5], buf[6], buf[7]]);
        if !box_type.is_valid() {
            return Err(Error::malformed(format!(
                "wrong characters in box type {}",
                box_type
            )));
        }

        let mut consumed = BASIC_HEADER_SIZE;
        let (size, large_size) = match size32 {
            0 => {
                return Err(Error::malformed(format!(
                    "box {} extends to end of container (size 0), which is not supported",
                    box_type
                )));
            }
            1 => {
                let end = consumed + LARGE_SIZE_BYTES;
                if buf.len() < end {
                    return Err(Error::truncated(box_type, end as u64, buf.len() as u64));
                }
                let mut ext = [0u8; 8];
                ext.copy_from_slice(&buf[consumed..end]);
                consumed = end;
                (u64::from_be_bytes(ext), true)
            }
            n => (n as u64, false),
        };

        let extended_type = if box_type == BoxType::UUID {
            let end = consumed + EXTENDED_TYPE_BYTES;
            if buf.len() < end {
                return Err(Error::truncated(box_type, end as u64, buf.len() as u64));
            }
            let mut uuid = [0u8; 16];
            uuid.copy_from_slice(&buf[consumed..end]);
            consumed = end;
            Some(uuid)
        } else {
            None
        };

        if size < consumed as u64 {
            return Err(Error::malformed(format!(
                "box {} declares size {} smaller than its {}-byte header",
                box_type, size, consumed
            )));
        }

        Ok((
            Self {
                box_type,
                size,
                extended_type,
                large_size,
            },
            consumed,
        ))
    }

    /// Serialize the header in its recorded form.
    pub fn write_to(&self, buf: &mut BytesMut) {
        if self.large_size {
            buf.put_u32(1);
            buf.put_slice(&self.box_type.0);
            buf.put_u64(self.size);
        } else {
            buf.put_u32(self.size as u32);
            buf.put_slice(&self.box_type.0);
        }
        if let Some(uuid) = &self.extended_type {
            buf.put_slice(uuid);
        }
    }

    /// Serialize the header into a new buffer.
    pub fn to_bytes(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.header_size());
        self.write_to(&mut buf);
        buf
    }
}
