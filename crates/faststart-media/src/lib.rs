//! Faststart-Media: MP4 box parsing and moov relocation
//!
//! This crate holds the binary-format side of turning a file with a
//! trailing moov box into a fast-start file. It performs no I/O; callers
//! supply bytes and write the results.
//!
//! # Modules
//!
//! - `mp4` - Box header codec, box tree walking, stco/co64 fixup
//! - `locate` - Step-driven backward scan for a moov box at the end of a file
//!
//! # Relocation
//!
//! A file laid out as `ftyp, mdat, moov` becomes `ftyp, moov, mdat` by:
//!
//! 1. Finding moov in the last bytes of the file (`locate::TailScanner`)
//! 2. Adding moov's size to every chunk offset (`mp4::fixup_moov_offsets`)
//! 3. Writing ftyp, the rewritten moov, then the media bytes unchanged

pub mod error;
pub mod locate;
pub mod mp4;

pub use error::{Error, Result};
pub use locate::{locate_moov_in, ByteRange, MoovMatch, TailScanner};
pub use mp4::{fixup_moov_offsets, BoxHeader, BoxType, ChunkOffsets, FixupSummary};
