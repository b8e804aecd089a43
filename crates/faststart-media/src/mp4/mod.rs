//! MP4 box codec and chunk offset relocation.
//!
//! Only as much of the box tree is understood as relocating moov needs:
//! headers everywhere, payloads only along the path to stco/co64.

mod header;
mod offsets;
mod walker;
pub mod writer;

pub use header::{BoxHeader, BoxType, BASIC_HEADER_SIZE};
pub use offsets::{fixup_co64, fixup_stco, ChunkOffsets};
pub use walker::{
    chunk_offsets, fixup_moov_offsets, walk_children, BoxIter, BoxRegion, FixupSummary,
};
