//! Fixed geometry of the watch's flash memory.

/// Size of a single transfer to or from the device.
pub const PAGE_SIZE: usize = 0x80;

/// Size of an erasable flash block.
pub const BLOCK_SIZE: usize = 0x1000;

/// Number of page transfers making up a block.
pub const PAGES_PER_BLOCK: usize = BLOCK_SIZE / PAGE_SIZE;

/// Offset of the table of contents within block 0.
pub const TOC_OFFSET: usize = 0x100;

/// Length of the table of contents region within block 0.
pub const TOC_LEN: usize = 0x100;

/// Offset of the workout bookkeeping region within block 0.
pub const WORKOUT_STATE_OFFSET: usize = 0xe0;

/// Length of the workout bookkeeping region within block 0.
pub const WORKOUT_STATE_LEN: usize = 0x10;

/// Block holding the first stored workout.
pub const FIRST_WORKOUT_BLOCK: u32 = 1;

/// Length of the fixed workout header.
pub const WORKOUT_HEADER_LEN: usize = 64;

/// Offset of the sample stream within a workout (its second block).
pub const SAMPLES_OFFSET: usize = BLOCK_SIZE;

/// First block of the EPO region.
pub const EPO_BLOCK: u32 = 0xe6;

/// Number of blocks in the EPO region.
pub const EPO_BLOCKS: u32 = 1 + 0xf3 - 0xe6;

/// Byte address of a block.
pub const fn block_address(id: u32) -> u32 {
    id * BLOCK_SIZE as u32
}
