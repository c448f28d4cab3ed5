//! Paged transfers of memory blocks.

use alloc::{vec, vec::Vec};

use crate::layout::{BLOCK_SIZE, PAGE_SIZE, block_address};

use super::{Device, Sink};

/// A buffer mirroring one or more consecutive blocks of device memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryBlock {
    id: u32,
    memory: Vec<u8>,
}

impl MemoryBlock {
    /// Create a zeroed buffer spanning `count` blocks starting at block `id`.
    pub fn new(id: u32, count: u32) -> Self {
        Self {
            id,
            memory: vec![0; count as usize * BLOCK_SIZE],
        }
    }

    /// Wrap bytes to be written starting at block `id`.
    ///
    /// The buffer may end before its last block does. Writing then stops once
    /// the bytes are exhausted.
    pub fn from_bytes(id: u32, memory: Vec<u8>) -> Self {
        Self { id, memory }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Number of blocks covered, counting a partial final block.
    pub fn count(&self) -> u32 {
        self.memory.len().div_ceil(BLOCK_SIZE) as u32
    }

    /// Byte address of the first block.
    pub fn address(&self) -> u32 {
        block_address(self.id)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.memory
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.memory
    }
}

/// Read `count` blocks starting at block `id`, one page at a time.
///
/// Reports the transfer to the sink before starting, and after each block.
pub fn read_blocks<D: Device>(
    device: &mut D,
    id: u32,
    count: u32,
    o: &mut impl Sink,
) -> Result<MemoryBlock, D::Error> {
    let mut b = MemoryBlock::new(id, count);

    o.on_read_blocks(id, count);

    for (n, block) in b.memory.chunks_exact_mut(BLOCK_SIZE).enumerate() {
        let block_id = id + n as u32;
        let block_start = block_address(block_id);

        tracing::debug!(block = block_id, address = block_start, "Reading block");

        for (p, page) in block.chunks_exact_mut(PAGE_SIZE).enumerate() {
            let address = block_start + (p * PAGE_SIZE) as u32;
            tracing::trace!(address, "Reading page");
            device.read_memory(address, page)?;
        }

        o.on_read_block(block_id, block_start, block);
    }

    Ok(b)
}

/// Erase and rewrite the blocks covered by a buffer, one page at a time.
///
/// Each block is unlocked and erased before its pages are written. A failure
/// part way leaves the device erased but not rewritten.
pub fn write_blocks<D: Device>(device: &mut D, b: &MemoryBlock) -> Result<(), D::Error> {
    tracing::debug!(first = b.id, count = b.count(), len = b.memory.len(), "Writing blocks");

    for (n, block) in b.memory.chunks(BLOCK_SIZE).enumerate() {
        let block_id = b.id + n as u32;
        let block_start = block_address(block_id);

        tracing::debug!(block = block_id, address = block_start, "Writing block");

        device.clear_flash_1()?;
        device.clear_flash_2(block_start)?;

        // A short final chunk ends the write early.
        for (p, page) in block.chunks(PAGE_SIZE).enumerate() {
            let address = block_start + (p * PAGE_SIZE) as u32;
            tracing::trace!(address, "Writing page");
            device.write_memory(address, page)?;
        }
    }

    Ok(())
}
