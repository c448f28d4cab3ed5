//! Decoding the table of contents.

use alloc::vec::Vec;

use thiserror::Error;

use crate::layout::FIRST_WORKOUT_BLOCK;

use super::cursor::Cursor;

/// Marker ending a run, and the table itself.
pub const SENTINEL: u8 = 0xff;

/// An error decoding the table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TocError {
    /// A run was not followed by a sentinel before the end of the region.
    #[error("Table of contents run starting at {offset:#x} is not terminated.")]
    Unterminated { offset: usize },
    /// A run ended below its first value.
    #[error("Table of contents run descends from {first} to {last}.")]
    Descending { first: u8, last: u8 },
}

/// The number of consecutive blocks occupied by each stored workout, in
/// storage order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableOfContents {
    entries: Vec<u32>,
}

impl TableOfContents {
    /// Decode the table of contents region of block 0.
    ///
    /// Each workout is stored as an ascending run of block counters followed
    /// by a sentinel. A sentinel in place of a run ends the table.
    pub fn decode(region: &[u8]) -> Result<Self, TocError> {
        let mut r = Cursor::new(region);
        let mut entries = Vec::new();

        loop {
            let start = r.offset();
            let first = match r.peek() {
                Some(SENTINEL) | None => break,
                Some(v) => v,
            };
            let mut last = first;

            loop {
                match r.peek() {
                    Some(SENTINEL) => break,
                    Some(v) => last = v,
                    None => Err(TocError::Unterminated { offset: start })?,
                }
                r.skip(1).map_err(|_| TocError::Unterminated { offset: start })?;
            }

            // Consume the sentinel ending this run.
            r.skip(1).map_err(|_| TocError::Unterminated { offset: start })?;

            if last < first {
                Err(TocError::Descending { first, last })?;
            }

            entries.push(u32::from(last - first) + 1);
        }

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[u32] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The first block and block count of each workout.
    ///
    /// Workouts are stored back to back, beginning at
    /// [`FIRST_WORKOUT_BLOCK`].
    pub fn workouts(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.entries.iter().scan(FIRST_WORKOUT_BLOCK, |first, &count| {
            let span = (*first, count);
            *first += count;
            Some(span)
        })
    }
}

impl From<Vec<u32>> for TableOfContents {
    fn from(entries: Vec<u32>) -> Self {
        Self { entries }
    }
}
