//! Device-independent decoders and encoders.
//!
//! This module is intended for applications that already hold a memory image
//! of the watch, or that need fine control over decoding. See
//! [`crate::avec`] for implementations reading directly from a device.
//!
//! # Architecture
//!
//! The watch stores a settings block (block 0) holding device information and
//! the table of contents, followed by workouts occupying runs of consecutive
//! blocks. Each workout starts with a fixed header; its sample stream begins
//! in the second block and runs until an end marker.
//!
//! All fixed-width fields are read through a [`cursor::Cursor`], which turns
//! out-of-bounds accesses into errors. Samples are decoded in two steps:
//! [`sample::Record::take`] reads one raw record from a cursor, and a
//! [`sample::SampleDecoder`] resolves it against the running state of the
//! workout (reference time, accumulated position and track boundaries).
//!
//! Some areas of the decoding process are not represented here and must be
//! carefully written by the caller:
//!
//! - Reading the workout's blocks into a contiguous buffer, as listed by the
//! table of contents.
//!
//! - Using a fresh [`sample::SampleDecoder`] for each workout.
//!
//! Implementers are recommended to begin by studying
//! [`crate::avec::decode_workout`].

pub mod cursor;
pub mod epo;
pub mod header;
pub mod sample;
pub mod settings;
pub mod time;
pub mod toc;
