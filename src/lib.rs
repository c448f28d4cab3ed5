#![no_std]

//! A workout decoder and EPO uploader for Crane GPS sports watches.
//!
//! Chainring reads the watch's flash memory page by page, decodes its table
//! of contents, workout headers and differentially encoded sample streams,
//! and publishes the results to one or more sinks as they are produced. It
//! also repacks MTK EPO files (satellite orbit predictions) into the record
//! format the watch expects, and writes them back.
//!
//! Most users should begin with [`avec::Watch`], implementing [`avec::Device`]
//! for their transport and [`avec::Sink`] for their output. The decoders
//! underneath, which never touch a device, are found in the [`sans`] module.
//!
//! ## Cargo Features
//!
//! The following crate feature flags are available:
//!
//! - `std`: enable `std::error::Error` and reader-based EPO uploads (default).

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod avec;
pub mod layout;
pub mod sans;
