//! Decoding device information from the settings block (block 0).

use alloc::string::String;

use chrono::FixedOffset;
use thiserror::Error;

use crate::layout::{TOC_LEN, TOC_OFFSET};

use super::{
    cursor::{Cursor, EndOfBuffer},
    time::Timezone,
    toc::{TableOfContents, TocError},
};

const TIMEZONE: usize = 3;
const SAMPLE_INTERVAL: usize = 14;
const SELECTED_PROFILE: usize = 0x10 + 10;
const LANGUAGE: usize = 0x50 + 13;
const FIRMWARE: usize = 0x60;
const FIRMWARE_LEN: usize = 16;

/// An error decoding the settings block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// The check byte is not the complement of the value byte.
    #[error("Settings checksum mismatch: {check:#04x} is not the complement of {value:#04x}.")]
    Checksum { value: u8, check: u8 },
    /// The timezone code gives an offset of a day or more.
    #[error("Unknown timezone code ({0:#04x}).")]
    Timezone(u8),
    /// Malformed table of contents.
    #[error("Malformed table of contents: {0}")]
    Toc(#[from] TocError),
    /// The block is too short.
    #[error(transparent)]
    Truncated(#[from] EndOfBuffer),
}

/// Device information, decoded once per session from block 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Version string reported by the device.
    pub version: String,
    /// Firmware identifier stored in block 0.
    pub firmware: String,
    pub timezone: Timezone,
    pub offset: FixedOffset,
    pub sample_interval: u8,
    pub selected_profile: u8,
    pub language: u8,
    pub toc: TableOfContents,
}

/// Validate the checksum pair at the start of block 0.
pub fn verify_checksum(block: &[u8]) -> Result<(), SettingsError> {
    let [value, check] = Cursor::new(block).take()?;

    if value != !check {
        Err(SettingsError::Checksum { value, check })?;
    }

    Ok(())
}

impl DeviceInfo {
    /// Decode block 0, given the version string reported by the device.
    pub fn decode(block: &[u8], version: String) -> Result<Self, SettingsError> {
        verify_checksum(block)?;

        let byte_at = |offset| Cursor::at(block, offset).u8();

        let timezone = Timezone(byte_at(TIMEZONE)?);
        let offset = timezone
            .offset()
            .ok_or(SettingsError::Timezone(timezone.0))?;

        let firmware = Cursor::at(block, FIRMWARE).slice(FIRMWARE_LEN)?;
        let firmware = firmware.split(|&b| b == 0).next().unwrap_or_default();
        let firmware = String::from_utf8_lossy(firmware).into_owned();

        let toc = Cursor::at(block, TOC_OFFSET).slice(TOC_LEN)?;
        let toc = TableOfContents::decode(toc)?;

        Ok(Self {
            version,
            firmware,
            timezone,
            offset,
            sample_interval: byte_at(SAMPLE_INTERVAL)?,
            selected_profile: byte_at(SELECTED_PROFILE)?,
            language: byte_at(LANGUAGE)?,
            toc,
        })
    }
}
