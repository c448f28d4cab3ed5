//! Encoding EPO files into the watch's record format.
//!
//! Only seven-day files (`MTK7d.EPO`) are supported: 7 days of 4 records of
//! 32 entries each. Entries are packed three to a record, each record framed
//! as a binary packet with a running sequence number and XOR checksum.

use alloc::vec::Vec;

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta};
use thiserror::Error;

use super::cursor::Cursor;

/// Length of a single EPO entry.
pub const ENTRY_LEN: usize = 60;

/// Number of entries in a seven-day EPO file.
pub const ENTRY_COUNT: usize = 7 * 4 * 32;

const PADDING_ENTRIES: usize = 4;
const GROUP_LEN: usize = 3 * ENTRY_LEN;

const LEADER: [u8; 4] = [0x04, 0x24, 0xbf, 0x00];
const MARKER: [u8; 2] = [0xd2, 0x02];
const LAST_INDEX: u16 = 0xffff;
const TRAILER: [u8; 2] = *b"\r\n";

/// Length of an encoded record.
pub const RECORD_LEN: usize = LEADER.len() + MARKER.len() + 2 + GROUP_LEN + 1 + TRAILER.len();

/// Number of encoded records, including those holding padding entries.
pub const RECORD_COUNT: usize = (ENTRY_COUNT + PADDING_ENTRIES).div_ceil(3);

/// Trailing data expected by the watch after the last record.
pub const FOOTER: [u8; 44] = [
    0x2c, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x0d, 0x00, 0x00, 0x00, //
    0xf3, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xb0, 0xee, 0x2e, 0x02, //
    0xdc, 0xae, 0x57, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, //
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Length of a complete encoded image.
pub const IMAGE_LEN: usize = RECORD_COUNT * RECORD_LEN + FOOTER.len();

/// An error encoding an EPO file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EpoError {
    /// The file does not hold exactly [`ENTRY_COUNT`] entries.
    #[error("EPO file must hold {ENTRY_COUNT} entries of {ENTRY_LEN} bytes, found {0} bytes.")]
    Size(usize),
    /// The validity period cannot be shown by the watch.
    #[error("EPO validity ({0} hours after the GPS epoch) is out of range.")]
    Expiry(u32),
}

/// An EPO file encoded for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpoImage {
    bytes: Vec<u8>,
    expiry: NaiveDateTime,
}

impl EpoImage {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// End of the validity period (UTC).
    pub fn expiry(&self) -> NaiveDateTime {
        self.expiry
    }

    /// The expiry date as shown by the watch: year since 2000, month and day.
    pub fn expiry_date(&self) -> (u8, u8, u8) {
        let d = self.expiry.date();
        // Range checked on encoding.
        ((d.year() - 2000) as u8, d.month() as u8, d.day() as u8)
    }

    /// The encoded records, excluding the footer.
    pub fn records(&self) -> impl Iterator<Item = &[u8]> {
        self.bytes.chunks_exact(RECORD_LEN).take(RECORD_COUNT)
    }
}

/// Start of GPS time: 00:00 on 6 January 1980.
pub fn gps_epoch() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1980, 1, 6)?.and_hms_opt(0, 0, 0)
}

/// XOR of all bytes.
pub fn checksum(r: &[u8]) -> u8 {
    r.iter().fold(0, |acc, b| acc ^ b)
}

/// Encode the contents of an EPO file.
pub fn encode(data: &[u8]) -> Result<EpoImage, EpoError> {
    if data.len() != ENTRY_COUNT * ENTRY_LEN {
        Err(EpoError::Size(data.len()))?;
    }

    // The leading three bytes hold the number of hours since the GPS epoch.
    let [h0, h1, h2] = Cursor::new(data)
        .take()
        .map_err(|_| EpoError::Size(data.len()))?;
    let hours = u32::from_le_bytes([h0, h1, h2, 0]);

    let expiry = gps_epoch()
        .and_then(|t| t.checked_add_signed(TimeDelta::hours(i64::from(hours))))
        .filter(|t| (2000..=2255).contains(&t.year()))
        .ok_or(EpoError::Expiry(hours))?;

    let mut entries = Vec::with_capacity((ENTRY_COUNT + PADDING_ENTRIES) * ENTRY_LEN);
    entries.extend_from_slice(data);
    entries.resize((ENTRY_COUNT + PADDING_ENTRIES) * ENTRY_LEN, 0);

    let mut bytes = Vec::with_capacity(IMAGE_LEN);
    let groups = entries.chunks_exact(GROUP_LEN);
    let last = groups.len() - 1;

    for (i, group) in groups.enumerate() {
        bytes.extend_from_slice(&LEADER);

        let start = bytes.len();
        bytes.extend_from_slice(&MARKER);

        let index = if i == last { LAST_INDEX } else { i as u16 };
        bytes.extend_from_slice(&index.to_le_bytes());
        bytes.extend_from_slice(group);

        let cs = checksum(&bytes[start..]);
        bytes.push(cs);
        bytes.extend_from_slice(&TRAILER);
    }

    bytes.extend_from_slice(&FOOTER);

    Ok(EpoImage { bytes, expiry })
}
