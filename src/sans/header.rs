//! Decoding workout headers.

use chrono::{FixedOffset, TimeDelta};

use super::{
    cursor::{Cursor, EndOfBuffer},
    time::{GpsTime, duration_from_fields},
};

/// Metadata stored at the start of a workout's first block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkoutHeader {
    /// Number of samples, as recorded by the watch.
    ///
    /// This count is unreliable. The sample stream is bounded only by its end
    /// marker.
    pub sample_count: u16,
    pub lap_count: u8,
    pub start_time: GpsTime,
    pub duration: TimeDelta,
    pub profile: u8,
    pub total_distance: u32,
    pub speed_avg: u16,
    pub speed_max: u16,
    pub hr_avg: u8,
    pub hr_max: u8,
    pub hr_min: u8,
    pub calories: u32,
    /// Time spent below the training heart-rate zone.
    pub below_zone: TimeDelta,
    /// Time spent in the training heart-rate zone.
    pub in_zone: TimeDelta,
    /// Time spent above the training heart-rate zone.
    pub above_zone: TimeDelta,
}

impl WorkoutHeader {
    /// Decode a workout header from the start of the workout's first block.
    ///
    /// Time fields are stored in reverse order (second first).
    pub fn decode(block: &[u8], offset: FixedOffset) -> Result<Self, EndOfBuffer> {
        let r = &mut Cursor::new(block);

        let sample_count = r.u16_le()?;
        let lap_count = r.u8()?;
        let start_time = GpsTime::from_fields(reversed(r.take()?), offset);
        let duration = duration_from_fields(reversed(r.take()?));
        r.skip(3)?;
        let profile = r.u8()?;
        let total_distance = r.u32_le()?;
        let speed_avg = r.u16_le()?;
        let speed_max = r.u16_le()?;
        r.skip(4)?;
        let hr_avg = r.u8()?;
        let hr_max = r.u8()?;
        let hr_min = r.u8()?;
        r.skip(1)?;
        let calories = r.u32_le()?;
        let below_zone = duration_from_fields(reversed(r.take()?));
        r.skip(1)?;
        let in_zone = duration_from_fields(reversed(r.take()?));
        r.skip(1)?;
        let above_zone = duration_from_fields(reversed(r.take()?));

        Ok(Self {
            sample_count,
            lap_count,
            start_time,
            duration,
            profile,
            total_distance,
            speed_avg,
            speed_max,
            hr_avg,
            hr_max,
            hr_min,
            calories,
            below_zone,
            in_zone,
            above_zone,
        })
    }
}

fn reversed<const N: usize>(mut r: [u8; N]) -> [u8; N] {
    r.reverse();
    r
}
