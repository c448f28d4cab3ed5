//! States processing the sample stream of a workout.

use chrono::FixedOffset;
use either::Either::{self, Left, Right};
use thiserror::Error;
use zerocopy::{
    FromBytes,
    byteorder::little_endian::{I16, I32, U16},
};

use super::{
    cursor::{Cursor, EndOfBuffer},
    time::{GpsTime, TimeUpdate},
};

/// An error decoding a sample stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SampleError {
    /// Found a record tag this decoder does not know.
    #[error("Unsupported sample tag ({tag:#04x}) at offset {offset:#x}.")]
    UnsupportedTag { tag: u8, offset: usize },
    /// The stream ran out before an end marker.
    #[error("Sample stream exhausted at offset {offset:#x} without an end marker.")]
    Unterminated { offset: usize },
    /// A record was cut short by the end of the buffer.
    #[error(transparent)]
    Truncated(#[from] EndOfBuffer),
}

/// The category of a sample, given by its leading tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleKind {
    /// Absolute time and position.
    Full,
    /// Minute/second update and position delta.
    Diff,
    /// Minute/second update only.
    TimeOnly,
    /// Absolute time and heart rate.
    HrOnly,
    /// Same layout as [`SampleKind::Full`], marking a loss of fix.
    None,
    /// End of the stream.
    End,
}

impl SampleKind {
    pub fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            0x00 => Self::Full,
            0x01 => Self::Diff,
            0x02 => Self::TimeOnly,
            0x03 => Self::HrOnly,
            0x80 => Self::None,
            0xff => Self::End,
            _ => return None,
        })
    }

    pub fn tag(self) -> u8 {
        match self {
            Self::Full => 0x00,
            Self::Diff => 0x01,
            Self::TimeOnly => 0x02,
            Self::HrOnly => 0x03,
            Self::None => 0x80,
            Self::End => 0xff,
        }
    }

    /// Number of bytes occupied by a record of this kind.
    pub fn record_len(self) -> usize {
        match self {
            Self::Full | Self::None => size_of::<FixLayout>(),
            Self::Diff => size_of::<DiffLayout>(),
            Self::TimeOnly => 3,
            Self::HrOnly => 8,
            Self::End => 0,
        }
    }
}

/// A longitude, latitude and elevation, either absolute or a delta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Position {
    pub longitude: i32,
    pub latitude: i32,
    pub elevation: i16,
}

impl Position {
    /// Displace this position by a delta, coordinate by coordinate.
    pub fn displaced(self, delta: Position) -> Self {
        Self {
            longitude: self.longitude.wrapping_add(delta.longitude),
            latitude: self.latitude.wrapping_add(delta.latitude),
            elevation: self.elevation.wrapping_add(delta.elevation),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Motion {
    pub orientation: u16,
    pub speed: u16,
    pub distance: u16,
}

#[repr(C)]
#[derive(FromBytes)]
struct FixLayout {
    _tag: u8,
    status: u8,
    time: [u8; 6],
    longitude: I32,
    latitude: I32,
    elevation: I16,
    orientation: U16,
    speed: U16,
    distance: U16,
    heart_rate: u8,
}

#[repr(C)]
#[derive(FromBytes)]
struct DiffLayout {
    _tag: u8,
    status: u8,
    update: [u8; 2],
    longitude: I32,
    latitude: I32,
    elevation: I16,
    orientation: U16,
    speed: U16,
    distance: U16,
    heart_rate: u8,
}

/// A record carrying an absolute time and position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixRecord {
    pub status: u8,
    pub time: [u8; 6],
    pub position: Position,
    pub motion: Motion,
    pub heart_rate: u8,
}

/// A record carrying a time update and position delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffRecord {
    pub status: u8,
    pub update: TimeUpdate,
    pub delta: Position,
    pub motion: Motion,
    pub heart_rate: u8,
}

/// One raw record of the sample stream, before resolution against the
/// workout's running state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record {
    Full(FixRecord),
    Diff(DiffRecord),
    TimeOnly { secondary: u8, update: TimeUpdate },
    HrOnly { secondary: u8, time: [u8; 6], heart_rate: u8 },
    None(FixRecord),
    End,
}

impl Record {
    /// Take one record from a cursor, advancing past it.
    ///
    /// The end marker is not consumed.
    pub fn take(r: &mut Cursor<'_>) -> Result<Self, SampleError> {
        let offset = r.offset();
        let tag = r.peek().ok_or(SampleError::Unterminated { offset })?;
        let kind = SampleKind::from_tag(tag).ok_or(SampleError::UnsupportedTag { tag, offset })?;

        let record = match kind {
            SampleKind::Full => Self::Full(take_fix(r)?),
            SampleKind::None => Self::None(take_fix(r)?),
            SampleKind::Diff => {
                let DiffLayout {
                    status,
                    update,
                    longitude,
                    latitude,
                    elevation,
                    orientation,
                    speed,
                    distance,
                    heart_rate,
                    ..
                } = zerocopy::transmute!(r.take::<{ size_of::<DiffLayout>() }>()?);

                Self::Diff(DiffRecord {
                    status,
                    update: TimeUpdate::from_bytes(update),
                    delta: Position {
                        longitude: longitude.get(),
                        latitude: latitude.get(),
                        elevation: elevation.get(),
                    },
                    motion: Motion {
                        orientation: orientation.get(),
                        speed: speed.get(),
                        distance: distance.get(),
                    },
                    heart_rate,
                })
            }
            SampleKind::TimeOnly => {
                let [_, minute, second] = r.take()?;
                Self::TimeOnly {
                    secondary: minute,
                    update: TimeUpdate { minute, second },
                }
            }
            SampleKind::HrOnly => {
                let [_, t0, t1, t2, t3, t4, t5, heart_rate] = r.take()?;
                Self::HrOnly {
                    secondary: t0,
                    time: [t0, t1, t2, t3, t4, t5],
                    heart_rate,
                }
            }
            SampleKind::End => Self::End,
        };

        Ok(record)
    }

    pub fn kind(&self) -> SampleKind {
        match self {
            Self::Full(_) => SampleKind::Full,
            Self::Diff(_) => SampleKind::Diff,
            Self::TimeOnly { .. } => SampleKind::TimeOnly,
            Self::HrOnly { .. } => SampleKind::HrOnly,
            Self::None(_) => SampleKind::None,
            Self::End => SampleKind::End,
        }
    }
}

fn take_fix(r: &mut Cursor<'_>) -> Result<FixRecord, EndOfBuffer> {
    let FixLayout {
        status,
        time,
        longitude,
        latitude,
        elevation,
        orientation,
        speed,
        distance,
        heart_rate,
        ..
    } = zerocopy::transmute!(r.take::<{ size_of::<FixLayout>() }>()?);

    Ok(FixRecord {
        status,
        time,
        position: Position {
            longitude: longitude.get(),
            latitude: latitude.get(),
            elevation: elevation.get(),
        },
        motion: Motion {
            orientation: orientation.get(),
            speed: speed.get(),
            distance: distance.get(),
        },
        heart_rate,
    })
}

/// A run of consecutive samples sharing fix continuity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Track {
    /// 1-based ordinal within the workout.
    pub index: u32,
}

/// A sample resolved against the running state of its workout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub kind: SampleKind,
    /// The raw tag byte.
    pub tag: u8,
    /// The raw byte following the tag.
    pub secondary: u8,
    /// Fix status, forced to zero when the sample has no usable position.
    pub fix: u8,
    /// Absolute time, stored or resolved from the reference time.
    pub time: Option<GpsTime>,
    pub time_update: Option<TimeUpdate>,
    /// Absolute position. For [`SampleKind::Diff`], the accumulated position.
    pub position: Option<Position>,
    /// Stored delta of a [`SampleKind::Diff`] sample.
    pub delta: Option<Position>,
    pub motion: Option<Motion>,
    pub heart_rate: Option<u8>,
    pub has_position: bool,
    /// 1-based index within the workout.
    pub index_in_workout: u32,
    /// 1-based index within the current track.
    pub index_in_track: u32,
}

/// The outcome of advancing over one non-terminal record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Track closed before this sample.
    pub closed: Option<Track>,
    /// Track opened for this sample.
    pub opened: Option<Track>,
    pub sample: Sample,
}

/// Running state of one workout's sample stream.
///
/// Use a fresh decoder for each workout.
#[derive(Debug, Clone)]
pub struct SampleDecoder {
    offset: FixedOffset,
    base: Position,
    has_full_fix: bool,
    reference: Option<GpsTime>,
    track: Option<Track>,
    tracks: u32,
    in_workout: u32,
    in_track: u32,
}

impl SampleDecoder {
    /// Create a decoder placing timestamps at the given UTC offset.
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            offset,
            base: Position::default(),
            has_full_fix: false,
            reference: None,
            track: None,
            tracks: 0,
            in_workout: 0,
            in_track: 0,
        }
    }

    /// Resolve a record against the running state.
    ///
    /// Returns a [`Step`] for every record but the end marker. For the end
    /// marker, returns the track left open, which must be closed before the
    /// workout is finished.
    pub fn advance(&mut self, record: Record) -> Either<Step, Option<Track>> {
        let kind = record.kind();

        let mut sample = Sample {
            kind,
            tag: kind.tag(),
            secondary: 0,
            fix: 0,
            time: None,
            time_update: None,
            position: None,
            delta: None,
            motion: None,
            heart_rate: None,
            has_position: false,
            index_in_workout: 0,
            index_in_track: 0,
        };

        let offset = self.offset;
        let assemble = |fields| GpsTime::from_fields(fields, offset);

        match record {
            Record::Full(fix) => {
                let time = assemble(fix.time);
                self.reference = Some(time);
                self.base = fix.position;
                self.has_full_fix = true;
                sample.has_position = true;
                sample.fill_fix(fix, time);
            }
            Record::None(fix) => {
                let time = assemble(fix.time);
                self.reference = Some(time);
                if fix.status != 0 {
                    self.base = fix.position;
                }
                self.has_full_fix = fix.status != 0;
                sample.has_position = self.has_full_fix;
                sample.fill_fix(fix, time);
            }
            Record::Diff(diff) => {
                self.reference = self.reference.map(|t| t.updated(diff.update));
                self.base = self.base.displaced(diff.delta);
                sample.has_position = self.has_full_fix;
                sample.secondary = diff.status;
                sample.fix = diff.status;
                sample.time = self.reference;
                sample.time_update = Some(diff.update);
                sample.position = Some(self.base);
                sample.delta = Some(diff.delta);
                sample.motion = Some(diff.motion);
                sample.heart_rate = Some(diff.heart_rate);
            }
            Record::TimeOnly { secondary, update } => {
                self.reference = self.reference.map(|t| t.updated(update));
                sample.secondary = secondary;
                sample.time = self.reference;
                sample.time_update = Some(update);
            }
            Record::HrOnly {
                secondary,
                time,
                heart_rate,
            } => {
                let time = assemble(time);
                self.reference = Some(time);
                sample.secondary = secondary;
                sample.time = Some(time);
                sample.heart_rate = Some(heart_rate);
            }
            Record::End => return Right(self.track.take()),
        }

        self.in_workout += 1;
        self.in_track += 1;

        if !sample.has_position {
            sample.fix = 0;
        }

        // A `None` sample always closes the active track, whatever its fix.
        let closed = match kind {
            SampleKind::None => self.track.take(),
            _ => None,
        };

        let opened = match self.track {
            Some(_) => None,
            None => {
                self.tracks += 1;
                self.in_track = 1;
                let track = Track { index: self.tracks };
                self.track = Some(track);
                Some(track)
            }
        };

        sample.index_in_workout = self.in_workout;
        sample.index_in_track = self.in_track;

        Left(Step {
            closed,
            opened,
            sample,
        })
    }

    /// Whether a track is currently open.
    pub fn track_active(&self) -> bool {
        self.track.is_some()
    }

    /// Number of samples decoded so far.
    pub fn sample_count(&self) -> u32 {
        self.in_workout
    }
}

impl Sample {
    fn fill_fix(&mut self, fix: FixRecord, time: GpsTime) {
        self.secondary = fix.status;
        self.fix = fix.status;
        self.time = Some(time);
        self.position = Some(fix.position);
        self.motion = Some(fix.motion);
        self.heart_rate = Some(fix.heart_rate);
    }
}
