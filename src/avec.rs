//! Device-backed operations and result publication.
//!
//! The types in this module read from and write to a watch through the
//! [`Device`] trait, publishing decoded entities to a [`Sink`] as they are
//! produced. Several sinks can be combined with a [`Broadcaster`].

use alloc::{string::String, vec::Vec};

use either::Either::{Left, Right};
use thiserror::Error;

use crate::{
    layout::{SAMPLES_OFFSET, WORKOUT_HEADER_LEN},
    sans::{
        cursor::Cursor,
        epo::EpoError,
        header::WorkoutHeader,
        sample::{Record, Sample, SampleDecoder, SampleError, Track},
        settings::{DeviceInfo, SettingsError},
    },
};

pub mod block;
pub mod watch;

pub use block::MemoryBlock;
pub use watch::Watch;

/// Transport to a watch.
///
/// Implementations own the connection, releasing it when dropped.
pub trait Device {
    /// An error from the transport.
    type Error;

    /// Query the firmware version string.
    fn read_version(&mut self) -> Result<String, Self::Error>;
    /// Fill a buffer with memory starting at an address.
    fn read_memory(&mut self, address: u32, buf: &mut [u8]) -> Result<(), Self::Error>;
    /// Write bytes to memory starting at an address.
    fn write_memory(&mut self, address: u32, bytes: &[u8]) -> Result<(), Self::Error>;
    /// Unlock flash for erasing.
    fn clear_flash_1(&mut self) -> Result<(), Self::Error>;
    /// Erase the flash block at an address.
    fn clear_flash_2(&mut self, address: u32) -> Result<(), Self::Error>;
    /// Set the expiry date of uploaded EPO data, as shown by the watch.
    fn set_epo_eol(&mut self, year: u8, month: u8, day: u8) -> Result<(), Self::Error>;
}

/// A workout, as listed by the table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workout {
    /// 0-based position in the table of contents.
    pub index: usize,
    pub first_block: u32,
    pub block_count: u32,
    pub header: WorkoutHeader,
}

/// Receive decoded entities, in the order they are discovered.
///
/// The default implementation of each method ignores received values.
#[allow(unused_variables)]
pub trait Sink {
    fn on_device(&mut self, info: &DeviceInfo) {}
    fn on_device_end(&mut self, info: &DeviceInfo) {}
    fn on_workout(&mut self, workout: &Workout) {}
    fn on_workout_end(&mut self, workout: &Workout) {}
    fn on_track(&mut self, track: &Track) {}
    fn on_track_end(&mut self, track: &Track) {}
    fn on_sample(&mut self, sample: &Sample) {}
    /// About to read `count` blocks starting at block `first`.
    fn on_read_blocks(&mut self, first: u32, count: u32) {}
    /// Finished reading a block.
    fn on_read_block(&mut self, id: u32, address: u32, bytes: &[u8]) {}
}

/// A sink ignoring everything.
impl Sink for () {}

/// Forwards every entity to each registered sink, in registration order.
#[derive(Default)]
pub struct Broadcaster<'a> {
    sinks: Vec<&'a mut dyn Sink>,
}

impl<'a> Broadcaster<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sink(&mut self, sink: &'a mut dyn Sink) {
        self.sinks.push(sink);
    }

    pub fn with_sink(mut self, sink: &'a mut dyn Sink) -> Self {
        self.add_sink(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

macro_rules! broadcast {
    ($($method:ident($($arg:ident: $t:ty),*);)*) => {
        impl Sink for Broadcaster<'_> {
            $(
                fn $method(&mut self, $($arg: $t),*) {
                    for sink in &mut self.sinks {
                        sink.$method($($arg),*);
                    }
                }
            )*
        }
    };
}

broadcast! {
    on_device(info: &DeviceInfo);
    on_device_end(info: &DeviceInfo);
    on_workout(workout: &Workout);
    on_workout_end(workout: &Workout);
    on_track(track: &Track);
    on_track_end(track: &Track);
    on_sample(sample: &Sample);
    on_read_blocks(first: u32, count: u32);
    on_read_block(id: u32, address: u32, bytes: &[u8]);
}

/// Category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Stored data failed an integrity check.
    Integrity,
    /// Data in an unsupported or invalid format.
    Format,
    /// The device transport failed.
    Io,
    /// Data did not have the expected structure.
    Protocol,
}

/// Errors occurring while operating on a watch.
#[derive(Debug, Error)]
pub enum Error<E> {
    /// An error from the device transport.
    #[error("Device transfer failed: {0:?}.")]
    Device(E),
    /// Malformed settings block.
    #[error("Malformed settings block: {0}")]
    Settings(#[from] SettingsError),
    /// Malformed workout.
    #[error("Malformed workout: {0}")]
    Sample(#[from] SampleError),
    /// Unsupported EPO file.
    #[error("Unsupported EPO file: {0}")]
    Epo(#[from] EpoError),
    /// An error reading an EPO file.
    #[cfg(feature = "std")]
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl<E> Error<E> {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Device(_) => ErrorKind::Io,
            Self::Settings(SettingsError::Checksum { .. }) => ErrorKind::Integrity,
            Self::Settings(SettingsError::Timezone(_)) => ErrorKind::Format,
            Self::Settings(_) => ErrorKind::Protocol,
            Self::Sample(SampleError::UnsupportedTag { .. }) => ErrorKind::Format,
            Self::Sample(_) => ErrorKind::Protocol,
            Self::Epo(_) => ErrorKind::Format,
            #[cfg(feature = "std")]
            Self::Io(_) => ErrorKind::Io,
        }
    }
}

/// Decode a workout from a buffer holding all of its blocks, publishing to a
/// sink.
///
/// The header is published before any of the workout's samples.
pub fn decode_workout(
    workout: &[u8],
    index: usize,
    (first_block, block_count): (u32, u32),
    info: &DeviceInfo,
    o: &mut impl Sink,
) -> Result<Workout, SampleError> {
    let header = Cursor::new(workout).slice(WORKOUT_HEADER_LEN)?;
    let header = WorkoutHeader::decode(header, info.offset)?;

    let workout_info = Workout {
        index,
        first_block,
        block_count,
        header,
    };
    o.on_workout(&workout_info);

    let r = &mut Cursor::at(workout, SAMPLES_OFFSET);
    let mut decoder = SampleDecoder::new(info.offset);

    // The stored sample count is unreliable, so only the end marker bounds
    // this loop.
    loop {
        let record = Record::take(r)?;

        match decoder.advance(record) {
            Left(step) => {
                if let Some(track) = &step.closed {
                    o.on_track_end(track);
                }
                if let Some(track) = &step.opened {
                    o.on_track(track);
                }
                o.on_sample(&step.sample);
            }
            Right(open) => {
                if let Some(track) = &open {
                    o.on_track_end(track);
                }
                break;
            }
        }
    }

    if u32::from(workout_info.header.sample_count) != decoder.sample_count() {
        tracing::debug!(
            workout = index,
            stored = workout_info.header.sample_count,
            decoded = decoder.sample_count(),
            "Stored sample count differs from the stream"
        );
    }

    o.on_workout_end(&workout_info);

    Ok(workout_info)
}
