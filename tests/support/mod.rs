#![allow(dead_code)]

use chainring::{
    avec::{Device, Sink, Workout},
    layout::{BLOCK_SIZE, SAMPLES_OFFSET},
    sans::{
        sample::{Sample, Track},
        settings::DeviceInfo,
    },
};

pub const FIRMWARE: &str = "CRANE 2.12";
pub const VERSION: &str = "0.90.18";

/// A device call, as recorded by [`MockDevice`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ReadVersion,
    Read(u32, usize),
    Write(u32, usize),
    ClearFlash1,
    ClearFlash2(u32),
    SetEpoEol(u8, u8, u8),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockError(pub &'static str);

/// An in-memory flash image.
pub struct MockDevice {
    pub flash: Vec<u8>,
    pub calls: Vec<Call>,
    pub fail_reads: bool,
    pub fail_writes: bool,
}

impl MockDevice {
    pub fn new(blocks: usize) -> Self {
        Self {
            flash: vec![0xff; blocks * BLOCK_SIZE],
            calls: vec![],
            fail_reads: false,
            fail_writes: false,
        }
    }

    /// Place bytes starting at a block.
    pub fn load(&mut self, block: u32, bytes: &[u8]) {
        let s = block as usize * BLOCK_SIZE;
        self.flash[s..s + bytes.len()].copy_from_slice(bytes);
    }

    pub fn block(&self, block: u32) -> &[u8] {
        let s = block as usize * BLOCK_SIZE;
        &self.flash[s..s + BLOCK_SIZE]
    }
}

impl Device for MockDevice {
    type Error = MockError;

    fn read_version(&mut self) -> Result<String, Self::Error> {
        self.calls.push(Call::ReadVersion);
        Ok(VERSION.to_string())
    }

    fn read_memory(&mut self, address: u32, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.calls.push(Call::Read(address, buf.len()));
        if self.fail_reads {
            return Err(MockError("read failed"));
        }
        let s = address as usize;
        let src = self.flash.get(s..s + buf.len()).ok_or(MockError("out of range"))?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn write_memory(&mut self, address: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        self.calls.push(Call::Write(address, bytes.len()));
        if self.fail_writes {
            return Err(MockError("write failed"));
        }
        let s = address as usize;
        self.flash[s..s + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    fn clear_flash_1(&mut self) -> Result<(), Self::Error> {
        self.calls.push(Call::ClearFlash1);
        Ok(())
    }

    fn clear_flash_2(&mut self, address: u32) -> Result<(), Self::Error> {
        self.calls.push(Call::ClearFlash2(address));
        let s = address as usize;
        self.flash[s..s + BLOCK_SIZE].fill(0xff);
        Ok(())
    }

    fn set_epo_eol(&mut self, year: u8, month: u8, day: u8) -> Result<(), Self::Error> {
        self.calls.push(Call::SetEpoEol(year, month, day));
        Ok(())
    }
}

/// A decoded entity, as recorded by [`Recorder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Device(DeviceInfo),
    DeviceEnd,
    Workout(Workout),
    WorkoutEnd(usize),
    Track(u32),
    TrackEnd(u32),
    Sample(Sample),
    ReadBlocks(u32, u32),
    ReadBlock(u32, u32, usize),
}

#[derive(Debug, Default)]
pub struct Recorder(pub Vec<Event>);

impl Recorder {
    pub fn samples(&self) -> Vec<&Sample> {
        self.0
            .iter()
            .filter_map(|e| match e {
                Event::Sample(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    /// Events other than block reads.
    pub fn decoded(&self) -> Vec<&Event> {
        self.0
            .iter()
            .filter(|e| !matches!(e, Event::ReadBlocks(..) | Event::ReadBlock(..)))
            .collect()
    }
}

impl Sink for Recorder {
    fn on_device(&mut self, info: &DeviceInfo) {
        self.0.push(Event::Device(info.clone()));
    }
    fn on_device_end(&mut self, _: &DeviceInfo) {
        self.0.push(Event::DeviceEnd);
    }
    fn on_workout(&mut self, workout: &Workout) {
        self.0.push(Event::Workout(workout.clone()));
    }
    fn on_workout_end(&mut self, workout: &Workout) {
        self.0.push(Event::WorkoutEnd(workout.index));
    }
    fn on_track(&mut self, track: &Track) {
        self.0.push(Event::Track(track.index));
    }
    fn on_track_end(&mut self, track: &Track) {
        self.0.push(Event::TrackEnd(track.index));
    }
    fn on_sample(&mut self, sample: &Sample) {
        self.0.push(Event::Sample(sample.clone()));
    }
    fn on_read_blocks(&mut self, first: u32, count: u32) {
        self.0.push(Event::ReadBlocks(first, count));
    }
    fn on_read_block(&mut self, id: u32, address: u32, bytes: &[u8]) {
        self.0.push(Event::ReadBlock(id, address, bytes.len()));
    }
}

/// A settings block with a valid checksum and the given table of contents.
pub fn settings_block(timezone: u8, toc: &[u8]) -> Vec<u8> {
    let mut b = vec![0; BLOCK_SIZE];
    b[0] = 0x3c;
    b[1] = 0xc3;
    b[3] = timezone;
    b[14] = 5;
    b[0x1a] = 2;
    b[0x5d] = 1;
    b[0x60..0x60 + FIRMWARE.len()].copy_from_slice(FIRMWARE.as_bytes());
    b[0x100..0x200].fill(0xff);
    b[0x100..0x100 + toc.len()].copy_from_slice(toc);
    b
}

/// A workout header with fixed statistics, starting at the given time.
pub fn header([year, month, day, hour, minute, second]: [u8; 6], samples: u16) -> Vec<u8> {
    let mut h = vec![0; 64];
    h[0..2].copy_from_slice(&samples.to_le_bytes());
    h[2] = 3;
    h[3..9].copy_from_slice(&[second, minute, hour, day, month, year]);
    // 1:02:03 elapsed
    h[9..12].copy_from_slice(&[3, 2, 1]);
    h[15] = 2;
    h[16..20].copy_from_slice(&12_345u32.to_le_bytes());
    h[20..22].copy_from_slice(&101u16.to_le_bytes());
    h[22..24].copy_from_slice(&180u16.to_le_bytes());
    h[28] = 140;
    h[29] = 172;
    h[30] = 96;
    h[32..36].copy_from_slice(&789u32.to_le_bytes());
    // 0:10:00 below, 0:45:30 in, 0:06:33 above
    h[36..39].copy_from_slice(&[0, 10, 0]);
    h[40..43].copy_from_slice(&[30, 45, 0]);
    h[44..47].copy_from_slice(&[33, 6, 0]);
    h
}

/// A workout spanning `blocks` blocks: a header block, then samples.
pub fn workout(header: &[u8], samples: &[u8], blocks: usize) -> Vec<u8> {
    let mut w = vec![0xff; blocks * BLOCK_SIZE];
    w[..header.len()].copy_from_slice(header);
    w[SAMPLES_OFFSET..SAMPLES_OFFSET + samples.len()].copy_from_slice(samples);
    w
}

/// A workout buffer ending right after its samples.
pub fn bare_workout(header: &[u8], samples: &[u8]) -> Vec<u8> {
    let mut w = vec![0; SAMPLES_OFFSET];
    w[..header.len()].copy_from_slice(header);
    w.extend_from_slice(samples);
    w
}

fn fix_record(tag: u8, status: u8, time: [u8; 6], pos: (i32, i32, i16), hr: u8) -> Vec<u8> {
    let mut r = vec![tag, status];
    r.extend_from_slice(&time);
    r.extend_from_slice(&pos.0.to_le_bytes());
    r.extend_from_slice(&pos.1.to_le_bytes());
    r.extend_from_slice(&pos.2.to_le_bytes());
    r.extend_from_slice(&90u16.to_le_bytes());
    r.extend_from_slice(&25u16.to_le_bytes());
    r.extend_from_slice(&7u16.to_le_bytes());
    r.push(hr);
    r
}

pub fn full(status: u8, time: [u8; 6], pos: (i32, i32, i16), hr: u8) -> Vec<u8> {
    fix_record(0x00, status, time, pos, hr)
}

pub fn none(status: u8, time: [u8; 6], pos: (i32, i32, i16), hr: u8) -> Vec<u8> {
    fix_record(0x80, status, time, pos, hr)
}

pub fn diff(status: u8, (minute, second): (u8, u8), delta: (i32, i32, i16), hr: u8) -> Vec<u8> {
    let mut r = vec![0x01, status, minute, second];
    r.extend_from_slice(&delta.0.to_le_bytes());
    r.extend_from_slice(&delta.1.to_le_bytes());
    r.extend_from_slice(&delta.2.to_le_bytes());
    r.extend_from_slice(&90u16.to_le_bytes());
    r.extend_from_slice(&25u16.to_le_bytes());
    r.extend_from_slice(&7u16.to_le_bytes());
    r.push(hr);
    r
}

pub fn time_only(minute: u8, second: u8) -> Vec<u8> {
    vec![0x02, minute, second]
}

pub fn hr_only(time: [u8; 6], hr: u8) -> Vec<u8> {
    let mut r = vec![0x03];
    r.extend_from_slice(&time);
    r.push(hr);
    r
}

pub const END: u8 = 0xff;

pub fn stream(records: &[Vec<u8>]) -> Vec<u8> {
    let mut s: Vec<u8> = records.concat();
    s.push(END);
    s
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}
