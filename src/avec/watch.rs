//! Sessions with a watch.

use crate::{
    layout::{EPO_BLOCK, TOC_LEN, TOC_OFFSET, WORKOUT_STATE_LEN, WORKOUT_STATE_OFFSET},
    sans::{
        epo::{self, EpoImage},
        settings::DeviceInfo,
        toc::SENTINEL,
    },
};

use super::{
    Device, Error, Sink,
    block::{MemoryBlock, read_blocks, write_blocks},
    decode_workout,
};

/// Marks the workout bookkeeping region as empty.
const NO_WORKOUTS: u8 = 0xfe;

/// A session with a watch over a [`Device`].
///
/// The session owns the device, which is released when the session is
/// dropped, on success or failure alike.
#[derive(Debug)]
pub struct Watch<D> {
    device: D,
}

impl<D: Device> Watch<D> {
    pub fn new(device: D) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// End the session, returning the device.
    pub fn into_inner(self) -> D {
        self.device
    }

    /// Read and decode the device information and every stored workout,
    /// publishing to a sink as entities are decoded.
    ///
    /// Any failure aborts the whole session.
    pub fn parse(&mut self, o: &mut impl Sink) -> Result<DeviceInfo, Error<D::Error>> {
        let version = self.device.read_version().map_err(Error::Device)?;

        let block0 = read_blocks(&mut self.device, 0, 1, o).map_err(Error::Device)?;
        let info = DeviceInfo::decode(block0.as_bytes(), version)?;

        tracing::info!(
            firmware = %info.firmware,
            version = %info.version,
            workouts = info.toc.len(),
            "Decoded device information"
        );

        o.on_device(&info);

        for (index, (first, count)) in info.toc.workouts().enumerate() {
            let b = read_blocks(&mut self.device, first, count, o).map_err(Error::Device)?;
            decode_workout(b.as_bytes(), index, (first, count), &info, o)?;
        }

        o.on_device_end(&info);

        Ok(info)
    }

    /// Remove every stored workout by rewriting the settings block with an
    /// empty table of contents.
    ///
    /// The read of the settings block is reported to the sink.
    pub fn clear_workouts(&mut self, o: &mut impl Sink) -> Result<(), Error<D::Error>> {
        // Confirms the device is responding before anything is erased.
        self.device.read_version().map_err(Error::Device)?;

        let mut b = read_blocks(&mut self.device, 0, 1, o).map_err(Error::Device)?;
        let memory = b.as_bytes_mut();

        let state = &mut memory[WORKOUT_STATE_OFFSET..WORKOUT_STATE_OFFSET + WORKOUT_STATE_LEN];
        state.fill(SENTINEL);
        state[0] = NO_WORKOUTS;

        memory[TOC_OFFSET..TOC_OFFSET + TOC_LEN].fill(SENTINEL);

        write_blocks(&mut self.device, &b).map_err(Error::Device)?;

        tracing::info!("Cleared workouts");

        Ok(())
    }

    /// Encode the contents of an EPO file and upload it, then update the
    /// expiry shown by the watch.
    ///
    /// A failed upload leaves the EPO region of the device erased.
    pub fn upload_epo(&mut self, data: &[u8]) -> Result<EpoImage, Error<D::Error>> {
        let image = epo::encode(data)?;

        tracing::info!(expiry = %image.expiry(), "EPO data valid until {}", image.expiry());

        let b = MemoryBlock::from_bytes(EPO_BLOCK, image.as_bytes().into());
        write_blocks(&mut self.device, &b).map_err(Error::Device)?;

        let (year, month, day) = image.expiry_date();
        self.device
            .set_epo_eol(year, month, day)
            .map_err(Error::Device)?;

        Ok(image)
    }

    /// Read an EPO file from a reader and upload it.
    ///
    /// _Requires Cargo feature `std`._
    #[cfg(feature = "std")]
    pub fn upload_epo_reader(
        &mut self,
        r: &mut impl std::io::Read,
    ) -> Result<EpoImage, Error<D::Error>> {
        let mut data = alloc::vec::Vec::new();
        r.read_to_end(&mut data)?;
        self.upload_epo(&data)
    }
}
