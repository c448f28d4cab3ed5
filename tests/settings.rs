mod support;

use chainring::{
    avec::{ErrorKind, Watch},
    sans::{
        settings::{DeviceInfo, SettingsError, verify_checksum},
        time::Timezone,
        toc::TocError,
    },
};
use support::{MockDevice, Recorder, settings_block};

#[test]
fn checksum_complement_passes() {
    verify_checksum(&[0x3c, 0xc3]).unwrap();
}

#[test]
fn checksum_mismatch_fails() {
    let err = verify_checksum(&[0x3c, 0xc4]).unwrap_err();
    assert_eq!(
        err,
        SettingsError::Checksum {
            value: 0x3c,
            check: 0xc4
        }
    );
}

#[test]
fn checksum_needs_two_bytes() {
    assert!(matches!(
        verify_checksum(&[0x3c]),
        Err(SettingsError::Truncated(_))
    ));
}

#[test]
fn decode_device_info() {
    let block = settings_block(0x1a, &[1, 2, 0xff, 3, 0xff, 0xff]);
    let info = DeviceInfo::decode(&block, "1.0".into()).unwrap();

    assert_eq!(info.version, "1.0");
    assert_eq!(info.firmware, support::FIRMWARE);
    assert_eq!(info.timezone, Timezone(0x1a));
    assert_eq!(info.offset.local_minus_utc(), 3600);
    assert_eq!(info.sample_interval, 5);
    assert_eq!(info.selected_profile, 2);
    assert_eq!(info.language, 1);
    assert_eq!(info.toc.entries(), &[2, 1]);
}

#[test]
fn timezone_offsets() {
    assert_eq!(Timezone(0x16).offset_seconds(), -3600);
    assert_eq!(Timezone(0x17).offset_seconds(), -1800);
    assert_eq!(Timezone(0x18).offset_seconds(), 0);
    assert_eq!(Timezone(0x1a).offset_seconds(), 3600);
    assert_eq!(Timezone(0x1c).offset_seconds(), 7200);
    assert_eq!(Timezone(0x1d).offset_seconds(), 9000);
    assert_eq!(Timezone(0x00).offset_seconds(), -12 * 3600);
}

#[test]
fn out_of_range_timezone_is_rejected() {
    let block = settings_block(0xff, &[0xff]);
    let err = DeviceInfo::decode(&block, String::new()).unwrap_err();
    assert_eq!(err, SettingsError::Timezone(0xff));
}

#[test]
fn malformed_toc_is_reported() {
    let mut block = settings_block(0x18, &[]);
    block[0x100..0x200].fill(0x01);
    let err = DeviceInfo::decode(&block, String::new()).unwrap_err();
    assert_eq!(
        err,
        SettingsError::Toc(TocError::Unterminated { offset: 0 })
    );
}

#[test]
fn session_aborts_on_checksum_mismatch() {
    let mut device = MockDevice::new(4);
    let mut block = settings_block(0x18, &[]);
    block[1] = 0xc4;
    device.load(0, &block);

    let mut recorder = Recorder::default();
    let err = Watch::new(device).parse(&mut recorder).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Integrity);
    assert!(recorder.decoded().is_empty());
}

#[test]
fn empty_history() {
    let mut device = MockDevice::new(4);
    device.load(0, &settings_block(0x18, &[0xff]));

    let mut recorder = Recorder::default();
    let info = Watch::new(device).parse(&mut recorder).unwrap();

    assert!(info.toc.is_empty());
    assert_eq!(recorder.decoded().len(), 2);
}
