// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Tests for MODE SELECT.

use super::test_helpers::check_invalid_field_bit;
use super::test_helpers::check_sense;
use super::test_helpers::check_submit_failed;
use super::test_helpers::check_submit_issue;
use super::test_helpers::check_submit_pass;
use super::test_helpers::disk;
use super::test_helpers::new_device;
use crate::AtaScsiDevice;
use crate::DataDirection;
use crate::SenseBuffer;
use crate::SenseFormat;
use ata_defs::AtaCommand;
use ata_defs::AtaProtocol;
use scsi::AdditionalSenseCode;
use scsi::ScsiOp;
use scsi::SenseKey;
use scsi_defs as scsi;

/// PF set, SP clear.
const PF: u8 = 0x10;

fn select6(flags: u8, len: usize) -> [u8; 6] {
    [ScsiOp::MODE_SELECT.0, flags, 0, 0, len as u8, 0]
}

fn select10(flags: u8, len: usize) -> [u8; 10] {
    let mut cdb = [0u8; 10];
    cdb[0] = ScsiOp::MODE_SELECT10.0;
    cdb[1] = flags;
    cdb[7..9].copy_from_slice(&(len as u16).to_be_bytes());
    cdb
}

/// The caching page as currently reported for the test disk, with the given
/// WCE value.
fn caching_page(wce: bool) -> Vec<u8> {
    let mut page = vec![0u8; 20];
    page[0] = scsi::MODE_PAGE_CACHING;
    page[1] = 18;
    if wce {
        page[2] = scsi::MODE_CACHING_WRITE_CACHE_ENABLE;
    }
    page
}

fn control_page(d_sense: bool) -> Vec<u8> {
    let mut page = vec![
        scsi::MODE_PAGE_CONTROL,
        10,
        // GLTSD.
        0x02,
        0,
        0,
        0,
        0,
        0,
        0xff,
        0xff,
        0,
        30,
    ];
    if d_sense {
        page[2] |= scsi::MODE_CONTROL_D_SENSE;
    }
    page
}

/// A six-byte parameter list: header, then `rest`.
fn params6(rest: &[u8]) -> Vec<u8> {
    let mut params = vec![0u8; 4];
    params.extend_from_slice(rest);
    params
}

fn select_page(device: &AtaScsiDevice, page: &[u8]) -> SenseBuffer {
    let mut params = params6(page);
    check_submit_failed(device, &select6(PF, params.len()), &mut params)
}

fn check_invalid_parameter(sense: &SenseBuffer, byte: u16) {
    check_sense(
        sense,
        SenseKey::ILLEGAL_REQUEST,
        AdditionalSenseCode::INVALID_FIELD_PARAMETER_LIST,
    );
    let data = sense.as_bytes();
    // SKSV without C/D.
    assert_eq!(data[15] & 0xc0, 0x80, "sense: {:?}", sense);
    assert_eq!(u16::from_be_bytes([data[16], data[17]]), byte, "sense: {:?}", sense);
}

#[test]
fn write_cache_disable() {
    let device = new_device(disk());
    let mut params = params6(&caching_page(false));
    let pending = check_submit_issue(
        &device,
        &select6(PF, params.len()),
        DataDirection::ToDevice,
        &mut params,
    );
    let tf = pending.taskfile();
    assert_eq!(tf.command, AtaCommand::SET_FEATURES);
    assert_eq!(tf.protocol, AtaProtocol::NODATA);
    assert_eq!(tf.regs.feature, ata_defs::SETFEATURES_WC_OFF);
}

#[test]
fn write_cache_enable_with_block_descriptor() {
    let device = new_device(disk());
    let mut params = vec![0u8; 8];
    params[7] = 8;
    params.extend_from_slice(&[0, 0, 0, 0, 0, 0, 2, 0]);
    params.extend_from_slice(&caching_page(true));
    let pending = check_submit_issue(
        &device,
        &select10(PF, params.len()),
        DataDirection::ToDevice,
        &mut params,
    );
    assert_eq!(
        pending.taskfile().regs.feature,
        ata_defs::SETFEATURES_WC_ON
    );
}

#[test]
fn descriptor_sense_switch() {
    let device = new_device(disk());
    assert!(!device.descriptor_sense());

    let mut params = params6(&control_page(true));
    let cdb = select6(PF, params.len());
    assert_eq!(check_submit_pass(&device, &cdb, &mut params), 0);
    assert!(device.descriptor_sense());

    // Errors now use descriptor format.
    let mut data = [0u8; 0];
    let sense = check_submit_failed(&device, &[0xff, 0, 0, 0, 0, 0], &mut data);
    assert_eq!(sense.format(), SenseFormat::Descriptor);
    assert_eq!(sense.as_bytes()[0], 0x72);
    check_sense(
        &sense,
        SenseKey::ILLEGAL_REQUEST,
        AdditionalSenseCode::ILLEGAL_COMMAND,
    );

    // And back. The current page now has D_SENSE set.
    let mut params = params6(&control_page(false));
    assert_eq!(check_submit_pass(&device, &cdb, &mut params), 0);
    assert!(!device.descriptor_sense());
}

#[test]
fn header_only() {
    let device = new_device(disk());
    let mut params = params6(&[]);
    assert_eq!(
        check_submit_pass(&device, &select6(PF, params.len()), &mut params),
        0
    );
}

#[test]
fn cdb_flags() {
    let device = new_device(disk());
    let mut params = params6(&caching_page(true));

    // SP.
    let sense = check_submit_failed(&device, &select6(PF | 1, params.len()), &mut params);
    check_invalid_field_bit(&sense, 1, 0);

    // PF clear.
    let sense = check_submit_failed(&device, &select6(0, params.len()), &mut params);
    check_invalid_field_bit(&sense, 1, 4);
}

#[test]
fn short_parameter_list() {
    let device = new_device(disk());
    let mut params = params6(&caching_page(true));
    let sense = check_submit_failed(&device, &select6(PF, params.len() + 4), &mut params);
    check_sense(
        &sense,
        SenseKey::ILLEGAL_REQUEST,
        AdditionalSenseCode::PARAMETER_LIST_LENGTH,
    );

    // The page is cut off.
    let sense = check_submit_failed(&device, &select6(PF, 10), &mut params);
    check_sense(
        &sense,
        SenseKey::ILLEGAL_REQUEST,
        AdditionalSenseCode::PARAMETER_LIST_LENGTH,
    );
}

#[test]
fn bad_block_descriptor_length() {
    let device = new_device(disk());
    let mut params = vec![0, 0, 0, 4, 0, 0, 0, 0];
    params.extend_from_slice(&caching_page(true));
    let sense = check_submit_failed(&device, &select6(PF, params.len()), &mut params);
    check_invalid_parameter(&sense, 3);
}

#[test]
fn unchangeable_fields() {
    let device = new_device(disk());

    // RCD is not changeable; the first body byte is at offset 6.
    let mut page = caching_page(true);
    page[2] |= 0x01;
    check_invalid_parameter(&select_page(&device, &page), 6);

    // Busy timeout.
    let mut page = control_page(false);
    page[8] = 0;
    check_invalid_parameter(&select_page(&device, &page), 12);
}

#[test]
fn page_layout_errors() {
    let device = new_device(disk());

    // A short page points past its end, a long one past the expected end.
    let mut page = caching_page(true);
    page[1] = 10;
    page.truncate(12);
    check_invalid_parameter(&select_page(&device, &page), 16);
    let mut page = caching_page(true);
    page[1] = 20;
    page.extend_from_slice(&[0, 0]);
    check_invalid_parameter(&select_page(&device, &page), 24);

    // Only one page per command.
    let mut page = caching_page(true);
    page.extend_from_slice(&[0, 0]);
    check_invalid_parameter(&select_page(&device, &page), 24);

    // The page itself is checked first.
    let mut page = caching_page(true);
    page[2] |= 0x01;
    page.extend_from_slice(&[0, 0]);
    check_invalid_parameter(&select_page(&device, &page), 6);

    // Not a changeable page.
    let mut page = vec![0u8; 12];
    page[0] = scsi::MODE_PAGE_ERROR_RECOVERY;
    page[1] = 10;
    check_invalid_parameter(&select_page(&device, &page), 4);

    // A subpage other than 0.
    let mut page = vec![0u8; 8];
    page[0] = scsi::MODE_PAGE_CONTROL | scsi::MODE_PAGE_SUBPAGE_FORMAT;
    page[1] = 1;
    page[3] = 4;
    check_invalid_parameter(&select_page(&device, &page), 5);
}
