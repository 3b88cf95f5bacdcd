// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Tests for commands translated into ATA task files.

use super::test_helpers::check_invalid_field;
use super::test_helpers::check_invalid_field_bit;
use super::test_helpers::check_sense;
use super::test_helpers::check_submit_failed;
use super::test_helpers::check_submit_issue;
use super::test_helpers::check_submit_pass;
use super::test_helpers::disk;
use super::test_helpers::identify_chs_disk;
use super::test_helpers::identify_disk;
use super::test_helpers::identify_dvd;
use super::test_helpers::new_device;
use super::test_helpers::new_device_with;
use super::test_helpers::request;
use crate::DataDirection;
use crate::DeviceClass;
use crate::DeviceSnapshot;
use crate::Disposition;
use crate::IoPriority;
use crate::Request;
use crate::SatlParameters;
use ata_defs::AtaCommand;
use ata_defs::AtaProtocol;
use ata_defs::DEVICE_FPDMA_FUA;
use ata_defs::DEVICE_LBA;
use scsi::AdditionalSenseCode;
use scsi::ScsiOp;
use scsi::SenseKey;
use scsi_defs as scsi;

fn cdb10(op: ScsiOp, lba: u32, blocks: u16) -> [u8; 10] {
    let mut cdb = [0u8; 10];
    cdb[0] = op.0;
    cdb[2..6].copy_from_slice(&lba.to_be_bytes());
    cdb[7..9].copy_from_slice(&blocks.to_be_bytes());
    cdb
}

fn cdb16(op: ScsiOp, lba: u64, blocks: u32) -> [u8; 16] {
    let mut cdb = [0u8; 16];
    cdb[0] = op.0;
    cdb[2..10].copy_from_slice(&lba.to_be_bytes());
    cdb[10..14].copy_from_slice(&blocks.to_be_bytes());
    cdb
}

fn zoned_disk() -> DeviceSnapshot {
    DeviceSnapshot::from_identify(DeviceClass::Zac, &identify_disk())
}

fn dvd() -> DeviceSnapshot {
    DeviceSnapshot::from_identify(DeviceClass::Atapi, &identify_dvd())
}

#[test]
fn read10_lba28() {
    let device = new_device(disk());
    let mut data = [0u8; 4096];
    let pending = check_submit_issue(
        &device,
        &cdb10(ScsiOp::READ, 0x1000, 8),
        DataDirection::FromDevice,
        &mut data,
    );
    let tf = pending.taskfile();
    assert_eq!(tf.command, AtaCommand::READ_DMA);
    assert_eq!(tf.protocol, AtaProtocol::DMA);
    assert_eq!(tf.regs.lba28(), 0x1000);
    assert_eq!(tf.regs.nsect, 8);
    assert_ne!(tf.regs.device & DEVICE_LBA, 0);
    assert!(tf.flags.lba());
    assert!(!tf.flags.lba48());
    assert!(!tf.flags.write());
    assert_eq!(tf.transfer_len, 4096);
}

#[test]
fn write16_lba48() {
    let device = new_device(disk());
    let mut data = [0u8; 8192];
    let pending = check_submit_issue(
        &device,
        &cdb16(ScsiOp::WRITE16, 0x1_0000_0000, 16),
        DataDirection::ToDevice,
        &mut data,
    );
    let tf = pending.taskfile();
    assert_eq!(tf.command, AtaCommand::WRITE_DMA_EXT);
    assert_eq!(tf.regs.lba48(), 0x1_0000_0000);
    assert_eq!(tf.regs.sector_count48(), 16);
    assert!(tf.flags.lba48());
    assert!(tf.flags.write());
}

#[test]
fn read6_zero_length_is_256_blocks() {
    let device = new_device(disk());
    let mut data = vec![0u8; 256 * 512];
    let pending = check_submit_issue(
        &device,
        &[ScsiOp::READ6.0, 0, 0, 0x10, 0, 0],
        DataDirection::FromDevice,
        &mut data,
    );
    let tf = pending.taskfile();
    assert_eq!(tf.command, AtaCommand::READ_DMA);
    assert_eq!(tf.regs.lba28(), 0x10);
    // A 28-bit count of zero is 256.
    assert_eq!(tf.regs.nsect, 0);
    assert_eq!(tf.transfer_len, 256 * 512);
}

#[test]
fn read_write_errors() {
    let device = new_device(disk());

    // The data buffer cannot hold the transfer.
    let mut data = [0u8; 512];
    let sense = check_submit_failed(&device, &cdb10(ScsiOp::READ, 0, 8), &mut data);
    check_invalid_field(&sense, 0);

    let sense = check_submit_failed(
        &device,
        &cdb16(ScsiOp::READ16, ata_defs::LBA48_LIMIT, 1),
        &mut data,
    );
    check_sense(
        &sense,
        SenseKey::ILLEGAL_REQUEST,
        AdditionalSenseCode::ILLEGAL_BLOCK,
    );

    // FUA needs a 48-bit command.
    let mut cdb = cdb10(ScsiOp::WRITE, 0, 1);
    cdb[1] = 0x08;
    let sense = check_submit_failed(&device, &cdb, &mut data);
    check_invalid_field(&sense, 0);
}

#[test]
fn zero_blocks_complete_immediately() {
    let device = new_device(disk());
    let mut data = [0u8; 0];
    assert_eq!(
        check_submit_pass(&device, &cdb10(ScsiOp::WRITE, 0x100, 0), &mut data),
        0
    );
    assert_eq!(
        check_submit_pass(&device, &cdb10(ScsiOp::VERIFY, 0x100, 0), &mut data),
        0
    );
}

#[test]
fn ncq_tag_and_priority() {
    let mut dev = disk();
    dev.caps.set_ncq(true);
    dev.caps.set_ncq_prio(true);
    let device = new_device(dev);
    let mut data = [0u8; 4096];
    let mut cdb = cdb10(ScsiOp::WRITE, 0x2000, 8);
    // FUA.
    cdb[1] = 0x08;
    let req = Request {
        cdb: &cdb,
        direction: DataDirection::ToDevice,
        tag: 7,
        priority: IoPriority::RealTime,
    };
    let Disposition::Issue(pending) = device.submit(&req, &mut data) else {
        panic!("not issued");
    };
    let tf = pending.taskfile();
    assert_eq!(tf.command, AtaCommand::WRITE_FPDMA_QUEUED);
    assert_eq!(tf.protocol, AtaProtocol::NCQ);
    assert_eq!(tf.regs.nsect, 7 << 3);
    assert_eq!(tf.regs.feature48(), 8);
    assert_eq!(tf.regs.device, DEVICE_LBA | DEVICE_FPDMA_FUA);
    assert_eq!(tf.regs.hob_nsect, 0x80);
    assert_eq!(tf.regs.lba48(), 0x2000);
}

#[test]
fn verify_lba() {
    let device = new_device(disk());
    let mut data = [0u8; 0];
    let pending = check_submit_issue(
        &device,
        &cdb10(ScsiOp::VERIFY, 0x100, 8),
        DataDirection::None,
        &mut data,
    );
    let tf = pending.taskfile();
    assert_eq!(tf.command, AtaCommand::READ_VERIFY_SECTORS);
    assert_eq!(tf.protocol, AtaProtocol::NODATA);
    assert_eq!(tf.regs.lba28(), 0x100);
    assert_eq!(tf.regs.nsect, 8);
    assert_eq!(tf.transfer_len, 0);

    let pending = check_submit_issue(
        &device,
        &cdb16(ScsiOp::VERIFY16, 0x1000_0000, 1),
        DataDirection::None,
        &mut data,
    );
    assert_eq!(
        pending.taskfile().command,
        AtaCommand::READ_VERIFY_SECTORS_EXT
    );

    // The last block is fine, one past it is not.
    let n = super::test_helpers::DISK_SECTORS;
    check_submit_issue(
        &device,
        &cdb16(ScsiOp::VERIFY16, n - 1, 1),
        DataDirection::None,
        &mut data,
    );
    let sense = check_submit_failed(&device, &cdb16(ScsiOp::VERIFY16, n - 1, 2), &mut data);
    check_sense(
        &sense,
        SenseKey::ILLEGAL_REQUEST,
        AdditionalSenseCode::ILLEGAL_BLOCK,
    );
}

#[test]
fn verify_chs() {
    let dev = DeviceSnapshot::from_identify(DeviceClass::Ata, &identify_chs_disk());
    let device = new_device(dev);
    let mut data = [0u8; 0];
    let lba = (2 * 16 + 3) * 63 + 4;
    let pending = check_submit_issue(
        &device,
        &cdb10(ScsiOp::VERIFY, lba, 1),
        DataDirection::None,
        &mut data,
    );
    let tf = pending.taskfile();
    assert_eq!(tf.command, AtaCommand::READ_VERIFY_SECTORS);
    assert!(!tf.flags.lba());
    assert_eq!(tf.regs.lbal, 5);
    assert_eq!(tf.regs.lbam, 2);
    assert_eq!(tf.regs.lbah, 0);
    assert_eq!(tf.regs.device & 0xf, 3);
    assert_eq!(tf.regs.device & DEVICE_LBA, 0);
}

#[test]
fn synchronize_cache() {
    let device = new_device(disk());
    let mut data = [0u8; 0];
    let cdb = cdb10(ScsiOp::SYNCHRONIZE_CACHE, 0, 0);
    let pending = check_submit_issue(&device, &cdb, DataDirection::None, &mut data);
    assert_eq!(pending.taskfile().command, AtaCommand::FLUSH_CACHE_EXT);
    assert_eq!(pending.taskfile().protocol, AtaProtocol::NODATA);

    let mut dev = disk();
    dev.caps.set_flush_ext(false);
    let device = new_device(dev.clone());
    let pending = check_submit_issue(&device, &cdb, DataDirection::None, &mut data);
    assert_eq!(pending.taskfile().command, AtaCommand::FLUSH_CACHE);

    // Nothing to flush.
    dev.caps.set_flush(false);
    dev.caps.set_write_cache(false);
    let device = new_device(dev);
    assert_eq!(check_submit_pass(&device, &cdb, &mut data), 0);
}

#[test]
fn start_stop_unit() {
    let device = new_device(disk());
    let mut data = [0u8; 0];
    let start = [ScsiOp::START_STOP_UNIT.0, 0, 0, 0, 1, 0];
    let stop = [ScsiOp::START_STOP_UNIT.0, 0, 0, 0, 0, 0];

    let pending = check_submit_issue(&device, &start, DataDirection::None, &mut data);
    let tf = pending.taskfile();
    assert_eq!(tf.command, AtaCommand::READ_VERIFY_SECTORS);
    assert_eq!(tf.regs.nsect, 1);
    assert_eq!(tf.regs.lba28(), 0);
    assert_ne!(tf.regs.device & DEVICE_LBA, 0);

    let pending = check_submit_issue(&device, &stop, DataDirection::None, &mut data);
    assert_eq!(pending.taskfile().command, AtaCommand::STANDBY_IMMEDIATE);

    // LOEJ.
    let sense = check_submit_failed(
        &device,
        &[ScsiOp::START_STOP_UNIT.0, 0, 0, 0, 2, 0],
        &mut data,
    );
    check_invalid_field_bit(&sense, 4, 1);

    // Power conditions.
    let sense = check_submit_failed(
        &device,
        &[ScsiOp::START_STOP_UNIT.0, 0, 0, 0, 0x11, 0],
        &mut data,
    );
    check_invalid_field_bit(&sense, 4, 3);

    // Truncated.
    let sense = check_submit_failed(&device, &[ScsiOp::START_STOP_UNIT.0, 0, 0, 0, 1], &mut data);
    check_invalid_field(&sense, 5);

    let device = new_device_with(
        disk(),
        SatlParameters {
            skip_spindown: Some(true),
            ..Default::default()
        },
    );
    assert_eq!(check_submit_pass(&device, &stop, &mut data), 0);
}

#[test]
fn write_same_unmap_trim() {
    let device = new_device(disk());
    let mut cdb = cdb16(ScsiOp::WRITE_SAME16, 0x1000, 2 * 0xffff + 2);
    // UNMAP.
    cdb[1] = 0x08;
    let mut data = [0xffu8; 512];
    let pending = check_submit_issue(&device, &cdb, DataDirection::ToDevice, &mut data);
    let tf = pending.taskfile();
    assert_eq!(tf.command, AtaCommand::DSM);
    assert_eq!(tf.protocol, AtaProtocol::DMA);
    assert_eq!(tf.regs.feature, ata_defs::DSM_TRIM);
    assert_eq!(tf.regs.sector_count48(), 1);
    assert_eq!(tf.transfer_len, 512);
    assert!(tf.flags.write());

    // Three ranges, the rest of the sector zeroed.
    let entry = |i: usize| u64::from_le_bytes(data[i * 8..i * 8 + 8].try_into().unwrap());
    assert_eq!(entry(0), 0xffff << 48 | 0x1000);
    assert_eq!(entry(1), 0xffff << 48 | (0x1000 + 0xffff));
    assert_eq!(entry(2), 2 << 48 | (0x1000 + 2 * 0xffff));
    assert!(data[24..].iter().all(|&b| b == 0));
}

#[test]
fn write_same_ncq_trim() {
    let mut dev = disk();
    dev.caps.set_ncq(true);
    dev.caps.set_ncq_trim(true);
    let device = new_device(dev);
    let mut cdb = cdb16(ScsiOp::WRITE_SAME16, 0, 8);
    cdb[1] = 0x08;
    let mut data = [0u8; 512];
    let pending = check_submit_issue(&device, &cdb, DataDirection::ToDevice, &mut data);
    let tf = pending.taskfile();
    assert_eq!(tf.command, AtaCommand::SEND_FPDMA_QUEUED);
    assert_eq!(tf.protocol, AtaProtocol::NCQ);
    assert_eq!(tf.regs.hob_nsect, ata_defs::SUBCMD_FPDMA_SEND_DSM);
    assert_eq!(tf.regs.feature48(), 1);
    assert_eq!(tf.auxiliary, 1);
}

#[test]
fn write_same_errors() {
    let device = new_device(disk());
    let mut data = [0u8; 512];

    // Without UNMAP.
    let cdb = cdb16(ScsiOp::WRITE_SAME16, 0, 8);
    let sense = check_submit_failed(&device, &cdb, &mut data);
    check_invalid_field_bit(&sense, 1, 3);

    let mut cdb = cdb16(ScsiOp::WRITE_SAME16, 0, 0xffff * 64 + 1);
    cdb[1] = 0x08;
    let sense = check_submit_failed(&device, &cdb, &mut data);
    check_invalid_field(&sense, 2);

    let mut cdb = cdb16(ScsiOp::WRITE_SAME16, 0, 8);
    cdb[1] = 0x08;
    let mut short = [0u8; 100];
    let sense = check_submit_failed(&device, &cdb, &mut short);
    check_sense(
        &sense,
        SenseKey::ILLEGAL_REQUEST,
        AdditionalSenseCode::PARAMETER_LIST_LENGTH,
    );

    let mut dev = disk();
    dev.quirks.set_no_trim(true);
    let device = new_device(dev);
    let sense = check_submit_failed(&device, &cdb, &mut data);
    check_invalid_field_bit(&sense, 1, 3);
}

fn trusted_disk() -> DeviceSnapshot {
    let mut identify = identify_disk();
    identify.trusted_computing.set(0x4001);
    DeviceSnapshot::from_identify(DeviceClass::Ata, &identify)
}

fn security_cdb(op: ScsiOp, protocol: u8, specific: u16, inc_512: bool, len: u32) -> [u8; 12] {
    let mut cdb = [0u8; 12];
    cdb[0] = op.0;
    cdb[1] = protocol;
    cdb[2..4].copy_from_slice(&specific.to_be_bytes());
    cdb[4] = if inc_512 { 0x80 } else { 0 };
    cdb[6..10].copy_from_slice(&len.to_be_bytes());
    cdb
}

#[test]
fn security_protocol_in_out() {
    let dev = trusted_disk();
    assert!(dev.caps.trusted());
    let device = new_device(dev);
    let mut data = [0u8; 1024];

    let cdb = security_cdb(ScsiOp::SECURITY_PROTOCOL_IN, 1, 0x0001, false, 512);
    let pending = check_submit_issue(&device, &cdb, DataDirection::FromDevice, &mut data);
    let tf = pending.taskfile();
    assert_eq!(tf.command, AtaCommand::TRUSTED_RECEIVE_DMA);
    assert_eq!(tf.protocol, AtaProtocol::DMA);
    assert_eq!(tf.regs.feature, 1);
    assert_eq!((tf.regs.lbam, tf.regs.lbah), (1, 0));
    assert_eq!((tf.regs.nsect, tf.regs.lbal), (1, 0));
    assert_eq!(tf.transfer_len, 512);

    // Two 512-byte blocks out.
    let cdb = security_cdb(ScsiOp::SECURITY_PROTOCOL_OUT, 2, 0x0100, true, 2);
    let pending = check_submit_issue(&device, &cdb, DataDirection::ToDevice, &mut data);
    let tf = pending.taskfile();
    assert_eq!(tf.command, AtaCommand::TRUSTED_SEND_DMA);
    assert_eq!(tf.regs.nsect, 2);
    assert_eq!(tf.regs.lbah, 1);
    assert_eq!(tf.transfer_len, 1024);
    assert!(tf.flags.write());

    // No data.
    let cdb = security_cdb(ScsiOp::SECURITY_PROTOCOL_IN, 0, 0, false, 0);
    let pending = check_submit_issue(&device, &cdb, DataDirection::None, &mut data);
    let tf = pending.taskfile();
    assert_eq!(tf.command, AtaCommand::TRUSTED_NON_DATA);
    assert_eq!(tf.protocol, AtaProtocol::NODATA);
    assert_eq!(tf.regs.lbah, 0x80);
}

#[test]
fn security_protocol_errors() {
    let device = new_device(trusted_disk());
    let mut data = [0u8; 512];

    let cdb = security_cdb(
        ScsiOp::SECURITY_PROTOCOL_IN,
        scsi::SECURITY_PROTOCOL_ATA_PASSWORD,
        0,
        false,
        512,
    );
    let sense = check_submit_failed(&device, &cdb, &mut data);
    check_invalid_field_bit(&sense, 1, 0);

    let cdb = security_cdb(ScsiOp::SECURITY_PROTOCOL_IN, 1, 0, true, 0x1_0000);
    let sense = check_submit_failed(&device, &cdb, &mut data);
    check_invalid_field_bit(&sense, 6, 0);

    // Not supported by the device.
    let device = new_device(disk());
    let cdb = security_cdb(ScsiOp::SECURITY_PROTOCOL_IN, 1, 0, false, 512);
    let sense = check_submit_failed(&device, &cdb, &mut data);
    check_sense(
        &sense,
        SenseKey::ILLEGAL_REQUEST,
        AdditionalSenseCode::ILLEGAL_COMMAND,
    );
}

fn zbc_cdb(op: ScsiOp, action: u8, zone: u64, len: u32, options: u8) -> [u8; 16] {
    let mut cdb = [0u8; 16];
    cdb[0] = op.0;
    cdb[1] = action;
    cdb[2..10].copy_from_slice(&zone.to_be_bytes());
    cdb[10..14].copy_from_slice(&len.to_be_bytes());
    cdb[14] = options;
    cdb
}

#[test]
fn report_zones() {
    let device = new_device(zoned_disk());
    let mut data = vec![0u8; 4096];
    // PARTIAL and a reserved bit.
    let cdb = zbc_cdb(ScsiOp::ZBC_IN, 0, 0x8_0000, 4096, 0xc1);
    let pending = check_submit_issue(&device, &cdb, DataDirection::FromDevice, &mut data);
    let tf = pending.taskfile();
    assert_eq!(tf.command, AtaCommand::ZAC_MANAGEMENT_IN);
    assert_eq!(tf.protocol, AtaProtocol::DMA);
    assert_eq!(tf.regs.feature, ata_defs::SUBCMD_ZAC_MGMT_IN_REPORT_ZONES);
    assert_eq!(tf.regs.hob_feature, 0x81);
    assert_eq!(tf.regs.sector_count48(), 8);
    assert_eq!(tf.regs.lba48(), 0x8_0000);
    assert_eq!(tf.transfer_len, 4096);
    assert!(tf.flags.result_tf());
}

#[test]
fn report_zones_ncq() {
    let mut dev = zoned_disk();
    dev.caps.set_ncq(true);
    dev.caps.set_ncq_zac_mgmt_in(true);
    let device = new_device(dev);
    let mut data = vec![0u8; 1024];
    let cdb = zbc_cdb(ScsiOp::ZBC_IN, 0, 0, 1024, 0x02);
    let req = Request {
        tag: 3,
        ..request(&cdb, DataDirection::FromDevice)
    };
    let Disposition::Issue(pending) = device.submit(&req, &mut data) else {
        panic!("not issued");
    };
    let tf = pending.taskfile();
    assert_eq!(tf.command, AtaCommand::RECEIVE_FPDMA_QUEUED);
    assert_eq!(tf.protocol, AtaProtocol::NCQ);
    assert_eq!(tf.regs.hob_nsect, ata_defs::SUBCMD_FPDMA_RECV_ZAC_MGMT_IN);
    assert_eq!(tf.regs.nsect, 3 << 3);
    assert_eq!(tf.regs.feature48(), 2);
    assert_eq!(tf.auxiliary, 0x0200);
}

#[test]
fn report_zones_errors() {
    let device = new_device(zoned_disk());
    let mut data = vec![0u8; 4096];

    // Not a multiple of 512.
    let sense = check_submit_failed(
        &device,
        &zbc_cdb(ScsiOp::ZBC_IN, 0, 0, 1000, 0),
        &mut data[..1000],
    );
    check_sense(
        &sense,
        SenseKey::ILLEGAL_REQUEST,
        AdditionalSenseCode::PARAMETER_LIST_LENGTH,
    );

    // Larger than the buffer.
    let sense = check_submit_failed(
        &device,
        &zbc_cdb(ScsiOp::ZBC_IN, 0, 0, 8192, 0),
        &mut data,
    );
    check_sense(
        &sense,
        SenseKey::ILLEGAL_REQUEST,
        AdditionalSenseCode::PARAMETER_LIST_LENGTH,
    );

    // Smaller than the buffer.
    let sense = check_submit_failed(
        &device,
        &zbc_cdb(ScsiOp::ZBC_IN, 0, 0, 512, 0),
        &mut data,
    );
    check_sense(
        &sense,
        SenseKey::ILLEGAL_REQUEST,
        AdditionalSenseCode::PARAMETER_LIST_LENGTH,
    );

    let sense = check_submit_failed(
        &device,
        &zbc_cdb(ScsiOp::ZBC_IN, 5, 0, 4096, 0),
        &mut data,
    );
    check_invalid_field(&sense, 1);

    // Not a zoned device.
    let device = new_device(disk());
    let sense = check_submit_failed(
        &device,
        &zbc_cdb(ScsiOp::ZBC_IN, 0, 0, 512, 0),
        &mut data,
    );
    check_sense(
        &sense,
        SenseKey::ILLEGAL_REQUEST,
        AdditionalSenseCode::ILLEGAL_COMMAND,
    );
}

#[test]
fn zone_management() {
    let device = new_device(zoned_disk());
    let mut data = [0u8; 0];
    let reset = scsi::zbc::ZbcOutServiceAction::RESET_WRITE_POINTER.0;

    let cdb = zbc_cdb(ScsiOp::ZBC_OUT, reset, 0x8_0000, 0, 0);
    let pending = check_submit_issue(&device, &cdb, DataDirection::None, &mut data);
    let tf = pending.taskfile();
    assert_eq!(tf.command, AtaCommand::ZAC_MANAGEMENT_OUT);
    assert_eq!(tf.protocol, AtaProtocol::NODATA);
    assert_eq!(tf.regs.feature, reset);
    assert_eq!(tf.regs.hob_feature, 0);
    assert_eq!(tf.regs.lba48(), 0x8_0000);

    // ALL ignores the zone ID.
    let cdb = zbc_cdb(ScsiOp::ZBC_OUT, reset, 0x1234, 0, scsi::zbc::ZBC_OUT_ALL);
    let pending = check_submit_issue(&device, &cdb, DataDirection::None, &mut data);
    let tf = pending.taskfile();
    assert_eq!(tf.regs.hob_feature, 1);
    assert_eq!(tf.regs.lba48(), 0);
}

#[test]
fn zone_management_ncq() {
    let mut dev = zoned_disk();
    dev.caps.set_ncq(true);
    dev.caps.set_ncq_zac_mgmt_out(true);
    let device = new_device(dev);
    let mut data = [0u8; 0];
    let open = scsi::zbc::ZbcOutServiceAction::OPEN_ZONE.0;
    let cdb = zbc_cdb(ScsiOp::ZBC_OUT, open, 0, 0, scsi::zbc::ZBC_OUT_ALL);
    let pending = check_submit_issue(&device, &cdb, DataDirection::None, &mut data);
    let tf = pending.taskfile();
    assert_eq!(tf.command, AtaCommand::NCQ_NON_DATA);
    assert_eq!(tf.protocol, AtaProtocol::NCQ_NODATA);
    assert_eq!(tf.regs.feature, ata_defs::SUBCMD_NCQ_NON_DATA_ZAC_MGMT_OUT);
    assert_eq!(tf.auxiliary, open as u32 | 1 << 8);
}

#[test]
fn zone_management_errors() {
    let device = new_device(zoned_disk());
    let mut data = [0u8; 0];
    let close = scsi::zbc::ZbcOutServiceAction::CLOSE_ZONE.0;

    let sense = check_submit_failed(
        &device,
        &zbc_cdb(ScsiOp::ZBC_OUT, 0x10, 0, 0, 0),
        &mut data,
    );
    check_invalid_field(&sense, 1);

    let sense = check_submit_failed(
        &device,
        &zbc_cdb(ScsiOp::ZBC_OUT, close, super::test_helpers::DISK_SECTORS, 0, 0),
        &mut data,
    );
    check_invalid_field(&sense, 2);

    let sense = check_submit_failed(
        &device,
        &zbc_cdb(ScsiOp::ZBC_OUT, close, 0, 512, 0),
        &mut data,
    );
    check_sense(
        &sense,
        SenseKey::ILLEGAL_REQUEST,
        AdditionalSenseCode::PARAMETER_LIST_LENGTH,
    );
}

#[test]
fn atapi_inquiry_dma() {
    let device = new_device(dvd());
    let mut data = [0u8; 96];
    let cdb = [ScsiOp::INQUIRY.0, 0, 0, 0, 96, 0];
    let pending = check_submit_issue(&device, &cdb, DataDirection::FromDevice, &mut data);
    let tf = pending.taskfile();
    assert_eq!(tf.command, AtaCommand::PACKET);
    assert_eq!(tf.protocol, AtaProtocol::ATAPI_DMA);
    assert_eq!(tf.regs.feature, ata_defs::ATAPI_PKT_DMA);
    assert_eq!((tf.regs.lbam, tf.regs.lbah), (96, 0));
    assert_eq!(tf.transfer_len, 96);
    let packet = tf.packet.unwrap();
    assert_eq!(&packet[..6], &cdb);
    assert!(packet[6..].iter().all(|&b| b == 0));

    let mut dev = dvd();
    dev.caps.set_dmadir(true);
    let device = new_device(dev);
    let pending = check_submit_issue(&device, &cdb, DataDirection::FromDevice, &mut data);
    assert_eq!(
        pending.taskfile().regs.feature,
        ata_defs::ATAPI_PKT_DMA | ata_defs::ATAPI_DMADIR
    );
}

#[test]
fn atapi_byte_count() {
    let mut dev = dvd();
    dev.caps.set_dma(false);
    let device = new_device(dev);

    // Rounded up to even.
    let mut data = vec![0u8; 999];
    let cdb = cdb10(ScsiOp::READ, 0, 1);
    let pending = check_submit_issue(&device, &cdb, DataDirection::FromDevice, &mut data);
    let tf = pending.taskfile();
    assert_eq!(tf.protocol, AtaProtocol::ATAPI_PIO);
    assert_eq!(tf.regs.lbam as u16 | (tf.regs.lbah as u16) << 8, 1000);

    // Capped at 63 KiB.
    let mut data = vec![0u8; 1 << 20];
    let pending = check_submit_issue(&device, &cdb, DataDirection::FromDevice, &mut data);
    let tf = pending.taskfile();
    assert_eq!((tf.regs.lbam, tf.regs.lbah), (0x00, 0xfc));
    assert_eq!(tf.transfer_len, 1 << 20);

    let mut data = [0u8; 0];
    let pending = check_submit_issue(
        &device,
        &[ScsiOp::TEST_UNIT_READY.0, 0, 0, 0, 0, 0],
        DataDirection::None,
        &mut data,
    );
    assert_eq!(pending.taskfile().protocol, AtaProtocol::ATAPI_NODATA);
    assert_eq!(pending.taskfile().transfer_len, 0);
}

#[test]
fn atapi_cdb_length() {
    let device = new_device(dvd());
    let mut data = [0u8; 512];
    let submit = |device: &crate::AtaScsiDevice, cdb: &[u8], data: &mut [u8]| {
        device.submit(&request(cdb, DataDirection::FromDevice), data)
    };

    // A 16-byte command on a device with 12-byte packets.
    let cdb = cdb16(ScsiOp::READ16, 0, 1);
    assert!(matches!(
        submit(&device, &cdb, &mut data),
        Disposition::BadLength
    ));
    // Shorter than its group length.
    assert!(matches!(
        submit(&device, &[ScsiOp::READ.0, 0, 0], &mut data),
        Disposition::BadLength
    ));
    assert!(matches!(
        submit(&device, &[], &mut data),
        Disposition::BadLength
    ));

    // ATA PASS-THROUGH (16) goes to the device as an ATA command.
    let mut ata16 = [0u8; 16];
    ata16[0] = ScsiOp::ATA_PASSTHROUGH16.0;
    // Non-data.
    ata16[1] = 3 << 1;
    ata16[14] = AtaCommand::IDENTIFY_PACKET_DEVICE.0;
    let Disposition::Issue(pending) = submit(&device, &ata16, &mut data) else {
        panic!("not issued");
    };
    assert_eq!(
        pending.taskfile().command,
        AtaCommand::IDENTIFY_PACKET_DEVICE
    );

    // Unless the policy says to relay it.
    let device = new_device_with(
        dvd(),
        SatlParameters {
            atapi_passthru16: Some(false),
            ..Default::default()
        },
    );
    assert!(matches!(
        submit(&device, &ata16, &mut data),
        Disposition::BadLength
    ));
}

#[test]
fn ata_cdb_length() {
    let device = new_device(disk());
    let mut data = [0u8; 512];
    let cdb = [0u8; 33];
    assert!(matches!(
        device.submit(&request(&cdb, DataDirection::FromDevice), &mut data),
        Disposition::BadLength
    ));
}
