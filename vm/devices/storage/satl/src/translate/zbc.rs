// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! ZBC IN (REPORT ZONES) and ZBC OUT, as ZAC MANAGEMENT IN and OUT.

use super::CompletionKind;
use super::Translation;
use crate::dispatch::Request;
use crate::parse_cdb;
use crate::taskfile::TaskfileRequest;
use crate::CommandContext;
use crate::ScsiError;
use ata_defs::zac::ZacReportZonesHeader;
use ata_defs::zac::ZacZoneDescriptor;
use ata_defs::zac::ZAC_REPORT_ZONES_ENTRY_LEN;
use ata_defs::AtaCommand;
use ata_defs::AtaProtocol;
use ata_defs::ATA_SECTOR_SIZE;
use ata_defs::DEVICE_LBA;
use scsi::zbc::ZbcInServiceAction;
use scsi::zbc::ZbcOutServiceAction;
use scsi_defs as scsi;
use zerocopy::FromBytes;
use zerocopy::IntoBytes;

/// A task file addressed to the zone starting at `zone`.
fn zone_taskfile(ctx: &CommandContext<'_>, zone: u64) -> TaskfileRequest {
    let mut tf = TaskfileRequest::new(ctx.dev, AtaCommand::NOP);
    tf.flags.set_isaddr(true);
    tf.flags.set_device(true);
    tf.flags.set_lba(true);
    tf.flags.set_lba48(true);
    tf.regs.set_lba48(zone);
    tf.regs.device = DEVICE_LBA;
    tf
}

pub(crate) fn zbc_in(
    ctx: &CommandContext<'_>,
    request: &Request<'_>,
    data_len: usize,
) -> Result<Translation, ScsiError> {
    let cdb: scsi::zbc::ZbcCdb = parse_cdb(request.cdb)?;
    let len = cdb.allocation_length.get() as usize;
    if len != data_len {
        tracing::debug!(len, data_len, "report zones length does not match the data buffer");
        return Err(ScsiError::ParameterListLength);
    }
    if ZbcInServiceAction(cdb.service_action & 0x1f) != ZbcInServiceAction::REPORT_ZONES {
        return Err(ScsiError::field(1));
    }
    // ZAC counts 512-byte blocks in 16 bits.
    let sector = ATA_SECTOR_SIZE as usize;
    if len < sector || len % sector != 0 || len / sector > u16::MAX.into() {
        tracing::debug!(len, "invalid report zones length");
        return Err(ScsiError::ParameterListLength);
    }
    let blocks = (len / sector) as u16;
    let options = cdb.options & scsi::zbc::REPORT_ZONES_OPTIONS_MASK;

    let dev = ctx.dev;
    let mut tf = zone_taskfile(ctx, cdb.zone_id.get());
    tf.flags.set_result_tf(true);
    tf.transfer_len = len;
    if dev.caps.ncq() && dev.caps.ncq_zac_mgmt_in() {
        tf.protocol = AtaProtocol::NCQ;
        tf.command = AtaCommand::RECEIVE_FPDMA_QUEUED;
        tf.regs.hob_nsect = ata_defs::SUBCMD_FPDMA_RECV_ZAC_MGMT_IN & 0x1f;
        tf.regs.nsect = request.tag << 3;
        tf.regs.feature = blocks as u8;
        tf.regs.hob_feature = (blocks >> 8) as u8;
        tf.auxiliary = ata_defs::SUBCMD_ZAC_MGMT_IN_REPORT_ZONES as u32 | (options as u32) << 8;
    } else {
        tf.protocol = AtaProtocol::DMA;
        tf.command = AtaCommand::ZAC_MANAGEMENT_IN;
        tf.regs.feature = ata_defs::SUBCMD_ZAC_MGMT_IN_REPORT_ZONES;
        tf.regs.hob_feature = options;
        tf.regs.hob_nsect = (blocks >> 8) as u8;
        tf.regs.nsect = blocks as u8;
    }
    Ok(Translation::Issue(tf, CompletionKind::ReportZones))
}

pub(crate) fn zbc_out(
    ctx: &CommandContext<'_>,
    request: &Request<'_>,
) -> Result<Translation, ScsiError> {
    let cdb: scsi::zbc::ZbcCdb = parse_cdb(request.cdb)?;
    let action = ZbcOutServiceAction(cdb.service_action & 0x1f);
    if !matches!(
        action,
        ZbcOutServiceAction::CLOSE_ZONE
            | ZbcOutServiceAction::FINISH_ZONE
            | ZbcOutServiceAction::OPEN_ZONE
            | ZbcOutServiceAction::RESET_WRITE_POINTER
    ) {
        return Err(ScsiError::field(1));
    }
    // ZAC MANAGEMENT OUT transfers no data.
    if cdb.allocation_length.get() != 0 {
        return Err(ScsiError::ParameterListLength);
    }

    let dev = ctx.dev;
    let all = cdb.options & scsi::zbc::ZBC_OUT_ALL != 0;
    let zone = if all {
        0
    } else {
        let zone = cdb.zone_id.get();
        if zone >= dev.n_sectors {
            return Err(ScsiError::field(2));
        }
        zone
    };

    let mut tf = zone_taskfile(ctx, zone);
    if dev.caps.ncq() && dev.caps.ncq_zac_mgmt_out() {
        tf.protocol = AtaProtocol::NCQ_NODATA;
        tf.command = AtaCommand::NCQ_NON_DATA;
        tf.regs.feature = ata_defs::SUBCMD_NCQ_NON_DATA_ZAC_MGMT_OUT;
        tf.regs.nsect = request.tag << 3;
        tf.auxiliary = action.0 as u32 | (all as u32) << 8;
    } else {
        tf.protocol = AtaProtocol::NODATA;
        tf.command = AtaCommand::ZAC_MANAGEMENT_OUT;
        tf.regs.feature = action.0;
        tf.regs.hob_feature = all as u8;
    }
    Ok(Translation::ata(tf))
}

/// Converts REPORT ZONES data from the device's little-endian layout to the
/// big-endian SCSI layout, in place: the header, then every whole 64-byte
/// zone descriptor after it.
pub(crate) fn swizzle_report_zones(buf: &mut [u8]) {
    let mut entries = buf.chunks_exact_mut(ZAC_REPORT_ZONES_ENTRY_LEN);
    let Some(header) = entries.next() else {
        return;
    };
    if let Ok(zac) = ZacReportZonesHeader::read_from_bytes(header) {
        let zbc = scsi::zbc::ReportZonesHeader {
            zone_list_length: zac.zone_list_length.get().into(),
            same: zac.same & 0xf,
            reserved: zac.reserved,
            maximum_lba: zac.maximum_lba.get().into(),
            optimal_lba: zac.optimal_lba.get().into(),
            reserved2: zac.reserved2,
        };
        header.copy_from_slice(zbc.as_bytes());
    }
    for entry in entries {
        if let Ok(zac) = ZacZoneDescriptor::read_from_bytes(entry) {
            let zbc = scsi::zbc::ZoneDescriptor {
                zone_type: zac.zone_type & 0xf,
                // Condition in the high nibble, NON_SEQ and RESET below.
                flags: zac.flags
                    & (0xf0 | scsi::zbc::ZONE_DESCRIPTOR_NON_SEQ | scsi::zbc::ZONE_DESCRIPTOR_RESET),
                reserved: zac.reserved,
                zone_length: zac.zone_length.get().into(),
                zone_start_lba: zac.zone_start_lba.get().into(),
                write_pointer_lba: zac.write_pointer_lba.get().into(),
                reserved2: zac.reserved2,
            };
            entry.copy_from_slice(zbc.as_bytes());
        }
    }
}
