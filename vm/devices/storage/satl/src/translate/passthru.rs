// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! ATA PASS-THROUGH (12), (16) and (32).

use super::CompletionKind;
use super::Translation;
use crate::dispatch::DataDirection;
use crate::dispatch::Request;
use crate::parse_cdb;
use crate::taskfile::TaskfileRequest;
use crate::CommandContext;
use crate::ScsiError;
use ata_defs::AtaCommand;
use ata_defs::AtaProtocol;
use ata_defs::AtaRegisters;
use ata_defs::DEVICE_DEV1;
use scsi::sat::SatFlagsByte;
use scsi::sat::SatProtocol;
use scsi::sat::SatProtocolByte;
use scsi::sat::VARIABLE_LENGTH_SERVICE_ACTION_ATA_PASSTHROUGH32;
use scsi::ScsiOp;
use scsi_defs as scsi;

/// The pass-through fields common to all three CDB layouts.
struct Passthrough {
    protocol: SatProtocolByte,
    flags: SatFlagsByte,
    regs: AtaRegisters,
    command: AtaCommand,
    auxiliary: u32,
    layout: Layout,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Layout {
    Cdb12,
    Cdb16,
    Cdb32,
}

impl Layout {
    /// Offset of the protocol byte; field pointers for the shared fields are
    /// relative to it.
    fn base(self) -> u16 {
        match self {
            Layout::Cdb12 | Layout::Cdb16 => 0,
            Layout::Cdb32 => 9,
        }
    }

    fn features_offset(self) -> u16 {
        match self {
            Layout::Cdb12 => 3,
            Layout::Cdb16 => 4,
            Layout::Cdb32 => 21,
        }
    }

    fn command_offset(self) -> u16 {
        match self {
            Layout::Cdb12 => 9,
            Layout::Cdb16 => 14,
            Layout::Cdb32 => 25,
        }
    }
}

fn parse(cdb: &[u8]) -> Result<Passthrough, ScsiError> {
    let p = match ScsiOp(cdb[0]) {
        ScsiOp::ATA_PASSTHROUGH12 => {
            let cdb: scsi::sat::AtaPassthrough12 = parse_cdb(cdb)?;
            Passthrough {
                protocol: cdb.protocol,
                flags: cdb.flags,
                regs: AtaRegisters {
                    feature: cdb.features,
                    nsect: cdb.count,
                    lbal: cdb.lba_low,
                    lbam: cdb.lba_mid,
                    lbah: cdb.lba_high,
                    device: cdb.device,
                    ..Default::default()
                },
                command: AtaCommand(cdb.command),
                auxiliary: 0,
                layout: Layout::Cdb12,
            }
        }
        ScsiOp::ATA_PASSTHROUGH16 => {
            let cdb: scsi::sat::AtaPassthrough16 = parse_cdb(cdb)?;
            let mut regs = AtaRegisters {
                feature: cdb.features,
                nsect: cdb.count,
                lbal: cdb.lba_low,
                lbam: cdb.lba_mid,
                lbah: cdb.lba_high,
                device: cdb.device,
                ..Default::default()
            };
            if cdb.protocol.extend() {
                regs.hob_feature = cdb.features_ext;
                regs.hob_nsect = cdb.count_ext;
                regs.hob_lbal = cdb.lba_low_ext;
                regs.hob_lbam = cdb.lba_mid_ext;
                regs.hob_lbah = cdb.lba_high_ext;
            }
            Passthrough {
                protocol: cdb.protocol,
                flags: cdb.flags,
                regs,
                command: AtaCommand(cdb.command),
                auxiliary: 0,
                layout: Layout::Cdb16,
            }
        }
        _ => {
            let cdb: scsi::sat::AtaPassthrough32 = parse_cdb(cdb)?;
            let mut regs = AtaRegisters {
                feature: cdb.features,
                nsect: cdb.count,
                lbal: cdb.lba_low,
                lbam: cdb.lba_mid,
                lbah: cdb.lba_high,
                device: cdb.device,
                ..Default::default()
            };
            if cdb.protocol.extend() {
                regs.hob_feature = cdb.features_ext;
                regs.hob_nsect = cdb.count_ext;
                regs.hob_lbal = cdb.lba_low_ext;
                regs.hob_lbam = cdb.lba_mid_ext;
                regs.hob_lbah = cdb.lba_high_ext;
            }
            Passthrough {
                protocol: cdb.protocol,
                flags: cdb.flags,
                regs,
                command: AtaCommand(cdb.command),
                auxiliary: cdb.auxiliary.get(),
                layout: Layout::Cdb32,
            }
        }
    };
    Ok(p)
}

fn map_protocol(protocol: SatProtocol) -> AtaProtocol {
    match protocol {
        SatProtocol::NON_DATA => AtaProtocol::NODATA,
        SatProtocol::DMA | SatProtocol::UDMA_DATA_IN | SatProtocol::UDMA_DATA_OUT => {
            AtaProtocol::DMA
        }
        SatProtocol::PIO_DATA_IN | SatProtocol::PIO_DATA_OUT => AtaProtocol::PIO,
        SatProtocol::FPDMA => AtaProtocol::NCQ,
        _ => AtaProtocol::UNKNOWN,
    }
}

/// Commands whose DRQ blocks are the device's logical sector size.
fn uses_logical_sectors(command: AtaCommand) -> bool {
    matches!(
        command,
        AtaCommand::READ_SECTORS
            | AtaCommand::READ_SECTORS_EXT
            | AtaCommand::READ_DMA
            | AtaCommand::READ_DMA_EXT
            | AtaCommand::READ_MULTIPLE
            | AtaCommand::READ_MULTIPLE_EXT
            | AtaCommand::READ_FPDMA_QUEUED
            | AtaCommand::READ_VERIFY_SECTORS
            | AtaCommand::READ_VERIFY_SECTORS_EXT
            | AtaCommand::WRITE_SECTORS
            | AtaCommand::WRITE_SECTORS_EXT
            | AtaCommand::WRITE_DMA
            | AtaCommand::WRITE_DMA_EXT
            | AtaCommand::WRITE_DMA_FUA_EXT
            | AtaCommand::WRITE_MULTIPLE
            | AtaCommand::WRITE_MULTIPLE_EXT
            | AtaCommand::WRITE_MULTIPLE_FUA_EXT
            | AtaCommand::WRITE_FPDMA_QUEUED
    )
}

/// Translates ATA PASS-THROUGH (12) or (16), or the (32) form once the
/// variable length CDB has been recognized.
pub(crate) fn passthrough(
    ctx: &CommandContext<'_>,
    request: &Request<'_>,
    data_len: usize,
) -> Result<Translation, ScsiError> {
    let p = parse(request.cdb)?;
    let dev = ctx.dev;
    let base = p.layout.base();
    let protocol_field = ScsiError::field(base + 1);

    let mut protocol = map_protocol(SatProtocol(p.protocol.protocol()));
    if protocol == AtaProtocol::UNKNOWN {
        return Err(protocol_field);
    }
    if protocol == AtaProtocol::NCQ && p.flags.t_length() == 0 {
        protocol = AtaProtocol::NCQ_NODATA;
    }

    let mut tf = TaskfileRequest::new(dev, p.command);
    tf.protocol = protocol;
    tf.regs = p.regs;
    tf.auxiliary = p.auxiliary;
    tf.flags.set_lba(true);
    tf.flags.set_lba48(p.layout != Layout::Cdb12 && p.protocol.extend());
    if protocol.is_ncq() {
        tf.regs.nsect = request.tag << 3;
    }
    if dev.devno != 0 {
        tf.regs.device |= DEVICE_DEV1;
    } else {
        tf.regs.device &= !DEVICE_DEV1;
    }

    tf.sector_size = if p.command.is_long() {
        if protocol != AtaProtocol::PIO || tf.regs.nsect != 1 {
            return Err(protocol_field);
        }
        data_len as u32
    } else if uses_logical_sectors(p.command) {
        dev.sector_size
    } else {
        ata_defs::ATA_SECTOR_SIZE
    };

    tf.flags.set_isaddr(true);
    tf.flags.set_device(true);
    tf.flags.set_write(request.direction == DataDirection::ToDevice);
    tf.flags.set_result_tf(true);
    tf.flags.set_quiet(true);
    tf.transfer_len = if request.direction == DataDirection::None {
        0
    } else {
        data_len
    };

    if protocol == AtaProtocol::DMA && !dev.caps.dma() {
        return Err(protocol_field);
    }
    if protocol.is_ncq() && !dev.caps.ncq() {
        return Err(protocol_field);
    }

    let multiple_count = p.protocol.multiple_count();
    if multiple_count != 0 && !p.command.is_multiple() {
        return Err(protocol_field);
    }
    if p.command.is_multiple() && 1u32 << multiple_count != dev.multi_count as u32 {
        tracing::warn!(
            multiple_count = 1u32 << multiple_count,
            device_multi_count = dev.multi_count,
            "invalid multi_count ignored"
        );
    }

    // Transfer mode changes need the controller to follow along.
    if p.command == AtaCommand::SET_FEATURES && tf.regs.feature == ata_defs::SETFEATURES_XFER {
        tracing::warn!("rejecting pass-through SET FEATURES transfer mode");
        return Err(ScsiError::field(p.layout.features_offset()));
    }
    if p.command.is_trusted() && !ctx.policy.allow_tpm {
        tracing::warn!(command = ?p.command, "rejecting pass-through trusted command");
        return Err(ScsiError::field(p.layout.command_offset()));
    }

    tracing::trace!(command = ?p.command, ?protocol, "ata pass-through");
    Ok(Translation::Issue(
        tf,
        CompletionKind::Passthrough {
            ck_cond: p.flags.ck_cond(),
        },
    ))
}

/// VARIABLE LENGTH CDB: only ATA PASS-THROUGH (32).
pub(crate) fn variable_length(
    ctx: &CommandContext<'_>,
    request: &Request<'_>,
    data_len: usize,
) -> Result<Translation, ScsiError> {
    let header: scsi::sat::VariableLengthCdbHeader = parse_cdb(request.cdb)?;
    if header.service_action.get() != VARIABLE_LENGTH_SERVICE_ACTION_ATA_PASSTHROUGH32 {
        return Err(ScsiError::field(8));
    }
    passthrough(ctx, request, data_len)
}
