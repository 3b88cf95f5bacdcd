// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! SECURITY PROTOCOL IN and OUT, as the TRUSTED commands.

use super::Translation;
use crate::parse_cdb;
use crate::taskfile::TaskfileRequest;
use crate::CommandContext;
use crate::ScsiError;
use ata_defs::AtaCommand;
use ata_defs::AtaProtocol;
use ata_defs::ATA_SECTOR_SIZE;
use scsi::ScsiOp;
use scsi_defs as scsi;

fn trusted_command(blocks: u32, send: bool, dma: bool) -> AtaCommand {
    match (blocks, send, dma) {
        (0, _, _) => AtaCommand::TRUSTED_NON_DATA,
        (_, true, true) => AtaCommand::TRUSTED_SEND_DMA,
        (_, true, false) => AtaCommand::TRUSTED_SEND,
        (_, false, true) => AtaCommand::TRUSTED_RECEIVE_DMA,
        (_, false, false) => AtaCommand::TRUSTED_RECEIVE,
    }
}

pub(crate) fn security_protocol(
    ctx: &CommandContext<'_>,
    cdb: &[u8],
    data_len: usize,
) -> Result<Translation, ScsiError> {
    let cdb: scsi::SecurityProtocolCdb = parse_cdb(cdb)?;
    let send = cdb.operation_code == ScsiOp::SECURITY_PROTOCOL_OUT;
    let protocol = cdb.security_protocol;
    let specific = cdb.security_protocol_specific.get();
    let len = cdb.transfer_length.get();

    // The ATA security feature set is not exposed this way.
    if protocol == scsi::SECURITY_PROTOCOL_ATA_PASSWORD {
        return Err(ScsiError::field_bit(1, 0));
    }

    let blocks = if cdb.flags.inc_512() {
        if len > u16::MAX.into() {
            return Err(ScsiError::field_bit(6, 0));
        }
        len
    } else {
        if len > scsi::SECURITY_PROTOCOL_MAX_BYTES {
            return Err(ScsiError::field_bit(6, 0));
        }
        len.div_ceil(ATA_SECTOR_SIZE)
    };

    let dev = ctx.dev;
    let dma = dev.caps.dma();
    let mut tf = TaskfileRequest::new(dev, trusted_command(blocks, send, dma));
    tf.protocol = match (blocks, dma) {
        (0, _) => AtaProtocol::NODATA,
        (_, true) => AtaProtocol::DMA,
        (_, false) => AtaProtocol::PIO,
    };
    tf.flags.set_device(true);
    tf.flags.set_isaddr(true);
    tf.flags.set_lba(true);
    tf.flags.set_write(send);
    tf.regs.feature = protocol;
    tf.regs.lbam = specific as u8;
    tf.regs.lbah = (specific >> 8) as u8;
    if blocks != 0 {
        tf.regs.nsect = blocks as u8;
        tf.regs.lbal = (blocks >> 8) as u8;
        let bytes = if cdb.flags.inc_512() {
            blocks as usize * ATA_SECTOR_SIZE as usize
        } else {
            len as usize
        };
        tf.transfer_len = bytes.min(data_len);
    } else if !send {
        tf.regs.lbah = 0x80;
    }
    Ok(Translation::ata(tf))
}
