// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Packet commands relayed to ATAPI devices.

use super::CompletionKind;
use super::Translation;
use crate::dispatch::DataDirection;
use crate::dispatch::Request;
use crate::taskfile::TaskfileRequest;
use crate::CommandContext;
use ata_defs::AtaCommand;
use ata_defs::AtaProtocol;
use ata_defs::ATAPI_CDB_LEN;
use ata_defs::ATAPI_MAX_BYTE_COUNT;
use scsi::ScsiOp;
use scsi_defs as scsi;

/// Wraps the CDB in a PACKET command. The caller has already checked that
/// the CDB fits in a packet.
pub(crate) fn atapi(ctx: &CommandContext<'_>, request: &Request<'_>, data_len: usize) -> Translation {
    let dev = ctx.dev;
    let cdb = request.cdb;
    let mut packet = [0; ATAPI_CDB_LEN];
    let n = cdb.len().min(ATAPI_CDB_LEN);
    packet[..n].copy_from_slice(&cdb[..n]);

    let mut tf = TaskfileRequest::new(dev, AtaCommand::PACKET);
    tf.packet = Some(packet);
    tf.flags.set_isaddr(true);
    tf.flags.set_device(true);
    tf.flags.set_write(request.direction == DataDirection::ToDevice);

    // The byte count limit goes in the LBA mid/high registers, and must be
    // even.
    let byte_count = data_len.min(ATAPI_MAX_BYTE_COUNT).next_multiple_of(2);
    tf.regs.lbam = byte_count as u8;
    tf.regs.lbah = (byte_count >> 8) as u8;

    tf.protocol = if request.direction == DataDirection::None {
        AtaProtocol::ATAPI_NODATA
    } else if !dev.caps.dma() {
        AtaProtocol::ATAPI_PIO
    } else {
        tf.regs.feature |= ata_defs::ATAPI_PKT_DMA;
        if dev.caps.dmadir() && request.direction != DataDirection::ToDevice {
            tf.regs.feature |= ata_defs::ATAPI_DMADIR;
        }
        AtaProtocol::ATAPI_DMA
    };
    tf.transfer_len = if request.direction == DataDirection::None {
        0
    } else {
        data_len
    };

    // Standard INQUIRY data from older devices may claim no SCSI version.
    let fixup_inquiry =
        ScsiOp(cdb[0]) == ScsiOp::INQUIRY && cdb.get(1).is_some_and(|&b| b & 3 == 0);
    tracing::trace!(op = ?ScsiOp(cdb[0]), protocol = ?tf.protocol, "atapi packet");
    Translation::Issue(tf, CompletionKind::Atapi { fixup_inquiry })
}
