// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! READ and WRITE (6), (10) and (16).

use super::Translation;
use crate::address::build_rw_taskfile;
use crate::address::decode_10;
use crate::address::decode_16;
use crate::address::decode_6;
use crate::address::RwParams;
use crate::dispatch::IoPriority;
use crate::dispatch::Request;
use crate::CommandContext;
use crate::ScsiError;
use scsi::ScsiOp;
use scsi_defs as scsi;

pub(crate) fn read_write(
    ctx: &CommandContext<'_>,
    request: &Request<'_>,
    data_len: usize,
) -> Result<Translation, ScsiError> {
    let cdb = request.cdb;
    let op = ScsiOp(cdb[0]);
    let write = matches!(op, ScsiOp::WRITE6 | ScsiOp::WRITE | ScsiOp::WRITE16);
    let (lba, n_blocks, fua) = match op {
        ScsiOp::READ6 | ScsiOp::WRITE6 => {
            let (lba, n_blocks) = decode_6(cdb)?;
            // Zero means 256 blocks here.
            (lba, if n_blocks == 0 { 256 } else { n_blocks }, false)
        }
        ScsiOp::READ | ScsiOp::WRITE => {
            let (lba, n_blocks) = decode_10(cdb)?;
            (lba, n_blocks, scsi::CdbFlags::from(cdb[1]).fua())
        }
        ScsiOp::READ16 | ScsiOp::WRITE16 => {
            let (lba, n_blocks) = decode_16(cdb)?;
            (lba, n_blocks, scsi::Cdb16Flags::from(cdb[1]).fua())
        }
        _ => return Err(ScsiError::field(0)),
    };

    let dev = ctx.dev;
    if (n_blocks as u64) * (dev.sector_size as u64) > data_len as u64 {
        tracing::debug!(n_blocks, data_len, "transfer exceeds the data buffer");
        return Err(ScsiError::field(0));
    }
    if n_blocks == 0 {
        return Ok(Translation::Done);
    }

    let tf = build_rw_taskfile(
        dev,
        &RwParams {
            lba,
            n_blocks,
            write,
            fua,
            tag: request.tag,
            high_priority: request.priority == IoPriority::RealTime,
        },
    )?;
    tracing::trace!(command = ?tf.command, lba, n_blocks, "read/write");
    Ok(Translation::ata(tf))
}
