// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! VERIFY (10) and (16), as READ VERIFY SECTORS.

use super::Translation;
use crate::address::choose_addressing;
use crate::address::decode_10;
use crate::address::decode_16;
use crate::address::fill_address;
use crate::address::Addressing;
use crate::taskfile::TaskfileRequest;
use crate::CommandContext;
use crate::ScsiError;
use ata_defs::AtaCommand;
use scsi::ScsiOp;
use scsi_defs as scsi;

pub(crate) fn verify(ctx: &CommandContext<'_>, cdb: &[u8]) -> Result<Translation, ScsiError> {
    let (lba, n_blocks) = match ScsiOp(cdb[0]) {
        ScsiOp::VERIFY => decode_10(cdb)?,
        ScsiOp::VERIFY16 => decode_16(cdb)?,
        _ => return Err(ScsiError::field(0)),
    };
    if n_blocks == 0 {
        return Ok(Translation::Done);
    }

    let dev = ctx.dev;
    if lba >= dev.n_sectors || lba + n_blocks as u64 > dev.n_sectors {
        return Err(ScsiError::OutOfRange);
    }

    let addressing = choose_addressing(dev, lba, n_blocks)?;
    let command = if addressing == Addressing::Lba48 {
        AtaCommand::READ_VERIFY_SECTORS_EXT
    } else {
        AtaCommand::READ_VERIFY_SECTORS
    };
    let mut tf = TaskfileRequest::non_data(dev, command);
    tf.flags.set_isaddr(true);
    fill_address(&mut tf, addressing, lba, n_blocks);
    Ok(Translation::ata(tf))
}
