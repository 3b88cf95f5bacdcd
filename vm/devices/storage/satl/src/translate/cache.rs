// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! SYNCHRONIZE CACHE and START STOP UNIT.

use super::Translation;
use crate::parse_cdb;
use crate::taskfile::TaskfileRequest;
use crate::CommandContext;
use crate::ScsiError;
use ata_defs::AtaCommand;
use ata_defs::DEVICE_LBA;
use scsi_defs as scsi;

pub(crate) fn flush(ctx: &CommandContext<'_>) -> Translation {
    let command = if ctx.dev.caps.flush_ext() {
        AtaCommand::FLUSH_CACHE_EXT
    } else {
        AtaCommand::FLUSH_CACHE
    };
    Translation::ata(TaskfileRequest::non_data(ctx.dev, command))
}

pub(crate) fn start_stop(ctx: &CommandContext<'_>, cdb: &[u8]) -> Result<Translation, ScsiError> {
    let cdb: scsi::StartStop = parse_cdb(cdb)?;
    let flags = cdb.flag;
    // IMMED is ignored.
    if flags.load_eject() {
        return Err(ScsiError::field_bit(4, 1));
    }
    if flags.power_condition() != 0 {
        return Err(ScsiError::field_bit(4, 3));
    }

    let dev = ctx.dev;
    if flags.start() {
        // Spin up by reading one sector at the start of the disk.
        let mut tf = TaskfileRequest::non_data(dev, AtaCommand::READ_VERIFY_SECTORS);
        tf.flags.set_isaddr(true);
        tf.regs.nsect = 1;
        if dev.caps.lba() {
            tf.flags.set_lba(true);
            tf.regs.device |= DEVICE_LBA;
        } else {
            tf.regs.lbal = 1;
        }
        Ok(Translation::ata(tf))
    } else if ctx.policy.skip_spindown {
        tracing::debug!("skipping spin-down");
        Ok(Translation::Done)
    } else {
        let mut tf = TaskfileRequest::non_data(dev, AtaCommand::STANDBY_IMMEDIATE);
        tf.flags.set_isaddr(true);
        Ok(Translation::ata(tf))
    }
}
