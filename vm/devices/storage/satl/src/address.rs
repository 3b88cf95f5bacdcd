// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Block addressing: CDB decoding, choosing LBA28, LBA48 or CHS, and filling
//! read/write task files.

use crate::device::DeviceSnapshot;
use crate::parse_cdb;
use crate::taskfile::TaskfileRequest;
use crate::ScsiError;
use ata_defs::AtaCommand;
use ata_defs::AtaProtocol;
use ata_defs::AtaRegisters;
use ata_defs::DeviceHeadReg;
use ata_defs::TaskfileFlags;
use ata_defs::DEVICE_FPDMA_FUA;
use ata_defs::DEVICE_LBA;
use ata_defs::LBA28_LIMIT;
use ata_defs::LBA48_LIMIT;
use ata_defs::MAX_SECTORS_28;
use ata_defs::MAX_SECTORS_48;
use scsi_defs as scsi;

/// Decodes the LBA and transfer length of a 6-byte CDB. A zero length is
/// returned as is.
pub(crate) fn decode_6(cdb: &[u8]) -> Result<(u64, u32), ScsiError> {
    let cdb: scsi::Cdb6ReadWrite = parse_cdb(cdb)?;
    let [msb, mid, lsb] = cdb.logical_block;
    let lba = u32::from_be_bytes([0, msb & 0x1f, mid, lsb]);
    Ok((lba.into(), cdb.transfer_blocks.into()))
}

pub(crate) fn decode_10(cdb: &[u8]) -> Result<(u64, u32), ScsiError> {
    let cdb: scsi::Cdb10 = parse_cdb(cdb)?;
    Ok((
        cdb.logical_block.get().into(),
        cdb.transfer_blocks.get().into(),
    ))
}

pub(crate) fn decode_16(cdb: &[u8]) -> Result<(u64, u32), ScsiError> {
    let cdb: scsi::Cdb16 = parse_cdb(cdb)?;
    Ok((cdb.logical_block.get(), cdb.transfer_blocks.get()))
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Addressing {
    Lba28,
    Lba48,
    Chs { cylinder: u16, head: u8, sector: u8 },
}

fn lba28_ok(lba: u64, n_blocks: u32) -> bool {
    lba.saturating_add(n_blocks.into()) <= LBA28_LIMIT && n_blocks <= MAX_SECTORS_28
}

fn lba48_ok(lba: u64, n_blocks: u32) -> bool {
    lba.saturating_add(n_blocks.into()) <= LBA48_LIMIT && n_blocks <= MAX_SECTORS_48
}

/// Picks the narrowest addressing that reaches `lba + n_blocks`.
pub(crate) fn choose_addressing(
    dev: &DeviceSnapshot,
    lba: u64,
    n_blocks: u32,
) -> Result<Addressing, ScsiError> {
    if dev.caps.lba() {
        if lba28_ok(lba, n_blocks) {
            Ok(Addressing::Lba28)
        } else if lba48_ok(lba, n_blocks) && dev.caps.lba48() {
            Ok(Addressing::Lba48)
        } else {
            Err(ScsiError::OutOfRange)
        }
    } else {
        if !lba28_ok(lba, n_blocks) || dev.heads == 0 || dev.sectors == 0 {
            return Err(ScsiError::OutOfRange);
        }
        let track = lba / dev.sectors as u64;
        let cylinder = track / dev.heads as u64;
        let head = track % dev.heads as u64;
        let sector = lba % dev.sectors as u64 + 1;
        if cylinder > u16::MAX.into() || head > 0xf || sector > 0xff {
            return Err(ScsiError::OutOfRange);
        }
        Ok(Addressing::Chs {
            cylinder: cylinder as u16,
            head: head as u8,
            sector: sector as u8,
        })
    }
}

/// Writes the address and count of `addressing` into `tf`.
pub(crate) fn fill_address(
    tf: &mut TaskfileRequest,
    addressing: Addressing,
    lba: u64,
    n_blocks: u32,
) {
    let regs = &mut tf.regs;
    match addressing {
        Addressing::Lba28 => {
            tf.flags.set_lba(true);
            regs.set_lba28(lba as u32);
            regs.device |= DEVICE_LBA;
            regs.nsect = n_blocks as u8;
        }
        Addressing::Lba48 => {
            tf.flags.set_lba(true);
            tf.flags.set_lba48(true);
            regs.set_lba48(lba);
            regs.device |= DEVICE_LBA;
            regs.hob_nsect = (n_blocks >> 8) as u8;
            regs.nsect = n_blocks as u8;
        }
        Addressing::Chs {
            cylinder,
            head,
            sector,
        } => {
            regs.nsect = n_blocks as u8;
            regs.lbal = sector;
            regs.lbam = cylinder as u8;
            regs.lbah = (cylinder >> 8) as u8;
            regs.device |= head;
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct RwParams {
    pub lba: u64,
    pub n_blocks: u32,
    pub write: bool,
    pub fua: bool,
    pub tag: u8,
    pub high_priority: bool,
}

/// Read/write commands indexed by `fua * 4 + lba48 * 2 + write`.
const PIO_MULTI_COMMANDS: [AtaCommand; 8] = [
    AtaCommand::READ_MULTIPLE,
    AtaCommand::WRITE_MULTIPLE,
    AtaCommand::READ_MULTIPLE_EXT,
    AtaCommand::WRITE_MULTIPLE_EXT,
    AtaCommand::NOP,
    AtaCommand::NOP,
    AtaCommand::NOP,
    AtaCommand::WRITE_MULTIPLE_FUA_EXT,
];

const PIO_COMMANDS: [AtaCommand; 8] = [
    AtaCommand::READ_SECTORS,
    AtaCommand::WRITE_SECTORS,
    AtaCommand::READ_SECTORS_EXT,
    AtaCommand::WRITE_SECTORS_EXT,
    AtaCommand::NOP,
    AtaCommand::NOP,
    AtaCommand::NOP,
    AtaCommand::NOP,
];

const DMA_COMMANDS: [AtaCommand; 8] = [
    AtaCommand::READ_DMA,
    AtaCommand::WRITE_DMA,
    AtaCommand::READ_DMA_EXT,
    AtaCommand::WRITE_DMA_EXT,
    AtaCommand::NOP,
    AtaCommand::NOP,
    AtaCommand::NOP,
    AtaCommand::WRITE_DMA_FUA_EXT,
];

/// Chooses the read/write opcode and protocol for `flags`.
fn rw_command(dev: &DeviceSnapshot, flags: TaskfileFlags) -> Option<(AtaCommand, AtaProtocol)> {
    let index =
        (flags.fua() as usize) * 4 + (flags.lba48() as usize) * 2 + flags.write() as usize;
    let (table, protocol) = if !dev.caps.dma() {
        if dev.multi_count != 0 {
            (&PIO_MULTI_COMMANDS, AtaProtocol::PIO)
        } else {
            (&PIO_COMMANDS, AtaProtocol::PIO)
        }
    } else {
        (&DMA_COMMANDS, AtaProtocol::DMA)
    };
    let command = table[index];
    (command != AtaCommand::NOP).then_some((command, protocol))
}

/// Builds the task file of a block read or write.
pub(crate) fn build_rw_taskfile(
    dev: &DeviceSnapshot,
    params: &RwParams,
) -> Result<TaskfileRequest, ScsiError> {
    let &RwParams {
        lba,
        n_blocks,
        write,
        fua,
        tag,
        high_priority,
    } = params;

    let mut tf = TaskfileRequest::new(dev, AtaCommand::NOP);
    tf.flags.set_isaddr(true);
    tf.flags.set_device(true);
    tf.flags.set_write(write);
    tf.flags.set_fua(fua);
    tf.transfer_len = n_blocks as usize * dev.sector_size as usize;
    tf.sector_size = dev.sector_size;

    if dev.caps.ncq() {
        if !lba48_ok(lba, n_blocks) {
            return Err(ScsiError::OutOfRange);
        }
        tf.protocol = AtaProtocol::NCQ;
        tf.flags.set_lba(true);
        tf.flags.set_lba48(true);
        tf.command = if write {
            AtaCommand::WRITE_FPDMA_QUEUED
        } else {
            AtaCommand::READ_FPDMA_QUEUED
        };
        let regs = &mut tf.regs;
        regs.nsect = tag << 3;
        regs.hob_feature = (n_blocks >> 8) as u8;
        regs.feature = n_blocks as u8;
        regs.set_lba48(lba);
        regs.device = DEVICE_LBA;
        if fua {
            regs.device |= DEVICE_FPDMA_FUA;
        }
        if dev.caps.ncq_prio() && high_priority {
            regs.hob_nsect |= ata_defs::NCQ_PRIO_HIGH << ata_defs::NCQ_PRIO_SHIFT;
        }
        return Ok(tf);
    }

    let addressing = choose_addressing(dev, lba, n_blocks)?;
    tf.flags.set_lba48(addressing == Addressing::Lba48);
    let (command, protocol) = rw_command(dev, tf.flags).ok_or(ScsiError::field(0))?;
    tf.command = command;
    tf.protocol = protocol;
    fill_address(&mut tf, addressing, lba, n_blocks);
    Ok(tf)
}

/// Recovers the block address from a result task file, for the sense
/// INFORMATION field. `None` when the registers do not name a block.
pub(crate) fn read_block(
    dev: &DeviceSnapshot,
    flags: TaskfileFlags,
    regs: &AtaRegisters,
) -> Option<u64> {
    if flags.lba() {
        if flags.lba48() {
            Some(regs.lba48())
        } else {
            Some(regs.lba28().into())
        }
    } else {
        let cylinder = regs.lbam as u64 | (regs.lbah as u64) << 8;
        let head = DeviceHeadReg::from(regs.device).head() as u64;
        let sector = regs.lbal as u64;
        if sector == 0 {
            tracing::warn!("device reported CHS sector 0");
            return None;
        }
        Some((cylinder * dev.heads as u64 + head) * dev.sectors as u64 + sector - 1)
    }
}
