// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! WRITE SAME (16) with UNMAP, as DATA SET MANAGEMENT TRIM.

use super::Translation;
use crate::address::decode_16;
use crate::dispatch::Request;
use crate::taskfile::TaskfileRequest;
use crate::CommandContext;
use crate::ScsiError;
use ata_defs::AtaCommand;
use ata_defs::AtaProtocol;
use ata_defs::DSM_RANGE_MAX_SECTORS;
use ata_defs::DEVICE_LBA;
use scsi_defs as scsi;

const TRIM_ENTRY_LEN: usize = 8;

/// Writes TRIM range entries covering `count` blocks from `lba` into the
/// first `sector_size` bytes of `buf`, zero filling the rest of the sector.
///
/// Each little-endian entry holds the start LBA in bits 47:0 and the range
/// length in bits 63:48. Returns the number of bytes written, which is short
/// of `sector_size` only if `buf` is.
pub(crate) fn format_trim_descriptors(
    buf: &mut [u8],
    sector_size: usize,
    mut lba: u64,
    mut count: u32,
) -> usize {
    let len = sector_size.min(buf.len());
    let buf = &mut buf[..len];
    buf.fill(0);
    for entry in buf.chunks_exact_mut(TRIM_ENTRY_LEN) {
        let range = count.min(DSM_RANGE_MAX_SECTORS);
        entry.copy_from_slice(&(lba | (range as u64) << 48).to_le_bytes());
        if count <= DSM_RANGE_MAX_SECTORS {
            break;
        }
        count -= DSM_RANGE_MAX_SECTORS;
        lba += DSM_RANGE_MAX_SECTORS as u64;
    }
    len
}

pub(crate) fn write_same(
    ctx: &CommandContext<'_>,
    request: &Request<'_>,
    data: &mut [u8],
) -> Result<Translation, ScsiError> {
    let dev = ctx.dev;
    if !dev.caps.dma() {
        return Err(ScsiError::InvalidOpcode);
    }
    let cdb = request.cdb;
    let (lba, n_blocks) = decode_16(cdb)?;
    let flags = scsi::WriteSameFlags::from(cdb[1]);
    if !flags.unmap() || !dev.trim_usable() {
        return Err(ScsiError::field_bit(1, scsi::WRITE_SAME_UNMAP_BIT));
    }

    let sector_size = dev.sector_size as usize;
    let max_entries = (sector_size / TRIM_ENTRY_LEN) as u64;
    if n_blocks as u64 > DSM_RANGE_MAX_SECTORS as u64 * max_entries {
        return Err(ScsiError::field(2));
    }

    let size = format_trim_descriptors(data, sector_size, lba, n_blocks);
    if size != sector_size {
        return Err(ScsiError::ParameterListLength);
    }
    // The DSM count is in 512-byte blocks regardless of the sector size.
    let blocks = (size / ata_defs::ATA_SECTOR_SIZE as usize) as u16;

    let mut tf = TaskfileRequest::new(dev, AtaCommand::DSM);
    tf.flags.set_isaddr(true);
    tf.flags.set_device(true);
    tf.flags.set_lba(true);
    tf.flags.set_lba48(true);
    tf.flags.set_write(true);
    tf.regs.device = DEVICE_LBA;
    tf.transfer_len = size;
    if dev.caps.ncq() && dev.caps.ncq_trim() {
        tf.protocol = AtaProtocol::NCQ;
        tf.command = AtaCommand::SEND_FPDMA_QUEUED;
        tf.regs.hob_nsect = ata_defs::SUBCMD_FPDMA_SEND_DSM & 0x1f;
        tf.regs.nsect = request.tag << 3;
        tf.regs.hob_feature = (blocks >> 8) as u8;
        tf.regs.feature = blocks as u8;
        tf.auxiliary = 1;
    } else {
        tf.protocol = AtaProtocol::DMA;
        tf.regs.feature = ata_defs::DSM_TRIM;
        tf.regs.hob_nsect = (blocks >> 8) as u8;
        tf.regs.nsect = blocks as u8;
    }
    tracing::trace!(lba, n_blocks, ncq = tf.protocol.is_ncq(), "trim");
    Ok(Translation::ata(tf))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(buf: &[u8]) -> Vec<(u64, u16)> {
        buf.chunks_exact(TRIM_ENTRY_LEN)
            .map(|e| u64::from_le_bytes(e.try_into().unwrap()))
            .take_while(|&e| e != 0)
            .map(|e| (e & 0xffff_ffff_ffff, (e >> 48) as u16))
            .collect()
    }

    #[test]
    fn long_ranges_split() {
        let mut buf = [0xaa; 512];
        let count = 3 * 0xffff + 10;
        assert_eq!(format_trim_descriptors(&mut buf, 512, 0x1000, count), 512);
        let e = entries(&buf);
        assert_eq!(
            e,
            [
                (0x1000, 0xffff),
                (0x1000 + 0xffff, 0xffff),
                (0x1000 + 2 * 0xffff, 0xffff),
                (0x1000 + 3 * 0xffff, 10),
            ]
        );
        assert_eq!(e.iter().map(|&(_, n)| n as u32).sum::<u32>(), count);
        assert!(buf[4 * TRIM_ENTRY_LEN..].iter().all(|&b| b == 0));
    }

    #[test]
    fn short_buffer() {
        let mut buf = [0; 100];
        assert_eq!(format_trim_descriptors(&mut buf, 512, 0, 8), 100);
    }
}
