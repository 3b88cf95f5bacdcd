// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! READ CAPACITY and REPORT LUNS.

use super::ResponseBuffer;
use crate::device::DeviceSnapshot;
use crate::ScsiError;
use scsi_defs as scsi;
use zerocopy::FromZeros;

pub(super) fn read_capacity(
    dev: &DeviceSnapshot,
    buf: &mut ResponseBuffer,
) -> Result<(), ScsiError> {
    let last_lba = dev.n_sectors.saturating_sub(1).min(u32::MAX.into()) as u32;
    buf.write(&scsi::ReadCapacityData {
        logical_block_address: last_lba.into(),
        bytes_per_block: dev.sector_size.into(),
    });
    Ok(())
}

pub(super) fn read_capacity16(
    dev: &DeviceSnapshot,
    buf: &mut ResponseBuffer,
) -> Result<(), ScsiError> {
    let mut msb = ((dev.lowest_aligned >> 8) & 0x3f) as u8;
    if dev.trim_usable() {
        msb |= scsi::READ_CAPACITY16_LBPME;
        if dev.identify.has_zero_after_trim() && dev.quirks.zero_after_trim() {
            msb |= scsi::READ_CAPACITY16_LBPRZ;
        }
    }
    let data = scsi::ReadCapacity16Data {
        ex: scsi::ReadCapacityDataEx {
            logical_block_address: dev.n_sectors.saturating_sub(1).into(),
            bytes_per_block: dev.sector_size.into(),
        },
        flags: if dev.is_zoned() {
            scsi::READ_CAPACITY16_RC_BASIS_CAPACITY
        } else {
            0
        },
        exponents: dev.log2_per_physical,
        lowest_aligned_block_msb: msb,
        lowest_aligned_block_lsb: dev.lowest_aligned as u8,
        ..FromZeros::new_zeroed()
    };
    buf.write(&data);
    Ok(())
}

/// A single LUN, zero.
pub(super) fn report_luns(buf: &mut ResponseBuffer) -> Result<(), ScsiError> {
    buf.write(&scsi::LunList {
        length: (size_of::<scsi::LunListEntry>() as u32).into(),
        reserved: [0; 4],
    });
    buf.write(&scsi::LunListEntry([0; 8]));
    Ok(())
}
