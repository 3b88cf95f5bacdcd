// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The IDENTIFY DEVICE data block.

use super::U16LE;
use super::U32LE;
use super::U64LE;
use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;

pub const IDENTIFY_DEVICE_BYTES: usize = 512;

/// IDENTIFY DEVICE data, 256 little-endian words. Only the words the
/// translation layer consults are named.
#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct IdentifyDevice {
    pub general_configuration: U16LE, // word 0
    pub num_cylinders: U16LE,
    pub specific_configuration: U16LE,
    pub num_heads: U16LE,
    pub retired: [U16LE; 2],
    pub num_sectors_per_track: U16LE, // word 6
    pub reserved: [U16LE; 3],
    pub serial_number: [u8; 20], // words 10-19
    pub retired2: [U16LE; 3],
    pub firmware_revision: [u8; 8], // words 23-26
    pub model_number: [u8; 40],     // words 27-46
    pub maximum_block_transfer: U16LE,
    pub trusted_computing: U16LE, // word 48
    pub capabilities: U16LE,
    pub capabilities2: U16LE,
    pub obsolete: [U16LE; 2],
    pub field_validity: U16LE, // word 53
    pub current_cylinders: U16LE,
    pub current_heads: U16LE,
    pub current_sectors_per_track: U16LE,
    pub current_capacity: U32LE,
    pub multi_sector_setting: U16LE,     // word 59
    pub user_addressable_sectors: U32LE, // words 60-61
    pub obsolete2: U16LE,
    pub multiword_dma: U16LE, // word 63
    pub pio_modes: U16LE,
    pub cycle_times: [U16LE; 4],
    pub additional_supported: U16LE, // word 69
    pub reserved2: [U16LE; 5],
    pub queue_depth: U16LE,       // word 75
    pub sata_capabilities: U16LE, // word 76
    pub sata_capabilities2: U16LE,
    pub sata_features_supported: U16LE,
    pub sata_features_enabled: U16LE,
    pub major_version: U16LE, // word 80
    pub minor_version: U16LE,
    pub command_set_supported: U16LE,
    pub command_set_supported2: U16LE, // word 83
    pub command_set_supported_ext: U16LE,
    pub command_set_enabled: U16LE, // word 85
    pub command_set_enabled2: U16LE,
    pub command_set_default: U16LE, // word 87
    pub ultra_dma: U16LE,
    pub reserved3: [U16LE; 11],
    pub user_addressable_sectors48: U64LE, // words 100-103
    pub reserved4: [U16LE; 2],
    pub physical_logical_sector_size: U16LE, // word 106
    pub reserved5: U16LE,
    pub world_wide_name: [u8; 8], // words 108-111
    pub reserved6: [U16LE; 5],
    pub words_per_logical_sector: U32LE, // words 117-118
    pub reserved7: [U16LE; 49],
    pub form_factor: U16LE,         // word 168
    pub data_set_management: U16LE, // word 169
    pub reserved8: [U16LE; 39],
    pub block_alignment: U16LE, // word 209
    pub reserved9: [U16LE; 7],
    pub nominal_media_rotation_rate: U16LE, // word 217
    pub reserved10: [U16LE; 37],
    pub integrity: U16LE, // word 255
}

static_assertions::assert_eq_size!(IdentifyDevice, [u8; IDENTIFY_DEVICE_BYTES]);

/// A word whose bits 15:14 read `01b` carries valid data.
fn word_valid(word: U16LE) -> bool {
    word.get() & 0xc000 == 0x4000
}

impl IdentifyDevice {
    pub fn is_removable(&self) -> bool {
        self.general_configuration.get() & 0x80 != 0
    }

    /// The ATAPI packet length, from word 0 bits 1:0.
    pub fn packet_len(&self) -> Option<usize> {
        match self.general_configuration.get() & 3 {
            0 => Some(12),
            1 => Some(16),
            _ => None,
        }
    }

    /// The highest ATA/ATAPI major revision the device claims, or zero.
    pub fn ata_major_version(&self) -> u8 {
        let word = self.major_version.get();
        if word == 0xffff {
            return 0;
        }
        (1..=14).rev().find(|&v| word & (1 << v) != 0).unwrap_or(0)
    }

    pub fn has_lba(&self) -> bool {
        self.capabilities.get() & (1 << 9) != 0
    }

    pub fn has_dma(&self) -> bool {
        self.capabilities.get() & (1 << 8) != 0
    }

    pub fn has_lba48(&self) -> bool {
        word_valid(self.command_set_supported2)
            && self.command_set_supported2.get() & (1 << 10) != 0
            && self.user_addressable_sectors48.get() != 0
    }

    pub fn has_flush(&self) -> bool {
        word_valid(self.command_set_supported2) && self.command_set_supported2.get() & (1 << 12) != 0
    }

    pub fn has_flush_ext(&self) -> bool {
        word_valid(self.command_set_supported2) && self.command_set_supported2.get() & (1 << 13) != 0
    }

    pub fn has_fua(&self) -> bool {
        word_valid(self.command_set_supported_ext)
            && self.command_set_supported_ext.get() & (1 << 6) != 0
    }

    pub fn has_wwn(&self) -> bool {
        word_valid(self.command_set_default) && self.command_set_default.get() & (1 << 8) != 0
    }

    pub fn write_cache_enabled(&self) -> bool {
        word_valid(self.command_set_default) && self.command_set_enabled.get() & (1 << 5) != 0
    }

    pub fn read_ahead_enabled(&self) -> bool {
        word_valid(self.command_set_default) && self.command_set_enabled.get() & (1 << 6) != 0
    }

    pub fn has_trim(&self) -> bool {
        self.data_set_management.get() & 1 != 0
    }

    /// Deterministic read of zeroes after TRIM.
    pub fn has_zero_after_trim(&self) -> bool {
        self.has_trim() && self.additional_supported.get() & 0x4020 == 0x4020
    }

    /// Zoned capabilities, bits 1:0 of word 69.
    pub fn zoned_cap(&self) -> u8 {
        (self.additional_supported.get() & 0x3) as u8
    }

    pub fn has_ncq(&self) -> bool {
        self.sata_capabilities.get() & (1 << 8) != 0
    }

    pub fn has_ncq_prio(&self) -> bool {
        self.has_ncq() && self.sata_capabilities.get() & (1 << 12) != 0
    }

    pub fn has_trusted(&self) -> bool {
        self.ata_major_version() > 7 && word_valid(self.trusted_computing)
            && self.trusted_computing.get() & 1 != 0
    }

    /// Sectors per DRQ block currently programmed by SET MULTIPLE, or zero.
    pub fn multi_count(&self) -> u8 {
        let word = self.multi_sector_setting.get();
        if word & (1 << 8) != 0 {
            word as u8
        } else {
            0
        }
    }

    /// log2 of logical sectors per physical sector.
    pub fn log2_per_physical(&self) -> u8 {
        let word = self.physical_logical_sector_size.get();
        if word & 0xe000 == 0x6000 {
            (word & 0xf) as u8
        } else {
            0
        }
    }

    /// Offset of the first logical sector within its physical sector.
    pub fn lowest_aligned_lba(&self) -> u16 {
        let word = self.block_alignment.get();
        if word_valid(self.block_alignment) {
            word & 0x3fff
        } else {
            0
        }
    }

    pub fn logical_sector_size(&self) -> u32 {
        let word = self.physical_logical_sector_size.get();
        if word & 0xd000 == 0x5000 {
            self.words_per_logical_sector.get() * 2
        } else {
            super::ATA_SECTOR_SIZE
        }
    }

    /// Total addressable sectors under the best addressing mode the device
    /// supports.
    pub fn capacity(&self) -> u64 {
        if self.has_lba48() {
            self.user_addressable_sectors48.get()
        } else if self.has_lba() {
            self.user_addressable_sectors.get().into()
        } else if self.field_validity.get() & 1 != 0 {
            self.current_cylinders.get() as u64
                * self.current_heads.get() as u64
                * self.current_sectors_per_track.get() as u64
        } else {
            self.num_cylinders.get() as u64
                * self.num_heads.get() as u64
                * self.num_sectors_per_track.get() as u64
        }
    }

    /// The CHS geometry heads and sectors per track.
    pub fn chs_geometry(&self) -> (u16, u16) {
        if self.field_validity.get() & 1 != 0 && self.current_heads.get() != 0 {
            (
                self.current_heads.get(),
                self.current_sectors_per_track.get(),
            )
        } else {
            (self.num_heads.get(), self.num_sectors_per_track.get())
        }
    }

    /// Nominal media rotation rate; 1 for non-rotating media, 0 if unreported.
    pub fn rotation_rate(&self) -> u16 {
        let rate = self.nominal_media_rotation_rate.get();
        if self.ata_major_version() < 7 || rate == 0 || rate == 0xffff {
            return 0;
        }
        if rate > 1 && rate < 0x401 {
            return 0;
        }
        rate
    }

    /// Nominal form factor code, 0 if unreported.
    pub fn nominal_form_factor(&self) -> u8 {
        let word = self.form_factor.get();
        if self.ata_major_version() < 7 || word == 0 || word == 0xffff {
            return 0;
        }
        let code = (word & 0xf) as u8;
        if code > 5 { 0 } else { code }
    }
}

/// Copies an IDENTIFY string into `dst`, undoing the per-word byte swap.
///
/// Copies `min(src.len(), dst.len())` bytes rounded down to whole words.
pub fn id_string(src: &[u8], dst: &mut [u8]) {
    for (s, d) in src.chunks_exact(2).zip(dst.chunks_exact_mut(2)) {
        d[0] = s[1];
        d[1] = s[0];
    }
}

/// Stores `s` into an IDENTIFY string field, space padded and word swapped.
pub fn set_id_string(dst: &mut [u8], s: &[u8]) {
    let mut padded = [b' '; 40];
    let n = s.len().min(dst.len()).min(padded.len());
    padded[..n].copy_from_slice(&s[..n]);
    id_string(&padded[..dst.len().min(padded.len())], dst);
}

#[cfg(test)]
mod tests {
    use super::*;
    use zerocopy::FromZeros;

    #[test]
    fn word_offsets() {
        assert_eq!(core::mem::offset_of!(IdentifyDevice, serial_number), 20);
        assert_eq!(core::mem::offset_of!(IdentifyDevice, model_number), 54);
        assert_eq!(core::mem::offset_of!(IdentifyDevice, capabilities), 98);
        assert_eq!(core::mem::offset_of!(IdentifyDevice, user_addressable_sectors), 120);
        assert_eq!(core::mem::offset_of!(IdentifyDevice, sata_capabilities), 152);
        assert_eq!(core::mem::offset_of!(IdentifyDevice, user_addressable_sectors48), 200);
        assert_eq!(core::mem::offset_of!(IdentifyDevice, world_wide_name), 216);
        assert_eq!(core::mem::offset_of!(IdentifyDevice, data_set_management), 338);
        assert_eq!(core::mem::offset_of!(IdentifyDevice, block_alignment), 418);
        assert_eq!(core::mem::offset_of!(IdentifyDevice, nominal_media_rotation_rate), 434);
    }

    #[test]
    fn strings_are_word_swapped() {
        let mut id = IdentifyDevice::new_zeroed();
        set_id_string(&mut id.model_number, b"ACME");
        assert_eq!(&id.model_number[..4], b"CAEM");
        let mut out = [0; 40];
        id_string(&id.model_number, &mut out);
        assert_eq!(&out[..4], b"ACME");
        assert_eq!(out[39], b' ');
    }

    #[test]
    fn capacity_prefers_lba48() {
        let mut id = IdentifyDevice::new_zeroed();
        id.capabilities.set(1 << 9);
        id.user_addressable_sectors.set(0x0fff_ffff);
        assert_eq!(id.capacity(), 0x0fff_ffff);
        id.command_set_supported2.set(0x4000 | (1 << 10));
        id.user_addressable_sectors48.set(0x1_0000_0000);
        assert!(id.has_lba48());
        assert_eq!(id.capacity(), 0x1_0000_0000);
    }

    #[test]
    fn invalid_words_ignored() {
        let mut id = IdentifyDevice::new_zeroed();
        id.command_set_supported_ext.set(1 << 6);
        assert!(!id.has_fua());
        id.command_set_supported_ext.set(0x4000 | (1 << 6));
        assert!(id.has_fua());
        id.nominal_media_rotation_rate.set(1);
        assert_eq!(id.rotation_rate(), 0);
        id.major_version.set(1 << 8);
        assert_eq!(id.rotation_rate(), 1);
    }
}
