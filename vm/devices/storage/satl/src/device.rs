// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! What the translator knows about the attached device.

use ata_defs::IdentifyDevice;
use bitfield_struct::bitfield;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DeviceClass {
    /// An ATA disk.
    Ata,
    /// A host-managed zoned ATA disk.
    Zac,
    /// A packet device; commands other than ATA pass-through are relayed.
    Atapi,
}

/// Negotiated device capabilities.
#[bitfield(u32)]
#[derive(PartialEq, Eq)]
pub struct DeviceCaps {
    /// LBA addressing; CHS otherwise.
    pub lba: bool,
    pub lba48: bool,
    /// A DMA mode was negotiated; PIO only otherwise.
    pub dma: bool,
    /// The device wants DMADIR for ATAPI DMA reads.
    pub dmadir: bool,
    /// Native command queuing is enabled.
    pub ncq: bool,
    /// DSM TRIM may be queued with SEND FPDMA QUEUED.
    pub ncq_trim: bool,
    /// ZAC MANAGEMENT IN may be queued with RECEIVE FPDMA QUEUED.
    pub ncq_zac_mgmt_in: bool,
    /// ZAC MANAGEMENT OUT may be queued with NCQ NON-DATA.
    pub ncq_zac_mgmt_out: bool,
    /// NCQ priority is enabled.
    pub ncq_prio: bool,
    pub trim: bool,
    pub fua: bool,
    /// Zoned command set, host managed or host aware.
    pub zac: bool,
    pub write_cache: bool,
    pub read_ahead: bool,
    pub flush: bool,
    pub flush_ext: bool,
    pub removable: bool,
    pub wwn: bool,
    /// TRUSTED SEND/RECEIVE are supported.
    pub trusted: bool,
    #[bits(13)]
    _reserved: u16,
}

/// Per-model exceptions to the capabilities the device reports.
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct DeviceQuirks {
    /// TRIM is broken; never issue or advertise it.
    pub no_trim: bool,
    /// Limit a single TRIM to 128 MiB.
    pub max_trim_128m: bool,
    /// Trimmed blocks reliably read back as zero.
    pub zero_after_trim: bool,
    #[bits(5)]
    _reserved: u8,
}

/// Zoned block device characteristics.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ZonedInfo {
    /// Unrestricted read in sequential write required zones.
    pub urswrz: bool,
    pub optimal_open: u32,
    pub optimal_nonseq: u32,
    pub max_open: u32,
}

impl Default for ZonedInfo {
    fn default() -> Self {
        Self {
            urswrz: false,
            optimal_open: u32::MAX,
            optimal_nonseq: u32::MAX,
            max_open: u32::MAX,
        }
    }
}

/// An immutable view of the device's properties.
///
/// Replaced wholesale when the device is reconfigured, so a command sees one
/// consistent view from submission to completion.
#[derive(Debug, Clone)]
pub struct DeviceSnapshot {
    pub class: DeviceClass,
    pub caps: DeviceCaps,
    pub quirks: DeviceQuirks,
    /// Device 1 on its link; selects DEV1 in the device register.
    pub devno: u8,
    /// Addressable sectors.
    pub n_sectors: u64,
    /// Logical sector size in bytes.
    pub sector_size: u32,
    /// log2 of logical sectors per physical sector.
    pub log2_per_physical: u8,
    pub lowest_aligned: u16,
    /// CHS geometry.
    pub heads: u16,
    pub sectors: u16,
    /// Sectors per DRQ block for READ/WRITE MULTIPLE, zero if unset.
    pub multi_count: u8,
    /// Longest CDB the device accepts.
    pub cdb_len: usize,
    /// IDENTIFY word 69 bits 1:0.
    pub zoned_cap: u8,
    pub zoned: ZonedInfo,
    pub rotation_rate: u16,
    pub form_factor: u8,
    pub identify: IdentifyDevice,
}

impl DeviceSnapshot {
    /// Builds a snapshot from IDENTIFY (PACKET) DEVICE data.
    ///
    /// Capabilities the IDENTIFY data cannot express, such as queued TRIM or
    /// quirks, start cleared.
    pub fn from_identify(class: DeviceClass, identify: &IdentifyDevice) -> Self {
        let zoned_cap = identify.zoned_cap();
        let (heads, sectors) = identify.chs_geometry();
        let caps = DeviceCaps::new()
            .with_lba(identify.has_lba())
            .with_lba48(identify.has_lba48())
            .with_dma(identify.has_dma())
            .with_ncq(identify.has_ncq())
            .with_ncq_prio(identify.has_ncq_prio())
            .with_trim(identify.has_trim())
            .with_fua(identify.has_fua())
            .with_zac(class == DeviceClass::Zac || zoned_cap == 1)
            .with_write_cache(identify.write_cache_enabled())
            .with_read_ahead(identify.read_ahead_enabled())
            .with_flush(identify.has_flush())
            .with_flush_ext(identify.has_flush_ext())
            .with_removable(identify.is_removable())
            .with_wwn(identify.has_wwn())
            .with_trusted(identify.has_trusted());

        let cdb_len = match class {
            DeviceClass::Ata | DeviceClass::Zac => 32,
            DeviceClass::Atapi => identify.packet_len().unwrap_or(12),
        };

        Self {
            class,
            caps,
            quirks: DeviceQuirks::new(),
            devno: 0,
            n_sectors: identify.capacity(),
            sector_size: identify.logical_sector_size(),
            log2_per_physical: identify.log2_per_physical(),
            lowest_aligned: identify.lowest_aligned_lba(),
            heads,
            sectors,
            multi_count: identify.multi_count(),
            cdb_len,
            zoned_cap,
            zoned: ZonedInfo::default(),
            rotation_rate: identify.rotation_rate(),
            form_factor: identify.nominal_form_factor(),
            identify: *identify,
        }
    }

    pub fn is_atapi(&self) -> bool {
        self.class == DeviceClass::Atapi
    }

    /// Zoned in any form, including drive-managed.
    pub(crate) fn is_zoned(&self) -> bool {
        self.zoned_cap != 0 || self.class == DeviceClass::Zac
    }

    /// Whether a flush is worth issuing.
    pub(crate) fn try_flush(&self) -> bool {
        self.caps.write_cache() || self.caps.flush() || self.caps.flush_ext()
    }

    /// TRIM is supported and usable.
    pub(crate) fn trim_usable(&self) -> bool {
        self.caps.trim() && !self.quirks.no_trim()
    }

    /// Whether FUA writes may be advertised to the initiator.
    pub(crate) fn supports_fua(&self, policy_fua: bool) -> bool {
        if !policy_fua || !self.caps.fua() || !self.caps.lba48() {
            return false;
        }
        if !self.caps.dma() && self.multi_count == 0 {
            return false;
        }
        !self.fua_blacklisted()
    }

    fn fua_blacklisted(&self) -> bool {
        let mut model = [0; 40];
        let mut firmware = [0; 8];
        ata_defs::id_string(&self.identify.model_number, &mut model);
        ata_defs::id_string(&self.identify.firmware_revision, &mut firmware);
        model.trim_ascii() == b"Maxtor" && firmware.trim_ascii() == b"BANC1G10"
    }
}

/// Mutable per-device state, shared by every command.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct DeviceState {
    /// Report sense in descriptor format, the control mode page D_SENSE bit.
    pub descriptor_sense: bool,
    /// The device has been detached or failed.
    pub disabled: bool,
}
