// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! ATA/ATAPI wire definitions: command opcodes, task file registers, and the
//! IDENTIFY DEVICE layout.

#![forbid(unsafe_code)]

mod identify;
pub mod zac;

pub use identify::id_string;
pub use identify::set_id_string;
pub use identify::IdentifyDevice;
pub use identify::IDENTIFY_DEVICE_BYTES;

use bitfield_struct::bitfield;
use open_enum::open_enum;
use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;

type U16LE = zerocopy::byteorder::U16<zerocopy::byteorder::LittleEndian>;
type U32LE = zerocopy::byteorder::U32<zerocopy::byteorder::LittleEndian>;
type U64LE = zerocopy::byteorder::U64<zerocopy::byteorder::LittleEndian>;

open_enum! {
    #[derive(IntoBytes, Immutable, KnownLayout, FromBytes)]
    pub enum AtaCommand: u8 {
        NOP = 0x00,
        DSM = 0x06,
        READ_SECTORS = 0x20,
        READ_LONG = 0x22,
        READ_LONG_ONCE = 0x23,
        READ_SECTORS_EXT = 0x24,
        READ_DMA_EXT = 0x25,
        READ_MULTIPLE_EXT = 0x29,
        READ_LOG_EXT = 0x2F,
        WRITE_SECTORS = 0x30,
        WRITE_LONG = 0x32,
        WRITE_LONG_ONCE = 0x33,
        WRITE_SECTORS_EXT = 0x34,
        WRITE_DMA_EXT = 0x35,
        WRITE_MULTIPLE_EXT = 0x39,
        WRITE_DMA_FUA_EXT = 0x3D,
        READ_VERIFY_SECTORS = 0x40,
        READ_VERIFY_SECTORS_EXT = 0x42,
        ZAC_MANAGEMENT_IN = 0x4A,
        TRUSTED_NON_DATA = 0x5B,
        TRUSTED_RECEIVE = 0x5C,
        TRUSTED_RECEIVE_DMA = 0x5D,
        TRUSTED_SEND = 0x5E,
        TRUSTED_SEND_DMA = 0x5F,
        READ_FPDMA_QUEUED = 0x60,
        WRITE_FPDMA_QUEUED = 0x61,
        NCQ_NON_DATA = 0x63,
        SEND_FPDMA_QUEUED = 0x64,
        RECEIVE_FPDMA_QUEUED = 0x65,
        ZAC_MANAGEMENT_OUT = 0x9F,
        PACKET = 0xA0,
        IDENTIFY_PACKET_DEVICE = 0xA1,
        READ_MULTIPLE = 0xC4,
        WRITE_MULTIPLE = 0xC5,
        READ_DMA = 0xC8,
        WRITE_DMA = 0xCA,
        WRITE_MULTIPLE_FUA_EXT = 0xCE,
        STANDBY_IMMEDIATE = 0xE0,
        FLUSH_CACHE = 0xE7,
        FLUSH_CACHE_EXT = 0xEA,
        IDENTIFY_DEVICE = 0xEC,
        SET_FEATURES = 0xEF,
    }
}

impl AtaCommand {
    /// READ/WRITE MULTIPLE variants, the only commands that may transfer more
    /// than one sector per DRQ block.
    pub fn is_multiple(self) -> bool {
        matches!(
            self,
            Self::READ_MULTIPLE
                | Self::WRITE_MULTIPLE
                | Self::READ_MULTIPLE_EXT
                | Self::WRITE_MULTIPLE_EXT
                | Self::WRITE_MULTIPLE_FUA_EXT
        )
    }

    /// READ/WRITE LONG, which transfer a vendor specific sector length.
    pub fn is_long(self) -> bool {
        matches!(
            self,
            Self::READ_LONG | Self::READ_LONG_ONCE | Self::WRITE_LONG | Self::WRITE_LONG_ONCE
        )
    }

    /// The TRUSTED SEND/RECEIVE family, including the non-data form.
    pub fn is_trusted(self) -> bool {
        (Self::TRUSTED_NON_DATA.0..=Self::TRUSTED_SEND_DMA.0).contains(&self.0)
    }
}

#[bitfield(u8)]
#[derive(IntoBytes, Immutable, KnownLayout, FromBytes, PartialEq, Eq)]
pub struct Status {
    pub err: bool,
    pub idx: bool,
    pub corr: bool,
    pub drq: bool,
    pub dsc: bool,
    pub df: bool,
    pub drdy: bool,
    pub bsy: bool,
}

impl Status {
    /// Any of the bits that indicate the command did not complete cleanly.
    pub fn indicates_error(&self) -> bool {
        self.bsy() || self.df() || self.err() || self.drq()
    }
}

#[bitfield(u8)]
#[derive(IntoBytes, Immutable, KnownLayout, FromBytes, PartialEq, Eq)]
pub struct ErrorReg {
    /// Address mark not found.
    pub amnf: bool,
    /// Track 0 not found.
    pub trk0nf: bool,
    pub abrt: bool,
    /// Media change request.
    pub mcr: bool,
    /// ID not found.
    pub idnf: bool,
    /// Media changed.
    pub mc: bool,
    /// Uncorrectable data error.
    pub unc: bool,
    /// Interface CRC error; bad block mark on older devices.
    pub icrc: bool,
}

#[bitfield(u8)]
#[derive(IntoBytes, Immutable, KnownLayout, FromBytes, PartialEq, Eq)]
pub struct DeviceHeadReg {
    #[bits(4)]
    pub head: u8,
    pub dev: bool,
    pub obs1: bool,
    pub lba: bool,
    pub obs2: bool,
}

/// Obsolete device register bits, set on every command.
pub const DEVICE_OBS: u8 = 0xA0;
/// Device register bit selecting LBA addressing.
pub const DEVICE_LBA: u8 = 0x40;
/// Device register bit selecting device 1.
pub const DEVICE_DEV1: u8 = 0x10;
/// Device register bit carrying FUA for FPDMA commands.
pub const DEVICE_FPDMA_FUA: u8 = 0x80;

open_enum! {
    /// How a task file moves data.
    pub enum AtaProtocol: u8 {
        UNKNOWN = 0,
        NODATA = 1,
        PIO = 2,
        DMA = 3,
        NCQ_NODATA = 4,
        NCQ = 5,
        ATAPI_NODATA = 6,
        ATAPI_PIO = 7,
        ATAPI_DMA = 8,
    }
}

impl AtaProtocol {
    pub fn is_ncq(self) -> bool {
        matches!(self, Self::NCQ | Self::NCQ_NODATA)
    }
}

impl Default for AtaProtocol {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

#[bitfield(u16)]
#[derive(PartialEq, Eq)]
pub struct TaskfileFlags {
    /// All eight LBA/count register halves are valid.
    pub lba48: bool,
    /// Write the address registers.
    pub isaddr: bool,
    /// Write the device register.
    pub device: bool,
    pub write: bool,
    pub lba: bool,
    pub fua: bool,
    /// Do not report errors for this command.
    pub quiet: bool,
    /// Read back the result task file on completion.
    pub result_tf: bool,
    #[bits(8)]
    _reserved: u8,
}

/// The ATA command block registers, with the "previous" (HOB) shadow values
/// used by 48-bit commands.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct AtaRegisters {
    pub feature: u8,
    pub hob_feature: u8,
    pub nsect: u8,
    pub hob_nsect: u8,
    pub lbal: u8,
    pub hob_lbal: u8,
    pub lbam: u8,
    pub hob_lbam: u8,
    pub lbah: u8,
    pub hob_lbah: u8,
    pub device: u8,
}

impl AtaRegisters {
    /// Places a 48-bit address in the LBA registers and their HOB halves.
    pub fn set_lba48(&mut self, lba: u64) {
        self.lbal = lba as u8;
        self.lbam = (lba >> 8) as u8;
        self.lbah = (lba >> 16) as u8;
        self.hob_lbal = (lba >> 24) as u8;
        self.hob_lbam = (lba >> 32) as u8;
        self.hob_lbah = (lba >> 40) as u8;
    }

    /// Places a 28-bit address in the LBA registers, bits 27:24 in the device
    /// register.
    pub fn set_lba28(&mut self, lba: u32) {
        self.lbal = lba as u8;
        self.lbam = (lba >> 8) as u8;
        self.lbah = (lba >> 16) as u8;
        self.device = (self.device & 0xf0) | ((lba >> 24) as u8 & 0xf);
    }

    pub fn lba48(&self) -> u64 {
        (self.hob_lbah as u64) << 40
            | (self.hob_lbam as u64) << 32
            | (self.hob_lbal as u64) << 24
            | (self.lbah as u64) << 16
            | (self.lbam as u64) << 8
            | self.lbal as u64
    }

    pub fn lba28(&self) -> u32 {
        (self.device as u32 & 0xf) << 24
            | (self.lbah as u32) << 16
            | (self.lbam as u32) << 8
            | self.lbal as u32
    }

    /// The 16-bit sector count; zero encodes 65536 for 48-bit commands.
    pub fn sector_count48(&self) -> u16 {
        (self.hob_nsect as u16) << 8 | self.nsect as u16
    }

    /// The 16-bit feature value of 48-bit commands.
    pub fn feature48(&self) -> u16 {
        (self.hob_feature as u16) << 8 | self.feature as u16
    }
}

pub const ATA_SECTOR_SIZE: u32 = 512;

/// Largest transfer of a 28-bit command; a count of zero encodes 256.
pub const MAX_SECTORS_28: u32 = 256;
/// Largest transfer of a 48-bit command, avoiding the zero count encoding.
pub const MAX_SECTORS_48: u32 = 65535;
pub const LBA28_LIMIT: u64 = 1 << 28;
pub const LBA48_LIMIT: u64 = 1 << 48;

// SET FEATURES subcommands
pub const SETFEATURES_WC_ON: u8 = 0x02;
pub const SETFEATURES_XFER: u8 = 0x03;
pub const SETFEATURES_WC_OFF: u8 = 0x82;

// DATA SET MANAGEMENT
pub const DSM_TRIM: u8 = 0x01;
/// Each TRIM range entry covers at most this many sectors.
pub const DSM_RANGE_MAX_SECTORS: u32 = 0xffff;

// NCQ subcommands
pub const SUBCMD_FPDMA_SEND_DSM: u8 = 0x00;
pub const SUBCMD_FPDMA_RECV_ZAC_MGMT_IN: u8 = 0x02;
pub const SUBCMD_NCQ_NON_DATA_ZAC_MGMT_OUT: u8 = 0x07;
pub const SUBCMD_ZAC_MGMT_IN_REPORT_ZONES: u8 = 0x00;

/// NCQ priority is carried in bits 7:6 of the HOB count register.
pub const NCQ_PRIO_SHIFT: u8 = 6;
pub const NCQ_PRIO_HIGH: u8 = 2;

// PACKET feature bits
pub const ATAPI_PKT_DMA: u8 = 0x01;
pub const ATAPI_DMADIR: u8 = 0x04;
/// Byte count limit programmed for PIO packet transfers.
pub const ATAPI_MAX_BYTE_COUNT: usize = 63 * 1024;
pub const ATAPI_CDB_LEN: usize = 16;
