// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! SCSI / ATA Translation (SAT) command layouts: ATA PASS-THROUGH (12), (16)
//! and (32).

use super::ScsiOp;
use super::U16BE;
use super::U32BE;
use bitfield_struct::bitfield;
use open_enum::open_enum;
use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;

open_enum! {
    /// The PROTOCOL field of an ATA pass-through CDB.
    pub enum SatProtocol: u8 {
        HARD_RESET = 0,
        SRST = 1,
        NON_DATA = 3,
        PIO_DATA_IN = 4,
        PIO_DATA_OUT = 5,
        DMA = 6,
        EXECUTE_DEVICE_DIAGNOSTIC = 8,
        DEVICE_RESET = 9,
        UDMA_DATA_IN = 10,
        UDMA_DATA_OUT = 11,
        FPDMA = 12,
        RETURN_RESPONSE_INFORMATION = 15,
    }
}

#[bitfield(u8)]
#[derive(IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct SatProtocolByte {
    /// The CDB carries 48-bit register values.
    pub extend: bool,
    #[bits(4)]
    pub protocol: u8,
    /// log2 of the sectors per DRQ block for READ/WRITE MULTIPLE.
    #[bits(3)]
    pub multiple_count: u8,
}

#[bitfield(u8)]
#[derive(IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct SatFlagsByte {
    #[bits(2)]
    pub t_length: u8,
    pub byte_block: bool,
    /// Transfer direction is from the device.
    pub t_dir: bool,
    pub t_type: bool,
    /// Return the ATA registers in the sense data even on success.
    pub ck_cond: bool,
    #[bits(2)]
    pub off_line: u8,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct AtaPassthrough12 {
    pub operation_code: ScsiOp,
    pub protocol: SatProtocolByte,
    pub flags: SatFlagsByte,
    pub features: u8,
    pub count: u8,
    pub lba_low: u8,
    pub lba_mid: u8,
    pub lba_high: u8,
    pub device: u8,
    pub command: u8,
    pub reserved: u8,
    pub control: u8,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct AtaPassthrough16 {
    pub operation_code: ScsiOp,
    pub protocol: SatProtocolByte,
    pub flags: SatFlagsByte,
    pub features_ext: u8,
    pub features: u8,
    pub count_ext: u8,
    pub count: u8,
    pub lba_low_ext: u8,
    pub lba_low: u8,
    pub lba_mid_ext: u8,
    pub lba_mid: u8,
    pub lba_high_ext: u8,
    pub lba_high: u8,
    pub device: u8,
    pub command: u8,
    pub control: u8,
}

/// ATA PASS-THROUGH (32), a variable length CDB.
#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct AtaPassthrough32 {
    pub operation_code: ScsiOp,
    pub control: u8,
    pub reserved: [u8; 5],
    pub additional_cdb_length: u8,
    pub service_action: U16BE,
    pub protocol: SatProtocolByte,
    pub flags: SatFlagsByte,
    pub reserved2: [u8; 2],
    pub lba_high_ext: u8,
    pub lba_mid_ext: u8,
    pub lba_low_ext: u8,
    pub lba_high: u8,
    pub lba_mid: u8,
    pub lba_low: u8,
    pub features_ext: u8,
    pub features: u8,
    pub count_ext: u8,
    pub count: u8,
    pub device: u8,
    pub command: u8,
    pub reserved3: u8,
    pub icc: u8,
    pub auxiliary: U32BE,
}

static_assertions::const_assert_eq!(size_of::<AtaPassthrough12>(), 12);
static_assertions::const_assert_eq!(size_of::<AtaPassthrough16>(), 16);
static_assertions::const_assert_eq!(size_of::<AtaPassthrough32>(), 32);

/// Service action of the variable length CDB that carries ATA PASS-THROUGH (32).
pub const VARIABLE_LENGTH_SERVICE_ACTION_ATA_PASSTHROUGH32: u16 = 0x1ff0;

/// Header shared by all variable length CDBs.
#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct VariableLengthCdbHeader {
    pub operation_code: ScsiOp,
    pub control: u8,
    pub reserved: [u8; 5],
    pub additional_cdb_length: u8,
    pub service_action: U16BE,
}
