// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Zoned Block Commands (ZBC) layouts.

use super::ScsiOp;
use super::U32BE;
use super::U64BE;
use open_enum::open_enum;
use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;

/// ZBC IN and ZBC OUT share the 16 byte layout.
#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct ZbcCdb {
    pub operation_code: ScsiOp,
    /*
    UCHAR ServiceAction : 5;
    UCHAR Reserved : 3;
     */
    pub service_action: u8,
    pub zone_id: U64BE,
    pub allocation_length: U32BE,
    /// REPORT ZONES: reporting options and PARTIAL. ZBC OUT: the ALL bit.
    pub options: u8,
    pub control: u8,
}

open_enum! {
    pub enum ZbcInServiceAction: u8 {
        REPORT_ZONES = 0x00,
    }
}

open_enum! {
    pub enum ZbcOutServiceAction: u8 {
        CLOSE_ZONE = 0x01,
        FINISH_ZONE = 0x02,
        OPEN_ZONE = 0x03,
        RESET_WRITE_POINTER = 0x04,
    }
}

pub const ZBC_OUT_ALL: u8 = 0x01;
/// Mask of the reporting options forwarded to the device; the PARTIAL bit is
/// kept, bit 6 is reserved.
pub const REPORT_ZONES_OPTIONS_MASK: u8 = 0xbf;

/// REPORT ZONES parameter data header.
#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct ReportZonesHeader {
    pub zone_list_length: U32BE,
    /*
    UCHAR Same : 4;
    UCHAR Reserved : 4;
     */
    pub same: u8,
    pub reserved: [u8; 3],
    pub maximum_lba: U64BE,
    pub optimal_lba: U64BE,
    pub reserved2: [u8; 40],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct ZoneDescriptor {
    /*
    UCHAR ZoneType : 4;
    UCHAR Reserved : 4;
     */
    pub zone_type: u8,
    /*
    UCHAR Reset : 1;
    UCHAR NonSeq : 1;
    UCHAR Reserved : 2;
    UCHAR ZoneCondition : 4;
     */
    pub flags: u8,
    pub reserved: [u8; 6],
    pub zone_length: U64BE,
    pub zone_start_lba: U64BE,
    pub write_pointer_lba: U64BE,
    pub reserved2: [u8; 32],
}

pub const ZONE_DESCRIPTOR_RESET: u8 = 0x01;
pub const ZONE_DESCRIPTOR_NON_SEQ: u8 = 0x02;

static_assertions::const_assert_eq!(size_of::<ReportZonesHeader>(), 64);
static_assertions::const_assert_eq!(size_of::<ZoneDescriptor>(), 64);
