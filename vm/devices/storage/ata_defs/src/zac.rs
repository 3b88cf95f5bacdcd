// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Zoned ATA Commands (ZAC) REPORT ZONES data, which shares the ZBC layout
//! but is little-endian.

use super::U32LE;
use super::U64LE;
use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct ZacReportZonesHeader {
    pub zone_list_length: U32LE,
    /// Low nibble only.
    pub same: u8,
    pub reserved: [u8; 3],
    pub maximum_lba: U64LE,
    pub optimal_lba: U64LE,
    pub reserved2: [u8; 40],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct ZacZoneDescriptor {
    pub zone_type: u8,
    pub flags: u8,
    pub reserved: [u8; 6],
    pub zone_length: U64LE,
    pub zone_start_lba: U64LE,
    pub write_pointer_lba: U64LE,
    pub reserved2: [u8; 32],
}

pub const ZAC_REPORT_ZONES_ENTRY_LEN: usize = 64;

static_assertions::const_assert_eq!(size_of::<ZacReportZonesHeader>(), ZAC_REPORT_ZONES_ENTRY_LEN);
static_assertions::const_assert_eq!(size_of::<ZacZoneDescriptor>(), ZAC_REPORT_ZONES_ENTRY_LEN);
