// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! SCSI wire definitions for direct-access and zoned block devices.

#![forbid(unsafe_code)]

pub mod sat;
pub mod zbc;

use bitfield_struct::bitfield;
use core::fmt::Debug;
use open_enum::open_enum;
use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;

type U16BE = zerocopy::byteorder::U16<zerocopy::byteorder::BigEndian>;
type U32BE = zerocopy::byteorder::U32<zerocopy::byteorder::BigEndian>;
type U64BE = zerocopy::byteorder::U64<zerocopy::byteorder::BigEndian>;

open_enum! {
    #[derive(IntoBytes, Immutable, KnownLayout, FromBytes)]
    pub enum ScsiOp: u8 {
        TEST_UNIT_READY = 0x00,
        REZERO_UNIT = 0x01,
        REQUEST_SENSE = 0x03,
        FORMAT_UNIT = 0x04,
        REASSIGN_BLOCKS = 0x07,
        READ6 = 0x08,
        WRITE6 = 0x0A,
        SEEK6 = 0x0B,
        INQUIRY = 0x12,
        MODE_SELECT = 0x15,
        RESERVE_UNIT = 0x16,
        RELEASE_UNIT = 0x17,
        MODE_SENSE = 0x1A,
        START_STOP_UNIT = 0x1B,
        RECEIVE_DIAGNOSTIC = 0x1C,
        SEND_DIAGNOSTIC = 0x1D,
        MEDIUM_REMOVAL = 0x1E,
        READ_CAPACITY = 0x25,
        READ = 0x28,
        WRITE = 0x2A,
        SEEK = 0x2B,
        WRITE_VERIFY = 0x2E,
        VERIFY = 0x2F,
        SYNCHRONIZE_CACHE = 0x35,
        READ_DEFECT_DATA = 0x37,
        WRITE_DATA_BUFF = 0x3B,
        READ_DATA_BUFF = 0x3C,
        WRITE_SAME = 0x41,
        UNMAP = 0x42,
        LOG_SELECT = 0x4C,
        LOG_SENSE = 0x4D,
        MODE_SELECT10 = 0x55,
        MODE_SENSE10 = 0x5A,
        PERSISTENT_RESERVE_IN = 0x5E,
        PERSISTENT_RESERVE_OUT = 0x5F,
        VARIABLE_LENGTH_CMD = 0x7F,
        ATA_PASSTHROUGH16 = 0x85,
        READ16 = 0x88,
        COMPARE_AND_WRITE = 0x89,
        WRITE16 = 0x8A,
        WRITE_VERIFY16 = 0x8E,
        VERIFY16 = 0x8F,
        PREFETCH16 = 0x90,
        SYNCHRONIZE_CACHE16 = 0x91,
        WRITE_SAME16 = 0x93,
        ZBC_OUT = 0x94, // Close Zone, Finish Zone, Open Zone, Reset Write Pointer
        ZBC_IN = 0x95, // Report Zones
        SERVICE_ACTION_IN16 = 0x9E,
        READ_CAPACITY16 = 0x9E,
        SERVICE_ACTION_OUT16 = 0x9F,
        REPORT_LUNS = 0xA0,
        ATA_PASSTHROUGH12 = 0xA1,
        SECURITY_PROTOCOL_IN = 0xA2,
        MAINTENANCE_IN = 0xA3,
        MAINTENANCE_OUT = 0xA4,
        READ12 = 0xA8,
        WRITE12 = 0xAA,
        VERIFY12 = 0xAF,
        SECURITY_PROTOCOL_OUT = 0xB5,
    }
}

impl ScsiOp {
    /// The CDB length implied by the operation code's group, as used by
    /// transports that do not carry an explicit length.
    pub const fn group_cdb_len(self) -> usize {
        const GROUP_LEN: [usize; 8] = [6, 10, 10, 12, 16, 12, 10, 10];
        GROUP_LEN[(self.0 >> 5) as usize & 7]
    }
}

pub const VPD_SUPPORTED_PAGES: u8 = 0x00;
pub const VPD_SERIAL_NUMBER: u8 = 0x80;
pub const VPD_DEVICE_IDENTIFIERS: u8 = 0x83;
pub const VPD_ATA_INFORMATION: u8 = 0x89;
pub const VPD_BLOCK_LIMITS: u8 = 0xB0;
pub const VPD_BLOCK_DEVICE_CHARACTERISTICS: u8 = 0xB1;
pub const VPD_LOGICAL_BLOCK_PROVISIONING: u8 = 0xB2;
pub const VPD_ZONED_BLOCK_DEVICE_CHARACTERISTICS: u8 = 0xB6;

pub const DIRECT_ACCESS_DEVICE: u8 = 0x00;
pub const ZONED_BLOCK_DEVICE: u8 = 0x14;

pub const VPD_CODE_SET_BINARY: u8 = 1;
pub const VPD_CODE_SET_ASCII: u8 = 2;

pub const VPD_IDENTIFIER_TYPE_VENDOR_SPECIFIC: u8 = 0;
pub const VPD_IDENTIFIER_TYPE_VENDOR_ID: u8 = 1;
pub const VPD_IDENTIFIER_TYPE_FCPH_NAME: u8 = 3;

#[repr(C)]
#[derive(Debug, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct CdbInquiry {
    pub operation_code: u8, // 0x12 - SCSIOP_INQUIRY
    pub flags: InquiryFlags,
    pub page_code: u8,
    pub allocation_length: U16BE,
    pub control: u8,
}

#[bitfield(u8)]
#[derive(IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct InquiryFlags {
    #[bits(1)]
    pub vpd: bool,
    #[bits(1)]
    pub csd: bool,
    #[bits(6)]
    pub reserved: u8,
}

pub const T10_VERSION_SPC3: u8 = 0x05;
pub const T10_VERSION_SPC5: u8 = 0x07;
pub const T10_RESPONSE_DATA_SPC3: u8 = 0x02;

/// Response data format byte reported for ATAPI devices that answer
/// INQUIRY with version 0.
pub const T10_RESPONSE_DATA_ATAPI_FIXUP: u8 = 0x32;

#[repr(C)]
#[derive(Debug, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct InquiryDataHeader {
    /*
    UCHAR DeviceType : 5;
    UCHAR DeviceTypeQualifier : 3;
    */
    pub device_type: u8,
    pub flags2: InquiryDataFlag2,
    pub versions: u8,
    pub flags3: InquiryDataFlag3,
    pub additional_length: u8,
}

#[bitfield(u8)]
#[derive(IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct InquiryDataFlag2 {
    #[bits(7)]
    pub device_type_modifier: u8,
    #[bits(1)]
    pub removable_media: bool,
}

#[bitfield(u8)]
#[derive(IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct InquiryDataFlag3 {
    #[bits(4)]
    pub response_data_format: u8,
    #[bits(1)]
    pub hi_support: bool,
    #[bits(1)]
    pub norm_aca: bool,
    #[bits(1)]
    pub reserved_bit: bool,
    #[bits(1)]
    pub aerc: bool,
}

#[repr(C)]
#[derive(Debug, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct InquiryData {
    pub header: InquiryDataHeader,
    pub reserved: u8,
    pub flags5: u8,
    /*
    UCHAR SoftReset : 1;
    UCHAR CommandQueue : 1;
    UCHAR TransferDisable : 1;      // defined only for SIP devices.
    UCHAR LinkedCommands : 1;
    UCHAR Synchronous : 1;          // defined only for SIP devices.
    UCHAR Wide16Bit : 1;            // defined only for SIP devices.
    UCHAR Wide32Bit : 1;            // defined only for SIP devices.
    UCHAR RelativeAddressing : 1;
     */
    pub misc: u8,
    pub vendor_id: [u8; 8],
    pub product_id: [u8; 16],
    pub product_revision_level: [u8; 4],
    pub vendor_specific: [u8; 20],
    pub reserved3: [u8; 2],
    pub version_descriptors: [U16BE; 8],
    pub reserved4: [u8; 22],
}

/// Standard INQUIRY data returned for SPC-3 and later devices.
pub const INQUIRY_DATA_LEN: usize = 96;
static_assertions::const_assert_eq!(size_of::<InquiryData>(), INQUIRY_DATA_LEN);

pub const INQUIRY_MISC_COMMAND_QUEUE: u8 = 0x02;

#[repr(C)]
#[derive(Debug, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct VpdPageHeader {
    /*
    UCHAR DeviceType : 5;
    UCHAR DeviceTypeQualifier : 3;
     */
    pub device_type: u8,
    pub page_code: u8,
    pub page_length: U16BE,
}

#[repr(C)]
#[derive(Debug, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct VpdIdentificationDescriptor {
    pub code_set: u8,
    pub identifiertype: u8,
    pub reserved3: u8,
    pub identifier_length: u8,
}

#[repr(C)]
#[derive(Debug, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct VpdBlockLimitsDescriptor {
    pub reserved0: u8,
    pub max_compare_and_write_length: u8,
    pub optimal_transfer_length_granularity: U16BE,
    pub max_transfer_length: U32BE,
    pub optimal_transfer_length: U32BE,
    pub max_prefetch_xd_read_xd_write_transfer_length: U32BE,
    pub max_unmap_lba_count: U32BE,
    pub max_unmap_block_descriptor_count: U32BE,
    pub optimal_unmap_granularity: U32BE,
    pub unmap_granularity_alignment: [u8; 4],
    pub max_write_same_length: U64BE,
    pub max_atomic_transfer_length: U32BE,
    pub atomic_alignment: U32BE,
    pub atomic_transfer_length_granularity: U32BE,
    pub reserved1: [u8; 8],
}

/// VPD Page 0xB1, Block Device Characteristics
#[repr(C)]
#[derive(Debug, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct VpdBlockDeviceCharacteristicsPage {
    pub medium_rotation_rate: U16BE,
    pub product_type: u8,
    /*
    UCHAR NominalFormFactor : 4;
    UCHAR WACEREQ : 2;
    UCHAR WABEREQ : 2;
     */
    pub form_factor: u8,
    /*
    UCHAR VBULS : 1;
    UCHAR FUAB : 1;
    UCHAR BOCS : 1;
    UCHAR Reserved : 1;
    UCHAR ZONED : 2;
    UCHAR Reserved2 : 2;
     */
    pub zoned: u8,
    pub reserved: [u8; 55],
}

// VPD Page 0xB2, Logical Block Provisioning

/// Unmap via WRITE SAME(16) is supported.
pub const VPD_LBP_WRITE_SAME16: u8 = 1 << 6;

#[repr(C)]
#[derive(Debug, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct VpdLogicalBlockProvisioningPage {
    pub threshold_exponent: u8,
    /*
    UCHAR DP                : 1;
    UCHAR ANC_SUP           : 1;
    UCHAR LBPRZ             : 1;
    UCHAR Reserved0         : 2;
    UCHAR LBPWS10           : 1;
    UCHAR LBPWS             : 1;
    UCHAR LBPU              : 1;
    */
    pub flags: u8,
    /*
    UCHAR ProvisioningType  : 3;
    UCHAR Reserved1         : 5;
    */
    pub provisioning_type: u8,
    pub reserved2: u8,
}

/// VPD Page 0x89, ATA Information (SAT)
#[repr(C)]
#[derive(Debug, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct VpdAtaInformationPage {
    pub reserved: [u8; 4],
    pub sat_vendor_identification: [u8; 8],
    pub sat_product_identification: [u8; 16],
    pub sat_product_revision_level: [u8; 4],
    /// Device signature, as the initial register device-to-host FIS.
    pub device_signature: [u8; 20],
    pub command_code: u8,
    pub reserved2: [u8; 3],
    pub identify_data: [u8; 512],
}

pub const VPD_ATA_INFORMATION_PAGE_LENGTH: u16 = 0x238;
static_assertions::const_assert_eq!(
    size_of::<VpdAtaInformationPage>(),
    VPD_ATA_INFORMATION_PAGE_LENGTH as usize
);

/// VPD Page 0xB6, Zoned Block Device Characteristics
#[repr(C)]
#[derive(Debug, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct VpdZonedBlockDeviceCharacteristicsPage {
    /*
    UCHAR URSWRZ : 1;
    UCHAR Reserved : 7;
     */
    pub flags: u8,
    pub reserved: [u8; 3],
    pub optimal_open_sequential_write_preferred_zones: U32BE,
    pub optimal_non_sequentially_written_sequential_write_preferred_zones: U32BE,
    pub max_open_sequential_write_required_zones: U32BE,
    pub reserved2: [u8; 44],
}

/// Common page length of the block limits, block device characteristics, and
/// zoned characteristics pages.
pub const VPD_EXTENDED_PAGE_LENGTH: u16 = 0x3c;
static_assertions::const_assert_eq!(
    size_of::<VpdBlockLimitsDescriptor>(),
    VPD_EXTENDED_PAGE_LENGTH as usize
);
static_assertions::const_assert_eq!(
    size_of::<VpdBlockDeviceCharacteristicsPage>(),
    VPD_EXTENDED_PAGE_LENGTH as usize
);
static_assertions::const_assert_eq!(
    size_of::<VpdZonedBlockDeviceCharacteristicsPage>(),
    VPD_EXTENDED_PAGE_LENGTH as usize
);

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct SenseDataHeader {
    /*
    UCHAR ErrorCode:7;
    UCHAR Valid:1;
     */
    pub error_code: SenseDataErrorCode,
    pub segment_number: u8,
    /*
    UCHAR SenseKey:4;
    UCHAR Reserved:1;
    UCHAR IncorrectLength:1;
    UCHAR EndOfMedia:1;
    UCHAR FileMark:1;
     */
    pub sense_key: SenseKey,
    pub information: [u8; 4],
    pub additional_sense_length: u8,
}

/// Fixed format sense data.
#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct SenseData {
    pub header: SenseDataHeader,
    pub command_specific_information: [u8; 4],
    pub additional_sense_code: AdditionalSenseCode,
    pub additional_sense_code_qualifier: u8,
    pub field_replaceable_unit_code: u8,
    pub sense_key_specific: [u8; 3],
}

impl SenseData {
    pub const fn new(
        sense_key: SenseKey,
        additional_sense_code: AdditionalSenseCode,
        additional_sense_code_qualifier: u8,
    ) -> Self {
        SenseData {
            header: SenseDataHeader {
                error_code: SenseDataErrorCode::FIXED_CURRENT,
                segment_number: 0,
                sense_key,
                information: [0; 4],
                additional_sense_length: (size_of::<SenseData>() - size_of::<SenseDataHeader>())
                    as u8,
            },
            command_specific_information: [0; 4],
            additional_sense_code,
            additional_sense_code_qualifier,
            field_replaceable_unit_code: 0,
            sense_key_specific: [0; 3],
        }
    }
}

/// Set in the fixed format response code byte when the information field is
/// valid.
pub const SENSE_DATA_VALID: u8 = 0x80;

/// Descriptor format sense data header. Descriptors follow.
#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct DescriptorSenseDataHeader {
    pub error_code: SenseDataErrorCode,
    /*
    UCHAR SenseKey:4;
    UCHAR Reserved:4;
     */
    pub sense_key: SenseKey,
    pub additional_sense_code: AdditionalSenseCode,
    pub additional_sense_code_qualifier: u8,
    pub reserved: [u8; 3],
    pub additional_sense_length: u8,
}

impl DescriptorSenseDataHeader {
    pub const fn new(
        sense_key: SenseKey,
        additional_sense_code: AdditionalSenseCode,
        additional_sense_code_qualifier: u8,
    ) -> Self {
        DescriptorSenseDataHeader {
            error_code: SenseDataErrorCode::DESCRIPTOR_CURRENT,
            sense_key,
            additional_sense_code,
            additional_sense_code_qualifier,
            reserved: [0; 3],
            additional_sense_length: 0,
        }
    }
}

open_enum! {
    pub enum SenseDescriptorType: u8 {
        INFORMATION = 0x00,
        COMMAND_SPECIFIC_INFORMATION = 0x01,
        SENSE_KEY_SPECIFIC = 0x02,
        FIELD_REPLACEABLE_UNIT = 0x03,
        ATA_STATUS_RETURN = 0x09,
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct InformationSenseDescriptor {
    pub descriptor_type: u8,
    pub additional_length: u8,
    /*
    UCHAR Reserved : 7;
    UCHAR Valid : 1;
     */
    pub valid: u8,
    pub reserved: u8,
    pub information: U64BE,
}

/// Sense-key specific bytes for ILLEGAL REQUEST: the field pointer.
#[bitfield(u8)]
#[derive(IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct FieldPointerFlags {
    #[bits(3)]
    pub bit_pointer: u8,
    pub bit_pointer_valid: bool,
    #[bits(2)]
    pub reserved: u8,
    /// The field is in the CDB, not in the parameter list.
    pub command_data: bool,
    pub sense_key_specific_valid: bool,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct SenseKeySpecificDescriptor {
    pub descriptor_type: u8,
    pub additional_length: u8,
    pub reserved: [u8; 2],
    pub flags: FieldPointerFlags,
    pub field_pointer: U16BE,
    pub reserved2: u8,
}

/// ATA Status Return sense data descriptor (SAT).
#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct AtaStatusReturnDescriptor {
    pub descriptor_type: u8,
    pub additional_length: u8,
    /*
    UCHAR Extend : 1;
    UCHAR Reserved : 7;
     */
    pub extend: u8,
    pub error: u8,
    pub count_ext: u8,
    pub count: u8,
    pub lba_low_ext: u8,
    pub lba_low: u8,
    pub lba_mid_ext: u8,
    pub lba_mid: u8,
    pub lba_high_ext: u8,
    pub lba_high: u8,
    pub device: u8,
    pub status: u8,
}

// Fixed format ATA pass-through results (SAT), byte 8 of the sense data.
pub const ATA_PASSTHROUGH_FIXED_EXTEND: u8 = 0x80;
pub const ATA_PASSTHROUGH_FIXED_COUNT_UPPER_NONZERO: u8 = 0x40;
pub const ATA_PASSTHROUGH_FIXED_LBA_UPPER_NONZERO: u8 = 0x20;

open_enum! {
    #[derive(IntoBytes, Immutable, KnownLayout, FromBytes)]
    pub enum SenseKey: u8 {
        NO_SENSE = 0x00,
        RECOVERED_ERROR = 0x01,
        NOT_READY = 0x02,
        MEDIUM_ERROR = 0x03,
        HARDWARE_ERROR = 0x04,
        ILLEGAL_REQUEST = 0x05,
        UNIT_ATTENTION = 0x06,
        DATA_PROTECT = 0x07,
        BLANK_CHECK = 0x08,
        UNIQUE = 0x09,
        COPY_ABORTED = 0x0A,
        ABORTED_COMMAND = 0x0B,
        EQUAL = 0x0C,
        VOL_OVERFLOW = 0x0D,
        MISCOMPARE = 0x0E,
        RESERVED = 0x0F,
    }
}

open_enum! {
    #[derive(IntoBytes, Immutable, KnownLayout, FromBytes)]
    pub enum SenseDataErrorCode: u8 {
        FIXED_CURRENT = 0x70,
        FIXED_DEFERRED = 0x71,
        DESCRIPTOR_CURRENT = 0x72,
        DESCRIPTOR_DEFERRED = 0x73,
    }
}

open_enum! {
    #[derive(IntoBytes, Immutable, KnownLayout, FromBytes)]
    pub enum AdditionalSenseCode: u8 {
        NO_SENSE = 0x00,
        NO_SEEK_COMPLETE = 0x02,
        WRITE = 0x03,
        LUN_NOT_READY = 0x04,
        LUN_COMMUNICATION = 0x08,
        SERVO_ERROR = 0x09,
        WARNING = 0x0B,
        WRITE_ERROR = 0x0C,
        CRC_OR_ECC_ERROR = 0x10,
        UNRECOVERED_ERROR = 0x11,
        ADDRESS_MARK_NOT_FOUND = 0x13,
        TRACK_ERROR = 0x14,
        SEEK_ERROR = 0x15,
        REC_DATA_NOECC = 0x17,
        REC_DATA_ECC = 0x18,
        PARAMETER_LIST_LENGTH = 0x1A,
        MISCOMPARE_DURING_VERIFY_OPERATION = 0x1D,
        ILLEGAL_COMMAND = 0x20,
        ILLEGAL_BLOCK = 0x21,
        INVALID_CDB = 0x24,
        INVALID_LUN = 0x25,
        INVALID_FIELD_PARAMETER_LIST = 0x26,
        WRITE_PROTECT = 0x27,
        MEDIUM_CHANGED = 0x28,
        BUS_RESET = 0x29,
        PARAMETERS_CHANGED = 0x2A,
        COMMAND_SEQUENCE_ERROR = 0x2C,
        INVALID_MEDIA = 0x30,
        MEDIUM_FORMAT_CORRUPTED = 0x31,
        SAVING_PARAMETER_NOT_SUPPORTED = 0x39,
        NO_MEDIA_IN_DEVICE = 0x3a,
        LOGICAL_UNIT_ERROR = 0x3e,
        OPERATING_CONDITIONS_CHANGED = 0x3f,
        DATA_PATH_FAILURE = 0x41,
        POWER_ON_SELF_TEST_FAILURE = 0x42,
        INTERNAL_TARGET_FAILURE = 0x44,
        SCSI_PARITY_ERROR = 0x47,
        DATA_TRANSFER_ERROR = 0x4b,
        MEDIUM_REMOVAL_PREVENTED = 0x53,
        RESOURCE_FAILURE = 0x55,
        FAILURE_PREDICTION_THRESHOLD_EXCEEDED = 0x5d,
    }
}

// SCSI_ADSENSE_NO_SENSE (0x00) qualifiers
pub const SCSI_SENSEQ_ATA_PASS_THROUGH_INFORMATION_AVAILABLE: u8 = 0x1D;

// SCSI_ADSENSE_LUN_NOT_READY (0x04) qualifiers
pub const SCSI_SENSEQ_HARD_RESET_REQUIRED: u8 = 0x21;

// SCSI_ADSENSE_UNRECOVERED_ERROR (0x11) qualifiers
pub const SCSI_SENSEQ_AUTO_REALLOCATION_FAILED: u8 = 0x04;

// SCSI_ADSENSE_ILLEGAL_BLOCK (0x21) qualifiers
pub const SCSI_SENSEQ_UNALIGNED_WRITE: u8 = 0x04;

open_enum! {
    #[derive(IntoBytes, Immutable, KnownLayout, FromBytes)]
    pub enum ScsiStatus: u8 {
        GOOD = 0x00,
        CHECK_CONDITION = 0x02,
        CONDITION_MET = 0x04,
        BUSY = 0x08,
        RESERVATION_CONFLICT = 0x18,
        COMMAND_TERMINATED = 0x22,
        QUEUE_FULL = 0x28,
        TASK_ABORTED = 0x40,
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct CdbRequestSense {
    pub operation_code: ScsiOp,
    pub desc: u8,
    pub reserved: [u8; 2],
    pub allocation_length: u8,
    pub control: u8,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct ReadCapacityData {
    pub logical_block_address: U32BE,
    pub bytes_per_block: U32BE,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct ModeSense {
    pub operation_code: ScsiOp,
    pub flags1: ModeSenseCdbFlags,
    pub flags2: ModeSenseFlags,
    pub sub_page_code: u8,
    pub allocation_length: u8,
    pub control: u8,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct ModeSense10 {
    pub operation_code: ScsiOp,
    pub flags1: ModeSenseCdbFlags,
    pub flags2: ModeSenseFlags,
    pub sub_page_code: u8,
    pub reserved2: [u8; 3],
    pub allocation_length: U16BE,
    pub control: u8,
}

#[bitfield(u8)]
#[derive(IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct ModeSenseCdbFlags {
    #[bits(3)]
    pub reserved: u8,
    /// Disable block descriptors.
    pub dbd: bool,
    /// Long LBA accepted (MODE SENSE(10) only).
    pub llbaa: bool,
    #[bits(3)]
    pub reserved2: u8,
}

#[bitfield(u8)]
#[derive(IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct ModeSenseFlags {
    #[bits(6)]
    pub page_code: u8,
    #[bits(2)]
    pub pc: u8,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct ModeReadWriteRecoveryPage {
    /*
        UCHAR PageCode : 6;
        UCHAR Reserved1 : 1;
        UCHAR PSBit : 1;
    */
    pub page_code: u8,
    pub page_length: u8,
    /*
       UCHAR DCRBit : 1;
       UCHAR DTEBit : 1;
       UCHAR PERBit : 1;
       UCHAR EERBit : 1;
       UCHAR RCBit : 1;
       UCHAR TBBit : 1;
       UCHAR ARRE : 1;
       UCHAR AWRE : 1;
    */
    pub bit_info: u8,
    pub read_retry_count: u8,
    pub reserved: [u8; 4],
    pub write_retry_count: u8,
    pub reserved2: [u8; 3],
}

pub const MODE_RW_RECOVERY_AWRE: u8 = 0x80;

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct ModeSelect {
    pub operation_code: ScsiOp,
    pub flags: ModeSelectFlags,
    pub reserved2: [u8; 2],
    pub parameter_list_length: u8,
    pub control: u8,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct ModeSelect10 {
    pub operation_code: ScsiOp,
    pub flags: ModeSelectFlags,
    pub reserved2: [u8; 5],
    pub parameter_list_length: U16BE,
    pub control: u8,
}

#[bitfield(u8)]
#[derive(IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct ModeSelectFlags {
    #[bits(1)]
    pub spbit: bool,
    #[bits(3)]
    pub reserved: u8,
    #[bits(1)]
    pub page_format: bool,
    #[bits(3)]
    pub reserved2: u8,
}

pub const MODE_CONTROL_CHANGEABLE_VALUES: u8 = 0x40;
pub const MODE_CONTROL_SAVED_VALUES: u8 = 0xc0;

pub const MODE_PAGE_ERROR_RECOVERY: u8 = 0x01;
pub const MODE_PAGE_CACHING: u8 = 0x08;
pub const MODE_PAGE_CONTROL: u8 = 0x0A;
pub const MODE_PAGE_POWER_CONDITION: u8 = 0x1A;
pub const MODE_PAGE_ALL: u8 = 0x3f;

pub const MODE_SUBPAGE_NONE: u8 = 0x00;
pub const MODE_SUBPAGE_ALL: u8 = 0xff;

/// Set in the page code byte of a mode page that uses the subpage format.
pub const MODE_PAGE_SUBPAGE_FORMAT: u8 = 0x40;

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct ModeParameterHeader {
    pub mode_data_length: u8,
    pub medium_type: u8,
    pub device_specific_parameter: u8,
    pub block_descriptor_length: u8,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct ModeParameterHeader10 {
    pub mode_data_length: U16BE,
    pub medium_type: u8,
    pub device_specific_parameter: u8,
    pub reserved: [u8; 2],
    pub block_descriptor_length: U16BE,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct ModeParameterBlockDescriptor {
    pub density_code: u8,
    pub number_of_blocks: [u8; 3],
    pub reserved: u8,
    pub block_length: [u8; 3],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct ModeCachingPage {
    /*
    UCHAR PageCode : 6;
    UCHAR Reserved : 1;
    UCHAR PageSavable : 1;
     */
    pub page_code: u8,
    pub page_length: u8,
    /*
    UCHAR ReadDisableCache : 1;
    UCHAR MultiplicationFactor : 1;
    UCHAR WriteCacheEnable : 1;
    UCHAR Reserved2 : 5;
     */
    pub flags: u8,
    /*
    UCHAR WriteRetensionPriority : 4;
    UCHAR ReadRetensionPriority : 4;
     */
    pub retension_priority: u8,
    pub disable_prefetch_transfer: [u8; 2],
    pub minimum_prefetch: [u8; 2],
    pub maximum_prefetch: [u8; 2],
    pub maximum_prefetch_ceiling: [u8; 2],
    /*
    UCHAR NV_DIS : 1;
    UCHAR Reserved3 : 2;
    UCHAR Vendor : 2;
    UCHAR DRA : 1;
    UCHAR LBCSS : 1;
    UCHAR FSW : 1;
     */
    pub flags2: u8,
    pub number_of_cache_segments: u8,
    pub cache_segment_size: [u8; 2],
    pub reserved: u8,
    pub non_cache_segment_size: [u8; 3],
}

pub const MODE_CACHING_WRITE_CACHE_ENABLE: u8 = 0x4;
pub const MODE_CACHING_DISABLE_READ_AHEAD: u8 = 0x20;

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct ModeControlPage {
    /*
    UCHAR PageCode : 6;
    UCHAR SPF : 1;
    UCHAR PageSavable : 1;
     */
    pub page_code: u8,
    pub page_length: u8,
    /*
    UCHAR RLEC : 1;
    UCHAR GLTSD : 1;
    UCHAR D_SENSE : 1;
    UCHAR DPICZ : 1;
    UCHAR TMF_ONLY : 1;
    UCHAR TST : 3;
     */
    pub flags: u8,
    pub queue_flags: u8,
    pub flags2: u8,
    pub flags3: u8,
    pub obsolete: [u8; 2],
    pub busy_timeout_period: U16BE,
    pub extended_self_test_completion_time: U16BE,
}

pub const MODE_CONTROL_D_SENSE: u8 = 0x4;

pub const MODE_DSP_FUA_SUPPORTED: u8 = 0x10;

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct LunList {
    pub length: U32BE,
    pub reserved: [u8; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct LunListEntry(pub [u8; 8]);

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct ReportLuns {
    pub operation_code: ScsiOp,
    pub reserved1: [u8; 5],
    pub allocation_length: U32BE,
    pub reserved2: u8,
    pub control: u8,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct Cdb10 {
    pub operation_code: ScsiOp,
    pub flags: CdbFlags,
    pub logical_block: U32BE,
    pub reserved2: u8,
    pub transfer_blocks: U16BE,
    pub control: u8,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct Cdb6ReadWrite {
    pub operation_code: u8, // 0x08, 0x0A - SCSIOP_READ, SCSIOP_WRITE
    pub logical_block: [u8; 3],
    pub transfer_blocks: u8,
    pub control: u8,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct Cdb12 {
    pub operation_code: ScsiOp,
    pub flags: CdbFlags,
    pub logical_block: U32BE,
    pub transfer_blocks: U32BE,
    pub reserved2: u8,
    pub control: u8,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct Cdb16 {
    pub operation_code: ScsiOp,
    pub flags: Cdb16Flags,
    pub logical_block: U64BE,
    pub transfer_blocks: U32BE,
    pub reserved2: u8,
    pub control: u8,
}

#[bitfield(u8)]
#[derive(IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct CdbFlags {
    pub relative_address: bool,
    #[bits(2)]
    pub reserved1: u8,
    pub fua: bool,
    pub disable_page_out: bool,
    #[bits(3)]
    pub protection: u8,
}

#[bitfield(u8)]
#[derive(IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct Cdb16Flags {
    #[bits(3)]
    pub reserved1: u8,
    pub fua: bool,
    pub disable_page_out: bool,
    #[bits(3)]
    pub protection: u8,
}

/// WRITE SAME(16) shares the 16 byte layout; byte 1 carries the UNMAP bit.
#[bitfield(u8)]
#[derive(IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct WriteSameFlags {
    pub ndob: bool,
    #[bits(2)]
    pub obsolete: u8,
    pub unmap: bool,
    pub anchor: bool,
    #[bits(3)]
    pub wrprotect: u8,
}

/// Bit position of UNMAP within byte 1 of WRITE SAME(16).
pub const WRITE_SAME_UNMAP_BIT: u8 = 3;

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct ServiceActionIn16 {
    pub operation_code: ScsiOp,
    pub service_action: u8,
    pub logical_block: [u8; 8],
    pub allocation_length: [u8; 4],
    pub flags: u8,
    pub control: u8,
}

pub const SERVICE_ACTION_READ_CAPACITY16: u8 = 0x10;

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct ReadCapacityDataEx {
    pub logical_block_address: U64BE,
    pub bytes_per_block: U32BE,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct ReadCapacity16Data {
    pub ex: ReadCapacityDataEx,
    /*
    UCHAR ProtectionEnable : 1;
    UCHAR ProtectionType : 3;
    UCHAR RcBasis  : 2;
    UCHAR Reserved : 2;
    */
    pub flags: u8,
    /*
    UCHAR LogicalPerPhysicalExponent : 4;
    UCHAR ProtectionInfoExponent : 4;
     */
    pub exponents: u8, // low: logical per physical, high: protection info
    /*
    UCHAR LowestAlignedBlock_MSB : 6;
    UCHAR LBPRZ : 1;
    UCHAR LBPME : 1;
    UCHAR LowestAlignedBlock_LSB;
    */
    pub lowest_aligned_block_msb: u8,
    pub lowest_aligned_block_lsb: u8,
    pub reserved: [u8; 16],
}

pub const READ_CAPACITY16_LBPRZ: u8 = 1 << 6;
pub const READ_CAPACITY16_LBPME: u8 = 1 << 7;
/// RC BASIS: the returned logical block address is that of the last
/// logical block of the logical unit.
pub const READ_CAPACITY16_RC_BASIS_CAPACITY: u8 = 1 << 4;

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct StartStop {
    pub operation_code: ScsiOp,
    /*
    UCHAR Immediate: 1;
    UCHAR Reserved1 : 4;
    UCHAR LogicalUnitNumber : 3;
     */
    pub immediate: u8,
    pub reserved2: u8,
    pub power_condition_modifier: u8,
    pub flag: StartStopFlags,
    pub control: u8,
}

#[bitfield(u8)]
#[derive(IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct StartStopFlags {
    #[bits(1)]
    pub start: bool,
    #[bits(1)]
    pub load_eject: bool,
    #[bits(1)]
    pub no_flush: bool,
    #[bits(1)]
    pub reserved: bool,
    #[bits(4)]
    pub power_condition: u8,
}

#[bitfield(u8)]
#[derive(IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct SendDiagnosticFlags {
    pub unit_offline: bool,
    pub device_offline: bool,
    pub self_test: bool,
    pub reserved1: bool,
    pub page_format: bool,
    #[bits(3)]
    pub self_test_code: u8,
}

#[repr(C)]
#[derive(Debug, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct SendDiagnostic {
    pub op_code: u8, // 0x1D - SCSIOP_SEND_DIAGNOSTIC
    pub flags: SendDiagnosticFlags,
    pub reserved2: u8,
    pub parameter_list_length: U16BE,
    pub control: u8,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct MaintenanceIn {
    pub operation_code: ScsiOp,
    /*
    UCHAR ServiceAction : 5;
    UCHAR Reserved : 3;
     */
    pub service_action: u8,
    /*
    UCHAR ReportingOptions : 3;
    UCHAR Reserved : 4;
    UCHAR RCTD : 1;
     */
    pub reporting_options: u8,
    pub requested_operation_code: ScsiOp,
    pub requested_service_action: U16BE,
    pub allocation_length: U32BE,
    pub reserved: u8,
    pub control: u8,
}

pub const MAINTENANCE_IN_REPORT_SUPPORTED_OPERATION_CODES: u8 = 0x0C;
/// Reporting option: one command, no service action.
pub const REPORT_OPCODES_ONE_COMMAND: u8 = 0x01;

/// One-command format support values.
pub const REPORT_OPCODES_SUPPORT_NOT_AVAILABLE: u8 = 0x00;
pub const REPORT_OPCODES_SUPPORT_STANDARD: u8 = 0x03;

#[repr(C)]
#[derive(Debug, Copy, Clone, IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct SecurityProtocolCdb {
    pub operation_code: ScsiOp,
    pub security_protocol: u8,
    pub security_protocol_specific: U16BE,
    pub flags: SecurityProtocolFlags,
    pub reserved: u8,
    pub transfer_length: U32BE,
    pub reserved2: u8,
    pub control: u8,
}

#[bitfield(u8)]
#[derive(IntoBytes, Immutable, KnownLayout, FromBytes)]
pub struct SecurityProtocolFlags {
    #[bits(7)]
    pub reserved: u8,
    /// Transfer length is in 512-byte increments.
    pub inc_512: bool,
}

/// The ATA device server password security protocol.
pub const SECURITY_PROTOCOL_ATA_PASSWORD: u8 = 0xEF;

/// Maximum byte-granular security transfer that fits in 16 bits of 512-byte
/// blocks.
pub const SECURITY_PROTOCOL_MAX_BYTES: u32 = 0x01fffe00;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_lengths() {
        assert_eq!(ScsiOp::READ6.group_cdb_len(), 6);
        assert_eq!(ScsiOp::READ.group_cdb_len(), 10);
        assert_eq!(ScsiOp::MODE_SENSE10.group_cdb_len(), 10);
        assert_eq!(ScsiOp::VARIABLE_LENGTH_CMD.group_cdb_len(), 12);
        assert_eq!(ScsiOp::READ16.group_cdb_len(), 16);
        assert_eq!(ScsiOp::ATA_PASSTHROUGH12.group_cdb_len(), 12);
    }

    #[test]
    fn wire_sizes() {
        assert_eq!(size_of::<SenseData>(), 18);
        assert_eq!(size_of::<DescriptorSenseDataHeader>(), 8);
        assert_eq!(size_of::<AtaStatusReturnDescriptor>(), 14);
        assert_eq!(size_of::<InformationSenseDescriptor>(), 12);
        assert_eq!(size_of::<SenseKeySpecificDescriptor>(), 8);
        assert_eq!(size_of::<ModeCachingPage>(), 20);
        assert_eq!(size_of::<ModeControlPage>(), 12);
        assert_eq!(size_of::<ModeReadWriteRecoveryPage>(), 12);
        assert_eq!(size_of::<ReadCapacity16Data>(), 32);
        assert_eq!(size_of::<MaintenanceIn>(), 12);
        assert_eq!(size_of::<SecurityProtocolCdb>(), 12);
    }
}
