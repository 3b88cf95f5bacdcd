// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! INQUIRY: standard data and the VPD pages.

use super::ResponseBuffer;
use crate::device::DeviceClass;
use crate::device::DeviceSnapshot;
use crate::parse_cdb;
use crate::CommandContext;
use crate::ScsiError;
use ata_defs::id_string;
use scsi_defs as scsi;
use zerocopy::FromZeros;
use zerocopy::IntoBytes;

const ATA_VENDOR_ID: [u8; 8] = *b"ATA     ";

// Identification of this translation layer, reported in the ATA information
// VPD page.
const SAT_VENDOR_ID: [u8; 8] = *b"Msft    ";
const SAT_PRODUCT_ID: [u8; 16] = *b"SATL            ";
const SAT_REVISION: [u8; 4] = *b"1.0 ";

/// SAM-3, SBC-2, SPC-3.
const VERSION_DESCRIPTORS: [u16; 3] = [0x0060, 0x0320, 0x0300];
/// SAM-5, SBC-4, SPC-5, ZBC.
const VERSION_DESCRIPTORS_ZBC: [u16; 4] = [0x00a0, 0x0600, 0x05c0, 0x6024];

/// Supported VPD pages; the zoned page is last and only listed for ZAC
/// devices.
const SUPPORTED_VPD_PAGES: [u8; 8] = [
    scsi::VPD_SUPPORTED_PAGES,
    scsi::VPD_SERIAL_NUMBER,
    scsi::VPD_DEVICE_IDENTIFIERS,
    scsi::VPD_ATA_INFORMATION,
    scsi::VPD_BLOCK_LIMITS,
    scsi::VPD_BLOCK_DEVICE_CHARACTERISTICS,
    scsi::VPD_LOGICAL_BLOCK_PROVISIONING,
    scsi::VPD_ZONED_BLOCK_DEVICE_CHARACTERISTICS,
];

const MAX_TRIM_RANGES: u64 = 64;

pub(super) fn inquiry(
    ctx: &CommandContext<'_>,
    cdb: &[u8],
    buf: &mut ResponseBuffer,
) -> Result<(), ScsiError> {
    let cdb: scsi::CdbInquiry = parse_cdb(cdb)?;
    let dev = ctx.dev;

    // CmdDt is obsolete.
    if cdb.flags.csd() {
        return Err(ScsiError::field(1));
    }
    if !cdb.flags.vpd() {
        standard_inquiry(dev, buf);
        return Ok(());
    }

    match cdb.page_code {
        scsi::VPD_SUPPORTED_PAGES => {
            let count = if dev.caps.zac() {
                SUPPORTED_VPD_PAGES.len()
            } else {
                SUPPORTED_VPD_PAGES.len() - 1
            };
            write_vpd_page(buf, cdb.page_code, |buf| {
                buf.write(&SUPPORTED_VPD_PAGES[..count])
            });
        }
        scsi::VPD_SERIAL_NUMBER => {
            write_vpd_page(buf, cdb.page_code, |buf| buf.write(&serial(dev)));
        }
        scsi::VPD_DEVICE_IDENTIFIERS => vpd_device_identifiers(dev, buf),
        scsi::VPD_ATA_INFORMATION => vpd_ata_information(dev, buf),
        scsi::VPD_BLOCK_LIMITS => vpd_block_limits(dev, buf),
        scsi::VPD_BLOCK_DEVICE_CHARACTERISTICS => {
            let page = scsi::VpdBlockDeviceCharacteristicsPage {
                medium_rotation_rate: dev.rotation_rate.into(),
                form_factor: dev.form_factor,
                zoned: (dev.zoned_cap & 3) << 4,
                ..FromZeros::new_zeroed()
            };
            write_vpd_page(buf, cdb.page_code, |buf| buf.write(&page));
        }
        scsi::VPD_LOGICAL_BLOCK_PROVISIONING => {
            let page = scsi::VpdLogicalBlockProvisioningPage {
                flags: scsi::VPD_LBP_WRITE_SAME16,
                ..FromZeros::new_zeroed()
            };
            write_vpd_page(buf, cdb.page_code, |buf| buf.write(&page));
        }
        scsi::VPD_ZONED_BLOCK_DEVICE_CHARACTERISTICS if dev.caps.zac() => {
            let zoned = &dev.zoned;
            let page = scsi::VpdZonedBlockDeviceCharacteristicsPage {
                flags: zoned.urswrz.into(),
                optimal_open_sequential_write_preferred_zones: zoned.optimal_open.into(),
                optimal_non_sequentially_written_sequential_write_preferred_zones: zoned
                    .optimal_nonseq
                    .into(),
                max_open_sequential_write_required_zones: zoned.max_open.into(),
                ..FromZeros::new_zeroed()
            };
            write_vpd_page(buf, cdb.page_code, |buf| buf.write(&page));
        }
        page_code => {
            tracing::debug!(page_code, "unsupported vpd page");
            return Err(ScsiError::field(2));
        }
    }
    Ok(())
}

/// Writes a VPD page header, the page body written by `body`, and patches
/// the page length.
fn write_vpd_page(
    buf: &mut ResponseBuffer,
    page_code: u8,
    body: impl FnOnce(&mut ResponseBuffer),
) {
    let header = scsi::VpdPageHeader {
        device_type: 0,
        page_code,
        page_length: 0u16.into(),
    };
    buf.write(&header);
    body(buf);
    let page_length = (buf.len() - size_of::<scsi::VpdPageHeader>()) as u16;
    buf.as_mut_bytes()[2..4].copy_from_slice(&page_length.to_be_bytes());
}

fn serial(dev: &DeviceSnapshot) -> [u8; 20] {
    let mut serial = [0; 20];
    id_string(&dev.identify.serial_number, &mut serial);
    serial
}

fn model(dev: &DeviceSnapshot) -> [u8; 40] {
    let mut model = [0; 40];
    id_string(&dev.identify.model_number, &mut model);
    model
}

fn standard_inquiry(dev: &DeviceSnapshot, buf: &mut ResponseBuffer) {
    let zac = dev.class == DeviceClass::Zac;
    let mut data = scsi::InquiryData {
        header: scsi::InquiryDataHeader {
            device_type: if zac {
                scsi::ZONED_BLOCK_DEVICE
            } else {
                scsi::DIRECT_ACCESS_DEVICE
            },
            flags2: scsi::InquiryDataFlag2::new().with_removable_media(dev.caps.removable()),
            versions: if zac {
                scsi::T10_VERSION_SPC5
            } else {
                scsi::T10_VERSION_SPC3
            },
            flags3: scsi::InquiryDataFlag3::new()
                .with_response_data_format(scsi::T10_RESPONSE_DATA_SPC3),
            additional_length: (scsi::INQUIRY_DATA_LEN - size_of::<scsi::InquiryDataHeader>())
                as u8,
        },
        misc: scsi::INQUIRY_MISC_COMMAND_QUEUE,
        vendor_id: ATA_VENDOR_ID,
        ..FromZeros::new_zeroed()
    };

    let product_id_len = size_of_val(&data.product_id);
    data.product_id
        .copy_from_slice(&model(dev)[..product_id_len]);

    // The last four firmware characters, unless blank.
    let firmware = &dev.identify.firmware_revision;
    id_string(&firmware[4..], &mut data.product_revision_level);
    if &data.product_revision_level == b"    " {
        id_string(&firmware[..4], &mut data.product_revision_level);
    }
    if matches!(data.product_revision_level[0], 0 | b' ') {
        data.product_revision_level = *b"n/a ";
    }

    let versions: &[u16] = if dev.is_zoned() {
        &VERSION_DESCRIPTORS_ZBC
    } else {
        &VERSION_DESCRIPTORS
    };
    for (d, &v) in data.version_descriptors.iter_mut().zip(versions) {
        *d = v.into();
    }

    buf.write(&data);
}

fn vpd_device_identifiers(dev: &DeviceSnapshot, buf: &mut ResponseBuffer) {
    let serial = serial(dev);
    write_vpd_page(buf, scsi::VPD_DEVICE_IDENTIFIERS, |buf| {
        // Vendor specific: the serial number.
        buf.write(&scsi::VpdIdentificationDescriptor {
            code_set: scsi::VPD_CODE_SET_ASCII,
            identifiertype: scsi::VPD_IDENTIFIER_TYPE_VENDOR_SPECIFIC,
            reserved3: 0,
            identifier_length: serial.len() as u8,
        });
        buf.write(&serial);

        // T10 vendor ID: vendor, model, serial.
        let model = model(dev);
        buf.write(&scsi::VpdIdentificationDescriptor {
            code_set: scsi::VPD_CODE_SET_ASCII,
            identifiertype: scsi::VPD_IDENTIFIER_TYPE_VENDOR_ID,
            reserved3: 0,
            identifier_length: (ATA_VENDOR_ID.len() + model.len() + serial.len()) as u8,
        });
        buf.write(&ATA_VENDOR_ID);
        buf.write(&model);
        buf.write(&serial);

        if dev.caps.wwn() {
            // NAA, from the IDENTIFY world wide name.
            let mut wwn = [0; 8];
            id_string(&dev.identify.world_wide_name, &mut wwn);
            buf.write(&scsi::VpdIdentificationDescriptor {
                code_set: scsi::VPD_CODE_SET_BINARY,
                identifiertype: scsi::VPD_IDENTIFIER_TYPE_FCPH_NAME,
                reserved3: 0,
                identifier_length: wwn.len() as u8,
            });
            buf.write(&wwn);
        }
    });
}

fn vpd_ata_information(dev: &DeviceSnapshot, buf: &mut ResponseBuffer) {
    let mut page = scsi::VpdAtaInformationPage {
        sat_vendor_identification: SAT_VENDOR_ID,
        sat_product_identification: SAT_PRODUCT_ID,
        sat_product_revision_level: SAT_REVISION,
        command_code: ata_defs::AtaCommand::IDENTIFY_DEVICE.0,
        ..FromZeros::new_zeroed()
    };
    // The device signature is not kept, so report a plausible D2H register
    // FIS: status DRDY, count and LBA low of one.
    page.device_signature[0] = 0x34;
    page.device_signature[1] = 0x80;
    page.device_signature[2] = ata_defs::Status::new().with_drdy(true).into();
    page.device_signature[4] = 1;
    page.device_signature[12] = 1;
    page.identify_data.copy_from_slice(dev.identify.as_bytes());
    write_vpd_page(buf, scsi::VPD_ATA_INFORMATION, |buf| buf.write(&page));
}

fn vpd_block_limits(dev: &DeviceSnapshot, buf: &mut ResponseBuffer) {
    let mut page = scsi::VpdBlockLimitsDescriptor {
        optimal_transfer_length_granularity: (1u16 << dev.log2_per_physical).into(),
        ..FromZeros::new_zeroed()
    };
    if dev.trim_usable() {
        let max_blocks = if dev.quirks.max_trim_128m() {
            (128 << 20) / ata_defs::ATA_SECTOR_SIZE as u64
        } else {
            ata_defs::DSM_RANGE_MAX_SECTORS as u64 * MAX_TRIM_RANGES
        };
        page.max_write_same_length = max_blocks.into();
        page.optimal_unmap_granularity = 1u32.into();
    }
    write_vpd_page(buf, scsi::VPD_BLOCK_LIMITS, |buf| buf.write(&page));
}
