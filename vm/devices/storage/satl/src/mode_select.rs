// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! MODE SELECT: the caching and control pages may be changed, one page per
//! command.

use crate::parse_cdb;
use crate::simulate::caching_page;
use crate::simulate::control_page;
use crate::taskfile::TaskfileRequest;
use crate::translate::Translation;
use crate::CommandContext;
use crate::ScsiError;
use ata_defs::AtaCommand;
use scsi::ScsiOp;
use scsi_defs as scsi;
use zerocopy::IntoBytes;

const BLOCK_DESCRIPTOR_LEN: usize = size_of::<scsi::ModeParameterBlockDescriptor>();

pub(crate) fn mode_select(
    ctx: &CommandContext<'_>,
    cdb: &[u8],
    data: &[u8],
) -> Result<Translation, ScsiError> {
    let six_byte = ScsiOp(cdb[0]) == ScsiOp::MODE_SELECT;
    let (flags, len) = if six_byte {
        let cdb: scsi::ModeSelect = parse_cdb(cdb)?;
        (cdb.flags, cdb.parameter_list_length as usize)
    } else {
        let cdb: scsi::ModeSelect10 = parse_cdb(cdb)?;
        (cdb.flags, cdb.parameter_list_length.get() as usize)
    };

    // Only PF=1, SP=0.
    if flags.spbit() {
        return Err(ScsiError::field_bit(1, 0));
    }
    if !flags.page_format() {
        return Err(ScsiError::field_bit(1, 4));
    }

    let Some(params) = data.get(..len) else {
        return Err(ScsiError::ParameterListLength);
    };

    // Skip the header and block descriptor.
    let (hdr_len, bd_len, bd_len_offset) = if six_byte {
        let Some(header) = params.get(..size_of::<scsi::ModeParameterHeader>()) else {
            return Err(ScsiError::ParameterListLength);
        };
        (header.len(), header[3] as usize, 3)
    } else {
        let Some(header) = params.get(..size_of::<scsi::ModeParameterHeader10>()) else {
            return Err(ScsiError::ParameterListLength);
        };
        (
            header.len(),
            u16::from_be_bytes([header[6], header[7]]) as usize,
            6,
        )
    };
    let Some(rest) = params[hdr_len..].get(bd_len..) else {
        return Err(ScsiError::ParameterListLength);
    };
    if bd_len != 0 && bd_len != BLOCK_DESCRIPTOR_LEN {
        return Err(ScsiError::InvalidParameter {
            byte: bd_len_offset,
        });
    }
    if rest.is_empty() {
        return Ok(Translation::Done);
    }

    let page_offset = hdr_len + bd_len;
    let page_code = rest[0] & 0x3f;
    let subpage_format = rest[0] & scsi::MODE_PAGE_SUBPAGE_FORMAT != 0;
    let (sub_page_code, page_len, page_hdr_len) = if subpage_format {
        let &[_, sub_page_code, msb, lsb, ..] = rest else {
            return Err(ScsiError::ParameterListLength);
        };
        (sub_page_code, u16::from_be_bytes([msb, lsb]) as usize, 4)
    } else {
        let &[_, page_len, ..] = rest else {
            return Err(ScsiError::ParameterListLength);
        };
        (scsi::MODE_SUBPAGE_NONE, page_len as usize, 2)
    };
    if sub_page_code != scsi::MODE_SUBPAGE_NONE && sub_page_code != scsi::MODE_SUBPAGE_ALL {
        return Err(ScsiError::InvalidParameter {
            byte: (page_offset + 1) as u16,
        });
    }

    let Some(body) = rest[page_hdr_len..].get(..page_len) else {
        return Err(ScsiError::ParameterListLength);
    };
    let body_offset = page_offset + page_hdr_len;

    let translation = match page_code {
        scsi::MODE_PAGE_CACHING => {
            let current = caching_page(ctx.dev, false);
            check_page(
                body,
                &current.as_bytes()[2..],
                scsi::MODE_CACHING_WRITE_CACHE_ENABLE,
                body_offset,
            )?;
            let enable = body[0] & scsi::MODE_CACHING_WRITE_CACHE_ENABLE != 0;
            tracing::debug!(enable, "mode select write cache");
            let mut tf = TaskfileRequest::non_data(ctx.dev, AtaCommand::SET_FEATURES);
            tf.flags.set_isaddr(true);
            tf.regs.feature = if enable {
                ata_defs::SETFEATURES_WC_ON
            } else {
                ata_defs::SETFEATURES_WC_OFF
            };
            Translation::ata(tf)
        }
        scsi::MODE_PAGE_CONTROL => {
            let current = control_page(ctx.state.descriptor_sense, false);
            check_page(
                body,
                &current.as_bytes()[2..],
                scsi::MODE_CONTROL_D_SENSE,
                body_offset,
            )?;
            Translation::SetDescriptorSense(body[0] & scsi::MODE_CONTROL_D_SENSE != 0)
        }
        _ => {
            return Err(ScsiError::InvalidParameter {
                byte: page_offset as u16,
            });
        }
    };

    // Only one page may be set per command.
    if rest.len() > page_hdr_len + page_len {
        return Err(ScsiError::InvalidParameter {
            byte: (body_offset + page_len) as u16,
        });
    }
    Ok(translation)
}

/// Checks that only the `changeable` bits of the first body byte differ from
/// `current`.
///
/// Errors point into the parameter list, where the body starts at
/// `body_offset`. A body of the wrong size points just past the shorter of
/// the two.
fn check_page(
    body: &[u8],
    current: &[u8],
    changeable: u8,
    body_offset: usize,
) -> Result<(), ScsiError> {
    if body.len() != current.len() {
        return Err(ScsiError::InvalidParameter {
            byte: (body_offset + body.len().min(current.len())) as u16,
        });
    }
    let mismatch = body.iter().zip(current).enumerate().find(|&(i, (&new, &cur))| {
        let mask = if i == 0 { !changeable } else { 0xff };
        new & mask != cur & mask
    });
    if let Some((i, _)) = mismatch {
        return Err(ScsiError::InvalidParameter {
            byte: (body_offset + i) as u16,
        });
    }
    Ok(())
}
