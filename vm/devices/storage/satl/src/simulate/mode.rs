// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! MODE SENSE and the mode pages it reports.

use super::ResponseBuffer;
use crate::device::DeviceSnapshot;
use crate::parse_cdb;
use crate::CommandContext;
use crate::ScsiError;
use scsi::ScsiOp;
use scsi_defs as scsi;
use zerocopy::FromZeros;
#[cfg(test)]
use zerocopy::IntoBytes;

/// Block descriptor with zero blocks of 512 bytes.
const BLOCK_DESCRIPTOR: scsi::ModeParameterBlockDescriptor = scsi::ModeParameterBlockDescriptor {
    density_code: 0,
    number_of_blocks: [0; 3],
    reserved: 0,
    block_length: [0, 2, 0],
};

const PAGE_HEADER_LEN: u8 = 2;

fn page_length<T>() -> u8 {
    (size_of::<T>() as u8) - PAGE_HEADER_LEN
}

pub(crate) fn rw_recovery_page(changeable: bool) -> scsi::ModeReadWriteRecoveryPage {
    scsi::ModeReadWriteRecoveryPage {
        page_code: scsi::MODE_PAGE_ERROR_RECOVERY,
        page_length: page_length::<scsi::ModeReadWriteRecoveryPage>(),
        bit_info: if changeable {
            0
        } else {
            scsi::MODE_RW_RECOVERY_AWRE
        },
        ..FromZeros::new_zeroed()
    }
}

/// The caching page. Only WCE is changeable.
pub(crate) fn caching_page(dev: &DeviceSnapshot, changeable: bool) -> scsi::ModeCachingPage {
    let mut page = scsi::ModeCachingPage {
        page_code: scsi::MODE_PAGE_CACHING,
        page_length: page_length::<scsi::ModeCachingPage>(),
        ..FromZeros::new_zeroed()
    };
    if changeable {
        page.flags |= scsi::MODE_CACHING_WRITE_CACHE_ENABLE;
    } else {
        if dev.caps.write_cache() {
            page.flags |= scsi::MODE_CACHING_WRITE_CACHE_ENABLE;
        }
        if !dev.caps.read_ahead() {
            page.flags2 |= scsi::MODE_CACHING_DISABLE_READ_AHEAD;
        }
    }
    page
}

/// The control page. Only D_SENSE is changeable.
pub(crate) fn control_page(descriptor_sense: bool, changeable: bool) -> scsi::ModeControlPage {
    let mut page = scsi::ModeControlPage {
        page_code: scsi::MODE_PAGE_CONTROL,
        page_length: page_length::<scsi::ModeControlPage>(),
        ..FromZeros::new_zeroed()
    };
    if changeable {
        page.flags |= scsi::MODE_CONTROL_D_SENSE;
    } else {
        // GLTSD: no implicit log saving.
        page.flags = 2;
        if descriptor_sense {
            page.flags |= scsi::MODE_CONTROL_D_SENSE;
        }
        page.busy_timeout_period = 0xffffu16.into();
        page.extended_self_test_completion_time = 30u16.into();
    }
    page
}

pub(super) fn mode_sense(
    ctx: &CommandContext<'_>,
    cdb: &[u8],
    buf: &mut ResponseBuffer,
) -> Result<(), ScsiError> {
    let six_byte = ScsiOp(cdb[0]) == ScsiOp::MODE_SENSE;
    let (flags1, flags2, sub_page_code) = if six_byte {
        let cdb: scsi::ModeSense = parse_cdb(cdb)?;
        (cdb.flags1, cdb.flags2, cdb.sub_page_code)
    } else {
        let cdb: scsi::ModeSense10 = parse_cdb(cdb)?;
        (cdb.flags1, cdb.flags2, cdb.sub_page_code)
    };

    let block_descriptor = !flags1.dbd();
    let page_control = flags2.pc() << 6;
    if page_control == scsi::MODE_CONTROL_SAVED_VALUES {
        return Err(ScsiError::SavingNotSupported);
    }
    let changeable = page_control == scsi::MODE_CONTROL_CHANGEABLE_VALUES;

    // Only the page 0 form of each page exists, but asking for all subpages
    // is fine.
    if sub_page_code != scsi::MODE_SUBPAGE_NONE && sub_page_code != scsi::MODE_SUBPAGE_ALL {
        return Err(ScsiError::field(3));
    }

    let dev = ctx.dev;
    let page_code = flags2.page_code();
    if !matches!(
        page_code,
        scsi::MODE_PAGE_ERROR_RECOVERY
            | scsi::MODE_PAGE_CACHING
            | scsi::MODE_PAGE_CONTROL
            | scsi::MODE_PAGE_ALL
    ) {
        tracing::debug!(page_code, "unsupported mode page");
        return Err(ScsiError::field(2));
    }

    let dsp = if dev.supports_fua(ctx.policy.fua) {
        scsi::MODE_DSP_FUA_SUPPORTED
    } else {
        0
    };
    let block_descriptor_length = if block_descriptor {
        size_of::<scsi::ModeParameterBlockDescriptor>()
    } else {
        0
    };

    // The header is patched with the data length once the pages are in.
    if six_byte {
        buf.write(&scsi::ModeParameterHeader {
            device_specific_parameter: dsp,
            block_descriptor_length: block_descriptor_length as u8,
            ..FromZeros::new_zeroed()
        });
    } else {
        buf.write(&scsi::ModeParameterHeader10 {
            device_specific_parameter: dsp,
            block_descriptor_length: (block_descriptor_length as u16).into(),
            ..FromZeros::new_zeroed()
        });
    }
    if block_descriptor {
        buf.write(&BLOCK_DESCRIPTOR);
    }

    let all = page_code == scsi::MODE_PAGE_ALL;
    if all || page_code == scsi::MODE_PAGE_ERROR_RECOVERY {
        buf.write(&rw_recovery_page(changeable));
    }
    if all || page_code == scsi::MODE_PAGE_CACHING {
        buf.write(&caching_page(dev, changeable));
    }
    if all || page_code == scsi::MODE_PAGE_CONTROL {
        buf.write(&control_page(ctx.state.descriptor_sense, changeable));
    }

    // The mode data length excludes itself.
    let len = buf.len();
    let bytes = buf.as_mut_bytes();
    if six_byte {
        bytes[0] = (len - 1) as u8;
    } else {
        bytes[..2].copy_from_slice(&((len - 2) as u16).to_be_bytes());
    }
    Ok(())
}
