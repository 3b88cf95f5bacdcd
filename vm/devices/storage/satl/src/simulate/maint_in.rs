// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! MAINTENANCE IN: REPORT SUPPORTED OPERATION CODES, one command at a time.

use super::ResponseBuffer;
use crate::device::DeviceSnapshot;
use crate::parse_cdb;
use crate::ScsiError;
use scsi::ScsiOp;
use scsi_defs as scsi;

pub(super) fn maintenance_in(
    dev: &DeviceSnapshot,
    cdb: &[u8],
    buf: &mut ResponseBuffer,
) -> Result<(), ScsiError> {
    let cdb: scsi::MaintenanceIn = parse_cdb(cdb)?;
    if cdb.service_action & 0x1f != scsi::MAINTENANCE_IN_REPORT_SUPPORTED_OPERATION_CODES {
        return Err(ScsiError::field(1));
    }
    if cdb.reporting_options != scsi::REPORT_OPCODES_ONE_COMMAND {
        tracing::debug!(options = cdb.reporting_options, "unsupported reporting options");
        return Err(ScsiError::field(2));
    }

    let support = if is_supported(dev, cdb.requested_operation_code) {
        scsi::REPORT_OPCODES_SUPPORT_STANDARD
    } else {
        scsi::REPORT_OPCODES_SUPPORT_NOT_AVAILABLE
    };
    buf.write(&[0, support, 0, 0]);
    Ok(())
}

fn is_supported(dev: &DeviceSnapshot, op: ScsiOp) -> bool {
    match op {
        ScsiOp::INQUIRY
        | ScsiOp::READ_CAPACITY
        | ScsiOp::SERVICE_ACTION_IN16
        | ScsiOp::MODE_SELECT
        | ScsiOp::MODE_SELECT10
        | ScsiOp::MODE_SENSE
        | ScsiOp::MODE_SENSE10
        | ScsiOp::START_STOP_UNIT
        | ScsiOp::REQUEST_SENSE
        | ScsiOp::SYNCHRONIZE_CACHE
        | ScsiOp::REZERO_UNIT
        | ScsiOp::SEEK6
        | ScsiOp::SEEK
        | ScsiOp::TEST_UNIT_READY
        | ScsiOp::SEND_DIAGNOSTIC
        | ScsiOp::MAINTENANCE_IN
        | ScsiOp::READ6
        | ScsiOp::READ
        | ScsiOp::READ16
        | ScsiOp::WRITE6
        | ScsiOp::WRITE
        | ScsiOp::WRITE16
        | ScsiOp::VERIFY
        | ScsiOp::VERIFY16
        | ScsiOp::ATA_PASSTHROUGH12
        | ScsiOp::ATA_PASSTHROUGH16
        | ScsiOp::REPORT_LUNS => true,
        ScsiOp::ZBC_IN | ScsiOp::ZBC_OUT => dev.is_zoned(),
        ScsiOp::SECURITY_PROTOCOL_IN | ScsiOp::SECURITY_PROTOCOL_OUT => dev.caps.trusted(),
        _ => false,
    }
}
