// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Commands answered without touching the device.

mod capacity;
mod inquiry;
mod maint_in;
mod mode;

pub(crate) use mode::caching_page;
pub(crate) use mode::control_page;

use crate::parse_cdb;
use crate::sense::CheckCondition;
use crate::sense::SenseFormat;
use crate::CommandContext;
use crate::ScsiError;
use scsi::AdditionalSenseCode;
use scsi::ScsiOp;
use scsi::SenseKey;
use scsi_defs as scsi;
use zerocopy::Immutable;
use zerocopy::IntoBytes;

/// Size of the scratch buffer simulated responses are built in. Large enough
/// for the ATA information VPD page.
pub(crate) const RESPONSE_BUFFER_LEN: usize = 576;

/// A simulated command's response data, built front to back.
pub(crate) struct ResponseBuffer {
    data: [u8; RESPONSE_BUFFER_LEN],
    len: usize,
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self {
            data: [0; RESPONSE_BUFFER_LEN],
            len: 0,
        }
    }

    /// Appends `value`, truncated to the buffer's capacity.
    pub fn write<T: ?Sized + IntoBytes + Immutable>(&mut self, value: &T) {
        let bytes = value.as_bytes();
        let n = bytes.len().min(RESPONSE_BUFFER_LEN - self.len);
        self.data[self.len..self.len + n].copy_from_slice(&bytes[..n]);
        self.len += n;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.data[..self.len]
    }
}

/// The commands simulated here.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Simulator {
    Inquiry,
    ModeSense,
    ReadCapacity,
    ServiceActionIn,
    ReportLuns,
    RequestSense,
    /// Completes with GOOD status and no data.
    NoOp,
    SendDiagnostic,
    MaintenanceIn,
    /// Anything not otherwise handled.
    Unsupported,
}

impl Simulator {
    pub fn for_op(op: ScsiOp) -> Self {
        match op {
            ScsiOp::INQUIRY => Self::Inquiry,
            ScsiOp::MODE_SENSE | ScsiOp::MODE_SENSE10 => Self::ModeSense,
            ScsiOp::READ_CAPACITY => Self::ReadCapacity,
            ScsiOp::SERVICE_ACTION_IN16 => Self::ServiceActionIn,
            ScsiOp::REPORT_LUNS => Self::ReportLuns,
            ScsiOp::REQUEST_SENSE => Self::RequestSense,
            ScsiOp::SYNCHRONIZE_CACHE
            | ScsiOp::REZERO_UNIT
            | ScsiOp::SEEK6
            | ScsiOp::SEEK
            | ScsiOp::TEST_UNIT_READY => Self::NoOp,
            ScsiOp::SEND_DIAGNOSTIC => Self::SendDiagnostic,
            ScsiOp::MAINTENANCE_IN => Self::MaintenanceIn,
            _ => Self::Unsupported,
        }
    }

    /// Builds the response to `cdb` in `buf`.
    pub fn run(
        self,
        ctx: &CommandContext<'_>,
        cdb: &[u8],
        buf: &mut ResponseBuffer,
    ) -> Result<(), ScsiError> {
        match self {
            Self::Inquiry => inquiry::inquiry(ctx, cdb, buf),
            Self::ModeSense => mode::mode_sense(ctx, cdb, buf),
            Self::ReadCapacity => capacity::read_capacity(ctx.dev, buf),
            Self::ServiceActionIn => {
                let cdb: scsi::ServiceActionIn16 = parse_cdb(cdb)?;
                if cdb.service_action & 0x1f == scsi::SERVICE_ACTION_READ_CAPACITY16 {
                    capacity::read_capacity16(ctx.dev, buf)
                } else {
                    Err(ScsiError::field(1))
                }
            }
            Self::ReportLuns => capacity::report_luns(buf),
            Self::RequestSense => request_sense(ctx, cdb, buf),
            Self::NoOp => Ok(()),
            Self::SendDiagnostic => send_diagnostic(cdb),
            Self::MaintenanceIn => maint_in::maintenance_in(ctx.dev, cdb, buf),
            Self::Unsupported => Err(ScsiError::InvalidOpcode),
        }
    }
}

/// Returns NO SENSE; errors are never left pending.
fn request_sense(
    ctx: &CommandContext<'_>,
    cdb: &[u8],
    buf: &mut ResponseBuffer,
) -> Result<(), ScsiError> {
    let cdb: scsi::CdbRequestSense = parse_cdb(cdb)?;
    let descriptor = cdb.desc & 1 != 0 || ctx.state.descriptor_sense;
    let sense = CheckCondition::new(
        SenseFormat::new(descriptor),
        SenseKey::NO_SENSE,
        AdditionalSenseCode::NO_SENSE,
        0,
    )
    .render();
    buf.write(sense.as_bytes());
    Ok(())
}

/// Only the default self-test, with no parameter list, is accepted.
fn send_diagnostic(cdb: &[u8]) -> Result<(), ScsiError> {
    let &[_, flags, _, msb, lsb, ..] = cdb else {
        return Err(ScsiError::field(1));
    };
    let flags = u8::from(scsi::SendDiagnosticFlags::from(flags).with_reserved1(false));
    let self_test = u8::from(scsi::SendDiagnosticFlags::new().with_self_test(true));
    if flags != self_test || msb != 0 || lsb != 0 {
        return Err(ScsiError::field(1));
    }
    Ok(())
}
