// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Command dispatch and completion.

use crate::config::Policy;
use crate::config::SatlParameters;
use crate::device::DeviceSnapshot;
use crate::device::DeviceState;
use crate::mode_select::mode_select;
use crate::sense::ata_sense;
use crate::sense::passthrough_sense;
use crate::sense::CheckCondition;
use crate::sense::SenseBuffer;
use crate::sense::SenseFormat;
use crate::simulate::ResponseBuffer;
use crate::simulate::Simulator;
use crate::taskfile::AtaCompletion;
use crate::taskfile::TaskfileRequest;
use crate::translate::atapi;
use crate::translate::cache;
use crate::translate::passthru;
use crate::translate::rw;
use crate::translate::security;
use crate::translate::verify;
use crate::translate::write_same;
use crate::translate::zbc;
use crate::translate::CompletionKind;
use crate::translate::Translation;
use crate::CommandContext;
use crate::ScsiError;
use parking_lot::Mutex;
use scsi::AdditionalSenseCode;
use scsi::ScsiOp;
use scsi::ScsiStatus;
use scsi::SenseKey;
use scsi_defs as scsi;
use std::sync::Arc;

/// Direction of a command's data phase.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DataDirection {
    None,
    /// Initiator to device.
    ToDevice,
    /// Device to initiator.
    FromDevice,
}

/// The I/O priority class of a request.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum IoPriority {
    #[default]
    Normal,
    /// Sent with the NCQ high priority bit when the device supports it.
    RealTime,
}

/// One SCSI command.
#[derive(Debug, Copy, Clone)]
pub struct Request<'a> {
    pub cdb: &'a [u8],
    pub direction: DataDirection,
    /// The NCQ tag to use if the command is queued.
    pub tag: u8,
    pub priority: IoPriority,
}

/// The final status of a SCSI command.
#[derive(Debug, Clone)]
pub struct ScsiResult {
    pub scsi_status: ScsiStatus,
    /// Bytes transferred.
    pub tx: usize,
    pub sense: Option<SenseBuffer>,
}

impl ScsiResult {
    fn good(tx: usize) -> Self {
        Self {
            scsi_status: ScsiStatus::GOOD,
            tx,
            sense: None,
        }
    }

    fn check_condition(sense: CheckCondition) -> Self {
        Self {
            scsi_status: ScsiStatus::CHECK_CONDITION,
            tx: 0,
            sense: Some(sense.render()),
        }
    }
}

/// A translated command waiting to be issued to the device.
#[derive(Debug, Clone)]
pub struct PendingCommand {
    taskfile: TaskfileRequest,
    kind: CompletionKind,
    dev: Arc<DeviceSnapshot>,
}

impl PendingCommand {
    /// The task file to issue.
    pub fn taskfile(&self) -> &TaskfileRequest {
        &self.taskfile
    }
}

/// What to do with a submitted command.
#[derive(Debug)]
pub enum Disposition {
    /// Issue the task file, then pass the result to
    /// [`AtaScsiDevice::complete`].
    Issue(PendingCommand),
    /// The command is finished.
    Complete(ScsiResult),
    /// The CDB length is not acceptable for the device. This is a transport
    /// error rather than a SCSI status.
    BadLength,
}

/// A SCSI view of one ATA, ZAC or ATAPI device.
#[derive(Debug)]
pub struct AtaScsiDevice {
    snapshot: Mutex<Arc<DeviceSnapshot>>,
    state: Mutex<DeviceState>,
    policy: Policy,
}

impl AtaScsiDevice {
    pub fn new(snapshot: DeviceSnapshot, params: SatlParameters) -> Self {
        Self {
            snapshot: Mutex::new(Arc::new(snapshot)),
            state: Mutex::new(DeviceState::default()),
            policy: Policy::new(params),
        }
    }

    /// Replaces the device snapshot after the device was re-identified.
    /// Commands already pending keep the snapshot they were translated with.
    pub fn set_snapshot(&self, snapshot: DeviceSnapshot) {
        *self.snapshot.lock() = Arc::new(snapshot);
    }

    /// Marks the device as failed or detached. Every command then fails with
    /// NOT READY.
    pub fn set_disabled(&self, disabled: bool) {
        self.state.lock().disabled = disabled;
    }

    /// Whether sense data is reported in descriptor format.
    pub fn descriptor_sense(&self) -> bool {
        self.state.lock().descriptor_sense
    }

    /// Starts a command. `data` is the command's data buffer, read for
    /// commands sent to the device and written for data returned from it.
    pub fn submit(&self, request: &Request<'_>, data: &mut [u8]) -> Disposition {
        let dev = self.snapshot.lock().clone();
        let state = *self.state.lock();
        let format = SenseFormat::new(state.descriptor_sense);
        if state.disabled {
            return Disposition::Complete(ScsiResult::check_condition(
                ScsiError::NotReady.check_condition(format),
            ));
        }
        let Some(&op) = request.cdb.first() else {
            return Disposition::BadLength;
        };
        let op = ScsiOp(op);
        let len = request.cdb.len();

        let ctx = CommandContext {
            dev: &dev,
            state,
            policy: &self.policy,
        };
        let action = if !dev.is_atapi() {
            if len > dev.cdb_len {
                tracing::debug!(?op, len, "bad cdb length");
                return Disposition::BadLength;
            }
            dispatch(&ctx, op, request, data)
        } else if op != ScsiOp::ATA_PASSTHROUGH16 || !self.policy.atapi_passthru16 {
            let group_len = op.group_cdb_len();
            if group_len > len || group_len > dev.cdb_len || len > ata_defs::ATAPI_CDB_LEN {
                tracing::debug!(?op, len, "bad atapi cdb length");
                return Disposition::BadLength;
            }
            Ok(Action::Translated(atapi::atapi(&ctx, request, data.len())))
        } else {
            // ATA PASS-THROUGH (16) to a packet device goes to the device as
            // an ATA command.
            if len > 16 {
                tracing::debug!(?op, len, "bad cdb length");
                return Disposition::BadLength;
            }
            dispatch(&ctx, op, request, data)
        };

        match action {
            Ok(Action::Simulated(tx)) => Disposition::Complete(ScsiResult::good(tx)),
            Ok(Action::Translated(Translation::Done)) => {
                Disposition::Complete(ScsiResult::good(0))
            }
            Ok(Action::Translated(Translation::SetDescriptorSense(descriptor_sense))) => {
                self.state.lock().descriptor_sense = descriptor_sense;
                tracing::debug!(descriptor_sense, "sense format changed");
                Disposition::Complete(ScsiResult::good(0))
            }
            Ok(Action::Translated(Translation::Issue(taskfile, kind))) => {
                Disposition::Issue(PendingCommand {
                    taskfile,
                    kind,
                    dev,
                })
            }
            Err(err) => {
                tracing::debug!(
                    ?op,
                    error = &err as &dyn std::error::Error,
                    "scsi_error"
                );
                Disposition::Complete(ScsiResult::check_condition(err.check_condition(format)))
            }
        }
    }

    /// Finishes a command issued with [`Disposition::Issue`]. `data` is the
    /// same buffer passed to [`Self::submit`].
    pub fn complete(
        &self,
        pending: &PendingCommand,
        completion: &AtaCompletion,
        data: &mut [u8],
    ) -> ScsiResult {
        let state = *self.state.lock();
        let tf = &pending.taskfile;
        let tx = if completion.failed {
            0
        } else {
            tf.transfer_len.min(data.len())
        };

        let sense = match pending.kind {
            CompletionKind::Passthrough { ck_cond } => {
                if ck_cond || completion.failed {
                    let sense = passthrough_sense(&state, tf.flags, completion);
                    Some(sense.render())
                } else {
                    None
                }
            }
            CompletionKind::Ata | CompletionKind::ReportZones => {
                if completion.failed {
                    Some(ata_sense(&pending.dev, &state, tf.flags, completion).render())
                } else {
                    if pending.kind == CompletionKind::ReportZones {
                        zbc::swizzle_report_zones(&mut data[..tx]);
                    }
                    None
                }
            }
            CompletionKind::Atapi { fixup_inquiry } => {
                if completion.failed {
                    let error = u8::from(completion.result.error);
                    let sense = CheckCondition::new(
                        SenseFormat::Fixed,
                        SenseKey(error >> 4),
                        AdditionalSenseCode::NO_SENSE,
                        0,
                    );
                    Some(sense.render())
                } else {
                    if fixup_inquiry && tx > 3 && data[2] == 0 {
                        data[2] = scsi::T10_VERSION_SPC3;
                        data[3] = scsi::T10_RESPONSE_DATA_ATAPI_FIXUP;
                    }
                    None
                }
            }
        };

        match sense {
            Some(sense) => {
                tracing::debug!(
                    command = ?tf.command,
                    status = u8::from(completion.result.status),
                    error = u8::from(completion.result.error),
                    ?sense,
                    "command completed with sense"
                );
                ScsiResult {
                    scsi_status: ScsiStatus::CHECK_CONDITION,
                    tx,
                    sense: Some(sense),
                }
            }
            None => ScsiResult::good(tx),
        }
    }
}

/// How a command was handled before reaching the device.
enum Action {
    Translated(Translation),
    /// Answered locally with this many bytes of response data.
    Simulated(usize),
}

/// Picks the translator for an ATA or ZAC device command, falling back to
/// simulation.
fn dispatch(
    ctx: &CommandContext<'_>,
    op: ScsiOp,
    request: &Request<'_>,
    data: &mut [u8],
) -> Result<Action, ScsiError> {
    let dev = ctx.dev;
    let data_len = data.len();
    let translation = match op {
        ScsiOp::READ6
        | ScsiOp::READ
        | ScsiOp::READ16
        | ScsiOp::WRITE6
        | ScsiOp::WRITE
        | ScsiOp::WRITE16 => rw::read_write(ctx, request, data_len)?,
        ScsiOp::WRITE_SAME16 => write_same::write_same(ctx, request, data)?,
        // Without a cache to flush this is simulated.
        ScsiOp::SYNCHRONIZE_CACHE if dev.try_flush() => cache::flush(ctx),
        ScsiOp::VERIFY | ScsiOp::VERIFY16 => verify::verify(ctx, request.cdb)?,
        ScsiOp::ATA_PASSTHROUGH12 | ScsiOp::ATA_PASSTHROUGH16 => {
            passthru::passthrough(ctx, request, data_len)?
        }
        ScsiOp::VARIABLE_LENGTH_CMD => passthru::variable_length(ctx, request, data_len)?,
        ScsiOp::MODE_SELECT | ScsiOp::MODE_SELECT10 => mode_select(ctx, request.cdb, data)?,
        ScsiOp::ZBC_IN if dev.is_zoned() => zbc::zbc_in(ctx, request, data_len)?,
        ScsiOp::ZBC_OUT if dev.is_zoned() => zbc::zbc_out(ctx, request)?,
        ScsiOp::SECURITY_PROTOCOL_IN | ScsiOp::SECURITY_PROTOCOL_OUT if dev.caps.trusted() => {
            security::security_protocol(ctx, request.cdb, data_len)?
        }
        ScsiOp::START_STOP_UNIT => cache::start_stop(ctx, request.cdb)?,
        _ => {
            let _span = tracing::trace_span!("simulate", ?op).entered();
            return simulate(ctx, op, request.cdb, data).map(Action::Simulated);
        }
    };
    Ok(Action::Translated(translation))
}

/// Runs a simulated command, copying its response to `data`. Returns the
/// number of bytes copied.
fn simulate(
    ctx: &CommandContext<'_>,
    op: ScsiOp,
    cdb: &[u8],
    data: &mut [u8],
) -> Result<usize, ScsiError> {
    let mut buf = ResponseBuffer::new();
    Simulator::for_op(op).run(ctx, cdb, &mut buf)?;
    let n = buf.len().min(data.len());
    data[..n].copy_from_slice(&buf.as_bytes()[..n]);
    Ok(n)
}
