// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! SCSI to ATA translation.
//!
//! [`AtaScsiDevice`] accepts SCSI commands addressed to an ATA, ZAC or ATAPI
//! device. Each command is either answered locally from the device's
//! IDENTIFY data, rejected with sense data, or turned into an ATA task file
//! for the caller to issue. Completed task files are handed back to
//! [`AtaScsiDevice::complete`] to produce the final SCSI status.

#![forbid(unsafe_code)]

mod address;
mod config;
mod device;
mod dispatch;
mod error_map;
mod mode_select;
mod sense;
mod simulate;
mod taskfile;
mod translate;

#[cfg(test)]
mod tests;

pub use config::SatlParameters;
pub use device::DeviceCaps;
pub use device::DeviceClass;
pub use device::DeviceQuirks;
pub use device::DeviceSnapshot;
pub use device::ZonedInfo;
pub use dispatch::AtaScsiDevice;
pub use dispatch::DataDirection;
pub use dispatch::Disposition;
pub use dispatch::IoPriority;
pub use dispatch::PendingCommand;
pub use dispatch::Request;
pub use dispatch::ScsiResult;
pub use sense::SenseBuffer;
pub use sense::SenseFormat;
pub use taskfile::AtaCompletion;
pub use taskfile::ResultTaskfile;
pub use taskfile::TaskfileRequest;

use config::Policy;
use device::DeviceState;
use scsi::AdditionalSenseCode;
use scsi::SenseKey;
use scsi_defs as scsi;
use sense::CheckCondition;
use sense::FieldPointer;
use thiserror::Error;
use zerocopy::FromBytes;

/// What a command handler sees of the device.
pub(crate) struct CommandContext<'a> {
    pub dev: &'a DeviceSnapshot,
    pub state: DeviceState,
    pub policy: &'a Policy,
}

/// Why a command was rejected before reaching the device.
#[derive(Debug, Error, Copy, Clone, PartialEq, Eq)]
pub(crate) enum ScsiError {
    #[error("invalid field in cdb, byte {byte}")]
    InvalidField { byte: u16, bit: Option<u8> },
    #[error("invalid field in parameter list, byte {byte}")]
    InvalidParameter { byte: u16 },
    #[error("logical block address out of range")]
    OutOfRange,
    #[error("parameter list length error")]
    ParameterListLength,
    #[error("invalid command operation code")]
    InvalidOpcode,
    #[error("saving parameters not supported")]
    SavingNotSupported,
    #[error("device is not ready")]
    NotReady,
}

impl ScsiError {
    /// An invalid field error with no bit pointer.
    pub(crate) fn field(byte: u16) -> Self {
        Self::InvalidField { byte, bit: None }
    }

    pub(crate) fn field_bit(byte: u16, bit: u8) -> Self {
        Self::InvalidField {
            byte,
            bit: Some(bit),
        }
    }

    /// The CHECK CONDITION sense this error reports.
    pub(crate) fn check_condition(&self, format: SenseFormat) -> CheckCondition {
        let illegal = |asc| CheckCondition::new(format, SenseKey::ILLEGAL_REQUEST, asc, 0);
        match *self {
            ScsiError::InvalidField { byte, bit } => illegal(AdditionalSenseCode::INVALID_CDB)
                .with_field_pointer(FieldPointer {
                    command_data: true,
                    byte,
                    bit,
                }),
            ScsiError::InvalidParameter { byte } => {
                illegal(AdditionalSenseCode::INVALID_FIELD_PARAMETER_LIST).with_field_pointer(
                    FieldPointer {
                        command_data: false,
                        byte,
                        bit: None,
                    },
                )
            }
            ScsiError::OutOfRange => illegal(AdditionalSenseCode::ILLEGAL_BLOCK),
            ScsiError::ParameterListLength => illegal(AdditionalSenseCode::PARAMETER_LIST_LENGTH),
            ScsiError::InvalidOpcode => illegal(AdditionalSenseCode::ILLEGAL_COMMAND),
            ScsiError::SavingNotSupported => {
                illegal(AdditionalSenseCode::SAVING_PARAMETER_NOT_SUPPORTED)
            }
            ScsiError::NotReady => CheckCondition::new(
                format,
                SenseKey::NOT_READY,
                AdditionalSenseCode::LUN_NOT_READY,
                scsi::SCSI_SENSEQ_HARD_RESET_REQUIRED,
            ),
        }
    }
}

/// Reads a fixed-layout CDB from the front of `cdb`.
///
/// A CDB shorter than the layout is an invalid field at its last byte.
pub(crate) fn parse_cdb<T: FromBytes>(cdb: &[u8]) -> Result<T, ScsiError> {
    T::read_from_prefix(cdb)
        .map(|(parsed, _)| parsed)
        .map_err(|_| ScsiError::field(size_of::<T>() as u16 - 1))
}
