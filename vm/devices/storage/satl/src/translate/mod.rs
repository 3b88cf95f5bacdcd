// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Commands translated into ATA task files.

pub(crate) mod atapi;
pub(crate) mod cache;
pub(crate) mod passthru;
pub(crate) mod rw;
pub(crate) mod security;
pub(crate) mod verify;
pub(crate) mod write_same;
pub(crate) mod zbc;

use crate::taskfile::TaskfileRequest;

/// How a translated command finishes once the device completes it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum CompletionKind {
    /// Device errors become ATA sense.
    Ata,
    /// ATA pass-through: the registers are returned in the sense data on
    /// error, or always with CK_COND.
    Passthrough { ck_cond: bool },
    /// REPORT ZONES data must be converted to big-endian on success.
    ReportZones,
    /// A relayed ATAPI packet.
    Atapi { fixup_inquiry: bool },
}

/// The result of translating one command.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Translation {
    Issue(TaskfileRequest, CompletionKind),
    /// Nothing to send; the command completes with GOOD status.
    Done,
    /// MODE SELECT of the control page. No command is sent.
    SetDescriptorSense(bool),
}

impl Translation {
    pub fn ata(tf: TaskfileRequest) -> Self {
        Self::Issue(tf, CompletionKind::Ata)
    }
}
