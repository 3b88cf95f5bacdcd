// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Maps ATA status and error registers to SCSI sense.

use ata_defs::ErrorReg;
use ata_defs::Status;
use scsi::AdditionalSenseCode as Asc;
use scsi::SenseKey;
use scsi_defs as scsi;

/// A sense key with its additional sense code and qualifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct SenseTriple {
    pub key: SenseKey,
    pub asc: Asc,
    pub ascq: u8,
}

const fn triple(key: SenseKey, asc: Asc, ascq: u8) -> SenseTriple {
    SenseTriple { key, asc, ascq }
}

struct MapEntry {
    mask: u8,
    sense: SenseTriple,
}

const fn entry(mask: u8, key: SenseKey, asc: Asc, ascq: u8) -> MapEntry {
    MapEntry {
        mask,
        sense: triple(key, asc, ascq),
    }
}

/// Error register patterns, checked in order. An entry matches when all of
/// its mask bits are set.
const ERROR_TABLE: &[MapEntry] = &[
    // Device busy and errored at once.
    entry(0xd1, SenseKey::ABORTED_COMMAND, Asc::NO_SENSE, 0),
    entry(0xd0, SenseKey::ABORTED_COMMAND, Asc::NO_SENSE, 0),
    // Device fault with a hardware error.
    entry(0x61, SenseKey::HARDWARE_ERROR, Asc::NO_SENSE, 0),
    // Interface CRC error with abort.
    entry(0x84, SenseKey::ABORTED_COMMAND, Asc::SCSI_PARITY_ERROR, 0),
    // Media change request and media change.
    entry(0x37, SenseKey::NOT_READY, Asc::LUN_NOT_READY, 0),
    entry(0x09, SenseKey::NOT_READY, Asc::LUN_NOT_READY, 0),
    // Address mark not found.
    entry(0x01, SenseKey::MEDIUM_ERROR, Asc::ADDRESS_MARK_NOT_FOUND, 0),
    // Track 0 not found.
    entry(0x02, SenseKey::HARDWARE_ERROR, Asc::NO_SENSE, 0),
    // Media change request.
    entry(0x08, SenseKey::NOT_READY, Asc::LUN_NOT_READY, 0),
    // ID not found.
    entry(0x10, SenseKey::ILLEGAL_REQUEST, Asc::ILLEGAL_BLOCK, 0),
    // Media changed.
    entry(0x20, SenseKey::UNIT_ATTENTION, Asc::MEDIUM_CHANGED, 0),
    // Uncorrectable data error.
    entry(
        0x40,
        SenseKey::MEDIUM_ERROR,
        Asc::UNRECOVERED_ERROR,
        scsi::SCSI_SENSEQ_AUTO_REALLOCATION_FAILED,
    ),
    // Bad block mark.
    entry(
        0x80,
        SenseKey::MEDIUM_ERROR,
        Asc::UNRECOVERED_ERROR,
        scsi::SCSI_SENSEQ_AUTO_REALLOCATION_FAILED,
    ),
];

/// Status register bits, used when no error pattern matched. Any set mask
/// bit matches.
const STATUS_TABLE: &[MapEntry] = &[
    // Busy: the device never finished.
    entry(0x80, SenseKey::ABORTED_COMMAND, Asc::SCSI_PARITY_ERROR, 0),
    // Device ready: the command itself was rejected.
    entry(
        0x40,
        SenseKey::ILLEGAL_REQUEST,
        Asc::ILLEGAL_BLOCK,
        scsi::SCSI_SENSEQ_UNALIGNED_WRITE,
    ),
    // Device fault.
    entry(0x20, SenseKey::HARDWARE_ERROR, Asc::INTERNAL_TARGET_FAILURE, 0),
    // Timed out with DRQ still set.
    entry(0x08, SenseKey::ABORTED_COMMAND, Asc::SCSI_PARITY_ERROR, 0),
    // Corrected data.
    entry(0x04, SenseKey::RECOVERED_ERROR, Asc::UNRECOVERED_ERROR, 0),
];

const DEFAULT_SENSE: SenseTriple = triple(SenseKey::ABORTED_COMMAND, Asc::NO_SENSE, 0);

/// Picks the sense for a failed command from its ATA registers.
pub(crate) fn map_ata_error(status: Status, error: ErrorReg) -> SenseTriple {
    let status = u8::from(status);
    // With BSY set the error register is not valid.
    let error = if status & 0x80 != 0 {
        0
    } else {
        u8::from(error)
    };

    if error != 0 {
        if let Some(e) = ERROR_TABLE.iter().find(|e| error & e.mask == e.mask) {
            return e.sense;
        }
    }

    STATUS_TABLE
        .iter()
        .find(|e| status & e.mask != 0)
        .map_or(DEFAULT_SENSE, |e| e.sense)
}
