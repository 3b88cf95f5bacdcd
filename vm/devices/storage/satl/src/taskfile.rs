// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Task files exchanged with the ATA command issuer.

use crate::device::DeviceSnapshot;
use ata_defs::AtaCommand;
use ata_defs::AtaProtocol;
use ata_defs::AtaRegisters;
use ata_defs::ErrorReg;
use ata_defs::Status;
use ata_defs::TaskfileFlags;
use ata_defs::ATAPI_CDB_LEN;
use ata_defs::DEVICE_DEV1;
use ata_defs::DEVICE_OBS;

/// An ATA command ready to issue.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TaskfileRequest {
    pub command: AtaCommand,
    pub protocol: AtaProtocol,
    pub flags: TaskfileFlags,
    pub regs: AtaRegisters,
    /// The AUXILIARY field of NCQ and 32-byte pass-through commands.
    pub auxiliary: u32,
    /// Bytes moved by the data phase.
    pub transfer_len: usize,
    /// Bytes per DRQ block for PIO transfers.
    pub sector_size: u32,
    /// The command packet of ATAPI commands, zero padded.
    pub packet: Option<[u8; ATAPI_CDB_LEN]>,
}

impl TaskfileRequest {
    /// A blank task file addressed to `dev`.
    pub(crate) fn new(dev: &DeviceSnapshot, command: AtaCommand) -> Self {
        let mut device = DEVICE_OBS;
        if dev.devno != 0 {
            device |= DEVICE_DEV1;
        }
        Self {
            command,
            protocol: AtaProtocol::UNKNOWN,
            flags: TaskfileFlags::new(),
            regs: AtaRegisters {
                device,
                ..Default::default()
            },
            auxiliary: 0,
            transfer_len: 0,
            sector_size: ata_defs::ATA_SECTOR_SIZE,
            packet: None,
        }
    }

    /// A non-data command with no address.
    pub(crate) fn non_data(dev: &DeviceSnapshot, command: AtaCommand) -> Self {
        let mut tf = Self::new(dev, command);
        tf.protocol = AtaProtocol::NODATA;
        tf.flags.set_device(true);
        tf
    }
}

/// The task file registers read back after a command completes.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct ResultTaskfile {
    pub status: Status,
    pub error: ErrorReg,
    /// Count, LBA and device registers. `feature` is unused.
    pub regs: AtaRegisters,
}

/// How a previously issued [`TaskfileRequest`] ended.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct AtaCompletion {
    /// The issuer saw a failure: a device error, a timeout, or a transport
    /// error.
    pub failed: bool,
    pub result: ResultTaskfile,
}

impl AtaCompletion {
    /// A clean completion with DRDY set.
    pub fn success() -> Self {
        Self {
            failed: false,
            result: ResultTaskfile {
                status: Status::new().with_drdy(true),
                ..Default::default()
            },
        }
    }

    /// A device-reported error with the given registers.
    pub fn device_error(status: Status, error: ErrorReg) -> Self {
        Self {
            failed: true,
            result: ResultTaskfile {
                status,
                error,
                ..Default::default()
            },
        }
    }

    /// Whether the command needs error sense.
    pub(crate) fn is_error(&self) -> bool {
        self.failed || self.result.status.indicates_error()
    }
}
