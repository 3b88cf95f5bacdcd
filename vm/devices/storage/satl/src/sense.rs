// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Sense data construction, in fixed or descriptor format.

use crate::address::read_block;
use crate::device::DeviceSnapshot;
use crate::device::DeviceState;
use crate::error_map::map_ata_error;
use crate::error_map::SenseTriple;
use crate::taskfile::AtaCompletion;
use crate::taskfile::ResultTaskfile;
use crate::ScsiError;
use ata_defs::TaskfileFlags;
use scsi::AdditionalSenseCode;
use scsi::SenseDataErrorCode;
use scsi::SenseKey;
use scsi_defs as scsi;
use zerocopy::IntoBytes;

/// Largest sense buffer produced.
pub const SENSE_BUFFER_LEN: usize = 96;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SenseFormat {
    Fixed,
    Descriptor,
}

impl SenseFormat {
    pub(crate) fn new(descriptor: bool) -> Self {
        if descriptor {
            Self::Descriptor
        } else {
            Self::Fixed
        }
    }
}

/// Rendered sense data.
#[derive(Clone)]
pub struct SenseBuffer {
    data: [u8; SENSE_BUFFER_LEN],
    len: usize,
}

impl SenseBuffer {
    fn new() -> Self {
        Self {
            data: [0; SENSE_BUFFER_LEN],
            len: 0,
        }
    }

    fn push(&mut self, bytes: &[u8]) {
        self.data[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn format(&self) -> SenseFormat {
        SenseFormat::new(self.data[0] & 0x7f >= SenseDataErrorCode::DESCRIPTOR_CURRENT.0)
    }

    pub fn sense_key(&self) -> SenseKey {
        match self.format() {
            SenseFormat::Fixed => SenseKey(self.data[2] & 0xf),
            SenseFormat::Descriptor => SenseKey(self.data[1] & 0xf),
        }
    }

    pub fn additional_sense_code(&self) -> AdditionalSenseCode {
        match self.format() {
            SenseFormat::Fixed => AdditionalSenseCode(self.data[12]),
            SenseFormat::Descriptor => AdditionalSenseCode(self.data[2]),
        }
    }

    pub fn additional_sense_code_qualifier(&self) -> u8 {
        match self.format() {
            SenseFormat::Fixed => self.data[13],
            SenseFormat::Descriptor => self.data[3],
        }
    }

    /// Finds a descriptor of the given type in descriptor format sense.
    pub fn descriptor(&self, descriptor_type: scsi::SenseDescriptorType) -> Option<&[u8]> {
        if self.format() != SenseFormat::Descriptor {
            return None;
        }
        let mut rest = self.as_bytes().get(8..)?;
        while rest.len() >= 2 {
            let len = 2 + rest[1] as usize;
            let desc = rest.get(..len)?;
            if desc[0] == descriptor_type.0 {
                return Some(desc);
            }
            rest = &rest[len..];
        }
        None
    }
}

impl std::fmt::Debug for SenseBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SenseBuffer")
            .field("key", &self.sense_key())
            .field("asc", &self.additional_sense_code())
            .field("ascq", &self.additional_sense_code_qualifier())
            .field("data", &self.as_bytes())
            .finish()
    }
}

/// Locates the offending CDB or parameter list byte.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct FieldPointer {
    /// The byte is in the CDB; in the parameter list otherwise.
    pub command_data: bool,
    pub byte: u16,
    pub bit: Option<u8>,
}

impl FieldPointer {
    fn flags(&self) -> scsi::FieldPointerFlags {
        scsi::FieldPointerFlags::new()
            .with_sense_key_specific_valid(true)
            .with_command_data(self.command_data)
            .with_bit_pointer_valid(self.bit.is_some())
            .with_bit_pointer(self.bit.unwrap_or(0) & 7)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct CheckCondition {
    pub format: SenseFormat,
    pub key: SenseKey,
    pub asc: AdditionalSenseCode,
    pub ascq: u8,
    /// The INFORMATION field, usually the failing LBA.
    pub information: Option<u64>,
    pub field_pointer: Option<FieldPointer>,
}

impl CheckCondition {
    pub fn new(format: SenseFormat, key: SenseKey, asc: AdditionalSenseCode, ascq: u8) -> Self {
        Self {
            format,
            key,
            asc,
            ascq,
            information: None,
            field_pointer: None,
        }
    }

    fn from_triple(format: SenseFormat, sense: SenseTriple) -> Self {
        Self::new(format, sense.key, sense.asc, sense.ascq)
    }

    pub fn with_field_pointer(self, field_pointer: FieldPointer) -> Self {
        Self {
            field_pointer: Some(field_pointer),
            ..self
        }
    }

    pub fn with_information(self, information: u64) -> Self {
        Self {
            information: Some(information),
            ..self
        }
    }

    fn fixed(&self) -> scsi::SenseData {
        let mut sense = scsi::SenseData::new(self.key, self.asc, self.ascq);
        if let Some(information) = self.information {
            // VALID only when the value fits the 4-byte field.
            if let Ok(information) = u32::try_from(information) {
                set_valid(&mut sense);
                sense.header.information = information.to_be_bytes();
            }
        }
        if let Some(fp) = self.field_pointer {
            let [msb, lsb] = fp.byte.to_be_bytes();
            sense.sense_key_specific = [fp.flags().into(), msb, lsb];
        }
        sense
    }

    pub fn render(&self) -> SenseBuffer {
        let mut buf = SenseBuffer::new();
        match self.format {
            SenseFormat::Fixed => buf.push(self.fixed().as_bytes()),
            SenseFormat::Descriptor => {
                let header = scsi::DescriptorSenseDataHeader::new(self.key, self.asc, self.ascq);
                buf.push(header.as_bytes());
                if let Some(information) = self.information {
                    let desc = scsi::InformationSenseDescriptor {
                        descriptor_type: scsi::SenseDescriptorType::INFORMATION.0,
                        additional_length: 0x0a,
                        valid: scsi::SENSE_DATA_VALID,
                        reserved: 0,
                        information: information.into(),
                    };
                    buf.push(desc.as_bytes());
                }
                if let Some(fp) = self.field_pointer {
                    let desc = scsi::SenseKeySpecificDescriptor {
                        descriptor_type: scsi::SenseDescriptorType::SENSE_KEY_SPECIFIC.0,
                        additional_length: 6,
                        reserved: [0; 2],
                        flags: fp.flags(),
                        field_pointer: fp.byte.into(),
                        reserved2: 0,
                    };
                    buf.push(desc.as_bytes());
                }
                buf.data[7] = (buf.len - size_of::<scsi::DescriptorSenseDataHeader>()) as u8;
            }
        }
        buf
    }
}

/// Sense for an ATA pass-through command, carrying the result registers.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct PassthroughSense {
    pub sense: CheckCondition,
    pub registers: ResultTaskfile,
    /// The command used 48-bit registers.
    pub extend: bool,
}

impl PassthroughSense {
    pub fn render(&self) -> SenseBuffer {
        let regs = &self.registers.regs;
        match self.sense.format {
            SenseFormat::Descriptor => {
                let mut buf = self.sense.render();
                let mut desc = scsi::AtaStatusReturnDescriptor {
                    descriptor_type: scsi::SenseDescriptorType::ATA_STATUS_RETURN.0,
                    additional_length: 12,
                    extend: 0,
                    error: self.registers.error.into(),
                    count_ext: 0,
                    count: regs.nsect,
                    lba_low_ext: 0,
                    lba_low: regs.lbal,
                    lba_mid_ext: 0,
                    lba_mid: regs.lbam,
                    lba_high_ext: 0,
                    lba_high: regs.lbah,
                    device: regs.device,
                    status: self.registers.status.into(),
                };
                if self.extend {
                    desc.extend = 1;
                    desc.count_ext = regs.hob_nsect;
                    desc.lba_low_ext = regs.hob_lbal;
                    desc.lba_mid_ext = regs.hob_lbam;
                    desc.lba_high_ext = regs.hob_lbah;
                }
                buf.push(desc.as_bytes());
                buf.data[7] = (buf.len - size_of::<scsi::DescriptorSenseDataHeader>()) as u8;
                buf
            }
            SenseFormat::Fixed => {
                let mut sense = self.sense.fixed();
                set_valid(&mut sense);
                sense.header.information = [
                    self.registers.error.into(),
                    self.registers.status.into(),
                    regs.device,
                    regs.nsect,
                ];
                let mut flags = 0;
                if self.extend {
                    flags |= scsi::ATA_PASSTHROUGH_FIXED_EXTEND;
                    if regs.hob_nsect != 0 {
                        flags |= scsi::ATA_PASSTHROUGH_FIXED_COUNT_UPPER_NONZERO;
                    }
                    if regs.hob_lbal != 0 || regs.hob_lbam != 0 || regs.hob_lbah != 0 {
                        flags |= scsi::ATA_PASSTHROUGH_FIXED_LBA_UPPER_NONZERO;
                    }
                }
                sense.command_specific_information = [flags, regs.lbal, regs.lbam, regs.lbah];
                let mut buf = SenseBuffer::new();
                buf.push(sense.as_bytes());
                buf
            }
        }
    }
}

fn set_valid(sense: &mut scsi::SenseData) {
    sense.header.error_code =
        SenseDataErrorCode(sense.header.error_code.0 | scsi::SENSE_DATA_VALID);
}

/// Sense for a failed translated command.
pub(crate) fn ata_sense(
    dev: &DeviceSnapshot,
    state: &DeviceState,
    flags: TaskfileFlags,
    completion: &AtaCompletion,
) -> CheckCondition {
    let format = SenseFormat::new(state.descriptor_sense);
    if state.disabled {
        return ScsiError::NotReady.check_condition(format);
    }

    let result = &completion.result;
    if completion.is_error() {
        let sense =
            CheckCondition::from_triple(format, map_ata_error(result.status, result.error));
        match read_block(dev, flags, &result.regs) {
            Some(block) => sense.with_information(block),
            None => sense,
        }
    } else {
        tracing::warn!(
            status = u8::from(result.status),
            "could not decode error status"
        );
        CheckCondition::new(
            format,
            SenseKey::ABORTED_COMMAND,
            AdditionalSenseCode::NO_SENSE,
            0,
        )
    }
}

/// Sense for an ATA pass-through command that failed or asked for its
/// registers with CK_COND.
pub(crate) fn passthrough_sense(
    state: &DeviceState,
    flags: TaskfileFlags,
    completion: &AtaCompletion,
) -> PassthroughSense {
    let result = &completion.result;
    let sense = if completion.is_error() {
        CheckCondition::from_triple(
            SenseFormat::new(state.descriptor_sense),
            map_ata_error(result.status, result.error),
        )
    } else {
        CheckCondition::new(
            SenseFormat::Descriptor,
            SenseKey::RECOVERED_ERROR,
            AdditionalSenseCode::NO_SENSE,
            scsi::SCSI_SENSEQ_ATA_PASS_THROUGH_INFORMATION_AVAILABLE,
        )
    };
    PassthroughSense {
        sense,
        registers: *result,
        extend: flags.lba48(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ata_defs::AtaRegisters;
    use ata_defs::ErrorReg;
    use ata_defs::Status;

    #[test]
    fn fixed_field_pointer() {
        let sense = CheckCondition::new(
            SenseFormat::Fixed,
            SenseKey::ILLEGAL_REQUEST,
            AdditionalSenseCode::INVALID_CDB,
            0,
        )
        .with_field_pointer(FieldPointer {
            command_data: true,
            byte: 4,
            bit: Some(1),
        })
        .render();
        let bytes = sense.as_bytes();
        assert_eq!(bytes.len(), 18);
        assert_eq!(bytes[0], 0x70);
        assert_eq!(bytes[2], 0x05);
        assert_eq!(bytes[12], 0x24);
        assert_eq!(&bytes[15..18], &[0xc9, 0, 4]);
    }

    #[test]
    fn fixed_information_needs_32_bits() {
        let sense = |info| {
            CheckCondition::new(
                SenseFormat::Fixed,
                SenseKey::MEDIUM_ERROR,
                AdditionalSenseCode::UNRECOVERED_ERROR,
                0,
            )
            .with_information(info)
            .render()
        };
        let small = sense(0x1234);
        assert_eq!(small.as_bytes()[0], 0xf0);
        assert_eq!(&small.as_bytes()[3..7], &[0, 0, 0x12, 0x34]);
        let large = sense(0x1_0000_0000);
        assert_eq!(large.as_bytes()[0], 0x70);
    }

    #[test]
    fn descriptor_layout() {
        let sense = CheckCondition::new(
            SenseFormat::Descriptor,
            SenseKey::MEDIUM_ERROR,
            AdditionalSenseCode::UNRECOVERED_ERROR,
            4,
        )
        .with_information(0x1_0000_0000)
        .render();
        let bytes = sense.as_bytes();
        assert_eq!(&bytes[..4], &[0x72, 0x03, 0x11, 0x04]);
        assert_eq!(bytes[7], 12);
        let info = sense
            .descriptor(scsi::SenseDescriptorType::INFORMATION)
            .unwrap();
        assert_eq!(info[2], 0x80);
        assert_eq!(&info[4..12], &0x1_0000_0000u64.to_be_bytes());
    }

    #[test]
    fn ata_sense_needs_failure_or_error_status() {
        let dev = crate::tests::test_helpers::disk();
        let state = DeviceState::default();
        let flags = TaskfileFlags::new().with_lba(true);
        let completion = |failed| AtaCompletion {
            failed,
            result: ResultTaskfile {
                status: Status::from(0x50),
                ..Default::default()
            },
        };

        let sense = ata_sense(&dev, &state, flags, &completion(true)).render();
        let bytes = sense.as_bytes();
        assert_eq!(bytes[2] & 0xf, SenseKey::ILLEGAL_REQUEST.0);
        assert_eq!(bytes[12], AdditionalSenseCode::ILLEGAL_BLOCK.0);
        assert_eq!(bytes[13], scsi::SCSI_SENSEQ_UNALIGNED_WRITE);

        let sense = ata_sense(&dev, &state, flags, &completion(false)).render();
        let bytes = sense.as_bytes();
        assert_eq!(bytes[2] & 0xf, SenseKey::ABORTED_COMMAND.0);
        assert_eq!(bytes[12], 0);
        assert_eq!(bytes[13], 0);
    }

    fn registers() -> ResultTaskfile {
        ResultTaskfile {
            status: Status::from(0x51),
            error: ErrorReg::from(0x04),
            regs: AtaRegisters {
                nsect: 0x11,
                hob_nsect: 0x22,
                lbal: 0x33,
                lbam: 0x44,
                lbah: 0x55,
                hob_lbal: 0x66,
                device: 0x40,
                ..Default::default()
            },
        }
    }

    #[test]
    fn passthrough_descriptor() {
        let sense = PassthroughSense {
            sense: CheckCondition::new(
                SenseFormat::Descriptor,
                SenseKey::RECOVERED_ERROR,
                AdditionalSenseCode::NO_SENSE,
                0x1d,
            ),
            registers: registers(),
            extend: true,
        }
        .render();
        let bytes = sense.as_bytes();
        assert_eq!(bytes[7], 14);
        assert_eq!(
            &bytes[8..22],
            &[9, 12, 1, 0x04, 0x22, 0x11, 0x66, 0x33, 0, 0x44, 0, 0x55, 0x40, 0x51]
        );
    }

    #[test]
    fn passthrough_fixed() {
        let sense = PassthroughSense {
            sense: CheckCondition::new(
                SenseFormat::Fixed,
                SenseKey::ABORTED_COMMAND,
                AdditionalSenseCode::NO_SENSE,
                0,
            ),
            registers: registers(),
            extend: true,
        }
        .render();
        let bytes = sense.as_bytes();
        assert_eq!(bytes[0], 0xf0);
        assert_eq!(&bytes[3..7], &[0x04, 0x51, 0x40, 0x11]);
        assert_eq!(&bytes[8..12], &[0xe0, 0x33, 0x44, 0x55]);
    }
}
