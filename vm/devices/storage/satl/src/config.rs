// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Translation policy knobs.

/// Caller-supplied translation policy. Unset fields take their defaults.
#[derive(Debug, Default, Clone)]
pub struct SatlParameters {
    /// Let ATA pass-through issue TRUSTED SEND/RECEIVE. Defaults to false.
    pub allow_tpm: Option<bool>,
    /// Translate ATA PASS-THROUGH (16) for ATAPI devices instead of relaying
    /// it as a packet. Defaults to true.
    pub atapi_passthru16: Option<bool>,
    /// Advertise and honor FUA. Defaults to false.
    pub fua: Option<bool>,
    /// Complete START STOP UNIT stop requests without spinning down.
    /// Defaults to false.
    pub skip_spindown: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Policy {
    pub allow_tpm: bool,
    pub atapi_passthru16: bool,
    pub fua: bool,
    pub skip_spindown: bool,
}

impl Policy {
    pub fn new(params: SatlParameters) -> Self {
        let SatlParameters {
            allow_tpm,
            atapi_passthru16,
            fua,
            skip_spindown,
        } = params;

        Self {
            allow_tpm: allow_tpm.unwrap_or(false),
            atapi_passthru16: atapi_passthru16.unwrap_or(true),
            fua: fua.unwrap_or(false),
            skip_spindown: skip_spindown.unwrap_or(false),
        }
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::new(SatlParameters::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let policy = Policy::default();
        assert!(!policy.allow_tpm);
        assert!(policy.atapi_passthru16);
        assert!(!policy.fua);
        assert!(!policy.skip_spindown);
    }

    #[test]
    fn overrides() {
        let policy = Policy::new(SatlParameters {
            fua: Some(true),
            atapi_passthru16: Some(false),
            ..Default::default()
        });
        assert!(policy.fua);
        assert!(!policy.atapi_passthru16);
        assert!(!policy.allow_tpm);
    }
}
