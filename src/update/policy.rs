//! Per-Variant Policy Tables
//!
//! Firmware and software update objects share one state machine; everything
//! that differs between them lives here as data: which resource id plays
//! which role, when the result code resets, and which result codes are
//! legal for the variant.

use super::machine::UpdateResult;
use crate::registry::Variant;

/// When `result` goes back to `Initial` in a new download cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultReset {
    /// Reset as soon as a new download begins (firmware behavior).
    OnDownloadStart,
    /// Reset on entering `Downloaded` (software behavior).
    OnDownloadComplete,
}

#[derive(Debug, Clone)]
pub struct VariantPolicy {
    pub variant: Variant,
    pub package_id: u16,
    pub package_uri_id: u16,
    pub install_id: u16,
    pub state_id: u16,
    pub result_id: u16,
    pub name_id: u16,
    pub version_id: u16,
    /// Only the firmware object exposes a delivery-method resource.
    pub delivery_method_id: Option<u16>,
    pub result_reset: ResultReset,
    pub legal_results: &'static [UpdateResult],
}

const FIRMWARE_RESULTS: &[UpdateResult] = &[
    UpdateResult::Initial,
    UpdateResult::Success,
    UpdateResult::NotEnoughMemory,
    UpdateResult::ConnectionLost,
    UpdateResult::IntegrityCheckFailed,
    UpdateResult::UnsupportedType,
    UpdateResult::InvalidUri,
    UpdateResult::UpdateFailed,
    UpdateResult::UnsupportedProtocol,
];

// The software object has no protocol negotiation step, so that code is
// never a legal outcome for it.
const SOFTWARE_RESULTS: &[UpdateResult] = &[
    UpdateResult::Initial,
    UpdateResult::Success,
    UpdateResult::NotEnoughMemory,
    UpdateResult::ConnectionLost,
    UpdateResult::IntegrityCheckFailed,
    UpdateResult::UnsupportedType,
    UpdateResult::InvalidUri,
    UpdateResult::UpdateFailed,
];

impl VariantPolicy {
    pub fn firmware() -> Self {
        Self {
            variant: Variant::Firmware,
            package_id: 0,
            package_uri_id: 1,
            install_id: 2,
            state_id: 3,
            result_id: 5,
            name_id: 6,
            version_id: 7,
            delivery_method_id: Some(9),
            result_reset: ResultReset::OnDownloadStart,
            legal_results: FIRMWARE_RESULTS,
        }
    }

    pub fn software() -> Self {
        Self {
            variant: Variant::Software,
            package_id: 2,
            package_uri_id: 3,
            install_id: 4,
            state_id: 7,
            result_id: 9,
            name_id: 0,
            version_id: 1,
            delivery_method_id: None,
            result_reset: ResultReset::OnDownloadComplete,
            legal_results: SOFTWARE_RESULTS,
        }
    }

    /// Policy for an update-capable variant; `None` for static objects.
    pub fn for_variant(variant: Variant) -> Option<Self> {
        match variant {
            Variant::Firmware => Some(Self::firmware()),
            Variant::Software => Some(Self::software()),
            Variant::Gateway | Variant::Container => None,
        }
    }

    pub fn allows_result(&self, result: UpdateResult) -> bool {
        self.legal_results.contains(&result)
    }
}
