//! Update State Machine
//!
//! Owns the mutable state of one update object instance and is the only
//! code allowed to mutate it. All reads and mutations, including timer
//! completions, go through one mutex per instance; the write/execute entry
//! points return immediately and the slow part of a transition runs on the
//! scheduler.
//!
//! Transition graph:
//!
//! ```text
//! Idle --begin_download--> Downloading --(timer)--> Downloaded
//! Downloaded --begin_install--> Updating --(timer)--> Idle
//! Downloading --(timer, injected failure)--> Idle (failure result)
//! any non-Idle --begin_download--> rejected, no mutation
//! ```

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::policy::{ResultReset, VariantPolicy};
use super::verify;
use crate::error::AccessError;
use crate::notifier::ChangeNotifier;
use crate::registry::Variant;
use crate::scheduler::{DelayHandle, Scheduler};
use crate::value::Value;

/// Update lifecycle phase, exposed through the state resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Downloading,
    Downloaded,
    Updating,
}

impl Phase {
    /// Numeric code on the wire.
    pub fn code(self) -> i64 {
        match self {
            Phase::Idle => 0,
            Phase::Downloading => 1,
            Phase::Downloaded => 2,
            Phase::Updating => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Phase::Idle => "Idle",
            Phase::Downloading => "Downloading",
            Phase::Downloaded => "Downloaded",
            Phase::Updating => "Updating",
        }
    }
}

/// Outcome code of the last download or install attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateResult {
    Initial,
    Success,
    NotEnoughMemory,
    ConnectionLost,
    IntegrityCheckFailed,
    UnsupportedType,
    InvalidUri,
    UpdateFailed,
    UnsupportedProtocol,
}

impl UpdateResult {
    pub fn code(self) -> i64 {
        match self {
            UpdateResult::Initial => 0,
            UpdateResult::Success => 1,
            UpdateResult::NotEnoughMemory => 2,
            UpdateResult::ConnectionLost => 3,
            UpdateResult::IntegrityCheckFailed => 4,
            UpdateResult::UnsupportedType => 5,
            UpdateResult::InvalidUri => 6,
            UpdateResult::UpdateFailed => 7,
            UpdateResult::UnsupportedProtocol => 8,
        }
    }

    pub fn is_failure(self) -> bool {
        !matches!(self, UpdateResult::Initial | UpdateResult::Success)
    }
}

/// How this instance accepts package images. Static, read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    PullOnly,
    PushOnly,
    Both,
}

impl DeliveryMethod {
    pub fn code(self) -> i64 {
        match self {
            DeliveryMethod::PullOnly => 0,
            DeliveryMethod::PushOnly => 1,
            DeliveryMethod::Both => 2,
        }
    }
}

/// What a download request carries: a URI to pull from, or the raw image
/// pushed directly.
#[derive(Debug, Clone)]
pub enum PackageSource {
    Uri(String),
    Bytes(Vec<u8>),
}

/// Simulation parameters for one instance.
#[derive(Debug, Clone)]
pub struct UpdateConfig {
    /// Time the simulated download takes.
    pub download_delay: Duration,
    /// Time the simulated install/update takes.
    pub install_delay: Duration,
    /// Package identity before the first successful install.
    pub package_name: String,
    pub package_version: String,
    /// Identity adopted when an install completes successfully.
    pub installed_name: String,
    pub installed_version: String,
    pub delivery_method: DeliveryMethod,
    /// Hex SHA-256 a pushed image must match, when set.
    pub expected_sha256: Option<String>,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            download_delay: Duration::from_secs(30),
            install_delay: Duration::from_secs(10),
            package_name: "leshanPkg".to_string(),
            package_version: "1.0.9".to_string(),
            installed_name: "Updated LeshanPkg".to_string(),
            installed_version: "2.0.0".to_string(),
            delivery_method: DeliveryMethod::Both,
            expected_sha256: None,
        }
    }
}

/// Forces a chosen failure code onto the download or install step so every
/// negative result is reachable in tests. `None` means the step succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailureInjector {
    pub download: Option<UpdateResult>,
    pub install: Option<UpdateResult>,
}

/// Point-in-time copy of the mutable state, taken under the lock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateSnapshot {
    pub phase: Phase,
    pub result: UpdateResult,
    pub package_uri: String,
    pub package_name: String,
    pub package_version: String,
}

struct UpdateInner {
    phase: Phase,
    result: UpdateResult,
    package_uri: String,
    package: Vec<u8>,
    package_name: String,
    package_version: String,
    pending: Option<DelayHandle>,
}

pub struct UpdateObject {
    weak: Weak<UpdateObject>,
    instance_id: u16,
    policy: VariantPolicy,
    config: UpdateConfig,
    injector: FailureInjector,
    scheduler: Scheduler,
    notifier: Arc<ChangeNotifier>,
    inner: Mutex<UpdateInner>,
}

impl UpdateObject {
    /// Build an instance for an update-capable variant.
    ///
    /// Fails when an injected failure code is not legal for the variant.
    pub fn new(
        instance_id: u16,
        policy: VariantPolicy,
        config: UpdateConfig,
        injector: FailureInjector,
        scheduler: Scheduler,
        notifier: Arc<ChangeNotifier>,
    ) -> Result<Arc<Self>, AccessError> {
        for injected in [injector.download, injector.install].into_iter().flatten() {
            if !injected.is_failure() {
                return Err(AccessError::InvalidInput(format!(
                    "injected outcome {:?} is not a failure code",
                    injected
                )));
            }
            if !policy.allows_result(injected) {
                return Err(AccessError::InvalidInput(format!(
                    "result code {:?} is not legal for {:?}",
                    injected, policy.variant
                )));
            }
        }

        let inner = UpdateInner {
            phase: Phase::Idle,
            result: UpdateResult::Initial,
            package_uri: String::new(),
            package: Vec::new(),
            package_name: config.package_name.clone(),
            package_version: config.package_version.clone(),
            pending: None,
        };

        Ok(Arc::new_cyclic(|weak| Self {
            weak: weak.clone(),
            instance_id,
            policy,
            config,
            injector,
            scheduler,
            notifier,
            inner: Mutex::new(inner),
        }))
    }

    /// Firmware update object with default failure injection (none).
    pub fn firmware(
        instance_id: u16,
        config: UpdateConfig,
        scheduler: Scheduler,
        notifier: Arc<ChangeNotifier>,
    ) -> Arc<Self> {
        // No injected outcomes, so validation cannot fail.
        Self::new(
            instance_id,
            VariantPolicy::firmware(),
            config,
            FailureInjector::default(),
            scheduler,
            notifier,
        )
        .unwrap()
    }

    /// Software management object with default failure injection (none).
    pub fn software(
        instance_id: u16,
        config: UpdateConfig,
        scheduler: Scheduler,
        notifier: Arc<ChangeNotifier>,
    ) -> Arc<Self> {
        Self::new(
            instance_id,
            VariantPolicy::software(),
            config,
            FailureInjector::default(),
            scheduler,
            notifier,
        )
        .unwrap()
    }

    pub fn variant(&self) -> Variant {
        self.policy.variant
    }

    pub fn instance_id(&self) -> u16 {
        self.instance_id
    }

    /// Current exposed value of a resource, read under the instance lock.
    pub fn current_value(&self, id: u16) -> Result<Value, AccessError> {
        let inner = self.inner.lock().unwrap();
        let p = &self.policy;
        if id == p.package_id {
            Ok(Value::Opaque(inner.package.clone()))
        } else if id == p.package_uri_id {
            Ok(Value::Text(inner.package_uri.clone()))
        } else if id == p.state_id {
            Ok(Value::Integer(inner.phase.code()))
        } else if id == p.result_id {
            Ok(Value::Integer(inner.result.code()))
        } else if id == p.name_id {
            Ok(Value::Text(inner.package_name.clone()))
        } else if id == p.version_id {
            Ok(Value::Text(inner.package_version.clone()))
        } else if Some(id) == p.delivery_method_id {
            Ok(Value::Integer(self.config.delivery_method.code()))
        } else {
            Err(AccessError::NotFound(id))
        }
    }

    /// Copy of the whole mutable state, for hosts and tests.
    pub fn snapshot(&self) -> UpdateSnapshot {
        let inner = self.inner.lock().unwrap();
        UpdateSnapshot {
            phase: inner.phase,
            result: inner.result,
            package_uri: inner.package_uri.clone(),
            package_name: inner.package_name.clone(),
            package_version: inner.package_version.clone(),
        }
    }

    /// Accept a new download request. Legal only in `Idle`; a request while
    /// a transition is pending is rejected, never superseded, and leaves
    /// every field untouched.
    pub fn begin_download(&self, source: PackageSource) -> Result<(), AccessError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.phase != Phase::Idle {
            return Err(AccessError::InvalidState {
                phase: inner.phase.name(),
                operation: "begin_download",
            });
        }

        match &source {
            PackageSource::Uri(uri) => {
                if uri.trim().is_empty() {
                    return Err(AccessError::InvalidInput("empty package URI".to_string()));
                }
                if !uri.contains("://") {
                    return Err(AccessError::InvalidInput(format!(
                        "package URI has no scheme: {}",
                        uri
                    )));
                }
                if self.config.delivery_method == DeliveryMethod::PushOnly {
                    return Err(AccessError::InvalidInput(
                        "pull delivery not supported by this instance".to_string(),
                    ));
                }
            }
            PackageSource::Bytes(bytes) => {
                if bytes.is_empty() {
                    return Err(AccessError::InvalidInput(
                        "empty package payload".to_string(),
                    ));
                }
                if self.config.delivery_method == DeliveryMethod::PullOnly {
                    return Err(AccessError::InvalidInput(
                        "push delivery not supported by this instance".to_string(),
                    ));
                }
            }
        }

        match source {
            PackageSource::Uri(uri) => {
                inner.package_uri = uri;
                inner.package.clear();
            }
            PackageSource::Bytes(bytes) => {
                inner.package = bytes;
                inner.package_uri.clear();
            }
        }

        inner.phase = Phase::Downloading;
        let mut changed = vec![self.policy.state_id];
        if self.policy.result_reset == ResultReset::OnDownloadStart
            && inner.result != UpdateResult::Initial
        {
            inner.result = UpdateResult::Initial;
            changed.push(self.policy.result_id);
        }

        let this = self.weak.clone();
        let handle = self.scheduler.schedule(self.config.download_delay, move || {
            if let Some(object) = this.upgrade() {
                object.complete_download();
            }
        });
        inner.pending = Some(handle);

        info!(
            "{} instance {} started downloading",
            self.variant().name(),
            self.instance_id
        );
        self.notifier.notify(self.instance_id, &changed);
        Ok(())
    }

    /// Accept an install/update request. Legal only in `Downloaded`. The
    /// transition to `Updating` is visible synchronously; completion runs
    /// on the scheduler after the configured install delay.
    pub fn begin_install(&self) -> Result<(), AccessError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.phase != Phase::Downloaded {
            return Err(AccessError::InvalidState {
                phase: inner.phase.name(),
                operation: "begin_install",
            });
        }

        inner.phase = Phase::Updating;
        let outcome = self.injector.install.unwrap_or(UpdateResult::Success);
        let this = self.weak.clone();
        let handle = self.scheduler.schedule(self.config.install_delay, move || {
            if let Some(object) = this.upgrade() {
                object.complete_install(outcome);
            }
        });
        inner.pending = Some(handle);

        info!(
            "{} instance {} started updating",
            self.variant().name(),
            self.instance_id
        );
        self.notifier.notify(self.instance_id, &[self.policy.state_id]);
        Ok(())
    }

    /// Cancel any pending scheduled transition. Returns whether one was
    /// outstanding. Also runs on drop, so a discarded instance never gets
    /// mutated by a late timer callback.
    pub fn cancel_pending(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.pending.take() {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Scheduler-only: finish the simulated download.
    pub(crate) fn complete_download(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.phase != Phase::Downloading {
            debug!(
                "Stale download completion on instance {} ignored (phase {})",
                self.instance_id,
                inner.phase.name()
            );
            return;
        }
        inner.pending = None;

        let failure = self.injector.download.or_else(|| {
            match &self.config.expected_sha256 {
                Some(expected) if !inner.package.is_empty() => {
                    if verify::digest_matches(expected, &inner.package) {
                        None
                    } else {
                        Some(UpdateResult::IntegrityCheckFailed)
                    }
                }
                _ => None,
            }
        });

        match failure {
            Some(code) => {
                inner.phase = Phase::Idle;
                inner.result = code;
                warn!(
                    "{} instance {} download failed: {:?}",
                    self.variant().name(),
                    self.instance_id,
                    code
                );
                self.notifier.notify(
                    self.instance_id,
                    &[self.policy.state_id, self.policy.result_id],
                );
            }
            None => {
                inner.phase = Phase::Downloaded;
                let mut changed = vec![self.policy.state_id];
                if self.policy.result_reset == ResultReset::OnDownloadComplete {
                    inner.result = UpdateResult::Initial;
                    changed.push(self.policy.result_id);
                }
                info!(
                    "{} instance {} finished downloading",
                    self.variant().name(),
                    self.instance_id
                );
                self.notifier.notify(self.instance_id, &changed);
            }
        }
    }

    /// Scheduler-only: finish the simulated install with `outcome`.
    ///
    /// On success the instance adopts the staged package identity; on any
    /// failure the name and version stay as they were. Either way the phase
    /// returns to `Idle` and the changed resources go out as one batch.
    pub(crate) fn complete_install(&self, outcome: UpdateResult) {
        let mut inner = self.inner.lock().unwrap();
        if inner.phase != Phase::Updating {
            debug!(
                "Stale install completion on instance {} ignored (phase {})",
                self.instance_id,
                inner.phase.name()
            );
            return;
        }
        inner.pending = None;

        inner.phase = Phase::Idle;
        inner.result = outcome;
        let mut changed = vec![self.policy.state_id, self.policy.result_id];
        if outcome == UpdateResult::Success {
            inner.package_name = self.config.installed_name.clone();
            inner.package_version = self.config.installed_version.clone();
            changed.push(self.policy.name_id);
            changed.push(self.policy.version_id);
            info!(
                "{} instance {} updated to {} {}",
                self.variant().name(),
                self.instance_id,
                inner.package_name,
                inner.package_version
            );
        } else {
            warn!(
                "{} instance {} update failed: {:?}",
                self.variant().name(),
                self.instance_id,
                outcome
            );
        }
        self.notifier.notify(self.instance_id, &changed);
    }
}

impl crate::dispatch::ObjectInstance for UpdateObject {
    fn variant(&self) -> Variant {
        self.policy.variant
    }

    fn instance_id(&self) -> u16 {
        self.instance_id
    }

    fn read_resource(&self, id: u16) -> Result<Value, AccessError> {
        self.current_value(id)
    }

    fn write_resource(&self, id: u16, value: Value) -> Result<(), AccessError> {
        if id == self.policy.package_uri_id {
            let uri = value.as_text().ok_or_else(|| {
                AccessError::InvalidInput("package URI must be a text value".to_string())
            })?;
            self.begin_download(PackageSource::Uri(uri.to_string()))
        } else if id == self.policy.package_id {
            let bytes = value.as_opaque().ok_or_else(|| {
                AccessError::InvalidInput("package must be an opaque value".to_string())
            })?;
            self.begin_download(PackageSource::Bytes(bytes.to_vec()))
        } else {
            Err(AccessError::NotFound(id))
        }
    }

    fn execute_resource(&self, id: u16, _params: &str) -> Result<(), AccessError> {
        if id == self.policy.install_id {
            self.begin_install()
        } else {
            Err(AccessError::NotFound(id))
        }
    }
}

impl Drop for UpdateObject {
    fn drop(&mut self) {
        if let Ok(inner) = self.inner.get_mut() {
            if let Some(handle) = inner.pending.take() {
                handle.cancel();
            }
        }
    }
}
