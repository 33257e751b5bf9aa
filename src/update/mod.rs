//! Update Object Simulation
//!
//! One parameterized state machine behind both the firmware and software
//! update objects.
//!
//! Components:
//! - `machine` - the update state machine
//! - `policy` - per-variant resource roles and legal result codes
//! - `verify` - package digest check

pub mod machine;
pub mod policy;
pub mod verify;

pub use machine::{
    DeliveryMethod, FailureInjector, PackageSource, Phase, UpdateConfig, UpdateObject,
    UpdateResult, UpdateSnapshot,
};
pub use policy::{ResultReset, VariantPolicy};
