//! otasim - Simulated LwM2M update objects
//!
//! In-memory firmware/software update object model for a client agent:
//! numbered resources behind a read/write/execute dispatcher, a four-phase
//! update state machine, delayed transition scheduling, and batched
//! change notifications to observers.

pub mod container;
pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod notifier;
pub mod provision;
pub mod registry;
pub mod scheduler;
pub mod update;
pub mod value;

pub use container::BinaryAppContainer;
pub use dispatch::{Dispatcher, ObjectInstance};
pub use error::AccessError;
pub use gateway::GatewayEntry;
pub use notifier::ChangeNotifier;
pub use provision::ProvisionRecord;
pub use registry::Variant;
pub use scheduler::Scheduler;
pub use update::{
    DeliveryMethod, FailureInjector, PackageSource, Phase, UpdateConfig, UpdateObject,
    UpdateResult,
};
pub use value::Value;
