//! Operation Dispatcher
//!
//! The public entry point for read/write/execute requests on one object
//! instance. Routes every request through the registry for capability
//! validation, logs intent at the boundary, then delegates to the instance
//! for effect.

use std::sync::Arc;
use tracing::info;

use crate::error::AccessError;
use crate::registry::{self, Variant};
use crate::value::Value;

/// One managed object instance, as the dispatcher sees it.
///
/// Implementations only ever receive ids the registry already validated for
/// the requested operation; anything the instance does not model is
/// `NotFound`.
pub trait ObjectInstance: Send + Sync {
    fn variant(&self) -> Variant;
    fn instance_id(&self) -> u16;
    fn read_resource(&self, id: u16) -> Result<Value, AccessError>;
    fn write_resource(&self, id: u16, value: Value) -> Result<(), AccessError>;
    fn execute_resource(&self, id: u16, params: &str) -> Result<(), AccessError>;
}

pub struct Dispatcher {
    instance: Arc<dyn ObjectInstance>,
}

impl Dispatcher {
    pub fn new(instance: Arc<dyn ObjectInstance>) -> Self {
        Self { instance }
    }

    fn path(&self, id: u16) -> String {
        format!(
            "/{}/{}/{}",
            self.instance.variant().object_id(),
            self.instance.instance_id(),
            id
        )
    }

    pub fn read(&self, id: u16) -> Result<Value, AccessError> {
        info!(
            "Read on {} resource {}",
            self.instance.variant().name(),
            self.path(id)
        );
        let capability = registry::capability(self.instance.variant(), id)?;
        if !capability.read {
            return Err(AccessError::NotReadable(id));
        }
        self.instance.read_resource(id)
    }

    pub fn write(&self, id: u16, value: Value) -> Result<(), AccessError> {
        info!(
            "Write on {} resource {}",
            self.instance.variant().name(),
            self.path(id)
        );
        let capability = registry::capability(self.instance.variant(), id)?;
        if !capability.write {
            return Err(AccessError::NotWritable(id));
        }
        self.instance.write_resource(id, value)
    }

    pub fn execute(&self, id: u16, params: &str) -> Result<(), AccessError> {
        info!(
            "Execute on {} resource {}",
            self.instance.variant().name(),
            self.path(id)
        );
        let capability = registry::capability(self.instance.variant(), id)?;
        if !capability.execute {
            return Err(AccessError::NotExecutable(id));
        }
        self.instance.execute_resource(id, params)
    }
}
