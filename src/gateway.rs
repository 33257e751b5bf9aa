//! Gateway Routing Entry
//!
//! Read-only gateway object (OMA object 25): a device id, the CoAP route
//! prefix, and an object link into the routing table. Static data, no
//! state machine.

use crate::dispatch::ObjectInstance;
use crate::error::AccessError;
use crate::registry::Variant;
use crate::value::Value;

const DEVICE_ID: u16 = 0;
const PREFIX: u16 = 1;
const ROUTING_TABLE_ENTRY: u16 = 2;

pub struct GatewayEntry {
    instance_id: u16,
    device_id: String,
    prefix: String,
    routing_object_id: u16,
    routing_instance_id: u16,
}

impl GatewayEntry {
    pub fn new(
        instance_id: u16,
        device_id: impl Into<String>,
        prefix: impl Into<String>,
        routing_object_id: u16,
        routing_instance_id: u16,
    ) -> Self {
        Self {
            instance_id,
            device_id: device_id.into(),
            prefix: prefix.into(),
            routing_object_id,
            routing_instance_id,
        }
    }
}

impl ObjectInstance for GatewayEntry {
    fn variant(&self) -> Variant {
        Variant::Gateway
    }

    fn instance_id(&self) -> u16 {
        self.instance_id
    }

    fn read_resource(&self, id: u16) -> Result<Value, AccessError> {
        match id {
            DEVICE_ID => Ok(Value::Text(self.device_id.clone())),
            PREFIX => Ok(Value::Text(self.prefix.clone())),
            ROUTING_TABLE_ENTRY => Ok(Value::ObjectLink {
                object_id: self.routing_object_id,
                instance_id: self.routing_instance_id,
            }),
            _ => Err(AccessError::NotFound(id)),
        }
    }

    fn write_resource(&self, id: u16, _value: Value) -> Result<(), AccessError> {
        Err(AccessError::NotWritable(id))
    }

    fn execute_resource(&self, id: u16, _params: &str) -> Result<(), AccessError> {
        Err(AccessError::NotExecutable(id))
    }
}
