//! Binary App Data Container
//!
//! Static byte-container object (OMA object 19). No state machine: plain
//! data exposure, with a writable multi-instance opaque `data` resource.
//! The creation timestamp round-trips exactly as provided.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::dispatch::ObjectInstance;
use crate::error::AccessError;
use crate::notifier::ChangeNotifier;
use crate::registry::Variant;
use crate::value::Value;

const DATA: u16 = 0;
const DATA_PRIORITY: u16 = 1;
const DATA_CREATION_TIME: u16 = 2;
const DATA_DESCRIPTION: u16 = 3;
const DATA_FORMAT: u16 = 4;
const APP_ID: u16 = 5;

pub struct BinaryAppContainer {
    instance_id: u16,
    notifier: Arc<ChangeNotifier>,
    data: Mutex<BTreeMap<u16, Vec<u8>>>,
    priority: i64,
    creation_time: DateTime<Utc>,
    description: String,
    format: String,
    app_id: i64,
}

impl BinaryAppContainer {
    /// Demo defaults matching the seeded sample payloads.
    pub fn new(instance_id: u16, notifier: Arc<ChangeNotifier>) -> Self {
        let mut data = BTreeMap::new();
        data.insert(0, b"test1".to_vec());
        data.insert(1, b"apple".to_vec());
        data.insert(2, b"orange".to_vec());
        Self::from_parts(
            instance_id,
            notifier,
            data,
            1,
            Utc::now(),
            "description".to_string(),
            "plainText".to_string(),
            3,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        instance_id: u16,
        notifier: Arc<ChangeNotifier>,
        data: BTreeMap<u16, Vec<u8>>,
        priority: i64,
        creation_time: DateTime<Utc>,
        description: String,
        format: String,
        app_id: i64,
    ) -> Self {
        Self {
            instance_id,
            notifier,
            data: Mutex::new(data),
            priority,
            creation_time,
            description,
            format,
            app_id,
        }
    }

    pub fn creation_time(&self) -> DateTime<Utc> {
        self.creation_time
    }
}

impl ObjectInstance for BinaryAppContainer {
    fn variant(&self) -> Variant {
        Variant::Container
    }

    fn instance_id(&self) -> u16 {
        self.instance_id
    }

    fn read_resource(&self, id: u16) -> Result<Value, AccessError> {
        match id {
            DATA => Ok(Value::OpaqueInstances(self.data.lock().unwrap().clone())),
            DATA_PRIORITY => Ok(Value::Integer(self.priority)),
            DATA_CREATION_TIME => Ok(Value::Time(self.creation_time)),
            DATA_DESCRIPTION => Ok(Value::Text(self.description.clone())),
            DATA_FORMAT => Ok(Value::Text(self.format.clone())),
            APP_ID => Ok(Value::Integer(self.app_id)),
            _ => Err(AccessError::NotFound(id)),
        }
    }

    fn write_resource(&self, id: u16, value: Value) -> Result<(), AccessError> {
        match (id, value) {
            (DATA, Value::OpaqueInstances(instances)) => {
                let mut data = self.data.lock().unwrap();
                for (instance, bytes) in instances {
                    data.insert(instance, bytes);
                }
                drop(data);
                self.notifier.notify(self.instance_id, &[DATA]);
                Ok(())
            }
            (DATA, _) => Err(AccessError::InvalidInput(
                "data must be a multi-instance opaque value".to_string(),
            )),
            _ => Err(AccessError::NotFound(id)),
        }
    }

    fn execute_resource(&self, id: u16, _params: &str) -> Result<(), AccessError> {
        Err(AccessError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_reads() {
        let container = BinaryAppContainer::new(0, Arc::new(ChangeNotifier::new()));
        assert_eq!(container.read_resource(DATA_PRIORITY).unwrap(), Value::Integer(1));
        assert_eq!(container.read_resource(APP_ID).unwrap(), Value::Integer(3));
        assert_eq!(
            container.read_resource(DATA_FORMAT).unwrap(),
            Value::Text("plainText".to_string())
        );
        match container.read_resource(DATA).unwrap() {
            Value::OpaqueInstances(map) => {
                assert_eq!(map.len(), 3);
                assert_eq!(map[&1], b"apple".to_vec());
            }
            other => panic!("unexpected value: {:?}", other),
        }
    }

    #[test]
    fn test_creation_time_round_trips_exactly() {
        let stamp: DateTime<Utc> = "2023-05-01T12:34:56.789Z".parse().unwrap();
        let container = BinaryAppContainer::from_parts(
            0,
            Arc::new(ChangeNotifier::new()),
            BTreeMap::new(),
            1,
            stamp,
            String::new(),
            String::new(),
            0,
        );
        assert_eq!(
            container.read_resource(DATA_CREATION_TIME).unwrap(),
            Value::Time(stamp)
        );
    }

    #[test]
    fn test_write_merges_and_notifies() {
        let notifier = Arc::new(ChangeNotifier::new());
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        notifier.register(move |instance, ids| {
            sink.lock().unwrap().push((instance, ids.to_vec()));
        });

        let container = BinaryAppContainer::new(4, notifier);
        let mut update = BTreeMap::new();
        update.insert(1u16, b"banana".to_vec());
        container
            .write_resource(DATA, Value::OpaqueInstances(update))
            .unwrap();

        match container.read_resource(DATA).unwrap() {
            Value::OpaqueInstances(map) => {
                assert_eq!(map[&0], b"test1".to_vec());
                assert_eq!(map[&1], b"banana".to_vec());
            }
            other => panic!("unexpected value: {:?}", other),
        }
        assert_eq!(*events.lock().unwrap(), vec![(4, vec![DATA])]);
    }

    #[test]
    fn test_wrong_payload_type_rejected() {
        let container = BinaryAppContainer::new(0, Arc::new(ChangeNotifier::new()));
        assert!(matches!(
            container.write_resource(DATA, Value::Integer(1)),
            Err(AccessError::InvalidInput(_))
        ));
    }
}
