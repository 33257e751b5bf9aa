//! Server Provisioning Record
//!
//! The bootstrap-provisioned configuration that decides which management
//! server may touch security-sensitive resources. This core only loads and
//! exposes it; the access gate enforcing it sits in front of the dispatcher
//! and belongs to the host.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Provision file not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to read provision record: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Invalid provision format: {0}")]
    ParseError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionRecord {
    pub server: ServerEntry,
    pub security: SecurityEntry,
    #[serde(default)]
    pub acls: Vec<AclEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerEntry {
    pub short_server_id: u16,
    #[serde(default = "default_lifetime")]
    pub lifetime: u32,
    #[serde(default = "default_min_period")]
    pub default_min_period: u32,
    #[serde(default)]
    pub default_max_period: Option<u32>,
    #[serde(default = "default_true")]
    pub notify_when_disabled: bool,
    #[serde(default = "default_binding")]
    pub binding: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEntry {
    pub server_uri: String,
    #[serde(default)]
    pub bootstrap_server: bool,
    pub security_mode: SecurityMode,
    #[serde(default)]
    pub public_key_or_id: Vec<u8>,
    #[serde(default)]
    pub server_public_key: Vec<u8>,
    #[serde(default)]
    pub secret_key: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityMode {
    Psk,
    Rpk,
    X509,
    NoSec,
}

/// Access rights for one object instance: resource-less LwM2M ACL bits
/// keyed by short server id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AclEntry {
    pub object_id: u16,
    pub object_instance_id: u16,
    #[serde(default)]
    pub access: BTreeMap<u16, u32>,
    #[serde(default)]
    pub owner: Option<u16>,
}

fn default_lifetime() -> u32 {
    86400
}

fn default_min_period() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_binding() -> String {
    "U".to_string()
}

impl ProvisionRecord {
    pub fn load(path: &Path) -> Result<Self, ProvisionError> {
        if !path.exists() {
            return Err(ProvisionError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save atomically: write to a temp file, then rename over the target.
    pub fn save(&self, path: &Path) -> Result<(), ProvisionError> {
        let content = serde_json::to_string_pretty(self)?;
        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, &content)?;
        std::fs::rename(&temp_path, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> ProvisionRecord {
        ProvisionRecord {
            server: ServerEntry {
                short_server_id: 123,
                lifetime: 300,
                default_min_period: 1,
                default_max_period: None,
                notify_when_disabled: true,
                binding: "U".to_string(),
            },
            security: SecurityEntry {
                server_uri: "coaps://server.example:5684".to_string(),
                bootstrap_server: false,
                security_mode: SecurityMode::Psk,
                public_key_or_id: b"client-id".to_vec(),
                server_public_key: Vec::new(),
                secret_key: vec![0x13, 0x37],
            },
            acls: vec![AclEntry {
                object_id: 5,
                object_instance_id: 0,
                access: BTreeMap::from([(123, 0b1111)]),
                owner: Some(123),
            }],
        }
    }

    #[test]
    fn test_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("provision.json");

        sample().save(&path).unwrap();
        let loaded = ProvisionRecord::load(&path).unwrap();
        assert_eq!(loaded.server.short_server_id, 123);
        assert_eq!(loaded.security.security_mode, SecurityMode::Psk);
        assert_eq!(loaded.acls[0].access[&123], 0b1111);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let result = ProvisionRecord::load(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(ProvisionError::NotFound(_))));
    }

    #[test]
    fn test_defaults_fill_in() {
        let json = r#"{
            "server": { "short_server_id": 1 },
            "security": { "server_uri": "coap://h", "security_mode": "no_sec" }
        }"#;
        let record: ProvisionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.server.lifetime, 86400);
        assert_eq!(record.server.binding, "U");
        assert!(record.server.notify_when_disabled);
        assert!(record.acls.is_empty());
        assert!(record.security.secret_key.is_empty());
    }
}
