//! Resource Registry
//!
//! Static capability tables for the supported object variants. Pure data:
//! no side effects, unknown ids always answer `NotFound`.

use crate::error::AccessError;

/// Object variants the agent can expose.
///
/// `Firmware` and `Software` share the update state machine; `Gateway` and
/// `Container` are static data objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Firmware,
    Software,
    Gateway,
    Container,
}

impl Variant {
    /// OMA-registered object id this variant models.
    pub fn object_id(&self) -> u16 {
        match self {
            Variant::Firmware => 5,
            Variant::Software => 9,
            Variant::Gateway => 25,
            Variant::Container => 19,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Variant::Firmware => "Firmware Update",
            Variant::Software => "Software Management",
            Variant::Gateway => "LwM2M Gateway",
            Variant::Container => "Binary App Data Container",
        }
    }
}

/// What a management server may do with one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capability {
    pub read: bool,
    pub write: bool,
    pub execute: bool,
}

const R: Capability = Capability { read: true, write: false, execute: false };
const RW: Capability = Capability { read: true, write: true, execute: false };
const X: Capability = Capability { read: false, write: false, execute: true };

/// One row of a variant's resource table.
#[derive(Debug)]
pub struct ResourceDef {
    pub id: u16,
    pub name: &'static str,
    pub capability: Capability,
}

const fn def(id: u16, name: &'static str, capability: Capability) -> ResourceDef {
    ResourceDef { id, name, capability }
}

// Tables are kept in ascending resource-id order.

const FIRMWARE_RESOURCES: &[ResourceDef] = &[
    def(0, "Package", RW),
    def(1, "Package URI", RW),
    def(2, "Update", X),
    def(3, "State", R),
    def(5, "Update Result", R),
    def(6, "PkgName", R),
    def(7, "PkgVersion", R),
    def(9, "Firmware Update Delivery Method", R),
];

const SOFTWARE_RESOURCES: &[ResourceDef] = &[
    def(0, "PkgName", R),
    def(1, "PkgVersion", R),
    def(2, "Package", RW),
    def(3, "Package URI", RW),
    def(4, "Install", X),
    def(7, "Update State", R),
    def(9, "Update Result", R),
];

const GATEWAY_RESOURCES: &[ResourceDef] = &[
    def(0, "Device ID", R),
    def(1, "Prefix", R),
    def(2, "Routing Table Entry", R),
];

const CONTAINER_RESOURCES: &[ResourceDef] = &[
    def(0, "Data", RW),
    def(1, "Data Priority", R),
    def(2, "Data Creation Time", R),
    def(3, "Data Description", R),
    def(4, "Data Format", R),
    def(5, "App ID", R),
];

/// The full resource table for a variant.
pub fn resources(variant: Variant) -> &'static [ResourceDef] {
    match variant {
        Variant::Firmware => FIRMWARE_RESOURCES,
        Variant::Software => SOFTWARE_RESOURCES,
        Variant::Gateway => GATEWAY_RESOURCES,
        Variant::Container => CONTAINER_RESOURCES,
    }
}

/// Ordered set of resource ids a variant exposes.
pub fn supported_resource_ids(variant: Variant) -> Vec<u16> {
    resources(variant).iter().map(|r| r.id).collect()
}

/// Look up a single resource definition.
pub fn lookup(variant: Variant, id: u16) -> Option<&'static ResourceDef> {
    resources(variant).iter().find(|r| r.id == id)
}

/// Capability of a resource, or `NotFound` for unknown ids.
pub fn capability(variant: Variant, id: u16) -> Result<Capability, AccessError> {
    lookup(variant, id)
        .map(|r| r.capability)
        .ok_or(AccessError::NotFound(id))
}

pub fn is_readable(variant: Variant, id: u16) -> bool {
    lookup(variant, id).map(|r| r.capability.read).unwrap_or(false)
}

pub fn is_writable(variant: Variant, id: u16) -> bool {
    lookup(variant, id).map(|r| r.capability.write).unwrap_or(false)
}

pub fn is_executable(variant: Variant, id: u16) -> bool {
    lookup(variant, id)
        .map(|r| r.capability.execute)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_ids_ordered() {
        assert_eq!(
            supported_resource_ids(Variant::Firmware),
            vec![0, 1, 2, 3, 5, 6, 7, 9]
        );
        assert_eq!(
            supported_resource_ids(Variant::Software),
            vec![0, 1, 2, 3, 4, 7, 9]
        );
        assert_eq!(supported_resource_ids(Variant::Gateway), vec![0, 1, 2]);
        assert_eq!(
            supported_resource_ids(Variant::Container),
            vec![0, 1, 2, 3, 4, 5]
        );
    }

    #[test]
    fn test_capabilities() {
        assert!(is_writable(Variant::Firmware, 1));
        assert!(is_executable(Variant::Firmware, 2));
        assert!(!is_readable(Variant::Firmware, 2));
        assert!(is_readable(Variant::Firmware, 3));
        assert!(!is_writable(Variant::Firmware, 3));

        assert!(is_executable(Variant::Software, 4));
        assert!(is_writable(Variant::Software, 2));

        // Gateway is entirely read-only.
        for def in resources(Variant::Gateway) {
            assert!(def.capability.read);
            assert!(!def.capability.write);
            assert!(!def.capability.execute);
        }
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        assert_eq!(
            capability(Variant::Firmware, 42),
            Err(AccessError::NotFound(42))
        );
        assert!(!is_readable(Variant::Gateway, 99));
    }

    #[test]
    fn test_object_ids() {
        assert_eq!(Variant::Firmware.object_id(), 5);
        assert_eq!(Variant::Software.object_id(), 9);
        assert_eq!(Variant::Gateway.object_id(), 25);
        assert_eq!(Variant::Container.object_id(), 19);
    }
}
