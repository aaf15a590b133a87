//! Device description parsing and capability query tests.

use crate::{ComputeCapability, DeviceDescription, Error};

#[test]
fn empty_text_means_no_features() {
    let device = DeviceDescription::from_text("").unwrap();
    assert_eq!(device, DeviceDescription::default());
    assert!(!device.supports_tma());

    let device = DeviceDescription::from_text("   \n").unwrap();
    assert!(!device.supports_tma());
}

#[test]
fn parses_full_record() {
    let text = r#"{
        "name": "H100 SXM",
        "compute_capability": { "major": 9, "minor": 0 },
        "global_memory_bytes": 85899345920,
        "shared_memory_per_block": 232448,
        "core_count": 132
    }"#;
    let device = DeviceDescription::from_text(text).unwrap();
    assert_eq!(device.name, "H100 SXM");
    assert_eq!(device.compute_capability, ComputeCapability::new(9, 0));
    assert!(device.supports_tma());
}

#[test]
fn missing_fields_default() {
    let device = DeviceDescription::from_text(r#"{ "core_count": 108 }"#).unwrap();
    assert_eq!(device.core_count, 108);
    assert_eq!(device.compute_capability, ComputeCapability::default());
    assert!(!device.supports_tma());
}

#[test]
fn malformed_text_is_a_config_error() {
    let result = DeviceDescription::from_text("compute_capability: 9.0");
    assert!(matches!(result, Err(Error::MalformedDescriptor { .. })));
}

#[test]
fn capability_ordering() {
    let ampere = ComputeCapability::new(8, 6);
    let hopper = ComputeCapability::HOPPER;
    assert!(hopper.is_at_least(ampere));
    assert!(!ampere.is_at_least(hopper));
    assert!(ComputeCapability::new(10, 0).is_at_least(hopper));
    assert!(hopper.is_at_least(hopper));
}
