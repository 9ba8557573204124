//! Load, publicize and write modules through the public API only.

#[path = "../src/test/image.rs"]
mod image;

use image::{ImageBuilder, TypeSpec};
use publicizer::prelude::*;
use tempfile::tempdir;

#[test]
fn scenario_end_to_end() {
    let temp_dir = tempdir().unwrap();
    let input = temp_dir.path().join("Scenario.dll");
    std::fs::write(&input, ImageBuilder::scenario().checksum().build()).unwrap();

    let mut module = Module::from_file(&input).unwrap();
    let stats = publicize(&mut module, &PublicizeOptions::default());
    assert_eq!((stats.types, stats.methods, stats.fields), (2, 1, 1));

    let output = temp_dir.path().join("out").join("Scenario_publicized.dll");
    let report = write_module_to_file(&module, &output, &WriteOptions::default()).unwrap();
    assert_eq!(report.strategy, WriteStrategy::Managed);
    assert!(report.warnings.is_empty());

    let reloaded = Module::from_file(&output).unwrap();
    let a = &reloaded.types()[0];
    let a = a.as_ref().unwrap();
    assert_eq!(a.full_name(), "Demo.A");
    assert_eq!(a.visibility(), TypeVisibility::Public);
    assert_eq!(a.nested_types[0].as_ref().unwrap().visibility(), TypeVisibility::NestedPublic);
    assert_eq!(a.methods[0].as_ref().unwrap().access(), MemberAccess::Public);
    assert_eq!(a.fields[0].as_ref().unwrap().access(), MemberAccess::Public);
    assert_eq!(reloaded.file().checksum(), report.checksum.unwrap());
}

#[test]
fn second_pass_changes_nothing() {
    let temp_dir = tempdir().unwrap();
    let first = temp_dir.path().join("first.dll");
    let second = temp_dir.path().join("second.dll");

    let mut module = Module::from_mem(ImageBuilder::scenario().with_module_type().build()).unwrap();
    publicize(&mut module, &PublicizeOptions::default());
    write_module_to_file(&module, &first, &WriteOptions::default()).unwrap();

    let mut module = Module::from_file(&first).unwrap();
    assert_eq!(publicize(&mut module, &PublicizeOptions::default()).total(), 0);
    let report = write_module_to_file(&module, &second, &WriteOptions::default()).unwrap();

    assert_eq!(report.rows_changed, 0);
    assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
}

#[test]
fn non_visibility_bits_and_order_survive() {
    let image = ImageBuilder::new()
        .with_module_type()
        .ty(TypeSpec::new("Service", 0x0010_0180)
            .namespace("Core")
            .method("Start", 0x01C3)
            .method("Stop", 0x0044)
            .field("instance", 0x0031))
        .build();
    let mut module = Module::from_mem(image).unwrap();
    publicize(&mut module, &PublicizeOptions { parallel: true });

    let service = module.types()[1].as_ref().unwrap();
    assert_eq!(service.flags, 0x0010_0181);
    let methods: Vec<(&str, u16)> = service
        .methods
        .iter()
        .filter_map(Slot::as_ref)
        .map(|method| (method.name.as_str(), method.flags))
        .collect();
    assert_eq!(methods, [("Start", 0x01C6), ("Stop", 0x0046)]);
    assert_eq!(service.fields[0].as_ref().unwrap().flags, 0x0036);
}
