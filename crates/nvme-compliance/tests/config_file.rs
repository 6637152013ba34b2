use std::fs;

use nvme_compliance::config::load_register_map;
use nvme_compliance::sim::{SimRegisterFile, MAX_SIM_EXTENT};
use nvme_compliance::{ComplianceValidator, ConfigError, DescriptorError, RegisterId, SpecRevision};
use tempfile::tempdir;

const MAP_JSON: &str = r#"{
    "revision": "1.0b",
    "registers": [
        { "desc": "VS", "offset": "0x08", "size": 4, "default": "0x0001_0000", "read_only": "0xffff_ffff" },
        { "desc": "CC", "offset": "0x14", "size": 4, "read_only": "0xff00_000e" },
        { "desc": "RES3", "offset": "0x38", "size": 3784, "read_only": "0xffff_ffff_ffff_ffff", "reserved": true }
    ]
}"#;

#[test]
fn loaded_map_drives_a_compliance_pass() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ctlspc.json");
    fs::write(&path, MAP_JSON).unwrap();

    let map = load_register_map(&path).unwrap();
    assert_eq!(map.len(), 3);
    assert_eq!(map.get(RegisterId(2)).unwrap().desc(), "RES3");

    let mut sim = SimRegisterFile::from_map(&map).unwrap();
    assert_eq!(sim.len(), 0xf00);
    ComplianceValidator::new(&map, &mut sim, SpecRevision::V1_0b)
        .run()
        .unwrap();
}

#[test]
fn missing_file_reports_its_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.json");

    let err = load_register_map(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
    assert!(err.to_string().contains("absent.json"), "{err}");
}

#[test]
fn far_register_is_refused_by_the_simulator() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("far.json");
    fs::write(
        &path,
        r#"{ "revision": "1.0b", "registers": [
            { "desc": "FAR", "offset": "0x7fff_ffff_ffff_0000", "size": 8 }
        ] }"#,
    )
    .unwrap();

    let map = load_register_map(&path).unwrap();
    let err = SimRegisterFile::from_map(&map).unwrap_err();
    assert_eq!(
        err,
        DescriptorError::ExtentTooLarge {
            extent: 0x7fff_ffff_ffff_0008,
            limit: MAX_SIM_EXTENT,
        }
    );
}

#[test]
fn ragged_wide_register_is_rejected_on_load() {
    let err = nvme_compliance::config::parse_register_map(
        r#"{ "revision": "1.0b", "registers": [ { "desc": "RAGGED", "offset": 64, "size": 11 } ] }"#,
    )
    .unwrap_err();
    assert!(
        matches!(
            err,
            ConfigError::Descriptor(DescriptorError::UnsupportedWidth { size: 11, .. })
        ),
        "{err:?}"
    );
}
