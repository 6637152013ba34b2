#![cfg(not(target_arch = "wasm32"))]

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("nvme-compliance").unwrap();
    cmd.env("RUST_LOG", "warn");
    cmd
}

#[test]
fn qids_prints_boundary_identifiers() {
    cli()
        .args(["qids", "--max-supported", "1", "--max-id", "16"])
        .assert()
        .success()
        .stdout("1\n2\n3\n4\n5\n7\n8\n9\n15\n16\n");
}

#[test]
fn qids_saturated_space_prints_nothing() {
    cli()
        .args(["qids", "--max-supported", "16", "--max-id", "16"])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn builtin_register_table_passes() {
    cli()
        .arg("registers")
        .assert()
        .success()
        .stdout(predicate::str::contains("registers: PASS (12 registers, revision 1.0b)"));
}

#[test]
fn leaked_ro_bit_fails_with_the_offending_bit() {
    cli()
        .args(["registers", "--leak-ro", "0x08:0x100"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("VS RO bit #8 has incorrect value"));
}

#[test]
fn skipping_write_probes_hides_a_leaked_bit() {
    cli()
        .args(["registers", "--leak-ro", "0x08:0x100", "--skip-write-probes"])
        .assert()
        .success();
}

#[test]
fn register_map_file_is_loaded() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("map.json");
    fs::write(
        &path,
        r#"{ "revision": "1.1", "registers": [
            { "desc": "CC", "offset": "0x14", "size": 4, "read_only": "0xff00000e" }
        ] }"#,
    )
    .unwrap();

    cli()
        .args(["registers", "--revision", "1.1", "--map"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("registers: PASS (1 registers, revision 1.1)"));
}

#[test]
fn bad_leak_argument_is_rejected() {
    cli()
        .args(["registers", "--leak-ro", "0x08"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected OFFSET:MASK"));
}

#[test]
fn invalid_qid_scenario_passes_on_a_compliant_controller() {
    cli()
        .arg("invalid-qid")
        .assert()
        .success()
        .stdout(predicate::str::contains("invalid-qid: PASS"));
}

#[test]
fn invalid_qid_scenario_catches_a_permissive_controller() {
    cli()
        .args(["invalid-qid", "--accept-any-qid"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("QID 1: expected invalid queue identifier"));
}

#[test]
fn revision_with_no_registers_is_not_a_pass() {
    cli()
        .args(["registers", "--revision", "1.1"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("PASS").not())
        .stderr(predicate::str::contains("no register in the map applies to revision 1.1"));
}

#[test]
fn leak_outside_the_register_space_is_rejected() {
    cli()
        .args(["registers", "--leak-ro", "0xffffffffffffffff:0xff"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is outside the 0xf00-byte register space"));
}

#[test]
fn far_register_map_fails_cleanly() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("far.json");
    fs::write(
        &path,
        r#"{ "revision": "1.0b", "registers": [
            { "desc": "FAR", "offset": "0x7fff_ffff_ffff_0000", "size": 8 }
        ] }"#,
    )
    .unwrap();

    cli()
        .args(["registers", "--map"])
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("build simulated register space"))
        .stderr(predicate::str::contains("past the 0x10000-byte simulated space"));
}
