// CLI behavior: stdout output, jq filtering, error reporting and exit codes.
// Requires: assert_cmd, predicates crates in [dev-dependencies]

use std::fs;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

fn idl_ir() -> Command {
    Command::cargo_bin("idl-ir").unwrap()
}

#[test]
fn translate_prints_ir_to_stdout() {
    let output = idl_ir()
        .args(["translate", "-i", "fixtures/no_module.mojom.tree.json", "--compact"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["name"], "no_module.mojom");
    assert_eq!(doc["namespace"], "");
    assert_eq!(doc["structs"][0]["name"], "Empty");
}

#[test]
fn name_flag_overrides_logical_name() {
    idl_ir()
        .args(["translate", "-i", "fixtures/no_module.mojom.tree.json", "--name", "renamed.mojom"])
        .assert()
        .success()
        .stdout(contains("\"name\": \"renamed.mojom\""));
}

#[test]
fn jq_filter_projects_each_document() {
    idl_ir()
        .args([
            "translate",
            "-i",
            "fixtures/sample_service.mojom.tree.json",
            "--compact",
            "--jq-expr",
            "[.interfaces[].methods[].name]",
        ])
        .assert()
        .success()
        .stdout(contains(r#"["Frobinate","GetPort","Query","PostMessage"]"#));
}

#[test]
fn failing_file_sets_exit_code_and_names_the_file() {
    idl_ir()
        .args([
            "translate",
            "-i",
            "fixtures/no_module.mojom.tree.json",
            "fixtures/array_of_fixed_array.mojom.tree.json",
        ])
        .assert()
        .failure()
        .stdout(contains("no_module.mojom"))
        .stderr(
            contains("array_of_fixed_array.mojom.tree.json")
                .and(contains("array of fixed-size array unsupported"))
                .and(contains("1 of 2 file(s) failed")),
        );
}

#[test]
fn duplicate_attributes_can_be_allowed() {
    idl_ir()
        .args(["translate", "-i", "fixtures/duplicate_attribute.mojom.tree.json"])
        .assert()
        .failure()
        .stderr(contains("duplicate attribute key `Client`"));

    idl_ir()
        .args([
            "translate",
            "-i",
            "fixtures/duplicate_attribute.mojom.tree.json",
            "--allow-duplicate-attributes",
        ])
        .assert()
        .success()
        .stdout(contains("\"Client\": \"B\""));
}

#[test]
fn out_dir_receives_one_file_per_input() {
    let dir = std::env::temp_dir().join(format!("idl-ir-cli-{}", std::process::id()));
    idl_ir()
        .args(["translate", "-i", "fixtures/no_module.mojom.tree.json", "-o"])
        .arg(&dir)
        .assert()
        .success();
    let written = fs::read_to_string(dir.join("no_module.mojom.ir.json")).unwrap();
    assert!(written.contains("\"namespace\": \"\""));
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn kind_encodes_and_decodes() {
    idl_ir()
        .args(["kind", "int32[10]", "Foo&"])
        .assert()
        .success()
        .stdout("int32[10]\ta10:i32\nFoo&\tr:x:Foo\n");

    idl_ir()
        .args(["kind", "--decode", "a:h:d:c"])
        .assert()
        .success()
        .stdout("a:h:d:c\thandle<data_pipe_consumer>[]\n");
}

#[test]
fn kind_rejects_nested_fixed_arrays() {
    idl_ir()
        .args(["kind", "int32[5][10]"])
        .assert()
        .failure()
        .stderr(contains("fixed-size array of array unsupported"));
}

#[test]
fn bad_jq_expression_fails_before_translating() {
    idl_ir()
        .args(["translate", "-i", "fixtures/no_module.mojom.tree.json", "--jq-expr", ".structs["])
        .assert()
        .failure()
        .stdout("")
        .stderr(contains("cannot parse jq filter"));
}
