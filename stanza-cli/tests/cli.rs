//! Integration tests for the stanza CLI commands.

mod common;

use common::TestEnv;
use predicates::prelude::*;

// ============================================================================
// print
// ============================================================================

#[test]
fn test_print_text_follows_includes() {
    let env = TestEnv::with_sample();

    env.command()
        .arg("print")
        .arg(env.file("main.conf"))
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "NFS_Core_Param {\n    NFS_Port = 2049;\n    Protocols = 3, 4;\n}\nEXPORT {\n",
        ))
        .stdout(predicate::str::contains(
            "    CLIENT {\n        Clients = \"10.0.0.0/8\";\n        Access_Type = RO;\n    }\n",
        ))
        .stdout(predicate::str::contains("# main configuration").not());
}

#[test]
fn test_print_output_parses_back() {
    let env = TestEnv::with_sample();

    let output = env
        .command()
        .arg("print")
        .arg("--indent")
        .arg("2")
        .arg(env.file("main.conf"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let printed = env.write("printed.conf", &String::from_utf8(output.stdout).unwrap());
    env.command()
        .arg("get")
        .arg(&printed)
        .arg("export::path")
        .assert()
        .success()
        .stdout("/srv/a\n");
}

#[test]
fn test_print_json() {
    let env = TestEnv::with_sample();

    let output = env
        .command()
        .arg("print")
        .arg("--format")
        .arg("json")
        .arg(env.file("main.conf"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["files"].as_array().unwrap().len(), 2);
    assert_eq!(json["items"].as_array().unwrap().len(), 3);
    assert_eq!(json["items"][1]["kind"], "block");
    assert_eq!(json["items"][1]["name"], "EXPORT");
    assert!(json["items"][1]["file"].as_str().unwrap().ends_with("exports.conf"));
    assert_eq!(json["items"][0]["children"][1]["values"][1]["text"], "4");
}

#[test]
fn test_print_yaml_from_env() {
    let env = TestEnv::with_sample();

    env.command()
        .env("STANZA_OUTPUT_FORMAT", "YAML")
        .arg("print")
        .arg(env.file("main.conf"))
        .assert()
        .success()
        .stdout(predicate::str::contains("kind: block"))
        .stdout(predicate::str::contains("name: NFS_Core_Param"));
}

#[test]
fn test_print_rejects_unknown_format() {
    let env = TestEnv::with_sample();

    env.command()
        .arg("print")
        .arg("--format")
        .arg("xml")
        .arg(env.file("main.conf"))
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("invalid value"));
}

// ============================================================================
// get
// ============================================================================

#[test]
fn test_get_statement_value() {
    let env = TestEnv::with_sample();

    env.command()
        .arg("get")
        .arg(env.file("main.conf"))
        .arg("nfs_core_param::PROTOCOLS")
        .assert()
        .success()
        .stdout("3, 4\n");
}

#[test]
fn test_get_block_prints_subtree() {
    let env = TestEnv::with_sample();

    env.command()
        .arg("get")
        .arg(env.file("main.conf"))
        .arg("EXPORT::CLIENT")
        .assert()
        .success()
        .stdout("CLIENT {\n    Clients = \"10.0.0.0/8\";\n    Access_Type = RO;\n}\n");
}

#[test]
fn test_get_show_location() {
    let env = TestEnv::with_sample();

    env.command()
        .arg("get")
        .arg("--show-location")
        .arg(env.file("main.conf"))
        .arg("EXPORT::Export_Id")
        .assert()
        .success()
        .stdout("1\n")
        .stderr(predicate::str::contains("exports.conf:2"));
}

#[test]
fn test_get_missing_name() {
    let env = TestEnv::with_sample();

    env.command()
        .arg("get")
        .arg(env.file("main.conf"))
        .arg("EXPORT::Squash")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not found: EXPORT::Squash"));
}

// ============================================================================
// find
// ============================================================================

#[test]
fn test_find_nested_block() {
    let env = TestEnv::with_sample();

    env.command()
        .arg("find")
        .arg(env.file("main.conf"))
        .arg("EXPORT(Export_Id = 2).CLIENT(Clients = *)")
        .assert()
        .success()
        .stdout(predicate::str::contains("exports.conf:9\tCLIENT"))
        .stderr(predicate::str::contains("1 matching block(s)"));
}

#[test]
fn test_find_wildcard_all_exports() {
    let env = TestEnv::with_sample();

    let output = env
        .command()
        .arg("--quiet")
        .arg("find")
        .arg(env.file("main.conf"))
        .arg("export(path = *)")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(output.stderr.is_empty());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("exports.conf:1\tEXPORT"));
    assert!(lines[1].ends_with("exports.conf:6\tEXPORT"));
}

#[test]
fn test_find_print_blocks() {
    let env = TestEnv::with_sample();

    env.command()
        .arg("find")
        .arg("--print")
        .arg(env.file("main.conf"))
        .arg("EXPORT(Export_Id = 2).CLIENT(Access_Type = rw)")
        .assert()
        .success()
        .stdout("CLIENT {\n    Clients = \"*\";\n    Access_Type = RW;\n}\n");
}

#[test]
fn test_find_no_match() {
    let env = TestEnv::with_sample();

    env.command()
        .arg("find")
        .arg(env.file("main.conf"))
        .arg("EXPORT(Export_Id = 7)")
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_find_bad_expression() {
    let env = TestEnv::with_sample();

    env.command()
        .arg("find")
        .arg(env.file("main.conf"))
        .arg("EXPORT(Export_Id = ")
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("invalid search expression"));
}

// ============================================================================
// check
// ============================================================================

#[test]
fn test_check_ok() {
    let env = TestEnv::with_sample();

    env.command()
        .arg("check")
        .arg(env.file("main.conf"))
        .assert()
        .success()
        .stdout(predicate::str::contains("OK (3 top-level items from 2 file(s))"));
}

#[test]
fn test_check_quiet_prints_nothing() {
    let env = TestEnv::with_sample();

    env.command()
        .arg("check")
        .arg("--quiet")
        .arg(env.file("main.conf"))
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_check_parse_error() {
    let env = TestEnv::new();
    let path = env.write("bad.conf", "A = 1;\nB = 2\nC = 3;\n");

    env.command()
        .arg("check")
        .arg(&path)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("ERROR: Config File ("))
        .stderr(predicate::str::contains("bad.conf:"))
        .stderr(predicate::str::contains("Error: parse error at"));
}

#[test]
fn test_check_unterminated_string() {
    let env = TestEnv::new();
    let path = env.write("bad.conf", "A = \"never closed;\n");

    env.command()
        .arg("check")
        .arg(&path)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("scan error"));
}

#[test]
fn test_check_missing_include() {
    let env = TestEnv::new();
    let path = env.write("main.conf", "A = 1;\n%include \"gone.conf\"\n");

    env.command()
        .arg("check")
        .arg(&path)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("gone.conf"));
}

#[test]
fn test_check_missing_file() {
    let env = TestEnv::new();

    env.command()
        .arg("check")
        .arg(env.file("absent.conf"))
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("File not found"));
}

// ============================================================================
// Global options and exit codes
// ============================================================================

#[test]
fn test_print_missing_file_is_io_error() {
    let env = TestEnv::new();

    env.command()
        .arg("print")
        .arg(env.file("absent.conf"))
        .assert()
        .failure()
        .code(5);
}

#[test]
fn test_include_dir_flag() {
    let env = TestEnv::new();
    env.write("shared/log.conf", "LOG { Default_Log_Level = EVENT; }\n");
    let main = env.write("etc/main.conf", "%include \"log.conf\"\n");

    env.command().arg("check").arg(&main).assert().code(2);

    env.command()
        .arg("--include-dir")
        .arg(env.path().join("shared"))
        .arg("get")
        .arg(&main)
        .arg("LOG::Default_Log_Level")
        .assert()
        .success()
        .stdout("EVENT\n");
}

#[test]
fn test_include_dir_from_env() {
    let env = TestEnv::new();
    env.write("shared/log.conf", "LOG { Default_Log_Level = EVENT; }\n");
    let main = env.write("etc/main.conf", "%include \"log.conf\"\n");

    env.command()
        .env("STANZA_INCLUDE_DIR", env.path().join("shared"))
        .arg("check")
        .arg(&main)
        .assert()
        .success();
}

#[test]
fn test_missing_include_dir() {
    let env = TestEnv::with_sample();

    env.command()
        .arg("--include-dir")
        .arg(env.file("nowhere"))
        .arg("check")
        .arg(env.file("main.conf"))
        .assert()
        .failure()
        .code(4);
}

#[test]
fn test_bad_depth_env_is_invalid_argument() {
    let env = TestEnv::with_sample();

    env.command()
        .env("STANZA_MAX_INCLUDE_DEPTH", "deep")
        .arg("check")
        .arg(env.file("main.conf"))
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("STANZA_MAX_INCLUDE_DEPTH"));
}

#[test]
fn test_help_lists_commands() {
    let env = TestEnv::new();

    env.command()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("print"))
        .stdout(predicate::str::contains("get"))
        .stdout(predicate::str::contains("find"))
        .stdout(predicate::str::contains("check"));
}
