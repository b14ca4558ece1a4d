//! Golden runner: `fixtures/<name>.tree.json` is translated under the logical
//! name `<name>` and checked against `<name>.ir.json` (expected document) or
//! `<name>.err` (regex over `<ErrorClass>: <message>`).
//!
//!     cargo run -p dev-test-runner -- [--fixtures DIR]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use idl_ir::ir::Document;
use regex::Regex;

const TREE_SUFFIX: &str = ".tree.json";

/// run the golden fixtures through the translator
#[derive(Parser, Debug)]
struct Args {
    /// directory holding `<name>.tree.json` inputs and their expectations
    #[arg(long, default_value = concat!(env!("CARGO_MANIFEST_DIR"), "/../fixtures"))]
    fixtures: PathBuf,
}

enum Outcome {
    Pass,
    Fail(String),
}

fn main() -> ExitCode {
    let dir = Args::parse().fixtures;

    let mut cases = match collect_cases(&dir) {
        Ok(cases) => cases,
        Err(error) => {
            eprintln!("cannot read {}: {error}", dir.display());
            return ExitCode::FAILURE;
        }
    };
    cases.sort();

    let mut failed = 0;
    for (name, tree_path) in &cases {
        match run_case(&dir, name, tree_path) {
            Outcome::Pass => println!("PASS {name}"),
            Outcome::Fail(why) => {
                failed += 1;
                println!("FAIL {name}\n{why}");
            }
        }
    }
    println!("{} passed, {failed} failed", cases.len() - failed);
    if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn collect_cases(dir: &Path) -> Result<Vec<(String, PathBuf)>, String> {
    let pattern = dir.join(format!("*{TREE_SUFFIX}"));
    let entries = glob::glob(&pattern.to_string_lossy()).map_err(|e| e.to_string())?;
    let mut out = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| e.to_string())?;
        let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        if let Some(name) = file_name.strip_suffix(TREE_SUFFIX) {
            out.push((name.to_string(), path));
        }
    }
    Ok(out)
}

fn run_case(dir: &Path, name: &str, tree_path: &Path) -> Outcome {
    let source = match std::fs::read_to_string(tree_path) {
        Ok(x) => x,
        Err(error) => return Outcome::Fail(format!("  read: {error}")),
    };
    let actual = idl_ir::translate_json(&source, name);

    let ir_path = dir.join(format!("{name}.ir.json"));
    let err_path = dir.join(format!("{name}.err"));

    if ir_path.exists() {
        let expected = match load_expected(&ir_path) {
            Ok(x) => x,
            Err(error) => return Outcome::Fail(format!("  bad expectation: {error}")),
        };
        return match actual {
            Ok(doc) if doc == expected => Outcome::Pass,
            Ok(doc) => Outcome::Fail(format!(
                "  expected:\n{}\n  actual:\n{}",
                serde_json::to_string_pretty(&expected).unwrap_or_default(),
                serde_json::to_string_pretty(&doc).unwrap_or_default(),
            )),
            Err(error) => Outcome::Fail(format!("  unexpected error: {error}")),
        };
    }

    if err_path.exists() {
        let pattern = match std::fs::read_to_string(&err_path) {
            Ok(x) => x,
            Err(error) => return Outcome::Fail(format!("  read: {error}")),
        };
        let rx = match Regex::new(pattern.trim()) {
            Ok(x) => x,
            Err(error) => return Outcome::Fail(format!("  bad pattern: {error}")),
        };
        return match actual {
            Ok(_) => Outcome::Fail(format!("  expected an error matching /{}/", rx.as_str())),
            Err(error) => {
                let line = format!("{}: {error}", error.class());
                if rx.is_match(&line) {
                    Outcome::Pass
                } else {
                    Outcome::Fail(format!("  error `{line}` does not match /{}/", rx.as_str()))
                }
            }
        };
    }

    Outcome::Fail("  no .ir.json or .err expectation".to_string())
}

/// Expected documents go through the IR's own deserializer, so malformed
/// kinds in a fixture are reported with their JSON path.
fn load_expected(path: &Path) -> Result<Document, String> {
    let src = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let de = &mut serde_json::Deserializer::from_str(&src);
    serde_path_to_error::deserialize::<_, Document>(de).map_err(|err| {
        let path = err.path().to_string();
        format!("at JSON path {path} → {}", err.into_inner())
    })
}
