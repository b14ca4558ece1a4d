//! CLI: JSON syntax trees → IR documents, plus a kind encoder/decoder.
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use tracing::{debug, info};

use idl_ir::config::{DuplicateAttributes, TranslateOptions};
use idl_ir::ir::Document;
use idl_ir::kind::{self, Kind};
use idl_ir::translate::Translator;

use crate::jq_exec::JqFilter;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// translate parsed IDL syntax trees (JSON) into the IR consumed by code generators
#[derive(Parser, Debug)]
#[command(name = "idl-ir", version)]
pub struct CommandLineInterface {
    /// more logging on stderr (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// translate syntax trees and emit IR documents
    Translate(TranslateOut),
    /// encode surface type expressions into kinds (or decode kinds)
    Kind(KindArgs),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// logical file name recorded in the IR (single input only);
    /// defaults to the input file name minus a trailing `.json` / `.tree.json`
    #[arg(long)]
    name: Option<String>,
}

#[derive(clap::Parser, Debug)]
struct TranslateOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output directory, one `<name>.ir.json` per input (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// jq filter applied to each IR document before output
    #[arg(long)]
    jq_expr: Option<String>,

    /// keep the last value of a repeated attribute key instead of failing
    #[arg(long, default_value_t = false)]
    allow_duplicate_attributes: bool,

    /// single-line JSON output
    #[arg(long, default_value_t = false)]
    compact: bool,
}

#[derive(clap::Parser, Debug)]
struct KindArgs {
    /// treat arguments as canonical kinds and print their surface syntax
    #[arg(long, default_value_t = false)]
    decode: bool,

    /// type expressions (or kinds with --decode)
    #[arg(required = true)]
    types: Vec<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Translate(target) => target.run(),
            Command::Kind(target) => target.run(),
        }
    }
}

impl TranslateOut {
    fn options(&self) -> TranslateOptions {
        let policy = if self.allow_duplicate_attributes {
            DuplicateAttributes::LastWins
        } else {
            DuplicateAttributes::Reject
        };
        TranslateOptions::new().with_duplicate_attributes(policy)
    }

    fn run(&self) -> Result<()> {
        let settings = &self.input_settings;
        let source_paths = resolve_file_path_patterns(&settings.input)?;
        if settings.name.is_some() && source_paths.len() != 1 {
            bail!("--name needs exactly one input, got {}", source_paths.len());
        }

        let filter = self
            .jq_expr
            .as_deref()
            .map(JqFilter::compile)
            .transpose()?;
        let translator = Translator::new(self.options());
        debug!(files = source_paths.len(), options = ?translator.options(), "translating");

        // files are independent; output keeps input order
        let results: Vec<(&PathBuf, Result<Document>)> = source_paths
            .par_iter()
            .map(|path| (path, translate_file(&translator, path, settings.name.as_deref())))
            .collect();

        let total = results.len();
        let mut failures = 0usize;
        for (path, result) in results {
            let outcome = result.and_then(|doc| self.emit(&doc, filter.as_ref()));
            if let Err(error) = outcome {
                failures += 1;
                eprintln!("{} {}: {error:#}", "error:".red().bold(), path.display());
            }
        }

        if failures > 0 {
            bail!("{failures} of {total} file(s) failed");
        }
        Ok(())
    }

    fn emit(&self, doc: &Document, filter: Option<&JqFilter>) -> Result<()> {
        let value = serde_json::to_value(doc)?;
        let outputs = match filter {
            None => vec![value],
            Some(filter) => filter
                .apply(&value)
                .with_context(|| format!("failed to apply jq expression to `{}`", doc.name))?,
        };

        let mut rendered = Vec::with_capacity(outputs.len());
        for output in &outputs {
            rendered.push(if self.compact {
                serde_json::to_string(output)?
            } else {
                serde_json::to_string_pretty(output)?
            });
        }
        let text = rendered.join("\n");

        match self.out.as_ref() {
            Some(dir) => {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create {}", dir.display()))?;
                let dest = dir.join(format!("{}.ir.json", doc.name));
                std::fs::write(&dest, format!("{text}\n"))
                    .with_context(|| format!("failed to write {}", dest.display()))?;
                info!(dest = %dest.display(), "wrote IR");
            }
            None => println!("{text}"),
        }
        Ok(())
    }
}

impl KindArgs {
    fn run(&self) -> Result<()> {
        let mut failures = 0usize;
        for raw in &self.types {
            let converted = if self.decode {
                raw.parse::<Kind>().map(|k| k.surface()).map_err(anyhow::Error::from)
            } else {
                kind::encode(raw).map(|k| k.to_string()).map_err(anyhow::Error::from)
            };
            match converted {
                Ok(text) => println!("{raw}\t{text}"),
                Err(error) => {
                    failures += 1;
                    eprintln!("{} {error}", "error:".red().bold());
                }
            }
        }
        if failures > 0 {
            bail!("{failures} of {} type(s) rejected", self.types.len());
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn translate_file(translator: &Translator, path: &Path, name: Option<&str>) -> Result<Document> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let name = name.map(str::to_string).unwrap_or_else(|| logical_name(path));
    info!(path = %path.display(), logical_name = %name, "translate");
    let doc = translator.translate_json(&source, &name)?;
    Ok(doc)
}

/// `dir/foo.mojom.json` and `dir/foo.mojom.tree.json` → `foo.mojom`
fn logical_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = file_name.strip_suffix(".json").unwrap_or(&file_name);
    stem.strip_suffix(".tree").unwrap_or(stem).to_string()
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            let entries = glob::glob(pattern)
                .with_context(|| format!("bad glob pattern: {pattern}"))?;
            for entry in entries {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_name_strips_json_suffix() {
        assert_eq!(logical_name(Path::new("trees/foo.mojom.json")), "foo.mojom");
        assert_eq!(logical_name(Path::new("fixtures/baz.mojom.tree.json")), "baz.mojom");
        assert_eq!(logical_name(Path::new("bar.mojom")), "bar.mojom");
    }

    #[test]
    fn literal_paths_pass_through() {
        let paths = resolve_file_path_patterns(["a.json", "b/c.json"]).unwrap();
        assert_eq!(paths, [PathBuf::from("a.json"), PathBuf::from("b/c.json")]);
    }

    #[test]
    fn empty_glob_is_an_error() {
        assert!(resolve_file_path_patterns(["/nonexistent-dir-for-test/*.json"]).is_err());
    }
}
