//! Command line front end: convert (schema → validators) and analyze (cycle report).
use std::path::{Path, PathBuf};
use std::sync::Arc;
use anyhow::{bail, Context as _};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;

use crate::analysis::{analyze, Analysis};
use crate::assemble::{translate, Conversion};
use crate::options::{Options, Policy};
use crate::schema::Document;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Convert JSON Schema `definitions` into validator declarations
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// convert every named type into validator declarations
    Convert(ConvertOut),
    /// print the cyclic / non-cyclic partition and the emission order
    Analyze(AnalyzeOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON Pointer to the node holding `definitions` in each document (e.g. /components)
    #[arg(long)]
    json_pointer: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct ConvertOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// JSON file with conversion options (camelCase keys); flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// back every type with its raw schema, not only the cyclic ones
    #[arg(long)]
    forward_schema: bool,

    /// `any` instead of `unknown` for untyped nodes
    #[arg(long)]
    use_any: bool,

    /// declare types as `TypeOf<typeof schema>` instead of structurally
    #[arg(long)]
    no_inline_types: bool,

    #[arg(long, value_enum)]
    unsupported: Option<Policy>,

    #[arg(long, value_enum)]
    missing_reference: Option<Policy>,

    /// output file, or directory when several inputs are given (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct AnalyzeOut {
    #[command(flatten)]
    input_settings: InputSettings,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn source_paths(&self) -> anyhow::Result<Vec<PathBuf>> {
        resolve_file_path_patterns(&self.input).context("failed to resolve input file paths")
    }

    fn load(&self, source_path: &Path) -> anyhow::Result<Document> {
        let source = std::fs::read_to_string(source_path)
            .with_context(|| format!("failed to read source file {}", source_path.display()))?;
        let json_value = crate::path_de::from_str_with_path::<serde_json::Value>(&source)
            .with_context(|| format!("failed to parse JSON source file {}", source_path.display()))?;
        let json_value = match self.json_pointer.as_deref() {
            None => &json_value,
            Some(pointer) => json_value
                .pointer(pointer)
                .with_context(|| format!("JSON pointer {pointer} not found in {}", source_path.display()))?,
        };
        let mut document = Document::from_json_schema(json_value)
            .with_context(|| format!("failed to read schema {}", source_path.display()))?;
        document.source = Some(Arc::from(source));
        Ok(document)
    }
}

impl ConvertOut {
    fn options(&self) -> anyhow::Result<Options> {
        let mut options = match self.config.as_ref() {
            Some(path) => {
                let src = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                Options::from_json_str(&src).with_context(|| format!("invalid config {}", path.display()))?
            }
            None => Options::default(),
        };
        options.forward_schema |= self.forward_schema;
        if self.use_any {
            options.use_unknown = false;
        }
        if self.no_inline_types {
            options.inline_types = false;
        }
        if let Some(policy) = self.unsupported {
            options.unsupported = policy;
        }
        if let Some(policy) = self.missing_reference {
            options.missing_reference = policy;
        }
        Ok(options)
    }

    fn convert_one(&self, options: &Options, source_path: &Path) -> anyhow::Result<Conversion> {
        let document = self.input_settings.load(source_path)?;
        let mut options = options.clone();
        options.source_filename = Some(source_path.display().to_string());
        let conversion = translate(&document, &options)
            .with_context(|| format!("failed to convert {}", source_path.display()))?;
        Ok(conversion)
    }

    fn write(&self, source_path: &Path, multiple: bool, source: &str) -> anyhow::Result<()> {
        let Some(out) = self.out.as_ref() else {
            println!("{source}");
            return Ok(());
        };
        let target = if multiple {
            let stem = source_path.file_stem().unwrap_or_default();
            out.join(stem).with_extension("ts")
        } else {
            out.clone()
        };
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(&target, source).with_context(|| format!("failed to write {}", target.display()))
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Convert(target) => {
                let options = target.options()?;
                let source_paths = target.input_settings.source_paths()?;
                let multiple = source_paths.len() > 1;

                // documents share nothing, so each converts independently
                let results: Vec<_> = source_paths
                    .par_iter()
                    .map(|path| (path, target.convert_one(&options, path)))
                    .collect();

                let mut failed = 0;
                for (path, result) in results {
                    match result {
                        Ok(conversion) => {
                            target.write(path, multiple, &conversion.output.to_source())?;
                            eprintln!(
                                "{} {} ({} converted, {} not converted)",
                                "✓".green(),
                                path.display(),
                                conversion.converted_types.len(),
                                conversion.not_converted_types.len(),
                            );
                        }
                        Err(error) => {
                            failed += 1;
                            eprintln!("{} {error:#}", "✗".red());
                        }
                    }
                }
                if failed > 0 {
                    bail!("{failed} input(s) failed to convert");
                }
                Ok(())
            }
            Command::Analyze(target) => {
                for path in target.input_settings.source_paths()? {
                    let document = target.input_settings.load(&path)?;
                    print_analysis(&path, &analyze(&document));
                }
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn print_analysis(path: &Path, analysis: &Analysis) {
    println!("{}", path.display().to_string().bold());
    println!("  {} {}", "cyclic:".yellow(), analysis.cyclic.join(", "));
    println!("  {} {}", "non-cyclic:".green(), analysis.non_cyclic.join(", "));
    if !analysis.missing.is_empty() {
        println!("  {} {}", "missing:".red(), analysis.missing.join(", "));
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
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
