mod catalog;

use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use analyzer::{Analysis, AnalyzerConfig, Report, Tip, TipKind};
use sb3::RawProject;

const SUBCOMMANDS: &[&str] = &["analyze", "help"];

#[derive(Parser)]
#[command(name = "sb3check", version, about = "Block-program analyzer and grader")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a project file and report grades and diagnostics
    Analyze(AnalyzeArgs),
}

#[derive(clap::Args)]
struct AnalyzeArgs {
    /// Project JSON file (the project.json of an .sb3 archive)
    file: String,

    /// Parse only, don't analyze (exit 0 if valid)
    #[arg(long)]
    check: bool,

    /// Print the extracted scripts in canonical notation and exit
    #[arg(long)]
    scripts: bool,

    /// Emit the full report as JSON instead of human-readable text
    #[arg(long)]
    json: bool,

    /// TOML file overriding analysis thresholds
    #[arg(short, long)]
    config: Option<String>,
}

fn main() {
    // Backwards compatibility: if the first positional arg is not a known
    // subcommand, inject "analyze" so `sb3check project.json` works like
    // `sb3check analyze project.json`.
    let mut args: Vec<String> = std::env::args().collect();
    if let Some(first_pos) = args.iter().skip(1).find(|a| !a.starts_with('-')) {
        let first_pos = first_pos.clone();
        if !SUBCOMMANDS.contains(&first_pos.as_str()) {
            let pos = args.iter().position(|a| *a == first_pos).unwrap();
            args.insert(pos, "analyze".to_string());
        }
    }

    let cli = Cli::parse_from(&args);

    match cli.command {
        Command::Analyze(analyze_args) => do_analyze(analyze_args, cli.no_color),
    }
}

fn do_analyze(args: AnalyzeArgs, no_color: bool) {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    // Read source
    let source = match std::fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", args.file, e);
            process::exit(1);
        }
    };

    // Set up codespan file database
    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.clone(), source.clone());

    // Parse
    let raw: RawProject = match serde_json::from_str(&source) {
        Ok(raw) => raw,
        Err(e) => {
            let offset = byte_offset(&source, e.line(), e.column());
            let diagnostic = Diagnostic::error()
                .with_message(format!("invalid project JSON: {}", e))
                .with_labels(vec![Label::primary(file_id, offset..offset + 1)]);
            let writer = StandardStream::stderr(color_choice);
            let config = term::Config::default();
            let _ = term::emit_to_write_style(&mut writer.lock(), &config, &files, &diagnostic);
            process::exit(1);
        }
    };

    // --check: parse succeeded, exit
    if args.check {
        eprintln!("ok: {} parsed successfully", args.file);
        return;
    }

    let project = sb3::parse_project(&raw);

    // --scripts: print the canonical rendering
    if args.scripts {
        println!("{}", project.all_scripts);
        return;
    }

    let config = match &args.config {
        Some(path) => load_config(path),
        None => AnalyzerConfig::default(),
    };

    let analysis = Analysis::new(&raw, &project, &config);
    let report = analyzer::analyze(&analysis);

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("error: cannot serialize report: {}", e);
                process::exit(1);
            }
        }
    } else {
        print_grades(&report);
        emit_tips(&report, color_choice, &files);
    }

    if !report.errors.is_empty() {
        process::exit(1);
    }
}

fn load_config(path: &str) -> AnalyzerConfig {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: cannot read config '{}': {}", path, e);
            process::exit(1);
        }
    };
    match toml::from_str(&text) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: invalid config '{}': {}", path, e);
            process::exit(1);
        }
    }
}

fn print_grades(report: &Report) {
    for grade in &report.grades {
        println!(
            "{:<14} {}/{}",
            grade.category.as_str(),
            grade.result.grade.points(),
            grade.result.max_grade.points()
        );
    }
    println!("{:<14} {}/{}", "total", report.total_grade, report.max_grade);
}

fn emit_tips(report: &Report, color_choice: ColorChoice, files: &SimpleFiles<String, String>) {
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();
    for tip in report.warnings.iter().chain(report.errors.iter()) {
        let diagnostic = to_diagnostic(tip);
        let _ = term::emit_to_write_style(&mut writer.lock(), &config, files, &diagnostic);
    }
    for rule in &report.skipped_rules {
        eprintln!("note: rule '{}' failed and was skipped", rule);
    }
}

fn to_diagnostic(tip: &Tip) -> Diagnostic<usize> {
    let diagnostic = match tip.kind {
        TipKind::Warning => Diagnostic::warning(),
        TipKind::Error => Diagnostic::error(),
    };
    let title = catalog::resolve(&tip.title, &tip.payload);
    let message = catalog::resolve(&tip.message, &tip.payload);
    let mut notes = vec![message];
    if let Some(code) = &tip.code {
        notes.push(code.clone());
    }
    diagnostic.with_message(title).with_notes(notes)
}

/// Byte offset of a 1-based line/column pair, for pointing codespan at a
/// JSON parse error.
fn byte_offset(source: &str, line: usize, column: usize) -> usize {
    let mut offset = 0;
    for (index, text) in source.lines().enumerate() {
        if index + 1 == line {
            return (offset + column.saturating_sub(1)).min(source.len().saturating_sub(1));
        }
        offset += text.len() + 1;
    }
    source.len().saturating_sub(1)
}
