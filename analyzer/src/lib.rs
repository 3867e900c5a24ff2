pub mod config;
pub mod grader;
pub mod overlap;
pub mod query;
pub mod report;
pub mod scanner;

pub use config::AnalyzerConfig;
pub use report::{Category, Grade, GraderResult, Report, ScanError, Tip, TipKind};

use sb3::{Project, RawProject};

/// Everything a rule needs to look at: the raw block graph for structural
/// queries, the parsed project for script text and placement, and the
/// injectable thresholds/name tables.
pub struct Analysis<'a> {
    pub raw: &'a RawProject,
    pub project: &'a Project,
    pub config: &'a AnalyzerConfig,
}

impl<'a> Analysis<'a> {
    pub fn new(raw: &'a RawProject, project: &'a Project, config: &'a AnalyzerConfig) -> Self {
        Analysis {
            raw,
            project,
            config,
        }
    }
}

/// Run the whole pipeline over an already-parsed project.
pub fn analyze(analysis: &Analysis) -> Report {
    let grades = grader::grade_project(analysis);
    let total_grade = grader::total_grade(&grades);
    let max_grade = grader::max_grade(&grades);
    let (warnings, mut skipped) = scanner::scan_for_warnings(analysis);
    let (errors, skipped_errors) = scanner::scan_for_errors(analysis);
    skipped.extend(skipped_errors);
    Report {
        grades,
        total_grade,
        max_grade,
        warnings,
        errors,
        skipped_rules: skipped,
    }
}
