use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

/// A pedagogical grade for one category, 0 to 3 points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Grade {
    #[default]
    Zero,
    One,
    Two,
    Three,
}

impl Grade {
    pub fn points(self) -> u32 {
        self as u32
    }
}

impl Serialize for Grade {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.points())
    }
}

/// The competency categories of the rubric, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Flow,
    Data,
    Logic,
    Parallel,
    Abstraction,
    Sync,
    Interactivity,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Flow,
        Category::Data,
        Category::Logic,
        Category::Parallel,
        Category::Abstraction,
        Category::Sync,
        Category::Interactivity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Flow => "flow",
            Category::Data => "data",
            Category::Logic => "logic",
            Category::Parallel => "parallel",
            Category::Abstraction => "abstraction",
            Category::Sync => "sync",
            Category::Interactivity => "interactivity",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grade plus the ceiling it was measured against, so consumers can sum
/// achievable points correctly.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GraderResult {
    pub grade: Grade,
    pub max_grade: Grade,
}

impl Default for GraderResult {
    fn default() -> Self {
        GraderResult {
            grade: Grade::Zero,
            max_grade: Grade::Three,
        }
    }
}

/// One category's graded result.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CategoryGrade {
    pub category: Category,
    #[serde(flatten)]
    pub result: GraderResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TipKind {
    Warning,
    Error,
}

/// One diagnostic. Title and message are opaque keys resolved by an
/// external localization layer; the payload carries the machine-checkable
/// facts and `code` an optional scratchblocks excerpt for human review.
#[derive(Debug, Clone, Serialize)]
pub struct Tip {
    pub kind: TipKind,
    pub title: String,
    pub message: String,
    pub payload: BTreeMap<String, String>,
    pub code: Option<String>,
}

impl Tip {
    pub fn warning(title: &str, message: &str) -> Self {
        Tip {
            kind: TipKind::Warning,
            title: title.to_string(),
            message: message.to_string(),
            payload: BTreeMap::new(),
            code: None,
        }
    }

    pub fn error(title: &str, message: &str) -> Self {
        Tip {
            kind: TipKind::Error,
            ..Tip::warning(title, message)
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// A scanner rule that could not run to completion. The rule is skipped;
/// the rest of the scan continues.
#[derive(Debug, Clone)]
pub struct ScanError {
    pub message: String,
}

impl ScanError {
    pub fn new(message: impl Into<String>) -> Self {
        ScanError {
            message: message.into(),
        }
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ScanError {}

/// The complete analysis output for one project.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub grades: Vec<CategoryGrade>,
    pub total_grade: u32,
    pub max_grade: u32,
    pub warnings: Vec<Tip>,
    pub errors: Vec<Tip>,
    /// Names of scanner rules that failed and were skipped.
    pub skipped_rules: Vec<String>,
}
