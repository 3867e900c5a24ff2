//! The analyzed view of a project: per-target extracted scripts with their
//! canonical text and placement rectangles. Built once by
//! [`crate::parse_project`] and immutable afterwards.

use serde::Serialize;

/// A parsed project: the stage plus its sprites, with project-wide
/// derived data the rule layers consume.
#[derive(Debug, Clone, Default)]
pub struct Project {
    pub stage: Target,
    pub sprites: Vec<Target>,
    /// All declared broadcast message names, deduplicated, stage first.
    pub broadcasts: Vec<String>,
    /// Newline-joined canonical text of every script in the project.
    pub all_scripts: String,
}

impl Project {
    /// Stage and sprites in declaration order.
    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        std::iter::once(&self.stage).chain(self.sprites.iter())
    }
}

/// One stage or sprite with its extracted scripts.
#[derive(Debug, Clone, Default)]
pub struct Target {
    pub name: String,
    pub is_stage: bool,
    /// Locally declared variable names.
    pub local_vars: Vec<String>,
    /// Locally declared list names.
    pub local_lists: Vec<String>,
    /// Custom-operation signatures declared here (`proccode` strings,
    /// parameter markers included).
    pub custom_blocks: Vec<String>,
    /// Workspace comments attached to this target.
    pub comment_count: usize,
    /// Live scripts in block declaration order.
    pub scripts: Vec<Script>,
    /// Newline-joined canonical text of this target's scripts.
    pub all_scripts: String,
}

/// One live script: the blocks reachable from a trigger hat, their
/// canonical rendering, and the hat's placement rectangle.
#[derive(Debug, Clone, Default)]
pub struct Script {
    /// Block id of the trigger hat.
    pub root: String,
    /// Stack block ids in source order, nested bodies included.
    pub blocks: Vec<String>,
    /// Canonical scratchblocks text.
    pub text: String,
    pub rect: Rect,
}

impl Script {
    /// The rendered trigger line (first line of the script text).
    pub fn hat_line(&self) -> &str {
        self.text.lines().next().unwrap_or_default()
    }

    /// Statement lines, `end`/`else` structural markers excluded. This is
    /// the length measure the pedagogical thresholds are defined over.
    pub fn statement_lines(&self) -> usize {
        self.text
            .lines()
            .filter(|line| {
                let line = line.trim();
                line != "end" && line != "else" && !line.is_empty()
            })
            .count()
    }
}

/// Axis-aligned placement rectangle on the editor canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    /// Closed-interval intersection test: touching edges count as
    /// overlapping.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x <= other.x + other.w
            && self.x + self.w >= other.x
            && self.y <= other.y + other.h
            && self.y + self.h >= other.y
    }
}
