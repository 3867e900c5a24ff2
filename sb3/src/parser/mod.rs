//! Builds the analyzed [`Project`] view from the raw exported JSON.

use crate::liveness;
use crate::opcodes;
use crate::project::{Project, Rect, Script, Target};
use crate::raw::{RawProject, RawTarget};
use crate::scratchblocks;

/// Coarse per-line height used to estimate script extents; the exporter
/// only stores the hat position, not the rendered size.
const LINE_HEIGHT: f64 = 24.0;
/// Coarse per-character width for the same estimate.
const CHAR_WIDTH: f64 = 8.0;

/// Parse a raw project into its analyzed form. Deterministic and
/// restartable: the same input yields the same scripts in the same order.
pub fn parse_project(raw: &RawProject) -> Project {
    let mut stage = None;
    let mut sprites = Vec::new();
    for target in &raw.targets {
        let parsed = parse_target(target);
        if target.is_stage && stage.is_none() {
            stage = Some(parsed);
        } else {
            sprites.push(parsed);
        }
    }
    let stage = stage.unwrap_or_else(|| Target {
        name: "Stage".to_string(),
        is_stage: true,
        ..Target::default()
    });

    let mut broadcasts: Vec<String> = Vec::new();
    for target in &raw.targets {
        for name in target.broadcast_names() {
            if !broadcasts.iter().any(|b| b == name) {
                broadcasts.push(name.to_string());
            }
        }
    }

    let all_scripts = std::iter::once(&stage)
        .chain(sprites.iter())
        .filter(|t| !t.all_scripts.is_empty())
        .map(|t| t.all_scripts.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    Project {
        stage,
        sprites,
        broadcasts,
        all_scripts,
    }
}

/// Extract a single target: every live trigger block roots one script,
/// in block declaration order.
pub fn parse_target(raw: &RawTarget) -> Target {
    let mut scripts = Vec::new();
    for (id, block) in raw.blocks.iter() {
        if block.shadow || !opcodes::is_trigger(&block.opcode) {
            continue;
        }
        if !liveness::is_block_live(raw, id) {
            continue;
        }
        let rendered = scratchblocks::render_script(&raw.blocks, id);
        let rect = script_rect(block.x, block.y, &rendered.text);
        scripts.push(Script {
            root: id.to_string(),
            blocks: rendered.block_ids,
            text: rendered.text,
            rect,
        });
    }

    let all_scripts = scripts
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    let custom_blocks = raw
        .blocks
        .iter()
        .filter(|(_, b)| b.opcode == opcodes::PROCEDURES_PROTOTYPE)
        .filter_map(|(_, b)| b.proccode())
        .map(str::to_string)
        .collect();

    Target {
        name: raw.name.clone(),
        is_stage: raw.is_stage,
        local_vars: raw.variable_names().iter().map(|s| s.to_string()).collect(),
        local_lists: raw.list_names().iter().map(|s| s.to_string()).collect(),
        custom_blocks,
        comment_count: raw.comments.len(),
        scripts,
        all_scripts,
    }
}

fn script_rect(x: Option<f64>, y: Option<f64>, text: &str) -> Rect {
    let lines = text.lines().count();
    let widest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
    Rect {
        x: x.unwrap_or(0.0),
        y: y.unwrap_or(0.0),
        w: widest as f64 * CHAR_WIDTH,
        h: lines as f64 * LINE_HEIGHT,
    }
}
