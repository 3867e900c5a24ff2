//! Warning rules: smells worth pointing out, not outright mistakes.

use sb3::liveness;
use sb3::scratchblocks::{escape, script_text};

use crate::overlap;
use crate::report::{ScanError, Tip};
use crate::scanner::variable_usage;
use crate::Analysis;

/// Dead code: blocks no trigger will ever run. One tip per target, with
/// the first dead chain as excerpt.
pub fn lost_code(a: &Analysis) -> Result<Vec<Tip>, ScanError> {
    let mut tips = Vec::new();
    for target in &a.raw.targets {
        let dead = target
            .blocks
            .iter()
            .find(|(id, block)| !block.shadow && !liveness::is_block_live(target, id));
        if let Some((id, _)) = dead {
            let root = liveness::chain_root(&target.blocks, id).unwrap_or(id);
            tips.push(
                Tip::warning("warning.lostCodeTitle", "warning.lostCode")
                    .with("target", &target.name)
                    .with_code(script_text(&target.blocks, root)),
            );
        }
    }
    Ok(tips)
}

/// Sprites still carrying an editor default name in any locale.
pub fn sprite_standard_name(a: &Analysis) -> Result<Vec<Tip>, ScanError> {
    let mut tips = Vec::new();
    for target in a.raw.targets.iter().filter(|t| !t.is_stage) {
        let standard = a
            .config
            .standard_sprite_names
            .iter()
            .any(|default| target.name.contains(default.as_str()));
        if standard {
            tips.push(
                Tip::warning(
                    "warning.spriteStandardNameTitle",
                    "warning.spriteStandardName",
                )
                .with("target", &target.name),
            );
        }
    }
    Ok(tips)
}

/// Declared variables no live block reads or writes.
pub fn unused_variables(a: &Analysis) -> Result<Vec<Tip>, ScanError> {
    let mut tips = Vec::new();
    for target in &a.raw.targets {
        for name in target.variable_names() {
            let usage = variable_usage(a, target, name);
            if !usage.set && !usage.change && !usage.read {
                tips.push(
                    Tip::warning("warning.unusedVariablesTitle", "warning.unusedVariables")
                        .with("variable", name)
                        .with("target", &target.name)
                        .with_code(format!("({}::variables)", escape(name, true))),
                );
            }
        }
    }
    Ok(tips)
}

/// Scripts whose placement rectangles intersect in the editor workspace.
pub fn scripts_overlap(a: &Analysis) -> Result<Vec<Tip>, ScanError> {
    let mut tips = Vec::new();
    for target in a.project.targets() {
        for (first, second) in overlap::find_overlaps(target) {
            tips.push(
                Tip::warning("warning.scriptsOverlapTitle", "warning.scriptsOverlap")
                    .with("target", &target.name)
                    .with_code(format!("{}\n\n{}", first.hat_line(), second.hat_line())),
            );
        }
    }
    Ok(tips)
}

/// Scripts above the length threshold, identified by their trigger line.
pub fn script_is_too_long(a: &Analysis) -> Result<Vec<Tip>, ScanError> {
    let mut tips = Vec::new();
    for target in a.project.targets() {
        for script in &target.scripts {
            let length = script.statement_lines();
            if length > a.config.long_script_lines {
                tips.push(
                    Tip::warning("warning.scriptIsTooLongTitle", "warning.scriptIsTooLong")
                        .with("target", &target.name)
                        .with("length", length.to_string())
                        .with_code(script.hat_line()),
                );
            }
        }
    }
    Ok(tips)
}

/// Targets with substantial scripts and not a single workspace comment.
pub fn no_comments(a: &Analysis) -> Result<Vec<Tip>, ScanError> {
    let mut tips = Vec::new();
    for target in a.project.targets() {
        let longest = target
            .scripts
            .iter()
            .map(|s| s.statement_lines())
            .max()
            .unwrap_or(0);
        if longest >= a.config.comment_required_lines && target.comment_count == 0 {
            tips.push(
                Tip::warning("warning.noCommentsTitle", "warning.noComments")
                    .with("target", &target.name)
                    .with("maxLength", longest.to_string()),
            );
        }
    }
    Ok(tips)
}

/// Sprites without a single live script. A sprite whose only blocks are
/// dead chains counts as empty too (and gets a lost-code warning on top).
pub fn empty_sprite(a: &Analysis) -> Result<Vec<Tip>, ScanError> {
    let mut tips = Vec::new();
    for sprite in &a.project.sprites {
        if sprite.scripts.is_empty() {
            tips.push(
                Tip::warning("warning.emptySpriteTitle", "warning.emptySprite")
                    .with("spriteName", &sprite.name),
            );
        }
    }
    Ok(tips)
}
