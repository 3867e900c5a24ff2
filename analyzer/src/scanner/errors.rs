//! Error rules: patterns that are mistakes outright.

use std::collections::HashSet;

use sb3::liveness;
use sb3::raw::{Literal, RawTarget};
use sb3::scratchblocks::{escape, reporter_text, script_text};

use crate::grader;
use crate::report::{ScanError, Tip};
use crate::scanner::variable_usage;
use crate::Analysis;

/// Variables that are read or changed but never set to a starting value.
pub fn var_without_init(a: &Analysis) -> Result<Vec<Tip>, ScanError> {
    let mut tips = Vec::new();
    for target in &a.raw.targets {
        for name in target.variable_names() {
            let usage = variable_usage(a, target, name);
            if !usage.set && (usage.change || usage.read) {
                let shown = escape(name, true);
                tips.push(
                    Tip::error("error.varWithoutInitTitle", "error.varWithoutInit")
                        .with("variable", name)
                        .with("target", &target.name)
                        .with_code(format!(
                            "({}::variables)\nset [{} v] to [0]",
                            shown, shown
                        )),
                );
            }
        }
    }
    Ok(tips)
}

/// Comparisons whose operands are both fixed literals and therefore
/// always produce the same answer. One tip per script.
pub fn literal_comparison(a: &Analysis) -> Result<Vec<Tip>, ScanError> {
    let mut tips = Vec::new();
    for target in &a.raw.targets {
        let mut reported_roots: HashSet<String> = HashSet::new();
        for (id, block) in target.blocks.iter() {
            let slots: [&str; 2] = match block.opcode.as_str() {
                "operator_equals" | "operator_gt" | "operator_lt" => ["OPERAND1", "OPERAND2"],
                "operator_contains" => ["STRING1", "STRING2"],
                _ => continue,
            };
            let both_plain = slots.iter().all(|slot| {
                block
                    .input(slot)
                    .and_then(|input| input.literal())
                    .is_some_and(|lit| lit.is_plain())
            });
            if !both_plain || !liveness::is_block_live(target, id) {
                continue;
            }
            let Some(root) = liveness::chain_root(&target.blocks, id) else {
                continue;
            };
            if !reported_roots.insert(root.to_string()) {
                continue;
            }
            let hat = script_text(&target.blocks, root)
                .lines()
                .next()
                .unwrap_or_default()
                .to_string();
            tips.push(
                Tip::error("error.literalComparisonTitle", "error.literalComparison")
                    .with("target", &target.name)
                    .with_code(format!("{}\n\n{}", hat, reporter_text(&target.blocks, id))),
            );
        }
    }
    Ok(tips)
}

/// Messages a target broadcasts that no live script anywhere receives.
pub fn message_never_received(a: &Analysis) -> Result<Vec<Tip>, ScanError> {
    let mut tips = Vec::new();
    for name in &a.project.broadcasts {
        if grader::broadcast_received(a, name) {
            continue;
        }
        for target in &a.raw.targets {
            if target_sends(target, name) {
                tips.push(
                    Tip::error(
                        "error.messageNeverReceivedTitle",
                        "error.messageNeverReceived",
                    )
                    .with("target", &target.name)
                    .with("broadcast", name.as_str())
                    .with_code(format!("broadcast [{} v]", escape(name, true))),
                );
            }
        }
    }
    Ok(tips)
}

/// Messages a target waits for that no live script anywhere sends.
pub fn message_never_sent(a: &Analysis) -> Result<Vec<Tip>, ScanError> {
    let mut tips = Vec::new();
    for name in &a.project.broadcasts {
        if grader::broadcast_sent(a, name) {
            continue;
        }
        for target in &a.raw.targets {
            if target_receives(target, name) {
                tips.push(
                    Tip::error("error.messageNeverSentTitle", "error.messageNeverSent")
                        .with("target", &target.name)
                        .with("broadcast", name.as_str())
                        .with_code(format!("when I receive [{} v]", escape(name, true))),
                );
            }
        }
    }
    Ok(tips)
}

fn target_sends(target: &RawTarget, name: &str) -> bool {
    target.blocks.iter().any(|(id, block)| {
        matches!(
            block.opcode.as_str(),
            "event_broadcast" | "event_broadcastandwait"
        ) && block
            .input("BROADCAST_INPUT")
            .and_then(|input| input.literal())
            .is_some_and(|lit| matches!(lit, Literal::Broadcast(n) if n == name))
            && liveness::is_block_live(target, id)
    })
}

fn target_receives(target: &RawTarget, name: &str) -> bool {
    target.blocks.iter().any(|(id, block)| {
        block.opcode == "event_whenbroadcastreceived"
            && block.field("BROADCAST_OPTION") == Some(name)
            && liveness::is_block_live(target, id)
    })
}
