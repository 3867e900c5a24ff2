//! The structural query engine every scoring and diagnostic rule is
//! built from.
//!
//! Validators encode shape only ("has a filled condition slot"); the
//! engine applies the liveness gate uniformly afterwards, keeping the two
//! concerns orthogonal. Results are order-independent aggregates.

use sb3::liveness;
use sb3::opcodes;
use sb3::raw::{RawBlock, RawProject, RawTarget};

/// One matched block with enough context to resolve its neighbors.
#[derive(Clone, Copy)]
pub struct BlockMatch<'a> {
    pub target: &'a RawTarget,
    pub id: &'a str,
    pub block: &'a RawBlock,
}

/// Live blocks matching an arbitrary shape predicate, across all targets.
pub fn filter_blocks<'a>(
    raw: &'a RawProject,
    predicate: impl Fn(&RawBlock) -> bool,
    live_only: bool,
) -> Vec<BlockMatch<'a>> {
    let mut matches = Vec::new();
    for target in &raw.targets {
        collect_target(target, &predicate, live_only, &mut matches);
    }
    matches
}

/// Live blocks with the given opcode, optionally shape-validated.
pub fn filter_by_opcode<'a>(
    raw: &'a RawProject,
    opcode: &str,
    validator: impl Fn(&RawBlock) -> bool,
    live_only: bool,
) -> Vec<BlockMatch<'a>> {
    filter_blocks(raw, |b| b.opcode == opcode && validator(b), live_only)
}

/// Count of live blocks with the given opcode across the whole project.
pub fn opcode_count(raw: &RawProject, opcode: &str) -> usize {
    opcode_count_where(raw, opcode, |_| true)
}

/// Same, with a shape validator.
pub fn opcode_count_where(
    raw: &RawProject,
    opcode: &str,
    validator: impl Fn(&RawBlock) -> bool,
) -> usize {
    filter_by_opcode(raw, opcode, validator, true).len()
}

/// Per-target counts, one entry per target in declaration order, for
/// predicates that care about multiplicity within a single target.
pub fn opcode_count_per_target(
    raw: &RawProject,
    opcode: &str,
    validator: impl Fn(&RawBlock) -> bool,
) -> Vec<usize> {
    raw.targets
        .iter()
        .map(|target| {
            let mut matches = Vec::new();
            collect_target(
                target,
                &|b: &RawBlock| b.opcode == opcode && validator(b),
                true,
                &mut matches,
            );
            matches.len()
        })
        .collect()
}

/// Number of live trigger blocks in the whole project, one per script.
pub fn valid_scripts_count(raw: &RawProject) -> usize {
    filter_blocks(
        raw,
        |b| !b.shadow && opcodes::is_trigger(&b.opcode),
        true,
    )
    .len()
}

fn collect_target<'a>(
    target: &'a RawTarget,
    predicate: &impl Fn(&RawBlock) -> bool,
    live_only: bool,
    matches: &mut Vec<BlockMatch<'a>>,
) {
    for (id, block) in target.blocks.iter() {
        if !predicate(block) {
            continue;
        }
        if live_only && !liveness::is_block_live(target, id) {
            continue;
        }
        matches.push(BlockMatch { target, id, block });
    }
}

/// Shape validator: the named input slot exists and carries a value.
pub fn slot_filled(name: &'static str) -> impl Fn(&RawBlock) -> bool {
    move |block| block.input(name).is_some_and(|input| input.is_filled())
}
