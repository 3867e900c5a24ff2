//! Reachability of blocks from trigger hats.
//!
//! This predicate is the sole gate used by script extraction and every
//! counting/filtering operation downstream; nothing re-implements it.

use std::collections::HashSet;

use crate::opcodes;
use crate::raw::{Blocks, RawTarget};

/// Walk the parent chain upward from `id` to the topmost block it can
/// reach. The walk is bounded by a visited set, so malformed parent
/// cycles terminate; a dangling parent pointer ends the walk exactly
/// like reaching the natural root.
pub fn chain_root<'a>(blocks: &'a Blocks, id: &str) -> Option<&'a str> {
    let (mut current, mut block) = blocks.get_key_value(id)?;
    let mut visited: HashSet<&str> = HashSet::new();

    while visited.insert(current) {
        match block
            .parent
            .as_deref()
            .and_then(|parent| blocks.get_key_value(parent))
        {
            Some((parent_id, parent_block)) => {
                current = parent_id;
                block = parent_block;
            }
            None => break,
        }
    }
    Some(current)
}

/// Whether the block belongs to a script rooted at a live trigger.
///
/// Dead cases: a trigger hat with no `next` (headless), a block with
/// neither `next` nor `parent` (orphan), and any chain whose topmost
/// reachable block is not a trigger.
pub fn is_block_live(target: &RawTarget, block_id: &str) -> bool {
    let Some(block) = target.blocks.get(block_id) else {
        return false;
    };

    if opcodes::is_trigger(&block.opcode) && block.next.is_none() {
        return false;
    }
    if block.next.is_none() && block.parent.is_none() {
        return false;
    }

    match chain_root(&target.blocks, block_id) {
        Some(root) => target
            .blocks
            .get(root)
            .is_some_and(|b| opcodes::is_trigger(&b.opcode)),
        None => false,
    }
}
