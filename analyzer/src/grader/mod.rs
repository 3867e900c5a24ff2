//! The tiered pedagogical rubric.
//!
//! Each category evaluates its tiers independently, lowest to highest,
//! and keeps the highest tier that holds; a project can reach tier three
//! of a category while failing tier two. That mirrors the rubric's
//! intent and is deliberate.

use std::collections::BTreeMap;

use regex::Regex;

use crate::query;
use crate::report::{Category, CategoryGrade, Grade, GraderResult};
use crate::Analysis;

/// Evaluate all categories in report order.
pub fn grade_project(analysis: &Analysis) -> Vec<CategoryGrade> {
    vec![
        flow(analysis),
        data(analysis),
        logic(analysis),
        parallel(analysis),
        abstraction(analysis),
        sync(analysis),
        interactivity(analysis),
    ]
}

/// Points actually scored.
pub fn total_grade(grades: &[CategoryGrade]) -> u32 {
    grades.iter().map(|g| g.result.grade.points()).sum()
}

/// Points achievable.
pub fn max_grade(grades: &[CategoryGrade]) -> u32 {
    grades.iter().map(|g| g.result.max_grade.points()).sum()
}

/// A text-level predicate over the serialized rendering. A pattern that
/// fails to compile contributes nothing instead of aborting the run.
fn text_has(analysis: &Analysis, pattern: &str) -> bool {
    Regex::new(pattern)
        .map(|re| re.is_match(&analysis.project.all_scripts))
        .unwrap_or(false)
}

/// Execution flow: sequencing, then unconditional loops, then loops with
/// an exit condition.
fn flow(a: &Analysis) -> CategoryGrade {
    let mut g = GraderResult::default();

    if query::valid_scripts_count(a.raw) > 0 {
        g.grade = Grade::One;
    }

    let has_body = query::slot_filled("SUBSTACK");
    if query::opcode_count_where(a.raw, "control_forever", &has_body) > 0
        || query::opcode_count_where(a.raw, "control_repeat", &has_body) > 0
    {
        g.grade = Grade::Two;
    }

    if query::opcode_count_where(a.raw, "control_repeat_until", &has_body) > 0 {
        g.grade = Grade::Three;
    }

    CategoryGrade {
        category: Category::Flow,
        result: g,
    }
}

/// Data representation: literals, then initialized variables in use,
/// then lists in use.
fn data(a: &Analysis) -> CategoryGrade {
    let mut g = GraderResult::default();

    if text_has(a, r"\(\d+\)") {
        g.grade = Grade::One;
    }

    if query::opcode_count(a.raw, "data_setvariableto") > 0
        && text_has(a, r"\(.+::variables\)")
    {
        g.grade = Grade::Two;
    }

    let declared_lists: Vec<&str> = a
        .raw
        .targets
        .iter()
        .flat_map(|t| t.list_names())
        .collect();
    let list_block_used = query::filter_blocks(
        a.raw,
        |b| {
            b.field("LIST")
                .is_some_and(|name| declared_lists.iter().any(|declared| *declared == name))
        },
        true,
    );
    if text_has(a, r"\(.+::list\)") || !list_block_used.is_empty() {
        g.grade = Grade::Three;
    }

    CategoryGrade {
        category: Category::Data,
        result: g,
    }
}

/// Logic: conditionals, two-way conditionals, composite conditions.
fn logic(a: &Analysis) -> CategoryGrade {
    let mut g = GraderResult::default();

    let conditional = |b: &sb3::raw::RawBlock| {
        query::slot_filled("CONDITION")(b) && query::slot_filled("SUBSTACK")(b)
    };
    if query::opcode_count_where(a.raw, "control_if", conditional) > 0 {
        g.grade = Grade::One;
    }

    let two_way = |b: &sb3::raw::RawBlock| {
        query::slot_filled("CONDITION")(b)
            && (query::slot_filled("SUBSTACK")(b) || query::slot_filled("SUBSTACK2")(b))
    };
    if query::opcode_count_where(a.raw, "control_if_else", two_way) > 0 {
        g.grade = Grade::Two;
    }

    let both_operands = |b: &sb3::raw::RawBlock| {
        query::slot_filled("OPERAND1")(b) && query::slot_filled("OPERAND2")(b)
    };
    if query::opcode_count_where(a.raw, "operator_and", both_operands) > 0
        || query::opcode_count_where(a.raw, "operator_or", both_operands) > 0
    {
        g.grade = Grade::Three;
    }

    CategoryGrade {
        category: Category::Logic,
        result: g,
    }
}

/// Parallelism: several flag scripts, several scripts behind one user
/// event, several scripts behind one program-raised event.
fn parallel(a: &Analysis) -> CategoryGrade {
    let mut g = GraderResult::default();

    let sprites_with_flag = a
        .raw
        .targets
        .iter()
        .filter(|t| !t.is_stage)
        .filter(|t| {
            t.blocks.iter().any(|(id, b)| {
                b.opcode == "event_whenflagclicked" && sb3::liveness::is_block_live(t, id)
            })
        })
        .count();
    if sprites_with_flag > 1 {
        g.grade = Grade::One;
    }

    let clicks_per_target =
        query::opcode_count_per_target(a.raw, "event_whenthisspriteclicked", |_| true);
    let mut key_hats: BTreeMap<String, usize> = BTreeMap::new();
    for m in query::filter_by_opcode(a.raw, "event_whenkeypressed", |_| true, true) {
        if let Some(key) = m.block.field("KEY_OPTION") {
            *key_hats.entry(key.to_string()).or_insert(0) += 1;
        }
    }
    if clicks_per_target.iter().any(|&n| n > 1) || key_hats.values().any(|&n| n > 1) {
        g.grade = Grade::Two;
    }

    let mut receivers: BTreeMap<String, usize> = BTreeMap::new();
    for m in query::filter_by_opcode(a.raw, "event_whenbroadcastreceived", |_| true, true) {
        if let Some(name) = m.block.field("BROADCAST_OPTION") {
            *receivers.entry(name.to_string()).or_insert(0) += 1;
        }
    }
    let program_hats = query::opcode_count(a.raw, "event_whengreaterthan")
        + query::opcode_count(a.raw, "event_whenbackdropswitchesto");
    if receivers.values().any(|&n| n > 1) || program_hats > 1 {
        g.grade = Grade::Three;
    }

    CategoryGrade {
        category: Category::Parallel,
        result: g,
    }
}

/// Abstraction: custom blocks in use, cloning, parameterized custom
/// blocks.
fn abstraction(a: &Analysis) -> CategoryGrade {
    let mut g = GraderResult::default();

    // Signatures of custom blocks that are defined with a body. Headless
    // definitions are already dead to the liveness gate. Custom blocks are
    // local to their sprite, so only calls in the defining target count.
    let definitions =
        query::filter_by_opcode(a.raw, sb3::opcodes::PROCEDURES_DEFINITION, |_| true, true);
    let mut defined = Vec::new();
    let mut any_called = false;
    for m in &definitions {
        let proccode = m
            .block
            .input("custom_block")
            .and_then(|input| input.block_id())
            .and_then(|id| m.target.blocks.get(id))
            .and_then(|prototype| prototype.proccode());
        let Some(proccode) = proccode else {
            continue;
        };
        let called_locally = m.target.blocks.iter().any(|(id, b)| {
            b.opcode == "procedures_call"
                && b.proccode() == Some(proccode)
                && sb3::liveness::is_block_live(m.target, id)
        });
        any_called = any_called || called_locally;
        defined.push(proccode.to_string());
    }

    if any_called {
        g.grade = Grade::One;
    }

    if query::opcode_count(a.raw, "control_create_clone_of") > 0
        && query::opcode_count(a.raw, "control_start_as_clone") > 0
    {
        g.grade = Grade::Two;
    }

    if defined
        .iter()
        .any(|p| p.contains("%s") || p.contains("%b"))
    {
        g.grade = Grade::Three;
    }

    CategoryGrade {
        category: Category::Abstraction,
        result: g,
    }
}

/// Synchronization: timed waits, message round-trips, condition waits
/// with backdrop-change handling.
fn sync(a: &Analysis) -> CategoryGrade {
    let mut g = GraderResult::default();

    if query::opcode_count(a.raw, "control_wait") > 0 {
        g.grade = Grade::One;
    }

    let round_trip = a
        .project
        .broadcasts
        .iter()
        .any(|name| broadcast_sent(a, name) && broadcast_received(a, name));
    if round_trip {
        g.grade = Grade::Two;
    }

    if query::opcode_count_where(a.raw, "control_wait_until", query::slot_filled("CONDITION")) > 0
        && query::opcode_count(a.raw, "event_whenbackdropswitchesto") > 0
    {
        g.grade = Grade::Three;
    }

    CategoryGrade {
        category: Category::Sync,
        result: g,
    }
}

/// Interactivity: sprite clicks, mouse/keyboard input, microphone or
/// camera input.
fn interactivity(a: &Analysis) -> CategoryGrade {
    let mut g = GraderResult::default();

    if query::opcode_count(a.raw, "event_whenthisspriteclicked") > 0 {
        g.grade = Grade::One;
    }

    let mouse_reporters = query::opcode_count(a.raw, "sensing_mousedown")
        + query::opcode_count(a.raw, "sensing_mousex")
        + query::opcode_count(a.raw, "sensing_mousey");
    let touching_mouse = query::filter_by_opcode(a.raw, "sensing_touchingobject", |_| true, true)
        .iter()
        .any(|m| menu_choice(m, "TOUCHINGOBJECTMENU").as_deref() == Some("_mouse_"));
    let asks_and_reads = query::opcode_count(a.raw, "sensing_askandwait") > 0
        && query::opcode_count(a.raw, "sensing_answer") > 0;
    if mouse_reporters > 0 || touching_mouse || asks_and_reads {
        g.grade = Grade::Two;
    }

    let loudness_hat = query::opcode_count_where(a.raw, "event_whengreaterthan", |b| {
        b.field("WHENGREATERTHANMENU") == Some("LOUDNESS")
    });
    let video = query::filter_blocks(a.raw, |b| b.opcode.starts_with("videoSensing_"), true);
    if loudness_hat > 0
        || query::opcode_count(a.raw, "sensing_loudness") > 0
        || !video.is_empty()
    {
        g.grade = Grade::Three;
    }

    CategoryGrade {
        category: Category::Interactivity,
        result: g,
    }
}

/// Any live send of the named message, literal slot values only.
pub(crate) fn broadcast_sent(a: &Analysis, name: &str) -> bool {
    let sends_named = |b: &sb3::raw::RawBlock| {
        b.input("BROADCAST_INPUT")
            .and_then(|input| input.literal())
            .is_some_and(|lit| matches!(lit, sb3::raw::Literal::Broadcast(n) if n == name))
    };
    query::opcode_count_where(a.raw, "event_broadcast", sends_named) > 0
        || query::opcode_count_where(a.raw, "event_broadcastandwait", sends_named) > 0
}

/// Any live receiver hat for the named message, anywhere in the project.
pub(crate) fn broadcast_received(a: &Analysis, name: &str) -> bool {
    query::opcode_count_where(a.raw, "event_whenbroadcastreceived", |b| {
        b.field("BROADCAST_OPTION") == Some(name)
    }) > 0
}

/// Resolve a dropdown input to its chosen option through the referenced
/// shadow menu block.
fn menu_choice(m: &query::BlockMatch, slot: &str) -> Option<String> {
    let menu_id = m.block.input(slot)?.block_id()?;
    let menu = m.target.blocks.get(menu_id)?;
    menu.fields
        .values()
        .next()
        .and_then(sb3::raw::Field::option)
        .map(str::to_string)
}
