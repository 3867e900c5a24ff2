//! The diagnostic scan: a fixed registry of rules, each producing zero or
//! more tips. A rule that fails is skipped and recorded by name; it never
//! takes the rest of the scan down with it.

pub mod errors;
pub mod warnings;

use sb3::liveness;
use sb3::raw::{Literal, RawTarget};

use crate::report::{ScanError, Tip};
use crate::Analysis;

pub type Rule = fn(&Analysis) -> Result<Vec<Tip>, ScanError>;

pub const WARNING_RULES: &[(&str, Rule)] = &[
    ("lost_code", warnings::lost_code),
    ("sprite_standard_name", warnings::sprite_standard_name),
    ("unused_variables", warnings::unused_variables),
    ("scripts_overlap", warnings::scripts_overlap),
    ("script_is_too_long", warnings::script_is_too_long),
    ("no_comments", warnings::no_comments),
    ("empty_sprite", warnings::empty_sprite),
];

pub const ERROR_RULES: &[(&str, Rule)] = &[
    ("var_without_init", errors::var_without_init),
    ("literal_comparison", errors::literal_comparison),
    ("message_never_received", errors::message_never_received),
    ("message_never_sent", errors::message_never_sent),
];

pub fn scan_for_warnings(analysis: &Analysis) -> (Vec<Tip>, Vec<String>) {
    run_rules(analysis, WARNING_RULES)
}

pub fn scan_for_errors(analysis: &Analysis) -> (Vec<Tip>, Vec<String>) {
    run_rules(analysis, ERROR_RULES)
}

fn run_rules(analysis: &Analysis, rules: &[(&str, Rule)]) -> (Vec<Tip>, Vec<String>) {
    let mut tips = Vec::new();
    let mut skipped = Vec::new();
    for (name, rule) in rules {
        match rule(analysis) {
            Ok(found) => tips.extend(found),
            Err(_) => skipped.push((*name).to_string()),
        }
    }
    (tips, skipped)
}

/// How a declared variable is touched across its visibility scope.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct VariableUsage {
    pub set: bool,
    pub change: bool,
    pub read: bool,
}

/// Collect the usage profile of `name`, declared on `owner`.
///
/// Stage variables are global, so every target counts. Sprite variables
/// are local, so only the owner counts, with one exception: a
/// `sensing_of` read names its target explicitly and is therefore
/// searched project-wide.
pub(crate) fn variable_usage(analysis: &Analysis, owner: &RawTarget, name: &str) -> VariableUsage {
    let mut usage = VariableUsage::default();
    for target in &analysis.raw.targets {
        let in_scope = owner.is_stage || target.name == owner.name;
        for (id, block) in target.blocks.iter() {
            if !liveness::is_block_live(target, id) {
                continue;
            }
            if in_scope {
                match block.opcode.as_str() {
                    "data_setvariableto" if block.field("VARIABLE") == Some(name) => {
                        usage.set = true;
                    }
                    "data_changevariableby" if block.field("VARIABLE") == Some(name) => {
                        usage.change = true;
                    }
                    "data_variable" if block.field("VARIABLE") == Some(name) => {
                        usage.read = true;
                    }
                    _ => {}
                }
                let referenced = block.inputs.values().any(|input| {
                    matches!(input.literal(), Some(Literal::Variable(n)) if n == name)
                });
                if referenced {
                    usage.read = true;
                }
            }
            if block.opcode == "sensing_of"
                && block.field("PROPERTY") == Some(name)
                && sensing_of_object(target, block) == Some(owner_display_name(owner))
            {
                usage.read = true;
            }
        }
    }
    usage
}

/// The object a `sensing_of` reporter reads from, resolved through its
/// dropdown shadow block.
fn sensing_of_object<'a>(target: &'a RawTarget, block: &sb3::raw::RawBlock) -> Option<&'a str> {
    let menu_id = block.input("OBJECT")?.block_id()?;
    let menu = target.blocks.get(menu_id)?;
    menu.field("OBJECT")
}

/// The name `sensing_of` dropdowns use for a target. The stage is always
/// listed as `_stage_`.
fn owner_display_name(owner: &RawTarget) -> &str {
    if owner.is_stage {
        "_stage_"
    } else {
        &owner.name
    }
}
