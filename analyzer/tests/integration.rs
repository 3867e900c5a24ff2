use std::io::Write;

use analyzer::{Analysis, AnalyzerConfig, Report};
use sb3::raw::RawProject;
use sb3::{liveness, parse_project, scratchblocks, Rect, Script, Target};

fn project(value: serde_json::Value) -> RawProject {
    serde_json::from_value(value).expect("fixture deserializes")
}

fn run(raw: &RawProject) -> Report {
    run_with(raw, &AnalyzerConfig::default())
}

fn run_with(raw: &RawProject, config: &AnalyzerConfig) -> Report {
    let parsed = parse_project(raw);
    let analysis = Analysis::new(raw, &parsed, config);
    analyzer::analyze(&analysis)
}

/// One sprite target wrapped in a minimal project.
fn sprite(blocks: serde_json::Value) -> RawProject {
    project(serde_json::json!({
        "targets": [
            { "isStage": true, "name": "Stage" },
            { "isStage": false, "name": "Player", "blocks": blocks }
        ]
    }))
}

#[test]
fn headless_trigger_is_dead() {
    let raw = sprite(serde_json::json!({
        "hat": { "opcode": "event_whenflagclicked", "topLevel": true, "x": 0, "y": 0 }
    }));
    let target = &raw.targets[1];
    assert!(!liveness::is_block_live(target, "hat"));
    assert_eq!(analyzer::query::valid_scripts_count(&raw), 0);
}

#[test]
fn orphan_block_is_dead() {
    let raw = sprite(serde_json::json!({
        "lone": { "opcode": "motion_movesteps", "topLevel": true, "x": 10, "y": 10 }
    }));
    assert!(!liveness::is_block_live(&raw.targets[1], "lone"));
}

#[test]
fn attached_chain_is_live() {
    let raw = sprite(serde_json::json!({
        "hat": {
            "opcode": "event_whenflagclicked", "next": "move",
            "topLevel": true, "x": 0, "y": 0
        },
        "move": {
            "opcode": "motion_movesteps", "parent": "hat",
            "inputs": { "STEPS": [1, [4, "10"]] }
        }
    }));
    let target = &raw.targets[1];
    assert!(liveness::is_block_live(target, "hat"));
    assert!(liveness::is_block_live(target, "move"));
    assert_eq!(analyzer::query::valid_scripts_count(&raw), 1);
}

#[test]
fn chain_rooted_at_non_trigger_is_dead() {
    let raw = sprite(serde_json::json!({
        "top": { "opcode": "motion_movesteps", "next": "move", "topLevel": true },
        "move": { "opcode": "motion_turnright", "parent": "top" }
    }));
    let target = &raw.targets[1];
    assert_eq!(liveness::chain_root(&target.blocks, "move"), Some("top"));
    assert!(!liveness::is_block_live(target, "move"));
}

#[test]
fn parent_cycle_terminates_as_dead() {
    let raw = sprite(serde_json::json!({
        "a": { "opcode": "motion_movesteps", "parent": "b", "next": "b" },
        "b": { "opcode": "motion_turnright", "parent": "a" }
    }));
    assert!(!liveness::is_block_live(&raw.targets[1], "a"));
    assert!(!liveness::is_block_live(&raw.targets[1], "b"));
}

#[test]
fn scripts_follow_block_declaration_order() {
    // Raw JSON text so the map order is the document order, not key order.
    let raw: RawProject = serde_json::from_str(
        r#"{
            "targets": [{
                "isStage": false,
                "name": "Player",
                "blocks": {
                    "zhat": { "opcode": "event_whenflagclicked", "next": "zmove",
                              "topLevel": true, "x": 0, "y": 0 },
                    "zmove": { "opcode": "motion_movesteps", "parent": "zhat" },
                    "ahat": { "opcode": "event_whenthisspriteclicked", "next": "amove",
                              "topLevel": true, "x": 300, "y": 0 },
                    "amove": { "opcode": "motion_turnright", "parent": "ahat" }
                }
            }]
        }"#,
    )
    .expect("fixture deserializes");
    let parsed = parse_project(&raw);
    let roots: Vec<&str> = parsed.sprites[0]
        .scripts
        .iter()
        .map(|s| s.root.as_str())
        .collect();
    assert_eq!(roots, ["zhat", "ahat"]);
}

#[test]
fn extraction_is_idempotent() {
    let raw = sprite(serde_json::json!({
        "hat": { "opcode": "event_whenflagclicked", "next": "move",
                 "topLevel": true, "x": 0, "y": 0 },
        "move": { "opcode": "motion_movesteps", "parent": "hat",
                  "inputs": { "STEPS": [1, [4, "10"]] } }
    }));
    let first = parse_project(&raw);
    let second = parse_project(&raw);
    assert_eq!(first.all_scripts, second.all_scripts);
    assert_eq!(
        first.sprites[0].scripts[0].blocks,
        second.sprites[0].scripts[0].blocks
    );
}

#[test]
fn script_text_starts_with_its_trigger_line() {
    let raw = sprite(serde_json::json!({
        "hat": { "opcode": "event_whenflagclicked", "next": "move",
                 "topLevel": true, "x": 0, "y": 0 },
        "move": { "opcode": "motion_movesteps", "parent": "hat",
                  "inputs": { "STEPS": [1, [4, "10"]] } }
    }));
    let parsed = parse_project(&raw);
    let script = &parsed.sprites[0].scripts[0];
    assert_eq!(script.hat_line(), "when @greenFlag clicked");
    assert_eq!(script.text, "when @greenFlag clicked\nmove (10) steps");
}

#[test]
fn opcode_count_matches_filter_length() {
    let raw = sprite(serde_json::json!({
        "hat": { "opcode": "event_whenflagclicked", "next": "m1",
                 "topLevel": true, "x": 0, "y": 0 },
        "m1": { "opcode": "motion_movesteps", "parent": "hat", "next": "m2" },
        "m2": { "opcode": "motion_movesteps", "parent": "m1" }
    }));
    let matches = analyzer::query::filter_by_opcode(&raw, "motion_movesteps", |_| true, true);
    assert_eq!(
        analyzer::query::opcode_count(&raw, "motion_movesteps"),
        matches.len()
    );
    assert_eq!(matches.len(), 2);
    let per_target =
        analyzer::query::opcode_count_per_target(&raw, "motion_movesteps", |_| true);
    assert_eq!(per_target.iter().sum::<usize>(), matches.len());
}

#[test]
fn bare_array_block_entries_are_skipped() {
    let raw = sprite(serde_json::json!({
        "loose": [12, "score", "varid"],
        "hat": { "opcode": "event_whenflagclicked", "topLevel": true, "x": 0, "y": 0 }
    }));
    assert_eq!(raw.targets[1].blocks.len(), 1);
    assert!(raw.targets[1].blocks.get("hat").is_some());
}

#[test]
fn unknown_opcode_renders_from_its_name() {
    let raw = sprite(serde_json::json!({
        "hat": { "opcode": "event_whenflagclicked", "next": "odd",
                 "topLevel": true, "x": 0, "y": 0 },
        "odd": { "opcode": "extension_do_thing", "parent": "hat" }
    }));
    let text = scratchblocks::script_text(&raw.targets[1].blocks, "hat");
    assert!(text.contains("do thing"), "got: {text}");
}

#[test]
fn escape_handles_brackets_and_newlines() {
    assert_eq!(scratchblocks::escape("a)b", false), "a\\)b");
    assert_eq!(scratchblocks::escape("(x)", false), "(x\\)");
    assert_eq!(scratchblocks::escape("(x)", true), "\\(x\\)");
    assert_eq!(scratchblocks::escape("two\nlines", false), "two lines");
}

#[test]
fn rect_intersection_is_symmetric() {
    let a = Rect { x: 0.0, y: 0.0, w: 10.0, h: 10.0 };
    let b = Rect { x: 5.0, y: 5.0, w: 10.0, h: 10.0 };
    let far = Rect { x: 100.0, y: 100.0, w: 10.0, h: 10.0 };
    assert!(a.intersects(&b));
    assert!(b.intersects(&a));
    assert!(!a.intersects(&far));
}

#[test]
fn overlapping_scripts_produce_one_pair() {
    let target = Target {
        name: "Player".to_string(),
        scripts: vec![
            Script {
                root: "a".to_string(),
                rect: Rect { x: 0.0, y: 0.0, w: 10.0, h: 10.0 },
                ..Script::default()
            },
            Script {
                root: "b".to_string(),
                rect: Rect { x: 5.0, y: 5.0, w: 10.0, h: 10.0 },
                ..Script::default()
            },
        ],
        ..Target::default()
    };
    let pairs = analyzer::overlap::find_overlaps(&target);
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].0.root, "a");
    assert_eq!(pairs[0].1.root, "b");
}

#[test]
fn single_script_never_overlaps_itself() {
    let target = Target {
        scripts: vec![Script::default()],
        ..Target::default()
    };
    assert!(analyzer::overlap::find_overlaps(&target).is_empty());
}

#[test]
fn flow_reaches_tier_three_with_exit_condition_loop() {
    let raw = sprite(serde_json::json!({
        "hat": { "opcode": "event_whenflagclicked", "next": "loop",
                 "topLevel": true, "x": 0, "y": 0 },
        "loop": {
            "opcode": "control_repeat_until", "parent": "hat",
            "inputs": {
                "CONDITION": [2, "cond"],
                "SUBSTACK": [2, "move"]
            }
        },
        "cond": { "opcode": "sensing_mousedown", "parent": "loop" },
        "move": { "opcode": "motion_movesteps", "parent": "loop",
                  "inputs": { "STEPS": [1, [4, "10"]] } }
    }));
    let report = run(&raw);
    let flow = report
        .grades
        .iter()
        .find(|g| g.category == analyzer::Category::Flow)
        .expect("flow graded");
    assert_eq!(flow.result.grade.points(), 3);
}

#[test]
fn empty_loop_does_not_count_for_flow() {
    let raw = sprite(serde_json::json!({
        "hat": { "opcode": "event_whenflagclicked", "next": "loop",
                 "topLevel": true, "x": 0, "y": 0 },
        "loop": { "opcode": "control_forever", "parent": "hat",
                  "inputs": { "SUBSTACK": [2, null] } }
    }));
    let report = run(&raw);
    let flow = report
        .grades
        .iter()
        .find(|g| g.category == analyzer::Category::Flow)
        .expect("flow graded");
    assert_eq!(flow.result.grade.points(), 1);
}

#[test]
fn message_never_received_reports_the_sender() {
    let raw = project(serde_json::json!({
        "targets": [
            { "isStage": true, "name": "Stage", "broadcasts": { "b1": "go" } },
            {
                "isStage": false, "name": "Player",
                "blocks": {
                    "hat": { "opcode": "event_whenflagclicked", "next": "send",
                             "topLevel": true, "x": 0, "y": 0 },
                    "send": { "opcode": "event_broadcast", "parent": "hat",
                              "inputs": { "BROADCAST_INPUT": [1, [11, "go", "b1"]] } }
                }
            }
        ]
    }));
    let report = run(&raw);
    let hits: Vec<_> = report
        .errors
        .iter()
        .filter(|t| t.title == "error.messageNeverReceivedTitle")
        .collect();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].payload.get("broadcast").map(String::as_str), Some("go"));
    assert_eq!(hits[0].payload.get("target").map(String::as_str), Some("Player"));
}

#[test]
fn received_message_is_not_reported() {
    let raw = project(serde_json::json!({
        "targets": [
            { "isStage": true, "name": "Stage", "broadcasts": { "b1": "go" } },
            {
                "isStage": false, "name": "Player",
                "blocks": {
                    "hat": { "opcode": "event_whenflagclicked", "next": "send",
                             "topLevel": true, "x": 0, "y": 0 },
                    "send": { "opcode": "event_broadcast", "parent": "hat",
                              "inputs": { "BROADCAST_INPUT": [1, [11, "go", "b1"]] } },
                    "recv": { "opcode": "event_whenbroadcastreceived", "next": "move",
                              "topLevel": true, "x": 300, "y": 0,
                              "fields": { "BROADCAST_OPTION": ["go", "b1"] } },
                    "move": { "opcode": "motion_movesteps", "parent": "recv" }
                }
            }
        ]
    }));
    let report = run(&raw);
    assert!(report
        .errors
        .iter()
        .all(|t| t.title != "error.messageNeverReceivedTitle"));
    assert!(report
        .errors
        .iter()
        .all(|t| t.title != "error.messageNeverSentTitle"));
}

#[test]
fn literal_comparison_is_reported_once_per_script() {
    let raw = sprite(serde_json::json!({
        "hat": { "opcode": "event_whenflagclicked", "next": "if1",
                 "topLevel": true, "x": 0, "y": 0 },
        "if1": { "opcode": "control_if", "parent": "hat", "next": "if2",
                 "inputs": { "CONDITION": [2, "cmp1"], "SUBSTACK": [2, "m1"] } },
        "cmp1": { "opcode": "operator_equals", "parent": "if1",
                  "inputs": { "OPERAND1": [1, [10, "1"]], "OPERAND2": [1, [10, "1"]] } },
        "m1": { "opcode": "motion_movesteps", "parent": "if1" },
        "if2": { "opcode": "control_if", "parent": "if1",
                 "inputs": { "CONDITION": [2, "cmp2"], "SUBSTACK": [2, "m2"] } },
        "cmp2": { "opcode": "operator_gt", "parent": "if2",
                  "inputs": { "OPERAND1": [1, [4, "2"]], "OPERAND2": [1, [4, "3"]] } },
        "m2": { "opcode": "motion_turnright", "parent": "if2" }
    }));
    let report = run(&raw);
    let hits: Vec<_> = report
        .errors
        .iter()
        .filter(|t| t.title == "error.literalComparisonTitle")
        .collect();
    assert_eq!(hits.len(), 1);
}

#[test]
fn variable_comparison_is_not_a_literal_comparison() {
    let raw = sprite(serde_json::json!({
        "hat": { "opcode": "event_whenflagclicked", "next": "if1",
                 "topLevel": true, "x": 0, "y": 0 },
        "if1": { "opcode": "control_if", "parent": "hat",
                 "inputs": { "CONDITION": [2, "cmp"], "SUBSTACK": [2, "m1"] } },
        "cmp": { "opcode": "operator_equals", "parent": "if1",
                 "inputs": { "OPERAND1": [3, [12, "score", "v1"], [10, ""]],
                             "OPERAND2": [1, [10, "5"]] } },
        "m1": { "opcode": "motion_movesteps", "parent": "if1" }
    }));
    let report = run(&raw);
    assert!(report
        .errors
        .iter()
        .all(|t| t.title != "error.literalComparisonTitle"));
}

#[test]
fn unused_variable_is_reported() {
    let raw = project(serde_json::json!({
        "targets": [
            { "isStage": true, "name": "Stage",
              "variables": { "v1": ["score", 0] } }
        ]
    }));
    let report = run(&raw);
    let hits: Vec<_> = report
        .warnings
        .iter()
        .filter(|t| t.title == "warning.unusedVariablesTitle")
        .collect();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].payload.get("variable").map(String::as_str), Some("score"));
}

#[test]
fn set_variable_counts_as_used_but_not_initialized_change_errors() {
    let raw = project(serde_json::json!({
        "targets": [
            { "isStage": true, "name": "Stage",
              "variables": { "v1": ["score", 0] } },
            {
                "isStage": false, "name": "Player",
                "blocks": {
                    "hat": { "opcode": "event_whenflagclicked", "next": "chg",
                             "topLevel": true, "x": 0, "y": 0 },
                    "chg": { "opcode": "data_changevariableby", "parent": "hat",
                             "inputs": { "VALUE": [1, [4, "1"]] },
                             "fields": { "VARIABLE": ["score", "v1"] } }
                }
            }
        ]
    }));
    let report = run(&raw);
    assert!(report
        .warnings
        .iter()
        .all(|t| t.title != "warning.unusedVariablesTitle"));
    let inits: Vec<_> = report
        .errors
        .iter()
        .filter(|t| t.title == "error.varWithoutInitTitle")
        .collect();
    assert_eq!(inits.len(), 1);
    assert_eq!(inits[0].payload.get("variable").map(String::as_str), Some("score"));
}

#[test]
fn set_variable_suppresses_the_init_error() {
    let raw = project(serde_json::json!({
        "targets": [
            { "isStage": true, "name": "Stage",
              "variables": { "v1": ["score", 0] } },
            {
                "isStage": false, "name": "Player",
                "blocks": {
                    "hat": { "opcode": "event_whenflagclicked", "next": "set",
                             "topLevel": true, "x": 0, "y": 0 },
                    "set": { "opcode": "data_setvariableto", "parent": "hat", "next": "chg",
                             "inputs": { "VALUE": [1, [10, "0"]] },
                             "fields": { "VARIABLE": ["score", "v1"] } },
                    "chg": { "opcode": "data_changevariableby", "parent": "set",
                             "inputs": { "VALUE": [1, [4, "1"]] },
                             "fields": { "VARIABLE": ["score", "v1"] } }
                }
            }
        ]
    }));
    let report = run(&raw);
    assert!(report
        .errors
        .iter()
        .all(|t| t.title != "error.varWithoutInitTitle"));
}

#[test]
fn lost_code_reports_once_per_target() {
    let raw = sprite(serde_json::json!({
        "hat": { "opcode": "event_whenflagclicked", "topLevel": true, "x": 0, "y": 0 },
        "lone": { "opcode": "motion_movesteps", "topLevel": true, "x": 200, "y": 0 }
    }));
    let report = run(&raw);
    let hits: Vec<_> = report
        .warnings
        .iter()
        .filter(|t| t.title == "warning.lostCodeTitle")
        .collect();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].payload.get("target").map(String::as_str), Some("Player"));
}

#[test]
fn default_sprite_name_is_flagged() {
    let raw = project(serde_json::json!({
        "targets": [
            { "isStage": true, "name": "Stage" },
            { "isStage": false, "name": "Sprite1" }
        ]
    }));
    let report = run(&raw);
    assert!(report
        .warnings
        .iter()
        .any(|t| t.title == "warning.spriteStandardNameTitle"));
    // An empty sprite is also flagged as such.
    assert!(report
        .warnings
        .iter()
        .any(|t| t.title == "warning.emptySpriteTitle"));
}

#[test]
fn sprite_with_only_dead_blocks_is_empty() {
    let raw = sprite(serde_json::json!({
        "lone": { "opcode": "motion_movesteps", "topLevel": true, "x": 0, "y": 0 }
    }));
    let report = run(&raw);
    let hits: Vec<_> = report
        .warnings
        .iter()
        .filter(|t| t.title == "warning.emptySpriteTitle")
        .collect();
    assert_eq!(hits.len(), 1);
    assert_eq!(
        hits[0].payload.get("spriteName").map(String::as_str),
        Some("Player")
    );
    // The dead chain is reported separately.
    assert!(report
        .warnings
        .iter()
        .any(|t| t.title == "warning.lostCodeTitle"));
}

#[test]
fn sprite_with_a_live_script_is_not_empty() {
    let raw = sprite(serde_json::json!({
        "hat": { "opcode": "event_whenflagclicked", "next": "move",
                 "topLevel": true, "x": 0, "y": 0 },
        "move": { "opcode": "motion_movesteps", "parent": "hat" }
    }));
    let report = run(&raw);
    assert!(report
        .warnings
        .iter()
        .all(|t| t.title != "warning.emptySpriteTitle"));
}

#[test]
fn custom_block_call_counts_only_in_the_defining_sprite() {
    let definition = serde_json::json!({
        "def": { "opcode": "procedures_definition", "next": "body",
                 "topLevel": true, "x": 0, "y": 0,
                 "inputs": { "custom_block": [1, "proto"] } },
        "proto": { "opcode": "procedures_prototype", "parent": "def", "shadow": true,
                   "mutation": { "proccode": "jump", "argumentids": "[]",
                                 "argumentnames": "[]" } },
        "body": { "opcode": "motion_movesteps", "parent": "def" }
    });
    let foreign_call = serde_json::json!({
        "hat": { "opcode": "event_whenflagclicked", "next": "call",
                 "topLevel": true, "x": 0, "y": 0 },
        "call": { "opcode": "procedures_call", "parent": "hat",
                  "mutation": { "proccode": "jump", "argumentids": "[]" } }
    });
    let raw = project(serde_json::json!({
        "targets": [
            { "isStage": true, "name": "Stage" },
            { "isStage": false, "name": "Definer", "blocks": definition },
            { "isStage": false, "name": "Caller", "blocks": foreign_call }
        ]
    }));
    let report = run(&raw);
    let abstraction = report
        .grades
        .iter()
        .find(|g| g.category == analyzer::Category::Abstraction)
        .expect("abstraction graded");
    assert_eq!(abstraction.result.grade.points(), 0);
}

#[test]
fn local_custom_block_call_reaches_abstraction_tier_one() {
    let raw = sprite(serde_json::json!({
        "def": { "opcode": "procedures_definition", "next": "body",
                 "topLevel": true, "x": 0, "y": 0,
                 "inputs": { "custom_block": [1, "proto"] } },
        "proto": { "opcode": "procedures_prototype", "parent": "def", "shadow": true,
                   "mutation": { "proccode": "jump", "argumentids": "[]",
                                 "argumentnames": "[]" } },
        "body": { "opcode": "motion_movesteps", "parent": "def" },
        "hat": { "opcode": "event_whenflagclicked", "next": "call",
                 "topLevel": true, "x": 300, "y": 0 },
        "call": { "opcode": "procedures_call", "parent": "hat",
                  "mutation": { "proccode": "jump", "argumentids": "[]" } }
    }));
    let report = run(&raw);
    let abstraction = report
        .grades
        .iter()
        .find(|g| g.category == analyzer::Category::Abstraction)
        .expect("abstraction graded");
    assert_eq!(abstraction.result.grade.points(), 1);
}

#[test]
fn long_script_threshold_comes_from_config() {
    let raw = sprite(serde_json::json!({
        "hat": { "opcode": "event_whenflagclicked", "next": "m1",
                 "topLevel": true, "x": 0, "y": 0 },
        "m1": { "opcode": "motion_movesteps", "parent": "hat", "next": "m2" },
        "m2": { "opcode": "motion_turnright", "parent": "m1", "next": "m3" },
        "m3": { "opcode": "motion_turnleft", "parent": "m2" }
    }));
    let strict = AnalyzerConfig {
        long_script_lines: 2,
        ..AnalyzerConfig::default()
    };
    let report = run_with(&raw, &strict);
    let hits: Vec<_> = report
        .warnings
        .iter()
        .filter(|t| t.title == "warning.scriptIsTooLongTitle")
        .collect();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].payload.get("length").map(String::as_str), Some("4"));

    let lax = run(&raw);
    assert!(lax
        .warnings
        .iter()
        .all(|t| t.title != "warning.scriptIsTooLongTitle"));
}

#[test]
fn grades_serialize_as_numbers() {
    let raw = sprite(serde_json::json!({
        "hat": { "opcode": "event_whenflagclicked", "next": "move",
                 "topLevel": true, "x": 0, "y": 0 },
        "move": { "opcode": "motion_movesteps", "parent": "hat" }
    }));
    let report = run(&raw);
    let json = serde_json::to_value(&report).expect("report serializes");
    let flow = &json["grades"][0];
    assert_eq!(flow["category"], "flow");
    assert_eq!(flow["max_grade"], 3);
    assert!(flow["grade"].is_u64());
}

#[test]
fn project_loads_from_a_file_on_disk() {
    let raw_json = serde_json::json!({
        "targets": [
            { "isStage": true, "name": "Stage" },
            {
                "isStage": false, "name": "Player",
                "blocks": {
                    "hat": { "opcode": "event_whenflagclicked", "next": "move",
                             "topLevel": true, "x": 0, "y": 0 },
                    "move": { "opcode": "motion_movesteps", "parent": "hat",
                              "inputs": { "STEPS": [1, [4, "10"]] } }
                }
            }
        ]
    });
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, "{}", raw_json).expect("write fixture");
    let source = std::fs::read_to_string(file.path()).expect("read back");
    let raw: RawProject = serde_json::from_str(&source).expect("parse from disk");
    let report = run(&raw);
    assert_eq!(report.max_grade, 21);
    assert!(report.total_grade >= 1);
}
