//! English text for the diagnostic keys. Tips carry opaque keys plus a
//! payload; this is the one place the keys become sentences.

use std::collections::BTreeMap;

const TEMPLATES: &[(&str, &str)] = &[
    ("warning.lostCodeTitle", "Lost code"),
    (
        "warning.lostCode",
        "\"{target}\" contains blocks that no trigger will ever run.",
    ),
    ("warning.spriteStandardNameTitle", "Default sprite name"),
    (
        "warning.spriteStandardName",
        "Sprite \"{target}\" still has an editor default name.",
    ),
    ("warning.unusedVariablesTitle", "Unused variable"),
    (
        "warning.unusedVariables",
        "Variable \"{variable}\" of \"{target}\" is never read or written.",
    ),
    ("warning.scriptsOverlapTitle", "Overlapping scripts"),
    (
        "warning.scriptsOverlap",
        "Two scripts of \"{target}\" overlap in the workspace.",
    ),
    ("warning.scriptIsTooLongTitle", "Script too long"),
    (
        "warning.scriptIsTooLong",
        "A script of \"{target}\" has {length} statements; consider splitting it.",
    ),
    ("warning.noCommentsTitle", "No comments"),
    (
        "warning.noComments",
        "\"{target}\" has a script of {maxLength} statements and not a single comment.",
    ),
    ("warning.emptySpriteTitle", "Empty sprite"),
    (
        "warning.emptySprite",
        "Sprite \"{spriteName}\" has no blocks at all.",
    ),
    ("error.varWithoutInitTitle", "Variable used before set"),
    (
        "error.varWithoutInit",
        "Variable \"{variable}\" of \"{target}\" is read or changed but never set.",
    ),
    ("error.literalComparisonTitle", "Constant comparison"),
    (
        "error.literalComparison",
        "A script of \"{target}\" compares two fixed values; the outcome never changes.",
    ),
    ("error.messageNeverReceivedTitle", "Message never received"),
    (
        "error.messageNeverReceived",
        "\"{target}\" broadcasts \"{broadcast}\" but no script receives it.",
    ),
    ("error.messageNeverSentTitle", "Message never sent"),
    (
        "error.messageNeverSent",
        "\"{target}\" waits for \"{broadcast}\" but no script sends it.",
    ),
];

/// Resolve `key` against the catalog and interpolate `{name}` markers
/// from the payload. Unknown keys pass through unchanged so nothing is
/// silently dropped.
pub fn resolve(key: &str, payload: &BTreeMap<String, String>) -> String {
    let template = TEMPLATES
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, t)| *t)
        .unwrap_or(key);
    let mut text = template.to_string();
    for (name, value) in payload {
        text = text.replace(&format!("{{{}}}", name), value);
    }
    text
}
