//! Serde mapping of the project JSON produced by the Scratch 3 exporter.
//!
//! The format is external and must be accepted bit-exactly: `null` and
//! absent are distinct for link fields, input slots may be present but
//! reference nothing, and the `blocks` map can contain bare-array entries
//! (loose reporter primitives) next to real block objects.

mod input;

pub use input::{Field, Input, Literal};

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;

/// A whole exported project: one stage target plus zero or more sprites.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawProject {
    #[serde(default)]
    pub targets: Vec<RawTarget>,
    #[serde(default)]
    pub monitors: Value,
    #[serde(default)]
    pub extensions: Value,
    #[serde(default)]
    pub meta: Value,
}

/// A stage or sprite with its flat block map and local declarations.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawTarget {
    #[serde(default)]
    pub is_stage: bool,
    #[serde(default)]
    pub name: String,
    /// Variable id -> `[name, initial value]`.
    #[serde(default)]
    pub variables: BTreeMap<String, Value>,
    /// List id -> `[name, [initial contents]]`.
    #[serde(default)]
    pub lists: BTreeMap<String, Value>,
    /// Broadcast id -> message name.
    #[serde(default)]
    pub broadcasts: BTreeMap<String, String>,
    #[serde(default)]
    pub blocks: Blocks,
    #[serde(default)]
    pub comments: BTreeMap<String, RawComment>,
}

impl RawTarget {
    /// Names of locally declared variables, in declaration-map order.
    pub fn variable_names(&self) -> Vec<&str> {
        self.variables.values().filter_map(declared_name).collect()
    }

    /// Names of locally declared lists, in declaration-map order.
    pub fn list_names(&self) -> Vec<&str> {
        self.lists.values().filter_map(declared_name).collect()
    }

    /// Names of broadcasts declared on this target.
    pub fn broadcast_names(&self) -> Vec<&str> {
        self.broadcasts.values().map(String::as_str).collect()
    }
}

/// First element of a `[name, value]` declaration pair.
fn declared_name(decl: &Value) -> Option<&str> {
    decl.as_array()?.first()?.as_str()
}

/// A workspace comment, anchored to a block and a canvas rectangle.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawComment {
    #[serde(default)]
    pub block_id: Option<String>,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub minimized: bool,
    #[serde(default)]
    pub text: String,
}

/// One node of the block graph. Links (`next`, `parent`, input slot
/// references) are plain identifiers resolved through [`Blocks`] at
/// traversal time; a dangling identifier resolves to "absent".
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawBlock {
    #[serde(default)]
    pub opcode: String,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub inputs: BTreeMap<String, Input>,
    #[serde(default)]
    pub fields: BTreeMap<String, Field>,
    #[serde(default)]
    pub shadow: bool,
    #[serde(default)]
    pub top_level: bool,
    #[serde(default)]
    pub mutation: Option<Mutation>,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
}

impl RawBlock {
    /// Input slot lookup. Absent slot is `None`; a slot that is present
    /// but references nothing is `Some` with [`Input::is_filled`] false.
    pub fn input(&self, name: &str) -> Option<&Input> {
        self.inputs.get(name)
    }

    /// Chosen option string of a field slot, if the slot exists.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Field::option)
    }

    /// Custom-procedure signature carried by prototypes and calls.
    pub fn proccode(&self) -> Option<&str> {
        self.mutation.as_ref().and_then(|m| m.proccode.as_deref())
    }
}

/// Procedure mutation data. `argumentnames` is serialized by the exporter
/// as a JSON-encoded string, but older exports carry a plain array; both
/// are accepted.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Mutation {
    #[serde(default)]
    pub proccode: Option<String>,
    #[serde(default)]
    pub argumentids: Value,
    #[serde(default)]
    pub argumentnames: Value,
    #[serde(default)]
    pub warp: Value,
}

impl Mutation {
    pub fn argument_names(&self) -> Vec<String> {
        string_list(&self.argumentnames)
    }

    pub fn argument_ids(&self) -> Vec<String> {
        string_list(&self.argumentids)
    }
}

fn string_list(value: &Value) -> Vec<String> {
    let parsed;
    let array = match value {
        Value::Array(items) => items,
        Value::String(encoded) => {
            parsed = serde_json::from_str::<Value>(encoded).unwrap_or(Value::Null);
            match &parsed {
                Value::Array(_) => parsed.as_array().unwrap(),
                _ => return Vec::new(),
            }
        }
        _ => return Vec::new(),
    };
    array
        .iter()
        .map(|item| match item {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect()
}

/// The block map of a target, preserving JSON declaration order.
///
/// Script extraction must be declaration-ordered while lookups stay cheap,
/// so entries are kept as an ordered list plus an id index. Map values
/// that are not block objects (bare reporter primitives) are dropped
/// during deserialization.
#[derive(Debug, Clone, Default)]
pub struct Blocks {
    entries: Vec<(String, RawBlock)>,
    index: HashMap<String, usize>,
}

impl Blocks {
    pub fn from_entries(entries: Vec<(String, RawBlock)>) -> Self {
        let index = entries
            .iter()
            .enumerate()
            .map(|(i, (id, _))| (id.clone(), i))
            .collect();
        Blocks { entries, index }
    }

    pub fn get(&self, id: &str) -> Option<&RawBlock> {
        self.index.get(id).map(|&i| &self.entries[i].1)
    }

    /// Lookup that also returns the map's own copy of the id, for
    /// traversals that need a borrow outliving their probe string.
    pub fn get_key_value(&self, id: &str) -> Option<(&str, &RawBlock)> {
        self.index
            .get_key_value(id)
            .map(|(key, &i)| (key.as_str(), &self.entries[i].1))
    }

    /// Iterate `(id, block)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawBlock)> {
        self.entries.iter().map(|(id, b)| (id.as_str(), b))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'de> Deserialize<'de> for Blocks {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct BlocksVisitor;

        impl<'de> Visitor<'de> for BlocksVisitor {
            type Value = Blocks;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of block id to block object")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Blocks, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((id, value)) = access.next_entry::<String, Value>()? {
                    // Non-object entries are loose primitives; a malformed
                    // object contributes nothing rather than failing the run.
                    if value.is_object() {
                        if let Ok(block) = serde_json::from_value::<RawBlock>(value) {
                            entries.push((id, block));
                        }
                    }
                }
                Ok(Blocks::from_entries(entries))
            }
        }

        deserializer.deserialize_map(BlocksVisitor)
    }
}
