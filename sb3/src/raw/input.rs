use serde::Deserialize;
use serde_json::Value;

/// One input slot: `[shadow_state, value, obscured_default?]`.
///
/// The value at index 1 is a block-id string (reference), a literal
/// descriptor array, or `null` when the slot references nothing.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Input(pub Vec<Value>);

impl Input {
    fn value(&self) -> Option<&Value> {
        self.0.get(1)
    }

    /// True when the slot actually carries a value: present-but-null
    /// counts as empty, exactly like an absent slot does for validators.
    pub fn is_filled(&self) -> bool {
        matches!(self.value(), Some(v) if !v.is_null())
    }

    /// The referenced block id, when the slot holds a reference.
    pub fn block_id(&self) -> Option<&str> {
        self.value()?.as_str()
    }

    /// The inline literal, when the slot holds a literal descriptor.
    pub fn literal(&self) -> Option<Literal> {
        Literal::from_descriptor(self.value()?)
    }
}

/// A decoded inline literal descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(String),
    Color(String),
    Text(String),
    Broadcast(String),
    Variable(String),
    List(String),
}

impl Literal {
    /// Decode `[type_code, value, ...]`. Codes 4-8 are numeric flavors,
    /// 9 color, 10 string, 11 broadcast, 12 variable, 13 list.
    pub fn from_descriptor(value: &Value) -> Option<Literal> {
        let parts = value.as_array()?;
        let code = parts.first()?.as_u64()?;
        let text = match parts.get(1)? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        match code {
            4..=8 => Some(Literal::Number(text)),
            9 => Some(Literal::Color(text)),
            10 => Some(Literal::Text(text)),
            11 => Some(Literal::Broadcast(text)),
            12 => Some(Literal::Variable(text)),
            13 => Some(Literal::List(text)),
            _ => None,
        }
    }

    /// True for plain value literals (numbers, colors, text), false for
    /// named references (broadcast, variable, list).
    pub fn is_plain(&self) -> bool {
        matches!(
            self,
            Literal::Number(_) | Literal::Color(_) | Literal::Text(_)
        )
    }

    pub fn name(&self) -> &str {
        match self {
            Literal::Number(s)
            | Literal::Color(s)
            | Literal::Text(s)
            | Literal::Broadcast(s)
            | Literal::Variable(s)
            | Literal::List(s) => s,
        }
    }
}

/// One field slot: `[chosen_option, option_id?]`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Field(pub Vec<Value>);

impl Field {
    /// The chosen option string, if the field holds one.
    pub fn option(&self) -> Option<&str> {
        self.0.first()?.as_str()
    }
}
