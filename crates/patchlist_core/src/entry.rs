use serde::Serialize;
use serde_yaml::Value;

/// Author sentinel marking an entry that still needs a human to fill it in.
pub const PLACEHOLDER_AUTHOR: &str = "ADDME!";

/// Catalog keys. Declaration order is the canonical output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Date,
    File,
    Authors,
    Source,
    Yt,
    Link,
    Desc,
    Screenshots,
    Tags,
    Extras,
}

impl Field {
    pub const ALL: [Field; 11] = [
        Field::Name,
        Field::Date,
        Field::File,
        Field::Authors,
        Field::Source,
        Field::Yt,
        Field::Link,
        Field::Desc,
        Field::Screenshots,
        Field::Tags,
        Field::Extras,
    ];

    pub const REQUIRED: [Field; 3] = [Field::Name, Field::File, Field::Authors];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Date => "date",
            Self::File => "file",
            Self::Authors => "authors",
            Self::Source => "source",
            Self::Yt => "yt",
            Self::Link => "link",
            Self::Desc => "desc",
            Self::Screenshots => "screenshots",
            Self::Tags => "tags",
            Self::Extras => "extras",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == key)
    }

    pub fn is_list(self) -> bool {
        matches!(
            self,
            Self::Authors | Self::Screenshots | Self::Tags | Self::Extras
        )
    }
}

/// Decoded value of a field that is present in an entry.
///
/// Numbers and booleans keep their textual form so `date: 2021` reads the
/// same as `date: "2021"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Present with no value (`date:`).
    Empty,
    Text(String),
    List(Vec<String>),
    /// Anything that is neither text nor a flat list; carries a type name for diagnostics.
    Other(&'static str),
}

impl FieldValue {
    pub fn from_yaml(value: &Value) -> Self {
        match value {
            Value::Null => Self::Empty,
            Value::Sequence(items) => match items.iter().map(scalar_text).collect::<Option<_>>() {
                Some(items) => Self::List(items),
                None => Self::Other("list with non-text items"),
            },
            Value::Mapping(_) => Self::Other("mapping"),
            Value::Tagged(_) => Self::Other("tagged value"),
            scalar => scalar_text(scalar).map_or(Self::Other("unknown"), Self::Text),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Empty => "null",
            Self::Text(_) => "string",
            Self::List(_) => "list",
            Self::Other(name) => name,
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryField {
    pub field: Field,
    pub value: FieldValue,
    /// Source text after the key's colon, trailing whitespace removed.
    pub raw: String,
}

/// One catalog record. Fields keep their source order until rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// 1-based line the entry starts at; 0 for synthesized entries.
    pub line: usize,
    pub fields: Vec<EntryField>,
}

impl Entry {
    /// `None` when the field is not set at all; `Some(FieldValue::Empty)` when it is set blank.
    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|item| item.field == field)
            .map(|item| &item.value)
    }

    pub fn text(&self, field: Field) -> Option<&str> {
        match self.get(field) {
            Some(FieldValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Items of a list field; empty when the field is absent or not a list.
    pub fn list(&self, field: Field) -> &[String] {
        match self.get(field) {
            Some(FieldValue::List(items)) => items,
            _ => &[],
        }
    }

    pub fn name(&self) -> &str {
        self.text(Field::Name).unwrap_or("")
    }

    /// How diagnostics refer to the entry.
    pub fn label(&self) -> String {
        match self.text(Field::Name) {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ if self.line == 0 => "<unnamed entry>".to_string(),
            _ => format!("entry at line {}", self.line),
        }
    }
}
