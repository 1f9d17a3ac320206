use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::catalog::Catalog;
use crate::entry::{Entry, EntryField, Field, FieldValue, PLACEHOLDER_AUTHOR};

/// Minimal entry for a patch file no entry describes yet.
pub fn placeholder_entry(filename: &str) -> Entry {
    Entry {
        line: 0,
        fields: vec![
            text_field(Field::Name, &file_stem(filename)),
            text_field(Field::File, filename),
            list_field(Field::Authors, vec![PLACEHOLDER_AUTHOR.to_string()]),
        ],
    }
}

/// Filename without its final extension.
pub fn file_stem(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| filename.to_string())
}

/// Scalar field whose raw text is the YAML rendering of `value`; blank values stay blank.
pub(crate) fn text_field(field: Field, value: &str) -> EntryField {
    if value.is_empty() {
        return EntryField {
            field,
            value: FieldValue::Empty,
            raw: String::new(),
        };
    }
    EntryField {
        field,
        value: FieldValue::Text(value.to_string()),
        raw: format!(" {}", render_yaml_scalar(value)),
    }
}

pub(crate) fn list_field(field: Field, items: Vec<String>) -> EntryField {
    EntryField {
        field,
        value: FieldValue::List(items),
        raw: String::new(),
    }
}

/// Canonical catalog text: header, then entries sorted by name, one blank line apart.
pub fn normalize(catalog: &Catalog, uncovered: &[String]) -> String {
    let mut entries = catalog.entries.clone();
    entries.extend(uncovered.iter().map(|filename| placeholder_entry(filename)));
    entries.sort_by_key(|entry| entry.name().to_uppercase());

    let mut blocks = Vec::with_capacity(entries.len() + 1);
    if !catalog.header.is_empty() {
        blocks.push(catalog.header.join("\n"));
    }
    blocks.extend(entries.iter().map(render_entry));

    if blocks.is_empty() {
        return String::new();
    }
    let mut output = blocks.join("\n\n");
    output.push('\n');
    output
}

/// Render one entry with its fields in canonical order, without a trailing newline.
pub fn render_entry(entry: &Entry) -> String {
    let mut fields = entry.fields.iter().collect::<Vec<_>>();
    fields.sort_by_key(|item| item.field);

    let mut output = String::new();
    for (index, item) in fields.into_iter().enumerate() {
        if index == 0 {
            output.push_str("- ");
        } else {
            output.push_str("\n  ");
        }
        output.push_str(item.field.as_str());
        output.push(':');
        match &item.value {
            FieldValue::List(items) if items.is_empty() => output.push_str(" []"),
            FieldValue::List(items) => {
                for value in items {
                    output.push_str("\n  - ");
                    output.push_str(&render_yaml_scalar(value));
                }
            }
            _ => output.push_str(&render_scalar_raw(&item.raw)),
        }
    }
    output
}

/// Scalars keep their source text: one space after the key for inline values,
/// verbatim when the value starts on the following line.
fn render_scalar_raw(raw: &str) -> String {
    let value = raw.trim_start_matches([' ', '\t']);
    if value.is_empty() || value.starts_with('\n') {
        value.to_string()
    } else {
        format!(" {value}")
    }
}

/// Single-line YAML form of a string: plain when safe, quoted otherwise.
fn render_yaml_scalar(text: &str) -> String {
    let rendered = serde_yaml::to_string(text)
        .ok()
        .map(|rendered| rendered.trim_end().to_string())
        .filter(|rendered| !rendered.contains('\n'));
    rendered
        .or_else(|| serde_json::to_string(text).ok())
        .unwrap_or_else(|| format!("{text:?}"))
}

/// Full-file replace of the catalog.
pub fn write_catalog(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = text.len(), "wrote catalog");
    Ok(())
}
