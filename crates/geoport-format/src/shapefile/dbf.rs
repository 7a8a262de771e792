//! dBASE III `.dbf` attribute table writer.

use chrono::{Datelike, NaiveDate};
use geoport_types::Properties;
use serde_json::Value;
use std::io::Write;

use crate::FormatError;

const VERSION: u8 = 0x03;
const HEADER_TERMINATOR: u8 = 0x0D;
const END_OF_FILE: u8 = 0x1A;
const NAME_BYTES: usize = 10;
const MAX_CHAR_WIDTH: usize = 254;
const MAX_NUMERIC_WIDTH: usize = 19;
const MAX_DECIMALS: usize = 15;

/// dBASE column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Numeric,
    Logical,
    Character,
}

impl FieldKind {
    const fn code(self) -> u8 {
        match self {
            Self::Numeric => b'N',
            Self::Logical => b'L',
            Self::Character => b'C',
        }
    }
}

#[derive(Debug, Clone)]
struct Field {
    key: String,
    name: String,
    kind: FieldKind,
    width: usize,
    decimals: usize,
}

impl Field {
    fn cell(&self, value: Option<&Value>) -> Vec<u8> {
        let value = value.filter(|v| !v.is_null());
        let text = match (self.kind, value) {
            (_, None) if self.kind == FieldKind::Logical => "?".to_string(),
            (_, None) => String::new(),
            (FieldKind::Logical, Some(Value::Bool(flag))) => if *flag { "T" } else { "F" }.to_string(),
            (_, Some(Value::String(text))) => text.clone(),
            (_, Some(other)) => other.to_string(),
        };

        let mut bytes = truncate_bytes(&text, self.width).as_bytes().to_vec();
        let padding = self.width - bytes.len();
        if self.kind == FieldKind::Numeric {
            let mut padded = vec![b' '; padding];
            padded.append(&mut bytes);
            padded
        } else {
            bytes.resize(self.width, b' ');
            bytes
        }
    }
}

/// Truncates to at most `max` bytes on a character boundary.
fn truncate_bytes(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Picks a unique column name of at most ten bytes.
fn column_name(key: &str, taken: &[Field]) -> String {
    let base = match truncate_bytes(key.trim(), NAME_BYTES) {
        "" => "field",
        name => name,
    };
    let is_taken = |candidate: &str| taken.iter().any(|f| f.name.eq_ignore_ascii_case(candidate));
    if !is_taken(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| {
            let suffix = format!("_{n}");
            format!("{}{suffix}", truncate_bytes(base, NAME_BYTES - suffix.len()))
        })
        .find(|candidate| !is_taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

fn infer_field(key: &str, name: String, rows: &[Option<&Properties>]) -> Field {
    let values: Vec<&Value> = rows
        .iter()
        .filter_map(|row| row.and_then(|props| props.get(key)))
        .filter(|value| !value.is_null())
        .collect();

    if !values.is_empty() && values.iter().all(|v| v.is_boolean()) {
        return Field {
            key: key.to_string(),
            name,
            kind: FieldKind::Logical,
            width: 1,
            decimals: 0,
        };
    }

    if values.iter().all(|v| v.is_number()) {
        let texts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        let width = texts.iter().map(String::len).max().unwrap_or(1).max(1);
        if width <= MAX_NUMERIC_WIDTH && texts.iter().all(|t| !t.contains(['e', 'E'])) {
            let decimals = texts
                .iter()
                .filter_map(|t| t.split_once('.').map(|(_, frac)| frac.len()))
                .max()
                .unwrap_or(0)
                .min(MAX_DECIMALS);
            return Field {
                key: key.to_string(),
                name,
                kind: FieldKind::Numeric,
                width,
                decimals,
            };
        }
    }

    let width = values
        .iter()
        .map(|v| match v {
            Value::String(text) => text.len(),
            other => other.to_string().len(),
        })
        .max()
        .unwrap_or(1)
        .clamp(1, MAX_CHAR_WIDTH);
    Field {
        key: key.to_string(),
        name,
        kind: FieldKind::Character,
        width,
        decimals: 0,
    }
}

/// Builds the column layout from the property keys in first-seen order.
fn infer_fields(rows: &[Option<&Properties>]) -> Vec<Field> {
    let mut keys: Vec<&str> = Vec::new();
    for props in rows.iter().flatten() {
        for key in props.keys() {
            if !keys.contains(&key.as_str()) {
                keys.push(key);
            }
        }
    }

    let mut fields: Vec<Field> = Vec::with_capacity(keys.len());
    for key in keys {
        let name = column_name(key, &fields);
        fields.push(infer_field(key, name, rows));
    }
    fields
}

/// Writes a dBASE III table with one record per row.
///
/// When no row has properties, a numeric `id` column holding the 1-based
/// record number is written instead.
pub(crate) fn write_table<W: Write>(
    rows: &[Option<&Properties>],
    date: NaiveDate,
    mut writer: W,
) -> Result<(), FormatError> {
    let mut fields = infer_fields(rows);
    let synthetic_id = fields.is_empty();
    if synthetic_id {
        fields.push(Field {
            key: String::new(),
            name: "id".to_string(),
            kind: FieldKind::Numeric,
            width: rows.len().max(1).to_string().len(),
            decimals: 0,
        });
    }

    let header_len = u16::try_from(32 + 32 * fields.len() + 1)
        .map_err(|_| FormatError::Attributes(format!("too many columns ({})", fields.len())))?;
    let record_len = u16::try_from(1 + fields.iter().map(|f| f.width).sum::<usize>())
        .map_err(|_| FormatError::Attributes("record wider than 65535 bytes".to_string()))?;
    let record_count = u32::try_from(rows.len())
        .map_err(|_| FormatError::Attributes(format!("too many records ({})", rows.len())))?;

    let year = u8::try_from(date.year() - 1900).unwrap_or(u8::MAX);
    writer.write_all(&[VERSION, year, date.month() as u8, date.day() as u8])?;
    writer.write_all(&record_count.to_le_bytes())?;
    writer.write_all(&header_len.to_le_bytes())?;
    writer.write_all(&record_len.to_le_bytes())?;
    writer.write_all(&[0; 20])?;

    for field in &fields {
        let mut descriptor = [0u8; 32];
        descriptor[..field.name.len()].copy_from_slice(field.name.as_bytes());
        descriptor[11] = field.kind.code();
        descriptor[16] = field.width as u8;
        descriptor[17] = field.decimals as u8;
        writer.write_all(&descriptor)?;
    }
    writer.write_all(&[HEADER_TERMINATOR])?;

    for (index, row) in rows.iter().enumerate() {
        writer.write_all(b" ")?;
        for field in &fields {
            let cell = if synthetic_id {
                field.cell(Some(&Value::from(index + 1)))
            } else {
                field.cell(row.and_then(|props| props.get(&field.key)))
            };
            writer.write_all(&cell)?;
        }
    }
    writer.write_all(&[END_OF_FILE])?;
    Ok(())
}
