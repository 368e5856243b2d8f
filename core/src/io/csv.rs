//! CSV reading and writing for tables.
//!
//! Reading infers cell types the way a spreadsheet import would: blank and
//! single-space cells are null, digit runs (optionally with `,` thousands
//! separators) are integers, decimal numbers are floats, everything else is
//! text. Quoted fields follow RFC 4180.

use crate::{
    error::{AttributionError, AttributionResult},
    table::{Table, Value},
};
use std::path::Path;

pub fn read_csv_file(path: impl AsRef<Path>) -> AttributionResult<Table> {
    let content = std::fs::read_to_string(path)?;
    parse_csv(&content)
}

pub fn write_csv_file(path: impl AsRef<Path>, table: &Table) -> AttributionResult<()> {
    std::fs::write(path, to_csv(table))?;
    Ok(())
}

pub fn parse_csv(content: &str) -> AttributionResult<Table> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut records = split_records(content)?.into_iter();
    let Some((_, header)) = records.next() else {
        return Err(AttributionError::Csv {
            line: 1,
            reason: "missing header row".to_string(),
        });
    };
    let mut table = Table::new(header.into_iter().map(|f| f.text));
    for (line, fields) in records {
        if fields.len() != table.columns().len() {
            return Err(AttributionError::Csv {
                line,
                reason: format!(
                    "expected {} fields, found {}",
                    table.columns().len(),
                    fields.len()
                ),
            });
        }
        table.push_row(fields.into_iter().map(infer_value).collect())?;
    }
    Ok(table)
}

pub fn to_csv(table: &Table) -> String {
    let mut out = String::new();
    push_record(&mut out, table.columns().iter().map(String::as_str));
    for row in table.rows() {
        let cells: Vec<String> = row.iter().map(Value::to_string).collect();
        push_record(&mut out, cells.iter().map(String::as_str));
    }
    out
}

fn push_record<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    let escaped: Vec<String> = fields.map(escape_field).collect();
    out.push_str(&escaped.join(","));
    out.push('\n');
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

struct Field {
    text: String,
    quoted: bool,
}

/// Split into records of fields, tagging each record with its starting line.
/// Blank lines between records are ignored.
fn split_records(content: &str) -> AttributionResult<Vec<(usize, Vec<Field>)>> {
    let mut records = Vec::new();
    let mut fields: Vec<Field> = Vec::new();
    let mut current = Field {
        text: String::new(),
        quoted: false,
    };
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    current.text.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    current.text.push(c);
                }
                _ => current.text.push(c),
            }
            continue;
        }
        match c {
            '"' if current.text.is_empty() && !current.quoted => {
                in_quotes = true;
                current.quoted = true;
            }
            '"' => {
                return Err(AttributionError::Csv {
                    line,
                    reason: "unexpected quote inside unquoted field".to_string(),
                })
            }
            ',' => fields.push(std::mem::replace(
                &mut current,
                Field {
                    text: String::new(),
                    quoted: false,
                },
            )),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                end_record(&mut records, &mut fields, &mut current, record_line);
                line += 1;
                record_line = line;
            }
            _ => current.text.push(c),
        }
    }
    if in_quotes {
        return Err(AttributionError::Csv {
            line: record_line,
            reason: "unterminated quoted field".to_string(),
        });
    }
    end_record(&mut records, &mut fields, &mut current, record_line);
    Ok(records)
}

fn end_record(
    records: &mut Vec<(usize, Vec<Field>)>,
    fields: &mut Vec<Field>,
    current: &mut Field,
    line: usize,
) {
    let last = std::mem::replace(
        current,
        Field {
            text: String::new(),
            quoted: false,
        },
    );
    if fields.is_empty() && last.text.is_empty() && !last.quoted {
        return;
    }
    fields.push(last);
    records.push((line, std::mem::take(fields)));
}

fn infer_value(field: Field) -> Value {
    let text = field.text;
    if text.is_empty() || text == " " {
        return Value::Null;
    }
    let trimmed = text.trim();
    if let Some(i) = parse_integer(trimmed) {
        return Value::Int(i);
    }
    if looks_numeric(trimmed) {
        if let Ok(f) = trimmed.parse::<f64>() {
            return Value::Float(f);
        }
    }
    Value::Text(text)
}

fn parse_integer(s: &str) -> Option<i64> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(i);
    }
    let digits = s.strip_prefix('-').unwrap_or(s);
    let mut groups = digits.split(',');
    let head = groups.next()?;
    let grouped = (1..=3).contains(&head.len())
        && head.bytes().all(|b| b.is_ascii_digit())
        && digits.contains(',')
        && groups.all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit()));
    if grouped {
        s.replace(',', "").parse().ok()
    } else {
        None
    }
}

/// Guard against `f64::from_str` accepting words like "inf" and "NaN".
fn looks_numeric(s: &str) -> bool {
    s.bytes().any(|b| b.is_ascii_digit())
        && s.bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
}
