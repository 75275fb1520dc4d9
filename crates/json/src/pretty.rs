//! Human-oriented printer that keeps attached comments and blank lines.
//!
//! The output is JSON when `comments` is off; with comments it is a JSON
//! document with `//`/`/* */` annotations, which the JEL parser reads back.
use crate::container::Entry;
use crate::flags::Flags;
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct PrettyOptions {
    pub indent: usize,
    /// Emit comments and blank lines recorded in entry formats.
    pub comments: bool,
    /// Arrays of scalars shorter than this are printed on one line.
    pub inline_width: usize,
}

impl Default for PrettyOptions {
    fn default() -> Self {
        Self {
            indent: 2,
            comments: true,
            inline_width: 60,
        }
    }
}

pub fn to_string_pretty(value: &Value, options: &PrettyOptions) -> String {
    let mut out = String::new();
    write_value(&mut out, value, Flags::NONE, 0, options);
    out
}

fn compact(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

fn inline_text(entries: &[Entry], flags: Flags, options: &PrettyOptions) -> Option<String> {
    if flags.contains(Flags::NOINLINE) {
        return None;
    }
    let mut parts = Vec::with_capacity(entries.len());
    for entry in entries {
        if entry.value.is_container() && entry.value.truthy() {
            return None;
        }
        if entry.flags.contains(Flags::NOINLINE) || (options.comments && !entry.format.is_empty()) {
            return None;
        }
        parts.push(compact(&entry.value));
    }
    let text = format!("[{}]", parts.join(", "));
    (text.len() <= options.inline_width).then_some(text)
}

fn write_format(out: &mut String, entry: &Entry, pad: &str, first: bool, options: &PrettyOptions) {
    if !options.comments {
        return;
    }
    if !first {
        for _ in 0..entry.format.blank_lines.min(2) {
            out.push('\n');
        }
    }
    for comment in &entry.format.comments {
        for line in comment.lines() {
            out.push_str(pad);
            out.push_str(line.trim_start());
            out.push('\n');
        }
    }
}

fn write_value(out: &mut String, value: &Value, flags: Flags, depth: usize, options: &PrettyOptions) {
    let pad = " ".repeat(options.indent * (depth + 1));
    let close_pad = " ".repeat(options.indent * depth);
    match value {
        Value::Array(array) => {
            let entries: Vec<Entry> = array.entries().into_iter().filter(Entry::is_visible).collect();
            if entries.is_empty() {
                out.push_str("[]");
                return;
            }
            if let Some(text) = inline_text(&entries, flags, options) {
                out.push_str(&text);
                return;
            }
            out.push_str("[\n");
            for (i, entry) in entries.iter().enumerate() {
                write_format(out, entry, &pad, i == 0, options);
                out.push_str(&pad);
                write_value(out, &entry.value, entry.flags, depth + 1, options);
                if i + 1 < entries.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&close_pad);
            out.push(']');
        }
        Value::Object(object) => {
            let entries: Vec<(String, Entry)> = object
                .entries()
                .into_iter()
                .filter(|(_, e)| e.is_visible())
                .collect();
            if entries.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push_str("{\n");
            for (i, (key, entry)) in entries.iter().enumerate() {
                write_format(out, entry, &pad, i == 0, options);
                out.push_str(&pad);
                out.push_str(&compact(&Value::String(key.clone())));
                out.push_str(": ");
                write_value(out, &entry.value, entry.flags, depth + 1, options);
                if i + 1 < entries.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&close_pad);
            out.push('}');
        }
        scalar => out.push_str(&compact(scalar)),
    }
}
