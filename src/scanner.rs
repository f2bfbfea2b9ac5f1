use std::fs;
use std::path::{Path, PathBuf};

use poem_types::Poem;
use serde_json::Value;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Poems at or under this many characters are dropped.
const MIN_CONTENT_CHARS: usize = 10;

/// Keys that may hold the poem body, in priority order.
const CONTENT_KEYS: &[&str] = &["content", "text", "paragraphs", "poem"];
/// Keys that may hold the dynasty, in priority order.
const DYNASTY_KEYS: &[&str] = &["dynasty", "era", "period"];

const UNKNOWN_TITLE: &str = "未知标题";
const UNKNOWN_AUTHOR: &str = "未知作者";
const UNKNOWN_DYNASTY: &str = "未知";

/// Scan corpus roots for `*.json` poem files and normalize every record
/// into a [`Poem`].
///
/// Expected layout (as in the chinese-poetry collection):
///   {root}/**/{name}.json  — one poem object or an array of them
///
/// Missing roots and unreadable files are logged and skipped. Stops once
/// `max_poems` poems are collected.
pub fn scan_corpus(roots: &[PathBuf], max_poems: usize) -> Vec<Poem> {
    let mut poems = Vec::new();

    'roots: for root in roots {
        if !root.exists() {
            warn!(root = %root.display(), "corpus directory not found, skipping");
            continue;
        }

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!(root = %root.display(), error = %e, "cannot walk corpus entry, skipping");
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some("json")
            {
                continue;
            }

            for poem in read_poem_file(path) {
                poems.push(poem);
                if poems.len() >= max_poems {
                    break 'roots;
                }
            }
        }
    }

    info!(count = poems.len(), "poems loaded");
    poems
}

fn read_poem_file(path: &Path) -> Vec<Poem> {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read poem file");
            return Vec::new();
        }
    };
    let value: Value = match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot parse poem file");
            return Vec::new();
        }
    };

    let source = path.display().to_string();
    let items = match value {
        Value::Array(items) => items,
        other => vec![other],
    };
    let poems: Vec<Poem> = items
        .iter()
        .filter_map(|item| normalize_poem(item, &source))
        .collect();
    debug!(path = %source, count = poems.len(), "poem file read");
    poems
}

/// Map one raw JSON record onto the canonical [`Poem`] shape.
/// Returns `None` for non-objects and poems that are too short.
fn normalize_poem(item: &Value, source: &str) -> Option<Poem> {
    let obj = item.as_object()?;

    let content = CONTENT_KEYS
        .iter()
        .find_map(|k| obj.get(*k))
        .and_then(flatten_content)?;
    if content.chars().count() <= MIN_CONTENT_CHARS {
        return None;
    }

    let field = |key: &str, default: &str| {
        obj.get(key)
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    };
    let dynasty = DYNASTY_KEYS
        .iter()
        .filter_map(|k| obj.get(*k).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| infer_dynasty(source))
        .to_string();

    Some(Poem {
        title: field("title", UNKNOWN_TITLE),
        author: field("author", UNKNOWN_AUTHOR),
        content,
        dynasty,
        source_path: Some(source.to_string()),
    })
}

/// A string as-is, or an array of strings joined without separator.
fn flatten_content(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Array(lines) => Some(lines.iter().filter_map(Value::as_str).collect()),
        _ => None,
    }
}

/// Guess the dynasty from the collection directory a file lives in.
pub fn infer_dynasty(path: &str) -> &'static str {
    if path.contains("全唐诗") {
        "唐"
    } else if path.contains("五代") {
        "五代"
    } else if path.contains("宋词") {
        "宋"
    } else if path.contains("元曲") {
        "元"
    } else {
        UNKNOWN_DYNASTY
    }
}
