use serde::Serialize;
use serde_json::{Map, Value};

use crate::cli::OutputFormat;
use crate::ui;

pub mod table;

/// Columns that lead a table when present, in this order.
const LEADING_COLUMNS: [&str; 4] = ["key", "requirement_key", "requirement_type", "title"];

/// Render a serializable response to a string in the requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Table => Ok(render_table(serde_json::to_value(value)?)),
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
    }
}

/// Print a serializable response in the requested format.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

fn options() -> table::TableOptions {
    let prefs = ui::prefs();
    table::TableOptions {
        max_width: prefs.term_width,
        color: prefs.table_color,
    }
}

fn render_table(value: Value) -> String {
    match value {
        Value::Array(items) => render_rows(&items),
        Value::Object(map) => render_object(&map),
        scalar => table::render_table(&["value"], &[vec![cell(&scalar)]], options()),
    }
}

/// A wrapper like `{"requirements": [...]}` renders as its list; any other
/// object renders as key/value pairs.
fn render_object(map: &Map<String, Value>) -> String {
    if map.len() == 1 {
        if let Some(Value::Array(items)) = map.values().next() {
            return render_rows(items);
        }
    }
    let rows = map
        .iter()
        .map(|(key, value)| vec![key.clone(), cell(value)])
        .collect::<Vec<_>>();
    table::render_table(&["field", "value"], &rows, options())
}

fn render_rows(items: &[Value]) -> String {
    if items.is_empty() {
        return String::from("(no rows)");
    }
    if !items.iter().all(Value::is_object) {
        let rows = items.iter().map(|item| vec![cell(item)]).collect::<Vec<_>>();
        return table::render_table(&["value"], &rows, options());
    }

    let headers = column_order(items);
    let header_refs = headers.iter().map(String::as_str).collect::<Vec<_>>();
    let rows = items
        .iter()
        .filter_map(Value::as_object)
        .map(|map| {
            headers
                .iter()
                .map(|header| map.get(header).map_or_else(|| String::from("-"), cell))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    table::render_table(&header_refs, &rows, options())
}

/// Union of object keys: identifying columns first, then alphabetical.
/// Row ids and timestamps are left to `--format json`.
fn column_order(items: &[Value]) -> Vec<String> {
    let mut rest = Vec::<String>::new();
    for key in items.iter().filter_map(Value::as_object).flat_map(Map::keys) {
        let hidden = key == "id" || key.ends_with("_id") || key.ends_with("_at");
        if !hidden && !LEADING_COLUMNS.contains(&key.as_str()) && !rest.contains(key) {
            rest.push(key.clone());
        }
    }
    rest.sort();

    let present = |column: &str| {
        items
            .iter()
            .filter_map(Value::as_object)
            .any(|map| map.contains_key(column))
    };
    LEADING_COLUMNS
        .into_iter()
        .filter(|column| present(column))
        .map(str::to_string)
        .chain(rest)
        .collect()
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::from("-"),
        Value::Bool(v) => v.to_string(),
        Value::Number(v) => v.to_string(),
        Value::String(v) => v.clone(),
        Value::Array(items) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        other => serde_json::to_string(other).unwrap_or_else(|_| String::from("<invalid-json>")),
    }
}
