//! Value conversion helpers for Gherkin data tables
//!
//! Converts string values from feature files to engine types.

use cucumber::gherkin::Table;
use nusach_engine::{SectionLevel, SectionRecord, Value, VariableContext};

/// Convert a Gherkin table cell value to an engine Value.
///
/// Supports:
/// - `true` / `false` -> Bool
/// - JSON string arrays (`["א", "ב"]`) -> List
/// - Everything else -> String (escapes expanded)
pub fn convert_gherkin_value(val: &str) -> Value {
    let trimmed = val.trim();

    if trimmed == "true" {
        return Value::Bool(true);
    }
    if trimmed == "false" {
        return Value::Bool(false);
    }

    if trimmed.starts_with('[') {
        if let Ok(items) = serde_json::from_str::<Vec<String>>(trimmed) {
            return Value::List(items);
        }
    }

    Value::String(unescape(trimmed))
}

/// Expand `\n` and `\t` written inside a feature file string.
pub fn unescape(val: &str) -> String {
    val.replace("\\n", "\n").replace("\\t", "\t")
}

/// Parse a two-column Gherkin table into a context.
///
/// The table format is:
/// ```text
/// | name    | דנה  |
/// | has_car | true |
/// ```
pub fn parse_table_to_context(table: &Table) -> VariableContext {
    let mut ctx = VariableContext::new();

    for row in &table.rows {
        if row.len() >= 2 {
            ctx.insert(row[0].trim(), convert_gherkin_value(&row[1]));
        }
    }

    ctx
}

/// Parse a section table with a header row into records.
///
/// Recognized columns: `id`, `level`, `parent`, `order`, `title`, `content`,
/// `actor`, `condition`. Empty cells leave the field unset.
pub fn parse_section_records(table: &Table) -> Vec<SectionRecord> {
    let Some((header, rows)) = table.rows.split_first() else {
        return Vec::new();
    };

    rows.iter()
        .map(|row| {
            let cell = |name: &str| -> Option<&str> {
                header
                    .iter()
                    .position(|h| h.trim() == name)
                    .and_then(|i| row.get(i))
                    .map(|v| v.trim())
                    .filter(|v| !v.is_empty())
            };

            let level = match cell("level").unwrap_or("main") {
                "main" => SectionLevel::Main,
                "sub" => SectionLevel::Sub,
                "sub-sub" => SectionLevel::SubSub,
                other => panic!("Unknown section level '{other}'"),
            };
            let id = cell("id").expect("Section row needs an id");

            let mut record = SectionRecord::new(id, level);
            if let Some(parent) = cell("parent") {
                record = record.with_parent(parent);
            }
            if let Some(order) = cell("order") {
                record = record.with_order(order.parse().expect("order must be a number"));
            }
            if let Some(title) = cell("title") {
                record = record.with_title(unescape(title));
            }
            if let Some(content) = cell("content") {
                record = record.with_content(unescape(content));
            }
            if let Some(actor) = cell("actor") {
                record = record.with_actor(actor);
            }
            if let Some(condition) = cell("condition") {
                record = record.with_condition(condition);
            }
            record
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::panic, clippy::unwrap_used)]
mod tests {
    use super::{convert_gherkin_value, unescape};
    use nusach_engine::Value;

    #[test]
    fn test_convert_bool() {
        assert_eq!(convert_gherkin_value("true"), Value::Bool(true));
        assert_eq!(convert_gherkin_value("false"), Value::Bool(false));
        assert_eq!(convert_gherkin_value(" true "), Value::Bool(true));
    }

    #[test]
    fn test_convert_list() {
        assert_eq!(
            convert_gherkin_value(r#"["a", "b"]"#),
            Value::List(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_convert_string() {
        assert_eq!(
            convert_gherkin_value("דנה"),
            Value::String("דנה".to_string())
        );
        assert_eq!(convert_gherkin_value("[not json"), Value::String("[not json".to_string()));
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"a\nb"), "a\nb");
    }
}
