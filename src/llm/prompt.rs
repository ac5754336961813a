use crate::db::schema::{ColumnInfo, SchemaDescription};
use crate::llm::LlmError;
use lazy_static::lazy_static;
use minijinja::{Environment, context};
use serde::Serialize;

lazy_static! {
    static ref TEMPLATES: Environment<'static> = {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.add_template("schema.txt", include_str!("../../templates/schema.txt"))
            .expect("schema template parses");
        env.add_template("sql_prompt.txt", include_str!("../../templates/sql_prompt.txt"))
            .expect("prompt template parses");
        env
    };
}

#[derive(Serialize)]
struct TableContext<'a> {
    name: &'a str,
    columns: &'a [ColumnInfo],
    sample: Option<String>,
}

/// Plain-text schema summary for the model: columns with types and at most
/// one sample row per table.
pub fn render_schema(schema: &SchemaDescription) -> Result<String, LlmError> {
    let tables: Vec<TableContext<'_>> = schema
        .iter()
        .map(|(name, table)| TableContext {
            name,
            columns: &table.columns,
            sample: table
                .sample_data
                .first()
                .and_then(|row| serde_json::to_string(row).ok()),
        })
        .collect();

    TEMPLATES
        .get_template("schema.txt")
        .and_then(|tmpl| tmpl.render(context! { tables => tables }))
        .map_err(|e| LlmError::PromptError(e.to_string()))
}

pub fn build_prompt(question: &str, schema: &str) -> Result<String, LlmError> {
    TEMPLATES
        .get_template("sql_prompt.txt")
        .and_then(|tmpl| tmpl.render(context! { question => question, schema => schema }))
        .map_err(|e| LlmError::PromptError(e.to_string()))
}

/// Reduces raw model output to one candidate line: code fences and the
/// answer label are dropped and only the first non-empty line is kept.
pub fn extract_candidate(raw: &str) -> Option<String> {
    let cleaned = raw
        .replace("```sql", "")
        .replace("```SQL", "")
        .replace("```", "")
        .replace("**SQL Query:**", "");

    cleaned
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::TableDescription;
    use serde_json::{Map, json};

    fn schema() -> SchemaDescription {
        let mut row = Map::new();
        row.insert("id".to_string(), json!(1));
        row.insert("name".to_string(), json!("Nike Black Polo Shirt"));

        let mut schema = SchemaDescription::new();
        schema.insert(
            "products".to_string(),
            TableDescription {
                columns: vec![
                    ColumnInfo { name: "id".to_string(), data_type: "INTEGER".to_string() },
                    ColumnInfo { name: "name".to_string(), data_type: "VARCHAR".to_string() },
                ],
                sample_data: vec![row.clone(), row],
            },
        );
        schema.insert(
            "cart".to_string(),
            TableDescription {
                columns: vec![ColumnInfo { name: "user_id".to_string(), data_type: "INTEGER".to_string() }],
                sample_data: vec![],
            },
        );
        schema
    }

    #[test]
    fn test_schema_text_lists_columns_and_one_sample() {
        let text = render_schema(&schema()).unwrap();
        assert!(text.contains("Table: products"));
        assert!(text.contains("id (INTEGER), name (VARCHAR)"));
        assert!(text.contains(r#"Row 1: {"id":1,"name":"Nike Black Polo Shirt"}"#));
        assert!(!text.contains("Row 2"));
        assert!(text.contains("Table: cart"));
    }

    #[test]
    fn test_prompt_embeds_question_and_schema() {
        let schema_text = render_schema(&schema()).unwrap();
        let prompt = build_prompt("cheapest nike shirts", &schema_text).unwrap();
        assert!(prompt.contains("User Question: cheapest nike shirts"));
        assert!(prompt.contains("Table: products"));
        assert!(prompt.contains("Include LIMIT"));
        assert!(prompt.trim_end().ends_with("SQL Query:"));
    }

    #[test]
    fn test_extract_strips_fences_and_keeps_first_line() {
        let raw = "```sql\nSELECT name FROM products\nORDER BY price DESC LIMIT 5;\n```";
        assert_eq!(extract_candidate(raw).as_deref(), Some("SELECT name FROM products"));
    }

    #[test]
    fn test_extract_drops_label() {
        let raw = "**SQL Query:** SELECT COUNT(*) FROM users;";
        assert_eq!(extract_candidate(raw).as_deref(), Some("SELECT COUNT(*) FROM users;"));
    }

    #[test]
    fn test_extract_empty_output() {
        assert_eq!(extract_candidate(""), None);
        assert_eq!(extract_candidate("```\n\n```"), None);
    }
}
