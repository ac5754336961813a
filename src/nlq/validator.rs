//! Lexical gate in front of execution.
//!
//! This is not a SQL parser. It only looks at the leading keyword and at a
//! few substrings, so anything that starts with `SELECT` gets through, even
//! when more statements follow it.

pub const DEFAULT_ROW_CAP: u32 = 100;

const AGGREGATES: &[&str] = &["COUNT(", "SUM(", "AVG(", "MAX(", "MIN("];

pub fn is_aggregate(sql: &str) -> bool {
    let upper = sql.to_uppercase();
    AGGREGATES.iter().any(|agg| upper.contains(agg))
}

/// Accepts read-only fetches and bounds unbounded, non-aggregate ones to
/// [`DEFAULT_ROW_CAP`] rows. `None` means the candidate is rejected.
pub fn validate(candidate: &str) -> Option<String> {
    let sql = candidate.trim();
    let upper = sql.to_uppercase();

    if !upper.starts_with("SELECT") {
        return None;
    }

    if !upper.contains("LIMIT") && !is_aggregate(sql) {
        return Some(format!(
            "{} LIMIT {};",
            sql.trim_end_matches(';').trim_end(),
            DEFAULT_ROW_CAP
        ));
    }

    Some(sql.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_select_is_rejected() {
        for candidate in [
            "DELETE FROM products",
            "drop table users;",
            "UPDATE products SET price = 0",
            "WITH x AS (SELECT 1) SELECT * FROM x",
            "Here is your query: SELECT 1",
            "",
            "   ",
        ] {
            assert_eq!(validate(candidate), None, "accepted {:?}", candidate);
        }
    }

    #[test]
    fn test_select_is_case_insensitive_and_trimmed() {
        assert_eq!(
            validate("  select name from products limit 5;  ").as_deref(),
            Some("select name from products limit 5;")
        );
    }

    #[test]
    fn test_unbounded_listing_gets_exactly_100() {
        assert_eq!(
            validate("SELECT name FROM products;").as_deref(),
            Some("SELECT name FROM products LIMIT 100;")
        );
        assert_eq!(
            validate("SELECT name FROM products ;;").as_deref(),
            Some("SELECT name FROM products LIMIT 100;")
        );
        assert_eq!(
            validate("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name;").as_deref(),
            Some("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name LIMIT 100;")
        );
    }

    #[test]
    fn test_existing_limit_is_kept() {
        let sql = "SELECT name FROM products ORDER BY price DESC LIMIT 5;";
        assert_eq!(validate(sql).as_deref(), Some(sql));
    }

    #[test]
    fn test_aggregates_are_not_capped() {
        for sql in [
            "SELECT COUNT(*) as total_users FROM users;",
            "select avg(price) from products",
            "SELECT brand, MAX(price) FROM products GROUP BY brand",
            "SELECT min(rating) FROM products",
            "SELECT SUM(total) FROM orders",
        ] {
            assert_eq!(validate(sql).as_deref(), Some(sql));
        }
    }

    #[test]
    fn test_stacked_statement_passes_lexical_gate() {
        // known boundary: only the leading keyword is checked
        let validated = validate("SELECT 1; DELETE FROM products").unwrap();
        assert_eq!(validated, "SELECT 1; DELETE FROM products LIMIT 100;");
    }

    #[test]
    fn test_limit_inside_identifier_counts_as_limit() {
        // substring check, not token check
        let sql = "SELECT credit_limit FROM accounts";
        assert_eq!(validate(sql).as_deref(), Some(sql));
    }
}
