//! Pattern-based question → SQL translation.
//!
//! Rules live in one ordered list and are tried top to bottom; the first
//! rule whose predicate holds produces the query and nothing after it is
//! consulted.

use lazy_static::lazy_static;
use regex::Regex;

const DEFAULT_LIMIT: u64 = 10;

const BRANDS: &[&str] = &["nike", "adidas", "puma", "zara", "h&m", "levis"];
const CATEGORIES: &[&str] = &["men", "women", "kids", "accessories"];

// words that hand a product listing over to a more specific rule
const LISTING_QUALIFIERS: &[&str] = &[
    "top", "most", "highest", "best", "cheap", "cheapest", "lowest", "expensive", "price", "rated", "rating",
    "average", "avg", "mean", "under", "over", "above",
];

/// What a predicate pulled out of the question for its template.
#[derive(Debug, Clone, Copy)]
pub struct RuleMatch<'q> {
    /// The normalized question.
    pub question: &'q str,
    /// A captured threshold or vocabulary word, when the predicate has one.
    pub captured: Option<&'q str>,
}

enum Predicate {
    /// Regex must match; group 1 (if any) becomes the capture.
    Pattern(Regex),
    /// Regex must match, the substring must be absent and none of the
    /// qualifier words may appear as a whole word.
    PatternWithout(Regex, &'static str, &'static [&'static str]),
    /// Regex must match; the capture is taken from the given group.
    PatternGroup(Regex, usize),
    /// First vocabulary entry that appears as a whole word.
    Vocabulary(&'static [&'static str]),
}

impl Predicate {
    fn evaluate<'q>(&self, question: &'q str) -> Option<RuleMatch<'q>> {
        let captured = match self {
            Predicate::Pattern(re) => {
                let caps = re.captures(question)?;
                caps.get(1).map(|m| m.as_str())
            }
            Predicate::PatternWithout(re, excluded, qualifiers) => {
                if question.contains(excluded)
                    || qualifiers.iter().any(|word| contains_word(question, word))
                    || !re.is_match(question)
                {
                    return None;
                }
                None
            }
            Predicate::PatternGroup(re, group) => {
                let caps = re.captures(question)?;
                Some(caps.get(*group)?.as_str())
            }
            Predicate::Vocabulary(words) => Some(
                words
                    .iter()
                    .find(|word| contains_word(question, word))
                    .copied()?,
            ),
        };

        Some(RuleMatch { question, captured })
    }
}

pub struct TranslationRule {
    pub name: &'static str,
    predicate: Predicate,
    template: fn(&RuleMatch<'_>) -> String,
}

impl TranslationRule {
    fn new(name: &'static str, predicate: Predicate, template: fn(&RuleMatch<'_>) -> String) -> Self {
        Self {
            name,
            predicate,
            template,
        }
    }

    pub fn apply(&self, question: &str) -> Option<String> {
        self.predicate.evaluate(question).map(|m| (self.template)(&m))
    }
}

fn pattern(re: &str) -> Regex {
    // only called with the literal patterns below
    Regex::new(re).unwrap_or_else(|e| panic!("invalid rule pattern {:?}: {}", re, e))
}

fn contains_word(question: &str, word: &str) -> bool {
    question.match_indices(word).any(|(start, _)| {
        let end = start + word.len();
        let before = question[..start].chars().next_back();
        let after = question[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

lazy_static! {
    static ref FIRST_NUMBER: Regex = pattern(r"\d+");

    /// Every rule, in priority order.
    pub static ref RULES: Vec<TranslationRule> = vec![
        TranslationRule::new(
            "tables",
            Predicate::Pattern(pattern(r"\b(?:show|list|what|display)\b.*\btables?\b")),
            |_| "SELECT name FROM sqlite_master WHERE type='table' ORDER BY name;".to_string(),
        ),
        TranslationRule::new(
            "describe",
            Predicate::Pattern(pattern(r"\b(?:describe|schema|structure)\b.*\b(?:products?|users?|orders?)")),
            |_| "SELECT sql FROM sqlite_master WHERE type='table' ORDER BY name;".to_string(),
        ),
        TranslationRule::new(
            "count_products",
            Predicate::Pattern(pattern(r"\b(?:count|how many)\b.*\bproducts?\b")),
            |_| "SELECT COUNT(*) as total_products FROM products;".to_string(),
        ),
        TranslationRule::new(
            "list_products",
            Predicate::PatternWithout(
                pattern(r"\b(?:show|list|get|display)\b.*\bproducts?\b"),
                "category",
                LISTING_QUALIFIERS,
            ),
            |_| "SELECT id, name, price, brand, category, rating FROM products LIMIT 100;".to_string(),
        ),
        TranslationRule::new(
            "most_expensive",
            Predicate::Pattern(pattern(r"\b(?:top|most|highest)\b.*\b(?:expensive|price)\b.*\bproducts?\b")),
            |m| format!(
                "SELECT name, price, brand, category, rating FROM products ORDER BY price DESC LIMIT {};",
                extract_limit(m.question, DEFAULT_LIMIT)
            ),
        ),
        TranslationRule::new(
            "cheapest",
            Predicate::Pattern(pattern(r"\b(?:cheap|cheapest|lowest)\b.*\bprice")),
            |m| format!(
                "SELECT name, price, brand, category, rating FROM products ORDER BY price ASC LIMIT {};",
                extract_limit(m.question, DEFAULT_LIMIT)
            ),
        ),
        TranslationRule::new(
            "top_rated",
            Predicate::Pattern(pattern(r"\b(?:top|best|highest)\b.*\b(?:rated|rating)\b")),
            |m| format!(
                "SELECT name, rating, price, brand, category FROM products ORDER BY rating DESC LIMIT {};",
                extract_limit(m.question, DEFAULT_LIMIT)
            ),
        ),
        TranslationRule::new(
            "average_price",
            Predicate::Pattern(pattern(r"\b(?:average|avg|mean)\b.*\bprice")),
            |_| "SELECT ROUND(AVG(price), 2) as average_price, COUNT(*) as total_products FROM products;".to_string(),
        ),
        TranslationRule::new(
            "price_under",
            Predicate::Pattern(pattern(r"\bunder\s+(\d+)")),
            |m| format!(
                "SELECT name, price, brand, rating FROM products WHERE price < {} ORDER BY price DESC LIMIT 100;",
                m.captured.unwrap_or("0")
            ),
        ),
        TranslationRule::new(
            "price_over",
            Predicate::PatternGroup(pattern(r"\b(above|over)\s+(\d+)"), 2),
            |m| format!(
                "SELECT name, price, brand, rating FROM products WHERE price > {} ORDER BY price ASC LIMIT 100;",
                m.captured.unwrap_or("0")
            ),
        ),
        TranslationRule::new(
            "count_users",
            Predicate::Pattern(pattern(r"\b(?:count|how many)\b.*\busers?\b")),
            |_| "SELECT COUNT(*) as total_users FROM users;".to_string(),
        ),
        TranslationRule::new(
            "list_users",
            Predicate::Pattern(pattern(r"\b(?:list|show|all)\b.*\busers?\b")),
            |_| "SELECT id, username, email, created_at FROM users LIMIT 100;".to_string(),
        ),
        TranslationRule::new(
            "count_orders",
            Predicate::Pattern(pattern(r"\b(?:count|how many)\b.*\borders?\b")),
            |_| "SELECT COUNT(*) as total_orders FROM orders;".to_string(),
        ),
        TranslationRule::new(
            "revenue",
            Predicate::Pattern(pattern(r"\b(?:total|sum).*\b(?:revenue|sales)\b")),
            |_| "SELECT SUM(total) as total_revenue, COUNT(*) as total_orders, ROUND(AVG(total), 2) as avg_order_value FROM orders;".to_string(),
        ),
        TranslationRule::new(
            "recent_orders",
            Predicate::Pattern(pattern(r"\b(?:recent|latest)\b.*\borders?\b")),
            |m| format!(
                "SELECT o.id, o.user_id, u.username, o.total, o.status, o.created_at FROM orders o LEFT JOIN users u ON o.user_id = u.id ORDER BY o.created_at DESC LIMIT {};",
                extract_limit(m.question, DEFAULT_LIMIT)
            ),
        ),
        TranslationRule::new(
            "by_category",
            Predicate::Pattern(pattern(r"\bcategor")),
            |_| "SELECT category, COUNT(*) as product_count, ROUND(AVG(price), 2) as avg_price FROM products GROUP BY category ORDER BY product_count DESC;".to_string(),
        ),
        TranslationRule::new(
            "by_brand",
            Predicate::Pattern(pattern(r"\bbrands?\b.*\b(?:count|list)")),
            |_| "SELECT brand, COUNT(*) as product_count, ROUND(AVG(price), 2) as avg_price FROM products GROUP BY brand ORDER BY product_count DESC LIMIT 20;".to_string(),
        ),
        TranslationRule::new(
            "popular_products",
            Predicate::Pattern(pattern(r"\b(?:popular|most viewed|trending)\b.*\bproducts?\b")),
            |_| "SELECT p.name, p.price, p.brand, COUNT(i.id) as view_count FROM products p LEFT JOIN interactions i ON p.id = i.product_id WHERE i.action = 'view' GROUP BY p.id, p.name, p.price, p.brand ORDER BY view_count DESC LIMIT 20;".to_string(),
        ),
        TranslationRule::new(
            "user_activity",
            Predicate::Pattern(pattern(r"\buser.*\bactivity\b")),
            |_| "SELECT u.username, COUNT(DISTINCT i.id) as interactions, COUNT(DISTINCT o.id) as orders, SUM(o.total) as total_spent FROM users u LEFT JOIN interactions i ON u.id = i.user_id LEFT JOIN orders o ON u.id = o.user_id GROUP BY u.id, u.username ORDER BY interactions DESC LIMIT 50;".to_string(),
        ),
        TranslationRule::new(
            "brand",
            Predicate::Vocabulary(BRANDS),
            |m| format!(
                "SELECT name, price, rating, category FROM products WHERE LOWER(brand) = '{}' ORDER BY rating DESC LIMIT 100;",
                m.captured.unwrap_or_default()
            ),
        ),
        TranslationRule::new(
            "category",
            Predicate::Vocabulary(CATEGORIES),
            |m| format!(
                "SELECT name, price, brand, rating FROM products WHERE LOWER(category) = '{}' ORDER BY rating DESC LIMIT 100;",
                m.captured.unwrap_or_default()
            ),
        ),
    ];
}

/// The first run of digits anywhere in the question, else `default`.
/// The first number always wins: "top 5 users ordered by 10 purchases"
/// yields 5 and "expensive products over 5000, top 3" yields 5000.
pub fn extract_limit(question: &str, default: u64) -> u64 {
    FIRST_NUMBER
        .find(question)
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .unwrap_or(default)
}

pub fn normalize(question: &str) -> String {
    question.trim().to_lowercase()
}

/// Name of the first matching rule and its query.
pub fn match_rule(question: &str) -> Option<(&'static str, String)> {
    let q = normalize(question);
    RULES
        .iter()
        .find_map(|rule| rule.apply(&q).map(|sql| (rule.name, sql)))
}

pub fn translate_by_rule(question: &str) -> Option<String> {
    match_rule(question).map(|(_, sql)| sql)
}
