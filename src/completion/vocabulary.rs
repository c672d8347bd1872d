/*!
 * Static SQL vocabulary
 *
 * Four word lists (actions, keywords, objects, functions), each a
 * dialect-agnostic base list followed by extension words. Merged once at
 * construction and never mutated afterwards.
 */

const BASE_ACTIONS: &[&str] = &[
    "SELECT",
    "SELECT *",
    "SELECT INTO",
    "SELECT TOP",
    "UPDATE",
    "INSERT",
    "DELETE",
    "CREATE",
    "ALTER",
    "DROP",
    "SHOW",
    "SET",
    "USE",
    "INSERT INTO",
    "TRUNCATE TABLE",
    "DECLARE",
];

const BASE_OBJECTS: &[&str] = &[
    "DATABASE",
    "SCHEMA",
    "TABLE",
    "INDEX",
    "COLUMN",
    "VIEW",
    "SEQUENCE",
    "PRIMARY KEY",
];

const BASE_KEYWORDS: &[&str] = &[
    "FROM",
    "DISTINCT",
    "ORDER BY",
    "GROUP BY",
    "ASC",
    "DESC",
    "IS",
    "NULL",
    "WHERE",
    "AS",
    "HAVING",
    "INNER JOIN",
    "LEFT JOIN",
    "RIGHT JOIN",
    "FULL JOIN",
    "UNION",
    "UNION ALL",
    "VALUES",
    "DEFAULT",
    // Conditions and operators
    "ALL",
    "AND",
    "ANY",
    "BETWEEN",
    "EXISTS",
    "IN",
    "LIKE",
    "NOT",
    "OR",
    "UNIQUE",
];

const BASE_FUNCTIONS: &[&str] = &[
    "MAX", "MIN", "COUNT", "AVG", "SUM", "UPPER", "LOWER", "CONCAT", "IFNULL", "REPLACE", "TRIM",
];

/// Extra words appended to the base lists, per dialect or per user.
#[derive(Clone, Debug, Default)]
pub struct VocabularyExtensions {
    pub actions: Vec<String>,
    pub keywords: Vec<String>,
    pub objects: Vec<String>,
    pub functions: Vec<String>,
}

impl VocabularyExtensions {
    /// MySQL additions
    pub fn mysql() -> Self {
        Self {
            keywords: vec!["AUTO_INCREMENT".to_string()],
            ..Self::default()
        }
    }

    /// Append another set of extensions after this one.
    pub fn merge(mut self, other: VocabularyExtensions) -> Self {
        self.actions.extend(other.actions);
        self.keywords.extend(other.keywords);
        self.objects.extend(other.objects);
        self.functions.extend(other.functions);
        self
    }
}

/// Merged, immutable word lists.
#[derive(Clone, Debug)]
pub struct Vocabulary {
    pub actions: Vec<String>,
    pub keywords: Vec<String>,
    pub objects: Vec<String>,
    pub functions: Vec<String>,
}

impl Vocabulary {
    pub fn new(extensions: VocabularyExtensions) -> Self {
        Self {
            actions: layered(BASE_ACTIONS, extensions.actions),
            keywords: layered(BASE_KEYWORDS, extensions.keywords),
            objects: layered(BASE_OBJECTS, extensions.objects),
            functions: layered(BASE_FUNCTIONS, extensions.functions),
        }
    }

    /// Actions, objects, functions, then keywords.
    pub fn all(&self) -> impl Iterator<Item = &str> {
        self.actions
            .iter()
            .chain(&self.objects)
            .chain(&self.functions)
            .chain(&self.keywords)
            .map(String::as_str)
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new(VocabularyExtensions::default())
    }
}

fn layered(base: &[&str], extra: Vec<String>) -> Vec<String> {
    base.iter().map(|s| s.to_string()).chain(extra).collect()
}

/// Vocabulary prefix rule: the word is lower-cased, the typed prefix is not.
/// An upper-case prefix therefore never matches.
pub fn vocabulary_matches(word: &str, prefix: &str) -> bool {
    word.to_lowercase().starts_with(prefix)
}
