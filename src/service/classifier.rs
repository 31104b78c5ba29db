/// Files a free-text assistant query under a topic category.
pub trait TopicClassifier: Send + Sync {
    fn categorize(&self, query: &str) -> &str;
}

/// Ordered keyword table: the first category with a matching keyword wins.
pub struct KeywordTopics {
    rules: Vec<(String, Vec<String>)>,
    fallback: String,
}

impl KeywordTopics {
    pub fn new(rules: Vec<(String, Vec<String>)>, fallback: impl Into<String>) -> Self {
        Self {
            rules,
            fallback: fallback.into(),
        }
    }
}

impl Default for KeywordTopics {
    fn default() -> Self {
        let rule = |category: &str, keywords: &[&str]| {
            (
                category.to_string(),
                keywords.iter().map(|k| k.to_string()).collect(),
            )
        };
        Self::new(
            vec![
                rule("attendance", &["attendance", "mark", "present"]),
                rule("login", &["password", "login", "forgot"]),
                rule("registration", &["register", "signup", "account"]),
                rule("reports", &["report", "dashboard", "view"]),
                rule("profile", &["teacher", "student", "profile"]),
                rule("help", &["help", "how", "what"]),
            ],
            "general",
        )
    }
}

impl TopicClassifier for KeywordTopics {
    fn categorize(&self, query: &str) -> &str {
        let query = query.to_lowercase();
        self.rules
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| query.contains(k.as_str())))
            .map(|(category, _)| category.as_str())
            .unwrap_or(&self.fallback)
    }
}

/// Categorize with the built-in keyword table.
pub fn categorize_query(query: &str) -> String {
    KeywordTopics::default().categorize(query).to_string()
}
