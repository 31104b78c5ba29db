use serde::{Deserialize, Serialize};
use tracing::debug;

use super::models::UserType;

/// Which portal a knowledge entry is written for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    Student,
    Teacher,
    Both,
}

impl Audience {
    /// Students and teachers see their own entries plus shared ones; everyone else only shared ones.
    fn visible_to(self, user: Option<UserType>) -> bool {
        match (self, user) {
            (Audience::Both, _) => true,
            (_, None | Some(UserType::Guest)) => false,
            (Audience::Student, Some(user)) => user == UserType::Student,
            (Audience::Teacher, Some(user)) => user == UserType::Teacher,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeEntry {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub category: String,
    #[serde(rename = "userType")]
    pub audience: Audience,
    pub keywords: Vec<String>,
    pub usage_count: u32,
    pub effectiveness_score: f64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoredEntry {
    #[serde(flatten)]
    pub entry: KnowledgeEntry,
    pub relevance_score: f64,
}

/// Fixed Q&A table consulted before asking the model.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    entries: Vec<KnowledgeEntry>,
}

impl KnowledgeBase {
    pub fn new(entries: Vec<KnowledgeEntry>) -> Self {
        Self { entries }
    }

    pub fn seeded() -> Self {
        Self::new(seed_entries())
    }

    /// Keyword-overlap scoring; only entries with a positive score are returned, best first.
    /// An empty query matches every question, so it lists all visible entries.
    pub fn search(&self, query: &str, user: Option<UserType>, limit: usize) -> Vec<ScoredEntry> {
        let query_lower = query.to_lowercase();
        let words: Vec<&str> = query_lower
            .split(' ')
            .filter(|w| w.chars().count() > 2)
            .collect();

        let mut results: Vec<ScoredEntry> = self
            .entries
            .iter()
            .filter(|e| e.is_active && e.audience.visible_to(user))
            .map(|e| ScoredEntry {
                relevance_score: relevance(e, &query_lower, &words),
                entry: e.clone(),
            })
            .filter(|s| s.relevance_score > 0.0)
            .collect();

        results.sort_by(|a, b| {
            b.relevance_score
                .total_cmp(&a.relevance_score)
                .then_with(|| {
                    b.entry
                        .effectiveness_score
                        .total_cmp(&a.entry.effectiveness_score)
                })
        });
        results.truncate(limit);

        debug!(query, count = results.len(), "knowledge base search");
        results
    }

    pub fn best_answer(&self, query: &str, user: Option<UserType>) -> Option<String> {
        self.search(query, user, 1)
            .into_iter()
            .next()
            .map(|s| s.entry.answer)
    }
}

fn relevance(entry: &KnowledgeEntry, query_lower: &str, words: &[&str]) -> f64 {
    let question = entry.question.to_lowercase();
    let answer = entry.answer.to_lowercase();

    let keyword_hits = entry
        .keywords
        .iter()
        .filter(|k| {
            let k = k.to_lowercase();
            words.iter().any(|w| k.contains(w))
        })
        .count();

    let mut score = keyword_hits as f64 * 2.0;
    if question.contains(query_lower) {
        score += 3.0;
    }
    for word in words {
        if question.contains(word) {
            score += 1.0;
        }
        if answer.contains(word) {
            score += 0.5;
        }
    }
    score
}

#[allow(clippy::too_many_arguments)]
fn entry(
    id: i64,
    question: &str,
    answer: &str,
    category: &str,
    audience: Audience,
    keywords: &[&str],
    usage_count: u32,
    effectiveness_score: f64,
) -> KnowledgeEntry {
    KnowledgeEntry {
        id,
        question: question.to_string(),
        answer: answer.to_string(),
        category: category.to_string(),
        audience,
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        usage_count,
        effectiveness_score,
        is_active: true,
    }
}

fn seed_entries() -> Vec<KnowledgeEntry> {
    vec![
        entry(
            1,
            "How do I mark my attendance?",
            "To mark your attendance:\n1. Log in to your student portal using your roll number and password\n2. Click on 'Mark Attendance' button\n3. Select the subject/class\n4. Click 'Mark Present' - your attendance will be recorded with timestamp\n\nNote: You can only mark attendance once per day per subject.",
            "attendance",
            Audience::Student,
            &["mark", "attendance", "present", "how to", "student"],
            45,
            4.8,
        ),
        entry(
            2,
            "I forgot my password",
            "If you forgot your password:\n1. Go to the login page\n2. Click 'Forgot Password' link\n3. Enter your roll number or email\n4. Check your email for reset instructions\n5. Follow the link to create a new password\n\nIf you still have issues, contact your system administrator.",
            "login",
            Audience::Both,
            &["password", "forgot", "reset", "login", "help"],
            32,
            4.6,
        ),
        entry(
            3,
            "How do I view attendance reports?",
            "To view attendance reports as a teacher:\n1. Log in to your teacher portal\n2. Go to 'Teacher Dashboard'\n3. Use search and filter options to find specific students or classes\n4. Click 'View Details' for detailed attendance records\n5. Use 'Export' to download reports\n\nYou can filter by date range, class, or subject.",
            "reports",
            Audience::Teacher,
            &["reports", "view", "attendance", "teacher", "dashboard", "export"],
            28,
            4.7,
        ),
        entry(
            4,
            "Why is my attendance percentage low?",
            "Your attendance percentage is calculated as: (Present Days ÷ Total Days) × 100\n\nTo improve it:\n1. Make sure to mark attendance daily\n2. Arrive on time for classes\n3. Check if you missed marking attendance on any days\n4. Contact your teacher if there are errors in your records\n\nRegular attendance is important for academic success!",
            "attendance",
            Audience::Student,
            &["percentage", "low", "calculate", "improve", "attendance"],
            22,
            4.5,
        ),
        entry(
            5,
            "How do I register as a new student?",
            "To register as a new student:\n1. Go to the home page\n2. Click 'Student Portal'\n3. Click 'Register New Student'\n4. Fill in all required information (name, roll number, email, class, etc.)\n5. Create a secure password\n6. Submit the form\n7. You can now log in with your credentials\n\nMake sure all information is accurate!",
            "registration",
            Audience::Student,
            &["register", "new", "student", "signup", "account"],
            18,
            4.9,
        ),
        entry(
            6,
            "How does the teacher dashboard work?",
            "The teacher dashboard allows you to:\n1. View all student attendance records\n2. Search students by name, roll number, or class\n3. Filter by date ranges and subjects\n4. Generate attendance reports\n5. View attendance statistics and analytics\n6. Export data to Excel/PDF\n7. Manage your profile and subjects taught\n\nIt's your central hub for attendance management!",
            "dashboard",
            Audience::Teacher,
            &["dashboard", "teacher", "features", "how to use", "management"],
            15,
            4.8,
        ),
    ]
}
