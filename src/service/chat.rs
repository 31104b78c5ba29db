use crate::api::llm_client::LlmClient;
use crate::db::KnowledgeBase;
use crate::db::conversations::{MessageRole, NewConversation};
use crate::db::models::UserType;
use crate::service::assistant_actor::AssistantHandle;
use crate::service::classifier::{KeywordTopics, TopicClassifier};
use crate::types::chat::{ChatMessage, ChatRequest};

use futures::StreamExt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

/// Served with 200 whenever the model cannot be reached.
pub const FALLBACK_TEXT: &str = r#"I'm here to help you with the attendance system! Here are some common solutions:

**For Students:**
• **Mark Attendance**: Log in → Click "Mark Attendance" → Select subject → Click "Mark Present"
• **View Records**: Check your attendance dashboard after logging in
• **Password Issues**: Use "Forgot Password" link on login page

**For Teachers:**
• **View Student Records**: Log in to teacher portal → Use search and filters
• **Generate Reports**: Access teacher dashboard → Use export features
• **Manage Students**: Search by name, class, or roll number

**Common Issues:**
• Clear browser cache if having login problems
• Make sure JavaScript is enabled
• Try a different browser if issues persist
• Contact your system administrator for technical support

What specific issue can I help you with? Please describe your problem and I'll provide detailed guidance!"#;

const FALLBACK_MODEL: &str = "fallback";

/// Queries this short skip the knowledge base.
const MIN_KNOWLEDGE_QUERY_CHARS: usize = 3;
const TOPIC_CHARS: usize = 50;

pub enum ChatReply {
    /// Model text, forwarded chunk by chunk.
    Stream(ReceiverStream<String>),
    Fallback,
}

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// `session_<unix millis>_<counter>` for widgets that did not send one.
pub fn generate_session_id() -> String {
    format!(
        "session_{}_{}",
        chrono::Utc::now().timestamp_millis(),
        SESSION_COUNTER.fetch_add(1, Ordering::Relaxed)
    )
}

pub struct PromptContext<'a> {
    pub user_type: Option<UserType>,
    pub user_name: Option<&'a str>,
    pub session_id: &'a str,
    pub knowledge: Option<&'a str>,
    pub system_context: Option<&'a str>,
}

pub fn build_system_prompt(ctx: &PromptContext<'_>) -> String {
    let user_type = ctx.user_type.map(|u| u.as_str()).unwrap_or("guest");
    let user_name = ctx.user_name.unwrap_or("Unknown");
    let knowledge = ctx
        .knowledge
        .map(|answer| {
            format!(
                "\nRELEVANT KNOWLEDGE BASE ANSWER:\n{answer}\n\nUse this as a reference but provide a complete, helpful response."
            )
        })
        .unwrap_or_default();
    let extra = ctx
        .system_context
        .filter(|c| !c.trim().is_empty())
        .map(|c| format!("\nADDITIONAL CONTEXT:\n{c}\n"))
        .unwrap_or_default();

    format!(
        r#"You are a helpful AI assistant for a Smart Attendance Management System. You help students and teachers with attendance-related questions, troubleshooting, and guidance.

CONTEXT:
- This is an attendance system for educational institutions
- Students can mark their own attendance and view their records
- Teachers can view all student attendance and generate reports
- The system has secure login with roll numbers/employee IDs and passwords
- Current user type: {user_type}
- Current user name: {user_name}
- Session ID: {session_id}

SYSTEM FEATURES:
- Student Portal: Login, mark attendance, view personal records, registration
- Teacher Portal: Login, view all students, generate reports, analytics
- Database: Stores student/teacher profiles, attendance records, analytics
- Security: Password protection, session management, data validation

COMMON SOLUTIONS:

ATTENDANCE MARKING:
- Students log in with roll number and password
- Click "Mark Attendance" button on dashboard
- Select subject/class if required
- Click "Mark Present" - attendance recorded with timestamp
- Can only mark once per day per subject

PASSWORD ISSUES:
- Use "Forgot Password" link on login page
- Enter roll number or email address
- Check email for reset instructions
- Follow link to create new password
- Contact admin if still having issues

REGISTRATION:
- Click "Register New Student/Teacher" on portal page
- Fill all required information accurately
- Create secure password with confirmation
- Submit form and wait for confirmation
- Can then login with new credentials

VIEWING RECORDS:
- Students: Login and view personal attendance dashboard
- Teachers: Login to teacher portal, search/filter students
- Use date ranges and filters for specific data
- Export reports in Excel/PDF format

TECHNICAL ISSUES:
- Clear browser cache and cookies
- Try different browser or incognito mode
- Check internet connection
- Ensure JavaScript is enabled
- Contact system administrator for server issues

TONE & STYLE:
- Be friendly, helpful, and professional
- Provide clear, step-by-step instructions
- Use simple language that's easy to understand
- Be encouraging and supportive
- Offer multiple solutions when possible
- Always end with an offer to help further
{extra}
{knowledge}

IMPORTANT: Always provide a helpful response. Never say you cannot help. If you don't know something specific, provide general guidance and suggest contacting support."#,
        session_id = ctx.session_id,
    )
}

/// Knowledge-base lookup, then the model, then the canned answer.
pub struct ChatOrchestrator {
    knowledge: Arc<KnowledgeBase>,
    llm: LlmClient,
    assistant: AssistantHandle,
    classifier: Box<dyn TopicClassifier>,
}

impl ChatOrchestrator {
    pub fn new(knowledge: Arc<KnowledgeBase>, llm: LlmClient, assistant: AssistantHandle) -> Self {
        Self {
            knowledge,
            llm,
            assistant,
            classifier: Box::new(KeywordTopics::default()),
        }
    }

    pub fn with_classifier(mut self, classifier: Box<dyn TopicClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub async fn respond(&self, req: ChatRequest) -> ChatReply {
        let session_id = req
            .session_id
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(generate_session_id);
        let user_type = req.user_type.unwrap_or_default();
        let query = req.latest_query().to_string();
        info!(
            user_type = user_type.as_str(),
            user_name = req.user_name.as_deref().unwrap_or("-"),
            session_id = %session_id,
            "chat request"
        );

        let transcript = Transcript {
            assistant: self.assistant.clone(),
            session_id: session_id.clone(),
            user_type,
            user_id: req.user_id,
            user_name: req.user_name.clone(),
        };
        if !query.trim().is_empty() {
            transcript.log(MessageRole::User, query.clone(), None, None);
            let topic: String = query.chars().take(TOPIC_CHARS).collect();
            self.assistant
                .touch_topic(topic, self.classifier.categorize(&query));
        }

        let knowledge = if query.chars().count() > MIN_KNOWLEDGE_QUERY_CHARS {
            self.knowledge.best_answer(&query, req.user_type)
        } else {
            None
        };
        if let Some(answer) = knowledge.as_deref() {
            debug!(
                preview = %answer.chars().take(100).collect::<String>(),
                "knowledge base answer attached"
            );
        }

        let prompt = build_system_prompt(&PromptContext {
            user_type: req.user_type,
            user_name: req.user_name.as_deref(),
            session_id: &session_id,
            knowledge: knowledge.as_deref(),
            system_context: req.system_context.as_deref(),
        });
        let mut messages = Vec::with_capacity(req.messages.len() + 1);
        messages.push(ChatMessage {
            role: "system".to_string(),
            content: prompt,
        });
        messages.extend(req.messages);

        let started = Instant::now();
        let mut upstream = match self.llm.stream_chat(messages).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, session_id = %session_id, "chat upstream failed, serving fallback");
                return transcript.fallback(started);
            }
        };
        let first = match upstream.next().await {
            Some(Ok(text)) => text,
            Some(Err(e)) => {
                warn!(error = %e, session_id = %session_id, "chat stream failed before first chunk, serving fallback");
                return transcript.fallback(started);
            }
            None => {
                warn!(session_id = %session_id, "chat stream ended without text, serving fallback");
                return transcript.fallback(started);
            }
        };

        let (tx, rx) = mpsc::channel::<String>(32);
        let model = self.llm.model().to_string();
        tokio::spawn(async move {
            let mut answer = String::new();
            let mut next = Some(first);
            while let Some(text) = next.take() {
                answer.push_str(&text);
                if tx.send(text).await.is_err() {
                    debug!(session_id = %transcript.session_id, "chat client went away");
                    break;
                }
                next = match upstream.next().await {
                    Some(Ok(text)) => Some(text),
                    Some(Err(e)) => {
                        warn!(error = %e, session_id = %transcript.session_id, "chat stream interrupted");
                        None
                    }
                    None => None,
                };
            }
            let elapsed_ms = started.elapsed().as_millis() as u64;
            info!(
                session_id = %transcript.session_id,
                elapsed_ms,
                chars = answer.chars().count(),
                "chat answer completed"
            );
            transcript.log_answer(answer, elapsed_ms, Some(model));
        });

        ChatReply::Stream(ReceiverStream::new(rx))
    }
}

/// Who the current exchange belongs to, for the conversation log.
struct Transcript {
    assistant: AssistantHandle,
    session_id: String,
    user_type: UserType,
    user_id: Option<i64>,
    user_name: Option<String>,
}

impl Transcript {
    fn log(
        &self,
        role: MessageRole,
        content: String,
        response_time_ms: Option<u64>,
        model_used: Option<String>,
    ) {
        let tokens_used = (role == MessageRole::Assistant).then(|| content.chars().count() as u64);
        self.assistant.log_message(NewConversation {
            session_id: self.session_id.clone(),
            user_type: self.user_type,
            user_id: self.user_id,
            user_name: self.user_name.clone(),
            role,
            content,
            response_time_ms,
            tokens_used,
            model_used,
        });
    }

    fn log_answer(&self, answer: String, elapsed_ms: u64, model_used: Option<String>) {
        self.log(MessageRole::Assistant, answer, Some(elapsed_ms), model_used);
    }

    fn fallback(&self, started: Instant) -> ChatReply {
        self.log_answer(
            FALLBACK_TEXT.to_string(),
            started.elapsed().as_millis() as u64,
            Some(FALLBACK_MODEL.to_string()),
        );
        ChatReply::Fallback
    }
}
