use std::fmt;

use chrono::{SecondsFormat, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::{CampusError, Result};

/// User key used for history when nobody is signed in.
pub const GUEST_USER_KEY: &str = "guest";
/// Display name used when nobody is signed in.
pub const GUEST_DISPLAY_NAME: &str = "Guest";

/// Minimum password length accepted by the registration form.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Current time as an ISO-8601 / RFC 3339 string in UTC.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// =============================================================================
// Session
// =============================================================================

/// Role granted by the server at sign-in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[default]
    Student,
    Admin,
}

impl Role {
    /// Interpret the role string returned by the server.
    ///
    /// Anything mentioning "admin" (in any case) is an admin; everything
    /// else, including an empty string, is a student.
    pub fn from_server(raw: &str) -> Self {
        if raw.to_lowercase().contains("admin") {
            Role::Admin
        } else {
            Role::Student
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated session issued at login.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Canonical key for server-side history (the sign-in e-mail).
    pub user_key: String,
    /// Name shown in the chat header.
    pub display_name: String,
    pub role: Role,
    /// Opaque token replayed on authenticated calls.
    pub token: String,
}

// =============================================================================
// Messages
// =============================================================================

/// Which party authored a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }
}

/// A message shown in the chat view. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub from: Sender,
    pub text: String,
    /// ISO-8601 timestamp.
    pub timestamp: String,
}

impl Message {
    pub fn new(from: Sender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            from,
            text: text.into(),
            timestamp: now_iso(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Sender::Bot, text)
    }
}

impl From<HistoryRecord> for Message {
    fn from(record: HistoryRecord) -> Self {
        Self {
            id: Uuid::new_v4(),
            from: record.from,
            text: record.text,
            timestamp: record.ts,
        }
    }
}

// =============================================================================
// FAQ table
// =============================================================================

/// One FAQ category: sample questions and the canonical answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaqEntry {
    pub category: String,
    pub questions: Vec<String>,
    pub answer: String,
}

#[derive(Default, Serialize, Deserialize)]
struct FaqEntryBody {
    #[serde(default)]
    questions: Vec<String>,
    #[serde(default)]
    answer: String,
}

/// The offline FAQ table, in the category order the server sent.
///
/// On the wire it is a JSON object keyed by category name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FaqTable {
    entries: Vec<FaqEntry>,
}

impl FaqTable {
    pub fn new(entries: Vec<FaqEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[FaqEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FaqTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(
                &entry.category,
                &FaqEntryBody {
                    questions: entry.questions.clone(),
                    answer: entry.answer.clone(),
                },
            )?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FaqTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = FaqTable;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of FAQ category to {questions, answer}")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((category, body)) = access.next_entry::<String, FaqEntryBody>()? {
                    entries.push(FaqEntry {
                        category,
                        questions: body.questions,
                        answer: body.answer,
                    });
                }
                Ok(FaqTable { entries })
            }
        }

        deserializer.deserialize_map(TableVisitor)
    }
}

// =============================================================================
// Wire records
// =============================================================================

/// A stored history item as returned by `GET /api/history`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Anything other than `user` is shown as a bot message.
    #[serde(default = "default_sender", deserialize_with = "lenient_sender")]
    pub from: Sender,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub ts: String,
}

/// Body of `POST /api/history`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryAppend {
    pub user: String,
    pub from: Sender,
    pub text: String,
    pub ts: String,
}

impl HistoryAppend {
    pub fn for_message(user: &str, message: &Message) -> Self {
        Self {
            user: user.to_string(),
            from: message.from,
            text: message.text.clone(),
            ts: message.timestamp.clone(),
        }
    }
}

/// Body of `DELETE /api/history`. Without `ts` the whole history is cleared.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryDelete {
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
}

/// One page of history, newest first as the server returns it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPage {
    #[serde(default)]
    pub history: Vec<HistoryRecord>,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub total: Option<u64>,
}

/// Body of `POST /api/logs`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub user: String,
    pub user_msg: String,
    pub bot_msg: String,
    pub offline: bool,
}

/// Body of `POST /api/query`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub message: String,
    pub role: Role,
}

/// Successful reply from `POST /api/query`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryReply {
    #[serde(default)]
    pub answer: String,
    /// Where the server found the answer ("offline", "ai", ...).
    #[serde(default)]
    pub source: Option<String>,
}

/// `GET /api/status`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiStatus {
    #[serde(default, alias = "external_allowed")]
    pub allow_external_queries: bool,
    #[serde(default)]
    pub ai_provider_available: Option<bool>,
}

/// What the chat header shows about the remote AI fallback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiAvailability {
    Enabled,
    Disabled,
    /// The status endpoint could not be reached.
    Offline,
}

impl fmt::Display for AiAvailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiAvailability::Enabled => f.write_str("AI Enabled"),
            AiAvailability::Disabled => f.write_str("AI Disabled"),
            AiAvailability::Offline => f.write_str("AI Offline"),
        }
    }
}

// =============================================================================
// Auth forms
// =============================================================================

/// Login form contents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// Trim both fields and reject empty ones.
    pub fn validated(email: &str, password: &str) -> Result<Self> {
        let email = email.trim();
        let password = password.trim();
        if email.is_empty() || password.is_empty() {
            return Err(CampusError::Validation(
                "Please enter email and password".to_string(),
            ));
        }
        Ok(Self {
            email: email.to_string(),
            password: password.to_string(),
        })
    }
}

/// Registration form contents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub password: String,
    pub security_question: String,
    pub answer: String,
}

impl Registration {
    /// Trim every field, require all of them, and enforce the password length.
    pub fn validated(self) -> Result<Self> {
        let reg = Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            mobile: self.mobile.trim().to_string(),
            password: self.password.trim().to_string(),
            security_question: self.security_question.trim().to_string(),
            answer: self.answer.trim().to_string(),
        };
        let fields = [
            &reg.name,
            &reg.email,
            &reg.mobile,
            &reg.password,
            &reg.security_question,
            &reg.answer,
        ];
        if fields.iter().any(|f| f.is_empty()) {
            return Err(CampusError::Validation("Please fill all fields".to_string()));
        }
        if reg.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(CampusError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        Ok(reg)
    }
}

/// `POST /api/login` reply.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginReply {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

// =============================================================================
// Admin
// =============================================================================

/// A registered student as listed by `GET /api/admin/students`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub marks: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub registered: Option<String>,
}

/// Body of `POST /api/admin/update_student`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentUpdate {
    pub email: String,
    pub marks: String,
}

/// Result of `POST /api/admin/upload`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Names the server stored the upload under.
    pub files: Vec<String>,
}

/// Accept a string, a number, or null where the server is loose about types.
fn lenient_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

/// `user` is the only sender name the history endpoint guarantees.
fn lenient_sender<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Sender, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value.as_str() {
        Some("user") => Sender::User,
        _ => Sender::Bot,
    })
}

fn default_sender() -> Sender {
    Sender::Bot
}

fn null_as_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<String, D::Error> {
    Ok(lenient_string(deserializer)?.unwrap_or_default())
}
