use serde::{Deserialize, Serialize};

/// Suffix the backend appends to the author name of generated answers.
pub const AI_ASSISTED_SUFFIX: &str = "(AI-assisted)";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    /// Open-ended on purpose: the server may introduce roles we don't know about.
    pub role: String,
    pub created_at: String,
    pub is_active: bool,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// A question as returned by the server.
///
/// The list endpoint returns a summary projection without `description` or
/// `answers`, so those fields fall back to empty values when missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub tags: Vec<String>,
    pub user_id: String,
    pub created_at: String,
    #[serde(default)]
    pub answers: Vec<String>,
    #[serde(default)]
    pub accepted_answer: Option<String>,
    /// Maintained by the server. Never recomputed from `answers`.
    #[serde(default)]
    pub answer_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_accepted_answer: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionCreate {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: String,
    pub question_id: String,
    pub user_id: String,
    pub content: String,
    pub votes: i64,
    pub created_at: String,
    pub is_accepted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_role: Option<String>,
}

impl Answer {
    /// True when the server labelled the author as AI-assisted.
    pub fn is_ai_assisted(&self) -> bool {
        self.username
            .as_deref()
            .is_some_and(|name| name.trim_end().ends_with(AI_ASSISTED_SUFFIX))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerCreate {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub token_type: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Search results. Items are server-defined and only ever displayed, so they
/// stay untyped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<serde_json::Value>,
    pub ai_powered: bool,
}

/// Paging and filtering for the question list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionQuery {
    pub skip: u32,
    pub limit: u32,
    pub tag: Option<String>,
}

impl Default for QuestionQuery {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: 20,
            tag: None,
        }
    }
}

impl QuestionQuery {
    pub fn page(skip: u32, limit: u32) -> Self {
        Self {
            skip,
            limit,
            tag: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteAction {
    Upvote,
    Downvote,
    Remove,
}

#[derive(Debug, Serialize)]
pub(crate) struct VoteRequest {
    pub action: VoteAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteOutcome {
    pub message: String,
    pub new_vote_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagSuggestions {
    pub suggested_tags: Vec<String>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    /// `answer`, `comment`, `mention`, `accepted_answer`, or whatever the server adds next.
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(default)]
    pub question_id: Option<String>,
    #[serde(default)]
    pub answer_id: Option<String>,
    pub read: bool,
    pub created_at: String,
    pub from_username: String,
    #[serde(default)]
    pub question_title: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationStats {
    pub unread_count: u64,
    pub total_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkAllReadOutcome {
    pub message: String,
    #[serde(default)]
    pub updated_count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn question_summary_deserializes_with_defaults() {
        let q: Question = serde_json::from_value(json!({
            "id": "q1",
            "title": "How do lifetimes work?",
            "tags": ["rust", "lifetimes"],
            "user_id": "u1",
            "username": "ferris",
            "created_at": "2024-05-01T10:00:00",
            "answer_count": 3,
            "has_accepted_answer": false
        }))
        .unwrap();

        assert_eq!(q.description, "");
        assert!(q.answers.is_empty());
        assert_eq!(q.accepted_answer, None);
        assert_eq!(q.answer_count, 3);
        assert_eq!(q.tags, vec!["rust", "lifetimes"]);
        assert_eq!(q.has_accepted_answer, Some(false));
    }

    #[test]
    fn vote_action_serializes_lowercase() {
        let body = serde_json::to_value(VoteRequest {
            action: VoteAction::Downvote,
        })
        .unwrap();
        assert_eq!(body, json!({"action": "downvote"}));
    }

    #[test]
    fn ai_assisted_answers_are_detected_from_username() {
        let mut answer: Answer = serde_json::from_value(json!({
            "id": "a1",
            "question_id": "q1",
            "user_id": "u1",
            "content": "Use a borrow.",
            "votes": 0,
            "created_at": "2024-05-01T10:00:00",
            "is_accepted": false,
            "username": "ferris (AI-assisted)",
            "user_role": "user"
        }))
        .unwrap();
        assert!(answer.is_ai_assisted());

        answer.username = Some("ferris".into());
        assert!(!answer.is_ai_assisted());

        answer.username = None;
        assert!(!answer.is_ai_assisted());
    }

    #[test]
    fn notification_type_maps_to_kind() {
        let n: Notification = serde_json::from_value(json!({
            "id": "n1",
            "type": "accepted_answer",
            "message": "Your answer was accepted",
            "question_id": "q1",
            "answer_id": null,
            "read": false,
            "created_at": "2024-05-01T10:00:00",
            "from_username": "ferris"
        }))
        .unwrap();
        assert_eq!(n.kind, "accepted_answer");
        assert_eq!(n.answer_id, None);
        assert_eq!(n.question_title, None);
    }
}
