//! HTTP client for the Q&A backend. Every request the application makes goes
//! through [`ApiClient`].

use crate::error::{ApiError, ApiResult};
use crate::models::{
    Answer, AnswerCreate, AuthTokens, LoginRequest, MarkAllReadOutcome, MessageResponse,
    Notification, NotificationStats, Question, QuestionCreate, QuestionQuery, RegisterRequest,
    SearchResponse, TagSuggestions, User, VoteAction, VoteOutcome, VoteRequest,
};
use crate::session::{Session, SessionStore};
use log::{debug, warn};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

const FETCH_QUESTIONS_FAILED: &str = "Failed to fetch questions";
const FETCH_QUESTION_FAILED: &str = "Failed to fetch question";
const DELETE_QUESTION_FAILED: &str = "Failed to delete question";
const FETCH_ANSWERS_FAILED: &str = "Failed to fetch answers";
const FETCH_ANSWER_FAILED: &str = "Failed to fetch answer";
const SEARCH_FAILED: &str = "Search failed";
const FETCH_NOTIFICATIONS_FAILED: &str = "Failed to fetch notifications";
const FETCH_NOTIFICATION_STATS_FAILED: &str = "Failed to fetch notification stats";
const AI_ANSWER_FAILED: &str = "Failed to generate AI answer";

/// Cheap to clone; clones share the connection pool and the session store.
///
/// Calls are independent of each other. Nothing is retried, coalesced or
/// cancelled here.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    session: Session,
}

impl ApiClient {
    pub fn new(base_url: Url, store: Arc<dyn SessionStore>) -> Self {
        Self::with_http(reqwest::Client::new(), base_url, Session::new(store))
    }

    pub fn with_http(http: reqwest::Client, base_url: Url, session: Session) -> Self {
        Self {
            http,
            base_url,
            session,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// `Authorization: Bearer <token>` if a token is stored, otherwise empty.
    /// Read from the store on every call, never cached.
    pub fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(bearer) = self.session.bearer() {
            match HeaderValue::from_str(&bearer) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("stored access token is not a valid header value; sending none"),
            }
        }
        headers
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str], authenticated: bool) -> RequestBuilder {
        let url = self.endpoint(segments);
        debug!("{} {}", method, url.path());
        let builder = self.http.request(method, url);
        if authenticated {
            builder.headers(self.auth_headers())
        } else {
            builder
        }
    }

    // ── auth ────────────────────────────────────────────────────────────

    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<User> {
        let response = self
            .request(Method::POST, &["auth", "register"], false)
            .json(request)
            .send()
            .await?;
        server_json(response, None).await
    }

    /// Logs in and persists the token and user before returning, so
    /// [`is_authenticated`](Self::is_authenticated) is true as soon as this
    /// resolves.
    pub async fn login(&self, request: &LoginRequest) -> ApiResult<AuthTokens> {
        let response = self
            .request(Method::POST, &["auth", "login"], false)
            .json(request)
            .send()
            .await?;
        let tokens: AuthTokens = server_json(response, None).await?;
        self.session.persist(&tokens)?;
        debug!("session stored for {}", tokens.user.username);
        Ok(tokens)
    }

    /// Forgets the stored session. No network call; safe to repeat.
    pub fn logout(&self) -> ApiResult<()> {
        self.session.clear()?;
        Ok(())
    }

    pub fn current_user(&self) -> Option<User> {
        self.session.user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    // ── questions ───────────────────────────────────────────────────────

    pub async fn get_questions(&self, query: &QuestionQuery) -> ApiResult<Vec<Question>> {
        let mut params = vec![
            ("skip", query.skip.to_string()),
            ("limit", query.limit.to_string()),
        ];
        if let Some(tag) = &query.tag {
            params.push(("tag", tag.clone()));
        }

        let response = self
            .request(Method::GET, &["questions", ""], false)
            .query(&params)
            .send()
            .await?;
        generic_json(response, FETCH_QUESTIONS_FAILED).await
    }

    pub async fn get_question(&self, id: &str) -> ApiResult<Question> {
        let response = self
            .request(Method::GET, &["questions", id], false)
            .send()
            .await?;
        generic_json(response, FETCH_QUESTION_FAILED).await
    }

    pub async fn create_question(&self, question: &QuestionCreate) -> ApiResult<Question> {
        let response = self
            .request(Method::POST, &["questions", ""], true)
            .json(question)
            .send()
            .await?;
        server_json(response, None).await
    }

    pub async fn delete_question(&self, id: &str) -> ApiResult<()> {
        let response = self
            .request(Method::DELETE, &["questions", id], true)
            .send()
            .await?;
        generic_ok(response, DELETE_QUESTION_FAILED)
    }

    pub async fn search_questions(&self, query: &str) -> ApiResult<SearchResponse> {
        let response = self
            .request(Method::GET, &["questions", "search"], false)
            .query(&[("q", query)])
            .send()
            .await?;
        generic_json(response, SEARCH_FAILED).await
    }

    pub async fn suggest_tags(&self, title: &str, description: &str) -> ApiResult<TagSuggestions> {
        let response = self
            .request(Method::POST, &["questions", "suggest-tags"], true)
            .query(&[("title", title), ("description", description)])
            .send()
            .await?;
        server_json(response, None).await
    }

    // ── answers ─────────────────────────────────────────────────────────

    pub async fn get_answers(&self, question_id: &str) -> ApiResult<Vec<Answer>> {
        let response = self
            .request(Method::GET, &["answers", "question", question_id], false)
            .send()
            .await?;
        generic_json(response, FETCH_ANSWERS_FAILED).await
    }

    pub async fn get_answer(&self, id: &str) -> ApiResult<Answer> {
        let response = self
            .request(Method::GET, &["answers", id], false)
            .send()
            .await?;
        generic_json(response, FETCH_ANSWER_FAILED).await
    }

    /// Fails with the server's text on rejection. Moderation and auth
    /// failures are told apart with [`ApiError::hint`].
    pub async fn create_answer(
        &self,
        question_id: &str,
        answer: &AnswerCreate,
    ) -> ApiResult<Answer> {
        let response = self
            .request(Method::POST, &["answers", ""], true)
            .query(&[("question_id", question_id)])
            .json(answer)
            .send()
            .await?;
        server_json(response, None).await
    }

    pub async fn generate_ai_answer(&self, question_id: &str) -> ApiResult<Answer> {
        let response = self
            .request(Method::POST, &["answers", "ai-generate"], true)
            .query(&[("question_id", question_id)])
            .send()
            .await?;
        server_json(response, Some(AI_ANSWER_FAILED)).await
    }

    pub async fn vote_answer(&self, id: &str, action: VoteAction) -> ApiResult<VoteOutcome> {
        let response = self
            .request(Method::POST, &["answers", id, "vote"], true)
            .json(&VoteRequest { action })
            .send()
            .await?;
        server_json(response, None).await
    }

    pub async fn accept_answer(&self, id: &str) -> ApiResult<MessageResponse> {
        let response = self
            .request(Method::POST, &["answers", id, "accept"], true)
            .send()
            .await?;
        server_json(response, None).await
    }

    pub async fn delete_answer(&self, id: &str) -> ApiResult<()> {
        let response = self
            .request(Method::DELETE, &["answers", id], true)
            .send()
            .await?;
        server_ok(response).await
    }

    // ── notifications ───────────────────────────────────────────────────

    pub async fn get_notifications(
        &self,
        limit: u32,
        unread_only: bool,
    ) -> ApiResult<Vec<Notification>> {
        let response = self
            .request(Method::GET, &["notifications", ""], true)
            .query(&[
                ("limit", limit.to_string()),
                ("unread_only", unread_only.to_string()),
            ])
            .send()
            .await?;
        generic_json(response, FETCH_NOTIFICATIONS_FAILED).await
    }

    pub async fn notification_stats(&self) -> ApiResult<NotificationStats> {
        let response = self
            .request(Method::GET, &["notifications", "stats"], true)
            .send()
            .await?;
        generic_json(response, FETCH_NOTIFICATION_STATS_FAILED).await
    }

    pub async fn mark_notification_read(&self, id: &str) -> ApiResult<MessageResponse> {
        let response = self
            .request(Method::POST, &["notifications", id, "read"], true)
            .send()
            .await?;
        server_json(response, None).await
    }

    pub async fn mark_all_notifications_read(&self) -> ApiResult<MarkAllReadOutcome> {
        let response = self
            .request(Method::POST, &["notifications", "mark-all-read"], true)
            .send()
            .await?;
        server_json(response, None).await
    }
}

/// Rejects a non-2xx response with its body text, or `fallback` when the
/// body is blank and a fallback was given.
async fn server_error(response: Response, fallback: Option<&str>) -> ApiError {
    let status = response.status();
    let message = match response.text().await {
        Ok(text) => text,
        Err(e) => return ApiError::Transport(e),
    };
    let message = match fallback {
        Some(fallback) if message.trim().is_empty() => fallback.to_string(),
        _ => message,
    };
    ApiError::ServerMessage { status, message }
}

async fn server_json<T: DeserializeOwned>(
    response: Response,
    fallback: Option<&str>,
) -> ApiResult<T> {
    if !response.status().is_success() {
        return Err(server_error(response, fallback).await);
    }
    Ok(response.json().await?)
}

async fn server_ok(response: Response) -> ApiResult<()> {
    if !response.status().is_success() {
        return Err(server_error(response, None).await);
    }
    Ok(())
}

async fn generic_json<T: DeserializeOwned>(
    response: Response,
    message: &'static str,
) -> ApiResult<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Generic { status, message });
    }
    Ok(response.json().await?)
}

fn generic_ok(response: Response, message: &'static str) -> ApiResult<()> {
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Generic { status, message });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::with_http(
            reqwest::Client::new(),
            Url::parse(base).unwrap(),
            Session::in_memory(),
        )
    }

    #[test]
    fn endpoints_keep_base_path() {
        let c = client("http://localhost:8080/api");
        assert_eq!(
            c.endpoint(&["questions", ""]).as_str(),
            "http://localhost:8080/api/questions/"
        );
        assert_eq!(
            c.endpoint(&["answers", "question", "abc"]).as_str(),
            "http://localhost:8080/api/answers/question/abc"
        );

        let c = client("http://localhost:8000");
        assert_eq!(
            c.endpoint(&["auth", "login"]).as_str(),
            "http://localhost:8000/auth/login"
        );
    }

    #[test]
    fn ids_are_escaped_as_single_segments() {
        let c = client("http://localhost:8000/");
        assert_eq!(
            c.endpoint(&["questions", "a/b c"]).as_str(),
            "http://localhost:8000/questions/a%2Fb%20c"
        );
    }

    #[test]
    fn auth_headers_follow_the_session() {
        let c = client("http://localhost:8000");
        assert!(c.auth_headers().is_empty());

        c.session()
            .persist(&AuthTokens {
                access_token: "abc".into(),
                token_type: "bearer".into(),
                user: User {
                    id: "u1".into(),
                    username: "ferris".into(),
                    email: "f@example.com".into(),
                    role: "user".into(),
                    created_at: "2024-05-01T10:00:00".into(),
                    is_active: true,
                },
            })
            .unwrap();
        assert_eq!(c.auth_headers()[AUTHORIZATION], "Bearer abc");

        c.logout().unwrap();
        assert!(c.auth_headers().get(AUTHORIZATION).is_none());
    }
}
