//! Data-access and session layer for the GAN-ster Q&A service.
//! Front ends call into [`ApiClient`] and never build requests themselves.

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod session;

pub use client::ApiClient;
pub use config::{ApiEnvironment, Config, ConfigError, default_base_url};
pub use error::{ApiError, ApiResult, ErrorKind, ServerHint};
pub use models::{
    Answer, AnswerCreate, AuthTokens, LoginRequest, MarkAllReadOutcome, MessageResponse,
    Notification, NotificationStats, Question, QuestionCreate, QuestionQuery, RegisterRequest,
    SearchResponse, TagSuggestions, User, VoteAction, VoteOutcome,
};
pub use reqwest::StatusCode;
pub use session::{
    FileSessionStore, KeyringSessionStore, MemorySessionStore, Session, SessionBackend,
    SessionError, SessionStore,
};
