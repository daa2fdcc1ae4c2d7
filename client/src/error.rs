use crate::session::SessionError;
use reqwest::StatusCode;
use thiserror::Error;

/// Every failure an [`ApiClient`](crate::ApiClient) operation can produce.
///
/// Operations split into two families. Writes where the backend phrases
/// user-facing feedback (validation, moderation, auth prompts) fail with
/// [`ApiError::ServerMessage`], whose text is the response body verbatim.
/// Read paths fail with [`ApiError::Generic`] and a fixed message. Callers
/// that used to match on message substrings can branch on [`ApiError::kind`]
/// or [`ApiError::hint`] instead; the original text is always kept.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    ServerMessage { status: StatusCode, message: String },

    #[error("{message}")]
    Generic {
        status: StatusCode,
        message: &'static str,
    },

    /// Connection, DNS, timeout or body decoding failure from the HTTP stack.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ServerMessage,
    Generic,
    Transport,
    Session,
}

/// What a server message is about, as far as the client can tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerHint {
    /// Content was rejected by moderation ("community guidelines").
    Moderation,
    /// Missing, invalid or expired credentials.
    Authentication,
    /// Authenticated but not allowed to do this.
    Forbidden,
    Other,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::ServerMessage { .. } => ErrorKind::ServerMessage,
            ApiError::Generic { .. } => ErrorKind::Generic,
            ApiError::Transport(_) => ErrorKind::Transport,
            ApiError::Session(_) => ErrorKind::Session,
        }
    }

    /// HTTP status of the rejected response, when there was one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::ServerMessage { status, .. } | ApiError::Generic { status, .. } => {
                Some(*status)
            }
            ApiError::Transport(e) => e.status(),
            ApiError::Session(_) => None,
        }
    }

    /// The display text, identical to `to_string()`.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Classifies a server message. `None` for every other kind.
    ///
    /// Substrings are checked before the status code: the backend answers a
    /// missing bearer header with 403 "Not authenticated".
    pub fn hint(&self) -> Option<ServerHint> {
        let ApiError::ServerMessage { status, message } = self else {
            return None;
        };
        let lower = message.to_lowercase();

        let hint = if lower.contains("community guidelines") {
            ServerHint::Moderation
        } else if *status == StatusCode::UNAUTHORIZED
            || lower.contains("authentication")
            || lower.contains("not authenticated")
            || lower.contains("credentials")
        {
            ServerHint::Authentication
        } else if *status == StatusCode::FORBIDDEN {
            ServerHint::Forbidden
        } else {
            ServerHint::Other
        };
        Some(hint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(status: StatusCode, message: &str) -> ApiError {
        ApiError::ServerMessage {
            status,
            message: message.to_string(),
        }
    }

    #[test]
    fn server_message_displays_body_verbatim() {
        let body = r#"{"detail":"Username already registered"}"#;
        let err = server(StatusCode::BAD_REQUEST, body);
        assert_eq!(err.to_string(), body);
        assert_eq!(err.kind(), ErrorKind::ServerMessage);
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn generic_displays_fixed_message() {
        let err = ApiError::Generic {
            status: StatusCode::NOT_FOUND,
            message: "Failed to fetch question",
        };
        assert_eq!(err.message(), "Failed to fetch question");
        assert_eq!(err.kind(), ErrorKind::Generic);
        assert_eq!(err.hint(), None);
    }

    #[test]
    fn moderation_rejection_is_recognised() {
        let err = server(
            StatusCode::BAD_REQUEST,
            r#"{"detail":"Your answer does not meet our Community Guidelines."}"#,
        );
        assert_eq!(err.hint(), Some(ServerHint::Moderation));
    }

    #[test]
    fn missing_bearer_header_reads_as_authentication() {
        let err = server(StatusCode::FORBIDDEN, r#"{"detail":"Not authenticated"}"#);
        assert_eq!(err.hint(), Some(ServerHint::Authentication));

        let err = server(StatusCode::UNAUTHORIZED, "");
        assert_eq!(err.hint(), Some(ServerHint::Authentication));
    }

    #[test]
    fn forbidden_and_other_fall_through() {
        let err = server(
            StatusCode::FORBIDDEN,
            r#"{"detail":"You can only delete your own answers"}"#,
        );
        assert_eq!(err.hint(), Some(ServerHint::Forbidden));

        let err = server(StatusCode::NOT_FOUND, r#"{"detail":"Question not found"}"#);
        assert_eq!(err.hint(), Some(ServerHint::Other));
    }
}
