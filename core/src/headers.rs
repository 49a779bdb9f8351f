//! Header policy applied to every outbound request.
//!
//! Identity headers are always present. Content negotiation headers depend on
//! the body kind. The session cookie is attached if and only if a session
//! token is supplied; nothing is attached for an anonymous client.

use crate::config::ApiCredentials;
use crate::types::SessionToken;

pub const USER_AGENT: &str = "User-Agent";
pub const CLIENT_TOKEN: &str = "X-Client-Token";
pub const COOKIE: &str = "Cookie";

/// Encoding of the request body, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    None,
    Form,
    Json,
}

pub fn request_headers(
    credentials: &ApiCredentials,
    body: BodyKind,
    session: Option<&SessionToken>,
) -> Vec<(String, String)> {
    let mut headers = vec![
        (USER_AGENT.to_string(), credentials.user_agent.clone()),
        (CLIENT_TOKEN.to_string(), credentials.token().to_string()),
    ];

    match body {
        BodyKind::None => {}
        BodyKind::Form => headers.push((
            "Content-Type".to_string(),
            "application/x-www-form-urlencoded".to_string(),
        )),
        BodyKind::Json => {
            headers.push(("Accept".to_string(), "application/json".to_string()));
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
    }

    if let Some(token) = session {
        headers.push((COOKIE.to_string(), token.cookie_value()));
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> ApiCredentials {
        ApiCredentials::new("shelf/1.0", "t0k3n")
    }

    fn names(headers: &[(String, String)]) -> Vec<&str> {
        headers.iter().map(|(k, _)| k.as_str()).collect()
    }

    #[test]
    fn anonymous_get_carries_identity_only() {
        let headers = request_headers(&creds(), BodyKind::None, None);
        assert_eq!(
            headers,
            vec![
                ("User-Agent".to_string(), "shelf/1.0".to_string()),
                ("X-Client-Token".to_string(), "t0k3n".to_string()),
            ]
        );
    }

    #[test]
    fn json_body_adds_accept_and_content_type() {
        let headers = request_headers(&creds(), BodyKind::Json, None);
        assert_eq!(
            names(&headers),
            vec!["User-Agent", "X-Client-Token", "Accept", "Content-Type"]
        );
        assert!(headers.contains(&("Content-Type".to_string(), "application/json".to_string())));
    }

    #[test]
    fn form_body_is_url_encoded() {
        let headers = request_headers(&creds(), BodyKind::Form, None);
        assert!(headers.contains(&(
            "Content-Type".to_string(),
            "application/x-www-form-urlencoded".to_string()
        )));
        assert!(!names(&headers).contains(&"Accept"));
    }

    #[test]
    fn cookie_present_iff_session() {
        let token = SessionToken::new("abc123");
        let with = request_headers(&creds(), BodyKind::None, Some(&token));
        assert!(with.contains(&("Cookie".to_string(), "sessionid=abc123".to_string())));

        let without = request_headers(&creds(), BodyKind::Json, None);
        assert!(!names(&without).contains(&"Cookie"));
    }
}
