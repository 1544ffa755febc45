use poem::{Error as PoemError, Result as PoemResult, http::HeaderMap, http::StatusCode};
use poem_openapi::SecurityScheme;
use poem_openapi::auth::Bearer;
use subtle::ConstantTimeEq;

#[derive(SecurityScheme)]
#[oai(ty = "bearer")]
pub struct AdminAuth(pub Bearer);

impl AdminAuth {
    pub fn verify(&self, expected: &str) -> PoemResult<()> {
        if token_matches(&self.0.token, expected) {
            Ok(())
        } else {
            Err(PoemError::from_string(
                "invalid admin token",
                StatusCode::UNAUTHORIZED,
            ))
        }
    }
}

/// Token presented to the cron trigger: the bearer header wins over the
/// `token` query parameter.
pub fn presented_token<'a>(headers: &'a HeaderMap, query: Option<&'a str>) -> Option<&'a str> {
    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .or_else(|| query.filter(|token| !token.is_empty()))
}

/// Constant-time comparison. An empty secret never matches.
pub fn token_matches(presented: &str, expected: &str) -> bool {
    let presented = presented.as_bytes();
    let expected = expected.as_bytes();
    !expected.is_empty()
        && presented.len() == expected.len()
        && presented.ct_eq(expected).unwrap_u8() == 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use poem::http::HeaderValue;

    #[test]
    fn compares_tokens() {
        assert!(token_matches("s3cret", "s3cret"));
        assert!(!token_matches("s3cre", "s3cret"));
        assert!(!token_matches("s3creT", "s3cret"));
        assert!(!token_matches("", ""));
    }

    #[test]
    fn header_token_takes_precedence() {
        let mut headers = HeaderMap::new();
        assert_eq!(presented_token(&headers, Some("from-query")), Some("from-query"));
        assert_eq!(presented_token(&headers, Some("")), None);

        headers.insert("authorization", HeaderValue::from_static("Bearer from-header"));
        assert_eq!(presented_token(&headers, Some("from-query")), Some("from-header"));

        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert_eq!(presented_token(&headers, Some("from-query")), Some("from-query"));
    }
}
