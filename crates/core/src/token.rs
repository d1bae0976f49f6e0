use std::fmt::Display;
use std::sync::LazyLock;

use axum::http::{HeaderMap, HeaderName};
use regex::Regex;
use serde_json::Value;

pub const DEFAULT_TOKEN_HEADER: &str = "x-notion-verification-token";

/// One-time token sent by the sender while the endpoint is being verified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationToken(String);

impl VerificationToken {
    fn new(token: &str) -> Option<Self> {
        let token = token.trim();
        (!token.is_empty()).then(|| Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for VerificationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ways of finding a token, tried in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    Header,
    JsonField,
    FormField,
    /// Compatibility shim for payload shapes the structured strategies miss.
    /// Not part of the trusted contract.
    PatternScan,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Header,
        Strategy::JsonField,
        Strategy::FormField,
        Strategy::PatternScan,
    ];
}

#[derive(Clone, Debug)]
pub struct TokenExtractor {
    headers: Vec<HeaderName>,
    strategies: Vec<Strategy>,
}

impl Default for TokenExtractor {
    fn default() -> Self {
        Self::new([HeaderName::from_static(DEFAULT_TOKEN_HEADER)])
    }
}

impl TokenExtractor {
    pub fn new(headers: impl IntoIterator<Item = HeaderName>) -> Self {
        Self {
            headers: headers.into_iter().collect(),
            strategies: Strategy::ALL.to_vec(),
        }
    }

    pub fn with_strategies(mut self, strategies: impl IntoIterator<Item = Strategy>) -> Self {
        self.strategies = strategies.into_iter().collect();
        self
    }

    pub fn extract(&self, headers: &HeaderMap, raw_body: &[u8]) -> Option<VerificationToken> {
        self.strategies
            .iter()
            .find_map(|strategy| self.apply(*strategy, headers, raw_body))
    }

    fn apply(
        &self,
        strategy: Strategy,
        headers: &HeaderMap,
        raw_body: &[u8],
    ) -> Option<VerificationToken> {
        match strategy {
            Strategy::Header => from_headers(&self.headers, headers),
            Strategy::JsonField => from_json(raw_body),
            Strategy::FormField => from_form(raw_body),
            Strategy::PatternScan => from_pattern(raw_body),
        }
    }
}

fn from_headers(names: &[HeaderName], headers: &HeaderMap) -> Option<VerificationToken> {
    names
        .iter()
        .filter_map(|name| headers.get(name))
        .filter_map(|v| v.to_str().ok())
        .find_map(VerificationToken::new)
}

fn from_json(raw_body: &[u8]) -> Option<VerificationToken> {
    let value = serde_json::from_slice::<Value>(raw_body).ok()?;
    let string_field = |key: &str| {
        value
            .get(key)
            .and_then(Value::as_str)
            .and_then(VerificationToken::new)
    };

    // `{"event"|"type": "verification", "verificationToken": ..}` is covered
    // by the first lookup.
    string_field("verificationToken").or_else(|| string_field("token"))
}

fn from_form(raw_body: &[u8]) -> Option<VerificationToken> {
    if !raw_body.contains(&b'=') || serde_json::from_slice::<Value>(raw_body).is_ok() {
        return None;
    }

    let pairs: Vec<_> = url::form_urlencoded::parse(raw_body).collect();
    ["verificationToken", "token"].iter().find_map(|key| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| VerificationToken::new(v))
    })
}

static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:^|[^A-Za-z0-9_])["']?verificationToken["']?\s*[:=]\s*(?:"([^"]*)"|'([^']*)'|([^\s,&;}"']+))"#,
    )
    .expect("token pattern is valid")
});

// Well-formed JSON has already been judged by `from_json`; only bodies that
// fail structured parsing reach the scan.
fn from_pattern(raw_body: &[u8]) -> Option<VerificationToken> {
    if serde_json::from_slice::<Value>(raw_body).is_ok() {
        return None;
    }

    let body = String::from_utf8_lossy(raw_body);
    TOKEN_PATTERN.captures_iter(&body).find_map(|caps| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .and_then(|m| VerificationToken::new(m.as_str()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            let name = HeaderName::from_bytes(k.as_bytes()).unwrap();
            map.insert(name, HeaderValue::from_static(v));
        }
        map
    }

    fn extract(headers: &HeaderMap, body: &str) -> Option<String> {
        TokenExtractor::default()
            .extract(headers, body.as_bytes())
            .map(|t| t.as_str().to_string())
    }

    #[test]
    fn header_wins_over_body() {
        let h = headers(&[("X-Notion-Verification-Token", "from_header")]);
        let body = r#"{"verificationToken":"from_body"}"#;
        assert_eq!(extract(&h, body).as_deref(), Some("from_header"));
    }

    #[test]
    fn header_only() {
        let h = headers(&[("x-notion-verification-token", "tok_1")]);
        assert_eq!(extract(&h, "").as_deref(), Some("tok_1"));
    }

    #[test]
    fn blank_header_falls_through() {
        let h = headers(&[("x-notion-verification-token", "  ")]);
        assert_eq!(extract(&h, r#"{"token":"b"}"#).as_deref(), Some("b"));
    }

    #[test]
    fn custom_header_names() {
        let extractor = TokenExtractor::new([
            HeaderName::from_static("x-first"),
            HeaderName::from_static("x-second"),
        ]);
        let h = headers(&[("x-second", "two")]);
        assert_eq!(
            extractor.extract(&h, b"").map(|t| t.to_string()).as_deref(),
            Some("two")
        );
    }

    #[test]
    fn verification_event_body() {
        let body = r#"{"event":"verification","verificationToken":"abc123"}"#;
        assert_eq!(extract(&HeaderMap::new(), body).as_deref(), Some("abc123"));
    }

    #[test]
    fn json_token_field() {
        let body = r#"{"token":"t-9"}"#;
        assert_eq!(extract(&HeaderMap::new(), body).as_deref(), Some("t-9"));
    }

    #[test]
    fn verification_token_preferred_over_token() {
        let body = r#"{"token":"second","verificationToken":"first"}"#;
        assert_eq!(extract(&HeaderMap::new(), body).as_deref(), Some("first"));
    }

    #[test]
    fn non_string_fields_ignored() {
        for body in [
            r#"{"token":42,"type":"page.updated"}"#,
            r#"{"verificationToken":42}"#,
            r#"{"verificationToken":true,"token":null}"#,
            r#"{"verificationToken":{"value":"abc"}}"#,
            r#"{"event":"verification","verificationToken":["abc"]}"#,
        ] {
            assert_eq!(extract(&HeaderMap::new(), body), None, "{body}");
        }
    }

    #[test]
    fn nested_keys_in_valid_json_ignored() {
        for body in [
            r#"{"type":"page.updated","data":{"verificationToken":"abc"}}"#,
            r#"{"type":"comment.created","data":{"text":"see verificationToken=xyz"}}"#,
            r#"[{"verificationToken":"abc"}]"#,
            r#""verificationToken: abc""#,
        ] {
            assert_eq!(extract(&HeaderMap::new(), body), None, "{body}");
        }
    }

    #[test]
    fn pattern_scan_needs_key_boundary() {
        assert_eq!(extract(&HeaderMap::new(), "notverificationToken: abc"), None);
        assert_eq!(
            extract(&HeaderMap::new(), "{x_verificationToken: \"abc\""),
            None
        );
        assert_eq!(
            extract(&HeaderMap::new(), "{ verificationToken: \"abc\"").as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn form_encoded_body() {
        assert_eq!(
            extract(&HeaderMap::new(), "verificationToken=abc%20def&x=1").as_deref(),
            Some("abc def")
        );
        assert_eq!(
            extract(&HeaderMap::new(), "a=1&token=zz").as_deref(),
            Some("zz")
        );
    }

    #[test]
    fn pattern_scan_catches_broken_json() {
        let body = r#"{"verificationToken": "xyz", oops"#;
        assert_eq!(extract(&HeaderMap::new(), body).as_deref(), Some("xyz"));
    }

    #[test]
    fn pattern_scan_bare_value() {
        let body = "verificationToken: bare_tok\n";
        assert_eq!(extract(&HeaderMap::new(), body).as_deref(), Some("bare_tok"));
    }

    #[test]
    fn pattern_scan_can_be_disabled() {
        let extractor = TokenExtractor::default().with_strategies([
            Strategy::Header,
            Strategy::JsonField,
            Strategy::FormField,
        ]);
        let body = br#"{"verificationToken": "xyz", oops"#;
        assert_eq!(extractor.extract(&HeaderMap::new(), body), None);
    }

    #[test]
    fn garbage_body_yields_nothing() {
        assert_eq!(extract(&HeaderMap::new(), "%%%not json, not form{{"), None);
        assert_eq!(
            TokenExtractor::default().extract(&HeaderMap::new(), &[0xff, 0xfe, 0x00, 0x3d]),
            None
        );
        assert_eq!(extract(&HeaderMap::new(), ""), None);
    }

    #[test]
    fn ordinary_event_yields_nothing() {
        let body = r#"{"type":"page.updated","entity":{"id":"p1"}}"#;
        assert_eq!(extract(&HeaderMap::new(), body), None);
    }
}
