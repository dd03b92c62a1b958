//! Request description handed to [`ApiClient::execute`](super::ApiClient::execute)

use agrm_domain::constants::DEFAULT_CALL_TAG;
use agrm_domain::ResponseKind;
use reqwest::Method;
use serde_json::Value;

/// One logical API call
///
/// `url` is either absolute or a path starting with `/`, which is joined
/// onto the client's base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// JSON body; `None` sends no body and no `Content-Type`
    pub payload: Option<Value>,
    pub method: Method,
    pub url: String,
    /// Opaque label for the caller; echoed in logs and call state
    pub tag: String,
    /// Send without credentials; a 401 fails without a refresh
    pub skip_auth: bool,
    pub response_kind: ResponseKind,
}

impl ApiRequest {
    /// Request with no body, the default tag and a JSON response.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            payload: None,
            method,
            url: url.into(),
            tag: DEFAULT_CALL_TAG.to_string(),
            skip_auth: false,
            response_kind: ResponseKind::Json,
        }
    }

    /// `GET url`
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// `POST url` with a JSON body
    pub fn post(url: impl Into<String>, payload: Value) -> Self {
        Self::new(Method::POST, url).payload(payload)
    }

    /// `PUT url` with a JSON body
    pub fn put(url: impl Into<String>, payload: Value) -> Self {
        Self::new(Method::PUT, url).payload(payload)
    }

    /// `PATCH url` with a JSON body
    pub fn patch(url: impl Into<String>, payload: Value) -> Self {
        Self::new(Method::PATCH, url).payload(payload)
    }

    /// `DELETE url`
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Set the JSON body; `null` means no body.
    #[must_use]
    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = (!payload.is_null()).then_some(payload);
        self
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Send without credentials and never attempt a refresh.
    #[must_use]
    pub const fn skip_auth(mut self) -> Self {
        self.skip_auth = true;
        self
    }

    #[must_use]
    pub const fn response_kind(mut self, kind: ResponseKind) -> Self {
        self.response_kind = kind;
        self
    }

    /// Shorthand for `response_kind(ResponseKind::Bytes)`.
    #[must_use]
    pub const fn bytes(self) -> Self {
        self.response_kind(ResponseKind::Bytes)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn defaults() {
        let request = ApiRequest::get("/employees");
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.tag, "default");
        assert!(request.payload.is_none());
        assert!(!request.skip_auth);
        assert_eq!(request.response_kind, ResponseKind::Json);
    }

    #[test]
    fn builder_sets_every_field() {
        let request = ApiRequest::post("/auth/login", json!({ "login": "admin" }))
            .tag("LOGIN")
            .skip_auth()
            .bytes();

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.payload, Some(json!({ "login": "admin" })));
        assert_eq!(request.tag, "LOGIN");
        assert!(request.skip_auth);
        assert_eq!(request.response_kind, ResponseKind::Bytes);
    }

    #[test]
    fn null_payload_means_no_body() {
        assert!(ApiRequest::post("/members", Value::Null).payload.is_none());
        assert!(ApiRequest::get("/members").payload(json!(null)).payload.is_none());
        assert_eq!(ApiRequest::put("/members/1", json!([])).payload, Some(json!([])));
    }
}
