use serde::{Deserialize, Serialize};

use std::borrow::Cow;

/// A loosely typed body field. Callers sometimes send the code as a JSON
/// number, so numbers are accepted alongside strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(serde_json::Number),
    Other(serde_json::Value),
}

impl FieldValue {
    /// Textual form of the field, `None` for empty strings, zero, `null`,
    /// booleans and structured values.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Text(s) if !s.is_empty() => Some(Cow::Borrowed(s)),
            Self::Number(n) if n.as_f64() != Some(0.0) => Some(Cow::Owned(n.to_string())),
            _ => None,
        }
    }
}

/// Body of `POST /api/send-verification-code`. Both fields are optional at
/// the parsing stage so the handler can answer with its own envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendVerificationRequest {
    #[serde(default)]
    pub email: Option<FieldValue>,
    #[serde(default)]
    pub code: Option<FieldValue>,
}

impl SendVerificationRequest {
    /// Returns `(email, code)` when both are present and non-empty.
    pub fn required_fields(&self) -> Option<(Cow<'_, str>, Cow<'_, str>)> {
        let email = self.email.as_ref().and_then(FieldValue::as_text)?;
        let code = self.code.as_ref().and_then(FieldValue::as_text)?;
        Some((email, code))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SendResult {
    pub success: bool,
    pub message_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: None,
        }
    }

    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub message: String,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_strings_count_as_missing() {
        let req: SendVerificationRequest =
            serde_json::from_str(r#"{"email":"","code":"123"}"#).unwrap();
        assert!(req.required_fields().is_none());

        let req: SendVerificationRequest =
            serde_json::from_str(r#"{"email":"a@b.c"}"#).unwrap();
        assert!(req.required_fields().is_none());

        let req: SendVerificationRequest =
            serde_json::from_str(r#"{"email":"a@b.c","code":"123"}"#).unwrap();
        let (email, code) = req.required_fields().unwrap();
        assert_eq!((email.as_ref(), code.as_ref()), ("a@b.c", "123"));
    }

    #[test]
    fn numeric_code_is_accepted() {
        let req: SendVerificationRequest =
            serde_json::from_str(r#"{"email":"a@b.c","code":482913}"#).unwrap();
        let (_, code) = req.required_fields().unwrap();
        assert_eq!(code, "482913");
    }

    #[test]
    fn falsy_values_count_as_missing() {
        for body in [
            r#"{"email":"a@b.c","code":0}"#,
            r#"{"email":"a@b.c","code":null}"#,
            r#"{"email":"a@b.c","code":false}"#,
            r#"{"email":"a@b.c","code":{"value":"1"}}"#,
        ] {
            let req: SendVerificationRequest = serde_json::from_str(body).unwrap();
            assert!(req.required_fields().is_none(), "body: {body}");
        }
    }

    #[test]
    fn error_field_omitted_unless_set() {
        let body = serde_json::to_value(ApiResponse::ok("done")).unwrap();
        assert_eq!(body, serde_json::json!({"success": true, "message": "done"}));

        let body = serde_json::to_value(ApiResponse::fail("nope").with_error("boom")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"success": false, "message": "nope", "error": "boom"})
        );
    }

    #[test]
    fn send_result_uses_camel_case() {
        let body = serde_json::to_value(SendResult {
            success: true,
            message_id: "abc-123".to_string(),
        })
        .unwrap();
        assert_eq!(body["messageId"], "abc-123");
    }
}
