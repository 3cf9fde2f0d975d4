use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The backend answered with a non-success status. The payload is the
    /// human-readable message and nothing else.
    #[error("{0}")]
    Request(String),

    #[error("Não foi possível conectar ao servidor: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Resposta inválida do servidor: {0}")]
    InvalidResponse(String),

    #[error("Cabeçalho inválido: {0}")]
    InvalidHeader(String),
}

impl ApiError {
    /// Build the error for a failed response: the body's `message` when it
    /// has one, `Erro <status>: <reason>` otherwise.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v.get("message").and_then(message_text))
            .unwrap_or_else(|| fallback_message(status));
        ApiError::Request(message)
    }
}

fn fallback_message(status: StatusCode) -> String {
    format!(
        "Erro {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    )
}

/// Coerce a `message` field into text. Empty strings and nulls don't count;
/// lists of messages (common with validation pipes) are comma-joined.
fn message_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Null | Value::Object(_) => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(status: u16, body: &str) -> String {
        let status = StatusCode::from_u16(status).expect("valid status");
        ApiError::from_status(status, body).to_string()
    }

    #[test]
    fn test_backend_message_wins() {
        assert_eq!(
            message(401, r#"{"message":"Credenciais inválidas"}"#),
            "Credenciais inválidas"
        );
        assert_eq!(message(422, r#"{"message":["email inválido","senha curta"]}"#), "email inválido,senha curta");
    }

    #[test]
    fn test_fallback_message() {
        assert_eq!(message(500, "<html>boom</html>"), "Erro 500: Internal Server Error");
        assert_eq!(message(404, ""), "Erro 404: Not Found");
        assert_eq!(message(400, r#"{"error":"x"}"#), "Erro 400: Bad Request");
        assert_eq!(message(400, r#"{"message":""}"#), "Erro 400: Bad Request");
        assert_eq!(message(400, r#"{"message":null}"#), "Erro 400: Bad Request");
    }
}
