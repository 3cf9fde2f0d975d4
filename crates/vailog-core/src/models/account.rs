//! Request and response shapes for the account endpoints
//! (`/login`, `/users`, `/users/{slug}`).

use std::collections::BTreeMap;
use std::path::Path;

use mime_guess::mime;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub senha: String,
}

/// Taxpayer document sent at registration: CPF for people, CNPJ for companies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Document {
    Cpf(String),
    Cnpj(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub nome: String,
    pub email: String,
    /// Digits only
    pub celular: String,
    pub senha: String,
    pub empresa: String,
    #[serde(flatten)]
    pub document: Document,
}

/// Token and optional user snapshot returned by login and registration.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthResponse {
    pub token: String,
    pub usuario: Option<Value>,
}

impl AuthResponse {
    /// Pick the token and user out of a response body. `None` when there is
    /// no usable token.
    pub fn from_value(value: &Value) -> Option<Self> {
        let token = value
            .get("token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())?
            .to_string();
        let usuario = value
            .get("usuario")
            .filter(|u| u.is_object())
            .cloned();
        Some(Self { token, usuario })
    }
}

/// A picture attached to a profile update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarFile {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum AvatarError {
    #[error("Selecione um arquivo de imagem.")]
    NotAnImage,

    #[error("Não foi possível ler a imagem: {0}")]
    Io(#[from] std::io::Error),
}

impl AvatarFile {
    /// Load a picture from disk. The extension decides the MIME type and
    /// anything that is not `image/*` is refused before reading.
    pub fn load(path: &Path) -> Result<Self, AvatarError> {
        let mime = image_mime(path).ok_or(AvatarError::NotAnImage)?;
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "avatar".to_string());
        Ok(Self {
            mime: mime.to_string(),
            file_name,
            bytes,
        })
    }
}

/// MIME type guessed from the file extension, when it is an image type.
pub fn image_mime(path: &Path) -> Option<mime::Mime> {
    let guess = mime_guess::from_path(path).first_or_octet_stream();
    (guess.type_() == mime::IMAGE).then_some(guess)
}

/// Changed profile fields, plus an optional new avatar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub fields: BTreeMap<String, String>,
    pub avatar: Option<AvatarFile>,
}

impl ProfileUpdate {
    pub fn fields_json(&self) -> Value {
        Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )
    }
}
