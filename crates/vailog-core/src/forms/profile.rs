use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{AvatarError, AvatarFile, ProfileUpdate, UserProfile};

use super::{char_len, FieldErrors};

const MSG_NAME: &str = "Informe o nome";
const MIN_NAME_LENGTH: usize = 3;

pub const MSG_NOTHING_TO_UPDATE: &str = "Nada para atualizar.";
pub const MSG_PROFILE_SAVED: &str = "Perfil atualizado com sucesso!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProfileField {
    Name,
    Phone,
    Company,
    Avatar,
}

impl ProfileField {
    pub const ALL: [ProfileField; 4] = [
        ProfileField::Name,
        ProfileField::Phone,
        ProfileField::Company,
        ProfileField::Avatar,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ProfileField::Name => "Nome",
            ProfileField::Phone => "Celular",
            ProfileField::Company => "Empresa",
            ProfileField::Avatar => "Foto (arquivo)",
        }
    }

    /// Key used in the JSON diff and multipart form
    fn wire_key(&self) -> Option<&'static str> {
        match self {
            ProfileField::Name => Some("nome"),
            ProfileField::Phone => Some("celular"),
            ProfileField::Company => Some("empresa"),
            ProfileField::Avatar => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Corrija os campos destacados")]
    Invalid(FieldErrors<ProfileField>),

    #[error("Usuário inválido.")]
    MissingSlug,

    #[error(transparent)]
    Avatar(#[from] AvatarError),
}

/// What submitting the form amounts to.
#[derive(Debug, PartialEq, Eq)]
pub enum ProfileSubmission {
    /// No field changed and no picture attached; nothing is sent.
    NothingToUpdate,
    Send { slug: String, update: ProfileUpdate },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Snapshot {
    name: String,
    phone: String,
    company: String,
}

/// Edit form seeded from the stored user snapshot. Only fields that differ
/// from the snapshot (after trimming) are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    initial: Snapshot,
    pub name: String,
    pub phone: String,
    pub company: String,
    /// Path of a new picture to upload, typed by the user
    pub avatar_path: String,
}

impl ProfileForm {
    pub fn from_user(user: Option<&UserProfile>) -> Self {
        let initial = Snapshot {
            name: user.and_then(|u| u.name.clone()).unwrap_or_default(),
            phone: user.and_then(|u| u.phone.clone()).unwrap_or_default(),
            company: user.and_then(|u| u.company.clone()).unwrap_or_default(),
        };
        Self {
            name: initial.name.clone(),
            phone: initial.phone.clone(),
            company: initial.company.clone(),
            avatar_path: String::new(),
            initial,
        }
    }

    pub fn value(&self, field: ProfileField) -> &str {
        match field {
            ProfileField::Name => &self.name,
            ProfileField::Phone => &self.phone,
            ProfileField::Company => &self.company,
            ProfileField::Avatar => &self.avatar_path,
        }
    }

    pub fn value_mut(&mut self, field: ProfileField) -> &mut String {
        match field {
            ProfileField::Name => &mut self.name,
            ProfileField::Phone => &mut self.phone,
            ProfileField::Company => &mut self.company,
            ProfileField::Avatar => &mut self.avatar_path,
        }
    }

    pub fn can_submit(&self) -> bool {
        !self.name.is_empty()
    }

    fn initial_value(&self, field: ProfileField) -> &str {
        match field {
            ProfileField::Name => &self.initial.name,
            ProfileField::Phone => &self.initial.phone,
            ProfileField::Company => &self.initial.company,
            ProfileField::Avatar => "",
        }
    }

    /// Changed, non-empty fields keyed by their wire name.
    pub fn changes(&self) -> BTreeMap<String, String> {
        ProfileField::ALL
            .iter()
            .filter_map(|field| {
                let key = field.wire_key()?;
                let current = self.value(*field).trim();
                let changed = current != self.initial_value(*field).trim();
                (changed && !current.is_empty()).then(|| (key.to_string(), current.to_string()))
            })
            .collect()
    }

    fn avatar(&self) -> Option<PathBuf> {
        let path = self.avatar_path.trim();
        (!path.is_empty()).then(|| PathBuf::from(path))
    }

    /// Validate and work out what to send for the user identified by `slug`.
    pub fn prepare(&self, slug: Option<&str>) -> Result<ProfileSubmission, ProfileError> {
        if char_len(self.name.trim()) < MIN_NAME_LENGTH {
            let mut errors = FieldErrors::new();
            errors.insert(ProfileField::Name, MSG_NAME.to_string());
            return Err(ProfileError::Invalid(errors));
        }
        let slug = slug
            .filter(|s| !s.trim().is_empty())
            .ok_or(ProfileError::MissingSlug)?;

        let fields = self.changes();
        let avatar = self.avatar();
        if fields.is_empty() && avatar.is_none() {
            return Ok(ProfileSubmission::NothingToUpdate);
        }
        let avatar = avatar.map(|p| AvatarFile::load(&p)).transpose()?;
        Ok(ProfileSubmission::Send {
            slug: slug.to_string(),
            update: ProfileUpdate { fields, avatar },
        })
    }

    /// Take the server's answer as the new baseline and return the fields to
    /// merge into the stored user snapshot.
    pub fn apply_saved(&mut self, updated: &Value) -> Value {
        let server = UserProfile::from_raw(updated);
        self.initial = Snapshot {
            name: server.name.unwrap_or_else(|| self.name.trim().to_string()),
            phone: server.phone.unwrap_or_else(|| self.phone.trim().to_string()),
            company: server.company.unwrap_or_else(|| self.company.trim().to_string()),
        };
        self.name = self.initial.name.clone();
        self.phone = self.initial.phone.clone();
        self.company = self.initial.company.clone();
        self.avatar_path.clear();

        let mut merged = match updated {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        merged.insert("nome".into(), Value::String(self.initial.name.clone()));
        merged.insert("celular".into(), Value::String(self.initial.phone.clone()));
        merged.insert("empresa".into(), Value::String(self.initial.company.clone()));
        Value::Object(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn ana() -> UserProfile {
        UserProfile::from_raw(&json!({
            "nome": "Ana Souza",
            "celular": "11987654321",
            "empresa": "Vai",
            "slug": "ana-souza"
        }))
    }

    #[test]
    fn test_unchanged_form_has_nothing_to_update() {
        let form = ProfileForm::from_user(Some(&ana()));
        assert_eq!(
            form.prepare(Some("ana-souza")).expect("valid"),
            ProfileSubmission::NothingToUpdate
        );
    }

    #[test]
    fn test_only_changed_fields_are_sent() {
        let mut form = ProfileForm::from_user(Some(&ana()));
        form.company = "  Vai Logística ".into();
        form.name = "Ana Souza ".into(); // whitespace only, not a change
        form.phone = String::new(); // cleared values are dropped

        match form.prepare(Some("ana-souza")).expect("valid") {
            ProfileSubmission::Send { slug, update } => {
                assert_eq!(slug, "ana-souza");
                assert!(update.avatar.is_none());
                assert_eq!(update.fields.len(), 1);
                assert_eq!(update.fields.get("empresa").map(String::as_str), Some("Vai Logística"));
            }
            other => panic!("unexpected submission: {:?}", other),
        }
    }

    #[test]
    fn test_short_name_is_invalid() {
        let mut form = ProfileForm::from_user(Some(&ana()));
        form.name = "Al".into();
        match form.prepare(Some("ana-souza")) {
            Err(ProfileError::Invalid(errors)) => {
                assert_eq!(errors.get(&ProfileField::Name).map(String::as_str), Some(MSG_NAME));
            }
            other => panic!("expected invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_slug() {
        let mut form = ProfileForm::from_user(None);
        form.name = "Bruno Lima".into();
        assert!(matches!(form.prepare(None), Err(ProfileError::MissingSlug)));
        assert_eq!(ProfileError::MissingSlug.to_string(), "Usuário inválido.");
    }

    #[test]
    fn test_avatar_is_loaded() {
        let mut file = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .expect("temp file");
        file.write_all(b"\x89PNG").expect("write");

        let mut form = ProfileForm::from_user(Some(&ana()));
        form.avatar_path = file.path().display().to_string();
        match form.prepare(Some("ana-souza")).expect("valid") {
            ProfileSubmission::Send { update, .. } => {
                let avatar = update.avatar.expect("avatar attached");
                assert_eq!(avatar.mime, "image/png");
                assert_eq!(avatar.bytes, b"\x89PNG");
                assert!(update.fields.is_empty());
            }
            other => panic!("unexpected submission: {:?}", other),
        }
    }

    #[test]
    fn test_non_image_avatar_is_refused() {
        let file = tempfile::Builder::new()
            .suffix(".pdf")
            .tempfile()
            .expect("temp file");
        let mut form = ProfileForm::from_user(Some(&ana()));
        form.avatar_path = file.path().display().to_string();
        let err = form.prepare(Some("ana-souza")).expect_err("not an image");
        assert!(matches!(err, ProfileError::Avatar(AvatarError::NotAnImage)));
        assert_eq!(err.to_string(), "Selecione um arquivo de imagem.");
    }

    #[test]
    fn test_missing_avatar_file() {
        let mut form = ProfileForm::from_user(Some(&ana()));
        form.avatar_path = "/definitely/not/here.png".into();
        assert!(matches!(form.prepare(Some("ana-souza")), Err(ProfileError::Avatar(_))));
    }

    #[test]
    fn test_apply_saved_resets_baseline() {
        let mut form = ProfileForm::from_user(Some(&ana()));
        form.company = "Vai Logística".into();
        let merged = form.apply_saved(&json!({"empresa": "Vai Logística", "avatarUrl": "https://cdn/a.png"}));

        assert_eq!(merged["empresa"], "Vai Logística");
        assert_eq!(merged["nome"], "Ana Souza");
        assert_eq!(merged["celular"], "11987654321");
        assert_eq!(merged["avatarUrl"], "https://cdn/a.png");
        assert!(form.changes().is_empty());
    }
}
