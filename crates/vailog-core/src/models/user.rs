//! User profile model.
//!
//! The backend has shipped several shapes for the user object over time
//! (`nome`, `nomeCompleto` or `name` for the display name, `avatarUrl` or
//! `avatar` for the picture). `UserProfile::from_raw` is the only place
//! that knows about those aliases; everything else works with the fixed type.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name shown when the snapshot carries no usable name or email
pub const DEFAULT_DISPLAY_NAME: &str = "Usuário";

const NAME_KEYS: [&str; 3] = ["nome", "nomeCompleto", "name"];
const AVATAR_KEYS: [&str; 2] = ["avatarUrl", "avatar"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub avatar_url: Option<String>,
    /// Identifier used by `PUT /users/{slug}`
    pub slug: Option<String>,
}

impl UserProfile {
    /// Normalize a raw `usuario` object. Non-object values produce an empty profile.
    pub fn from_raw(raw: &Value) -> Self {
        Self {
            name: first_text(raw, &NAME_KEYS),
            email: first_text(raw, &["email"]),
            phone: first_text(raw, &["celular"]),
            company: first_text(raw, &["empresa"]),
            avatar_url: first_text(raw, &AVATAR_KEYS),
            slug: first_text(raw, &["slug"]),
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_DISPLAY_NAME)
    }

    /// Up to two initials from the name (falling back to the email), upper-cased.
    pub fn initials(&self) -> String {
        let source = self
            .name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("U");
        initials(source)
    }
}

/// First and last word initials: "Ana Maria Souza" -> "AS", "ana" -> "A".
pub fn initials(text: &str) -> String {
    let parts: Vec<&str> = text.split_whitespace().collect();
    let first = parts.first().and_then(|p| p.chars().next());
    let last = if parts.len() > 1 {
        parts.last().and_then(|p| p.chars().next())
    } else {
        None
    };
    match (first, last) {
        (None, _) => "U".to_string(),
        (Some(f), Some(l)) => format!("{}{}", f, l).to_uppercase(),
        (Some(f), None) => f.to_uppercase().to_string(),
    }
}

/// Return the first key holding a non-blank string (numbers are stringified).
fn first_text(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match raw.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_name_aliases_in_priority_order() {
        let p = UserProfile::from_raw(&json!({"nome": "Ana", "nomeCompleto": "Ana Souza", "name": "A"}));
        assert_eq!(p.name.as_deref(), Some("Ana"));

        let p = UserProfile::from_raw(&json!({"nomeCompleto": "Ana Souza", "name": "A"}));
        assert_eq!(p.name.as_deref(), Some("Ana Souza"));

        let p = UserProfile::from_raw(&json!({"name": "Bruno"}));
        assert_eq!(p.name.as_deref(), Some("Bruno"));
    }

    #[test]
    fn test_blank_alias_falls_through() {
        let p = UserProfile::from_raw(&json!({"nome": "  ", "name": "Carla"}));
        assert_eq!(p.name.as_deref(), Some("Carla"));
    }

    #[test]
    fn test_full_snapshot() {
        let p = UserProfile::from_raw(&json!({
            "nome": "Ana Souza",
            "email": "ana@vai.com",
            "celular": "11987654321",
            "empresa": "Vai Transportes",
            "avatar": "https://cdn/ana.png",
            "slug": "ana-souza"
        }));
        assert_eq!(p.email.as_deref(), Some("ana@vai.com"));
        assert_eq!(p.phone.as_deref(), Some("11987654321"));
        assert_eq!(p.company.as_deref(), Some("Vai Transportes"));
        assert_eq!(p.avatar_url.as_deref(), Some("https://cdn/ana.png"));
        assert_eq!(p.slug.as_deref(), Some("ana-souza"));
        assert_eq!(p.initials(), "AS");
    }

    #[test]
    fn test_non_object_is_empty() {
        assert_eq!(UserProfile::from_raw(&json!("oops")), UserProfile::default());
        assert_eq!(UserProfile::from_raw(&Value::Null).display_name(), DEFAULT_DISPLAY_NAME);
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials("ana maria souza"), "AS");
        assert_eq!(initials("ana"), "A");
        assert_eq!(initials("   "), "U");
        let p = UserProfile { email: Some("zeca@vai.com".into()), ..Default::default() };
        assert_eq!(p.initials(), "Z");
    }
}
