use std::fs::File;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::models::{AuthResponse, UserProfile};

/// Session file name in the data directory
const SESSION_FILE: &str = "session.json";

/// The persisted authentication record.
///
/// On disk this is `{ "token": string, "usuario"?: {...}, "ts": number }`.
/// `usuario` is kept as raw JSON so fields this client does not know about
/// survive a profile update; use [`SessionRecord::user`] for a typed view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usuario: Option<Value>,
    /// Milliseconds since the epoch of the last write
    #[serde(default)]
    pub ts: i64,
}

impl SessionRecord {
    pub fn new(token: impl Into<String>, usuario: Option<Value>) -> Self {
        Self {
            token: token.into(),
            usuario: usuario.filter(|u| !u.is_null()),
            ts: Utc::now().timestamp_millis(),
        }
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.usuario.as_ref().map(UserProfile::from_raw)
    }

    /// Overlay `updates` onto the stored snapshot, field by field.
    /// Non-object updates are ignored.
    pub fn merge_user(&mut self, updates: &Value) {
        let Some(updates) = updates.as_object() else {
            return;
        };
        let mut merged = match self.usuario.take() {
            Some(Value::Object(existing)) => existing,
            _ => Map::new(),
        };
        for (key, value) in updates {
            merged.insert(key.clone(), value.clone());
        }
        self.usuario = Some(Value::Object(merged));
        self.ts = Utc::now().timestamp_millis();
    }
}

struct Inner {
    /// Durable location; `None` keeps everything in memory.
    path: Option<PathBuf>,
    /// Process-only record, preferred over the file when present.
    held: Option<SessionRecord>,
}

/// Single source of truth for "am I logged in and who am I".
///
/// Cloning is cheap and every clone observes the same record, so the store
/// can be handed to the API client and to the UI alike. Nothing here returns
/// an error: unreadable or corrupted storage is logged and reported as no
/// session.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<Inner>>,
}

impl SessionStore {
    /// File-backed store writing `session.json` inside `data_dir`.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self::with_path(Some(data_dir.as_ref().join(SESSION_FILE)))
    }

    /// Store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self::with_path(None)
    }

    fn with_path(path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner { path, held: None })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Persist `record`, replacing any previous one.
    ///
    /// If the file cannot be written the record is held in memory instead so
    /// the running session keeps working.
    pub fn write(&self, record: SessionRecord) {
        self.lock().persist(record);
    }

    /// Keep `record` for the lifetime of this process only ("remember me" off).
    /// Any durable record is removed so it cannot resurface on the next start.
    pub fn hold(&self, record: SessionRecord) {
        let mut inner = self.lock();
        if let Some(ref path) = inner.path {
            remove_file(path);
        }
        inner.held = Some(record);
    }

    /// Start a session from a login or registration response. With `remember`
    /// the record survives restarts; without it, it lives until the app exits.
    pub fn establish(&self, auth: AuthResponse, remember: bool) {
        let record = SessionRecord::new(auth.token, auth.usuario);
        if remember {
            self.write(record);
        } else {
            self.hold(record);
        }
    }

    /// The current record, or `None` when logged out or storage is unreadable.
    pub fn read(&self) -> Option<SessionRecord> {
        self.lock().current()
    }

    pub fn token(&self) -> Option<String> {
        self.read().map(|r| r.token)
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.read().and_then(|r| r.user())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Forget the session everywhere. Safe to call when already logged out.
    pub fn clear(&self) {
        self.lock().forget();
    }

    /// Clear the session only if it still carries `token`. A rejection of an
    /// older token must not end a session started since. Returns whether
    /// anything was cleared.
    pub fn clear_if_token(&self, token: &str) -> bool {
        let mut inner = self.lock();
        match inner.current() {
            Some(record) if record.token == token => {
                inner.forget();
                true
            }
            _ => false,
        }
    }

    /// Merge server-returned user fields into the stored snapshot and rewrite
    /// the record where it currently lives. Returns false when logged out.
    pub fn merge_user(&self, updates: &Value) -> bool {
        let mut inner = self.lock();
        let Some(mut record) = inner.current() else {
            return false;
        };
        record.merge_user(updates);
        if inner.held.is_some() {
            inner.held = Some(record);
        } else {
            inner.persist(record);
        }
        true
    }
}

// All record access goes through these while the store's lock is held.
impl Inner {
    fn current(&self) -> Option<SessionRecord> {
        if let Some(ref held) = self.held {
            return Some(held.clone()).filter(|r| !r.token.is_empty());
        }
        self.path.as_deref().and_then(read_file)
    }

    fn persist(&mut self, record: SessionRecord) {
        match self.path.clone() {
            Some(path) => match write_file(&path, &record) {
                Ok(()) => {
                    debug!(path = %path.display(), "Session saved");
                    self.held = None;
                }
                Err(e) => {
                    warn!(error = %e, path = %path.display(), "Failed to save session, keeping it in memory");
                    self.held = Some(record);
                }
            },
            None => self.held = Some(record),
        }
    }

    fn forget(&mut self) {
        self.held = None;
        if let Some(ref path) = self.path {
            remove_file(path);
        }
    }
}

fn read_file(path: &Path) -> Option<SessionRecord> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(error = %e, path = %path.display(), "Failed to read session file");
            return None;
        }
    };
    match serde_json::from_str::<SessionRecord>(&contents) {
        Ok(record) if !record.token.is_empty() => Some(record),
        Ok(_) => {
            debug!("Session file has an empty token");
            None
        }
        Err(e) => {
            warn!(error = %e, "Failed to parse session file, treating as logged out");
            None
        }
    }
}

fn write_file(path: &Path, record: &SessionRecord) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string_pretty(record)?;
    // Write-then-rename: readers never see a half-written record
    let tmp = path.with_extension("json.tmp");
    let mut file = File::create(&tmp)?;
    file.write_all(contents.as_bytes())?;
    file.sync_all()?;
    drop(file);
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn remove_file(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(error = %e, path = %path.display(), "Failed to remove session file"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn file_store() -> (TempDir, SessionStore) {
        let dir = TempDir::new().expect("tempdir");
        let store = SessionStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_absent_when_never_written() {
        let (_dir, store) = file_store();
        assert!(store.read().is_none());
        assert!(store.token().is_none());
        assert!(store.current_user().is_none());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_write_then_read_returns_same_record() {
        let (_dir, store) = file_store();
        let record = SessionRecord::new("tok123", Some(json!({"nome": "Ana", "slug": "ana"})));
        store.write(record.clone());
        assert_eq!(store.read(), Some(record));
        assert_eq!(store.token().as_deref(), Some("tok123"));
        assert_eq!(store.current_user().and_then(|u| u.name), Some("Ana".to_string()));
        assert!(store.is_authenticated());
    }

    #[test]
    fn test_write_replaces_previous_record() {
        let (_dir, store) = file_store();
        store.write(SessionRecord::new("first", None));
        store.write(SessionRecord::new("second", None));
        assert_eq!(store.token().as_deref(), Some("second"));
    }

    #[test]
    fn test_malformed_storage_is_absent() {
        let cases = [
            "",
            "not json",
            "{",
            "null",
            "[]",
            r#"{"usuario": {"nome": "Ana"}}"#,
            r#"{"token": 42}"#,
            r#"{"token": ""}"#,
        ];
        for raw in cases {
            let (dir, store) = file_store();
            std::fs::write(dir.path().join(SESSION_FILE), raw).expect("seed file");
            assert!(store.read().is_none(), "expected absent for {:?}", raw);
            assert!(!store.is_authenticated(), "expected logged out for {:?}", raw);
        }
    }

    #[test]
    fn test_accepts_record_without_ts_or_user() {
        let (dir, store) = file_store();
        std::fs::write(dir.path().join(SESSION_FILE), r#"{"token": "abc", "extra": 1}"#)
            .expect("seed file");
        let record = store.read().expect("record should load");
        assert_eq!(record.token, "abc");
        assert_eq!(record.ts, 0);
        assert!(record.usuario.is_none());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (dir, store) = file_store();
        store.clear();
        store.write(SessionRecord::new("tok", None));
        store.clear();
        assert!(!store.is_authenticated());
        assert!(!dir.path().join(SESSION_FILE).exists());
        store.clear();
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_clear_after_hold() {
        let (_dir, store) = file_store();
        store.hold(SessionRecord::new("tok", None));
        assert!(store.is_authenticated());
        store.clear();
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_hold_does_not_touch_disk_and_drops_old_file() {
        let (dir, store) = file_store();
        store.write(SessionRecord::new("old", None));
        store.hold(SessionRecord::new("new", None));
        assert_eq!(store.token().as_deref(), Some("new"));
        assert!(!dir.path().join(SESSION_FILE).exists());

        // A fresh process sees nothing
        let other = SessionStore::new(dir.path());
        assert!(!other.is_authenticated());
    }

    #[test]
    fn test_establish_remembered_login() {
        let (dir, store) = file_store();
        let auth = AuthResponse {
            token: "tok123".into(),
            usuario: Some(json!({"nome": "Ana"})),
        };
        store.establish(auth, true);

        let record = store.read().expect("logged in");
        assert_eq!(record.token, "tok123");
        assert_eq!(record.usuario, Some(json!({"nome": "Ana"})));
        assert!(store.is_authenticated());
        assert!(SessionStore::new(dir.path()).is_authenticated());
    }

    #[test]
    fn test_establish_without_remember() {
        let (dir, store) = file_store();
        store.establish(AuthResponse { token: "tok".into(), usuario: None }, false);
        assert!(store.is_authenticated());
        assert!(!SessionStore::new(dir.path()).is_authenticated());
    }

    #[test]
    fn test_clones_share_state() {
        let store = SessionStore::in_memory();
        let clone = store.clone();
        store.write(SessionRecord::new("shared", None));
        assert_eq!(clone.token().as_deref(), Some("shared"));
        clone.clear();
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_on_disk_format() {
        let (dir, store) = file_store();
        store.write(SessionRecord::new("tok123", Some(json!({"nome": "Ana"}))));
        let raw = std::fs::read_to_string(dir.path().join(SESSION_FILE)).expect("read file");
        let value: Value = serde_json::from_str(&raw).expect("valid json");
        assert_eq!(value["token"], "tok123");
        assert_eq!(value["usuario"]["nome"], "Ana");
        assert!(value["ts"].as_i64().is_some_and(|ts| ts > 0));
    }

    #[test]
    fn test_merge_user_keeps_unknown_fields() {
        let (_dir, store) = file_store();
        store.write(SessionRecord::new(
            "tok",
            Some(json!({"nome": "Ana", "slug": "ana", "plano": "pro"})),
        ));
        assert!(store.merge_user(&json!({"nome": "Ana Souza", "empresa": "Vai"})));

        let record = store.read().expect("still logged in");
        assert_eq!(record.token, "tok");
        let user = record.usuario.expect("snapshot");
        assert_eq!(user["nome"], "Ana Souza");
        assert_eq!(user["empresa"], "Vai");
        assert_eq!(user["slug"], "ana");
        assert_eq!(user["plano"], "pro");
    }

    #[test]
    fn test_merge_user_when_logged_out() {
        let store = SessionStore::in_memory();
        assert!(!store.merge_user(&json!({"nome": "x"})));
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_clear_if_token_only_clears_matching_session() {
        let (dir, store) = file_store();
        store.write(SessionRecord::new("new-token", None));
        assert!(!store.clear_if_token("old-token"));
        assert_eq!(store.token().as_deref(), Some("new-token"));

        assert!(store.clear_if_token("new-token"));
        assert!(!store.is_authenticated());
        assert!(!dir.path().join(SESSION_FILE).exists());

        // Nothing left to match
        assert!(!store.clear_if_token("new-token"));
    }

    #[test]
    fn test_clear_if_token_on_held_session() {
        let store = SessionStore::in_memory();
        store.hold(SessionRecord::new("tok", None));
        assert!(store.clear_if_token("tok"));
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_merge_user_never_revives_cleared_session() {
        let store = SessionStore::in_memory();
        store.write(SessionRecord::new("tok", Some(json!({"nome": "Ana"}))));

        std::thread::scope(|scope| {
            let merger = store.clone();
            scope.spawn(move || {
                for i in 0..500 {
                    merger.merge_user(&json!({"empresa": format!("Vai {}", i)}));
                }
            });
            std::thread::yield_now();
            store.clear();
        });

        // Whatever interleaving happened, a merge after the clear saw no session
        assert!(!store.is_authenticated());
        assert!(!store.merge_user(&json!({"nome": "x"})));
    }

    #[test]
    fn test_write_leaves_no_temp_file() {
        let (dir, store) = file_store();
        store.write(SessionRecord::new("tok", None));
        assert!(dir.path().join(SESSION_FILE).exists());
        assert!(!dir.path().join("session.json.tmp").exists());
    }

    #[test]
    fn test_merge_user_stays_in_memory_when_held() {
        let (dir, store) = file_store();
        store.hold(SessionRecord::new("tok", Some(json!({"nome": "Ana"}))));
        assert!(store.merge_user(&json!({"celular": "11999990000"})));
        assert!(!dir.path().join(SESSION_FILE).exists());
        assert_eq!(
            store.current_user().and_then(|u| u.phone).as_deref(),
            Some("11999990000")
        );
    }
}
