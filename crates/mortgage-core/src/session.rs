use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

const SESSION_PREFIX: &str = "session_";

/// Create a new identifier, e.g. `session_6f1c...` (40 printable characters)
pub fn generate_session_id() -> String {
    format!("{}{}", SESSION_PREFIX, Uuid::new_v4().simple())
}

pub trait SessionStore {
    fn load(&self) -> Option<String>;
    fn save(&self, session_id: &str) -> io::Result<()>;
    fn clear(&self) -> io::Result<()>;
}

/// Return the stored identifier, or generate and store a fresh one.
pub fn get_or_create_session_id(store: &dyn SessionStore) -> String {
    if let Some(existing) = store.load() {
        let existing = existing.trim();
        if !existing.is_empty() {
            return existing.to_string();
        }
    }

    let session_id = generate_session_id();
    match store.save(&session_id) {
        Ok(()) => debug!(%session_id, "created new session"),
        Err(e) => warn!(%session_id, "could not persist session id, keeping it in memory: {}", e),
    }
    session_id
}

/// Plain-text file holding the identifier
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<cache dir>/mortgage-assist/session_id`, or a relative file when the
    /// platform has no cache directory
    pub fn default_location() -> Self {
        let path = dirs::cache_dir()
            .map(|dir| dir.join("mortgage-assist").join("session_id"))
            .unwrap_or_else(|| PathBuf::from(".mortgage-session"));
        Self::new(path)
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Option<String> {
        fs::read_to_string(&self.path).ok()
    }

    fn save(&self, session_id: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, session_id)
    }

    fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

#[derive(Default)]
pub struct MemorySessionStore {
    value: Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Option<String> {
        self.value.lock().ok().and_then(|v| v.clone())
    }

    fn save(&self, session_id: &str) -> io::Result<()> {
        let mut value = self
            .value
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "session store poisoned"))?;
        *value = Some(session_id.to_string());
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        if let Ok(mut value) = self.value.lock() {
            *value = None;
        }
        Ok(())
    }
}
