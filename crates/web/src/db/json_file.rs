//! JSON file backend.
//!
//! Each collection is a pretty-printed JSON array in its own file. A file
//! that is missing, empty or not a JSON array loads as an empty list; a
//! single record that does not match its type is skipped with a warning so
//! one bad entry does not hide the rest of the file.
//!
//! Skipped records are not lost: saving a collection writes them back at
//! the end of the array. An unreadable file is kept as `<name>.corrupt`
//! when it is first overwritten.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{RecordStore, RepositoryError};
use crate::models::{PendingVerification, Review, User};

/// Verified users.
pub const USERS_FILE: &str = "users.json";
/// Posted reviews.
pub const REVIEWS_FILE: &str = "reviews.json";
/// Signups awaiting their code.
pub const PENDING_FILE: &str = "pending_verifications.json";

/// Record store backed by three JSON files in one directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open (and if needed initialize) a data directory.
    ///
    /// Creates the directory and writes `[]` to any data file that does not
    /// exist yet. Existing files are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Io` if the directory or a file cannot be
    /// created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| RepositoryError::Io {
            path: dir.clone(),
            source,
        })?;

        let store = Self { dir };
        for file in [USERS_FILE, REVIEWS_FILE, PENDING_FILE] {
            let path = store.path(file);
            if !path.exists() {
                save_records::<User>(&path, &[])?;
                tracing::info!(path = %path.display(), "Created empty data file");
            }
        }

        Ok(store)
    }

    /// The data directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of one of the data files.
    #[must_use]
    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }
}

impl RecordStore for JsonFileStore {
    fn load_users(&self) -> Result<Vec<User>, RepositoryError> {
        load_records(&self.path(USERS_FILE))
    }

    fn save_users(&self, users: &[User]) -> Result<(), RepositoryError> {
        save_records(&self.path(USERS_FILE), users)
    }

    fn load_pending(&self) -> Result<Vec<PendingVerification>, RepositoryError> {
        load_records(&self.path(PENDING_FILE))
    }

    fn save_pending(&self, pending: &[PendingVerification]) -> Result<(), RepositoryError> {
        save_records(&self.path(PENDING_FILE), pending)
    }

    fn load_reviews(&self) -> Result<Vec<Review>, RepositoryError> {
        load_records(&self.path(REVIEWS_FILE))
    }

    fn save_reviews(&self, reviews: &[Review]) -> Result<(), RepositoryError> {
        save_records(&self.path(REVIEWS_FILE), reviews)
    }
}

/// What a data file holds before records are decoded.
enum FileContent {
    /// Missing or whitespace-only.
    Empty,
    /// A JSON array, not yet matched against the record type.
    Array(Vec<Value>),
    /// Anything else.
    Invalid,
}

fn read_content(path: &Path) -> Result<FileContent, RepositoryError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(FileContent::Empty),
        Err(source) => {
            return Err(RepositoryError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    if content.trim().is_empty() {
        return Ok(FileContent::Empty);
    }

    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Array(values)) => Ok(FileContent::Array(values)),
        Ok(_) => {
            tracing::warn!(path = %path.display(), "Data file is not a JSON array");
            Ok(FileContent::Invalid)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Malformed data file");
            Ok(FileContent::Invalid)
        }
    }
}

/// Load a list of records from a JSON file.
///
/// # Errors
///
/// Only fails for I/O errors other than the file not existing. Content
/// problems are logged and yield an empty (or partial) list.
pub fn load_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, RepositoryError> {
    let FileContent::Array(values) = read_content(path)? else {
        return Ok(Vec::new());
    };

    let records = values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(path = %path.display(), index, error = %e, "Skipping malformed record");
                None
            }
        })
        .collect();

    Ok(records)
}

/// One element of a saved collection.
#[derive(Serialize)]
#[serde(untagged)]
enum Entry<'a, T> {
    Record(&'a T),
    Kept(Value),
}

/// Overwrite a JSON file with the full list of records, pretty-printed.
///
/// Entries already in the file that do not decode as `T` are written back
/// after the records. A file that is not a JSON array is copied to
/// `<name>.corrupt` before it is replaced.
///
/// The list is written to a sibling temporary file first and renamed into
/// place, so readers never see a half-written file.
///
/// # Errors
///
/// Returns `RepositoryError` if serialization or any file operation fails.
pub fn save_records<T: Serialize + DeserializeOwned>(
    path: &Path,
    records: &[T],
) -> Result<(), RepositoryError> {
    let kept = match read_content(path)? {
        FileContent::Empty => Vec::new(),
        FileContent::Array(values) => values
            .into_iter()
            .filter(|value| serde_json::from_value::<T>(value.clone()).is_err())
            .collect(),
        FileContent::Invalid => {
            let backup = sibling(path, ".corrupt");
            std::fs::copy(path, &backup).map_err(|source| RepositoryError::Io {
                path: backup.clone(),
                source,
            })?;
            tracing::warn!(backup = %backup.display(), "Backed up unreadable data file");
            Vec::new()
        }
    };

    let entries: Vec<Entry<'_, T>> = records
        .iter()
        .map(Entry::Record)
        .chain(kept.into_iter().map(Entry::Kept))
        .collect();
    let json = serde_json::to_string_pretty(&entries)?;

    let tmp = sibling(path, ".tmp");
    std::fs::write(&tmp, json).map_err(|source| RepositoryError::Io {
        path: tmp.clone(),
        source,
    })?;
    std::fs::rename(&tmp, path).map_err(|source| RepositoryError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// `path` with `suffix` appended to its file name.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use school_reviews_core::Email;

    use super::*;

    /// A fresh directory under the system temp dir, removed on drop.
    struct TempDir(PathBuf);

    impl TempDir {
        fn new() -> Self {
            let dir = std::env::temp_dir().join(format!("reviews-json-{}", uuid::Uuid::new_v4()));
            Self(dir)
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    fn user(email: &str) -> User {
        User {
            email: Email::parse(email).unwrap(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        }
    }

    #[test]
    fn test_open_creates_empty_files() {
        let tmp = TempDir::new();
        let store = JsonFileStore::open(&tmp.0).unwrap();

        for file in [USERS_FILE, REVIEWS_FILE, PENDING_FILE] {
            let content = std::fs::read_to_string(store.path(file)).unwrap();
            assert_eq!(content, "[]");
        }
        assert!(store.load_users().unwrap().is_empty());
    }

    #[test]
    fn test_open_keeps_existing_files() {
        let tmp = TempDir::new();
        std::fs::create_dir_all(&tmp.0).unwrap();
        std::fs::write(
            tmp.0.join(USERS_FILE),
            r#"[{"email": "a@education.nsw.gov.au", "password": "h"}]"#,
        )
        .unwrap();

        let store = JsonFileStore::open(&tmp.0).unwrap();
        let users = store.load_users().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].email.as_str(), "a@education.nsw.gov.au");
    }

    #[test]
    fn test_missing_empty_and_malformed_load_as_empty() {
        let tmp = TempDir::new();
        std::fs::create_dir_all(&tmp.0).unwrap();

        let missing = tmp.0.join("missing.json");
        assert!(load_records::<User>(&missing).unwrap().is_empty());

        let empty = tmp.0.join("empty.json");
        std::fs::write(&empty, "  \n").unwrap();
        assert!(load_records::<User>(&empty).unwrap().is_empty());

        let malformed = tmp.0.join("malformed.json");
        std::fs::write(&malformed, "[{\"email\": ").unwrap();
        assert!(load_records::<User>(&malformed).unwrap().is_empty());

        let object = tmp.0.join("object.json");
        std::fs::write(&object, "{\"users\": []}").unwrap();
        assert!(load_records::<User>(&object).unwrap().is_empty());
    }

    #[test]
    fn test_bad_record_is_skipped() {
        let tmp = TempDir::new();
        std::fs::create_dir_all(&tmp.0).unwrap();
        let path = tmp.0.join(USERS_FILE);
        std::fs::write(
            &path,
            r#"[
                {"email": "a@education.nsw.gov.au", "password": "h"},
                {"email": 42},
                {"email": "b@education.nsw.gov.au", "password": "h"}
            ]"#,
        )
        .unwrap();

        let users: Vec<User> = load_records(&path).unwrap();
        let emails: Vec<&str> = users.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, vec!["a@education.nsw.gov.au", "b@education.nsw.gov.au"]);
    }

    #[test]
    fn test_save_keeps_records_it_cannot_read() {
        let tmp = TempDir::new();
        let store = JsonFileStore::open(&tmp.0).unwrap();
        std::fs::write(
            store.path(USERS_FILE),
            r#"[
                {"email": "a@education.nsw.gov.au", "password": "h"},
                {"email": 42, "note": "typo"}
            ]"#,
        )
        .unwrap();

        let mut users = store.load_users().unwrap();
        assert_eq!(users.len(), 1);
        users.push(user("b@education.nsw.gov.au"));
        store.save_users(&users).unwrap();

        let content = std::fs::read_to_string(store.path(USERS_FILE)).unwrap();
        let raw: Vec<Value> = serde_json::from_str(&content).unwrap();
        assert_eq!(raw.len(), 3);
        assert_eq!(raw[2], serde_json::json!({"email": 42, "note": "typo"}));
        assert_eq!(store.load_users().unwrap(), users);

        // Still there after a second save
        store.save_users(&users).unwrap();
        let content = std::fs::read_to_string(store.path(USERS_FILE)).unwrap();
        assert!(content.contains("\"typo\""));
    }

    #[test]
    fn test_save_backs_up_unreadable_file() {
        let tmp = TempDir::new();
        let store = JsonFileStore::open(&tmp.0).unwrap();
        std::fs::write(store.path(USERS_FILE), "[{\"email\": ").unwrap();

        store.save_users(&[user("a@education.nsw.gov.au")]).unwrap();

        let backup = std::fs::read_to_string(store.path("users.json.corrupt")).unwrap();
        assert_eq!(backup, "[{\"email\": ");
        assert_eq!(store.load_users().unwrap().len(), 1);
    }

    #[test]
    fn test_concurrent_writers_through_database() {
        use std::sync::Arc;

        use crate::db::{Database, UserRepository};
        use crate::models::PendingVerification;

        let tmp = TempDir::new();
        let store = Arc::new(JsonFileStore::open(&tmp.0).unwrap());
        let db = Database::from_arc(store.clone());

        std::thread::scope(|scope| {
            for t in 0..4 {
                let db = db.clone();
                scope.spawn(move || {
                    let repo = UserRepository::new(&db);
                    for i in 0..10 {
                        repo.create_pending(PendingVerification {
                            email: Email::parse(&format!("t{t}-{i}@education.nsw.gov.au")).unwrap(),
                            password_hash: "h".to_string(),
                            code: "123456".to_string(),
                        })
                        .unwrap();
                    }
                });
            }
        });

        assert_eq!(store.load_pending().unwrap().len(), 40);
    }

    #[test]
    fn test_save_is_pretty_printed_and_overwrites() {
        let tmp = TempDir::new();
        let store = JsonFileStore::open(&tmp.0).unwrap();

        store
            .save_users(&[user("a@education.nsw.gov.au"), user("b@education.nsw.gov.au")])
            .unwrap();
        store.save_users(&[user("c@education.nsw.gov.au")]).unwrap();

        let content = std::fs::read_to_string(store.path(USERS_FILE)).unwrap();
        assert!(content.starts_with("[\n  {\n    \"email\""));
        assert!(!store.path("users.json.tmp").exists());

        let users = store.load_users().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0], user("c@education.nsw.gov.au"));
    }
}
