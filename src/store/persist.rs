// Data file persistence
// Loads and saves the store document as pretty-printed JSON

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::types::Database;
use crate::error::StoreError;
use crate::logger;

/// Load the store document from `path`
///
/// A missing file yields an empty store. A file that exists but cannot be
/// parsed is an error, so a later save never clobbers data we failed to read.
pub fn load(path: &Path) -> Result<Database, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            logger::log_info(&format!(
                "[STORE] No data file at {}, starting empty",
                path.display()
            ));
            return Ok(Database::default());
        }
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let db: Database = serde_json::from_str(&content).map_err(|source| StoreError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;

    logger::log_info(&format!(
        "[STORE] Loaded {} students and {} selections from {}",
        db.students.len(),
        db.selections.len(),
        path.display()
    ));
    Ok(db)
}

/// Save the store document to `path`
///
/// The document is written to a sibling temp file and renamed over `path`,
/// so the data file holds either the old or the new document, never a partial one.
pub fn save(path: &Path, db: &Database) -> Result<(), StoreError> {
    let content = serde_json::to_string_pretty(db)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let temp = temp_path(path);
    fs::write(&temp, content).map_err(|source| StoreError::Io {
        path: temp.clone(),
        source,
    })?;

    fs::rename(&temp, path).map_err(|source| {
        let _ = fs::remove_file(&temp);
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// `data.json` -> `data.json.tmp`
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let db = load(&dir.path().join("data.json")).unwrap();
        assert_eq!(db, Database::default());
    }

    #[test]
    fn test_malformed_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
    }

    #[test]
    fn test_reads_legacy_document() {
        // Naive ISO timestamps with microseconds, selection without timestamp
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(
            &path,
            r#"{
  "students": [
    {"reg": "21CS001", "dob": "2003-04-12", "added_at": "2024-06-01T09:15:42.123456"}
  ],
  "selections": [
    {"reg": "21CS001", "nme": "Sports", "activity": "Football"}
  ]
}"#,
        )
        .unwrap();

        let db = load(&path).unwrap();
        assert_eq!(db.students.len(), 1);
        assert_eq!(db.students[0].dob, "2003-04-12");
        assert_eq!(db.selections[0].activity, "Football");
        assert!(db.selections[0].timestamp.is_none());
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");

        save(&path, &Database::default()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"students\": []"));
        assert!(content.contains("\"selections\": []"));
    }

    #[test]
    fn test_failed_save_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        save(&path, &Database::default()).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        // A directory squatting on the temp path makes the write fail
        fs::create_dir(temp_path(&path)).unwrap();
        let mut db = Database::default();
        db.selections.push(crate::store::Selection {
            reg: "21CS001".to_string(),
            nme: "Sports".to_string(),
            activity: "Football".to_string(),
            timestamp: None,
        });

        let err = save(&path, &db).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
        assert_eq!(load(&path).unwrap(), Database::default());
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        save(&path, &Database::default()).unwrap();
        save(&path, &Database::default()).unwrap();

        assert!(path.is_file());
        assert!(!temp_path(&path).exists());
    }
}
