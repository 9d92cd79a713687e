use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::cli::{StoreArgs, StoreBackend};
use crate::model::{Chapter, Contents, NodeIndex};
use crate::util::{ensure_directory, now_utc_string};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    ChapterList,
    VerseList,
    CompleteBook,
    PersonContent,
    PersonList,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_value(self) {
            Ok(Value::String(name)) => f.write_str(&name),
            _ => Err(fmt::Error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub index: NodeIndex,
    pub kind: RecordKind,
    pub data: Value,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("failed to access record file for {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode or decode record {path}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("sqlite store failed for record {path}")]
    Sqlite {
        path: String,
        #[source]
        source: rusqlite::Error,
    },
}

/// Key-value persistence of tree fragments addressed by path.
pub trait RecordStore {
    fn write(&self, path: &str, record: &Record) -> Result<(), StoreError>;
    fn read(&self, path: &str) -> Result<Record, StoreError>;
    fn describe(&self) -> String;
}

pub fn open_store(args: &StoreArgs) -> Result<Box<dyn RecordStore>> {
    match args.store_backend {
        StoreBackend::Json => Ok(Box::new(JsonFileStore::new(args.cache_root.join("store")))),
        StoreBackend::Sqlite => {
            let db_path = args
                .db_path
                .clone()
                .unwrap_or_else(|| args.cache_root.join("kafi_records.sqlite"));
            if let Some(parent) = db_path.parent() {
                ensure_directory(parent)?;
            }
            Ok(Box::new(SqliteStore::open(&db_path)?))
        }
    }
}

pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn file_path(&self, path: &str) -> PathBuf {
        let sanitized = path.replace(':', "/");
        let relative = sanitized.trim_start_matches('/');
        self.root.join(format!("{relative}.json"))
    }
}

impl RecordStore for JsonFileStore {
    fn write(&self, path: &str, record: &Record) -> Result<(), StoreError> {
        let file_path = self.file_path(path);
        let io_error = |source| StoreError::Io {
            path: path.to_string(),
            source,
        };

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let data = serde_json::to_vec(record).map_err(|source| StoreError::Json {
            path: path.to_string(),
            source,
        })?;
        fs::write(&file_path, data).map_err(io_error)?;

        debug!(path, file = %file_path.display(), kind = %record.kind, "wrote record");
        Ok(())
    }

    fn read(&self, path: &str) -> Result<Record, StoreError> {
        let file_path = self.file_path(path);
        let raw = match fs::read(&file_path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(path.to_string()));
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.to_string(),
                    source,
                });
            }
        };

        serde_json::from_slice(&raw).map_err(|source| StoreError::Json {
            path: path.to_string(),
            source,
        })
    }

    fn describe(&self) -> String {
        format!("json:{}", self.root.display())
    }
}

pub struct SqliteStore {
    connection: Connection,
    location: String,
}

impl SqliteStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        let connection = Connection::open(db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        connection
            .pragma_update(None, "journal_mode", "WAL")
            .context("failed to set journal_mode=WAL")?;
        connection
            .pragma_update(None, "synchronous", "NORMAL")
            .context("failed to set synchronous=NORMAL")?;
        Self::with_connection(connection, db_path.display().to_string())
    }

    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let connection =
            Connection::open_in_memory().context("failed to open in-memory record store")?;
        Self::with_connection(connection, ":memory:".to_string())
    }

    fn with_connection(connection: Connection, location: String) -> Result<Self> {
        connection
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS records (
                  path TEXT PRIMARY KEY,
                  record_index TEXT NOT NULL,
                  kind TEXT NOT NULL,
                  data TEXT NOT NULL,
                  updated_at TEXT NOT NULL
                );
                ",
            )
            .context("failed to create records table")?;
        Ok(Self {
            connection,
            location,
        })
    }

    #[cfg(test)]
    pub fn count_by_kind(&self, kind: RecordKind) -> Result<i64> {
        let count = self.connection.query_row(
            "SELECT COUNT(*) FROM records WHERE kind = ?1",
            params![kind.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

impl RecordStore for SqliteStore {
    fn write(&self, path: &str, record: &Record) -> Result<(), StoreError> {
        let index = encode_json(path, &record.index)?;
        let data = encode_json(path, &record.data)?;

        self.connection
            .execute(
                "INSERT INTO records(path, record_index, kind, data, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(path) DO UPDATE SET
                   record_index = excluded.record_index,
                   kind = excluded.kind,
                   data = excluded.data,
                   updated_at = excluded.updated_at",
                params![path, index, record.kind.to_string(), data, now_utc_string()],
            )
            .map_err(|source| StoreError::Sqlite {
                path: path.to_string(),
                source,
            })?;
        Ok(())
    }

    fn read(&self, path: &str) -> Result<Record, StoreError> {
        let row: Option<(String, String, String)> = self
            .connection
            .query_row(
                "SELECT record_index, kind, data FROM records WHERE path = ?1",
                params![path],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .map_err(|source| StoreError::Sqlite {
                path: path.to_string(),
                source,
            })?;

        let Some((index, kind, data)) = row else {
            return Err(StoreError::NotFound(path.to_string()));
        };

        let json_error = |source| StoreError::Json {
            path: path.to_string(),
            source,
        };
        Ok(Record {
            index: serde_json::from_str(&index).map_err(json_error)?,
            kind: serde_json::from_value(Value::String(kind)).map_err(json_error)?,
            data: serde_json::from_str(&data).map_err(json_error)?,
        })
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.location)
    }
}

fn encode_json<T: Serialize>(path: &str, value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|source| StoreError::Json {
        path: path.to_string(),
        source,
    })
}

fn index_from_path(path: &str) -> NodeIndex {
    NodeIndex::Key(path.strip_prefix("/books/").unwrap_or(path).to_string())
}

fn node_path(chapter: &Chapter) -> Result<&str> {
    chapter.path.as_deref().with_context(|| {
        format!(
            "cannot persist unindexed {} node titled {:?}",
            chapter.part_type, chapter.titles
        )
    })
}

/// Writes a node and its subtree: internal nodes as summaries, leaves in full.
pub fn insert_chapter(store: &dyn RecordStore, chapter: &Chapter) -> Result<usize> {
    let path = node_path(chapter)?;
    let mut data = serde_json::to_value(chapter)
        .with_context(|| format!("failed to encode chapter {path}"))?;

    match &chapter.contents {
        Contents::Chapters { chapters } => {
            if let Some(children) = data.get_mut("chapters").and_then(Value::as_array_mut) {
                for child in children {
                    if let Some(object) = child.as_object_mut() {
                        object.remove("chapters");
                        object.remove("verses");
                    }
                }
            }
            store.write(
                path,
                &Record {
                    index: index_from_path(path),
                    kind: RecordKind::ChapterList,
                    data,
                },
            )?;

            let mut written = 1;
            for child in chapters {
                written += insert_chapter(store, child)?;
            }
            Ok(written)
        }
        Contents::Verses { .. } => {
            store.write(
                path,
                &Record {
                    index: index_from_path(path),
                    kind: RecordKind::VerseList,
                    data,
                },
            )?;
            Ok(1)
        }
    }
}

pub fn write_complete_tree(store: &dyn RecordStore, path: &str, root: &Chapter) -> Result<()> {
    let data =
        serde_json::to_value(root).with_context(|| format!("failed to encode tree {path}"))?;
    store.write(
        path,
        &Record {
            index: index_from_path(path),
            kind: RecordKind::CompleteBook,
            data,
        },
    )?;
    Ok(())
}

pub fn load_tree(store: &dyn RecordStore, path: &str) -> Result<Chapter> {
    let record = store
        .read(path)
        .with_context(|| format!("failed to load tree {path}"))?;
    serde_json::from_value(record.data).with_context(|| format!("failed to decode tree {path}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PartType, Verse};

    fn sample_tree() -> Chapter {
        let mut leaf = Chapter::leaf(PartType::Chapter);
        leaf.path = Some("/books/al-kafi:1".to_string());
        if let Some(verses) = leaf.verses_mut() {
            let mut verse = Verse::new(PartType::Hadith, vec!["line".to_string()]);
            verse.path = Some("/books/al-kafi:1:1".to_string());
            verses.push(verse);
        }

        let mut root = Chapter::internal(PartType::Book);
        root.path = Some("/books/al-kafi".to_string());
        if let Some(children) = root.children_mut() {
            children.push(leaf);
        }
        root
    }

    #[test]
    fn json_store_maps_paths_to_nested_files() {
        let store = JsonFileStore::new(PathBuf::from("/tmp/out"));
        assert_eq!(
            store.file_path("/books/al-kafi:1:2"),
            PathBuf::from("/tmp/out/books/al-kafi/1/2.json")
        );
    }

    #[test]
    fn json_store_reports_missing_records_as_not_found() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let store = JsonFileStore::new(dir.path().to_path_buf());

        let err = store.read("/people/narrators/index").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(path) if path == "/people/narrators/index"));
    }

    #[test]
    fn insert_chapter_writes_summary_and_leaf_records() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let store = JsonFileStore::new(dir.path().to_path_buf());

        let written = insert_chapter(&store, &sample_tree()).expect("tree should persist");
        assert_eq!(written, 2);

        let summary = store.read("/books/al-kafi").expect("root record should exist");
        assert_eq!(summary.kind, RecordKind::ChapterList);
        assert_eq!(summary.index, NodeIndex::Key("al-kafi".to_string()));
        let child = &summary.data["chapters"][0];
        assert!(child.get("verses").is_none());
        assert_eq!(child["path"], "/books/al-kafi:1");

        let leaf = store.read("/books/al-kafi:1").expect("leaf record should exist");
        assert_eq!(leaf.kind, RecordKind::VerseList);
        assert_eq!(leaf.index, NodeIndex::Key("al-kafi:1".to_string()));
        assert_eq!(leaf.data["verses"][0]["text"][0], "line");
    }

    #[test]
    fn sqlite_store_overwrites_and_round_trips_complete_tree() {
        let store = SqliteStore::in_memory().expect("in-memory store should open");
        let tree = sample_tree();

        write_complete_tree(&store, "/books/complete/al-kafi", &tree).expect("first write");
        write_complete_tree(&store, "/books/complete/al-kafi", &tree).expect("second write");

        let loaded = load_tree(&store, "/books/complete/al-kafi").expect("tree should load");
        assert_eq!(loaded, tree);
        assert_eq!(
            store
                .count_by_kind(RecordKind::CompleteBook)
                .expect("count should succeed"),
            1
        );
        assert!(matches!(
            store.read("/books/complete/quran"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn sqlite_kind_column_uses_the_serialized_name() {
        let store = SqliteStore::in_memory().expect("in-memory store should open");
        insert_chapter(&store, &sample_tree()).expect("tree should persist");

        let kind: String = store
            .connection
            .query_row(
                "SELECT kind FROM records WHERE path = ?1",
                params!["/books/al-kafi:1"],
                |row| row.get(0),
            )
            .expect("leaf row should exist");
        assert_eq!(kind, "verse_list");
        assert_eq!(kind, RecordKind::VerseList.to_string());
        assert_eq!(
            store.read("/books/al-kafi:1").expect("leaf record").kind,
            RecordKind::VerseList
        );
    }
}
