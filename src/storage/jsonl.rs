//! JSONL (JSON Lines) storage.
//!
//! Each collection is one file; each line is a valid JSON object
//! representing one record. Unparseable lines are logged and skipped on
//! read so a corrupt record never takes the whole file down with it.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::PathBuf;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use super::{StorageConfig, StorageError};

/// The record collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    User,
    Project,
    Sprint,
    EmailToken,
}

impl Collection {
    /// Get the filename for this collection.
    pub fn filename(&self) -> &'static str {
        match self {
            Collection::User => "users.jsonl",
            Collection::Project => "projects.jsonl",
            Collection::Sprint => "sprints.jsonl",
            Collection::EmailToken => "email_tokens.jsonl",
        }
    }
}

/// JSONL file writer.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Create a writer for a collection under the configured data dir.
    pub fn for_collection(config: &StorageConfig, collection: Collection) -> Self {
        Self::new(config.collection_path(collection))
    }

    fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Append a single record to the file.
    pub fn append(&self, record: &T) -> Result<(), StorageError> {
        self.ensure_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = BufWriter::new(file);
        let json = serde_json::to_string(record)?;
        writeln!(writer, "{}", json)?;
        writer.flush()?;

        debug!("Appended record to {:?}", self.path);
        Ok(())
    }

    /// Write records, replacing the entire file.
    pub fn write_all(&self, records: &[T]) -> Result<usize, StorageError> {
        self.ensure_dir()?;

        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        let mut count = 0;

        for record in records {
            let json = serde_json::to_string(record)?;
            writeln!(writer, "{}", json)?;
            count += 1;
        }

        writer.flush()?;
        info!("Wrote {} records to {:?}", count, self.path);

        Ok(count)
    }
}

/// JSONL file reader.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Create a reader for a collection under the configured data dir.
    pub fn for_collection(config: &StorageConfig, collection: Collection) -> Self {
        Self::new(config.collection_path(collection))
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read all records from the file. A missing file reads as empty.
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();
        let mut line_num = 0;

        for line in reader.lines() {
            line_num += 1;
            let line = line?;

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str(&line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(
                        "Failed to parse line {} in {:?}: {}",
                        line_num, self.path, e
                    );
                }
            }
        }

        debug!("Read {} records from {:?}", records.len(), self.path);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestRecord {
        id: String,
        name: String,
        value: u32,
    }

    #[test]
    fn test_jsonl_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.jsonl");

        let records = vec![
            TestRecord {
                id: "1".to_string(),
                name: "First".to_string(),
                value: 100,
            },
            TestRecord {
                id: "2".to_string(),
                name: "Second".to_string(),
                value: 200,
            },
        ];

        let writer: JsonlWriter<TestRecord> = JsonlWriter::new(path.clone());
        let count = writer.write_all(&records).unwrap();
        assert_eq!(count, 2);

        let reader: JsonlReader<TestRecord> = JsonlReader::new(path);
        let read_records = reader.read_all().unwrap();

        assert_eq!(read_records.len(), 2);
        assert_eq!(read_records[0], records[0]);
        assert_eq!(read_records[1], records[1]);
    }

    #[test]
    fn test_jsonl_append() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("append.jsonl");

        let writer: JsonlWriter<TestRecord> = JsonlWriter::new(path.clone());
        let reader: JsonlReader<TestRecord> = JsonlReader::new(path);

        writer
            .append(&TestRecord {
                id: "1".to_string(),
                name: "First".to_string(),
                value: 100,
            })
            .unwrap();
        writer
            .append(&TestRecord {
                id: "2".to_string(),
                name: "Second".to_string(),
                value: 200,
            })
            .unwrap();

        let records = reader.read_all().unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_jsonl_read_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nonexistent.jsonl");

        let reader: JsonlReader<TestRecord> = JsonlReader::new(path);
        let records = reader.read_all().unwrap();

        assert!(records.is_empty());
    }

    #[test]
    fn test_write_all_overwrites_existing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("overwrite.jsonl");

        let writer: JsonlWriter<TestRecord> = JsonlWriter::new(path.clone());
        let reader: JsonlReader<TestRecord> = JsonlReader::new(path);

        writer
            .write_all(&[TestRecord {
                id: "1".to_string(),
                name: "Old".to_string(),
                value: 1,
            }])
            .unwrap();

        writer
            .write_all(&[
                TestRecord {
                    id: "2".to_string(),
                    name: "New1".to_string(),
                    value: 2,
                },
                TestRecord {
                    id: "3".to_string(),
                    name: "New2".to_string(),
                    value: 3,
                },
            ])
            .unwrap();

        let read = reader.read_all().unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[0].name, "New1");
    }

    #[test]
    fn test_read_all_skips_bad_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad_lines.jsonl");

        std::fs::write(
            &path,
            r#"{"id":"1","name":"Good","value":1}
not-valid-json
{"id":"2","name":"Also Good","value":2}
"#,
        )
        .unwrap();

        let reader: JsonlReader<TestRecord> = JsonlReader::new(path);
        let records = reader.read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Good");
        assert_eq!(records[1].name, "Also Good");
    }

    #[test]
    fn test_collection_filenames() {
        assert_eq!(Collection::User.filename(), "users.jsonl");
        assert_eq!(Collection::Project.filename(), "projects.jsonl");
        assert_eq!(Collection::Sprint.filename(), "sprints.jsonl");
        assert_eq!(Collection::EmailToken.filename(), "email_tokens.jsonl");
    }

    #[test]
    fn test_for_collection_path() {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig::new(temp_dir.path().to_path_buf());

        let writer: JsonlWriter<TestRecord> =
            JsonlWriter::for_collection(&config, Collection::Sprint);
        assert_eq!(writer.path, config.collection_path(Collection::Sprint));

        let reader: JsonlReader<TestRecord> =
            JsonlReader::for_collection(&config, Collection::User);
        assert!(!reader.exists());
    }
}
