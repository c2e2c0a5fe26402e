//! Read access to the raw screenshot bytes behind each frame.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Source of screenshot bytes, keyed by a frame's `evidence_id`.
pub trait FrameStore {
    /// Read the encoded image for a frame.
    fn read_image(&self, evidence_id: &str) -> io::Result<Vec<u8>>;
}

/// Screenshot extensions recognised in a day directory.
const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Frames stored as files in one directory per day.
#[derive(Debug, Clone)]
pub struct DirFrameStore {
    root: PathBuf,
}

impl DirFrameStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List the screenshots of a day, sorted by capture time.
    ///
    /// Files are expected to be named `HH-MM-SS.<ext>`; anything else is skipped.
    pub fn list_day_frames(&self, date: NaiveDate) -> io::Result<Vec<(NaiveDateTime, String)>> {
        let mut items = Vec::new();

        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if let Some(timestamp) = parse_capture_name(name, date) {
                items.push((timestamp, name.to_string()));
            }
        }

        items.sort();
        Ok(items)
    }
}

impl FrameStore for DirFrameStore {
    fn read_image(&self, evidence_id: &str) -> io::Result<Vec<u8>> {
        // Evidence ids are bare file names inside the day directory
        let name = Path::new(evidence_id);
        if name.components().count() != 1 || name.file_name().is_none() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("evidence id is not a plain file name: {evidence_id}"),
            ));
        }
        std::fs::read(self.root.join(name))
    }
}

/// Parse a `HH-MM-SS.png` style screenshot name into a capture time on `date`.
pub fn parse_capture_name(name: &str, date: NaiveDate) -> Option<NaiveDateTime> {
    let (stem, ext) = name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return None;
    }

    let mut parts = stem.split('-');
    let hour: u32 = parts.next()?.parse().ok()?;
    let minute: u32 = parts.next()?.parse().ok()?;
    let second: u32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }

    // and_hms_opt rejects out-of-range fields
    date.and_hms_opt(hour, minute, second)
}

/// In-memory frame store, mostly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryFrameStore {
    images: HashMap<String, Vec<u8>>,
}

impl MemoryFrameStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, evidence_id: impl Into<String>, bytes: Vec<u8>) {
        self.images.insert(evidence_id.into(), bytes);
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl FrameStore for MemoryFrameStore {
    fn read_image(&self, evidence_id: &str) -> io::Result<Vec<u8>> {
        self.images.get(evidence_id).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no image stored for {evidence_id}"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 4).unwrap()
    }

    #[test]
    fn test_parse_capture_name() {
        let ts = parse_capture_name("08-15-30.PNG", day()).unwrap();
        assert_eq!(ts, day().and_hms_opt(8, 15, 30).unwrap());

        assert!(parse_capture_name("08-15-30.jpeg", day()).is_some());
        assert!(parse_capture_name("08-15-30.gif", day()).is_none());
        assert!(parse_capture_name("24-00-00.png", day()).is_none());
        assert!(parse_capture_name("08-61-00.png", day()).is_none());
        assert!(parse_capture_name("08-15.png", day()).is_none());
        assert!(parse_capture_name("08-15-30-1.png", day()).is_none());
        assert!(parse_capture_name("notes.txt", day()).is_none());
    }

    #[test]
    fn test_dir_store_lists_and_reads() {
        let dir = std::env::temp_dir().join(format!("focus-nudge-store-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("09-10-00.png"), b"b").unwrap();
        std::fs::write(dir.join("08-00-00.png"), b"a").unwrap();
        std::fs::write(dir.join("readme.md"), b"x").unwrap();

        let store = DirFrameStore::new(&dir);
        let frames = store.list_day_frames(day()).unwrap();
        let names: Vec<&str> = frames.iter().map(|(_, n)| n.as_str()).collect();
        assert_eq!(names, vec!["08-00-00.png", "09-10-00.png"]);

        assert_eq!(store.read_image("08-00-00.png").unwrap(), b"a");
        assert!(store.read_image("../08-00-00.png").is_err());
        assert!(store.read_image("missing.png").is_err());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryFrameStore::new();
        assert!(store.is_empty());
        store.insert("a.png", vec![1, 2, 3]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.read_image("a.png").unwrap(), vec![1, 2, 3]);
        assert_eq!(
            store.read_image("b.png").unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }
}
