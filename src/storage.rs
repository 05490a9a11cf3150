//! File-backed persistence for circular documents.

use std::{
    collections::HashSet,
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use chrono::Utc;
use serde_json::to_writer;
use uuid::Uuid;

use crate::{
    error::{StoreError, StoreResult},
    model::{Circular, CircularDraft, Comment, Priority, ReadReceipt},
};

/// Persistent store for circular documents rooted at `root`.
///
/// Documents live under `circulars/` sharded by id prefix, inserts are
/// appended to a newline-delimited log, and lookup indexes map
/// classification values to id lists.
#[derive(Clone)]
pub struct Store {
    root: PathBuf,
    // serializes document mutations so comment and read-receipt appends
    // stay single atomic document updates
    write_lock: Arc<Mutex<()>>,
}

impl Store {
    /// Create a new store rooted at `root`.
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Ensure the on-disk directory structure exists.
    pub fn init(&self) -> StoreResult<()> {
        let dirs = [
            "circulars",
            "log",
            "index/by-department",
            "index/by-priority",
            "index/by-tag",
        ];
        for d in dirs {
            fs::create_dir_all(self.root.join(d))?;
        }
        Ok(())
    }

    /// Validate a draft, assign an id and defaults, and persist it.
    ///
    /// Returns the stored circular including its generated id. Required
    /// fields must be non-empty and `priority` must be in the closed set;
    /// anything else fails with [`StoreError::Validation`].
    pub fn insert(&self, draft: CircularDraft) -> StoreResult<Circular> {
        let priority = validate(&draft)?;
        let circular = Circular {
            id: Uuid::new_v4().simple().to_string(),
            title: draft.title,
            content: draft.content,
            priority,
            department: draft.department,
            year: draft.year,
            author: draft.author,
            published_at: draft.published_at.unwrap_or_else(Utc::now),
            scheduled_at: draft.scheduled_at,
            read_by: draft.read_by,
            total_recipients: draft.total_recipients,
            attachments: draft.attachments,
            comments: draft.comments,
            tags: draft.tags,
            version: draft.version.unwrap_or(1),
            template: draft.template,
        };

        let _guard = self.write_guard();
        self.write_doc(&circular)?;

        // Append to a newline-delimited log for easy tailing.
        let log_path = self.root.join("log/circulars.ndjson");
        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut log_file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;
        serde_json::to_writer(&mut log_file, &circular)?;
        log_file.write_all(b"\n")?;

        self.index_circular(&circular)?;
        Ok(circular)
    }

    /// Load a circular by id.
    pub fn get(&self, id: &str) -> StoreResult<Circular> {
        let path = self.doc_path(id).ok_or(StoreError::NotFound)?;
        if !path.exists() {
            return Err(StoreError::NotFound);
        }
        let data = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Return all circulars ordered by `published_at` descending.
    ///
    /// The newest-first ordering is part of the contract, not incidental.
    pub fn list(&self) -> StoreResult<Vec<Circular>> {
        let mut circulars = vec![];
        let dir = self.root.join("circulars");
        if dir.exists() {
            for entry in walkdir::WalkDir::new(&dir) {
                let entry = entry?;
                if entry.file_type().is_file() {
                    let data = fs::read_to_string(entry.path())?;
                    circulars.push(serde_json::from_str::<Circular>(&data)?);
                }
            }
        }
        circulars.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(circulars)
    }

    /// Execute an intersection-based lookup over the index files.
    ///
    /// An empty filter falls back to [`Store::list`]; results keep the same
    /// newest-first ordering.
    pub fn query(&self, filter: ListFilter) -> StoreResult<Vec<Circular>> {
        if filter.is_empty() {
            return self.list();
        }
        let mut sets: Vec<HashSet<String>> = vec![];
        if let Some(department) = &filter.department {
            sets.push(self.load_ids("index/by-department", department)?);
        }
        if let Some(priority) = filter.priority {
            sets.push(self.load_ids("index/by-priority", priority.as_str())?);
        }
        if let Some(tag) = &filter.tag {
            sets.push(self.load_ids("index/by-tag", tag)?);
        }
        let mut iter = sets.into_iter();
        let mut ids = iter.next().unwrap_or_default();
        for s in iter {
            ids = ids.intersection(&s).cloned().collect();
        }

        // Stale index entries are skipped rather than failing the lookup;
        // `reindex` repairs them.
        let mut circulars: Vec<Circular> =
            ids.into_iter().filter_map(|id| self.get(&id).ok()).collect();
        circulars.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(circulars)
    }

    /// Atomically append a comment to the target circular.
    ///
    /// Returns the updated comment sequence, or [`StoreError::NotFound`]
    /// when the id does not resolve.
    pub fn append_comment(&self, id: &str, comment: Comment) -> StoreResult<Vec<Comment>> {
        let _guard = self.write_guard();
        let mut circular = self.get(id)?;
        circular.comments.push(comment);
        self.write_doc(&circular)?;
        Ok(circular.comments)
    }

    /// Atomically append a read receipt to the target circular.
    ///
    /// The read log is append-only; the same name may be recorded more
    /// than once.
    pub fn append_read(&self, id: &str, receipt: ReadReceipt) -> StoreResult<Circular> {
        let _guard = self.write_guard();
        let mut circular = self.get(id)?;
        circular.read_by.push(receipt);
        self.write_doc(&circular)?;
        Ok(circular)
    }

    /// Rebuild all index files from the `circulars/` tree.
    pub fn reindex(&self) -> StoreResult<()> {
        let index_dir = self.root.join("index");
        if index_dir.exists() {
            fs::remove_dir_all(&index_dir)?;
        }
        fs::create_dir_all(self.root.join("index/by-department"))?;
        fs::create_dir_all(self.root.join("index/by-priority"))?;
        fs::create_dir_all(self.root.join("index/by-tag"))?;

        for circular in self.list()? {
            self.index_circular(&circular)?;
        }
        Ok(())
    }

    /// Update classification indexes for a circular.
    fn index_circular(&self, circular: &Circular) -> StoreResult<()> {
        self.append_index("index/by-department", &circular.department, &circular.id)?;
        self.append_index(
            "index/by-priority",
            circular.priority.as_str(),
            &circular.id,
        )?;
        for tag in &circular.tags {
            self.append_index("index/by-tag", tag, &circular.id)?;
        }
        Ok(())
    }

    /// Append a circular id to the index file under `prefix/<key>.txt`.
    fn append_index(&self, prefix: &str, name: &str, id: &str) -> StoreResult<()> {
        let path = self
            .root
            .join(prefix)
            .join(format!("{}.txt", sanitize_key(name)));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut f = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        writeln!(f, "{}", id)?;
        Ok(())
    }

    /// Load the id set for one index key under `prefix`.
    fn load_ids(&self, prefix: &str, key: &str) -> StoreResult<HashSet<String>> {
        let path = self
            .root
            .join(prefix)
            .join(format!("{}.txt", sanitize_key(key)));
        read_ids(&path)
    }

    /// Compute the canonical path for a circular id.
    ///
    /// Ids from the request path are untrusted; anything that is not plain
    /// alphanumeric (plus `-`) or is too short to shard does not resolve.
    fn doc_path(&self, id: &str) -> Option<PathBuf> {
        if id.len() < 2 || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return None;
        }
        let shard = &id[0..2];
        Some(
            self.root
                .join("circulars")
                .join(shard)
                .join(format!("{}.json", id)),
        )
    }

    /// Write a document JSON atomically to its canonical path.
    fn write_doc(&self, circular: &Circular) -> StoreResult<()> {
        let path = self
            .doc_path(&circular.id)
            .ok_or_else(|| StoreError::Validation(format!("invalid id: {}", circular.id)))?;
        let parent_dir = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&parent_dir)?;
        let tmp = tempfile::NamedTempFile::new_in(&parent_dir)?;
        to_writer(&tmp, circular)?;
        tmp.persist(&path)?;
        Ok(())
    }

    fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Check required fields and resolve the priority string.
fn validate(draft: &CircularDraft) -> StoreResult<Priority> {
    for (field, value) in [
        ("title", &draft.title),
        ("content", &draft.content),
        ("department", &draft.department),
        ("year", &draft.year),
        ("author", &draft.author),
    ] {
        if value.trim().is_empty() {
            return Err(StoreError::Validation(format!(
                "missing required field: {field}"
            )));
        }
    }
    let raw = draft
        .priority
        .as_deref()
        .ok_or_else(|| StoreError::Validation("missing required field: priority".into()))?;
    raw.parse()
        .map_err(|_| StoreError::Validation(format!("unknown priority: {raw}")))
}

/// Read newline-separated ids from a text file.
fn read_ids(path: &Path) -> StoreResult<HashSet<String>> {
    if !path.exists() {
        return Ok(Default::default());
    }
    let data = fs::read_to_string(path)?;
    Ok(data.lines().map(|s| s.to_string()).collect())
}

/// Map an index key to a filesystem-safe file stem.
fn sanitize_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
            key.push(c);
        } else {
            key.push('_');
        }
    }
    if key.is_empty() {
        key.push('_');
    }
    key
}

/// Optional classification filters accepted by the list endpoint.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub department: Option<String>,
    pub priority: Option<Priority>,
    pub tag: Option<String>,
}

impl ListFilter {
    pub fn is_empty(&self) -> bool {
        self.department.is_none() && self.priority.is_none() && self.tag.is_none()
    }
}
