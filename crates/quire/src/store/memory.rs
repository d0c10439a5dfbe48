use crate::{Error, NewRecord, Record, RecordId, RecordStore, Result, ScanCursor, RECORD_ID_LEN};
use parking_lot::RwLock;
use portable_atomic::{AtomicBool, AtomicU32, Ordering};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::{SystemTime, UNIX_EPOCH};

/// In-process [`RecordStore`] for tests and local runs.
///
/// Documents are kept in insertion order, so a scan yields records in the
/// order they were created. Keys follow the object-id layout used by document
/// stores: a 4-byte seconds timestamp, 5 random bytes fixed per store, and a
/// 3-byte counter. The counter is atomic, so concurrent inserts never share a
/// key.
pub struct MemoryStore {
    docs: RwLock<Documents>,
    keys: KeyGenerator,
    closed: AtomicBool,
}

#[derive(Default)]
struct Documents {
    next_slot: u64,
    by_slot: BTreeMap<u64, Record>,
    slots: HashMap<RecordId, u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(Documents::default()),
            keys: KeyGenerator::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.docs.read().by_slot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether [`RecordStore::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::store("memory store is closed"));
        }
        Ok(())
    }

    fn insert_now(&self, record: NewRecord) -> Result<RecordId> {
        self.ensure_open()?;
        let id = self.keys.next_id();
        let mut docs = self.docs.write();
        let slot = docs.next_slot;
        docs.next_slot += 1;
        docs.slots.insert(id, slot);
        docs.by_slot.insert(slot, Record::from_parts(id, record));
        Ok(id)
    }

    fn find_now(&self, id: RecordId) -> Result<Option<Record>> {
        self.ensure_open()?;
        let docs = self.docs.read();
        Ok(docs
            .slots
            .get(&id)
            .and_then(|slot| docs.by_slot.get(slot))
            .cloned())
    }

    fn replace_now(&self, record: &Record) -> Result<()> {
        self.ensure_open()?;
        let mut docs = self.docs.write();
        if let Some(&slot) = docs.slots.get(&record.id) {
            docs.by_slot.insert(slot, record.clone());
        }
        Ok(())
    }

    fn remove_now(&self, id: RecordId) -> Result<()> {
        self.ensure_open()?;
        let mut docs = self.docs.write();
        if let Some(slot) = docs.slots.remove(&id) {
            docs.by_slot.remove(&slot);
        }
        Ok(())
    }

    fn snapshot(&self) -> Result<MemoryCursor> {
        self.ensure_open()?;
        let pending = self.docs.read().by_slot.values().cloned().collect();
        Ok(MemoryCursor { pending })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryStore {
    type Cursor = MemoryCursor;

    async fn insert(&self, record: NewRecord) -> Result<RecordId> {
        self.insert_now(record)
    }

    async fn find(&self, id: RecordId) -> Result<Option<Record>> {
        self.find_now(id)
    }

    async fn replace(&self, record: &Record) -> Result<()> {
        self.replace_now(record)
    }

    async fn remove(&self, id: RecordId) -> Result<()> {
        self.remove_now(id)
    }

    async fn scan(&self) -> Result<MemoryCursor> {
        self.snapshot()
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

/// Scan handle over a snapshot of a [`MemoryStore`] taken when the scan
/// opened.
///
/// The snapshot clones the whole collection up front, so a scan holds every
/// record in memory until it is drained. This keeps the write lock free while
/// a slow client reads; it suits test and local data sizes only.
pub struct MemoryCursor {
    pending: VecDeque<Record>,
}

impl ScanCursor for MemoryCursor {
    async fn next(&mut self) -> Option<Result<Record>> {
        self.pending.pop_front().map(Ok)
    }

    async fn close(self) {}
}

const COUNTER_MASK: u32 = 0x00ff_ffff;

struct KeyGenerator {
    process: [u8; 5],
    counter: AtomicU32,
}

impl KeyGenerator {
    fn new() -> Self {
        Self {
            process: rand::random(),
            counter: AtomicU32::new(rand::random::<u32>() & COUNTER_MASK),
        }
    }

    fn next_id(&self) -> RecordId {
        // Seconds wrap in 2106, matching the 32-bit timestamp of object ids.
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs() as u32);
        let count = self.counter.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;

        let mut bytes = [0_u8; RECORD_ID_LEN];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(&self.process);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        RecordId::from_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn sample(title: &str) -> NewRecord {
        NewRecord::new("john", title, "body")
    }

    #[tokio::test]
    async fn insert_then_find() {
        let store = MemoryStore::new();
        let id = store.insert(sample("a")).await.unwrap();

        let found = store.find(id).await.unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.title, "a");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn find_missing_is_none() {
        let store = MemoryStore::new();
        let missing = RecordId::from_bytes([7; RECORD_ID_LEN]);
        assert_eq!(store.find(missing).await.unwrap(), None);
    }

    #[tokio::test]
    async fn replace_keeps_slot_and_ignores_unknown_keys() {
        let store = MemoryStore::new();
        let first = store.insert(sample("first")).await.unwrap();
        let second = store.insert(sample("second")).await.unwrap();

        let updated = Record::from_parts(first, NewRecord::new("jane", "first v2", "new"));
        store.replace(&updated).await.unwrap();

        let ghost = Record::from_parts(
            RecordId::from_bytes([1; RECORD_ID_LEN]),
            sample("ghost"),
        );
        store.replace(&ghost).await.unwrap();
        assert_eq!(store.len(), 2);

        let mut cursor = store.scan().await.unwrap();
        let a = cursor.next().await.unwrap().unwrap();
        let b = cursor.next().await.unwrap().unwrap();
        assert!(cursor.next().await.is_none());
        cursor.close().await;

        assert_eq!(a, updated);
        assert_eq!(b.id, second);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let store = MemoryStore::new();
        let id = store.insert(sample("doomed")).await.unwrap();

        store.remove(id).await.unwrap();
        store.remove(id).await.unwrap();
        assert!(store.is_empty());
        assert_eq!(store.find(id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn scan_is_a_snapshot_in_insertion_order() {
        let store = MemoryStore::new();
        let mut ids = Vec::new();
        for i in 0..5 {
            ids.push(store.insert(sample(&format!("r{i}"))).await.unwrap());
        }

        let mut cursor = store.scan().await.unwrap();
        store.insert(sample("late")).await.unwrap();

        let mut seen = Vec::new();
        while let Some(record) = cursor.next().await {
            seen.push(record.unwrap().id);
        }
        cursor.close().await;
        assert_eq!(seen, ids);
    }

    #[tokio::test]
    async fn closed_store_rejects_everything() {
        let store = MemoryStore::new();
        let id = store.insert(sample("x")).await.unwrap();
        store.close().await.unwrap();

        assert!(store.is_closed());
        assert!(matches!(store.insert(sample("y")).await, Err(Error::Store { .. })));
        assert!(matches!(store.find(id).await, Err(Error::Store { .. })));
        assert!(matches!(store.remove(id).await, Err(Error::Store { .. })));
        assert!(store.scan().await.is_err());
    }

    #[test]
    fn keys_share_process_bytes_and_differ_in_counter() {
        let keys = KeyGenerator::new();
        let a = keys.next_id().to_bytes();
        let b = keys.next_id().to_bytes();

        assert_eq!(a[4..9], b[4..9]);
        let count = |k: [u8; RECORD_ID_LEN]| u32::from_be_bytes([0, k[9], k[10], k[11]]);
        assert_eq!((count(a) + 1) & COUNTER_MASK, count(b));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_inserts_get_distinct_keys() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..64)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.insert(sample(&i.to_string())).await.unwrap() })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            assert!(ids.insert(handle.await.unwrap()));
        }
        assert_eq!(ids.len(), 64);
        assert_eq!(store.len(), 64);
    }
}
