use std::{
    fs::{self, File, OpenOptions},
    io::Write,
    path::PathBuf,
};

use fd_lock::RwLock;

use courier_common::types::ChatId;

use crate::{
    error::{Error, Result},
    model::ChatSessionState,
};

/// Durable session storage: one JSON record per chat, written through a
/// file lock. The store is the source of truth across restarts.
pub struct ChatStore {
    pub base_dir: PathBuf,
}

impl ChatStore {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    fn path_for(&self, chat_id: ChatId) -> PathBuf {
        self.base_dir.join("chats").join(format!("{chat_id}.json"))
    }

    /// Load the persisted state for a chat.
    ///
    /// Returns `Ok(None)` when no record exists and [`Error::StoreCorrupt`]
    /// when a record exists but cannot be parsed — the caller decides
    /// whether to degrade to an empty state.
    pub async fn load(&self, chat_id: ChatId) -> Result<Option<ChatSessionState>> {
        let path = self.path_for(chat_id);

        tokio::task::spawn_blocking(move || -> Result<Option<ChatSessionState>> {
            if !path.exists() {
                return Ok(None);
            }
            let data = fs::read_to_string(&path)?;
            match serde_json::from_str(&data) {
                Ok(state) => Ok(Some(state)),
                Err(e) => Err(Error::StoreCorrupt {
                    chat_id,
                    detail: e.to_string(),
                }),
            }
        })
        .await?
    }

    /// Write the full state record for a chat, replacing any previous one.
    ///
    /// The new record goes to a sibling temp file and is renamed over the
    /// target, so the swap is atomic: a reader sees the old record or the
    /// new one, never a partial write, and a crash mid-write leaves the
    /// previous record intact. Concurrent writers serialize on an exclusive
    /// sidecar lock.
    pub async fn save(&self, chat_id: ChatId, state: &ChatSessionState) -> Result<()> {
        let path = self.path_for(chat_id);
        let data = serde_json::to_string_pretty(state)?;

        tokio::task::spawn_blocking(move || -> Result<()> {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let lock_file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(false)
                .open(path.with_extension("lock"))?;
            let mut lock = RwLock::new(lock_file);
            let _guard = lock
                .write()
                .map_err(|e| Error::lock_failed(e.to_string()))?;

            let tmp = path.with_extension("json.tmp");
            let mut file = File::create(&tmp)?;
            file.write_all(data.as_bytes())?;
            file.flush()?;
            fs::rename(&tmp, &path)?;
            Ok(())
        })
        .await??;

        Ok(())
    }

    /// List chat ids with a persisted record, by scanning the chats dir.
    pub fn list_chats(&self) -> Vec<ChatId> {
        let Ok(entries) = fs::read_dir(self.base_dir.join("chats")) else {
            return vec![];
        };
        entries
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let name = e.file_name().to_string_lossy().to_string();
                name.strip_suffix(".json").and_then(|s| s.parse().ok())
            })
            .collect()
    }

    /// Open a record file read-only, mainly for diagnostics.
    pub fn open_raw(&self, chat_id: ChatId) -> Result<File> {
        Ok(File::open(self.path_for(chat_id))?)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::model::Session};

    fn temp_store() -> (ChatStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = ChatStore::new(dir.path().to_path_buf());
        (store, dir)
    }

    fn sample_state() -> ChatSessionState {
        let mut state = ChatSessionState::default();
        let mut work = Session::new("work", "you are terse");
        work.backend_handle = Some("handle-1".into());
        state.sessions.insert("work".into(), work);
        state.sessions.insert("play".into(), Session::new("play", "you are fun"));
        state.active = Some("work".into());
        state
    }

    #[tokio::test]
    async fn save_then_load_roundtrips() {
        let (store, _dir) = temp_store();
        let state = sample_state();

        store.save(42, &state).await.unwrap();
        let loaded = store.load(42).await.unwrap().unwrap();

        assert_eq!(loaded, state);
        assert_eq!(
            loaded.sessions["work"].backend_handle.as_deref(),
            Some("handle-1")
        );
    }

    #[tokio::test]
    async fn load_missing_is_none() {
        let (store, _dir) = temp_store();
        assert!(store.load(7).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn load_corrupt_record_fails_closed() {
        let (store, dir) = temp_store();
        let chats = dir.path().join("chats");
        fs::create_dir_all(&chats).unwrap();
        fs::write(chats.join("9.json"), "{not json at all").unwrap();

        let err = store.load(9).await.unwrap_err();
        assert!(matches!(err, Error::StoreCorrupt { chat_id: 9, .. }));
        assert!(err.is_corrupt());
    }

    #[tokio::test]
    async fn save_overwrites_previous_record() {
        let (store, _dir) = temp_store();
        store.save(1, &sample_state()).await.unwrap();

        store.save(1, &ChatSessionState::default()).await.unwrap();

        let loaded = store.load(1).await.unwrap().unwrap();
        assert!(loaded.sessions.is_empty());
        assert!(loaded.active.is_none());
    }

    #[tokio::test]
    async fn save_swaps_record_in_place_without_leftovers() {
        let (store, dir) = temp_store();
        store.save(3, &sample_state()).await.unwrap();
        store.save(3, &ChatSessionState::default()).await.unwrap();

        // The rename consumes the temp file; only the record and its lock
        // sidecar remain, and the record parses cleanly after an overwrite.
        let mut names: Vec<String> = fs::read_dir(dir.path().join("chats"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["3.json", "3.lock"]);

        let loaded = store.load(3).await.unwrap().unwrap();
        assert!(loaded.sessions.is_empty());
    }

    #[tokio::test]
    async fn negative_chat_ids_get_their_own_record() {
        let (store, _dir) = temp_store();
        store.save(-100200, &sample_state()).await.unwrap();
        store.save(100200, &ChatSessionState::default()).await.unwrap();

        let group = store.load(-100200).await.unwrap().unwrap();
        assert_eq!(group.active.as_deref(), Some("work"));
        let dm = store.load(100200).await.unwrap().unwrap();
        assert!(dm.sessions.is_empty());

        let mut chats = store.list_chats();
        chats.sort_unstable();
        assert_eq!(chats, vec![-100200, 100200]);
    }
}
