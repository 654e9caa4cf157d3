use anyhow::{Context, anyhow};
use campusplay_core::memory::{MemoryStore, StoreSnapshot};
use fd_lock::RwLock;
use log::{debug, info};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Advisory lock file guarding a store snapshot. Every process holds the
/// write lock from `load` until its last `save`, so load/mutate/save cycles
/// of concurrent invocations never interleave.
pub fn open_lock(path: &Path) -> anyhow::Result<RwLock<File>> {
    let dir = parent_dir(path);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("create dir {} failed", dir.display()))?;
    let lock_path = lock_path(path);
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .with_context(|| format!("could not open {}", lock_path.display()))?;
    Ok(RwLock::new(file))
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Load the store snapshot at `path`; a missing file starts an empty store.
pub fn load(path: &Path) -> anyhow::Result<MemoryStore> {
    if !path.exists() {
        info!("no snapshot at {}, starting empty", path.display());
        return Ok(MemoryStore::new());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("could not read {}", path.display()))?;
    let store = MemoryStore::from_json(&content)
        .map_err(|e| anyhow!("{}: {e}", path.display()))?;
    debug!("loaded snapshot from {}", path.display());
    Ok(store)
}

/// Write the snapshot to a fresh temp file beside `path` and move it into place.
pub fn save(snapshot: &StoreSnapshot, path: &Path) -> anyhow::Result<()> {
    let payload = serde_json::to_string_pretty(snapshot).context("snapshot encode failed")?;
    let dir = parent_dir(path);
    let mut tmp = tempfile::NamedTempFile::new_in(&dir)
        .with_context(|| format!("create temp file in {} failed", dir.display()))?;
    tmp.write_all(payload.as_bytes())
        .with_context(|| format!("write {} failed", tmp.path().display()))?;
    tmp.persist(path)
        .with_context(|| format!("replace {} failed", path.display()))?;
    debug!("saved snapshot to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use campusplay_core::TeamRanking;
    use campusplay_core::store::RecordStore;
    use std::sync::{Arc, Barrier};

    #[tokio::test]
    async fn missing_snapshot_starts_empty_and_saves_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");
        let mut lock = open_lock(&path).unwrap();
        let _held = lock.write().unwrap();

        let store = load(&path).unwrap();
        assert!(store.snapshot().await.rankings.is_empty());

        store.put_ranking(TeamRanking::new("football", ["A", "B"])).await.unwrap();
        save(&store.snapshot().await, &path).unwrap();

        let reloaded = load(&path).unwrap();
        assert_eq!(reloaded.snapshot().await, store.snapshot().await);
        assert!(path.with_file_name("store.json.lock").exists());
    }

    #[test]
    fn corrupt_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load(&path).unwrap_err();
        assert!(err.to_string().contains("invalid snapshot json"), "{err}");
    }

    /// One console invocation: take the lock, load, add a ranking, save.
    fn locked_cycle(path: &Path, sport: &str) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let mut lock = open_lock(path).unwrap();
        let _held = lock.write().unwrap();
        let store = load(path).unwrap();
        runtime.block_on(async {
            store.put_ranking(TeamRanking::new(sport, ["A", "B"])).await.unwrap();
            // Widen the window between load and save.
            tokio::task::yield_now().await;
            save(&store.snapshot().await, path).unwrap();
        });
    }

    #[test]
    fn parallel_cycles_keep_every_update() {
        let dir = tempfile::tempdir().unwrap();
        let path = Arc::new(dir.path().join("store.json"));
        let start = Arc::new(Barrier::new(8));

        let workers: Vec<_> = (0..8)
            .map(|i| {
                let path = path.clone();
                let start = start.clone();
                std::thread::spawn(move || {
                    start.wait();
                    for round in 0..5 {
                        locked_cycle(&path, &format!("sport-{i}-{round}"));
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let store = load(&path).unwrap();
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let rankings = runtime.block_on(store.snapshot()).rankings;
        assert_eq!(rankings.len(), 40);
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .filter(|name| name != "store.json" && name != "store.json.lock")
            .collect();
        assert!(leftovers.is_empty(), "{leftovers:?}");
    }

    #[test]
    fn parallel_sessions_generate_pools_once() {
        use campusplay_core::Actor;
        use campusplay_core::clock::SystemClock;
        use campusplay_core::generator::PoolGenerator;

        let dir = tempfile::tempdir().unwrap();
        let path = Arc::new(dir.path().join("store.json"));
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let seed = MemoryStore::new();
        runtime
            .block_on(seed.put_ranking(TeamRanking::new("volleyball", ["A", "B", "C", "D"])))
            .unwrap();
        save(&runtime.block_on(seed.snapshot()), &path).unwrap();

        let start = Arc::new(Barrier::new(6));
        let sessions: Vec<_> = (0..6)
            .map(|i| {
                let path = path.clone();
                let start = start.clone();
                std::thread::spawn(move || {
                    start.wait();
                    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
                    let mut lock = open_lock(&path).unwrap();
                    let _held = lock.write().unwrap();
                    let store = Arc::new(load(&path).unwrap());
                    let generator = PoolGenerator::new(store.clone(), SystemClock);
                    let coach = Actor { username: format!("coach_{i}"), ..Actor::default() };
                    runtime.block_on(async {
                        let outcome = generator.generate("volleyball", &coach).await;
                        save(&store.snapshot().await, &path).unwrap();
                        outcome.is_ok()
                    })
                })
            })
            .collect();
        let winners = sessions
            .into_iter()
            .map(|session| session.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);

        let store = load(&path).unwrap();
        let fixtures = runtime.block_on(store.snapshot()).fixtures;
        assert_eq!(fixtures.len(), 2);
    }
}
