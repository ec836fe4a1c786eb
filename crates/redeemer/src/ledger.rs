/// Record of redeemed codes, persisted so a restart cannot re-open spent codes.
///
/// File layout: checksum (32) || fingerprint (32) * n, where the checksum is
/// SHA256 over the sorted fingerprints. Every write goes to a temp file that
/// is synced and then renamed over the ledger.
///
/// Several verifier processes may share one file. Each read-modify-write runs
/// under an exclusive lock on a `<ledger>.lock` sidecar and re-reads the file
/// first, so no process writes from a stale snapshot.
use fslock::LockFile;
use sha2::{Digest, Sha256};
use silvercode::RawCode;
use std::collections::HashSet;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{RedeemError, Result};

pub const FINGERPRINT_LEN: usize = 32;

pub type Fingerprint = [u8; FINGERPRINT_LEN];

/// Identity of a code for replay purposes: covers every byte, tag included.
pub fn fingerprint(raw: &RawCode) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(b"silvercode:redeemed:");
    hasher.update(raw.to_bytes());
    let result = hasher.finalize();

    let mut fp = [0u8; FINGERPRINT_LEN];
    fp.copy_from_slice(&result);
    fp
}

/// `ledger.dat` + `.tmp` -> `ledger.dat.tmp`, never replacing an extension.
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

struct LedgerFile {
    path: PathBuf,
    lock: LockFile,
}

impl LedgerFile {
    fn open(path: PathBuf) -> Result<Self> {
        let lock_path = with_suffix(&path, ".lock");
        let lock = LockFile::open(&lock_path).map_err(|e| {
            RedeemError::Ledger(format!("Cannot open {}: {}", lock_path.display(), e))
        })?;
        Ok(Self { path, lock })
    }

    /// Run `f` while holding the cross-process lock.
    fn exclusive<T>(&mut self, f: impl FnOnce(&Path) -> Result<T>) -> Result<T> {
        self.lock
            .lock()
            .map_err(|e| RedeemError::Ledger(format!("Failed to lock ledger: {}", e)))?;
        let result = f(&self.path);
        let unlocked = self
            .lock
            .unlock()
            .map_err(|e| RedeemError::Ledger(format!("Failed to unlock ledger: {}", e)));
        let value = result?;
        unlocked?;
        Ok(value)
    }

    fn read(path: &Path) -> Result<HashSet<Fingerprint>> {
        if !path.exists() {
            return Ok(HashSet::new());
        }
        let data = std::fs::read(path)
            .map_err(|e| RedeemError::Ledger(format!("Failed to read {}: {}", path.display(), e)))?;
        parse(&data)
    }

    fn write(path: &Path, spent: &HashSet<Fingerprint>) -> Result<()> {
        let temp_path = with_suffix(path, ".tmp");
        {
            let mut file = std::fs::File::create(&temp_path).map_err(|e| {
                RedeemError::Ledger(format!("Failed to create temp ledger: {}", e))
            })?;

            file.write_all(&compute_checksum(spent))
                .map_err(|e| RedeemError::Ledger(format!("Failed to write checksum: {}", e)))?;
            for fp in spent {
                file.write_all(fp).map_err(|e| {
                    RedeemError::Ledger(format!("Failed to write fingerprint: {}", e))
                })?;
            }
            file.sync_all()
                .map_err(|e| RedeemError::Ledger(format!("Failed to sync ledger: {}", e)))?;
        }

        std::fs::rename(&temp_path, path)
            .map_err(|e| RedeemError::Ledger(format!("Failed to rename ledger: {}", e)))?;
        Ok(())
    }
}

fn parse(data: &[u8]) -> Result<HashSet<Fingerprint>> {
    if data.len() < FINGERPRINT_LEN || data.len() % FINGERPRINT_LEN != 0 {
        return Err(RedeemError::Ledger(format!(
            "Ledger file has invalid length {}",
            data.len()
        )));
    }

    let (stored, body) = data.split_at(FINGERPRINT_LEN);
    let spent: HashSet<Fingerprint> = body
        .chunks_exact(FINGERPRINT_LEN)
        .map(|chunk| {
            let mut fp = [0u8; FINGERPRINT_LEN];
            fp.copy_from_slice(chunk);
            fp
        })
        .collect();

    if compute_checksum(&spent)[..] != *stored {
        return Err(RedeemError::Ledger(
            "Ledger checksum mismatch, file may be corrupted".into(),
        ));
    }

    Ok(spent)
}

fn compute_checksum(spent: &HashSet<Fingerprint>) -> [u8; 32] {
    let mut sorted: Vec<_> = spent.iter().collect();
    sorted.sort();

    let mut hasher = Sha256::new();
    for fp in sorted {
        hasher.update(fp);
    }
    let result = hasher.finalize();

    let mut checksum = [0u8; 32];
    checksum.copy_from_slice(&result);
    checksum
}

pub struct Ledger {
    spent: HashSet<Fingerprint>,
    /// None for an in-memory ledger
    file: Option<LedgerFile>,
}

impl Ledger {
    pub fn in_memory() -> Self {
        Self {
            spent: HashSet::new(),
            file: None,
        }
    }

    /// Open a ledger file, creating an empty ledger if it does not exist yet.
    ///
    /// Fails straight away when the lock file cannot be created next to the
    /// ledger. A file that fails its checksum is an error, starting empty
    /// would re-open every code ever redeemed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let mut file = LedgerFile::open(path.into())?;
        let spent = file.exclusive(LedgerFile::read)?;

        if spent.is_empty() {
            info!("No redeemed codes at {}, starting empty", file.path.display());
        } else {
            info!(
                "Loaded {} redeemed codes from {} (checksum verified)",
                spent.len(),
                file.path.display()
            );
        }

        Ok(Self {
            spent,
            file: Some(file),
        })
    }

    /// Pick up codes other processes have recorded since the last read.
    pub fn refresh(&mut self) -> Result<()> {
        let Some(file) = &mut self.file else {
            return Ok(());
        };
        let on_disk = file.exclusive(LedgerFile::read)?;
        self.spent.extend(on_disk);
        Ok(())
    }

    /// Membership in the last loaded view; call [`Ledger::refresh`] first to
    /// see other processes.
    pub fn contains(&self, fp: &Fingerprint) -> bool {
        self.spent.contains(fp)
    }

    pub fn len(&self) -> usize {
        self.spent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spent.is_empty()
    }

    /// Record a fingerprint. Returns false if it was already spent, here or
    /// by another process sharing the file.
    ///
    /// If persisting fails the in-memory record is rolled back.
    pub fn mark_spent(&mut self, fp: Fingerprint) -> Result<bool> {
        let spent = &mut self.spent;
        let Some(file) = &mut self.file else {
            return Ok(spent.insert(fp));
        };

        let inserted = file.exclusive(|path| {
            spent.extend(LedgerFile::read(path)?);
            if !spent.insert(fp) {
                return Ok(false);
            }
            if let Err(e) = LedgerFile::write(path, spent) {
                spent.remove(&fp);
                return Err(e);
            }
            Ok(true)
        })?;

        if inserted {
            debug!("Ledger now holds {} codes", spent.len());
        }
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_covers_tag() {
        let a = RawCode::from_bytes(&[1u8; 36]).unwrap();
        let mut bytes = [1u8; 36];
        bytes[35] = 2;
        let b = RawCode::from_bytes(&bytes).unwrap();

        assert_eq!(fingerprint(&a), fingerprint(&a));
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_in_memory_mark_spent() {
        let mut ledger = Ledger::in_memory();
        assert!(ledger.mark_spent([1u8; 32]).unwrap());
        assert!(!ledger.mark_spent([1u8; 32]).unwrap());
        assert!(ledger.contains(&[1u8; 32]));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.dat");

        {
            let mut ledger = Ledger::open(&path).unwrap();
            assert!(ledger.is_empty());
            ledger.mark_spent([1u8; 32]).unwrap();
            ledger.mark_spent([2u8; 32]).unwrap();
        }

        let ledger = Ledger::open(&path).unwrap();
        assert_eq!(ledger.len(), 2);
        assert!(ledger.contains(&[2u8; 32]));
        assert!(!dir.path().join("ledger.dat.tmp").exists());
    }

    #[test]
    fn test_stale_handle_merges_instead_of_overwriting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.dat");

        let mut first = Ledger::open(&path).unwrap();
        let mut second = Ledger::open(&path).unwrap();

        assert!(first.mark_spent([1u8; 32]).unwrap());
        // `second` loaded before [1] was written and must still see it.
        assert!(!second.mark_spent([1u8; 32]).unwrap());
        assert!(second.mark_spent([2u8; 32]).unwrap());

        assert!(!first.contains(&[2u8; 32]));
        first.refresh().unwrap();
        assert!(first.contains(&[2u8; 32]));

        let reopened = Ledger::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
    }

    #[test]
    fn test_tmp_named_ledger_keeps_atomic_rename() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spent.tmp");

        {
            let mut ledger = Ledger::open(&path).unwrap();
            ledger.mark_spent([3u8; 32]).unwrap();
            ledger.mark_spent([4u8; 32]).unwrap();
        }

        assert_eq!(with_suffix(&path, ".tmp"), dir.path().join("spent.tmp.tmp"));
        assert!(!dir.path().join("spent.tmp.tmp").exists());
        assert_eq!(Ledger::open(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_corrupted_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.dat");

        {
            let mut ledger = Ledger::open(&path).unwrap();
            ledger.mark_spent([7u8; 32]).unwrap();
        }

        let mut data = std::fs::read(&path).unwrap();
        let last = data.len() - 1;
        data[last] ^= 0xff;
        std::fs::write(&path, &data).unwrap();

        assert!(matches!(Ledger::open(&path), Err(RedeemError::Ledger(_))));
    }

    #[test]
    fn test_truncated_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.dat");
        std::fs::write(&path, [0u8; 40]).unwrap();

        assert!(matches!(Ledger::open(&path), Err(RedeemError::Ledger(_))));
    }

    #[test]
    fn test_missing_directory_fails_at_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("ledger.dat");

        assert!(matches!(Ledger::open(&path), Err(RedeemError::Ledger(_))));
    }

    #[test]
    fn test_failed_persist_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.dat");

        let mut ledger = Ledger::open(&path).unwrap();
        // A directory in the temp file's place makes the write fail.
        std::fs::create_dir(dir.path().join("ledger.dat.tmp")).unwrap();

        assert!(matches!(
            ledger.mark_spent([4u8; 32]),
            Err(RedeemError::Ledger(_))
        ));
        assert!(!ledger.contains(&[4u8; 32]));
        assert!(!path.exists());
    }
}
