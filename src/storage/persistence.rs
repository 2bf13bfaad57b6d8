//! Runtime persistence layer
//!
//! Saves and loads the runtime (native balances plus the ledger) as JSON.

use crate::core::amount::INITIAL_SUPPLY;
use crate::runtime::Runtime;
use crate::token::TokenMetadata;
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub state_file: String,
    pub backup_enabled: bool,
    pub max_backups: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".karbun_data"),
            state_file: "karbun.json".to_string(),
            backup_enabled: true,
            max_backups: 5,
        }
    }
}

/// Runtime storage manager
pub struct Storage {
    config: StorageConfig,
}

impl Storage {
    /// Create a new storage manager
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self { config })
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    fn state_path(&self) -> PathBuf {
        self.config.data_dir.join(&self.config.state_file)
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.backup.{}", self.config.state_file, index))
    }

    /// Save the runtime to disk
    pub fn save(&self, runtime: &Runtime) -> Result<(), StorageError> {
        let path = self.state_path();

        if self.config.backup_enabled && self.config.max_backups > 0 && path.exists() {
            self.rotate_backups()?;
            fs::copy(&path, self.backup_path(0))?;
        }

        // Write to temporary file first
        let temp_path = self.config.data_dir.join("karbun.tmp");
        let file = fs::File::create(&temp_path)?;
        let writer = BufWriter::new(file);

        serde_json::to_writer_pretty(writer, runtime)?;

        // Atomic rename
        fs::rename(&temp_path, &path)?;
        log::debug!("State saved to {:?}", path);

        Ok(())
    }

    /// Load the runtime from disk
    pub fn load(&self) -> Result<Runtime, StorageError> {
        let path = self.state_path();

        if !path.exists() {
            return Err(StorageError::InvalidData("State file not found".to_string()));
        }

        load_from_file(&path)
    }

    /// Check if a saved state exists
    pub fn exists(&self) -> bool {
        self.state_path().exists()
    }

    /// Delete the saved state
    pub fn delete(&self) -> Result<(), StorageError> {
        let path = self.state_path();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Rotate backup files
    fn rotate_backups(&self) -> Result<(), StorageError> {
        // Delete oldest backup
        let oldest = self.backup_path(self.config.max_backups - 1);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        // Shift existing backups
        for i in (0..self.config.max_backups - 1).rev() {
            let current = self.backup_path(i);
            if current.exists() {
                fs::rename(&current, self.backup_path(i + 1))?;
            }
        }

        Ok(())
    }

    /// Restore from a backup
    pub fn restore_backup(&self, backup_index: usize) -> Result<Runtime, StorageError> {
        let backup_path = self.backup_path(backup_index);

        if !backup_path.exists() {
            return Err(StorageError::InvalidData(format!(
                "Backup {} not found",
                backup_index
            )));
        }

        load_from_file(&backup_path)
    }

    /// List available backups
    pub fn list_backups(&self) -> Vec<usize> {
        (0..self.config.max_backups)
            .filter(|i| self.backup_path(*i).exists())
            .collect()
    }
}

/// Save runtime to a specific file path
pub fn save_to_file(runtime: &Runtime, path: &Path) -> Result<(), StorageError> {
    let file = fs::File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, runtime)?;
    Ok(())
}

/// Load runtime from a specific file path, rejecting a ledger whose
/// metadata or supply differ from the ones fixed at construction, or whose
/// balances do not add up to its total supply
pub fn load_from_file(path: &Path) -> Result<Runtime, StorageError> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    let runtime: Runtime = serde_json::from_reader(reader)?;

    if let Some(ledger) = runtime.ledger() {
        if *ledger.metadata() != TokenMetadata::default() {
            return Err(StorageError::InvalidData(format!(
                "Token metadata in {:?} has been altered",
                path
            )));
        }
        if ledger.total_supply() != INITIAL_SUPPLY {
            return Err(StorageError::InvalidData(format!(
                "Total supply in {:?} is {}, expected {}",
                path,
                ledger.total_supply(),
                INITIAL_SUPPLY
            )));
        }
        if !ledger.check_supply_invariant() {
            return Err(StorageError::InvalidData(format!(
                "Balances in {:?} do not sum to total supply",
                path
            )));
        }
    }

    Ok(runtime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Address;
    use crate::runtime::{Call, Message};

    fn test_storage(dir: &tempfile::TempDir, max_backups: usize) -> Storage {
        let config = StorageConfig {
            data_dir: dir.path().to_path_buf(),
            max_backups,
            ..Default::default()
        };
        Storage::new(config).unwrap()
    }

    fn deployed_runtime() -> (Runtime, Address, Address) {
        let mut runtime = Runtime::new();
        let deployer = Address::new([0xd0; 20]);
        let token = runtime.deploy(deployer).unwrap();
        (runtime, deployer, token)
    }

    #[test]
    fn test_save_load_runtime() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = test_storage(&temp_dir, 5);

        let (mut runtime, deployer, token) = deployed_runtime();
        let recipient = Address::new([1; 20]);
        runtime.fund(recipient, 77).unwrap();
        runtime
            .execute(Message::call(
                deployer,
                token,
                Call::Transfer {
                    to: recipient,
                    amount: 1234,
                },
            ))
            .unwrap();

        storage.save(&runtime).unwrap();
        assert!(storage.exists());

        let loaded = storage.load().unwrap();
        let ledger = loaded.token().unwrap();
        assert_eq!(loaded.token_address(), Some(token));
        assert_eq!(ledger.balance_of(&recipient), 1234);
        assert_eq!(ledger.owner(), deployer);
        assert_eq!(ledger.events().len(), 2);
        assert_eq!(loaded.native_balance(&recipient), 77);
    }

    #[test]
    fn test_load_missing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = test_storage(&temp_dir, 5);

        assert!(!storage.exists());
        assert!(matches!(storage.load(), Err(StorageError::InvalidData(_))));
    }

    #[test]
    fn test_load_rejects_tampered_balances() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = test_storage(&temp_dir, 5);
        let (runtime, deployer, _) = deployed_runtime();
        storage.save(&runtime).unwrap();

        let path = temp_dir.path().join("karbun.json");
        let minted = format!("\"{}\": {}", deployer, INITIAL_SUPPLY);
        let state = fs::read_to_string(&path).unwrap();
        assert!(state.contains(&minted));
        let tampered = state.replace(&minted, &format!("\"{}\": 1", deployer));
        fs::write(&path, tampered).unwrap();

        assert!(matches!(storage.load(), Err(StorageError::InvalidData(_))));
    }

    #[test]
    fn test_load_rejects_inflated_supply() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = test_storage(&temp_dir, 5);
        let (runtime, _, _) = deployed_runtime();
        storage.save(&runtime).unwrap();

        // Supply and balance raised together still sum up
        let path = temp_dir.path().join("karbun.json");
        let state = fs::read_to_string(&path).unwrap();
        let inflated = state.replace(
            &INITIAL_SUPPLY.to_string(),
            &(2 * INITIAL_SUPPLY).to_string(),
        );
        fs::write(&path, inflated).unwrap();

        assert!(matches!(storage.load(), Err(StorageError::InvalidData(_))));
    }

    #[test]
    fn test_load_rejects_renamed_token() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = test_storage(&temp_dir, 5);
        let (runtime, _, _) = deployed_runtime();
        storage.save(&runtime).unwrap();

        let path = temp_dir.path().join("karbun.json");
        let state = fs::read_to_string(&path).unwrap();
        assert!(state.contains("\"name\": \"Karbun\""));
        let renamed = state.replace("\"name\": \"Karbun\"", "\"name\": \"Other\"");
        fs::write(&path, renamed).unwrap();

        assert!(matches!(storage.load(), Err(StorageError::InvalidData(_))));
    }

    #[test]
    fn test_backup_rotation() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = test_storage(&temp_dir, 3);
        let (mut runtime, _, _) = deployed_runtime();

        for i in 0..5 {
            runtime.fund(Address::new([2; 20]), i).unwrap();
            storage.save(&runtime).unwrap();
        }

        assert_eq!(storage.list_backups(), vec![0, 1, 2]);
        let restored = storage.restore_backup(0).unwrap();
        assert!(restored.ledger().is_some());
        assert!(matches!(
            storage.restore_backup(9),
            Err(StorageError::InvalidData(_))
        ));
    }

    #[test]
    fn test_delete() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = test_storage(&temp_dir, 5);
        storage.save(&Runtime::new()).unwrap();

        storage.delete().unwrap();
        assert!(!storage.exists());
    }
}
