//! Filesystem-backed rule document loading.
//!
//! Scans a directory (recursively) for `*.yml` / `*.yaml` rule documents,
//! deserializes and validates them, and maintains an in-memory map keyed by
//! rule ID. Rule lifecycle is owned by the authoring surface; this loader
//! feeds the worker binary and test fixtures, so there is no hot-reload.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use vigil_core::error::VigilError;
use vigil_core::tenant::TenantScope;

use crate::schema::NotificationRule;
use crate::validation;

/// Errors that can occur during rule document loading.
#[derive(Debug, thiserror::Error)]
pub enum RuleFileError {
    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse/deserialization error.
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Rule validation error (e.g. missing frequency payload).
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result alias for loader operations.
pub type Result<T> = std::result::Result<T, RuleFileError>;

/// One rule plus the tenant context it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDocument {
    /// Owning tenant identifier.
    pub tenant: String,
    /// IANA timezone the tenant's wall-clock times are interpreted in.
    pub timezone: String,
    pub rule: NotificationRule,
}

impl RuleDocument {
    /// Resolve the document's tenant scope (fails on unknown timezones).
    pub fn scope(&self) -> std::result::Result<TenantScope, VigilError> {
        TenantScope::parse(self.tenant.as_str(), &self.timezone)
    }
}

/// Outcome of loading a single rule file.
#[derive(Debug)]
pub struct LoadResult {
    /// Path to the file that was loaded.
    pub path: PathBuf,
    /// Status of the load attempt.
    pub status: LoadStatus,
}

/// Status of a single file load attempt.
#[derive(Debug)]
pub enum LoadStatus {
    /// Document was successfully loaded.
    Loaded { rule_id: Uuid },
    /// File was skipped (dotfile, non-YAML, etc.).
    Skipped { reason: String },
    /// Parse or validation error occurred.
    Failed { error: String },
}

/// Filesystem-backed rule document loader.
pub struct RuleLoader {
    /// Root directory containing rule YAML files.
    rules_dir: PathBuf,
    /// In-memory store of all documents keyed by rule id.
    documents: Arc<RwLock<HashMap<Uuid, RuleDocument>>>,
}

impl RuleLoader {
    /// Create a new loader for the given directory.
    ///
    /// Creates the directory (and parents) if it does not exist.
    pub fn new(rules_dir: PathBuf) -> Self {
        if !rules_dir.exists() {
            if let Err(e) = fs::create_dir_all(&rules_dir) {
                warn!(path = %rules_dir.display(), error = %e, "failed to create rules directory");
            }
        }
        Self {
            rules_dir,
            documents: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Recursively scan the rules directory and load all YAML files.
    ///
    /// Dotfiles (filenames starting with `.`) and non-YAML files are skipped.
    /// Parse and validation errors are reported per-file but do not abort
    /// the scan.
    pub fn load_all(&self) -> Result<Vec<LoadResult>> {
        let mut results = Vec::new();
        self.scan_dir_recursive(&self.rules_dir.clone(), &mut results)?;
        Ok(results)
    }

    fn scan_dir_recursive(&self, dir: &Path, results: &mut Vec<LoadResult>) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "failed to read directory");
                return Ok(());
            }
        };

        for entry in entries {
            let entry = entry?;
            let path = entry.path();

            // Skip dotfiles/dotdirs
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    if path.is_file() {
                        results.push(LoadResult {
                            path,
                            status: LoadStatus::Skipped {
                                reason: "dotfile".to_string(),
                            },
                        });
                    }
                    continue;
                }
            }

            if path.is_dir() {
                self.scan_dir_recursive(&path, results)?;
                continue;
            }

            let is_yaml = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e == "yml" || e == "yaml")
                .unwrap_or(false);

            if !is_yaml {
                results.push(LoadResult {
                    path,
                    status: LoadStatus::Skipped {
                        reason: "not a YAML file".to_string(),
                    },
                });
                continue;
            }

            match self.load_file(&path) {
                Ok(doc) => {
                    let rule_id = doc.rule.id;
                    info!(
                        rule_id = %rule_id,
                        tenant = %doc.tenant,
                        path = %path.display(),
                        "loaded rule document"
                    );
                    self.documents
                        .write()
                        .expect("documents lock poisoned")
                        .insert(rule_id, doc);
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Loaded { rule_id },
                    });
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load rule document");
                    results.push(LoadResult {
                        path,
                        status: LoadStatus::Failed {
                            error: e.to_string(),
                        },
                    });
                }
            }
        }

        Ok(())
    }

    /// Parse and validate a single rule document file.
    pub fn load_file(&self, path: &Path) -> Result<RuleDocument> {
        let raw = fs::read_to_string(path)?;
        let doc: RuleDocument = serde_yaml::from_str(&raw)?;

        let checked = validation::validate_rule(&doc.rule);
        if !checked.valid {
            return Err(RuleFileError::Validation(checked.summary()));
        }
        // Reject unknown timezones at load time, not at first reconcile.
        doc.scope()
            .map_err(|e| RuleFileError::Validation(e.to_string()))?;

        Ok(doc)
    }

    /// All loaded documents.
    pub fn documents(&self) -> Vec<RuleDocument> {
        self.documents
            .read()
            .expect("documents lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    /// Look up one document by rule id.
    pub fn get(&self, rule_id: Uuid) -> Option<RuleDocument> {
        self.documents
            .read()
            .expect("documents lock poisoned")
            .get(&rule_id)
            .cloned()
    }

    /// Number of loaded documents.
    pub fn len(&self) -> usize {
        self.documents.read().expect("documents lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
