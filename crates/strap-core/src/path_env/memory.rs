//! In-memory PATH store for tests and embedding.

use super::{PathStore, PathSyntax, RegistrationError, Scope};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Holds one PATH value per scope in memory. Never touches the real environment.
#[derive(Debug)]
pub struct MemoryPathStore {
    values: Mutex<HashMap<Scope, String>>,
    syntax: PathSyntax,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl Default for MemoryPathStore {
    fn default() -> Self {
        Self::with_syntax(PathSyntax::host())
    }
}

impl MemoryPathStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_syntax(syntax: PathSyntax) -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
            syntax,
            writes: AtomicUsize::new(0),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Number of successful `set` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// Make subsequent `get` calls fail.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::Relaxed);
    }

    /// Make subsequent `set` calls fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }
}

impl PathStore for MemoryPathStore {
    fn get(&self, scope: Scope) -> Result<String, RegistrationError> {
        if self.fail_reads.load(Ordering::Relaxed) {
            return Err(RegistrationError::Read {
                scope,
                location: "memory".to_string(),
                reason: "read disabled".to_string(),
            });
        }
        let values = self.values.lock().map_err(|e| RegistrationError::Read {
            scope,
            location: "memory".to_string(),
            reason: e.to_string(),
        })?;
        Ok(values.get(&scope).cloned().unwrap_or_default())
    }

    fn set(&self, scope: Scope, value: &str) -> Result<(), RegistrationError> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(RegistrationError::Write {
                scope,
                location: "memory".to_string(),
                reason: "write disabled".to_string(),
            });
        }
        let mut values = self.values.lock().map_err(|e| RegistrationError::Write {
            scope,
            location: "memory".to_string(),
            reason: e.to_string(),
        })?;
        values.insert(scope, value.to_string());
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn syntax(&self) -> PathSyntax {
        self.syntax
    }
}
