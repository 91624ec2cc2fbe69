//! Worker identity
//!
//! A handle is the only thing that links a process record to the unit doing
//! its work, so two live workers must never share one. Handles are random
//! v4 UUIDs and serialize as a bare UUID string.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identity of an external execution unit
///
/// The scheduler never owns the unit behind a handle. It keeps the handle
/// only to address "run one unit" and "terminate" signals, and to map exit
/// notifications back to a process record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerHandle(Uuid);

impl WorkerHandle {
    /// Draws a fresh handle, distinct from every other live handle
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps a known UUID, e.g. one read back from a report
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The UUID this handle serializes as
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for WorkerHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WorkerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Worker({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_handle_creation() {
        let h1 = WorkerHandle::new();
        let h2 = WorkerHandle::new();
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_worker_handle_from_uuid() {
        let uuid = Uuid::new_v4();
        let handle = WorkerHandle::from_uuid(uuid);
        assert_eq!(handle.as_uuid(), uuid);
    }

    #[test]
    fn test_worker_handle_display() {
        let handle = WorkerHandle::new();
        assert!(format!("{}", handle).starts_with("Worker("));
    }

    #[test]
    fn test_worker_handle_serializes_as_bare_uuid() {
        let uuid = Uuid::new_v4();
        let json = serde_json::to_string(&WorkerHandle::from_uuid(uuid)).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid));
    }

    #[test]
    fn test_worker_handle_serde_roundtrip() {
        let handle = WorkerHandle::new();
        let json = serde_json::to_string(&handle).unwrap();
        let back: WorkerHandle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, handle);
    }
}
