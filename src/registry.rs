//! Client registry: which application windows are managed, and by which frame.
//!
//! Entries keep their insertion order, which is the order focus cycling walks.
//! The client -> frame mapping is a bijection; inserts that would break it are
//! refused.

use anyhow::{bail, Result};
use x11rb::protocol::xproto::Window;

/// One managed client and the frame that wraps it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientRecord {
    pub client: Window,
    pub frame: Window,
}

/// Insertion-ordered client -> frame map
#[derive(Debug, Default)]
pub struct ClientRegistry {
    records: Vec<ClientRecord>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `client` as wrapped by `frame`.
    ///
    /// Fails if either id is already part of another record.
    pub fn insert(&mut self, client: Window, frame: Window) -> Result<()> {
        if client == frame {
            bail!("Window 0x{:x} cannot be its own frame", client);
        }
        for record in &self.records {
            if record.client == client || record.frame == client {
                bail!("Window 0x{:x} is already registered", client);
            }
            if record.frame == frame || record.client == frame {
                bail!("Frame 0x{:x} is already registered", frame);
            }
        }
        self.records.push(ClientRecord { client, frame });
        Ok(())
    }

    /// Remove a client, returning its frame
    pub fn remove(&mut self, client: Window) -> Option<Window> {
        let idx = self.position(client)?;
        Some(self.records.remove(idx).frame)
    }

    pub fn contains(&self, client: Window) -> bool {
        self.position(client).is_some()
    }

    pub fn frame_of(&self, client: Window) -> Option<Window> {
        self.records
            .iter()
            .find(|r| r.client == client)
            .map(|r| r.frame)
    }

    pub fn client_of_frame(&self, frame: Window) -> Option<Window> {
        self.records
            .iter()
            .find(|r| r.frame == frame)
            .map(|r| r.client)
    }

    /// The record after `client` in insertion order, wrapping to the first.
    ///
    /// Returns `None` if `client` is not registered.
    pub fn next_after(&self, client: Window) -> Option<ClientRecord> {
        let idx = self.position(client)?;
        let next = (idx + 1) % self.records.len();
        Some(self.records[next])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Check the bijection invariant, returning a description of each violation
    pub fn validate(&self) -> Vec<String> {
        let mut violations = Vec::new();

        for (i, a) in self.records.iter().enumerate() {
            if a.client == a.frame {
                violations.push(format!("Window 0x{:x} is framed by itself", a.client));
            }
            for b in &self.records[i + 1..] {
                if a.client == b.client {
                    violations.push(format!("Client 0x{:x} has two frames", a.client));
                }
                if a.frame == b.frame {
                    violations.push(format!(
                        "Frame 0x{:x} is shared by 0x{:x} and 0x{:x}",
                        a.frame, a.client, b.client
                    ));
                }
                if a.client == b.frame || a.frame == b.client {
                    violations.push(format!(
                        "Records 0x{:x} and 0x{:x} use the same window as client and frame",
                        a.client, b.client
                    ));
                }
            }
        }

        violations
    }

    fn position(&self, client: Window) -> Option<usize> {
        self.records.iter().position(|r| r.client == client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: Window = 0x200001;
    const B: Window = 0x200002;
    const C: Window = 0x200003;

    fn registry_abc() -> ClientRegistry {
        let mut reg = ClientRegistry::new();
        reg.insert(A, 0x400001).unwrap();
        reg.insert(B, 0x400002).unwrap();
        reg.insert(C, 0x400003).unwrap();
        reg
    }

    #[test]
    fn test_insert_and_lookup() {
        let reg = registry_abc();
        assert_eq!(reg.len(), 3);
        assert_eq!(reg.frame_of(B), Some(0x400002));
        assert_eq!(reg.client_of_frame(0x400003), Some(C));
        assert!(reg.contains(A));
        assert!(!reg.contains(0x400001));
        assert!(reg.validate().is_empty());
    }

    #[test]
    fn test_insert_rejects_duplicate_client() {
        let mut reg = registry_abc();
        assert!(reg.insert(A, 0x400009).is_err());
        assert_eq!(reg.len(), 3);
    }

    #[test]
    fn test_insert_rejects_shared_frame() {
        let mut reg = registry_abc();
        assert!(reg.insert(0x200009, 0x400002).is_err());
        assert!(reg.insert(0x200009, A).is_err());
        assert!(reg.insert(0x400001, 0x400009).is_err());
        assert!(reg.insert(0x200009, 0x200009).is_err());
        assert!(reg.validate().is_empty());
    }

    #[test]
    fn test_remove_returns_frame() {
        let mut reg = registry_abc();
        assert_eq!(reg.remove(B), Some(0x400002));
        assert_eq!(reg.remove(B), None);
        assert!(!reg.contains(B));
        assert_eq!(reg.client_of_frame(0x400002), None);

        // The frame id can be reused after removal
        reg.insert(0x200009, 0x400002).unwrap();
        assert!(reg.validate().is_empty());
    }

    #[test]
    fn test_next_after_advances_in_insertion_order() {
        let reg = registry_abc();
        assert_eq!(reg.next_after(A).map(|r| r.client), Some(B));
        assert_eq!(reg.next_after(B).map(|r| r.client), Some(C));
    }

    #[test]
    fn test_next_after_wraps() {
        let reg = registry_abc();
        let next = reg.next_after(C).unwrap();
        assert_eq!(next.client, A);
        assert_eq!(next.frame, 0x400001);
    }

    #[test]
    fn test_next_after_single_and_unknown() {
        let mut reg = ClientRegistry::new();
        assert!(reg.next_after(A).is_none());
        reg.insert(A, 0x400001).unwrap();
        assert_eq!(reg.next_after(A).map(|r| r.client), Some(A));
        assert!(reg.next_after(B).is_none());
    }

    #[test]
    fn test_order_survives_removal() {
        let mut reg = registry_abc();
        reg.remove(A);
        reg.insert(A, 0x400001).unwrap();
        assert_eq!(reg.next_after(B).map(|r| r.client), Some(C));
        assert_eq!(reg.next_after(C).map(|r| r.client), Some(A));
        assert_eq!(reg.next_after(A).map(|r| r.client), Some(B));
    }
}
