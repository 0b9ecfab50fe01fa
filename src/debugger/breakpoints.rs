//! Breakpoint set.

use std::collections::BTreeSet;

use crate::error::{Result, VmError};

/// Addresses at which `run` pauses.
///
/// Duplicates are ignored and iteration is ascending.
#[derive(Debug, Clone, Default)]
pub struct BreakpointSet {
    addresses: BTreeSet<u32>,
}

impl BreakpointSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a breakpoint. Returns `false` if one was already set there.
    pub fn set(&mut self, address: u32) -> bool {
        let added = self.addresses.insert(address);
        log::debug!("Breakpoint set at {} (new: {})", address, added);
        added
    }

    /// Remove a breakpoint.
    ///
    /// # Errors
    ///
    /// [`VmError::NotFound`] if no breakpoint was set at `address`.
    pub fn delete(&mut self, address: u32) -> Result<()> {
        if self.addresses.remove(&address) {
            log::debug!("Breakpoint at {} removed", address);
            Ok(())
        } else {
            Err(VmError::NotFound { address })
        }
    }

    /// Whether a breakpoint is set at `address`.
    #[inline]
    pub fn contains(&self, address: u32) -> bool {
        self.addresses.contains(&address)
    }

    /// Remove every breakpoint.
    pub fn clear(&mut self) {
        self.addresses.clear();
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Breakpoint addresses in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.addresses.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_ignores_duplicates() {
        let mut bps = BreakpointSet::new();
        assert!(bps.set(4));
        assert!(!bps.set(4));
        assert_eq!(bps.len(), 1);
        assert!(bps.contains(4));
    }

    #[test]
    fn test_iter_ascending() {
        let mut bps = BreakpointSet::new();
        for addr in [9, 1, 5] {
            bps.set(addr);
        }
        assert_eq!(bps.iter().collect::<Vec<_>>(), vec![1, 5, 9]);

        bps.clear();
        assert!(bps.is_empty());
        assert!(!bps.contains(5));
    }

    #[test]
    fn test_delete_missing() {
        let mut bps = BreakpointSet::new();
        bps.set(2);
        assert_eq!(bps.delete(3), Err(VmError::NotFound { address: 3 }));
        assert_eq!(bps.delete(2), Ok(()));
        assert!(bps.is_empty());
    }
}
