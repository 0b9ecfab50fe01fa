//! Sparse word-addressed memory.
//!
//! The address space is 32 bits wide and almost entirely empty, so cells are
//! kept in a `BTreeMap` keyed by address. Iteration is always in ascending
//! address order, which range dumps and sequential disassembly rely on.
//!
//! Reading an address that was never written does not fail: it returns
//! [`Cell::UNINITIALIZED`] (`0xCCCCCCCC`). Executing such a cell is an
//! ordinary unknown-instruction error.
//!
//! # Example
//!
//! ```
//! use pseudoasm::isa::Cell;
//! use pseudoasm::memory::MemoryStore;
//!
//! let mut mem = MemoryStore::new();
//! mem.write(100, Cell::from_int(42)).unwrap();
//! assert_eq!(mem.read(100).as_int(), 42);
//! assert_eq!(mem.read(101), Cell::UNINITIALIZED);
//! ```

pub mod trace;

use std::collections::BTreeMap;
use std::ops::RangeBounds;

use crate::error::{Result, VmError};
use crate::isa::Cell;

pub use trace::ChangeTracker;

/// A written address together with the value it holds now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryChange {
    pub address: u32,
    pub value: Cell,
}

/// Sparse memory with change tracking.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    /// Sparse storage: address -> cell.
    cells: BTreeMap<u32, Cell>,
    /// Maximum number of stored cells, `None` for no limit.
    cell_limit: Option<usize>,
    /// Observer of successful writes.
    tracker: ChangeTracker,
}

impl MemoryStore {
    /// Create an empty memory with no cell limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty memory that refuses to hold more than `limit` cells.
    pub fn with_cell_limit(limit: usize) -> Self {
        Self {
            cell_limit: Some(limit),
            ..Self::default()
        }
    }

    /// Change the cell limit. Cells already stored are kept.
    pub fn set_cell_limit(&mut self, limit: Option<usize>) {
        self.cell_limit = limit;
    }

    /// Current cell limit.
    pub fn cell_limit(&self) -> Option<usize> {
        self.cell_limit
    }

    /// Read a cell. Unwritten addresses read as [`Cell::UNINITIALIZED`].
    ///
    /// Reads are never reported to the change tracker.
    #[inline]
    pub fn read(&self, address: u32) -> Cell {
        self.cells.get(&address).copied().unwrap_or(Cell::UNINITIALIZED)
    }

    /// Write a cell, inserting it or overwriting the existing one.
    ///
    /// A successful write is reported to the change tracker.
    ///
    /// # Errors
    ///
    /// [`VmError::OutOfMemory`] if the address is new and the cell limit is
    /// reached. Nothing is written or recorded in that case.
    pub fn write(&mut self, address: u32, cell: Cell) -> Result<()> {
        if let Some(slot) = self.cells.get_mut(&address) {
            *slot = cell;
        } else {
            if self.cell_limit.is_some_and(|limit| self.cells.len() >= limit) {
                self.tracker.cancel_suppression();
                log::warn!("Cell limit reached, cannot allocate address {}", address);
                return Err(VmError::OutOfMemory { address });
            }
            self.cells.insert(address, cell);
        }

        self.tracker.record(address);
        Ok(())
    }

    /// Whether a cell has been written at `address`.
    pub fn contains(&self, address: u32) -> bool {
        self.cells.contains_key(&address)
    }

    /// Number of stored cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether no cell has been written.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate over stored cells in ascending address order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, Cell)> + '_ {
        self.cells.iter().map(|(addr, cell)| (*addr, *cell))
    }

    /// Iterate over stored cells within an address range, ascending.
    pub fn range<R>(&self, range: R) -> impl Iterator<Item = (u32, Cell)> + '_
    where
        R: RangeBounds<u32>,
    {
        self.cells.range(range).map(|(addr, cell)| (*addr, *cell))
    }

    /// Change tracker.
    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    /// Mutable change tracker.
    pub fn tracker_mut(&mut self) -> &mut ChangeTracker {
        &mut self.tracker
    }
}
