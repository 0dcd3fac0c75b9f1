//! LIFO stack used as the explicit call stack of the maze generator

use crate::error::{Error, Result};

/// Last-in, first-out container with an optional capacity bound.
///
/// The generator stores grid cell indices here, so the stack only records
/// traversal order; the cells themselves stay owned by the grid.
#[derive(Debug, Clone, Default)]
pub struct Stack<T> {
    items: Vec<T>,
    /// Maximum number of items, `None` if unbounded
    capacity: Option<usize>,
}

impl<T> Stack<T> {
    /// Create an empty stack. `None` means no capacity limit.
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            items: Vec::new(),
            capacity,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(None)
    }

    pub fn bounded(capacity: usize) -> Self {
        Self::new(Some(capacity))
    }

    /// Place `item` on top of the stack.
    ///
    /// Fails with [Error::CapacityExceeded] if the stack is bounded and
    /// full, or [Error::Allocation] if the backing buffer cannot grow.
    pub fn push(&mut self, item: T) -> Result<()> {
        if let Some(capacity) = self.capacity {
            if self.items.len() >= capacity {
                return Err(Error::CapacityExceeded(capacity));
            }
        }
        self.items.try_reserve(1)?;
        self.items.push(item);
        Ok(())
    }

    /// Remove and return the top item, `None` if empty.
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    /// Top item without removing it, `None` if empty.
    pub fn peek(&self) -> Option<&T> {
        self.items.last()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn capacity_limit(&self) -> Option<usize> {
        self.capacity
    }

    /// Consume the stack, handing every remaining item to `release`,
    /// top first.
    ///
    /// Dropping the stack is the equivalent without a callback.
    pub fn destroy<F: FnMut(T)>(mut self, mut release: F) {
        while let Some(item) = self.items.pop() {
            release(item);
        }
    }
}
