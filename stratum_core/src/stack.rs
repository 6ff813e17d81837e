// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Z-ordered, doubly linked layer stack.
//!
//! Entries live in a slot array and link to each other by index, so there is
//! no pointer bookkeeping: `upper` points toward the front of the screen,
//! `lower` toward the back. Pushing to the top and removing by handle are
//! O(1); [`find`](LayerStack::find) is a linear walk.
//!
//! The stack treats its keys as opaque payload. The compositor stores
//! [`LayerId`](crate::layer::LayerId)s in it and checks for duplicates
//! before pushing.

use crate::layer::INVALID;

/// Handle to one entry of a [`LayerStack`].
///
/// Valid until the entry is removed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntryId(u32);

#[derive(Clone, Copy, Debug)]
struct Entry<K> {
    key: K,
    upper: u32,
    lower: u32,
}

/// Ordered top-to-bottom sequence of keys.
#[derive(Clone, Debug)]
pub struct LayerStack<K> {
    entries: Vec<Option<Entry<K>>>,
    free_list: Vec<u32>,
    top: u32,
    bottom: u32,
    len: usize,
}

impl<K> Default for LayerStack<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> LayerStack<K> {
    /// Creates an empty stack.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            free_list: Vec::new(),
            top: INVALID,
            bottom: INVALID,
            len: 0,
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the stack holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Frontmost entry.
    #[must_use]
    pub fn top(&self) -> Option<EntryId> {
        link(self.top)
    }

    /// Backmost entry.
    #[must_use]
    pub fn bottom(&self) -> Option<EntryId> {
        link(self.bottom)
    }

    /// The entry directly in front of `entry`.
    #[must_use]
    pub fn upper(&self, entry: EntryId) -> Option<EntryId> {
        self.entry(entry).and_then(|e| link(e.upper))
    }

    /// The entry directly behind `entry`.
    #[must_use]
    pub fn lower(&self, entry: EntryId) -> Option<EntryId> {
        self.entry(entry).and_then(|e| link(e.lower))
    }

    /// Iterates from the frontmost entry to the backmost.
    #[must_use]
    pub fn top_down(&self) -> Walk<'_, K> {
        Walk::new(self, self.top, Direction::Down)
    }

    /// Iterates from the backmost entry to the frontmost.
    #[must_use]
    pub fn bottom_up(&self) -> Walk<'_, K> {
        Walk::new(self, self.bottom, Direction::Up)
    }

    /// Iterates over the entries in front of `entry`, nearest first.
    #[must_use]
    pub fn above(&self, entry: EntryId) -> Walk<'_, K> {
        let start = self.entry(entry).map_or(INVALID, |e| e.upper);
        Walk::new(self, start, Direction::Up)
    }

    /// Iterates over the entries behind `entry`, nearest first.
    #[must_use]
    pub fn below(&self, entry: EntryId) -> Walk<'_, K> {
        let start = self.entry(entry).map_or(INVALID, |e| e.lower);
        Walk::new(self, start, Direction::Down)
    }

    /// Pushes `key` on top of the stack.
    #[expect(
        clippy::cast_possible_truncation,
        reason = "stack sizes stay far below u32::MAX"
    )]
    pub fn push_top(&mut self, key: K) -> EntryId {
        let entry = Entry {
            key,
            upper: INVALID,
            lower: self.top,
        };
        let idx = if let Some(idx) = self.free_list.pop() {
            self.entries[idx as usize] = Some(entry);
            idx
        } else {
            self.entries.push(Some(entry));
            (self.entries.len() - 1) as u32
        };

        if self.top != INVALID {
            if let Some(old_top) = self.entries[self.top as usize].as_mut() {
                old_top.upper = idx;
            }
        } else {
            self.bottom = idx;
        }
        self.top = idx;
        self.len += 1;
        EntryId(idx)
    }

    /// Unlinks `entry`, returning its key.
    pub fn remove(&mut self, entry: EntryId) -> Option<K> {
        let removed = self.entries.get_mut(entry.0 as usize)?.take()?;

        if removed.upper != INVALID {
            if let Some(upper) = self.entries[removed.upper as usize].as_mut() {
                upper.lower = removed.lower;
            }
        } else {
            // Was the top entry.
            self.top = removed.lower;
        }

        if removed.lower != INVALID {
            if let Some(lower) = self.entries[removed.lower as usize].as_mut() {
                lower.upper = removed.upper;
            }
        } else {
            // Was the bottom entry.
            self.bottom = removed.upper;
        }

        self.free_list.push(entry.0);
        self.len -= 1;
        Some(removed.key)
    }

    fn entry(&self, entry: EntryId) -> Option<&Entry<K>> {
        self.entries.get(entry.0 as usize)?.as_ref()
    }
}

impl<K: Copy> LayerStack<K> {
    /// The key stored in `entry`.
    #[must_use]
    pub fn key(&self, entry: EntryId) -> Option<K> {
        self.entry(entry).map(|e| e.key)
    }
}

impl<K: PartialEq> LayerStack<K> {
    /// Finds the entry holding `key`, scanning from the top.
    #[must_use]
    pub fn find(&self, key: &K) -> Option<EntryId> {
        let mut current = self.top;
        while current != INVALID {
            let e = self.entries[current as usize].as_ref()?;
            if e.key == *key {
                return Some(EntryId(current));
            }
            current = e.lower;
        }
        None
    }
}

fn link(idx: u32) -> Option<EntryId> {
    (idx != INVALID).then_some(EntryId(idx))
}

#[derive(Clone, Copy, Debug)]
enum Direction {
    Up,
    Down,
}

/// Iterator over stack entries in one direction.
///
/// Created by [`LayerStack::top_down`], [`LayerStack::bottom_up`],
/// [`LayerStack::above`] and [`LayerStack::below`].
#[derive(Debug)]
pub struct Walk<'a, K> {
    stack: &'a LayerStack<K>,
    current: u32,
    direction: Direction,
}

impl<'a, K> Walk<'a, K> {
    fn new(stack: &'a LayerStack<K>, start: u32, direction: Direction) -> Self {
        Self {
            stack,
            current: start,
            direction,
        }
    }
}

impl<K: Copy> Iterator for Walk<'_, K> {
    type Item = (EntryId, K);

    fn next(&mut self) -> Option<(EntryId, K)> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        let e = self.stack.entries[idx as usize].as_ref()?;
        self.current = match self.direction {
            Direction::Up => e.upper,
            Direction::Down => e.lower,
        };
        Some((EntryId(idx), e.key))
    }
}
