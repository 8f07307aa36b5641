/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::ops::{Deref, DerefMut};

use crate::ZobristKey;

/// Keys of every position between the start of the game and the node currently being searched.
///
/// A position whose key is already in here has occurred before, and is scored as a draw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepetitionHistory(Vec<ZobristKey>);

impl RepetitionHistory {
    #[inline(always)]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn push(&mut self, key: ZobristKey) {
        self.0.push(key);
    }

    #[inline(always)]
    pub fn pop(&mut self) -> Option<ZobristKey> {
        self.0.pop()
    }

    #[inline(always)]
    pub fn clear(&mut self) {
        self.0.clear();
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if `key` has been seen before.
    #[inline(always)]
    pub fn contains(&self, key: ZobristKey) -> bool {
        self.0.iter().rev().any(|&prev| prev == key)
    }
}

impl FromIterator<ZobristKey> for RepetitionHistory {
    fn from_iter<I: IntoIterator<Item = ZobristKey>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Keeps a key on a [`RepetitionHistory`] for as long as it is alive.
///
/// The key is pushed by [`PathGuard::new`] and popped on drop, so every exit from a
/// recursive search (including early returns) leaves the history as it found it.
/// The guard dereferences to whatever owns the history, so recursion continues through it.
pub struct PathGuard<'a, T: AsMut<RepetitionHistory>> {
    owner: &'a mut T,
}

impl<'a, T: AsMut<RepetitionHistory>> PathGuard<'a, T> {
    #[inline(always)]
    pub fn new(owner: &'a mut T, key: ZobristKey) -> Self {
        owner.as_mut().push(key);
        Self { owner }
    }
}

impl<T: AsMut<RepetitionHistory>> Deref for PathGuard<'_, T> {
    type Target = T;

    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        self.owner
    }
}

impl<T: AsMut<RepetitionHistory>> DerefMut for PathGuard<'_, T> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.owner
    }
}

impl<T: AsMut<RepetitionHistory>> Drop for PathGuard<'_, T> {
    #[inline(always)]
    fn drop(&mut self) {
        self.owner.as_mut().pop();
    }
}

impl AsMut<RepetitionHistory> for RepetitionHistory {
    #[inline(always)]
    fn as_mut(&mut self) -> &mut RepetitionHistory {
        self
    }
}
