/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::ops::Index;

use crate::{Move, MAX_DEPTH};

/// Quiet moves that caused a beta cutoff, two per ply.
///
/// A move that refuted one line is likely to refute its siblings, so these are searched right after captures.
/// See [CPW](https://www.chessprogramming.org/Killer_Heuristic).
#[derive(Debug, Clone)]
pub struct KillerTable(Box<[[Option<Move>; 2]; MAX_DEPTH]>);

impl KillerTable {
    /// Forget every killer move.
    #[inline(always)]
    pub fn clear(&mut self) {
        self.0.fill([None; 2]);
    }

    /// Record `mv` as the newest killer at `ply`, demoting the previous one.
    ///
    /// Captures and promotions are ordered by other means and are ignored,
    /// as is a move that is already the first killer.
    #[inline(always)]
    pub fn update(&mut self, mv: Move, ply: usize) {
        if !mv.is_quiet() || mv.is_promotion() {
            return;
        }

        let Some(killers) = self.0.get_mut(ply) else {
            return;
        };

        if killers[0] != Some(mv) {
            killers[1] = killers[0];
            killers[0] = Some(mv);
        }
    }
}

impl Default for KillerTable {
    #[inline(always)]
    fn default() -> Self {
        Self(Box::new([[None; 2]; MAX_DEPTH]))
    }
}

impl Index<usize> for KillerTable {
    type Output = [Option<Move>; 2];

    /// Killers at `ply`. Plies beyond the table have none.
    #[inline(always)]
    fn index(&self, ply: usize) -> &Self::Output {
        self.0.get(ply).unwrap_or(&[None; 2])
    }
}
