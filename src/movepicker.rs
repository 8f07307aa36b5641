/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use arrayvec::ArrayVec;

use crate::{tune, Game, Move, MoveList, PieceKind, MAX_NUM_MOVES};

/// This table represents values for [MVV-LVA](https://www.chessprogramming.org/MVV-LVA) move ordering.
///
/// It is indexed by `[victim][attacker]`, and yields a "score" that is used when sorting moves.
///
/// ```text
///                   ATTACKER
/// V       P   N   B   R   Q   K
/// I    +-------------------------+
/// C   P| 15  14  13  12  11  10
/// T   N| 25  24  23  22  21  20
/// I   B| 35  34  33  32  31  30
/// M   R| 45  44  43  42  41  40
///     Q| 55  54  53  52  51  50
///     K|  0   0   0   0   0   0
/// ```
pub const MVV_LVA: [[i32; PieceKind::COUNT]; PieceKind::COUNT] = {
    let mut matrix = [[0; PieceKind::COUNT]; PieceKind::COUNT];

    // The King can never be captured, so its row stays empty
    let mut victim = 0;
    while victim < PieceKind::COUNT - 1 {
        let mut attacker = 0;
        while attacker < PieceKind::COUNT {
            matrix[victim][attacker] = 10 * (victim as i32 + 1) + 5 - attacker as i32;
            attacker += 1;
        }
        victim += 1;
    }
    matrix
};

/// Assigns an ordering score to a move.
///
/// Every capture and preferred move sorts above every quiet, since MVV-LVA scores are offset by [`tune::mvv_lva_offset`].
#[derive(Debug, Clone, Copy)]
pub struct MoveScorer<'a> {
    game: &'a Game,

    /// Hash or PV move, searched first.
    preferred: Option<Move>,

    /// Killer moves at the current ply.
    killers: [Option<Move>; 2],
}

impl<'a> MoveScorer<'a> {
    #[inline(always)]
    pub fn new(game: &'a Game, preferred: Option<Move>, killers: [Option<Move>; 2]) -> Self {
        Self {
            game,
            preferred,
            killers,
        }
    }

    /// Score of `mv`. Higher is searched sooner.
    #[inline(always)]
    pub fn score(&self, mv: Move) -> i32 {
        let offset = tune::mvv_lva_offset!();

        if self.preferred == Some(mv) {
            offset + tune::preferred_move_bonus!()
        } else if mv.is_capture() {
            // En passant is the only capture with an empty destination, and it always takes a Pawn
            let victim = self
                .game
                .piece_at(mv.to())
                .map_or(PieceKind::Pawn, |piece| piece.kind());
            let attacker = self
                .game
                .piece_at(mv.from())
                .map_or(PieceKind::Pawn, |piece| piece.kind());

            offset + MVV_LVA[victim][attacker]
        } else if self.killers[0] == Some(mv) {
            offset - tune::killer_penalties!()[0]
        } else if self.killers[1] == Some(mv) {
            offset - tune::killer_penalties!()[1]
        } else {
            0
        }
    }
}

/// Yields moves from best to worst score, sorting lazily.
///
/// Each call to [`Iterator::next`] swaps the best remaining move into place,
/// so a node that cuts off early never pays to sort the whole list.
pub struct MovePicker {
    moves: MoveList,
    scores: ArrayVec<i32, MAX_NUM_MOVES>,
    current: usize,
}

impl MovePicker {
    pub fn new(moves: MoveList, score_fn: impl Fn(Move) -> i32) -> Self {
        let scores = moves.iter().map(|&mv| score_fn(mv)).collect();

        Self {
            moves,
            scores,
            current: 0,
        }
    }
}

impl Iterator for MovePicker {
    type Item = (Move, i32);

    fn next(&mut self) -> Option<Self::Item> {
        // No more moves left
        if self.current >= self.moves.len() {
            return None;
        }

        // Fetch the current best
        let mut best_index = self.current;
        let mut best_score = self.scores[best_index];

        // Find the index of the next highest score
        for i in (self.current + 1)..self.moves.len() {
            if self.scores[i] > best_score {
                best_index = i;
                best_score = self.scores[i];
            }
        }

        // Swap, if necessary
        if best_index != self.current {
            self.moves.swap(self.current, best_index);
            self.scores.swap(self.current, best_index);
        }

        let mv = self.moves[self.current];
        let score = self.scores[self.current];

        self.current += 1;

        Some((mv, score))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.moves.len() - self.current;
        (remaining, Some(remaining))
    }
}
