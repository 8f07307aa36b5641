/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::Game;

/// Counts the leaf nodes reachable in exactly `depth` plies.
///
/// This performs bulk counting: at depth 1 it returns the number of legal moves
/// rather than making each one and counting the children.
#[inline(always)]
pub fn perft(game: &Game, depth: usize) -> u64 {
    perft_generic::<true, false>(game, depth)
}

/// Like [`perft`], but prints the number of nodes under each root move as it goes.
#[inline(always)]
pub fn splitperft(game: &Game, depth: usize) -> u64 {
    perft_generic::<true, true>(game, depth)
}

/// Generic perft. `BULK` enables bulk counting at depth 1, and `SPLIT` prints the per-move counts at the root.
pub fn perft_generic<const BULK: bool, const SPLIT: bool>(game: &Game, depth: usize) -> u64 {
    if BULK && !SPLIT && depth == 1 {
        return game.get_legal_moves().len() as u64;
    } else if depth == 0 {
        return 1;
    }

    game.get_legal_moves().into_iter().fold(0, |nodes, mv| {
        let new_nodes = perft_generic::<BULK, false>(&game.with_move_made(mv), depth - 1);

        if SPLIT {
            println!("{mv}\t{new_nodes}");
        }

        nodes + new_nodes
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_counting_agrees() {
        let game = Game::default();
        for depth in 0..=3 {
            assert_eq!(
                perft(&game, depth),
                perft_generic::<false, false>(&game, depth)
            );
        }
    }
}
