/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use super::{Board, CastlingRights, Color, File, Piece, Square, XoShiRo};

/// Keys for [Zobrist hashing](https://www.chessprogramming.org/Zobrist_Hashing).
///
/// Generated at compile time from a fixed-seed [`XoShiRo`], so keys are stable between builds.
const ZOBRIST_TABLE: ZobristHashTable = ZobristHashTable::new();

/// A 64-bit hash of everything that distinguishes one position from another for search purposes:
/// piece placement, side to move, castling rights, and the en passant file.
///
/// Move counters are not part of the key.
#[derive(Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct ZobristKey(u64);

impl ZobristKey {
    /// Computes the key of `board` with the remaining position state, from scratch.
    ///
    /// The en passant file is only hashed if a `side_to_move` Pawn attacks `ep_square`.
    pub fn from_parts(
        board: &Board,
        ep_square: Option<Square>,
        castling_rights: CastlingRights,
        side_to_move: Color,
    ) -> Self {
        let mut key = Self::default();

        for (square, piece) in board.iter() {
            key.hash_piece(square, piece);
        }

        if let Some(ep) = ep_square.filter(|&ep| board.ep_is_capturable(ep, side_to_move)) {
            key.hash_ep_file(ep.file());
        }

        key.hash_castling_rights(castling_rights);

        if side_to_move.is_black() {
            key.toggle_side_to_move();
        }

        key
    }

    #[inline(always)]
    pub const fn inner(&self) -> u64 {
        self.0
    }

    /// Adds or removes `piece` on `square`.
    #[inline(always)]
    pub fn hash_piece(&mut self, square: Square, piece: Piece) {
        self.0 ^= ZOBRIST_TABLE.piece_keys[square.index()][piece.index()];
    }

    /// Adds or removes an en passant capture on `file`.
    #[inline(always)]
    pub fn hash_ep_file(&mut self, file: File) {
        self.0 ^= ZOBRIST_TABLE.ep_keys[file.index()];
    }

    /// Adds or removes the key for this exact set of castling rights.
    #[inline(always)]
    pub fn hash_castling_rights(&mut self, rights: CastlingRights) {
        self.0 ^= ZOBRIST_TABLE.castling_keys[rights.index()];
    }

    /// Flips between White and Black to move.
    #[inline(always)]
    pub fn toggle_side_to_move(&mut self) {
        self.0 ^= ZOBRIST_TABLE.black_to_move;
    }
}

impl fmt::Display for ZobristKey {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

struct ZobristHashTable {
    piece_keys: [[u64; Piece::COUNT]; Square::COUNT],
    ep_keys: [u64; File::COUNT],
    castling_keys: [u64; CastlingRights::COUNT],
    black_to_move: u64,
}

impl ZobristHashTable {
    const fn new() -> Self {
        let mut piece_keys = [[0; Piece::COUNT]; Square::COUNT];
        let mut ep_keys = [0; File::COUNT];
        let mut castling_keys = [0; CastlingRights::COUNT];

        let mut prng = XoShiRo::new();
        let mut key;

        let mut i = 0;
        while i < Square::COUNT {
            let mut j = 0;
            while j < Piece::COUNT {
                (key, prng) = prng.get_next_const();
                piece_keys[i][j] = key;
                j += 1;
            }
            i += 1;
        }

        i = 0;
        while i < File::COUNT {
            (key, prng) = prng.get_next_const();
            ep_keys[i] = key;
            i += 1;
        }

        // The empty set of rights hashes to zero, so a position without castling leaves the key untouched.
        i = 1;
        while i < CastlingRights::COUNT {
            (key, prng) = prng.get_next_const();
            castling_keys[i] = key;
            i += 1;
        }

        let (black_to_move, _) = prng.get_next_const();

        Self {
            piece_keys,
            ep_keys,
            castling_keys,
            black_to_move,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Position;

    fn key(fen: &str) -> ZobristKey {
        fen.parse::<Position>().unwrap().key()
    }

    #[test]
    fn test_key_components() {
        let base = key("r3k2r/pppp1ppp/8/8/4p3/8/PPPPPPPP/R3K2R w KQkq - 0 1");
        assert_ne!(base, key("r3k2r/pppp1ppp/8/8/4p3/8/PPPPPPPP/R3K2R b KQkq - 0 1"));
        assert_ne!(base, key("r3k2r/pppp1ppp/8/8/4p3/8/PPPPPPPP/R3K2R w KQq - 0 1"));
        assert_ne!(base, key("r3k2r/pppp1ppp/8/8/4p3/8/PPPPPPPP/R3K2R w - - 0 1"));

        // Counters are not hashed.
        assert_eq!(base, key("r3k2r/pppp1ppp/8/8/4p3/8/PPPPPPPP/R3K2R w KQkq - 37 60"));
    }

    #[test]
    fn test_ep_hashed_only_when_capturable() {
        // No Black Pawn can take on d3, so the EP square is irrelevant.
        assert_eq!(
            key("4k3/8/8/8/3P4/8/8/4K3 b - d3 0 1"),
            key("4k3/8/8/8/3P4/8/8/4K3 b - - 0 1")
        );

        // The e4 Pawn can take on d3, so it is not.
        assert_ne!(
            key("4k3/8/8/8/3Pp3/8/8/4K3 b - d3 0 1"),
            key("4k3/8/8/8/3Pp3/8/8/4K3 b - - 0 1")
        );
    }
}
