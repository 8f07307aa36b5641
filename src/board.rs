/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Bitboard type and its iterators.
mod bitboard;

/// Legal move generation on top of a [`Position`].
mod game;

/// Magic bitboards for sliding piece attacks.
mod magics;

/// Attack tables for leapers and precomputed rays.
mod movegen;

/// Compact 16-bit moves.
mod moves;

/// Move path enumeration, for testing move generation.
mod perft;

/// Pieces and their kinds.
mod piece;

/// Board state, FEN parsing, and making moves.
mod position;

/// Deterministic random numbers for Zobrist keys and magics.
mod prng;

/// Colors, files, ranks, and squares.
mod square;

/// Zobrist hashing.
mod zobrist;

pub use bitboard::*;
pub use game::*;
pub use magics::*;
pub use movegen::*;
pub use moves::*;
pub use perft::*;
pub use piece::*;
pub use position::*;
pub use prng::*;
pub use square::*;
pub use zobrist::*;
