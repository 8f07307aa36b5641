/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::{Bitboard, Color, Square, BISHOP_DELTAS, ROOK_DELTAS};

/// Deltas for the movement of the King.
const KING_DELTAS: [(i8, i8); 8] = [
    ROOK_DELTAS[0],
    ROOK_DELTAS[1],
    ROOK_DELTAS[2],
    ROOK_DELTAS[3],
    BISHOP_DELTAS[0],
    BISHOP_DELTAS[1],
    BISHOP_DELTAS[2],
    BISHOP_DELTAS[3],
];

/// Deltas for the movement of the Knight.
const KNIGHT_DELTAS: [(i8, i8); 8] = [
    (1, 2),
    (1, -2),
    (2, 1),
    (2, -1),
    (-1, 2),
    (-1, -2),
    (-2, 1),
    (-2, -1),
];

const KNIGHT_ATTACKS: [Bitboard; Square::COUNT] = generate_leaper_mobility(&KNIGHT_DELTAS);
const KING_ATTACKS: [Bitboard; Square::COUNT] = generate_leaper_mobility(&KING_DELTAS);
const PAWN_ATTACKS: [[Bitboard; Square::COUNT]; Color::COUNT] = [
    generate_pawn_attacks(Color::White),
    generate_pawn_attacks(Color::Black),
];

/// Squares strictly between two aligned squares, or empty if they share no line.
const RAY_BETWEEN: [[Bitboard; Square::COUNT]; Square::COUNT] = {
    let mut rays = [[Bitboard::EMPTY_BOARD; Square::COUNT]; Square::COUNT];

    let mut i = 0;
    while i < Square::COUNT {
        let from = Square::from_index_unchecked(i);
        let mut j = 0;
        while j < KING_DELTAS.len() {
            let (df, dr) = KING_DELTAS[j];
            let mut between = Bitboard::EMPTY_BOARD;
            let mut to = from;

            while let Some(next) = to.offset(df, dr) {
                rays[i][next.index()] = between;
                between = between.or(next.bitboard());
                to = next;
            }
            j += 1;
        }
        i += 1;
    }

    rays
};

/// The full line (edge to edge) through two aligned squares, or empty if they share no line.
const RAY_CONTAINING: [[Bitboard; Square::COUNT]; Square::COUNT] = {
    let mut rays = [[Bitboard::EMPTY_BOARD; Square::COUNT]; Square::COUNT];

    let mut i = 0;
    while i < Square::COUNT {
        let from = Square::from_index_unchecked(i);
        let mut j = 0;
        while j < KING_DELTAS.len() {
            let (df, dr) = KING_DELTAS[j];

            // The whole line is the ray in this direction, the opposite ray, and `from` itself.
            let line = ray_from(from, df, dr)
                .or(ray_from(from, -df, -dr))
                .or(from.bitboard());

            let mut to = from;
            while let Some(next) = to.offset(df, dr) {
                rays[i][next.index()] = line;
                to = next;
            }
            j += 1;
        }
        i += 1;
    }

    rays
};

/// All squares reachable from `square` by repeatedly stepping `(df, dr)` on an empty board.
const fn ray_from(square: Square, df: i8, dr: i8) -> Bitboard {
    let mut ray = Bitboard::EMPTY_BOARD;
    let mut current = square;
    while let Some(next) = current.offset(df, dr) {
        ray = ray.or(next.bitboard());
        current = next;
    }
    ray
}

/// Generates the moves from every square for a "leaper", a piece that jumps a fixed offset.
const fn generate_leaper_mobility(deltas: &[(i8, i8)]) -> [Bitboard; Square::COUNT] {
    let mut mobility = [Bitboard::EMPTY_BOARD; Square::COUNT];

    let mut i = 0;
    while i < Square::COUNT {
        let square = Square::from_index_unchecked(i);
        let mut j = 0;
        while j < deltas.len() {
            let (df, dr) = deltas[j];
            if let Some(shifted) = square.offset(df, dr) {
                mobility[i] = mobility[i].or(shifted.bitboard());
            }
            j += 1;
        }
        i += 1;
    }

    mobility
}

/// Pawns capture one square diagonally forward.
const fn generate_pawn_attacks(color: Color) -> [Bitboard; Square::COUNT] {
    let mut boards = [Bitboard::EMPTY_BOARD; Square::COUNT];
    let mut i = 0;
    while i < Square::COUNT {
        let forward = Square::from_index_unchecked(i)
            .bitboard()
            .forward_by(color, 1);
        boards[i] = forward.east().or(forward.west());
        i += 1;
    }
    boards
}

/// Squares strictly between `from` and `to`. Empty unless they share a rank, file, or diagonal.
///
/// ```
/// # use cerulean::*;
/// assert_eq!(ray_between(Square::A1, Square::A8), Bitboard::FILE_A ^ Square::A1 ^ Square::A8);
/// ```
#[inline(always)]
pub const fn ray_between(from: Square, to: Square) -> Bitboard {
    RAY_BETWEEN[from.index()][to.index()]
}

/// The entire line through `from` and `to`, edge to edge. Empty unless they share a rank, file, or diagonal.
///
/// ```
/// # use cerulean::*;
/// assert_eq!(ray_containing(Square::A3, Square::A5), Bitboard::FILE_A);
/// ```
#[inline(always)]
pub const fn ray_containing(from: Square, to: Square) -> Bitboard {
    RAY_CONTAINING[from.index()][to.index()]
}

#[inline(always)]
pub const fn knight_attacks(square: Square) -> Bitboard {
    KNIGHT_ATTACKS[square.index()]
}

#[inline(always)]
pub const fn king_attacks(square: Square) -> Bitboard {
    KING_ATTACKS[square.index()]
}

/// Squares a `color` Pawn on `square` attacks.
#[inline(always)]
pub const fn pawn_attacks(square: Square, color: Color) -> Bitboard {
    PAWN_ATTACKS[color.index()][square.index()]
}
