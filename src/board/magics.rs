/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! [Magic bitboards](https://www.chessprogramming.org/Magic_Bitboards) for sliding pieces.
//!
//! Magic numbers are searched for on first use with a fixed-seed [`XoShiRo`], so the tables are
//! identical on every run. Each square gets a "fancy" table slice of `2^bits` entries, where `bits`
//! is the number of relevant blocker squares.

use std::sync::LazyLock;

use super::{Bitboard, Square, XoShiRo};

/// Directions a Rook slides in, as `(file, rank)` deltas.
pub const ROOK_DELTAS: [(i8, i8); 4] = [(1, 0), (0, -1), (-1, 0), (0, 1)];

/// Directions a Bishop slides in, as `(file, rank)` deltas.
pub const BISHOP_DELTAS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];

static ROOK_TABLE: LazyLock<SliderTable> = LazyLock::new(|| SliderTable::new(&ROOK_DELTAS));
static BISHOP_TABLE: LazyLock<SliderTable> = LazyLock::new(|| SliderTable::new(&BISHOP_DELTAS));

/// Forces the magic tables to be built now, rather than during the first search.
pub fn init_magics() {
    LazyLock::force(&ROOK_TABLE);
    LazyLock::force(&BISHOP_TABLE);
}

/// Attacks of a Rook on `square`, stopping at (and including) the first blocker in each direction.
#[inline(always)]
pub fn rook_attacks(square: Square, blockers: Bitboard) -> Bitboard {
    ROOK_TABLE.attacks(square, blockers)
}

/// Attacks of a Bishop on `square`, stopping at (and including) the first blocker in each direction.
#[inline(always)]
pub fn bishop_attacks(square: Square, blockers: Bitboard) -> Bitboard {
    BISHOP_TABLE.attacks(square, blockers)
}

#[inline(always)]
pub fn queen_attacks(square: Square, blockers: Bitboard) -> Bitboard {
    rook_attacks(square, blockers) | bishop_attacks(square, blockers)
}

/// Slow, table-free computation of slider attacks by walking each ray until it hits a blocker.
///
/// Used to fill the magic tables and to verify them.
pub fn ray_walk_attacks(square: Square, blockers: Bitboard, deltas: &[(i8, i8)]) -> Bitboard {
    let mut attacks = Bitboard::EMPTY_BOARD;

    for &(df, dr) in deltas {
        let mut ray = square;
        while let Some(next) = ray.offset(df, dr) {
            attacks.set(next);
            if blockers.contains(next) {
                break;
            }
            ray = next;
        }
    }

    attacks
}

/// Squares whose occupancy affects a slider on `square`.
///
/// The last square of every ray is excluded, since a piece there cannot block anything further.
fn relevant_blockers(square: Square, deltas: &[(i8, i8)]) -> Bitboard {
    let mut mask = Bitboard::EMPTY_BOARD;

    for &(df, dr) in deltas {
        let mut ray = square;
        while let Some(next) = ray.offset(df, dr) {
            if next.offset(df, dr).is_none() {
                break;
            }
            mask.set(next);
            ray = next;
        }
    }

    mask
}

#[derive(Clone, Copy, Debug, Default)]
struct MagicEntry {
    mask: Bitboard,
    magic: u64,
    shift: u32,
    offset: usize,
}

impl MagicEntry {
    #[inline(always)]
    const fn index(&self, blockers: Bitboard) -> usize {
        let relevant = blockers.inner() & self.mask.inner();
        self.offset + (relevant.wrapping_mul(self.magic) >> self.shift) as usize
    }
}

/// Magic entries for one slider kind, plus the attack table they all index into.
struct SliderTable {
    entries: [MagicEntry; Square::COUNT],
    attacks: Vec<Bitboard>,
}

impl SliderTable {
    fn new(deltas: &[(i8, i8)]) -> Self {
        let mut rng = XoShiRo::new();
        let mut entries = [MagicEntry::default(); Square::COUNT];
        let mut attacks = Vec::new();

        for square in Square::iter() {
            let mask = relevant_blockers(square, deltas);
            let (magic, slice) = find_magic(square, mask, deltas, &mut rng);

            entries[square] = MagicEntry {
                mask,
                magic,
                shift: 64 - mask.population() as u32,
                offset: attacks.len(),
            };
            attacks.extend(slice);
        }

        Self { entries, attacks }
    }

    #[inline(always)]
    fn attacks(&self, square: Square, blockers: Bitboard) -> Bitboard {
        self.attacks[self.entries[square].index(blockers)]
    }
}

/// Searches for a magic number that maps every blocker subset of `mask` to a slot without destructive collisions.
///
/// Returns the magic and the filled table slice.
fn find_magic(
    square: Square,
    mask: Bitboard,
    deltas: &[(i8, i8)],
    rng: &mut XoShiRo,
) -> (u64, Vec<Bitboard>) {
    let bits = mask.population() as u32;
    let size = 1usize << bits;

    let occupancies = mask.subsets().collect::<Vec<_>>();
    let expected = occupancies
        .iter()
        .map(|&blockers| ray_walk_attacks(square, blockers, deltas))
        .collect::<Vec<_>>();

    let mut table = vec![Bitboard::EMPTY_BOARD; size];
    // Generation stamp per slot, so the table need not be cleared after each failed attempt.
    let mut stamps = vec![0u32; size];
    let mut attempt = 0;

    loop {
        let magic = rng.get_sparse();
        if (mask.inner().wrapping_mul(magic) >> 56).count_ones() < 6 {
            continue;
        }

        attempt += 1;
        let entry = MagicEntry {
            mask,
            magic,
            shift: 64 - bits,
            offset: 0,
        };

        let collides = occupancies.iter().zip(&expected).any(|(&blockers, &attacks)| {
            let index = entry.index(blockers);
            if stamps[index] != attempt {
                stamps[index] = attempt;
                table[index] = attacks;
                false
            } else {
                table[index] != attacks
            }
        });

        if !collides {
            return (magic, table);
        }
    }
}
