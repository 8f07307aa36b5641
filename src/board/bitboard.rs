/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, ops::Not};

use super::{Color, File, Rank, Square};

/// A [bitboard](https://www.chessprogramming.org/Bitboards): one bit per square of the board.
///
/// Bit `n` corresponds to the [`Square`] with index `n`, so `a1` is the least significant bit.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Bitboard(pub(crate) u64);

impl Bitboard {
    pub const FILE_A: Self = Self(0x0101010101010101);
    pub const FILE_H: Self = Self(0x8080808080808080);
    pub const NOT_FILE_A: Self = Self(0xfefefefefefefefe);
    pub const NOT_FILE_H: Self = Self(0x7f7f7f7f7f7f7f7f);
    pub const RANK_1: Self = Self(0x00000000000000FF);
    pub const RANK_2: Self = Self(0x000000000000FF00);
    pub const RANK_3: Self = Self(0x0000000000FF0000);
    pub const RANK_4: Self = Self(0x00000000FF000000);
    pub const RANK_5: Self = Self(0x000000FF00000000);
    pub const RANK_6: Self = Self(0x0000FF0000000000);
    pub const RANK_7: Self = Self(0x00FF000000000000);
    pub const RANK_8: Self = Self(0xFF00000000000000);
    pub const EMPTY_BOARD: Self = Self(0);
    pub const FULL_BOARD: Self = Self(u64::MAX);

    #[inline(always)]
    pub const fn new(bits: u64) -> Self {
        Self(bits)
    }

    #[inline(always)]
    pub const fn from_square(square: Square) -> Self {
        Self(1 << square.index())
    }

    #[inline(always)]
    pub const fn from_file(file: File) -> Self {
        Self(Self::FILE_A.0 << file.inner())
    }

    #[inline(always)]
    pub const fn from_rank(rank: Rank) -> Self {
        Self(Self::RANK_1.0 << (rank.inner() * 8))
    }

    /// The rank that `color`'s Pawns reach after a double push from their starting rank.
    #[inline(always)]
    pub const fn fourth_rank(color: Color) -> Self {
        match color {
            Color::White => Self::RANK_4,
            Color::Black => Self::RANK_5,
        }
    }

    /// The rank that `color`'s Pawns promote on.
    #[inline(always)]
    pub const fn eighth_rank(color: Color) -> Self {
        match color {
            Color::White => Self::RANK_8,
            Color::Black => Self::RANK_1,
        }
    }

    #[inline(always)]
    pub const fn inner(&self) -> u64 {
        self.0
    }

    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[inline(always)]
    pub const fn is_nonempty(&self) -> bool {
        self.0 != 0
    }

    /// Returns `true` if more than one bit is set.
    #[inline(always)]
    pub const fn has_many(&self) -> bool {
        self.0 & self.0.wrapping_sub(1) != 0
    }

    #[inline(always)]
    pub const fn population(&self) -> u8 {
        self.0.count_ones() as u8
    }

    #[inline(always)]
    pub const fn contains(&self, square: Square) -> bool {
        self.0 & (1 << square.index()) != 0
    }

    #[inline(always)]
    pub const fn intersects(&self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[inline(always)]
    pub fn set(&mut self, square: Square) {
        self.0 |= 1 << square.index();
    }

    #[inline(always)]
    pub fn clear(&mut self, square: Square) {
        self.0 &= !(1 << square.index());
    }

    /// The lowest set square, if any.
    #[inline(always)]
    pub const fn lsb(&self) -> Option<Square> {
        if self.is_empty() {
            None
        } else {
            Some(Square::from_index_unchecked(self.0.trailing_zeros() as usize))
        }
    }

    /// The lowest set square. The result is meaningless for an empty board.
    #[inline(always)]
    pub const fn to_square_unchecked(&self) -> Square {
        Square::from_index_unchecked(self.0.trailing_zeros() as usize & 63)
    }

    /// Removes and returns the lowest set square, if any.
    #[inline(always)]
    pub fn pop_lsb(&mut self) -> Option<Square> {
        let square = self.lsb()?;
        self.0 &= self.0 - 1;
        Some(square)
    }

    #[inline(always)]
    pub const fn iter(&self) -> BitboardIter {
        BitboardIter { bitboard: *self }
    }

    /// An iterator over every subset of this board, starting with the empty set.
    #[inline(always)]
    pub const fn subsets(&self) -> BitboardSubsetIter {
        BitboardSubsetIter {
            bitboard: *self,
            subset: Self::EMPTY_BOARD,
            remaining: 1 << self.population(),
        }
    }

    /// Shifts every bit `n` ranks towards `color`'s promotion rank. Bits shifted off the board are lost.
    #[inline(always)]
    pub const fn forward_by(self, color: Color, n: u32) -> Self {
        match color {
            Color::White => Self(self.0 << (8 * n)),
            Color::Black => Self(self.0 >> (8 * n)),
        }
    }

    /// Shifts every bit `n` ranks towards `color`'s back rank. Bits shifted off the board are lost.
    #[inline(always)]
    pub const fn backward_by(self, color: Color, n: u32) -> Self {
        self.forward_by(color.opponent(), n)
    }

    #[inline(always)]
    pub const fn east(self) -> Self {
        Self((self.0 << 1) & Self::NOT_FILE_A.0)
    }

    #[inline(always)]
    pub const fn west(self) -> Self {
        Self((self.0 >> 1) & Self::NOT_FILE_H.0)
    }

    #[inline(always)]
    pub const fn and(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    #[inline(always)]
    pub const fn or(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline(always)]
    pub const fn xor(self, other: Self) -> Self {
        Self(self.0 ^ other.0)
    }

    #[inline(always)]
    pub const fn not(self) -> Self {
        Self(!self.0)
    }
}

macro_rules! impl_bitwise_op {
    ($op:tt, $op_assign:tt, $func:ident, $func_assign:ident) => {
        impl<T> std::ops::$op<T> for Bitboard
        where
            Self: From<T>,
        {
            type Output = Self;
            #[inline(always)]
            fn $func(self, rhs: T) -> Self::Output {
                Self(self.0.$func(Self::from(rhs).0))
            }
        }

        impl<T> std::ops::$op_assign<T> for Bitboard
        where
            Self: From<T>,
        {
            #[inline(always)]
            fn $func_assign(&mut self, rhs: T) {
                self.0.$func_assign(Self::from(rhs).0);
            }
        }
    };
}

impl_bitwise_op!(BitAnd, BitAndAssign, bitand, bitand_assign);
impl_bitwise_op!(BitOr, BitOrAssign, bitor, bitor_assign);
impl_bitwise_op!(BitXor, BitXorAssign, bitxor, bitxor_assign);

impl Not for Bitboard {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}

impl From<Square> for Bitboard {
    #[inline(always)]
    fn from(value: Square) -> Self {
        Self::from_square(value)
    }
}

impl From<u64> for Bitboard {
    #[inline(always)]
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl FromIterator<Square> for Bitboard {
    fn from_iter<T: IntoIterator<Item = Square>>(iter: T) -> Self {
        iter.into_iter().fold(Self::EMPTY_BOARD, |bb, sq| bb | sq)
    }
}

impl fmt::UpperHex for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0>16X}", self.0)
    }
}

impl fmt::Debug for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            write!(f, "{rank}|")?;
            for file in File::iter() {
                let occupant = if self.contains(Square::new(file, rank)) {
                    'X'
                } else {
                    '.'
                };
                write!(f, " {occupant}")?;
            }
            writeln!(f)?;
        }
        write!(f, " +----------------\n   a b c d e f g h")
    }
}

/// An iterator over all set bits in a [`Bitboard`], lowest first.
pub struct BitboardIter {
    bitboard: Bitboard,
}

impl Iterator for BitboardIter {
    type Item = Square;
    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        self.bitboard.pop_lsb()
    }

    #[inline(always)]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let size = self.bitboard.population() as usize;
        (size, Some(size))
    }
}

impl ExactSizeIterator for BitboardIter {}

impl IntoIterator for Bitboard {
    type Item = Square;
    type IntoIter = BitboardIter;
    #[inline(always)]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over all subsets of a [`Bitboard`], via the
/// [Carry-Rippler](https://www.chessprogramming.org/Traversing_Subsets_of_a_Set#All_Subsets_of_any_Set) trick.
pub struct BitboardSubsetIter {
    bitboard: Bitboard,
    subset: Bitboard,
    remaining: usize,
}

impl Iterator for BitboardSubsetIter {
    type Item = Bitboard;
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let subset = self.subset;
        self.subset.0 = self.subset.0.wrapping_sub(self.bitboard.0) & self.bitboard.0;
        self.remaining -= 1;

        Some(subset)
    }

    #[inline(always)]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for BitboardSubsetIter {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shifts() {
        assert_eq!(Bitboard::RANK_4.forward_by(Color::White, 1), Bitboard::RANK_5);
        assert_eq!(Bitboard::RANK_4.forward_by(Color::Black, 1), Bitboard::RANK_3);
        assert_eq!(Bitboard::RANK_8.forward_by(Color::White, 1), Bitboard::EMPTY_BOARD);
        assert_eq!(Bitboard::FILE_H.east(), Bitboard::EMPTY_BOARD);
        assert_eq!(Bitboard::FILE_A.west(), Bitboard::EMPTY_BOARD);
        assert_eq!(Bitboard::FILE_A.east(), Bitboard::from_file(File::B));
    }

    #[test]
    fn test_iteration_is_ordered() {
        let bb = Bitboard::from_square(Square::H8) | Square::A1 | Square::E4;
        let squares = bb.iter().collect::<Vec<_>>();
        assert_eq!(squares, [Square::A1, Square::E4, Square::H8]);
        assert_eq!(bb.iter().len(), 3);
        assert!(bb.has_many());
        assert!(!Bitboard::from_square(Square::E4).has_many());
    }

    #[test]
    fn test_subsets_are_complete_and_distinct() {
        let mask = Bitboard::from_square(Square::B2) | Square::C3 | Square::G7;
        let subsets = mask.subsets().collect::<Vec<_>>();

        assert_eq!(subsets.len(), 8);
        assert_eq!(subsets[0], Bitboard::EMPTY_BOARD);
        for (i, a) in subsets.iter().enumerate() {
            assert_eq!(*a & !mask, Bitboard::EMPTY_BOARD);
            assert!(subsets[i + 1..].iter().all(|b| b != a));
        }
    }
}
