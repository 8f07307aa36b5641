/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    ops::{Index, IndexMut},
    str::FromStr,
};

use super::Bitboard;
use crate::PositionError;

/// Represents the color of a player, piece, square, etc. within a chess board.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[repr(u8)]
pub enum Color {
    #[default]
    White,
    Black,
}

impl Color {
    /// Number of color variants.
    pub const COUNT: usize = 2;

    /// Both colors, White first.
    #[inline(always)]
    pub const fn all() -> [Self; Self::COUNT] {
        [Self::White, Self::Black]
    }

    /// Creates a new [`Color`] from a bool, where `false` is White.
    #[inline(always)]
    pub const fn from_bool(color: bool) -> Self {
        if color {
            Self::Black
        } else {
            Self::White
        }
    }

    /// Creates a [`Color`] from its FEN character (`w` or `b`).
    pub fn from_char(color: char) -> Result<Self, PositionError> {
        match color {
            'w' | 'W' => Ok(Self::White),
            'b' | 'B' => Ok(Self::Black),
            _ => Err(PositionError::InvalidColor(color.to_string())),
        }
    }

    /// Returns `true` if this [`Color`] is White.
    #[inline(always)]
    pub const fn is_white(&self) -> bool {
        matches!(self, Self::White)
    }

    /// Returns `true` if this [`Color`] is Black.
    #[inline(always)]
    pub const fn is_black(&self) -> bool {
        matches!(self, Self::Black)
    }

    /// Returns this [`Color`]'s opposite / inverse / enemy.
    #[inline(always)]
    pub const fn opponent(&self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    /// Returns `1` for White and `-1` for Black.
    #[inline(always)]
    pub const fn negation_multiplier(&self) -> i32 {
        match self {
            Self::White => 1,
            Self::Black => -1,
        }
    }

    /// Index of this color, for use in lookup tables.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// FEN character of this color.
    #[inline(always)]
    pub const fn char(&self) -> char {
        match self {
            Self::White => 'w',
            Self::Black => 'b',
        }
    }

    /// Human-readable name of this color.
    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Black => "black",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

impl<T> Index<Color> for [T; Color::COUNT] {
    type Output = T;
    #[inline(always)]
    fn index(&self, index: Color) -> &Self::Output {
        &self[index.index()]
    }
}

impl<T> IndexMut<Color> for [T; Color::COUNT] {
    #[inline(always)]
    fn index_mut(&mut self, index: Color) -> &mut Self::Output {
        &mut self[index.index()]
    }
}

/// A vertical column on the board, `a` through `h`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[repr(transparent)]
pub struct File(u8);

impl File {
    pub const A: Self = Self(0);
    pub const B: Self = Self(1);
    pub const C: Self = Self(2);
    pub const D: Self = Self(3);
    pub const E: Self = Self(4);
    pub const F: Self = Self(5);
    pub const G: Self = Self(6);
    pub const H: Self = Self(7);

    pub const COUNT: usize = 8;

    /// Creates a [`File`] from `0..8`, without bounds checking.
    #[inline(always)]
    pub const fn new_unchecked(file: u8) -> Self {
        Self(file)
    }

    /// Creates a [`File`] from its character, `a` through `h`.
    pub fn from_char(file: char) -> Result<Self, PositionError> {
        match file {
            'a'..='h' => Ok(Self(file as u8 - b'a')),
            _ => Err(PositionError::InvalidSquare(file.to_string())),
        }
    }

    /// An iterator over all files, `a` through `h`.
    #[inline(always)]
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> {
        (0..Self::COUNT as u8).map(Self)
    }

    #[inline(always)]
    pub const fn inner(&self) -> u8 {
        self.0
    }

    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    #[inline(always)]
    pub const fn char(&self) -> char {
        (b'a' + self.0) as char
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

/// A horizontal row on the board, `1` through `8`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[repr(transparent)]
pub struct Rank(u8);

impl Rank {
    pub const ONE: Self = Self(0);
    pub const TWO: Self = Self(1);
    pub const THREE: Self = Self(2);
    pub const FOUR: Self = Self(3);
    pub const FIVE: Self = Self(4);
    pub const SIX: Self = Self(5);
    pub const SEVEN: Self = Self(6);
    pub const EIGHT: Self = Self(7);

    pub const COUNT: usize = 8;

    /// Creates a [`Rank`] from `0..8`, without bounds checking.
    #[inline(always)]
    pub const fn new_unchecked(rank: u8) -> Self {
        Self(rank)
    }

    /// Creates a [`Rank`] from its character, `1` through `8`.
    pub fn from_char(rank: char) -> Result<Self, PositionError> {
        match rank {
            '1'..='8' => Ok(Self(rank as u8 - b'1')),
            _ => Err(PositionError::InvalidSquare(rank.to_string())),
        }
    }

    /// The rank a `color` Pawn starts on.
    #[inline(always)]
    pub const fn second(color: Color) -> Self {
        match color {
            Color::White => Self::TWO,
            Color::Black => Self::SEVEN,
        }
    }

    /// The rank a `color` Pawn promotes on.
    #[inline(always)]
    pub const fn eighth(color: Color) -> Self {
        match color {
            Color::White => Self::EIGHT,
            Color::Black => Self::ONE,
        }
    }

    /// An iterator over all ranks, `1` through `8`.
    #[inline(always)]
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> {
        (0..Self::COUNT as u8).map(Self)
    }

    #[inline(always)]
    pub const fn inner(&self) -> u8 {
        self.0
    }

    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    #[inline(always)]
    pub const fn char(&self) -> char {
        (b'1' + self.0) as char
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

/// Declares a named constant for every square on the board.
macro_rules! square_consts {
    ($($name:ident = $file:ident $rank:ident),* $(,)?) => {
        impl Square {
            $(pub const $name: Self = Self::new(File::$file, Rank::$rank);)*
        }
    };
}

/// Represents a single square on an `8x8` chess board.
///
/// Squares are indexed little-endian rank-file: `a1` is `0`, `h1` is `7`, and `h8` is `63`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[repr(transparent)]
pub struct Square(pub(crate) u8);

square_consts!(
    A1 = A ONE, B1 = B ONE, C1 = C ONE, D1 = D ONE, E1 = E ONE, F1 = F ONE, G1 = G ONE, H1 = H ONE,
    A2 = A TWO, B2 = B TWO, C2 = C TWO, D2 = D TWO, E2 = E TWO, F2 = F TWO, G2 = G TWO, H2 = H TWO,
    A3 = A THREE, B3 = B THREE, C3 = C THREE, D3 = D THREE, E3 = E THREE, F3 = F THREE, G3 = G THREE, H3 = H THREE,
    A4 = A FOUR, B4 = B FOUR, C4 = C FOUR, D4 = D FOUR, E4 = E FOUR, F4 = F FOUR, G4 = G FOUR, H4 = H FOUR,
    A5 = A FIVE, B5 = B FIVE, C5 = C FIVE, D5 = D FIVE, E5 = E FIVE, F5 = F FIVE, G5 = G FIVE, H5 = H FIVE,
    A6 = A SIX, B6 = B SIX, C6 = C SIX, D6 = D SIX, E6 = E SIX, F6 = F SIX, G6 = G SIX, H6 = H SIX,
    A7 = A SEVEN, B7 = B SEVEN, C7 = C SEVEN, D7 = D SEVEN, E7 = E SEVEN, F7 = F SEVEN, G7 = G SEVEN, H7 = H SEVEN,
    A8 = A EIGHT, B8 = B EIGHT, C8 = C EIGHT, D8 = D EIGHT, E8 = E EIGHT, F8 = F EIGHT, G8 = G EIGHT, H8 = H EIGHT,
);

impl Square {
    pub const COUNT: usize = 64;

    /// Creates a new [`Square`] from the provided [`File`] and [`Rank`].
    #[inline(always)]
    pub const fn new(file: File, rank: Rank) -> Self {
        Self(rank.0 << 3 | file.0)
    }

    /// Creates a [`Square`] from an index in `0..64`, without bounds checking.
    #[inline(always)]
    pub const fn from_index_unchecked(index: usize) -> Self {
        Self(index as u8)
    }

    /// Creates a [`Square`] from an index, failing if it is not in `0..64`.
    #[inline(always)]
    pub fn from_index(index: usize) -> Option<Self> {
        (index < Self::COUNT).then_some(Self(index as u8))
    }

    /// An iterator over all squares, `a1` through `h8`.
    #[inline(always)]
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> + ExactSizeIterator {
        (0..Self::COUNT).map(Self::from_index_unchecked)
    }

    /// Parses a [`Square`] from coordinate notation, like `e4`.
    pub fn from_uci(square: &str) -> Result<Self, PositionError> {
        let mut chars = square.chars();
        let (Some(file), Some(rank), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(PositionError::InvalidSquare(square.to_string()));
        };

        Ok(Self::new(File::from_char(file)?, Rank::from_char(rank)?))
    }

    #[inline(always)]
    pub const fn inner(&self) -> u8 {
        self.0
    }

    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    #[inline(always)]
    pub const fn file(&self) -> File {
        File(self.0 & 7)
    }

    #[inline(always)]
    pub const fn rank(&self) -> Rank {
        Rank(self.0 >> 3)
    }

    /// Flips this square vertically, so `a1` becomes `a8`.
    #[inline(always)]
    pub const fn flipped(self) -> Self {
        Self(self.0 ^ 56)
    }

    /// Returns this square as seen from `color`'s side of the board.
    ///
    /// White squares are unchanged; Black squares are flipped vertically.
    #[inline(always)]
    pub const fn rank_relative_to(self, color: Color) -> Self {
        match color {
            Color::White => self,
            Color::Black => self.flipped(),
        }
    }

    /// Fetches a [`Bitboard`] with only this square set.
    #[inline(always)]
    pub const fn bitboard(&self) -> Bitboard {
        Bitboard::from_square(*self)
    }

    /// Shifts this square by the provided deltas, returning `None` if it would leave the board.
    #[inline(always)]
    pub const fn offset(&self, file_delta: i8, rank_delta: i8) -> Option<Self> {
        let file = self.file().0 as i8 + file_delta;
        let rank = self.rank().0 as i8 + rank_delta;

        if file < 0 || file > 7 || rank < 0 || rank > 7 {
            None
        } else {
            Some(Self::new(File(file as u8), Rank(rank as u8)))
        }
    }

    /// Shifts this square forward (relative to `color`) by `n` ranks.
    #[inline(always)]
    pub const fn forward_by(&self, color: Color, n: i8) -> Option<Self> {
        match color {
            Color::White => self.offset(0, n),
            Color::Black => self.offset(0, -n),
        }
    }

    /// Shifts this square backward (relative to `color`) by `n` ranks.
    #[inline(always)]
    pub const fn backward_by(&self, color: Color, n: i8) -> Option<Self> {
        self.forward_by(color, -n)
    }
}

impl FromStr for Square {
    type Err = PositionError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_uci(s)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file(), self.rank())
    }
}

impl<T> Index<Square> for [T; Square::COUNT] {
    type Output = T;
    #[inline(always)]
    fn index(&self, index: Square) -> &Self::Output {
        &self[index.index()]
    }
}

impl<T> IndexMut<Square> for [T; Square::COUNT] {
    #[inline(always)]
    fn index_mut(&mut self, index: Square) -> &mut Self::Output {
        &mut self[index.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_layout() {
        assert_eq!(Square::A1.index(), 0);
        assert_eq!(Square::H1.index(), 7);
        assert_eq!(Square::A8.index(), 56);
        assert_eq!(Square::H8.index(), 63);
        assert_eq!(Square::E4.file(), File::E);
        assert_eq!(Square::E4.rank(), Rank::FOUR);
    }

    #[test]
    fn test_square_parsing() {
        assert_eq!(Square::from_uci("e4"), Ok(Square::E4));
        assert_eq!("h8".parse(), Ok(Square::H8));
        assert!(Square::from_uci("i1").is_err());
        assert!(Square::from_uci("a9").is_err());
        assert!(Square::from_uci("a").is_err());
        assert!(Square::from_uci("a11").is_err());
        assert_eq!(Square::G7.to_string(), "g7");
    }

    #[test]
    fn test_square_offsets() {
        assert_eq!(Square::A1.offset(1, 2), Some(Square::B3));
        assert_eq!(Square::A1.offset(-1, 0), None);
        assert_eq!(Square::H8.offset(0, 1), None);
        assert_eq!(Square::E2.forward_by(Color::White, 2), Some(Square::E4));
        assert_eq!(Square::E7.forward_by(Color::Black, 2), Some(Square::E5));
        assert_eq!(Square::E3.backward_by(Color::White, 1), Some(Square::E2));
        assert_eq!(Square::C2.rank_relative_to(Color::Black), Square::C7);
    }
}
