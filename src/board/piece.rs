/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    ops::{Index, IndexMut},
};

use super::Color;
use crate::PositionError;

/// Represents the kind (or "role") that a chess piece can be.
///
/// These have no [`Color`] associated with them. See [`Piece`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[repr(u8)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Number of piece variants.
    pub const COUNT: usize = 6;

    /// All kinds, in the order `Pawn`, `Knight`, `Bishop`, `Rook`, `Queen`, `King`.
    #[inline(always)]
    pub const fn all() -> [Self; Self::COUNT] {
        use PieceKind::*;
        [Pawn, Knight, Bishop, Rook, Queen, King]
    }

    /// Kinds a Pawn may promote to, strongest first.
    #[inline(always)]
    pub const fn promotions() -> [Self; 4] {
        use PieceKind::*;
        [Queen, Rook, Bishop, Knight]
    }

    /// Creates a [`PieceKind`] from `0..6`.
    #[inline(always)]
    pub const fn from_index(index: usize) -> Option<Self> {
        use PieceKind::*;
        match index {
            0 => Some(Pawn),
            1 => Some(Knight),
            2 => Some(Bishop),
            3 => Some(Rook),
            4 => Some(Queen),
            5 => Some(King),
            _ => None,
        }
    }

    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Parses a [`PieceKind`] from its case-insensitive FEN letter.
    pub fn from_char(kind: char) -> Result<Self, PositionError> {
        use PieceKind::*;
        match kind.to_ascii_lowercase() {
            'p' => Ok(Pawn),
            'n' => Ok(Knight),
            'b' => Ok(Bishop),
            'r' => Ok(Rook),
            'q' => Ok(Queen),
            'k' => Ok(King),
            _ => Err(PositionError::InvalidPiece(kind)),
        }
    }

    /// Lowercase FEN letter of this kind.
    #[inline(always)]
    pub const fn char(&self) -> char {
        use PieceKind::*;
        match self {
            Pawn => 'p',
            Knight => 'n',
            Bishop => 'b',
            Rook => 'r',
            Queen => 'q',
            King => 'k',
        }
    }

    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        use PieceKind::*;
        match self {
            Pawn => "pawn",
            Knight => "knight",
            Bishop => "bishop",
            Rook => "rook",
            Queen => "queen",
            King => "king",
        }
    }

    #[inline(always)]
    pub const fn is_pawn(&self) -> bool {
        matches!(self, Self::Pawn)
    }

    #[inline(always)]
    pub const fn is_king(&self) -> bool {
        matches!(self, Self::King)
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

impl<T> Index<PieceKind> for [T; PieceKind::COUNT] {
    type Output = T;
    #[inline(always)]
    fn index(&self, index: PieceKind) -> &Self::Output {
        &self[index.index()]
    }
}

impl<T> IndexMut<PieceKind> for [T; PieceKind::COUNT] {
    #[inline(always)]
    fn index_mut(&mut self, index: PieceKind) -> &mut Self::Output {
        &mut self[index.index()]
    }
}

/// A chess piece: a [`PieceKind`] that belongs to a [`Color`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Piece {
    color: Color,
    kind: PieceKind,
}

impl Piece {
    pub const COUNT: usize = Color::COUNT * PieceKind::COUNT;

    pub const WHITE_PAWN: Self = Self::new(Color::White, PieceKind::Pawn);
    pub const WHITE_KNIGHT: Self = Self::new(Color::White, PieceKind::Knight);
    pub const WHITE_BISHOP: Self = Self::new(Color::White, PieceKind::Bishop);
    pub const WHITE_ROOK: Self = Self::new(Color::White, PieceKind::Rook);
    pub const WHITE_QUEEN: Self = Self::new(Color::White, PieceKind::Queen);
    pub const WHITE_KING: Self = Self::new(Color::White, PieceKind::King);
    pub const BLACK_PAWN: Self = Self::new(Color::Black, PieceKind::Pawn);
    pub const BLACK_KNIGHT: Self = Self::new(Color::Black, PieceKind::Knight);
    pub const BLACK_BISHOP: Self = Self::new(Color::Black, PieceKind::Bishop);
    pub const BLACK_ROOK: Self = Self::new(Color::Black, PieceKind::Rook);
    pub const BLACK_QUEEN: Self = Self::new(Color::Black, PieceKind::Queen);
    pub const BLACK_KING: Self = Self::new(Color::Black, PieceKind::King);

    #[inline(always)]
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }

    /// All twelve pieces, White's first, ordered as in [`PieceKind::all`].
    pub fn all() -> impl Iterator<Item = Self> {
        Color::all()
            .into_iter()
            .flat_map(|color| PieceKind::all().map(move |kind| Self::new(color, kind)))
    }

    #[inline(always)]
    pub const fn color(&self) -> Color {
        self.color
    }

    #[inline(always)]
    pub const fn kind(&self) -> PieceKind {
        self.kind
    }

    /// Index in `0..12`: White pieces first, in [`PieceKind`] order.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.color.index() * PieceKind::COUNT + self.kind.index()
    }

    /// Parses a [`Piece`] from its FEN letter, where uppercase is White.
    pub fn from_char(piece: char) -> Result<Self, PositionError> {
        let kind = PieceKind::from_char(piece)?;
        Ok(Self::new(
            Color::from_bool(piece.is_ascii_lowercase()),
            kind,
        ))
    }

    /// FEN letter of this piece, uppercase for White.
    #[inline(always)]
    pub const fn char(&self) -> char {
        let c = self.kind.char();
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    /// This piece with its kind replaced by `kind`, as after a promotion.
    #[inline(always)]
    pub const fn promoted(self, kind: PieceKind) -> Self {
        Self::new(self.color, kind)
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_chars() {
        assert_eq!(Piece::from_char('Q'), Ok(Piece::WHITE_QUEEN));
        assert_eq!(Piece::from_char('n'), Ok(Piece::BLACK_KNIGHT));
        assert_eq!(Piece::from_char('x'), Err(PositionError::InvalidPiece('x')));
        assert_eq!(Piece::BLACK_KING.to_string(), "k");
        assert_eq!(Piece::WHITE_PAWN.to_string(), "P");
    }

    #[test]
    fn test_piece_indices_are_dense() {
        let indices = Piece::all().map(|p| p.index()).collect::<Vec<_>>();
        assert_eq!(indices, (0..Piece::COUNT).collect::<Vec<_>>());
    }
}
