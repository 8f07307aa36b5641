/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use super::{PieceKind, Position, Square};
use crate::MoveError;

/// Maximum possible number of moves in a given chess position.
///
/// Found [here](<https://www.chessprogramming.org/Chess_Position#cite_note-4>)
pub const MAX_NUM_MOVES: usize = 218;

/// An alias for an [`arrayvec::ArrayVec`] containing at most [`MAX_NUM_MOVES`] moves.
pub type MoveList = arrayvec::ArrayVec<Move, MAX_NUM_MOVES>;

/// The different kinds of moves, stored in the top four bits of a [`Move`].
///
/// Flag values follow the [chess programming wiki](https://www.chessprogramming.org/Encoding_Moves#From-To_Based):
/// bit 2 marks a capture and bit 3 marks a promotion.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[repr(u16)]
pub enum MoveKind {
    Quiet = 0,
    PawnDoublePush = 1,
    ShortCastle = 2,
    LongCastle = 3,
    Capture = 4,
    EnPassantCapture = 5,
    PromoteKnight = 8,
    PromoteBishop = 9,
    PromoteRook = 10,
    PromoteQueen = 11,
    CaptureAndPromoteKnight = 12,
    CaptureAndPromoteBishop = 13,
    CaptureAndPromoteRook = 14,
    CaptureAndPromoteQueen = 15,
}

impl MoveKind {
    const CAPTURE_BIT: u16 = 0b0100;
    const PROMOTION_BIT: u16 = 0b1000;

    /// Decodes the four flag bits of a move. Unused patterns (6 and 7) decode as [`MoveKind::Quiet`].
    #[inline(always)]
    const fn from_bits(bits: u16) -> Self {
        use MoveKind::*;
        match bits & 0xF {
            1 => PawnDoublePush,
            2 => ShortCastle,
            3 => LongCastle,
            4 => Capture,
            5 => EnPassantCapture,
            8 => PromoteKnight,
            9 => PromoteBishop,
            10 => PromoteRook,
            11 => PromoteQueen,
            12 => CaptureAndPromoteKnight,
            13 => CaptureAndPromoteBishop,
            14 => CaptureAndPromoteRook,
            15 => CaptureAndPromoteQueen,
            _ => Quiet,
        }
    }

    /// A promotion to `promotion`, capturing if `capture` is set.
    ///
    /// Kinds that cannot be promoted to yield a Queen promotion.
    #[inline(always)]
    pub const fn promotion(promotion: PieceKind, capture: bool) -> Self {
        let offset = match promotion {
            PieceKind::Knight => 0,
            PieceKind::Bishop => 1,
            PieceKind::Rook => 2,
            _ => 3,
        };
        let capture = if capture { Self::CAPTURE_BIT } else { 0 };
        Self::from_bits(Self::PROMOTION_BIT | capture | offset)
    }
}

/// A move, packed into 16 bits:
///
/// ```text
///     0000 000000 000000
///      |     |      |
///      |     |      +- Source square of the move.
///      |     +- Target square of the move.
///      +- MoveKind flags.
/// ```
///
/// Castling is encoded by the King's destination, so White's short castle is `e1g1`.
/// The all-zero move (`a1a1`) is never legal and doubles as "no move".
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Move(u16);

impl Move {
    const SRC_MASK: u16 = 0b0000_0000_0011_1111;
    const DST_MASK: u16 = 0b0000_1111_1100_0000;
    const DST_BITS: u16 = 6;
    const FLG_BITS: u16 = 12;

    /// The placeholder "no move", printed as `0000`.
    pub const NONE: Self = Self(0);

    #[inline(always)]
    pub const fn new(from: Square, to: Square, kind: MoveKind) -> Self {
        Self((kind as u16) << Self::FLG_BITS | (to.inner() as u16) << Self::DST_BITS | from.inner() as u16)
    }

    /// Reconstructs a move from its packed bits, as stored in the transposition table.
    #[inline(always)]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    #[inline(always)]
    pub const fn bits(&self) -> u16 {
        self.0
    }

    #[inline(always)]
    pub const fn is_none(&self) -> bool {
        self.0 == 0
    }

    #[inline(always)]
    pub const fn from(&self) -> Square {
        Square::from_index_unchecked((self.0 & Self::SRC_MASK) as usize)
    }

    #[inline(always)]
    pub const fn to(&self) -> Square {
        Square::from_index_unchecked(((self.0 & Self::DST_MASK) >> Self::DST_BITS) as usize)
    }

    #[inline(always)]
    pub const fn kind(&self) -> MoveKind {
        MoveKind::from_bits(self.0 >> Self::FLG_BITS)
    }

    #[inline(always)]
    const fn flags(&self) -> u16 {
        self.0 >> Self::FLG_BITS
    }

    /// Returns `true` for captures of any kind, including en passant and capture-promotions.
    #[inline(always)]
    pub const fn is_capture(&self) -> bool {
        self.flags() & MoveKind::CAPTURE_BIT != 0
    }

    /// Returns `true` for moves that neither capture nor promote.
    #[inline(always)]
    pub const fn is_quiet(&self) -> bool {
        self.flags() & (MoveKind::CAPTURE_BIT | MoveKind::PROMOTION_BIT) == 0
    }

    #[inline(always)]
    pub const fn is_en_passant(&self) -> bool {
        self.flags() == MoveKind::EnPassantCapture as u16
    }

    #[inline(always)]
    pub const fn is_pawn_double_push(&self) -> bool {
        self.flags() == MoveKind::PawnDoublePush as u16
    }

    #[inline(always)]
    pub const fn is_castle(&self) -> bool {
        matches!(self.kind(), MoveKind::ShortCastle | MoveKind::LongCastle)
    }

    #[inline(always)]
    pub const fn is_promotion(&self) -> bool {
        self.flags() & MoveKind::PROMOTION_BIT != 0
    }

    /// The kind this move promotes to, if any.
    #[inline(always)]
    pub const fn promotion(&self) -> Option<PieceKind> {
        if !self.is_promotion() {
            return None;
        }
        Some(match self.flags() & 0b11 {
            0 => PieceKind::Knight,
            1 => PieceKind::Bishop,
            2 => PieceKind::Rook,
            _ => PieceKind::Queen,
        })
    }

    /// Parses a move in UCI coordinate notation (`e2e4`, `e7e8q`), using `position` to infer its [`MoveKind`].
    ///
    /// This does not check legality. See [`crate::Game::is_legal`].
    pub fn from_uci(position: &Position, uci: &str) -> Result<Self, MoveError> {
        let invalid = || MoveError::InvalidFormat(uci.to_string());
        if !(4..=5).contains(&uci.len()) || !uci.is_ascii() {
            return Err(invalid());
        }

        let from = Square::from_uci(&uci[0..2]).map_err(|_| invalid())?;
        let to = Square::from_uci(&uci[2..4]).map_err(|_| invalid())?;
        let promotion = uci[4..]
            .chars()
            .next()
            .map(PieceKind::from_char)
            .transpose()
            .map_err(|_| invalid())?;
        if promotion.is_some_and(|kind| kind.is_pawn() || kind.is_king()) {
            return Err(invalid());
        }

        let piece = position
            .board()
            .piece_at(from)
            .ok_or(MoveError::NoPieceAt(from))?;
        let is_capture = position.board().piece_at(to).is_some();

        let kind = match piece.kind() {
            PieceKind::Pawn => {
                if let Some(promotion) = promotion {
                    MoveKind::promotion(promotion, is_capture)
                } else if position.ep_square() == Some(to) && from.file() != to.file() {
                    MoveKind::EnPassantCapture
                } else if from.rank().inner().abs_diff(to.rank().inner()) == 2 {
                    MoveKind::PawnDoublePush
                } else if is_capture {
                    MoveKind::Capture
                } else {
                    MoveKind::Quiet
                }
            }
            PieceKind::King if from.file().inner().abs_diff(to.file().inner()) == 2 => {
                if to.file() > from.file() {
                    MoveKind::ShortCastle
                } else {
                    MoveKind::LongCastle
                }
            }
            _ if is_capture => MoveKind::Capture,
            _ => MoveKind::Quiet,
        };

        Ok(Self::new(from, to, kind))
    }
}

impl fmt::Display for Move {
    /// Formats this move in UCI coordinate notation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return write!(f, "0000");
        }

        write!(f, "{}{}", self.from(), self.to())?;
        if let Some(promotion) = self.promotion() {
            write!(f, "{promotion}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self} ({:?})", self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_packing() {
        let mv = Move::new(Square::B7, Square::C8, MoveKind::promotion(PieceKind::Bishop, true));
        assert_eq!(mv.from(), Square::B7);
        assert_eq!(mv.to(), Square::C8);
        assert_eq!(mv.kind(), MoveKind::CaptureAndPromoteBishop);
        assert_eq!(mv.promotion(), Some(PieceKind::Bishop));
        assert!(mv.is_capture());
        assert!(!mv.is_quiet());
        assert_eq!(mv.to_string(), "b7c8b");
        assert_eq!(Move::from_bits(mv.bits()), mv);
    }

    #[test]
    fn test_move_tags() {
        let ep = Move::new(Square::E5, Square::D6, MoveKind::EnPassantCapture);
        assert!(ep.is_en_passant() && ep.is_capture() && !ep.is_promotion());

        let castle = Move::new(Square::E1, Square::G1, MoveKind::ShortCastle);
        assert!(castle.is_castle() && castle.is_quiet());

        let push = Move::new(Square::E2, Square::E4, MoveKind::PawnDoublePush);
        assert!(push.is_pawn_double_push() && push.is_quiet());

        assert_eq!(Move::NONE.to_string(), "0000");
    }

    #[test]
    fn test_move_from_uci() {
        let pos: Position = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/Pp2P3/2N2Q1p/1PPBBPPP/R3K2R b KQkq a3 0 1"
            .parse()
            .unwrap();

        let mv = Move::from_uci(&pos, "b4a3").unwrap();
        assert_eq!(mv.kind(), MoveKind::EnPassantCapture);

        let mv = Move::from_uci(&pos, "e8c8").unwrap();
        assert_eq!(mv.kind(), MoveKind::LongCastle);

        let mv = Move::from_uci(&pos, "b4c3").unwrap();
        assert_eq!(mv.kind(), MoveKind::Capture);

        assert_eq!(
            Move::from_uci(&pos, "d4d5"),
            Err(MoveError::NoPieceAt(Square::D4))
        );
        assert!(Move::from_uci(&pos, "e2").is_err());
        assert!(Move::from_uci(&pos, "e7e8x").is_err());
    }
}
