/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use thiserror::Error;

use crate::{Color, Square};

/// Failure to build a [`crate::Position`] or one of its parts from text or bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    #[error("FEN string is empty")]
    EmptyFen,

    #[error("invalid piece placements {0:?}")]
    InvalidPlacements(String),

    #[error("invalid piece character {0:?}")]
    InvalidPiece(char),

    #[error("invalid color {0:?}, expected `w` or `b`")]
    InvalidColor(String),

    #[error("invalid castling rights {0:?}")]
    InvalidCastling(String),

    #[error("invalid square {0:?}")]
    InvalidSquare(String),

    #[error("invalid move counter {0:?}")]
    InvalidCounter(String),

    #[error("unexpected trailing fields in FEN {0:?}")]
    TrailingFields(String),

    #[error("{color} must have exactly one King, found {1}", color = .0.name())]
    InvalidKingCount(Color, u8),

    #[error("{} is in check but it is not their turn", .0.name())]
    OpponentInCheck(Color),

    #[error("expected {expected} bytes, found {0}", expected = crate::BOARD_BYTES)]
    InvalidByteLength(usize),

    #[error("two piece planes occupy the same square")]
    OverlappingPlanes,
}

/// Failure to interpret or apply a move.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("invalid move {0:?}, expected coordinate notation like `e2e4` or `e7e8q`")]
    InvalidFormat(String),

    #[error("no piece on {0}")]
    NoPieceAt(Square),

    #[error("illegal move {0:?}")]
    Illegal(String),
}

/// Reasons a search cannot produce a move.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchError {
    #[error("no legal moves in the root position")]
    NoLegalMoves,
}
