/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, ops::Deref, str::FromStr};

use super::{
    bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks, Bitboard, Color,
    File, Move, Piece, PieceKind, Rank, Square, ZobristKey,
};
use crate::PositionError;

/// Size, in bytes, of a serialized [`Board`].
pub const BOARD_BYTES: usize = 96;

/// Castling availability for both players, as four flag bits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
pub struct CastlingRights(u8);

impl CastlingRights {
    /// Number of possible combinations of castling rights.
    pub const COUNT: usize = 16;

    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(0b1111);

    const WHITE_SHORT: u8 = 0b0001;
    const WHITE_LONG: u8 = 0b0010;
    const BLACK_SHORT: u8 = 0b0100;
    const BLACK_LONG: u8 = 0b1000;

    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    #[inline(always)]
    pub const fn can_castle_short(&self, color: Color) -> bool {
        let flag = match color {
            Color::White => Self::WHITE_SHORT,
            Color::Black => Self::BLACK_SHORT,
        };
        self.0 & flag != 0
    }

    #[inline(always)]
    pub const fn can_castle_long(&self, color: Color) -> bool {
        let flag = match color {
            Color::White => Self::WHITE_LONG,
            Color::Black => Self::BLACK_LONG,
        };
        self.0 & flag != 0
    }

    /// Removes whatever rights are lost by a piece leaving or arriving on `square`.
    #[inline(always)]
    fn touch(&mut self, square: Square) {
        self.0 &= !match square {
            Square::E1 => Self::WHITE_SHORT | Self::WHITE_LONG,
            Square::H1 => Self::WHITE_SHORT,
            Square::A1 => Self::WHITE_LONG,
            Square::E8 => Self::BLACK_SHORT | Self::BLACK_LONG,
            Square::H8 => Self::BLACK_SHORT,
            Square::A8 => Self::BLACK_LONG,
            _ => 0,
        };
    }

    /// Parses the castling field of a FEN string, like `KQkq` or `-`.
    pub fn from_uci(castling: &str) -> Result<Self, PositionError> {
        if castling == "-" {
            return Ok(Self::NONE);
        }

        castling.chars().try_fold(Self::NONE, |rights, c| {
            let flag = match c {
                'K' => Self::WHITE_SHORT,
                'Q' => Self::WHITE_LONG,
                'k' => Self::BLACK_SHORT,
                'q' => Self::BLACK_LONG,
                _ => return Err(PositionError::InvalidCastling(castling.to_string())),
            };
            Ok(Self(rights.0 | flag))
        })
    }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return write!(f, "-");
        }

        for (flag, c) in [
            (Self::WHITE_SHORT, 'K'),
            (Self::WHITE_LONG, 'Q'),
            (Self::BLACK_SHORT, 'k'),
            (Self::BLACK_LONG, 'q'),
        ] {
            if self.0 & flag != 0 {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

/// All pieces and their locations on a chess board.
///
/// Has no knowledge of castling rights, en passant, or move counters. If you need those, see [`Position`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    /// All squares occupied by a specific color.
    colors: [Bitboard; Color::COUNT],

    /// All squares occupied by a specific piece kind.
    pieces: [Bitboard; PieceKind::COUNT],

    /// Redundant mailbox to speed up [`Board::piece_at`].
    mailbox: [Option<Piece>; Square::COUNT],
}

impl Board {
    /// Order of the planes in the serialized form: King through Pawn, White then Black.
    const PLANE_ORDER: [PieceKind; PieceKind::COUNT] = [
        PieceKind::King,
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
        PieceKind::Pawn,
    ];

    /// An empty board.
    #[inline(always)]
    pub const fn new() -> Self {
        Self {
            colors: [Bitboard::EMPTY_BOARD; Color::COUNT],
            pieces: [Bitboard::EMPTY_BOARD; PieceKind::COUNT],
            mailbox: [None; Square::COUNT],
        }
    }

    /// The standard starting arrangement.
    pub fn startpos() -> Self {
        use PieceKind::*;
        let back_rank = [Rook, Knight, Bishop, Queen, King, Bishop, Knight, Rook];

        let mut board = Self::new();
        for color in Color::all() {
            // One side's first rank is the other's eighth.
            let first = Rank::eighth(color.opponent());
            for (file, kind) in File::iter().zip(back_rank) {
                board.place(Piece::new(color, kind), Square::new(file, first));
                board.place(Piece::new(color, Pawn), Square::new(file, Rank::second(color)));
            }
        }
        board
    }

    /// Parses the piece-placement field of a FEN string.
    pub fn from_placements(placements: &str) -> Result<Self, PositionError> {
        let invalid = || PositionError::InvalidPlacements(placements.to_string());

        let ranks = placements.split('/').collect::<Vec<_>>();
        if ranks.len() != Rank::COUNT {
            return Err(invalid());
        }

        let mut board = Self::new();

        // FEN lists rank 8 first.
        for (rank, row) in Rank::iter().rev().zip(ranks) {
            let mut file = 0u8;
            for c in row.chars() {
                if let Some(empty) = c.to_digit(10) {
                    file += empty as u8;
                } else {
                    let piece = Piece::from_char(c)?;
                    if file as usize >= File::COUNT {
                        return Err(invalid());
                    }
                    board.place(piece, Square::new(File::new_unchecked(file), rank));
                    file += 1;
                }
            }

            if file as usize != File::COUNT {
                return Err(invalid());
            }
        }

        Ok(board)
    }

    /// Reconstructs a board from the 96-byte layout produced by [`Board::to_bytes`].
    ///
    /// Fails if the slice is the wrong length or two planes claim the same square.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PositionError> {
        if bytes.len() != BOARD_BYTES {
            return Err(PositionError::InvalidByteLength(bytes.len()));
        }

        let mut board = Self::new();
        let planes = Color::all()
            .into_iter()
            .flat_map(|color| Self::PLANE_ORDER.map(|kind| Piece::new(color, kind)));

        for (piece, chunk) in planes.zip(bytes.chunks_exact(8)) {
            let mut plane = [0u8; 8];
            plane.copy_from_slice(chunk);
            let bb = Bitboard::new(u64::from_be_bytes(plane));

            if bb.intersects(board.occupied()) {
                return Err(PositionError::OverlappingPlanes);
            }
            for square in bb {
                board.place(piece, square);
            }
        }

        Ok(board)
    }

    /// Serializes the board as twelve big-endian `u64` planes: White King, Queen, Rook, Bishop, Knight, Pawn, then Black's.
    pub fn to_bytes(&self) -> [u8; BOARD_BYTES] {
        let mut bytes = [0; BOARD_BYTES];
        let planes = Color::all()
            .into_iter()
            .flat_map(|color| Self::PLANE_ORDER.map(|kind| self.piece_parts(color, kind)));

        for (chunk, plane) in bytes.chunks_exact_mut(8).zip(planes) {
            chunk.copy_from_slice(&plane.inner().to_be_bytes());
        }

        bytes
    }

    /// Places `piece` on `square`. The square must be empty.
    #[inline(always)]
    pub fn place(&mut self, piece: Piece, square: Square) {
        self.colors[piece.color()].set(square);
        self.pieces[piece.kind()].set(square);
        self.mailbox[square] = Some(piece);
    }

    /// Removes and returns the piece on `square`, if any.
    #[inline(always)]
    pub fn take(&mut self, square: Square) -> Option<Piece> {
        let piece = self.mailbox[square].take()?;
        self.colors[piece.color()].clear(square);
        self.pieces[piece.kind()].clear(square);
        Some(piece)
    }

    #[inline(always)]
    pub const fn piece_at(&self, square: Square) -> Option<Piece> {
        self.mailbox[square.index()]
    }

    #[inline(always)]
    pub const fn has(&self, square: Square) -> bool {
        self.occupied().contains(square)
    }

    #[inline(always)]
    pub const fn kind(&self, kind: PieceKind) -> Bitboard {
        self.pieces[kind.index()]
    }

    #[inline(always)]
    pub const fn color(&self, color: Color) -> Bitboard {
        self.colors[color.index()]
    }

    #[inline(always)]
    pub const fn piece_parts(&self, color: Color, kind: PieceKind) -> Bitboard {
        self.color(color).and(self.kind(kind))
    }

    #[inline(always)]
    pub const fn piece(&self, piece: Piece) -> Bitboard {
        self.piece_parts(piece.color(), piece.kind())
    }

    #[inline(always)]
    pub const fn occupied(&self) -> Bitboard {
        self.colors[0].or(self.colors[1])
    }

    #[inline(always)]
    pub const fn empty(&self) -> Bitboard {
        self.occupied().not()
    }

    /// Squares a `color` piece may move to: empty or occupied by the enemy.
    #[inline(always)]
    pub const fn enemy_or_empty(&self, color: Color) -> Bitboard {
        self.color(color).not()
    }

    #[inline(always)]
    pub const fn pawns(&self, color: Color) -> Bitboard {
        self.piece_parts(color, PieceKind::Pawn)
    }

    #[inline(always)]
    pub const fn knights(&self, color: Color) -> Bitboard {
        self.piece_parts(color, PieceKind::Knight)
    }

    #[inline(always)]
    pub const fn king(&self, color: Color) -> Bitboard {
        self.piece_parts(color, PieceKind::King)
    }

    /// Rooks and Queens.
    #[inline(always)]
    pub const fn orthogonal_sliders(&self, color: Color) -> Bitboard {
        self.color(color)
            .and(self.kind(PieceKind::Rook).or(self.kind(PieceKind::Queen)))
    }

    /// Bishops and Queens.
    #[inline(always)]
    pub const fn diagonal_sliders(&self, color: Color) -> Bitboard {
        self.color(color)
            .and(self.kind(PieceKind::Bishop).or(self.kind(PieceKind::Queen)))
    }

    #[inline(always)]
    pub const fn sliders(&self, color: Color) -> Bitboard {
        self.orthogonal_sliders(color)
            .or(self.diagonal_sliders(color))
    }

    /// Returns `true` if `color` has anything besides Pawns and its King.
    #[inline(always)]
    pub const fn has_non_pawn_material(&self, color: Color) -> bool {
        self.color(color)
            .and(self.kind(PieceKind::Pawn).or(self.kind(PieceKind::King)).not())
            .is_nonempty()
    }

    /// Every piece, of either color, that attacks `square` given `blockers`.
    pub fn attackers_to(&self, square: Square, blockers: Bitboard) -> Bitboard {
        let ortho = self.kind(PieceKind::Rook) | self.kind(PieceKind::Queen);
        let diag = self.kind(PieceKind::Bishop) | self.kind(PieceKind::Queen);

        (pawn_attacks(square, Color::White) & self.pawns(Color::Black))
            | (pawn_attacks(square, Color::Black) & self.pawns(Color::White))
            | (knight_attacks(square) & self.kind(PieceKind::Knight))
            | (king_attacks(square) & self.kind(PieceKind::King))
            | (rook_attacks(square, blockers) & ortho)
            | (bishop_attacks(square, blockers) & diag)
    }

    /// Every square `color` attacks, given `blockers`.
    pub fn attacks_by(&self, color: Color, blockers: Bitboard) -> Bitboard {
        let forward = self.pawns(color).forward_by(color, 1);
        let mut attacks = forward.east() | forward.west();

        for square in self.knights(color) {
            attacks |= knight_attacks(square);
        }
        for square in self.diagonal_sliders(color) {
            attacks |= bishop_attacks(square, blockers);
        }
        for square in self.orthogonal_sliders(color) {
            attacks |= rook_attacks(square, blockers);
        }
        for square in self.king(color) {
            attacks |= king_attacks(square);
        }

        attacks
    }

    /// Returns `true` if a `side_to_move` Pawn could capture onto `ep_square`.
    #[inline(always)]
    pub fn ep_is_capturable(&self, ep_square: Square, side_to_move: Color) -> bool {
        pawn_attacks(ep_square, side_to_move.opponent()).intersects(self.pawns(side_to_move))
    }

    /// An iterator over all occupied squares and their pieces, from `a1` to `h8`.
    pub fn iter(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.occupied()
            .into_iter()
            .filter_map(|square| self.piece_at(square).map(|piece| (square, piece)))
    }

    /// The piece-placement field of a FEN string.
    pub fn to_placements(&self) -> String {
        let mut placements = String::with_capacity(64);

        for rank in Rank::iter().rev() {
            let mut empty = 0;
            for file in File::iter() {
                match self.piece_at(Square::new(file, rank)) {
                    Some(piece) => {
                        if empty > 0 {
                            placements.push_str(&empty.to_string());
                            empty = 0;
                        }
                        placements.push(piece.char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                placements.push_str(&empty.to_string());
            }
            if rank != Rank::ONE {
                placements.push('/');
            }
        }

        placements
    }
}

impl Default for Board {
    #[inline(always)]
    fn default() -> Self {
        Self::startpos()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            write!(f, "{rank}|")?;
            for file in File::iter() {
                let c = self
                    .piece_at(Square::new(file, rank))
                    .map(|p| p.char())
                    .unwrap_or('.');
                write!(f, " {c}")?;
            }
            writeln!(f)?;
        }
        write!(f, " +----------------\n   a b c d e f g h")
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_placements())
    }
}

/// The full state of a game at one point in time: the [`Board`] plus side to move,
/// castling rights, en passant square, move counters, cached King squares, and Zobrist key.
///
/// Positions are small `Copy` values. Making a move produces a new child value.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Position {
    board: Board,
    side_to_move: Color,
    castling_rights: CastlingRights,
    ep_square: Option<Square>,

    /// Plies since the last capture or Pawn move, for the fifty-move rule.
    halfmove: usize,

    /// Starts at 1 and increments after Black moves.
    fullmove: usize,

    key: ZobristKey,
    king_squares: [Square; Color::COUNT],
}

impl Position {
    /// Parses a [FEN](https://www.chessprogramming.org/Forsyth-Edwards_Notation) string.
    ///
    /// Trailing fields may be omitted and default to `w - - 0 1`.
    /// Each side must have exactly one King, and the side not to move must not be in check.
    pub fn from_fen(fen: &str) -> Result<Self, PositionError> {
        let mut fields = fen.split_ascii_whitespace();

        let board = Board::from_placements(fields.next().ok_or(PositionError::EmptyFen)?)?;

        let mut stm_chars = fields.next().unwrap_or("w").chars();
        let side_to_move = match (stm_chars.next(), stm_chars.next()) {
            (Some(c), None) => Color::from_char(c)?,
            _ => return Err(PositionError::InvalidColor(fen.to_string())),
        };

        let castling_rights = CastlingRights::from_uci(fields.next().unwrap_or("-"))?;

        let ep_square = match fields.next().unwrap_or("-") {
            "-" => None,
            ep => Some(Square::from_uci(ep)?),
        };

        let halfmove = Self::parse_counter(fields.next().unwrap_or("0"))?;
        let fullmove = Self::parse_counter(fields.next().unwrap_or("1"))?.max(1);

        if fields.next().is_some() {
            return Err(PositionError::TrailingFields(fen.to_string()));
        }

        let mut king_squares = [Square::default(); Color::COUNT];
        for color in Color::all() {
            let king = board.king(color);
            if king.population() != 1 {
                return Err(PositionError::InvalidKingCount(color, king.population()));
            }
            king_squares[color] = king.to_square_unchecked();
        }

        let opponent = side_to_move.opponent();
        let attackers =
            board.attackers_to(king_squares[opponent], board.occupied()) & board.color(side_to_move);
        if attackers.is_nonempty() {
            return Err(PositionError::OpponentInCheck(opponent));
        }

        Ok(Self {
            key: ZobristKey::from_parts(&board, ep_square, castling_rights, side_to_move),
            board,
            side_to_move,
            castling_rights,
            ep_square,
            halfmove,
            fullmove,
            king_squares,
        })
    }

    fn parse_counter(counter: &str) -> Result<usize, PositionError> {
        counter
            .parse()
            .map_err(|_| PositionError::InvalidCounter(counter.to_string()))
    }

    /// The standard starting position.
    pub fn startpos() -> Self {
        let board = Board::startpos();
        let castling_rights = CastlingRights::ALL;

        Self {
            key: ZobristKey::from_parts(&board, None, castling_rights, Color::White),
            board,
            side_to_move: Color::White,
            castling_rights,
            ep_square: None,
            halfmove: 0,
            fullmove: 1,
            king_squares: [Square::E1, Square::E8],
        }
    }

    pub fn to_fen(&self) -> String {
        let ep = self
            .ep_square
            .map(|sq| sq.to_string())
            .unwrap_or_else(|| String::from("-"));

        format!(
            "{} {} {} {ep} {} {}",
            self.board.to_placements(),
            self.side_to_move,
            self.castling_rights,
            self.halfmove,
            self.fullmove
        )
    }

    /// The 96-byte serialization of this position's [`Board`].
    #[inline(always)]
    pub fn to_bytes(&self) -> [u8; BOARD_BYTES] {
        self.board.to_bytes()
    }

    #[inline(always)]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    #[inline(always)]
    pub const fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline(always)]
    pub const fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    #[inline(always)]
    pub const fn ep_square(&self) -> Option<Square> {
        self.ep_square
    }

    #[inline(always)]
    pub const fn halfmove(&self) -> usize {
        self.halfmove
    }

    #[inline(always)]
    pub const fn fullmove(&self) -> usize {
        self.fullmove
    }

    #[inline(always)]
    pub const fn key(&self) -> ZobristKey {
        self.key
    }

    /// Cached location of `color`'s King.
    #[inline(always)]
    pub const fn king_square(&self, color: Color) -> Square {
        self.king_squares[color.index()]
    }

    /// Un-hashes the en passant file, if it is currently part of the key.
    #[inline(always)]
    fn unhash_ep(&mut self) {
        if let Some(ep) = self.ep_square.take() {
            if self.board.ep_is_capturable(ep, self.side_to_move) {
                self.key.hash_ep_file(ep.file());
            }
        }
    }

    /// Applies `mv`, assuming it is at least pseudo-legal.
    ///
    /// Every part of the position, including the Zobrist key, is updated incrementally.
    pub fn make_move(&mut self, mv: Move) {
        let from = mv.from();
        let to = mv.to();
        let color = self.side_to_move;

        let Some(mut piece) = self.board.take(from) else {
            return;
        };
        self.key.hash_piece(from, piece);

        self.unhash_ep();
        self.key.hash_castling_rights(self.castling_rights);

        self.halfmove += 1;
        self.fullmove += color.index();

        if mv.is_capture() {
            let victim_square = if mv.is_en_passant() {
                Square::new(to.file(), from.rank())
            } else {
                to
            };

            if let Some(victim) = self.board.take(victim_square) {
                self.key.hash_piece(victim_square, victim);
            }
            self.halfmove = 0;
        } else if mv.is_castle() {
            let (rook_from, rook_to) = if to.file() == File::G {
                (File::H, File::F)
            } else {
                (File::A, File::D)
            };
            let rank = from.rank();
            let (rook_from, rook_to) = (Square::new(rook_from, rank), Square::new(rook_to, rank));

            if let Some(rook) = self.board.take(rook_from) {
                self.key.hash_piece(rook_from, rook);
                self.board.place(rook, rook_to);
                self.key.hash_piece(rook_to, rook);
            }
        }

        match piece.kind() {
            PieceKind::Pawn => {
                self.halfmove = 0;
                if mv.is_pawn_double_push() {
                    self.ep_square = Some(Square::new(
                        from.file(),
                        Rank::new_unchecked((from.rank().inner() + to.rank().inner()) / 2),
                    ));
                }
            }
            PieceKind::King => self.king_squares[color] = to,
            _ => {}
        }

        if let Some(promotion) = mv.promotion() {
            piece = piece.promoted(promotion);
        }

        self.board.place(piece, to);
        self.key.hash_piece(to, piece);

        self.castling_rights.touch(from);
        self.castling_rights.touch(to);
        self.key.hash_castling_rights(self.castling_rights);

        self.side_to_move = color.opponent();
        self.key.toggle_side_to_move();

        if let Some(ep) = self.ep_square {
            if self.board.ep_is_capturable(ep, self.side_to_move) {
                self.key.hash_ep_file(ep.file());
            }
        }
    }

    /// Passes the turn: flips the side to move and clears en passant.
    ///
    /// Counters advance exactly as for a quiet move.
    pub fn make_null_move(&mut self) {
        self.unhash_ep();
        self.halfmove += 1;
        self.fullmove += self.side_to_move.index();
        self.side_to_move = self.side_to_move.opponent();
        self.key.toggle_side_to_move();
    }
}

impl Deref for Position {
    type Target = Board;
    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        &self.board
    }
}

impl Default for Position {
    #[inline(always)]
    fn default() -> Self {
        Self::startpos()
    }
}

impl FromStr for Position {
    type Err = PositionError;
    #[inline(always)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_fen(s)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_fen())
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.board, self.to_fen())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FEN_KIWIPETE, FEN_STARTPOS};

    fn play(pos: &mut Position, moves: &[&str]) {
        for mv in moves {
            let mv = Move::from_uci(pos, mv).unwrap();
            pos.make_move(mv);
            assert_eq!(
                pos.key(),
                ZobristKey::from_parts(
                    pos.board(),
                    pos.ep_square(),
                    pos.castling_rights(),
                    pos.side_to_move()
                ),
                "Incremental key diverged after {mv} on {pos}"
            );
        }
    }

    #[test]
    fn test_fen_round_trips() {
        for fen in [
            FEN_STARTPOS,
            FEN_KIWIPETE,
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KQkq c6 0 2",
        ] {
            assert_eq!(Position::from_fen(fen).unwrap().to_fen(), fen);
        }
        assert_eq!(Position::startpos(), Position::from_fen(FEN_STARTPOS).unwrap());
    }

    #[test]
    fn test_fen_defaults_missing_fields() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/8/4K3").unwrap();
        assert_eq!(pos.to_fen(), "4k3/8/8/8/8/8/8/4K3 w - - 0 1");
    }

    #[test]
    fn test_invalid_fens() {
        assert_eq!(Position::from_fen(""), Err(PositionError::EmptyFen));
        assert!(Position::from_fen("4k3/8/8/8/8/8/8 w - - 0 1").is_err());
        assert!(Position::from_fen("4k3/9/8/8/8/8/8/4K3 w - - 0 1").is_err());
        assert!(Position::from_fen("4k3/8/8/8/8/8/8/4K2X w - - 0 1").is_err());
        assert!(Position::from_fen("4k3/8/8/8/8/8/8/4K3 x - - 0 1").is_err());
        assert!(Position::from_fen("4k3/8/8/8/8/8/8/4K3 w KX - 0 1").is_err());
        assert!(Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - z9 0 1").is_err());
        assert!(Position::from_fen("4k3/8/8/8/8/8/8/4K3 w - - x 1").is_err());
        assert_eq!(
            Position::from_fen("8/8/8/8/8/8/8/4K3 w - - 0 1"),
            Err(PositionError::InvalidKingCount(Color::Black, 0))
        );
        assert_eq!(
            Position::from_fen("4k3/4R3/8/8/8/8/8/4K3 w - - 0 1"),
            Err(PositionError::OpponentInCheck(Color::Black))
        );
    }

    #[test]
    fn test_incremental_key_matches_scratch() {
        let mut pos = Position::from_fen(FEN_KIWIPETE).unwrap();
        // Castles, captures, a double push allowing en passant, and the en passant itself.
        play(&mut pos, &["e1g1", "h3g2", "a2a4", "b4a3", "f3f7", "e8f7", "d5e6"]);

        let mut pos = Position::startpos();
        play(&mut pos, &["e2e4", "d7d5", "e4e5", "f7f5", "e5f6", "g8f6", "a2a4"]);
    }

    #[test]
    fn test_repeated_position_repeats_key() {
        let mut pos = Position::startpos();
        let original = pos.key();
        play(&mut pos, &["g1f3", "g8f6", "f3g1", "f6g8"]);
        assert_eq!(pos.key(), original);
        assert_eq!(pos.halfmove(), 4);
        assert_eq!(pos.fullmove(), 3);
    }

    #[test]
    fn test_castling_rights_are_lost() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";

        let mut pos = Position::from_fen(fen).unwrap();
        play(&mut pos, &["e1e2"]);
        assert_eq!(pos.castling_rights().to_string(), "kq");

        let mut pos = Position::from_fen(fen).unwrap();
        play(&mut pos, &["h1h8"]);
        assert_eq!(pos.castling_rights().to_string(), "Qq");

        let mut pos = Position::from_fen(fen).unwrap();
        play(&mut pos, &["e1c1"]);
        assert_eq!(pos.castling_rights().to_string(), "kq");
        assert_eq!(pos.board().piece_at(Square::D1), Some(Piece::WHITE_ROOK));
        assert_eq!(pos.board().piece_at(Square::A1), None);
        assert_eq!(pos.king_square(Color::White), Square::C1);
    }

    #[test]
    fn test_en_passant_and_promotion() {
        let mut pos = Position::from_fen("4k3/1P6/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        play(&mut pos, &["e5d6"]);
        assert_eq!(pos.board().piece_at(Square::D5), None);
        assert_eq!(pos.board().piece_at(Square::D6), Some(Piece::WHITE_PAWN));

        play(&mut pos, &["e8d7", "b7b8n"]);
        assert_eq!(pos.board().piece_at(Square::B8), Some(Piece::WHITE_KNIGHT));
    }

    #[test]
    fn test_null_move() {
        let mut pos =
            Position::from_fen("rnbqkbnr/ppp1pppp/8/8/3pP3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 3")
                .unwrap();
        pos.make_null_move();
        assert_eq!(
            pos.to_fen(),
            "rnbqkbnr/ppp1pppp/8/8/3pP3/8/PPPP1PPP/RNBQKBNR w KQkq - 1 4"
        );
        assert_eq!(
            pos.key(),
            ZobristKey::from_parts(pos.board(), None, pos.castling_rights(), Color::White)
        );
    }

    #[test]
    fn test_serialization_layout() {
        let bytes = Position::startpos().to_bytes();

        // White King on e1 is bit 4 of the first big-endian plane.
        assert_eq!(&bytes[0..8], &(1u64 << 4).to_be_bytes());
        // White Pawns fill rank 2.
        assert_eq!(&bytes[40..48], &Bitboard::RANK_2.inner().to_be_bytes());
        // Black Pawns are the last plane.
        assert_eq!(&bytes[88..96], &Bitboard::RANK_7.inner().to_be_bytes());
    }

    #[test]
    fn test_serialization_inverts() {
        for fen in [FEN_STARTPOS, FEN_KIWIPETE] {
            let pos = Position::from_fen(fen).unwrap();
            let board = Board::from_bytes(&pos.to_bytes()).unwrap();
            assert_eq!(board, *pos.board());
        }

        assert_eq!(
            Board::from_bytes(&[0; 95]),
            Err(PositionError::InvalidByteLength(95))
        );

        let mut overlapping = Position::startpos().to_bytes();
        overlapping[8..16].copy_from_slice(&Bitboard::RANK_2.inner().to_be_bytes());
        assert_eq!(
            Board::from_bytes(&overlapping),
            Err(PositionError::OverlappingPlanes)
        );
    }
}
