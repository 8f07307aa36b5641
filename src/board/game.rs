/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, ops::Deref, str::FromStr};

use super::{
    bishop_attacks, king_attacks, knight_attacks, pawn_attacks, perft, ray_between,
    ray_containing, rook_attacks, Bitboard, File, Move, MoveKind, MoveList, Piece,
    PieceKind, Position, Rank, Square,
};
use crate::{MoveError, PositionError};

/// A [`Position`] plus the metadata needed to generate strictly legal moves:
/// who is checking the side to move, which pieces are pinned, and which squares the enemy controls.
///
/// The basic methods you're probably looking for are [`Game::from_fen`], [`Game::with_move_made`], and [`Game::get_legal_moves`].
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Game {
    position: Position,

    /// All enemy pieces attacking the side-to-move's King.
    checkers: Bitboard,

    /// If not in check, every square. Otherwise, the checkers and the squares between them and the King.
    checkmask: Bitboard,

    /// Friendly pieces that are the sole blocker between their King and an enemy slider.
    pinned: Bitboard,

    /// Squares the opponent attacks, computed as if our King were not on the board
    /// so that the King cannot step backwards along a slider's line.
    enemy_attacks: Bitboard,
}

impl Game {
    #[inline(always)]
    pub fn new(position: Position) -> Self {
        let mut game = Self {
            position,
            checkers: Bitboard::EMPTY_BOARD,
            checkmask: Bitboard::FULL_BOARD,
            pinned: Bitboard::EMPTY_BOARD,
            enemy_attacks: Bitboard::EMPTY_BOARD,
        };

        game.recompute_legal_masks();
        game
    }

    #[inline(always)]
    pub fn from_fen(fen: &str) -> Result<Self, PositionError> {
        Ok(Self::new(Position::from_fen(fen)?))
    }

    /// Copies `self` and returns the [`Game`] after `mv` has been applied.
    #[inline(always)]
    pub fn with_move_made(&self, mv: Move) -> Self {
        let mut copied = *self;
        copied.make_move(mv);
        copied
    }

    /// Applies `mv`. Legality is not checked.
    #[inline(always)]
    pub fn make_move(&mut self, mv: Move) {
        self.position.make_move(mv);
        self.recompute_legal_masks();
    }

    /// Copies `self` and returns the [`Game`] after passing the turn.
    #[inline(always)]
    pub fn with_nullmove_made(&self) -> Self {
        let mut copied = *self;
        copied.make_null_move();
        copied
    }

    #[inline(always)]
    pub fn make_null_move(&mut self) {
        self.position.make_null_move();
        self.recompute_legal_masks();
    }

    /// Parses `mv_str` and applies it, provided it is legal here.
    pub fn make_move_uci(&mut self, mv_str: &str) -> Result<Move, MoveError> {
        let mv = Move::from_uci(&self.position, mv_str)?;
        if !self.is_legal(mv) {
            return Err(MoveError::Illegal(mv_str.to_string()));
        }

        self.make_move(mv);
        Ok(mv)
    }

    #[inline(always)]
    pub const fn position(&self) -> &Position {
        &self.position
    }

    #[inline(always)]
    pub const fn is_in_check(&self) -> bool {
        self.checkers.is_nonempty()
    }

    #[inline(always)]
    pub const fn checkers(&self) -> Bitboard {
        self.checkers
    }

    #[inline(always)]
    pub const fn pinned(&self) -> Bitboard {
        self.pinned
    }

    /// Recursively counts all leaf nodes `depth` plies from here. See [`perft`].
    #[inline(always)]
    pub fn perft(&self, depth: usize) -> u64 {
        perft(self, depth)
    }

    /// Returns `true` if `mv` is exactly one of the legal moves in this position, kind included.
    #[inline(always)]
    pub fn is_legal(&self, mv: Move) -> bool {
        !mv.is_none() && self.get_legal_moves_from(mv.from().bitboard()).contains(&mv)
    }

    /// Returns `true` if playing `mv` leaves the opponent in check. Assumes `mv` is legal.
    pub fn gives_check(&self, mv: Move) -> bool {
        // Rare enough to just play out.
        if mv.is_castle() || mv.is_en_passant() {
            return self.with_move_made(mv).is_in_check();
        }

        let color = self.side_to_move();
        let their_king = self.king_square(color.opponent());
        let (from, to) = (mv.from(), mv.to());

        let Some(piece) = self.piece_at(from) else {
            return false;
        };
        let kind = mv.promotion().unwrap_or(piece.kind());
        let blockers = self.occupied() ^ from | to;

        let direct = match kind {
            PieceKind::Pawn => pawn_attacks(to, color),
            PieceKind::Knight => knight_attacks(to),
            PieceKind::Bishop => bishop_attacks(to, blockers),
            PieceKind::Rook => rook_attacks(to, blockers),
            PieceKind::Queen => rook_attacks(to, blockers) | bishop_attacks(to, blockers),
            PieceKind::King => Bitboard::EMPTY_BOARD,
        };
        if direct.contains(their_king) {
            return true;
        }

        // Discovered checks from our other sliders, through the vacated square.
        let others = !from.bitboard();
        let ortho = rook_attacks(their_king, blockers) & self.orthogonal_sliders(color) & others;
        let diag = bishop_attacks(their_king, blockers) & self.diagonal_sliders(color) & others;
        (ortho | diag).is_nonempty()
    }

    /// All legal moves in the position.
    #[inline(always)]
    pub fn get_legal_moves(&self) -> MoveList {
        self.get_legal_moves_from(Bitboard::FULL_BOARD)
    }

    /// All legal moves of pieces on squares in `mask`.
    ///
    /// In double check only the King may move, so a mask without the King yields nothing.
    pub fn get_legal_moves_from(&self, mask: Bitboard) -> MoveList {
        let mut moves = MoveList::default();
        self.generate_moves::<true>(mask, &mut moves);
        moves
    }

    /// All legal captures, en passant captures, and promotions.
    pub fn get_legal_captures(&self) -> MoveList {
        let mut moves = MoveList::default();
        self.generate_moves::<false>(Bitboard::FULL_BOARD, &mut moves);
        moves
    }

    /// Recomputes checkers, checkmask, pins, and enemy attacks for the side to move.
    fn recompute_legal_masks(&mut self) {
        let color = self.side_to_move();
        let opponent = color.opponent();
        let king = self.king_square(color);
        let occupied = self.occupied();

        let ortho = self.orthogonal_sliders(opponent);
        let diag = self.diagonal_sliders(opponent);

        self.checkers = self.knights(opponent) & knight_attacks(king)
            | self.pawns(opponent) & pawn_attacks(king, color)
            | rook_attacks(king, occupied) & ortho
            | bishop_attacks(king, occupied) & diag;

        // Sliders aimed at the King through exactly one friendly piece pin it.
        self.pinned = Bitboard::EMPTY_BOARD;
        let xrays = rook_attacks(king, Bitboard::EMPTY_BOARD) & ortho
            | bishop_attacks(king, Bitboard::EMPTY_BOARD) & diag;
        for slider in xrays {
            let between = ray_between(king, slider) & occupied;
            if between.population() == 1 {
                self.pinned |= between & self.color(color);
            }
        }

        self.checkmask = if self.checkers.is_empty() {
            Bitboard::FULL_BOARD
        } else {
            self.checkers
                .iter()
                .fold(self.checkers, |mask, checker| mask | ray_between(king, checker))
        };

        self.enemy_attacks = self.attacks_by(opponent, occupied ^ king);
    }

    /// Generates legal moves from `mask`. Without `QUIETS`, only captures and promotions.
    fn generate_moves<const QUIETS: bool>(&self, mask: Bitboard, moves: &mut MoveList) {
        self.generate_king_moves::<QUIETS>(mask, moves);

        // In double check only the King can move.
        if self.checkers.has_many() {
            return;
        }

        self.generate_pawn_moves::<QUIETS>(mask, moves);

        let color = self.side_to_move();
        let king = self.king_square(color);
        let blockers = self.occupied();
        let mut targets = self.enemy_or_empty(color) & self.checkmask;
        if !QUIETS {
            targets &= self.color(color.opponent());
        }

        // Pinned Knights can never move.
        for from in self.knights(color) & mask & !self.pinned {
            self.serialize_normal_moves(from, knight_attacks(from) & targets, moves);
        }

        for from in self.diagonal_sliders(color) & mask {
            let mut attacks = bishop_attacks(from, blockers) & targets;
            if self.pinned.contains(from) {
                attacks &= ray_containing(from, king);
            }
            self.serialize_normal_moves(from, attacks, moves);
        }

        for from in self.orthogonal_sliders(color) & mask {
            let mut attacks = rook_attacks(from, blockers) & targets;
            if self.pinned.contains(from) {
                attacks &= ray_containing(from, king);
            }
            self.serialize_normal_moves(from, attacks, moves);
        }
    }

    #[inline(always)]
    fn serialize_normal_moves(&self, from: Square, targets: Bitboard, moves: &mut MoveList) {
        for to in targets {
            let kind = if self.has(to) {
                MoveKind::Capture
            } else {
                MoveKind::Quiet
            };
            moves.push(Move::new(from, to, kind));
        }
    }

    /// Pushes all four promotions in order of decreasing value.
    #[inline(always)]
    fn serialize_promotions(from: Square, to: Square, capture: bool, moves: &mut MoveList) {
        for promotion in PieceKind::promotions() {
            moves.push(Move::new(from, to, MoveKind::promotion(promotion, capture)));
        }
    }

    fn generate_pawn_moves<const QUIETS: bool>(&self, mask: Bitboard, moves: &mut MoveList) {
        let color = self.side_to_move();
        let king = self.king_square(color);
        let empty = self.empty();
        let enemies = self.color(color.opponent());
        let promotion_rank = Rank::eighth(color);

        for from in self.pawns(color) & mask {
            let legal = if self.pinned.contains(from) {
                self.checkmask & ray_containing(from, king)
            } else {
                self.checkmask
            };

            for to in pawn_attacks(from, color) & enemies & legal {
                if to.rank() == promotion_rank {
                    Self::serialize_promotions(from, to, true, moves);
                } else {
                    moves.push(Move::new(from, to, MoveKind::Capture));
                }
            }

            if let Some(ep) = self.ep_square() {
                if pawn_attacks(from, color).contains(ep) && self.ep_is_legal(from, ep) {
                    moves.push(Move::new(from, ep, MoveKind::EnPassantCapture));
                }
            }

            let Some(single) = from.forward_by(color, 1).filter(|&sq| empty.contains(sq)) else {
                continue;
            };

            if single.rank() == promotion_rank {
                if legal.contains(single) {
                    Self::serialize_promotions(from, single, false, moves);
                }
                continue;
            }

            if !QUIETS {
                continue;
            }

            if legal.contains(single) {
                moves.push(Move::new(from, single, MoveKind::Quiet));
            }

            if from.rank() == Rank::second(color) {
                if let Some(double) = single.forward_by(color, 1) {
                    if empty.contains(double) && legal.contains(double) {
                        moves.push(Move::new(from, double, MoveKind::PawnDoublePush));
                    }
                }
            }
        }
    }

    /// En passant removes two Pawns from a rank at once, so it is verified by
    /// recomputing every attacker of the King after the capture.
    fn ep_is_legal(&self, from: Square, ep: Square) -> bool {
        let color = self.side_to_move();
        let Some(victim) = ep.backward_by(color, 1) else {
            return false;
        };

        let blockers = self.occupied() ^ from ^ victim | ep;
        let attackers = self.attackers_to(self.king_square(color), blockers)
            & self.color(color.opponent())
            & !victim.bitboard();

        attackers.is_empty()
    }

    fn generate_king_moves<const QUIETS: bool>(&self, mask: Bitboard, moves: &mut MoveList) {
        let color = self.side_to_move();
        let from = self.king_square(color);
        if !mask.contains(from) {
            return;
        }

        let mut targets = king_attacks(from) & self.enemy_or_empty(color) & !self.enemy_attacks;
        if !QUIETS {
            targets &= self.color(color.opponent());
        }
        self.serialize_normal_moves(from, targets, moves);

        if QUIETS && !self.is_in_check() {
            self.generate_castling_moves(from, moves);
        }
    }

    fn generate_castling_moves(&self, from: Square, moves: &mut MoveList) {
        let color = self.side_to_move();
        let rank = Rank::eighth(color.opponent());
        if from != Square::new(File::E, rank) {
            return;
        }

        let rook = Some(Piece::new(color, PieceKind::Rook));
        let rights = self.castling_rights();
        let square = |file| Square::new(file, rank);
        let clear = |files: &[File]| {
            files
                .iter()
                .all(|&f| !self.has(square(f)) && !self.enemy_attacks.contains(square(f)))
        };

        if rights.can_castle_short(color)
            && self.piece_at(square(File::H)) == rook
            && clear(&[File::F, File::G])
        {
            moves.push(Move::new(from, square(File::G), MoveKind::ShortCastle));
        }

        // The b-file square must be empty, but may be attacked.
        if rights.can_castle_long(color)
            && self.piece_at(square(File::A)) == rook
            && !self.has(square(File::B))
            && clear(&[File::D, File::C])
        {
            moves.push(Move::new(from, square(File::C), MoveKind::LongCastle));
        }
    }
}

impl Deref for Game {
    type Target = Position;
    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        &self.position
    }
}

impl FromStr for Game {
    type Err = PositionError;
    #[inline(always)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_fen(s)
    }
}

impl Default for Game {
    #[inline(always)]
    fn default() -> Self {
        Self::new(Position::default())
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.board())?;
        writeln!(f)?;
        writeln!(f, "FEN: {}", self.to_fen())?;
        writeln!(f, "Key: {}", self.key())?;

        let checkers = self
            .checkers
            .iter()
            .map(|sq| sq.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        write!(f, "Checkers: {checkers}")
    }
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FEN_KIWIPETE;

    fn moves(fen: &str) -> Vec<String> {
        let mut moves = Game::from_fen(fen)
            .unwrap()
            .get_legal_moves()
            .iter()
            .map(|mv| mv.to_string())
            .collect::<Vec<_>>();
        moves.sort();
        moves
    }

    #[test]
    fn test_pinned_pieces_stay_on_their_ray() {
        // The e2 Rook may only slide along the e-file, and the d2 Knight cannot move.
        let game = Game::from_fen("4r1k1/8/8/b7/8/8/3NR3/4K3 w - - 0 1").unwrap();
        assert_eq!(game.pinned(), Bitboard::from_square(Square::D2) | Square::E2);

        let rook = game
            .get_legal_moves_from(Square::E2.bitboard())
            .iter()
            .map(|mv| mv.to())
            .collect::<Bitboard>();
        assert_eq!(
            rook,
            [Square::E3, Square::E4, Square::E5, Square::E6, Square::E7, Square::E8]
                .into_iter()
                .collect()
        );
        assert!(game.get_legal_moves_from(Square::D2.bitboard()).is_empty());
    }

    #[test]
    fn test_check_evasions() {
        // Double check: the g2 Bishop could take the Knight, but only the King may move.
        let all = moves("4k3/8/8/8/8/5n2/6B1/r3K3 w - - 0 1");
        assert!(all.iter().all(|mv| mv.starts_with("e1")), "{all:?}");

        // The e2 Rook cannot reach the checking line, and the King cannot step along it.
        assert_eq!(moves("4k3/8/8/8/8/8/4R3/r3K3 w - - 0 1"), ["e1d2", "e1f2"]);
    }

    #[test]
    fn test_en_passant_horizontal_pin() {
        // Taking on d6 would expose the King on the fifth rank.
        let all = moves("8/8/8/K2pP2r/8/8/8/4k3 w - d6 0 1");
        assert!(!all.contains(&String::from("e5d6")), "{all:?}");

        let all = moves("8/8/8/K2pP3/8/8/8/4k3 w - d6 0 1");
        assert!(all.contains(&String::from("e5d6")), "{all:?}");
    }

    #[test]
    fn test_castling_rules() {
        let all = moves("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        assert!(all.contains(&String::from("e1g1")));
        assert!(all.contains(&String::from("e1c1")));

        // f1 is attacked, so no short castle. b1 is attacked, which does not matter.
        let all = moves("r3k2r/8/8/8/8/8/5r2/R3K2R w KQkq - 0 1");
        assert!(!all.contains(&String::from("e1g1")));

        let all = moves("r3k2r/8/8/8/8/8/1r6/R3K2R w KQkq - 0 1");
        assert!(all.contains(&String::from("e1c1")));

        // A piece on b1 blocks the long castle.
        let all = moves("r3k2r/8/8/8/8/8/8/RN2K2R w KQkq - 0 1");
        assert!(!all.contains(&String::from("e1c1")));
    }

    #[test]
    fn test_legal_captures() {
        let game = Game::from_fen("3q1n2/4P3/8/8/8/8/k7/7K w - - 0 1").unwrap();
        let mut captures = game
            .get_legal_captures()
            .iter()
            .map(|mv| mv.to_string())
            .collect::<Vec<_>>();
        captures.sort();

        assert_eq!(
            captures,
            ["e7d8b", "e7d8n", "e7d8q", "e7d8r", "e7e8b", "e7e8n", "e7e8q", "e7e8r", "e7f8b", "e7f8n", "e7f8q", "e7f8r"]
        );
    }

    #[test]
    fn test_gives_check() {
        let game = Game::from_fen(FEN_KIWIPETE).unwrap();
        for mv in game.get_legal_moves() {
            assert_eq!(
                game.gives_check(mv),
                game.with_move_made(mv).is_in_check(),
                "gives_check({mv}) was wrong"
            );
        }

        // Discovered check, promotion check, and en passant check.
        for fen in [
            "4k3/8/8/8/8/8/4N3/4R1K1 w - - 0 1",
            "8/1Pk5/8/8/8/8/8/4K3 w - - 0 1",
            "8/3k4/8/2pP4/8/8/8/4K3 w - c6 0 1",
        ] {
            let game = Game::from_fen(fen).unwrap();
            assert!(game.get_legal_moves().iter().any(|&mv| game.gives_check(mv)));
            for mv in game.get_legal_moves() {
                assert_eq!(game.gives_check(mv), game.with_move_made(mv).is_in_check());
            }
        }
    }

    #[test]
    fn test_make_move_uci() {
        let mut game = Game::default();
        assert!(game.make_move_uci("e2e4").is_ok());
        assert_eq!(
            game.make_move_uci("e4e5"),
            Err(MoveError::Illegal(String::from("e4e5")))
        );
        assert!(game.make_move_uci("e7e5").is_ok());
        assert_eq!(
            game.to_fen(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2"
        );
    }

    #[test]
    fn test_is_legal() {
        let game = Game::default();
        assert!(game.is_legal(Move::new(Square::G1, Square::F3, MoveKind::Quiet)));
        assert!(!game.is_legal(Move::new(Square::G1, Square::E2, MoveKind::Quiet)));
        assert!(!game.is_legal(Move::new(Square::E2, Square::E4, MoveKind::Quiet)));
        assert!(!game.is_legal(Move::NONE));
    }
}
