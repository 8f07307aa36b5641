/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::{psqt, tune, Bitboard, Board, Color, File, Game, PieceKind, Rank, Score, Square};

/// Game phase contributed by each piece kind. A full set of pieces adds up to [`TOTAL_PHASE`].
const PHASE_WEIGHTS: [i32; PieceKind::COUNT] = [0, 1, 1, 2, 4, 0];

/// Phase of the starting position.
const TOTAL_PHASE: i32 = 24;

/// A scoring oracle for chess positions.
///
/// Scores are always from the side-to-move's perspective: positive is good for whoever is about to move.
/// Implementations must never return a mate score.
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, game: &Game) -> Score;
}

/// The default evaluator: material and piece-square tables tapered between middle-game and end-game,
/// plus a handful of pawn-structure and piece terms.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaperedEvaluator;

impl Evaluator for TaperedEvaluator {
    #[inline(always)]
    fn evaluate(&self, game: &Game) -> Score {
        let stm = game.side_to_move();
        let (mg, eg) = terms_for(game.board(), stm);
        let (their_mg, their_eg) = terms_for(game.board(), stm.opponent());

        let mg = Score::new(mg - their_mg + tune::tempo_bonus!());
        let eg = Score::new(eg - their_eg);

        mg.lerp(eg, endgame_phase(game.board()), TOTAL_PHASE)
    }
}

/// How far into the endgame `board` is: `0` with all pieces on the board, up to [`TOTAL_PHASE`] with none.
#[inline(always)]
pub fn endgame_phase(board: &Board) -> i32 {
    let remaining = PieceKind::all().into_iter().fold(0, |phase, kind| {
        phase + board.kind(kind).population() as i32 * PHASE_WEIGHTS[kind]
    });

    TOTAL_PHASE - remaining.min(TOTAL_PHASE)
}

/// Middle-game and end-game score of everything `color` owns.
fn terms_for(board: &Board, color: Color) -> (i32, i32) {
    let mut mg = 0;
    let mut eg = 0;

    for square in board.color(color) {
        let Some(piece) = board.piece_at(square) else {
            continue;
        };
        let (piece_mg, piece_eg) = psqt(piece, square);
        mg += piece_mg;
        eg += piece_eg;
    }

    let all_pawns = board.kind(PieceKind::Pawn);
    let pawns = board.pawns(color);

    for square in pawns {
        let file = Bitboard::from_file(square.file());
        let neighbors = file.east() | file.west();
        if (neighbors & pawns).is_empty() {
            mg -= tune::isolated_pawn_penalty!().0;
            eg -= tune::isolated_pawn_penalty!().1;
        }

        if (pawns_ahead(square, color) & pawns).is_nonempty() {
            mg -= tune::doubled_pawn_penalty!().0;
            eg -= tune::doubled_pawn_penalty!().1;
        }
    }

    for square in board.piece_parts(color, PieceKind::Rook) {
        if (Bitboard::from_file(square.file()) & all_pawns).is_empty() {
            mg += tune::rook_open_file_bonus!();
        }
    }

    if board.piece_parts(color, PieceKind::Bishop).has_many() {
        mg += tune::bishop_pair_bonus!().0;
        eg += tune::bishop_pair_bonus!().1;
    }

    (mg, eg)
}

/// Squares on the same file as `square`, strictly in front of it from `color`'s point of view.
#[inline(always)]
fn pawns_ahead(square: Square, color: Color) -> Bitboard {
    let file = Bitboard::from_file(square.file());
    let rank = square.rank().inner() as u32;
    let ahead = match color {
        Color::White => u64::MAX.checked_shl(8 * (rank + 1)),
        Color::Black => u64::MAX.checked_shr(8 * (8 - rank)),
    };
    file & ahead.unwrap_or(0)
}

/// A human-readable breakdown of the static evaluation, shown by the `eval` command.
pub struct EvalTrace<'a> {
    game: &'a Game,
}

impl<'a> EvalTrace<'a> {
    pub fn new(game: &'a Game) -> Self {
        Self { game }
    }
}

impl fmt::Display for EvalTrace<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let board = self.game.board();
        let phase = endgame_phase(board);

        for rank in Rank::iter().rev() {
            write!(f, "{rank} |")?;
            for file in File::iter() {
                let square = Square::new(file, rank);
                match board.piece_at(square) {
                    Some(piece) => {
                        let (mg, eg) = psqt(piece, square);
                        let value = Score::new(mg).lerp(Score::new(eg), phase, TOTAL_PHASE);
                        let signed = value.inner() * piece.color().negation_multiplier();
                        write!(f, " {}{signed:+5}", piece.char())?;
                    }
                    None => write!(f, "       ")?,
                }
            }
            writeln!(f)?;
        }

        let eval = TaperedEvaluator.evaluate(self.game);
        let white = eval.inner() * self.game.side_to_move().negation_multiplier();

        writeln!(f, "\nEndgame phase: {phase}/{TOTAL_PHASE}")?;
        writeln!(f, "Side to move: {}", self.game.side_to_move().name())?;
        write!(f, "Eval: {eval} (side to move), {white} (White)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FEN_KIWIPETE;

    fn eval(fen: &str) -> Score {
        TaperedEvaluator.evaluate(&Game::from_fen(fen).unwrap())
    }

    #[test]
    fn test_startpos_is_tempo_only() {
        assert_eq!(
            TaperedEvaluator.evaluate(&Game::default()),
            Score::new(tune::tempo_bonus!())
        );
    }

    #[test]
    fn test_eval_is_color_symmetric() {
        // Mirrored positions with the other side to move score identically.
        assert_eq!(
            eval("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1"),
            eval("r3k2r/pppbbppp/2n2q1P/1P2p3/3pn3/BN2PNP1/P1PPQPB1/R3K2R b KQkq - 0 1"),
        );
    }

    #[test]
    fn test_material_advantage_is_visible() {
        assert!(eval("4k3/8/8/8/8/8/8/3QK3 w - - 0 1") > Score::new(800));
        assert!(eval("4k3/8/8/8/8/8/8/3QK3 b - - 0 1") < Score::new(-800));
        assert!(!eval(FEN_KIWIPETE).is_mate());
    }

    #[test]
    fn test_pawn_structure() {
        let board = Game::from_fen("4k3/8/8/8/4P3/4P3/8/4K3 w - - 0 1").unwrap();
        assert_eq!(
            pawns_ahead(Square::E3, Color::White),
            Bitboard::from_square(Square::E4) | Square::E5 | Square::E6 | Square::E7 | Square::E8
        );
        assert_eq!(
            pawns_ahead(Square::E3, Color::Black),
            Bitboard::from_square(Square::E2) | Square::E1
        );

        // Doubled and isolated Pawns cost something compared to connected ones.
        let (doubled, _) = terms_for(board.board(), Color::White);
        let connected = Game::from_fen("4k3/8/8/8/4P3/3P4/8/4K3 w - - 0 1").unwrap();
        let (healthy, _) = terms_for(connected.board(), Color::White);
        assert!(doubled < healthy);
    }

    #[test]
    fn test_phase() {
        assert_eq!(endgame_phase(Game::default().board()), 0);
        assert_eq!(
            endgame_phase(Game::from_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap().board()),
            TOTAL_PHASE
        );
    }
}
