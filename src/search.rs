/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, marker::PhantomData, ops::Neg, time::Duration};

use arrayvec::ArrayVec;
use uci_parser::UciResponse;

use crate::{
    tune, Clock, Evaluator, Game, KillerTable, LogLevel, Move, MoveList, MovePicker, MoveScorer,
    PathGuard, RepetitionHistory, Score, TTable, TTableEntry, MAX_DEPTH,
};

/// Compile-time tag for the role a node plays in the tree.
trait NodeType {
    /// Is this node the first searched?
    const ROOT: bool;

    /// Is this node a PV node?
    const PV: bool;
}

/// First node searched.
struct RootNode;
impl NodeType for RootNode {
    const ROOT: bool = true;
    const PV: bool = true;
}

/// A node on the principal variation, searched with a non-null window.
struct PvNode;
impl NodeType for PvNode {
    const ROOT: bool = false;
    const PV: bool = true;
}

/// A node not on the principal variation, searched with a null window.
struct NonPvNode;
impl NodeType for NonPvNode {
    const ROOT: bool = false;
    const PV: bool = false;
}

/// Line of play the search expects from a node onward.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrincipalVariation(ArrayVec<Move, MAX_DEPTH>);

impl PrincipalVariation {
    /// An empty PV.
    pub const EMPTY: Self = Self(ArrayVec::new_const());

    #[inline(always)]
    fn clear(&mut self) {
        self.0.clear();
    }

    /// Replace the contents of `self` with `mv` followed by the contents of `other`.
    ///
    /// Anything that does not fit is dropped from the tail.
    #[inline(always)]
    fn extend(&mut self, mv: Move, other: &Self) {
        self.clear();
        self.0.push(mv);
        let room = self.0.remaining_capacity().min(other.0.len());
        self.0.extend(other.0[..room].iter().copied());
    }

    /// First move of the line, if there is one.
    #[inline(always)]
    pub fn first(&self) -> Option<Move> {
        self.0.first().copied()
    }

    #[inline(always)]
    pub fn moves(&self) -> &[Move] {
        &self.0
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for PrincipalVariation {
    #[inline(always)]
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Display for PrincipalVariation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let moves = self.0.iter().map(Move::to_string).collect::<Vec<_>>();
        write!(f, "{}", moves.join(" "))
    }
}

/// The `(alpha, beta)` window of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBounds {
    /// Lower bound.
    ///
    /// Lowest score the side to move is already assured of.
    /// If no move can raise `alpha`, the node "fails low" and has no best move.
    pub alpha: Score,

    /// Upper bound.
    ///
    /// Anything at or above this is refuted higher up the tree.
    /// A move scoring at least `beta` "fails high", and the rest of the node is pruned.
    pub beta: Score,
}

impl SearchBounds {
    #[inline(always)]
    pub const fn new(alpha: Score, beta: Score) -> Self {
        Self { alpha, beta }
    }

    /// `(alpha, alpha + 1)`.
    #[inline(always)]
    pub fn null_alpha(self) -> Self {
        Self::new(self.alpha, self.alpha + 1)
    }

    /// `(beta - 1, beta)`.
    #[inline(always)]
    pub fn null_beta(self) -> Self {
        Self::new(self.beta - 1, self.beta)
    }
}

impl Neg for SearchBounds {
    type Output = Self;
    /// The window as seen by the opponent: `(-beta, -alpha)`.
    #[inline(always)]
    fn neg(self) -> Self::Output {
        Self {
            alpha: -self.beta,
            beta: -self.alpha,
        }
    }
}

impl Default for SearchBounds {
    /// The full window.
    #[inline(always)]
    fn default() -> Self {
        Self::new(-Score::INF, Score::INF)
    }
}

/// A window around the previous iteration's score, used as the root's bounds.
///
/// Each bound widens independently: first to [`tune::wide_aspiration_window_delta`] around the
/// previous score, then to infinity.
#[derive(Debug)]
struct AspirationWindow {
    bounds: SearchBounds,

    /// Score of the previous iteration.
    center: Score,

    /// Fail-lows seen so far.
    alpha_fails: i32,

    /// Fail-highs seen so far.
    beta_fails: i32,
}

impl AspirationWindow {
    /// Creates a new [`AspirationWindow`] centered around `score`.
    ///
    /// The window is infinite if `enabled` is false, at shallow depths, and around mate scores.
    #[inline(always)]
    fn new(score: Score, depth: usize, enabled: bool) -> Self {
        let bounds = if !enabled || depth < tune::min_aspiration_window_depth!() || score.is_mate()
        {
            SearchBounds::default()
        } else {
            let delta = tune::initial_aspiration_window_delta!();
            SearchBounds::new(
                (score - delta).max(-Score::INF),
                (score + delta).min(Score::INF),
            )
        };

        Self {
            bounds,
            center: score,
            alpha_fails: 0,
            beta_fails: 0,
        }
    }

    /// Widens the window's `alpha` bound, expanding it downwards.
    #[inline(always)]
    fn widen_down(&mut self) {
        self.alpha_fails += 1;
        self.bounds.alpha = if self.alpha_fails == 1 {
            (self.center - tune::wide_aspiration_window_delta!()).max(-Score::INF)
        } else {
            -Score::INF
        };
    }

    /// Widens the window's `beta` bound, expanding it upwards.
    #[inline(always)]
    fn widen_up(&mut self) {
        self.beta_fails += 1;
        self.bounds.beta = if self.beta_fails == 1 {
            (self.center + tune::wide_aspiration_window_delta!()).min(Score::INF)
        } else {
            Score::INF
        };
    }

    /// Returns `true` if `score` fails low, meaning it is below `alpha` and the window must be expanded downwards.
    #[inline(always)]
    fn fails_low(&self, score: Score) -> bool {
        self.bounds.alpha != -Score::INF && score <= self.bounds.alpha
    }

    /// Returns `true` if `score` fails high, meaning it is above `beta` and the window must be expanded upwards.
    #[inline(always)]
    fn fails_high(&self, score: Score) -> bool {
        self.bounds.beta != Score::INF && score >= self.bounds.beta
    }
}

/// Outcome of the deepest completed iteration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchResult {
    /// Number of nodes searched.
    pub nodes: u64,

    /// Best move found during the search.
    pub bestmove: Option<Move>,

    /// Score of the root from the side to move's perspective.
    pub score: Score,

    /// Iteration that produced this result.
    pub depth: usize,

    /// Expected line, starting with `bestmove`.
    pub pv: PrincipalVariation,
}

impl Default for SearchResult {
    /// No move and the worst possible score.
    #[inline(always)]
    fn default() -> Self {
        Self {
            nodes: 0,
            bestmove: None,
            score: -Score::INF,
            depth: 0,
            pv: PrincipalVariation::EMPTY,
        }
    }
}

/// Switches for every search feature that can be turned off.
///
/// With aspiration windows, killers, and TT move ordering toggled on or off, a search without the
/// remaining features always returns the plain minimax score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchFeatures {
    pub aspiration: bool,
    pub killers: bool,
    pub tt_ordering: bool,
    pub tt_cutoffs: bool,
    pub qsearch: bool,
    pub check_extension: bool,
    pub reverse_futility: bool,
    pub null_move: bool,
    pub razoring: bool,
    pub futility: bool,
    pub late_move_pruning: bool,
}

impl SearchFeatures {
    /// Every feature turned off: a plain fixed-depth alpha-beta search.
    pub const NONE: Self = Self {
        aspiration: false,
        killers: false,
        tt_ordering: false,
        tt_cutoffs: false,
        qsearch: false,
        check_extension: false,
        reverse_futility: false,
        null_move: false,
        razoring: false,
        futility: false,
        late_move_pruning: false,
    };

    /// Every feature turned on.
    pub const ALL: Self = Self {
        aspiration: true,
        killers: true,
        tt_ordering: true,
        tt_cutoffs: true,
        qsearch: true,
        check_extension: true,
        reverse_futility: true,
        null_move: true,
        razoring: true,
        futility: true,
        late_move_pruning: true,
    };
}

impl Default for SearchFeatures {
    #[inline(always)]
    fn default() -> Self {
        Self::ALL
    }
}

/// One search thread's state.
///
/// One of these runs on every search thread. Everything it owns is private to that thread;
/// only the [`TTable`] and the stop flag inside the [`Clock`] are shared.
pub struct Search<'a, Log, E> {
    /// Index of the thread running this search. Thread `0` is the main thread.
    id: usize,

    /// Number of nodes searched.
    nodes: u64,

    /// Decides when this search must end.
    clock: Clock,

    /// Shared by every thread of the search.
    ttable: &'a TTable,

    evaluator: &'a E,

    /// Quiet moves that caused a beta cutoff, per ply.
    ///
    /// Owned by the engine and cleared at the start of every root search.
    killers: &'a mut KillerTable,

    /// Keys of every position from the start of the game up to the parent of the current node.
    history: RepetitionHistory,

    features: SearchFeatures,

    /// Depth of the current iteration, which also bounds the length of quiescence searches.
    root_depth: usize,

    /// Compile-time logging level.
    log: PhantomData<Log>,
}

impl<'a, Log: LogLevel, E: Evaluator> Search<'a, Log, E> {
    /// Prepares a search. Nothing is searched until [`Search::start`] or [`Search::iterative_deepening`].
    #[inline(always)]
    pub fn new(
        id: usize,
        clock: Clock,
        ttable: &'a TTable,
        evaluator: &'a E,
        killers: &'a mut KillerTable,
        history: RepetitionHistory,
        features: SearchFeatures,
    ) -> Self {
        Self {
            id,
            nodes: 0,
            clock,
            ttable,
            evaluator,
            killers,
            history,
            features,
            root_depth: 0,
            log: PhantomData,
        }
    }

    /// Number of nodes searched so far.
    #[inline(always)]
    pub const fn nodes(&self) -> u64 {
        self.nodes
    }

    #[inline(always)]
    pub const fn history(&self) -> &RepetitionHistory {
        &self.history
    }

    /// Search `game` on this thread alone, returning the deepest completed result.
    ///
    /// Nothing is printed besides debug info; see [`crate::search_position`] for a search that talks UCI.
    #[inline(always)]
    pub fn start(mut self, game: &Game) -> SearchResult {
        self.iterative_deepening(game, |_| {})
    }

    /// Helper to send a [`UciInfo`] containing only a `string` message to `stdout`.
    #[inline(always)]
    fn send_string<T: fmt::Display>(&self, string: T) {
        println!("{}", UciResponse::info_string(string));
    }

    /// First depth this thread searches.
    ///
    /// Helper threads start one or two plies deeper than the main thread so they reach different
    /// parts of the tree, and fill the [`TTable`] ahead of it.
    #[inline(always)]
    fn start_depth(&self) -> usize {
        if self.id == 0 {
            1
        } else {
            1 + self.id % 2
        }
    }

    /// Performs [iterative deepening](https://www.chessprogramming.org/Iterative_Deepening) (ID) on `game`.
    ///
    /// Every completed depth is handed to `report` as it finishes. A depth cancelled part way through is
    /// discarded, and the result of the last completed depth is returned.
    pub fn iterative_deepening(
        &mut self,
        game: &Game,
        mut report: impl FnMut(&SearchResult),
    ) -> SearchResult {
        let mut result = SearchResult::default();
        let max_depth = self.clock.config().max_depth.min(MAX_DEPTH);

        if Log::DEBUG && self.id == 0 {
            self.send_string(format!("Starting search on {:?}", game.to_fen()));

            let config = self.clock.config();
            if config.soft_timeout < Duration::MAX {
                self.send_string(format!("Soft timeout := {}ms", config.soft_timeout.as_millis()));
            }
            if config.hard_timeout < Duration::MAX {
                self.send_string(format!("Hard timeout := {}ms", config.hard_timeout.as_millis()));
            }
            if config.max_nodes < u64::MAX {
                self.send_string(format!("Max nodes := {} nodes", config.max_nodes));
            }
        }

        // A helper that started past `max_depth` would finish at once and stop everyone else
        let mut depth = self.start_depth().min(max_depth).max(1);

        'iterative_deepening: while depth <= max_depth && !self.clock.stopped() {
            self.root_depth = depth;
            let mut pv = PrincipalVariation::default();

            /****************************************************************************************************
             * Aspiration Windows: https://www.chessprogramming.org/Aspiration_Windows
             ****************************************************************************************************/
            let mut window = AspirationWindow::new(
                result.score,
                depth,
                self.features.aspiration && result.depth > 0,
            );

            let score = 'aspiration_window: loop {
                let score = self.pvs::<RootNode>(game, depth as i32, 0, window.bounds, &mut pv, true);

                // A cancelled iteration cannot be trusted, so fall back to the previous one
                if self.clock.stopped() {
                    if Log::DEBUG && self.id == 0 {
                        self.send_string(format!(
                            "Search cancelled during depth {depth}, falling back to depth {}",
                            result.depth
                        ));
                    }
                    break 'iterative_deepening;
                }

                if window.fails_low(score) {
                    window.widen_down();
                } else if window.fails_high(score) {
                    window.widen_up();
                } else {
                    break 'aspiration_window score;
                }
            };

            result.score = score;
            result.depth = depth;
            result.nodes = self.nodes;
            result.bestmove = pv.first().or_else(|| {
                self.ttable
                    .probe(&game.key())
                    .map(|entry| entry.bestmove)
                    .filter(|&mv| game.is_legal(mv))
            });
            result.pv = pv;

            report(&result);

            // Nothing deeper can improve on a forced mate
            if score.is_mate() && score > Score::DRAW {
                break;
            }

            if self.clock.soft_timeout_reached() {
                break;
            }

            depth += 1;
        }

        result.nodes = self.nodes;
        result
    }

    /// Primary location of search logic.
    ///
    /// A [principal variation search](https://www.chessprogramming.org/Principal_Variation_Search)
    /// in a fail-hard framework: the returned score is always clamped to `bounds`.
    /// Returns a neutral `0` once the search has been stopped.
    fn pvs<Node: NodeType>(
        &mut self,
        game: &Game,
        mut depth: i32,
        ply: usize,
        mut bounds: SearchBounds,
        pv: &mut PrincipalVariation,
        allow_null: bool,
    ) -> Score {
        // Whatever was here belongs to a sibling
        pv.clear();

        if ply >= MAX_DEPTH {
            return self.evaluator.evaluate(game);
        }

        /****************************************************************************************************
         * Check Extensions: https://www.chessprogramming.org/Check_Extensions
         ****************************************************************************************************/
        let in_check = game.is_in_check();
        if in_check && self.features.check_extension {
            depth += 1;
        }

        /****************************************************************************************************
         * Quiescence Search: https://www.chessprogramming.org/Quiescence_Search
         ****************************************************************************************************/
        if depth <= 0 {
            return if self.features.qsearch {
                self.qsearch(game, self.root_depth as i32, ply, bounds)
            } else {
                self.nodes += 1;
                self.evaluator.evaluate(game)
            };
        }

        self.nodes += 1;
        if self.clock.check(self.nodes) {
            return Score::DRAW;
        }

        // The fifty-move rule does not apply if this node might be delivering mate on the last move
        if !Node::ROOT {
            let mate_in_one = in_check && depth == 1;
            if (game.halfmove() >= 100 && !mate_in_one) || self.history.contains(game.key()) {
                return Score::DRAW;
            }
        }

        /****************************************************************************************************
         * TT Cutoffs: https://www.chessprogramming.org/Transposition_Table#Transposition_Table_Cutoffs
         ****************************************************************************************************/
        let mut tt_move = None;
        if let Some(entry) = self.ttable.probe(&game.key()) {
            if !Node::ROOT && self.features.tt_cutoffs && entry.depth as i32 >= depth {
                if let Some(score) = entry.try_score(bounds, ply) {
                    return score;
                }
            }

            // A colliding key can hand us a move from another position entirely
            if self.features.tt_ordering && game.is_legal(entry.bestmove) {
                tt_move = Some(entry.bestmove);
            }
        }

        let mut can_futility_prune = false;
        if !Node::PV && !in_check {
            let static_eval = self.evaluator.evaluate(game);

            /****************************************************************************************************
             * Reverse Futility Pruning: https://www.chessprogramming.org/Reverse_Futility_Pruning
             ****************************************************************************************************/
            if self.features.reverse_futility && !bounds.beta.is_mate() {
                let rfp_score = static_eval - tune::rfp_margin!() * depth;
                if rfp_score >= bounds.beta {
                    return rfp_score;
                }
            }

            /****************************************************************************************************
             * Null Move Pruning: https://www.chessprogramming.org/Null_Move_Pruning
             *
             * Zugzwang is common with only Kings and Pawns left, so the null move is skipped there.
             ****************************************************************************************************/
            if self.features.null_move
                && allow_null
                && depth >= tune::min_nmp_depth!()
                && game.has_non_pawn_material(game.side_to_move())
            {
                let reduction = tune::nmp_reduction!() + depth / tune::nmp_depth_divisor!();
                let null_depth = (depth - 1 - reduction).max(0);
                let null_game = game.with_nullmove_made();

                let score = {
                    let mut path = PathGuard::new(self, game.key());
                    -path.pvs::<NonPvNode>(
                        &null_game,
                        null_depth,
                        ply + 1,
                        -bounds.null_beta(),
                        &mut PrincipalVariation::default(),
                        false,
                    )
                };

                if score >= bounds.beta && !score.is_mate() {
                    return bounds.beta;
                }
            }

            /****************************************************************************************************
             * Razoring: https://www.chessprogramming.org/Razoring
             ****************************************************************************************************/
            if self.features.razoring && depth <= tune::max_razoring_depth!() {
                let margin = tune::futility_margins!()[depth as usize] * tune::razoring_multiplier!();
                if static_eval + margin < bounds.beta {
                    let score = self.qsearch(game, self.root_depth as i32, ply, bounds);
                    if score < bounds.beta {
                        return score;
                    }
                }
            }

            /****************************************************************************************************
             * Futility Pruning: https://www.chessprogramming.org/Futility_Pruning
             *
             * Decided once per node; quiet moves after the first are skipped in the move loop.
             ****************************************************************************************************/
            let margins = tune::futility_margins!();
            if self.features.futility
                && (depth as usize) < margins.len()
                && !bounds.alpha.is_mate()
                && !bounds.beta.is_mate()
            {
                can_futility_prune = static_eval + margins[depth as usize] <= bounds.alpha;
            }

            // The null move or razoring search may have run out the clock
            if self.clock.stopped() {
                return Score::DRAW;
            }
        }

        // Checkmate or stalemate
        let moves = game.get_legal_moves();
        if moves.is_empty() {
            return if in_check {
                // Closer mates score higher
                Score::mated_in(ply)
            } else {
                Score::DRAW
            };
        }

        let killers = if self.features.killers {
            self.killers[ply]
        } else {
            [None; 2]
        };
        let scorer = MoveScorer::new(game, tt_move, killers);
        let picker = MovePicker::new(moves, |mv| scorer.score(mv));

        let lmp_margins = tune::lmp_margins!();
        let can_late_move_prune = self.features.late_move_pruning
            && !Node::PV
            && !in_check
            && (depth as usize) < lmp_margins.len();

        let original_alpha = bounds.alpha;
        let mut bestmove = Move::NONE;
        let mut local_pv = PrincipalVariation::default();

        /****************************************************************************************************
         * Primary move loop
         ****************************************************************************************************/
        for (i, (mv, _)) in picker.enumerate() {
            /****************************************************************************************************
             * Late Move Pruning: https://www.chessprogramming.org/Futility_Pruning#MoveCountBasedPruning
             ****************************************************************************************************/
            let late = can_late_move_prune && i >= lmp_margins[depth as usize];
            let futile = can_futility_prune && i > 0 && !mv.is_capture();
            if (late || futile) && !mv.is_promotion() && !game.gives_check(mv) {
                continue;
            }

            let child = game.with_move_made(mv);

            /****************************************************************************************************
             * Principal Variation Search: https://en.wikipedia.org/wiki/Principal_variation_search#Pseudocode
             *
             * Only the first move gets the full window. Every later move must first beat alpha in a null
             * window search before it is searched again with the full window.
             ****************************************************************************************************/
            let score = {
                let mut path = PathGuard::new(self, game.key());
                let new_depth = depth - 1;

                if i == 0 {
                    if Node::PV {
                        -path.pvs::<PvNode>(&child, new_depth, ply + 1, -bounds, &mut local_pv, true)
                    } else {
                        -path.pvs::<NonPvNode>(&child, new_depth, ply + 1, -bounds, &mut local_pv, true)
                    }
                } else {
                    let score = -path.pvs::<NonPvNode>(
                        &child,
                        new_depth,
                        ply + 1,
                        -bounds.null_alpha(),
                        &mut local_pv,
                        true,
                    );

                    if Node::PV && score > bounds.alpha && score < bounds.beta {
                        -path.pvs::<PvNode>(&child, new_depth, ply + 1, -bounds, &mut local_pv, true)
                    } else {
                        score
                    }
                }
            };

            if self.clock.stopped() {
                return Score::DRAW;
            }

            if score > bounds.alpha {
                bestmove = mv;

                // Fail high
                if score >= bounds.beta {
                    if self.features.killers {
                        self.killers.update(mv, ply);
                    }
                    bounds.alpha = bounds.beta;
                    break;
                }

                bounds.alpha = score;

                if Node::PV {
                    pv.extend(mv, &local_pv);
                }
            }
        }

        let entry = TTableEntry::new(
            game.key(),
            bestmove,
            bounds.alpha,
            SearchBounds::new(original_alpha, bounds.beta),
            depth.clamp(0, u8::MAX as i32) as u8,
            ply,
            self.ttable.age(),
        );
        self.ttable.store(entry);

        bounds.alpha
    }

    /// Quiescence Search (QSearch)
    ///
    /// Extends the search past the horizon with captures, promotions, and checks until the position is quiet,
    /// or until `depth` more plies have been searched.
    fn qsearch(&mut self, game: &Game, depth: i32, ply: usize, mut bounds: SearchBounds) -> Score {
        self.nodes += 1;
        if self.clock.check(self.nodes) {
            return Score::DRAW;
        }

        // Standing pat is always an option outside of check
        let stand_pat = self.evaluator.evaluate(game);
        if depth <= 0 || ply >= MAX_DEPTH {
            return stand_pat;
        }

        if stand_pat >= bounds.beta {
            return bounds.beta;
        }
        bounds.alpha = bounds.alpha.max(stand_pat);

        // Captures (en passant included), then quiet promotions and checks
        let mut moves: MoveList = game.get_legal_captures();
        moves.extend(
            game.get_legal_moves()
                .into_iter()
                .filter(|&mv| !mv.is_capture() && (mv.is_promotion() || game.gives_check(mv))),
        );

        let scorer = MoveScorer::new(game, None, [None; 2]);

        for (mv, _) in MovePicker::new(moves, |mv| scorer.score(mv)) {
            let score = -self.qsearch(&game.with_move_made(mv), depth - 1, ply + 1, -bounds);

            if self.clock.stopped() {
                return Score::DRAW;
            }

            bounds.alpha = bounds.alpha.max(score);
            if bounds.alpha >= bounds.beta {
                return bounds.beta;
            }
        }

        bounds.alpha
    }
}

impl<Log, E> AsMut<RepetitionHistory> for Search<'_, Log, E> {
    #[inline(always)]
    fn as_mut(&mut self) -> &mut RepetitionHistory {
        &mut self.history
    }
}
