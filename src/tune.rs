/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Default number of moves left in the game when `movestogo` is not given.
macro_rules! soft_timeout_divisor {
    () => {
        20
    };
}
pub(crate) use soft_timeout_divisor;

/// Divisor for computing the hard timeout of a search.
macro_rules! hard_timeout_divisor {
    () => {
        3
    };
}
pub(crate) use hard_timeout_divisor;

/// Divisor for computing how much of the time increment to use.
macro_rules! time_inc_divisor {
    () => {
        2
    };
}
pub(crate) use time_inc_divisor;

/// Milliseconds kept in reserve for communication lag.
macro_rules! move_overhead {
    () => {
        10
    };
}
pub(crate) use move_overhead;

/// Half-width of the first Aspiration Window.
macro_rules! initial_aspiration_window_delta {
    () => {
        25
    };
}
pub(crate) use initial_aspiration_window_delta;

/// Half-width of the Aspiration Window after the first failure.
macro_rules! wide_aspiration_window_delta {
    () => {
        100
    };
}
pub(crate) use wide_aspiration_window_delta;

/// Minimum depth to incorporate Aspiration Windows into the Iterative Deepening search.
macro_rules! min_aspiration_window_depth {
    () => {
        2
    };
}
pub(crate) use min_aspiration_window_depth;

/// Value to multiply depth by when computing the reverse futility margin.
macro_rules! rfp_margin {
    () => {
        85
    };
}
pub(crate) use rfp_margin;

/// Minimum depth at which null move pruning can be applied.
macro_rules! min_nmp_depth {
    () => {
        2
    };
}
pub(crate) use min_nmp_depth;

/// Base depth reduction of null move pruning.
macro_rules! nmp_reduction {
    () => {
        3
    };
}
pub(crate) use nmp_reduction;

/// Every this many plies of depth add one more ply of null move reduction.
macro_rules! nmp_depth_divisor {
    () => {
        6
    };
}
pub(crate) use nmp_depth_divisor;

/// Maximum depth at which to apply razoring.
macro_rules! max_razoring_depth {
    () => {
        2
    };
}
pub(crate) use max_razoring_depth;

/// Value to multiply the futility margin by when razoring.
macro_rules! razoring_multiplier {
    () => {
        3
    };
}
pub(crate) use razoring_multiplier;

/// Futility margins, indexed by depth.
macro_rules! futility_margins {
    () => {
        [0, 100, 160, 220, 280, 340, 400, 460, 520]
    };
}
pub(crate) use futility_margins;

/// Number of moves searched before late move pruning kicks in, indexed by depth.
macro_rules! lmp_margins {
    () => {
        [0, 8, 12, 16, 20, 24]
    };
}
pub(crate) use lmp_margins;

/// Base score of captures and killers when ordering moves, so they sort above quiets.
macro_rules! mvv_lva_offset {
    () => {
        10_000 - 256
    };
}
pub(crate) use mvv_lva_offset;

/// Bonus on top of [`mvv_lva_offset`] for the hash or PV move.
macro_rules! preferred_move_bonus {
    () => {
        65
    };
}
pub(crate) use preferred_move_bonus;

/// Penalties relative to [`mvv_lva_offset`] for the first and second killer moves.
macro_rules! killer_penalties {
    () => {
        [10, 20]
    };
}
pub(crate) use killer_penalties;

/// Middle-game bonus for the side to move.
macro_rules! tempo_bonus {
    () => {
        14
    };
}
pub(crate) use tempo_bonus;

/// `(middle-game, end-game)` penalty for a Pawn with no friendly Pawns on adjacent files.
macro_rules! isolated_pawn_penalty {
    () => {
        (17, 6)
    };
}
pub(crate) use isolated_pawn_penalty;

/// `(middle-game, end-game)` penalty for a Pawn with a friendly Pawn in front of it.
macro_rules! doubled_pawn_penalty {
    () => {
        (1, 16)
    };
}
pub(crate) use doubled_pawn_penalty;

/// Middle-game bonus for a Rook on a file with no Pawns.
macro_rules! rook_open_file_bonus {
    () => {
        23
    };
}
pub(crate) use rook_open_file_bonus;

/// `(middle-game, end-game)` bonus for owning two or more Bishops.
macro_rules! bishop_pair_bonus {
    () => {
        (22, 30)
    };
}
pub(crate) use bishop_pair_bonus;
