/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Board representation, move generation, and everything else needed to play legal chess.
mod board;

/// Parsing of commands sent to the engine.
mod cli;

/// Search limits and the clock that enforces them.
mod clock;

/// Code related to the engine's functionality, such as user input handling.
mod engine;

/// Errors that can occur anywhere in the engine.
mod error;

/// Evaluation of chess positions.
mod eval;

/// Killer move heuristic.
mod killers;

/// Move ordering.
mod movepicker;

/// Piece-square tables.
mod psqt;

/// Positions already seen on the path to the current node.
mod repetition;

/// Centipawn and mate scores.
mod score;

/// Main engine logic; all search related code.
mod search;

/// Multi-threaded search.
mod smp;

/// Transposition table.
mod ttable;

/// Tunable search and evaluation parameters.
mod tune;

/// Misc utility functions, constants, and types.
mod utils;

pub use board::*;
pub use cli::*;
pub use clock::*;
pub use engine::*;
pub use error::*;
pub use eval::*;
pub use killers::*;
pub use movepicker::*;
use psqt::*;
pub use repetition::*;
pub use score::*;
pub use search::*;
pub use smp::*;
pub use ttable::*;
pub use utils::*;
