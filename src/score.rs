/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use uci_parser::UciScore;

use crate::MAX_DEPTH;

/// A numerical representation of the evaluation of a position / move, in units of ["centipawns"](https://www.chessprogramming.org/Score).
///
/// Every score fits in an `i16`, which is how the transposition table stores it.
#[derive(Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Score(pub(crate) i32);

impl Score {
    /// Largest possible score ever achievable.
    pub const INF: Self = Self(32_000);

    /// Score of delivering mate in the current position.
    pub const MATE: Self = Self(31_000);

    /// Score of a draw.
    pub const DRAW: Self = Self(0);

    /// Lowest possible score for mate.
    ///
    /// This is only obtainable if mate is possible in [`MAX_DEPTH`] plies.
    pub const LOWEST_MATE: Self = Self(Self::MATE.0 - MAX_DEPTH as i32);

    #[inline(always)]
    pub const fn new(score: i32) -> Self {
        Self(score)
    }

    #[inline(always)]
    pub const fn inner(&self) -> i32 {
        self.0
    }

    /// The score of being mated `ply` plies from the root.
    #[inline(always)]
    pub const fn mated_in(ply: usize) -> Self {
        Self(-Self::MATE.0 + ply as i32)
    }

    /// Returns `true` if the score is a mate score, for either side.
    #[inline(always)]
    pub const fn is_mate(&self) -> bool {
        self.0.abs() >= Self::LOWEST_MATE.0
    }

    /// Converts this [`Score`] into a [`UciScore`], either centipawns or moves to mate.
    #[inline(always)]
    pub fn into_uci(self) -> UciScore {
        if self.is_mate() {
            UciScore::mate(self.moves_to_mate())
        } else {
            UciScore::cp(self.0)
        }
    }

    /// Returns the number of plies (half moves) this score is from mate.
    #[inline(always)]
    pub const fn plies_to_mate(&self) -> i32 {
        Self::MATE.0 - self.0.abs()
    }

    /// Returns the number of moves (full moves) this score is from mate.
    ///
    /// Negative if the side to move is getting mated.
    #[inline(always)]
    pub const fn moves_to_mate(&self) -> i32 {
        let plies = self.plies_to_mate();
        let moves = (plies + 1) / 2;
        if self.0 > 0 {
            moves
        } else {
            -moves
        }
    }

    /// Converts a mate score measured from the root into one measured from a node `ply` plies deep.
    ///
    /// Used when writing to the transposition table.
    #[inline(always)]
    pub const fn relative(self, ply: usize) -> Self {
        let ply = ply as i32;
        if !self.is_mate() {
            self
        } else if self.0 > 0 {
            Self(self.0 + ply)
        } else {
            Self(self.0 - ply)
        }
    }

    /// Inverse of [`Score::relative`]: re-bases a node-relative mate score onto the root.
    ///
    /// Used when reading from the transposition table.
    #[inline(always)]
    pub const fn absolute(self, ply: usize) -> Self {
        let ply = ply as i32;
        if !self.is_mate() {
            self
        } else if self.0 > 0 {
            Self(self.0 - ply)
        } else {
            Self(self.0 + ply)
        }
    }

    #[inline(always)]
    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// Performs linear interpolation between `self` and `other` by `t / max`.
    #[inline(always)]
    pub const fn lerp(self, other: Self, t: i32, max: i32) -> Self {
        Self((self.0 * (max - t) + other.0 * t) / max)
    }
}

impl From<Score> for UciScore {
    #[inline(always)]
    fn from(value: Score) -> Self {
        value.into_uci()
    }
}

macro_rules! impl_binary_op {
    ($trait:tt, $fn:ident) => {
        impl std::ops::$trait for Score {
            type Output = Self;

            #[inline(always)]
            fn $fn(self, rhs: Self) -> Self::Output {
                Self(self.0.$fn(rhs.0))
            }
        }

        impl std::ops::$trait<i32> for Score {
            type Output = Self;

            #[inline(always)]
            fn $fn(self, rhs: i32) -> Self::Output {
                Self(self.0.$fn(rhs))
            }
        }
    };
}

macro_rules! impl_binary_op_assign {
    ($trait:tt, $fn:ident) => {
        impl std::ops::$trait for Score {
            #[inline(always)]
            fn $fn(&mut self, rhs: Self) {
                self.0.$fn(rhs.0);
            }
        }

        impl std::ops::$trait<i32> for Score {
            #[inline(always)]
            fn $fn(&mut self, rhs: i32) {
                self.0.$fn(rhs);
            }
        }
    };
}

impl_binary_op!(Add, add);
impl_binary_op!(Sub, sub);
impl_binary_op!(Mul, mul);

impl_binary_op_assign!(AddAssign, add_assign);
impl_binary_op_assign!(SubAssign, sub_assign);

impl std::ops::Neg for Score {
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl fmt::Display for Score {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_mate() {
            write!(
                f,
                "{} (mate in {} plies, {} moves)",
                self.0,
                self.plies_to_mate(),
                self.moves_to_mate()
            )
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_fits_in_tt_storage() {
        assert!(Score::INF.0 <= i16::MAX as i32);
        assert!(-Score::INF.0 >= i16::MIN as i32);
        assert!(Score::LOWEST_MATE > Score::new(0));
    }

    #[test]
    fn test_relative_absolute() {
        let ply = 3;

        // Mate found 5 plies from the root, seen from a node 3 plies deep.
        let our_mate = Score::MATE - 5;
        assert_eq!(our_mate.relative(ply), Score::MATE - 2);
        assert_eq!(our_mate.relative(ply).absolute(ply), our_mate);

        let their_mate = -(Score::MATE - 5);
        assert_eq!(their_mate.relative(ply), -(Score::MATE - 2));
        assert_eq!(their_mate.relative(ply).absolute(ply), their_mate);

        // Ordinary scores are untouched.
        assert_eq!(Score::new(150).relative(ply), Score::new(150));
    }

    #[test]
    fn test_moves_to_mate() {
        // Mate on our next move is 1 ply away.
        assert_eq!((Score::MATE - 1).moves_to_mate(), 1);
        assert_eq!((Score::MATE - 3).moves_to_mate(), 2);

        // Being mated right now, or after our reply.
        assert_eq!(Score::mated_in(0).moves_to_mate(), 0);
        assert_eq!(Score::mated_in(2).moves_to_mate(), -1);
        assert_eq!(Score::mated_in(4).moves_to_mate(), -2);

        assert!(Score::mated_in(MAX_DEPTH).is_mate());
        assert!(!Score::new(900).is_mate());
    }

    #[test]
    fn test_lerp() {
        let mg = Score::new(100);
        let eg = Score::new(200);
        assert_eq!(mg.lerp(eg, 0, 24), mg);
        assert_eq!(mg.lerp(eg, 24, 24), eg);
        assert_eq!(mg.lerp(eg, 12, 24), Score::new(150));
    }
}
