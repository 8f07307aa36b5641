/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Fixed seeds, so that Zobrist keys and magic numbers are identical on every run.
const SEEDS: [u64; 4] = [
    0x3c6e_f372_fe94_f82b,
    0xa54f_f53a_5f1d_36f1,
    0x510e_527f_ade6_82d1,
    0x9b05_688c_2b3e_6c1f,
];

/// A [xoshiro256**](https://prng.di.unimi.it/xoshiro256starstar.c) pseudo-random number generator.
///
/// Usable in `const` contexts through [`XoShiRo::get_next_const`].
#[derive(Clone, Debug)]
pub struct XoShiRo([u64; 4]);

impl XoShiRo {
    #[inline(always)]
    pub const fn new() -> Self {
        Self::from_seeds(SEEDS)
    }

    #[inline(always)]
    pub const fn from_seeds(seeds: [u64; 4]) -> Self {
        Self(seeds)
    }

    /// Advances the generator, returning the next number.
    #[inline(always)]
    pub fn get_next(&mut self) -> u64 {
        let (result, s) = Self::step(self.0);
        self.0 = s;
        result
    }

    /// A number with roughly one bit in eight set, which makes a good magic candidate.
    #[inline(always)]
    pub fn get_sparse(&mut self) -> u64 {
        self.get_next() & self.get_next() & self.get_next()
    }

    /// `const` analog of [`XoShiRo::get_next`], returning `(next, Self)`.
    #[inline(always)]
    pub const fn get_next_const(self) -> (u64, Self) {
        let (result, s) = Self::step(self.0);
        (result, Self(s))
    }

    const fn step(mut s: [u64; 4]) -> (u64, [u64; 4]) {
        let result = s[1].wrapping_mul(5).rotate_left(7).wrapping_mul(9);
        let t = s[1] << 17;

        s[2] ^= s[0];
        s[3] ^= s[1];
        s[1] ^= s[2];
        s[0] ^= s[3];
        s[2] ^= t;
        s[3] = s[3].rotate_left(45);

        (result, s)
    }
}

impl Default for XoShiRo {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}
