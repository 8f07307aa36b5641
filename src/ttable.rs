/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::{Move, Score, SearchBounds, ZobristKey};

/// Number of bytes in a megabyte
const BYTES_IN_MB: usize = 1024 * 1024;

/// Number of slots sampled when estimating how full the table is.
const HASHFULL_SAMPLE: usize = 1000;

/// What the score of a [`TTableEntry`] says about the true score of its node.
///
/// See [CPW](https://www.chessprogramming.org/Node_Types) for more.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash)]
pub enum Bound {
    /// The score is exact.
    Exact = 1,

    /// The true score is at least this high (the node failed high).
    Lower = 2,

    /// The true score is at most this high (no move raised alpha).
    Upper = 3,
}

impl Bound {
    /// Classifies `score` against the window it was searched with.
    ///
    /// ```text
    /// if score <= alpha:
    ///     UPPER
    /// else if score >= beta:
    ///     LOWER
    /// else:
    ///     EXACT
    /// ```
    #[inline(always)]
    pub fn new(score: Score, bounds: SearchBounds) -> Self {
        if score <= bounds.alpha {
            Self::Upper
        } else if score >= bounds.beta {
            Self::Lower
        } else {
            Self::Exact
        }
    }

    #[inline(always)]
    const fn from_bits(bits: u64) -> Option<Self> {
        match bits {
            1 => Some(Self::Exact),
            2 => Some(Self::Lower),
            3 => Some(Self::Upper),
            _ => None,
        }
    }
}

/// An entry into a hash table
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct TTableEntry {
    /// Key of the node this entry represents.
    pub key: ZobristKey,

    /// Best move found for this position, or [`Move::NONE`].
    pub bestmove: Move,

    /// Best score found for this position, measured from this node rather than the root.
    pub score: Score,

    /// Depth at which the data for this entry was found.
    pub depth: u8,

    /// How `score` relates to the true score.
    pub bound: Bound,

    /// Generation of the search that wrote this entry.
    pub age: bool,
}

impl TTableEntry {
    const MOVE_SHIFT: u64 = 0;
    const SCORE_SHIFT: u64 = 16;
    const DEPTH_SHIFT: u64 = 32;
    const BOUND_SHIFT: u64 = 40;
    const AGE_SHIFT: u64 = 42;

    /// Creates a new [`TTableEntry`] from the provided parameters.
    ///
    /// The bound is derived from `score` and the window it was searched with,
    /// and mate scores are re-based from distance-to-root to distance-from-this-node.
    #[inline(always)]
    pub fn new(
        key: ZobristKey,
        bestmove: Move,
        score: Score,
        bounds: SearchBounds,
        depth: u8,
        ply: usize,
        age: bool,
    ) -> Self {
        // Classify before adjusting, since the window is measured from the root
        let bound = Bound::new(score, bounds);

        Self {
            key,
            bestmove,
            score: score.relative(ply),
            depth,
            bound,
            age,
        }
    }

    /// Determine whether the score in this entry can be used and, if so, return it.
    ///
    /// An entry's score can be used if and only if:
    ///     1. The entry is exact ([`Bound::Exact`]).
    ///     2. The entry is an upper bound ([`Bound::Upper`]) and its score is `<= alpha`.
    ///     3. The entry is a lower bound ([`Bound::Lower`]) and its score is `>= beta`.
    #[inline(always)]
    pub fn try_score(&self, bounds: SearchBounds, ply: usize) -> Option<Score> {
        let score = self.score.absolute(ply);

        match self.bound {
            Bound::Exact => Some(score),
            Bound::Upper if score <= bounds.alpha => Some(score),
            Bound::Lower if score >= bounds.beta => Some(score),
            _ => None,
        }
    }

    /// Packs everything but the key into one word.
    #[inline(always)]
    fn pack(&self) -> u64 {
        (self.bestmove.bits() as u64) << Self::MOVE_SHIFT
            | (self.score.inner() as i16 as u16 as u64) << Self::SCORE_SHIFT
            | (self.depth as u64) << Self::DEPTH_SHIFT
            | (self.bound as u64) << Self::BOUND_SHIFT
            | (self.age as u64) << Self::AGE_SHIFT
    }

    /// Inverse of [`TTableEntry::pack`]. Yields `None` for an empty slot.
    #[inline(always)]
    fn unpack(key: ZobristKey, data: u64) -> Option<Self> {
        let bound = Bound::from_bits((data >> Self::BOUND_SHIFT) & 0b11)?;

        Some(Self {
            key,
            bestmove: Move::from_bits((data >> Self::MOVE_SHIFT) as u16),
            score: Score::new((data >> Self::SCORE_SHIFT) as u16 as i16 as i32),
            depth: (data >> Self::DEPTH_SHIFT) as u8,
            bound,
            age: (data >> Self::AGE_SHIFT) & 1 != 0,
        })
    }
}

/// One bucket of the table.
///
/// The first word holds `key ^ data`, so a slot whose two words were written by different threads
/// fails the key check and reads as a miss.
#[derive(Debug, Default)]
struct Slot {
    checksum: AtomicU64,
    data: AtomicU64,
}

/// Transposition Table.
///
/// Used during a search to keep track of previous search results on positions,
/// avoiding unnecessary re-computations.
///
/// Every method takes `&self`, so one table can be shared between search threads without locking.
#[derive(Debug)]
pub struct TTable {
    /// Internal cache of the TTable.
    cache: Vec<Slot>,

    /// Current generation, flipped once per search.
    age: AtomicBool,
}

impl TTable {
    /// Default size of the Transposition Table, in megabytes.
    pub const DEFAULT_SIZE: usize = 64;

    /// Minimum size of the Transposition Table, in megabytes.
    pub const MIN_SIZE: usize = 1;

    /// Maximum size of the Transposition Table, in megabytes.
    pub const MAX_SIZE: usize = 32_000;

    /// Create a new [`TTable`] that is `size` megabytes.
    #[inline(always)]
    pub fn new(size: usize) -> Self {
        Self::from_capacity(size.max(Self::MIN_SIZE) * BYTES_IN_MB / size_of::<Slot>())
    }

    /// Create a new [`TTable`] that can hold `capacity` entries.
    #[inline(always)]
    pub fn from_capacity(capacity: usize) -> Self {
        let mut cache = Vec::with_capacity(capacity.max(1));
        cache.resize_with(capacity.max(1), Slot::default);

        Self {
            cache,
            age: AtomicBool::new(false),
        }
    }

    /// Re-allocates this table to be `size` megabytes, discarding every entry.
    #[inline(always)]
    pub fn resize(&mut self, size: usize) {
        *self = Self::new(size);
    }

    /// Zeroes every slot of this [`TTable`] and resets its age.
    #[inline(always)]
    pub fn clear(&self) {
        for slot in &self.cache {
            slot.checksum.store(0, Ordering::Relaxed);
            slot.data.store(0, Ordering::Relaxed);
        }
        self.age.store(false, Ordering::Relaxed);
    }

    /// Returns the number of entries that can fit within this [`TTable`]
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.cache.len()
    }

    /// Returns the size of this [`TTable`], in megabytes.
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.cache.len() * size_of::<Slot>() / BYTES_IN_MB
    }

    /// Returns the number of occupied slots in this [`TTable`].
    #[inline(always)]
    pub fn num_entries(&self) -> usize {
        self.cache
            .iter()
            .filter(|slot| slot.data.load(Ordering::Relaxed) != 0)
            .count()
    }

    /// Permille of sampled slots written during the current generation, as reported by `info hashfull`.
    pub fn hashfull(&self) -> usize {
        let age = self.age();
        let sample = self.capacity().min(HASHFULL_SAMPLE);
        let used = self.cache[..sample]
            .iter()
            .filter_map(|slot| {
                let data = slot.data.load(Ordering::Relaxed);
                TTableEntry::unpack(ZobristKey::default(), data)
            })
            .filter(|entry| entry.age == age)
            .count();

        used * 1000 / sample
    }

    /// Current generation of this table.
    #[inline(always)]
    pub fn age(&self) -> bool {
        self.age.load(Ordering::Relaxed)
    }

    /// Starts a new generation. Entries from the previous one become preferred victims for replacement.
    #[inline(always)]
    pub fn toggle_age(&self) {
        self.age.fetch_xor(true, Ordering::Relaxed);
    }

    /// Map `key` to an index into this [`TTable`].
    #[inline(always)]
    pub fn index(&self, key: &ZobristKey) -> usize {
        (key.inner() % self.capacity() as u64) as usize
    }

    /// Get the entry if and only if it matches the provided key.
    #[inline(always)]
    pub fn probe(&self, key: &ZobristKey) -> Option<TTableEntry> {
        let slot = &self.cache[self.index(key)];
        let checksum = slot.checksum.load(Ordering::Relaxed);
        let data = slot.data.load(Ordering::Relaxed);

        if checksum ^ data != key.inner() {
            return None;
        }

        TTableEntry::unpack(*key, data)
    }

    /// Store `entry` in the table at `entry.key`, unless the slot holds something more valuable.
    ///
    /// The slot is overwritten when it is empty, when it holds a different position from an older generation,
    /// or when it is from this generation and no deeper than `entry`.
    ///
    /// Returns `true` if `entry` was written.
    #[inline(always)]
    pub fn store(&self, entry: TTableEntry) -> bool {
        let slot = &self.cache[self.index(&entry.key)];
        let old_checksum = slot.checksum.load(Ordering::Relaxed);
        let old_data = slot.data.load(Ordering::Relaxed);
        let old_key = old_checksum ^ old_data;

        let replace = match TTableEntry::unpack(ZobristKey::default(), old_data) {
            None => true,
            Some(old) if old.age != entry.age && old_key != entry.key.inner() => true,
            Some(old) => old.depth <= entry.depth,
        };

        if replace {
            let data = entry.pack();
            slot.checksum
                .store(entry.key.inner() ^ data, Ordering::Relaxed);
            slot.data.store(data, Ordering::Relaxed);
        }

        replace
    }
}

impl Default for TTable {
    #[inline(always)]
    fn default() -> Self {
        Self::new(Self::DEFAULT_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::*;

    fn entry(key: ZobristKey, score: i32, depth: u8, age: bool) -> TTableEntry {
        TTableEntry {
            key,
            bestmove: Move::new(Square::E2, Square::E4, MoveKind::PawnDoublePush),
            score: Score::new(score),
            depth,
            bound: Bound::Exact,
            age,
        }
    }

    /// Two different keys that land in the same bucket of a two-slot table.
    fn colliding_keys() -> (ZobristKey, ZobristKey) {
        let pos1 = Game::default();
        let mut pos2 = Game::from_fen(FEN_KIWIPETE).unwrap();

        while pos1.key().inner() % 2 != pos2.key().inner() % 2 {
            let mv = pos2.get_legal_moves()[0];
            pos2 = pos2.with_move_made(mv);
        }

        (pos1.key(), pos2.key())
    }

    #[test]
    fn test_probe_after_store() {
        let tt = TTable::from_capacity(64);
        let key = Game::default().key();
        assert!(tt.probe(&key).is_none(), "TTable should initialize to being empty");

        let stored = entry(key, -123, 7, tt.age());
        assert!(tt.store(stored));
        assert_eq!(tt.probe(&key), Some(stored));
        assert_eq!(tt.num_entries(), 1);
    }

    #[test]
    fn test_packing_preserves_fields() {
        let key = Game::from_fen(FEN_KIWIPETE).unwrap().key();
        for (score, bound) in [
            (Score::MATE - 3, Bound::Lower),
            (-(Score::MATE - 8), Bound::Upper),
            (Score::new(-1), Bound::Exact),
        ] {
            let stored = TTableEntry {
                key,
                bestmove: Move::new(Square::A7, Square::B8, MoveKind::CaptureAndPromoteQueen),
                score,
                depth: u8::MAX,
                bound,
                age: true,
            };
            assert_eq!(TTableEntry::unpack(key, stored.pack()), Some(stored));
        }
    }

    #[test]
    fn test_shallower_same_age_does_not_overwrite() {
        let tt = TTable::from_capacity(2);
        let (key1, key2) = colliding_keys();

        let deep = entry(key1, 50, 9, tt.age());
        tt.store(deep);

        assert!(!tt.store(entry(key2, 10, 3, tt.age())));
        assert_eq!(tt.probe(&key1), Some(deep));
        assert!(tt.probe(&key2).is_none());

        // Equal depth is enough.
        let equal = entry(key2, 10, 9, tt.age());
        assert!(tt.store(equal));
        assert!(tt.probe(&key1).is_none(), "Cannot get an entry that has been overridden");
        assert_eq!(tt.probe(&key2), Some(equal));
    }

    #[test]
    fn test_new_age_overwrites() {
        let tt = TTable::from_capacity(2);
        let (key1, key2) = colliding_keys();

        tt.store(entry(key1, 50, 20, tt.age()));
        tt.toggle_age();

        let fresh = entry(key2, 10, 1, tt.age());
        assert!(tt.store(fresh));
        assert_eq!(tt.probe(&key2), Some(fresh));
    }

    #[test]
    fn test_torn_slot_reads_as_miss() {
        let tt = TTable::from_capacity(2);
        let (key1, _) = colliding_keys();

        tt.store(entry(key1, 50, 4, tt.age()));
        let slot = &tt.cache[tt.index(&key1)];
        slot.data.fetch_xor(1 << TTableEntry::DEPTH_SHIFT, Ordering::Relaxed);

        assert!(tt.probe(&key1).is_none());
    }

    #[test]
    fn test_clear_and_hashfull() {
        let tt = TTable::from_capacity(4);
        let key = Game::default().key();
        tt.store(entry(key, 0, 1, tt.age()));
        assert_eq!(tt.hashfull(), 250);

        tt.clear();
        assert_eq!(tt.num_entries(), 0);
        assert!(tt.probe(&key).is_none());
        assert_eq!(tt.hashfull(), 0);
    }

    #[test]
    fn test_try_score() {
        let bounds = SearchBounds::new(Score::new(-50), Score::new(50));
        let key = Game::default().key();

        let lower = TTableEntry::new(key, Move::NONE, Score::new(80), bounds, 3, 0, false);
        assert_eq!(lower.bound, Bound::Lower);
        assert_eq!(lower.try_score(bounds, 0), Some(Score::new(80)));
        assert_eq!(
            lower.try_score(SearchBounds::new(Score::new(0), Score::new(100)), 0),
            None
        );

        let upper = TTableEntry::new(key, Move::NONE, Score::new(-50), bounds, 3, 0, false);
        assert_eq!(upper.bound, Bound::Upper);
        assert_eq!(upper.try_score(bounds, 0), Some(Score::new(-50)));

        // A mate found 6 plies from the root while 2 plies deep is stored as 4 plies from the node.
        let wide = SearchBounds::default();
        let mate = TTableEntry::new(key, Move::NONE, Score::MATE - 6, wide, 3, 2, false);
        assert_eq!(mate.score, Score::MATE - 4);
        assert_eq!(mate.try_score(wide, 5), Some(Score::MATE - 9));
    }
}
