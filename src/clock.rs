/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use uci_parser::UciSearchOptions;

use crate::{tune, Color, MAX_DEPTH};

/// The wall clock is only consulted once every this many nodes.
const CLOCK_POLL_MASK: u64 = 1024 - 1;

/// Configuration variables for executing a [`crate::Search`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Maximum depth to execute the search.
    pub max_depth: usize,

    /// Node allowance, per search thread.
    ///
    /// If the search exceeds this many nodes, it will exit as quickly as possible.
    pub max_nodes: u64,

    /// Soft limit on search time.
    ///
    /// During iterative deepening, if a search concludes and this timeout is exceeded,
    /// the entire search will exit, since there probably isn't enough time remaining
    /// to conduct a search at a deeper depth.
    pub soft_timeout: Duration,

    /// Hard limit on search time.
    ///
    /// During *any* point in the search, if this limit is exceeded, the search will cancel.
    pub hard_timeout: Duration,
}

impl SearchConfig {
    /// Constructs a new [`SearchConfig`] from the provided UCI options.
    ///
    /// The side to move determines which clock and increment are used for the timeouts.
    pub fn new(options: UciSearchOptions, side_to_move: Color) -> Self {
        let mut config = Self::default();

        // If supplied, set the max depth / node allowance
        if let Some(depth) = options.depth {
            config.max_depth = (depth as usize).min(MAX_DEPTH);
        }

        if let Some(nodes) = options.nodes {
            config.max_nodes = nodes as u64;
        }

        // If `movetime` was supplied, search that long.
        if let Some(movetime) = options.movetime {
            config.hard_timeout = movetime;
            config.soft_timeout = movetime;
        } else {
            // Otherwise, search based on time remaining and increment
            let (time, inc) = match side_to_move {
                Color::White => (options.wtime, options.winc),
                Color::Black => (options.btime, options.binc),
            };

            // Only calculate timeouts if a time was provided
            if let Some(time) = time {
                let inc = inc.unwrap_or(Duration::ZERO) / tune::time_inc_divisor!();
                let moves_to_go = options
                    .movestogo
                    .map(|moves| moves as u32)
                    .filter(|&moves| moves > 0)
                    .unwrap_or(tune::soft_timeout_divisor!());
                let overhead = Duration::from_millis(tune::move_overhead!());

                config.soft_timeout = time / moves_to_go + inc;
                config.hard_timeout = (time / tune::hard_timeout_divisor!() + inc)
                    .min(time.saturating_sub(overhead))
                    .max(config.soft_timeout);
            }
        }

        config
    }
}

impl Default for SearchConfig {
    /// A default [`SearchConfig`] will permit an "infinite" search.
    ///
    /// The word "infinite" is quoted here because the actual defaults are the `::MAX` values for each field.
    #[inline(always)]
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            max_nodes: u64::MAX,
            soft_timeout: Duration::MAX,
            hard_timeout: Duration::MAX,
        }
    }
}

/// Decides when a search must end.
///
/// The stop flag is shared between every search thread and the engine, so raising it
/// anywhere (a node cap, a timeout, or the `stop` command) stops everyone. Once raised it stays raised.
#[derive(Debug, Clone)]
pub struct Clock {
    /// Start time of the search.
    starttime: Instant,

    config: SearchConfig,

    /// If this is ever `true`, the search must exit as soon as possible.
    stop: Arc<AtomicBool>,
}

impl Clock {
    /// Starts the clock now.
    #[inline(always)]
    pub fn new(config: SearchConfig, stop: Arc<AtomicBool>) -> Self {
        Self {
            starttime: Instant::now(),
            config,
            stop,
        }
    }

    /// Starts the clock now, with a stop flag nobody else can raise.
    #[inline(always)]
    pub fn standalone(config: SearchConfig) -> Self {
        Self::new(config, Arc::default())
    }

    #[inline(always)]
    pub const fn config(&self) -> &SearchConfig {
        &self.config
    }

    #[inline(always)]
    pub fn elapsed(&self) -> Duration {
        self.starttime.elapsed()
    }

    /// Returns `true` if the search has been told to stop.
    #[inline(always)]
    pub fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Raises the stop flag.
    #[inline(always)]
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Called once per node with the number of nodes searched so far.
    ///
    /// Raises the stop flag if the node allowance is used up or, every 1024 nodes, if the hard timeout has passed.
    /// Returns whether the search should stop.
    #[inline(always)]
    pub fn check(&self, nodes: u64) -> bool {
        if nodes >= self.config.max_nodes
            || (nodes & CLOCK_POLL_MASK == 0 && self.elapsed() >= self.config.hard_timeout)
        {
            self.stop();
        }

        self.stopped()
    }

    /// Returns `true` if there is not enough time left to start another iteration.
    #[inline(always)]
    pub fn soft_timeout_reached(&self) -> bool {
        self.elapsed() >= self.config.soft_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uci_parser::UciCommand;

    fn go(args: &str, stm: Color) -> SearchConfig {
        let Ok(UciCommand::Go(options)) = UciCommand::new(&format!("go {args}")) else {
            panic!("failed to parse `go {args}`");
        };
        SearchConfig::new(options, stm)
    }

    #[test]
    fn test_movetime() {
        let config = go("movetime 100", Color::White);
        assert_eq!(config.soft_timeout, Duration::from_millis(100));
        assert_eq!(config.hard_timeout, Duration::from_millis(100));
        assert_eq!(config.max_depth, MAX_DEPTH);
    }

    #[test]
    fn test_clock_time() {
        let config = go("wtime 60000 btime 20000 winc 1000 binc 0", Color::Black);
        assert_eq!(config.soft_timeout, Duration::from_millis(1000));
        assert_eq!(
            config.hard_timeout,
            Duration::from_millis(20000) / 3
        );

        let config = go("wtime 60000 btime 20000 winc 1000 binc 0 movestogo 10", Color::White);
        assert_eq!(config.soft_timeout, Duration::from_millis(6000 + 500));
        assert_eq!(config.hard_timeout, Duration::from_millis(20000 + 500));
    }

    #[test]
    fn test_low_time_hard_never_below_soft() {
        let config = go("wtime 15 winc 0", Color::White);
        assert!(config.hard_timeout >= config.soft_timeout);
        assert!(config.hard_timeout <= Duration::from_millis(15));
    }

    #[test]
    fn test_depth_and_nodes() {
        let config = go("depth 250 nodes 5000", Color::White);
        assert_eq!(config.max_depth, MAX_DEPTH);
        assert_eq!(config.max_nodes, 5000);
        assert_eq!(config.soft_timeout, Duration::MAX);

        let config = go("infinite", Color::White);
        assert_eq!(config, SearchConfig::default());
    }

    #[test]
    fn test_clock_stops_on_nodes() {
        let clock = Clock::standalone(SearchConfig {
            max_nodes: 10,
            ..Default::default()
        });

        assert!(!clock.check(9));
        assert!(clock.check(10));

        // Sticky
        assert!(clock.check(1));
        assert!(clock.stopped());
    }

    #[test]
    fn test_clock_stops_on_hard_timeout() {
        let clock = Clock::standalone(SearchConfig {
            hard_timeout: Duration::ZERO,
            ..Default::default()
        });

        // Time is only polled on multiples of 1024
        assert!(!clock.check(1023));
        assert!(clock.check(2048));
    }

    #[test]
    fn test_shared_stop_flag() {
        let stop = Arc::new(AtomicBool::new(false));
        let clock = Clock::new(SearchConfig::default(), Arc::clone(&stop));
        assert!(!clock.check(1));

        stop.store(true, Ordering::Relaxed);
        assert!(clock.stopped());
    }
}
