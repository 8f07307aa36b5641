/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{sync::mpsc, thread, time::Duration};

use uci_parser::{UciInfo, UciResponse};

use crate::{
    Clock, Evaluator, Game, KillerTable, LogLevel, RepetitionHistory, Search, SearchError,
    SearchFeatures, SearchResult, TTable,
};

/// Number of unread results each search thread may queue up before it blocks.
const QUEUE_DEPTH_PER_THREAD: usize = 4;

/// What a search thread tells the coordinator.
enum WorkerMessage {
    /// A depth was completed by the thread with this index.
    Depth(usize, SearchResult),

    /// The thread with this index has exited after searching this many nodes.
    Done(usize, u64),
}

/// Searches `game` with [Lazy SMP](https://www.chessprogramming.org/Lazy_SMP): one search thread per killer table,
/// all sharing `ttable` and the stop flag inside `clock`.
///
/// The first thread to finish stops all the others. The deepest completed result from any thread wins,
/// with its node count replaced by the total over all threads.
/// If `Log::INFO` is set, one `info` line is printed for each new deepest result, followed by exactly one `bestmove`.
pub fn search_position<Log: LogLevel, E: Evaluator>(
    game: &Game,
    history: &RepetitionHistory,
    ttable: &TTable,
    killers: &mut [KillerTable],
    evaluator: &E,
    clock: Clock,
) -> Result<SearchResult, SearchError> {
    let legal_moves = game.get_legal_moves();
    let Some(&fallback) = legal_moves.first() else {
        if Log::INFO {
            println!("{}", UciResponse::info_string(SearchError::NoLegalMoves));
            println!(
                "{}",
                UciResponse::BestMove {
                    bestmove: Some("0000"),
                    ponder: None,
                }
            );
        }
        return Err(SearchError::NoLegalMoves);
    };

    // Entries written by this search are "new", and may replace anything left over from previous searches
    ttable.toggle_age();

    // Always search with at least one thread
    let mut spare = Vec::new();
    let killers = if killers.is_empty() {
        spare.push(KillerTable::default());
        &mut spare[..]
    } else {
        killers
    };

    // Killers are indexed by ply, so those from another root mean nothing here
    killers.iter_mut().for_each(KillerTable::clear);

    let threads = killers.len();
    let (sender, receiver) = mpsc::sync_channel(threads * QUEUE_DEPTH_PER_THREAD);

    let mut best: Option<SearchResult> = None;
    let mut nodes = vec![0; threads];

    thread::scope(|scope| {
        for (id, killers) in killers.iter_mut().enumerate() {
            let sender = sender.clone();
            let clock = clock.clone();
            let history = history.clone();

            scope.spawn(move || {
                let mut search = Search::<Log, E>::new(
                    id,
                    clock,
                    ttable,
                    evaluator,
                    killers,
                    history,
                    SearchFeatures::default(),
                );

                // The coordinator outlives every thread, so sending can only fail if it panicked
                search.iterative_deepening(game, |result| {
                    _ = sender.send(WorkerMessage::Depth(id, result.clone()));
                });
                _ = sender.send(WorkerMessage::Done(id, search.nodes()));
            });
        }

        // Only the threads hold senders now, so the queue closes once all of them have exited
        drop(sender);

        for message in receiver {
            match message {
                WorkerMessage::Depth(id, result) => {
                    nodes[id] = result.nodes;

                    if best.as_ref().is_some_and(|best| best.depth >= result.depth) {
                        continue;
                    }

                    if Log::INFO {
                        send_info(&result, nodes.iter().sum(), clock.elapsed());
                    }
                    best = Some(result);
                }

                WorkerMessage::Done(id, searched) => {
                    nodes[id] = searched;
                    clock.stop();
                }
            }
        }
    });

    let mut result = best.unwrap_or_default();
    result.nodes = nodes.iter().sum();

    // The TT move is checked before use, but a colliding key could still hand us garbage
    let bestmove = result
        .bestmove
        .filter(|&mv| game.is_legal(mv))
        .unwrap_or(fallback);
    result.bestmove = Some(bestmove);

    if Log::DEBUG {
        let hashfull = ttable.hashfull();
        println!(
            "{}",
            UciResponse::info_string(format!(
                "{threads} thread(s) searched {} nodes, TT {hashfull}/1000 full",
                result.nodes
            ))
        );
    }

    if Log::INFO {
        println!(
            "{}",
            UciResponse::BestMove {
                bestmove: Some(bestmove),
                ponder: None,
            }
        );
    }

    Ok(result)
}

/// Sends UCI info about a completed depth.
fn send_info(result: &SearchResult, nodes: u64, elapsed: Duration) {
    let nps = nodes as f32 / elapsed.as_secs_f32().max(f32::EPSILON);

    println!(
        "{}",
        UciResponse::info(
            UciInfo::new()
                .depth(result.depth)
                .nodes(nodes)
                .score(result.score)
                .nps(nps.trunc())
                .time(elapsed.as_millis())
                .pv(result.pv.moves().iter().map(|mv| mv.to_string())),
        )
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::*;

    fn run(fen: &str, config: SearchConfig, threads: usize) -> Result<SearchResult, SearchError> {
        let game = Game::from_fen(fen).unwrap();
        let ttable = TTable::new(1);
        let mut killers = vec![KillerTable::default(); threads];

        search_position::<LogNone, _>(
            &game,
            &RepetitionHistory::new(),
            &ttable,
            &mut killers,
            &TaperedEvaluator,
            Clock::standalone(config),
        )
    }

    #[test]
    fn test_no_legal_moves() {
        let stalemate = "k7/8/KQ6/8/8/8/8/8 b - - 0 1";
        assert_eq!(
            run(stalemate, SearchConfig::default(), 2),
            Err(SearchError::NoLegalMoves)
        );
    }

    #[test]
    fn test_threads_agree_on_mate() {
        let config = SearchConfig {
            max_depth: 5,
            ..Default::default()
        };

        for threads in [1, 3] {
            let res = run(BENCHMARK_FENS[6], config, threads).unwrap();
            assert_eq!(res.score.moves_to_mate(), 2);
            assert_eq!(res.bestmove.unwrap().to_string(), "e2e8");
        }
    }

    #[test]
    fn test_result_is_deepest_and_legal() {
        let config = SearchConfig {
            max_depth: 4,
            ..Default::default()
        };

        let game = Game::from_fen(FEN_KIWIPETE).unwrap();
        let res = run(FEN_KIWIPETE, config, 4).unwrap();
        assert_eq!(res.depth, 4);
        assert!(game.is_legal(res.bestmove.unwrap()));
        assert!(res.nodes > 0);
    }

    #[test]
    fn test_killers_reset_per_search() {
        let game = Game::default();
        let ttable = TTable::new(1);
        let stale = Move::new(Square::H7, Square::H5, MoveKind::Quiet);
        let mut killers = vec![KillerTable::default(); 2];
        for table in killers.iter_mut() {
            table.update(stale, 0);
            table.update(stale, 1);
        }

        // No cutoff can happen at the root with a full window, and depth 1 stores no killers below it
        let config = SearchConfig {
            max_depth: 1,
            ..Default::default()
        };
        search_position::<LogNone, _>(
            &game,
            &RepetitionHistory::new(),
            &ttable,
            &mut killers,
            &TaperedEvaluator,
            Clock::standalone(config),
        )
        .unwrap();

        for table in &killers {
            assert_eq!(table[0], [None; 2]);
            assert_eq!(table[1], [None; 2]);
        }
    }

    #[test]
    fn test_depth_one_with_helpers() {
        let config = SearchConfig {
            max_depth: 1,
            ..Default::default()
        };

        for _ in 0..8 {
            let res = run(FEN_KIWIPETE, config, 4).unwrap();
            assert_eq!(res.depth, 1);
            assert!(!res.pv.is_empty());
        }
    }

    #[test]
    fn test_zero_time_still_moves() {
        let config = SearchConfig {
            soft_timeout: Duration::ZERO,
            hard_timeout: Duration::ZERO,
            ..Default::default()
        };

        let res = run(FEN_STARTPOS, config, 2).unwrap();
        assert!(Game::default().is_legal(res.bestmove.unwrap()));
    }

    #[test]
    fn test_age_toggles_per_search() {
        let game = Game::default();
        let ttable = TTable::new(1);
        let mut killers = [KillerTable::default()];
        let age = ttable.age();

        let config = SearchConfig {
            max_depth: 2,
            ..Default::default()
        };
        search_position::<LogNone, _>(
            &game,
            &RepetitionHistory::new(),
            &ttable,
            &mut killers,
            &TaperedEvaluator,
            Clock::standalone(config),
        )
        .unwrap();

        assert_ne!(ttable.age(), age);
    }
}
