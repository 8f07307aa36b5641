/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt, io,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{channel, Receiver, Sender},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    thread::{self, JoinHandle},
    time::Instant,
};

use anyhow::{bail, Context, Result};
use uci_parser::{UciCommand, UciOption, UciResponse};

use crate::{
    init_magics, perft, search_position, splitperft, Clock, EngineCommand, EvalTrace, Evaluator,
    Game, KillerTable, LogDebug, LogInfo, LogLevel, LogNone, RepetitionHistory, SearchConfig,
    SearchError, SearchResult, Square, TTable, TaperedEvaluator, BENCHMARK_FENS,
};

/// Search depth used by `bench` unless overridden.
const BENCH_DEPTH: usize = 6;

/// Default number of search threads.
const DEFAULT_THREADS: usize = 1;

/// Maximum number of search threads.
const MAX_THREADS: usize = 256;

/// The Cerulean chess engine.
#[derive(Debug)]
pub struct Engine {
    /// Position that `go` will search.
    game: Game,

    /// Keys of the positions played before `self.game`, oldest first.
    ///
    /// Rebuilt by `position`, extended by `makemove` and `flip`.
    history: RepetitionHistory,

    /// Cloned into the input thread, which forwards every parsed line.
    sender: Sender<EngineCommand>,

    /// Commands are executed in the order they arrive here.
    receiver: Receiver<EngineCommand>,

    /// Atomic flag shared with every search thread. Raising it stops the current search.
    stop: Arc<AtomicBool>,

    /// The most recent search, until it is joined.
    search_thread: Option<JoinHandle<Result<SearchResult, SearchError>>>,

    /// Shared with every search thread.
    ttable: Arc<TTable>,

    /// One killer table per search thread.
    ///
    /// Locked by the search for as long as it runs.
    killers: Arc<Mutex<Vec<KillerTable>>>,

    evaluator: TaperedEvaluator,

    /// Set by `debug on`; searches then run with [`LogDebug`].
    debug: bool,
}

impl Engine {
    /// An idle engine on the starting position. Nothing happens until [`Engine::run`] is called.
    #[inline(always)]
    pub fn new() -> Self {
        // Build the attack tables up front, so the first `go` doesn't pay for them on the clock
        init_magics();

        let (sender, receiver) = channel();

        Self {
            game: Game::default(),
            history: RepetitionHistory::new(),
            sender,
            receiver,
            stop: Arc::default(),
            search_thread: None,
            ttable: Arc::new(TTable::new(TTable::DEFAULT_SIZE)),
            killers: Arc::new(Mutex::new(vec![KillerTable::default(); DEFAULT_THREADS])),
            evaluator: TaperedEvaluator,
            debug: false,
        }
    }

    /// `<name> <version>`, as sent in `id name`.
    #[inline(always)]
    pub fn name(&self) -> String {
        format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }

    /// Comma-separated authors, as sent in `id author`.
    #[inline(always)]
    pub fn authors(&self) -> String {
        env!("CARGO_PKG_AUTHORS").replace(':', ", ")
    }

    /// Queues `command` behind anything already received.
    #[inline(always)]
    pub fn send_command(&self, command: EngineCommand) -> Result<()> {
        self.sender
            .send(command)
            .context("Failed to send a command to the engine")
    }

    /// Reads commands from `stdin` on a background thread and executes them one at a time
    /// until `quit` or `exit` arrives, or input ends.
    pub fn run(&mut self) -> Result<()> {
        // Reading stdin blocks, so it gets its own thread
        let sender = self.sender.clone();
        thread::spawn(|| {
            if let Err(err) = input_handler(sender) {
                eprintln!("Input handler thread stopping after fatal error: {err:#}");
            }
        });

        while let Ok(cmd) = self.receiver.recv() {
            // Every command but `exit` reports its own failure and keeps the engine running
            let result = match cmd {
                EngineCommand::Bench { depth, pretty } => self.bench(depth, pretty),

                EngineCommand::Bytes => {
                    let hex = self
                        .game
                        .to_bytes()
                        .iter()
                        .map(|byte| format!("{byte:02x}"))
                        .collect::<String>();
                    println!("{hex}");
                    Ok(())
                }

                EngineCommand::Display => {
                    println!("{}", self.game);
                    Ok(())
                }

                EngineCommand::Eval { pretty } => {
                    self.eval(pretty);
                    Ok(())
                }

                EngineCommand::Exit { cleanup } => {
                    if cleanup {
                        self.stop_search();
                    } else {
                        self.stop.store(true, Ordering::Relaxed);
                    }

                    break;
                }

                EngineCommand::Fen => {
                    println!("{}", self.game.to_fen());
                    Ok(())
                }

                EngineCommand::Flip => {
                    self.history.push(self.game.key());
                    self.game.make_null_move();
                    Ok(())
                }

                EngineCommand::HashInfo => {
                    self.hash_info();
                    Ok(())
                }

                EngineCommand::MakeMove { mv_string } => self.make_move(&mv_string),

                EngineCommand::Moves { square, sort } => {
                    self.moves(square, sort);
                    Ok(())
                }

                EngineCommand::Option { name } => {
                    let name = name.join(" ");
                    if let Some(value) = self.get_option(&name) {
                        println!("Option {name:?} := {value}");
                    } else {
                        println!("{} has no option {name:?}", self.name());
                    }
                    Ok(())
                }

                EngineCommand::Perft { depth } => {
                    println!("{}", perft(&self.game, depth));
                    Ok(())
                }

                EngineCommand::Splitperft { depth } => {
                    println!("{}", splitperft(&self.game, depth));
                    Ok(())
                }

                EngineCommand::Uci { cmd } => {
                    if matches!(cmd, UciCommand::Quit) {
                        self.stop.store(true, Ordering::Relaxed);
                        break;
                    }

                    self.handle_uci_command(cmd)
                }

                EngineCommand::Wait => {
                    self.stop_search();
                    Ok(())
                }
            };

            // A failed command never takes the engine down with it
            if let Err(e) = result {
                eprintln!("Error: {e:#}");
            }
        }

        Ok(())
    }

    /// Executes one command of the UCI protocol.
    fn handle_uci_command(&mut self, uci: UciCommand) -> Result<()> {
        use UciCommand::*;
        match uci {
            Uci => self.uci(),

            Debug(status) => self.debug = status,

            IsReady => println!("{}", UciResponse::<&str>::ReadyOk),

            SetOption { name, value } => self.set_option(&name, value)?,

            Register { name: _, code: _ } => println!("{} requires no registration", self.name()),

            UciNewGame => self.new_game(),

            Position { fen, moves } => self.position(fen, moves)?,

            Go(options) => {
                if let Some(depth) = options.perft {
                    println!("{}", splitperft(&self.game, depth as usize));
                    return Ok(());
                }

                let config = SearchConfig::new(options, self.game.side_to_move());
                if self.debug {
                    self.start_search::<LogDebug>(config)?;
                } else {
                    self.start_search::<LogInfo>(config)?;
                }
            }

            Stop => self.stop.store(true, Ordering::Relaxed),

            _ => bail!("{} does not support UCI command {uci:?}", self.name()),
        }

        Ok(())
    }

    /// Searches every position of [`BENCHMARK_FENS`] to a fixed depth on one thread, reporting nodes and speed.
    ///
    /// Leaves the engine as if `ucinewgame` had been received.
    fn bench(&mut self, depth: Option<usize>, pretty: bool) -> Result<()> {
        if self.is_searching() {
            bail!("Cannot run a benchmark while a search is running");
        }

        let config = SearchConfig {
            max_depth: depth.unwrap_or(BENCH_DEPTH),
            ..Default::default()
        };

        let benches = BENCHMARK_FENS;
        let mut nodes = 0;

        let width = benches.iter().map(|fen| fen.len()).max().unwrap_or_default();

        println!(
            "bench: depth {} over {} positions",
            config.max_depth,
            benches.len()
        );

        let starttime = Instant::now();
        let mut killers = [KillerTable::default()];

        for (i, fen) in benches.into_iter().enumerate() {
            let game = Game::from_fen(fen)?;

            // Start every position cold so the node counts are reproducible
            self.ttable.clear();
            killers[0].clear();

            let res = search_position::<LogNone, _>(
                &game,
                &RepetitionHistory::new(),
                &self.ttable,
                &mut killers,
                &self.evaluator,
                Clock::standalone(config),
            )
            .with_context(|| format!("Benchmark search failed on {fen}"))?;

            nodes += res.nodes;
            println!(
                "{:>2}/{:>2}: {fen:<width$} := {}",
                i + 1,
                benches.len(),
                res.nodes
            );
        }

        // Compute results
        let elapsed = starttime.elapsed();
        let nps = (nodes as f32 / elapsed.as_secs_f32()) as u64;
        let m_nps = nodes as f32 / elapsed.as_secs_f32() / 1_000_000.0;
        let ms = elapsed.as_millis();

        if pretty {
            println!();
            println!("=========== bench ===========");
            println!("  elapsed (ms) : {ms:>12}");
            println!("  nodes        : {nodes:>12}");
            println!("  nps          : {nps:>12}");
            println!("  Mnps         : {m_nps:>12.2}");
            println!("=============================");
        } else {
            println!("{nodes} nodes {nps} nps");
        }

        self.new_game();

        Ok(())
    }

    /// Prints the static evaluation, preceded by a breakdown if `pretty` is set.
    fn eval(&self, pretty: bool) {
        if pretty {
            println!("{}", EvalTrace::new(&self.game));
        }

        println!("{}", self.evaluator.evaluate(&self.game));
    }

    /// Prints the size and occupancy of the transposition table.
    fn hash_info(&self) {
        let size = self.ttable.size();
        let num = self.ttable.num_entries();
        let cap = self.ttable.capacity();
        let percent = num as f32 / cap as f32 * 100.0;
        let hashfull = self.ttable.hashfull();
        println!("TT info: {size}mb @ {num}/{cap} entries ({percent:.2}% full, hashfull {hashfull})");
    }

    /// Makes the supplied move on the current position, if it is legal.
    fn make_move(&mut self, mv_string: &str) -> Result<()> {
        let key = self.game.key();
        self.game.make_move_uci(mv_string)?;
        self.history.push(key);

        if self.debug {
            Self::send_string(format!("Played {mv_string}"));
        }

        Ok(())
    }

    /// Prints the legal moves, optionally only those of the piece on `square`.
    fn moves(&self, square: Option<Square>, sort: bool) {
        let moves = if let Some(square) = square {
            self.game.get_legal_moves_from(square.bitboard())
        } else {
            self.game.get_legal_moves()
        };

        if moves.is_empty() {
            println!("(none)");
            return;
        }

        let mut strings = moves.iter().map(|mv| mv.to_string()).collect::<Vec<_>>();
        if sort {
            strings.sort();
        }

        println!("{}", strings.join(", "));
    }

    /// Handles `ucinewgame`: stops and discards any search, then resets the position,
    /// the history, the killers and the transposition table.
    fn new_game(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        self.stop_search();

        self.game = Game::default();
        self.history.clear();
        self.ttable.clear();
        self.killers().iter_mut().for_each(KillerTable::clear);
    }

    /// Handles `position`: parses `fen` (or the start position) and plays `moves` on it.
    ///
    /// Nothing changes unless the FEN and every move are valid.
    fn position<T: AsRef<str>>(
        &mut self,
        fen: Option<T>,
        moves: impl IntoIterator<Item = T>,
    ) -> Result<()> {
        let mut game = if let Some(fen) = fen {
            fen.as_ref().parse()?
        } else {
            Game::default()
        };

        let mut history = RepetitionHistory::new();

        for mv_str in moves {
            let key = game.key();
            game.make_move_uci(mv_str.as_ref())
                .with_context(|| format!("Failed to apply move {:?}", mv_str.as_ref()))?;
            history.push(key);
        }

        self.game = game;
        self.history = history;

        Ok(())
    }

    /// Returns `true` if the engine is currently executing a search.
    #[inline(always)]
    fn is_searching(&self) -> bool {
        self.search_thread
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Starts a search on the current position, given the parameters in `config`.
    fn start_search<Log: LogLevel>(&mut self, config: SearchConfig) -> Result<()> {
        // Cannot start a search if one is already running
        if self.is_searching() {
            bail!("A search is already running");
        }

        // Collect the previous search, if there was one
        self.stop_search();
        self.stop.store(false, Ordering::Relaxed);

        // Clone the parameters that will be sent into the thread
        let clock = Clock::new(config, Arc::clone(&self.stop));
        let game = self.game;
        let history = self.history.clone();
        let ttable = Arc::clone(&self.ttable);
        let killers = Arc::clone(&self.killers);
        let evaluator = self.evaluator;

        // Spawn a thread to conduct the search
        let handle = thread::spawn(move || {
            // Lock the killers at the start of the search so that only this search may modify them
            let mut killers = killers.lock().unwrap_or_else(PoisonError::into_inner);

            search_position::<Log, _>(&game, &history, &ttable, &mut killers, &evaluator, clock)
        });

        self.search_thread = Some(handle);
        Ok(())
    }

    /// Awaits the current search thread, blocking until it finishes and returning its result.
    fn stop_search(&mut self) -> Option<SearchResult> {
        // Can't stop a search if there aren't any threads searching!
        let handle = self.search_thread.take()?;

        // Attempt to join the thread handle to retrieve the result
        let id = handle.thread().id();
        let Ok(res) = handle.join() else {
            Self::send_string(format!("Failed to join on thread {id:?}"));
            return None;
        };

        res.ok()
    }

    /// Called when the engine receives the `uci` command.
    ///
    /// Prints engine's ID, version, and authors, and lists all UCI options.
    fn uci(&self) {
        println!("id name {}\nid author {}\n", self.name(), self.authors());

        // Print all UCI options
        for opt in self.options() {
            println!("{}", UciResponse::Option(opt));
        }

        // We're ready to go!
        println!("{}", UciResponse::<&str>::UciOk)
    }

    /// Convenience function to return an iterator over all UCI options this engine supports.
    fn options(&self) -> impl Iterator<Item = UciOption<&str>> {
        [
            UciOption::button("Clear Hash"),
            UciOption::button("Clear History"),
            UciOption::button("Clear Killers"),
            UciOption::spin(
                "Hash",
                TTable::DEFAULT_SIZE as i32,
                TTable::MIN_SIZE as i32,
                TTable::MAX_SIZE as i32,
            ),
            UciOption::spin("Threads", DEFAULT_THREADS as i32, 1, MAX_THREADS as i32),
        ]
        .into_iter()
    }

    /// Handles the `setoption` command, setting option `name` to `value`, or pressing it if `value` is None.
    ///
    /// Will return an error if `name` isn't a valid option or `value` is not a valid value for that option.
    fn set_option(&mut self, name: &str, value: Option<String>) -> Result<()> {
        // Every option touches something the search is using
        if self.is_searching() {
            bail!("Cannot change option {name:?} while a search is running");
        }

        match name {
            "Clear Hash" => self.ttable.clear(),

            "Clear History" => self.history.clear(),

            "Clear Killers" => self.killers().iter_mut().for_each(KillerTable::clear),

            "Hash" => {
                let mb = parse_spin(name, value.as_deref(), TTable::MIN_SIZE, TTable::MAX_SIZE)?;

                // Any finished search still holds a handle to the old table
                self.stop_search();
                match Arc::get_mut(&mut self.ttable) {
                    Some(ttable) => ttable.resize(mb),
                    None => self.ttable = Arc::new(TTable::new(mb)),
                }
            }

            "Threads" => {
                let threads = parse_spin(name, value.as_deref(), 1, MAX_THREADS)?;
                self.killers().resize(threads, KillerTable::default());
            }

            _ => {
                if let Some(value) = value.as_ref() {
                    bail!("Unrecognized option {name:?} with value {value:?}")
                } else {
                    bail!("Unrecognized option {name:?}")
                }
            }
        }

        if self.debug {
            let info = if let Some(value) = value.as_ref() {
                format!("Option {name} set to {value}")
            } else {
                format!("Option {name} toggled")
            };
            Self::send_string(info);
        }

        Ok(())
    }

    /// Returns the current value of the option `name`, if it exists on this engine.
    fn get_option(&self, name: &str) -> Option<String> {
        let value = match name {
            "Clear Hash" | "Clear History" | "Clear Killers" => String::default(),

            "Hash" => format!("{}", self.ttable.size()),

            "Threads" => format!("{}", self.killers().len()),

            _ => return None,
        };

        Some(value)
    }

    /// Helper to send a [`UciResponse`] containing only a `string` message to `stdout`.
    #[inline(always)]
    fn send_string<T: fmt::Display>(info: T) {
        println!("{}", UciResponse::info_string(info));
    }

    /// Helper function to fetch the killer tables, even if a search thread panicked while holding them.
    #[inline(always)]
    fn killers(&self) -> MutexGuard<'_, Vec<KillerTable>> {
        self.killers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Engine {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

/// Parses the value of a `spin` option, ensuring it lies within `min..=max`.
fn parse_spin(name: &str, value: Option<&str>, min: usize, max: usize) -> Result<usize> {
    let Some(value) = value else {
        bail!("usage: setoption name {name} value <value>");
    };

    let Ok(value) = value.parse() else {
        bail!("expected integer. got {value:?}");
    };

    // Ensure the value is within bounds
    if value < min {
        bail!("Minimum value for {name} is {min}");
    }
    if value > max {
        bail!("Maximum value for {name} is {max}");
    }

    Ok(value)
}

/// Loops endlessly to await input via `stdin`, sending all successfully-parsed commands through the supplied `sender`.
fn input_handler(sender: Sender<EngineCommand>) -> Result<()> {
    let mut buffer = String::with_capacity(2048);

    loop {
        // Clear the buffer, read input, and trim the trailing newline
        buffer.clear();
        let bytes = io::stdin()
            .read_line(&mut buffer)
            .context("Failed to read line when parsing UCI commands")?;

        // For ctrl + d
        if 0 == bytes {
            // Send the Quit command and exit this function
            sender
                .send(EngineCommand::Exit { cleanup: false })
                .context("Failed to send 'quit' command after receiving empty input")?;

            bail!("Engine received input of 0 bytes and is quitting");
        }

        // Trim any leading/trailing whitespace
        let buf = buffer.trim();

        // Ignore empty lines
        if buf.is_empty() {
            continue;
        }

        match buf.parse() {
            Ok(cmd) => sender
                .send(cmd)
                .context("Failed to send command to engine")?,

            // If an invalid command was received, just print the error and continue running
            Err(err) => eprintln!("{err:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_commits_only_on_success() {
        let mut engine = Engine::new();
        engine
            .position(None, ["e2e4", "e7e5"].map(String::from))
            .unwrap();
        let fen = engine.game.to_fen();
        assert_eq!(engine.history.len(), 2);

        // The third move is illegal, so nothing changes
        assert!(engine
            .position(None, ["e2e4", "e7e5", "e4e5"].map(String::from))
            .is_err());
        assert_eq!(engine.game.to_fen(), fen);
        assert_eq!(engine.history.len(), 2);

        assert!(engine.position(Some(String::from("not a fen")), []).is_err());
        assert_eq!(engine.game.to_fen(), fen);
    }

    #[test]
    fn test_set_options() {
        let mut engine = Engine::new();

        engine.set_option("Hash", Some(String::from("2"))).unwrap();
        assert_eq!(engine.get_option("Hash").unwrap(), "2");

        engine.set_option("Threads", Some(String::from("4"))).unwrap();
        assert_eq!(engine.get_option("Threads").unwrap(), "4");

        assert!(engine.set_option("Threads", Some(String::from("0"))).is_err());
        assert!(engine.set_option("Hash", Some(String::from("lots"))).is_err());
        assert!(engine.set_option("Hash", None).is_err());
        assert!(engine.set_option("Ponder", Some(String::from("true"))).is_err());

        engine.set_option("Clear Killers", None).unwrap();
        engine.set_option("Clear Hash", None).unwrap();
        assert_eq!(engine.ttable.num_entries(), 0);

        assert_eq!(engine.get_option("Threads").unwrap(), "4");
        assert!(engine.get_option("Ponder").is_none());
    }

    #[test]
    fn test_new_game_resets_state() {
        let mut engine = Engine::new();
        engine.make_move("g1f3").unwrap();
        assert!(engine.make_move("g1f3").is_err());
        assert_eq!(engine.history.len(), 1);

        engine.new_game();
        assert_eq!(engine.game, Game::default());
        assert!(engine.history.is_empty());
    }

    #[test]
    fn test_search_thread_returns_a_move() {
        let mut engine = Engine::new();
        engine.set_option("Hash", Some(String::from("1"))).unwrap();

        let config = SearchConfig {
            max_depth: 3,
            ..Default::default()
        };
        engine.start_search::<LogNone>(config).unwrap();

        let res = engine.stop_search().unwrap();
        assert_eq!(res.depth, 3);
        assert!(engine.game.is_legal(res.bestmove.unwrap()));
        assert!(!engine.is_searching());
    }
}
