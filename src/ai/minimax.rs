use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::agent::Agent;
use super::heuristic::{ConnectFourHeuristic, Heuristic};
use crate::error::SearchError;
use crate::game::{Board, GameState, Player, COLS};

/// Value of a won terminal position, before the remaining-depth bonus.
/// Larger than any static evaluation the heuristic can produce.
pub const WIN_SCORE: f64 = 10_000_000.0;

/// Column ordering: center-first for better alpha-beta pruning.
pub const CENTER_FIRST: [usize; COLS] = [3, 2, 4, 1, 5, 0, 6];

const LEFT_TO_RIGHT: [usize; COLS] = [0, 1, 2, 3, 4, 5, 6];

/// How often (in nodes) the wall clock is consulted.
const CLOCK_CHECK_INTERVAL: u64 = 256;

/// Order in which children are explored. Ties go to the column explored
/// first, so the order is also the tie-break policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveOrder {
    #[default]
    CenterFirst,
    LeftToRight,
    /// A permutation drawn once from `shuffle_seed`.
    Shuffled,
}

impl MoveOrder {
    pub fn columns(self, seed: u64) -> [usize; COLS] {
        match self {
            MoveOrder::CenterFirst => CENTER_FIRST,
            MoveOrder::LeftToRight => LEFT_TO_RIGHT,
            MoveOrder::Shuffled => {
                let mut order = LEFT_TO_RIGHT;
                order.shuffle(&mut StdRng::seed_from_u64(seed));
                order
            }
        }
    }
}

/// Search configuration, loadable from the `[search]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_depth: usize,
    pub move_order: MoveOrder,
    pub shuffle_seed: u64,
    /// Search root children on the rayon pool.
    pub parallel: bool,
    pub max_nodes: Option<u64>,
    pub time_limit_ms: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            max_depth: 5,
            move_order: MoveOrder::CenterFirst,
            shuffle_seed: 0,
            parallel: false,
            max_nodes: None,
            time_limit_ms: None,
        }
    }
}

impl SearchConfig {
    pub fn budget(&self) -> SearchBudget {
        SearchBudget {
            max_nodes: self.max_nodes,
            time_limit: self.time_limit_ms.map(Duration::from_millis),
        }
    }
}

/// External cutoff for a search. On cutoff the best move found so far is
/// returned instead of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchBudget {
    pub max_nodes: Option<u64>,
    pub time_limit: Option<Duration>,
}

impl SearchBudget {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn is_unlimited(&self) -> bool {
        self.max_nodes.is_none() && self.time_limit.is_none()
    }
}

/// Result of a root search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOutcome {
    pub column: usize,
    /// Value of `column` from the searching player's perspective.
    pub score: f64,
    /// Deepest fully completed iteration.
    pub depth_reached: usize,
    pub nodes: u64,
    /// True if the budget ran out before `max_depth` completed.
    pub cut_off: bool,
}

/// Per-search counters shared by reference across rayon workers.
struct SearchContext {
    nodes: AtomicU64,
    stopped: AtomicBool,
    max_nodes: Option<u64>,
    deadline: Option<Instant>,
}

impl SearchContext {
    fn new(budget: SearchBudget) -> Self {
        SearchContext {
            nodes: AtomicU64::new(0),
            stopped: AtomicBool::new(false),
            max_nodes: budget.max_nodes,
            deadline: budget.time_limit.map(|limit| Instant::now() + limit),
        }
    }

    /// Count a node; returns true once the budget is exhausted.
    fn tick(&self) -> bool {
        let n = self.nodes.fetch_add(1, Ordering::Relaxed) + 1;
        if self.max_nodes.is_some_and(|max| n > max) {
            self.stopped.store(true, Ordering::Relaxed);
        }
        if n % CLOCK_CHECK_INTERVAL == 1
            && self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
        {
            self.stopped.store(true, Ordering::Relaxed);
        }
        self.stopped()
    }

    fn stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }

    fn nodes(&self) -> u64 {
        self.nodes.load(Ordering::Relaxed)
    }
}

/// Depth-limited minimax with alpha-beta pruning.
///
/// Scores are always from the root player's perspective: the root player
/// maximizes, the opponent minimizes. Every child is searched on its own
/// copy of the board.
pub struct MinimaxSearcher {
    max_depth: usize,
    order: [usize; COLS],
    parallel: bool,
    budget: SearchBudget,
    heuristic: Box<dyn Heuristic>,
}

impl MinimaxSearcher {
    pub fn new(max_depth: usize) -> Self {
        Self::from_config(&SearchConfig {
            max_depth,
            ..SearchConfig::default()
        })
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        MinimaxSearcher {
            max_depth: config.max_depth,
            order: config.move_order.columns(config.shuffle_seed),
            parallel: config.parallel,
            budget: config.budget(),
            heuristic: Box::new(ConnectFourHeuristic),
        }
    }

    pub fn with_heuristic(mut self, heuristic: Box<dyn Heuristic>) -> Self {
        self.heuristic = heuristic;
        self
    }

    pub fn with_budget(mut self, budget: SearchBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Column iteration order used at every node.
    pub fn order(&self) -> [usize; COLS] {
        self.order
    }

    /// Find the best column for `player` on `board`.
    pub fn search(&self, board: &Board, player: Player) -> Result<SearchOutcome, SearchError> {
        if board.is_win_state() {
            return Err(SearchError::NoLegalMove);
        }
        let legal: Vec<usize> = self
            .order
            .iter()
            .copied()
            .filter(|&col| !board.is_column_full(col))
            .collect();
        let fallback = CENTER_FIRST
            .iter()
            .copied()
            .find(|&col| !board.is_column_full(col))
            .ok_or(SearchError::NoLegalMove)?;

        if self.max_depth == 0 {
            return Ok(SearchOutcome {
                column: fallback,
                score: self.heuristic.evaluate(board, player),
                depth_reached: 0,
                nodes: 0,
                cut_off: false,
            });
        }

        let ctx = SearchContext::new(self.budget);
        let outcome = if self.budget.is_unlimited() {
            let (column, score) = self
                .search_root(board, player, self.max_depth, &legal, &ctx)
                .unwrap_or((fallback, f64::NEG_INFINITY));
            SearchOutcome {
                column,
                score,
                depth_reached: self.max_depth,
                nodes: ctx.nodes(),
                cut_off: false,
            }
        } else {
            self.iterative_deepening(board, player, &legal, fallback, &ctx)
        };

        debug!(
            player = player.name(),
            column = outcome.column,
            score = outcome.score,
            depth = outcome.depth_reached,
            nodes = outcome.nodes,
            cut_off = outcome.cut_off,
            "search complete"
        );
        Ok(outcome)
    }

    /// Deepen one ply at a time, keeping the last fully searched iteration.
    fn iterative_deepening(
        &self,
        board: &Board,
        player: Player,
        legal: &[usize],
        fallback: usize,
        ctx: &SearchContext,
    ) -> SearchOutcome {
        let mut best = None;
        let mut depth_reached = 0;

        for depth in 1..=self.max_depth {
            match self.search_root(board, player, depth, legal, ctx) {
                Some((column, score)) => {
                    best = Some((column, score));
                    depth_reached = depth;
                    // A proven result will not change with more depth.
                    if score.abs() >= WIN_SCORE {
                        break;
                    }
                }
                None => break,
            }
        }

        let (column, score) =
            best.unwrap_or_else(|| (fallback, self.heuristic.evaluate(board, player)));
        SearchOutcome {
            column,
            score,
            depth_reached,
            nodes: ctx.nodes(),
            cut_off: ctx.stopped(),
        }
    }

    /// Search every legal root move to `depth`. Returns `None` if the budget
    /// ran out before the iteration finished.
    fn search_root(
        &self,
        board: &Board,
        player: Player,
        depth: usize,
        legal: &[usize],
        ctx: &SearchContext,
    ) -> Option<(usize, f64)> {
        let mut best_col = *legal.first()?;
        let mut best = f64::NEG_INFINITY;

        if self.parallel {
            let scores: Vec<(usize, f64)> = legal
                .par_iter()
                .filter_map(|&col| {
                    let child = board.apply_move(col, player).ok()?;
                    let score = self.minimax(
                        &child.board,
                        player.other(),
                        player,
                        depth - 1,
                        f64::NEG_INFINITY,
                        f64::INFINITY,
                        ctx,
                    );
                    Some((col, score))
                })
                .collect();
            for (col, score) in scores {
                if score > best {
                    best = score;
                    best_col = col;
                }
            }
        } else {
            let mut alpha = f64::NEG_INFINITY;
            for &col in legal {
                let Ok(child) = board.apply_move(col, player) else {
                    continue;
                };
                let score = self.minimax(
                    &child.board,
                    player.other(),
                    player,
                    depth - 1,
                    alpha,
                    f64::INFINITY,
                    ctx,
                );
                if ctx.stopped() {
                    break;
                }
                if score > best {
                    best = score;
                    best_col = col;
                }
                alpha = alpha.max(best);
            }
        }

        if ctx.stopped() {
            None
        } else {
            Some((best_col, best))
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn minimax(
        &self,
        board: &Board,
        to_move: Player,
        root: Player,
        depth: usize,
        mut alpha: f64,
        mut beta: f64,
        ctx: &SearchContext,
    ) -> f64 {
        // The value of an interrupted iteration is discarded.
        if ctx.tick() {
            return 0.0;
        }

        // Terminal values are exact; a remaining-depth bonus prefers the
        // quicker win and the slower loss.
        if let Some(winner) = board.winner() {
            let value = WIN_SCORE + depth as f64;
            return if winner == root { value } else { -value };
        }
        if board.is_full() {
            return 0.0;
        }
        if depth == 0 {
            return self.heuristic.evaluate(board, root);
        }

        let maximizing = to_move == root;
        let mut value = if maximizing {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };

        for &col in &self.order {
            let Ok(child) = board.apply_move(col, to_move) else {
                continue;
            };
            let score = self.minimax(
                &child.board,
                to_move.other(),
                root,
                depth - 1,
                alpha,
                beta,
                ctx,
            );
            if maximizing {
                value = value.max(score);
                alpha = alpha.max(value);
            } else {
                value = value.min(score);
                beta = beta.min(value);
            }
            if alpha >= beta || ctx.stopped() {
                break;
            }
        }

        value
    }
}

/// Best column for `player` on `board` with a plain depth-limited search.
pub fn choose_move(board: &Board, player: Player, max_depth: usize) -> Result<usize, SearchError> {
    MinimaxSearcher::new(max_depth)
        .search(board, player)
        .map(|outcome| outcome.column)
}

/// Agent that plays the minimax search's choice.
pub struct MinimaxAgent {
    config: SearchConfig,
    searcher: MinimaxSearcher,
}

impl MinimaxAgent {
    pub fn new(depth: usize) -> Self {
        Self::from_config(SearchConfig {
            max_depth: depth,
            ..SearchConfig::default()
        })
    }

    pub fn from_config(config: SearchConfig) -> Self {
        let searcher = MinimaxSearcher::from_config(&config);
        MinimaxAgent { config, searcher }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }
}

impl Agent for MinimaxAgent {
    fn select_action(&mut self, state: &GameState) -> Result<usize, SearchError> {
        if state.is_terminal() {
            return Err(SearchError::NoLegalMove);
        }
        self.searcher
            .search(state.board(), state.current_player())
            .map(|outcome| outcome.column)
    }

    fn name(&self) -> &str {
        "Minimax"
    }
}
