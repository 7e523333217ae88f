//! Move/response contract for playing against a remote bot.
//!
//! A client starts a game with [`MatchServer::new_game`] and then submits one
//! column per turn. Every reply carries the whole board from the client's
//! point of view, so a client never has to track state between calls.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ai::Agent;
use crate::error::{MatchError, MoveError};
use crate::game::{Board, GameState, Player, COLS, ILLEGAL_MOVE_REWARD, ROWS};

pub const STATUS_OK: &str = "ok";
/// `botmove` value when the bot did not move.
pub const NO_BOT_MOVE: i32 = -1;

/// One server reply. `result` is the client's reward: 0 while the game is
/// running, then 1 / 0.5 / -1, or -10 after an illegal client move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveResponse {
    pub status: String,
    pub msg: String,
    pub result: f64,
    pub botmove: i32,
    /// `1` client disc, `-1` server disc, `0` empty. Row 0 is the top.
    pub state: [[i8; COLS]; ROWS],
}

impl MoveResponse {
    pub fn is_finished(&self) -> bool {
        self.result != 0.0
    }

    pub fn bot_column(&self) -> Option<usize> {
        usize::try_from(self.botmove).ok()
    }

    /// Parse a reply body as sent over the wire.
    pub fn from_json(body: &str) -> Result<Self, MatchError> {
        serde_json::from_str(body).map_err(|e| MatchError::Server(format!("bad reply: {e}")))
    }

    pub fn to_json(&self) -> Result<String, MatchError> {
        serde_json::to_string(self).map_err(|e| MatchError::Server(e.to_string()))
    }
}

pub trait MatchServer {
    /// Start a new game, abandoning any running one.
    fn new_game(&mut self) -> Result<MoveResponse, MatchError>;

    /// Play `column` for the client and return the bot's reply.
    fn submit(&mut self, column: usize) -> Result<MoveResponse, MatchError>;
}

struct LiveGame {
    state: GameState,
    client: Player,
}

/// In-process server that answers with any [`Agent`].
pub struct LocalMatchServer<A: Agent> {
    bot: A,
    rng: StdRng,
    game: Option<LiveGame>,
}

impl<A: Agent> LocalMatchServer<A> {
    pub fn new(bot: A, seed: u64) -> Self {
        LocalMatchServer {
            bot,
            rng: StdRng::seed_from_u64(seed),
            game: None,
        }
    }

    pub fn bot(&self) -> &A {
        &self.bot
    }

    fn bot_turn(&mut self, game: &mut LiveGame) -> Result<usize, MatchError> {
        let column = self.bot.select_action(&game.state)?;
        game.state = game.state.apply_move(column)?;
        Ok(column)
    }
}

fn response(game: &LiveGame, msg: String, result: f64, botmove: Option<usize>) -> MoveResponse {
    MoveResponse {
        status: STATUS_OK.to_string(),
        msg,
        result,
        botmove: botmove.map_or(NO_BOT_MOVE, |c| c as i32),
        state: game.state.board().to_grid(game.client),
    }
}

/// Client reward once the game is over, 0 while it is running.
fn client_result(game: &LiveGame) -> f64 {
    game.state
        .outcome()
        .map_or(0.0, |outcome| outcome.reward_for(game.client))
}

impl<A: Agent> MatchServer for LocalMatchServer<A> {
    fn new_game(&mut self) -> Result<MoveResponse, MatchError> {
        let bot_starts = self.rng.random_bool(0.5);
        let mut game = LiveGame {
            state: GameState::initial(),
            client: if bot_starts { Player::B } else { Player::A },
        };

        let (msg, botmove) = if bot_starts {
            let column = self.bot_turn(&mut game)?;
            ("Bot starts".to_string(), Some(column))
        } else {
            ("You start".to_string(), None)
        };
        debug!(bot = self.bot.name(), bot_starts, "new game");

        let reply = response(&game, msg, 0.0, botmove);
        self.game = Some(game);
        Ok(reply)
    }

    fn submit(&mut self, column: usize) -> Result<MoveResponse, MatchError> {
        let mut game = self
            .game
            .take()
            .ok_or_else(|| MatchError::Server("no game in progress".into()))?;

        match game.state.apply_move(column) {
            Ok(next) => game.state = next,
            Err(MoveError::ColumnFull(_) | MoveError::InvalidColumn(_)) => {
                info!(column, "client played an illegal move");
                let msg = format!("Illegal move in column {column}, you lost");
                return Ok(response(&game, msg, ILLEGAL_MOVE_REWARD, None));
            }
            Err(e) => return Err(e.into()),
        }

        if game.state.is_terminal() {
            let reply = response(&game, "Game over".into(), client_result(&game), None);
            return Ok(reply);
        }

        let bot_column = self.bot_turn(&mut game)?;
        let result = client_result(&game);
        let msg = if result == 0.0 {
            format!("Bot played column {bot_column}")
        } else {
            "Game over".to_string()
        };
        let reply = response(&game, msg, result, Some(bot_column));
        if result == 0.0 {
            self.game = Some(game);
        }
        Ok(reply)
    }
}

/// Outcome of a game played through a [`MatchServer`].
#[derive(Debug, Clone, PartialEq)]
pub struct ServerGameReport {
    /// Final client reward.
    pub result: f64,
    pub client_moves: usize,
    pub final_board: Board,
}

/// Play a full game against `server`, choosing moves with `agent`.
///
/// The board is rebuilt from every reply, with the client's discs as
/// [`Player::A`].
pub fn play_against_server(
    agent: &mut dyn Agent,
    server: &mut dyn MatchServer,
) -> Result<ServerGameReport, MatchError> {
    let mut reply = server.new_game()?;
    info!(msg = %reply.msg, "joined game");
    let mut client_moves = 0;

    loop {
        let board = Board::from_grid(&reply.state, Player::A)?;
        if reply.is_finished() {
            info!(result = reply.result, client_moves, "game over");
            return Ok(ServerGameReport {
                result: reply.result,
                client_moves,
                final_board: board,
            });
        }

        let state = GameState::from_board(board, Player::A);
        let column = agent.select_action(&state)?;
        reply = server.submit(column)?;
        client_moves += 1;
        debug!(column, botmove = reply.botmove, msg = %reply.msg, "move exchanged");
    }
}
