//! 对局状态机
//!
//! NotStarted → InProgress → Finished(winner)，阶段只前进不后退。

use std::collections::HashSet;

use tracing::{debug, info};

use protocol::{
    Board, GameError, MoveToken, Phase, PieceId, PlacedPiece, Player, Position, ResolvedMove,
    Rosters, RuleEngine, SessionSnapshot, BOARD_SIZE,
};

/// 对局阶段（内部表示，Finished 携带胜者）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NotStarted,
    InProgress,
    Finished(Player),
}

impl SessionPhase {
    fn wire(&self) -> Phase {
        match self {
            SessionPhase::NotStarted => Phase::NotStarted,
            SessionPhase::InProgress => Phase::InProgress,
            SessionPhase::Finished(_) => Phase::Finished,
        }
    }
}

/// 一局游戏的权威状态
#[derive(Debug, Clone)]
pub struct GameSession {
    board: Board,
    rosters: Rosters,
    current_player: Player,
    phase: SessionPhase,
}

impl GameSession {
    /// 创建空对局
    pub fn new() -> Self {
        Self {
            board: Board::empty(),
            rosters: Rosters::default(),
            current_player: Player::A,
            phase: SessionPhase::NotStarted,
        }
    }

    /// 从已有棋盘创建进行中的对局，名单按棋盘顺序生成
    pub fn from_board(board: Board, current_player: Player) -> Self {
        let roster = |player| {
            board
                .pieces(player)
                .into_iter()
                .map(|(_, piece)| piece.id.to_string())
                .collect()
        };
        let rosters = Rosters {
            a: roster(Player::A),
            b: roster(Player::B),
        };
        Self {
            board,
            rosters,
            current_player,
            phase: SessionPhase::InProgress,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn current_player(&self) -> Player {
        self.current_player
    }

    /// 胜者（对局未结束时为 None）
    pub fn winner(&self) -> Option<Player> {
        match self.phase {
            SessionPhase::Finished(winner) => Some(winner),
            _ => None,
        }
    }

    /// 开局：A 方排在第 0 行，B 方排在第 N-1 行，第 i 个棋子放在第 i 列
    pub fn start(&mut self, setup_a: Vec<String>, setup_b: Vec<String>) -> Result<(), GameError> {
        if self.phase != SessionPhase::NotStarted {
            return Err(GameError::AlreadyStarted);
        }

        let pieces_a = Self::validate_setup(Player::A, &setup_a)?;
        let pieces_b = Self::validate_setup(Player::B, &setup_b)?;

        let mut board = Board::empty();
        for (player, pieces) in [(Player::A, pieces_a), (Player::B, pieces_b)] {
            let row = player.home_row();
            for (col, id) in pieces.into_iter().enumerate() {
                board.place(
                    Position::new_unchecked(row, col as u8),
                    PlacedPiece::new(player, id),
                );
            }
        }

        self.board = board;
        self.rosters = Rosters {
            a: setup_a,
            b: setup_b,
        };
        self.current_player = Player::A;
        self.phase = SessionPhase::InProgress;

        info!(setup_a = ?self.rosters.a, setup_b = ?self.rosters.b, "对局开始");
        Ok(())
    }

    /// 布阵必须正好 N 个、类型可识别、同一方标识不重复
    fn validate_setup(player: Player, setup: &[String]) -> Result<Vec<PieceId>, GameError> {
        if setup.len() != BOARD_SIZE {
            return Err(GameError::InvalidSetup {
                reason: format!(
                    "player {player} must place exactly {BOARD_SIZE} pieces, got {}",
                    setup.len()
                ),
            });
        }

        let mut seen = HashSet::new();
        setup
            .iter()
            .map(|label| {
                let id = PieceId::parse(label).ok_or_else(|| GameError::InvalidSetup {
                    reason: format!("player {player} has unknown piece {label:?}"),
                })?;
                if !seen.insert(label.as_str()) {
                    return Err(GameError::InvalidSetup {
                        reason: format!("player {player} has duplicate piece {label:?}"),
                    });
                }
                Ok(id)
            })
            .collect()
    }

    /// 走棋：所有检查通过后才修改棋盘和回合
    pub fn apply_move(
        &mut self,
        player: Player,
        identity: &str,
        token: MoveToken,
    ) -> Result<ResolvedMove, GameError> {
        match self.phase {
            SessionPhase::NotStarted => return Err(GameError::NotStarted),
            SessionPhase::Finished(_) => return Err(GameError::GameOver),
            SessionPhase::InProgress => {}
        }
        if player != self.current_player {
            return Err(GameError::NotYourTurn);
        }

        let mv = RuleEngine::evaluate(&self.board, player, identity, token)?;
        mv.apply_to(&mut self.board);
        self.current_player = player.opponent();

        debug!(%mv, captures = mv.captures.len(), "走棋");

        if self.board.count(player.opponent()) == 0 {
            self.phase = SessionPhase::Finished(player);
            info!(winner = %player, "对局结束");
        }

        Ok(mv)
    }

    /// 完整快照
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            board: self.board.rows(),
            players: self.rosters.clone(),
            current_player: self.current_player,
            phase: self.phase.wire(),
            winner: self.winner(),
        }
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}
