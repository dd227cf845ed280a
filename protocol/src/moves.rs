//! 走法验证与吃子结算

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::error::GameError;
use crate::piece::{MoveToken, PlacedPiece, Player, Position};

/// 计算某方向在指定阵营、指定步长下的 (行, 列) 增量
///
/// 前/后按阵营翻转行方向，斜向两个分量同幅度。
pub fn resolve_delta(token: MoveToken, player: Player, step_distance: u8) -> (i8, i8) {
    let (forward, col) = token.unit();
    let step = step_distance as i8;
    (forward * player.forward_sign() * step, col * step)
}

/// 已验证的走法，包含路径上所有被吃的棋子
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMove {
    /// 行棋方
    pub player: Player,
    /// 移动的棋子
    pub piece: PlacedPiece,
    /// 方向
    pub token: MoveToken,
    /// 起始位置
    pub from: Position,
    /// 目标位置
    pub to: Position,
    /// 被吃掉的位置（途经格 + 目标格）
    pub captures: Vec<Position>,
}

impl ResolvedMove {
    /// 把走法落到棋盘上：清空被吃的格子，移动棋子
    pub fn apply_to(&self, board: &mut Board) {
        for pos in &self.captures {
            board.clear(*pos);
        }
        board.move_piece(self.from, self.to);
    }
}

impl std::fmt::Display for ResolvedMove {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {} -> {}", self.piece, self.token, self.from, self.to)
    }
}

/// 规则引擎
pub struct RuleEngine;

impl RuleEngine {
    /// 验证 (阵营, 棋子, 方向)，不修改棋盘
    pub fn evaluate(
        board: &Board,
        player: Player,
        identity: &str,
        token: MoveToken,
    ) -> Result<ResolvedMove, GameError> {
        let from = board
            .find(player, identity)
            .ok_or_else(|| GameError::PieceNotFound {
                player,
                piece: identity.to_string(),
            })?;
        let piece = board
            .occupant_at(from)
            .cloned()
            .ok_or_else(|| GameError::PieceNotFound {
                player,
                piece: identity.to_string(),
            })?;

        let kind = piece.kind();
        if !kind.allows(token) {
            return Err(GameError::IllegalMoveToken { kind, token });
        }

        let step = kind.step_distance();
        let (drow, dcol) = resolve_delta(token, player, step);
        let to = from.offset(drow, dcol).ok_or_else(|| {
            let (row, col) = from.offset_raw(drow, dcol);
            GameError::OutOfBounds { row, col }
        })?;

        let destination_captured = match board.occupant_at(to) {
            Some(target) if target.owner == player => {
                return Err(GameError::FriendlyFire {
                    row: to.row,
                    col: to.col,
                });
            }
            Some(_) => true,
            None => false,
        };

        // 跳跃走法：途经格上的对方棋子一律被吃，己方棋子不阻挡
        let mut captures = Vec::new();
        let (urow, ucol) = resolve_delta(token, player, 1);
        for i in 1..step as i8 {
            if let Some(pos) = from.offset(urow * i, ucol * i) {
                if matches!(board.occupant_at(pos), Some(p) if p.owner != player) {
                    captures.push(pos);
                }
            }
        }
        if destination_captured {
            captures.push(to);
        }

        Ok(ResolvedMove {
            player,
            piece,
            token,
            from,
            to,
            captures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::{PieceId, PieceKind};

    fn piece(owner: Player, id: &str) -> PlacedPiece {
        PlacedPiece::new(owner, PieceId::parse(id).unwrap())
    }

    fn at(row: u8, col: u8) -> Position {
        Position::new_unchecked(row, col)
    }

    #[test]
    fn test_resolve_delta_is_player_relative() {
        assert_eq!(resolve_delta(MoveToken::Forward, Player::A, 1), (1, 0));
        assert_eq!(resolve_delta(MoveToken::Forward, Player::B, 1), (-1, 0));
        assert_eq!(resolve_delta(MoveToken::Backward, Player::A, 2), (-2, 0));
        assert_eq!(resolve_delta(MoveToken::Left, Player::A, 2), (0, -2));
        assert_eq!(resolve_delta(MoveToken::Left, Player::B, 2), (0, -2));
        assert_eq!(resolve_delta(MoveToken::ForwardRight, Player::A, 2), (2, 2));
        assert_eq!(resolve_delta(MoveToken::ForwardRight, Player::B, 2), (-2, 2));

        for token in MoveToken::ALL {
            let (ar, ac) = resolve_delta(token, Player::A, 2);
            let (br, bc) = resolve_delta(token, Player::B, 2);
            assert_eq!((ar, ac), (-br, bc));
        }
    }

    #[test]
    fn test_piece_not_found() {
        let board = Board::empty();
        let err = RuleEngine::evaluate(&board, Player::A, "P1", MoveToken::Forward).unwrap_err();
        assert_eq!(
            err,
            GameError::PieceNotFound {
                player: Player::A,
                piece: "P1".to_string()
            }
        );
    }

    #[test]
    fn test_piece_of_other_player_not_found() {
        let mut board = Board::empty();
        board.place(at(4, 0), piece(Player::B, "P1"));
        let err = RuleEngine::evaluate(&board, Player::A, "P1", MoveToken::Forward).unwrap_err();
        assert!(matches!(err, GameError::PieceNotFound { .. }));
    }

    #[test]
    fn test_illegal_token() {
        let mut board = Board::empty();
        board.place(at(2, 2), piece(Player::A, "H2"));
        board.place(at(0, 0), piece(Player::A, "P1"));

        let err = RuleEngine::evaluate(&board, Player::A, "H2", MoveToken::Forward).unwrap_err();
        assert_eq!(
            err,
            GameError::IllegalMoveToken {
                kind: PieceKind::H2,
                token: MoveToken::Forward
            }
        );

        let err = RuleEngine::evaluate(&board, Player::A, "P1", MoveToken::ForwardRight).unwrap_err();
        assert!(matches!(err, GameError::IllegalMoveToken { .. }));
    }

    #[test]
    fn test_out_of_bounds() {
        let mut board = Board::empty();
        board.place(at(0, 0), piece(Player::A, "P1"));
        board.place(at(0, 4), piece(Player::B, "H1"));

        let err = RuleEngine::evaluate(&board, Player::A, "P1", MoveToken::Backward).unwrap_err();
        assert_eq!(err, GameError::OutOfBounds { row: -1, col: 0 });

        let err = RuleEngine::evaluate(&board, Player::B, "H1", MoveToken::Right).unwrap_err();
        assert_eq!(err, GameError::OutOfBounds { row: 0, col: 6 });
    }

    #[test]
    fn test_friendly_fire() {
        let mut board = Board::empty();
        board.place(at(0, 0), piece(Player::A, "P1"));
        board.place(at(0, 1), piece(Player::A, "P2"));

        let err = RuleEngine::evaluate(&board, Player::A, "P1", MoveToken::Right).unwrap_err();
        assert_eq!(err, GameError::FriendlyFire { row: 0, col: 1 });
    }

    #[test]
    fn test_step_move_into_empty_has_no_capture() {
        let mut board = Board::empty();
        board.place(at(0, 0), piece(Player::A, "P1"));

        let mv = RuleEngine::evaluate(&board, Player::A, "P1", MoveToken::Forward).unwrap();
        assert_eq!(mv.from, at(0, 0));
        assert_eq!(mv.to, at(1, 0));
        assert!(mv.captures.is_empty());
    }

    #[test]
    fn test_destination_capture() {
        let mut board = Board::empty();
        board.place(at(3, 1), piece(Player::B, "P1"));
        board.place(at(2, 1), piece(Player::A, "P2"));

        let mv = RuleEngine::evaluate(&board, Player::B, "P1", MoveToken::Forward).unwrap();
        assert_eq!(mv.to, at(2, 1));
        assert_eq!(mv.captures, vec![at(2, 1)]);

        mv.apply_to(&mut board);
        assert_eq!(board.count(Player::A), 0);
        assert_eq!(board.occupant_at(at(2, 1)), Some(&piece(Player::B, "P1")));
    }

    #[test]
    fn test_jump_splash_captures_intermediate() {
        let mut board = Board::empty();
        board.place(at(0, 2), piece(Player::A, "H1"));
        board.place(at(1, 2), piece(Player::B, "P1"));

        let mv = RuleEngine::evaluate(&board, Player::A, "H1", MoveToken::Forward).unwrap();
        assert_eq!(mv.to, at(2, 2));
        assert_eq!(mv.captures, vec![at(1, 2)]);

        mv.apply_to(&mut board);
        assert!(board.occupant_at(at(1, 2)).is_none());
        assert!(board.occupant_at(at(0, 2)).is_none());
        assert_eq!(board.occupant_at(at(2, 2)), Some(&piece(Player::A, "H1")));
        assert_eq!(board.count(Player::B), 0);
    }

    #[test]
    fn test_diagonal_jump_captures_path_and_destination() {
        let mut board = Board::empty();
        board.place(at(4, 0), piece(Player::B, "H2"));
        board.place(at(3, 1), piece(Player::A, "P1"));
        board.place(at(2, 2), piece(Player::A, "P2"));

        // B 的前方是行号减小的方向
        let mv = RuleEngine::evaluate(&board, Player::B, "H2", MoveToken::ForwardRight).unwrap();
        assert_eq!(mv.to, at(2, 2));
        assert_eq!(mv.captures, vec![at(3, 1), at(2, 2)]);

        mv.apply_to(&mut board);
        assert_eq!(board.count(Player::A), 0);
        assert_eq!(board.count(Player::B), 1);
    }

    #[test]
    fn test_jump_passes_over_friendly_piece() {
        let mut board = Board::empty();
        board.place(at(0, 2), piece(Player::A, "H1"));
        board.place(at(0, 3), piece(Player::A, "H2"));

        let mv = RuleEngine::evaluate(&board, Player::A, "H1", MoveToken::Right).unwrap();
        assert_eq!(mv.to, at(0, 4));
        assert!(mv.captures.is_empty());

        mv.apply_to(&mut board);
        assert_eq!(board.occupant_at(at(0, 3)), Some(&piece(Player::A, "H2")));
        assert_eq!(board.count(Player::A), 2);
    }

    #[test]
    fn test_move_then_inverse_returns_to_origin() {
        let center = at(2, 2);
        for player in [Player::A, Player::B] {
            for id in ["P1", "H1", "H2"] {
                let kind = PieceKind::from_identity(id).unwrap();
                for &token in kind.tokens() {
                    let mut board = Board::empty();
                    board.place(center, piece(player, id));

                    let mv = RuleEngine::evaluate(&board, player, id, token).unwrap();
                    mv.apply_to(&mut board);
                    let back = RuleEngine::evaluate(&board, player, id, token.inverse()).unwrap();
                    assert_eq!(back.to, center, "{player} {id} {token}");
                    back.apply_to(&mut board);
                    assert_eq!(board.find(player, id), Some(center));
                }
            }
        }
    }
}
