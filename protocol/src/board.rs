//! 棋盘状态

use crate::constants::BOARD_SIZE;
use crate::piece::{PlacedPiece, Player, Position};

/// 棋盘
///
/// 只负责存放棋子，不做任何规则检查。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// N×N 棋盘，索引为 row * N + col
    squares: Vec<Option<PlacedPiece>>,
}

impl Board {
    /// 创建空棋盘
    pub fn empty() -> Self {
        Self {
            squares: vec![None; BOARD_SIZE * BOARD_SIZE],
        }
    }

    /// 获取指定位置的棋子
    pub fn occupant_at(&self, pos: Position) -> Option<&PlacedPiece> {
        if pos.is_valid() {
            self.squares[pos.to_index()].as_ref()
        } else {
            None
        }
    }

    /// 放置棋子，覆盖原有棋子
    pub fn place(&mut self, pos: Position, piece: PlacedPiece) -> Option<PlacedPiece> {
        if pos.is_valid() {
            self.squares[pos.to_index()].replace(piece)
        } else {
            None
        }
    }

    /// 清空指定位置
    pub fn clear(&mut self, pos: Position) -> Option<PlacedPiece> {
        if pos.is_valid() {
            self.squares[pos.to_index()].take()
        } else {
            None
        }
    }

    /// 移动棋子（不检查规则），返回被覆盖的棋子
    pub fn move_piece(&mut self, from: Position, to: Position) -> Option<PlacedPiece> {
        if from == to {
            return None;
        }
        match self.clear(from) {
            Some(piece) => self.place(to, piece),
            None => None,
        }
    }

    /// 查找指定阵营、指定标识的棋子位置
    pub fn find(&self, owner: Player, identity: &str) -> Option<Position> {
        self.squares.iter().enumerate().find_map(|(index, square)| match square {
            Some(piece) if piece.owner == owner && piece.id.as_str() == identity => {
                Position::from_index(index)
            }
            _ => None,
        })
    }

    /// 获取指定阵营的所有棋子位置
    pub fn pieces(&self, owner: Player) -> Vec<(Position, &PlacedPiece)> {
        self.squares
            .iter()
            .enumerate()
            .filter_map(|(index, square)| match square {
                Some(piece) if piece.owner == owner => {
                    Position::from_index(index).map(|pos| (pos, piece))
                }
                _ => None,
            })
            .collect()
    }

    /// 指定阵营剩余棋子数
    pub fn count(&self, owner: Player) -> usize {
        self.squares
            .iter()
            .flatten()
            .filter(|piece| piece.owner == owner)
            .count()
    }

    /// 按行展开，用于生成快照
    pub fn rows(&self) -> Vec<Vec<Option<PlacedPiece>>> {
        self.squares
            .chunks(BOARD_SIZE)
            .map(|row| row.to_vec())
            .collect()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}
