//! 棋子、阵营、方向与位置定义

use serde::{Deserialize, Serialize};

use crate::constants::BOARD_SIZE;

/// 阵营
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    /// 先手，从第 0 行出发
    A,
    /// 后手，从第 N-1 行出发
    B,
}

impl Player {
    /// 获取对方阵营
    pub fn opponent(&self) -> Player {
        match self {
            Player::A => Player::B,
            Player::B => Player::A,
        }
    }

    /// "前方"对应的行增量符号
    pub fn forward_sign(&self) -> i8 {
        match self {
            Player::A => 1,
            Player::B => -1,
        }
    }

    /// 开局布阵所在的行
    pub fn home_row(&self) -> u8 {
        match self {
            Player::A => 0,
            Player::B => (BOARD_SIZE - 1) as u8,
        }
    }

    /// 从字符解析
    pub fn from_char(c: char) -> Option<Player> {
        match c {
            'A' => Some(Player::A),
            'B' => Some(Player::B),
            _ => None,
        }
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Player::A => write!(f, "A"),
            Player::B => write!(f, "B"),
        }
    }
}

/// 方向令牌
///
/// 前/后相对于行棋方的朝向，左/右是棋盘上的绝对列方向。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveToken {
    #[serde(rename = "L")]
    Left,
    #[serde(rename = "R")]
    Right,
    #[serde(rename = "F")]
    Forward,
    #[serde(rename = "B")]
    Backward,
    #[serde(rename = "FL")]
    ForwardLeft,
    #[serde(rename = "FR")]
    ForwardRight,
    #[serde(rename = "BL")]
    BackwardLeft,
    #[serde(rename = "BR")]
    BackwardRight,
}

impl MoveToken {
    /// 全部方向
    pub const ALL: [MoveToken; 8] = [
        MoveToken::Left,
        MoveToken::Right,
        MoveToken::Forward,
        MoveToken::Backward,
        MoveToken::ForwardLeft,
        MoveToken::ForwardRight,
        MoveToken::BackwardLeft,
        MoveToken::BackwardRight,
    ];

    /// 单位增量 (前进方向, 列)，尚未按阵营翻转
    pub fn unit(&self) -> (i8, i8) {
        match self {
            MoveToken::Left => (0, -1),
            MoveToken::Right => (0, 1),
            MoveToken::Forward => (1, 0),
            MoveToken::Backward => (-1, 0),
            MoveToken::ForwardLeft => (1, -1),
            MoveToken::ForwardRight => (1, 1),
            MoveToken::BackwardLeft => (-1, -1),
            MoveToken::BackwardRight => (-1, 1),
        }
    }

    /// 反方向
    pub fn inverse(&self) -> MoveToken {
        match self {
            MoveToken::Left => MoveToken::Right,
            MoveToken::Right => MoveToken::Left,
            MoveToken::Forward => MoveToken::Backward,
            MoveToken::Backward => MoveToken::Forward,
            MoveToken::ForwardLeft => MoveToken::BackwardRight,
            MoveToken::ForwardRight => MoveToken::BackwardLeft,
            MoveToken::BackwardLeft => MoveToken::ForwardRight,
            MoveToken::BackwardRight => MoveToken::ForwardLeft,
        }
    }

    /// 协议中的字符串形式
    pub fn as_str(&self) -> &'static str {
        match self {
            MoveToken::Left => "L",
            MoveToken::Right => "R",
            MoveToken::Forward => "F",
            MoveToken::Backward => "B",
            MoveToken::ForwardLeft => "FL",
            MoveToken::ForwardRight => "FR",
            MoveToken::BackwardLeft => "BL",
            MoveToken::BackwardRight => "BR",
        }
    }
}

impl std::fmt::Display for MoveToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const ORTHOGONAL: &[MoveToken] = &[
    MoveToken::Left,
    MoveToken::Right,
    MoveToken::Forward,
    MoveToken::Backward,
];

const DIAGONAL: &[MoveToken] = &[
    MoveToken::ForwardLeft,
    MoveToken::ForwardRight,
    MoveToken::BackwardLeft,
    MoveToken::BackwardRight,
];

/// 棋子类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    /// 兵：直线一步
    P,
    /// 直线跳两格
    H1,
    /// 斜线跳两格
    H2,
}

impl PieceKind {
    /// 允许的方向
    pub fn tokens(&self) -> &'static [MoveToken] {
        match self {
            PieceKind::P | PieceKind::H1 => ORTHOGONAL,
            PieceKind::H2 => DIAGONAL,
        }
    }

    /// 每步移动的格数
    pub fn step_distance(&self) -> u8 {
        match self {
            PieceKind::P => 1,
            PieceKind::H1 | PieceKind::H2 => 2,
        }
    }

    /// 是否允许该方向
    pub fn allows(&self, token: MoveToken) -> bool {
        self.tokens().contains(&token)
    }

    /// 从棋子标识推导类型：`H1`、`H2` 精确匹配，`P` 开头的都是兵
    pub fn from_identity(identity: &str) -> Option<PieceKind> {
        match identity {
            "H1" => Some(PieceKind::H1),
            "H2" => Some(PieceKind::H2),
            s if s.starts_with('P') => Some(PieceKind::P),
            _ => None,
        }
    }
}

impl std::fmt::Display for PieceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PieceKind::P => write!(f, "P"),
            PieceKind::H1 => write!(f, "H1"),
            PieceKind::H2 => write!(f, "H2"),
        }
    }
}

/// 棋子标识（如 `P1`、`H2`），类型由标识决定
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PieceId {
    label: String,
    kind: PieceKind,
}

impl PieceId {
    /// 解析标识，无法识别类型时返回 None
    pub fn parse(label: &str) -> Option<Self> {
        PieceKind::from_identity(label).map(|kind| Self {
            label: label.to_string(),
            kind,
        })
    }

    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    pub fn as_str(&self) -> &str {
        &self.label
    }
}

impl TryFrom<String> for PieceId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PieceId::parse(&value).ok_or_else(|| format!("unknown piece identity: {value}"))
    }
}

impl From<PieceId> for String {
    fn from(id: PieceId) -> Self {
        id.label
    }
}

impl std::fmt::Display for PieceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label)
    }
}

/// 棋盘上的棋子，协议中表示为 `"<阵营>-<标识>"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlacedPiece {
    pub owner: Player,
    pub id: PieceId,
}

impl PlacedPiece {
    /// 创建新棋子
    pub fn new(owner: Player, id: PieceId) -> Self {
        Self { owner, id }
    }

    pub fn kind(&self) -> PieceKind {
        self.id.kind()
    }

    /// 解析 `"A-P1"` 形式
    pub fn parse(s: &str) -> Option<Self> {
        let (owner, label) = s.split_once('-')?;
        let mut chars = owner.chars();
        let owner = match (chars.next(), chars.next()) {
            (Some(c), None) => Player::from_char(c)?,
            _ => return None,
        };
        Some(Self::new(owner, PieceId::parse(label)?))
    }
}

impl TryFrom<String> for PlacedPiece {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PlacedPiece::parse(&value).ok_or_else(|| format!("invalid board cell: {value}"))
    }
}

impl From<PlacedPiece> for String {
    fn from(piece: PlacedPiece) -> Self {
        piece.to_string()
    }
}

impl std::fmt::Display for PlacedPiece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.owner, self.id)
    }
}

/// 棋盘位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// 行 (0..N)
    pub row: u8,
    /// 列 (0..N)
    pub col: u8,
}

impl Position {
    /// 创建新位置
    pub fn new(row: u8, col: u8) -> Option<Self> {
        if (row as usize) < BOARD_SIZE && (col as usize) < BOARD_SIZE {
            Some(Self { row, col })
        } else {
            None
        }
    }

    /// 创建新位置（不检查边界，内部使用）
    pub const fn new_unchecked(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// 检查位置是否在棋盘内
    pub fn is_valid(&self) -> bool {
        (self.row as usize) < BOARD_SIZE && (self.col as usize) < BOARD_SIZE
    }

    /// 获取偏移后的位置
    pub fn offset(&self, drow: i8, dcol: i8) -> Option<Position> {
        let (row, col) = self.offset_raw(drow, dcol);
        if row >= 0 && (row as usize) < BOARD_SIZE && col >= 0 && (col as usize) < BOARD_SIZE {
            Some(Position {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }

    /// 偏移后的原始坐标，可能越界
    pub fn offset_raw(&self, drow: i8, dcol: i8) -> (i8, i8) {
        (self.row as i8 + drow, self.col as i8 + dcol)
    }

    /// 转换为数组索引
    pub fn to_index(&self) -> usize {
        self.row as usize * BOARD_SIZE + self.col as usize
    }

    /// 从数组索引转换
    pub fn from_index(index: usize) -> Option<Self> {
        if index < BOARD_SIZE * BOARD_SIZE {
            Some(Position {
                row: (index / BOARD_SIZE) as u8,
                col: (index % BOARD_SIZE) as u8,
            })
        } else {
            None
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}
