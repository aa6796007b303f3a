//! 盤面表現と着手生成
//!
//! 任意サイズの正方形盤面、石の色、合法手の列挙、着手の適用、石数の集計、
//! およびゲームマネージャから受け取る盤面テキストの検証付きデコーダを提供する。

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 盤面の構築・デコードエラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// 行が1つもない
    #[error("board snapshot is empty")]
    Empty,

    /// 構文エラー
    #[error("syntax error at byte {position}: {message}")]
    Syntax { position: usize, message: String },

    /// 行の長さが行数と一致しない
    #[error("row {row} has {len} cells, expected {expected}")]
    NotSquare {
        row: usize,
        len: usize,
        expected: usize,
    },

    /// 0/1/2 以外のセル値
    #[error("invalid cell value {value} at column {column}, row {row}")]
    InvalidCell {
        column: usize,
        row: usize,
        value: i64,
    },

    /// 初期配置を作れないサイズ
    #[error("unsupported board size: {0} (must be even and at least 2)")]
    UnsupportedSize(usize),
}

/// 石の色を表す列挙型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Color {
    /// 黒石（先手、プロトコル上の値は1）
    Dark = 1,
    /// 白石（後手、プロトコル上の値は2）
    Light = 2,
}

impl Color {
    /// 反対の色を返す
    ///
    /// # Examples
    ///
    /// ```
    /// use othello_agent::board::Color;
    ///
    /// assert_eq!(Color::Dark.opposite(), Color::Light);
    /// assert_eq!(Color::Light.opposite(), Color::Dark);
    /// ```
    #[inline]
    pub fn opposite(self) -> Color {
        match self {
            Color::Dark => Color::Light,
            Color::Light => Color::Dark,
        }
    }

    /// プロトコル上の数値（1または2）から色を得る
    pub fn from_protocol(value: i64) -> Option<Color> {
        match value {
            1 => Some(Color::Dark),
            2 => Some(Color::Light),
            _ => None,
        }
    }

    /// この色の石が置かれたセル
    #[inline]
    pub fn cell(self) -> Cell {
        match self {
            Color::Dark => Cell::Dark,
            Color::Light => Cell::Light,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Dark => write!(f, "dark"),
            Color::Light => write!(f, "light"),
        }
    }
}

/// セルの状態
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty,
    Dark,
    Light,
}

impl Cell {
    /// セル上の石の色（空ならNone）
    #[inline]
    pub fn color(self) -> Option<Color> {
        match self {
            Cell::Empty => None,
            Cell::Dark => Some(Color::Dark),
            Cell::Light => Some(Color::Light),
        }
    }

    fn symbol(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Dark => 'X',
            Cell::Light => 'O',
        }
    }
}

/// 着手位置（列, 行）
///
/// 「着手なし」は `Option<Move>` の `None` で表す。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub column: usize,
    pub row: usize,
}

impl Move {
    #[inline]
    pub const fn new(column: usize, row: usize) -> Self {
        Self { column, row }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// 8方向（列方向の差分, 行方向の差分）
const DIRECTIONS: [(isize, isize); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

/// オセロ盤面
///
/// `size × size` の正方形グリッドを行優先で保持する不変スナップショット。
/// 値の等価性とハッシュを持ち、置換表のキーとして使用できる。
/// 着手は常に新しい盤面を返し、既存の盤面を書き換えることはない。
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Board {
    size: usize,
    cells: Box<[Cell]>,
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<String> = (0..self.size)
            .map(|row| {
                (0..self.size)
                    .map(|column| self.cell(column, row).symbol())
                    .collect()
            })
            .collect();
        f.debug_struct("Board")
            .field("size", &self.size)
            .field("rows", &rows)
            .finish()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..self.size {
            for column in 0..self.size {
                write!(f, "{}", self.cell(column, row).symbol())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl Board {
    /// 初期盤面を生成
    ///
    /// 中央4マスに、(c-1, c-1)と(c, c)に白、(c, c-1)と(c-1, c)に黒を置く
    /// （座標は列, 行、c = size / 2）。
    ///
    /// # Examples
    ///
    /// ```
    /// use othello_agent::board::{Board, score};
    ///
    /// let board = Board::initial(8).unwrap();
    /// assert_eq!(score(&board), (2, 2));
    /// ```
    pub fn initial(size: usize) -> Result<Self, BoardError> {
        if size < 2 || size % 2 != 0 {
            return Err(BoardError::UnsupportedSize(size));
        }
        Ok(Self::start_position(size))
    }

    /// 中央4マスを配置した盤面（`size` は2以上の偶数）
    fn start_position(size: usize) -> Self {
        let mut cells = vec![Cell::Empty; size * size];
        let c = size / 2;
        cells[(c - 1) * size + (c - 1)] = Cell::Light;
        cells[c * size + c] = Cell::Light;
        cells[(c - 1) * size + c] = Cell::Dark;
        cells[c * size + (c - 1)] = Cell::Dark;

        Self {
            size,
            cells: cells.into_boxed_slice(),
        }
    }

    /// 行のリストから盤面を生成
    ///
    /// 行数と各行の長さが一致しない場合は `NotSquare` を返す。
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Result<Self, BoardError> {
        let size = rows.len();
        if size == 0 {
            return Err(BoardError::Empty);
        }

        let mut cells = Vec::with_capacity(size * size);
        for (row, line) in rows.into_iter().enumerate() {
            if line.len() != size {
                return Err(BoardError::NotSquare {
                    row,
                    len: line.len(),
                    expected: size,
                });
            }
            cells.extend(line);
        }

        Ok(Self {
            size,
            cells: cells.into_boxed_slice(),
        })
    }

    /// 一辺のマス数
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// (列, 行)のセルを取得
    ///
    /// # Panics
    ///
    /// 範囲外の座標を渡した場合
    #[inline]
    pub fn cell(&self, column: usize, row: usize) -> Cell {
        self.cells[row * self.size + column]
    }

    /// 空きマス数（残り手数の上限）
    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c == Cell::Empty).count()
    }

    #[inline]
    fn in_bounds(&self, column: isize, row: isize) -> bool {
        column >= 0 && row >= 0 && (column as usize) < self.size && (row as usize) < self.size
    }

    /// (列, 行)に`color`の石を置いたときに挟まれる相手の石を列挙
    fn captured(&self, color: Color, column: usize, row: usize) -> Vec<(usize, usize)> {
        let own = color.cell();
        let mut flips = Vec::new();

        for (dc, dr) in DIRECTIONS {
            let mut c = column as isize + dc;
            let mut r = row as isize + dr;
            let start = flips.len();
            let mut closed = false;

            while self.in_bounds(c, r) {
                match self.cell(c as usize, r as usize) {
                    Cell::Empty => break,
                    cell if cell == own => {
                        closed = true;
                        break;
                    }
                    _ => flips.push((c as usize, r as usize)),
                }
                c += dc;
                r += dr;
            }

            if !closed {
                flips.truncate(start);
            }
        }

        flips
    }

    /// 少なくとも1方向で相手の石を挟めるか
    fn captures_any(&self, color: Color, column: usize, row: usize) -> bool {
        let own = color.cell();

        DIRECTIONS.iter().any(|&(dc, dr)| {
            let mut c = column as isize + dc;
            let mut r = row as isize + dr;
            let mut seen_opponent = false;

            while self.in_bounds(c, r) {
                match self.cell(c as usize, r as usize) {
                    Cell::Empty => return false,
                    cell if cell == own => return seen_opponent,
                    _ => seen_opponent = true,
                }
                c += dc;
                r += dr;
            }

            false
        })
    }
}

impl Default for Board {
    /// 8x8の初期盤面
    fn default() -> Self {
        Self::start_position(8)
    }
}

/// 合法手を列挙
///
/// 列優先（各列について全行）の順で返す。この順序は探索での同点時の
/// 手の選択と、ムーブオーダリングなしのAlpha-Betaの枝刈り効率を決める。
///
/// # Examples
///
/// ```
/// use othello_agent::board::{Board, Color, Move, legal_moves};
///
/// let board = Board::initial(8).unwrap();
/// let moves = legal_moves(&board, Color::Dark);
/// assert_eq!(moves[0], Move::new(2, 3));
/// assert_eq!(moves.len(), 4);
/// ```
pub fn legal_moves(board: &Board, color: Color) -> Vec<Move> {
    let mut moves = Vec::new();
    for column in 0..board.size {
        for row in 0..board.size {
            if board.cell(column, row) == Cell::Empty && board.captures_any(color, column, row) {
                moves.push(Move::new(column, row));
            }
        }
    }
    moves
}

/// 合法手が1つでもあるか
pub fn has_legal_move(board: &Board, color: Color) -> bool {
    (0..board.size).any(|column| {
        (0..board.size).any(|row| {
            board.cell(column, row) == Cell::Empty && board.captures_any(color, column, row)
        })
    })
}

/// 着手を適用した新しい盤面を返す
///
/// 元の盤面は変更されない。`mv` が合法手であることは呼び出し側の責任で、
/// 挟める石がなければ石を置くだけになる。
pub fn apply_move(board: &Board, color: Color, mv: Move) -> Board {
    let flips = board.captured(color, mv.column, mv.row);
    let mut cells = board.cells.clone();
    let own = color.cell();

    cells[mv.row * board.size + mv.column] = own;
    for (column, row) in flips {
        cells[row * board.size + column] = own;
    }

    Board {
        size: board.size,
        cells,
    }
}

/// 石数を集計（黒, 白）
pub fn score(board: &Board) -> (u32, u32) {
    board
        .cells
        .iter()
        .fold((0, 0), |(dark, light), cell| match cell {
            Cell::Dark => (dark + 1, light),
            Cell::Light => (dark, light + 1),
            Cell::Empty => (dark, light),
        })
}

/// 盤面テキストをデコード
///
/// ゲームマネージャが送る `((0, 0, ...), (...), ...)` 形式（角括弧も可）の
/// 行の並びを受け付ける。セル値は 0=空, 1=黒, 2=白。
///
/// # Examples
///
/// ```
/// use othello_agent::board::{Cell, decode_board};
///
/// let board = decode_board("((0, 1), (2, 0))").unwrap();
/// assert_eq!(board.cell(1, 0), Cell::Dark);
/// assert_eq!(board.cell(0, 1), Cell::Light);
/// ```
pub fn decode_board(text: &str) -> Result<Board, BoardError> {
    let mut decoder = Decoder::new(text);
    let rows = decoder.rows()?;
    decoder.finish()?;

    let size = rows.len();
    if size == 0 {
        return Err(BoardError::Empty);
    }

    let mut cells = Vec::with_capacity(size);
    for (row, values) in rows.into_iter().enumerate() {
        if values.len() != size {
            return Err(BoardError::NotSquare {
                row,
                len: values.len(),
                expected: size,
            });
        }
        let line = values
            .into_iter()
            .enumerate()
            .map(|(column, value)| match value {
                0 => Ok(Cell::Empty),
                1 => Ok(Cell::Dark),
                2 => Ok(Cell::Light),
                _ => Err(BoardError::InvalidCell { column, row, value }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        cells.push(line);
    }

    Board::from_rows(cells)
}

impl FromStr for Board {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_board(s)
    }
}

/// 入れ子の括弧列を読む再帰下降デコーダ
struct Decoder<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
        }
    }

    fn error(&self, message: impl Into<String>) -> BoardError {
        BoardError::Syntax {
            position: self.pos,
            message: message.into(),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_whitespace();
        self.bytes.get(self.pos).copied()
    }

    fn open(&mut self) -> Result<u8, BoardError> {
        match self.peek() {
            Some(b'(') => {
                self.pos += 1;
                Ok(b')')
            }
            Some(b'[') => {
                self.pos += 1;
                Ok(b']')
            }
            Some(other) => Err(self.error(format!(
                "expected '(' or '[', found '{}'",
                other as char
            ))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    /// 区切りのカンマ、または閉じ括弧を読む。閉じたらtrue
    fn separator(&mut self, close: u8) -> Result<bool, BoardError> {
        match self.peek() {
            Some(b',') => {
                self.pos += 1;
                if self.peek() == Some(close) {
                    self.pos += 1;
                    return Ok(true);
                }
                Ok(false)
            }
            Some(c) if c == close => {
                self.pos += 1;
                Ok(true)
            }
            Some(other) => Err(self.error(format!(
                "expected ',' or '{}', found '{}'",
                close as char, other as char
            ))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    /// 括弧で囲まれた要素列を読む
    fn sequence<T>(
        &mut self,
        mut item: impl FnMut(&mut Self) -> Result<T, BoardError>,
    ) -> Result<Vec<T>, BoardError> {
        let close = self.open()?;
        let mut items = Vec::new();

        if self.peek() == Some(close) {
            self.pos += 1;
            return Ok(items);
        }

        loop {
            items.push(item(self)?);
            if self.separator(close)? {
                return Ok(items);
            }
        }
    }

    fn rows(&mut self) -> Result<Vec<Vec<i64>>, BoardError> {
        self.sequence(|d| d.sequence(Self::integer))
    }

    fn integer(&mut self) -> Result<i64, BoardError> {
        self.skip_whitespace();
        let start = self.pos;
        if self.bytes.get(self.pos) == Some(&b'-') {
            self.pos += 1;
        }
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_digit() {
            self.pos += 1;
        }

        self.text[start..self.pos]
            .parse::<i64>()
            .map_err(|_| BoardError::Syntax {
                position: start,
                message: "expected an integer cell value".to_string(),
            })
    }

    fn finish(&mut self) -> Result<(), BoardError> {
        match self.peek() {
            None => Ok(()),
            Some(other) => Err(self.error(format!("trailing input '{}'", other as char))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_opposite() {
        assert_eq!(Color::Dark.opposite(), Color::Light);
        assert_eq!(Color::Light.opposite(), Color::Dark);
    }

    #[test]
    fn test_color_from_protocol() {
        assert_eq!(Color::from_protocol(1), Some(Color::Dark));
        assert_eq!(Color::from_protocol(2), Some(Color::Light));
        assert_eq!(Color::from_protocol(0), None);
        assert_eq!(Color::from_protocol(3), None);
    }

    #[test]
    fn test_initial_board() {
        // 初期盤面の正当性を検証
        let board = Board::initial(8).unwrap();

        assert_eq!(board.size(), 8);
        assert_eq!(board.cell(3, 3), Cell::Light, "D4は白");
        assert_eq!(board.cell(4, 4), Cell::Light, "E5は白");
        assert_eq!(board.cell(4, 3), Cell::Dark, "E4は黒");
        assert_eq!(board.cell(3, 4), Cell::Dark, "D5は黒");
        assert_eq!(board.empty_count(), 60);
        assert_eq!(board, Board::default(), "Defaultは8x8初期盤面");
    }

    #[test]
    fn test_default_board_layout() {
        let board = Board::default();
        assert_eq!(board.size(), 8);
        assert_eq!(board.cell(3, 3), Cell::Light);
        assert_eq!(board.cell(4, 4), Cell::Light);
        assert_eq!(board.cell(4, 3), Cell::Dark);
        assert_eq!(board.cell(3, 4), Cell::Dark);
        assert_eq!(score(&board), (2, 2));
        assert_eq!(legal_moves(&board, Color::Dark).len(), 4);
    }

    #[test]
    fn test_initial_board_invalid_size() {
        assert_eq!(Board::initial(0), Err(BoardError::UnsupportedSize(0)));
        assert_eq!(Board::initial(5), Err(BoardError::UnsupportedSize(5)));
        assert!(Board::initial(4).is_ok());
    }

    #[test]
    fn test_legal_moves_column_major_order() {
        // 初期盤面の黒の合法手は列優先順で4手
        let board = Board::initial(8).unwrap();
        let moves = legal_moves(&board, Color::Dark);
        assert_eq!(
            moves,
            vec![
                Move::new(2, 3),
                Move::new(3, 2),
                Move::new(4, 5),
                Move::new(5, 4)
            ]
        );

        let moves = legal_moves(&board, Color::Light);
        assert_eq!(moves.len(), 4, "白も4手");
        assert!(has_legal_move(&board, Color::Light));
    }

    #[test]
    fn test_apply_move_flips_and_keeps_original() {
        let board = Board::initial(8).unwrap();
        let next = apply_move(&board, Color::Dark, Move::new(2, 3));

        // 元の盤面は変わらない
        assert_eq!(score(&board), (2, 2));
        assert_eq!(board.cell(3, 3), Cell::Light);

        // 置いた石と挟んだ石が黒になる
        assert_eq!(next.cell(2, 3), Cell::Dark);
        assert_eq!(next.cell(3, 3), Cell::Dark);
        assert_eq!(score(&next), (4, 1));
    }

    #[test]
    fn test_apply_move_flips_multiple_directions() {
        let board: Board = "((0,1,0),(1,2,2),(0,2,0))".parse().unwrap();
        assert_eq!(board.cell(2, 1), Cell::Light);

        let moves = legal_moves(&board, Color::Dark);
        assert!(moves.is_empty(), "黒は閉じる石がないので打てない");

        let board: Board = "((1,0,0,0),(2,0,0,0),(0,2,2,1),(0,0,0,0))".parse().unwrap();
        let next = apply_move(&board, Color::Dark, Move::new(0, 2));
        assert_eq!(next.cell(0, 1), Cell::Dark, "上方向に返る");
        assert_eq!(next.cell(1, 2), Cell::Dark, "右方向に返る");
        assert_eq!(next.cell(2, 2), Cell::Dark, "右方向に返る");
        assert_eq!(score(&next), (6, 0));
    }

    #[test]
    fn test_full_board_has_no_moves() {
        let board: Board = "((1,1),(2,1))".parse().unwrap();
        assert!(legal_moves(&board, Color::Dark).is_empty());
        assert!(legal_moves(&board, Color::Light).is_empty());
        assert_eq!(board.empty_count(), 0);
        assert_eq!(score(&board), (3, 1));
    }

    #[test]
    fn test_board_hash_equality() {
        use std::collections::HashSet;

        let a = Board::initial(8).unwrap();
        let b = apply_move(&a, Color::Dark, Move::new(2, 3));
        let c = apply_move(&a, Color::Dark, Move::new(2, 3));

        let mut set = HashSet::new();
        set.insert(a.clone());
        set.insert(b);
        set.insert(c);
        assert_eq!(set.len(), 2, "同じ盤面は同じキーになるべき");
    }

    #[test]
    fn test_decode_tuple_and_list_syntax() {
        let tuple = decode_board("((0, 1), (2, 0))").unwrap();
        let list = decode_board(" [ [0,1] , [2,0], ] ").unwrap();
        assert_eq!(tuple, list);
        assert_eq!(tuple.cell(0, 0), Cell::Empty);
        assert_eq!(tuple.cell(1, 0), Cell::Dark);
        assert_eq!(tuple.cell(0, 1), Cell::Light);
    }

    #[test]
    fn test_decode_rejects_malformed_input() {
        assert_eq!(decode_board("()"), Err(BoardError::Empty));
        assert!(matches!(
            decode_board("((0, 1), (2))"),
            Err(BoardError::NotSquare {
                row: 1,
                len: 1,
                expected: 2
            })
        ));
        assert!(matches!(
            decode_board("((0, 3), (2, 0))"),
            Err(BoardError::InvalidCell {
                column: 1,
                row: 0,
                value: 3
            })
        ));
        assert!(matches!(
            decode_board("((0, -1), (2, 0))"),
            Err(BoardError::InvalidCell { value: -1, .. })
        ));
        assert!(matches!(
            decode_board("((0, 1), (2, 0)"),
            Err(BoardError::Syntax { .. })
        ));
        assert!(matches!(
            decode_board("((0, 1), (2, 0)) extra"),
            Err(BoardError::Syntax { .. })
        ));
        assert!(matches!(
            decode_board("((0, x), (2, 0))"),
            Err(BoardError::Syntax { position: 5, .. })
        ));
        assert!(matches!(
            decode_board("__import__('os')"),
            Err(BoardError::Syntax { position: 0, .. })
        ));
    }

    #[test]
    fn test_display_and_debug() {
        let board = Board::initial(4).unwrap();
        assert_eq!(format!("{}", board), "....\n.OX.\n.XO.\n....\n");

        let debug = format!("{:?}", board);
        assert!(debug.contains("size: 4"));
        assert!(debug.contains(".OX."));
    }
}
