//! 探索アルゴリズムモジュール
//!
//! 深さ制限付きMinimax探索とAlpha-Beta探索を実装し、置換表による
//! 局面キャッシュとムーブオーダリングをオプションとして提供する。
//!
//! 評価値は常にトップレベルで探索を開始した色（視点の色）から見た値であり、
//! 手番の色ではない。視点の色が着手するノードをMaxノード、相手が着手する
//! ノードをMinノードと呼ぶ。

use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use log::debug;

use crate::board::{Board, Color, Move, apply_move, legal_moves};
use crate::config::{Algorithm, DepthLimit, SearchConfig};
use crate::evaluator::{CutoffEval, compute_utility, evaluate_cutoff};

/// 評価値の上限（符号反転しても溢れない）
pub const INFINITY: i32 = i32::MAX;

/// 評価値の下限
pub const NEG_INFINITY: i32 = -INFINITY;

/// 探索統計カウンタ
///
/// 探索中の統計情報を収集するための可変カウンタ。
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SearchStats {
    /// 訪問ノード数（ルートと葉を含む）
    pub nodes: u64,
    /// 置換表ヒット数
    pub cache_hits: u64,
}

impl SearchStats {
    /// 新しい統計カウンタを作成
    pub fn new() -> Self {
        Self {
            nodes: 0,
            cache_hits: 0,
        }
    }
}

/// 探索結果構造体
///
/// 探索完了時に最善手、評価値、探索統計を返す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// 最善手（合法手がなければNone）
    pub best_move: Option<Move>,
    /// 評価値（視点の色から見た石差）
    pub score: i32,
    /// 探索ノード数
    pub nodes_searched: u64,
    /// 置換表ヒット数
    pub cache_hits: u64,
    /// 探索時間（ミリ秒）
    pub elapsed_ms: u64,
}

impl SearchResult {
    /// SearchResultを生成
    pub fn new(
        best_move: Option<Move>,
        score: i32,
        nodes_searched: u64,
        cache_hits: u64,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            best_move,
            score,
            nodes_searched,
            cache_hits,
            elapsed_ms,
        }
    }

    /// 置換表ヒット率を計算
    pub fn cache_hit_rate(&self) -> f64 {
        if self.nodes_searched == 0 {
            0.0
        } else {
            (self.cache_hits as f64) / (self.nodes_searched as f64)
        }
    }
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let best_move = match self.best_move {
            Some(mv) => mv.to_string(),
            None => "none".to_string(),
        };
        write!(
            f,
            "Move: {}, Score: {}, Nodes: {}, Cache Hits: {}/{} ({:.1}%), Time: {}ms",
            best_move,
            self.score,
            self.nodes_searched,
            self.cache_hits,
            self.nodes_searched,
            self.cache_hit_rate() * 100.0,
            self.elapsed_ms
        )
    }
}

/// 置換表エントリの境界タイプ
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    /// 正確な評価値
    Exact,
    /// 下限（beta cutで打ち切られた）
    Lower,
    /// 上限（alpha以下で終わった）
    Upper,
}

/// 置換表のキー
///
/// 盤面だけでなく残り深さ、手番、視点の色を含める。盤面だけをキーにすると
/// 異なる深さや視点で計算した値を誤って再利用してしまう。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub board: Board,
    /// 残り深さ（Noneは無制限）
    pub depth: Option<u32>,
    pub mover: Color,
    pub perspective: Color,
}

impl CacheKey {
    pub fn new(board: Board, depth: Option<u32>, mover: Color, perspective: Color) -> Self {
        Self {
            board,
            depth,
            mover,
            perspective,
        }
    }
}

/// 置換表エントリ
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheEntry {
    /// 最善手
    pub best_move: Option<Move>,
    /// 評価値
    pub value: i32,
    /// 境界タイプ
    pub bound: Bound,
}

/// 置換表
///
/// 1回のトップレベル探索が所有し、探索終了とともに破棄される。
/// プロセス全体で共有される状態は持たない。
#[derive(Debug, Default)]
pub struct TranspositionTable {
    entries: HashMap<CacheKey, CacheEntry>,
}

impl TranspositionTable {
    /// 空の置換表を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 局面を検索
    ///
    /// # Returns
    /// Option<CacheEntry> - ヒット時はエントリ、ミス時はNone
    pub fn probe(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.entries.get(key).copied()
    }

    /// 局面を保存（同じキーは上書き）
    pub fn store(&mut self, key: CacheKey, entry: CacheEntry) {
        self.entries.insert(key, entry);
    }

    /// 保存済みエントリ数
    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// ノードの種類
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NodeKind {
    /// 視点の色が着手する
    Max,
    /// 相手が着手する
    Min,
}

impl NodeKind {
    #[inline]
    fn next(self) -> Self {
        match self {
            NodeKind::Max => NodeKind::Min,
            NodeKind::Min => NodeKind::Max,
        }
    }

    #[inline]
    fn mover(self, perspective: Color) -> Color {
        match self {
            NodeKind::Max => perspective,
            NodeKind::Min => perspective.opposite(),
        }
    }

    /// 子を1つも評価していない時点の評価値
    #[inline]
    fn worst(self) -> i32 {
        match self {
            NodeKind::Max => NEG_INFINITY,
            NodeKind::Min => INFINITY,
        }
    }
}

/// 探索コンテキスト
///
/// 1回の探索に必要な状態をまとめた構造体。置換表もここで所有する。
struct SearchContext {
    perspective: Color,
    cutoff: CutoffEval,
    ordering: bool,
    tt: Option<TranspositionTable>,
    stats: SearchStats,
}

impl SearchContext {
    fn new(perspective: Color, config: &SearchConfig) -> Self {
        Self {
            perspective,
            cutoff: config.cutoff,
            ordering: config.ordering && config.algorithm == Algorithm::AlphaBeta,
            tt: config.caching.then(TranspositionTable::new),
            stats: SearchStats::new(),
        }
    }

    /// 深さ0での静的評価
    ///
    /// 合法手のない終局ノードは常に石差で評価する。
    fn cutoff_value(&self, board: &Board, mover: Color) -> i32 {
        evaluate_cutoff(board, self.perspective, mover, self.cutoff)
    }

    /// 置換表のキーを作る（キャッシュ無効時はNone）
    fn cache_key(&self, board: &Board, depth: Option<u32>, mover: Color) -> Option<CacheKey> {
        self.tt
            .as_ref()
            .map(|_| CacheKey::new(board.clone(), depth, mover, self.perspective))
    }

    fn probe(&self, key: Option<&CacheKey>) -> Option<CacheEntry> {
        match (self.tt.as_ref(), key) {
            (Some(tt), Some(key)) => tt.probe(key),
            _ => None,
        }
    }

    fn store(&mut self, key: Option<CacheKey>, entry: CacheEntry) {
        if let (Some(tt), Some(key)) = (self.tt.as_mut(), key) {
            tt.store(key, entry);
        }
    }
}

/// Minimax探索
///
/// `kind` がMaxなら視点の色、Minなら相手の合法手を順に展開し、
/// Maxは最大、Minは最小の評価値を持つ手を選ぶ。同点の場合は先に
/// 列挙された手を残す（厳密に改善したときだけ置き換える）。
///
/// 残り深さが0、または手番側に合法手がなければ `(None, 静的評価値)` を返す。
fn minimax(
    ctx: &mut SearchContext,
    board: &Board,
    kind: NodeKind,
    depth: Option<u32>,
) -> (Option<Move>, i32) {
    // ノード数をカウント
    ctx.stats.nodes += 1;

    let mover = kind.mover(ctx.perspective);
    if depth == Some(0) {
        return (None, ctx.cutoff_value(board, mover));
    }

    let moves = legal_moves(board, mover);
    if moves.is_empty() {
        return (None, compute_utility(board, ctx.perspective));
    }

    let key = ctx.cache_key(board, depth, mover);
    if let Some(entry) = ctx.probe(key.as_ref()) {
        ctx.stats.cache_hits += 1;
        return (entry.best_move, entry.value);
    }

    let child_depth = depth.map(|d| d - 1);
    let mut best_move = None;
    let mut best = kind.worst();

    for mv in moves {
        let child = apply_move(board, mover, mv);
        let (_, value) = minimax(ctx, &child, kind.next(), child_depth);

        let improves = match kind {
            NodeKind::Max => value > best,
            NodeKind::Min => value < best,
        };
        if improves {
            best = value;
            best_move = Some(mv);
        }
    }

    ctx.store(
        key,
        CacheEntry {
            best_move,
            value: best,
            bound: Bound::Exact,
        },
    );

    (best_move, best)
}

/// 1手先の石差で候補手を降順に並べる
///
/// 安定ソートなので同点の手は合法手の列挙順を保つ。
/// 返り値の各要素は (列挙順のインデックス, 手)。
fn order_moves(
    board: &Board,
    mover: Color,
    perspective: Color,
    moves: Vec<Move>,
) -> Vec<(usize, Move)> {
    let mut scored: Vec<(i32, usize, Move)> = moves
        .into_iter()
        .enumerate()
        .map(|(index, mv)| {
            let child = apply_move(board, mover, mv);
            (compute_utility(&child, perspective), index, mv)
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored
        .into_iter()
        .map(|(_, index, mv)| (index, mv))
        .collect()
}

/// Alpha-Beta枝刈り探索
///
/// Minimaxと同じノード構造に (alpha, beta) の窓を渡す。fail-soft実装で、
/// 窓の外でも子から得た最良値をそのまま返す。
///
/// - Minノード: 合法手の列挙順に展開し、`beta = min(beta, 最小値)` を更新
/// - Maxノード: オーダリング有効時は1手先の石差で並べ替えてから展開し、
///   `alpha = max(alpha, 最大値)` を更新
/// - いずれも `alpha >= beta` になった時点で残りの兄弟を枝刈り
///
/// 並べ替えても同点の最善手は列挙順で先の手になる。先行する手は
/// `alpha - 1` の窓で探索し、現在の最善値と等しいかを正確に判定する。
fn alpha_beta(
    ctx: &mut SearchContext,
    board: &Board,
    kind: NodeKind,
    depth: Option<u32>,
    mut alpha: i32,
    mut beta: i32,
) -> (Option<Move>, i32) {
    // ノード数をカウント
    ctx.stats.nodes += 1;

    let mover = kind.mover(ctx.perspective);
    if depth == Some(0) {
        return (None, ctx.cutoff_value(board, mover));
    }

    let moves = legal_moves(board, mover);
    if moves.is_empty() {
        return (None, compute_utility(board, ctx.perspective));
    }

    // 置換表をプローブ
    let key = ctx.cache_key(board, depth, mover);
    if let Some(entry) = ctx.probe(key.as_ref()) {
        let usable = match entry.bound {
            Bound::Exact => true,
            Bound::Lower => entry.value >= beta,
            Bound::Upper => entry.value <= alpha,
        };
        if usable {
            ctx.stats.cache_hits += 1;
            return (entry.best_move, entry.value);
        }
    }

    let alpha_orig = alpha;
    let beta_orig = beta;
    let child_depth = depth.map(|d| d - 1);

    let candidates = if kind == NodeKind::Max && ctx.ordering {
        order_moves(board, mover, ctx.perspective, moves)
    } else {
        moves.into_iter().enumerate().collect()
    };

    let mut best_move = None;
    let mut best_index = 0;
    let mut best = kind.worst();

    for (index, mv) in candidates {
        let child = apply_move(board, mover, mv);

        match kind {
            NodeKind::Max => {
                let precedes = best_move.is_some() && index < best_index;
                let child_alpha = if precedes {
                    alpha.saturating_sub(1)
                } else {
                    alpha
                };
                let (_, value) = alpha_beta(
                    ctx,
                    &child,
                    NodeKind::Min,
                    child_depth,
                    child_alpha,
                    beta,
                );

                if value > best || (precedes && value == best) {
                    best = value;
                    best_move = Some(mv);
                    best_index = index;
                }
                alpha = alpha.max(best);
            }
            NodeKind::Min => {
                let (_, value) =
                    alpha_beta(ctx, &child, NodeKind::Max, child_depth, alpha, beta);

                if value < best {
                    best = value;
                    best_move = Some(mv);
                    best_index = index;
                }
                beta = beta.min(best);
            }
        }

        // 枝刈り
        if alpha >= beta {
            break;
        }
    }

    let bound = if best <= alpha_orig {
        Bound::Upper
    } else if best >= beta_orig {
        Bound::Lower
    } else {
        Bound::Exact
    };
    ctx.store(
        key,
        CacheEntry {
            best_move,
            value: best,
            bound,
        },
    );

    (best_move, best)
}

/// 着手選択API
///
/// 設定に従ってMinimaxまたはAlpha-Betaを実行する。置換表は探索ごとに
/// 新しく作られ、探索が終わると破棄される。
///
/// # Examples
///
/// ```
/// use othello_agent::board::{Board, Color, Move};
/// use othello_agent::config::{DepthLimit, SearchConfig};
/// use othello_agent::search::Search;
///
/// let search = Search::new(SearchConfig::default().with_depth_limit(DepthLimit::Plies(1)));
/// let result = search.search(&Board::initial(8).unwrap(), Color::Dark);
/// assert_eq!(result.best_move, Some(Move::new(2, 3)));
/// assert_eq!(result.score, 3);
/// ```
#[derive(Debug, Clone)]
pub struct Search {
    config: SearchConfig,
}

impl Search {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// `color` を視点の色として探索し、選んだ手と統計を返す
    pub fn search(&self, board: &Board, color: Color) -> SearchResult {
        let start = Instant::now();
        let mut ctx = SearchContext::new(color, &self.config);
        let depth = self.config.depth_limit.remaining();

        let (best_move, score) = match self.config.algorithm {
            Algorithm::Minimax => minimax(&mut ctx, board, NodeKind::Max, depth),
            Algorithm::AlphaBeta => alpha_beta(
                &mut ctx,
                board,
                NodeKind::Max,
                depth,
                NEG_INFINITY,
                INFINITY,
            ),
        };

        let result = SearchResult::new(
            best_move,
            score,
            ctx.stats.nodes,
            ctx.stats.cache_hits,
            u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        );
        debug!("{} search for {}: {}", self.config.algorithm, color, result);
        result
    }
}

/// Minimaxで着手を選ぶ
///
/// 合法手がなければ `best_move` はNone。
pub fn select_move_minimax(
    board: &Board,
    color: Color,
    limit: DepthLimit,
    caching: bool,
) -> SearchResult {
    let config = SearchConfig::default()
        .with_algorithm(Algorithm::Minimax)
        .with_depth_limit(limit)
        .with_caching(caching);
    Search::new(config).search(board, color)
}

/// Alpha-Betaで着手を選ぶ
///
/// 結果の手と評価値は `select_move_minimax` と一致する。キャッシュと
/// オーダリングは訪問ノード数だけを変える。
pub fn select_move_alphabeta(
    board: &Board,
    color: Color,
    limit: DepthLimit,
    caching: bool,
    ordering: bool,
) -> SearchResult {
    let config = SearchConfig::default()
        .with_algorithm(Algorithm::AlphaBeta)
        .with_depth_limit(limit)
        .with_caching(caching)
        .with_ordering(ordering);
    Search::new(config).search(board, color)
}
