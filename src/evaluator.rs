//! 盤面評価モジュール
//!
//! 視点の色から見た確定的な石差（utility）と、合法手数の差による
//! 安価な代替評価（heuristic）を提供する。

use crate::board::{Board, Color, has_legal_move, legal_moves, score};

/// 深さ制限で打ち切った非終局ノードに適用する静的評価
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CutoffEval {
    /// 石差（既定）
    #[default]
    Utility,
    /// 合法手数の差
    Heuristic,
}

/// 盤面のutilityを計算
///
/// `perspective` の石数から相手の石数を引いた値を返す。
///
/// # Examples
///
/// ```
/// use othello_agent::board::{Board, Color};
/// use othello_agent::evaluator::compute_utility;
///
/// let board = Board::initial(8).unwrap();
/// assert_eq!(compute_utility(&board, Color::Dark), 0);
/// ```
pub fn compute_utility(board: &Board, perspective: Color) -> i32 {
    let (dark, light) = score(board);
    let diff = dark as i32 - light as i32;
    match perspective {
        Color::Dark => diff,
        Color::Light => -diff,
    }
}

/// 盤面のheuristicを計算
///
/// `perspective` の合法手数から相手の合法手数を引いた値を返す。
/// 選択肢の多い側が有利であるという考えに基づく。
pub fn compute_heuristic(board: &Board, perspective: Color) -> i32 {
    let own = legal_moves(board, perspective).len() as i32;
    let opponent = legal_moves(board, perspective.opposite()).len() as i32;
    own - opponent
}

/// 深さ制限での静的評価
///
/// `mover` は打ち切ったノードの手番の色。手番側に合法手がない局面は
/// `cutoff` によらず石差で評価する。
pub fn evaluate_cutoff(
    board: &Board,
    perspective: Color,
    mover: Color,
    cutoff: CutoffEval,
) -> i32 {
    match cutoff {
        CutoffEval::Heuristic if has_legal_move(board, mover) => {
            compute_heuristic(board, perspective)
        }
        CutoffEval::Utility | CutoffEval::Heuristic => compute_utility(board, perspective),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Move, apply_move};

    #[test]
    fn test_utility_initial_board_is_zero() {
        let board = Board::initial(8).unwrap();
        assert_eq!(compute_utility(&board, Color::Dark), 0);
        assert_eq!(compute_utility(&board, Color::Light), 0);
    }

    #[test]
    fn test_utility_after_move() {
        // 黒が1枚返すと 4 - 1 = 3
        let board = Board::initial(8).unwrap();
        let next = apply_move(&board, Color::Dark, Move::new(2, 3));
        assert_eq!(compute_utility(&next, Color::Dark), 3);
        assert_eq!(compute_utility(&next, Color::Light), -3);
    }

    #[test]
    fn test_heuristic_counts_mobility() {
        let board = Board::initial(8).unwrap();
        assert_eq!(compute_heuristic(&board, Color::Dark), 0, "初期盤面は4手対4手");

        // 黒しかいない盤面では白は打てず、黒も挟む相手がいない
        let board: Board = "((1,1,0),(1,1,0),(0,0,0))".parse().unwrap();
        assert_eq!(compute_heuristic(&board, Color::Dark), 0);

        let board: Board = "((1,2,0),(0,0,0),(0,0,0))".parse().unwrap();
        assert_eq!(compute_heuristic(&board, Color::Dark), 1, "黒だけが(2, 0)に打てる");
        assert_eq!(compute_heuristic(&board, Color::Light), -1);
    }

    #[test]
    fn test_evaluate_cutoff_dispatch() {
        let board: Board = "((1,2,0),(0,0,0),(0,0,0))".parse().unwrap();
        assert_eq!(
            evaluate_cutoff(&board, Color::Dark, Color::Dark, CutoffEval::Utility),
            compute_utility(&board, Color::Dark)
        );
        assert_eq!(
            evaluate_cutoff(&board, Color::Dark, Color::Dark, CutoffEval::Heuristic),
            compute_heuristic(&board, Color::Dark)
        );
        assert_eq!(CutoffEval::default(), CutoffEval::Utility);
    }

    #[test]
    fn test_heuristic_cutoff_falls_back_to_utility_without_moves() {
        // 黒は打てないが白は(2, 0)に打てる
        let board: Board = "((2,1,0),(0,0,0),(0,0,0))".parse().unwrap();
        assert!(!has_legal_move(&board, Color::Dark));
        assert!(has_legal_move(&board, Color::Light));
        assert_eq!(compute_heuristic(&board, Color::Dark), -1);

        assert_eq!(
            evaluate_cutoff(&board, Color::Dark, Color::Dark, CutoffEval::Heuristic),
            compute_utility(&board, Color::Dark),
            "手番側に合法手がなければ石差"
        );
        assert_eq!(
            evaluate_cutoff(&board, Color::Dark, Color::Light, CutoffEval::Heuristic),
            -1,
            "白の手番なら合法手数の差"
        );
    }
}
