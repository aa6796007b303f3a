//! othello-agent - オセロ探索エージェント
//!
//! 深さ制限付きMinimax / Alpha-Beta探索で着手を選び、
//! ゲームマネージャとは行単位のプロトコルで通信する。

pub mod board;
pub mod config;
pub mod evaluator;
pub mod protocol;
pub mod search;

pub use board::{Board, Color, Move};
pub use config::{AgentConfig, Algorithm, DepthLimit, SearchConfig};
pub use search::{Search, SearchResult, select_move_alphabeta, select_move_minimax};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_opposite() {
        // 白の反対は黒
        assert_eq!(Color::Light.opposite(), Color::Dark);
        // 黒の反対は白
        assert_eq!(Color::Dark.opposite(), Color::Light);
    }

    #[test]
    fn test_board_traits() {
        // Clone, Debug, PartialEq, Eq, Hashトレイトが実装されていること
        let board1 = Board::default();
        let board2 = board1.clone();
        assert_eq!(board1, board2);

        let mut set = std::collections::HashSet::new();
        set.insert(board1.clone());
        assert!(set.contains(&board2));

        let debug_str = format!("{:?}", board1);
        assert!(!debug_str.is_empty());
    }

    #[test]
    fn test_search_config_is_copy() {
        let config = SearchConfig::default();
        let copied = config;
        assert_eq!(config, copied);
    }
}
