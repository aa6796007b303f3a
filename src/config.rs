//! Search and agent configuration.
//!
//! The game manager sends one configuration line at startup:
//! `color,limit,minimax,caching,ordering`, all integers. `limit` is the
//! depth limit in plies with `-1` meaning unlimited; the remaining fields
//! are 0/1 flags. Inside the crate the `-1` sentinel is replaced by
//! [`DepthLimit::Unlimited`].

use std::fmt;
use std::str::FromStr;

use log::{info, warn};
use thiserror::Error;

use crate::board::Color;
use crate::evaluator::CutoffEval;

/// Configuration parse errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The line does not have exactly five comma-separated fields.
    #[error("expected 5 comma-separated fields, found {0}")]
    FieldCount(usize),

    /// A field is not an integer.
    #[error("field '{field}' is not an integer: '{value}'")]
    NotInteger { field: &'static str, value: String },

    /// Color other than 1 (dark) or 2 (light).
    #[error("invalid color {0} (expected 1 for dark or 2 for light)")]
    InvalidColor(i64),

    /// Depth limit below -1.
    #[error("invalid depth limit {0} (expected -1 or a non-negative ply count)")]
    InvalidDepthLimit(i64),

    /// Flag other than 0 or 1.
    #[error("flag '{field}' must be 0 or 1, found {value}")]
    InvalidFlag { field: &'static str, value: i64 },
}

/// Search algorithm.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Algorithm {
    Minimax,
    #[default]
    AlphaBeta,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Minimax => write!(f, "MINIMAX"),
            Algorithm::AlphaBeta => write!(f, "ALPHA-BETA"),
        }
    }
}

/// Depth limit of a search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DepthLimit {
    /// Search until no legal moves remain.
    #[default]
    Unlimited,
    /// Stop after this many plies and evaluate statically.
    Plies(u32),
}

impl DepthLimit {
    /// Protocol value: `-1` is unlimited, anything else a ply count.
    pub fn from_protocol(value: i64) -> Result<Self, ConfigError> {
        match value {
            -1 => Ok(DepthLimit::Unlimited),
            v if v >= 0 => u32::try_from(v)
                .map(DepthLimit::Plies)
                .map_err(|_| ConfigError::InvalidDepthLimit(v)),
            v => Err(ConfigError::InvalidDepthLimit(v)),
        }
    }

    /// Remaining depth passed to the root node (`None` = unlimited).
    #[inline]
    pub fn remaining(self) -> Option<u32> {
        match self {
            DepthLimit::Unlimited => None,
            DepthLimit::Plies(n) => Some(n),
        }
    }
}

impl fmt::Display for DepthLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepthLimit::Unlimited => write!(f, "OFF"),
            DepthLimit::Plies(n) => write!(f, "{}", n),
        }
    }
}

/// Search configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchConfig {
    /// Minimax or alpha-beta (default: alpha-beta).
    pub algorithm: Algorithm,
    /// Depth limit (default: unlimited).
    pub depth_limit: DepthLimit,
    /// Memoize evaluated positions for the duration of one search (default: off).
    pub caching: bool,
    /// Order alpha-beta candidates by one-ply utility (default: off).
    /// Has no effect on minimax.
    pub ordering: bool,
    /// Static evaluation at a depth cutoff (default: utility).
    pub cutoff: CutoffEval,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::AlphaBeta,
            depth_limit: DepthLimit::Unlimited,
            caching: false,
            ordering: false,
            cutoff: CutoffEval::Utility,
        }
    }
}

impl SearchConfig {
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_depth_limit(mut self, depth_limit: DepthLimit) -> Self {
        self.depth_limit = depth_limit;
        self
    }

    pub fn with_caching(mut self, caching: bool) -> Self {
        self.caching = caching;
        self
    }

    pub fn with_ordering(mut self, ordering: bool) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn with_cutoff(mut self, cutoff: CutoffEval) -> Self {
        self.cutoff = cutoff;
        self
    }
}

/// Agent configuration received from the game manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AgentConfig {
    /// The color this agent plays, and the perspective of every search.
    pub color: Color,
    pub search: SearchConfig,
}

impl AgentConfig {
    /// Write the configuration to the log, one setting per line.
    pub fn log_summary(&self) {
        let on_off = |flag: bool| if flag { "ON" } else { "OFF" };

        info!("Playing {}", self.color);
        info!("Running {}", self.search.algorithm);
        info!("State Caching is {}", on_off(self.search.caching));
        info!("Node Ordering is {}", on_off(self.search.ordering));
        info!("Depth Limit is {}", self.search.depth_limit);

        if self.search.algorithm == Algorithm::Minimax && self.search.ordering {
            warn!("Node Ordering should have no impact on Minimax");
        }
    }
}

fn parse_field(field: &'static str, value: &str) -> Result<i64, ConfigError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| ConfigError::NotInteger {
            field,
            value: value.trim().to_string(),
        })
}

fn parse_flag(field: &'static str, value: &str) -> Result<bool, ConfigError> {
    match parse_field(field, value)? {
        0 => Ok(false),
        1 => Ok(true),
        value => Err(ConfigError::InvalidFlag { field, value }),
    }
}

impl FromStr for AgentConfig {
    type Err = ConfigError;

    /// Parse `color,limit,minimax,caching,ordering`.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.trim().split(',').collect();
        let [color, limit, minimax, caching, ordering] = fields.as_slice() else {
            return Err(ConfigError::FieldCount(fields.len()));
        };

        let color = parse_field("color", color)?;
        let color = Color::from_protocol(color).ok_or(ConfigError::InvalidColor(color))?;
        let depth_limit = DepthLimit::from_protocol(parse_field("limit", limit)?)?;
        let algorithm = if parse_flag("minimax", minimax)? {
            Algorithm::Minimax
        } else {
            Algorithm::AlphaBeta
        };

        let search = SearchConfig::default()
            .with_algorithm(algorithm)
            .with_depth_limit(depth_limit)
            .with_caching(parse_flag("caching", caching)?)
            .with_ordering(parse_flag("ordering", ordering)?);

        Ok(Self { color, search })
    }
}
