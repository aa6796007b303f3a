//! Line protocol spoken with the game manager.
//!
//! ```text
//! agent   -> Othello AI
//! manager -> 1,4,0,1,1              (color,limit,minimax,caching,ordering)
//! manager -> SCORE 2 2
//! manager -> ((0,0,...),(...),...)  (board as a list of rows)
//! agent   -> 2 3                    (column row)
//! ...
//! manager -> FINAL 33 31
//! ```
//!
//! stdout belongs to the protocol; diagnostics go through `log`.

use std::io::{BufRead, Write};

use log::{debug, info, warn};
use thiserror::Error;

use crate::board::{BoardError, decode_board};
use crate::config::{AgentConfig, ConfigError};
use crate::search::Search;

/// Name line sent before anything else.
pub const AGENT_NAME: &str = "Othello AI";

/// Protocol errors.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Reading from or writing to the manager failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration line was rejected.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A board snapshot was rejected.
    #[error("invalid board: {0}")]
    Board(#[from] BoardError),

    /// Input ended before the FINAL status.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// A status line is neither `SCORE d l` nor `FINAL d l`.
    #[error("malformed status line: '{0}'")]
    MalformedStatus(String),
}

/// Status line sent by the manager at the start of every turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// The game continues and a board snapshot follows.
    Score { dark: u32, light: u32 },
    /// The game is over.
    Final { dark: u32, light: u32 },
}

/// Parse `SCORE <dark> <light>` or `FINAL <dark> <light>`.
pub fn parse_status(line: &str) -> Result<Status, ProtocolError> {
    let malformed = || ProtocolError::MalformedStatus(line.trim().to_string());

    let mut parts = line.split_whitespace();
    let (Some(tag), Some(dark), Some(light), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(malformed());
    };

    let dark = dark.parse::<u32>().map_err(|_| malformed())?;
    let light = light.parse::<u32>().map_err(|_| malformed())?;

    match tag {
        "SCORE" => Ok(Status::Score { dark, light }),
        "FINAL" => Ok(Status::Final { dark, light }),
        _ => Err(malformed()),
    }
}

/// Read one line, failing with `UnexpectedEof` at end of input.
fn read_line<R: BufRead>(reader: &mut R) -> Result<String, ProtocolError> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(ProtocolError::UnexpectedEof);
    }
    Ok(line)
}

/// Play one game against the manager.
///
/// Returns the final `(dark, light)` scores.
pub fn run_agent<R, W>(mut reader: R, mut writer: W) -> Result<(u32, u32), ProtocolError>
where
    R: BufRead,
    W: Write,
{
    writeln!(writer, "{}", AGENT_NAME)?;
    writer.flush()?;

    let config: AgentConfig = read_line(&mut reader)?.parse()?;
    config.log_summary();
    let search = Search::new(config.search);

    loop {
        match parse_status(&read_line(&mut reader)?)? {
            Status::Final { dark, light } => {
                info!("Game over: dark {} - light {}", dark, light);
                return Ok((dark, light));
            }
            Status::Score { dark, light } => {
                let board = decode_board(&read_line(&mut reader)?)?;
                debug!("Score dark {} - light {}\n{}", dark, light, board);

                let result = search.search(&board, config.color);
                match result.best_move {
                    Some(mv) => {
                        writeln!(writer, "{} {}", mv.column, mv.row)?;
                        writer.flush()?;
                    }
                    None => warn!("No legal move for {}", config.color),
                }
            }
        }
    }
}
