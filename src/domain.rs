use std::io::Error;
use std::path::PathBuf;

use polars::error::PolarsError;
use thiserror::Error;
use tvgrid::{ConfigError, SortClickMode, SortEntry};

pub const HELP_TEXT: &str = "\
Navigation
  ←/→, h/l     select column
  ↑/↓, j/k     move row
  PgUp/PgDn    page up/down
  g/G          first/last row

Sorting
  s            sort selected column (asc, desc, off)
  S            add selected column to the sort
  click        sort by header, shift/ctrl click adds it

Columns
  x            hide/show selected column
  a            toggle all columns
  c            column panel
  +/-          widen/narrow selected column
  r            reset selected column width
  drag border  resize column

  ?            help
  Esc          close popup
  q            quit";

#[derive(Debug, Error)]
pub enum TVError {
    #[error("io error: {0}")]
    IoError(#[from] Error),
    #[error("polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("invalid table configuration: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("loading failed: {0}")]
    LoadingFailed(String),
    #[error("invalid sort argument \"{0}\", expected COLUMN[:asc|:desc]")]
    InvalidSortArgument(String),
    #[error("could not set up logging: {0}")]
    LoggingSetup(String),
    #[error("file not found")]
    FileNotFound,
    #[error("permission denied")]
    PermissionDenied,
    #[error("unknown file type")]
    UnknownFileType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    MovePageUp,
    MovePageDown,
    MoveBeginning,
    MoveEnd,
    ToggleSort,
    ToggleSortMulti,
    ToggleColumn,
    ToggleAllColumns,
    ColumnPanel,
    Widen,
    Narrow,
    ResetWidth,
    Help,
    Enter,
    Exit,
    Resize(usize, usize),
    MouseDown { x: u16, y: u16, modified: bool },
    MouseDrag { x: u16 },
    MouseUp,
}

#[derive(Debug, Clone)]
pub struct TVConfig {
    pub path: PathBuf,
    pub event_poll_time: u64,
    pub max_column_width: usize,
    pub click_mode: SortClickMode,
    pub initial_sort: Vec<SortEntry>,
}

/// Parses `COLUMN[:asc|:desc]`, ascending when no direction is given.
pub fn parse_sort_arg(arg: &str) -> Result<SortEntry, TVError> {
    let (column, direction) = match arg.rsplit_once(':') {
        Some((column, direction)) => (column, Some(direction.to_ascii_lowercase())),
        None => (arg, None),
    };
    if column.is_empty() {
        return Err(TVError::InvalidSortArgument(arg.to_string()));
    }
    match direction.as_deref() {
        None | Some("asc") => Ok(SortEntry::asc(column)),
        Some("desc") => Ok(SortEntry::desc(column)),
        Some(_) => Err(TVError::InvalidSortArgument(arg.to_string())),
    }
}
