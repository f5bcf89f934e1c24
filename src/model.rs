use polars::prelude::*;
use rayon::prelude::*;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace};
use tvgrid::{
    ColumnSpec, ColumnView, RowView, SortDirection, SortState, Table, TableOptions, VisibilityToggle,
    numeric_compare,
};

use crate::domain::{HELP_TEXT, Message, TVConfig, TVError};
use crate::ui::{
    COLUMN_SPACER, COLUMN_WIDTH_MARGIN, MIN_COLUMN_WIDTH, STATUSLINE_HEIGHT, TABLE_HEADER_HEIGHT,
};

/// Width change of a single `+`/`-` key press, in terminal cells.
const RESIZE_STEP: f64 = 2.0;

#[derive(Debug)]
enum FileType {
    CSV,
    PARQUET,
    ARROW,
}

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug)]
pub struct FileInfo {
    path: PathBuf,
    file_size: u64,
    file_type: FileType,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    TABLE,
    POPUP,
    COLUMNS,
}

struct LoadedColumn {
    spec: ColumnSpec,
    data: Vec<String>,
}

/// Screen placement of a rendered column, relative to the table area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSlot {
    /// Index into `UIData::columns`.
    pub column: usize,
    pub x: u16,
    pub width: u16,
}

impl ColumnSlot {
    /// The spacer cell right of the column doubles as its resize handle.
    fn border(&self) -> u16 {
        self.x + self.width
    }

    fn contains(&self, x: u16) -> bool {
        x >= self.x && x < self.border()
    }
}

#[derive(Default, Clone, Debug)]
pub struct UILayout {
    pub width: usize,
    pub height: usize,
    pub table_width: usize,
    pub table_height: usize,
    pub statusline_width: usize,
    pub statusline_height: usize,
}

impl UILayout {
    pub fn from_values(ui_width: usize, ui_height: usize) -> Self {
        let layout = UILayout {
            width: ui_width,
            height: ui_height,
            table_width: ui_width,
            table_height: ui_height.saturating_sub(STATUSLINE_HEIGHT + TABLE_HEADER_HEIGHT),
            statusline_width: ui_width,
            statusline_height: STATUSLINE_HEIGHT,
        };
        trace!("Build UILayout: {:?}", layout);
        layout
    }
}

/// Everything the UI needs for one frame.
pub struct UIData {
    pub name: String,
    pub columns: Vec<ColumnView>,
    pub slots: Vec<ColumnSlot>,
    pub rows: Vec<RowView>,
    pub nrows: usize,
    pub selected_row: usize,
    pub selected_column: usize,
    pub abs_selected_row: usize,
    pub sort_keys: usize,
    pub show_popup: bool,
    pub popup_message: String,
    pub show_columns: bool,
    pub toggles: Vec<VisibilityToggle>,
    pub all_visible: bool,
    pub panel_selected: usize,
    pub layout: UILayout,
    pub status_message: String,
}

impl UIData {
    pub fn empty() -> Self {
        UIData {
            name: String::new(),
            columns: Vec::new(),
            slots: Vec::new(),
            rows: Vec::new(),
            nrows: 0,
            selected_row: 0,
            selected_column: 0,
            abs_selected_row: 0,
            sort_keys: 0,
            show_popup: false,
            popup_message: String::new(),
            show_columns: false,
            toggles: Vec::new(),
            all_visible: true,
            panel_selected: 0,
            layout: UILayout::default(),
            status_message: String::new(),
        }
    }
}

pub struct Model {
    pub status: Status,
    modus: Modus,
    table: Table,
    name: String,
    curser_row: usize,
    curser_column: usize,
    offset_row: usize,
    offset_column: usize,
    panel_curser: usize,
    slots: Vec<ColumnSlot>,
    uilayout: UILayout,
    uidata: UIData,
    status_message: String,
}

impl Model {
    pub fn load(config: &TVConfig, ui_width: usize, ui_height: usize) -> Result<Self, TVError> {
        let file_info = Model::get_file_info(config.path.clone())?;
        let frame = match file_info.file_type {
            FileType::CSV => Model::load_csv(&file_info.path)?,
            FileType::PARQUET => Model::load_parquet(&file_info.path)?,
            FileType::ARROW => Model::load_arrow(&file_info.path)?,
        };

        // Each column is converted to strings in its own rayon task.
        let start_time = Instant::now();
        let df = Arc::new(frame.collect()?);
        let max_column_width = config.max_column_width;
        let c_: Result<Vec<LoadedColumn>, _> = df
            .get_column_names()
            .par_iter()
            .enumerate()
            .map(|(idx, name)| Self::load_column(&df, idx, name, max_column_width))
            .collect();
        let columns = c_?;

        let data_loading_duration = start_time.elapsed().as_millis();
        info!(
            "Loading {} columns from {:?} ({} bytes) took {data_loading_duration}ms ...",
            columns.len(),
            file_info.path,
            file_info.file_size
        );
        for c in columns.iter() {
            debug!("Column: {:?}", c.spec);
        }

        let (specs, data): (Vec<_>, Vec<_>) = columns.into_iter().map(|c| (c.spec, c.data)).unzip();
        let options = TableOptions::default().click_mode(config.click_mode);
        let table = Table::from_columns(specs, data, config.initial_sort.clone(), options)?;

        let name = file_info
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("???")
            .to_string();

        let mut model = Self::with_table(table, name, ui_width, ui_height);
        model.set_status_message(format!("Loaded data in {}ms ...", data_loading_duration));
        Ok(model)
    }

    /// Wraps an already built table, with the cursor on the first cell.
    pub fn with_table(table: Table, name: String, ui_width: usize, ui_height: usize) -> Self {
        let mut model = Self {
            status: Status::READY,
            modus: Modus::TABLE,
            table,
            name,
            curser_row: 0,
            curser_column: 0,
            offset_row: 0,
            offset_column: 0,
            panel_curser: 0,
            slots: Vec::new(),
            uilayout: UILayout::from_values(ui_width, ui_height),
            uidata: UIData::empty(),
            status_message: String::new(),
        };
        model.update_table_data();
        model
    }

    fn load_column(
        df: &DataFrame,
        idx: usize,
        col_name: &str,
        max_column_width: usize,
    ) -> Result<LoadedColumn, PolarsError> {
        let original_dtype = df.column(col_name)?.dtype().clone();

        let col = df.column(col_name)?.cast(&DataType::String)?;
        let series = col.str()?;
        let mut data = Vec::with_capacity(series.len());

        let mut max_width = 0;
        for value in series.into_iter() {
            let ss = match value {
                Some(s) => s.replace("\r\n", " ↵ ").replace('\n', " ↵ "),
                None => String::from("∅"),
            };
            max_width = max_width.max(ss.chars().count());
            data.push(ss);
        }

        let id = if col_name.is_empty() {
            format!("column_{idx}")
        } else {
            col_name.to_string()
        };
        let content_width = id.chars().count().max(max_width) + COLUMN_WIDTH_MARGIN;
        let mut spec = ColumnSpec::new(id)
            .min_width(MIN_COLUMN_WIDTH as f64)
            .initial_width(content_width.min(max_column_width) as f64)
            .max_width(content_width.max(max_column_width).max(MIN_COLUMN_WIDTH) as f64);
        if Self::is_numeric_type(&original_dtype) {
            spec = spec.comparator(numeric_compare);
        }

        Ok(LoadedColumn { spec, data })
    }

    fn is_numeric_type(dtype: &DataType) -> bool {
        matches!(
            dtype,
            DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64
                | DataType::Float32
                | DataType::Float64
        )
    }

    fn detect_file_type(path: &Path) -> Result<FileType, TVError> {
        match path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_uppercase())
            .as_deref()
        {
            Some("CSV") => Ok(FileType::CSV),
            Some("PARQUET") | Some("PQ") => Ok(FileType::PARQUET),
            Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::ARROW),
            _ => Err(TVError::UnknownFileType),
        }
    }

    fn get_file_info(path: PathBuf) -> Result<FileInfo, TVError> {
        let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => TVError::FileNotFound,
            ErrorKind::PermissionDenied => TVError::PermissionDenied,
            _ => TVError::IoError(e),
        })?;
        if !metadata.is_file() {
            return Err(TVError::LoadingFailed("Not a file!".into()));
        }

        let file_size = metadata.len();
        let file_type = Model::detect_file_type(&path)?;

        Ok(FileInfo {
            path,
            file_size,
            file_type,
        })
    }

    fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
        LazyCsvReader::new(PlPath::Local(path.into()))
            .with_has_header(true)
            .finish()
    }

    fn load_parquet(path: &Path) -> Result<LazyFrame, PolarsError> {
        LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
    }

    fn load_arrow(path: &Path) -> Result<LazyFrame, PolarsError> {
        LazyFrame::scan_ipc(
            PlPath::Local(path.into()),
            polars::io::ipc::IpcScanOptions,
            UnifiedScanArgs::default(),
        )
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.uidata.status_message = self.status_message.clone();
    }

    fn selected_column_id(&self) -> Option<String> {
        self.table
            .render_model()
            .columns
            .get(self.curser_column)
            .map(|c| c.id.clone())
    }

    fn column_cells(width: f64) -> usize {
        width.round().max(0.0) as usize
    }

    /// Clamps the cursors, scrolls the selected column into view and lays out
    /// the columns that fit on screen.
    fn update_table_data(&mut self) {
        let render = self.table.render_model();
        let ncols = render.columns.len();
        let table_width = self.uilayout.table_width;

        if ncols == 0 {
            self.curser_column = 0;
            self.offset_column = 0;
        } else {
            self.curser_column = self.curser_column.min(ncols - 1);
            self.offset_column = self.offset_column.min(self.curser_column);
        }
        while self.offset_column < self.curser_column {
            let span: usize = render.columns[self.offset_column..=self.curser_column]
                .iter()
                .map(|c| Self::column_cells(c.width) + COLUMN_SPACER)
                .sum();
            if span <= table_width {
                break;
            }
            self.offset_column += 1;
        }

        // The last column may only be partially visible.
        self.slots.clear();
        let mut x = 0;
        for (idx, column) in render.columns.iter().enumerate().skip(self.offset_column) {
            if x >= table_width {
                break;
            }
            let width = Self::column_cells(column.width).min(table_width - x);
            self.slots.push(ColumnSlot {
                column: idx,
                x: x as u16,
                width: width as u16,
            });
            x += width + COLUMN_SPACER;
        }

        let nrows = render.rows.len();
        let height = self.uilayout.table_height.max(1);
        if nrows == 0 {
            self.curser_row = 0;
            self.offset_row = 0;
        } else if self.offset_row + self.curser_row >= nrows {
            self.select_row(nrows - 1);
        }
        let rbegin = self.offset_row.min(nrows);
        let rend = std::cmp::min(rbegin + height, nrows);

        trace!(
            "Table: Cr {}, Cc {}, Or {}, Oc {}, Rb {}, Re {}, slots {}",
            self.curser_row,
            self.curser_column,
            self.offset_row,
            self.offset_column,
            rbegin,
            rend,
            self.slots.len()
        );

        let render = self.table.render_model();
        self.uidata = UIData {
            name: self.name.clone(),
            columns: render.columns.clone(),
            slots: self.slots.clone(),
            rows: render.rows[rbegin..rend].to_vec(),
            nrows,
            selected_row: self.curser_row,
            selected_column: self.curser_column,
            abs_selected_row: self.offset_row + self.curser_row,
            sort_keys: render.sort_keys,
            show_popup: self.modus == Modus::POPUP,
            popup_message: HELP_TEXT.to_string(),
            show_columns: self.modus == Modus::COLUMNS,
            toggles: render.toggles.clone(),
            all_visible: render.all_visible,
            panel_selected: self.panel_curser,
            layout: self.uilayout.clone(),
            status_message: self.status_message.clone(),
        };
    }

    fn ui_resize(&mut self, width: usize, height: usize) {
        trace!(
            "UI was resized! w:{}->{}, h:{}->{}",
            self.uilayout.width, width, self.uilayout.height, height
        );
        self.uilayout = UILayout::from_values(width, height);
    }

    pub fn update(&mut self, message: Message) -> Result<(), TVError> {
        trace!("Update: Modus {:?}, Message {:?}", self.modus, message);
        match self.modus {
            Modus::TABLE => match message {
                Message::Quit => self.quit(),
                Message::MoveDown => self.move_table_selection_down(1),
                Message::MoveUp => self.move_table_selection_up(1),
                Message::MoveLeft => self.curser_column = self.curser_column.saturating_sub(1),
                Message::MoveRight => self.curser_column += 1,
                Message::MovePageUp => self.move_table_selection_up(self.uilayout.table_height),
                Message::MovePageDown => {
                    self.move_table_selection_down(self.uilayout.table_height)
                }
                Message::MoveBeginning => self.select_row(0),
                Message::MoveEnd => self.select_row(self.table.row_count().saturating_sub(1)),
                Message::ToggleSort => self.sort_selected_column(false),
                Message::ToggleSortMulti => self.sort_selected_column(true),
                Message::ToggleColumn => self.toggle_selected_column(),
                Message::ToggleAllColumns => self.toggle_all_columns(),
                Message::ColumnPanel => self.modus = Modus::COLUMNS,
                Message::Widen => self.nudge_selected_width(RESIZE_STEP),
                Message::Narrow => self.nudge_selected_width(-RESIZE_STEP),
                Message::ResetWidth => self.reset_selected_width(),
                Message::Help => self.modus = Modus::POPUP,
                Message::Resize(width, height) => self.ui_resize(width, height),
                Message::MouseDown { x, y, modified } => self.mouse_down(x, y, modified),
                Message::MouseDrag { x } => {
                    self.table.update_resize(x as f64);
                }
                Message::MouseUp => {
                    self.table.end_resize();
                }
                Message::Enter | Message::Exit => (),
            },
            Modus::COLUMNS => match message {
                Message::Quit => self.quit(),
                Message::MoveUp => self.panel_curser = self.panel_curser.saturating_sub(1),
                Message::MoveDown => {
                    let entries = self.table.render_model().toggles.len() + 1;
                    self.panel_curser = (self.panel_curser + 1).min(entries - 1);
                }
                Message::Enter | Message::ToggleColumn => self.toggle_panel_entry(),
                Message::ToggleAllColumns => self.toggle_all_columns(),
                Message::Exit | Message::ColumnPanel => self.modus = Modus::TABLE,
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
            Modus::POPUP => match message {
                Message::Quit => self.quit(),
                Message::Exit | Message::Help | Message::Enter => self.modus = Modus::TABLE,
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => (),
            },
        }

        self.update_table_data();
        Ok(())
    }

    // -------------------- Control handling functions ---------------------- //

    fn describe_sort(sort: &SortState) -> String {
        if sort.is_empty() {
            return "Unsorted".to_string();
        }
        let keys = sort
            .iter()
            .map(|e| {
                let arrow = match e.direction {
                    SortDirection::Ascending => "▲",
                    SortDirection::Descending => "▼",
                };
                format!("{}{}", e.column_id, arrow)
            })
            .collect::<Vec<String>>();
        format!("Sorted by {}", keys.join(", "))
    }

    fn sort_column(&mut self, id: &str, multi_key: bool) {
        let start_time = Instant::now();
        if self.table.toggle_sort(id, multi_key) {
            let message = format!(
                "{} ({}ms)",
                Self::describe_sort(self.table.sort_state()),
                start_time.elapsed().as_millis()
            );
            self.set_status_message(message);
        } else {
            self.set_status_message(format!("Column \"{id}\" is not sortable"));
        }
    }

    fn sort_selected_column(&mut self, multi_key: bool) {
        if let Some(id) = self.selected_column_id() {
            self.sort_column(&id, multi_key);
        }
    }

    fn toggle_selected_column(&mut self) {
        if let Some(id) = self.selected_column_id() {
            if self.table.toggle_column(&id) {
                self.set_status_message(format!("Hid column \"{id}\", press c to show it again"));
            } else {
                self.set_status_message(format!("Column \"{id}\" cannot be hidden"));
            }
        }
    }

    fn toggle_all_columns(&mut self) {
        self.table.toggle_all();
        let hidden = self.table.visibility_state().hidden_count();
        self.set_status_message(format!("{hidden} columns hidden"));
    }

    fn toggle_panel_entry(&mut self) {
        if self.panel_curser == 0 {
            self.toggle_all_columns();
            return;
        }
        let id = self
            .table
            .render_model()
            .toggles
            .get(self.panel_curser - 1)
            .map(|t| t.id.clone());
        if let Some(id) = id {
            self.table.toggle_column(&id);
        }
    }

    // A key press is a complete, one step resize session.
    fn nudge_selected_width(&mut self, delta: f64) {
        let Some(id) = self.selected_column_id() else {
            return;
        };
        if !self.table.begin_resize(&id, 0.0) {
            self.set_status_message(format!("Column \"{id}\" can not be resized"));
            return;
        }
        self.table.update_resize(delta);
        self.table.end_resize();
        if let Some(width) = self.table.resize_state().width(&id) {
            self.set_status_message(format!("Column \"{id}\" width {width}"));
        }
    }

    fn reset_selected_width(&mut self) {
        if let Some(id) = self.selected_column_id() {
            self.table.reset_width(&id);
            self.set_status_message(format!("Reset width of \"{id}\""));
        }
    }

    fn mouse_down(&mut self, x: u16, y: u16, modified: bool) {
        let header_row = 0;
        let body_end = TABLE_HEADER_HEIGHT + self.uilayout.table_height;

        if y as usize == header_row {
            if let Some(slot) = self.slots.iter().find(|s| s.border() == x).copied() {
                if let Some(id) = self.column_id_at(slot.column) {
                    self.table.begin_resize(&id, x as f64);
                }
            } else if let Some(slot) = self.slots.iter().find(|s| s.contains(x)).copied() {
                self.curser_column = slot.column;
                if let Some(id) = self.column_id_at(slot.column) {
                    self.sort_column(&id, modified);
                }
            }
        } else if (y as usize) < body_end {
            if let Some(slot) = self.slots.iter().find(|s| s.contains(x)).copied() {
                self.curser_column = slot.column;
            }
            let row = self.offset_row + y as usize - TABLE_HEADER_HEIGHT;
            if row < self.table.row_count() {
                self.select_row(row);
            }
        }
    }

    fn column_id_at(&self, column: usize) -> Option<String> {
        self.table
            .render_model()
            .columns
            .get(column)
            .map(|c| c.id.clone())
    }

    fn select_row(&mut self, row: usize) {
        let height = self.uilayout.table_height.max(1);
        if row < self.offset_row {
            self.offset_row = row;
        } else if row >= self.offset_row + height {
            self.offset_row = row + 1 - height;
        }
        self.curser_row = row - self.offset_row;
    }

    fn move_table_selection_up(&mut self, size: usize) {
        let row = (self.offset_row + self.curser_row).saturating_sub(size.max(1));
        self.select_row(row);
    }

    fn move_table_selection_down(&mut self, size: usize) {
        let nrows = self.table.row_count();
        if nrows == 0 {
            return;
        }
        let row = std::cmp::min(self.offset_row + self.curser_row + size.max(1), nrows - 1);
        self.select_row(row);
    }
}
