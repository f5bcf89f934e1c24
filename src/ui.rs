use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Block, Clear, Paragraph, Widget},
};
use tvgrid::ColumnView;

use crate::domain::TVConfig;
use crate::model::{Model, UIData};

pub const TABLE_HEADER_HEIGHT: usize = 1;
pub const STATUSLINE_HEIGHT: usize = 1;
pub const COLUMN_SPACER: usize = 1;
pub const COLUMN_WIDTH_MARGIN: usize = 1;
pub const MIN_COLUMN_WIDTH: usize = 3;

const COLUMN_PANEL_WIDTH: u16 = 32;

#[derive(Debug)]
pub struct TableUI {
    max_column_width: usize,
}

struct GridView<'a> {
    data: &'a UIData,
}

struct ColumnPanel<'a> {
    data: &'a UIData,
}

impl TableUI {
    pub fn new(config: &TVConfig) -> Self {
        Self {
            max_column_width: config.max_column_width,
        }
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let data = model.get_uidata();
        let [table_area, status_area] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(STATUSLINE_HEIGHT as u16),
        ])
        .areas(frame.area());

        frame.render_widget(GridView { data }, table_area);
        frame.render_widget(self.statusline(data), status_area);

        if data.show_columns {
            let height = (data.toggles.len() as u16 + 3).min(table_area.height);
            let width = COLUMN_PANEL_WIDTH.min(table_area.width);
            let area = Rect {
                x: table_area.right().saturating_sub(width),
                y: table_area.y,
                width,
                height,
            };
            frame.render_widget(Clear, area);
            frame.render_widget(ColumnPanel { data }, area);
        }

        if data.show_popup {
            let area = centered(table_area, 60, 28);
            let block = Block::bordered()
                .title(Line::from(" Help ".bold()).centered())
                .border_set(border::THICK);
            frame.render_widget(Clear, area);
            frame.render_widget(Paragraph::new(data.popup_message.as_str()).block(block), area);
        }
    }

    fn statusline<'a>(&self, data: &'a UIData) -> Paragraph<'a> {
        let hint = data
            .columns
            .get(data.selected_column)
            .and_then(|c| c.next_sort)
            .map(|h| format!(" s: {} ", h.describe()))
            .unwrap_or_default();
        let position = format!(
            " {}/{} ",
            (data.abs_selected_row + 1).min(data.nrows),
            data.nrows
        );
        let line = Line::from(vec![
            Span::from(format!(" {} ", data.name)).black().on_yellow(),
            Span::from(position).black().on_gray(),
            Span::from(hint).blue(),
            Span::from(format!(" {}", data.status_message)),
            Span::from(format!("  max width {}", self.max_column_width)).dark_gray(),
        ]);
        Paragraph::new(line)
    }
}

/// Shortens `name` to `width` cells, marking the cut with "...".
fn get_visible_name(name: &str, width: usize) -> String {
    if width < 3 {
        return name.chars().take(width).collect();
    }
    if name.chars().count() > width {
        let mut reduced: String = name.chars().take(width - 3).collect();
        reduced.push_str("...");
        reduced
    } else {
        name.to_string()
    }
}

fn header_label(column: &ColumnView, sort_keys: usize) -> String {
    let mut label = column.label.clone();
    let indicator = column.sort.symbol();
    if !indicator.is_empty() {
        label.push(' ');
        label.push_str(indicator);
        if sort_keys > 1
            && let Some(priority) = column.sort_priority
        {
            label.push_str(&(priority + 1).to_string());
        }
    }
    label
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

impl Widget for GridView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let data = self.data;
        let header_style = Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED);

        for slot in data.slots.iter() {
            let column = &data.columns[slot.column];
            let x = area.x + slot.x;
            let width = slot.width as usize;

            let mut style = header_style;
            if slot.column == data.selected_column {
                style = style.add_modifier(Modifier::REVERSED);
            }
            let label = get_visible_name(&header_label(column, data.sort_keys), width);
            buf.set_stringn(x, area.y, format!("{label:<width$}"), width, style);

            let border_x = x + slot.width;
            if border_x < area.right() {
                let border_style = if column.is_resizing {
                    Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::DarkGray)
                };
                buf.set_string(border_x, area.y, "│", border_style);
            }
        }

        for (ridx, row) in data.rows.iter().enumerate() {
            let y = area.y + (TABLE_HEADER_HEIGHT + ridx) as u16;
            if y >= area.bottom() {
                break;
            }
            for slot in data.slots.iter() {
                let cell = row.cells.get(slot.column).map(String::as_str).unwrap_or("");
                let mut style = Style::default();
                if ridx == data.selected_row {
                    style = style.bg(Color::DarkGray);
                    if slot.column == data.selected_column {
                        style = style.add_modifier(Modifier::REVERSED);
                    }
                }
                let width = slot.width as usize;
                let text = get_visible_name(cell, width);
                buf.set_stringn(area.x + slot.x, y, format!("{text:<width$}"), width, style);
            }
        }
    }
}

impl Widget for ColumnPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let data = self.data;
        let checkbox = |checked: bool| if checked { "[x]" } else { "[ ]" };

        let mut lines = vec![Line::from(format!("{} Toggle All", checkbox(data.all_visible)))];
        lines.extend(
            data.toggles
                .iter()
                .map(|t| Line::from(format!("{} {}", checkbox(t.visible), t.label))),
        );
        if let Some(line) = lines.get_mut(data.panel_selected) {
            *line = line.clone().reversed();
        }

        let block = Block::bordered()
            .title(Line::from(" Columns ".bold()).centered())
            .title_bottom(Line::from(vec![" Toggle ".into(), "<Enter> ".blue().bold()]).centered())
            .border_set(border::THICK);
        Paragraph::new(Text::from(lines)).block(block).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_name_is_shortened() {
        assert_eq!(get_visible_name("description", 8), "descr...");
        assert_eq!(get_visible_name("name", 8), "name");
        assert_eq!(get_visible_name("name", 2), "na");
    }
}
