use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};

use dtv::model::{Model, UIData};

pub const CHECKBOX_WIDTH: u16 = 3;
pub const TABLE_HEADER_HEIGHT: u16 = 1;
pub const POPUP_WIDTH: u16 = 64;

fn checkbox(checked: bool) -> &'static str {
    if checked { "[x]" } else { "[ ]" }
}

#[derive(Debug, Default)]
pub struct TableUI {
    table_state: TableState,
}

impl TableUI {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let ui = model.get_uidata();

        let areas = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(TABLE_HEADER_HEIGHT + 1),
            Constraint::Length(if ui.pagination.is_some() { 1 } else { 0 }),
            Constraint::Length(if ui.searchable { 1 } else { 0 }),
            Constraint::Length(1),
        ])
        .split(frame.area());

        self.draw_title(ui, frame, areas[0]);
        self.draw_table(ui, frame, areas[1]);
        if let Some(pagination) = &ui.pagination {
            let arrow = |enabled: bool, symbol: &'static str| {
                if enabled {
                    Span::from(symbol).bold()
                } else {
                    Span::from(symbol).dark_gray()
                }
            };
            let footer = Line::from(vec![
                format!("Rows per page: {}   ", pagination.page_size).into(),
                format!("{}   ", pagination.range_label).into(),
                arrow(pagination.can_go_previous, "‹ "),
                format!("{}/{}", pagination.page, pagination.page_count.max(1)).into(),
                arrow(pagination.can_go_next, " ›"),
            ]);
            frame.render_widget(Paragraph::new(footer).right_aligned(), areas[2]);
        }
        if ui.searchable {
            self.draw_search(ui, frame, areas[3]);
        }
        frame.render_widget(
            Paragraph::new(ui.status_message.as_str()).dark_gray(),
            areas[4],
        );

        if ui.show_popup {
            self.draw_popup(ui, frame);
        }
    }

    fn draw_title(&self, ui: &UIData, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::from(format!(" {} ", ui.name)).bold()];
        if let Some(summary) = &ui.selection_summary {
            spans.push(Span::from(format!(" {summary}")).yellow());
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_table(&mut self, ui: &UIData, frame: &mut Frame, area: Rect) {
        if ui.is_loading {
            frame.render_widget(Paragraph::new("Loading...").centered().italic(), area);
            return;
        }

        let mut widths = Vec::with_capacity(ui.column_widths.len() + 2);
        if ui.selectable {
            widths.push(Constraint::Length(CHECKBOX_WIDTH));
        }
        widths.push(Constraint::Length(ui.index_width as u16));
        widths.extend(ui.column_widths.iter().map(|&w| Constraint::Length(w as u16)));
        let leading_columns = if ui.selectable { 2 } else { 1 };

        let rows: Vec<Row> = ui
            .rows
            .iter()
            .map(|row| {
                let mut cells = Vec::with_capacity(row.cells.len() + leading_columns);
                if ui.selectable {
                    cells.push(Cell::from(checkbox(row.checked)));
                }
                cells.push(Cell::from(row.display_index.to_string()).dark_gray());
                cells.extend(row.cells.iter().map(|c| Cell::from(c.replace('\n', " ↵ "))));
                Row::new(cells)
            })
            .collect();
        let is_empty = rows.is_empty();

        let mut table = Table::new(rows, widths)
            .column_spacing(1)
            .row_highlight_style(Style::new().bg(Color::Blue))
            .cell_highlight_style(Style::new().add_modifier(Modifier::REVERSED));

        if let Some(header) = &ui.header {
            let mut cells = Vec::with_capacity(header.len() + leading_columns);
            if ui.selectable {
                let select_all = if ui.show_select_all {
                    checkbox(ui.all_selected)
                } else {
                    ""
                };
                cells.push(Cell::from(select_all));
            }
            cells.push(Cell::from("#"));
            cells.extend(header.iter().map(|h| {
                let label = match h.sort {
                    Some(direction) => format!("{} {}", h.name, direction.icon()),
                    None => h.name.clone(),
                };
                Cell::from(label)
            }));
            table = table.header(Row::new(cells).bold().underlined());
        }

        if is_empty {
            self.table_state.select(None);
        } else {
            self.table_state.select(Some(ui.cursor_row));
            self.table_state
                .select_column(Some(ui.cursor_column + leading_columns));
        }
        frame.render_stateful_widget(table, area, &mut self.table_state);

        if is_empty {
            let offset = if ui.header.is_some() { TABLE_HEADER_HEIGHT } else { 0 };
            let body = Rect {
                y: area.y + offset.min(area.height),
                height: area.height.saturating_sub(offset),
                ..area
            };
            frame.render_widget(Paragraph::new("No matching rows").centered().dark_gray(), body);
        }
    }

    fn draw_search(&self, ui: &UIData, frame: &mut Frame, area: Rect) {
        let prompt = "/ ";
        let mut spans = vec![Span::from(prompt).bold(), Span::from(ui.search.input.as_str())];
        if ui.search_pending {
            spans.push(Span::from(" …").dark_gray());
        }
        let style = if ui.active_search {
            Style::new().fg(Color::Yellow)
        } else {
            Style::new()
        };
        frame.render_widget(Paragraph::new(Line::from(spans)).style(style), area);

        if ui.active_search {
            let x = area.x + (prompt.len() + ui.search.cursor_pos) as u16;
            frame.set_cursor_position((x.min(area.right().saturating_sub(1)), area.y));
        }
    }

    fn draw_popup(&self, ui: &UIData, frame: &mut Frame) {
        let area = frame.area();
        let lines = ui.popup_message.lines().count() as u16 + 2;
        let width = POPUP_WIDTH.min(area.width);
        let height = lines.min(area.height);
        let popup = Rect {
            x: area.x + (area.width - width) / 2,
            y: area.y + (area.height - height) / 2,
            width,
            height,
        };
        let block = Block::default()
            .title(Line::from(" Help ").centered())
            .borders(Borders::ALL);
        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(ui.popup_message.as_str())
                .block(block)
                .wrap(Wrap { trim: false }),
            popup,
        );
    }
}
