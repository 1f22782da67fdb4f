use std::iter;

use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Style, Stylize},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Cell, Clear, Paragraph, Row, StatefulWidget, Table, Widget},
};

use crate::column::ColumnDef;
use crate::domain::LVConfig;
use crate::inputter::InputResult;
use crate::list_view::{ListView, SortDirection};
use crate::model::{Model, Modus};
use crate::pages::Router;
use crate::record::TableRow;

pub const NO_RESULTS: &str = "No results.";
const SKELETON: &str = "░";
const MARKER_WIDTH: u16 = 3;

#[derive(Debug)]
pub struct LVUI {
    max_column_width: usize,
}

impl LVUI {
    pub fn new(config: &LVConfig) -> Self {
        Self {
            max_column_width: config.max_column_width,
        }
    }

    pub fn draw(&self, model: &mut Model, frame: &mut Frame) {
        let [tabs_area, body_area, status_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Min(0), Constraint::Length(1)])
                .areas(frame.area());

        frame.render_widget(Self::tab_line(model), tabs_area);

        let title = Line::from(format!(" {} ", model.page().kind().title()).bold());
        let block = Block::bordered()
            .title(title.centered())
            .title_bottom(Line::from(" ? help ").right_aligned())
            .border_set(border::THICK);
        let list_area = block.inner(body_area);
        frame.render_widget(block, body_area);

        let search_input = model.cmdinput().cloned();
        render_list_view(
            model.list_mut(),
            list_area,
            frame.buffer_mut(),
            self.max_column_width,
            search_input.as_ref(),
        );

        frame.render_widget(Paragraph::new(Self::status_line(model)), status_area);

        match model.modus() {
            Modus::COLUMNS => render_column_menu(model.list(), popup_area(frame.area(), 40, 60), frame.buffer_mut()),
            Modus::POPUP => {
                let area = popup_area(frame.area(), 50, 80);
                frame.render_widget(Clear, area);
                frame.render_widget(
                    Paragraph::new(model.help_text()).block(Block::bordered().title(" Help ".bold())),
                    area,
                );
            }
            _ => (),
        }
    }

    fn tab_line(model: &Model) -> Line<'static> {
        let current = model.router().current_index();
        let spans: Vec<Span> = Router::all_pages()
            .iter()
            .enumerate()
            .map(|(idx, page)| {
                let label = format!(" {} {} ", idx + 1, page.title());
                if idx == current {
                    label.reversed().bold()
                } else {
                    label.into()
                }
            })
            .collect();
        Line::from(spans)
    }

    fn status_line(model: &Model) -> Line<'static> {
        let mut status = vec![Span::from(format!(" {} ", model.page().kind().path())).reversed()];
        let filters = model.page().query().filters.len();
        if filters > 0 {
            status.push(
                Span::from(format!(
                    " {filters} filter(s), {} of {} rows ",
                    model.page().matching(),
                    model.page().total()
                ))
                .bold()
                .yellow(),
            );
        }
        status.push(Span::from(format!(" {}", model.status_message())));
        Line::from(status)
    }
}

fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [area] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(area);
    area
}

/// Render a list view: toolbar, grid (or skeleton while loading) and pager.
pub fn render_list_view<R: TableRow>(
    list: &mut ListView<R>,
    area: Rect,
    buf: &mut Buffer,
    max_column_width: usize,
    search_input: Option<&InputResult>,
) {
    let [toolbar_area, grid_area, pager_area] =
        Layout::vertical([Constraint::Length(1), Constraint::Min(0), Constraint::Length(1)]).areas(area);

    toolbar_line(list, search_input).render(toolbar_area, buf);
    if list.is_loading() {
        render_skeleton(grid_area, buf);
    } else {
        render_grid(list, grid_area, buf, max_column_width);
    }
    pager_line(list).render(pager_area, buf);
}

fn toolbar_line<'a, R>(list: &ListView<R>, search_input: Option<&InputResult>) -> Line<'a> {
    let mut spans: Vec<Span> = Vec::new();

    if list.search().is_enabled() {
        spans.push(Span::from("/ ").bold());
        match search_input {
            Some(input) => {
                let (before, after): (String, String) = {
                    let chars: Vec<char> = input.input.chars().collect();
                    let at = input.cursor_pos.min(chars.len());
                    (chars[..at].iter().collect(), chars[at..].iter().collect())
                };
                spans.push(Span::from(before).underlined());
                spans.push(Span::from("▏").bold());
                spans.push(Span::from(after).underlined());
            }
            None if list.search_term().is_empty() => {
                spans.push(Span::from(list.search().placeholder(list.search_option())).dim());
            }
            None => spans.push(Span::from(list.search_term().to_string()).italic()),
        }
    }

    for (idx, filter) in list.custom_filters().iter().enumerate() {
        spans.push(Span::from(format!("  F{} ", idx + 1)).dim());
        let display = Span::from(filter.display());
        spans.push(if filter.selected().is_some() { display.bold() } else { display });
    }

    let selected = list.selection_count();
    if selected > 0 && !list.select_actions().is_empty() {
        spans.push(Span::from(format!("  | {selected} selected:")).bold());
        for action in list.select_actions() {
            spans.push(Span::from(format!(" {}", action.key)).bold().blue());
            spans.push(Span::from(format!(" {}", action.label)));
        }
    }
    Line::from(spans)
}

fn render_skeleton(area: Rect, buf: &mut Buffer) {
    let lines: Vec<Line> = (0..area.height as usize)
        .map(|idx| {
            let width = area.width as usize * (4 + idx % 3) / 6;
            Line::from(SKELETON.repeat(width)).dim()
        })
        .collect();
    Paragraph::new(lines).render(area, buf);
}

fn column_width<R: TableRow>(column: &ColumnDef<R>, rows: &[&R], max_column_width: usize) -> u16 {
    if let Some(width) = column.width() {
        return width;
    }
    let header = column.header().chars().count() + 2;
    let widest = rows
        .iter()
        .map(|r| column.value(r).chars().count())
        .max()
        .unwrap_or(0);
    header.max(widest).min(max_column_width.max(1)) as u16
}

fn header_label<R: TableRow>(column: &ColumnDef<R>, sorting: Option<SortDirection>) -> String {
    match sorting {
        Some(SortDirection::Ascending) => format!("{} ▲", column.header()),
        Some(SortDirection::Descending) => format!("{} ▼", column.header()),
        None => column.header().to_string(),
    }
}

fn render_grid<R: TableRow>(list: &mut ListView<R>, area: Rect, buf: &mut Buffer, max_column_width: usize) {
    let display = list.display_rows();
    let columns = list.visible_columns();

    let widths: Vec<Constraint> = iter::once(Constraint::Length(MARKER_WIDTH))
        .chain(columns.iter().map(|c| Constraint::Length(column_width(c, &display, max_column_width))))
        .collect();

    let header_cells = iter::once(Cell::from("")).chain(columns.iter().enumerate().map(|(idx, c)| {
        let sorting = list
            .sorting()
            .filter(|(id, _)| id == c.id())
            .map(|(_, direction)| *direction);
        let cell = Cell::from(header_label(c, sorting));
        if idx == list.cursor_column() {
            cell.style(Style::new().bold().underlined())
        } else {
            cell.style(Style::new().bold())
        }
    }));
    let header = Row::new(header_cells.collect::<Vec<_>>());

    let rows: Vec<Row> = display
        .iter()
        .map(|row| {
            let marker = if list.is_selected(row) { "[x]" } else { "[ ]" };
            let cells = iter::once(Cell::from(marker)).chain(columns.iter().map(|c| Cell::from(c.value(row))));
            Row::new(cells.collect::<Vec<_>>())
        })
        .collect();
    let empty = rows.is_empty();

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .row_highlight_style(Style::new().reversed());
    StatefulWidget::render(table, area, buf, list.table_state_mut());

    if empty && area.height > 1 {
        let body = Rect::new(area.x, area.y + 1, area.width, 1);
        Paragraph::new(NO_RESULTS).centered().dim().render(body, buf);
    }
}

fn pager_line<'a, R>(list: &ListView<R>) -> Line<'a> {
    let pagination = list.pagination();
    let mut line = Line::from(vec![
        Span::from(format!(
            " Page {} of {} ",
            pagination.page_index + 1,
            list.page_count().max(1)
        ))
        .bold(),
        Span::from(" rows per page:").dim(),
    ]);
    for size in list.page_sizes() {
        let span = Span::from(format!(" {size}"));
        line.push_span(if *size == pagination.page_size { span.bold().underlined() } else { span.dim() });
    }
    line.push_span(Span::from(format!("   {} selected", list.selection_count())));
    line
}

fn render_column_menu<R: TableRow>(list: &ListView<R>, area: Rect, buf: &mut Buffer) {
    Clear.render(area, buf);
    let lines: Vec<Line> = list
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let check = if !column.is_hideable() {
                "[*]"
            } else if list.is_column_visible(column.id()) {
                "[x]"
            } else {
                "[ ]"
            };
            let line = Line::from(format!(" {check} {}", column.header()));
            if idx == list.menu_cursor() { line.reversed() } else { line }
        })
        .collect();
    Paragraph::new(lines)
        .block(
            Block::bordered()
                .title(format!(" Columns of {} ", list.view()).bold())
                .title_bottom(" space toggles  V resets "),
        )
        .render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Message;
    use crate::list_view::tests::{Recorder, page, props};
    use crate::list_view::{ListMessage, Pagination};
    use crate::record::Record;
    use crate::toolbar::SelectAction;
    use crate::visibility::VisibilityStore;

    fn lines(buf: &Buffer) -> Vec<String> {
        buf.content
            .chunks(buf.area.width as usize)
            .map(|cells| cells.iter().map(|c| c.symbol()).collect::<String>())
            .collect()
    }

    fn draw(list: &mut ListView<Record>) -> Vec<String> {
        let area = Rect::new(0, 0, 60, 8);
        let mut buf = Buffer::empty(area);
        render_list_view(list, area, &mut buf, 20, None);
        lines(&buf)
    }

    fn count(lines: &[String], needle: &str) -> usize {
        lines.iter().map(|l| l.matches(needle).count()).sum()
    }

    #[test]
    fn status_line_counts_filtered_rows() {
        let config = LVConfig {
            data_dir: [env!("CARGO_MANIFEST_DIR"), "tests", "fixtures"].iter().collect(),
            initial_view: "/admin/modules".to_string(),
            ..LVConfig::default()
        };
        let mut model = Model::init(&config).unwrap();
        model.load_current_page();
        let text = |model: &Model| LVUI::status_line(model).to_string();
        assert!(!text(&model).contains("filter(s)"));

        model.update(Some(Message::CycleFilter(0))).unwrap();
        assert!(text(&model).contains("1 filter(s), 3 of 8 rows"));
    }

    #[test]
    fn empty_page_shows_one_no_results_line() {
        let store = VisibilityStore::new();
        let mut list = ListView::new(props("/admin/courses"), &store);
        list.bind(Vec::new(), Pagination::new(0, 10), 1, &store, &mut Recorder::default());
        let out = draw(&mut list);
        assert_eq!(count(&out, NO_RESULTS), 1);
        assert!(out[1].contains("Id"));
        assert!(out[7].contains("Page 1 of 1"));
    }

    #[test]
    fn search_without_hits_shows_no_results() {
        let mut store = VisibilityStore::new();
        let mut recorder = Recorder::default();
        let mut list = ListView::new(props("/admin/courses"), &store);
        list.bind(page(&[&["1", "Rust", "no"]]), Pagination::new(0, 10), 1, &store, &mut recorder);
        assert_eq!(count(&draw(&mut list), NO_RESULTS), 0);

        list.update(ListMessage::Search("haskell".into()), &mut store, &mut recorder);
        assert_eq!(count(&draw(&mut list), NO_RESULTS), 1);
    }

    #[test]
    fn loading_renders_skeleton() {
        let store = VisibilityStore::new();
        let mut list = ListView::new(props("/admin/courses"), &store);
        list.set_loading(true);
        let out = draw(&mut list);
        assert_eq!(count(&out, NO_RESULTS), 0);
        assert!(out[1].contains(SKELETON));
        assert!(!out[1].contains("Title"));
    }

    #[test]
    fn rows_markers_and_sort_arrow() {
        let mut store = VisibilityStore::new();
        let mut recorder = Recorder::default();
        let mut list = ListView::new(props("/admin/courses"), &store);
        list.bind(
            page(&[&["1", "Rust", "no"], &["2", "Go", "no"]]),
            Pagination::new(1, 2),
            3,
            &store,
            &mut recorder,
        );
        list.update(ListMessage::ToggleRow, &mut store, &mut recorder);
        list.update(ListMessage::Sort(SortDirection::Ascending), &mut store, &mut recorder);

        let out = draw(&mut list);
        assert!(out[1].contains("Id ▲"));
        assert!(!out[1].contains("Late"));
        assert!(out[2].contains("[x]") && out[2].contains("Rust"));
        assert!(out[3].contains("[ ]") && out[3].contains("Go"));
        assert!(out[7].contains("Page 2 of 3"));
        assert!(out[7].contains("1 selected"));
    }

    #[test]
    fn toolbar_shows_actions_only_with_selection() {
        let mut store = VisibilityStore::new();
        let mut recorder = Recorder::default();
        let props = props("/admin/courses").with_select_actions(vec![SelectAction::new('c', "Copy")]);
        let mut list = ListView::new(props, &store);
        list.bind(page(&[&["1", "Rust", "no"]]), Pagination::new(0, 10), 1, &store, &mut recorder);
        assert!(!draw(&mut list)[0].contains("Copy"));

        list.update(ListMessage::ToggleRow, &mut store, &mut recorder);
        let out = draw(&mut list);
        assert!(out[0].contains("1 selected"));
        assert!(out[0].contains("Copy"));
    }

    #[test]
    fn toolbar_shows_search_input_while_editing() {
        let store = VisibilityStore::new();
        let mut list = ListView::new(props("/admin/courses"), &store);
        let area = Rect::new(0, 0, 60, 8);
        let mut buf = Buffer::empty(area);
        let input = InputResult {
            input: "ru".into(),
            cursor_pos: 2,
            ..InputResult::default()
        };
        render_list_view(&mut list, area, &mut buf, 20, Some(&input));
        assert!(lines(&buf)[0].starts_with("/ ru▏"));
    }
}
