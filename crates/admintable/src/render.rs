//! Terminal rendering of view snapshots

use crate::prelude::*;
use admintable_core::pagination::page_links;
use admintable_core::{
    ColumnRegistry, JsonRow, PageLink, PaginationInfo, SortOrder, TableController, ViewSnapshot,
};
use colored::Colorize;
use prettytable::{Cell, Row};
use serde::Serialize;

/// Width assumed when stdout is not a terminal
pub const DEFAULT_WIDTH: usize = 120;

const MIN_CELL_WIDTH: usize = 8;
const PAGE_LINK_WINDOW: usize = 2;

/// JSON document printed by `--json`
#[derive(Debug, Serialize)]
pub struct ViewOutput<'a> {
    pub view: &'a str,
    #[serde(flatten)]
    pub snapshot: &'a ViewSnapshot<JsonRow>,
    pub pagination: PaginationInfo,
    pub page_links: Vec<PageLink>,
}

impl<'a> ViewOutput<'a> {
    pub fn new(view: &'a str, controller: &'a TableController<JsonRow>) -> Self {
        let pagination = controller.pagination_info();
        let page_links = page_links(
            pagination.current_page,
            pagination.total_pages,
            PAGE_LINK_WINDOW,
        );

        Self {
            view,
            snapshot: controller.snapshot(),
            pagination,
            page_links,
        }
    }
}

pub fn format_json(output: &ViewOutput<'_>) -> Result<String> {
    serde_json::to_string_pretty(output).map_err(|e| eyre!("JSON serialization failed: {}", e))
}

pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(terminal_size::Width(width), _)| usize::from(width))
        .unwrap_or(DEFAULT_WIDTH)
}

/// Characters available to each cell when `columns` share `width`
pub fn cell_width(width: usize, columns: usize) -> usize {
    let columns = columns.max(1);
    (width.saturating_sub(columns * 3 + 1) / columns).max(MIN_CELL_WIDTH)
}

/// Collapse whitespace and cut `text` to at most `max_chars` characters
pub fn truncate(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if flat.chars().count() <= max_chars {
        return flat;
    }

    let mut cut: String = flat.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Render the visible rows as a table, marking the active sort column
pub fn format_table(
    columns: &ColumnRegistry<JsonRow>,
    rows: &[JsonRow],
    sort: Option<(&str, SortOrder)>,
    width: usize,
) -> String {
    let mut table = new_table();
    let max_chars = cell_width(width, columns.len());

    let titles = columns
        .iter()
        .map(|column| {
            let marker = match sort {
                Some((key, SortOrder::Asc)) if key == column.key() => " ▲",
                Some((key, SortOrder::Desc)) if key == column.key() => " ▼",
                _ => "",
            };
            Cell::new(&f!("{}{}", column.label(), marker)).style_spec("b")
        })
        .collect();
    table.set_titles(Row::new(titles));

    for row in rows {
        let cells = columns
            .iter()
            .map(|column| Cell::new(&truncate(&column.project(row), max_chars)))
            .collect();
        table.add_row(Row::new(cells));
    }

    table.to_string()
}

pub fn format_page_links(links: &[PageLink], current: usize) -> String {
    links
        .iter()
        .map(|link| match link {
            PageLink::Page(page) if *page == current => {
                f!("[{page}]").bright_cyan().bold().to_string()
            }
            PageLink::Page(page) => page.to_string(),
            PageLink::Ellipsis => "…".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render the full view: header, active query, rows and pagination summary
///
/// Callers append their own navigation hints.
pub fn format_view_text(view: &str, controller: &TableController<JsonRow>, width: usize) -> String {
    let snapshot = controller.snapshot();
    let info = controller.pagination_info();
    let rule = "=".repeat(width.min(80));
    let mut result = String::new();

    result.push_str(&f!("\n{}\n", rule.bright_cyan()));
    result.push_str(&f!(
        "{}\n",
        f!(
            "{} (Page {} of {})",
            view.to_uppercase(),
            info.current_page,
            info.total_pages
        )
        .bright_cyan()
        .bold()
    ));
    result.push_str(&f!("{}\n", rule.bright_cyan()));

    result.push_str(&format_active_query(controller));

    if snapshot.is_empty() {
        result.push_str(&f!(
            "\n{}\n",
            "No rows match the current search and filters.".yellow()
        ));
    } else {
        let sort = snapshot
            .sort_key
            .as_deref()
            .map(|key| (key, snapshot.sort_order));
        result.push('\n');
        result.push_str(&format_table(
            controller.columns(),
            &snapshot.visible_rows,
            sort,
            width,
        ));
    }

    result.push_str(&f!("\n{}\n", rule.bright_yellow()));
    result.push_str(&f!("{}\n", "NAVIGATION".bright_yellow().bold()));
    result.push_str(&f!("{}\n", rule.bright_yellow()));

    result.push_str(&f!("\n{}\n", format_showing(&info)));
    result.push_str(&f!(
        "{}: {}\n",
        "Pages".green(),
        format_page_links(
            &page_links(info.current_page, info.total_pages, PAGE_LINK_WINDOW),
            info.current_page
        )
    ));

    result
}

fn format_showing(info: &PaginationInfo) -> String {
    if info.total_items == 0 {
        return "No rows to show".bright_white().to_string();
    }

    f!(
        "{} {} {} {} {} {} {}",
        "Showing".bright_white(),
        info.first_item.to_string().bright_cyan().bold(),
        "to".bright_white(),
        info.last_item.to_string().bright_cyan().bold(),
        "of".bright_white(),
        info.total_items.to_string().bright_cyan().bold(),
        "rows".bright_white()
    )
}

fn format_active_query(controller: &TableController<JsonRow>) -> String {
    let snapshot = controller.snapshot();
    let mut result = String::new();

    if !snapshot.search.is_empty() {
        result.push_str(&f!(
            "{}: \"{}\"\n",
            "Search".green(),
            snapshot.search.bright_white()
        ));
    }

    for (key, value) in &snapshot.filters {
        let descriptor = controller.filters().get(key);
        let label = descriptor.map_or(key.as_str(), |d| d.label.as_str());
        let option = descriptor
            .and_then(|d| d.option(value))
            .map_or(value.as_str(), |o| o.label.as_str());
        result.push_str(&f!(
            "{}: {} = {}\n",
            "Filter".green(),
            label,
            option.bright_white()
        ));
    }

    if let Some(key) = &snapshot.sort_key {
        let label = controller
            .columns()
            .get(key)
            .map_or(key.as_str(), |column| column.label());
        result.push_str(&f!(
            "{}: {} ({})\n",
            "Sort".green(),
            label,
            snapshot.sort_order
        ));
    }

    result
}
