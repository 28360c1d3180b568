use crate::config::ViewConfig;
use crate::prelude::{eprintln, println, *};
use crate::render::{format_json, format_view_text, terminal_width, ViewOutput};
use crate::store::RowStore;
use admintable_core::filter::is_all;
use admintable_core::query::{parse_filter_arg, parse_sort_arg};
use admintable_core::{JsonRow, QueryState, TableController};
use colored::Colorize;
use log::{debug, warn};
use std::path::PathBuf;

#[derive(Debug, clap::Args, Clone)]
pub struct ListOptions {
    /// View name (see `admintable views`)
    #[arg(value_name = "VIEW")]
    pub view: String,

    /// JSON file with the rows to show
    #[arg(short, long, env = "ADMINTABLE_DATA")]
    pub data: PathBuf,

    /// Case-insensitive text to look for in any column
    #[arg(short, long)]
    pub search: Option<String>,

    /// Facet selection, repeatable (e.g. --filter status=published)
    #[arg(short, long = "filter", value_name = "KEY=VALUE", value_parser = parse_filter_arg)]
    pub filters: Vec<(String, String)>,

    /// Sort column with optional direction (e.g. --sort createdAt:desc)
    #[arg(long, value_name = "KEY[:asc|desc]")]
    pub sort: Option<String>,

    /// Page number (1-indexed, clamped to the available pages)
    #[arg(short, long, default_value = "1", allow_negative_numbers = true)]
    pub page: i64,

    /// Rows per page (defaults to the view's page size)
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(options: ListOptions, global: crate::Global) -> Result<()> {
    let config = crate::config::load(global.config.as_deref())?;
    let view = config.find(&options.view)?;

    if global.verbose {
        eprintln!(
            "Loading {} rows from {}",
            view.name,
            options.data.display()
        );
    }

    let rows = RowStore::new(&options.data, &view.id_field).load()?;
    let controller = open_view(view, rows, &options)?;

    if options.json {
        let output = ViewOutput::new(&view.name, &controller);
        println!("{}", format_json(&output)?);
    } else {
        let mut text = format_view_text(&view.name, &controller, terminal_width());
        text.push_str(&format_hints(&view.name, &options, &controller));
        print!("{}", text);
    }

    Ok(())
}

/// Build the controller for one `list` invocation
///
/// Selections the view does not declare are dropped with a warning.
fn open_view(
    view: &ViewConfig,
    rows: Vec<JsonRow>,
    options: &ListOptions,
) -> Result<TableController<JsonRow>> {
    let columns = view.column_registry()?;
    let filters = view.filter_registry()?;

    let mut state = view.initial_state()?;
    if let Some(search) = &options.search {
        state.search = search.clone();
    }
    if let Some(sort) = &options.sort {
        let (key, order) = parse_sort_arg(sort)?;
        state = state.with_sort(key, order);
    }
    if let Some(page_size) = options.page_size {
        state.page_size = page_size.max(1);
    }
    state
        .filters
        .extend(options.filters.iter().cloned());

    warn_dropped(&state, &state.clone().sanitized(&columns, &filters));

    let mut controller = TableController::with_state(rows, columns, filters, state);
    let snapshot = controller.set_page(options.page);

    debug!(
        "{}: {} of {} rows on page {}/{}",
        view.name,
        snapshot.visible_rows.len(),
        snapshot.total_items,
        snapshot.effective_page,
        snapshot.total_pages
    );

    Ok(controller)
}

fn warn_dropped(requested: &QueryState, kept: &QueryState) {
    if requested.sort_key != kept.sort_key {
        if let Some(key) = &requested.sort_key {
            warn!("Ignoring sort on '{key}': not a sortable column of this view");
        }
    }

    for (key, value) in dropped_filters(requested, kept) {
        warn!("Ignoring filter {key}={value}: not a declared option of this view");
    }
}

/// Requested filters that sanitizing removed, other than `all` selections
fn dropped_filters<'a>(
    requested: &'a QueryState,
    kept: &QueryState,
) -> Vec<(&'a str, &'a str)> {
    requested
        .filters
        .iter()
        .filter(|(key, value)| !is_all(value) && !kept.filters.contains_key(*key))
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect()
}

/// Shell command reproducing the current query, without the page
fn command_base(view: &str, options: &ListOptions, state: &QueryState) -> String {
    let mut parts = vec![
        "admintable".to_string(),
        "list".to_string(),
        quote(view),
        "--data".to_string(),
        quote(&options.data.to_string_lossy()),
    ];

    if !state.search.is_empty() {
        parts.push("--search".to_string());
        parts.push(quote(&state.search));
    }
    for (key, value) in &state.filters {
        parts.push("--filter".to_string());
        parts.push(quote(&f!("{key}={value}")));
    }
    if let Some(key) = &state.sort_key {
        parts.push("--sort".to_string());
        parts.push(quote(&f!("{key}:{}", state.sort_order)));
    }
    if options.page_size.is_some() {
        parts.push("--page-size".to_string());
        parts.push(state.page_size.to_string());
    }

    parts.join(" ")
}

fn quote(text: &str) -> String {
    shlex::try_quote(text)
        .map(|quoted| quoted.into_owned())
        .unwrap_or_else(|_| text.to_string())
}

fn format_hints(view: &str, options: &ListOptions, controller: &TableController<JsonRow>) -> String {
    let info = controller.pagination_info();
    let base = command_base(view, options, controller.state());
    let mut result = String::new();

    result.push_str(&f!("\n{}:\n", "To navigate".bright_white().bold()));
    if info.has_next {
        result.push_str(&f!(
            "  {}: {}\n",
            "Next page".green(),
            f!("{base} --page {}", info.current_page + 1).cyan()
        ));
    }
    if info.has_prev {
        result.push_str(&f!(
            "  {}: {}\n",
            "Previous page".green(),
            f!("{base} --page {}", info.current_page - 1).cyan()
        ));
    }
    if info.current_page == info.total_pages && info.total_pages > 2 {
        result.push_str(&f!(
            "  {}: {}\n",
            "First page".green(),
            f!("{base} --page 1").cyan()
        ));
    }

    result.push_str(&f!(
        "\n{}:\n",
        "To change page size".bright_white().bold()
    ));
    result.push_str(&f!("  {}\n", f!("{base} --page-size <number>").cyan()));

    result.push_str(&f!("\n{}:\n", "To browse interactively".bright_white().bold()));
    result.push_str(&f!(
        "  {}\n",
        f!(
            "admintable shell {} --data {}",
            quote(view),
            quote(&options.data.to_string_lossy())
        )
        .cyan()
    ));

    result.push_str(&f!("\n{}:\n", "To get JSON output".bright_white().bold()));
    result.push_str(&f!("  {}\n", f!("{base} --json").cyan()));

    result.push('\n');
    result
}
