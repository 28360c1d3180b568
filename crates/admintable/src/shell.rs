//! Interactive browsing session for one view
//!
//! Reads commands from stdin and, optionally, polls the data file for
//! changes. Both sources feed the same controller one event at a time.

use crate::config::ViewConfig;
use crate::prelude::{eprintln, println, *};
use crate::render::{format_view_text, terminal_width};
use crate::store::RowStore;
use admintable_core::{JsonRow, TableController};
use colored::Colorize;
use log::{debug, info, warn};
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

const HELP: &str = "\
Commands:
  search [text]         Search every column (no text clears the search)
  filter <key> [value]  Select a facet value (`all` or no value clears it)
  sort <key>            Sort by a column; repeat to toggle asc/desc
  page <n>              Go to page n
  next | prev           Move one page forward or back
  size <n>              Rows per page
  reset                 Clear search and filters
  delete <id>           Delete a row from the data file
  reload                Reload rows from the data file
  show                  Print the current page again
  state                 Print the query state as JSON
  help                  Show this help
  quit                  Leave the shell";

#[derive(Debug, clap::Args, Clone)]
pub struct ShellOptions {
    /// View name (see `admintable views`)
    #[arg(value_name = "VIEW")]
    pub view: String,

    /// JSON file with the rows to browse
    #[arg(short, long, env = "ADMINTABLE_DATA")]
    pub data: PathBuf,

    /// Check the data file for changes every N seconds (0 disables polling)
    #[arg(long, env = "ADMINTABLE_REFRESH_SECS", default_value = "0")]
    pub refresh_secs: u64,
}

/// One parsed shell command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),
    Filter { key: String, value: String },
    Sort(String),
    Page(i64),
    Next,
    Prev,
    Size(usize),
    Reset,
    Delete(String),
    Reload,
    Show,
    State,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line; blank lines yield `None`
    pub fn parse(line: &str) -> Result<Option<Self>, Error> {
        let words = shlex::split(line)
            .ok_or_else(|| Error::Generic(f!("Unbalanced quotes in: {line}")))?;

        let Some((name, args)) = words.split_first() else {
            return Ok(None);
        };

        let command = match (name.to_lowercase().as_str(), args) {
            ("search" | "s", args) => Command::Search(args.join(" ")),
            ("filter" | "f", [key]) => Command::Filter {
                key: key.clone(),
                value: admintable_core::FILTER_ALL.to_string(),
            },
            ("filter" | "f", [key, value @ ..]) => Command::Filter {
                key: key.clone(),
                value: value.join(" "),
            },
            ("sort", [key]) => Command::Sort(key.clone()),
            ("page" | "p", [page]) => Command::Page(
                page.parse()
                    .map_err(|_| Error::Generic(f!("Invalid page number: {page}")))?,
            ),
            ("next" | "n", []) => Command::Next,
            ("prev" | "previous", []) => Command::Prev,
            ("size", [size]) => Command::Size(
                size.parse()
                    .map_err(|_| Error::Generic(f!("Invalid page size: {size}")))?,
            ),
            ("reset", []) => Command::Reset,
            ("delete" | "rm", [id]) => Command::Delete(id.clone()),
            ("reload", []) => Command::Reload,
            ("show" | "ls", []) => Command::Show,
            ("state", []) => Command::State,
            ("help" | "?", []) => Command::Help,
            ("quit" | "exit" | "q", []) => Command::Quit,
            (name, _) => {
                return Err(Error::Generic(f!(
                    "Unknown or malformed command '{name}'. Type `help` for the list."
                )))
            }
        };

        Ok(Some(command))
    }
}

/// What the loop should do after a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Render,
    Message(String),
    Quit,
}

/// A view opened over a data file
pub struct Session {
    name: String,
    store: RowStore,
    controller: TableController<JsonRow>,
    last_modified: Option<SystemTime>,
}

impl Session {
    pub fn open(view: &ViewConfig, data: impl Into<PathBuf>) -> Result<Self> {
        let store = RowStore::new(data, &view.id_field);
        let rows = store.load()?;
        let last_modified = store.modified().ok();

        let controller = TableController::with_state(
            rows,
            view.column_registry()?,
            view.filter_registry()?,
            view.initial_state()?,
        );

        Ok(Self {
            name: view.name.clone(),
            store,
            controller,
            last_modified,
        })
    }

    #[cfg(test)]
    pub fn controller(&self) -> &TableController<JsonRow> {
        &self.controller
    }

    pub fn render(&self, width: usize) -> String {
        format_view_text(&self.name, &self.controller, width)
    }

    pub fn execute(&mut self, command: Command) -> Result<Outcome> {
        debug!("{}: {:?}", self.name, command);

        match command {
            Command::Search(text) => {
                self.controller.set_search(text);
            }
            Command::Filter { key, value } => {
                let before = self.controller.state().clone();
                self.controller.set_filter(&key, &value);
                if *self.controller.state() == before && !self.filter_is_current(&key, &value) {
                    warn!("Ignoring filter {key}={value}: not a declared option of this view");
                    return Ok(Outcome::Message(self.filter_help(&key)));
                }
            }
            Command::Sort(key) => {
                if !self.controller.columns().is_sortable(&key) {
                    warn!("Ignoring sort on '{key}': not a sortable column of this view");
                    return Ok(Outcome::Message(self.sort_help()));
                }
                self.controller.set_sort(&key);
            }
            Command::Page(page) => {
                self.controller.set_page(page);
            }
            Command::Next => {
                let page = self.current_page();
                self.controller.set_page(page.saturating_add(1));
            }
            Command::Prev => {
                let page = self.current_page();
                self.controller.set_page(page.saturating_sub(1));
            }
            Command::Size(size) => {
                self.controller.set_page_size(size);
            }
            Command::Reset => {
                self.controller.reset();
            }
            Command::Delete(id) => {
                let rows = self.store.delete(&id)?;
                self.last_modified = self.store.modified().ok();
                self.controller.replace_rows(rows);
            }
            Command::Reload => {
                self.reload()?;
            }
            Command::Show => {}
            Command::State => {
                return Ok(Outcome::Message(serde_json::to_string_pretty(
                    self.controller.state(),
                )?));
            }
            Command::Help => return Ok(Outcome::Message(HELP.to_string())),
            Command::Quit => return Ok(Outcome::Quit),
        }

        Ok(Outcome::Render)
    }

    /// Reload rows when the data file changed since the last load
    pub fn refresh(&mut self) -> Result<bool> {
        let modified = self.store.modified()?;
        if self.last_modified == Some(modified) {
            return Ok(false);
        }

        self.reload()?;
        Ok(true)
    }

    fn reload(&mut self) -> Result<()> {
        let rows = self.store.load()?;
        self.last_modified = self.store.modified().ok();

        info!(
            "Reloaded {} rows from {}",
            rows.len(),
            self.store.path().display()
        );
        self.controller.replace_rows(rows);
        Ok(())
    }

    fn current_page(&self) -> i64 {
        i64::try_from(self.controller.snapshot().effective_page).unwrap_or(i64::MAX)
    }

    fn filter_is_current(&self, key: &str, value: &str) -> bool {
        match self.controller.state().filters.get(key) {
            Some(current) => current == value,
            None => admintable_core::filter::is_all(value),
        }
    }

    fn filter_help(&self, key: &str) -> String {
        match self.controller.filters().get(key) {
            Some(descriptor) => f!(
                "Valid values for '{}': all, {}",
                key,
                descriptor
                    .options
                    .iter()
                    .map(|option| option.value.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            None => f!(
                "Unknown filter '{}'. Filters: {}",
                key,
                self.controller
                    .filters()
                    .iter()
                    .map(|descriptor| descriptor.key.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    fn sort_help(&self) -> String {
        f!(
            "Sortable columns: {}",
            self.controller
                .columns()
                .iter()
                .filter(|column| column.is_sortable())
                .map(|column| column.key())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

pub async fn run(options: ShellOptions, global: crate::Global) -> Result<()> {
    let config = crate::config::load(global.config.as_deref())?;
    let view = config.find(&options.view)?;
    let mut session = Session::open(view, &options.data)?;

    if global.verbose {
        eprintln!(
            "Browsing {} from {} (refresh: {})",
            view.name,
            options.data.display(),
            match options.refresh_secs {
                0 => "off".to_string(),
                secs => f!("every {secs}s"),
            }
        );
    }

    print!("{}", session.render(terminal_width()));
    println!("{}", "Type `help` for commands.".bright_black());
    prompt(&view.name)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut interval = tokio::time::interval(Duration::from_secs(options.refresh_secs.max(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    println!();
                    break;
                };

                let outcome = match Command::parse(&line) {
                    Ok(Some(command)) => session.execute(command),
                    Ok(None) => Ok(Outcome::Message(String::new())),
                    Err(err) => Err(err.into()),
                };

                match outcome {
                    Ok(Outcome::Quit) => break,
                    Ok(Outcome::Render) => print!("{}", session.render(terminal_width())),
                    Ok(Outcome::Message(message)) if message.is_empty() => {}
                    Ok(Outcome::Message(message)) => println!("{message}"),
                    Err(err) => eprintln!("{} {err}", "error:".red().bold()),
                }
                prompt(&view.name)?;
            }
            _ = interval.tick(), if options.refresh_secs > 0 => {
                match session.refresh() {
                    Ok(true) => {
                        println!("\n{}", "Data file changed, rows reloaded.".yellow());
                        print!("{}", session.render(terminal_width()));
                        prompt(&view.name)?;
                    }
                    Ok(false) => {}
                    Err(err) => warn!("Refresh failed: {err}"),
                }
            }
        }
    }

    Ok(())
}

fn prompt(view: &str) -> Result<()> {
    print!("{} ", f!("{view}>").green().bold());
    std::io::stdout().flush().context("Failed to flush stdout")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewsConfig;
    use serde_json::json;

    fn pages_view() -> ViewConfig {
        ViewsConfig::builtin()
            .unwrap()
            .find("pages")
            .unwrap()
            .clone()
    }

    fn write_rows(dir: &tempfile::TempDir, count: usize) -> PathBuf {
        let rows: Vec<_> = (1..=count)
            .map(|id| {
                json!({
                    "id": id,
                    "title": format!("Page {id:02}"),
                    "slug": format!("page-{id}"),
                    "status": if id % 2 == 0 { "draft" } else { "published" },
                    "updatedAt": "2024-05-01T10:00:00Z",
                })
            })
            .collect();
        let path = dir.path().join("pages.json");
        std::fs::write(&path, serde_json::to_string(&rows).unwrap()).unwrap();
        path
    }

    fn session(count: usize) -> (tempfile::TempDir, Session) {
        let dir = tempfile::tempdir().unwrap();
        let path = write_rows(&dir, count);
        let session = Session::open(&pages_view(), path).unwrap();
        (dir, session)
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("").unwrap(), None);
        assert_eq!(Command::parse("   ").unwrap(), None);
        assert_eq!(
            Command::parse("search hello world").unwrap(),
            Some(Command::Search("hello world".to_string()))
        );
        assert_eq!(
            Command::parse("search").unwrap(),
            Some(Command::Search(String::new()))
        );
        assert_eq!(
            Command::parse("filter status 'in review'").unwrap(),
            Some(Command::Filter {
                key: "status".to_string(),
                value: "in review".to_string()
            })
        );
        assert_eq!(
            Command::parse("filter status").unwrap(),
            Some(Command::Filter {
                key: "status".to_string(),
                value: "all".to_string()
            })
        );
        assert_eq!(Command::parse("PAGE -3").unwrap(), Some(Command::Page(-3)));
        assert_eq!(Command::parse("size 25").unwrap(), Some(Command::Size(25)));
        assert_eq!(
            Command::parse("delete 42").unwrap(),
            Some(Command::Delete("42".to_string()))
        );
        assert_eq!(Command::parse("q").unwrap(), Some(Command::Quit));
    }

    #[test]
    fn test_parse_rejects_malformed_commands() {
        assert!(Command::parse("page two").is_err());
        assert!(Command::parse("size -1").is_err());
        assert!(Command::parse("sort").is_err());
        assert!(Command::parse("dance").is_err());
        assert!(Command::parse("search 'unbalanced").is_err());
    }

    #[test]
    fn test_open_uses_view_defaults() {
        let (_dir, session) = session(12);
        let snapshot = session.controller().snapshot();

        assert_eq!(snapshot.sort_key.as_deref(), Some("title"));
        assert_eq!(snapshot.total_pages, 2);
        assert_eq!(snapshot.visible_rows[0]["title"], "Page 01");
    }

    #[test]
    fn test_navigation_commands() {
        let (_dir, mut session) = session(25);

        session.execute(Command::Next).unwrap();
        session.execute(Command::Next).unwrap();
        session.execute(Command::Next).unwrap();
        assert_eq!(session.controller().snapshot().effective_page, 3);

        session.execute(Command::Prev).unwrap();
        assert_eq!(session.controller().snapshot().effective_page, 2);

        session.execute(Command::Page(1)).unwrap();
        session.execute(Command::Prev).unwrap();
        assert_eq!(session.controller().snapshot().effective_page, 1);

        session.execute(Command::Size(5)).unwrap();
        assert_eq!(session.controller().snapshot().total_pages, 5);
    }

    #[test]
    fn test_query_commands() {
        let (_dir, mut session) = session(25);

        let outcome = session
            .execute(Command::Filter {
                key: "status".to_string(),
                value: "draft".to_string(),
            })
            .unwrap();
        assert_eq!(outcome, Outcome::Render);
        assert_eq!(session.controller().snapshot().total_items, 12);

        session.execute(Command::Search("page 1".to_string())).unwrap();
        // Drafts among "Page 1x": 10, 12, 14, 16, 18
        assert_eq!(session.controller().snapshot().total_items, 5);

        session.execute(Command::Sort("title".to_string())).unwrap();
        let snapshot = session.controller().snapshot();
        assert_eq!(snapshot.visible_rows[0]["title"], "Page 18");

        session.execute(Command::Reset).unwrap();
        assert_eq!(session.controller().snapshot().total_items, 25);
    }

    #[test]
    fn test_invalid_filter_and_sort_report_help() {
        let (_dir, mut session) = session(3);

        let outcome = session
            .execute(Command::Filter {
                key: "status".to_string(),
                value: "deleted".to_string(),
            })
            .unwrap();
        assert!(matches!(outcome, Outcome::Message(message) if message.contains("draft, published")));

        let outcome = session
            .execute(Command::Filter {
                key: "color".to_string(),
                value: "red".to_string(),
            })
            .unwrap();
        assert!(matches!(outcome, Outcome::Message(message) if message.contains("Unknown filter")));

        let outcome = session.execute(Command::Sort("missing".to_string())).unwrap();
        assert!(matches!(outcome, Outcome::Message(message) if message.contains("Sortable columns")));
    }

    #[test]
    fn test_reselecting_current_filter_is_not_an_error() {
        let (_dir, mut session) = session(3);
        let filter = Command::Filter {
            key: "status".to_string(),
            value: "draft".to_string(),
        };

        session.execute(filter.clone()).unwrap();
        assert_eq!(session.execute(filter).unwrap(), Outcome::Render);
    }

    #[test]
    fn test_delete_clamps_page() {
        let (_dir, mut session) = session(21);
        session.execute(Command::Page(3)).unwrap();
        assert_eq!(session.controller().snapshot().visible_rows.len(), 1);

        // Row 21 is the only row on page 3.
        session.execute(Command::Delete("21".to_string())).unwrap();

        let snapshot = session.controller().snapshot();
        assert_eq!(snapshot.total_items, 20);
        assert_eq!(snapshot.effective_page, 2);
        assert_eq!(snapshot.visible_rows.len(), 10);
        assert_eq!(session.controller().rows().len(), 20);
    }

    #[test]
    fn test_delete_unknown_row() {
        let (_dir, mut session) = session(3);

        assert!(session.execute(Command::Delete("99".to_string())).is_err());
        assert_eq!(session.controller().rows().len(), 3);
    }

    #[test]
    fn test_refresh_detects_external_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_rows(&dir, 5);
        let mut session = Session::open(&pages_view(), &path).unwrap();

        assert!(!session.refresh().unwrap());

        write_rows(&dir, 8);
        // Force a distinct timestamp even on filesystems with coarse mtimes.
        let later = SystemTime::now() + Duration::from_secs(5);
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(later)
            .unwrap();

        assert!(session.refresh().unwrap());
        assert_eq!(session.controller().snapshot().total_items, 8);
        assert!(!session.refresh().unwrap());
    }

    #[test]
    fn test_state_and_help_messages() {
        let (_dir, mut session) = session(3);

        let Outcome::Message(state) = session.execute(Command::State).unwrap() else {
            panic!("state should print a message");
        };
        assert!(state.contains("\"sort_key\": \"title\""));

        assert!(matches!(
            session.execute(Command::Help).unwrap(),
            Outcome::Message(message) if message.contains("Commands:")
        ));
        assert_eq!(session.execute(Command::Quit).unwrap(), Outcome::Quit);
    }

    #[test]
    fn test_render_includes_rows() {
        let (_dir, session) = session(3);

        let text = session.render(100);
        assert!(text.contains("PAGES (Page 1 of 1)"));
        assert!(text.contains("Page 01"));
    }
}
