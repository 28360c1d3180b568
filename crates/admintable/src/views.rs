use crate::config::ViewsConfig;
use crate::prelude::{eprintln, println, *};
use colored::Colorize;

#[derive(Debug, clap::Args, Clone)]
pub struct ViewsOptions {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(options: ViewsOptions, global: crate::Global) -> Result<()> {
    if global.verbose {
        match crate::config::config_path(global.config.as_deref()) {
            Some(path) => eprintln!("Views file: {}", path.display()),
            None => eprintln!("Views file: (built-in views)"),
        }
    }

    let config = crate::config::load(global.config.as_deref())?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        print!("{}", format_views_text(&config));
    }

    Ok(())
}

fn format_views_text(config: &ViewsConfig) -> String {
    let mut table = new_table();
    table.set_titles(prettytable::row![
        b->"View",
        b->"Columns",
        b->"Filters",
        b->"Default sort",
        b->"Page size"
    ]);

    for view in &config.views {
        let columns = view
            .columns
            .iter()
            .map(|column| {
                if column.sortable {
                    f!("{}*", column.label())
                } else {
                    column.label().to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        let filters = view
            .filters
            .iter()
            .map(|filter| filter.key.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        table.add_row(prettytable::row![
            view.name,
            columns,
            filters,
            view.default_sort.as_deref().unwrap_or("-"),
            view.page_size
        ]);
    }

    let mut result = String::new();
    result.push_str(&f!("\n{}\n", "CONFIGURED VIEWS".bright_cyan().bold()));
    result.push_str(&f!("{}\n\n", "(* sortable column)".bright_black()));
    result.push_str(&table.to_string());

    result.push_str(&f!("\n{}:\n", "To open a view".bright_white().bold()));
    result.push_str(&f!(
        "  {}\n",
        "admintable list <view> --data <rows.json>".cyan()
    ));
    result.push_str(&f!(
        "  {}\n",
        "admintable shell <view> --data <rows.json>".cyan()
    ));

    result
}
