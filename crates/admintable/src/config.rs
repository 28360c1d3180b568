use admintable_core::query::parse_sort_arg;
use admintable_core::{
    Column, ColumnRegistry, FilterDescriptor, FilterOption, FilterRegistry, JsonRow, QueryError,
    QueryState, Record, RegistryError, SortOrder, Value, DEFAULT_PAGE_SIZE,
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// File name looked up under the user's config directory
pub const CONFIG_FILE: &str = "views.toml";

const BUILTIN_VIEWS: &str = include_str!("views.toml");

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read views file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid views file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("No views configured")]
    NoViews,

    #[error("Duplicate view name: {0}")]
    DuplicateView(String),

    #[error("View '{view}': {source}")]
    Registry {
        view: String,
        source: RegistryError,
    },

    #[error("View '{view}': invalid default sort: {source}")]
    DefaultSort { view: String, source: QueryError },

    #[error("View '{view}': default sort column '{key}' is not sortable")]
    DefaultSortNotSortable { view: String, key: String },

    #[error("View '{0}': page_size must be greater than zero")]
    ZeroPageSize(String),
}

/// The set of management views known to the CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewsConfig {
    #[serde(default)]
    pub views: Vec<ViewConfig>,
}

/// Columns, facets and defaults of one management view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewConfig {
    pub name: String,
    #[serde(default = "default_id_field")]
    pub id_field: String,
    #[serde(default)]
    pub default_sort: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub columns: Vec<ColumnConfig>,
    #[serde(default)]
    pub filters: Vec<FilterConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub key: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub sortable: bool,
    #[serde(default)]
    pub format: ColumnFormat,
}

/// How a column turns a raw field into display text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnFormat {
    #[default]
    Text,
    Date,
    Datetime,
    YesNo,
    Upper,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub key: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub options: Vec<OptionConfig>,
}

/// A facet option, either `"draft"` or `{ value = "draft", label = "Draft" }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionConfig {
    Plain(String),
    Labeled { value: String, label: String },
}

fn default_id_field() -> String {
    "id".to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

/// Resolve the views file to read, if any
///
/// An explicit path always wins (and must exist). Otherwise the file under the
/// user's config directory is used when present.
pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    dirs_next::config_dir()
        .map(|dir| dir.join("admintable").join(CONFIG_FILE))
        .filter(|path| path.exists())
}

/// Load the views from the resolved file, or fall back to the built-in views
pub fn load(explicit: Option<&Path>) -> Result<ViewsConfig, ConfigError> {
    match config_path(explicit) {
        Some(path) => {
            debug!("Loading views from {}", path.display());
            ViewsConfig::from_file(&path)
        }
        None => {
            debug!("No views file found, using built-in views");
            ViewsConfig::builtin()
        }
    }
}

impl ViewsConfig {
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_toml(BUILTIN_VIEWS)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parse and validate a views document
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.views.is_empty() {
            return Err(ConfigError::NoViews);
        }

        let mut names = HashSet::new();
        for view in &self.views {
            if !names.insert(view.name.as_str()) {
                return Err(ConfigError::DuplicateView(view.name.clone()));
            }
            view.validate()?;
        }

        Ok(())
    }

    pub fn find(&self, name: &str) -> Result<&ViewConfig, crate::Error> {
        self.views
            .iter()
            .find(|view| view.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| crate::Error::UnknownView {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    pub fn names(&self) -> Vec<&str> {
        self.views.iter().map(|view| view.name.as_str()).collect()
    }
}

impl ViewConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::ZeroPageSize(self.name.clone()));
        }

        let columns = self.column_registry()?;
        self.filter_registry()?;

        if let Some((key, _)) = self.parse_default_sort()? {
            if !columns.is_sortable(&key) {
                return Err(ConfigError::DefaultSortNotSortable {
                    view: self.name.clone(),
                    key,
                });
            }
        }

        Ok(())
    }

    pub fn column_registry(&self) -> Result<ColumnRegistry<JsonRow>, ConfigError> {
        ColumnRegistry::new(self.columns.iter().map(ColumnConfig::to_column)).map_err(|source| {
            ConfigError::Registry {
                view: self.name.clone(),
                source,
            }
        })
    }

    pub fn filter_registry(&self) -> Result<FilterRegistry, ConfigError> {
        FilterRegistry::new(self.filters.iter().map(FilterConfig::to_descriptor)).map_err(
            |source| ConfigError::Registry {
                view: self.name.clone(),
                source,
            },
        )
    }

    /// Query state a freshly opened view starts from
    pub fn initial_state(&self) -> Result<QueryState, ConfigError> {
        let state = QueryState::with_page_size(self.page_size);
        Ok(match self.parse_default_sort()? {
            Some((key, order)) => state.with_sort(key, order),
            None => state,
        })
    }

    fn parse_default_sort(&self) -> Result<Option<(String, SortOrder)>, ConfigError> {
        self.default_sort
            .as_deref()
            .map(|sort| {
                parse_sort_arg(sort).map_err(|source| ConfigError::DefaultSort {
                    view: self.name.clone(),
                    source,
                })
            })
            .transpose()
    }
}

impl ColumnConfig {
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.key)
    }

    pub fn to_column(&self) -> Column<JsonRow> {
        let column = Column::new(self.key.clone(), self.label()).with_sortable(self.sortable);

        if self.format == ColumnFormat::Text {
            return column;
        }

        let key = self.key.clone();
        let format = self.format;
        column.render(move |row: &JsonRow| format.apply(&row.field(&key)))
    }
}

impl ColumnFormat {
    /// Format a raw value, or `None` when the value does not fit the format
    pub fn apply(self, value: &Value) -> Option<String> {
        match (self, value) {
            (_, Value::Null) => None,
            (ColumnFormat::Text, value) => Some(value.display()),
            (ColumnFormat::Date, Value::Temporal { at, .. }) => {
                Some(at.format("%Y-%m-%d").to_string())
            }
            (ColumnFormat::Datetime, Value::Temporal { at, .. }) => {
                Some(at.format("%Y-%m-%d %H:%M").to_string())
            }
            (ColumnFormat::YesNo, Value::Bool(flag)) => {
                Some(if *flag { "Yes" } else { "No" }.to_string())
            }
            (ColumnFormat::Upper, value) => Some(value.display().to_uppercase()),
            _ => None,
        }
    }
}

impl FilterConfig {
    pub fn to_descriptor(&self) -> FilterDescriptor {
        FilterDescriptor::new(
            self.key.clone(),
            self.label.clone().unwrap_or_else(|| self.key.clone()),
            self.options.iter().map(OptionConfig::to_option),
        )
    }
}

impl OptionConfig {
    pub fn to_option(&self) -> FilterOption {
        match self {
            OptionConfig::Plain(value) => FilterOption::from(value.as_str()),
            OptionConfig::Labeled { value, label } => FilterOption::new(value.clone(), label.clone()),
        }
    }
}
