use std::collections::BTreeMap;

use url::form_urlencoded;

use super::filter_state::{FilterKey, FilterState, SortMode};

pub const CATALOG_PATH: &str = "/catalogo";
pub const ADMIN_CATALOG_PATH: &str = "/dashboard/catalogo";

/// Set of parameter changes applied on top of a `FilterState` when building a
/// link. `None` removes the parameter.
///
/// `set`/`clear` do not touch other keys. Use `select_department` and
/// `select_category` when an ancestor changes so stale descendants are
/// cleared with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterUpdates {
    entries: BTreeMap<FilterKey, Option<String>>,
}

impl FilterUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: FilterKey, value: impl Into<String>) -> Self {
        self.entries.insert(key, Some(value.into()));
        self
    }

    pub fn clear(mut self, key: FilterKey) -> Self {
        self.entries.insert(key, None);
        self
    }

    /// Department link: clears category, subcategory and page.
    pub fn select_department(department: impl Into<String>) -> Self {
        Self::new()
            .set(FilterKey::Department, department)
            .clear(FilterKey::Category)
            .clear(FilterKey::Subcategory)
            .clear(FilterKey::Page)
    }

    /// Category link: clears subcategory and page.
    pub fn select_category(category: impl Into<String>) -> Self {
        Self::new()
            .set(FilterKey::Category, category)
            .clear(FilterKey::Subcategory)
            .clear(FilterKey::Page)
    }

    pub fn select_subcategory(subcategory: impl Into<String>) -> Self {
        Self::new()
            .set(FilterKey::Subcategory, subcategory)
            .clear(FilterKey::Page)
    }

    /// New search text, back to the first page.
    pub fn search(text: impl Into<String>) -> Self {
        Self::new()
            .set(FilterKey::Search, text)
            .clear(FilterKey::Page)
    }

    pub fn sort(mode: SortMode) -> Self {
        Self::new()
            .set(FilterKey::Sort, mode.as_str())
            .clear(FilterKey::Page)
    }

    pub fn page(page: u32) -> Self {
        Self::new().set(FilterKey::Page, page.to_string())
    }

    /// Builds updates from loose `(param, value)` pairs. Unknown parameter
    /// names are ignored.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
    {
        let mut updates = Self::new();
        for (name, value) in pairs {
            let Some(key) = FilterKey::from_param(name) else {
                continue;
            };
            updates = match value {
                Some(v) => updates.set(key, v),
                None => updates.clear(key),
            };
        }
        updates
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn iter(&self) -> impl Iterator<Item = (&FilterKey, &Option<String>)> {
        self.entries.iter()
    }
}

/// Serializes `current` with `updates` applied as `<path>?<query>`, or just
/// `<path>` when every value is default or absent.
pub fn build_url_at(path: &str, current: &FilterState, updates: &FilterUpdates) -> String {
    let mut params: BTreeMap<FilterKey, String> = FilterKey::ALL
        .into_iter()
        .filter_map(|key| current.param(key).map(|v| (key, v)))
        .collect();

    for (key, value) in updates.iter() {
        match value {
            Some(v) => params.insert(*key, v.clone()),
            None => params.remove(key),
        };
    }

    let query = canonical_query(&params);
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, query)
    }
}

/// Fixed key order, defaults omitted, form-urlencoded values.
fn canonical_query(params: &BTreeMap<FilterKey, String>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for key in FilterKey::ALL {
        let Some(raw) = params.get(&key) else {
            continue;
        };
        let value = raw.trim();
        if value.is_empty() {
            continue;
        }
        match key {
            FilterKey::Sort => match SortMode::from_param(value) {
                Some(mode) if mode != SortMode::Recent => {
                    serializer.append_pair(key.as_str(), mode.as_str());
                }
                _ => {}
            },
            FilterKey::Page => match value.parse::<u32>() {
                Ok(page) if page > 1 => {
                    serializer.append_pair(key.as_str(), &page.to_string());
                }
                _ => {}
            },
            _ => {
                serializer.append_pair(key.as_str(), value);
            }
        }
    }
    serializer.finish()
}
