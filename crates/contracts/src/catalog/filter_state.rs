use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Catalog sort order selected through `?sort=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    #[default]
    Recent,
    PriceAsc,
    PriceDesc,
    /// Only discounted products, newest first.
    Ofertas,
}

impl SortMode {
    pub const ALL: [SortMode; 4] = [
        SortMode::Recent,
        SortMode::PriceAsc,
        SortMode::PriceDesc,
        SortMode::Ofertas,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::Recent => "recent",
            SortMode::PriceAsc => "price_asc",
            SortMode::PriceDesc => "price_desc",
            SortMode::Ofertas => "ofertas",
        }
    }

    pub fn from_param(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == raw)
    }
}

/// URL query parameter names understood by the catalog, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum FilterKey {
    Department,
    Category,
    Subcategory,
    Search,
    Sort,
    Page,
}

impl FilterKey {
    pub const ALL: [FilterKey; 6] = [
        FilterKey::Department,
        FilterKey::Category,
        FilterKey::Subcategory,
        FilterKey::Search,
        FilterKey::Sort,
        FilterKey::Page,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKey::Department => "dept",
            FilterKey::Category => "cat",
            FilterKey::Subcategory => "subcat",
            FilterKey::Search => "q",
            FilterKey::Sort => "sort",
            FilterKey::Page => "page",
        }
    }

    pub fn from_param(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == raw)
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalization applied while parsing catalog parameters. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterIssue {
    #[error("malformed value {value:?} for `{key}`, default used")]
    MalformedFilterInput { key: FilterKey, value: String },
    #[error("unknown taxonomy node {value:?} for `{key}`, dropped")]
    UnknownTaxonomyNode { key: FilterKey, value: String },
}

impl FilterIssue {
    pub fn key(&self) -> FilterKey {
        match self {
            FilterIssue::MalformedFilterInput { key, .. }
            | FilterIssue::UnknownTaxonomyNode { key, .. } => *key,
        }
    }
}

/// Current catalog filters.
///
/// A category is only ever set together with its department, and a
/// subcategory together with its category. Values are immutable: the `with_*`
/// methods return a new state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterState {
    department: Option<String>,
    category: Option<String>,
    subcategory: Option<String>,
    search_text: Option<String>,
    sort: SortMode,
    page: u32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            department: None,
            category: None,
            subcategory: None,
            search_text: None,
            sort: SortMode::Recent,
            page: 1,
        }
    }
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn department(&self) -> Option<&str> {
        self.department.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn subcategory(&self) -> Option<&str> {
        self.subcategory.as_deref()
    }

    pub fn search_text(&self) -> Option<&str> {
        self.search_text.as_deref()
    }

    pub fn sort(&self) -> SortMode {
        self.sort
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// Sets the department and clears everything below it.
    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = non_blank(department.into());
        self.category = None;
        self.subcategory = None;
        self
    }

    /// Sets the category and clears the subcategory. Ignored without a
    /// department.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        if self.department.is_some() {
            self.category = non_blank(category.into());
            self.subcategory = None;
        }
        self
    }

    /// Ignored without a category.
    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        if self.category.is_some() {
            self.subcategory = non_blank(subcategory.into());
        }
        self
    }

    pub fn with_search_text(mut self, text: impl Into<String>) -> Self {
        self.search_text = non_blank(text.into());
        self
    }

    pub fn with_sort(mut self, sort: SortMode) -> Self {
        self.sort = sort;
        self
    }

    /// Pages start at 1; 0 is treated as 1.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Raw parameter value for `key`, as it would appear in a URL before
    /// default-omission.
    pub fn param(&self, key: FilterKey) -> Option<String> {
        match key {
            FilterKey::Department => self.department.clone(),
            FilterKey::Category => self.category.clone(),
            FilterKey::Subcategory => self.subcategory.clone(),
            FilterKey::Search => self.search_text.clone(),
            FilterKey::Sort => Some(self.sort.as_str().to_string()),
            FilterKey::Page => Some(self.page.to_string()),
        }
    }

    pub(crate) fn from_parts(
        department: Option<String>,
        category: Option<String>,
        subcategory: Option<String>,
        search_text: Option<String>,
        sort: SortMode,
        page: u32,
    ) -> Self {
        Self {
            department,
            category,
            subcategory,
            search_text,
            sort,
            page: page.max(1),
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_recent_page_one() {
        let state = FilterState::default();
        assert_eq!(state.sort(), SortMode::Recent);
        assert_eq!(state.page(), 1);
        assert_eq!(state.department(), None);
    }

    #[test]
    fn sort_mode_params_round_trip() {
        for mode in SortMode::ALL {
            assert_eq!(SortMode::from_param(mode.as_str()), Some(mode));
        }
        assert_eq!(SortMode::from_param("PRICE_ASC"), None);
        assert_eq!(
            serde_json::to_string(&SortMode::PriceDesc).unwrap(),
            "\"price_desc\""
        );
    }

    #[test]
    fn changing_an_ancestor_clears_descendants() {
        let state = FilterState::new()
            .with_department("Agua Dulce")
            .with_category("Carretes")
            .with_subcategory("Spinning");
        assert_eq!(state.subcategory(), Some("Spinning"));

        let moved = state.clone().with_department("Ropa y Accesorios");
        assert_eq!(moved.department(), Some("Ropa y Accesorios"));
        assert_eq!(moved.category(), None);
        assert_eq!(moved.subcategory(), None);

        let recat = state.with_category("Cañas");
        assert_eq!(recat.category(), Some("Cañas"));
        assert_eq!(recat.subcategory(), None);
    }

    #[test]
    fn orphan_levels_are_ignored() {
        let state = FilterState::new()
            .with_category("Carretes")
            .with_subcategory("Spinning");
        assert_eq!(state.category(), None);
        assert_eq!(state.subcategory(), None);
    }

    #[test]
    fn blank_search_is_absent() {
        let state = FilterState::new().with_search_text("   ");
        assert_eq!(state.search_text(), None);
        let state = state.with_search_text("  shimano ");
        assert_eq!(state.search_text(), Some("shimano"));
    }

    #[test]
    fn issue_messages_name_the_key() {
        let issue = FilterIssue::MalformedFilterInput {
            key: FilterKey::Page,
            value: "abc".into(),
        };
        assert_eq!(issue.to_string(), "malformed value \"abc\" for `page`, default used");
        assert_eq!(issue.key(), FilterKey::Page);
    }
}
