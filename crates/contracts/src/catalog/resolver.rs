use std::collections::HashMap;

use url::form_urlencoded;

use super::catalog_url::{build_url_at, FilterUpdates, ADMIN_CATALOG_PATH, CATALOG_PATH};
use super::filter_state::{FilterIssue, FilterKey, FilterState, SortMode};
use super::query_descriptor::{FieldValue, OrderKey, Predicate, ProductField, QueryDescriptor};
use super::taxonomy::{catalog, Taxonomy};

/// Maps catalog URL parameters to `FilterState` and back, and `FilterState`
/// to a `QueryDescriptor`. Pure; holds only a reference to the taxonomy used
/// to validate department/category/subcategory values.
#[derive(Debug, Clone, Copy)]
pub struct CatalogQueryResolver<'t> {
    taxonomy: &'t Taxonomy,
}

impl CatalogQueryResolver<'static> {
    pub fn storefront() -> Self {
        Self::new(catalog())
    }
}

impl Default for CatalogQueryResolver<'static> {
    fn default() -> Self {
        Self::storefront()
    }
}

impl<'t> CatalogQueryResolver<'t> {
    pub fn new(taxonomy: &'t Taxonomy) -> Self {
        Self { taxonomy }
    }

    pub fn taxonomy(&self) -> &'t Taxonomy {
        self.taxonomy
    }

    pub fn parse(&self, raw: &HashMap<String, String>) -> FilterState {
        self.parse_with_issues(raw).0
    }

    /// Parses a raw `a=b&c=d` query string (`+` decodes to a space). When a
    /// key repeats, the last value wins.
    pub fn parse_query_string(&self, query: &str) -> FilterState {
        let query = query.strip_prefix('?').unwrap_or(query);
        let raw: HashMap<String, String> = form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        self.parse(&raw)
    }

    /// Like `parse`, also returning every normalization that was applied.
    pub fn parse_with_issues(&self, raw: &HashMap<String, String>) -> (FilterState, Vec<FilterIssue>) {
        let mut issues = Vec::new();
        let read = |key: FilterKey| read_param(raw, key);

        let page = match read(FilterKey::Page) {
            None => 1,
            Some(value) => match value.parse::<u32>() {
                Ok(page) if page >= 1 => page,
                _ => {
                    issues.push(malformed(FilterKey::Page, value));
                    1
                }
            },
        };

        let sort = match read(FilterKey::Sort) {
            None => SortMode::Recent,
            Some(value) => SortMode::from_param(value).unwrap_or_else(|| {
                issues.push(malformed(FilterKey::Sort, value));
                SortMode::Recent
            }),
        };

        let search_text = read(FilterKey::Search).map(str::to_string);

        let (department, category, subcategory) = self.resolve_path(
            read(FilterKey::Department),
            read(FilterKey::Category),
            read(FilterKey::Subcategory),
            &mut issues,
        );

        let state = FilterState::from_parts(department, category, subcategory, search_text, sort, page);
        (state, issues)
    }

    /// Keeps the longest valid prefix of the taxonomy path. Every level that
    /// is dropped is reported.
    fn resolve_path(
        &self,
        department: Option<&str>,
        category: Option<&str>,
        subcategory: Option<&str>,
        issues: &mut Vec<FilterIssue>,
    ) -> (Option<String>, Option<String>, Option<String>) {
        let department = department.filter(|d| {
            let known = self.taxonomy.has_department(d);
            if !known {
                issues.push(unknown(FilterKey::Department, d));
            }
            known
        });

        let category = category.filter(|c| {
            let known = department
                .map(|d| self.taxonomy.has_category(d, c))
                .unwrap_or(false);
            if !known {
                issues.push(unknown(FilterKey::Category, c));
            }
            known
        });

        let subcategory = subcategory.filter(|s| {
            let known = match (department, category) {
                (Some(d), Some(c)) => self.taxonomy.has_subcategory(d, c, s),
                _ => false,
            };
            if !known {
                issues.push(unknown(FilterKey::Subcategory, s));
            }
            known
        });

        (
            department.map(str::to_string),
            category.map(str::to_string),
            subcategory.map(str::to_string),
        )
    }

    /// Canonical `/catalogo` link for `current` with `updates` applied.
    pub fn build_url(&self, current: &FilterState, updates: &FilterUpdates) -> String {
        build_url_at(CATALOG_PATH, current, updates)
    }

    pub fn build_admin_url(&self, current: &FilterState, updates: &FilterUpdates) -> String {
        build_url_at(ADMIN_CATALOG_PATH, current, updates)
    }

    /// Public storefront query: active products only.
    pub fn to_query_descriptor(&self, state: &FilterState, page_size: u64) -> QueryDescriptor {
        build_descriptor(state, page_size, true)
    }

    /// Admin query: same filters, hidden products included.
    pub fn to_admin_query_descriptor(&self, state: &FilterState, page_size: u64) -> QueryDescriptor {
        build_descriptor(state, page_size, false)
    }
}

fn build_descriptor(state: &FilterState, page_size: u64, active_only: bool) -> QueryDescriptor {
    let mut predicates = Vec::new();

    if active_only {
        predicates.push(Predicate::Equals {
            field: ProductField::IsActive,
            value: FieldValue::Bool(true),
        });
    }

    let levels = [
        (ProductField::Department, state.department()),
        (ProductField::Category, state.category()),
        (ProductField::Subcategory, state.subcategory()),
    ];
    for (field, value) in levels {
        if let Some(value) = value {
            predicates.push(Predicate::Equals {
                field,
                value: FieldValue::Text(value.to_string()),
            });
        }
    }

    if let Some(text) = state.search_text().filter(|t| !t.is_empty()) {
        predicates.push(Predicate::ContainsIgnoreCase {
            fields: vec![ProductField::Title, ProductField::Brand],
            needle: text.to_string(),
        });
    }

    let order_by = match state.sort() {
        SortMode::PriceAsc => OrderKey::asc(ProductField::Price),
        SortMode::PriceDesc => OrderKey::desc(ProductField::Price),
        SortMode::Ofertas => {
            predicates.push(Predicate::NotNull {
                field: ProductField::DiscountPrice,
            });
            OrderKey::desc(ProductField::CreatedAt)
        }
        SortMode::Recent => OrderKey::desc(ProductField::CreatedAt),
    };

    QueryDescriptor {
        predicates,
        order_by,
        offset: u64::from(state.page() - 1) * page_size,
        limit: page_size,
    }
}

/// Trimmed value of `key`; blank counts as absent.
fn read_param(raw: &HashMap<String, String>, key: FilterKey) -> Option<&str> {
    raw.get(key.as_str())
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn malformed(key: FilterKey, value: &str) -> FilterIssue {
    FilterIssue::MalformedFilterInput {
        key,
        value: value.to_string(),
    }
}

fn unknown(key: FilterKey, value: &str) -> FilterIssue {
    FilterIssue::UnknownTaxonomyNode {
        key,
        value: value.to_string(),
    }
}

/// `CatalogQueryResolver::parse` against the storefront taxonomy.
pub fn parse(raw: &HashMap<String, String>) -> FilterState {
    CatalogQueryResolver::storefront().parse(raw)
}

/// `CatalogQueryResolver::build_url` for the public catalog.
pub fn build_url(current: &FilterState, updates: &FilterUpdates) -> String {
    CatalogQueryResolver::storefront().build_url(current, updates)
}

/// `CatalogQueryResolver::to_query_descriptor` for the public catalog.
pub fn to_query_descriptor(state: &FilterState, page_size: u64) -> QueryDescriptor {
    CatalogQueryResolver::storefront().to_query_descriptor(state, page_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::query_descriptor::{CatalogRow, SortDirection};
    use crate::catalog::PUBLIC_PAGE_SIZE;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn active() -> Predicate {
        Predicate::Equals {
            field: ProductField::IsActive,
            value: FieldValue::Bool(true),
        }
    }

    fn eq(field: ProductField, value: &str) -> Predicate {
        Predicate::Equals {
            field,
            value: FieldValue::Text(value.to_string()),
        }
    }

    #[test]
    fn full_path_maps_to_equality_filters() {
        let state = parse(&params(&[
            ("dept", "Agua Dulce"),
            ("cat", "Carretes"),
            ("subcat", "Spinning"),
        ]));
        let descriptor = to_query_descriptor(&state, PUBLIC_PAGE_SIZE);

        assert_eq!(
            descriptor.predicates,
            vec![
                active(),
                eq(ProductField::Department, "Agua Dulce"),
                eq(ProductField::Category, "Carretes"),
                eq(ProductField::Subcategory, "Spinning"),
            ]
        );
        assert_eq!(descriptor.order_by, OrderKey::desc(ProductField::CreatedAt));
        assert_eq!((descriptor.offset, descriptor.limit), (0, 15));
    }

    #[test]
    fn search_with_price_sort_on_second_page() {
        let state = parse(&params(&[("q", "shimano"), ("sort", "price_asc"), ("page", "2")]));
        let descriptor = to_query_descriptor(&state, PUBLIC_PAGE_SIZE);

        assert_eq!(
            descriptor.predicates,
            vec![
                active(),
                Predicate::ContainsIgnoreCase {
                    fields: vec![ProductField::Title, ProductField::Brand],
                    needle: "shimano".into(),
                },
            ]
        );
        assert_eq!(descriptor.order_by.field, ProductField::Price);
        assert_eq!(descriptor.order_by.direction, SortDirection::Asc);
        assert_eq!((descriptor.offset, descriptor.limit), (15, 15));
    }

    #[test]
    fn ofertas_requires_discount_and_orders_newest() {
        let state = parse(&params(&[("sort", "ofertas"), ("page", "1")]));
        let descriptor = to_query_descriptor(&state, 15);
        assert!(descriptor.has_predicate(&Predicate::NotNull {
            field: ProductField::DiscountPrice
        }));
        assert_eq!(descriptor.order_by, OrderKey::desc(ProductField::CreatedAt));
    }

    #[test]
    fn price_desc_orders_by_price() {
        let state = parse(&params(&[("sort", "price_desc")]));
        let descriptor = to_query_descriptor(&state, 15);
        assert_eq!(descriptor.order_by, OrderKey::desc(ProductField::Price));
        assert_eq!(descriptor.predicates, vec![active()]);
    }

    #[test]
    fn bad_pages_fall_back_to_first() {
        for raw in ["0", "-3", "abc", "", "  ", "2.5", "99999999999"] {
            let (state, issues) =
                CatalogQueryResolver::storefront().parse_with_issues(&params(&[("page", raw)]));
            assert_eq!(state.page(), 1, "page={raw:?}");
            if !raw.trim().is_empty() {
                assert_eq!(issues.len(), 1, "page={raw:?}");
                assert_eq!(issues[0].key(), FilterKey::Page);
            }
        }
        assert_eq!(parse(&HashMap::new()).page(), 1);
    }

    #[test]
    fn unknown_sort_is_recent() {
        let (state, issues) = CatalogQueryResolver::storefront()
            .parse_with_issues(&params(&[("sort", "nonsense")]));
        assert_eq!(state.sort(), SortMode::Recent);
        assert_eq!(
            issues,
            vec![FilterIssue::MalformedFilterInput {
                key: FilterKey::Sort,
                value: "nonsense".into()
            }]
        );
    }

    #[test]
    fn blanks_are_absent_and_search_is_trimmed() {
        let state = parse(&params(&[("dept", "  "), ("q", "  daiwa  "), ("sort", "")]));
        assert_eq!(state.department(), None);
        assert_eq!(state.search_text(), Some("daiwa"));
        assert_eq!(state.sort(), SortMode::Recent);
    }

    #[test]
    fn unknown_department_drops_every_level() {
        let (state, issues) = CatalogQueryResolver::storefront().parse_with_issues(&params(&[
            ("dept", "Agua Salada"),
            ("cat", "Carretes"),
            ("subcat", "Spinning"),
        ]));
        assert_eq!(state.department(), None);
        assert_eq!(state.category(), None);
        assert_eq!(state.subcategory(), None);
        let keys: Vec<FilterKey> = issues.iter().map(FilterIssue::key).collect();
        assert_eq!(
            keys,
            vec![FilterKey::Department, FilterKey::Category, FilterKey::Subcategory]
        );
    }

    #[test]
    fn mismatched_category_keeps_department() {
        let state = parse(&params(&[
            ("dept", "Agua Dulce"),
            ("cat", "Ropa"),
            ("subcat", "Buff"),
        ]));
        assert_eq!(state.department(), Some("Agua Dulce"));
        assert_eq!(state.category(), None);
        assert_eq!(state.subcategory(), None);
    }

    #[test]
    fn mismatched_subcategory_keeps_category() {
        let state = parse(&params(&[
            ("dept", "Agua Dulce"),
            ("cat", "Cañas"),
            ("subcat", "Spincast"),
        ]));
        assert_eq!(state.category(), Some("Cañas"));
        assert_eq!(state.subcategory(), None);
    }

    #[test]
    fn category_without_department_is_dropped() {
        let state = parse(&params(&[("cat", "Carretes")]));
        assert_eq!(state.category(), None);
        let descriptor = to_query_descriptor(&state, 15);
        assert_eq!(descriptor.predicates, vec![active()]);
    }

    #[test]
    fn explicit_defaults_are_tolerated() {
        let state = parse(&params(&[("page", "1"), ("sort", "recent")]));
        assert_eq!(state, FilterState::new());
    }

    #[test]
    fn query_string_decodes_plus_and_percent() {
        let resolver = CatalogQueryResolver::storefront();
        let state =
            resolver.parse_query_string("?dept=L%C3%ADneas+para+Pescar&cat=Trenzado&q=power+pro");
        assert_eq!(state.department(), Some("Líneas para Pescar"));
        assert_eq!(state.category(), Some("Trenzado"));
        assert_eq!(state.search_text(), Some("power pro"));
    }

    #[test]
    fn build_url_clears_requested_levels() {
        let current = FilterState::new()
            .with_department("Agua Dulce")
            .with_category("Carretes");
        let updates = FilterUpdates::new()
            .clear(FilterKey::Category)
            .clear(FilterKey::Subcategory);
        assert_eq!(build_url(&current, &updates), "/catalogo?dept=Agua+Dulce");
    }

    #[test]
    fn build_then_parse_reconstructs_state() {
        let resolver = CatalogQueryResolver::storefront();
        let states = vec![
            FilterState::new(),
            FilterState::new().with_sort(SortMode::Ofertas),
            FilterState::new().with_search_text("línea 20 lb").with_page(7),
            FilterState::new()
                .with_department("Ropa y Accesorios")
                .with_category("Almacenaje")
                .with_subcategory("Almacenaje para Señuelos")
                .with_sort(SortMode::PriceDesc)
                .with_page(2),
        ];
        for state in states {
            let url = resolver.build_url(&state, &FilterUpdates::new());
            let query = url.split_once('?').map(|(_, q)| q).unwrap_or("");
            assert_eq!(resolver.parse_query_string(query), state, "url={url}");
        }
    }

    #[test]
    fn build_url_is_idempotent() {
        let resolver = CatalogQueryResolver::storefront();
        let start = FilterState::new().with_department("Agua Dulce").with_page(3);
        let updates = FilterUpdates::select_category("Señuelos")
            .set(FilterKey::Sort, "price_asc");

        let once = resolver.build_url(&start, &updates);
        let reparsed = resolver.parse_query_string(once.split_once('?').map(|(_, q)| q).unwrap());
        let twice = resolver.build_url(&reparsed, &updates);
        assert_eq!(once, twice);
        assert_eq!(once, "/catalogo?dept=Agua+Dulce&cat=Se%C3%B1uelos&sort=price_asc");
    }

    #[test]
    fn admin_descriptor_includes_inactive() {
        let resolver = CatalogQueryResolver::storefront();
        let state = parse(&params(&[("dept", "Agua Dulce"), ("page", "3")]));
        let descriptor = resolver.to_admin_query_descriptor(&state, 12);
        assert_eq!(descriptor.predicates, vec![eq(ProductField::Department, "Agua Dulce")]);
        assert_eq!((descriptor.offset, descriptor.limit), (24, 12));
        assert_eq!(
            resolver.build_admin_url(&state, &FilterUpdates::new()),
            "/dashboard/catalogo?dept=Agua+Dulce&page=3"
        );
    }

    struct Fixture {
        department: &'static str,
        category: &'static str,
        subcategory: &'static str,
        is_active: bool,
    }

    impl CatalogRow for Fixture {
        fn value(&self, field: ProductField) -> Option<FieldValue> {
            match field {
                ProductField::Department => Some(FieldValue::Text(self.department.into())),
                ProductField::Category => Some(FieldValue::Text(self.category.into())),
                ProductField::Subcategory => Some(FieldValue::Text(self.subcategory.into())),
                ProductField::IsActive => Some(FieldValue::Bool(self.is_active)),
                _ => None,
            }
        }
    }

    #[test]
    fn every_leaf_selects_exactly_its_products() {
        let taxonomy = catalog();
        let mut fixtures = Vec::new();
        for (department, category, subcategory) in taxonomy.leaf_paths() {
            for is_active in [true, true, false] {
                fixtures.push(Fixture {
                    department,
                    category,
                    subcategory,
                    is_active,
                });
            }
        }

        for (department, category, subcategory) in taxonomy.leaf_paths() {
            let state = parse(&params(&[
                ("dept", department),
                ("cat", category),
                ("subcat", subcategory),
            ]));
            let descriptor = to_query_descriptor(&state, 1_000);
            let selected: Vec<&Fixture> =
                fixtures.iter().filter(|f| descriptor.matches(*f)).collect();

            assert_eq!(selected.len(), 2, "{department} > {category} > {subcategory}");
            assert!(selected.iter().all(|f| f.is_active
                && f.department == department
                && f.category == category
                && f.subcategory == subcategory));
        }
    }
}
