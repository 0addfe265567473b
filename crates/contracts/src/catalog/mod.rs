//! Storefront catalog: the department/category/subcategory taxonomy and the
//! resolver that maps `/catalogo` query parameters to filter state, canonical
//! URLs and data-store query descriptors.

pub mod catalog_url;
pub mod filter_state;
pub mod query_descriptor;
pub mod resolver;
pub mod taxonomy;

pub use catalog_url::{FilterUpdates, ADMIN_CATALOG_PATH, CATALOG_PATH};
pub use filter_state::{FilterIssue, FilterKey, FilterState, SortMode};
pub use query_descriptor::{
    CatalogRow, FieldValue, OrderKey, Predicate, ProductField, QueryDescriptor, SortDirection,
};
pub use resolver::{build_url, parse, to_query_descriptor, CatalogQueryResolver};
pub use taxonomy::{catalog, Taxonomy};

/// Page size of the public catalog grid.
pub const PUBLIC_PAGE_SIZE: u64 = 15;

/// Page size of the admin catalog table.
pub const ADMIN_PAGE_SIZE: u64 = 12;
