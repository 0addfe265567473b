use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Product columns a catalog query can filter or order on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductField {
    Department,
    Category,
    Subcategory,
    Title,
    Brand,
    Price,
    DiscountPrice,
    IsActive,
    CreatedAt,
}

impl ProductField {
    pub fn column_name(&self) -> &'static str {
        match self {
            ProductField::Department => "department",
            ProductField::Category => "category",
            ProductField::Subcategory => "subcategory",
            ProductField::Title => "title",
            ProductField::Brand => "brand",
            ProductField::Price => "price",
            ProductField::DiscountPrice => "discount_price",
            ProductField::IsActive => "is_active",
            ProductField::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
    Number(f64),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    fn compare(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a.cmp(b),
            (FieldValue::Number(a), FieldValue::Number(b)) => a.total_cmp(b),
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Timestamp(t) => write!(f, "'{}'", t.to_rfc3339()),
        }
    }
}

/// One conjunct of a catalog query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    Equals {
        field: ProductField,
        value: FieldValue,
    },
    NotNull {
        field: ProductField,
    },
    /// Case-insensitive substring match, OR'd across `fields`.
    ContainsIgnoreCase {
        fields: Vec<ProductField>,
        needle: String,
    },
}

impl Predicate {
    pub fn matches<R: CatalogRow + ?Sized>(&self, row: &R) -> bool {
        match self {
            Predicate::Equals { field, value } => row.value(*field).as_ref() == Some(value),
            Predicate::NotNull { field } => row.value(*field).is_some(),
            Predicate::ContainsIgnoreCase { fields, needle } => {
                let needle = needle.to_lowercase();
                fields.iter().any(|field| match row.value(*field) {
                    Some(FieldValue::Text(text)) => text.to_lowercase().contains(&needle),
                    _ => false,
                })
            }
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Equals { field, value } => write!(f, "{} = {}", field.column_name(), value),
            Predicate::NotNull { field } => write!(f, "{} IS NOT NULL", field.column_name()),
            Predicate::ContainsIgnoreCase { fields, needle } => {
                let pattern = FieldValue::Text(format!("%{}%", needle));
                let parts: Vec<String> = fields
                    .iter()
                    .map(|field| format!("{} ILIKE {}", field.column_name(), pattern))
                    .collect();
                write!(f, "({})", parts.join(" OR "))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderKey {
    pub field: ProductField,
    pub direction: SortDirection,
}

impl OrderKey {
    pub fn asc(field: ProductField) -> Self {
        Self {
            field,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: ProductField) -> Self {
        Self {
            field,
            direction: SortDirection::Desc,
        }
    }
}

/// Data-store independent description of one catalog page query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryDescriptor {
    /// Conjunction; empty means every row.
    pub predicates: Vec<Predicate>,
    pub order_by: OrderKey,
    pub offset: u64,
    pub limit: u64,
}

impl QueryDescriptor {
    pub fn matches<R: CatalogRow + ?Sized>(&self, row: &R) -> bool {
        self.predicates.iter().all(|p| p.matches(row))
    }

    /// Runs the descriptor over rows already in memory. Returns the requested
    /// page and the total number of matching rows.
    pub fn apply<'a, R: CatalogRow>(&self, rows: &'a [R]) -> (Vec<&'a R>, u64) {
        let mut selected: Vec<&R> = rows.iter().filter(|row| self.matches(*row)).collect();
        let total = selected.len() as u64;

        let key = self.order_by;
        // Stable sort; NULLs go last in either direction.
        selected.sort_by(|a, b| match (a.value(key.field), b.value(key.field)) {
            (Some(x), Some(y)) => match key.direction {
                SortDirection::Asc => x.compare(&y),
                SortDirection::Desc => y.compare(&x),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });

        let page = selected
            .into_iter()
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .collect();
        (page, total)
    }

    pub fn has_predicate(&self, predicate: &Predicate) -> bool {
        self.predicates.contains(predicate)
    }
}

impl fmt::Display for QueryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.predicates.is_empty() {
            let parts: Vec<String> = self.predicates.iter().map(|p| p.to_string()).collect();
            write!(f, "WHERE {} ", parts.join(" AND "))?;
        }
        let direction = match self.order_by.direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        write!(
            f,
            "ORDER BY {} {} LIMIT {} OFFSET {}",
            self.order_by.field.column_name(),
            direction,
            self.limit,
            self.offset
        )
    }
}

/// Row shape a descriptor can be evaluated against. `None` is SQL NULL.
pub trait CatalogRow {
    fn value(&self, field: ProductField) -> Option<FieldValue>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        title: &'static str,
        brand: &'static str,
        price: f64,
        discount: Option<f64>,
    }

    impl CatalogRow for Row {
        fn value(&self, field: ProductField) -> Option<FieldValue> {
            match field {
                ProductField::Title => Some(FieldValue::Text(self.title.into())),
                ProductField::Brand => Some(FieldValue::Text(self.brand.into())),
                ProductField::Price => Some(FieldValue::Number(self.price)),
                ProductField::DiscountPrice => self.discount.map(FieldValue::Number),
                _ => None,
            }
        }
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { title: "Carrete Stradic", brand: "Shimano", price: 3200.0, discount: None },
            Row { title: "Caña Fuego", brand: "Daiwa", price: 1500.0, discount: Some(1299.0) },
            Row { title: "Combo SHIMANO FX", brand: "Genérico", price: 900.0, discount: None },
        ]
    }

    #[test]
    fn contains_ignore_case_checks_any_field() {
        let predicate = Predicate::ContainsIgnoreCase {
            fields: vec![ProductField::Title, ProductField::Brand],
            needle: "shimano".into(),
        };
        let hits: Vec<bool> = rows().iter().map(|r| predicate.matches(r)).collect();
        assert_eq!(hits, vec![true, false, true]);
    }

    #[test]
    fn apply_filters_orders_and_pages() {
        let descriptor = QueryDescriptor {
            predicates: vec![],
            order_by: OrderKey::asc(ProductField::Price),
            offset: 1,
            limit: 1,
        };
        let data = rows();
        let (page, total) = descriptor.apply(&data);
        assert_eq!(total, 3);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].title, "Caña Fuego");
    }

    #[test]
    fn not_null_excludes_missing_values() {
        let descriptor = QueryDescriptor {
            predicates: vec![Predicate::NotNull { field: ProductField::DiscountPrice }],
            order_by: OrderKey::desc(ProductField::Price),
            offset: 0,
            limit: 10,
        };
        let data = rows();
        let (page, total) = descriptor.apply(&data);
        assert_eq!(total, 1);
        assert_eq!(page[0].brand, "Daiwa");
    }

    #[test]
    fn display_reads_like_sql() {
        let descriptor = QueryDescriptor {
            predicates: vec![
                Predicate::Equals {
                    field: ProductField::IsActive,
                    value: FieldValue::Bool(true),
                },
                Predicate::ContainsIgnoreCase {
                    fields: vec![ProductField::Title, ProductField::Brand],
                    needle: "o'neill".into(),
                },
            ],
            order_by: OrderKey::desc(ProductField::CreatedAt),
            offset: 15,
            limit: 15,
        };
        assert_eq!(
            descriptor.to_string(),
            "WHERE is_active = true AND (title ILIKE '%o''neill%' OR brand ILIKE '%o''neill%') \
             ORDER BY created_at DESC LIMIT 15 OFFSET 15"
        );
    }
}
