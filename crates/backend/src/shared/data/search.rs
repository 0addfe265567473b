use sea_orm::sea_query::LikeExpr;

/// Lowercased copy of a searchable column, written alongside it.
///
/// SQLite `LOWER()` only folds ASCII, so `Á` or `Ñ` stored in a title would
/// never match a lowercased needle. Folding in Rust at write time keeps both
/// sides of the `LIKE` in the same case.
pub fn search_key(text: &str) -> String {
    text.to_lowercase()
}

/// `%needle%` over a `search_key` column, LIKE wildcards in the needle escaped.
pub fn contains_pattern(needle: &str) -> LikeExpr {
    let escaped = search_key(needle)
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    LikeExpr::new(format!("%{}%", escaped)).escape('\\')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_fold_accented_capitals() {
        assert_eq!(search_key("Señuelo ÁGUILA"), "señuelo águila");
        assert_eq!(search_key("Ñandú"), "ñandú");
    }
}
