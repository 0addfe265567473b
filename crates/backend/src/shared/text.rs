use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Drops accents: "Líneas" becomes "Lineas", "Caña" becomes "Cana".
pub fn strip_diacritics(input: &str) -> String {
    input.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// URL slug: lowercase ASCII letters and digits separated by single dashes.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in strip_diacritics(input).chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_dash = true;
        }
    }
    slug
}

/// Folder segment for the media host.
pub fn sanitize_for_folder(input: &str) -> String {
    strip_diacritics(input)
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_examples() {
        assert_eq!(slugify("Gran Sorteo!"), "gran-sorteo");
        assert_eq!(slugify("  Caña Ugly Stik  GX2 "), "cana-ugly-stik-gx2");
        assert_eq!(slugify("Señuelo 3/8 oz -- Rojo"), "senuelo-38-oz-rojo");
        assert_eq!(slugify("¡¡!!"), "");
    }

    #[test]
    fn folder_names_drop_accents_and_spaces() {
        assert_eq!(sanitize_for_folder("Líneas para Pescar"), "lineas-para-pescar");
        assert_eq!(sanitize_for_folder(" Agua  Dulce "), "agua-dulce");
    }

    #[test]
    fn strip_diacritics_keeps_base_letters() {
        assert_eq!(strip_diacritics("Líderes Ñandú"), "Lideres Nandu");
    }
}
