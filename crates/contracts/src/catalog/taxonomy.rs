use serde::Serialize;

/// Static Department → Category → Subcategory table.
///
/// Shared by the public catalog filters and the admin product form. The table
/// is fixed at deploy time; bump `version` whenever a node is renamed or moved
/// so cached filter URLs can be recognised as stale.
#[derive(Debug, Serialize)]
pub struct Taxonomy {
    pub version: u32,
    pub departments: &'static [DepartmentNode],
}

#[derive(Debug, Serialize)]
pub struct DepartmentNode {
    pub name: &'static str,
    pub categories: &'static [CategoryNode],
}

#[derive(Debug, Serialize)]
pub struct CategoryNode {
    pub name: &'static str,
    pub subcategories: &'static [&'static str],
}

static CATALOG: Taxonomy = Taxonomy {
    version: 1,
    departments: &[
        DepartmentNode {
            name: "Agua Dulce",
            categories: &[
                CategoryNode {
                    name: "Carretes",
                    subcategories: &["Spinning", "Casting", "Spincast"],
                },
                CategoryNode {
                    name: "Cañas",
                    subcategories: &["Spinning", "Casting"],
                },
                CategoryNode {
                    name: "Combos",
                    subcategories: &["Combos Spinning", "Combos Casting", "Combos Spincast"],
                },
                CategoryNode {
                    name: "Señuelos",
                    subcategories: &[
                        "Plásticos",
                        "Curricanes",
                        "Swimbaits",
                        "Spinnerbaits y Buzzbaits",
                        "Jigs y Chatterbaits",
                        "Cucharillas",
                    ],
                },
                CategoryNode {
                    name: "Terminal Tackle",
                    subcategories: &[
                        "Anzuelos y Tercias",
                        "Plomos y Tungstenos",
                        "Jigheads",
                        "Esencias",
                        "Accesorios Varios",
                    ],
                },
            ],
        },
        DepartmentNode {
            name: "Ropa y Accesorios",
            categories: &[
                CategoryNode {
                    name: "Ropa",
                    subcategories: &[
                        "Buff",
                        "Camisas y jerseys",
                        "Gorras y Sombreros",
                        "Guantes",
                        "Chalecos Salvavidas",
                        "Pantalones y Shorts",
                    ],
                },
                CategoryNode {
                    name: "Accesorios Varios",
                    subcategories: &[
                        "Básculas",
                        "Herramientas",
                        "Red de Pesca",
                        "Cuchillos y Navajas",
                        "Otros Accesorios",
                    ],
                },
                CategoryNode {
                    name: "Almacenaje",
                    subcategories: &[
                        "Almacenaje para Señuelos",
                        "Almacenaje para Cañas",
                        "Almacenaje para Carretes",
                    ],
                },
                CategoryNode {
                    name: "Lentes Polarizados",
                    subcategories: &["General"],
                },
            ],
        },
        DepartmentNode {
            name: "Líneas para Pescar",
            categories: &[
                CategoryNode {
                    name: "Monofilamento",
                    subcategories: &["General"],
                },
                CategoryNode {
                    name: "Fluorocarbono",
                    subcategories: &["General"],
                },
                CategoryNode {
                    name: "Trenzado",
                    subcategories: &["General"],
                },
                CategoryNode {
                    name: "Líderes",
                    subcategories: &["General"],
                },
            ],
        },
    ],
};

/// The storefront taxonomy.
pub fn catalog() -> &'static Taxonomy {
    &CATALOG
}

impl Taxonomy {
    /// Department names in display order.
    pub fn departments(&self) -> Vec<&'static str> {
        self.departments.iter().map(|d| d.name).collect()
    }

    /// Categories under `department`, empty when the department is unknown.
    pub fn categories_of(&self, department: &str) -> Vec<&'static str> {
        self.department(department)
            .map(|d| d.categories.iter().map(|c| c.name).collect())
            .unwrap_or_default()
    }

    /// Subcategories under `department`/`category`, empty when either is unknown.
    pub fn subcategories_of(&self, department: &str, category: &str) -> Vec<&'static str> {
        self.category(department, category)
            .map(|c| c.subcategories.to_vec())
            .unwrap_or_default()
    }

    pub fn has_department(&self, department: &str) -> bool {
        self.department(department).is_some()
    }

    pub fn has_category(&self, department: &str, category: &str) -> bool {
        self.category(department, category).is_some()
    }

    pub fn has_subcategory(&self, department: &str, category: &str, subcategory: &str) -> bool {
        self.category(department, category)
            .map(|c| c.subcategories.contains(&subcategory))
            .unwrap_or(false)
    }

    /// Checks a (possibly partial) path from the root.
    ///
    /// A subcategory without a category is never a valid path.
    pub fn contains_path(
        &self,
        department: &str,
        category: Option<&str>,
        subcategory: Option<&str>,
    ) -> bool {
        match (category, subcategory) {
            (None, None) => self.has_department(department),
            (Some(cat), None) => self.has_category(department, cat),
            (Some(cat), Some(sub)) => self.has_subcategory(department, cat, sub),
            (None, Some(_)) => false,
        }
    }

    /// First category and its first subcategory, used to reset the product
    /// form when the department changes.
    pub fn default_path(&self, department: &str) -> Option<(&'static str, &'static str)> {
        let category = self.department(department)?.categories.first()?;
        let subcategory = category.subcategories.first()?;
        Some((category.name, *subcategory))
    }

    /// Every complete (department, category, subcategory) triple in table order.
    pub fn leaf_paths(&self) -> Vec<(&'static str, &'static str, &'static str)> {
        let mut paths = Vec::new();
        for department in self.departments {
            for category in department.categories {
                for subcategory in category.subcategories {
                    paths.push((department.name, category.name, *subcategory));
                }
            }
        }
        paths
    }

    fn department(&self, name: &str) -> Option<&'static DepartmentNode> {
        self.departments.iter().find(|d| d.name == name)
    }

    fn category(&self, department: &str, category: &str) -> Option<&'static CategoryNode> {
        self.department(department)?
            .categories
            .iter()
            .find(|c| c.name == category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn departments_keep_display_order() {
        assert_eq!(
            catalog().departments(),
            vec!["Agua Dulce", "Ropa y Accesorios", "Líneas para Pescar"]
        );
    }

    #[test]
    fn categories_and_subcategories_resolve() {
        let t = catalog();
        assert_eq!(
            t.categories_of("Líneas para Pescar"),
            vec!["Monofilamento", "Fluorocarbono", "Trenzado", "Líderes"]
        );
        assert_eq!(
            t.subcategories_of("Agua Dulce", "Carretes"),
            vec!["Spinning", "Casting", "Spincast"]
        );
    }

    #[test]
    fn unknown_nodes_yield_empty() {
        let t = catalog();
        assert!(t.categories_of("Agua Salada").is_empty());
        assert!(t.subcategories_of("Agua Dulce", "Ropa").is_empty());
        assert!(t.subcategories_of("Nope", "Carretes").is_empty());
    }

    #[test]
    fn names_are_scoped_to_their_parent() {
        let t = catalog();
        // "Accesorios Varios" is a category of one department and a
        // subcategory of another.
        assert!(t.has_category("Ropa y Accesorios", "Accesorios Varios"));
        assert!(!t.has_category("Agua Dulce", "Accesorios Varios"));
        assert!(t.has_subcategory("Agua Dulce", "Terminal Tackle", "Accesorios Varios"));
        assert!(t.has_subcategory("Agua Dulce", "Cañas", "Spinning"));
        assert!(!t.has_subcategory("Agua Dulce", "Cañas", "Spincast"));
    }

    #[test]
    fn contains_path_checks_every_level() {
        let t = catalog();
        assert!(t.contains_path("Agua Dulce", None, None));
        assert!(t.contains_path("Agua Dulce", Some("Señuelos"), Some("Cucharillas")));
        assert!(!t.contains_path("Agua Dulce", Some("Señuelos"), Some("General")));
        assert!(!t.contains_path("Agua Dulce", None, Some("Spinning")));
    }

    #[test]
    fn default_path_is_first_entries() {
        let t = catalog();
        assert_eq!(t.default_path("Agua Dulce"), Some(("Carretes", "Spinning")));
        assert_eq!(t.default_path("Ropa y Accesorios"), Some(("Ropa", "Buff")));
        assert_eq!(t.default_path("Otro"), None);
    }

    #[test]
    fn leaf_paths_cover_the_table() {
        let paths = catalog().leaf_paths();
        assert_eq!(paths.len(), 3 + 2 + 3 + 6 + 5 + 6 + 5 + 3 + 1 + 4);
        assert_eq!(paths[0], ("Agua Dulce", "Carretes", "Spinning"));
        assert_eq!(
            paths.last().copied(),
            Some(("Líneas para Pescar", "Líderes", "General"))
        );
    }
}
