use ormeta_tree::Element;
use serde::Serialize;

///
/// DocumentDefaults
///
/// Settings declared on a mapping document's root element. Built once per
/// document and handed to every binder call; never mutated afterwards.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct DocumentDefaults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,

    pub default_cascade: String,
    pub default_access: String,
    pub default_lazy: bool,
    pub auto_import: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
}

impl Default for DocumentDefaults {
    fn default() -> Self {
        Self {
            schema: None,
            catalog: None,
            default_cascade: "none".to_string(),
            default_access: "property".to_string(),
            default_lazy: true,
            auto_import: true,
            package: None,
        }
    }
}

impl DocumentDefaults {
    // from_root
    /// Read the defaults off a document root element.
    #[must_use]
    pub fn from_root(root: &Element) -> Self {
        let base = Self::default();

        Self {
            schema: root.attribute("schema").map(str::to_string),
            catalog: root.attribute("catalog").map(str::to_string),
            default_cascade: root
                .attribute("default-cascade")
                .map_or(base.default_cascade, str::to_string),
            default_access: root
                .attribute("default-access")
                .map_or(base.default_access, str::to_string),
            default_lazy: root.attribute("default-lazy").is_none_or(|v| v == "true"),
            auto_import: root.attribute("auto-import").is_none_or(|v| v == "true"),
            package: root.attribute("package").map(str::to_string),
        }
    }

    // qualify_class
    /// Prefix an unqualified class name with the document package.
    #[must_use]
    pub fn qualify_class(&self, name: &str) -> String {
        match &self.package {
            Some(package) if !name.contains('.') => format!("{package}.{name}"),
            _ => name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ormeta_tree::element;

    #[test]
    fn absent_attributes_fall_back_to_defaults() {
        let defaults = DocumentDefaults::from_root(&element("hibernate-mapping").build());

        assert_eq!(defaults, DocumentDefaults::default());
        assert_eq!(defaults.default_cascade, "none");
        assert_eq!(defaults.default_access, "property");
        assert!(defaults.default_lazy);
        assert!(defaults.auto_import);
    }

    #[test]
    fn root_attributes_are_read() {
        let root = element("hibernate-mapping")
            .attr("schema", "zoo")
            .attr("default-lazy", "false")
            .attr("auto-import", "false")
            .attr("package", "org.zoo")
            .build();
        let defaults = DocumentDefaults::from_root(&root);

        assert_eq!(defaults.schema.as_deref(), Some("zoo"));
        assert!(!defaults.default_lazy);
        assert!(!defaults.auto_import);
        assert_eq!(defaults.qualify_class("Cat"), "org.zoo.Cat");
        assert_eq!(defaults.qualify_class("org.farm.Cow"), "org.farm.Cow");
    }
}
