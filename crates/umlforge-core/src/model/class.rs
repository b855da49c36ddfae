use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    #[serde(rename = "+", alias = "public")]
    Public,
    #[serde(rename = "-", alias = "private")]
    Private,
    #[serde(rename = "#", alias = "protected")]
    Protected,
}

impl Visibility {
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Public => "+",
            Self::Private => "-",
            Self::Protected => "#",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

fn default_attribute_type() -> String {
    "String".to_string()
}

fn default_return_type() -> String {
    "void".to_string()
}

const fn default_confidence() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    #[serde(rename = "type", default = "default_attribute_type")]
    pub type_name: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_static: bool,
}

impl Attribute {
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            visibility: Visibility::Public,
            is_static: false,
        }
    }

    #[must_use]
    pub const fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    #[must_use]
    pub const fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<String>,
    #[serde(default = "default_return_type")]
    pub return_type: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_static: bool,
}

impl Method {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            return_type: default_return_type(),
            visibility: Visibility::Public,
            is_static: false,
        }
    }

    #[must_use]
    pub fn with_parameters(mut self, parameters: Vec<String>) -> Self {
        self.parameters = parameters;
        self
    }

    #[must_use]
    pub fn with_return_type(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = return_type.into();
        self
    }

    #[must_use]
    pub const fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    #[must_use]
    pub const fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A class in the design model. The name is the model's lookup key, so it
/// can only change through [`DesignModel::rename_class`](super::DesignModel::rename_class).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignClass {
    name: String,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub methods: Vec<Method>,
    #[serde(default)]
    pub position: Point,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

impl DesignClass {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            methods: Vec::new(),
            position: Point::default(),
            confidence: 1.0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[must_use]
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    #[must_use]
    pub const fn with_position(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.attributes.iter().any(|a| a.name.to_lowercase() == name)
    }

    pub fn has_method(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.methods.iter().any(|m| m.name.to_lowercase() == name)
    }

    /// Appends unless an attribute with the same name (ignoring case) exists.
    pub fn add_attribute(&mut self, attribute: Attribute) -> bool {
        if self.has_attribute(&attribute.name) {
            return false;
        }
        self.attributes.push(attribute);
        true
    }

    /// Appends unless a method with the same name (ignoring case) exists.
    pub fn add_method(&mut self, method: Method) -> bool {
        if self.has_method(&method.name) {
            return false;
        }
        self.methods.push(method);
        true
    }

    /// Takes members of `other` that are not already present field-for-field.
    pub(crate) fn absorb(&mut self, other: Self) {
        for attribute in other.attributes {
            if !self.attributes.contains(&attribute) {
                self.attributes.push(attribute);
            }
        }
        for method in other.methods {
            if !self.methods.contains(&method) {
                self.methods.push(method);
            }
        }
    }

    /// Drops later members whose names repeat an earlier one, ignoring case.
    pub fn dedupe_members(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.attributes.retain(|a| seen.insert(a.name.to_lowercase()));
        seen.clear();
        self.methods.retain(|m| seen.insert(m.name.to_lowercase()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_wire_format() {
        assert_eq!(serde_json::to_string(&Visibility::Private).unwrap(), "\"-\"");
        let parsed: Visibility = serde_json::from_str("\"protected\"").unwrap();
        assert_eq!(parsed, Visibility::Protected);
        let parsed: Visibility = serde_json::from_str("\"#\"").unwrap();
        assert_eq!(parsed, Visibility::Protected);
    }

    #[test]
    fn test_attribute_defaults() {
        let attribute: Attribute = serde_json::from_str(r#"{"name": "title"}"#).unwrap();
        assert_eq!(attribute.type_name, "String");
        assert_eq!(attribute.visibility, Visibility::Public);
        assert!(!attribute.is_static);
    }

    #[test]
    fn test_method_defaults() {
        let method: Method = serde_json::from_str(r#"{"name": "save"}"#).unwrap();
        assert_eq!(method.return_type, "void");
        assert!(method.parameters.is_empty());
    }

    #[test]
    fn test_class_defaults() {
        let class: DesignClass = serde_json::from_str(r#"{"name": "Order"}"#).unwrap();
        assert_eq!(class.name(), "Order");
        assert!((class.confidence - 1.0).abs() < f64::EPSILON);
        assert_eq!(class.position, Point::default());
    }

    #[test]
    fn test_add_attribute_ignores_case_duplicates() {
        let mut class = DesignClass::new("User");
        assert!(class.add_attribute(Attribute::new("email", "String")));
        assert!(!class.add_attribute(Attribute::new("Email", "String")));
        assert_eq!(class.attributes.len(), 1);
    }

    #[test]
    fn test_dedupe_members_keeps_first() {
        let mut class = DesignClass::new("User")
            .with_attribute(Attribute::new("id", "Integer"))
            .with_attribute(Attribute::new("ID", "String"))
            .with_method(Method::new("save"))
            .with_method(Method::new("Save").with_return_type("Boolean"));
        class.dedupe_members();

        assert_eq!(class.attributes.len(), 1);
        assert_eq!(class.attributes[0].type_name, "Integer");
        assert_eq!(class.methods.len(), 1);
        assert_eq!(class.methods[0].return_type, "void");
    }
}
