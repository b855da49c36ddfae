use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::{Attribute, DesignClass, DesignModel, DesignRelationship, Method, RelationshipKind};

pub const PREAMBLE: &str = "classDiagram";
pub const EMPTY_NOTE: &str = "note \"No classes found\"";
const INDENT: &str = "    ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LayoutDirection {
    #[default]
    #[serde(rename = "TB")]
    TopToBottom,
    #[serde(rename = "BT")]
    BottomToTop,
    #[serde(rename = "LR")]
    LeftToRight,
    #[serde(rename = "RL")]
    RightToLeft,
}

impl LayoutDirection {
    pub const ALL: [Self; 4] = [
        Self::TopToBottom,
        Self::BottomToTop,
        Self::LeftToRight,
        Self::RightToLeft,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TopToBottom => "TB",
            Self::BottomToTop => "BT",
            Self::LeftToRight => "LR",
            Self::RightToLeft => "RL",
        }
    }
}

impl fmt::Display for LayoutDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutDirection {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| crate::Error::InvalidDirection(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    #[serde(default)]
    pub direction: Option<LayoutDirection>,
    #[serde(default)]
    pub mark_static: bool,
}

impl RenderOptions {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            direction: None,
            mark_static: false,
        }
    }

    #[must_use]
    pub const fn with_direction(mut self, direction: LayoutDirection) -> Self {
        self.direction = Some(direction);
        self
    }

    #[must_use]
    pub const fn with_mark_static(mut self, mark_static: bool) -> Self {
        self.mark_static = mark_static;
        self
    }
}

pub const fn connector(kind: RelationshipKind) -> &'static str {
    match kind {
        RelationshipKind::Composition => "*--",
        RelationshipKind::Aggregation => "o--",
        RelationshipKind::Association => "-->",
        RelationshipKind::Inheritance => "--|>",
    }
}

/// Replaces anything outside `[A-Za-z0-9_]` with `_` and prefixes a leading
/// digit with `_`.
pub fn sanitize_identifier(name: &str) -> String {
    let mut id: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if id.is_empty() || id.starts_with(|c: char| c.is_ascii_digit()) {
        id.insert(0, '_');
    }
    id
}

/// Collapses whitespace runs to one space and drops braces and double quotes,
/// so free text stays on one line and cannot open or close a class body.
pub fn sanitize_text(text: &str) -> String {
    text.split_whitespace()
        .map(|word| word.replace(['{', '}', '"'], ""))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders a [`DesignModel`] as Mermaid `classDiagram` source.
#[derive(Debug, Clone, Copy, Default)]
pub struct MermaidRenderer {
    options: RenderOptions,
}

impl MermaidRenderer {
    #[must_use]
    pub const fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub const fn options(&self) -> RenderOptions {
        self.options
    }

    pub fn render(&self, model: &DesignModel) -> String {
        let mut out = String::from(PREAMBLE);
        out.push('\n');
        if let Some(direction) = self.options.direction {
            line(&mut out, 1, &format!("direction {direction}"));
        }

        if model.is_empty() {
            line(&mut out, 1, EMPTY_NOTE);
            return out;
        }

        for class in model.classes() {
            self.write_class(&mut out, class);
        }
        for relationship in model.relationships() {
            line(&mut out, 1, &relationship_line(relationship));
        }
        out
    }

    fn write_class(&self, out: &mut String, class: &DesignClass) {
        let id = sanitize_identifier(class.name());
        if class.attributes.is_empty() && class.methods.is_empty() {
            line(out, 1, &format!("class {id}"));
            return;
        }
        line(out, 1, &format!("class {id} {{"));
        for attribute in &class.attributes {
            line(out, 2, &self.attribute_line(attribute));
        }
        for method in &class.methods {
            line(out, 2, &self.method_line(method));
        }
        line(out, 1, "}");
    }

    fn attribute_line(&self, attribute: &Attribute) -> String {
        let mut text = format!(
            "{}{}: {}",
            attribute.visibility,
            sanitize_text(&attribute.name),
            sanitize_text(&attribute.type_name)
        );
        if self.options.mark_static && attribute.is_static {
            text.push('$');
        }
        text
    }

    fn method_line(&self, method: &Method) -> String {
        let parameters: Vec<String> = method
            .parameters
            .iter()
            .map(|p| sanitize_text(p))
            .filter(|p| !p.is_empty())
            .collect();
        let mut text = format!(
            "{}{}({}): {}",
            method.visibility,
            sanitize_text(&method.name),
            parameters.join(", "),
            sanitize_text(&method.return_type)
        );
        if self.options.mark_static && method.is_static {
            text.push('$');
        }
        text
    }
}

fn relationship_line(relationship: &DesignRelationship) -> String {
    let mut parts = vec![sanitize_identifier(relationship.source())];
    let source_multiplicity = sanitize_text(&relationship.multiplicity_source);
    if !source_multiplicity.is_empty() {
        parts.push(format!("\"{source_multiplicity}\""));
    }
    parts.push(connector(relationship.kind).to_string());
    let target_multiplicity = sanitize_text(&relationship.multiplicity_target);
    if !target_multiplicity.is_empty() {
        parts.push(format!("\"{target_multiplicity}\""));
    }
    parts.push(sanitize_identifier(relationship.target()));

    let mut text = parts.join(" ");
    let label = sanitize_text(&relationship.label);
    if !label.is_empty() {
        text.push_str(" : ");
        text.push_str(&label);
    }
    text
}

fn line(out: &mut String, depth: usize, text: &str) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    out.push_str(text);
    out.push('\n');
}
