use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::DesignModel;

const LARGE_DIAGRAM_CLASSES: usize = 15;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    #[default]
    Simple,
    Medium,
    Complex,
}

impl Complexity {
    pub const fn classify(classes: usize, relationships: usize) -> Self {
        if classes > 10 || relationships > 15 {
            Self::Complex
        } else if classes > 5 || relationships > 7 {
            Self::Medium
        } else {
            Self::Simple
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Medium => "medium",
            Self::Complex => "complex",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCounts {
    pub total: usize,
    pub with_attributes: usize,
    pub with_methods: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipCounts {
    pub total: usize,
    pub by_type: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramStatistics {
    pub classes: ClassCounts,
    pub relationships: RelationshipCounts,
    pub complexity: Complexity,
}

impl DiagramStatistics {
    pub fn of(model: &DesignModel) -> Self {
        let classes = ClassCounts {
            total: model.classes().len(),
            with_attributes: model
                .classes()
                .iter()
                .filter(|c| !c.attributes.is_empty())
                .count(),
            with_methods: model
                .classes()
                .iter()
                .filter(|c| !c.methods.is_empty())
                .count(),
        };

        let mut by_type = BTreeMap::new();
        for rel in model.relationships() {
            *by_type.entry(rel.kind.as_str().to_string()).or_insert(0) += 1;
        }
        let relationships = RelationshipCounts {
            total: model.relationships().len(),
            by_type,
        };

        Self {
            complexity: Complexity::classify(classes.total, relationships.total),
            classes,
            relationships,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeCounts {
    pub total: usize,
    pub types: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodCounts {
    pub total: usize,
    pub return_types: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedStatistics {
    #[serde(flatten)]
    pub summary: DiagramStatistics,
    pub attributes: AttributeCounts,
    pub methods: MethodCounts,
}

impl DetailedStatistics {
    pub fn of(model: &DesignModel) -> Self {
        let mut attributes = AttributeCounts::default();
        let mut methods = MethodCounts::default();
        for class in model.classes() {
            for attribute in &class.attributes {
                attributes.total += 1;
                *attributes
                    .types
                    .entry(attribute.type_name.clone())
                    .or_insert(0) += 1;
            }
            for method in &class.methods {
                methods.total += 1;
                *methods
                    .return_types
                    .entry(method.return_type.clone())
                    .or_insert(0) += 1;
            }
        }

        Self {
            summary: DiagramStatistics::of(model),
            attributes,
            methods,
        }
    }

    /// 20 points each for classes, attributes, methods and relationships,
    /// plus 20 when attributes, methods and relationships all appear.
    pub fn quality_score(&self) -> u32 {
        let has_classes = self.summary.classes.total > 0;
        let has_attributes = self.attributes.total > 0;
        let has_methods = self.methods.total > 0;
        let has_relationships = self.summary.relationships.total > 0;

        let mut score = [has_classes, has_attributes, has_methods, has_relationships]
            .into_iter()
            .filter(|present| *present)
            .count() as u32
            * 20;
        if has_attributes && has_methods && has_relationships {
            score += 20;
        }
        score.min(100)
    }

    pub fn recommendations(&self) -> Vec<String> {
        let classes = &self.summary.classes;
        let mut out = Vec::new();

        match classes.total {
            0 => out.push("Add at least one class to start building your diagram".to_string()),
            1 => out.push(
                "Consider adding more classes to show relationships and system structure"
                    .to_string(),
            ),
            n if n > LARGE_DIAGRAM_CLASSES => out.push(
                "Large number of classes detected - consider breaking into multiple diagrams"
                    .to_string(),
            ),
            _ => {}
        }
        if self.summary.relationships.total == 0 && classes.total > 1 {
            out.push("Add relationships between classes to show how they interact".to_string());
        }
        if classes.with_attributes == 0 {
            out.push("Add attributes to classes to define their properties and data".to_string());
        }
        if classes.with_methods == 0 {
            out.push("Add methods to classes to define their behavior and operations".to_string());
        }
        out
    }
}

/// Detailed statistics with their derived score and advice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsReport {
    pub statistics: DetailedStatistics,
    pub complexity: Complexity,
    pub recommendations: Vec<String>,
    pub quality_score: u32,
}

impl StatisticsReport {
    pub fn of(model: &DesignModel) -> Self {
        let statistics = DetailedStatistics::of(model);
        Self {
            complexity: statistics.summary.complexity,
            recommendations: statistics.recommendations(),
            quality_score: statistics.quality_score(),
            statistics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Attribute, DesignClass, DesignRelationship, Method, RelationshipKind};

    fn shop() -> DesignModel {
        let mut model = DesignModel::new();
        model.add_class(
            DesignClass::new("Customer")
                .with_attribute(Attribute::new("name", "String"))
                .with_attribute(Attribute::new("id", "Integer")),
        );
        model.add_class(
            DesignClass::new("Order")
                .with_attribute(Attribute::new("total", "Float"))
                .with_method(Method::new("ship")),
        );
        model.add_class(DesignClass::new("Product"));
        model.add_relationship(DesignRelationship::new(
            "Customer",
            "Order",
            RelationshipKind::Aggregation,
        ));
        model.add_relationship(DesignRelationship::new(
            "Order",
            "Product",
            RelationshipKind::Association,
        ));
        model.add_relationship(DesignRelationship::new(
            "Customer",
            "Product",
            RelationshipKind::Association,
        ));
        model
    }

    #[test]
    fn test_complexity_thresholds() {
        assert_eq!(Complexity::classify(5, 7), Complexity::Simple);
        assert_eq!(Complexity::classify(6, 0), Complexity::Medium);
        assert_eq!(Complexity::classify(0, 8), Complexity::Medium);
        assert_eq!(Complexity::classify(11, 0), Complexity::Complex);
        assert_eq!(Complexity::classify(2, 16), Complexity::Complex);
    }

    #[test]
    fn test_summary_counts() {
        let stats = DiagramStatistics::of(&shop());
        assert_eq!(stats.classes.total, 3);
        assert_eq!(stats.classes.with_attributes, 2);
        assert_eq!(stats.classes.with_methods, 1);
        assert_eq!(stats.relationships.by_type["association"], 2);
        assert_eq!(stats.relationships.by_type["aggregation"], 1);
        assert_eq!(stats.complexity, Complexity::Simple);
    }

    #[test]
    fn test_detailed_counts_and_score() {
        let stats = DetailedStatistics::of(&shop());
        assert_eq!(stats.attributes.total, 3);
        assert_eq!(stats.attributes.types["Integer"], 1);
        assert_eq!(stats.methods.return_types["void"], 1);
        assert_eq!(stats.quality_score(), 100);
        assert!(stats.recommendations().is_empty());
    }

    #[test]
    fn test_score_without_methods() {
        let mut model = DesignModel::new();
        model.add_class(DesignClass::new("A").with_attribute(Attribute::new("x", "String")));
        let stats = DetailedStatistics::of(&model);
        assert_eq!(stats.quality_score(), 40);
        let advice = stats.recommendations();
        assert_eq!(advice.len(), 2);
        assert!(advice[1].contains("methods"));
    }

    #[test]
    fn test_flattened_wire_shape() {
        let report = StatisticsReport::of(&DesignModel::new());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["statistics"]["classes"]["total"], 0);
        assert_eq!(json["statistics"]["methods"]["total"], 0);
        assert_eq!(json["complexity"], "simple");
        assert_eq!(json["quality_score"], 0);
    }
}
