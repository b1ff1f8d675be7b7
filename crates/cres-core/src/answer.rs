//! Answer types produced by the workflow

use serde::{Deserialize, Serialize};

/// The extracted value of a company metric.
///
/// Numeric values are kept as numbers; anything the model cannot reduce to a
/// number (ranges, "not disclosed", currencies with footnotes) stays text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Text(String),
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricValue::Number(n) => write!(f, "{}", n),
            MetricValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Structured answer for one (company, metric) pair; immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyMetric {
    /// The extracted metric value, in full numeric form where possible
    pub value: MetricValue,
    /// Sources and explanation backing the value
    pub comment: String,
}

/// Latest generation held in session state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Generation {
    /// Nothing generated yet
    Empty,
    /// Free-text answer
    Text { text: String },
    /// Structured company-metric answer
    Metric { metric: CompanyMetric },
}

impl Generation {
    /// Render the generation as prompt-ready text
    pub fn as_text(&self) -> String {
        match self {
            Generation::Empty => String::new(),
            Generation::Text { text } => text.clone(),
            Generation::Metric { metric } => {
                format!("value: {}\ncomment: {}", metric.value, metric.comment)
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Generation::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_value_untagged_parsing() {
        let n: MetricValue = serde_json::from_str("120000000").unwrap();
        assert_eq!(n, MetricValue::Number(120000000.0));

        let s: MetricValue = serde_json::from_str("\"not disclosed\"").unwrap();
        assert_eq!(s, MetricValue::Text("not disclosed".to_string()));
    }

    #[test]
    fn test_generation_as_text() {
        let r#gen = Generation::Metric {
            metric: CompanyMetric {
                value: MetricValue::Number(42.0),
                comment: "From the annual report".to_string(),
            },
        };
        let text = r#gen.as_text();
        assert!(text.contains("42"));
        assert!(text.contains("annual report"));
        assert!(Generation::Empty.as_text().is_empty());
    }
}
