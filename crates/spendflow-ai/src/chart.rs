//! Chart directive extraction from completed model responses.
//!
//! The analyst prompt instructs the model to end a response with a directive
//! of the form `[CHART:pie|Spending by Category|[{"name":"Food","value":500}]]`
//! when a visualization helps. The directive can be split across any number of
//! streamed fragments, so scanning runs only once the full response text has
//! accumulated. Extraction is a side read: the directive's literal text stays
//! in the prose the client already received.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Supported chart shapes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Pie,
    Bar,
}

/// One labeled value in a chart payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartPoint {
    pub name: String,
    pub value: f64,
}

/// A structured chart specification decoded from a directive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub data: Vec<ChartPoint>,
}

// Non-greedy so one response never consumes multiple bracket pairs as a single
// directive. The payload group requires the leading `[` of the JSON array and
// stops at the first `]`, leaving the directive's own closing bracket to the
// final literal.
static CHART_DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[CHART:(pie|bar)\|(.*?)\|(\[.*?\])\]").expect("chart directive pattern")
});

/// Scan a complete response for one embedded chart directive.
///
/// Returns `None` when no directive is present or its payload fails to decode;
/// a bad payload is never fatal to the response that carried it.
pub fn extract_chart(text: &str) -> Option<ChartSpec> {
    let captures = CHART_DIRECTIVE.captures(text)?;

    let kind = match &captures[1] {
        "pie" => ChartKind::Pie,
        "bar" => ChartKind::Bar,
        _ => return None,
    };

    let data: Vec<ChartPoint> = match serde_json::from_str(&captures[3]) {
        Ok(data) => data,
        Err(e) => {
            tracing::debug!("chart directive payload failed to decode: {}", e);
            return None;
        }
    };

    Some(ChartSpec {
        kind,
        title: captures[2].to_string(),
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_pie_directive_at_end_of_response() {
        let text = "Here is your breakdown.\n\
                    [CHART:pie|Spending by Category|[{\"name\":\"Food\",\"value\":500}]]";

        let spec = extract_chart(text).unwrap();
        assert_eq!(spec.kind, ChartKind::Pie);
        assert_eq!(spec.title, "Spending by Category");
        assert_eq!(
            spec.data,
            vec![ChartPoint {
                name: "Food".to_string(),
                value: 500.0
            }]
        );
    }

    #[test]
    fn test_extracts_bar_directive_with_multiple_points() {
        let text = "[CHART:bar|Daily Spend|[{\"name\":\"Mon\",\"value\":12.5},{\"name\":\"Tue\",\"value\":30}]]";

        let spec = extract_chart(text).unwrap();
        assert_eq!(spec.kind, ChartKind::Bar);
        assert_eq!(spec.data.len(), 2);
        assert_eq!(spec.data[1].value, 30.0);
    }

    #[test]
    fn test_malformed_payload_yields_none() {
        let text = "[CHART:pie|Broken|[{\"name\":}]]";
        assert!(extract_chart(text).is_none());
    }

    #[test]
    fn test_unknown_kind_does_not_match() {
        let text = "[CHART:scatter|Nope|[{\"name\":\"a\",\"value\":1}]]";
        assert!(extract_chart(text).is_none());
    }

    #[test]
    fn test_no_directive_yields_none() {
        assert!(extract_chart("Just plain prose about spending.").is_none());
    }

    #[test]
    fn test_directive_mid_text_is_found() {
        let text = "Before. [CHART:pie|T|[{\"name\":\"a\",\"value\":1}]] After.";
        let spec = extract_chart(text).unwrap();
        assert_eq!(spec.title, "T");
    }

    #[test]
    fn test_only_first_directive_is_used() {
        let text = "[CHART:pie|First|[{\"name\":\"a\",\"value\":1}]] \
                    [CHART:bar|Second|[{\"name\":\"b\",\"value\":2}]]";
        let spec = extract_chart(text).unwrap();
        assert_eq!(spec.title, "First");
        assert_eq!(spec.kind, ChartKind::Pie);
    }

    #[test]
    fn test_serializes_with_lowercase_kind() {
        let spec = ChartSpec {
            kind: ChartKind::Pie,
            title: "T".to_string(),
            data: vec![],
        };
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["kind"], "pie");
    }
}
