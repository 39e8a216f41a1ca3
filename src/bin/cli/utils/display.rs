//! Display and output utilities for CLI commands
//!
//! Text and JSON presentation helpers.

use lightning_advisor::{Recommendation, RecommendedIndex};
use std::time::Duration;

/// Format a planner cost with a thousands-friendly precision
pub fn format_cost(cost: f64) -> String {
    if cost.abs() >= 1_000_000.0 {
        format!("{:.3e}", cost)
    } else {
        format!("{:.2}", cost)
    }
}

/// Format duration in human-readable form
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 0.001 {
        format!("{} μs", duration.as_micros())
    } else if secs < 1.0 {
        format!("{} ms", duration.as_millis())
    } else if secs < 60.0 {
        format!("{:.2} s", secs)
    } else {
        format!("{:.1} min", secs / 60.0)
    }
}

/// Percentage reduction from `before` to `after`
pub fn reduction_percent(before: f64, after: f64) -> f64 {
    if before <= 0.0 {
        0.0
    } else {
        (before - after) / before * 100.0
    }
}

pub fn print_success(message: &str) {
    println!("[OK] {}", message);
}

pub fn print_info(message: &str) {
    println!("[INFO] {}", message);
}

pub fn print_warning(message: &str) {
    println!("[WARN] {}", message);
}

pub fn print_separator(width: usize) {
    println!("{}", "=".repeat(width));
}

/// Section header in the style of the advisor report
pub fn print_header(title: &str) {
    let width: usize = 60;
    let pad = width.saturating_sub(title.len() + 2) / 2;
    println!("{} {} {}", "#".repeat(pad), title, "#".repeat(pad));
}

fn describe_index(index: &RecommendedIndex) -> String {
    format!("{}({})", index.table, index.columns.join(","))
}

/// Render a recommendation as text
pub fn print_recommendation(recommendation: &Recommendation) {
    print_header("Determine optimal indexes");

    for statement in recommendation.create_statements() {
        println!("{}", statement);
    }

    println!();
    println!("  Strategy:          {:?}", recommendation.strategy);
    println!("  Candidates:        {}", recommendation.candidate_count);
    if recommendation.atomic_config_count > 0 {
        println!("  Atomic configs:    {}", recommendation.atomic_config_count);
    }
    if let Some(baseline) = recommendation.baseline_cost {
        println!("  Baseline cost:     {}", format_cost(baseline));
    }
    if let (Some(baseline), Some(estimated)) =
        (recommendation.baseline_cost, recommendation.estimated_cost)
    {
        println!(
            "  Estimated cost:    {} ({:.1}% lower)",
            format_cost(estimated),
            reduction_percent(baseline, estimated)
        );
    }
    println!(
        "  Elapsed:           {}",
        format_duration(Duration::from_millis(recommendation.elapsed_ms))
    );

    if !recommendation.greedy_trace.is_empty() {
        println!();
        println!("  Round  Index                          Cost         Improvement");
        for round in &recommendation.greedy_trace {
            println!(
                "  {:<5}  {:<30} {:<12} {}",
                round.round,
                format!("{}({})", round.table, round.columns.join(",")),
                format_cost(round.cost),
                format_cost(round.improvement)
            );
        }
    }

    if !recommendation.ranked_candidates.is_empty() {
        println!();
        println!("  Candidate                      Benefit");
        for index in &recommendation.ranked_candidates {
            println!("  {:<30} {}", describe_index(index), format_cost(index.benefit));
        }
    }
}

// ============================================================================
// JSON Output Support
// ============================================================================

/// JSON output builder for structured CLI output
#[derive(Debug, Clone, Default)]
pub struct JsonOutput {
    fields: serde_json::Map<String, serde_json::Value>,
}

impl JsonOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_str(&mut self, key: &str, value: &str) -> &mut Self {
        self.fields
            .insert(key.to_string(), serde_json::Value::String(value.to_string()));
        self
    }

    pub fn add_uint(&mut self, key: &str, value: u64) -> &mut Self {
        self.fields.insert(key.to_string(), serde_json::Value::from(value));
        self
    }

    /// Non-finite floats are skipped; JSON cannot represent them
    pub fn add_float(&mut self, key: &str, value: f64) -> &mut Self {
        if let Some(num) = serde_json::Number::from_f64(value) {
            self.fields.insert(key.to_string(), serde_json::Value::Number(num));
        }
        self
    }

    pub fn add_bool(&mut self, key: &str, value: bool) -> &mut Self {
        self.fields.insert(key.to_string(), serde_json::Value::Bool(value));
        self
    }

    pub fn add_string_array(&mut self, key: &str, values: &[String]) -> &mut Self {
        let array = values.iter().cloned().map(serde_json::Value::String).collect();
        self.fields.insert(key.to_string(), serde_json::Value::Array(array));
        self
    }

    /// Add any serializable value
    pub fn add_value<T: serde::Serialize>(&mut self, key: &str, value: &T) -> &mut Self {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.fields.insert(key.to_string(), value);
            }
            Err(e) => {
                self.fields
                    .insert(key.to_string(), serde_json::Value::String(format!("<unserializable: {}>", e)));
            }
        }
        self
    }

    /// Set the status field (common for all responses)
    pub fn status(&mut self, success: bool) -> &mut Self {
        self.add_str("status", if success { "success" } else { "error" })
    }

    pub fn error(&mut self, message: &str) -> &mut Self {
        self.add_str("status", "error");
        self.add_str("error", message)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&serde_json::Value::Object(self.fields.clone()))
            .unwrap_or_else(|_| "{}".to_string())
    }

    pub fn print(&self) {
        println!("{}", self.to_json());
    }
}

/// Create an error JSON response
pub fn json_error(message: &str) -> JsonOutput {
    let mut output = JsonOutput::new();
    output.error(message);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cost() {
        assert_eq!(format_cost(85.0), "85.00");
        assert_eq!(format_cost(1234.567), "1234.57");
        assert!(format_cost(2.5e7).contains('e'));
    }

    #[test]
    fn test_reduction_percent() {
        assert!((reduction_percent(350.0, 85.0) - 75.714).abs() < 0.01);
        assert_eq!(reduction_percent(0.0, 10.0), 0.0);
    }

    #[test]
    fn test_format_duration() {
        assert!(format_duration(Duration::from_micros(500)).contains("μs"));
        assert!(format_duration(Duration::from_millis(50)).contains("ms"));
        assert!(format_duration(Duration::from_secs(120)).contains("min"));
    }

    #[test]
    fn test_json_output() {
        let mut output = JsonOutput::new();
        output
            .status(true)
            .add_uint("samples", 3)
            .add_bool("iterative", false)
            .add_float("cost", f64::NAN);
        let json: serde_json::Value = serde_json::from_str(&output.to_json()).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["samples"], 3);
        assert_eq!(json["iterative"], false);
        assert!(json.get("cost").is_none());
    }

    #[test]
    fn test_json_error() {
        let json: serde_json::Value = serde_json::from_str(&json_error("boom").to_json()).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "boom");
    }
}
