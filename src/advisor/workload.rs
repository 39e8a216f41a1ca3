//! Workload compression
//!
//! A raw statement log is reduced to a handful of weighted representative
//! statements per query template. Templates are built by rewriting literal
//! values to a placeholder; each template keeps a bounded reservoir of raw
//! statements and the total number of occurrences it stands for.

use super::{contains_keyword, Statement, Workload};
use crate::error::Result;
use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use std::collections::HashMap;
use std::io::BufRead;
use tracing::debug;

/// Token substituted for every literal value in a template
pub const PLACEHOLDER: &str = "@@@";

/// Statement verbs a log line must contain to be kept
const DML_KEYWORDS: [&str; 4] = ["select", "delete", "insert", "update"];

lazy_static! {
    /// Literal rewrite rules, applied in this order. The numeric rule appears
    /// twice: a delimiter consumed by one match cannot start the next one.
    static ref LITERAL_RULES: Vec<(Regex, &'static str)> = {
        let rules: [(&str, &'static str); 5] = [
            (r#"([^\\])'((')|(.*?([^\\])'))"#, "${1}@@@"),
            (r#"([^\\])"((")|(.*?([^\\])"))"#, "${1}@@@"),
            (r"([^a-zA-Z])-?\d+(\.\d+)?", "${1}@@@"),
            (r"([^a-zA-Z])-?\d+(\.\d+)?", "${1}@@@"),
            (r"('\d+\\.*?')", "@@@"),
        ];
        rules
            .into_iter()
            .map(|(pattern, replacement)| (Regex::new(pattern).expect("valid literal rule"), replacement))
            .collect()
    };
}

/// Read a raw statement log into `(statement, occurrences)` pairs
///
/// Each line is trimmed of line breaks and statement terminators; lines without
/// a DML verb are ignored. Pairs come out in first-seen order.
pub fn load_workload<R: BufRead>(reader: R) -> Result<Vec<(String, u64)>> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut statements: Vec<(String, u64)> = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let sql = line.trim_matches(|c| c == '\n' || c == '\r' || c == ';');
        if sql.trim().is_empty() || !DML_KEYWORDS.iter().any(|kw| contains_keyword(sql, kw)) {
            continue;
        }

        match positions.get(sql) {
            Some(&pos) => statements[pos].1 += 1,
            None => {
                positions.insert(sql.to_string(), statements.len());
                statements.push((sql.to_string(), 1));
            }
        }
    }

    Ok(statements)
}

/// Replace literal values in `sql` with [`PLACEHOLDER`]
pub fn templatize(sql: &str) -> String {
    LITERAL_RULES
        .iter()
        .fold(sql.to_string(), |text, (rule, replacement)| {
            rule.replace_all(&text, *replacement).into_owned()
        })
}

/// Statements sharing one template
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateGroup {
    pub template: String,
    /// Occurrences of every statement mapped to this template
    pub total: u64,
    /// Reservoir of representative raw statements
    pub samples: Vec<String>,
}

/// Template grouping plus weighted reservoir sampling
#[derive(Debug, Clone, Copy)]
pub struct WorkloadCompressor {
    sample_size: usize,
}

impl WorkloadCompressor {
    pub fn new(sample_size: usize) -> Self {
        Self {
            sample_size: sample_size.max(1),
        }
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Group `(statement, occurrences)` pairs by template, in first-seen order
    ///
    /// Once a reservoir is full, a new statement replaces a random sample when a
    /// draw from `0..=total` falls below the sample size, so heavy templates
    /// rotate their samples less often.
    pub fn group_templates<G: Rng>(&self, raw: &[(String, u64)], rng: &mut G) -> Vec<TemplateGroup> {
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<TemplateGroup> = Vec::new();

        for (sql, count) in raw {
            let template = templatize(sql);
            let pos = *positions.entry(template.clone()).or_insert_with(|| {
                groups.push(TemplateGroup {
                    template,
                    total: 0,
                    samples: Vec::with_capacity(self.sample_size),
                });
                groups.len() - 1
            });

            let group = &mut groups[pos];
            group.total += count;

            if group.samples.len() < self.sample_size {
                group.samples.push(sql.clone());
            } else if rng.random_range(0..=group.total) < self.sample_size as u64 {
                let slot = rng.random_range(0..self.sample_size);
                group.samples[slot] = sql.clone();
            }
        }

        groups
    }

    /// Compress raw pairs into a workload of weighted samples
    ///
    /// Every sample of a template carries `total / sample_size` as frequency.
    pub fn compress<G: Rng>(&self, raw: &[(String, u64)], rng: &mut G) -> Workload {
        let groups = self.group_templates(raw, rng);
        let sample_size = self.sample_size as f64;

        let statements: Vec<Statement> = groups
            .iter()
            .flat_map(|group| {
                let frequency = group.total as f64 / sample_size;
                group
                    .samples
                    .iter()
                    .map(move |sql| Statement::new(sql.clone(), frequency))
            })
            .collect();

        debug!(
            templates = groups.len(),
            samples = statements.len(),
            "Templates grouped"
        );
        Workload::from_statements(statements)
    }
}
