//! Aggregation pipelines and their in-process evaluator.
//!
//! A pipeline is an ordered list of stages applied to a document set:
//! match, project, group, sort and limit. Backends without a native
//! aggregation engine run pipelines through [`Pipeline::evaluate`].

use chrono::Timelike;
use serde_json::{Map, Number, Value};
use std::collections::HashMap;

use super::query::{compare_values, lookup, sort_documents, ReadingFilter, SortSpec};
use crate::models::{fahrenheit_to_celsius, parse_timestamp, round_to, Document};

/// Expression evaluated against one document
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Value at a (possibly dotted) field path
    Field(String),
    /// Constant value
    Literal(Value),
    /// `temperature` converted to Celsius when `unit` is `F`
    CelsiusTemperature,
    /// UTC hour of day of an RFC 3339 timestamp field
    HourOf(String),
    /// Numeric value rounded to a number of decimals
    Round(Box<Expr>, u32),
}

impl Expr {
    pub fn field(path: impl Into<String>) -> Self {
        Expr::Field(path.into())
    }

    pub fn round(expr: Expr, decimals: u32) -> Self {
        Expr::Round(Box::new(expr), decimals)
    }

    /// Evaluate against a document. `None` means the value is missing.
    pub fn eval(&self, doc: &Document) -> Option<Value> {
        match self {
            Expr::Field(path) => lookup(doc, path).cloned(),
            Expr::Literal(value) => Some(value.clone()),
            Expr::CelsiusTemperature => {
                let temperature = doc.get("temperature");
                let is_fahrenheit = doc.get("unit").and_then(Value::as_str) == Some("F");
                if is_fahrenheit {
                    let converted = temperature
                        .and_then(Value::as_f64)
                        .map(fahrenheit_to_celsius)
                        .and_then(number);
                    Some(converted.unwrap_or(Value::Null))
                } else {
                    temperature.cloned()
                }
            }
            Expr::HourOf(path) => {
                let hour = lookup(doc, path)
                    .and_then(Value::as_str)
                    .and_then(parse_timestamp)
                    .map(|ts| Value::from(ts.hour()));
                Some(hour.unwrap_or(Value::Null))
            }
            Expr::Round(inner, decimals) => {
                let value = inner.eval(doc)?;
                match value.as_f64() {
                    Some(v) => Some(number(round_to(v, *decimals)).unwrap_or(Value::Null)),
                    None => Some(Value::Null),
                }
            }
        }
    }
}

fn number(value: f64) -> Option<Value> {
    Number::from_f64(value).map(Value::Number)
}

/// Per-group accumulator
#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    /// Mean of the numeric values; null when there are none
    Avg(Expr),
    /// Smallest non-null value
    Min(Expr),
    /// Largest non-null value
    Max(Expr),
    /// Sum of the numeric values
    Sum(Expr),
    /// Value from the first document the group encounters
    First(Expr),
    /// Number of documents in the group
    Count,
}

/// Grouping key
#[derive(Debug, Clone, PartialEq)]
pub enum GroupKey {
    /// Single expression, stored as a scalar `_id`
    Single(Expr),
    /// Named expressions, stored as an object `_id`
    Composite(Vec<(String, Expr)>),
}

impl GroupKey {
    fn eval(&self, doc: &Document) -> Value {
        match self {
            GroupKey::Single(expr) => expr.eval(doc).unwrap_or(Value::Null),
            GroupKey::Composite(parts) => {
                let mut key = Map::new();
                for (name, expr) in parts {
                    key.insert(name.clone(), expr.eval(doc).unwrap_or(Value::Null));
                }
                Value::Object(key)
            }
        }
    }
}

/// One pipeline stage
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Match(ReadingFilter),
    /// Replace each document with the listed fields; missing values are omitted
    Project(Vec<(String, Expr)>),
    Group {
        key: GroupKey,
        accumulators: Vec<(String, Accumulator)>,
    },
    /// Stable sort
    Sort(Vec<SortSpec>),
    Limit(usize),
}

/// Ordered list of stages
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn matching(mut self, filter: ReadingFilter) -> Self {
        self.stages.push(Stage::Match(filter));
        self
    }

    pub fn project<S: Into<String>>(mut self, fields: Vec<(S, Expr)>) -> Self {
        self.stages.push(Stage::Project(
            fields.into_iter().map(|(name, expr)| (name.into(), expr)).collect(),
        ));
        self
    }

    pub fn group<S: Into<String>>(mut self, key: GroupKey, accumulators: Vec<(S, Accumulator)>) -> Self {
        self.stages.push(Stage::Group {
            key,
            accumulators: accumulators
                .into_iter()
                .map(|(name, acc)| (name.into(), acc))
                .collect(),
        });
        self
    }

    pub fn sort(mut self, keys: Vec<SortSpec>) -> Self {
        self.stages.push(Stage::Sort(keys));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.stages.push(Stage::Limit(limit));
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Filter of a leading match stage, which a backend may push down into its scan
    pub fn leading_filter(&self) -> Option<&ReadingFilter> {
        match self.stages.first() {
            Some(Stage::Match(filter)) => Some(filter),
            _ => None,
        }
    }

    /// Run every stage in order over the given documents
    pub fn evaluate(&self, docs: Vec<Document>) -> Vec<Document> {
        self.stages
            .iter()
            .fold(docs, |docs, stage| apply_stage(stage, docs))
    }
}

fn apply_stage(stage: &Stage, docs: Vec<Document>) -> Vec<Document> {
    match stage {
        Stage::Match(filter) => docs.into_iter().filter(|doc| filter.matches(doc)).collect(),
        Stage::Project(fields) => docs
            .iter()
            .map(|doc| {
                let mut out = Map::new();
                for (name, expr) in fields {
                    if let Some(value) = expr.eval(doc) {
                        out.insert(name.clone(), value);
                    }
                }
                out
            })
            .collect(),
        Stage::Group { key, accumulators } => group(key, accumulators, &docs),
        Stage::Sort(keys) => {
            let mut docs = docs;
            sort_documents(&mut docs, keys);
            docs
        }
        Stage::Limit(limit) => docs.into_iter().take(*limit).collect(),
    }
}

#[derive(Debug, Clone)]
enum AccState {
    Avg { sum: f64, count: u64 },
    Min(Option<Value>),
    Max(Option<Value>),
    Sum(f64),
    First(Option<Value>),
    Count(u64),
}

impl AccState {
    fn new(acc: &Accumulator) -> Self {
        match acc {
            Accumulator::Avg(_) => AccState::Avg { sum: 0.0, count: 0 },
            Accumulator::Min(_) => AccState::Min(None),
            Accumulator::Max(_) => AccState::Max(None),
            Accumulator::Sum(_) => AccState::Sum(0.0),
            Accumulator::First(_) => AccState::First(None),
            Accumulator::Count => AccState::Count(0),
        }
    }

    fn update(&mut self, acc: &Accumulator, doc: &Document) {
        match (self, acc) {
            (AccState::Avg { sum, count }, Accumulator::Avg(expr)) => {
                if let Some(v) = expr.eval(doc).as_ref().and_then(Value::as_f64) {
                    *sum += v;
                    *count += 1;
                }
            }
            (AccState::Min(current), Accumulator::Min(expr)) => {
                if let Some(v) = expr.eval(doc).filter(|v| !v.is_null()) {
                    let replace = current
                        .as_ref()
                        .map_or(true, |c| compare_values(Some(&v), Some(c)).is_lt());
                    if replace {
                        *current = Some(v);
                    }
                }
            }
            (AccState::Max(current), Accumulator::Max(expr)) => {
                if let Some(v) = expr.eval(doc).filter(|v| !v.is_null()) {
                    let replace = current
                        .as_ref()
                        .map_or(true, |c| compare_values(Some(&v), Some(c)).is_gt());
                    if replace {
                        *current = Some(v);
                    }
                }
            }
            (AccState::Sum(total), Accumulator::Sum(expr)) => {
                if let Some(v) = expr.eval(doc).as_ref().and_then(Value::as_f64) {
                    *total += v;
                }
            }
            (AccState::First(current), Accumulator::First(expr)) => {
                if current.is_none() {
                    *current = Some(expr.eval(doc).unwrap_or(Value::Null));
                }
            }
            (AccState::Count(count), Accumulator::Count) => *count += 1,
            _ => {}
        }
    }

    fn finish(self) -> Value {
        match self {
            AccState::Avg { sum, count } if count > 0 => {
                number(sum / count as f64).unwrap_or(Value::Null)
            }
            AccState::Avg { .. } => Value::Null,
            AccState::Min(v) | AccState::Max(v) | AccState::First(v) => v.unwrap_or(Value::Null),
            AccState::Sum(total) => {
                if total.fract() == 0.0 && total.abs() < i64::MAX as f64 {
                    Value::from(total as i64)
                } else {
                    number(total).unwrap_or(Value::Null)
                }
            }
            AccState::Count(count) => Value::from(count),
        }
    }
}

/// Groups appear in the order their first document was seen
fn group(key: &GroupKey, accumulators: &[(String, Accumulator)], docs: &[Document]) -> Vec<Document> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(Value, Vec<AccState>)> = Vec::new();

    for doc in docs {
        let key_value = key.eval(doc);
        let slot = *index.entry(key_value.to_string()).or_insert_with(|| {
            let states = accumulators.iter().map(|(_, acc)| AccState::new(acc)).collect();
            groups.push((key_value.clone(), states));
            groups.len() - 1
        });

        let (_, states) = &mut groups[slot];
        for (state, (_, acc)) in states.iter_mut().zip(accumulators) {
            state.update(acc, doc);
        }
    }

    groups
        .into_iter()
        .map(|(key_value, states)| {
            let mut out = Map::new();
            out.insert("_id".to_string(), key_value);
            for (state, (name, _)) in states.into_iter().zip(accumulators) {
                out.insert(name.clone(), state.finish());
            }
            out
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn docs(values: Vec<Value>) -> Vec<Document> {
        values
            .into_iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    #[test]
    fn test_celsius_expression() {
        let doc = docs(vec![json!({"temperature": 212.0, "unit": "F"})]).remove(0);
        let value = Expr::CelsiusTemperature.eval(&doc).unwrap();
        assert!((value.as_f64().unwrap() - 100.0).abs() < 1e-9);

        let doc = docs(vec![json!({"temperature": 21.5, "unit": "C"})]).remove(0);
        assert_eq!(Expr::CelsiusTemperature.eval(&doc), Some(json!(21.5)));

        let doc = docs(vec![json!({"unit": "C"})]).remove(0);
        assert_eq!(Expr::CelsiusTemperature.eval(&doc), None);
    }

    #[test]
    fn test_hour_of_uses_utc() {
        let doc = docs(vec![json!({"timestamp": "2025-01-15T23:30:00-02:00"})]).remove(0);
        assert_eq!(Expr::HourOf("timestamp".into()).eval(&doc), Some(json!(1)));
    }

    #[test]
    fn test_composite_group_key() {
        let input = docs(vec![
            json!({"hour": 1, "type": "interior", "t": 20.0}),
            json!({"hour": 1, "type": "exterior", "t": 10.0}),
            json!({"hour": 1, "type": "interior", "t": 22.0}),
        ]);

        let pipeline = Pipeline::new().group(
            GroupKey::Composite(vec![
                ("hour".to_string(), Expr::field("hour")),
                ("type".to_string(), Expr::field("type")),
            ]),
            vec![
                ("avg", Accumulator::Avg(Expr::field("t"))),
                ("count", Accumulator::Count),
            ],
        );

        let out = pipeline.evaluate(input);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["_id"], json!({"hour": 1, "type": "interior"}));
        assert_eq!(out[0]["avg"], json!(21.0));
        assert_eq!(out[0]["count"], json!(2));
        assert_eq!(out[1]["count"], json!(1));
    }

    #[test]
    fn test_first_accumulator_takes_first_document() {
        let input = docs(vec![
            json!({"device_id": "a", "location": "Sala 1"}),
            json!({"device_id": "a", "location": "Sala 2"}),
        ]);

        let out = Pipeline::new()
            .group(
                GroupKey::Single(Expr::field("device_id")),
                vec![("location", Accumulator::First(Expr::field("location")))],
            )
            .evaluate(input);

        assert_eq!(out[0]["_id"], json!("a"));
        assert_eq!(out[0]["location"], json!("Sala 1"));
    }

    #[test]
    fn test_accumulators_skip_missing_values() {
        let input = docs(vec![
            json!({"k": 1, "v": 4.0}),
            json!({"k": 1}),
            json!({"k": 1, "v": 2.0}),
        ]);

        let out = Pipeline::new()
            .group(
                GroupKey::Single(Expr::field("k")),
                vec![
                    ("avg", Accumulator::Avg(Expr::field("v"))),
                    ("min", Accumulator::Min(Expr::field("v"))),
                    ("max", Accumulator::Max(Expr::field("v"))),
                    ("n", Accumulator::Sum(Expr::Literal(json!(1)))),
                ],
            )
            .evaluate(input);

        assert_eq!(out[0]["avg"], json!(3.0));
        assert_eq!(out[0]["min"], json!(2.0));
        assert_eq!(out[0]["max"], json!(4.0));
        assert_eq!(out[0]["n"], json!(3));
    }

    #[test]
    fn test_avg_of_no_values_is_null() {
        let out = Pipeline::new()
            .group(
                GroupKey::Single(Expr::Literal(Value::Null)),
                vec![("avg", Accumulator::Avg(Expr::field("v")))],
            )
            .evaluate(docs(vec![json!({"x": 1})]));

        assert_eq!(out[0]["avg"], Value::Null);
    }

    #[test]
    fn test_project_rounds_and_omits_missing() {
        let out = Pipeline::new()
            .project(vec![
                ("value", Expr::round(Expr::field("v"), 2)),
                ("absent", Expr::field("nope")),
            ])
            .evaluate(docs(vec![json!({"v": 21.456789})]));

        assert_eq!(out[0]["value"], json!(21.46));
        assert!(!out[0].contains_key("absent"));
    }

    #[test]
    fn test_sort_then_limit() {
        let out = Pipeline::new()
            .sort(vec![SortSpec::desc("n")])
            .limit(2)
            .evaluate(docs(vec![json!({"n": 1}), json!({"n": 3}), json!({"n": 2})]));

        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["n"], json!(3));
        assert_eq!(out[1]["n"], json!(2));
    }

    #[test]
    fn test_leading_filter() {
        let filter = ReadingFilter::all().with_field("temperature");
        let pipeline = Pipeline::new().matching(filter.clone()).limit(1);
        assert_eq!(pipeline.leading_filter(), Some(&filter));
        assert!(Pipeline::new().limit(1).leading_filter().is_none());
    }
}
