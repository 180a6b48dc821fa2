//! Query objects understood by every reading store: filters, sort keys and find requests.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::cmp::Ordering;

use crate::models::{parse_timestamp, Document, SensorKind};

/// Filter for querying stored readings. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadingFilter {
    pub kind: Option<SensorKind>,
    pub location: Option<String>,
    pub device_id: Option<String>,
    /// Only readings at or after this instant
    pub since: Option<DateTime<Utc>>,
    /// Only documents that carry this field
    pub has_field: Option<String>,
}

impl ReadingFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: SensorKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.has_field = Some(field.into());
        self
    }

    /// Check a stored document against every criterion
    pub fn matches(&self, doc: &Document) -> bool {
        let kind_match = self
            .kind
            .map_or(true, |kind| str_field(doc, "type") == Some(kind.to_string().as_str()));

        let location_match = self
            .location
            .as_deref()
            .map_or(true, |location| str_field(doc, "location") == Some(location));

        let device_match = self
            .device_id
            .as_deref()
            .map_or(true, |device_id| str_field(doc, "device_id") == Some(device_id));

        // Documents with a missing or unparseable timestamp never satisfy a time bound
        let since_match = self.since.map_or(true, |since| {
            str_field(doc, "timestamp")
                .and_then(parse_timestamp)
                .map_or(false, |ts| ts >= since)
        });

        let field_match = self
            .has_field
            .as_deref()
            .map_or(true, |field| doc.contains_key(field));

        kind_match && location_match && device_match && since_match && field_match
    }
}

fn str_field<'a>(doc: &'a Document, field: &str) -> Option<&'a str> {
    doc.get(field).and_then(Value::as_str)
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// One sort key
#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    pub field: String,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Ascending,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Descending,
        }
    }
}

/// Stable sort of documents by a list of keys, first key most significant
pub fn sort_documents(docs: &mut [Document], keys: &[SortSpec]) {
    if keys.is_empty() {
        return;
    }

    docs.sort_by(|a, b| {
        for key in keys {
            let ordering = compare_values(lookup(a, &key.field), lookup(b, &key.field));
            let ordering = match key.order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

/// Resolve a dotted path such as `_id.hour` inside a document
pub fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let first = parts.next()?;
    let mut current = doc.get(first)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

/// Total order over JSON values: missing and null, then numbers, strings, booleans, the rest
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Number(_)) => 1,
            Some(Value::String(_)) => 2,
            Some(Value::Bool(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// A find request: filter, optional sort and limit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
    pub filter: ReadingFilter,
    pub sort: Vec<SortSpec>,
    pub limit: Option<usize>,
}

impl FindQuery {
    pub fn new(filter: ReadingFilter) -> Self {
        Self {
            filter,
            sort: Vec::new(),
            limit: None,
        }
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn sort_by(mut self, spec: SortSpec) -> Self {
        self.sort.push(spec);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Apply filter, sort and limit to an in-process document set
    pub fn apply<I>(&self, docs: I) -> Vec<Document>
    where
        I: IntoIterator<Item = Document>,
    {
        let mut matched: Vec<Document> = docs
            .into_iter()
            .filter(|doc| self.filter.matches(doc))
            .collect();

        sort_documents(&mut matched, &self.sort);

        if let Some(limit) = self.limit {
            matched.truncate(limit);
        }
        matched
    }
}
