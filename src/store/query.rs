//! Standing-query language shared by trigger conditions and raw searches.
//!
//! Queries are JSON objects holding exactly one clause, optionally wrapped
//! in a top-level `"query"` key:
//!
//! ```json
//! { "query": { "bool": { "must": [ { "match": { "str": "quick" } },
//!                                  { "range": { "num": { "gte": 10 } } } ] } } }
//! ```
//!
//! A [`StandingQuery`] is compiled once and evaluated against many
//! documents. Besides evaluation it exposes the terms a document must carry
//! to possibly match, which the predicate index uses to skip queries that
//! cannot match an incoming document.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

use regex::Regex;
use serde_json::{Map, Value};

/// Failure to compile a standing query.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The query (or a nested clause) is not an object with one clause.
    #[error("query clause must be a JSON object with exactly one key")]
    NotAClause,

    /// The clause name is not part of the supported language.
    #[error("unsupported query clause: {0}")]
    UnsupportedClause(String),

    /// The clause body has the wrong shape.
    #[error("malformed {clause} clause: {reason}")]
    Malformed {
        /// Clause name.
        clause: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// A `regexp` clause carries an invalid pattern.
    #[error("invalid regexp on field {field}: {reason}")]
    InvalidRegex {
        /// Field the pattern applies to.
        field: String,
        /// Compiler message.
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchOperator {
    Or,
    And,
}

#[derive(Debug, Clone, Default)]
struct RangeBounds {
    gt: Option<Value>,
    gte: Option<Value>,
    lt: Option<Value>,
    lte: Option<Value>,
}

#[derive(Debug, Clone, Default)]
struct BoolClause {
    must: Vec<Clause>,
    filter: Vec<Clause>,
    should: Vec<Clause>,
    must_not: Vec<Clause>,
    minimum_should_match: Option<usize>,
}

#[derive(Debug, Clone)]
enum Clause {
    MatchAll,
    Match {
        field: String,
        query: Value,
        operator: MatchOperator,
        /// Number or boolean the query text spells, compared against
        /// non-text field values.
        coerced: Option<Value>,
    },
    Term {
        field: String,
        value: Value,
    },
    Terms {
        field: String,
        values: Vec<Value>,
    },
    Range {
        field: String,
        bounds: RangeBounds,
    },
    Exists {
        field: String,
    },
    Prefix {
        field: String,
        prefix: String,
    },
    Regexp {
        field: String,
        pattern: Regex,
    },
    Bool(BoolClause),
}

/// A compiled query, ready to be evaluated against documents.
#[derive(Debug, Clone)]
pub struct StandingQuery {
    root: Clause,
}

impl StandingQuery {
    /// Compiles a query body.
    ///
    /// Accepts either `{"query": <clause>}` or a bare clause.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] if the body is not a well-formed query.
    pub fn compile(body: &Value) -> Result<Self, QueryError> {
        let clause = match body.as_object() {
            Some(obj) if obj.len() == 1 => obj.get("query").unwrap_or(body),
            _ => body,
        };
        Ok(Self {
            root: parse_clause(clause)?,
        })
    }

    /// Returns `true` if `document` satisfies the query.
    #[must_use]
    pub fn matches(&self, document: &Value) -> bool {
        self.root.eval(document)
    }

    /// Returns every field name the query refers to.
    #[must_use]
    pub fn fields(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.root.collect_fields(&mut out);
        out
    }

    /// Terms of which a matching document must carry at least one.
    ///
    /// `None` means the query cannot be anchored and has to be evaluated
    /// against every document. `Some(vec![])` means nothing can match.
    pub(crate) fn anchors(&self) -> Option<Vec<TermKey>> {
        self.root.anchors()
    }
}

// ── Parsing ─────────────────────────────────────────────────────────────

fn parse_clause(value: &Value) -> Result<Clause, QueryError> {
    let Some(obj) = value.as_object() else {
        return Err(QueryError::NotAClause);
    };
    let mut entries = obj.iter();
    let (Some((name, body)), None) = (entries.next(), entries.next()) else {
        return Err(QueryError::NotAClause);
    };

    match name.as_str() {
        "match_all" => Ok(Clause::MatchAll),
        "match" => parse_match(body),
        "term" => {
            let (field, spec) = single_field("term", body)?;
            let value = unwrap_value("term", spec, "value")?;
            Ok(Clause::Term {
                field,
                value: scalar("term", value)?,
            })
        }
        "terms" => {
            let (field, spec) = single_field("terms", body)?;
            let Some(items) = spec.as_array() else {
                return Err(malformed("terms", "expected an array of values"));
            };
            let values = items
                .iter()
                .map(|v| scalar("terms", v))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Clause::Terms { field, values })
        }
        "range" => parse_range(body),
        "exists" => {
            let field = body
                .get("field")
                .and_then(Value::as_str)
                .filter(|f| !f.is_empty())
                .ok_or_else(|| malformed("exists", "missing \"field\""))?;
            Ok(Clause::Exists {
                field: field.to_string(),
            })
        }
        "prefix" => {
            let (field, spec) = single_field("prefix", body)?;
            let prefix = unwrap_value("prefix", spec, "value")?
                .as_str()
                .ok_or_else(|| malformed("prefix", "prefix must be a string"))?;
            Ok(Clause::Prefix {
                field,
                prefix: prefix.to_string(),
            })
        }
        "regexp" => {
            let (field, spec) = single_field("regexp", body)?;
            let source = unwrap_value("regexp", spec, "value")?
                .as_str()
                .ok_or_else(|| malformed("regexp", "pattern must be a string"))?;
            let pattern = Regex::new(&format!("^(?:{source})$")).map_err(|e| {
                QueryError::InvalidRegex {
                    field: field.clone(),
                    reason: e.to_string(),
                }
            })?;
            Ok(Clause::Regexp { field, pattern })
        }
        "bool" => parse_bool(body),
        other => Err(QueryError::UnsupportedClause(other.to_string())),
    }
}

fn parse_match(body: &Value) -> Result<Clause, QueryError> {
    let (field, spec) = single_field("match", body)?;
    let (query, operator) = match spec {
        Value::Object(opts) => {
            let query = opts
                .get("query")
                .ok_or_else(|| malformed("match", "missing \"query\""))?;
            let operator = match opts.get("operator").and_then(Value::as_str) {
                None => MatchOperator::Or,
                Some(op) if op.eq_ignore_ascii_case("or") => MatchOperator::Or,
                Some(op) if op.eq_ignore_ascii_case("and") => MatchOperator::And,
                Some(op) => return Err(malformed("match", format!("unknown operator {op}"))),
            };
            (query, operator)
        }
        other => (other, MatchOperator::Or),
    };
    let query = scalar("match", query)?;
    let coerced = query.as_str().and_then(coerce_text);
    Ok(Clause::Match {
        field,
        query,
        operator,
        coerced,
    })
}

fn parse_range(body: &Value) -> Result<Clause, QueryError> {
    let (field, spec) = single_field("range", body)?;
    let Some(opts) = spec.as_object() else {
        return Err(malformed("range", "expected an object of bounds"));
    };
    let bound = |key: &str| -> Result<Option<Value>, QueryError> {
        match opts.get(key) {
            None => Ok(None),
            Some(v @ (Value::Number(_) | Value::String(_))) => Ok(Some(v.clone())),
            Some(_) => Err(malformed("range", format!("{key} must be a number or string"))),
        }
    };
    let bounds = RangeBounds {
        gt: bound("gt")?,
        gte: bound("gte")?,
        lt: bound("lt")?,
        lte: bound("lte")?,
    };
    if bounds.gt.is_none() && bounds.gte.is_none() && bounds.lt.is_none() && bounds.lte.is_none()
    {
        return Err(malformed("range", "no bounds given"));
    }
    Ok(Clause::Range { field, bounds })
}

fn parse_bool(body: &Value) -> Result<Clause, QueryError> {
    let Some(opts) = body.as_object() else {
        return Err(malformed("bool", "expected an object"));
    };
    let minimum_should_match = match opts.get("minimum_should_match") {
        None => None,
        Some(Value::Number(n)) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(_) => None,
    };
    if opts.contains_key("minimum_should_match") && minimum_should_match.is_none() {
        return Err(malformed(
            "bool",
            "minimum_should_match must be a non-negative integer",
        ));
    }
    Ok(Clause::Bool(BoolClause {
        must: clause_list(opts, "must")?,
        filter: clause_list(opts, "filter")?,
        should: clause_list(opts, "should")?,
        must_not: clause_list(opts, "must_not")?,
        minimum_should_match,
    }))
}

fn clause_list(opts: &Map<String, Value>, key: &str) -> Result<Vec<Clause>, QueryError> {
    match opts.get(key) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items.iter().map(parse_clause).collect(),
        Some(single) => Ok(vec![parse_clause(single)?]),
    }
}

/// Splits `{"<field>": <spec>}` into its field name and spec.
fn single_field<'a>(
    clause: &'static str,
    body: &'a Value,
) -> Result<(String, &'a Value), QueryError> {
    let Some(obj) = body.as_object() else {
        return Err(malformed(clause, "expected {\"<field>\": ...}"));
    };
    let mut entries = obj.iter();
    match (entries.next(), entries.next()) {
        (Some((field, spec)), None) if !field.is_empty() => Ok((field.clone(), spec)),
        _ => Err(malformed(clause, "expected exactly one field")),
    }
}

/// Accepts both the short form `{"f": v}` and the long form `{"f": {"<key>": v}}`.
fn unwrap_value<'a>(
    clause: &'static str,
    spec: &'a Value,
    key: &str,
) -> Result<&'a Value, QueryError> {
    match spec {
        Value::Object(opts) => opts
            .get(key)
            .ok_or_else(|| malformed(clause, format!("missing \"{key}\""))),
        other => Ok(other),
    }
}

/// Reads match text as the number or boolean it spells, if any.
fn coerce_text(text: &str) -> Option<Value> {
    let text = text.trim();
    match text {
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        _ => text
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
    }
}

fn scalar(clause: &'static str, value: &Value) -> Result<Value, QueryError> {
    match value {
        Value::String(_) | Value::Number(_) | Value::Bool(_) => Ok(value.clone()),
        _ => Err(malformed(clause, "value must be a string, number or boolean")),
    }
}

fn malformed(clause: &'static str, reason: impl Into<String>) -> QueryError {
    QueryError::Malformed {
        clause,
        reason: reason.into(),
    }
}

// ── Evaluation ──────────────────────────────────────────────────────────

impl Clause {
    fn eval(&self, doc: &Value) -> bool {
        match self {
            Self::MatchAll => true,
            Self::Match {
                field,
                query: Value::String(text),
                operator,
                coerced,
            } => {
                let values = field_values(doc, field);
                if coerced.as_ref().is_some_and(|target| {
                    values
                        .iter()
                        .any(|v| !v.is_string() && scalar_eq(v, target))
                }) {
                    return true;
                }
                let wanted = tokenize(text);
                if wanted.is_empty() {
                    return false;
                }
                let present: HashSet<String> = values
                    .into_iter()
                    .filter_map(Value::as_str)
                    .flat_map(tokenize)
                    .collect();
                match operator {
                    MatchOperator::Or => wanted.iter().any(|t| present.contains(t)),
                    MatchOperator::And => wanted.iter().all(|t| present.contains(t)),
                }
            }
            Self::Match { field, query, .. } | Self::Term {
                field,
                value: query,
            } => field_values(doc, field)
                .into_iter()
                .any(|v| scalar_eq(v, query)),
            Self::Terms { field, values } => field_values(doc, field)
                .into_iter()
                .any(|v| values.iter().any(|q| scalar_eq(v, q))),
            Self::Range { field, bounds } => field_values(doc, field)
                .into_iter()
                .any(|v| bounds.contains(v)),
            Self::Exists { field } => !field_values(doc, field).is_empty(),
            Self::Prefix { field, prefix } => field_values(doc, field)
                .into_iter()
                .filter_map(Value::as_str)
                .any(|s| s.starts_with(prefix.as_str())),
            Self::Regexp { field, pattern } => field_values(doc, field)
                .into_iter()
                .filter_map(Value::as_str)
                .any(|s| pattern.is_match(s)),
            Self::Bool(b) => b.eval(doc),
        }
    }

    fn collect_fields(&self, out: &mut BTreeSet<String>) {
        match self {
            Self::MatchAll => {}
            Self::Match { field, .. }
            | Self::Term { field, .. }
            | Self::Terms { field, .. }
            | Self::Range { field, .. }
            | Self::Exists { field }
            | Self::Prefix { field, .. }
            | Self::Regexp { field, .. } => {
                out.insert(field.clone());
            }
            Self::Bool(b) => {
                for c in b.clauses() {
                    c.collect_fields(out);
                }
            }
        }
    }

    fn anchors(&self) -> Option<Vec<TermKey>> {
        match self {
            Self::Match {
                field,
                query: Value::String(text),
                operator,
                coerced,
            } => {
                let tokens = tokenize(text);
                let take = match operator {
                    MatchOperator::Or => tokens.len(),
                    // any single required token is enough to anchor on
                    MatchOperator::And => 1,
                };
                let mut keys: Vec<TermKey> = tokens
                    .iter()
                    .take(take)
                    .map(|t| TermKey::token(field, t))
                    .collect();
                keys.extend(coerced.as_ref().and_then(|c| TermKey::exact(field, c)));
                Some(keys)
            }
            Self::Match { field, query, .. } | Self::Term {
                field,
                value: query,
            } => TermKey::exact(field, query).map(|k| vec![k]),
            Self::Terms { field, values } => Some(
                values
                    .iter()
                    .filter_map(|v| TermKey::exact(field, v))
                    .collect(),
            ),
            Self::Bool(b) => b.anchors(),
            _ => None,
        }
    }
}

impl BoolClause {
    fn clauses(&self) -> impl Iterator<Item = &Clause> {
        self.must
            .iter()
            .chain(&self.filter)
            .chain(&self.should)
            .chain(&self.must_not)
    }

    fn required_should(&self) -> usize {
        self.minimum_should_match.unwrap_or(
            if self.must.is_empty() && self.filter.is_empty() {
                1
            } else {
                0
            },
        )
    }

    fn eval(&self, doc: &Value) -> bool {
        if !self.must.iter().chain(&self.filter).all(|c| c.eval(doc)) {
            return false;
        }
        if self.must_not.iter().any(|c| c.eval(doc)) {
            return false;
        }
        if self.should.is_empty() {
            return true;
        }
        let hits = self.should.iter().filter(|c| c.eval(doc)).count();
        hits >= self.required_should()
    }

    fn anchors(&self) -> Option<Vec<TermKey>> {
        if let Some(found) = self.must.iter().chain(&self.filter).find_map(Clause::anchors) {
            return Some(found);
        }
        if self.should.is_empty() || self.required_should() == 0 {
            return None;
        }
        let mut union = Vec::new();
        for clause in &self.should {
            union.extend(clause.anchors()?);
        }
        Some(union)
    }
}

impl RangeBounds {
    fn contains(&self, value: &Value) -> bool {
        let check = |bound: &Option<Value>, ok: fn(Ordering) -> bool| match bound {
            None => true,
            Some(b) => compare_values(value, b).is_some_and(ok),
        };
        check(&self.gt, Ordering::is_gt)
            && check(&self.gte, Ordering::is_ge)
            && check(&self.lt, Ordering::is_lt)
            && check(&self.lte, Ordering::is_le)
    }
}

/// Values stored under `field`, with arrays flattened and nulls dropped.
///
/// A literal key wins over a dotted path into nested objects.
fn field_values<'a>(doc: &'a Value, field: &str) -> Vec<&'a Value> {
    let found = doc.get(field).or_else(|| {
        field
            .split('.')
            .try_fold(doc, |current, part| current.get(part))
    });
    match found {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().filter(|v| !v.is_null()).collect(),
        Some(other) => vec![other],
    }
}

fn scalar_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Orders two scalar JSON values of the same family.
///
/// Numbers compare numerically, strings lexically (which also orders
/// RFC 3339 timestamps), booleans `false < true`. Anything else is
/// incomparable.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

// ── Term extraction ─────────────────────────────────────────────────────

/// One indexable `(field, term)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct TermKey {
    field: String,
    term: String,
}

impl TermKey {
    fn exact(field: &str, value: &Value) -> Option<Self> {
        let term = match value {
            // numbers are keyed by their f64 value so 17 and 17.0 agree,
            // and -0.0 folds into 0 as it does under numeric equality
            Value::Number(n) => {
                let f = n.as_f64()?;
                format!("n:{}", if f == 0.0 { 0.0 } else { f })
            }
            Value::String(s) => format!("s:{s}"),
            Value::Bool(b) => format!("b:{b}"),
            _ => return None,
        };
        Some(Self {
            field: field.to_string(),
            term,
        })
    }

    fn token(field: &str, token: &str) -> Self {
        Self {
            field: field.to_string(),
            term: format!("t:{token}"),
        }
    }
}

/// Every term a document carries: exact values and text tokens, keyed by
/// top-level field name and by dotted path into nested objects.
pub(crate) fn document_terms(doc: &Value) -> HashSet<TermKey> {
    let mut out = HashSet::new();
    if let Some(obj) = doc.as_object() {
        collect_terms(obj, None, &mut out);
    }
    out
}

fn collect_terms(obj: &Map<String, Value>, prefix: Option<&str>, out: &mut HashSet<TermKey>) {
    for (key, value) in obj {
        let path = match prefix {
            Some(p) => format!("{p}.{key}"),
            None => key.clone(),
        };
        match value {
            Value::Object(nested) => collect_terms(nested, Some(&path), out),
            Value::Array(items) => {
                for item in items {
                    push_scalar_terms(&path, item, out);
                }
            }
            other => push_scalar_terms(&path, other, out),
        }
    }
}

fn push_scalar_terms(field: &str, value: &Value, out: &mut HashSet<TermKey>) {
    if let Some(key) = TermKey::exact(field, value) {
        out.insert(key);
    }
    if let Value::String(text) = value {
        for token in tokenize(text) {
            out.insert(TermKey::token(field, &token));
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;

    fn compile(body: Value) -> StandingQuery {
        match StandingQuery::compile(&body) {
            Ok(q) => q,
            Err(e) => panic!("query failed to compile: {e}"),
        }
    }

    /// Anchored queries must only match documents that carry one of the anchors.
    fn assert_anchor_consistent(query: &StandingQuery, doc: &Value) {
        if !query.matches(doc) {
            return;
        }
        if let Some(anchors) = query.anchors() {
            let terms = document_terms(doc);
            assert!(
                anchors.iter().any(|a| terms.contains(a)),
                "matching document misses every anchor"
            );
        }
    }

    #[test]
    fn match_number_wrapped_in_query_key() {
        let q = compile(json!({"query": {"match": {"num": 17}}}));
        assert!(q.matches(&json!({"num": 17, "str": "quick"})));
        assert!(q.matches(&json!({"num": 17.0})));
        assert!(!q.matches(&json!({"num": 18})));
        assert!(!q.matches(&json!({"str": "17"})));
    }

    #[test]
    fn match_long_form_with_query_key() {
        let q = compile(json!({"query": {"match": {"num": {"query": 18}}}}));
        assert!(q.matches(&json!({"num": 18})));
        assert!(!q.matches(&json!({"num": 19})));
    }

    #[test]
    fn match_text_is_tokenized_and_or_by_default() {
        let q = compile(json!({"match": {"str": "Quick fox"}}));
        assert!(q.matches(&json!({"str": "the quick brown dog"})));
        assert!(q.matches(&json!({"str": "FOX"})));
        assert!(!q.matches(&json!({"str": "slow brown dog"})));

        let and = compile(json!({"match": {"str": {"query": "quick fox", "operator": "and"}}}));
        assert!(!and.matches(&json!({"str": "quick dog"})));
        assert!(and.matches(&json!({"str": "fox, quick!"})));
    }

    #[test]
    fn empty_text_matches_nothing() {
        let q = compile(json!({"match": {"str": "  "}}));
        assert!(!q.matches(&json!({"str": "anything"})));
        assert_eq!(q.anchors().map(|a| a.len()), Some(0));
    }

    #[test]
    fn term_is_exact() {
        let q = compile(json!({"term": {"str": "Quick"}}));
        assert!(q.matches(&json!({"str": "Quick"})));
        assert!(!q.matches(&json!({"str": "quick"})));
        assert!(!q.matches(&json!({"str": "Quick fox"})));
    }

    #[test]
    fn terms_range_exists_prefix_regexp() {
        let terms = compile(json!({"terms": {"code": ["a", "b"]}}));
        assert!(terms.matches(&json!({"code": "b"})));
        assert!(!terms.matches(&json!({"code": "c"})));

        let range = compile(json!({"range": {"reading": {"gte": 10, "lt": 20}}}));
        assert!(range.matches(&json!({"reading": 10})));
        assert!(range.matches(&json!({"reading": 19.5})));
        assert!(!range.matches(&json!({"reading": 20})));
        assert!(!range.matches(&json!({"reading": "15"})));

        let exists = compile(json!({"exists": {"field": "tag"}}));
        assert!(exists.matches(&json!({"tag": "x"})));
        assert!(!exists.matches(&json!({"tag": null})));
        assert!(!exists.matches(&json!({"other": 1})));

        let prefix = compile(json!({"prefix": {"path": {"value": "/data/"}}}));
        assert!(prefix.matches(&json!({"path": "/data/x.tif"})));
        assert!(!prefix.matches(&json!({"path": "/tmp/x"})));

        let re = compile(json!({"regexp": {"sensor": "s-[0-9]+"}}));
        assert!(re.matches(&json!({"sensor": "s-42"})));
        assert!(!re.matches(&json!({"sensor": "xs-42"})));
    }

    #[test]
    fn bool_combines_clauses() {
        let q = compile(json!({
            "bool": {
                "must": {"match": {"num": 17}},
                "must_not": [{"term": {"str": "blocked"}}],
                "should": [{"term": {"str": "quick"}}, {"term": {"str": "brown"}}],
                "minimum_should_match": 1
            }
        }));
        assert!(q.matches(&json!({"num": 17, "str": "quick"})));
        assert!(!q.matches(&json!({"num": 17, "str": "blocked"})));
        assert!(!q.matches(&json!({"num": 17, "str": "fox"})));
        assert!(!q.matches(&json!({"num": 18, "str": "quick"})));
    }

    #[test]
    fn should_only_bool_requires_one_hit() {
        let q = compile(json!({"bool": {"should": [{"term": {"a": 1}}, {"term": {"b": 2}}]}}));
        assert!(q.matches(&json!({"b": 2})));
        assert!(!q.matches(&json!({"a": 2, "b": 1})));
    }

    #[test]
    fn nested_fields_and_arrays() {
        let q = compile(json!({"term": {"loc.city": "Paris"}}));
        assert!(q.matches(&json!({"loc": {"city": "Paris"}})));
        let tags = compile(json!({"match": {"tags": "red"}}));
        assert!(tags.matches(&json!({"tags": ["blue", "red"]})));
    }

    #[test]
    fn rejects_malformed_queries() {
        assert!(matches!(
            StandingQuery::compile(&json!({"fuzzy": {"a": "b"}})),
            Err(QueryError::UnsupportedClause(_))
        ));
        assert!(matches!(
            StandingQuery::compile(&json!({"match": {"a": 1}, "term": {"b": 2}})),
            Err(QueryError::NotAClause)
        ));
        assert!(matches!(
            StandingQuery::compile(&json!({"range": {"a": {}}})),
            Err(QueryError::Malformed { .. })
        ));
        assert!(matches!(
            StandingQuery::compile(&json!({"regexp": {"a": "("}})),
            Err(QueryError::InvalidRegex { .. })
        ));
        assert!(StandingQuery::compile(&json!("match")).is_err());
    }

    #[test]
    fn fields_lists_every_reference() {
        let q = compile(json!({
            "bool": {"must": [{"match": {"num": 1}}], "should": [{"exists": {"field": "str"}}]}
        }));
        let fields: Vec<String> = q.fields().into_iter().collect();
        assert_eq!(fields, vec!["num".to_string(), "str".to_string()]);
    }

    #[test]
    fn anchors_agree_with_evaluation() {
        let queries = [
            json!({"match": {"num": 17}}),
            json!({"match": {"str": "quick brown"}}),
            json!({"match": {"str": {"query": "quick brown", "operator": "and"}}}),
            json!({"terms": {"str": ["fox", "dog"]}}),
            json!({"bool": {"must": [{"range": {"num": {"gt": 1}}}, {"term": {"str": "fox"}}]}}),
            json!({"bool": {"should": [{"term": {"num": 3}}, {"match": {"str": "dog"}}]}}),
        ];
        let docs = [
            json!({"num": 17, "str": "The quick fox"}),
            json!({"num": 17.0, "str": "brown"}),
            json!({"num": 3, "str": "dog"}),
            json!({"num": 4, "str": "fox"}),
            json!({"str": ["quick", "brown"]}),
        ];
        for body in queries {
            let q = compile(body);
            for doc in &docs {
                assert_anchor_consistent(&q, doc);
            }
        }
    }

    #[test]
    fn negative_zero_shares_the_zero_key() {
        let q = compile(json!({"term": {"x": 0}}));
        let doc = json!({"x": -0.0});
        assert!(q.matches(&doc));
        assert_anchor_consistent(&q, &doc);
        assert_eq!(
            TermKey::exact("x", &json!(-0.0)),
            TermKey::exact("x", &json!(0))
        );
    }

    #[test]
    fn match_text_spelling_a_number_hits_numeric_fields() {
        let q = compile(json!({"match": {"reading": "100"}}));
        assert!(q.matches(&json!({"reading": 100})));
        assert!(q.matches(&json!({"reading": 100.0})));
        assert!(q.matches(&json!({"reading": "100 units"})));
        assert!(!q.matches(&json!({"reading": 101})));

        let flag = compile(json!({"match": {"armed": " true "}}));
        assert!(flag.matches(&json!({"armed": true})));
        assert!(!flag.matches(&json!({"armed": false})));

        let words = compile(json!({"match": {"reading": "hundred"}}));
        assert!(!words.matches(&json!({"reading": 100})));

        for doc in [
            json!({"reading": 100}),
            json!({"reading": [3, 100.0]}),
            json!({"armed": true}),
        ] {
            assert_anchor_consistent(&q, &doc);
            assert_anchor_consistent(&flag, &doc);
        }
    }

    #[test]
    fn unanchorable_queries_report_none() {
        assert!(compile(json!({"match_all": {}})).anchors().is_none());
        assert!(compile(json!({"range": {"n": {"gt": 1}}})).anchors().is_none());
        assert!(
            compile(json!({"bool": {"must_not": {"term": {"n": 1}}}}))
                .anchors()
                .is_none()
        );
    }

    #[test]
    fn compare_values_orders_families() {
        assert_eq!(compare_values(&json!(1), &json!(2.5)), Some(Ordering::Less));
        assert_eq!(compare_values(&json!("b"), &json!("a")), Some(Ordering::Greater));
        assert_eq!(compare_values(&json!(1), &json!("1")), None);
    }
}
