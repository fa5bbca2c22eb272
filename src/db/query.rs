//! Reusable list query builder
//!
//! Translates list-endpoint query strings into a single SurrealQL SELECT.
//! The pipeline order is fixed: filter -> sort -> project -> paginate.
//!
//! # 参数约定
//!
//! | 参数 | 形式 | 说明 |
//! |------|------|------|
//! | 过滤 | `field=value` 或 `field[op]=value` | op 支持 gt / gte / lt / lte |
//! | 排序 | `sort=f1,-f2` | `-` 前缀为降序, 默认 `created_at` 降序 |
//! | 投影 | `fields=a,b,c` | 总是附带 id, 缺省返回完整文档 |
//! | 分页 | `page` / `limit` | 默认 1 / 10, 非法值静默回退 |
//!
//! Field names are validated as identifiers and values are always bound,
//! so no request input is ever spliced into the query text.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

/// Reserved parameter names that never become filters
const RESERVED_PARAMS: [&str; 4] = ["sort", "page", "limit", "fields"];

const DEFAULT_PAGE: u64 = 1;
const DEFAULT_LIMIT: u64 = 10;

/// Comparison operators accepted in `field[op]=value` filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl FilterOp {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            _ => None,
        }
    }

    fn sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }
}

#[derive(Debug, Clone)]
struct Filter {
    field: String,
    op: FilterOp,
    value: Value,
}

/// Query description built from request parameters
#[derive(Debug, Clone)]
pub struct ListQuery {
    table: &'static str,
    filters: Vec<Filter>,
    /// (field, descending)
    sort: Vec<(String, bool)>,
    fields: Vec<String>,
    page: u64,
    limit: u64,
}

impl ListQuery {
    /// Build a query description from raw request parameters.
    ///
    /// Never fails: malformed parameters are skipped or fall back to
    /// defaults. Keys are processed in sorted order so the same parameter
    /// map always yields the same query.
    pub fn from_params(table: &'static str, params: &HashMap<String, String>) -> Self {
        let mut keys: Vec<&String> = params
            .keys()
            .filter(|k| !RESERVED_PARAMS.contains(&k.as_str()))
            .collect();
        keys.sort();

        let mut filters = Vec::new();
        for key in keys {
            let raw = &params[key];
            match parse_filter_key(key) {
                Some((field, op)) => filters.push(Filter {
                    field: field.to_string(),
                    op,
                    value: coerce_value(raw),
                }),
                None => {
                    tracing::debug!(target: "query", param = %key, "Skipping invalid filter parameter");
                }
            }
        }

        let mut sort = Vec::new();
        if let Some(raw) = params.get("sort") {
            for part in raw.split(',') {
                let part = part.trim();
                let (field, desc) = match part.strip_prefix('-') {
                    Some(field) => (field, true),
                    None => (part, false),
                };
                if is_identifier(field) {
                    sort.push((field.to_string(), desc));
                } else {
                    tracing::debug!(target: "query", field = %part, "Skipping invalid sort field");
                }
            }
        }
        if sort.is_empty() {
            // newest first
            sort.push(("created_at".to_string(), true));
        }

        let mut fields = Vec::new();
        if let Some(raw) = params.get("fields") {
            for part in raw.split(',') {
                let part = part.trim();
                if is_identifier(part) && part != "id" {
                    fields.push(part.to_string());
                } else {
                    tracing::debug!(target: "query", field = %part, "Skipping invalid projection field");
                }
            }
        }

        Self {
            table,
            filters,
            sort,
            fields,
            page: positive_or(params.get("page"), DEFAULT_PAGE),
            limit: positive_or(params.get("limit"), DEFAULT_LIMIT),
        }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Whether the query selects full documents (no `fields` projection)
    pub fn selects_full_documents(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render the SELECT statement and its bindings
    pub fn build(&self) -> (String, BTreeMap<String, Value>) {
        let mut query = String::from("SELECT ");
        if self.fields.is_empty() {
            query.push('*');
        } else {
            // 投影时 id 以字符串形式返回
            query.push_str("<string>id AS id");
            for field in &self.fields {
                query.push_str(", ");
                query.push_str(field);
            }
        }
        query.push_str(" FROM ");
        query.push_str(self.table);

        let mut binds = BTreeMap::new();
        for (i, filter) in self.filters.iter().enumerate() {
            query.push_str(if i == 0 { " WHERE " } else { " AND " });
            let param = format!("f{}", i);
            query.push_str(&filter.field);
            query.push(' ');
            query.push_str(filter.op.sql());
            query.push_str(" $");
            query.push_str(&param);
            binds.insert(param, filter.value.clone());
        }

        query.push_str(" ORDER BY ");
        for (i, (field, desc)) in self.sort.iter().enumerate() {
            if i > 0 {
                query.push_str(", ");
            }
            query.push_str(field);
            query.push_str(if *desc { " DESC" } else { " ASC" });
        }

        let start = (self.page - 1).saturating_mul(self.limit);
        query.push_str(&format!(" LIMIT {} START {}", self.limit, start));

        (query, binds)
    }
}

/// Split `field` / `field[op]` and validate both parts
fn parse_filter_key(key: &str) -> Option<(&str, FilterOp)> {
    match key.find('[') {
        Some(open) => {
            let field = &key[..open];
            let rest = &key[open + 1..];
            let op = rest.strip_suffix(']')?;
            if !is_identifier(field) {
                return None;
            }
            Some((field, FilterOp::parse(op)?))
        }
        None => {
            if !is_identifier(key) {
                return None;
            }
            Some((key, FilterOp::Eq))
        }
    }
}

/// Coerce a raw parameter value the way a schema cast would:
/// bool, then integer, then float, else string
fn coerce_value(raw: &str) -> Value {
    if raw == "true" {
        return Value::Bool(true);
    }
    if raw == "false" {
        return Value::Bool(false);
    }
    if let Ok(int) = raw.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(float) = raw.parse::<f64>()
        && float.is_finite()
    {
        return Value::from(float);
    }
    Value::from(raw)
}

fn positive_or(raw: Option<&String>, default: u64) -> u64 {
    raw.and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
