//! Filter/query builder
//!
//! Translates loosely-typed query-string parameters into BSON criteria and
//! sort documents. Malformed or absent fields never error; they are simply
//! omitted or defaulted, so a garbage query degrades to "no constraint".

use bson::{doc, oid::ObjectId, Document};

/// Raw toy query parameters, as parsed from the query string
#[derive(Debug, Default, Clone)]
pub struct ToyQuery {
    pub txt: Option<String>,
    pub in_stock: Option<String>,
    /// Accumulated from repeated `labels` params and comma-separated values
    pub labels: Vec<String>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
}

impl ToyQuery {
    /// Parse from a raw query string (`txt=elmo&labels=doll,baby&sortDir=-1`).
    pub fn from_query(query: &str) -> Self {
        let mut q = ToyQuery::default();
        for (key, value) in parse_pairs(query) {
            match key.as_str() {
                "txt" => q.txt = Some(value),
                "inStock" => q.in_stock = Some(value),
                "labels" => q.labels.extend(split_labels(&value)),
                "sortBy" => q.sort_by = Some(value),
                "sortDir" => q.sort_dir = Some(value),
                _ => {}
            }
        }
        q
    }

    /// Build the find criteria. Absent fields impose no constraint.
    pub fn criteria(&self) -> Document {
        let mut criteria = Document::new();

        if let Some(txt) = self.txt.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            criteria.insert("name", doc! { "$regex": txt, "$options": "i" });
        }

        // Only the literal strings count; anything else means "no constraint"
        match self.in_stock.as_deref() {
            Some("true") => {
                criteria.insert("inStock", true);
            }
            Some("false") => {
                criteria.insert("inStock", false);
            }
            _ => {}
        }

        let labels: Vec<&str> = self
            .labels
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect();
        if !labels.is_empty() {
            criteria.insert("labels", doc! { "$in": labels });
        }

        criteria
    }

    /// Build the sort specification. Unrecognized fields silently fall back
    /// to name-ascending; this is relied on by existing clients.
    pub fn sort(&self) -> Document {
        let field = match self.sort_by.as_deref() {
            Some("price") => "price",
            Some("created") | Some("createdAt") => "createdAt",
            _ => "name",
        };

        let dir: i64 = match self.sort_dir.as_deref().map(str::trim).map(str::parse::<i64>) {
            Some(Ok(-1)) => -1,
            _ => 1,
        };

        doc! { field: dir }
    }
}

/// Raw review query parameters
#[derive(Debug, Default, Clone)]
pub struct ReviewQuery {
    pub txt: Option<String>,
    pub toy_id: Option<String>,
    pub user_id: Option<String>,
}

impl ReviewQuery {
    pub fn from_query(query: &str) -> Self {
        let mut q = ReviewQuery::default();
        for (key, value) in parse_pairs(query) {
            match key.as_str() {
                "txt" => q.txt = Some(value),
                "toyId" => q.toy_id = Some(value),
                "userId" => q.user_id = Some(value),
                _ => {}
            }
        }
        q
    }

    /// Build the `$match` stage criteria. Reference filters only apply when
    /// they parse as valid ids; invalid ids impose no constraint.
    pub fn criteria(&self) -> Document {
        let mut criteria = Document::new();

        if let Some(oid) = self.toy_id.as_deref().and_then(|id| ObjectId::parse_str(id).ok()) {
            criteria.insert("toyId", oid);
        }
        if let Some(oid) = self.user_id.as_deref().and_then(|id| ObjectId::parse_str(id).ok()) {
            criteria.insert("userId", oid);
        }
        if let Some(txt) = self.txt.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            criteria.insert("txt", doc! { "$regex": txt, "$options": "i" });
        }

        criteria
    }
}

/// Split a percent-encoded query string into decoded key/value pairs.
/// Undecodable components are dropped rather than surfaced as errors.
fn parse_pairs(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|part| !part.is_empty())
        .filter_map(|part| {
            let (key, value) = part.split_once('=').unwrap_or((part, ""));
            let key = urlencoding::decode(key).ok()?;
            let value = value.replace('+', " ");
            let value = urlencoding::decode(&value).ok()?;
            Some((key.into_owned(), value.into_owned()))
        })
        .collect()
}

/// Split a labels value on commas, dropping blank entries.
fn split_labels(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
