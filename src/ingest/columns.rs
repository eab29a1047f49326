//! Header disambiguation across ad-platform export conventions

use crate::error::{RoasError, RoasResult};
use crate::types::CanonicalField;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Built-in aliases per canonical field, highest priority first
const DEFAULT_ALIASES: [(CanonicalField, &[&str]); 6] = [
    (
        CanonicalField::Date,
        &["date", "날짜", "일자", "day", "보고 시작", "reporting starts", "일", "기간"],
    ),
    (
        CanonicalField::AdSpend,
        &[
            "adSpend",
            "ad spend",
            "광고비",
            "cost",
            "spend",
            "amount spent",
            "지출 금액",
            "비용",
            "총비용",
            "광고 비용",
        ],
    ),
    (
        CanonicalField::Revenue,
        &[
            "revenue",
            "매출",
            "매출액",
            "sales",
            "purchase conversion value",
            "purchases conversion value",
            "website purchase conversion value",
            "전환값",
            "전환 가치",
            "구매 전환값",
            "conversion value",
            "total conversion value",
        ],
    ),
    (
        CanonicalField::Conversions,
        &[
            "conversions",
            "전환수",
            "전환",
            "purchase",
            "purchases",
            "orders",
            "구매",
            "구매수",
            "results",
        ],
    ),
    (
        CanonicalField::Clicks,
        &[
            "clicks",
            "클릭수",
            "클릭",
            "link clicks",
            "outbound clicks",
            "clicks (all)",
            "링크 클릭",
        ],
    ),
    (
        CanonicalField::Impressions,
        &["impressions", "노출수", "노출", "reach", "도달", "imps"],
    ),
];

/// A header resolved to a canonical field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedColumn {
    pub header: String,
    pub index: usize,
}

/// Outcome of matching one header row, before required fields are enforced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ColumnLookup {
    pub found: BTreeMap<CanonicalField, ResolvedColumn>,
}

impl ColumnLookup {
    pub fn get(&self, field: CanonicalField) -> Option<&ResolvedColumn> {
        self.found.get(&field)
    }

    /// Required fields with no matching header, in canonical order
    pub fn missing_required(&self) -> Vec<CanonicalField> {
        CanonicalField::ALL
            .iter()
            .copied()
            .filter(|f| f.is_required() && !self.found.contains_key(f))
            .collect()
    }

    /// Enforce the required fields, reporting all of the missing ones at once.
    pub fn require(self) -> RoasResult<ColumnMap> {
        let missing = self.missing_required();
        if !missing.is_empty() {
            return Err(RoasError::Schema { missing });
        }
        Ok(ColumnMap {
            columns: self.found,
        })
    }
}

/// Field → column index mapping used for every data row of a source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ColumnMap {
    columns: BTreeMap<CanonicalField, ResolvedColumn>,
}

impl ColumnMap {
    pub fn index(&self, field: CanonicalField) -> Option<usize> {
        self.columns.get(&field).map(|c| c.index)
    }

    pub fn header(&self, field: CanonicalField) -> Option<&str> {
        self.columns.get(&field).map(|c| c.header.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CanonicalField, &ResolvedColumn)> {
        self.columns.iter()
    }
}

/// Maps variant header names onto [`CanonicalField`]s by alias priority
#[derive(Debug, Clone)]
pub struct ColumnResolver {
    aliases: BTreeMap<CanonicalField, Vec<String>>,
}

impl Default for ColumnResolver {
    fn default() -> Self {
        let aliases = DEFAULT_ALIASES
            .iter()
            .map(|(field, names)| (*field, names.iter().map(|n| n.to_string()).collect()))
            .collect();
        Self { aliases }
    }
}

impl ColumnResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an alias at the lowest priority for `field`
    pub fn with_alias(mut self, field: CanonicalField, alias: impl Into<String>) -> Self {
        self.aliases.entry(field).or_default().push(alias.into());
        self
    }

    pub fn aliases(&self, field: CanonicalField) -> &[String] {
        self.aliases.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Match a header row without enforcing required fields
    pub fn lookup<S: AsRef<str>>(&self, headers: &[S]) -> ColumnLookup {
        let normalized: Vec<String> = headers
            .iter()
            .map(|h| normalize_header(h.as_ref()))
            .collect();

        let mut found = BTreeMap::new();
        for field in CanonicalField::ALL {
            let hit = self.aliases(field).iter().find_map(|alias| {
                let alias = normalize_header(alias);
                normalized.iter().position(|h| *h == alias)
            });

            if let Some(index) = hit {
                let header = headers[index].as_ref().trim().to_string();
                debug!(field = %field, header = %header, index, "resolved column");
                found.insert(field, ResolvedColumn { header, index });
            } else {
                debug!(field = %field, "no matching column");
            }
        }

        ColumnLookup { found }
    }

    /// Resolve a header row, failing with every missing required field
    pub fn resolve<S: AsRef<str>>(&self, headers: &[S]) -> RoasResult<ColumnMap> {
        self.lookup(headers).require()
    }
}

/// Case-, spacing- and currency-suffix-insensitive header key
///
/// "Amount spent (KRW)" and "amount_spent" both become "amountspent".
pub fn normalize_header(header: &str) -> String {
    let mut h = header.trim().trim_start_matches('\u{feff}').trim().to_lowercase();
    if h.ends_with(')') {
        if let Some(open) = h.rfind('(') {
            let inner = &h[open + 1..h.len() - 1];
            // keep "(all)"-style qualifiers, drop currency codes
            if inner.len() == 3 && inner.chars().all(|c| c.is_ascii_alphabetic()) && inner != "all"
            {
                h.truncate(open);
            }
        }
    }
    h.chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .collect()
}
