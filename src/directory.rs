//! Currency Directory Reconciliation
//!
//! The directory service lists currencies in two variants selected by the
//! `d` query flag: entries whose rates are set daily (`d=0`) and entries set
//! monthly (`d=1`). Neither list alone covers every code the daily-rates
//! endpoint may return, so the reference set is the union of both.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::document::ParsedDocument;
use crate::error::{ConformanceError, Result};
use crate::http_client::{AsyncHttpClient, RequestOptions};

/// Field holding the ISO 4217 numeric code in directory entries
pub const ISO_NUM_CODE_FIELD: &str = "ISO_Num_Code";

/// Query flag selecting a directory variant
pub const VARIANT_PARAM: &str = "d";

/// Directory list variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryVariant {
    /// Currencies whose rates are set every day
    Daily,
    /// Currencies whose rates are set monthly
    Monthly,
}

impl DirectoryVariant {
    pub const ALL: [DirectoryVariant; 2] = [DirectoryVariant::Daily, DirectoryVariant::Monthly];

    pub fn query_flag(self) -> &'static str {
        match self {
            DirectoryVariant::Daily => "0",
            DirectoryVariant::Monthly => "1",
        }
    }
}

impl fmt::Display for DirectoryVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectoryVariant::Daily => write!(f, "daily"),
            DirectoryVariant::Monthly => write!(f, "monthly"),
        }
    }
}

/// What to do with a code value that is not an unsigned integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodePolicy {
    /// Abort the reconciliation with `ConformanceError::CodeConversion`
    #[default]
    Reject,
    /// Drop the entry and log a warning
    Skip,
}

impl std::str::FromStr for CodePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reject" => Ok(CodePolicy::Reject),
            "skip" => Ok(CodePolicy::Skip),
            other => Err(format!("unknown code policy: {}", other)),
        }
    }
}

/// Deduplicated set of numeric currency codes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CurrencyCodeSet {
    codes: BTreeSet<u32>,
}

impl CurrencyCodeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, code: u32) -> bool {
        self.codes.contains(&code)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Codes in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.codes.iter().copied()
    }
}

impl FromIterator<u32> for CurrencyCodeSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self {
            codes: iter.into_iter().collect(),
        }
    }
}

impl Extend<u32> for CurrencyCodeSet {
    fn extend<I: IntoIterator<Item = u32>>(&mut self, iter: I) {
        self.codes.extend(iter);
    }
}

/// Collect the integer values of `field` from every top-level child of `doc`
///
/// Elements with no text are skipped. Values are trimmed before conversion;
/// anything left that is not an unsigned integer is handled per `policy`.
pub fn extract_codes(doc: &ParsedDocument, field: &str, policy: CodePolicy) -> Result<Vec<u32>> {
    let mut codes = Vec::new();

    for entry in doc.root().children() {
        for element in entry.iter(field) {
            let Some(text) = element.text() else {
                continue;
            };
            let value = text.trim();
            if value.is_empty() {
                continue;
            }
            match value.parse::<u32>() {
                Ok(code) => codes.push(code),
                Err(_) => match policy {
                    CodePolicy::Reject => {
                        return Err(ConformanceError::CodeConversion {
                            field: field.to_string(),
                            value: text.to_string(),
                        });
                    }
                    CodePolicy::Skip => {
                        warn!(
                            field,
                            value = text,
                            entry = entry.attribute("ID").unwrap_or("<unknown>"),
                            "skipping non-numeric code"
                        );
                    }
                },
            }
        }
    }

    Ok(codes)
}

/// Fetch one directory variant and extract its codes
pub async fn fetch_variant_codes(
    client: &AsyncHttpClient,
    directory_path: &str,
    variant: DirectoryVariant,
    policy: CodePolicy,
) -> Result<Vec<u32>> {
    let options = RequestOptions::new().param(VARIANT_PARAM, variant.query_flag());
    let response = client.get(directory_path, &options).await?;
    let doc = ParsedDocument::parse(&response.body)?;
    extract_codes(&doc, ISO_NUM_CODE_FIELD, policy)
}

/// Fetch both directory variants and reconcile them into one reference set
///
/// The two requests run one after the other. A timeout on either aborts the
/// reconciliation with `NetworkError::Timeout`.
pub async fn fetch_reference_codes(
    client: &AsyncHttpClient,
    directory_path: &str,
    policy: CodePolicy,
) -> Result<CurrencyCodeSet> {
    let mut reference = CurrencyCodeSet::new();

    for variant in DirectoryVariant::ALL {
        let codes = fetch_variant_codes(client, directory_path, variant, policy).await?;
        info!(variant = %variant, codes = codes.len(), "directory variant fetched");
        reference.extend(codes);
    }

    info!(unique = reference.len(), "reference codes reconciled");
    Ok(reference)
}
