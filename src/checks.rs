//! Conformance checks against the daily rates endpoint
//!
//! Every check issues its own requests and either passes or returns a
//! [`CheckError`]. Assertion messages carry the offending value.

use std::fmt;

use chrono::NaiveDate;

use crate::config::ServiceConfig;
use crate::directory::{self, CodePolicy};
use crate::document::ParsedDocument;
use crate::error::{ConformanceError, NetworkError};
use crate::http_client::{ApiResponse, AsyncHttpClient, RequestOptions};
use crate::schema::SchemaStore;

/// Date format accepted by the `date_req` parameter
pub const REQUEST_DATE_FORMAT: &str = "%d/%m/%Y";

/// Date format of the root `Date` attribute
pub const RESPONSE_DATE_FORMAT: &str = "%d.%m.%Y";

/// Root attribute carrying the rates date
pub const DATE_ATTRIBUTE: &str = "Date";

/// Field holding the numeric currency code in daily rates
pub const NUM_CODE_FIELD: &str = "NumCode";

/// Attribute identifying a top-level entry
pub const ID_ATTRIBUTE: &str = "ID";

/// Why a check did not pass
#[derive(Debug)]
pub enum CheckError {
    /// The service answered but the answer is wrong
    Assertion(String),
    /// A request exceeded the permitted time
    Timeout(NetworkError),
    /// The check could not be carried out
    Fault(ConformanceError),
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckError::Assertion(message) => write!(f, "{}", message),
            CheckError::Timeout(error) => write!(f, "{}", error),
            CheckError::Fault(error) => write!(f, "{}", error),
        }
    }
}

impl From<ConformanceError> for CheckError {
    fn from(error: ConformanceError) -> Self {
        match error {
            ConformanceError::Network(network) => network.into(),
            other => CheckError::Fault(other),
        }
    }
}

impl From<NetworkError> for CheckError {
    fn from(error: NetworkError) -> Self {
        match error {
            timeout @ NetworkError::Timeout { .. } => CheckError::Timeout(timeout),
            other => CheckError::Fault(ConformanceError::Network(other)),
        }
    }
}

pub type CheckResult = std::result::Result<(), CheckError>;

fn ensure(condition: bool, message: impl FnOnce() -> String) -> CheckResult {
    if condition {
        Ok(())
    } else {
        Err(CheckError::Assertion(message()))
    }
}

/// One runnable conformance check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    SchemaConformance,
    RootTag,
    CurrentDate,
    /// Requested date in `dd/mm/yyyy` form
    RequestedDate(String),
    CurrencyCodes,
    FieldCompleteness,
}

impl Check {
    /// Catalogue in run order, with one requested-date check per date
    pub fn catalogue(historical_dates: &[String]) -> Vec<Check> {
        let mut checks = vec![Check::SchemaConformance, Check::RootTag, Check::CurrentDate];
        checks.extend(historical_dates.iter().cloned().map(Check::RequestedDate));
        checks.push(Check::CurrencyCodes);
        checks.push(Check::FieldCompleteness);
        checks
    }

    pub fn name(&self) -> String {
        match self {
            Check::SchemaConformance => "schema_conformance".to_string(),
            Check::RootTag => "root_tag".to_string(),
            Check::CurrentDate => "current_date".to_string(),
            Check::RequestedDate(date) => format!("requested_date[{}]", date),
            Check::CurrencyCodes => "currency_codes".to_string(),
            Check::FieldCompleteness => "field_completeness".to_string(),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Check::SchemaConformance => "response body validates against the XSD",
            Check::RootTag => "root element has the expected tag",
            Check::CurrentDate => "root date is today when no date is requested",
            Check::RequestedDate(_) => "root date is the requested date",
            Check::CurrencyCodes => "numeric codes are digits and listed in the directory",
            Check::FieldCompleteness => "every field of every entry is filled",
        }
    }

    pub async fn run(&self, ctx: &CheckContext<'_>) -> CheckResult {
        match self {
            Check::SchemaConformance => schema_conformance(ctx).await,
            Check::RootTag => root_tag(ctx).await,
            Check::CurrentDate => current_date(ctx).await,
            Check::RequestedDate(date) => requested_date(ctx, date).await,
            Check::CurrencyCodes => currency_codes(ctx).await,
            Check::FieldCompleteness => field_completeness(ctx).await,
        }
    }
}

/// Everything a check needs, borrowed from the suite
pub struct CheckContext<'a> {
    pub client: &'a AsyncHttpClient,
    pub schemas: &'a SchemaStore,
    pub service: &'a ServiceConfig,
    pub code_policy: CodePolicy,
    pub today: NaiveDate,
}

impl CheckContext<'_> {
    async fn fetch_daily(&self, date_req: Option<&str>) -> Result<ApiResponse, NetworkError> {
        let path = match date_req {
            Some(date) => format!("{}?date_req={}", self.service.daily_path, date),
            None => self.service.daily_path.clone(),
        };
        self.client.get(&path, &RequestOptions::new()).await
    }

    async fn parse_daily(&self, date_req: Option<&str>) -> Result<ParsedDocument, CheckError> {
        let response = self.fetch_daily(date_req).await?;
        Ok(ParsedDocument::parse(&response.body)?)
    }
}

fn date_attribute(doc: &ParsedDocument) -> Result<&str, CheckError> {
    doc.root().attribute(DATE_ATTRIBUTE).ok_or_else(|| {
        CheckError::Assertion(format!(
            "root element {} has no {} attribute",
            doc.root().tag(),
            DATE_ATTRIBUTE
        ))
    })
}

/// The daily response validates against the XSD
pub async fn schema_conformance(ctx: &CheckContext<'_>) -> CheckResult {
    let response = ctx.fetch_daily(None).await?;
    let report = ctx.schemas.validate(&response.body).await?;

    ensure(report.valid, || {
        format!(
            "response body does not conform to the schema: {}",
            report.error_log()
        )
    })
}

/// The root element carries the expected tag
pub async fn root_tag(ctx: &CheckContext<'_>) -> CheckResult {
    let doc = ctx.parse_daily(None).await?;
    let tag = doc.root().tag();

    ensure(tag == ctx.service.root_tag, || {
        format!(
            "root element is {}, expected {}",
            tag, ctx.service.root_tag
        )
    })
}

/// Without a date parameter the root date is today
pub async fn current_date(ctx: &CheckContext<'_>) -> CheckResult {
    let doc = ctx.parse_daily(None).await?;
    let actual = date_attribute(&doc)?;
    let expected = ctx.today.format(RESPONSE_DATE_FORMAT).to_string();

    ensure(actual == expected, || {
        format!(
            "current date {} does not match the date in the response {}",
            expected, actual
        )
    })
}

/// The root date echoes the requested `dd/mm/yyyy` date as `dd.mm.yyyy`
pub async fn requested_date(ctx: &CheckContext<'_>, date_req: &str) -> CheckResult {
    let doc = ctx.parse_daily(Some(date_req)).await?;
    let actual = date_attribute(&doc)?;
    let expected = date_req.replace('/', ".");

    ensure(actual == expected, || {
        format!(
            "requested date {} does not match the date in the response {}",
            expected, actual
        )
    })
}

/// Every numeric code is all digits and present in the reconciled directory
pub async fn currency_codes(ctx: &CheckContext<'_>) -> CheckResult {
    let doc = ctx.parse_daily(None).await?;
    let reference =
        directory::fetch_reference_codes(ctx.client, &ctx.service.directory_path, ctx.code_policy)
            .await?;

    for entry in doc.root().children() {
        for num_code in entry.iter(NUM_CODE_FIELD) {
            let text = num_code.text().unwrap_or("");
            ensure(
                !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()),
                || format!("{} contains more than digits: {:?}", NUM_CODE_FIELD, text),
            )?;

            let code = text.parse::<u32>().map_err(|_| {
                CheckError::Assertion(format!("{} out of range: {}", NUM_CODE_FIELD, text))
            })?;
            ensure(reference.contains(code), || {
                format!(
                    "currency code {} from the response is not in the currency directory",
                    text
                )
            })?;
        }
    }

    Ok(())
}

/// Every leaf field of every top-level entry has text
pub async fn field_completeness(ctx: &CheckContext<'_>) -> CheckResult {
    let doc = ctx.parse_daily(None).await?;

    for entry in doc.root().children() {
        for field in entry.leaves() {
            ensure(field.text().is_some(), || {
                format!(
                    "entry {} has an empty field {}",
                    entry.attribute(ID_ATTRIBUTE).unwrap_or("<unknown>"),
                    field.tag()
                )
            })?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_order_and_names() {
        let dates = vec!["02/03/2002".to_string(), "31/12/2010".to_string()];
        let names: Vec<_> = Check::catalogue(&dates).iter().map(Check::name).collect();
        assert_eq!(
            names,
            vec![
                "schema_conformance",
                "root_tag",
                "current_date",
                "requested_date[02/03/2002]",
                "requested_date[31/12/2010]",
                "currency_codes",
                "field_completeness",
            ]
        );
    }

    #[test]
    fn test_timeout_becomes_timeout_variant() {
        let error: CheckError = ConformanceError::Network(NetworkError::Timeout {
            url: "https://example.com".to_string(),
            timeout_seconds: 10,
        })
        .into();
        assert!(matches!(error, CheckError::Timeout(_)));

        let error: CheckError = ConformanceError::MalformedDocument {
            details: "bad".to_string(),
        }
        .into();
        assert!(matches!(error, CheckError::Fault(_)));
    }

    #[test]
    fn test_ensure() {
        assert!(ensure(true, || unreachable!()).is_ok());
        match ensure(false, || "boom".to_string()) {
            Err(CheckError::Assertion(message)) => assert_eq!(message, "boom"),
            other => panic!("Expected Assertion, got {:?}", other),
        }
    }

    #[test]
    fn test_date_formats_agree() {
        let date = NaiveDate::parse_from_str("31/12/2010", REQUEST_DATE_FORMAT).unwrap();
        assert_eq!(date.format(RESPONSE_DATE_FORMAT).to_string(), "31.12.2010");
    }
}
