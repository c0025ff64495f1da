//! `bills/*` operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{Limitation, TimeInterval};
use crate::{BaseRequest, MewsClient, Result};

const ENDPOINT_ALL: &str = "bills/getAll";
const ENDPOINT_GET_PDF: &str = "bills/getPDF";

/// Bill operations of a [`MewsClient`].
#[derive(Clone, Copy, Debug)]
pub struct Bills<'a> {
    client: &'a MewsClient,
}

impl<'a> Bills<'a> {
    pub(crate) fn new(client: &'a MewsClient) -> Self {
        Self { client }
    }

    /// Returns bills matching the filters.
    pub async fn all(&self, request: &mut AllRequest) -> Result<AllResponse> {
        self.client.call(ENDPOINT_ALL, request).await
    }

    /// Creates a PDF of a bill, or a print event to poll for it later.
    pub async fn get_pdf(&self, request: &mut GetPdfRequest) -> Result<GetPdfResponse> {
        self.client.call(ENDPOINT_GET_PDF, request).await
    }
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AllRequest {
    #[serde(flatten)]
    pub base: BaseRequest,
    #[serde(skip_serializing_if = "Limitation::is_empty")]
    pub limitation: Limitation,
    #[serde(rename = "BillIds", skip_serializing_if = "Vec::is_empty")]
    pub bill_ids: Vec<String>,
    #[serde(rename = "CustomerIds", skip_serializing_if = "Vec::is_empty")]
    pub customer_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<BillState>,
    #[serde(rename = "IssuedUtc", skip_serializing_if = "TimeInterval::is_empty")]
    pub issued_utc: TimeInterval,
    #[serde(rename = "CreatedUtc", skip_serializing_if = "TimeInterval::is_empty")]
    pub created_utc: TimeInterval,
    #[serde(rename = "UpdatedUtc", skip_serializing_if = "TimeInterval::is_empty")]
    pub updated_utc: TimeInterval,
    #[serde(rename = "ClosedUtc", skip_serializing_if = "TimeInterval::is_empty")]
    pub closed_utc: TimeInterval,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extent: Option<BillExtent>,
}

authenticatable!(AllRequest);

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AllResponse {
    #[serde(default)]
    pub bills: Vec<Bill>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BillState {
    Open,
    Closed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BillExtent {
    pub items: bool,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Bill {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(default)]
    pub number: Option<String>,
    pub state: BillState,
    #[serde(rename = "CustomerId", default)]
    pub customer_id: Option<String>,
    #[serde(rename = "CompanyId", default)]
    pub company_id: Option<String>,
    #[serde(rename = "CreatedUtc", default)]
    pub created_utc: Option<DateTime<Utc>>,
    #[serde(rename = "IssuedUtc", default)]
    pub issued_utc: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetPdfRequest {
    #[serde(flatten)]
    pub base: BaseRequest,
    #[serde(rename = "BillId")]
    pub bill_id: String,
    #[serde(rename = "BillPrintEventId", skip_serializing_if = "String::is_empty")]
    pub bill_print_event_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_template: Option<PdfTemplate>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub print_reason: String,
}

impl GetPdfRequest {
    pub fn new(bill_id: impl Into<String>) -> Self {
        Self {
            bill_id: bill_id.into(),
            ..Self::default()
        }
    }
}

authenticatable!(GetPdfRequest);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PdfTemplate {
    Detailed,
    Consumption,
    Reservation,
    OrderItem,
    Guest,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct GetPdfResponse {
    #[serde(rename = "BillId")]
    pub bill_id: String,
    #[serde(rename = "Result")]
    pub result: BillPdfResult,
}

/// Either the rendered file or a print event to retry with once rendering
/// has finished, selected by `Discriminator`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "Discriminator", content = "Value")]
pub enum BillPdfResult {
    #[serde(rename = "BillPdfFile")]
    File(BillPdfFile),
    #[serde(rename = "BillPrintEvent")]
    PrintEvent(BillPrintEvent),
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct BillPdfFile {
    #[serde(rename = "Base64Data")]
    pub base64_data: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct BillPrintEvent {
    #[serde(rename = "BillPrintEventId")]
    pub bill_print_event_id: String,
}

#[cfg(test)]
mod tests {
    use super::{AllRequest, BillPdfResult, BillState, GetPdfRequest, GetPdfResponse};

    #[test]
    fn empty_all_request_only_sends_access_token() {
        let json = serde_json::to_value(AllRequest::default()).unwrap();
        assert_eq!(json, serde_json::json!({ "AccessToken": "" }));
    }

    #[test]
    fn all_request_serializes_set_filters() {
        let request = AllRequest {
            bill_ids: vec!["b1".to_owned()],
            state: Some(BillState::Closed),
            ..AllRequest::default()
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["BillIds"], serde_json::json!(["b1"]));
        assert_eq!(json["State"], "Closed");
        assert!(json.get("Limitation").is_none());
        assert!(json.get("ClosedUtc").is_none());
    }

    #[test]
    fn get_pdf_request_always_sends_bill_id() {
        let json = serde_json::to_value(GetPdfRequest::new("bill-1")).unwrap();
        assert_eq!(json["BillId"], "bill-1");
        assert!(json.get("BillPrintEventId").is_none());
        assert!(json.get("PdfTemplate").is_none());
    }

    #[test]
    fn pdf_result_dispatches_on_discriminator() {
        let file: GetPdfResponse = serde_json::from_str(
            r#"{"BillId":"b1","Result":{"Discriminator":"BillPdfFile","Value":{"Base64Data":"JVBERi0="}}}"#,
        )
        .unwrap();
        match file.result {
            BillPdfResult::File(file) => assert_eq!(file.base64_data, "JVBERi0="),
            other => panic!("expected file, got {other:?}"),
        }

        let event: GetPdfResponse = serde_json::from_str(
            r#"{"BillId":"b1","Result":{"Discriminator":"BillPrintEvent","Value":{"BillPrintEventId":"e1"}}}"#,
        )
        .unwrap();
        assert!(matches!(event.result, BillPdfResult::PrintEvent(ref e) if e.bill_print_event_id == "e1"));
    }

    #[test]
    fn pdf_result_rejects_unknown_discriminator() {
        let result = serde_json::from_str::<GetPdfResponse>(
            r#"{"BillId":"b1","Result":{"Discriminator":"Receipt","Value":{}}}"#,
        );
        assert!(result.is_err());
    }
}
