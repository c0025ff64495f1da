//! `customers/*` operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{Limitation, TimeInterval};
use crate::{BaseRequest, MewsClient, Result};

const ENDPOINT_ALL: &str = "customers/getAll";

#[derive(Clone, Copy, Debug)]
pub struct Customers<'a> {
    client: &'a MewsClient,
}

impl<'a> Customers<'a> {
    pub(crate) fn new(client: &'a MewsClient) -> Self {
        Self { client }
    }

    /// Request returning customers together with their addresses.
    pub fn new_all_request(&self) -> AllRequest {
        AllRequest {
            extent: Some(CustomersExtent {
                customers: true,
                documents: false,
                addresses: true,
            }),
            ..AllRequest::default()
        }
    }

    pub async fn all(&self, request: &mut AllRequest) -> Result<AllResponse> {
        self.client.call(ENDPOINT_ALL, request).await
    }
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AllRequest {
    #[serde(flatten)]
    pub base: BaseRequest,
    #[serde(skip_serializing_if = "Limitation::is_empty")]
    pub limitation: Limitation,
    #[serde(rename = "CustomerIds", skip_serializing_if = "Vec::is_empty")]
    pub customer_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub first_names: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub last_names: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub loyalty_codes: Vec<String>,
    #[serde(rename = "CreatedUtc", skip_serializing_if = "TimeInterval::is_empty")]
    pub created_utc: TimeInterval,
    #[serde(rename = "UpdatedUtc", skip_serializing_if = "TimeInterval::is_empty")]
    pub updated_utc: TimeInterval,
    /// Only matches deleted customers when `activity_states` includes `Deleted`.
    #[serde(rename = "DeletedUtc", skip_serializing_if = "TimeInterval::is_empty")]
    pub deleted_utc: TimeInterval,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub activity_states: Vec<ActivityState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extent: Option<CustomersExtent>,
}

authenticatable!(AllRequest);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityState {
    Active,
    Deleted,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomersExtent {
    #[serde(rename = "Customers")]
    pub customers: bool,
    #[serde(rename = "Documents")]
    pub documents: bool,
    #[serde(rename = "Addresses")]
    pub addresses: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AllResponse {
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Customer {
    #[serde(rename = "Id")]
    pub id: String,
    pub number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub language_code: Option<String>,
    pub nationality_code: Option<String>,
    pub classifications: Vec<String>,
    pub options: Vec<String>,
    #[serde(rename = "CompanyId")]
    pub company_id: Option<String>,
    #[serde(rename = "CreatedUtc")]
    pub created_utc: Option<DateTime<Utc>>,
    #[serde(rename = "UpdatedUtc")]
    pub updated_utc: Option<DateTime<Utc>>,
}
