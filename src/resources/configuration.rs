//! `configuration/get`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BaseRequest, MewsClient, Result};

const ENDPOINT_GET: &str = "configuration/get";

#[derive(Clone, Copy, Debug)]
pub struct Configuration<'a> {
    client: &'a MewsClient,
}

impl<'a> Configuration<'a> {
    pub(crate) fn new(client: &'a MewsClient) -> Self {
        Self { client }
    }

    /// Returns the configuration of the enterprise the access token belongs to.
    pub async fn get(&self, request: &mut GetRequest) -> Result<GetResponse> {
        self.client.call(ENDPOINT_GET, request).await
    }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct GetRequest {
    #[serde(flatten)]
    pub base: BaseRequest,
}

authenticatable!(GetRequest);

#[derive(Clone, Debug, Deserialize)]
pub struct GetResponse {
    #[serde(rename = "NowUtc")]
    pub now_utc: DateTime<Utc>,
    #[serde(rename = "Enterprise")]
    pub enterprise: Enterprise,
    #[serde(rename = "IsIdentityDocumentNumberRequired", default)]
    pub is_identity_document_number_required: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Enterprise {
    #[serde(rename = "Id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "ChainId")]
    pub chain_id: Option<String>,
    pub time_zone_identifier: String,
    pub legal_environment_code: Option<String>,
    pub default_language_code: Option<String>,
    #[serde(rename = "WebsiteUrl")]
    pub website_url: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub currencies: Vec<Currency>,
    pub is_portfolio: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Currency {
    pub currency: String,
    pub is_default: bool,
    pub is_enabled: bool,
}

impl Enterprise {
    /// The enterprise's default currency code, if one is flagged.
    pub fn default_currency(&self) -> Option<&str> {
        self.currencies
            .iter()
            .find(|currency| currency.is_default)
            .map(|currency| currency.currency.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::GetResponse;

    #[test]
    fn decodes_enterprise_and_default_currency() {
        let response: GetResponse = serde_json::from_str(
            r#"{
                "NowUtc": "2024-05-01T10:00:00Z",
                "Enterprise": {
                    "Id": "e1",
                    "Name": "Hotel",
                    "TimeZoneIdentifier": "Europe/Amsterdam",
                    "Currencies": [
                        { "Currency": "USD", "IsDefault": false, "IsEnabled": true },
                        { "Currency": "EUR", "IsDefault": true, "IsEnabled": true }
                    ]
                }
            }"#,
        )
        .unwrap();

        assert_eq!(response.enterprise.name, "Hotel");
        assert_eq!(response.enterprise.default_currency(), Some("EUR"));
        assert!(!response.is_identity_document_number_required);
    }
}
