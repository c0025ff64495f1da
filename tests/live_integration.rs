use std::fs;

use chrono::{Duration, Utc};
use mews_http::{
    resources::{
        common::{Limitation, TimeInterval},
        configuration, customers,
    },
    MewsClient, MewsError,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SecretsFile {
    #[serde(rename = "MEWS_ACCESS_TOKEN")]
    access_token: Option<String>,
    #[serde(rename = "MEWS_CLIENT_TOKEN")]
    client_token: Option<String>,
    #[serde(rename = "MEWS_BASE_URL")]
    base_url: Option<String>,
}

fn load_live_client() -> Result<MewsClient, String> {
    if let Ok(client) = MewsClient::from_env() {
        return Ok(client);
    }

    let content = fs::read_to_string("secrets.json").map_err(|_| {
        "MEWS_ACCESS_TOKEN/MEWS_CLIENT_TOKEN env or secrets.json is required".to_owned()
    })?;
    let parsed: SecretsFile = serde_json::from_str(&content)
        .map_err(|err| format!("secrets.json could not be parsed: {err}"))?;

    let access_token = parsed
        .access_token
        .ok_or_else(|| "missing MEWS_ACCESS_TOKEN in secrets.json".to_owned())?;
    let client_token = parsed
        .client_token
        .ok_or_else(|| "missing MEWS_CLIENT_TOKEN in secrets.json".to_owned())?;

    let mut client = MewsClient::demo(access_token, client_token);
    if let Some(base_url) = parsed.base_url {
        client.set_base_url(base_url);
    }
    Ok(client)
}

#[tokio::test]
async fn live_configuration_and_customers() {
    let mut client = match load_live_client() {
        Ok(client) => client,
        Err(_) => {
            eprintln!("skipping live test: credentials not found in env or secrets.json");
            return;
        }
    };
    client.set_debug(true);

    let config = client
        .configuration()
        .get(&mut configuration::GetRequest::default())
        .await
        .expect("configuration/get must succeed");
    assert!(!config.enterprise.id.is_empty());

    let customers = client.customers();
    let mut request = customers.new_all_request();
    request.limitation = Limitation::new(10);
    request.updated_utc = TimeInterval::new(Utc::now() - Duration::days(1), Utc::now());
    let page = customers
        .all(&mut request)
        .await
        .expect("customers/getAll must succeed");
    assert!(page.customers.len() <= 10);

    client.set_access_token("invalid-token");
    let err = client
        .configuration()
        .get(&mut configuration::GetRequest::default())
        .await
        .expect_err("invalid token must be rejected");
    assert!(matches!(err, MewsError::Api(_)));
}
