use std::time::Duration;

use chrono::Utc;
use mews_http::{
    resources::{bills, common::TimeInterval},
    MewsClient,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut client = MewsClient::from_env().map_err(anyhow::Error::msg)?;
    client.set_language_code("en-US");
    client.set_timeout(Duration::from_secs(10));
    client.set_max_retries(2);
    client.set_debug(std::env::var_os("MEWS_DEBUG").is_some());

    let config = client
        .configuration()
        .get(&mut Default::default())
        .await?;
    println!("{} ({})", config.enterprise.name, config.enterprise.time_zone_identifier);

    let now = Utc::now();
    let mut request = bills::AllRequest {
        closed_utc: TimeInterval::new(now - chrono::Duration::days(7), now),
        state: Some(bills::BillState::Closed),
        ..Default::default()
    };
    let page = client.bills().all(&mut request).await?;

    for bill in page.bills {
        println!("{} {:?}", bill.id, bill.number);
    }

    Ok(())
}
