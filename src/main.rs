use anyhow::{Context, Result};
use serde_json::Value;

use blacktri::{
    models::{BlackTriOptions, Project, UserType},
    Client, Filter,
};

#[tokio::main]
async fn main() -> Result<()> {
    let api_key = std::env::var("BLACKTRI_API_KEY").context("BLACKTRI_API_KEY is not set")?;
    let api_secret =
        std::env::var("BLACKTRI_API_SECRET").context("BLACKTRI_API_SECRET is not set")?;

    let client = Client::login(
        api_key,
        api_secret,
        UserType::Client,
        BlackTriOptions {
            api_url: std::env::var("BLACKTRI_API_URL").ok(),
            ..BlackTriOptions::new(0)
        },
    )
    .await?;
    println!("logged in as account {}", client.client_id());

    let account: Value = client.get_account(client.client_id()).await?;
    println!("{:#}", account);

    let filter = Filter::new()
        .sort_desc("createddate")
        .fields(["id", "name", "status", "visitors", "conversions"]);
    let projects: Option<Vec<Project>> = client.get_projects(Some(&filter.to_string())).await?;
    for project in projects.unwrap_or_default() {
        println!(
            "{:?} {:?} {:?} visitors={:?} conversions={:?}",
            project.id, project.name, project.status, project.visitors, project.conversions
        );
    }

    Ok(())
}
