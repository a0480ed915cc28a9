use anyhow::Result;
use httptest::{
    all_of,
    matchers::{contains, request, url_decoded},
    responders::json_encoded,
    Expectation, Server,
};
use serde_json::{json, Value};

use blacktri::{models::Trend, Filter};

use common::create_client;

pub mod common;

#[tokio::test]
async fn test_filter_is_appended_after_slash() -> Result<()> {
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/api/v1/accounts/"),
            request::query("status=ACTIVE&sort=-publicid"),
        ])
        .respond_with(json_encoded(json!([]))),
    );

    let client = create_client(&server);
    let _: Value = client
        .get_accounts(Some("status=ACTIVE&sort=-publicid"))
        .await?;
    Ok(())
}

#[tokio::test]
async fn test_filter_spaces_are_encoded() -> Result<()> {
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/api/v1/account/12/project/4/decisions/"),
            request::query("name=My%20Var&sort=-id"),
            request::query(url_decoded(contains(("name", "My Var")))),
        ])
        .respond_with(json_encoded(json!([]))),
    );

    let client = create_client(&server);
    let _: Value = client
        .get_decisions(4, Some("name=My Var&sort=-id"))
        .await?;
    Ok(())
}

#[tokio::test]
async fn test_leading_question_mark_is_stripped() -> Result<()> {
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/api/v1/account/12/projects/"),
            request::query("status=ACTIVE"),
        ])
        .respond_with(json_encoded(json!([]))),
    );

    let client = create_client(&server);
    let _: Value = client.get_projects(Some("?status=ACTIVE")).await?;
    Ok(())
}

#[tokio::test]
async fn test_empty_filter_uses_bare_path() -> Result<()> {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/api/v1/account/12/project/4/goals"))
            .times(2)
            .respond_with(json_encoded(json!([]))),
    );

    let client = create_client(&server);
    let _: Value = client.get_goals(4, None).await?;
    let _: Value = client.get_goals(4, Some("")).await?;
    Ok(())
}

#[tokio::test]
async fn test_trend_with_filter_builder() -> Result<()> {
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/api/v1/account/12/project/456/trend/"),
            request::query(url_decoded(contains(("entries", "50")))),
            request::query(url_decoded(contains(("enddate", "2015-01-31")))),
            request::query(url_decoded(contains(("goalid", "74")))),
        ])
        .respond_with(json_encoded(json!({
            "2015-01-30": {
                "1": {"name": "Original", "impressions": 100, "conversions": 10, "aggregatedcr": 0.1}
            },
            "2015-01-31": {
                "1": {"name": "Original", "impressions": 210, "conversions": 22, "aggregatedcr": 0.104}
            }
        }))),
    );

    let client = create_client(&server);
    let filter = Filter::new()
        .param("entries", 50)
        .param("enddate", "2015-01-31")
        .param("goalid", 74);
    let trend: Trend = client
        .get_trend(456, Some(&filter.to_string()))
        .await?;

    assert_eq!(trend.entries.len(), 2);
    assert_eq!(trend.entries[1].day, "2015-01-31");
    assert_eq!(trend.entries[1].experiments[0].data.impressions, Some(210));
    Ok(())
}

#[tokio::test]
async fn test_filtered_goals_and_decision_groups() -> Result<()> {
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/api/v1/account/12/project/4/goals/"),
            request::query("level=PRIMARY&sort=-id"),
        ])
        .respond_with(json_encoded(json!([]))),
    );
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/api/v1/account/12/project/4/decisiongroups/"),
            request::query("status=RUNNING"),
        ])
        .respond_with(json_encoded(json!([]))),
    );
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/api/v1/account/12/project/4/decisiongroup/8/decisions/"),
            request::query("name=Headline%20A"),
        ])
        .respond_with(json_encoded(json!([]))),
    );

    let client = create_client(&server);
    let _: Value = client
        .get_goals(4, Some("level=PRIMARY&sort=-id"))
        .await?;
    let _: Value = client
        .get_decision_groups(4, Some("?status=RUNNING"))
        .await?;
    let _: Value = client
        .get_group_decisions(4, 8, Some("name=Headline A"))
        .await?;
    Ok(())
}
