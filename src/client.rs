use anyhow::Result;
use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{event, Level};

use crate::{
    http::BlackTriHttpClient,
    models::{BlackTriOptions, UserType},
    path::ResourcePath,
};

/// BlackTri client scoped to a single account.
///
/// Every method is generic over the response type, pass `serde_json::Value`
/// to get the server's answer untouched or one of the [`crate::models`] types.
/// Payloads are anything serializable, usually a model or a `json!` map.
/// Nothing is validated locally: ids, payloads and filters are forwarded as
/// they are and errors from the server are returned as they come.
#[derive(Clone)]
pub struct Client {
    client_id: u64,
    http_client: BlackTriHttpClient,
}

impl Client {
    pub fn new(api_key: String, api_secret: String, options: BlackTriOptions) -> Result<Self> {
        let http_client =
            BlackTriHttpClient::new(api_key, api_secret, options.api_url, options.timeout)?;
        Ok(Self {
            client_id: options.client_id,
            http_client,
        })
    }

    /// Logs in with the api credentials and returns a client scoped to the
    /// account id the server answers with. `options.client_id` is ignored.
    pub async fn login(
        api_key: String,
        api_secret: String,
        user_type: UserType,
        options: BlackTriOptions,
    ) -> Result<Self> {
        let mut client = Self::new(api_key, api_secret, options)?;
        client.client_id = client.http_client.login(user_type).await?;
        event!(Level::INFO, "Logged in as account {}", client.client_id);
        Ok(client)
    }

    pub fn client_id(&self) -> u64 {
        self.client_id
    }

    // Accounts

    /// Tenants only: lists the accounts of their clients.
    ///
    /// Filterable by subid, publicid, custom1, custom2, custom3, apikey,
    /// apisecret, email, emailvalidated and status. Sortable by publicid,
    /// custom1, custom2, custom3, apikey, email and createddate.
    pub async fn get_accounts<T: DeserializeOwned>(&self, filter: Option<&str>) -> Result<T> {
        let path = ResourcePath::root("accounts").with_filter(filter);
        self.request(path, Method::GET, None::<&()>).await
    }

    /// A tenant may ask for any of its clients, a client only for itself.
    pub async fn get_account<T: DeserializeOwned>(&self, account_id: u64) -> Result<T> {
        let path = ResourcePath::account(account_id);
        self.request(path, Method::GET, None::<&()>).await
    }

    pub async fn create_account<T, P>(&self, account: &P) -> Result<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let path = ResourcePath::root("account");
        self.request(path, Method::POST, Some(account)).await
    }

    pub async fn update_account<T, P>(&self, account_id: u64, account: &P) -> Result<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let path = ResourcePath::account(account_id);
        self.request(path, Method::PUT, Some(account)).await
    }

    // Projects

    /// Filterable by type and status, e.g. `type=SPLIT&status=RUNNING`.
    /// Accepts `sort` and a comma separated `fields` list.
    pub async fn get_projects<T: DeserializeOwned>(&self, filter: Option<&str>) -> Result<T> {
        let path = self.scoped().join("projects").with_filter(filter);
        self.request(path, Method::GET, None::<&()>).await
    }

    pub async fn get_project<T: DeserializeOwned>(&self, project_id: u64) -> Result<T> {
        self.request(self.project(project_id), Method::GET, None::<&()>)
            .await
    }

    pub async fn create_project<T, P>(&self, project: &P) -> Result<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        event!(Level::INFO, "Creating project for account {}", self.client_id);
        let path = self.scoped().join("project");
        self.request(path, Method::POST, Some(project)).await
    }

    pub async fn update_project<T, P>(&self, project_id: u64, project: &P) -> Result<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        self.request(self.project(project_id), Method::PUT, Some(project))
            .await
    }

    pub async fn delete_project<T: DeserializeOwned>(&self, project_id: u64) -> Result<T> {
        event!(Level::INFO, "Deleting project with id {}", project_id);
        self.request(self.project(project_id), Method::DELETE, None::<&()>)
            .await
    }

    pub async fn start_project<T: DeserializeOwned>(&self, project_id: u64) -> Result<T> {
        let path = self.project(project_id).join("start");
        self.request(path, Method::POST, None::<&()>).await
    }

    pub async fn stop_project<T: DeserializeOwned>(&self, project_id: u64) -> Result<T> {
        let path = self.project(project_id).join("stop");
        self.request(path, Method::POST, None::<&()>).await
    }

    pub async fn restart_project<T: DeserializeOwned>(&self, project_id: u64) -> Result<T> {
        let path = self.project(project_id).join("restart");
        self.request(path, Method::POST, None::<&()>).await
    }

    pub async fn start_autopilot<T: DeserializeOwned>(&self, project_id: u64) -> Result<T> {
        let path = self.project(project_id).join("autopilot").join("start");
        self.request(path, Method::POST, None::<&()>).await
    }

    pub async fn stop_autopilot<T: DeserializeOwned>(&self, project_id: u64) -> Result<T> {
        let path = self.project(project_id).join("autopilot").join("stop");
        self.request(path, Method::POST, None::<&()>).await
    }

    // Decision groups

    pub async fn get_decision_groups<T: DeserializeOwned>(
        &self,
        project_id: u64,
        filter: Option<&str>,
    ) -> Result<T> {
        let path = self
            .project(project_id)
            .join("decisiongroups")
            .with_filter(filter);
        self.request(path, Method::GET, None::<&()>).await
    }

    pub async fn get_decision_group<T: DeserializeOwned>(
        &self,
        project_id: u64,
        group_id: u64,
    ) -> Result<T> {
        let path = self.decision_group(project_id, group_id);
        self.request(path, Method::GET, None::<&()>).await
    }

    pub async fn create_decision_group<T, P>(&self, project_id: u64, group: &P) -> Result<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let path = self.project(project_id).join("decisiongroup");
        self.request(path, Method::POST, Some(group)).await
    }

    pub async fn update_decision_group<T, P>(
        &self,
        project_id: u64,
        group_id: u64,
        group: &P,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let path = self.decision_group(project_id, group_id);
        self.request(path, Method::PUT, Some(group)).await
    }

    pub async fn delete_decision_group<T: DeserializeOwned>(
        &self,
        project_id: u64,
        group_id: u64,
    ) -> Result<T> {
        let path = self.decision_group(project_id, group_id);
        self.request(path, Method::DELETE, None::<&()>).await
    }

    pub async fn start_decision_group<T: DeserializeOwned>(
        &self,
        project_id: u64,
        group_id: u64,
    ) -> Result<T> {
        let path = self.decision_group(project_id, group_id).join("start");
        self.request(path, Method::POST, None::<&()>).await
    }

    pub async fn stop_decision_group<T: DeserializeOwned>(
        &self,
        project_id: u64,
        group_id: u64,
    ) -> Result<T> {
        let path = self.decision_group(project_id, group_id).join("stop");
        self.request(path, Method::POST, None::<&()>).await
    }

    pub async fn restart_decision_group<T: DeserializeOwned>(
        &self,
        project_id: u64,
        group_id: u64,
    ) -> Result<T> {
        let path = self.decision_group(project_id, group_id).join("restart");
        self.request(path, Method::POST, None::<&()>).await
    }

    // Decisions

    /// Sortable by name and conversions, filterable by result,
    /// e.g. `sort=-name&result=WON`.
    pub async fn get_decisions<T: DeserializeOwned>(
        &self,
        project_id: u64,
        filter: Option<&str>,
    ) -> Result<T> {
        self.list_decisions(self.decisions_base(project_id, None), filter)
            .await
    }

    pub async fn get_decision<T: DeserializeOwned>(
        &self,
        project_id: u64,
        decision_id: u64,
    ) -> Result<T> {
        let path = self
            .decisions_base(project_id, None)
            .join("decision")
            .item(decision_id);
        self.request(path, Method::GET, None::<&()>).await
    }

    pub async fn create_decision<T, P>(&self, project_id: u64, decision: &P) -> Result<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let path = self.decisions_base(project_id, None).join("decision");
        self.request(path, Method::POST, Some(decision)).await
    }

    pub async fn update_decision<T, P>(
        &self,
        project_id: u64,
        decision_id: u64,
        decision: &P,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let path = self
            .decisions_base(project_id, None)
            .join("decision")
            .item(decision_id);
        self.request(path, Method::PUT, Some(decision)).await
    }

    pub async fn delete_decision<T: DeserializeOwned>(
        &self,
        project_id: u64,
        decision_id: u64,
    ) -> Result<T> {
        let path = self
            .decisions_base(project_id, None)
            .join("decision")
            .item(decision_id);
        self.request(path, Method::DELETE, None::<&()>).await
    }

    // Decisions inside a decision group

    pub async fn get_group_decisions<T: DeserializeOwned>(
        &self,
        project_id: u64,
        group_id: u64,
        filter: Option<&str>,
    ) -> Result<T> {
        self.list_decisions(self.decisions_base(project_id, Some(group_id)), filter)
            .await
    }

    pub async fn get_group_decision<T: DeserializeOwned>(
        &self,
        project_id: u64,
        group_id: u64,
        decision_id: u64,
    ) -> Result<T> {
        let path = self
            .decisions_base(project_id, Some(group_id))
            .join("decision")
            .item(decision_id);
        self.request(path, Method::GET, None::<&()>).await
    }

    pub async fn create_group_decision<T, P>(
        &self,
        project_id: u64,
        group_id: u64,
        decision: &P,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let path = self
            .decisions_base(project_id, Some(group_id))
            .join("decision");
        self.request(path, Method::POST, Some(decision)).await
    }

    pub async fn update_group_decision<T, P>(
        &self,
        project_id: u64,
        group_id: u64,
        decision_id: u64,
        decision: &P,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let path = self
            .decisions_base(project_id, Some(group_id))
            .join("decision")
            .item(decision_id);
        self.request(path, Method::PUT, Some(decision)).await
    }

    pub async fn delete_group_decision<T: DeserializeOwned>(
        &self,
        project_id: u64,
        group_id: u64,
        decision_id: u64,
    ) -> Result<T> {
        let path = self
            .decisions_base(project_id, Some(group_id))
            .join("decision")
            .item(decision_id);
        self.request(path, Method::DELETE, None::<&()>).await
    }

    // Goals

    pub async fn get_goals<T: DeserializeOwned>(
        &self,
        project_id: u64,
        filter: Option<&str>,
    ) -> Result<T> {
        let path = self.project(project_id).join("goals").with_filter(filter);
        self.request(path, Method::GET, None::<&()>).await
    }

    pub async fn get_goal<T: DeserializeOwned>(&self, project_id: u64, goal_id: u64) -> Result<T> {
        let path = self.project(project_id).join("goal").item(goal_id);
        self.request(path, Method::GET, None::<&()>).await
    }

    /// Attaches a goal to the project.
    pub async fn create_goal<T, P>(&self, project_id: u64, goal: &P) -> Result<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let path = self.project(project_id).join("goal");
        self.request(path, Method::POST, Some(goal)).await
    }

    pub async fn update_goal<T, P>(&self, project_id: u64, goal_id: u64, goal: &P) -> Result<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let path = self.project(project_id).join("goal").item(goal_id);
        self.request(path, Method::PUT, Some(goal)).await
    }

    /// Detaches the goal from the project.
    pub async fn delete_goal<T: DeserializeOwned>(
        &self,
        project_id: u64,
        goal_id: u64,
    ) -> Result<T> {
        let path = self.project(project_id).join("goal").item(goal_id);
        self.request(path, Method::DELETE, None::<&()>).await
    }

    // Personalization rules

    /// For tenants this includes the rules of all their clients.
    pub async fn get_rules<T: DeserializeOwned>(&self) -> Result<T> {
        let path = self.scoped().join("rules");
        self.request(path, Method::GET, None::<&()>).await
    }

    pub async fn get_rule<T: DeserializeOwned>(&self, rule_id: u64) -> Result<T> {
        self.request(self.rule(rule_id), Method::GET, None::<&()>)
            .await
    }

    pub async fn create_rule<T, P>(&self, rule: &P) -> Result<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let path = self.scoped().join("rule");
        self.request(path, Method::POST, Some(rule)).await
    }

    pub async fn update_rule<T, P>(&self, rule_id: u64, rule: &P) -> Result<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        self.request(self.rule(rule_id), Method::PUT, Some(rule))
            .await
    }

    pub async fn delete_rule<T: DeserializeOwned>(&self, rule_id: u64) -> Result<T> {
        self.request(self.rule(rule_id), Method::DELETE, None::<&()>)
            .await
    }

    // Conditions

    pub async fn get_conditions<T: DeserializeOwned>(&self, rule_id: u64) -> Result<T> {
        let path = self.rule(rule_id).join("conditions");
        self.request(path, Method::GET, None::<&()>).await
    }

    pub async fn get_condition<T: DeserializeOwned>(
        &self,
        rule_id: u64,
        condition_id: u64,
    ) -> Result<T> {
        let path = self.rule(rule_id).join("condition").item(condition_id);
        self.request(path, Method::GET, None::<&()>).await
    }

    pub async fn create_condition<T, P>(&self, rule_id: u64, condition: &P) -> Result<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let path = self.rule(rule_id).join("condition");
        self.request(path, Method::POST, Some(condition)).await
    }

    pub async fn update_condition<T, P>(
        &self,
        rule_id: u64,
        condition_id: u64,
        condition: &P,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let path = self.rule(rule_id).join("condition").item(condition_id);
        self.request(path, Method::PUT, Some(condition)).await
    }

    pub async fn delete_condition<T: DeserializeOwned>(
        &self,
        rule_id: u64,
        condition_id: u64,
    ) -> Result<T> {
        let path = self.rule(rule_id).join("condition").item(condition_id);
        self.request(path, Method::DELETE, None::<&()>).await
    }

    // Statistics

    /// Day by day impressions, conversions and aggregated conversion rate.
    ///
    /// e.g. `entries=50&enddate=2015-01-31&goalid=74` returns 50 days ending
    /// on 2015-01-31 for goal 74.
    pub async fn get_trend<T: DeserializeOwned>(
        &self,
        project_id: u64,
        filter: Option<&str>,
    ) -> Result<T> {
        let path = self.project(project_id).join("trend").with_filter(filter);
        self.request(path, Method::GET, None::<&()>).await
    }
}

// Private methods
impl Client {
    fn scoped(&self) -> ResourcePath {
        ResourcePath::account(self.client_id)
    }

    fn project(&self, project_id: u64) -> ResourcePath {
        self.scoped().join("project").item(project_id)
    }

    fn decision_group(&self, project_id: u64, group_id: u64) -> ResourcePath {
        self.project(project_id).join("decisiongroup").item(group_id)
    }

    /// Decisions live either directly under the project or under one of its groups.
    fn decisions_base(&self, project_id: u64, group_id: Option<u64>) -> ResourcePath {
        match group_id {
            Some(group_id) => self.decision_group(project_id, group_id),
            None => self.project(project_id),
        }
    }

    async fn list_decisions<T: DeserializeOwned>(
        &self,
        base: ResourcePath,
        filter: Option<&str>,
    ) -> Result<T> {
        let path = base.join("decisions").with_filter(filter);
        self.request(path, Method::GET, None::<&()>).await
    }

    fn rule(&self, rule_id: u64) -> ResourcePath {
        self.scoped().join("rule").item(rule_id)
    }

    async fn request<T, P>(
        &self,
        path: impl Into<String>,
        method: Method,
        payload: Option<&P>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let payload = payload.map(serde_json::to_value).transpose()?;
        self.http_client
            .perform_request(&path.into(), method, payload)
            .await
    }
}
