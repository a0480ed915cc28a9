use std::{collections::BTreeMap, time::Duration};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// Options to use when creating the client.
///
/// `client_id` scopes every account level path. The default value for
/// api_url is https://www.blacktri.com/api/v1 and the request timeout falls
/// back to the BLACKTRI_TIMEOUT_MS environment variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlackTriOptions {
    pub client_id: u64,
    pub api_url: Option<String>,
    pub timeout: Option<Duration>,
}

impl BlackTriOptions {
    pub fn new(client_id: u64) -> Self {
        Self {
            client_id,
            api_url: None,
            timeout: None,
        }
    }
}

/// Role requested when logging in with api credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserType {
    #[serde(rename = "api-client")]
    Client,
    #[serde(rename = "api-tenant")]
    Tenant,
}

/// The server is not consistent about numbers, they may arrive as strings.
/// Null and empty strings mean "not set", anything else must parse.
pub(crate) mod lenient {
    use std::str::FromStr;

    use serde::{de::Error, Deserialize, Deserializer};
    use serde_json::Value;

    pub fn from_value<T>(value: Value) -> Result<Option<T>, String>
    where
        T: FromStr + serde::de::DeserializeOwned,
    {
        match value {
            Value::Null => Ok(None),
            Value::String(s) if s.trim().is_empty() => Ok(None),
            Value::String(s) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| format!("invalid number: {:?}", s)),
            Value::Bool(b) => T::from_str(if b { "1" } else { "0" })
                .map(Some)
                .map_err(|_| format!("invalid number: {}", b)),
            Value::Number(n) => {
                let text = n.to_string();
                serde_json::from_value(Value::Number(n))
                    .map(Some)
                    .map_err(|e| format!("invalid number {}: {}", text, e))
            }
            other => Err(format!("expected a number, got {}", other)),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr + serde::de::DeserializeOwned,
    {
        let value = Option::<Value>::deserialize(deserializer)?.unwrap_or(Value::Null);
        from_value(value).map_err(D::Error::custom)
    }
}

/// Wire format for datetimes, e.g. `2015-01-31 13:45:00`.
pub mod datetime_format {
    use chrono::NaiveDateTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    /// MySQL's placeholder for a date that was never set.
    const ZERO_DATE: &str = "0000-00-00 00:00:00";

    pub fn serialize<S>(date: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_str(&d.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(s) if s.trim().is_empty() || s.trim() == ZERO_DATE => Ok(None),
            Some(s) => NaiveDateTime::parse_from_str(s.trim(), FORMAT)
                .map(Some)
                .map_err(|e| D::Error::custom(format!("invalid date {:?}: {}", s, e))),
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Account {
    #[serde(deserialize_with = "lenient::deserialize")]
    pub id: Option<u64>,
    pub subid: Option<String>,
    pub publicid: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub apikey: Option<String>,
    pub apisecret: Option<String>,
    #[serde(deserialize_with = "lenient::deserialize")]
    pub emailvalidated: Option<u8>,
    pub custom1: Option<String>,
    pub custom2: Option<String>,
    pub custom3: Option<String>,
    pub features: Option<Vec<serde_json::Value>>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient::deserialize")]
    pub plan: Option<u32>,
    #[serde(with = "datetime_format")]
    pub createddate: Option<NaiveDateTime>,
    #[serde(deserialize_with = "lenient::deserialize")]
    pub quota: Option<i64>,
    #[serde(deserialize_with = "lenient::deserialize")]
    pub usedquota: Option<i64>,
    #[serde(deserialize_with = "lenient::deserialize")]
    pub freequota: Option<i64>,
    #[serde(deserialize_with = "lenient::deserialize")]
    pub quotaresetdayinmonth: Option<u8>,
    pub ipblacklist: Option<String>,
    pub trackingcode: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProjectType {
    /// Visual A/B test
    Visual,
    /// Split test
    Split,
    /// Teaser or headline test
    Teasertest,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Project {
    #[serde(deserialize_with = "lenient::deserialize")]
    pub id: Option<u64>,
    #[serde(rename = "type")]
    pub project_type: Option<ProjectType>,
    /// Main original URL, used for previews. Must be a syntactically valid URL.
    pub mainurl: Option<String>,
    /// URL pattern the project runs on, `*` acts as a wildcard.
    pub runpattern: Option<String>,
    #[serde(with = "datetime_format")]
    pub createddate: Option<NaiveDateTime>,
    #[serde(with = "datetime_format")]
    pub startdate: Option<NaiveDateTime>,
    #[serde(with = "datetime_format")]
    pub enddate: Option<NaiveDateTime>,
    #[serde(with = "datetime_format")]
    pub restartdate: Option<NaiveDateTime>,
    /// Days until the project is significant, -1 when unknown.
    #[serde(deserialize_with = "lenient::deserialize")]
    pub remainingdays: Option<i64>,
    pub name: Option<String>,
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient::deserialize")]
    pub visitors: Option<u64>,
    #[serde(deserialize_with = "lenient::deserialize")]
    pub conversions: Option<u64>,
    #[serde(deserialize_with = "lenient::deserialize")]
    pub conversionrate: Option<f64>,
    pub result: Option<String>,
    #[serde(deserialize_with = "lenient::deserialize")]
    pub originalid: Option<u64>,
    pub winnerid: Option<String>,
    pub uplift: Option<String>,
    pub autopilot: Option<String>,
    #[serde(deserialize_with = "lenient::deserialize")]
    pub allocation: Option<u32>,
    pub ipblacklisting: Option<bool>,
    pub personalizationmode: Option<String>,
    #[serde(deserialize_with = "lenient::deserialize")]
    pub ruleid: Option<u64>,
    pub winnername: Option<String>,
    pub devicetype: Option<String>,
}

impl Project {
    pub fn new(project_type: ProjectType, mainurl: String, runpattern: String, name: String) -> Self {
        Self {
            project_type: Some(project_type),
            mainurl: Some(mainurl),
            runpattern: Some(runpattern),
            name: Some(name),
            ..Default::default()
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DecisionGroup {
    #[serde(deserialize_with = "lenient::deserialize")]
    pub id: Option<u64>,
    #[serde(with = "datetime_format")]
    pub createddate: Option<NaiveDateTime>,
    pub name: Option<String>,
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient::deserialize")]
    pub visitors: Option<u64>,
    #[serde(deserialize_with = "lenient::deserialize")]
    pub conversions: Option<u64>,
    #[serde(deserialize_with = "lenient::deserialize")]
    pub conversionrate: Option<f64>,
    pub result: Option<String>,
    #[serde(deserialize_with = "lenient::deserialize")]
    pub originalid: Option<u64>,
    #[serde(deserialize_with = "lenient::deserialize")]
    pub winnerid: Option<u64>,
    pub winnername: Option<String>,
    #[serde(deserialize_with = "lenient::deserialize")]
    pub uplift: Option<f64>,
}

impl DecisionGroup {
    pub fn new(name: String) -> Self {
        Self {
            name: Some(name),
            ..Default::default()
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Decision {
    #[serde(deserialize_with = "lenient::deserialize")]
    pub id: Option<u64>,
    pub name: Option<String>,
    pub url: Option<String>,
    pub previewurl: Option<String>,
    #[serde(rename = "type")]
    pub decision_type: Option<String>,
    #[serde(deserialize_with = "lenient::deserialize")]
    pub ruleid: Option<u64>,
    pub result: Option<String>,
    #[serde(deserialize_with = "lenient::deserialize")]
    pub visitors: Option<u64>,
    #[serde(deserialize_with = "lenient::deserialize")]
    pub conversions: Option<u64>,
    #[serde(deserialize_with = "lenient::deserialize")]
    pub conversionrate: Option<f64>,
    #[serde(deserialize_with = "lenient::deserialize")]
    pub confidence: Option<f64>,
    #[serde(deserialize_with = "lenient::deserialize")]
    pub distribution: Option<f64>,
    pub jsinjection: Option<String>,
    pub cssinjection: Option<String>,
}

impl Decision {
    pub fn new(name: String) -> Self {
        Self {
            name: Some(name),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GoalType {
    Engagement,
    Affiliate,
    Targetpage,
    Linkurl,
    Customjs,
    Timeonpage,
    Click,
    Combined,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GoalLevel {
    #[default]
    Primary,
    Secondary,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Goal {
    #[serde(deserialize_with = "lenient::deserialize")]
    pub id: Option<u64>,
    #[serde(rename = "type")]
    pub goal_type: Option<GoalType>,
    pub param: Option<String>,
    pub level: Option<GoalLevel>,
}

impl Goal {
    pub fn new(goal_type: GoalType, param: Option<String>) -> Self {
        Self {
            goal_type: Some(goal_type),
            param,
            level: Some(GoalLevel::Primary),
            ..Default::default()
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Condition {
    #[serde(deserialize_with = "lenient::deserialize")]
    pub id: Option<u64>,
    pub negation: Option<bool>,
    #[serde(rename = "type")]
    pub condition_type: Option<String>,
    pub arg1: Option<String>,
}

impl Condition {
    pub fn new(negation: bool, condition_type: String, arg1: Option<String>) -> Self {
        Self {
            negation: Some(negation),
            condition_type: Some(condition_type),
            arg1,
            ..Default::default()
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Rule {
    #[serde(deserialize_with = "lenient::deserialize")]
    pub id: Option<u64>,
    pub name: Option<String>,
    /// How conditions are combined, `AND` or `OR`.
    pub operation: Option<String>,
    pub conditions: Option<Vec<Condition>>,
}

impl Rule {
    pub fn new(name: String, operation: String) -> Self {
        Self {
            name: Some(name),
            operation: Some(operation),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DataSet {
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::deserialize")]
    pub impressions: Option<u64>,
    #[serde(deserialize_with = "lenient::deserialize")]
    pub conversions: Option<u64>,
    #[serde(deserialize_with = "lenient::deserialize")]
    pub aggregatedcr: Option<f64>,
    pub values: Option<String>,
}

/// Statistics of one decision (or the project itself) on a given day.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendExperiment {
    pub id: String,
    pub data: DataSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendEntry {
    pub day: String,
    pub experiments: Vec<TrendExperiment>,
}

impl TrendEntry {
    /// Parses the day key, which is either a date or a datetime.
    pub fn date(&self) -> Option<NaiveDate> {
        let day = self.day.get(..10).unwrap_or(&self.day);
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }
}

type TrendDays = BTreeMap<String, BTreeMap<String, DataSet>>;

/// What the server sends for a trend. Without any data the empty map comes
/// back as `[]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTrend {
    Days(TrendDays),
    Empty(Vec<serde_json::Value>),
}

/// Day by day statistics of a project, ordered by day.
///
/// Serializes back into the `{ day: { id: DataSet } }` shape it is read from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTrend", into = "TrendDays")]
pub struct Trend {
    pub entries: Vec<TrendEntry>,
}

impl TryFrom<RawTrend> for Trend {
    type Error = String;

    fn try_from(raw: RawTrend) -> Result<Self, Self::Error> {
        match raw {
            RawTrend::Days(days) => Ok(days.into()),
            RawTrend::Empty(items) if items.is_empty() => Ok(Self::default()),
            RawTrend::Empty(items) => Err(format!(
                "expected a map of days, got a list of {} items",
                items.len()
            )),
        }
    }
}

impl From<TrendDays> for Trend {
    fn from(raw: TrendDays) -> Self {
        let entries = raw
            .into_iter()
            .map(|(day, results)| TrendEntry {
                day,
                experiments: results
                    .into_iter()
                    .map(|(id, data)| TrendExperiment { id, data })
                    .collect(),
            })
            .collect();
        Self { entries }
    }
}

impl From<Trend> for TrendDays {
    fn from(trend: Trend) -> Self {
        trend
            .entries
            .into_iter()
            .map(|entry| {
                let results = entry
                    .experiments
                    .into_iter()
                    .map(|e| (e.id, e.data))
                    .collect();
                (entry.day, results)
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_decision_skips_unset_fields() {
        let mut decision = Decision::new("Green".to_string());
        decision.cssinjection = Some(".teaser { color: #00ff00; }".to_string());
        assert_eq!(
            serde_json::to_value(&decision).expect("should serialize"),
            json!({
                "name": "Green",
                "cssinjection": ".teaser { color: #00ff00; }"
            })
        );
    }

    #[test]
    fn test_project_payload() {
        let mut project = Project::new(
            ProjectType::Visual,
            "http://localhost/perfectchef".to_string(),
            "*".to_string(),
            "PerfectChef".to_string(),
        );
        project.startdate = Some(
            NaiveDate::from_ymd_opt(2015, 1, 31)
                .and_then(|d| d.and_hms_opt(13, 45, 0))
                .expect("valid date"),
        );
        assert_eq!(
            serde_json::to_value(&project).expect("should serialize"),
            json!({
                "type": "VISUAL",
                "mainurl": "http://localhost/perfectchef",
                "runpattern": "*",
                "name": "PerfectChef",
                "startdate": "2015-01-31 13:45:00"
            })
        );
    }

    #[test]
    fn test_goal_defaults_to_primary() {
        let goal = Goal::new(GoalType::Engagement, Some("NA".to_string()));
        assert_eq!(
            serde_json::to_value(&goal).expect("should serialize"),
            json!({"type": "ENGAGEMENT", "param": "NA", "level": "PRIMARY"})
        );
    }

    #[test]
    fn test_lenient_numbers() {
        let project: Project = serde_json::from_value(json!({
            "id": "456",
            "type": "SPLIT",
            "visitors": 1200,
            "conversionrate": "0.25",
            "remainingdays": "-1",
            "createddate": "2014-12-21 08:00:00",
            "unknown": "ignored"
        }))
        .expect("should deserialize");
        assert_eq!(project.id, Some(456));
        assert_eq!(project.project_type, Some(ProjectType::Split));
        assert_eq!(project.visitors, Some(1200));
        assert_eq!(project.conversionrate, Some(0.25));
        assert_eq!(project.remainingdays, Some(-1));
        assert_eq!(
            project.createddate,
            NaiveDateTime::parse_from_str("2014-12-21 08:00:00", datetime_format::FORMAT).ok()
        );
        assert_eq!(project.name, None);
    }

    #[test]
    fn test_rule_with_conditions() {
        let rule: Rule = serde_json::from_value(json!({
            "id": 3,
            "name": "mobile",
            "operation": "OR",
            "conditions": [
                {"id": "9", "negation": false, "type": "device", "arg1": "mobile"}
            ]
        }))
        .expect("should deserialize");
        let conditions = rule.conditions.expect("conditions");
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].id, Some(9));
        assert_eq!(conditions[0].condition_type.as_deref(), Some("device"));
    }

    #[test]
    fn test_trend_is_ordered_by_day() {
        let trend: Trend = serde_json::from_value(json!({
            "2015-01-31": {
                "74": {"name": "Original", "impressions": 10, "conversions": 2, "aggregatedcr": 0.2}
            },
            "2015-01-30": {
                "74": {"name": "Original", "impressions": "5", "conversions": "1", "aggregatedcr": "0.2"},
                "75": {"name": "Green", "impressions": 6, "conversions": 3, "aggregatedcr": 0.5}
            }
        }))
        .expect("should deserialize");

        assert_eq!(trend.entries.len(), 2);
        assert_eq!(trend.entries[0].day, "2015-01-30");
        assert_eq!(
            trend.entries[0].date(),
            NaiveDate::from_ymd_opt(2015, 1, 30)
        );
        assert_eq!(trend.entries[0].experiments.len(), 2);
        assert_eq!(trend.entries[0].experiments[1].id, "75");
        assert_eq!(trend.entries[0].experiments[0].data.impressions, Some(5));
        assert_eq!(trend.entries[1].experiments[0].data.aggregatedcr, Some(0.2));
    }

    #[test]
    fn test_user_type_wire_names() {
        assert_eq!(json!(UserType::Client), json!("api-client"));
        assert_eq!(json!(UserType::Tenant), json!("api-tenant"));
    }

    #[test]
    fn test_trend_serializes_back_into_days() {
        let raw = json!({
            "2015-01-30": {
                "1": {"name": "Original", "impressions": 1, "conversions": null, "aggregatedcr": null, "values": null}
            }
        });
        let trend: Trend = serde_json::from_value(raw.clone()).expect("should deserialize");

        let serialized = serde_json::to_value(&trend).expect("should serialize");
        assert_eq!(serialized, raw);

        let again: Trend = serde_json::from_value(serialized).expect("should read back");
        assert_eq!(again, trend);
    }

    #[test]
    fn test_empty_trend_from_empty_array() {
        let trend: Trend = serde_json::from_value(json!([])).expect("should deserialize");
        assert!(trend.entries.is_empty());

        assert!(serde_json::from_value::<Trend>(json!([1])).is_err());
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        assert!(serde_json::from_value::<Project>(json!({"id": "abc"})).is_err());
        assert!(serde_json::from_value::<Project>(json!({"visitors": -5})).is_err());
        assert!(serde_json::from_value::<Project>(json!({"visitors": [1]})).is_err());

        let project: Project = serde_json::from_value(json!({"id": "", "visitors": null}))
            .expect("empty values are unset");
        assert_eq!(project.id, None);
        assert_eq!(project.visitors, None);
    }

    #[test]
    fn test_invalid_dates_are_rejected() {
        assert!(
            serde_json::from_value::<Project>(json!({"createddate": "31.01.2015"})).is_err()
        );

        let project: Project = serde_json::from_value(json!({
            "createddate": "0000-00-00 00:00:00",
            "startdate": ""
        }))
        .expect("unset dates are accepted");
        assert_eq!(project.createddate, None);
        assert_eq!(project.startdate, None);
    }

    #[test]
    fn test_lenient_from_value() {
        assert_eq!(lenient::from_value::<u64>(json!("77")), Ok(Some(77)));
        assert_eq!(lenient::from_value::<u64>(json!(77)), Ok(Some(77)));
        assert_eq!(lenient::from_value::<u64>(json!(null)), Ok(None));
        assert!(lenient::from_value::<u64>(json!("seventy")).is_err());
    }
}
