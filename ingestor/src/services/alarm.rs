//! Alarm manager
//!
//! Evaluates the configured threshold/condition rules against each canonical
//! snapshot. A fired rule sends an SMS and appends an audit record; the two
//! writes are independent best-effort operations, not a transaction.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::config::RuleConfig;
use crate::error::PersistError;
use crate::external::sms::Notifier;
use crate::services::store::SnapshotStore;
use shared::models::{CurrentConditions, WeatherSnapshot};

/// Tolerance around the now-24h point when looking up the prior observation
const HISTORY_SLACK_SECS: i64 = 3600;

/// Rule kind with its typed parameters
#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
    /// Fires when temperature rose by at least `threshold` over 24 hours
    TempIncrease { threshold: Decimal },
    /// Fires when temperature fell by at least `threshold` over 24 hours
    TempDecrease { threshold: Decimal },
    /// Fires when the current condition text contains any entry
    ExtremeWeather { conditions: Vec<String> },
}

/// One configured rule, immutable for the lifetime of the process
#[derive(Debug, Clone, PartialEq)]
pub struct AlertRule {
    pub name: String,
    pub kind: RuleKind,
    /// Template with {city}/{delta}/{weather} placeholders
    pub message: String,
}

impl AlertRule {
    /// Built-in rules used when configuration supplies none
    pub fn default_rules() -> Vec<AlertRule> {
        let threshold = Decimal::from(5);
        vec![
            AlertRule {
                name: "temp_increase".to_string(),
                kind: RuleKind::TempIncrease { threshold },
                message: "气温快速上升预警：{city}24小时内升温{delta}℃".to_string(),
            },
            AlertRule {
                name: "temp_decrease".to_string(),
                kind: RuleKind::TempDecrease { threshold },
                message: "寒潮预警：{city}24小时内降温{delta}℃".to_string(),
            },
            AlertRule {
                name: "extreme_weather".to_string(),
                kind: RuleKind::ExtremeWeather {
                    conditions: vec![
                        "暴雨".to_string(),
                        "暴雪".to_string(),
                        "高温红色".to_string(),
                    ],
                },
                message: "极端天气预警：{city}当前天气{weather}".to_string(),
            },
        ]
    }

    /// Build the rule set from configuration, falling back to the defaults
    /// when the list is empty. Unknown kinds are skipped with a warning.
    pub fn from_config(rules: &[RuleConfig]) -> Vec<AlertRule> {
        if rules.is_empty() {
            return Self::default_rules();
        }

        rules
            .iter()
            .filter_map(|rule| {
                let threshold = rule
                    .threshold
                    .and_then(Decimal::from_f64_retain)
                    .unwrap_or_else(|| Decimal::from(5));
                let kind = match rule.kind.as_str() {
                    "temp_increase" => RuleKind::TempIncrease { threshold },
                    "temp_decrease" => RuleKind::TempDecrease { threshold },
                    "extreme_weather" => RuleKind::ExtremeWeather {
                        conditions: rule.conditions.clone(),
                    },
                    other => {
                        tracing::warn!(rule = %rule.name, kind = %other, "unknown rule kind, skipping");
                        return None;
                    }
                };
                Some(AlertRule {
                    name: rule.name.clone(),
                    kind,
                    message: rule.message.clone(),
                })
            })
            .collect()
    }
}

/// Evaluates rules and drives notification plus audit recording
pub struct AlarmManager {
    rules: Vec<AlertRule>,
    store: Arc<dyn SnapshotStore>,
    notifier: Arc<dyn Notifier>,
    recipients: Vec<String>,
}

impl AlarmManager {
    pub fn new(
        rules: Vec<AlertRule>,
        store: Arc<dyn SnapshotStore>,
        notifier: Arc<dyn Notifier>,
        recipients: Vec<String>,
    ) -> Self {
        Self {
            rules,
            store,
            notifier,
            recipients,
        }
    }

    /// Evaluate every rule against the snapshot; returns how many fired.
    /// One rule's failure is isolated from the others.
    pub async fn check_alerts(&self, snapshot: &WeatherSnapshot) -> usize {
        let Some(current) = &snapshot.current else {
            return 0;
        };

        let mut fired = 0;
        for rule in &self.rules {
            match self.evaluate(rule, snapshot, current).await {
                Ok(Some(message)) => {
                    self.trigger(&message).await;
                    fired += 1;
                }
                Ok(None) => {}
                Err(error) => {
                    tracing::error!(rule = %rule.name, error = %error, "rule evaluation failed");
                }
            }
        }
        fired
    }

    async fn evaluate(
        &self,
        rule: &AlertRule,
        snapshot: &WeatherSnapshot,
        current: &CurrentConditions,
    ) -> Result<Option<String>, PersistError> {
        match &rule.kind {
            RuleKind::TempIncrease { threshold } => {
                let Some(prior) = self
                    .prior_temperature(&snapshot.city, current.timestamp)
                    .await?
                else {
                    return Ok(None);
                };
                let delta = current.temperature - prior;
                if delta >= *threshold {
                    return Ok(Some(render(
                        &rule.message,
                        &snapshot.city,
                        Some(delta),
                        &current.condition_description,
                    )));
                }
                Ok(None)
            }
            RuleKind::TempDecrease { threshold } => {
                let Some(prior) = self
                    .prior_temperature(&snapshot.city, current.timestamp)
                    .await?
                else {
                    return Ok(None);
                };
                let delta = prior - current.temperature;
                if delta >= *threshold {
                    return Ok(Some(render(
                        &rule.message,
                        &snapshot.city,
                        Some(delta),
                        &current.condition_description,
                    )));
                }
                Ok(None)
            }
            RuleKind::ExtremeWeather { conditions } => {
                let text = &current.condition_description;
                if conditions.iter().any(|entry| text.contains(entry)) {
                    return Ok(Some(render(&rule.message, &snapshot.city, None, text)));
                }
                Ok(None)
            }
        }
    }

    /// Observation closest to 24 hours before `at`, within the slack window.
    /// Absent history means the temperature rules cannot fire this cycle.
    async fn prior_temperature(
        &self,
        city: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<Decimal>, PersistError> {
        let target = at - Duration::hours(24);
        let slack = Duration::seconds(HISTORY_SLACK_SECS);
        self.store
            .temperature_at(city, target - slack, target + slack)
            .await
    }

    /// Send the notification and append the audit record; each failure is
    /// logged and does not block the other write.
    async fn trigger(&self, message: &str) {
        tracing::info!(message, "alert triggered");

        if let Err(error) = self.notifier.send(&self.recipients, message).await {
            tracing::error!(error = %error, "alert notification failed");
        }
        if let Err(error) = self.store.record_alert(message, Utc::now()).await {
            tracing::error!(error = %error, "alert audit record failed");
        }
    }
}

/// Fill the {city}/{delta}/{weather} placeholders of a message template
fn render(template: &str, city: &str, delta: Option<Decimal>, weather: &str) -> String {
    let mut message = template.replace("{city}", city).replace("{weather}", weather);
    if let Some(delta) = delta {
        message = message.replace("{delta}", &delta.to_string());
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_fills_placeholders() {
        let message = render(
            "气温快速上升预警：{city}24小时内升温{delta}℃",
            "Beijing",
            Some(Decimal::from(6)),
            "晴",
        );
        assert_eq!(message, "气温快速上升预警：Beijing24小时内升温6℃");
    }

    #[test]
    fn default_rules_cover_all_kinds() {
        let rules = AlertRule::default_rules();
        assert_eq!(rules.len(), 3);
        assert!(rules
            .iter()
            .any(|r| matches!(r.kind, RuleKind::ExtremeWeather { .. })));
    }

    #[test]
    fn unknown_rule_kind_is_skipped() {
        let configs = vec![crate::config::RuleConfig {
            name: "bogus".to_string(),
            kind: "wind_shear".to_string(),
            threshold: None,
            conditions: vec![],
            message: "{city}".to_string(),
        }];
        assert!(AlertRule::from_config(&configs).is_empty());
    }
}
