//! The restriction evaluator.
//!
//! Validation runs as a fixed cascade and stops at the first failure:
//! 1. DATE format
//! 2. TIME format
//! 3. PLATE format
//! 4. policy structure
//! 5. schedule structure
//!
//! Only when all five pass is the restriction computed.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::config::RestrictionConfig;
use crate::patterns::{parse_date, parse_plate, parse_time};
use crate::policy::{Policy, PolicyDefinition};
use crate::schedule::{Schedule, ScheduleDefinition};
use crate::types::{EvaluationInput, Param, Prediction};
use crate::PredictionError;

/// Timezone used when none is configured.
pub const DEFAULT_TIMEZONE: Tz = Tz::America__Guayaquil;

/// Holds a policy, a schedule and the parameters of the next prediction.
#[derive(Debug, Clone)]
pub struct RestrictionEvaluator {
    policy: PolicyDefinition,
    schedule: ScheduleDefinition,
    timezone: Tz,
    input: EvaluationInput,
}

impl RestrictionEvaluator {
    /// An evaluator with an empty policy and no windows.
    pub fn new() -> Self {
        Self {
            policy: PolicyDefinition::default(),
            schedule: ScheduleDefinition::default(),
            timezone: DEFAULT_TIMEZONE,
            input: EvaluationInput::default(),
        }
    }

    /// An evaluator loaded with the rules of a config.
    pub fn from_config(config: &RestrictionConfig) -> Self {
        Self {
            policy: config.policy.clone(),
            schedule: config.schedule.clone(),
            timezone: config.timezone,
            input: EvaluationInput::default(),
        }
    }

    /// Replace the policy. Checked at prediction time.
    pub fn set_policy(&mut self, policy: impl Into<PolicyDefinition>) {
        self.policy = policy.into();
    }

    /// Replace the schedule. Checked at prediction time.
    pub fn set_schedule(&mut self, schedule: impl Into<ScheduleDefinition>) {
        self.schedule = schedule.into();
    }

    /// Replace the zone used to anchor the evaluated local time.
    pub fn set_timezone(&mut self, timezone: Tz) {
        self.timezone = timezone;
    }

    /// Store a parameter by its name (`DATE`, `TIME` or `PLATE`).
    ///
    /// Unknown names are logged and dropped; returns whether the value was
    /// stored.
    pub fn set_param(&mut self, name: &str, value: impl Into<String>) -> bool {
        match name.parse::<Param>() {
            Ok(param) => {
                self.set(param, value);
                true
            }
            Err(unknown) => {
                warn!(param = %unknown.0, "Invalid parameter entered.");
                false
            }
        }
    }

    /// Store a parameter.
    pub fn set(&mut self, param: Param, value: impl Into<String>) {
        self.input.set(param, value);
    }

    /// The parameters stored so far.
    pub fn input(&self) -> &EvaluationInput {
        &self.input
    }

    /// The configured zone.
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Validate the policy and schedule into reusable rules.
    pub fn rules(&self) -> Result<Rules, PredictionError> {
        Ok(Rules {
            policy: self.policy.validate()?,
            schedule: self.schedule.validate()?,
            timezone: self.timezone,
        })
    }

    /// Run the validation cascade and predict for the stored parameters.
    pub fn predict(&self) -> Result<Prediction, PredictionError> {
        let checked = CheckedInput::parse(&self.input)?;
        let rules = self.rules()?;
        Ok(rules.decide(&self.input, &checked))
    }
}

impl Default for RestrictionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// A validated policy and schedule.
///
/// Immutable once built, so one instance can serve many threads.
#[derive(Debug, Clone, PartialEq)]
pub struct Rules {
    policy: Policy,
    schedule: Schedule,
    timezone: Tz,
}

impl Rules {
    /// Rules from an already validated policy and schedule.
    pub fn new(policy: Policy, schedule: Schedule, timezone: Tz) -> Self {
        Self {
            policy,
            schedule,
            timezone,
        }
    }

    /// Restricted digits per weekday.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Restricted time windows.
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Zone used to anchor local times.
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Check the input formats and predict.
    pub fn evaluate(&self, input: &EvaluationInput) -> Result<Prediction, PredictionError> {
        let checked = CheckedInput::parse(input)?;
        Ok(self.decide(input, &checked))
    }

    fn decide(&self, input: &EvaluationInput, checked: &CheckedInput) -> Prediction {
        let weekday = checked.date.weekday().num_days_from_sunday();
        let banned = self.policy.is_restricted(weekday, checked.last_digit);

        let matched_window = if banned {
            self.schedule.find(checked.minutes).copied()
        } else {
            None
        };

        debug!(
            plate = %input.plate,
            weekday,
            last_digit = checked.last_digit,
            banned,
            window = ?matched_window,
            "prediction evaluated"
        );

        Prediction {
            plate: input.plate.clone(),
            date: input.date.clone(),
            time: input.time.clone(),
            restricted: matched_window.is_some(),
            weekday,
            last_digit: checked.last_digit,
            matched_window,
            local_time: self.anchor(checked.date, checked.minutes),
        }
    }

    /// The evaluated wall-clock time as an instant in the configured zone.
    /// `None` when the zone skips that local time.
    fn anchor(&self, date: NaiveDate, minutes: u32) -> Option<DateTime<FixedOffset>> {
        let naive = date.and_hms_opt(minutes / 60, minutes % 60, 0)?;
        self.timezone
            .from_local_datetime(&naive)
            .earliest()
            .map(|instant| instant.fixed_offset())
    }
}

/// Parameters that passed the format checks.
struct CheckedInput {
    date: NaiveDate,
    minutes: u32,
    last_digit: u8,
}

impl CheckedInput {
    fn parse(input: &EvaluationInput) -> Result<Self, PredictionError> {
        let date = parse_date(&input.date).ok_or(PredictionError::InvalidDateFormat)?;
        let minutes = parse_time(&input.time).ok_or(PredictionError::InvalidTimeFormat)?;
        let last_digit = parse_plate(&input.plate).ok_or(PredictionError::InvalidPlateFormat)?;
        Ok(Self {
            date,
            minutes,
            last_digit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::TimeWindow;
    use serde_json::json;

    fn quito_evaluator() -> RestrictionEvaluator {
        let mut evaluator = RestrictionEvaluator::new();
        evaluator.set_schedule(vec![["07:00", "09:30"], ["16:00", "19:30"]]);
        let policy: Vec<Vec<i64>> = vec![
            vec![],
            vec![1, 2],
            vec![3, 4],
            vec![5, 6],
            vec![7, 8],
            vec![9, 0],
            vec![],
        ];
        evaluator.set_policy(policy);
        evaluator
    }

    fn predict(date: &str, time: &str, plate: &str) -> Result<Prediction, PredictionError> {
        let mut evaluator = quito_evaluator();
        evaluator.set_param("DATE", date);
        evaluator.set_param("TIME", time);
        evaluator.set_param("PLATE", plate);
        evaluator.predict()
    }

    #[test]
    fn test_friday_noon_is_outside_windows() {
        let prediction = predict("2020/09/11", "12:59", "PCM6029").unwrap();

        assert!(!prediction.restricted);
        assert_eq!(prediction.weekday, 5);
        assert_eq!(prediction.last_digit, 9);
        assert!(prediction.matched_window.is_none());
        assert_eq!(
            prediction.to_string(),
            "The vehicle PCM6029 is not restricted to be on the road on 2020/09/11 12:59"
        );
    }

    #[test]
    fn test_digit_not_banned_that_day() {
        // Friday bans 9 and 0 only
        let prediction = predict("2020/09/11", "07:15", "PCM6027").unwrap();

        assert!(!prediction.restricted);
        assert_eq!(prediction.weekday, 5);
        assert!(prediction.matched_window.is_none());
    }

    #[test]
    fn test_banned_digit_inside_morning_window() {
        let prediction = predict("2020/09/10", "07:15", "PCM6027").unwrap();

        assert!(prediction.restricted);
        assert_eq!(prediction.weekday, 4);
        assert_eq!(prediction.matched_window, Some(TimeWindow::new(420, 570)));
        assert_eq!(
            prediction.to_string(),
            "The vehicle PCM6027 is restricted to be on the road on 2020/09/10 07:15"
        );
    }

    #[test]
    fn test_banned_digit_inside_evening_window() {
        let prediction = predict("2020/09/11", "18:45", "PCM6020").unwrap();

        assert!(prediction.restricted);
        assert_eq!(prediction.matched_window, Some(TimeWindow::new(960, 1170)));
    }

    #[test]
    fn test_banned_digit_outside_windows() {
        let prediction = predict("2020/09/11", "12:59", "PCM6020").unwrap();
        assert!(!prediction.restricted);
    }

    #[test]
    fn test_window_boundaries_are_restricted() {
        for time in ["07:00", "09:30", "16:00", "19:30"] {
            assert!(predict("2020/09/11", time, "PCM6020").unwrap().restricted, "{time}");
        }
        for time in ["06:59", "09:31", "15:59", "19:31"] {
            assert!(!predict("2020/09/11", time, "PCM6020").unwrap().restricted, "{time}");
        }
    }

    #[test]
    fn test_weekend_is_never_restricted() {
        // 2020/09/12 is a Saturday, 2020/09/13 a Sunday
        for digit in 0..10 {
            let plate = format!("ABC123{digit}");
            assert!(!predict("2020/09/12", "08:00", &plate).unwrap().restricted);
            assert!(!predict("2020/09/13", "08:00", &plate).unwrap().restricted);
        }
    }

    #[test]
    fn test_format_errors_in_precedence_order() {
        assert_eq!(
            predict("2020-09-11", "25:00", "pcm602"),
            Err(PredictionError::InvalidDateFormat)
        );
        assert_eq!(
            predict("2020/09/11", "25:00", "pcm602"),
            Err(PredictionError::InvalidTimeFormat)
        );
        assert_eq!(
            predict("2020/09/11", "12:00", "pcm602"),
            Err(PredictionError::InvalidPlateFormat)
        );
        assert_eq!(
            predict("2020/09/11", "12:00", "PCM60299"),
            Err(PredictionError::InvalidPlateFormat)
        );
    }

    #[test]
    fn test_calendar_invalid_date_rejected() {
        assert_eq!(
            predict("2021/02/31", "08:00", "PCM6021"),
            Err(PredictionError::InvalidDateFormat)
        );
    }

    #[test]
    fn test_missing_params_fail_on_date_first() {
        let evaluator = quito_evaluator();
        assert_eq!(evaluator.predict(), Err(PredictionError::InvalidDateFormat));
    }

    #[test]
    fn test_format_errors_come_before_definition_errors() {
        let mut evaluator = RestrictionEvaluator::new();
        evaluator.set_policy(json!({ "monday": [1] }));
        evaluator.set_param("DATE", "2020/09/11");
        evaluator.set_param("TIME", "12:00");
        evaluator.set_param("PLATE", "bad");

        assert_eq!(evaluator.predict(), Err(PredictionError::InvalidPlateFormat));
    }

    #[test]
    fn test_policy_checked_before_schedule() {
        let mut evaluator = RestrictionEvaluator::new();
        evaluator.set_policy(json!([[], ["1"]]));
        evaluator.set_schedule(json!([["07:00"]]));
        evaluator.set_param("DATE", "2020/09/11");
        evaluator.set_param("TIME", "12:00");
        evaluator.set_param("PLATE", "PCM6021");

        assert!(matches!(
            evaluator.predict(),
            Err(PredictionError::InvalidPolicyDefinition { .. })
        ));

        evaluator.set_policy(vec![vec![1i64]]);
        assert!(matches!(
            evaluator.predict(),
            Err(PredictionError::InvalidScheduleDefinition { .. })
        ));
    }

    #[test]
    fn test_unknown_param_is_ignored() {
        let mut evaluator = quito_evaluator();
        assert!(!evaluator.set_param("COLOR", "red"));
        assert!(!evaluator.set_param("date", "2020/09/11"));
        assert_eq!(evaluator.input(), &EvaluationInput::default());

        assert!(evaluator.set_param("DATE", "2020/09/11"));
        assert_eq!(evaluator.input().date, "2020/09/11");
    }

    #[test]
    fn test_unconfigured_evaluator_restricts_nothing() {
        let mut evaluator = RestrictionEvaluator::new();
        evaluator.set(Param::Date, "2020/09/11");
        evaluator.set(Param::Time, "08:00");
        evaluator.set(Param::Plate, "PCM6027");

        assert!(!evaluator.predict().unwrap().restricted);
    }

    #[test]
    fn test_weekday_keys_beyond_saturday_never_match() {
        let mut evaluator = quito_evaluator();
        evaluator.set_policy(json!({ "7": [0, 1, 2, 3, 4, 5, 6, 7, 8, 9] }));
        evaluator.set_param("DATE", "2020/09/13");
        evaluator.set_param("TIME", "08:00");
        evaluator.set_param("PLATE", "PCM6027");

        assert!(!evaluator.predict().unwrap().restricted);
    }

    #[test]
    fn test_local_time_uses_configured_timezone() {
        let prediction = predict("2020/09/11", "07:15", "PCM6029").unwrap();
        let local = prediction.local_time.unwrap();
        assert_eq!(local.to_rfc3339(), "2020-09-11T07:15:00-05:00");

        let mut evaluator = quito_evaluator();
        evaluator.set_timezone(Tz::UTC);
        evaluator.set_param("DATE", "2020/09/11");
        evaluator.set_param("TIME", "07:15");
        evaluator.set_param("PLATE", "PCM6029");
        let prediction = evaluator.predict().unwrap();

        assert!(prediction.restricted);
        assert_eq!(
            prediction.local_time.unwrap().to_rfc3339(),
            "2020-09-11T07:15:00+00:00"
        );
    }

    #[test]
    fn test_skipped_local_time_has_no_instant() {
        // Clocks jumped from 02:00 to 03:00 in New York on 2021-03-14
        let mut evaluator = quito_evaluator();
        evaluator.set_timezone(Tz::America__New_York);
        evaluator.set_param("DATE", "2021/03/14");
        evaluator.set_param("TIME", "02:30");
        evaluator.set_param("PLATE", "PCM6027");

        let prediction = evaluator.predict().unwrap();
        assert_eq!(prediction.weekday, 0);
        assert!(prediction.local_time.is_none());
    }

    #[test]
    fn test_repeated_local_time_takes_earlier_instant() {
        // Clocks fell back from 02:00 to 01:00 in New York on 2021-11-07
        let mut evaluator = quito_evaluator();
        evaluator.set_timezone(Tz::America__New_York);
        evaluator.set_param("DATE", "2021/11/07");
        evaluator.set_param("TIME", "01:30");
        evaluator.set_param("PLATE", "PCM6027");

        let prediction = evaluator.predict().unwrap();
        assert_eq!(prediction.weekday, 0);
        assert!(!prediction.restricted);
        assert_eq!(
            prediction.local_time.unwrap().to_rfc3339(),
            "2021-11-07T01:30:00-04:00"
        );
    }

    #[test]
    fn test_rules_are_reusable_across_inputs() {
        let rules = quito_evaluator().rules().unwrap();

        let restricted = rules
            .evaluate(&EvaluationInput::new("2020/09/07", "17:00", "XYZ0001"))
            .unwrap();
        let free = rules
            .evaluate(&EvaluationInput::new("2020/09/07", "17:00", "XYZ0003"))
            .unwrap();

        assert!(restricted.restricted);
        assert!(!free.restricted);
        assert_eq!(rules.timezone(), DEFAULT_TIMEZONE);
    }

    #[test]
    fn test_rules_shared_between_threads() {
        let rules = std::sync::Arc::new(quito_evaluator().rules().unwrap());

        let handles: Vec<_> = (0..4)
            .map(|digit| {
                let rules = std::sync::Arc::clone(&rules);
                std::thread::spawn(move || {
                    let input = EvaluationInput::new("2020/09/08", "08:00", format!("ABC000{digit}"));
                    rules.evaluate(&input).map(|p| p.restricted)
                })
            })
            .collect();

        let results: Vec<bool> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap().unwrap())
            .collect();

        // Tuesday bans 3 and 4
        assert_eq!(results, vec![false, false, false, true]);
    }
}
