use serde::{Deserialize, Serialize};

use crate::error::InsertionError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Threads {
    Single,
    #[default]
    Auto,
    Multi(usize),
}

impl Threads {
    pub fn number_of_threads(&self) -> usize {
        match self {
            Threads::Single => 1,
            Threads::Multi(num) => (*num).max(1),
            Threads::Auto => std::thread::available_parallelism().map_or(1, |n| n.get()),
        }
    }
}

/// Constants of the regret score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegretParams {
    /// The priority weight of a job is `priority_weight_base - priority`.
    pub priority_weight_base: f64,
    /// Stands in for the second best cost of a job only one route can take.
    pub no_alternative_cost: f64,
    pub time_window_weight: f64,
    pub depot_distance_weight: f64,
    pub minimum_time_window_score: f64,
}

impl Default for RegretParams {
    fn default() -> Self {
        Self {
            priority_weight_base: 11.0,
            no_alternative_cost: 2_147_483_647.0,
            time_window_weight: -0.5,
            depot_distance_weight: 0.1,
            minimum_time_window_score: -100_000.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsertionParams {
    pub threads: Threads,
    pub vehicle_switch_allowed: bool,
    /// Lower bound of the share of assigned jobs seen by the cost calculator.
    pub minimum_completeness_ratio: f64,
    pub activity_cost_weight: f64,
    pub fixed_cost_weight: f64,
    pub regret: RegretParams,
    pub noise_probability: f64,
    pub noise_level: f64,
}

impl Default for InsertionParams {
    fn default() -> Self {
        Self {
            threads: Threads::Auto,
            vehicle_switch_allowed: true,
            minimum_completeness_ratio: 0.5,
            activity_cost_weight: 1.0,
            fixed_cost_weight: 1.0,
            regret: RegretParams::default(),
            noise_probability: 0.0,
            noise_level: 0.0,
        }
    }
}

impl InsertionParams {
    pub fn from_json_str(json: &str) -> Result<Self, InsertionError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let params = InsertionParams::from_json_str(
            r#"{ "threads": { "Multi": 3 }, "regret": { "priority_weight_base": 20.0 } }"#,
        )
        .unwrap();

        assert_eq!(params.threads, Threads::Multi(3));
        assert_eq!(params.threads.number_of_threads(), 3);
        assert_eq!(params.regret.priority_weight_base, 20.0);
        assert_eq!(params.regret.time_window_weight, -0.5);
        assert!(params.vehicle_switch_allowed);
        assert_eq!(params.minimum_completeness_ratio, 0.5);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            InsertionParams::from_json_str(r#"{ "threads": "Many" }"#),
            Err(InsertionError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_single_thread() {
        let params = InsertionParams::from_json_str(r#"{ "threads": "Single" }"#).unwrap();
        assert_eq!(params.threads.number_of_threads(), 1);
    }
}
