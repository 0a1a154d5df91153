use serde::{Deserialize, Serialize};

/// Which component chain the orchestrator runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Repair,
    Tabu,
    Alns,
    Cp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabuParams {
    #[serde(default = "default_tenure")]
    pub tenure: u32,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
}

fn default_tenure() -> u32 {
    50
}
fn default_iterations() -> u32 {
    2000
}

impl Default for TabuParams {
    fn default() -> Self {
        Self {
            tenure: default_tenure(),
            iterations: default_iterations(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpPreferences {
    #[serde(default)]
    pub allow_same_day_split: bool,
    #[serde(default = "default_edge_weight")]
    pub edge_weight: f64,
    #[serde(default = "default_teacher_gap_weight")]
    pub teacher_gap_weight: f64,
    #[serde(default)]
    pub nogap_weight: f64,
    /// Only 1 or 2 are meaningful; anything else is treated as "no
    /// additional constraint" by the CP adapter.
    #[serde(default = "default_max_teacher_gap_hours")]
    pub max_teacher_gap_hours: u8,
    #[serde(default)]
    pub teacher_daily_max_hours: Option<u8>,
}

fn default_edge_weight() -> f64 {
    1.0
}
fn default_teacher_gap_weight() -> f64 {
    1.0
}
fn default_max_teacher_gap_hours() -> u8 {
    2
}

impl Default for CpPreferences {
    fn default() -> Self {
        Self {
            allow_same_day_split: false,
            edge_weight: default_edge_weight(),
            teacher_gap_weight: default_teacher_gap_weight(),
            nogap_weight: 0.0,
            max_teacher_gap_hours: default_max_teacher_gap_hours(),
            teacher_daily_max_hours: None,
        }
    }
}

/// Every tunable the solver core accepts, loaded from `config.toml` or
/// defaulted the way the teacher's `ScheduleConfig` defaults its periods-
/// per-day / days-per-week fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolverConfig {
    #[serde(default = "default_strategy")]
    pub strategy: Strategy,
    #[serde(default = "default_time_limit_seconds")]
    pub time_limit_seconds: u64,
    #[serde(default = "default_seed_ratio")]
    pub seed_ratio: f64,
    #[serde(default)]
    pub tabu: TabuParams,
    #[serde(default = "default_stop_at_first_solution")]
    pub stop_at_first_solution: bool,
    #[serde(default)]
    pub random_seed: Option<u64>,
    #[serde(default = "default_disable_lns")]
    pub disable_lns: bool,
    #[serde(default = "default_disable_teacher_edge_penalty")]
    pub disable_teacher_edge_penalty: bool,
    #[serde(default = "default_weight")]
    pub teacher_spread_weight: f64,
    #[serde(default = "default_weight")]
    pub teacher_edge_weight: f64,
    #[serde(default)]
    pub allow_block_relaxation: bool,
    #[serde(default)]
    pub allow_fallback: bool,
    #[serde(default)]
    pub cp_prefs: CpPreferences,
}

fn default_strategy() -> Strategy {
    Strategy::Cp
}
fn default_time_limit_seconds() -> u64 {
    150
}
fn default_seed_ratio() -> f64 {
    0.15
}
fn default_stop_at_first_solution() -> bool {
    true
}
fn default_disable_lns() -> bool {
    true
}
fn default_disable_teacher_edge_penalty() -> bool {
    true
}
fn default_weight() -> f64 {
    1.0
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            time_limit_seconds: default_time_limit_seconds(),
            seed_ratio: default_seed_ratio(),
            tabu: TabuParams::default(),
            stop_at_first_solution: default_stop_at_first_solution(),
            random_seed: None,
            disable_lns: default_disable_lns(),
            disable_teacher_edge_penalty: default_disable_teacher_edge_penalty(),
            teacher_spread_weight: default_weight(),
            teacher_edge_weight: default_weight(),
            allow_block_relaxation: false,
            allow_fallback: false,
            cp_prefs: CpPreferences::default(),
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.05..=0.5).contains(&self.seed_ratio) {
            return Err(format!(
                "seedRatio must be in [0.05, 0.5], got {}",
                self.seed_ratio
            ));
        }
        if !(10..=200).contains(&self.tabu.tenure) {
            return Err(format!(
                "tabu.tenure must be in [10, 200], got {}",
                self.tabu.tenure
            ));
        }
        if !(500..=6000).contains(&self.tabu.iterations) {
            return Err(format!(
                "tabu.iterations must be in [500, 6000], got {}",
                self.tabu.iterations
            ));
        }
        if !(0.0..=10.0).contains(&self.teacher_spread_weight)
            || !(0.0..=10.0).contains(&self.teacher_edge_weight)
        {
            return Err("teacherSpreadWeight and teacherEdgeWeight must be in [0, 10]".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_contract() {
        let c = SolverConfig::default();
        assert_eq!(c.strategy, Strategy::Cp);
        assert_eq!(c.time_limit_seconds, 150);
        assert!(c.disable_lns);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn rejects_seed_ratio_out_of_range() {
        let mut c = SolverConfig::default();
        c.seed_ratio = 0.9;
        assert!(c.validate().is_err());
    }
}
