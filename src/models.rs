use crate::normalize::{self, lenient, DEFAULT_PERIOD_LABEL};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueTier {
    #[serde(default, alias = "target", deserialize_with = "lenient::amount")]
    pub threshold: f64,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub bonus: f64,
}

impl RevenueTier {
    pub fn new(threshold: f64, bonus: f64) -> Self {
        Self {
            threshold: normalize::amount(threshold),
            bonus: normalize::amount(bonus),
        }
    }

    /// A zero threshold marks the tier as disabled rather than always reached.
    pub fn is_enabled(&self) -> bool {
        self.threshold > 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KpiRecord {
    #[serde(deserialize_with = "lenient::period_label")]
    pub period_label: String,
    #[serde(deserialize_with = "lenient::days")]
    pub days_remaining: u32,
    #[serde(deserialize_with = "lenient::team_size")]
    pub team_size: u32,

    #[serde(deserialize_with = "lenient::amount")]
    pub current_count: f64,
    #[serde(deserialize_with = "lenient::amount")]
    pub target_count: f64,
    #[serde(deserialize_with = "lenient::amount")]
    pub count_bonus: f64,

    #[serde(deserialize_with = "lenient::amount")]
    pub current_ticket: f64,
    #[serde(deserialize_with = "lenient::amount")]
    pub target_ticket: f64,
    #[serde(deserialize_with = "lenient::amount")]
    pub ticket_bonus: f64,

    #[serde(deserialize_with = "lenient::amount")]
    pub current_revenue: f64,
    #[serde(deserialize_with = "lenient::tiers")]
    pub revenue_tiers: Vec<RevenueTier>,
}

impl Default for KpiRecord {
    fn default() -> Self {
        Self {
            period_label: DEFAULT_PERIOD_LABEL.to_string(),
            days_remaining: 18,
            team_size: 2,
            current_count: 328.0,
            target_count: 1200.0,
            count_bonus: 150.0,
            current_ticket: 29.7,
            target_ticket: 29.5,
            ticket_bonus: 250.0,
            current_revenue: 9700.0,
            revenue_tiers: vec![
                RevenueTier::new(35_000.0, 100.0),
                RevenueTier::new(36_000.0, 200.0),
                RevenueTier::new(40_000.0, 300.0),
            ],
        }
    }
}

impl KpiRecord {
    pub fn normalized(self) -> Self {
        Self {
            period_label: normalize::period_label(&self.period_label)
                .unwrap_or_else(|| DEFAULT_PERIOD_LABEL.to_string()),
            days_remaining: self.days_remaining,
            team_size: self.team_size.max(1),
            current_count: normalize::amount(self.current_count),
            target_count: normalize::amount(self.target_count),
            count_bonus: normalize::amount(self.count_bonus),
            current_ticket: normalize::amount(self.current_ticket),
            target_ticket: normalize::amount(self.target_ticket),
            ticket_bonus: normalize::amount(self.ticket_bonus),
            current_revenue: normalize::amount(self.current_revenue),
            revenue_tiers: self
                .revenue_tiers
                .into_iter()
                .map(|tier| RevenueTier::new(tier.threshold, tier.bonus))
                .collect(),
        }
    }
}

// A supplied tier list replaces the whole sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KpiPatch {
    pub period_label: Option<String>,
    pub days_remaining: Option<f64>,
    pub team_size: Option<f64>,
    pub current_count: Option<f64>,
    pub target_count: Option<f64>,
    pub count_bonus: Option<f64>,
    pub current_ticket: Option<f64>,
    pub target_ticket: Option<f64>,
    pub ticket_bonus: Option<f64>,
    pub current_revenue: Option<f64>,
    pub revenue_tiers: Option<Vec<RevenueTier>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calculations {
    pub team_size: u32,

    pub goal1_pct: f64,
    pub goal1_achieved: bool,
    pub count_remaining: f64,
    pub count_per_day: f64,
    pub count_bonus_earned: f64,

    pub goal2_pct: f64,
    pub goal2_achieved: bool,
    pub ticket_remaining: f64,
    pub ticket_delta: f64,
    pub ticket_bonus_earned: f64,

    pub achieved_tier_index: usize,
    pub tier_bonus: f64,
    pub next_tier_threshold: Option<f64>,
    pub next_tier_pct: f64,
    pub revenue_remaining: f64,
    pub revenue_per_day: f64,

    pub bonus_per_person: f64,
    pub bonus_team_total: f64,
    pub max_potential_per_person: f64,
}
