use crate::models::{Calculations, KpiRecord, RevenueTier};
use crate::normalize;

pub fn derive(record: &KpiRecord) -> Calculations {
    let team_size = record.team_size.max(1);
    let days_remaining = record.days_remaining;

    let current_count = normalize::amount(record.current_count);
    let target_count = normalize::amount(record.target_count);
    let goal1 = GoalProgress::measure(current_count, target_count);

    let current_ticket = normalize::amount(record.current_ticket);
    let target_ticket = normalize::amount(record.target_ticket);
    let goal2 = GoalProgress::measure(current_ticket, target_ticket);

    let revenue = normalize::amount(record.current_revenue);
    let tiers = record
        .revenue_tiers
        .iter()
        .map(|tier| RevenueTier::new(tier.threshold, tier.bonus))
        .collect::<Vec<_>>();
    let achieved_tier_index = achieved_tier(&tiers, revenue);
    let tier_bonus = achieved_tier_index
        .checked_sub(1)
        .and_then(|position| tiers.get(position))
        .map(|tier| tier.bonus)
        .unwrap_or(0.0);

    let next_tier_threshold = tiers
        .iter()
        .skip(achieved_tier_index)
        .find(|tier| tier.is_enabled())
        .map(|tier| tier.threshold);
    let revenue_remaining = next_tier_threshold
        .map(|threshold| (threshold - revenue).max(0.0))
        .unwrap_or(0.0);
    // Past the top tier, progress is measured against the last enabled one.
    let next_tier_pct = next_tier_threshold
        .or_else(|| tiers.iter().rev().find(|tier| tier.is_enabled()).map(|tier| tier.threshold))
        .map(|threshold| percent(revenue, threshold))
        .unwrap_or(0.0);

    let count_bonus_earned = if goal1.achieved {
        normalize::amount(record.count_bonus)
    } else {
        0.0
    };
    let ticket_bonus_earned = if goal2.achieved {
        normalize::amount(record.ticket_bonus)
    } else {
        0.0
    };
    let bonus_per_person = count_bonus_earned + ticket_bonus_earned + tier_bonus;

    let top_tier_bonus = tiers
        .iter()
        .filter(|tier| tier.is_enabled())
        .map(|tier| tier.bonus)
        .fold(0.0, f64::max);
    let max_potential_per_person =
        normalize::amount(record.count_bonus) + normalize::amount(record.ticket_bonus) + top_tier_bonus;

    Calculations {
        team_size,

        goal1_pct: goal1.pct,
        goal1_achieved: goal1.achieved,
        count_remaining: goal1.remaining,
        count_per_day: per_day(goal1.remaining, days_remaining),
        count_bonus_earned,

        goal2_pct: goal2.pct,
        goal2_achieved: goal2.achieved,
        ticket_remaining: goal2.remaining,
        ticket_delta: current_ticket - target_ticket,
        ticket_bonus_earned,

        achieved_tier_index,
        tier_bonus,
        next_tier_threshold,
        next_tier_pct,
        revenue_remaining,
        revenue_per_day: per_day(revenue_remaining, days_remaining),

        bonus_per_person,
        bonus_team_total: bonus_per_person * f64::from(team_size),
        max_potential_per_person,
    }
}

pub fn achieved_tier(tiers: &[RevenueTier], revenue: f64) -> usize {
    tiers
        .iter()
        .enumerate()
        .filter(|(_, tier)| tier.is_enabled() && revenue >= tier.threshold)
        .map(|(position, _)| position + 1)
        .last()
        .unwrap_or(0)
}

struct GoalProgress {
    pct: f64,
    achieved: bool,
    remaining: f64,
}

impl GoalProgress {
    fn measure(current: f64, target: f64) -> Self {
        Self {
            pct: percent(current, target),
            achieved: target > 0.0 && current >= target,
            remaining: (target - current).max(0.0),
        }
    }
}

fn percent(current: f64, target: f64) -> f64 {
    if target <= 0.0 {
        return 0.0;
    }
    let pct = current / target * 100.0;
    if pct.is_finite() {
        pct.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

fn per_day(remaining: f64, days_remaining: u32) -> f64 {
    if days_remaining > 0 {
        remaining / f64::from(days_remaining)
    } else {
        remaining
    }
}
