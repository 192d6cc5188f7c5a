
use crate::models::{KpiRecord, RevenueTier};
use crate::normalize::number_from_value;
use serde_json::{Map, Value};

const FLAT_TIER_COUNT: usize = 3;

// (legacy key, canonical key) for the flat layout.
const FLAT_RENAMES: &[(&str, &str)] = &[
    ("currentMonth", "periodLabel"),
    ("currentMonthLabel", "periodLabel"),
    ("currentSales", "currentCount"),
    ("targetSales", "targetCount"),
    ("bonusValueSales", "countBonus"),
    ("bonusValueTicket", "ticketBonus"),
];

// Canonical keys already present win over anything translated from a legacy layout.
pub fn upgrade_stored_value(stored: Value) -> Value {
    let mut object = match stored {
        Value::Object(object) => object,
        other => return other,
    };

    if let Some(Value::Object(nested)) = object.remove("data") {
        object = merge_missing(object, upgrade_nested(&nested));
    }

    let mut translated = Map::new();
    for (legacy, canonical) in FLAT_RENAMES {
        if let Some(value) = object.get(*legacy) {
            translated.entry(canonical.to_string()).or_insert_with(|| value.clone());
        }
    }
    if has_flat_tier_fields(&object) {
        let tiers = tiers_from_flat_fields(&object, &KpiRecord::default().revenue_tiers);
        translated.insert("revenueTiers".to_string(), tiers_to_value(&tiers));
    }

    for (legacy, _) in FLAT_RENAMES {
        object.remove(*legacy);
    }
    // Calendar day, not a count of days left.
    object.remove("dayOfMonth");
    for position in 1..=FLAT_TIER_COUNT {
        for key in flat_tier_keys(position) {
            object.remove(&key);
        }
    }

    Value::Object(merge_missing(object, translated))
}

pub fn flat_tier_fields(tiers: &[RevenueTier]) -> Map<String, Value> {
    let mut fields = Map::new();
    for position in 1..=FLAT_TIER_COUNT {
        let tier = tiers.get(position - 1).copied().unwrap_or(RevenueTier::new(0.0, 0.0));
        fields.insert(format!("targetRevenueTier{position}"), Value::from(tier.threshold));
        fields.insert(format!("bonusTier{position}"), Value::from(tier.bonus));
    }
    fields
}

pub fn tiers_from_flat_fields(fields: &Map<String, Value>, base: &[RevenueTier]) -> Vec<RevenueTier> {
    let mut tiers = base.to_vec();
    if tiers.len() < FLAT_TIER_COUNT {
        tiers.resize(FLAT_TIER_COUNT, RevenueTier::new(0.0, 0.0));
    }

    for position in 1..=FLAT_TIER_COUNT {
        let tier = &mut tiers[position - 1];
        if let Some(value) = fields.get(&format!("targetRevenueTier{position}")) {
            tier.threshold = crate::normalize::amount(number_from_value(value));
        }
        let bonus = fields
            .get(&format!("bonusTier{position}"))
            .or_else(|| fields.get(&format!("bonusValueRevenueT{position}")));
        if let Some(value) = bonus {
            tier.bonus = crate::normalize::amount(number_from_value(value));
        }
    }
    tiers
}

fn upgrade_nested(nested: &Map<String, Value>) -> Map<String, Value> {
    let mut translated = Map::new();
    let mut copy = |source: Option<&Value>, canonical: &str| {
        if let Some(value) = source {
            translated.insert(canonical.to_string(), value.clone());
        }
    };

    copy(nested.get("referenceMonth"), "periodLabel");

    let volume = nested.get("meta01");
    copy(volume.and_then(|goal| goal.get("current")), "currentCount");
    copy(volume.and_then(|goal| goal.get("target")), "targetCount");
    copy(volume.and_then(|goal| goal.get("bonus")), "countBonus");

    let ticket = nested.get("meta02");
    copy(ticket.and_then(|goal| goal.get("current")), "currentTicket");
    copy(ticket.and_then(|goal| goal.get("target")), "targetTicket");
    copy(ticket.and_then(|goal| goal.get("bonus")), "ticketBonus");

    let revenue = nested.get("meta03");
    copy(revenue.and_then(|goal| goal.get("revenueCurrent")), "currentRevenue");
    copy(revenue.and_then(|goal| goal.get("teamSize")), "teamSize");
    copy(revenue.and_then(|goal| goal.get("levels")), "revenueTiers");

    translated
}

fn has_flat_tier_fields(object: &Map<String, Value>) -> bool {
    (1..=FLAT_TIER_COUNT).any(|position| flat_tier_keys(position).iter().any(|key| object.contains_key(key)))
}

fn flat_tier_keys(position: usize) -> [String; 3] {
    [
        format!("targetRevenueTier{position}"),
        format!("bonusTier{position}"),
        format!("bonusValueRevenueT{position}"),
    ]
}

fn tiers_to_value(tiers: &[RevenueTier]) -> Value {
    Value::Array(
        tiers
            .iter()
            .map(|tier| serde_json::json!({ "threshold": tier.threshold, "bonus": tier.bonus }))
            .collect(),
    )
}

fn merge_missing(mut target: Map<String, Value>, source: Map<String, Value>) -> Map<String, Value> {
    for (key, value) in source {
        target.entry(key).or_insert(value);
    }
    target
}
