//! Customer context for prompt personalization and label-limit tracking

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription plan tier, each with a monthly label allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Free,
    Starter,
    Growth,
    Scale,
}

impl PlanTier {
    /// Monthly label limit for this tier.
    pub fn label_limit(&self) -> u32 {
        match self {
            PlanTier::Free => 50,
            PlanTier::Starter => 500,
            PlanTier::Growth => 2000,
            PlanTier::Scale => 10_000,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Starter => "starter",
            PlanTier::Growth => "growth",
            PlanTier::Scale => "scale",
        }
    }
}

impl std::str::FromStr for PlanTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(PlanTier::Free),
            "starter" => Ok(PlanTier::Starter),
            "growth" => Ok(PlanTier::Growth),
            "scale" => Ok(PlanTier::Scale),
            other => Err(format!("unknown plan tier: {}", other)),
        }
    }
}

/// Per-customer context injected into the system prompt.
///
/// `labels_used` is incremented exactly once per successfully purchased
/// shipment, including each shipment inside a bulk operation. The limit
/// is advisory in chat mode; enforcement happens in the calling layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerContext {
    pub store_name: String,
    pub plan_tier: PlanTier,
    pub labels_used: u32,
    pub labels_limit: u32,
    pub customer_id: Option<Uuid>,
}

impl CustomerContext {
    /// Demo context used in mock mode.
    pub fn demo() -> Self {
        Self {
            store_name: "Demo Store".to_string(),
            plan_tier: PlanTier::Starter,
            labels_used: 42,
            labels_limit: PlanTier::Starter.label_limit(),
            customer_id: None,
        }
    }

    /// Context with the limit derived from the plan tier.
    pub fn from_plan(store_name: impl Into<String>, plan_tier: PlanTier, labels_used: u32) -> Self {
        Self {
            store_name: store_name.into(),
            plan_tier,
            labels_used,
            labels_limit: plan_tier.label_limit(),
            customer_id: None,
        }
    }

    pub fn labels_remaining(&self) -> u32 {
        self.labels_limit.saturating_sub(self.labels_used)
    }

    pub fn is_limit_exceeded(&self) -> bool {
        self.labels_used >= self.labels_limit
    }

    pub fn can_create_labels(&self, count: u32) -> bool {
        self.labels_used + count <= self.labels_limit
    }

    /// Record `count` purchased labels.
    pub fn increment_labels(&mut self, count: u32) {
        self.labels_used += count;
    }

    /// Render for injection into the system prompt.
    pub fn format_for_prompt(&self) -> String {
        format!(
            "Current context:\n- Store: {}\n- Plan: {}\n- Labels this month: {}/{}",
            self.store_name,
            self.plan_tier.as_str(),
            self.labels_used,
            self.labels_limit
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_limits() {
        assert_eq!(PlanTier::Free.label_limit(), 50);
        assert_eq!(PlanTier::Starter.label_limit(), 500);
        assert_eq!(PlanTier::Growth.label_limit(), 2000);
        assert_eq!(PlanTier::Scale.label_limit(), 10_000);
    }

    #[test]
    fn tier_from_str() {
        assert_eq!("growth".parse::<PlanTier>().unwrap(), PlanTier::Growth);
        assert_eq!("Starter".parse::<PlanTier>().unwrap(), PlanTier::Starter);
        assert!("platinum".parse::<PlanTier>().is_err());
    }

    #[test]
    fn demo_context() {
        let ctx = CustomerContext::demo();
        assert_eq!(ctx.store_name, "Demo Store");
        assert_eq!(ctx.labels_used, 42);
        assert_eq!(ctx.labels_remaining(), 458);
        assert!(!ctx.is_limit_exceeded());
        assert!(ctx.can_create_labels(458));
        assert!(!ctx.can_create_labels(459));
    }

    #[test]
    fn increment_and_prompt_format() {
        let mut ctx = CustomerContext::from_plan("Acme Goods", PlanTier::Free, 49);
        ctx.increment_labels(1);
        assert!(ctx.is_limit_exceeded());
        let prompt = ctx.format_for_prompt();
        assert!(prompt.contains("- Store: Acme Goods"));
        assert!(prompt.contains("- Plan: free"));
        assert!(prompt.contains("- Labels this month: 50/50"));
    }
}
