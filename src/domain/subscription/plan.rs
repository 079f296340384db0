//! Plan catalogue used to render customer notifications.

/// Subscription plans sold on the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    Monthly,
    Quarterly,
    Annual,
}

/// Name shown for plan ids we do not recognise.
const FALLBACK_PLAN_NAME: &str = "Graphics Design Plan";

/// Template count shown for plan ids we do not recognise.
const FALLBACK_TEMPLATES_COUNT: &str = "1000+";

impl Plan {
    pub fn from_id(plan_id: &str) -> Option<Self> {
        match plan_id {
            "plan_monthly" => Some(Plan::Monthly),
            "plan_quarterly" => Some(Plan::Quarterly),
            "plan_annual" => Some(Plan::Annual),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Plan::Monthly => "Monthly Graphics Plan (₹49/month)",
            Plan::Quarterly => "Quarterly Graphics Plan (₹99/quarter)",
            Plan::Annual => "Annual Graphics Plan (₹299/year)",
        }
    }

    pub fn templates_count(&self) -> &'static str {
        match self {
            Plan::Monthly => "1000+",
            Plan::Quarterly => "3000+",
            Plan::Annual => "5000+",
        }
    }
}

/// Display name for a provider plan id, falling back to a generic name.
pub fn plan_name(plan_id: Option<&str>) -> &'static str {
    plan_id
        .and_then(Plan::from_id)
        .map(|p| p.display_name())
        .unwrap_or(FALLBACK_PLAN_NAME)
}

/// Template count for a provider plan id.
pub fn templates_count(plan_id: Option<&str>) -> &'static str {
    plan_id
        .and_then(Plan::from_id)
        .map(|p| p.templates_count())
        .unwrap_or(FALLBACK_TEMPLATES_COUNT)
}
