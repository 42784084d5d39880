use serde::Serialize;

#[derive(Clone, Debug, Serialize)]
pub struct MerchantReasonRequest {
    pub reason: String,
}

/// Moderation decisions available for a merchant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MerchantDecision {
    Approve,
    Reject,
    Suspend,
}

impl MerchantDecision {
    #[must_use]
    pub const fn segment(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Suspend => "suspend",
        }
    }

    #[must_use]
    pub const fn action_name(self) -> &'static str {
        match self {
            Self::Approve => "Approve Merchant",
            Self::Reject => "Reject Merchant",
            Self::Suspend => "Suspend Merchant",
        }
    }

    #[must_use]
    pub const fn requires_reason(self) -> bool {
        !matches!(self, Self::Approve)
    }
}
