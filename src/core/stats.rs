use super::customer::VisitOutcome;
use super::types::CustomerId;

/// Everything worth knowing about a finished visit
#[derive(Debug, Clone, PartialEq)]
pub struct VisitSummary {
    pub customer: CustomerId,
    pub archetype: String,
    pub outcome: VisitOutcome,
    pub failed_attempts: u32,
}

/// Observer trait for shop lifecycle events
pub trait ShopObserver {
    /// Called when a customer joins the line
    fn on_customer_spawned(&mut self, _customer: CustomerId, _archetype: &str) {}

    /// Called when a customer is destroyed at the end of its visit
    fn on_visit_ended(&mut self, summary: &VisitSummary);
}

/// Running totals for the current session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShopStats {
    pub spawned: u32,
    pub served: u32,
    pub revenue: u64,
    pub failed_deliveries: u32,
    pub no_staff: u32,
    pub timed_out: u32,
    pub walked_out: u32,
    pub no_order: u32,
    pub sent_away: u32,
}

impl ShopStats {
    pub fn record(&mut self, summary: &VisitSummary) {
        self.failed_deliveries += summary.failed_attempts;
        match summary.outcome {
            VisitOutcome::Served { reward } => {
                self.served += 1;
                self.revenue += u64::from(reward);
            }
            VisitOutcome::NoStaff => self.no_staff += 1,
            VisitOutcome::OrderTimedOut => self.timed_out += 1,
            VisitOutcome::WalkedOut => self.walked_out += 1,
            VisitOutcome::NoOrderAvailable => self.no_order += 1,
            VisitOutcome::SentAway => self.sent_away += 1,
        }
    }

    /// Visits that ended, whatever the outcome
    pub fn finished(&self) -> u32 {
        self.served + self.no_staff + self.timed_out + self.walked_out + self.no_order + self.sent_away
    }
}
