//! Economy collaborator interface and a reference implementation.
//!
//! The simulation core only ever talks to money and progression through the
//! `Economy` trait. `Ledger` is the bookkeeping used by the harness and tests;
//! rent and VIP approval are economy-side rules built on the core's readouts.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::components::{Feature, TenantKind};
use crate::tenants::{TenantCounts, TenantTable};

/// Money, population and progression, owned outside the core
pub trait Economy {
    /// Debit `amount`; returns false without debiting on insufficient funds
    fn spend_money(&mut self, amount: i64) -> bool;
    fn earn_money(&mut self, amount: i64);
    fn change_population(&mut self, delta: i32);
    fn is_feature_unlocked(&self, feature: Feature) -> bool;
}

/// Population needed for each star rating, starting at two stars
pub const STAR_THRESHOLDS: [u32; 4] = [100, 300, 1_000, 2_500];

/// Star rating at which a feature unlocks
pub fn feature_star(feature: Feature) -> u8 {
    match feature {
        Feature::Basement | Feature::ServiceElevator | Feature::FoodCourt | Feature::Security => 2,
        Feature::Hotel | Feature::Housekeeping | Feature::Coworking => 3,
        Feature::Condo | Feature::Daycare => 4,
    }
}

/// Reference `Economy`: a cash balance, a population counter, and star
/// progression driven by population.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    pub money: i64,
    pub population: i32,
    /// Features unlocked regardless of stars
    pub unlocked: BTreeSet<Feature>,
    pub total_earned: i64,
    pub total_spent: i64,
}

impl Ledger {
    pub fn new(money: i64) -> Self {
        Self {
            money,
            ..Default::default()
        }
    }

    /// A ledger with every feature unlocked
    pub fn unlocked(money: i64) -> Self {
        let mut ledger = Self::new(money);
        ledger.unlocked.extend([
            Feature::Basement,
            Feature::ServiceElevator,
            Feature::FoodCourt,
            Feature::Hotel,
            Feature::Housekeeping,
            Feature::Security,
            Feature::Coworking,
            Feature::Condo,
            Feature::Daycare,
        ]);
        ledger
    }

    pub fn stars(&self) -> u8 {
        let pop = self.population.max(0) as u32;
        1 + STAR_THRESHOLDS.iter().filter(|&&t| pop >= t).count() as u8
    }

    /// Collect one day of rent; returns the amount earned
    pub fn collect_rent(
        &mut self,
        counts: &TenantCounts,
        satisfaction: f32,
        table: &TenantTable,
    ) -> i64 {
        let rent = daily_rent(counts, satisfaction, table);
        self.earn_money(rent);
        rent
    }
}

impl Economy for Ledger {
    fn spend_money(&mut self, amount: i64) -> bool {
        if amount < 0 || self.money < amount {
            return false;
        }
        self.money -= amount;
        self.total_spent += amount;
        true
    }

    fn earn_money(&mut self, amount: i64) {
        self.money += amount;
        self.total_earned += amount;
    }

    fn change_population(&mut self, delta: i32) {
        self.population = (self.population + delta).max(0);
    }

    fn is_feature_unlocked(&self, feature: Feature) -> bool {
        self.unlocked.contains(&feature) || self.stars() >= feature_star(feature)
    }
}

/// Daily rent for the current tenant collections. Satisfaction scales rent
/// linearly from half (0.0) to full (1.0).
pub fn daily_rent(counts: &TenantCounts, satisfaction: f32, table: &TenantTable) -> i64 {
    let base: i64 = TenantKind::ALL
        .iter()
        .map(|&kind| counts.get(kind) as i64 * table.rule(kind).rent)
        .sum();
    let factor = 0.5 + 0.5 * satisfaction.clamp(0.0, 1.0) as f64;
    (base as f64 * factor).round() as i64
}

/// A visiting VIP approves the building when people are happy enough and
/// the hotel has few complaints.
pub fn vip_approves(satisfaction: f32, hotel_complaints: u32) -> bool {
    satisfaction >= 0.7 && hotel_complaints <= 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spend_fails_without_funds() {
        let mut ledger = Ledger::new(100);
        assert!(!ledger.spend_money(150));
        assert_eq!(ledger.money, 100);
        assert!(ledger.spend_money(100));
        assert_eq!(ledger.money, 0);
        assert_eq!(ledger.total_spent, 100);
    }

    #[test]
    fn test_stars_unlock_features() {
        let mut ledger = Ledger::new(0);
        assert_eq!(ledger.stars(), 1);
        assert!(!ledger.is_feature_unlocked(Feature::FoodCourt));

        ledger.change_population(150);
        assert_eq!(ledger.stars(), 2);
        assert!(ledger.is_feature_unlocked(Feature::FoodCourt));
        assert!(!ledger.is_feature_unlocked(Feature::Hotel));

        ledger.change_population(-1_000);
        assert_eq!(ledger.population, 0);
    }

    #[test]
    fn test_explicit_unlocks() {
        let ledger = Ledger::unlocked(0);
        assert!(ledger.is_feature_unlocked(Feature::Daycare));
    }

    #[test]
    fn test_rent_scales_with_satisfaction() {
        let table = TenantTable::default();
        let mut counts = TenantCounts::default();
        counts.by_kind.insert(TenantKind::Office, 2);
        let full = daily_rent(&counts, 1.0, &table);
        assert_eq!(full, 2 * table.rule(TenantKind::Office).rent);
        assert_eq!(daily_rent(&counts, 0.0, &table), full / 2);

        let mut ledger = Ledger::new(0);
        assert_eq!(ledger.collect_rent(&counts, 1.0, &table), full);
        assert_eq!(ledger.money, full);
    }

    #[test]
    fn test_vip_approval() {
        assert!(vip_approves(0.9, 0));
        assert!(!vip_approves(0.5, 0));
        assert!(!vip_approves(0.9, 5));
    }
}
