//! Validated bond terms with their generated schedule.

use tenor_core::types::Date;

use crate::cashflows::{
    build_schedule, AccruedInterest, AccruedInterestCalculator, BondCashflow, CashflowProjector,
    Schedule,
};
use crate::error::BondResult;
use crate::types::BondTerms;

/// A bond: terms that passed validation plus their schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct Bond {
    terms: BondTerms,
    schedule: Schedule,
}

impl Bond {
    /// Validates `terms` and builds the schedule.
    pub fn new(terms: BondTerms) -> BondResult<Self> {
        terms.validate()?;
        let schedule = build_schedule(&terms)?;
        log::debug!(
            "built {} periods from {} to {}",
            schedule.len(),
            terms.effective_date,
            terms.maturity
        );
        Ok(Self { terms, schedule })
    }

    /// The contractual terms.
    #[must_use]
    pub fn terms(&self) -> &BondTerms {
        &self.terms
    }

    /// The accrual schedule.
    #[must_use]
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Unadjusted coupon dates.
    #[must_use]
    pub fn coupon_dates(&self) -> Vec<Date> {
        self.schedule.coupon_dates()
    }

    /// A projector over this bond's schedule.
    #[must_use]
    pub fn projector(&self) -> CashflowProjector<'_> {
        CashflowProjector::new(&self.terms, &self.schedule)
    }

    /// All flows, with floaters projected at their current rate.
    pub fn cashflows(&self) -> BondResult<Vec<BondCashflow>> {
        self.projector().project()
    }

    /// Accrued interest at `settle`.
    #[must_use]
    pub fn accrued_interest(&self, settle: Date) -> AccruedInterest {
        AccruedInterestCalculator::accrued_interest(settle, &self.schedule, &self.terms)
    }

    /// Interest accrued at `date` ignoring ex-dividend, as paid on exercise.
    #[must_use]
    pub fn interest_accrued(&self, date: Date) -> f64 {
        AccruedInterestCalculator::interest_accrued(date, &self.schedule, &self.terms)
    }

    /// Flows a holder settling on `entitlement` receives.
    ///
    /// A flow belongs to the holder if its accrual ends after the
    /// entitlement date. Inside the ex-dividend window the coupon of the
    /// current period goes to the seller, so only its principal is kept.
    #[must_use]
    pub fn entitled_cashflows(&self, flows: &[BondCashflow], entitlement: Date) -> Vec<BondCashflow> {
        let ex_dividend = self.accrued_interest(entitlement).ex_dividend;
        flows
            .iter()
            .filter(|f| f.accrual_end > entitlement)
            .filter_map(|f| {
                let current = f.accrual_start <= entitlement;
                if ex_dividend && current && f.coupon_amount != 0.0 {
                    let stripped = BondCashflow {
                        coupon_amount: 0.0,
                        ..*f
                    };
                    (stripped.amount() != 0.0).then_some(stripped)
                } else {
                    Some(*f)
                }
            })
            .collect()
    }

    /// The same bond with its generated schedule supplied as a custom schedule.
    #[must_use]
    pub fn with_custom_schedule(&self) -> Self {
        Self {
            terms: self.terms.clone().with_custom_schedule(self.schedule.clone()),
            schedule: self.schedule.clone(),
        }
    }
}
