//! Accrual and payment period generation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tenor_core::calendars::Calendar;
use tenor_core::daycounts::{DayCount, DayCountConvention};
use tenor_core::types::{Date, Frequency};

use crate::error::{BondError, BondResult};
use crate::types::{BondTerms, CycleRule};

/// One accrual period.
///
/// `cycle_start`/`cycle_end` bound the notional regular period(s) the
/// accrual period belongs to. They equal the accrual dates for regular
/// periods and extend past them for stubs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    /// Interest accrual start (unadjusted).
    pub accrual_start: Date,
    /// Interest accrual end (unadjusted).
    pub accrual_end: Date,
    /// Date the coupon is paid.
    pub payment_date: Date,
    /// Start of the notional regular period.
    pub cycle_start: Date,
    /// End of the notional regular period.
    pub cycle_end: Date,
}

impl Period {
    /// True if the period is a full regular coupon period.
    #[must_use]
    pub fn is_regular(&self) -> bool {
        self.cycle_start == self.accrual_start && self.cycle_end == self.accrual_end
    }

    /// True if `date` lies in `[accrual_start, accrual_end)`.
    #[must_use]
    pub fn contains(&self, date: Date) -> bool {
        date >= self.accrual_start && date < self.accrual_end
    }

    /// Day-count fraction of `[from, to]` inside this period.
    ///
    /// ICMA stubs are measured against each notional regular period they
    /// overlap; other conventions use their plain year fraction.
    #[must_use]
    pub fn accrual_fraction(
        &self,
        from: Date,
        to: Date,
        day_count: DayCountConvention,
        frequency: Frequency,
    ) -> Decimal {
        if to <= from {
            return Decimal::ZERO;
        }
        let per_year = frequency.periods_per_year();
        if !day_count.is_period_based() || per_year == 0 {
            return day_count.year_fraction(from, to);
        }
        if self.is_regular() {
            return day_count.period_fraction(from, to, self.cycle_start, self.cycle_end, per_year);
        }
        match self.notional_boundaries(from, to, frequency) {
            Some(bounds) => bounds
                .windows(2)
                .map(|w| {
                    let start = from.max(w[0]);
                    let end = to.min(w[1]);
                    if end > start {
                        day_count.period_fraction(start, end, w[0], w[1], per_year)
                    } else {
                        Decimal::ZERO
                    }
                })
                .sum(),
            None => day_count.year_fraction(from, to),
        }
    }

    fn notional_boundaries(&self, from: Date, to: Date, frequency: Frequency) -> Option<Vec<Date>> {
        let months = frequency.months_per_period() as i32;
        let mut bounds = Vec::new();
        if self.cycle_end == self.accrual_end {
            let floor = from.min(self.accrual_start);
            for k in 0..1200 {
                let b = self.cycle_end.add_months(-k * months).ok()?;
                bounds.push(b);
                if b <= floor {
                    break;
                }
            }
            bounds.reverse();
        } else {
            let ceiling = to.max(self.accrual_end);
            for k in 0..1200 {
                let b = self.cycle_start.add_months(k * months).ok()?;
                bounds.push(b);
                if b >= ceiling {
                    break;
                }
            }
        }
        Some(bounds)
    }
}

/// Ordered, contiguous accrual periods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Schedule {
    periods: Vec<Period>,
}

impl Schedule {
    /// Creates a schedule from explicit periods.
    ///
    /// Periods must be non-empty, each with `start < end`, and contiguous.
    pub fn new(periods: Vec<Period>) -> BondResult<Self> {
        if periods.is_empty() {
            return Err(BondError::validation("schedule has no periods"));
        }
        for (i, p) in periods.iter().enumerate() {
            if p.accrual_end <= p.accrual_start {
                return Err(BondError::validation(format!(
                    "period {i} ends {} before it starts {}",
                    p.accrual_end, p.accrual_start
                )));
            }
        }
        if let Some(w) = periods.windows(2).find(|w| w[1].accrual_start != w[0].accrual_end) {
            return Err(BondError::validation(format!(
                "gap between {} and {}",
                w[0].accrual_end, w[1].accrual_start
            )));
        }
        Ok(Self { periods })
    }

    /// The periods in order.
    #[must_use]
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// Iterates over the periods.
    pub fn iter(&self) -> std::slice::Iter<'_, Period> {
        self.periods.iter()
    }

    /// Number of periods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// True if there are no periods.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// First accrual start.
    #[must_use]
    pub fn start_date(&self) -> Option<Date> {
        self.periods.first().map(|p| p.accrual_start)
    }

    /// Last accrual end.
    #[must_use]
    pub fn end_date(&self) -> Option<Date> {
        self.periods.last().map(|p| p.accrual_end)
    }

    /// Index of the period with `accrual_start <= date < accrual_end`.
    #[must_use]
    pub fn period_index(&self, date: Date) -> Option<usize> {
        let i = self.periods.partition_point(|p| p.accrual_end <= date);
        self.periods.get(i).filter(|p| p.contains(date)).map(|_| i)
    }

    /// Unadjusted coupon (accrual end) dates.
    #[must_use]
    pub fn coupon_dates(&self) -> Vec<Date> {
        self.periods.iter().map(|p| p.accrual_end).collect()
    }
}

impl<'a> IntoIterator for &'a Schedule {
    type Item = &'a Period;
    type IntoIter = std::slice::Iter<'a, Period>;

    fn into_iter(self) -> Self::IntoIter {
        self.periods.iter()
    }
}

/// `anchor` shifted by `months`, with the day fixed by `rule`.
pub fn cycle_date(anchor: Date, months: i32, rule: CycleRule) -> BondResult<Date> {
    if months == 0 {
        return Ok(anchor);
    }
    let shifted = anchor.add_months(months)?;
    Ok(match rule {
        CycleRule::Anchor => shifted.with_day_clamped(anchor.day()),
        CycleRule::EndOfMonth => shifted.end_of_month(),
        CycleRule::DayOfMonth(day) => shifted.with_day_clamped(day),
    })
}

/// Builds the accrual schedule of `terms`.
///
/// A custom schedule on the terms is returned unchanged.
pub fn build_schedule(terms: &BondTerms) -> BondResult<Schedule> {
    if let Some(custom) = &terms.custom_schedule {
        return Ok(custom.clone());
    }
    let boundaries = generate_boundaries(terms)?;
    let months = terms.frequency.months_per_period() as i32;
    let front_anchored = terms.first_coupon.is_some() || !terms.flags.stub_at_end;
    let periods = boundaries
        .windows(2)
        .enumerate()
        .map(|(i, w)| {
            let (start, end) = (w[0], w[1]);
            let (cycle_start, cycle_end) = if months == 0 || is_regular(start, end, months, terms.cycle_rule)? {
                (start, end)
            } else if i == 0 && front_anchored {
                (notional_start(start, end, months)?, end)
            } else {
                (start, notional_end(start, end, months)?)
            };
            Ok(Period {
                accrual_start: start,
                accrual_end: end,
                payment_date: payment_date(terms, end),
                cycle_start,
                cycle_end,
            })
        })
        .collect::<BondResult<Vec<_>>>()?;
    Schedule::new(periods)
}

/// Payment date for a period ending (unadjusted) on `end`.
pub(crate) fn payment_date(terms: &BondTerms, end: Date) -> Date {
    let calendar = &terms.calendar;
    match terms.payment_lag {
        None => calendar.roll(end, terms.business_day_convention),
        Some(lag) if lag.business_days => calendar.add_business_days(end, lag.days as i32),
        Some(lag) => calendar.roll(end.add_days(i64::from(lag.days)), terms.business_day_convention),
    }
}

fn is_regular(start: Date, end: Date, months: i32, rule: CycleRule) -> BondResult<bool> {
    Ok(cycle_date(end, -months, rule)? == start || cycle_date(start, months, rule)? == end)
}

fn notional_start(start: Date, end: Date, months: i32) -> BondResult<Date> {
    let mut k = 1;
    loop {
        let candidate = end.add_months(-k * months)?;
        if candidate <= start {
            return Ok(candidate);
        }
        k += 1;
    }
}

fn notional_end(start: Date, end: Date, months: i32) -> BondResult<Date> {
    let mut k = 1;
    loop {
        let candidate = start.add_months(k * months)?;
        if candidate >= end {
            return Ok(candidate);
        }
        k += 1;
    }
}

fn generate_boundaries(terms: &BondTerms) -> BondResult<Vec<Date>> {
    let effective = terms.effective_date;
    let maturity = terms.maturity;
    if maturity <= effective {
        return Err(BondError::validation(format!(
            "maturity {maturity} is not after effective date {effective}"
        )));
    }
    if terms.frequency.is_zero() {
        if terms.first_coupon.is_some() || terms.last_coupon.is_some() {
            return Err(BondError::non_generatable_stub(
                "coupon date overrides on a zero-coupon bond",
            ));
        }
        return Ok(vec![effective, maturity]);
    }

    let months = terms.frequency.months_per_period() as i32;
    let rule = terms.cycle_rule;
    check_overrides(terms, months)?;

    let forward_anchor = match terms.first_coupon {
        Some(fc) => Some(fc),
        None if terms.flags.stub_at_end => Some(effective),
        None => None,
    };

    let mut dates = match forward_anchor {
        Some(anchor) => generate_forward(terms, anchor, months)?,
        None => generate_backward(terms, months)?,
    };

    if terms.flags.long_stub && dates.len() > 2 {
        let n = dates.len();
        if terms.first_coupon.is_none()
            && forward_anchor.is_none()
            && !is_regular(dates[0], dates[1], months, rule)?
        {
            dates.remove(1);
        } else if terms.last_coupon.is_none()
            && forward_anchor.is_some()
            && !is_regular(dates[n - 2], dates[n - 1], months, rule)?
        {
            dates.remove(n - 2);
        }
    }
    Ok(dates)
}

fn check_overrides(terms: &BondTerms, months: i32) -> BondResult<()> {
    let effective = terms.effective_date;
    let maturity = terms.maturity;
    if let Some(fc) = terms.first_coupon {
        if fc <= effective || fc > maturity {
            return Err(BondError::non_generatable_stub(format!(
                "first coupon {fc} outside ({effective}, {maturity}]"
            )));
        }
        if fc > effective.add_months(2 * months)? {
            return Err(BondError::non_generatable_stub(format!(
                "first coupon {fc} is more than two periods after {effective}"
            )));
        }
    }
    if let Some(lc) = terms.last_coupon {
        let floor = terms.first_coupon.unwrap_or(effective);
        if lc < floor || lc >= maturity {
            return Err(BondError::non_generatable_stub(format!(
                "last coupon {lc} outside [{floor}, {maturity})"
            )));
        }
        if maturity > lc.add_months(2 * months)? {
            return Err(BondError::non_generatable_stub(format!(
                "maturity {maturity} is more than two periods after last coupon {lc}"
            )));
        }
    }
    Ok(())
}

fn generate_backward(terms: &BondTerms, months: i32) -> BondResult<Vec<Date>> {
    let effective = terms.effective_date;
    let anchor = terms.last_coupon.unwrap_or(terms.maturity);
    let mut dates = Vec::new();
    if terms.last_coupon.is_some() {
        dates.push(terms.maturity);
    }
    let mut k = 0;
    loop {
        let d = cycle_date(anchor, -k * months, terms.cycle_rule)?;
        if d <= effective {
            break;
        }
        dates.push(d);
        k += 1;
    }
    dates.push(effective);
    dates.reverse();
    Ok(dates)
}

fn generate_forward(terms: &BondTerms, anchor: Date, months: i32) -> BondResult<Vec<Date>> {
    let effective = terms.effective_date;
    let upper = terms.last_coupon.unwrap_or(terms.maturity);
    let mut dates = vec![effective];
    if anchor != effective {
        dates.push(anchor);
    }
    let mut k = 1;
    let overshoot = loop {
        let d = cycle_date(anchor, k * months, terms.cycle_rule)?;
        if d >= upper {
            break d;
        }
        dates.push(d);
        k += 1;
    };
    if let Some(lc) = terms.last_coupon {
        let on_cycle = overshoot == lc || dates.last() == Some(&lc);
        if !on_cycle && !terms.flags.respect_all_user_dates {
            return Err(BondError::non_generatable_stub(format!(
                "last coupon {lc} is not on the cycle of first coupon {anchor}"
            )));
        }
        if dates.last() != Some(&lc) {
            dates.push(lc);
        }
    }
    if dates.last() != Some(&terms.maturity) {
        dates.push(terms.maturity);
    }
    Ok(dates)
}
