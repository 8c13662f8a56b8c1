use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::db::PaymentRecord;

/// Inclusive calendar window for one month: the first day, and the last day
/// computed as "first day of the next month minus one day". December rolls
/// into January of year+1. Returns `None` for an invalid month.
pub fn month_window(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let next_first = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
    Some((first, next_first.pred_opt()?))
}

pub fn round_off_2_decimals(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

pub fn date_year(date: &str) -> Option<i32> {
    date.parse::<NaiveDate>().ok().map(|d| d.year())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceTotals {
    pub total_days: usize,
    pub present_days: usize,
}

/// Counts recorded days and present days. `total_days` is the number of
/// records in the window, not the number of calendar days in the month.
pub fn attendance_totals<I>(present_flags: I) -> AttendanceTotals
where
    I: IntoIterator<Item = bool>,
{
    let mut total_days: usize = 0;
    let mut present_days: usize = 0;
    for present in present_flags {
        total_days += 1;
        if present {
            present_days += 1;
        }
    }
    AttendanceTotals {
        total_days,
        present_days,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTotals {
    pub total_payment: f64,
    pub total_paid: f64,
    pub total_due: f64,
}

pub fn payment_totals<'a, I>(records: I) -> PaymentTotals
where
    I: IntoIterator<Item = &'a PaymentRecord>,
{
    let mut totals = PaymentTotals {
        total_payment: 0.0,
        total_paid: 0.0,
        total_due: 0.0,
    };
    for p in records {
        totals.total_payment += p.payment;
        totals.total_paid += p.paid;
        totals.total_due += p.due;
    }
    totals
}

/// The stored `due` value: amount billed minus amount received. Negative when
/// a student overpays.
pub fn due_amount(payment: f64, paid: f64) -> f64 {
    payment - paid
}

/// `100 × Σobtained / Σtotal` rounded to 2 decimals. A zero (or degenerate
/// negative) mark denominator resolves to 0, never a division error or NaN.
pub fn exam_percentage<I>(marks: I) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let mut total_marks: f64 = 0.0;
    let mut obtained_marks: f64 = 0.0;
    for (total, obtained) in marks {
        total_marks += total;
        obtained_marks += obtained;
    }
    if total_marks > 0.0 {
        round_off_2_decimals(100.0 * obtained_marks / total_marks)
    } else {
        0.0
    }
}

/// Sums `due` per calendar year of the payment date. Only years with at least
/// one contributing record appear in the map; rows with an unparseable date
/// are skipped.
pub fn yearly_due_totals<'a, I>(records: I) -> BTreeMap<i32, f64>
where
    I: IntoIterator<Item = &'a PaymentRecord>,
{
    let mut dues: BTreeMap<i32, f64> = BTreeMap::new();
    for p in records {
        let Some(year) = date_year(&p.date) else {
            continue;
        };
        *dues.entry(year).or_insert(0.0) += p.due;
    }
    dues
}
