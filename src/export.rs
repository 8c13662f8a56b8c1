//! Projections for the spreadsheet writer: flat rows plus a trailing totals
//! row for payment history, date-sorted rows plus a trend series for exam
//! history. File generation itself lives outside this crate.

use serde::Serialize;

use crate::calc;
use crate::db::{ExamRecord, PaymentRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DueStatus {
    Overdue,
    Settled,
}

impl DueStatus {
    pub fn for_due(due: f64) -> Self {
        if due > 0.0 {
            DueStatus::Overdue
        } else {
            DueStatus::Settled
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentExportRow {
    pub date: String,
    pub payment: f64,
    pub paid: f64,
    pub due: f64,
    pub total_subjects: i64,
    pub status: DueStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentExportTotals {
    pub payment: f64,
    pub paid: f64,
    pub due: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentExport {
    pub rows: Vec<PaymentExportRow>,
    pub totals: PaymentExportTotals,
}

/// Rows keep the store's retrieval (insertion) order. The totals row sums
/// payment, paid, and due; total_subjects is deliberately not summed.
pub fn project_payment_history(records: &[PaymentRecord]) -> PaymentExport {
    let mut totals = PaymentExportTotals {
        payment: 0.0,
        paid: 0.0,
        due: 0.0,
    };
    let rows = records
        .iter()
        .map(|p| {
            totals.payment += p.payment;
            totals.paid += p.paid;
            totals.due += p.due;
            PaymentExportRow {
                date: p.date.clone(),
                payment: p.payment,
                paid: p.paid,
                due: p.due,
                total_subjects: p.total_subjects,
                status: DueStatus::for_due(p.due),
            }
        })
        .collect();
    PaymentExport { rows, totals }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamExportRow {
    pub date: String,
    pub subject_name: String,
    pub total_marks: f64,
    pub obtained_marks: f64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: String,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamExport {
    pub rows: Vec<ExamExportRow>,
    pub trend: Vec<TrendPoint>,
}

/// Rows sorted ascending by date (ISO strings compare chronologically), each
/// with a zero-guarded per-row percentage. The trend series mirrors the rows
/// for the line chart over time.
pub fn project_exam_history(records: &[ExamRecord]) -> ExamExport {
    let mut sorted: Vec<&ExamRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.date.cmp(&b.date));

    let mut rows = Vec::with_capacity(sorted.len());
    let mut trend = Vec::with_capacity(sorted.len());
    for e in sorted {
        let percentage = calc::exam_percentage([(e.total_marks, e.obtained_marks)]);
        rows.push(ExamExportRow {
            date: e.date.clone(),
            subject_name: e.subject_name.clone(),
            total_marks: e.total_marks,
            obtained_marks: e.obtained_marks,
            percentage,
        });
        trend.push(TrendPoint {
            date: e.date.clone(),
            percentage,
        });
    }
    ExamExport { rows, trend }
}
