// src/engine/payments.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::validation::validate_amount_scale,
    engine::calculator::round_currency,
    models::installment::{InstallmentStatus, PaymentEntry},
};

#[derive(Debug, Clone, PartialEq, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLine {
    #[validate(custom(function = "validate_amount_scale"))]
    #[schema(example = "500.00")]
    pub amount: Decimal,
    #[schema(example = "Cash")]
    pub mode: String,
}

/// Payments received on one day. A group without entries contributes nothing.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentGroup {
    #[schema(value_type = String, format = Date, example = "2024-03-10")]
    pub date: NaiveDate,
    #[validate(nested)]
    #[serde(default)]
    pub entries: Vec<PaymentLine>,
}

/// Everything that follows from an installment's payment ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct RecomputedPayments {
    pub payment_history: Vec<PaymentEntry>,
    pub amount_paid: Decimal,
    pub payment_mode: Option<String>,
    pub payment_date: Option<NaiveDate>,
    pub status: InstallmentStatus,
}

/// Rebuilds the installment state from a complete replacement ledger.
///
/// The supplied groups ARE the new history: whatever the client leaves out is
/// gone. Amounts are taken at currency precision, so the history always sums
/// to what the money column stores. Lines with a non-positive amount or a
/// blank mode are dropped, and so are empty groups.
pub fn recompute(
    groups: &[PaymentGroup],
    installment_amount: Decimal,
    is_overdue: bool,
    payment_date_override: Option<NaiveDate>,
) -> RecomputedPayments {
    let payment_history: Vec<PaymentEntry> = groups
        .iter()
        .flat_map(|group| {
            group.entries.iter().filter_map(move |line| {
                let mode = line.mode.trim();
                let amount = round_currency(line.amount);
                if amount <= Decimal::ZERO || mode.is_empty() {
                    return None;
                }
                Some(PaymentEntry {
                    amount,
                    mode: mode.to_string(),
                    date: group.date,
                })
            })
        })
        .collect();

    let amount_paid: Decimal = payment_history.iter().map(|entry| entry.amount).sum();

    let mut modes: Vec<&str> = Vec::new();
    for entry in &payment_history {
        if !modes.contains(&entry.mode.as_str()) {
            modes.push(&entry.mode);
        }
    }
    let payment_mode = (!modes.is_empty()).then(|| modes.join(", "));

    let latest = payment_history.iter().map(|entry| entry.date).max();
    let payment_date = payment_date_override.or(latest);

    let status = InstallmentStatus::derive(amount_paid, installment_amount, is_overdue);

    RecomputedPayments {
        payment_history,
        amount_paid,
        payment_mode,
        payment_date,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn line(amount: Decimal, mode: &str) -> PaymentLine {
        PaymentLine { amount, mode: mode.to_string() }
    }

    #[test]
    fn two_modes_settle_installment() {
        let d1 = date(2024, 3, 1);
        let d2 = date(2024, 3, 9);
        let groups = vec![
            PaymentGroup { date: d1, entries: vec![line(dec!(500), "Cash")] },
            PaymentGroup { date: d2, entries: vec![line(dec!(300), "Online")] },
        ];

        let out = recompute(&groups, dec!(800), false, None);

        assert_eq!(out.amount_paid, dec!(800));
        assert_eq!(out.status, InstallmentStatus::Paid);
        assert_eq!(out.payment_mode.as_deref(), Some("Cash, Online"));
        assert_eq!(out.payment_date, Some(d2));
        assert_eq!(
            out.payment_history,
            vec![
                PaymentEntry { amount: dec!(500), mode: "Cash".to_string(), date: d1 },
                PaymentEntry { amount: dec!(300), mode: "Online".to_string(), date: d2 },
            ]
        );
    }

    #[test]
    fn single_short_payment_is_partial() {
        let groups = vec![PaymentGroup {
            date: date(2024, 3, 1),
            entries: vec![line(dec!(400), "Cash")],
        }];

        let out = recompute(&groups, dec!(800), false, None);

        assert_eq!(out.amount_paid, dec!(400));
        assert_eq!(out.status, InstallmentStatus::PartiallyPaid);
    }

    #[test]
    fn invalid_lines_are_discarded() {
        let groups = vec![PaymentGroup {
            date: date(2024, 3, 1),
            entries: vec![
                line(dec!(0), "Cash"),
                line(dec!(-50), "Cash"),
                line(dec!(200), "   "),
                line(dec!(250), " UPI "),
            ],
        }];

        let out = recompute(&groups, dec!(800), false, None);

        assert_eq!(out.payment_history.len(), 1);
        assert_eq!(out.payment_history[0].mode, "UPI");
        assert_eq!(out.amount_paid, dec!(250));
    }

    #[test]
    fn modes_are_deduplicated_in_first_seen_order() {
        let groups = vec![
            PaymentGroup {
                date: date(2024, 3, 1),
                entries: vec![line(dec!(100), "Online"), line(dec!(100), "Cash")],
            },
            PaymentGroup {
                date: date(2024, 3, 2),
                entries: vec![line(dec!(100), "Online"), line(dec!(100), "Cheque")],
            },
        ];

        let out = recompute(&groups, dec!(1000), false, None);
        assert_eq!(out.payment_mode.as_deref(), Some("Online, Cash, Cheque"));
    }

    #[test]
    fn empty_ledger_resets_installment() {
        let out = recompute(&[], dec!(800), false, None);

        assert!(out.payment_history.is_empty());
        assert_eq!(out.amount_paid, Decimal::ZERO);
        assert_eq!(out.payment_mode, None);
        assert_eq!(out.payment_date, None);
        assert_eq!(out.status, InstallmentStatus::Pending);
    }

    #[test]
    fn empty_ledger_on_flagged_row_shows_overdue() {
        let out = recompute(&[], dec!(800), true, None);
        assert_eq!(out.status, InstallmentStatus::Overdue);
    }

    #[test]
    fn empty_group_is_dropped_silently() {
        let groups = vec![
            PaymentGroup { date: date(2024, 3, 1), entries: Vec::new() },
            PaymentGroup { date: date(2024, 3, 5), entries: vec![line(dec!(300), "Cash")] },
        ];
        assert!(groups.iter().all(|g| g.validate().is_ok()));

        let out = recompute(&groups, dec!(800), false, None);

        assert_eq!(out.payment_history.len(), 1);
        assert_eq!(out.amount_paid, dec!(300));
        assert_eq!(out.payment_date, Some(date(2024, 3, 5)));
    }

    #[test]
    fn history_sums_to_amount_paid_at_currency_precision() {
        let groups = vec![PaymentGroup {
            date: date(2024, 3, 1),
            entries: vec![line(dec!(100.005), "Cash"), line(dec!(0.004), "Cash")],
        }];

        let out = recompute(&groups, dec!(800), false, None);

        assert_eq!(out.payment_history.len(), 1);
        assert_eq!(out.payment_history[0].amount, dec!(100.01));
        let sum: Decimal = out.payment_history.iter().map(|e| e.amount).sum();
        assert_eq!(sum, out.amount_paid);
    }

    #[test]
    fn sub_paisa_line_fails_validation() {
        let group = PaymentGroup {
            date: date(2024, 3, 1),
            entries: vec![line(dec!(100.005), "Cash")],
        };
        assert!(group.validate().is_err());
    }

    #[test]
    fn explicit_payment_date_wins() {
        let chosen = date(2024, 4, 2);
        let groups = vec![PaymentGroup {
            date: date(2024, 3, 20),
            entries: vec![line(dec!(800), "Cash")],
        }];

        let out = recompute(&groups, dec!(800), false, Some(chosen));
        assert_eq!(out.payment_date, Some(chosen));
    }

    #[test]
    fn latest_date_is_used_even_when_groups_are_unsorted() {
        let groups = vec![
            PaymentGroup { date: date(2024, 5, 1), entries: vec![line(dec!(100), "Cash")] },
            PaymentGroup { date: date(2024, 4, 1), entries: vec![line(dec!(100), "Cash")] },
        ];

        let out = recompute(&groups, dec!(800), false, None);
        assert_eq!(out.payment_date, Some(date(2024, 5, 1)));
    }
}
