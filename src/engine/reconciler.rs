// src/engine/reconciler.rs

use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    engine::schedule::{self, ScheduleOwner},
    models::installment::{Installment, InstallmentStatus, NewInstallment},
};

/// New loan terms as they apply to the schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleChange {
    pub owner: ScheduleOwner,
    pub installment_amount: Decimal,
    pub tenure: i32,
    pub emi_start_date: NaiveDate,
}

/// Full target state of one kept installment.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallmentUpdate {
    pub id: Uuid,
    pub installment_number: i32,
    pub due_date: NaiveDate,
    pub installment_amount: Decimal,
    pub status: InstallmentStatus,
    pub loan_number: String,
    pub customer_name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcilePlan {
    pub updates: Vec<InstallmentUpdate>,
    pub inserts: Vec<NewInstallment>,
    pub deletes: Vec<Uuid>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.inserts.is_empty() && self.deletes.is_empty()
    }
}

/// Works out what has to change in `existing` (any order) so the schedule
/// follows `change`.
///
/// Paid rows keep their amount; rows beyond the new tenure are dropped only
/// while no money has been recorded against them.
pub fn reconcile(existing: &[Installment], change: &ScheduleChange) -> Result<ReconcilePlan, AppError> {
    let mut ordered: Vec<&Installment> = existing.iter().collect();
    ordered.sort_by_key(|inst| inst.installment_number);

    let mut plan = ReconcilePlan::default();
    let mut kept_numbers = BTreeSet::new();

    for inst in &ordered {
        if inst.installment_number > change.tenure && !inst.carries_payment() {
            plan.deletes.push(inst.id);
            continue;
        }
        kept_numbers.insert(inst.installment_number);

        let due_date = schedule::due_date(change.emi_start_date, inst.installment_number)?;

        let (installment_amount, status) = if inst.status == InstallmentStatus::Paid {
            (inst.installment_amount, inst.status)
        } else {
            (
                change.installment_amount,
                InstallmentStatus::derive(inst.amount_paid, change.installment_amount, inst.is_overdue),
            )
        };

        let target = InstallmentUpdate {
            id: inst.id,
            installment_number: inst.installment_number,
            due_date,
            installment_amount,
            status,
            loan_number: change.owner.loan_number.clone(),
            customer_name: change.owner.customer_name.clone(),
        };

        if differs(inst, &target) {
            plan.updates.push(target);
        }
    }

    // Every month of the tenure needs a row. Kept rows beyond the tenure
    // already own their numbers, so filling the holes never collides.
    for seq in (1..=change.tenure).filter(|seq| !kept_numbers.contains(seq)) {
        plan.inserts.push(schedule::new_installment(
            &change.owner,
            seq,
            change.emi_start_date,
            change.installment_amount,
        )?);
    }

    Ok(plan)
}

fn differs(current: &Installment, target: &InstallmentUpdate) -> bool {
    current.due_date != target.due_date
        || current.installment_amount != target.installment_amount
        || current.status != target.status
        || current.loan_number != target.loan_number
        || current.customer_name != target.customer_name
}
