//! EMI schedule engine.
//!
//! Pure functions only: the services feed it rows read from the database and
//! persist whatever it returns.

pub mod calculator;
pub mod payments;
pub mod reconciler;
pub mod schedule;

pub use calculator::{EmiQuote, LoanTerms};
pub use payments::{PaymentGroup, PaymentLine, RecomputedPayments};
pub use reconciler::{InstallmentUpdate, ReconcilePlan, ScheduleChange};
pub use schedule::ScheduleOwner;
