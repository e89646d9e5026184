// src/services/document_service.rs

use chrono::Utc;
use genpdf::{elements, style, Alignment, Element};
use image::Luma;
use qrcode::QrCode;
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{InstallmentRepository, LoanRepository},
    models::{
        installment::{Installment, InstallmentStatus},
        loan::{InterestPolicy, Loan, LoanStatus, LoanSummary},
    },
};

const FONT_FAMILY: &str = "Roboto";

#[derive(Clone)]
pub struct DocumentService {
    loan_repo: LoanRepository,
    installment_repo: InstallmentRepository,
    fonts_dir: String,
    company_name: String,
    upi_id: Option<String>,
}

fn money(value: Decimal) -> String {
    format!("Rs. {:.2}", value)
}

fn status_label(status: InstallmentStatus) -> &'static str {
    match status {
        InstallmentStatus::Pending => "Pending",
        InstallmentStatus::PartiallyPaid => "Partially Paid",
        InstallmentStatus::Paid => "Paid",
        InstallmentStatus::Overdue => "Overdue",
    }
}

fn loan_status_label(status: LoanStatus) -> &'static str {
    match status {
        LoanStatus::Active => "Active",
        LoanStatus::Closed => "Closed",
        LoanStatus::Seized => "Seized",
    }
}

fn policy_label(policy: InterestPolicy) -> &'static str {
    match policy {
        InterestPolicy::Flat => "Flat",
        InterestPolicy::Amortizing => "Reducing balance",
    }
}

/// Earliest installment that still has something owed on it.
fn next_due(installments: &[Installment]) -> Option<&Installment> {
    installments
        .iter()
        .filter(|inst| inst.status != InstallmentStatus::Paid)
        .min_by_key(|inst| inst.installment_number)
}

/// `upi://pay` deep link understood by Indian payment apps.
pub fn upi_payment_uri(upi_id: &str, payee: &str, amount: Decimal, note: &str) -> String {
    format!(
        "upi://pay?pa={}&pn={}&am={:.2}&cu=INR&tn={}",
        urlencoding::encode(upi_id.trim()),
        urlencoding::encode(payee),
        amount,
        urlencoding::encode(note),
    )
}

fn render_error(e: impl std::fmt::Display) -> AppError {
    AppError::PdfRenderError(e.to_string())
}

impl DocumentService {
    pub fn new(
        loan_repo: LoanRepository,
        installment_repo: InstallmentRepository,
        fonts_dir: String,
        company_name: String,
        upi_id: Option<String>,
    ) -> Self {
        Self { loan_repo, installment_repo, fonts_dir, company_name, upi_id }
    }

    pub async fn generate_loan_statement<'e, E>(&self, executor: E, loan_id: Uuid) -> Result<Vec<u8>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let loan = self
            .loan_repo
            .find_by_id(&mut *tx, loan_id)
            .await?
            .ok_or(AppError::LoanNotFound)?;
        let installments = self.installment_repo.list_by_loan(&mut *tx, loan_id).await?;

        tx.commit().await?;

        let pdf = self.render_statement(&loan, &installments)?;

        tracing::info!(loan_id = %loan.id, bytes = pdf.len(), "📄 Loan statement rendered");

        Ok(pdf)
    }

    fn render_statement(&self, loan: &Loan, installments: &[Installment]) -> Result<Vec<u8>, AppError> {
        let font_family = genpdf::fonts::from_files(&self.fonts_dir, FONT_FAMILY, None)
            .map_err(|_| AppError::FontNotFound(format!("{FONT_FAMILY} in {}", self.fonts_dir)))?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(format!("Loan statement {}", loan.loan_number));
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        // --- HEADER ---
        doc.push(
            elements::Paragraph::new(self.company_name.clone())
                .styled(style::Style::new().bold().with_font_size(18)),
        );
        doc.push(elements::Break::new(1.5));
        doc.push(
            elements::Paragraph::new(format!("LOAN STATEMENT #{}", loan.loan_number))
                .styled(style::Style::new().bold().with_font_size(14)),
        );
        doc.push(elements::Paragraph::new(format!("Customer: {}", loan.customer_name)));
        if let Some(vehicle) = &loan.vehicle_number {
            doc.push(elements::Paragraph::new(format!("Vehicle: {vehicle}")));
        }
        doc.push(elements::Paragraph::new(format!(
            "Loan date: {}    First EMI: {}    Status: {}",
            loan.loan_date.format("%d/%m/%Y"),
            loan.emi_start_date.format("%d/%m/%Y"),
            loan_status_label(loan.status),
        )));
        doc.push(elements::Paragraph::new(format!(
            "Principal: {}    Rate: {}%    Tenure: {} months ({})",
            money(loan.principal),
            loan.interest_rate,
            loan.tenure_months,
            policy_label(loan.interest_policy),
        )));
        doc.push(elements::Paragraph::new(format!(
            "Monthly EMI: {}    Total interest: {}",
            money(loan.monthly_emi),
            money(loan.total_interest_amount),
        )));

        doc.push(elements::Break::new(2));

        // --- SCHEDULE ---
        // Weights: #, due date, amount, paid, status, mode
        let mut table = elements::TableLayout::new(vec![1, 2, 2, 2, 2, 2]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

        let style_bold = style::Style::new().bold();
        table
            .row()
            .element(elements::Paragraph::new("#").styled(style_bold))
            .element(elements::Paragraph::new("Due date").styled(style_bold))
            .element(elements::Paragraph::new("EMI").styled(style_bold))
            .element(elements::Paragraph::new("Paid").styled(style_bold))
            .element(elements::Paragraph::new("Status").styled(style_bold))
            .element(elements::Paragraph::new("Mode").styled(style_bold))
            .push()
            .map_err(render_error)?;

        for inst in installments {
            table
                .row()
                .element(elements::Paragraph::new(inst.installment_number.to_string()))
                .element(elements::Paragraph::new(inst.due_date.format("%d/%m/%Y").to_string()))
                .element(elements::Paragraph::new(money(inst.installment_amount)))
                .element(elements::Paragraph::new(money(inst.amount_paid)))
                .element(elements::Paragraph::new(status_label(inst.status)))
                .element(elements::Paragraph::new(inst.payment_mode.clone().unwrap_or_default()))
                .push()
                .map_err(render_error)?;
        }

        doc.push(table);
        doc.push(elements::Break::new(2));

        // --- TOTALS ---
        let summary = LoanSummary::from_installments(installments);
        let mut collected = elements::Paragraph::new(format!("Collected: {}", money(summary.amount_collected)));
        collected.set_alignment(Alignment::Right);
        doc.push(collected.styled(style::Style::new().bold().with_font_size(12)));

        let mut outstanding = elements::Paragraph::new(format!("Outstanding: {}", money(summary.amount_outstanding)));
        outstanding.set_alignment(Alignment::Right);
        doc.push(outstanding.styled(style::Style::new().bold().with_font_size(12)));

        // --- UPI QR for the next due installment ---
        if let (Some(upi_id), Some(due)) = (&self.upi_id, next_due(installments)) {
            let remaining = (due.installment_amount - due.amount_paid).max(Decimal::ZERO);
            let uri = upi_payment_uri(
                upi_id,
                &self.company_name,
                remaining,
                &format!("{} EMI {}", loan.loan_number, due.installment_number),
            );

            doc.push(elements::Break::new(2));
            doc.push(
                elements::Paragraph::new("PAY VIA UPI").styled(style::Style::new().bold().with_font_size(12)),
            );
            doc.push(elements::Paragraph::new(format!(
                "UPI ID: {upi_id}    EMI {} due {}: {}",
                due.installment_number,
                due.due_date.format("%d/%m/%Y"),
                money(remaining),
            )));
            doc.push(elements::Break::new(1));

            let code = QrCode::new(uri.as_bytes()).map_err(render_error)?;
            let image_buffer = code.render::<Luma<u8>>().build();
            let dynamic_image = image::DynamicImage::ImageLuma8(image_buffer);

            let pdf_image = elements::Image::from_dynamic_image(dynamic_image)
                .map_err(render_error)?
                .with_scale(genpdf::Scale::new(0.5, 0.5));

            doc.push(pdf_image);
        }

        // --- FOOTER ---
        doc.push(elements::Break::new(2));
        doc.push(
            elements::Paragraph::new(format!("Generated on {}", Utc::now().format("%d/%m/%Y %H:%M UTC")))
                .styled(style::Style::new().italic().with_font_size(8)),
        );

        let mut buffer = Vec::new();
        doc.render(&mut buffer).map_err(render_error)?;

        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::installment::PaymentEntry;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use sqlx::types::Json;

    fn installment(seq: i32, status: InstallmentStatus) -> Installment {
        Installment {
            id: Uuid::new_v4(),
            loan_id: Uuid::nil(),
            loan_number: "LN-1".to_string(),
            customer_name: "Asha".to_string(),
            installment_number: seq,
            due_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            installment_amount: dec!(1000),
            amount_paid: Decimal::ZERO,
            payment_mode: None,
            payment_date: None,
            is_overdue: false,
            status,
            remarks: None,
            payment_history: Json(Vec::<PaymentEntry>::new()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn upi_link_is_encoded() {
        let uri = upi_payment_uri("emi@okbank", "Shree Finance & Co", dec!(1500), "LN-7 EMI 3");
        assert_eq!(
            uri,
            "upi://pay?pa=emi%40okbank&pn=Shree%20Finance%20%26%20Co&am=1500.00&cu=INR&tn=LN-7%20EMI%203"
        );
    }

    #[test]
    fn next_due_skips_paid_rows() {
        let rows = vec![
            installment(3, InstallmentStatus::Pending),
            installment(1, InstallmentStatus::Paid),
            installment(2, InstallmentStatus::PartiallyPaid),
        ];
        assert_eq!(next_due(&rows).map(|i| i.installment_number), Some(2));
    }

    #[test]
    fn fully_paid_loan_has_nothing_due() {
        let rows = vec![installment(1, InstallmentStatus::Paid)];
        assert!(next_due(&rows).is_none());
    }

    #[test]
    fn money_uses_two_decimals() {
        assert_eq!(money(dec!(10333.3)), "Rs. 10333.30");
    }
}
