// src/common/i18n.rs

use std::collections::HashMap;

pub const DEFAULT_LANG: &str = "en";

// (code, message). `{0}` is replaced by the error argument when there is one.
const EN: &[(&str, &str)] = &[
    ("validation_failed", "One or more fields are invalid."),
    ("email_already_exists", "This e-mail is already in use."),
    ("invalid_credentials", "Invalid e-mail or password."),
    ("invalid_token", "Authentication token is invalid or missing."),
    ("user_not_found", "User not found."),
    ("customer_not_found", "Customer not found."),
    ("loan_not_found", "Loan not found."),
    ("installment_not_found", "Installment not found."),
    ("expense_not_found", "Expense not found."),
    ("employee_not_found", "Employee not found."),
    ("loan_number_exists", "Loan number '{0}' already exists."),
    ("invalid_schedule", "The installment schedule could not be built: {0}"),
    ("statement_unavailable", "The loan statement could not be generated."),
    ("internal_error", "An unexpected error occurred."),
    // validator message codes
    ("required", "This field is required."),
    ("invalid_email", "The e-mail address is invalid."),
    ("password_too_short", "The password must have at least 6 characters."),
    ("must_be_positive", "The value must be greater than zero."),
    ("must_not_be_negative", "The value cannot be negative."),
    ("tenure_out_of_range", "Tenure must be between 1 and 600 months."),
    ("start_before_loan_date", "The EMI start date cannot be before the loan date."),
    ("amount_too_large", "The amount is larger than the system can store."),
    ("rate_too_large", "The interest rate is too large."),
    ("too_many_decimals", "The value has more decimal places than allowed."),
];

const HI: &[(&str, &str)] = &[
    ("validation_failed", "एक या अधिक फ़ील्ड अमान्य हैं।"),
    ("email_already_exists", "यह ई-मेल पहले से उपयोग में है।"),
    ("invalid_credentials", "ई-मेल या पासवर्ड गलत है।"),
    ("invalid_token", "प्रमाणीकरण टोकन अमान्य है या मौजूद नहीं है।"),
    ("user_not_found", "उपयोगकर्ता नहीं मिला।"),
    ("customer_not_found", "ग्राहक नहीं मिला।"),
    ("loan_not_found", "ऋण नहीं मिला।"),
    ("installment_not_found", "किस्त नहीं मिली।"),
    ("expense_not_found", "खर्च नहीं मिला।"),
    ("employee_not_found", "कर्मचारी नहीं मिला।"),
    ("loan_number_exists", "ऋण संख्या '{0}' पहले से मौजूद है।"),
    ("invalid_schedule", "किस्त अनुसूची नहीं बन सकी: {0}"),
    ("statement_unavailable", "ऋण विवरण नहीं बन सका।"),
    ("internal_error", "एक अप्रत्याशित त्रुटि हुई।"),
    ("required", "यह फ़ील्ड आवश्यक है।"),
    ("invalid_email", "ई-मेल पता अमान्य है।"),
    ("password_too_short", "पासवर्ड में कम से कम 6 अक्षर होने चाहिए।"),
    ("must_be_positive", "मान शून्य से अधिक होना चाहिए।"),
    ("must_not_be_negative", "मान ऋणात्मक नहीं हो सकता।"),
    ("tenure_out_of_range", "अवधि 1 से 600 महीनों के बीच होनी चाहिए।"),
    ("start_before_loan_date", "EMI प्रारंभ तिथि ऋण तिथि से पहले नहीं हो सकती।"),
    ("amount_too_large", "राशि सिस्टम की सीमा से अधिक है।"),
    ("rate_too_large", "ब्याज दर बहुत अधिक है।"),
    ("too_many_decimals", "मान में अनुमत से अधिक दशमलव स्थान हैं।"),
];

/// Message catalogs keyed by language, then by error code.
#[derive(Debug, Clone)]
pub struct I18nStore {
    catalogs: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

impl I18nStore {
    pub fn new() -> Self {
        let mut catalogs = HashMap::new();
        catalogs.insert("en", EN.iter().copied().collect());
        catalogs.insert("hi", HI.iter().copied().collect());
        Self { catalogs }
    }

    /// Looks `code` up in `lang`, then English, then returns the code itself.
    pub fn translate(&self, lang: &str, code: &str) -> String {
        self.catalogs
            .get(lang)
            .and_then(|catalog| catalog.get(code))
            .or_else(|| self.catalogs.get(DEFAULT_LANG).and_then(|catalog| catalog.get(code)))
            .map(|msg| msg.to_string())
            .unwrap_or_else(|| code.to_string())
    }

    pub fn translate_with(&self, lang: &str, code: &str, arg: &str) -> String {
        self.translate(lang, code).replace("{0}", arg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_english_code_has_a_hindi_message() {
        let store = I18nStore::new();
        for (code, _) in EN {
            assert!(store.catalogs["hi"].contains_key(code), "missing hi message for {code}");
        }
    }

    #[test]
    fn unknown_language_falls_back_to_english() {
        let store = I18nStore::new();
        assert_eq!(store.translate("fr", "loan_not_found"), "Loan not found.");
    }

    #[test]
    fn unknown_code_is_returned_verbatim() {
        let store = I18nStore::new();
        assert_eq!(store.translate("en", "no_such_code"), "no_such_code");
    }

    #[test]
    fn argument_is_substituted() {
        let store = I18nStore::new();
        assert_eq!(
            store.translate_with("en", "loan_number_exists", "LN-9"),
            "Loan number 'LN-9' already exists."
        );
    }
}
