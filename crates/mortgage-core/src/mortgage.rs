use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on the number of monthly payments (50 years)
pub const MAX_PAYMENTS: u32 = 600;
/// Sanity ceiling on the annual rate, in percent
pub const MAX_INTEREST_RATE: f64 = 50.0;
pub const MIN_TERM_YEARS: u32 = 1;
pub const MAX_TERM_YEARS: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MortgageInputs {
    pub loan_amount: f64,
    /// Annual rate in percent, e.g. `3.5`
    pub interest_rate: f64,
    pub loan_term_years: u32,
    #[serde(default)]
    pub down_payment: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_price: Option<f64>,
}

impl MortgageInputs {
    pub fn new(loan_amount: f64, interest_rate: f64, loan_term_years: u32) -> Self {
        Self {
            loan_amount,
            interest_rate,
            loan_term_years,
            down_payment: 0.0,
            property_price: None,
        }
    }

    pub fn from_purchase(
        property_price: f64,
        down_payment: f64,
        interest_rate: f64,
        loan_term_years: u32,
    ) -> Self {
        Self {
            loan_amount: property_price - down_payment,
            interest_rate,
            loan_term_years,
            down_payment,
            property_price: Some(property_price),
        }
    }

    pub fn with_down_payment(mut self, down_payment: f64) -> Self {
        self.down_payment = down_payment;
        self
    }

    pub fn with_property_price(mut self, property_price: f64) -> Self {
        self.property_price = Some(property_price);
        self
    }

    pub fn monthly_rate(&self) -> f64 {
        self.interest_rate / 100.0 / 12.0
    }

    pub fn num_payments(&self) -> u32 {
        self.loan_term_years.saturating_mul(12).min(MAX_PAYMENTS)
    }
}

/// Unrounded amortization summary
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Amortization {
    pub monthly_payment: f64,
    pub total_payment: f64,
    pub total_interest: f64,
    pub num_payments: u32,
}

impl Amortization {
    /// Input is not checked here; see [`validate_mortgage_inputs`]
    pub fn compute(inputs: &MortgageInputs) -> Self {
        let rate = inputs.monthly_rate();
        let num_payments = inputs.num_payments();
        let n = num_payments as f64;

        let monthly_payment = if rate == 0.0 {
            inputs.loan_amount / n
        } else {
            let growth = (1.0 + rate).powi(num_payments as i32);
            inputs.loan_amount * rate * growth / (growth - 1.0)
        };

        let total_payment = monthly_payment * n;
        Self {
            monthly_payment,
            total_payment,
            total_interest: total_payment - inputs.loan_amount,
            num_payments,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MortgageResults {
    pub monthly_payment: f64,
    pub total_interest: f64,
    pub total_payment: f64,

    pub loan_amount: f64,
    pub interest_rate: f64,
    pub loan_term_years: u32,
    pub down_payment: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_price: Option<f64>,

    /// Loan as a percentage of the property price, when a price was given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_to_value_ratio: Option<f64>,
    pub principal_and_interest: f64,
}

impl MortgageResults {
    pub fn new(inputs: &MortgageInputs, amortization: &Amortization) -> Self {
        let monthly_payment = round_cents(amortization.monthly_payment);
        Self {
            monthly_payment,
            total_interest: round_cents(amortization.total_interest),
            total_payment: round_cents(amortization.total_payment),
            loan_amount: inputs.loan_amount,
            interest_rate: inputs.interest_rate,
            loan_term_years: inputs.loan_term_years,
            down_payment: inputs.down_payment,
            property_price: inputs.property_price,
            loan_to_value_ratio: inputs
                .property_price
                .map(|price| round_cents(inputs.loan_amount / price * 100.0)),
            principal_and_interest: monthly_payment,
        }
    }
}

pub fn calculate_mortgage(inputs: &MortgageInputs) -> MortgageResults {
    MortgageResults::new(inputs, &Amortization::compute(inputs))
}

/// Adding `0.0` folds `-0.0` into `0.0`
fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0 + 0.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InputIssue {
    #[error("Loan amount must be greater than 0")]
    LoanAmountNotPositive,
    #[error("Interest rate must be between 0 and 50%")]
    InterestRateOutOfRange,
    #[error("Loan term must be between 1 and 50 years")]
    LoanTermOutOfRange,
    #[error("Down payment cannot be negative")]
    NegativeDownPayment,
    #[error("Down payment must be less than the property price")]
    DownPaymentNotBelowPrice,
}

/// Reports every violated rule. Comparisons are negated so NaN fails them.
pub fn validate_mortgage_inputs(inputs: &MortgageInputs) -> Vec<InputIssue> {
    let mut issues = Vec::new();

    if !(inputs.loan_amount > 0.0) {
        issues.push(InputIssue::LoanAmountNotPositive);
    }

    if !(0.0..=MAX_INTEREST_RATE).contains(&inputs.interest_rate) {
        issues.push(InputIssue::InterestRateOutOfRange);
    }

    if !(MIN_TERM_YEARS..=MAX_TERM_YEARS).contains(&inputs.loan_term_years) {
        issues.push(InputIssue::LoanTermOutOfRange);
    }

    if !(inputs.down_payment >= 0.0) {
        issues.push(InputIssue::NegativeDownPayment);
    }

    if let Some(price) = inputs.property_price {
        if !(inputs.down_payment < price) {
            issues.push(InputIssue::DownPaymentNotBelowPrice);
        }
    }

    issues
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Currency {
    #[default]
    Usd,
    Eur,
}

impl Currency {
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
        }
    }
}

/// Whole-unit amount with thousands separators, e.g. `$1,796` or `-€2,500`
pub fn format_currency(amount: f64, currency: Currency) -> String {
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{}{}{}", sign, currency.symbol(), grouped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {} to be within {} of {}",
            actual,
            tolerance,
            expected
        );
    }

    #[test]
    fn test_thirty_year_loan() {
        let results = calculate_mortgage(&MortgageInputs::new(400_000.0, 3.5, 30));
        assert_eq!(results.monthly_payment, 1796.18);
        assert_close(results.total_payment, 646_624.35, 0.01);
        assert_close(results.total_interest, 246_624.35, 0.01);
        assert_eq!(results.principal_and_interest, results.monthly_payment);
        assert_eq!(results.loan_to_value_ratio, None);
    }

    #[test]
    fn test_totals_follow_from_monthly_payment() {
        let cases = [
            (250_000.0, 6.25, 30),
            (90_000.0, 0.5, 10),
            (1_200_000.0, 12.0, 25),
            (15_000.0, 49.9, 1),
        ];
        for (amount, rate, years) in cases {
            let inputs = MortgageInputs::new(amount, rate, years);
            let a = Amortization::compute(&inputs);
            let n = (years * 12) as f64;
            assert_close(a.total_payment, a.monthly_payment * n, 0.01);
            assert_close(a.total_interest, a.total_payment - amount, 0.01);

            let rounded = MortgageResults::new(&inputs, &a);
            assert_close(rounded.total_interest, rounded.total_payment - amount, 0.01);
        }
    }

    #[test]
    fn test_zero_rate_splits_principal_evenly() {
        let results = calculate_mortgage(&MortgageInputs::new(200_000.0, 0.0, 15));
        assert_eq!(results.monthly_payment, 1111.11);
        assert_close(results.total_payment, 200_000.0, 0.01);
        assert_close(results.total_interest, 0.0, 0.01);
        assert!(!results.total_interest.is_sign_negative());
    }

    #[test]
    fn test_zero_rate_interest_is_never_negative_zero() {
        for years in [7, 14, 28] {
            let inputs = MortgageInputs::new(200_000.0, 0.0, years);
            // (L / n) * n lands a hair under L for these terms
            assert!(Amortization::compute(&inputs).total_interest < 0.0);

            let results = calculate_mortgage(&inputs);
            assert_eq!(results.total_interest, 0.0);
            assert!(!results.total_interest.is_sign_negative());

            let json = serde_json::to_string(&results).unwrap();
            assert!(json.contains(r#""totalInterest":0.0"#), "{}", json);
        }
    }

    #[test]
    fn test_rounding_happens_once() {
        let inputs = MortgageInputs::new(400_000.0, 3.5, 30);
        let a = Amortization::compute(&inputs);
        let results = MortgageResults::new(&inputs, &a);
        // Totals derive from the unrounded monthly payment
        assert_ne!(results.total_payment, results.monthly_payment * 360.0);
        assert_eq!(results.total_payment, (a.total_payment * 100.0).round() / 100.0);
    }

    #[test]
    fn test_loan_to_value_ratio() {
        let inputs = MortgageInputs::from_purchase(500_000.0, 100_000.0, 4.0, 30);
        assert_eq!(inputs.loan_amount, 400_000.0);
        let results = calculate_mortgage(&inputs);
        assert_eq!(results.loan_to_value_ratio, Some(80.0));
        assert_eq!(results.down_payment, 100_000.0);
        assert_eq!(results.property_price, Some(500_000.0));
    }

    #[test]
    fn test_num_payments_is_clamped() {
        let inputs = MortgageInputs::new(100_000.0, 5.0, 200);
        assert_eq!(inputs.num_payments(), MAX_PAYMENTS);
        let a = Amortization::compute(&inputs);
        assert!(a.monthly_payment.is_finite());
    }

    #[test]
    fn test_validate_reports_every_violation() {
        let inputs = MortgageInputs {
            loan_amount: -1.0,
            interest_rate: 60.0,
            loan_term_years: 0,
            down_payment: -5.0,
            property_price: Some(100.0),
        };
        let issues = validate_mortgage_inputs(&inputs);
        assert_eq!(
            issues,
            vec![
                InputIssue::LoanAmountNotPositive,
                InputIssue::InterestRateOutOfRange,
                InputIssue::LoanTermOutOfRange,
                InputIssue::NegativeDownPayment,
            ]
        );
    }

    #[test]
    fn test_validate_accepts_reasonable_inputs() {
        let inputs = MortgageInputs::from_purchase(450_000.0, 50_000.0, 3.5, 30);
        assert!(validate_mortgage_inputs(&inputs).is_empty());

        let boundary = MortgageInputs::new(1.0, 50.0, 50);
        assert!(validate_mortgage_inputs(&boundary).is_empty());
    }

    #[test]
    fn test_validate_down_payment_against_price() {
        let inputs = MortgageInputs::new(1.0, 3.0, 30)
            .with_down_payment(300_000.0)
            .with_property_price(300_000.0);
        let issues = validate_mortgage_inputs(&inputs);
        assert_eq!(issues, vec![InputIssue::DownPaymentNotBelowPrice]);
        assert_eq!(
            issues[0].to_string(),
            "Down payment must be less than the property price"
        );
    }

    #[test]
    fn test_validate_rejects_nan() {
        let inputs = MortgageInputs::new(f64::NAN, f64::NAN, 30);
        assert_eq!(validate_mortgage_inputs(&inputs).len(), 2);
    }

    #[test]
    fn test_inputs_deserialize_from_camel_case() {
        let inputs: MortgageInputs = serde_json::from_str(concat!(
            r#"{"loanAmount":400000,"interestRate":3.5,"loanTermYears":30,"#,
            r#""downPayment":50000,"propertyPrice":450000}"#,
        ))
        .unwrap();
        assert_eq!(inputs.loan_amount, 400_000.0);
        assert_eq!(inputs.property_price, Some(450_000.0));
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(1796.18, Currency::Usd), "$1,796");
        assert_eq!(format_currency(646_624.35, Currency::Usd), "$646,624");
        assert_eq!(format_currency(999.5, Currency::Usd), "$1,000");
        assert_eq!(format_currency(0.0, Currency::Eur), "€0");
        assert_eq!(format_currency(-2500.0, Currency::Eur), "-€2,500");
        assert_eq!(format_currency(1_000_000.0, Currency::Usd), "$1,000,000");
    }
}
