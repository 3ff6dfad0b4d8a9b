use crate::config::ClientConfig;
use crate::mortgage::{format_currency, Currency, MortgageInputs};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum LoanError {
    #[error("Loan application {0} not found")]
    NotFound(u64),
    #[error("Failed to read fallback file {path:?}: {source}")]
    Fallback {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse fallback file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One applicant row as served by `/loan-applications/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanApplication {
    pub idx: u64,
    pub id: u64,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub email: String,
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
    #[serde(rename = "applicationdate")]
    pub application_date: String,
    pub age: u32,
    #[serde(rename = "annualincome")]
    pub annual_income: f64,
    #[serde(rename = "creditscore")]
    pub credit_score: f64,
    #[serde(rename = "employmentstatus")]
    pub employment_status: String,
    #[serde(rename = "loanamount")]
    pub loan_amount: f64,
    /// Term in months
    #[serde(rename = "loanduration")]
    pub loan_duration: f64,
    #[serde(rename = "loanpurpose")]
    pub loan_purpose: String,
    #[serde(rename = "monthlydebtpayments")]
    pub monthly_debt_payments: f64,
    #[serde(rename = "debttoincomeratio")]
    pub debt_to_income_ratio: f64,
    #[serde(rename = "savingsaccountbalance")]
    pub savings_account_balance: f64,
    #[serde(rename = "checkingaccountbalance")]
    pub checking_account_balance: f64,
    #[serde(rename = "totalassets")]
    pub total_assets: f64,
    #[serde(rename = "totalliabilities")]
    pub total_liabilities: f64,
    #[serde(rename = "monthlyincome")]
    pub monthly_income: f64,
    #[serde(rename = "networth")]
    pub net_worth: f64,
    /// Annual rate as a fraction, e.g. `0.0425`
    #[serde(rename = "interestrate")]
    pub interest_rate: f64,
    #[serde(rename = "monthlyloanpayment")]
    pub monthly_loan_payment: f64,
    #[serde(rename = "loanapproved")]
    pub loan_approved: u8,
    #[serde(rename = "riskscore")]
    pub risk_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantSummary {
    pub id: u64,
    pub full_name: String,
    pub contact_number: String,
    pub email: String,
    pub annual_income_formatted: String,
    pub down_payment_estimate: f64,
    pub loan_amount: f64,
    pub loan_term_years: u32,
    pub interest_rate_percent: f64,
}

impl From<&LoanApplication> for ApplicantSummary {
    fn from(a: &LoanApplication) -> Self {
        let full_name = format!("{} {}", a.first_name, a.last_name).trim().to_string();

        // Months to whole years; durations under six months keep the raw value
        let rounded_years = (a.loan_duration / 12.0).round();
        let years = if rounded_years == 0.0 || rounded_years.is_nan() {
            a.loan_duration
        } else {
            rounded_years
        };
        let loan_term_years = years.max(1.0) as u32;

        let interest_rate_percent = (a.interest_rate * 10_000.0).round() / 100.0;
        let down_payment_estimate = a
            .savings_account_balance
            .min(a.total_assets - a.total_liabilities)
            .max(0.0);

        Self {
            id: a.id,
            full_name,
            contact_number: a.phone_number.clone(),
            email: a.email.clone(),
            annual_income_formatted: format_currency(a.annual_income, Currency::Eur),
            down_payment_estimate,
            loan_amount: a.loan_amount,
            loan_term_years,
            interest_rate_percent,
        }
    }
}

impl ApplicantSummary {
    /// Property price is taken as loan plus estimated down payment
    pub fn mortgage_inputs(&self) -> MortgageInputs {
        MortgageInputs {
            loan_amount: self.loan_amount,
            interest_rate: self.interest_rate_percent,
            loan_term_years: self.loan_term_years,
            down_payment: self.down_payment_estimate,
            property_price: Some(self.loan_amount + self.down_payment_estimate),
        }
    }
}

/// Looks applicants up on the backend, falling back to a bundled JSON file
pub struct LoanApplicationClient {
    client: Client,
    base_url: String,
    fallback: Option<PathBuf>,
}

impl LoanApplicationClient {
    pub fn new(config: &ClientConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: config.base_url.clone(),
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, path: impl Into<PathBuf>) -> Self {
        self.fallback = Some(path.into());
        self
    }

    pub async fn get(&self, id: u64) -> Result<LoanApplication, LoanError> {
        if let Some(application) = self.fetch_from_backend(id).await {
            return Ok(application);
        }

        if let Some(path) = &self.fallback {
            if let Some(application) = Self::find_in_file(path, id).await? {
                info!(id, path = %path.display(), "loaded loan application from fallback file");
                return Ok(application);
            }
        }

        Err(LoanError::NotFound(id))
    }

    pub async fn summary(&self, id: u64) -> Result<ApplicantSummary, LoanError> {
        let application = self.get(id).await?;
        Ok(ApplicantSummary::from(&application))
    }

    /// Any backend failure counts as "no answer"
    async fn fetch_from_backend(&self, id: u64) -> Option<LoanApplication> {
        let url = format!("{}/loan-applications/{}", self.base_url, id);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(id, "loan application backend unreachable: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            debug!(
                id,
                status = response.status().as_u16(),
                "loan application not served by backend"
            );
            return None;
        }

        match response.json::<LoanApplication>().await {
            Ok(application) => Some(application),
            Err(e) => {
                debug!(id, "loan application body did not decode: {}", e);
                None
            }
        }
    }

    async fn find_in_file(path: &Path, id: u64) -> Result<Option<LoanApplication>, LoanError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| LoanError::Fallback {
                path: path.to_path_buf(),
                source,
            })?;
        let rows: Vec<LoanApplication> = serde_json::from_str(&content)?;
        Ok(rows.into_iter().find(|row| row.id == id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LoanApplication {
        serde_json::from_str(
            r#"{
                "idx": 0,
                "id": 1,
                "firstName": "Jane",
                "lastName": "Doe",
                "email": "jane@example.com",
                "phoneNumber": "+31 6 1234 5678",
                "annualincome": 68500,
                "loanamount": 250000,
                "loanduration": 48,
                "interestrate": 0.3009996,
                "savingsaccountbalance": 40000,
                "totalassets": 120000,
                "totalliabilities": 95000,
                "creditcardutilizationrate": 0.2
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_summary_derivation() {
        let summary = ApplicantSummary::from(&sample());
        assert_eq!(summary.full_name, "Jane Doe");
        assert_eq!(summary.loan_term_years, 4);
        assert_eq!(summary.interest_rate_percent, 30.1);
        assert_eq!(summary.down_payment_estimate, 25_000.0);
        assert_eq!(summary.annual_income_formatted, "€68,500");
    }

    #[test]
    fn test_short_terms_and_negative_net_assets() {
        let mut application = sample();
        application.loan_duration = 5.0;
        application.total_liabilities = 200_000.0;
        application.last_name.clear();

        let summary = ApplicantSummary::from(&application);
        assert_eq!(summary.loan_term_years, 5);
        assert_eq!(summary.down_payment_estimate, 0.0);
        assert_eq!(summary.full_name, "Jane");

        application.loan_duration = 0.0;
        assert_eq!(ApplicantSummary::from(&application).loan_term_years, 1);
    }

    #[test]
    fn test_mortgage_inputs_from_summary() {
        let inputs = ApplicantSummary::from(&sample()).mortgage_inputs();
        assert_eq!(inputs.loan_amount, 250_000.0);
        assert_eq!(inputs.interest_rate, 30.1);
        assert_eq!(inputs.loan_term_years, 4);
        assert_eq!(inputs.property_price, Some(275_000.0));
        assert!(crate::validate_mortgage_inputs(&inputs).is_empty());
    }
}
