use colored::*;
use mortgage_core::{
    format_currency, ApplicantSummary, Currency, HealthStatus, InputIssue, MortgageResults,
};

pub fn print_results(results: &MortgageResults) {
    println!("{}", "=".repeat(40).dimmed());
    println!(
        "{:<22}{}",
        "Monthly payment",
        format!("${:.2}", results.monthly_payment).bold().green()
    );
    println!(
        "{:<22}{}",
        "Total interest",
        format_currency(results.total_interest, Currency::Usd).yellow()
    );
    println!(
        "{:<22}{}",
        "Total payment",
        format_currency(results.total_payment, Currency::Usd)
    );
    println!("{}", "-".repeat(40).dimmed());
    println!(
        "{:<22}{}",
        "Loan amount",
        format_currency(results.loan_amount, Currency::Usd)
    );
    println!("{:<22}{}%", "Interest rate", results.interest_rate);
    println!("{:<22}{} years", "Term", results.loan_term_years);
    if results.down_payment > 0.0 {
        println!(
            "{:<22}{}",
            "Down payment",
            format_currency(results.down_payment, Currency::Usd)
        );
    }
    if let Some(price) = results.property_price {
        println!("{:<22}{}", "Property price", format_currency(price, Currency::Usd));
    }
    if let Some(ltv) = results.loan_to_value_ratio {
        println!("{:<22}{:.2}%", "Loan-to-value", ltv);
    }
    println!("{}", "=".repeat(40).dimmed());
}

pub fn print_issues(issues: &[InputIssue]) {
    println!("{}", "Please fix the following:".red().bold());
    for issue in issues {
        println!("  • {}", issue);
    }
}

pub fn print_applicant(summary: &ApplicantSummary) {
    println!("\n{}", format!("📋 Application #{}", summary.id).bold().blue());
    println!("{:<22}{}", "Name", summary.full_name.bold());
    println!("{:<22}{}", "Email", summary.email);
    println!("{:<22}{}", "Phone", summary.contact_number);
    println!("{:<22}{}", "Annual income", summary.annual_income_formatted);
    println!(
        "{:<22}{}",
        "Down payment (est.)",
        format_currency(summary.down_payment_estimate, Currency::Eur)
    );
}

pub fn print_health(base_url: &str, health: &HealthStatus) {
    let status = if health.is_ready() {
        health.status.green()
    } else {
        health.status.red()
    };
    println!("{} {}", base_url.bold(), status);

    let mut flags: Vec<(&String, &serde_json::Value)> = health
        .extra
        .iter()
        .filter(|(key, _)| key.ends_with("_ready"))
        .collect();
    flags.sort_by(|a, b| a.0.cmp(b.0));
    for (key, value) in flags {
        println!("  {} {}", key.dimmed(), value);
    }
}
