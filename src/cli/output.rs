//! Terminal output formatting, in the teacher's `cli/output.rs` style.

use std::fmt::Display;

use owo_colors::OwoColorize;
use tabled::Tabled;

use crate::domain::ArbitrageOpportunity;

/// Print the application header.
pub fn header(version: &str) {
    println!("{} {}", "edgefinder".bold(), version.dimmed());
    println!();
}

/// Print a labeled value.
pub fn field(label: &str, value: impl Display) {
    println!("  {:<16} {}", label.dimmed(), value);
}

/// Print a success line.
pub fn success(message: &str) {
    println!("  {} {}", "✓".green(), message);
}

/// Print a warning line.
pub fn warning(message: &str) {
    println!("  {} {}", "⚠".yellow(), message);
}

/// Print an error line.
pub fn error(message: &str) {
    eprintln!("  {} {}", "×".red(), message);
}

/// Print a section header.
pub fn section(title: &str) {
    println!();
    println!("{}", title.bold());
}

/// Start a progress spinner.
pub fn spinner(message: &str) -> indicatif::ProgressBar {
    let pb = indicatif::ProgressBar::new_spinner();
    pb.set_style(
        indicatif::ProgressStyle::default_spinner()
            .template("  {spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

/// Finish a spinner with success.
pub fn spinner_success(pb: &indicatif::ProgressBar, message: &str) {
    pb.finish_with_message(format!("{} {}", "✓".green(), message));
}

/// One row of the ranked-opportunities table (`tabled` derive).
#[derive(Tabled)]
struct OpportunityRow {
    #[tabled(rename = "id")]
    opportunity_id: String,
    #[tabled(rename = "type")]
    arbitrage_type: String,
    #[tabled(rename = "buy")]
    buy: String,
    #[tabled(rename = "sell")]
    sell: String,
    #[tabled(rename = "position $")]
    position_size: String,
    #[tabled(rename = "profit %")]
    expected_profit_percentage: String,
    #[tabled(rename = "risk")]
    risk_level: String,
    #[tabled(rename = "priority")]
    priority_score: String,
}

impl From<&ArbitrageOpportunity> for OpportunityRow {
    fn from(opp: &ArbitrageOpportunity) -> Self {
        Self {
            opportunity_id: opp.opportunity_id.as_str().to_string(),
            arbitrage_type: format!("{:?}", opp.arbitrage_type),
            buy: opp.strategy.buy_handle.to_string(),
            sell: opp.strategy.sell_handle.to_string(),
            position_size: opp.position_size.to_string(),
            expected_profit_percentage: format!("{:.2}%", opp.metrics.expected_profit_percentage * 100.0),
            risk_level: format!("{:?}", opp.risk.risk_level),
            priority_score: format!("{:.3}", opp.priority_score),
        }
    }
}

/// Render ranked opportunities as a table.
pub fn opportunity_table(opportunities: &[ArbitrageOpportunity]) -> String {
    let rows: Vec<OpportunityRow> = opportunities.iter().map(OpportunityRow::from).collect();
    tabled::Table::new(rows).to_string()
}
