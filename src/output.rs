//! Terminal rendering of analysis results.

use benchmark::PortfolioComparison;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use engine::{ClientAnalysis, OrganizationAnalysis};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header);
    table
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:+.1}%", v * 100.0))
}

pub fn print_client_analysis(analysis: &ClientAnalysis) {
    let client = &analysis.client;
    println!(
        "\n{} ({}), industry {}, analysed {}",
        client.name,
        client.client_id,
        client.industry_code,
        analysis.analyzed_at.format("%Y-%m-%d %H:%M UTC")
    );

    if !analysis.metrics.is_empty() {
        let mut table = new_table(vec!["Metric", "Model", "Last", "End of horizon", "Change", "Accuracy", "Pessimistic", "Optimistic"]);
        for metric in &analysis.metrics {
            let end = metric.forecast.values().last().copied().unwrap_or(metric.last_observed);
            table.add_row(vec![
                Cell::new(&metric.metric),
                Cell::new(metric.forecast.model),
                Cell::new(format!("{:.2}", metric.last_observed)),
                Cell::new(format!("{end:.2}")),
                Cell::new(percent(metric.projected_change())),
                Cell::new(format!("{:.2}", metric.forecast.accuracy)),
                Cell::new(format!("{:.2}", metric.scenarios.pessimistic.last().copied().unwrap_or(end))),
                Cell::new(format!("{:.2}", metric.scenarios.optimistic.last().copied().unwrap_or(end))),
            ]);
        }
        println!("\nForecasts\n{table}");
    }

    if let Some(risk) = &analysis.risk {
        println!(
            "\nRisk: {:.3} ({}), short-term {}, long-term {}",
            risk.overall_score, risk.level, risk.short_term_trend, risk.long_term_trend
        );
        let mut table = new_table(vec!["Category", "Score", "Weight", "Data"]);
        for factor in &risk.factors {
            table.add_row(vec![
                Cell::new(factor.category),
                Cell::new(format!("{:.3}", factor.score)),
                Cell::new(format!("{:.2}", factor.weight)),
                Cell::new(if factor.defaulted { "defaulted" } else { "observed" }),
            ]);
        }
        println!("{table}");
        for warning in risk.active_warnings() {
            println!(
                "  ! {} at {:.2} (threshold {:.2}, {:?})",
                warning.name, warning.current_value, warning.threshold, warning.status
            );
        }
    }

    if let Some(comparison) = &analysis.industry_benchmark {
        print_comparison("Industry benchmark", comparison);
    }
    if let Some(peer) = &analysis.peer_benchmark {
        print_comparison(&format!("Peer benchmark ({} peers)", peer.peer_group.len()), &peer.comparison);
    }

    if !analysis.failures.is_empty() {
        let mut table = new_table(vec!["Metric", "Stage", "Reason"]);
        for failure in &analysis.failures {
            table.add_row(vec![
                Cell::new(&failure.metric),
                Cell::new(failure.stage),
                Cell::new(&failure.reason),
            ]);
        }
        println!("\nFailed metrics\n{table}");
    }

    println!("\n{} insight(s) produced.", analysis.insights.len());
    for note in &analysis.notes {
        println!("  - {note}");
    }
    if let Some(summary) = &analysis.summary {
        println!("\nSummary\n{summary}");
    }
}

fn print_comparison(title: &str, comparison: &PortfolioComparison) {
    println!(
        "\n{title}: score {:.1}, position {}",
        comparison.overall_score,
        comparison.position.as_str()
    );
    let mut table = new_table(vec!["Metric", "Client", "P25", "P50", "P75", "P90", "Rank", "Tier"]);
    for c in &comparison.comparisons {
        table.add_row(vec![
            Cell::new(&c.metric),
            Cell::new(format!("{:.2}", c.client_value)),
            Cell::new(format!("{:.2}", c.benchmark.p25)),
            Cell::new(format!("{:.2}", c.benchmark.p50)),
            Cell::new(format!("{:.2}", c.benchmark.p75)),
            Cell::new(format!("{:.2}", c.benchmark.p90)),
            Cell::new(format!("P{}", c.percentile_rank)),
            Cell::new(c.tier.as_str()),
        ]);
    }
    println!("{table}");
    if !comparison.unbenchmarked.is_empty() {
        println!("  no distribution for: {}", comparison.unbenchmarked.join(", "));
    }
}

pub fn print_organization_analysis(result: &OrganizationAnalysis) {
    let mut table = new_table(vec!["Client", "Risk", "Level", "Industry position", "Peer position", "Insights", "Failed metrics"]);
    for analysis in &result.analyses {
        let (score, level) = match &analysis.risk {
            Some(risk) => (format!("{:.3}", risk.overall_score), risk.level.to_string()),
            None => ("-".to_string(), "-".to_string()),
        };
        let industry = analysis
            .industry_benchmark
            .as_ref()
            .map_or("-", |c| c.position.as_str());
        let peer = analysis
            .peer_benchmark
            .as_ref()
            .map_or("-", |p| p.comparison.position.as_str());
        table.add_row(vec![
            Cell::new(&analysis.client.name),
            Cell::new(score),
            Cell::new(level),
            Cell::new(industry),
            Cell::new(peer),
            Cell::new(analysis.insights.len()),
            Cell::new(analysis.failures.len()),
        ]);
    }
    println!("\nOrganization {}\n{table}", result.organization_id);

    if !result.failures.is_empty() {
        let mut failed = new_table(vec!["Client", "Reason"]);
        for failure in &result.failures {
            failed.add_row(vec![Cell::new(&failure.name), Cell::new(&failure.reason)]);
        }
        println!("\nClients not analysed\n{failed}");
    }
}
