//! Human-readable backtest reports.

use hobart_backtest::{BacktestResult, MetricSet};

use crate::summary::format_money;

const WIDTH: usize = 60;

fn rule(output: &mut String, ch: char) {
    output.push_str(&ch.to_string().repeat(WIDTH));
    output.push('\n');
}

fn heading(output: &mut String, title: &str) {
    rule(output, '=');
    output.push_str(title);
    output.push('\n');
    rule(output, '=');
}

/// Render the fixed-layout terminal report.
///
/// Sections: period overview, portfolio performance, benchmark comparison
/// (when the result has one), per-ticker performance and weights (weighted
/// runs only).
pub fn render_text(result: &BacktestResult) -> String {
    let mut output = String::new();
    let metrics = &result.portfolio_metrics;

    output.push('\n');
    heading(&mut output, "BACKTEST RESULTS SUMMARY");
    output.push('\n');

    output.push_str(&format!("Period: {} to {}\n", result.start_date, result.end_date));
    output.push_str(&format!("Trading Days: {}\n", result.trading_days));
    output.push_str(&format!("Tickers: {}\n", result.tickers.join(", ")));
    if result.is_partial() {
        output.push_str(&format!("Missing: {}\n", result.missing_tickers.join(", ")));
    }
    output.push('\n');

    heading(&mut output, "PORTFOLIO PERFORMANCE");
    output.push_str(&format!("Initial Capital:        {}\n", format_money(result.initial_capital)));
    output.push_str(&format!("Final Value:            {}\n", format_money(result.final_value)));
    output.push_str(&format!("Total Return:           {:.2}%\n", metrics.total_return));
    output.push_str(&format!("Annualized Return:      {:.2}%\n", metrics.annualized_return));
    output.push_str(&format!("Volatility:             {:.2}%\n", metrics.volatility));
    output.push_str(&format!("Sharpe Ratio:           {:.2}\n", metrics.sharpe_ratio));
    output.push_str(&format!("Sortino Ratio:          {:.2}\n", metrics.sortino_ratio));
    output.push_str(&format!("Max Drawdown:           {:.2}%\n", metrics.max_drawdown));
    output.push_str(&format!("Win Rate:               {:.2}%\n", metrics.win_rate));
    output.push_str(&format!("Best Day:               {:.2}%\n", metrics.best_day));
    output.push_str(&format!("Worst Day:              {:.2}%\n", metrics.worst_day));

    if let Some(comparison) = &metrics.benchmark {
        match &result.benchmark {
            Some(b) => output.push_str(&format!("\nBenchmark Comparison ({b}):\n")),
            None => output.push_str("\nBenchmark Comparison:\n"),
        }
        output.push_str(&format!("Alpha:                  {:.2}%\n", comparison.alpha));
        output.push_str(&format!(
            "Correlation:            {:.2}\n",
            comparison.correlation_to_benchmark
        ));
        output.push_str(&format!("Tracking Error:         {:.2}%\n", comparison.tracking_error));
        output.push_str(&format!("Information Ratio:      {:.2}\n", comparison.information_ratio));
    }

    output.push('\n');
    heading(&mut output, "INDIVIDUAL STOCK PERFORMANCE");
    output.push('\n');
    output.push_str(&format!(
        "{:<8} {:<10} {:<12} {:<10} {:<10}\n",
        "Ticker", "Return", "Volatility", "Sharpe", "Max DD"
    ));
    rule(&mut output, '-');
    for ticker in &result.tickers {
        if let Some(m) = result.individual_metrics.get(ticker) {
            output.push_str(&format!(
                "{:<8} {:>8.2}%  {:>10.2}%  {:>8.2}  {:>8.2}%\n",
                ticker, m.total_return, m.volatility, m.sharpe_ratio, m.max_drawdown
            ));
        }
    }

    if let Some(weights) = &result.portfolio_weights {
        output.push('\n');
        heading(&mut output, "PORTFOLIO WEIGHTS");
        output.push('\n');
        for (ticker, weight) in weights.iter() {
            output.push_str(&format!("{:<8} {:>6.2}%\n", ticker, weight * 100.0));
        }
    }

    output.push('\n');
    rule(&mut output, '=');

    output
}

/// Render the report as Markdown.
pub fn render_markdown(result: &BacktestResult) -> String {
    let mut output = String::new();
    let metrics = &result.portfolio_metrics;

    output.push_str("# Backtest Results\n\n");
    output.push_str(&format!(
        "**Period:** {} to {} ({} trading days)\n\n",
        result.start_date, result.end_date, result.trading_days
    ));
    output.push_str(&format!("**Tickers:** {}\n\n", result.tickers.join(", ")));
    if result.is_partial() {
        output.push_str(&format!("**Missing:** {}\n\n", result.missing_tickers.join(", ")));
    }

    output.push_str("## Portfolio Performance\n\n");
    output.push_str(&format!("- **Initial Capital:** {}\n", format_money(result.initial_capital)));
    output.push_str(&format!("- **Final Value:** {}\n", format_money(result.final_value)));
    push_metric_bullets(&mut output, metrics);

    if let Some(comparison) = &metrics.benchmark {
        output.push_str(&format!(
            "\n## Benchmark Comparison ({})\n\n",
            result.benchmark.as_deref().unwrap_or("benchmark")
        ));
        output.push_str(&format!("- **Alpha:** {:.2}%\n", comparison.alpha));
        output.push_str(&format!("- **Correlation:** {:.2}\n", comparison.correlation_to_benchmark));
        output.push_str(&format!("- **Tracking Error:** {:.2}%\n", comparison.tracking_error));
        output.push_str(&format!("- **Information Ratio:** {:.2}\n", comparison.information_ratio));
    }

    output.push_str("\n## Individual Performance\n\n");
    output.push_str("| Ticker | Return | Volatility | Sharpe | Max DD |\n");
    output.push_str("|--------|--------|------------|--------|--------|\n");
    for ticker in &result.tickers {
        if let Some(m) = result.individual_metrics.get(ticker) {
            output.push_str(&format!(
                "| {} | {:.2}% | {:.2}% | {:.2} | {:.2}% |\n",
                ticker, m.total_return, m.volatility, m.sharpe_ratio, m.max_drawdown
            ));
        }
    }

    if let Some(weights) = &result.portfolio_weights {
        output.push_str("\n## Weights\n\n");
        output.push_str("| Ticker | Weight |\n");
        output.push_str("|--------|--------|\n");
        for (ticker, weight) in weights.iter() {
            output.push_str(&format!("| {} | {:.2}% |\n", ticker, weight * 100.0));
        }
    }

    output
}

fn push_metric_bullets(output: &mut String, m: &MetricSet) {
    output.push_str(&format!("- **Total Return:** {:.2}%\n", m.total_return));
    output.push_str(&format!("- **Annualized Return:** {:.2}%\n", m.annualized_return));
    output.push_str(&format!("- **Volatility:** {:.2}%\n", m.volatility));
    output.push_str(&format!("- **Sharpe Ratio:** {:.2}\n", m.sharpe_ratio));
    output.push_str(&format!("- **Sortino Ratio:** {:.2}\n", m.sortino_ratio));
    output.push_str(&format!("- **Max Drawdown:** {:.2}%\n", m.max_drawdown));
    output.push_str(&format!("- **Win Rate:** {:.2}%\n", m.win_rate));
    output.push_str(&format!("- **Best Day:** {:.2}%\n", m.best_day));
    output.push_str(&format!("- **Worst Day:** {:.2}%\n", m.worst_day));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::result;

    #[test]
    fn test_text_report_sections() {
        let text = render_text(&result(true, true));

        assert!(text.contains("BACKTEST RESULTS SUMMARY"));
        assert!(text.contains("Period: 2024-01-02 to 2024-01-06"));
        assert!(text.contains("Trading Days: 4"));
        assert!(text.contains("Tickers: AAPL, MSFT"));
        assert!(text.contains("Initial Capital:        $100,000.00"));
        assert!(text.contains("Final Value:            $101,949.40"));
        assert!(text.contains("Total Return:           1.95%"));
        assert!(text.contains("Benchmark Comparison (SPY):"));
        assert!(text.contains("Alpha:                  0.75%"));
        assert!(text.contains("PORTFOLIO WEIGHTS"));
        assert!(text.contains("AAPL      60.00%"));
    }

    #[test]
    fn test_text_report_omits_optional_sections() {
        let text = render_text(&result(false, false));

        assert!(!text.contains("Benchmark Comparison"));
        assert!(!text.contains("PORTFOLIO WEIGHTS"));
        assert!(!text.contains("Missing:"));
        assert!(text.contains("INDIVIDUAL STOCK PERFORMANCE"));
    }

    #[test]
    fn test_text_report_lists_missing_tickers() {
        let mut partial = result(false, false);
        partial.missing_tickers = vec!["XYZ".to_string()];
        assert!(render_text(&partial).contains("Missing: XYZ"));
    }

    #[test]
    fn test_markdown_report() {
        let md = render_markdown(&result(true, false));

        assert!(md.starts_with("# Backtest Results"));
        assert!(md.contains("## Benchmark Comparison (SPY)"));
        assert!(md.contains("| AAPL | 2.50% | 18.50% | 1.10 | -7.50% |"));
        assert!(!md.contains("## Weights"));
    }
}
