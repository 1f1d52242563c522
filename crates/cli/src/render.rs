use std::io::Write;

use semadvisor_core::report::{format_cpa, Report};
use semadvisor_core::rules::format_count;
use tabled::{settings::Style as TableStyle, Table, Tabled};

pub struct Style {
    pub bold: &'static str,
    pub dim: &'static str,
    pub red: &'static str,
    pub green: &'static str,
    pub yellow: &'static str,
    pub orange: &'static str,
    pub reset: &'static str,
}

const COLOR: Style = Style {
    bold: "\x1b[1m",
    dim: "\x1b[2m",
    red: "\x1b[31m",
    green: "\x1b[32m",
    yellow: "\x1b[33m",
    orange: "\x1b[38;5;208m",
    reset: "\x1b[0m",
};

const PLAIN: Style = Style {
    bold: "",
    dim: "",
    red: "",
    green: "",
    yellow: "",
    orange: "",
    reset: "",
};

pub fn style() -> &'static Style {
    if std::env::var_os("NO_COLOR").is_some() {
        &PLAIN
    } else {
        &COLOR
    }
}

pub fn print_banner() {
    let s = style();
    eprintln!(
        "\n  {bold}sem{reset}{orange}|{reset}{dim}advisor{reset}  {dim}search campaign recommendations{reset}\n",
        bold = s.bold,
        orange = s.orange,
        dim = s.dim,
        reset = s.reset,
    );
}

pub fn commas(n: u64) -> String {
    let s = n.to_string();
    let bytes = s.as_bytes();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, &b) in bytes.iter().enumerate() {
        if i > 0 && (bytes.len() - i).is_multiple_of(3) {
            result.push(',');
        }
        result.push(b as char);
    }
    result
}

#[derive(Tabled)]
struct CampaignLine {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Campaign")]
    name: String,
    #[tabled(rename = "Impressions")]
    impressions: String,
    #[tabled(rename = "Clicks")]
    clicks: String,
    #[tabled(rename = "Conversions")]
    conversions: String,
    #[tabled(rename = "Cost")]
    cost: String,
}

#[derive(Tabled)]
struct KeywordLine {
    #[tabled(rename = "Campaign")]
    campaign: String,
    #[tabled(rename = "Ad group")]
    ad_group_id: i64,
    #[tabled(rename = "Keyword")]
    keyword: String,
    #[tabled(rename = "Impressions")]
    impressions: String,
    #[tabled(rename = "Clicks")]
    clicks: String,
    #[tabled(rename = "Conversions")]
    conversions: String,
    #[tabled(rename = "Cost")]
    cost: String,
}

pub fn campaign_table(report: &Report) -> String {
    let lines = report.campaigns.iter().map(|c| CampaignLine {
        id: c.row.campaign_id,
        name: c.row.campaign_name.clone(),
        impressions: commas(c.row.impressions),
        clicks: commas(c.row.clicks),
        conversions: format_count(c.row.conversions),
        cost: format!("${:.2}", c.row.cost),
    });
    Table::new(lines).with(TableStyle::rounded()).to_string()
}

pub fn keyword_table(report: &Report) -> String {
    let lines = report.keywords.iter().map(|k| KeywordLine {
        campaign: k.row.campaign_name.clone(),
        ad_group_id: k.row.ad_group_id,
        keyword: k.row.keyword_text.clone(),
        impressions: commas(k.row.impressions),
        clicks: commas(k.row.clicks),
        conversions: format_count(k.row.conversions),
        cost: format!("${:.2}", k.row.cost),
    });
    Table::new(lines).with(TableStyle::rounded()).to_string()
}

/// Tables and recommendation list, the same content the dashboard shows.
pub fn write_report<W: Write>(w: &mut W, report: &Report) -> std::io::Result<()> {
    let s = style();

    writeln!(w, "{}Campaign Data{}", s.bold, s.reset)?;
    writeln!(w, "{}", campaign_table(report))?;
    writeln!(w)?;
    writeln!(w, "{}Keyword Data{}", s.bold, s.reset)?;
    writeln!(w, "{}", keyword_table(report))?;
    writeln!(w)?;

    let totals = &report.totals;
    writeln!(
        w,
        "{dim}spend{reset} ${:.2}  {dim}conversions{reset} {}  {dim}account CPA{reset} {}",
        totals.cost,
        format_count(totals.conversions),
        totals
            .cpa
            .map(format_cpa)
            .unwrap_or_else(|| "n/a".to_string()),
        dim = s.dim,
        reset = s.reset
    )?;
    writeln!(w)?;

    writeln!(w, "{}Recommendations{}", s.bold, s.reset)?;
    for line in report.recommendation_lines() {
        writeln!(w, "- {line}")?;
    }
    writeln!(w)?;
    Ok(())
}

pub const ACCESS_HINT: &str =
    "Please check the customer ID and date range, and make sure the Google Ads account is accessible.";

pub fn print_failure(err: &anyhow::Error) {
    let s = style();
    eprintln!(
        "{}{red}error:{reset} An error occurred: {:#}",
        s.bold,
        err,
        red = s.red,
        reset = s.reset
    );
    eprintln!("{dim}{ACCESS_HINT}{reset}", dim = s.dim, reset = s.reset);
}

pub fn print_aborted(err: &impl std::fmt::Display) {
    let s = style();
    eprintln!("\n  {dim}cancelled ({}){reset}", err, dim = s.dim, reset = s.reset);
}

pub fn print_invalid(err: &impl std::fmt::Display) {
    let s = style();
    eprintln!(
        "{}{yellow}invalid input:{reset} {}",
        s.bold,
        err,
        yellow = s.yellow,
        reset = s.reset
    );
}
