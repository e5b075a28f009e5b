//! Write deterministic sample datasets so the dashboard can run locally.
//!
//! Usage: `generate_sample [output_dir]` (default: `dashboard`).

use std::f64::consts::PI;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Datelike, Days, NaiveDate};

const DAYS: u64 = 731;
const CUSTOMERS: u64 = 400;

/// splitmix64 step mapped to `[0, 1)`.
fn noise(seed: u64) -> f64 {
    let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    (z >> 11) as f64 / (1u64 << 53) as f64
}

fn season(month: u32) -> u32 {
    match month {
        3..=5 => 2,
        6..=8 => 3,
        9..=11 => 4,
        _ => 1,
    }
}

/// Relative demand for a day: yearly seasonality plus growth in year two.
fn day_factor(day: u64) -> f64 {
    let yearly = 0.6 + 0.4 * (2.0 * PI * (day as f64 - 100.0) / 365.0).sin().max(-0.8);
    let growth = if day >= 365 { 1.6 } else { 1.0 };
    yearly * growth
}

/// Commute peaks at 8h and 17-18h.
fn hour_factor(hour: u32) -> f64 {
    match hour {
        0..=5 => 0.1,
        7 | 9 => 0.9,
        8 => 1.6,
        17 | 18 => 1.8,
        10..=16 => 0.8,
        19..=21 => 0.7,
        _ => 0.35,
    }
}

fn write_day_and_hour(dir: &Path, start: NaiveDate) -> Result<()> {
    let mut day_csv = csv::Writer::from_path(dir.join("day.csv")).context("creating day.csv")?;
    let mut hour_csv = csv::Writer::from_path(dir.join("hour.csv")).context("creating hour.csv")?;

    day_csv.write_record([
        "instant", "dteday", "season", "yr", "mnth", "weekday", "workingday", "temp", "hum", "casual",
        "registered", "cnt",
    ])?;
    hour_csv.write_record([
        "instant", "dteday", "season", "yr", "mnth", "hr", "weekday", "workingday", "temp", "hum",
        "casual", "registered", "cnt",
    ])?;

    let mut hour_instant = 0u64;
    for day in 0..DAYS {
        let date = start
            .checked_add_days(Days::new(day))
            .context("date out of range")?;
        let weekday = date.weekday().num_days_from_sunday();
        let working = u32::from((1..=5).contains(&weekday));
        let temp = 0.2 + 0.6 * day_factor(day) / 1.6;
        let hum = 0.4 + 0.4 * noise(day * 7 + 1);

        let mut casual_total = 0u64;
        let mut registered_total = 0u64;
        for hr in 0..24u32 {
            hour_instant += 1;
            let base = 180.0 * day_factor(day) * hour_factor(hr);
            let jitter = 0.75 + 0.5 * noise(day * 24 + u64::from(hr));
            let count = (base * jitter).round() as u64;
            let casual = if working == 1 { count / 6 } else { count / 3 };
            let registered = count - casual;
            casual_total += casual;
            registered_total += registered;

            hour_csv.write_record([
                hour_instant.to_string(),
                date.format("%Y-%m-%d").to_string(),
                season(date.month()).to_string(),
                (date.year() - start.year()).to_string(),
                date.month().to_string(),
                hr.to_string(),
                weekday.to_string(),
                working.to_string(),
                format!("{temp:.4}"),
                format!("{hum:.4}"),
                casual.to_string(),
                registered.to_string(),
                count.to_string(),
            ])?;
        }

        day_csv.write_record([
            (day + 1).to_string(),
            date.format("%Y-%m-%d").to_string(),
            season(date.month()).to_string(),
            (date.year() - start.year()).to_string(),
            date.month().to_string(),
            weekday.to_string(),
            working.to_string(),
            format!("{temp:.4}"),
            format!("{hum:.4}"),
            casual_total.to_string(),
            registered_total.to_string(),
            (casual_total + registered_total).to_string(),
        ])?;
    }

    day_csv.flush()?;
    hour_csv.flush()?;
    Ok(())
}

/// RFM-style customer table with a segment label per customer.
fn write_segments(dir: &Path) -> Result<()> {
    let path = dir.join("customer_segmentation.csv");
    let mut out = csv::Writer::from_path(&path).context("creating customer_segmentation.csv")?;
    out.write_record(["customer_id", "recency", "frequency", "monetary", "segment"])?;

    for id in 1..=CUSTOMERS {
        let recency = (noise(id * 3) * 120.0).round() as u64;
        let frequency = 1 + (noise(id * 3 + 1) * 40.0).round() as u64;
        let monetary = frequency as f64 * (2.0 + 8.0 * noise(id * 3 + 2));

        let segment = match (recency, frequency) {
            (r, f) if r <= 30 && f >= 25 => "Champions",
            (r, f) if r <= 60 && f >= 15 => "Loyal Customers",
            (r, _) if r <= 30 => "New Customers",
            (r, f) if r > 90 && f >= 15 => "At Risk",
            (r, _) if r > 90 => "Lost",
            _ => "Need Attention",
        };

        out.write_record([
            format!("C{id:04}"),
            recency.to_string(),
            frequency.to_string(),
            format!("{monetary:.2}"),
            segment.to_string(),
        ])?;
    }
    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("dashboard"));
    std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    let start = NaiveDate::from_ymd_opt(2011, 1, 1).context("invalid start date")?;
    write_day_and_hour(&dir, start)?;
    write_segments(&dir)?;

    println!("Wrote sample datasets to {}", dir.display());
    Ok(())
}
