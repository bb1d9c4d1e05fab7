//! Shared fixtures: a small offline data directory and a matching config.

#![allow(dead_code)]

use chrono::NaiveDate;
use marketpanel_runner::config::{Instrument, PipelineConfig};
use std::path::Path;

pub fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn today() -> NaiveDate {
    d("2024-06-07")
}

fn write(dir: &Path, name: &str, body: &str) {
    std::fs::write(dir.join(name), body).unwrap();
}

/// Raw series for four instruments plus the three auxiliary tables.
pub fn populate(dir: &Path) {
    write(
        dir,
        "GC_F.csv",
        "date,close\n2024-06-03,2350\n2024-06-04,2330\n2024-06-05,2355\n2024-06-06,2375\n2024-06-07,2300\n",
    );
    write(
        dir,
        "MGC_F.csv",
        "date,close\n2024-06-03,2349\n2024-06-04,2328.5\n2024-06-06,2372\n2024-06-07,2298\n",
    );
    write(
        dir,
        "CL_F.csv",
        "date,close\n2023-01-05,73.7\n2024-06-03,74.2\n2024-06-04,73.25\n2024-06-05,74.07\n2024-06-06,75.55\n2024-06-07,75.53\n",
    );
    write(dir, "_VIX.csv", "date,close\n2024-06-05,12.63\n2024-06-07,12.22\n");
    // No rows for BTC: the column is dropped.
    write(dir, "BTC-USD.csv", "date,close\n");

    write(
        dir,
        "china_10y_treasury_yield.csv",
        "date,China_10Y_Treasury_Yield\n2024-06-04,2.31\n2024-06-06,2.29\n2024-06-10,2.27\n",
    );
    write(
        dir,
        "buffett_indicator_data.csv",
        "date,总市值,GDP,总历史分位数,收盘价\n\
2009-12-31,200,400,0.5,3277\n\
2024-05-30,70,100,0.41,3091\n\
2024-05-31,72,100,0.43,3086\n",
    );
    write(
        dir,
        "equity_bond_spread_data.csv",
        "date,股债利差,沪深300指数\n\
2024-05-27,3,3600\n\
2024-05-28,4,3590\n\
2024-05-29,5,3570\n\
2024-05-30,4,3580\n",
    );
}

pub fn config(dir: &Path) -> PipelineConfig {
    PipelineConfig {
        data_dir: dir.to_path_buf(),
        offline: true,
        pct_change_columns: vec!["OIL_price".into()],
        instruments: vec![
            Instrument::new("GC=F", "GOLD_spot_price"),
            Instrument::new("MGC=F", "GOLD_near_month_future"),
            Instrument::new("CL=F", "OIL_price"),
            Instrument::new("^VIX", "VIX_close"),
            Instrument::new("BTC-USD", "BTC_price"),
        ],
        ..PipelineConfig::default()
    }
}
