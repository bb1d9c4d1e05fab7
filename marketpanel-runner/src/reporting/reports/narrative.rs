//! Narrative generation boundary.
//!
//! The analysis text attached to a run is produced by a [`NarrativeGenerator`].
//! Any generator (a hosted language model, a template engine) plugs in here
//! and sees only the snapshot. [`SnapshotDigest`] is the built-in,
//! deterministic generator: it restates the snapshot as a short Markdown
//! brief with valuation zones.

use marketpanel_core::{Snapshot, TableSnapshot};

/// Produces analysis text from a snapshot.
pub trait NarrativeGenerator: Send + Sync {
    fn name(&self) -> &str;

    fn generate(&self, snapshot: &Snapshot) -> anyhow::Result<String>;
}

/// Deterministic Markdown digest of a snapshot.
#[derive(Debug, Clone, Default)]
pub struct SnapshotDigest;

/// Buffett indicator zone: below 0.8 cheap, up to 1.0 fair, up to 1.2
/// expensive, above that bubble territory.
pub fn buffett_zone(value: f64) -> &'static str {
    if value < 0.8 {
        "undervalued"
    } else if value < 1.0 {
        "fair value"
    } else if value < 1.2 {
        "overvalued"
    } else {
        "danger"
    }
}

/// Where the spread sits relative to its rolling mean and sigma bands.
pub fn spread_position(group: &TableSnapshot) -> Option<&'static str> {
    let v = group.get("spread_value")?;
    let ma = group.get("five_year_ma")?;
    let band = |f| group.get(f);
    let position = match (band("plus_2_std"), band("plus_1_std"), band("minus_1_std"), band("minus_2_std")) {
        (Some(p2), _, _, _) if v >= p2 => "above +2σ",
        (_, Some(p1), _, _) if v >= p1 => "between +1σ and +2σ",
        (_, _, _, Some(m2)) if v <= m2 => "below -2σ",
        (_, _, Some(m1), _) if v <= m1 => "between -2σ and -1σ",
        _ if v >= ma => "above the mean, within 1σ",
        _ => "below the mean, within 1σ",
    };
    Some(position)
}

fn fmt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.4}")).unwrap_or_else(|| "N/A".to_string())
}

/// Headline market columns, in display order.
const HEADLINE: [&str; 7] = [
    "Shanghai_Composite_Index",
    "CSI_300_Index",
    "VIX_close",
    "US_Dollar_Index",
    "USD_CNY_exchange_rate",
    "US_10Y_Treasury_Yield",
    "China_10Y_Treasury_Yield",
];

impl NarrativeGenerator for SnapshotDigest {
    fn name(&self) -> &str {
        "snapshot_digest"
    }

    fn generate(&self, snapshot: &Snapshot) -> anyhow::Result<String> {
        let mut out = format!("# Market brief for {}\n\n", snapshot.latest_date);

        out.push_str("## Buffett indicator\n");
        match &snapshot.buffett_indicator {
            Some(b) => {
                let value = b.get("indicator_value");
                out.push_str(&format!("- As of: {}\n", b.date));
                out.push_str(&format!("- Value: {}\n", fmt(value)));
                out.push_str(&format!("- Historical percentile: {}\n", fmt(b.get("total_percentile"))));
                if let Some(v) = value {
                    out.push_str(&format!("- Zone: {}\n", buffett_zone(v)));
                }
            }
            None => out.push_str("- Not available\n"),
        }

        out.push_str("\n## Equity-bond spread\n");
        match &snapshot.equity_bond_spread {
            Some(s) => {
                out.push_str(&format!("- As of: {}\n", s.date));
                out.push_str(&format!("- Spread: {}\n", fmt(s.get("spread_value"))));
                out.push_str(&format!("- 5-year mean: {}\n", fmt(s.get("five_year_ma"))));
                if let Some(pos) = spread_position(s) {
                    out.push_str(&format!("- Position: {pos}\n"));
                }
            }
            None => out.push_str("- Not available\n"),
        }

        out.push_str("\n## Markets\n");
        for column in HEADLINE {
            if let Some(v) = snapshot.latest_values.get(column) {
                out.push_str(&format!("- {column}: {}\n", fmt(v)));
            }
        }
        Ok(out)
    }
}
