//! Panel export (CSV/Parquet).

use crate::storage::write_table;
use anyhow::{Context, Result};
use marketpanel_core::Panel;
use polars::prelude::ParquetWriter;
use std::fs::File;
use std::path::Path;

pub fn write_panel_csv(path: &Path, panel: &Panel) -> Result<()> {
    write_table(path, panel).with_context(|| format!("Failed to write panel CSV {}", path.display()))
}

pub fn write_panel_parquet(path: &Path, panel: &Panel) -> Result<()> {
    let mut df = panel
        .to_dataframe()
        .context("Failed to build panel dataframe")?;

    let mut file = File::create(path)
        .with_context(|| format!("Failed to create panel parquet {}", path.display()))?;
    ParquetWriter::new(&mut file)
        .finish(&mut df)
        .context("Failed to write panel parquet")?;
    Ok(())
}
