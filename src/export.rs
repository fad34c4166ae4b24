//! CSV export of a finished plan.

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::types::{AllocationBatch, BatchSource, Plan};

#[derive(Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "No")]
    index: usize,
    #[serde(rename = "Product")]
    product: &'a str,
    #[serde(rename = "Spec")]
    spec: &'a str,
    #[serde(rename = "Bar length")]
    bar_len: f64,
    #[serde(rename = "Order length")]
    order_len: f64,
    #[serde(rename = "Source")]
    source: BatchSource,
    #[serde(rename = "Pieces per bar")]
    per_bar_pieces: u32,
    #[serde(rename = "Loss per bar")]
    loss_per_bar: f64,
    #[serde(rename = "Bars")]
    total_bars: u32,
    #[serde(rename = "Pieces")]
    total_pieces: u32,
    #[serde(rename = "Total loss")]
    total_loss: f64,
    #[serde(rename = "Height")]
    height: f64,
    #[serde(rename = "Speed")]
    speed: f64,
    #[serde(rename = "Min per cut")]
    time_per_bar: String,
    #[serde(rename = "Cuts")]
    cuts: u32,
    #[serde(rename = "Total time")]
    total_time: String,
}

impl<'a> From<&'a AllocationBatch> for CsvRow<'a> {
    fn from(b: &'a AllocationBatch) -> Self {
        Self {
            index: b.source_index,
            product: &b.product,
            spec: &b.spec,
            bar_len: b.source_len,
            order_len: b.order_len,
            source: b.source,
            per_bar_pieces: b.per_bar_pieces,
            loss_per_bar: b.loss_per_bar(),
            total_bars: b.total_bars,
            total_pieces: b.total_pieces,
            total_loss: b.total_loss,
            height: b.height,
            speed: b.speed,
            time_per_bar: format!("{:.2}", b.time_per_bar),
            cuts: b.cuts,
            total_time: format!("{:.2}", b.total_time),
        }
    }
}

/// Writes one row per batch, with a header line.
pub fn write_csv<W: Write>(plan: &Plan, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for batch in &plan.results {
        wtr.serialize(CsvRow::from(batch))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_csv(plan: &Plan, path: impl AsRef<Path>) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv(plan, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::plan_cutting;
    use crate::types::{CutterSettings, OrderLine, Strategy};

    #[test]
    fn test_csv_rows() {
        let lines = vec![
            OrderLine::new(1, "H형강A", "100*100*6*8", 6000.0, 1000.0, 50),
            OrderLine::new(2, "각관, 특수", "50*50", 6000.0, 6000.0, 2),
        ];
        let plan = plan_cutting(&lines, &CutterSettings::new(5.0, 2000.0, 1200.0), Strategy::Sequence);
        let mut out = Vec::new();
        write_csv(&plan, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].starts_with("No,Product,Spec,Bar length,Order length,Source"));
        assert_eq!(
            rows[1],
            "1,H형강A,100*100*6*8,6000.0,1000.0,raw,5,975.0,10,50,9750.0,100.0,15.0,6.67,6,40.00"
        );
        // Product names with commas are quoted
        assert!(rows[2].starts_with("2,\"각관, 특수\",50*50,6000.0,6000.0,no-cut,"));
    }

    #[test]
    fn test_empty_plan_writes_nothing() {
        let mut out = Vec::new();
        write_csv(&Plan::default(), &mut out).unwrap();
        assert!(out.is_empty());
    }
}
