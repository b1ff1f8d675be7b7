//! Pivoting batch results into a metrics table and exporting it

use rust_xlsxwriter::Workbook;
use std::collections::HashMap;
use std::path::Path;

use cres_core::{CompanyMetric, Error, MetricValue, Result};

use crate::batch::{BatchOutcome, BatchRow};

/// One row per company, a value column and a comment column per metric.
///
/// Failed or incomplete pairs leave a gap in the table instead of aborting
/// the build.
pub struct MetricsTable {
    companies: Vec<String>,
    metrics: Vec<String>,
    cells: HashMap<(String, String), CompanyMetric>,
}

impl MetricsTable {
    /// Pivot batch rows into a table, skipping malformed entries
    pub fn from_rows(rows: &[BatchRow]) -> Self {
        let mut companies = Vec::new();
        let mut metrics = Vec::new();
        let mut cells = HashMap::new();

        for row in rows {
            if !companies.contains(&row.company) {
                companies.push(row.company.clone());
            }
            if !metrics.contains(&row.metric) {
                metrics.push(row.metric.clone());
            }

            match &row.outcome {
                BatchOutcome::Metric(metric) => {
                    cells.insert(
                        (row.company.clone(), row.metric.clone()),
                        metric.clone(),
                    );
                }
                BatchOutcome::Failed(reason) => {
                    tracing::warn!(
                        company = %row.company,
                        metric = %row.metric,
                        reason = %reason,
                        "skipping table cell"
                    );
                }
            }
        }

        Self {
            companies,
            metrics,
            cells,
        }
    }

    pub fn companies(&self) -> &[String] {
        &self.companies
    }

    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    pub fn get(&self, company: &str, metric: &str) -> Option<&CompanyMetric> {
        self.cells
            .get(&(company.to_string(), metric.to_string()))
    }

    /// Write the table as an Excel workbook with a single `Sheet1`
    pub fn write_xlsx(&self, path: &Path) -> Result<()> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name("Sheet1")
            .map_err(|e| Error::Export(e.to_string()))?;

        let export = |e: rust_xlsxwriter::XlsxError| Error::Export(e.to_string());

        worksheet.write_string(0, 0, "company_name").map_err(export)?;
        for (i, metric) in self.metrics.iter().enumerate() {
            let col = (1 + i * 2) as u16;
            worksheet
                .write_string(0, col, format!("{} value", metric))
                .map_err(export)?;
            worksheet
                .write_string(0, col + 1, format!("{} comment", metric))
                .map_err(export)?;
        }

        for (r, company) in self.companies.iter().enumerate() {
            let row = (r + 1) as u32;
            worksheet.write_string(row, 0, company).map_err(export)?;

            for (i, metric) in self.metrics.iter().enumerate() {
                let col = (1 + i * 2) as u16;
                if let Some(cell) = self.get(company, metric) {
                    match &cell.value {
                        MetricValue::Number(n) => {
                            worksheet.write_number(row, col, *n).map_err(export)?;
                        }
                        MetricValue::Text(s) => {
                            worksheet.write_string(row, col, s).map_err(export)?;
                        }
                    }
                    worksheet
                        .write_string(row, col + 1, &cell.comment)
                        .map_err(export)?;
                }
            }
        }

        workbook.save(path).map_err(export)?;
        tracing::info!(path = %path.display(), "metrics table exported");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(value: MetricValue, comment: &str) -> CompanyMetric {
        CompanyMetric {
            value,
            comment: comment.to_string(),
        }
    }

    fn sample_rows() -> Vec<BatchRow> {
        vec![
            BatchRow {
                company: "Acme".to_string(),
                metric: "revenue".to_string(),
                outcome: BatchOutcome::Metric(metric(
                    MetricValue::Number(120000000.0),
                    "per annual report",
                )),
            },
            BatchRow {
                company: "Acme".to_string(),
                metric: "employees".to_string(),
                outcome: BatchOutcome::Metric(metric(MetricValue::Number(800.0), "per filing")),
            },
            BatchRow {
                company: "Brokenco".to_string(),
                metric: "revenue".to_string(),
                outcome: BatchOutcome::Failed("provider outage".to_string()),
            },
        ]
    }

    #[test]
    fn test_pivot_has_gaps_for_failures() {
        let table = MetricsTable::from_rows(&sample_rows());

        assert_eq!(table.companies(), &["Acme", "Brokenco"]);
        assert_eq!(table.metrics(), &["revenue", "employees"]);

        assert!(table.get("Acme", "revenue").is_some());
        assert!(table.get("Acme", "employees").is_some());
        // Failed pair leaves a gap rather than aborting the table
        assert!(table.get("Brokenco", "revenue").is_none());
    }

    #[test]
    fn test_xlsx_export_writes_file() {
        let table = MetricsTable::from_rows(&sample_rows());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.xlsx");

        table.write_xlsx(&path).unwrap();

        let metadata = std::fs::metadata(&path).unwrap();
        assert!(metadata.len() > 0);
    }

    #[test]
    fn test_empty_rows_give_empty_table() {
        let table = MetricsTable::from_rows(&[]);
        assert!(table.companies().is_empty());
        assert!(table.metrics().is_empty());
    }
}
