use crate::matrix::{CellValue, Grid, ReportKind};
use crate::schema::ReportFilters;

impl Grid {
    /// Row-major array-of-arrays of plain JSON scalars, the shape the
    /// spreadsheet collaborator accepts alongside the merge list.
    pub fn to_rows(&self) -> Vec<Vec<serde_json::Value>> {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| match &cell.value {
                        CellValue::Text(text) => serde_json::Value::String(text.clone()),
                        CellValue::Number(n) => serde_json::Value::from(*n),
                        CellValue::Percent(p) => serde_json::Value::from(*p),
                        CellValue::Empty => serde_json::Value::String(String::new()),
                    })
                    .collect()
            })
            .collect()
    }

    /// Flat CSV rendering; merged regions render their value at the
    /// anchor cell only.
    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        for row in &self.rows {
            let fields: Vec<String> = row
                .iter()
                .map(|cell| match &cell.value {
                    CellValue::Text(text) => csv_escape(text),
                    CellValue::Number(n) => format_number(*n),
                    CellValue::Percent(p) => format!("{:.2}", p),
                    CellValue::Empty => String::new(),
                })
                .collect();
            output.push_str(&fields.join(","));
            output.push('\n');
        }
        output
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        format!("{:.2}", n)
    }
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Suggested export file name: `{ReportName}_{Year}_{OperatingUnit}.xlsx`.
pub fn export_file_name(kind: ReportKind, filters: &ReportFilters) -> String {
    format!(
        "{}_{}_{}.xlsx",
        kind.file_stem(),
        filters.year.label(),
        filters.operating_unit_label()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::{Measures, TreeBuilder};
    use crate::matrix::{build_grid, ColumnPlan, ExpansionState};
    use crate::object_codes::CodeReference;
    use crate::period::ReportYear;
    use crate::utils::natural_cmp;

    fn sample_grid() -> Grid {
        let mut measures = Measures::zero();
        measures.flow.cost = 1234.5;
        measures.split.mooe = 1234.5;
        measures.output_totals.target = 3.0;

        let mut builder = TreeBuilder::new();
        builder.accumulate("Component", 0, "Package", "Item, with comma", &measures);
        let tree = builder.finalize(|_, a, b| natural_cmp(a, b));

        let reference = CodeReference::new();
        let plan = ColumnPlan::for_report(ReportKind::AnnualAccomplishment, &tree, &reference);
        build_grid(&tree, &plan, &ExpansionState::expand_all(&tree)).unwrap()
    }

    #[test]
    fn test_to_rows_matches_grid_shape() {
        let grid = sample_grid();
        let rows = grid.to_rows();
        assert_eq!(rows.len(), grid.rows.len());
        for row in &rows {
            assert_eq!(row.len(), grid.width());
        }
        assert_eq!(rows[0][0], serde_json::Value::String("Particulars".to_string()));
    }

    #[test]
    fn test_csv_parses_with_expected_width() {
        let grid = sample_grid();
        let csv_text = grid.to_csv();

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(csv_text.as_bytes());

        let mut rows = 0;
        for record in reader.records() {
            let record = record.unwrap();
            assert_eq!(record.len(), grid.width());
            rows += 1;
        }
        assert_eq!(rows, grid.rows.len());
    }

    #[test]
    fn test_csv_escapes_commas() {
        let grid = sample_grid();
        let csv_text = grid.to_csv();
        assert!(csv_text.contains("\"    Item, with comma\""));
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(1234.5), "1234.50");
    }

    #[test]
    fn test_export_file_name_pattern() {
        let mut filters = ReportFilters::for_year(ReportYear::Year(2023));
        assert_eq!(
            export_file_name(ReportKind::PhysicalPlan, &filters),
            "PhysicalPlan_2023_All.xlsx"
        );

        filters.operating_unit = Some("Region IV-A".to_string());
        assert_eq!(
            export_file_name(ReportKind::AnnualAccomplishment, &filters),
            "AnnualAccomplishment_2023_Region IV-A.xlsx"
        );

        let all = ReportFilters::for_year(ReportYear::All);
        assert_eq!(
            export_file_name(ReportKind::Geographic, &all),
            "GeographicDistribution_All_All.xlsx"
        );
    }
}
