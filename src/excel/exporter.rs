//! Excel exporter: a task's resource × month allocation matrix and its
//! materials list, with totals, as an .xlsx workbook

use crate::core::budget::{compute_materials_total, monthly_totals};
use crate::error::PlanResult;
use crate::types::{Task, MONTH_LABELS};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::Path;

pub const ALLOCATION_SHEET: &str = "Allocation";
pub const MATERIALS_SHEET: &str = "Materials";

/// Leading identity columns before the month columns
const IDENTITY_COLUMNS: [&str; 3] = ["Name", "Role", "Profile"];

pub struct AllocationExporter {
    task: Task,
}

impl AllocationExporter {
    pub fn new(task: Task) -> Self {
        Self { task }
    }

    /// Export to an .xlsx file
    pub fn export(&self, output_path: &Path) -> PlanResult<()> {
        let mut workbook = self.build()?;
        workbook.save(output_path)?;
        Ok(())
    }

    /// Export to an in-memory .xlsx buffer
    pub fn to_buffer(&self) -> PlanResult<Vec<u8>> {
        let mut workbook = self.build()?;
        Ok(workbook.save_to_buffer()?)
    }

    fn build(&self) -> PlanResult<Workbook> {
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();
        let fraction = Format::new().set_num_format("0.00");
        let money = Format::new().set_num_format("#,##0.00");

        let sheet = workbook.add_worksheet();
        sheet.set_name(ALLOCATION_SHEET)?;
        self.write_allocation(sheet, &header, &fraction)?;

        let sheet = workbook.add_worksheet();
        sheet.set_name(MATERIALS_SHEET)?;
        self.write_materials(sheet, &header, &money)?;

        Ok(workbook)
    }

    fn write_allocation(
        &self,
        sheet: &mut Worksheet,
        header: &Format,
        fraction: &Format,
    ) -> PlanResult<()> {
        let first_month = IDENTITY_COLUMNS.len() as u16;
        let total_col = first_month + MONTH_LABELS.len() as u16;

        for (col, title) in IDENTITY_COLUMNS.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *title, header)?;
        }
        for (i, month) in MONTH_LABELS.iter().enumerate() {
            sheet.write_string_with_format(0, first_month + i as u16, *month, header)?;
        }
        sheet.write_string_with_format(0, total_col, "Total", header)?;

        let mut row: u32 = 1;
        for resource in self.task.resources.iter() {
            sheet.write_string(row, 0, &resource.name)?;
            sheet.write_string(row, 1, &resource.role)?;
            sheet.write_string(row, 2, &resource.profile)?;
            for (i, value) in resource.allocation.values().iter().enumerate() {
                sheet.write_number_with_format(row, first_month + i as u16, *value, fraction)?;
            }
            sheet.write_number_with_format(row, total_col, resource.allocation.total(), fraction)?;
            row += 1;
        }

        if !self.task.resources.is_empty() {
            let totals = monthly_totals(&self.task);
            sheet.write_string_with_format(row, 0, "Total", header)?;
            for (i, value) in totals.iter().enumerate() {
                sheet.write_number_with_format(row, first_month + i as u16, *value, fraction)?;
            }
            sheet.write_number_with_format(row, total_col, totals.iter().sum::<f64>(), fraction)?;
        }

        Ok(())
    }

    fn write_materials(
        &self,
        sheet: &mut Worksheet,
        header: &Format,
        money: &Format,
    ) -> PlanResult<()> {
        for (col, title) in ["Id", "Name", "Units", "Unit Price", "Total"].iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *title, header)?;
        }

        let mut row: u32 = 1;
        for material in self.task.materials.iter() {
            sheet.write_string(row, 0, &material.id)?;
            sheet.write_string(row, 1, &material.name)?;
            sheet.write_number(row, 2, material.units)?;
            sheet.write_number_with_format(row, 3, material.unit_price, money)?;
            sheet.write_number_with_format(row, 4, material.line_total(), money)?;
            row += 1;
        }

        sheet.write_string_with_format(row, 0, "Total", header)?;
        sheet.write_number_with_format(
            row,
            4,
            compute_materials_total(&self.task.materials),
            money,
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::excel::parse_workbook;
    use crate::preview::CellValue;
    use crate::types::{Allocation, Material, ResourceAssignment};
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn sample_task() -> Task {
        let mut task = Task::new(
            "t1",
            "Fit-out",
            NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
        );
        let mut ana = ResourceAssignment::new("Ana", "Architect", "Senior");
        ana.allocation = Allocation([0.5; 12]);
        let ben = ResourceAssignment::new("Ben", "Engineer", "Junior");
        task.resources = Arc::new(vec![ana, ben]);
        task.materials = Arc::new(vec![Material {
            id: "m1".to_string(),
            name: "Cable".to_string(),
            units: 3.0,
            unit_price: 10.0,
        }]);
        task
    }

    #[test]
    fn test_export_reads_back() {
        let bytes = AllocationExporter::new(sample_task()).to_buffer().unwrap();
        let preview = parse_workbook(&bytes).unwrap();

        assert_eq!(preview.sheet_names(), vec![ALLOCATION_SHEET, MATERIALS_SHEET]);

        let allocation = preview.sheet(ALLOCATION_SHEET).unwrap();
        // two resources + totals row
        assert_eq!(allocation.rows.len(), 3);
        assert_eq!(
            allocation.rows[0].get("Name"),
            Some(&CellValue::Text("Ana".to_string()))
        );
        assert_eq!(allocation.rows[0].get("Total"), Some(&CellValue::Number(6.0)));
        assert_eq!(allocation.rows[2].get("Jan"), Some(&CellValue::Number(0.5)));

        let materials = preview.sheet(MATERIALS_SHEET).unwrap();
        assert_eq!(materials.rows.len(), 2);
        assert_eq!(materials.rows[1].get("Total"), Some(&CellValue::Number(30.0)));
    }

    #[test]
    fn test_export_empty_task() {
        let mut task = sample_task();
        task.resources = Arc::new(Vec::new());
        task.materials = Arc::new(Vec::new());

        let bytes = AllocationExporter::new(task).to_buffer().unwrap();
        let preview = parse_workbook(&bytes).unwrap();
        assert!(preview.sheet(ALLOCATION_SHEET).unwrap().rows.is_empty());
        // only the totals row
        assert_eq!(preview.sheet(MATERIALS_SHEET).unwrap().rows.len(), 1);
    }
}
