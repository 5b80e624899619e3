//! Integration tests for Layer 4: Engine
//!
//! Tests the full analysis of CSV and XLSX workbooks, error reporting and
//! confidence scoring.

mod errors;
mod scenarios;
mod scoring;

use rust_xlsxwriter::{Formula, Workbook as XlsxWorkbook, XlsxError};

/// Products, suppliers, orders and inventory in one workbook.
///
/// Orders compute their line total with a `VLOOKUP` into Products, and the
/// inventory status column is an `IF` over stock and reorder level.
pub fn shop_book() -> Result<Vec<u8>, XlsxError> {
    let mut book = XlsxWorkbook::new();
    {
        let sheet = book.add_worksheet();
        sheet.set_name("Products")?;
        for (col, header) in ["Product ID", "Name", "Supplier ID", "Unit Price"]
            .into_iter()
            .enumerate()
        {
            sheet.write_string(0, u16::try_from(col).unwrap(), header)?;
        }
        let rows = [
            ("Widget", 10, 9.5),
            ("Gadget", 20, 12.25),
            ("Gizmo", 10, 4.75),
            ("Doohickey", 30, 20.0),
        ];
        for (n, (name, supplier, price)) in rows.into_iter().enumerate() {
            let row = u32::try_from(n).unwrap() + 1;
            sheet.write_number(row, 0, f64::from(row))?;
            sheet.write_string(row, 1, name)?;
            sheet.write_number(row, 2, f64::from(supplier))?;
            sheet.write_number(row, 3, price)?;
        }
    }
    {
        let sheet = book.add_worksheet();
        sheet.set_name("Suppliers")?;
        sheet.write_string(0, 0, "Supplier ID")?;
        sheet.write_string(0, 1, "Name")?;
        for (n, name) in ["Acme", "Globex", "Initech"].into_iter().enumerate() {
            let row = u32::try_from(n).unwrap() + 1;
            sheet.write_number(row, 0, f64::from(row * 10))?;
            sheet.write_string(row, 1, name)?;
        }
    }
    {
        let sheet = book.add_worksheet();
        sheet.set_name("Orders")?;
        for (col, header) in ["Order ID", "Product ID", "Quantity", "Line Total"]
            .into_iter()
            .enumerate()
        {
            sheet.write_string(0, u16::try_from(col).unwrap(), header)?;
        }
        for row in 1..=5u32 {
            sheet.write_number(row, 0, f64::from(1000 + row))?;
            sheet.write_number(row, 1, f64::from(1 + row % 4))?;
            sheet.write_number(row, 2, f64::from(row + 1))?;
            sheet.write_formula(
                row,
                3,
                format!("=C{0}*VLOOKUP(B{0},Products!A:D,4,FALSE)", row + 1).as_str(),
            )?;
        }
    }
    {
        let sheet = book.add_worksheet();
        sheet.set_name("Inventory")?;
        let headers = ["SKU", "Name", "Category", "Location", "Stock", "Reorder Level", "Status"];
        for (col, header) in headers.into_iter().enumerate() {
            sheet.write_string(0, u16::try_from(col).unwrap(), header)?;
        }
        let rows = [
            ("A-100", "Bolt", "Hardware", "Aisle 1", 4, 10),
            ("A-101", "Nut", "Hardware", "Aisle 1", 50, 10),
            ("B-200", "Glue", "Supplies", "Aisle 2", 12, 5),
            ("B-201", "Tape", "Supplies", "Aisle 2", 2, 5),
        ];
        for (n, (sku, name, category, location, stock, reorder)) in rows.into_iter().enumerate() {
            let row = u32::try_from(n).unwrap() + 1;
            sheet.write_string(row, 0, sku)?;
            sheet.write_string(row, 1, name)?;
            sheet.write_string(row, 2, category)?;
            sheet.write_string(row, 3, location)?;
            sheet.write_number(row, 4, f64::from(stock))?;
            sheet.write_number(row, 5, f64::from(reorder))?;
            let status = if stock <= reorder { "REORDER" } else { "OK" };
            let formula = Formula::new(format!("=IF(E{0}<=F{0},\"REORDER\",\"OK\")", row + 1))
                .set_result(status);
            sheet.write_formula(row, 6, formula)?;
        }
    }
    book.save_to_buffer()
}
