//! Integration tests for Excel workbooks
//!
//! Fixtures are written in memory with `rust_xlsxwriter`.

use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook, XlsxError};
use sheetwise_foundation::{CellValue, ErrorKind};
use sheetwise_loader::{FileFormat, Loader};

fn two_sheet_book() -> Result<Vec<u8>, XlsxError> {
    let mut book = XlsxWorkbook::new();
    let bold = Format::new().set_bold();
    {
        let sheet = book.add_worksheet();
        sheet.set_name("Products")?;
        sheet.write_string_with_format(0, 0, "Product ID", &bold)?;
        sheet.write_string_with_format(0, 1, "Name", &bold)?;
        sheet.write_string_with_format(0, 2, "Unit Price", &bold)?;
        for (row, (name, price)) in [("Widget", 9.99), ("Gadget", 19.5), ("Gizmo", 4.25)]
            .into_iter()
            .enumerate()
        {
            let row = u32::try_from(row).unwrap() + 1;
            sheet.write_number(row, 0, f64::from(row))?;
            sheet.write_string(row, 1, name)?;
            sheet.write_number(row, 2, price)?;
        }
    }
    {
        let sheet = book.add_worksheet();
        sheet.set_name("Orders")?;
        for (col, header) in ["Order ID", "Product ID", "Quantity", "Total"]
            .into_iter()
            .enumerate()
        {
            sheet.write_string(0, u16::try_from(col).unwrap(), header)?;
        }
        for row in 1..=4u32 {
            sheet.write_number(row, 0, f64::from(100 + row))?;
            sheet.write_number(row, 1, f64::from(1 + row % 3))?;
            sheet.write_number(row, 2, f64::from(row * 2))?;
            sheet.write_formula(
                row,
                3,
                format!("=C{0}*VLOOKUP(B{0},Products!A:C,3,FALSE)", row + 1).as_str(),
            )?;
        }
    }
    book.define_name("PriceList", "=Products!$A$1:$C$4")?;
    book.save_to_buffer()
}

// =============================================================================
// XLSX
// =============================================================================

#[test]
fn xlsx_sheets_in_order() {
    let bytes = two_sheet_book().unwrap();
    let wb = Loader::new().load(&bytes, "shop.xlsx").unwrap();
    assert_eq!(wb.format, FileFormat::Xlsx);
    assert_eq!(wb.sheet_names(), vec!["Products", "Orders"]);
    assert_eq!(wb.sheets[0].index, 0);
    assert_eq!(wb.sheets[1].index, 1);
    assert!(wb.warnings.is_empty());
}

#[test]
fn xlsx_values_are_typed() {
    let bytes = two_sheet_book().unwrap();
    let wb = Loader::new().load(&bytes, "shop.xlsx").unwrap();
    let products = wb.sheet("Products").unwrap();
    assert_eq!(products.value(0, 0), &CellValue::Text("Product ID".into()));
    // Whole numbers stored as doubles come back as integers.
    assert_eq!(products.value(1, 0), &CellValue::Int(1));
    assert_eq!(products.value(2, 2), &CellValue::Float(19.5));
}

#[test]
fn xlsx_formulas_are_kept() {
    let bytes = two_sheet_book().unwrap();
    let wb = Loader::new().load(&bytes, "shop.xlsx").unwrap();
    let orders = wb.sheet("Orders").unwrap();
    let formulas: Vec<_> = orders.formulas().collect();
    assert_eq!(formulas.len(), 4);
    assert_eq!((formulas[0].row, formulas[0].col), (1, 3));
    assert!(formulas[0].formula.starts_with('='));
    assert!(formulas[0].formula.contains("VLOOKUP(B2,Products!A:C,3,FALSE)"));
}

#[test]
fn xlsx_defined_names() {
    let bytes = two_sheet_book().unwrap();
    let wb = Loader::new().load(&bytes, "shop.xlsx").unwrap();
    assert!(wb.named_ranges.iter().any(|n| n.name == "PriceList"));
}

#[test]
fn xlsx_merged_title() {
    let mut book = XlsxWorkbook::new();
    {
        let sheet = book.add_worksheet();
        sheet.set_name("Inventory").unwrap();
        sheet
            .merge_range(0, 0, 0, 2, "Inventory Report", &Format::new())
            .unwrap();
        sheet.write_string(1, 0, "SKU").unwrap();
        sheet.write_string(1, 1, "Name").unwrap();
        sheet.write_string(1, 2, "Qty").unwrap();
        sheet.write_string(2, 0, "A-1").unwrap();
        sheet.write_string(2, 1, "Bolt").unwrap();
        sheet.write_number(2, 2, 5).unwrap();
    }
    let bytes = book.save_to_buffer().unwrap();
    let wb = Loader::new().load(&bytes, "inventory.xlsx").unwrap();
    let sheet = &wb.sheets[0];
    assert_eq!(sheet.merged.len(), 1);
    assert!(sheet.merged_range(0, 1).is_some());
    assert_eq!(sheet.value(0, 0), &CellValue::Text("Inventory Report".into()));
}

#[test]
fn truncated_xlsx_is_corrupted() {
    let bytes = two_sheet_book().unwrap();
    let truncated = &bytes[..bytes.len() / 3];
    let err = Loader::new().load(truncated, "shop.xlsx").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::CorruptedFile(_)));
}
