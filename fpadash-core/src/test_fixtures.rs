//! In-memory XLSX workbooks for unit tests

use rust_xlsxwriter::Workbook;

pub const MONTHS: [&str; 6] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun"];

/// A complete five-sheet workbook with one summary row per revenue value
pub fn workbook_bytes(revenues: &[f64]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let months = &MONTHS[..revenues.len()];

    let sheet = workbook.add_worksheet();
    sheet.set_name("Resumo Financeiro").unwrap();
    for (col, header) in [
        "Mês",
        "Receita Total",
        "Custo dos Serviços CS",
        "Despesas Operacionais",
        "Margem Líquida",
    ]
    .iter()
    .enumerate()
    {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    for (i, (month, revenue)) in months.iter().zip(revenues).enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, *month).unwrap();
        sheet.write_number(row, 1, *revenue).unwrap();
        sheet.write_number(row, 2, revenue * 0.4).unwrap();
        sheet.write_number(row, 3, revenue * 0.2).unwrap();
        sheet.write_number(row, 4, 40.0).unwrap();
    }

    let sheet = workbook.add_worksheet();
    sheet.set_name("Receitas").unwrap();
    for (col, header) in ["Mês", "Consultoria PJ", "Treinamentos", "Receita Total"]
        .iter()
        .enumerate()
    {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    for (i, (month, revenue)) in months.iter().zip(revenues).enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, *month).unwrap();
        sheet.write_number(row, 1, revenue * 0.7).unwrap();
        sheet.write_number(row, 2, revenue * 0.3).unwrap();
        sheet.write_number(row, 3, *revenue).unwrap();
    }

    let sheet = workbook.add_worksheet();
    sheet.set_name("Despesas Operacionais").unwrap();
    sheet.write_string(0, 0, "Mês").unwrap();
    sheet.write_string(0, 1, "Pessoal").unwrap();
    for (i, month) in months.iter().enumerate() {
        sheet.write_string(i as u32 + 1, 0, *month).unwrap();
        sheet.write_number(i as u32 + 1, 1, 10.0).unwrap();
    }

    let sheet = workbook.add_worksheet();
    sheet.set_name("Fluxo de Caixa").unwrap();
    for (col, header) in ["Mês", "Entradas", "Saídas", "Saldo Acumulado"].iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    let mut balance = 0.0;
    for (i, (month, revenue)) in months.iter().zip(revenues).enumerate() {
        let row = i as u32 + 1;
        balance += revenue * 0.5;
        sheet.write_string(row, 0, *month).unwrap();
        sheet.write_number(row, 1, *revenue).unwrap();
        sheet.write_number(row, 2, revenue * 0.5).unwrap();
        sheet.write_number(row, 3, balance).unwrap();
    }

    let sheet = workbook.add_worksheet();
    sheet.set_name("Indicadores").unwrap();
    sheet.write_string(0, 0, "Indicador").unwrap();
    sheet.write_string(0, 1, "Valor").unwrap();
    sheet.write_string(1, 0, "EBITDA").unwrap();
    sheet.write_number(1, 1, 12.5).unwrap();

    workbook.save_to_buffer().unwrap()
}
