//! Layout and pagination: bounded table pages, resolved table grids and the
//! fixed summary/filter blocks.

use crate::classify::classify;
use crate::conf::{
    C_CONTINUATION_MARKER, N_HEIGHT_BODY_INFERRED_MAX, N_WIDTH_CELL_MAX, N_WIDTH_CELL_MIN,
    N_WIDTH_CELL_PADDING, TUP_MODELS_HEADERS, TUP_SUMMARY_FILTERS, TUP_SUMMARY_LABELS,
};
use crate::spec::{
    EnumCellAlign, EnumCellValue, EnumFormatTag, SpecModelRecord, SpecPaginationPolicy,
    SpecSheet, SpecSummaryMetrics, SpecTableCell, SpecTableGrid, SpecTablePage,
};
use crate::util::{
    derive_f64_from_cell_value, estimate_text_width, format_value,
};

////////////////////////////////////////////////////////////////////////////////
// #region Pagination

/// Split `n_rows_total` into `(start, len)` chunks of at most `size_rows_chunk`.
pub fn generate_row_chunks(n_rows_total: usize, size_rows_chunk: usize) -> Vec<(usize, usize)> {
    let size_rows_chunk = usize::max(1, size_rows_chunk);
    let mut l_chunks = Vec::new();
    let mut n_row_cursor = 0;
    while n_row_cursor < n_rows_total {
        let n_rows_per_chunk = usize::min(size_rows_chunk, n_rows_total - n_row_cursor);
        l_chunks.push((n_row_cursor, n_rows_per_chunk));
        n_row_cursor += n_rows_per_chunk;
    }
    l_chunks
}

/// Plan table pages: column groups first, then row chunks within each group.
///
/// `n_cols` includes the label column, which repeats on every column group.
/// Row chunks after the first append `" (Cont.)"`; column groups after the
/// first append `" [g/n]"`. Zero rows or zero columns plan zero pages.
pub fn plan_table_pages(
    title: &str,
    n_rows: usize,
    n_cols: usize,
    policy: &SpecPaginationPolicy,
) -> Result<Vec<SpecTablePage>, String> {
    if policy.rows_per_page == 0 {
        return Err("rows_per_page must be >= 1.".to_string());
    }
    if policy.cols_per_page == Some(0) {
        return Err("cols_per_page must be >= 1 when set.".to_string());
    }
    if n_rows == 0 || n_cols == 0 {
        return Ok(Vec::new());
    }

    let l_data_cols: Vec<usize> = (1..n_cols).collect();
    let l_col_groups: Vec<Vec<usize>> = match policy.cols_per_page {
        Some(n_cols_page) if !l_data_cols.is_empty() => l_data_cols
            .chunks(n_cols_page)
            .map(|chunk| std::iter::once(0).chain(chunk.iter().copied()).collect())
            .collect(),
        _ => vec![(0..n_cols).collect()],
    };
    let l_row_chunks = generate_row_chunks(n_rows, policy.rows_per_page);

    let n_groups = l_col_groups.len();
    let mut l_pages = Vec::with_capacity(n_groups * l_row_chunks.len());
    for (n_group, l_cols) in l_col_groups.iter().enumerate() {
        for (n_chunk, (n_row_start, n_len)) in l_row_chunks.iter().enumerate() {
            let mut c_title = title.to_string();
            if n_groups > 1 && n_group > 0 {
                c_title.push_str(&format!(" [{}/{}]", n_group + 1, n_groups));
            }
            if n_chunk > 0 {
                c_title.push_str(C_CONTINUATION_MARKER);
            }
            l_pages.push(SpecTablePage {
                title: c_title,
                row_start_inclusive: *n_row_start,
                row_end_exclusive: n_row_start + n_len,
                cols: l_cols.clone(),
            });
        }
    }
    Ok(l_pages)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TableCells

/// Resolve one table cell through the classifier.
///
/// Numeric-formatted cells are right-aligned; everything else is left-aligned.
pub fn derive_table_cell(
    value: &EnumCellValue,
    header: &str,
    section_title: &str,
    currency_symbol: &str,
) -> SpecTableCell {
    let tag = classify(header, section_title, value);
    let number = match value {
        EnumCellValue::Number(n) if n.is_finite() => Some(*n),
        EnumCellValue::String(_) if tag.is_numeric() => derive_f64_from_cell_value(value),
        _ => None,
    };
    let align = if tag.is_numeric() && number.is_some() {
        EnumCellAlign::Right
    } else {
        EnumCellAlign::Left
    };

    SpecTableCell {
        text: format_value(value, tag, currency_symbol),
        number,
        tag,
        align,
    }
}

/// Build the resolved grid for one planned page of a sheet.
pub fn build_table_grid(sheet: &SpecSheet, page: &SpecTablePage, currency_symbol: &str) -> SpecTableGrid {
    let headers: Vec<String> = page
        .cols
        .iter()
        .map(|n_col| sheet.headers.get(*n_col).cloned().unwrap_or_default())
        .collect();

    let rows: Vec<Vec<SpecTableCell>> = sheet.rows[page.row_start_inclusive..page.row_end_exclusive]
        .iter()
        .map(|row| {
            page.cols
                .iter()
                .zip(&headers)
                .map(|(n_col, header)| {
                    let value = row.get(*n_col).unwrap_or(&EnumCellValue::None);
                    derive_table_cell(value, header, &sheet.chart_title, currency_symbol)
                })
                .collect()
        })
        .collect();

    let widths = derive_column_widths(&headers, &rows);
    SpecTableGrid {
        title: page.title.clone(),
        headers,
        rows,
        widths,
    }
}

/// Infer column widths from header and body text, clamped.
pub fn derive_column_widths(headers: &[String], rows: &[Vec<SpecTableCell>]) -> Vec<f64> {
    headers
        .iter()
        .enumerate()
        .map(|(n_col, header)| {
            let n_body_max = rows
                .iter()
                .take(N_HEIGHT_BODY_INFERRED_MAX)
                .filter_map(|row| row.get(n_col))
                .map(|cell| estimate_text_width(&cell.text))
                .max()
                .unwrap_or(0);
            let n_width = usize::max(estimate_text_width(header), n_body_max) + N_WIDTH_CELL_PADDING;
            n_width.clamp(N_WIDTH_CELL_MIN, N_WIDTH_CELL_MAX) as f64
        })
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FixedBlocks

/// Raw model records as a regular sheet; discount is derived per record.
pub fn build_models_sheet(title: &str, models: &[SpecModelRecord]) -> SpecSheet {
    let rows = models
        .iter()
        .map(|model| {
            vec![
                EnumCellValue::String(model.brand.clone()),
                EnumCellValue::String(model.model.clone()),
                EnumCellValue::String(model.submodel.clone()),
                EnumCellValue::String(model.estado.clone()),
                EnumCellValue::String(model.tipo_vehiculo.clone()),
                EnumCellValue::Number(model.precio_con_bono),
                EnumCellValue::Number(model.precio_lista),
                EnumCellValue::Number(model.bono),
                EnumCellValue::Number(model.discount_pct()),
            ]
        })
        .collect();

    SpecSheet {
        name: title.to_string(),
        chart_kind: Default::default(),
        chart_title: title.to_string(),
        headers: TUP_MODELS_HEADERS.iter().map(|c| c.to_string()).collect(),
        rows,
    }
}

/// Summary metrics as a two-column grid ("Métrica", "Valor").
///
/// The first two metrics are counts, the next five currency, the rest percent.
pub fn build_summary_grid(summary: &SpecSummaryMetrics, currency_symbol: &str) -> SpecTableGrid {
    let l_values = [
        summary.total_models,
        summary.total_brands,
        summary.avg_price,
        summary.median_price,
        summary.min_price,
        summary.max_price,
        summary.price_std_dev,
        summary.variation_coefficient,
        summary.avg_discount_pct,
    ];

    let rows = TUP_SUMMARY_LABELS
        .iter()
        .zip(l_values)
        .enumerate()
        .map(|(n_idx, (c_label, n_value))| {
            let tag = match n_idx {
                0 | 1 => EnumFormatTag::Integer,
                2..=6 => EnumFormatTag::Currency,
                _ => EnumFormatTag::Percent,
            };
            let value = EnumCellValue::Number(n_value);
            vec![
                SpecTableCell {
                    text: c_label.to_string(),
                    number: None,
                    tag: EnumFormatTag::Plain,
                    align: EnumCellAlign::Left,
                },
                SpecTableCell {
                    text: format_value(&value, tag, currency_symbol),
                    number: Some(n_value),
                    tag,
                    align: EnumCellAlign::Right,
                },
            ]
        })
        .collect();

    SpecTableGrid {
        title: "Resumen Ejecutivo".to_string(),
        headers: vec!["Métrica".to_string(), "Valor".to_string()],
        rows,
        widths: vec![25.0, 30.0],
    }
}

/// Filter lines shown under the summary; empty selections use the fallback.
pub fn derive_summary_filter_lines(summary: &SpecSummaryMetrics) -> Vec<(String, String)> {
    TUP_SUMMARY_FILTERS
        .iter()
        .map(|(c_label, c_key, c_fallback)| {
            let c_joined = summary
                .filters
                .get(*c_key)
                .map(|l_values| l_values.join(", "))
                .unwrap_or_default();
            let c_value = if c_joined.is_empty() {
                c_fallback.to_string()
            } else {
                c_joined
            };
            (c_label.to_string(), c_value)
        })
        .collect()
}

/// Payload filter lines for the info page; empty selections are omitted.
pub fn derive_payload_filter_lines(filters: &[(String, Vec<String>)]) -> Vec<(String, String)> {
    filters
        .iter()
        .filter(|(_, l_values)| !l_values.is_empty())
        .map(|(c_name, l_values)| (format!("{c_name}:"), l_values.join(", ")))
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::{C_MODELS_TABLE_TITLE, N_COLS_PAGE_DECK, N_ROWS_PAGE_DECK};

    fn deck_policy() -> SpecPaginationPolicy {
        SpecPaginationPolicy {
            rows_per_page: N_ROWS_PAGE_DECK,
            cols_per_page: Some(N_COLS_PAGE_DECK),
        }
    }

    #[test]
    fn test_generate_row_chunks_covers_all_rows() {
        assert_eq!(generate_row_chunks(25, 12), vec![(0, 12), (12, 12), (24, 1)]);
        assert_eq!(generate_row_chunks(24, 12), vec![(0, 12), (12, 12)]);
        assert!(generate_row_chunks(0, 12).is_empty());
    }

    #[test]
    fn test_models_pages_with_continuation_titles() {
        let l_models = vec![SpecModelRecord::default(); 25];
        let sheet = build_models_sheet(C_MODELS_TABLE_TITLE, &l_models);
        let l_pages =
            plan_table_pages(C_MODELS_TABLE_TITLE, sheet.height(), sheet.width(), &deck_policy())
                .unwrap_or_default();

        let l_heights: Vec<usize> = l_pages.iter().map(|page| page.height()).collect();
        assert_eq!(l_heights, vec![12, 12, 1]);
        let l_titles: Vec<&str> = l_pages.iter().map(|page| page.title.as_str()).collect();
        assert_eq!(
            l_titles,
            vec![
                "Detalle de Modelos",
                "Detalle de Modelos (Cont.)",
                "Detalle de Modelos (Cont.)"
            ]
        );
        assert!(l_pages.iter().all(|page| page.cols.len() == 9));
    }

    #[test]
    fn test_wide_sheet_groups_columns_and_repeats_label() {
        let l_pages = plan_table_pages("Precios", 13, 11, &deck_policy()).unwrap_or_default();
        assert_eq!(l_pages.len(), 4);
        assert_eq!(l_pages[0].cols, vec![0, 1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(l_pages[1].title, "Precios (Cont.)");
        assert_eq!(l_pages[2].title, "Precios [2/2]");
        assert_eq!(l_pages[2].cols, vec![0, 9, 10]);
        assert_eq!(l_pages[3].title, "Precios [2/2] (Cont.)");
    }

    #[test]
    fn test_page_count_is_row_chunks_times_col_groups() {
        let policy = deck_policy();
        for n_rows in [1usize, 11, 12, 13, 37] {
            for n_cols in [1usize, 2, 7, 8, 14] {
                let l_pages = plan_table_pages("T", n_rows, n_cols, &policy).unwrap_or_default();
                let n_groups = usize::max(1, (n_cols - 1).div_ceil(N_COLS_PAGE_DECK));
                assert_eq!(l_pages.len(), n_rows.div_ceil(N_ROWS_PAGE_DECK) * n_groups);
                assert!(l_pages.iter().all(|page| page.cols[0] == 0));
                let n_last = l_pages.last().map_or(0, |page| page.height());
                let n_expected = if n_rows % 12 == 0 { 12 } else { n_rows % 12 };
                assert_eq!(n_last, n_expected);
            }
        }
        assert!(plan_table_pages("T", 0, 3, &policy).unwrap_or_default().is_empty());
        assert!(plan_table_pages("T", 3, 3, &SpecPaginationPolicy { rows_per_page: 0, cols_per_page: None }).is_err());
    }

    #[test]
    fn test_derive_table_cell_alignment_and_text() {
        let cell = derive_table_cell(&EnumCellValue::Number(25_000_000.0), "Precio", "Ranking", "$");
        assert_eq!(cell.text, "$ 25.000.000");
        assert_eq!(cell.align, EnumCellAlign::Right);

        let cell = derive_table_cell(&EnumCellValue::String("Kia".into()), "Marca", "Ranking", "$");
        assert_eq!(cell.align, EnumCellAlign::Left);
        assert_eq!(cell.number, None);

        let cell = derive_table_cell(&EnumCellValue::None, "Precio", "Ranking", "$");
        assert_eq!(cell.text, "-");
        assert_eq!(cell.align, EnumCellAlign::Left);
    }

    #[test]
    fn test_summary_grid_and_filter_fallbacks() {
        let mut summary = SpecSummaryMetrics {
            total_models: 120.0,
            avg_price: 15_990_000.0,
            variation_coefficient: 0.153,
            ..Default::default()
        };
        summary
            .filters
            .insert("brand".to_string(), vec!["Kia".to_string(), "Mazda".to_string()]);

        let grid = build_summary_grid(&summary, "$");
        assert_eq!(grid.rows.len(), 9);
        assert_eq!(grid.rows[0][1].text, "120");
        assert_eq!(grid.rows[2][1].text, "$ 15.990.000");
        assert_eq!(grid.rows[7][1].text, "15.3%");

        let l_lines = derive_summary_filter_lines(&summary);
        assert_eq!(l_lines[0], ("Segmento:".to_string(), "Todos".to_string()));
        assert_eq!(l_lines[1], ("Marca:".to_string(), "Kia, Mazda".to_string()));
    }
}
