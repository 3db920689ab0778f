//! Chart dispatcher: one sheet -> chart model -> back-end neutral styling.

use crate::classify::classify;
use crate::conf::{
    TUP_BRAND_PALETTE, TUP_HEADER_CATEGORY_SUFFIX_TOKENS, TUP_HEADER_METADATA_TOKENS,
    TUP_HEADER_SCATTER_X, TUP_HEADER_SCATTER_Y, TUP_TITLE_COMPOSITION, TUP_TITLE_CURRENCY_AXIS,
    TUP_TITLE_DATA_LABELS, TUP_TITLE_EVOLUTION, TUP_TITLE_PERCENT_AXIS, TUP_TITLE_VARY_COLORS,
};
use crate::spec::{
    EnumCellValue, EnumChartKind, EnumColorMode, EnumFormatTag, SpecChartModel, SpecChartSeries,
    SpecChartStyle, SpecScatterPoint, SpecSheet,
};
use crate::util::{
    contains_any_keyword, derive_cell_text, derive_f64_from_cell_value, derive_xlsx_num_format,
    header_has_token, normalize_keyword_text,
};

/// Composition axes switch to unit steps at or below this maximum.
const N_COMPOSITION_UNIT_STEP_MAX: f64 = 10.0;
/// Categories beyond this count get rotated labels.
const N_CATEGORIES_ROTATE_MIN: usize = 8;

////////////////////////////////////////////////////////////////////////////////
// #region Model

/// Build the chart model for one sheet.
///
/// Categories and every series always have one entry per row. Time-evolution
/// charts turn zero, null and unparseable values into gaps; other charts plot
/// them as `0.0`.
pub fn build_chart_model(sheet: &SpecSheet, currency_symbol: &str) -> SpecChartModel {
    let c_topic = normalize_keyword_text(&format!("{} {}", sheet.chart_title, sheet.name));
    let if_time_evolution = contains_any_keyword(&c_topic, &TUP_TITLE_EVOLUTION);

    let categories = derive_category_labels(sheet);
    let series: Vec<SpecChartSeries> = derive_series_columns(&sheet.headers)
        .into_iter()
        .map(|n_col| SpecChartSeries {
            name: sheet.headers[n_col].clone(),
            values: sheet
                .rows
                .iter()
                .map(|row| {
                    let value = row
                        .get(n_col)
                        .and_then(derive_f64_from_cell_value);
                    if if_time_evolution {
                        value.filter(|x| *x != 0.0)
                    } else {
                        Some(value.unwrap_or(0.0))
                    }
                })
                .collect(),
        })
        .collect();

    let (points, x_axis_title, y_axis_title) = match sheet.chart_kind {
        EnumChartKind::Scatter => derive_scatter_points(sheet, &categories),
        EnumChartKind::Stacked => (Vec::new(), None, Some("Total".to_string())),
        EnumChartKind::Bar | EnumChartKind::Line => (Vec::new(), None, Some("Valor".to_string())),
    };

    let color_mode = if contains_any_keyword(&c_topic, &TUP_TITLE_VARY_COLORS) {
        EnumColorMode::VaryByCategory
    } else {
        EnumColorMode::SeriesPalette
    };

    let (axis_format, axis_major_unit) =
        derive_value_axis(sheet, &c_topic, &series, if_time_evolution);

    SpecChartModel {
        title: sheet.chart_title.clone(),
        kind: sheet.chart_kind,
        categories,
        series,
        points,
        color_mode,
        axis_format,
        axis_major_unit,
        if_data_labels: sheet.chart_kind != EnumChartKind::Scatter
            && contains_any_keyword(&c_topic, &TUP_TITLE_DATA_LABELS),
        if_time_evolution,
        x_axis_title,
        y_axis_title,
        currency_symbol: currency_symbol.to_string(),
    }
}

/// `header[0]` value plus `" - "`-joined model/version columns.
fn derive_category_labels(sheet: &SpecSheet) -> Vec<String> {
    let l_suffix_cols: Vec<usize> = sheet
        .headers
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, header)| header_has_token(header, &TUP_HEADER_CATEGORY_SUFFIX_TOKENS))
        .map(|(n_col, _)| n_col)
        .collect();

    sheet
        .rows
        .iter()
        .map(|row| {
            let mut c_label = row.first().map(derive_cell_text).unwrap_or_default();
            for n_col in &l_suffix_cols {
                let c_part = row.get(*n_col).map(derive_cell_text).unwrap_or_default();
                if !c_part.trim().is_empty() {
                    c_label.push_str(" - ");
                    c_label.push_str(&c_part);
                }
            }
            c_label
        })
        .collect()
}

/// Column indices plotted as series: `headers[1..]` minus metadata columns.
pub fn derive_series_columns(headers: &[String]) -> Vec<usize> {
    headers
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, header)| !header_has_token(header, &TUP_HEADER_METADATA_TOKENS))
        .map(|(n_col, _)| n_col)
        .collect()
}

fn derive_scatter_points(
    sheet: &SpecSheet,
    categories: &[String],
) -> (Vec<SpecScatterPoint>, Option<String>, Option<String>) {
    // column 0 holds the labels; x and y never share a column
    let find_col = |keywords: &[&str], n_taken: Option<usize>, l_fallbacks: &[usize]| {
        let if_free = |n_col: &usize| Some(*n_col) != n_taken && *n_col < sheet.headers.len();
        (1..sheet.headers.len())
            .filter(if_free)
            .find(|n_col| contains_any_keyword(&normalize_keyword_text(&sheet.headers[*n_col]), keywords))
            .or_else(|| l_fallbacks.iter().copied().find(if_free))
    };
    let Some(n_col_x) = find_col(&TUP_HEADER_SCATTER_X, None, &[1]) else {
        return (Vec::new(), None, None);
    };
    let Some(n_col_y) = find_col(&TUP_HEADER_SCATTER_Y, Some(n_col_x), &[2, 1]) else {
        return (Vec::new(), None, None);
    };

    let points = sheet
        .rows
        .iter()
        .zip(categories)
        .filter_map(|(row, c_label)| {
            let x = row.get(n_col_x).and_then(derive_f64_from_cell_value)?;
            let y = row.get(n_col_y).and_then(derive_f64_from_cell_value)?;
            Some(SpecScatterPoint {
                label: c_label.clone(),
                x,
                y,
                size: f64::max(x.abs(), 1.0),
            })
        })
        .collect();

    (
        points,
        Some(sheet.headers[n_col_x].clone()),
        Some(sheet.headers[n_col_y].clone()),
    )
}

fn derive_value_axis(
    sheet: &SpecSheet,
    c_topic: &str,
    series: &[SpecChartSeries],
    if_time_evolution: bool,
) -> (EnumFormatTag, Option<f64>) {
    if contains_any_keyword(c_topic, &TUP_TITLE_COMPOSITION) {
        let n_max = derive_value_max(series, sheet.chart_kind == EnumChartKind::Stacked);
        let major_unit = (n_max <= N_COMPOSITION_UNIT_STEP_MAX).then_some(1.0);
        return (EnumFormatTag::Integer, major_unit);
    }
    if contains_any_keyword(c_topic, &TUP_TITLE_PERCENT_AXIS) {
        return (EnumFormatTag::Percent, None);
    }
    if if_time_evolution
        || sheet.chart_kind == EnumChartKind::Scatter
        || contains_any_keyword(c_topic, &TUP_TITLE_CURRENCY_AXIS)
    {
        return (EnumFormatTag::Currency, None);
    }

    let tag = derive_series_columns(&sheet.headers)
        .first()
        .map(|n_col| {
            let sample = sheet
                .rows
                .iter()
                .filter_map(|row| row.get(*n_col))
                .find(|value| matches!(value, EnumCellValue::Number(_)))
                .cloned()
                .unwrap_or(EnumCellValue::None);
            classify(&sheet.headers[*n_col], &sheet.chart_title, &sample)
        })
        .unwrap_or(EnumFormatTag::Plain);
    (tag, None)
}

/// Largest plotted value; stacked charts compare per-category sums.
fn derive_value_max(series: &[SpecChartSeries], if_stacked: bool) -> f64 {
    let n_len = series.first().map_or(0, |s| s.values.len());
    if if_stacked {
        (0..n_len)
            .map(|n_idx| {
                series
                    .iter()
                    .filter_map(|s| s.values.get(n_idx).copied().flatten())
                    .sum::<f64>()
            })
            .fold(0.0, f64::max)
    } else {
        series
            .iter()
            .flat_map(|s| s.values.iter().copied().flatten())
            .fold(0.0, f64::max)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Style

/// Derive chart-type-specific styling. Back-ends render unstyled on error.
pub fn derive_chart_style(model: &SpecChartModel) -> Result<SpecChartStyle, String> {
    if let Some(series) = model
        .series
        .iter()
        .find(|series| series.values.len() != model.categories.len())
    {
        return Err(format!(
            "series '{}' has {} values for {} categories",
            series.name,
            series.values.len(),
            model.categories.len()
        ));
    }
    if let Some(n_unit) = model.axis_major_unit
        && !(n_unit.is_finite() && n_unit > 0.0)
    {
        return Err(format!("invalid value-axis major unit: {n_unit}"));
    }

    let value_num_format = match model.axis_format {
        EnumFormatTag::Currency => derive_xlsx_num_format(EnumFormatTag::Currency, &model.currency_symbol),
        EnumFormatTag::Percent => Some("0%".to_string()),
        EnumFormatTag::Integer => Some("0".to_string()),
        EnumFormatTag::Plain => None,
    };

    let n_series_colors = match model.kind {
        EnumChartKind::Scatter => model.points.len(),
        _ => model.series.len(),
    };
    let series_colors = derive_palette_cycle(n_series_colors);
    let point_colors = match (model.color_mode, model.kind) {
        (EnumColorMode::VaryByCategory, EnumChartKind::Bar | EnumChartKind::Stacked) => {
            derive_palette_cycle(model.categories.len())
        }
        _ => Vec::new(),
    };

    let if_scatter = model.kind == EnumChartKind::Scatter;
    Ok(SpecChartStyle {
        value_num_format,
        category_num_format: if_scatter.then(|| "#,##0".to_string()),
        value_major_unit: model.axis_major_unit,
        value_min: if_scatter.then_some(0.0),
        category_label_rotation: (!if_scatter && model.categories.len() > N_CATEGORIES_ROTATE_MIN)
            .then_some(-45),
        if_data_labels: model.if_data_labels,
        series_colors,
        point_colors,
    })
}

/// First `n` colors of the brand palette, cycling.
pub fn derive_palette_cycle(n: usize) -> Vec<String> {
    TUP_BRAND_PALETTE
        .iter()
        .cycle()
        .take(n)
        .map(|c| c.to_string())
        .collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn s(x: &str) -> EnumCellValue {
        EnumCellValue::String(x.to_string())
    }

    fn n(x: f64) -> EnumCellValue {
        EnumCellValue::Number(x)
    }

    fn sheet(name: &str, kind: EnumChartKind, headers: &[&str], rows: Vec<Vec<EnumCellValue>>) -> SpecSheet {
        SpecSheet {
            name: name.to_string(),
            chart_kind: kind,
            chart_title: name.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows,
        }
    }

    #[test]
    fn test_evolution_zero_becomes_gap_and_axis_is_currency() {
        let sheet = sheet(
            "Evolución de Precios",
            EnumChartKind::Line,
            &["Mes", "Kia", "Toyota"],
            vec![vec![s("Ene"), n(0.0), n(100.0)], vec![s("Feb"), n(120.0), n(110.0)]],
        );
        let model = build_chart_model(&sheet, "$");
        assert!(model.if_time_evolution);
        assert_eq!(model.series[0].values, vec![None, Some(120.0)]);
        assert_eq!(model.series[1].values, vec![Some(100.0), Some(110.0)]);
        assert_eq!(model.axis_format, EnumFormatTag::Currency);
    }

    #[test]
    fn test_non_evolution_degrades_bad_values_to_zero() {
        let sheet = sheet(
            "Ranking",
            EnumChartKind::Bar,
            &["Marca", "Unidades"],
            vec![vec![s("Kia"), s("n/d")], vec![s("Mazda"), EnumCellValue::None]],
        );
        let model = build_chart_model(&sheet, "$");
        assert_eq!(model.series[0].values, vec![Some(0.0), Some(0.0)]);
        assert_eq!(model.categories.len(), 2);
    }

    #[test]
    fn test_metadata_columns_excluded_and_category_suffixed() {
        let sheet = sheet(
            "Precios por Modelo",
            EnumChartKind::Bar,
            &["Marca", "Modelo", "Precio Promedio", "Total Modelos", "Imagen URL"],
            vec![vec![s("Kia"), s("Rio"), n(10.0), n(2.0), s("http://x")]],
        );
        let model = build_chart_model(&sheet, "$");
        let l_names: Vec<&str> = model.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(l_names, vec!["Precio Promedio", "Total Modelos"]);
        assert_eq!(model.categories, vec!["Kia - Rio"]);
        assert!(model.if_data_labels);
        assert_eq!(model.color_mode, EnumColorMode::SeriesPalette);
    }

    #[test]
    fn test_scatter_drops_rows_without_y_from_points_only() {
        let sheet = sheet(
            "Matriz Posicionamiento",
            EnumChartKind::Scatter,
            &["Nombre", "Volumen", "Precio"],
            vec![
                vec![s("A"), n(5.0), n(100.0)],
                vec![s("B"), n(3.0), EnumCellValue::None],
                vec![s("C"), n(0.0), n(80.0)],
            ],
        );
        let model = build_chart_model(&sheet, "$");
        assert_eq!(model.categories.len(), 3);
        assert_eq!(model.points.len(), 2);
        assert_eq!(model.points[1].size, 1.0);
        assert_eq!(model.x_axis_title.as_deref(), Some("Volumen"));
        assert_eq!(model.y_axis_title.as_deref(), Some("Precio"));
        assert_eq!(model.axis_format, EnumFormatTag::Currency);
    }

    #[test]
    fn test_scatter_axes_skip_label_column_and_each_other() {
        let sheet = sheet(
            "Matriz Posicionamiento",
            EnumChartKind::Scatter,
            &["Precio Marca", "Volumen Precio", "Precio Lista"],
            vec![vec![s("A"), n(5.0), n(100.0)], vec![s("B"), n(3.0), n(90.0)]],
        );
        let model = build_chart_model(&sheet, "$");
        assert_eq!(model.x_axis_title.as_deref(), Some("Volumen Precio"));
        assert_eq!(model.y_axis_title.as_deref(), Some("Precio Lista"));
        assert_eq!(model.points.len(), 2);
        assert_eq!((model.points[0].x, model.points[0].y), (5.0, 100.0));

        let sheet = sheet_swapped();
        let model = build_chart_model(&sheet, "$");
        assert_eq!(model.x_axis_title.as_deref(), Some("Volumen"));
        assert_eq!(model.y_axis_title.as_deref(), Some("Valor"));
        assert_eq!((model.points[0].x, model.points[0].y), (7.0, 110.0));
    }

    /// Volume in the last column, no price keyword anywhere.
    fn sheet_swapped() -> SpecSheet {
        sheet(
            "Matriz Posicionamiento",
            EnumChartKind::Scatter,
            &["Nombre", "Valor", "Volumen"],
            vec![vec![s("A"), n(110.0), n(7.0)]],
        )
    }

    #[test]
    fn test_composition_uses_integer_axis_with_unit_step() {
        let sheet = sheet(
            "Composición por Segmento",
            EnumChartKind::Stacked,
            &["Segmento", "SUV", "Sedan"],
            vec![vec![s("A"), n(3.0), n(4.0)], vec![s("B"), n(2.0), n(1.0)]],
        );
        let model = build_chart_model(&sheet, "$");
        assert_eq!(model.axis_format, EnumFormatTag::Integer);
        assert_eq!(model.axis_major_unit, Some(1.0));
        assert_eq!(model.color_mode, EnumColorMode::VaryByCategory);

        let big = SpecSheet {
            rows: vec![vec![s("A"), n(8.0), n(4.0)]],
            ..sheet
        };
        assert_eq!(build_chart_model(&big, "$").axis_major_unit, None);
    }

    #[test]
    fn test_style_cycles_palette_and_rejects_bad_models() {
        let headers: Vec<String> = (0..10).map(|i| format!("S{i}")).collect();
        let model = build_chart_model(
            &SpecSheet {
                name: "Tendencia".to_string(),
                chart_kind: EnumChartKind::Bar,
                chart_title: "Tendencia".to_string(),
                rows: vec![(0..10).map(|i| n(i as f64 / 10.0)).collect()],
                headers,
            },
            "$",
        );
        let style = derive_chart_style(&model).unwrap_or_default();
        assert_eq!(style.series_colors.len(), 9);
        assert_eq!(style.series_colors[8], TUP_BRAND_PALETTE[0]);
        assert_eq!(style.value_num_format.as_deref(), Some("0%"));
        assert_eq!(style.point_colors.len(), 1);

        let mut bad = model.clone();
        bad.series[0].values.push(None);
        assert!(derive_chart_style(&bad).is_err());
    }
}
