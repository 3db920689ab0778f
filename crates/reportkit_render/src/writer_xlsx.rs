//! Workbook back-end built on `rust_xlsxwriter`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rust_xlsxwriter::{
    Chart, ChartAxisLabelPosition, ChartDataLabel, ChartDataLabelPosition, ChartEmptyCells,
    ChartFont, ChartFormat, ChartLegendPosition, ChartLine, ChartMarker, ChartMarkerType,
    ChartPoint, ChartSolidFill, ChartType, Format, FormatAlign, FormatBorder, Workbook, Worksheet,
    XlsxError,
};
use tracing::warn;

use crate::canvas::ReportCanvas;
use crate::chart::derive_chart_style;
use crate::conf::{
    C_COLOR_ALT_ROW, C_FONT_BODY, C_FONT_TITLE, derive_default_pagination_policy,
    derive_default_xlsx_formats,
};
use crate::error::ReportError;
use crate::spec::{
    EnumCellAlign, EnumChartKind, EnumDocumentKind, EnumFormatTag, SpecCellFormat,
    SpecChartModel, SpecChartStyle, SpecPaginationPolicy, SpecReportContext, SpecTableCell,
    SpecTableGrid,
};
use crate::util::{derive_unique_page_label, derive_xlsx_num_format, sanitize_xml_text};

/// First worksheet column of the chart data block on chart sheets (`AA`).
const N_COL_CHART_DATA: u16 = 26;
/// Chart size in pixels (about 26 x 16 cm).
const N_CHART_WIDTH_PX: u32 = 983;
const N_CHART_HEIGHT_PX: u32 = 605;
/// A4 paper code.
const N_PAPER_SIZE_A4: u8 = 9;

////////////////////////////////////////////////////////////////////////////////
// #region Canvas

/// Stateful workbook canvas. Buffers everything in memory until [`ReportCanvas::finish`].
pub struct XlsxCanvas {
    workbook: Workbook,
    context: SpecReportContext,
    dict_fmt: BTreeMap<String, SpecCellFormat>,
    set_sheet_names_existing: BTreeSet<String>,
    l_warnings: Vec<String>,
    if_finished: bool,
}

impl XlsxCanvas {
    pub fn new(context: SpecReportContext) -> Self {
        Self {
            workbook: Workbook::new(),
            context,
            dict_fmt: derive_default_xlsx_formats(),
            set_sheet_names_existing: BTreeSet::new(),
            l_warnings: Vec::new(),
            if_finished: false,
        }
    }

    fn ensure_open(&self) -> Result<(), ReportError> {
        if self.if_finished {
            return Err(ReportError::Finished);
        }
        Ok(())
    }

    fn fmt(&self, key: &str) -> Format {
        self.dict_fmt
            .get(key)
            .map(derive_rust_xlsx_format)
            .unwrap_or_default()
    }

    /// Excel compares sheet names case-insensitively.
    fn derive_unique_sheet_name(&mut self, name: &str) -> String {
        derive_unique_page_label(&mut self.set_sheet_names_existing, name)
    }

    /// The sheet joins the workbook only once its name is accepted, so a
    /// rejected name never leaves an auto-named `SheetN` behind.
    fn add_named_sheet(&mut self, name: &str) -> Result<(String, &mut Worksheet), ReportError> {
        let c_sheet_name = self.derive_unique_sheet_name(name);
        let mut worksheet = Worksheet::new();
        worksheet.set_name(&c_sheet_name)?;
        worksheet.set_screen_gridlines(false);
        self.workbook.push_worksheet(worksheet);
        let worksheet = self.workbook.worksheet_from_name(&c_sheet_name)?;
        Ok((c_sheet_name, worksheet))
    }

    /// Title, timestamp and `key: value` lines shared by summary and info sheets.
    fn write_heading_block(
        worksheet: &mut Worksheet,
        title: &str,
        generated_at: &str,
        fmt_title: &Format,
        fmt_subtitle: &Format,
    ) -> Result<(), ReportError> {
        worksheet.write_string_with_format(0, 0, title, fmt_title)?;
        worksheet.write_string_with_format(1, 0, format!("Generado: {generated_at}"), fmt_subtitle)?;
        Ok(())
    }

    fn write_filter_lines(
        worksheet: &mut Worksheet,
        n_row_start: usize,
        filter_lines: &[(String, String)],
        fmt_heading: &Format,
        fmt_label: &Format,
        fmt_value: &Format,
    ) -> Result<(), ReportError> {
        let n_row_heading = cast_row_num(n_row_start)?;
        worksheet.write_string_with_format(n_row_heading, 0, "Filtros Aplicados", fmt_heading)?;
        for (n_offset, (c_label, c_value)) in filter_lines.iter().enumerate() {
            let n_row = cast_row_num(n_row_start + 1 + n_offset)?;
            worksheet.write_string_with_format(n_row, 0, c_label, fmt_label)?;
            worksheet.write_string_with_format(n_row, 1, c_value, fmt_value)?;
        }
        Ok(())
    }

    fn write_grid(
        &mut self,
        worksheet_name: &str,
        grid: &SpecTableGrid,
        n_row_header: usize,
    ) -> Result<(), ReportError> {
        let fmt_header = self.fmt("header");
        let fmt_text_spec = self.dict_fmt.get("text").cloned().unwrap_or_default();
        let fmt_number_spec = self.dict_fmt.get("number").cloned().unwrap_or_default();
        let currency_symbol = self.context.currency_symbol.clone();

        let worksheet = self.workbook.worksheet_from_name(worksheet_name)?;
        let n_row_header_xl = cast_row_num(n_row_header)?;
        for (n_col, header) in grid.headers.iter().enumerate() {
            worksheet.write_string_with_format(n_row_header_xl, cast_col_num(n_col)?, header, &fmt_header)?;
        }

        let mut dict_fmt_cache: HashMap<(EnumFormatTag, EnumCellAlign, bool), Format> = HashMap::new();
        for (n_row, row) in grid.rows.iter().enumerate() {
            let n_row_xl = cast_row_num(n_row_header + 1 + n_row)?;
            let if_alt = n_row % 2 == 1;
            for (n_col, cell) in row.iter().enumerate() {
                let format = dict_fmt_cache
                    .entry((cell.tag, cell.align, if_alt))
                    .or_insert_with(|| {
                        derive_table_cell_format(
                            cell,
                            if_alt,
                            &fmt_text_spec,
                            &fmt_number_spec,
                            &currency_symbol,
                        )
                    });
                write_table_cell(worksheet, n_row_xl, cast_col_num(n_col)?, cell, format)?;
            }
        }

        for (n_col, n_width) in grid.widths.iter().enumerate() {
            worksheet.set_column_width(cast_col_num(n_col)?, *n_width)?;
        }
        Ok(())
    }
}

impl ReportCanvas for XlsxCanvas {
    fn kind(&self) -> EnumDocumentKind {
        EnumDocumentKind::Workbook
    }

    fn pagination_policy(&self) -> SpecPaginationPolicy {
        derive_default_pagination_policy(EnumDocumentKind::Workbook)
    }

    fn add_cover(&mut self) -> Result<Vec<String>, ReportError> {
        self.ensure_open()?;
        Ok(Vec::new())
    }

    fn add_intro(&mut self) -> Result<Vec<String>, ReportError> {
        self.ensure_open()?;
        Ok(Vec::new())
    }

    fn add_summary(
        &mut self,
        grid: &SpecTableGrid,
        filter_lines: &[(String, String)],
    ) -> Result<Vec<String>, ReportError> {
        self.ensure_open()?;
        let (fmt_title, fmt_subtitle, fmt_label) = (self.fmt("title"), self.fmt("subtitle"), self.fmt("label"));
        let fmt_value = derive_rust_xlsx_format(&SpecCellFormat {
            font_name: Some(C_FONT_BODY.to_string()),
            font_size: Some(10),
            ..Default::default()
        });
        let fmt_heading = derive_rust_xlsx_format(&SpecCellFormat {
            font_name: Some(C_FONT_TITLE.to_string()),
            bold: Some(true),
            ..Default::default()
        });
        let c_title = self.context.title.clone();
        let c_generated_at = self.context.generated_at.clone();

        let (c_sheet_name, worksheet) = self.add_named_sheet(&grid.title)?;
        Self::write_heading_block(worksheet, &c_title, &c_generated_at, &fmt_title, &fmt_subtitle)?;
        let n_row_filters = 3 + grid.rows.len() + 1;
        Self::write_filter_lines(
            worksheet,
            n_row_filters,
            filter_lines,
            &fmt_heading,
            &fmt_label,
            &fmt_value,
        )?;

        self.write_grid(&c_sheet_name, grid, 3)?;
        Ok(vec![c_sheet_name])
    }

    fn add_info(&mut self, filter_lines: &[(String, String)]) -> Result<Vec<String>, ReportError> {
        self.ensure_open()?;
        let (fmt_title, fmt_subtitle, fmt_label) = (self.fmt("title"), self.fmt("subtitle"), self.fmt("label"));
        let fmt_value = derive_rust_xlsx_format(&SpecCellFormat {
            font_name: Some(C_FONT_BODY.to_string()),
            ..Default::default()
        });
        let fmt_heading = derive_rust_xlsx_format(&SpecCellFormat {
            font_name: Some(C_FONT_TITLE.to_string()),
            bold: Some(true),
            ..Default::default()
        });
        let c_title = self.context.title.clone();
        let c_generated_at = self.context.generated_at.clone();

        let (c_sheet_name, worksheet) = self.add_named_sheet("Información")?;
        Self::write_heading_block(worksheet, &c_title, &c_generated_at, &fmt_title, &fmt_subtitle)?;
        if !filter_lines.is_empty() {
            Self::write_filter_lines(worksheet, 3, filter_lines, &fmt_heading, &fmt_label, &fmt_value)?;
        }
        worksheet.set_column_width(0, 20)?;
        worksheet.set_column_width(1, 40)?;
        Ok(vec![c_sheet_name])
    }

    fn add_chart_page(
        &mut self,
        label: &str,
        model: &SpecChartModel,
    ) -> Result<Vec<String>, ReportError> {
        self.ensure_open()?;
        let style = match derive_chart_style(model) {
            Ok(style) => Some(style),
            Err(err) => {
                warn!(chart = %model.title, error = %err, "chart styling failed; rendering unstyled");
                self.l_warnings
                    .push(format!("chart '{}' rendered unstyled: {err}", model.title));
                None
            }
        };

        let (c_sheet_name, worksheet) = self.add_named_sheet(&format!("Gráfico {label}"))?;
        worksheet.set_column_width(0, 20)?;
        worksheet.set_row_height(0, 20)?;
        worksheet.set_landscape();
        worksheet.set_paper_size(N_PAPER_SIZE_A4);
        worksheet.set_print_center_horizontally(true);
        worksheet.set_print_center_vertically(true);

        let mut chart = match model.kind {
            EnumChartKind::Scatter => build_scatter_chart(worksheet, &c_sheet_name, model, style.as_ref())?,
            _ => build_category_chart(worksheet, &c_sheet_name, model, style.as_ref())?,
        };
        apply_chart_frame(&mut chart, model);
        if let Some(style) = &style {
            apply_chart_axes(&mut chart, model, style);
        }
        worksheet.insert_chart(1, 1, &chart)?;
        Ok(vec![c_sheet_name])
    }

    fn add_table_page(
        &mut self,
        label: &str,
        grid: &SpecTableGrid,
    ) -> Result<Vec<String>, ReportError> {
        self.ensure_open()?;
        let (c_sheet_name, _) = self.add_named_sheet(label)?;
        self.write_grid(&c_sheet_name, grid, 0)?;
        self.workbook
            .worksheet_from_name(&c_sheet_name)?
            .set_freeze_panes(1, 0)?;
        Ok(vec![c_sheet_name])
    }

    fn add_error_page(
        &mut self,
        label: &str,
        heading: &str,
        message: &str,
    ) -> Result<Vec<String>, ReportError> {
        self.ensure_open()?;
        let fmt_error = self.fmt("error");
        let fmt_message = derive_rust_xlsx_format(&SpecCellFormat {
            font_name: Some(C_FONT_BODY.to_string()),
            text_wrap: Some(true),
            valign: Some("top".to_string()),
            ..Default::default()
        });
        let (c_sheet_name, worksheet) = self.add_named_sheet(label)?;
        worksheet.write_string_with_format(0, 0, heading, &fmt_error)?;
        worksheet.write_string_with_format(2, 0, message, &fmt_message)?;
        worksheet.set_column_width(0, 80)?;
        Ok(vec![c_sheet_name])
    }

    fn add_debug_log(&mut self, lines: &[String]) -> Result<(), ReportError> {
        self.ensure_open()?;
        let (_, worksheet) = self.add_named_sheet("DEBUG LOG")?;
        for (n_row, c_line) in lines.iter().enumerate() {
            worksheet.write_string(cast_row_num(n_row)?, 0, c_line)?;
        }
        worksheet.set_column_width(0, 120)?;
        worksheet.set_hidden(true);
        Ok(())
    }

    fn drain_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.l_warnings)
    }

    fn finish(&mut self) -> Result<Vec<u8>, ReportError> {
        self.ensure_open()?;
        let v_bytes = self.workbook.save_to_buffer()?;
        self.if_finished = true;
        Ok(v_bytes)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Charts

fn build_category_chart(
    worksheet: &mut Worksheet,
    sheet_name: &str,
    model: &SpecChartModel,
    style: Option<&SpecChartStyle>,
) -> Result<Chart, ReportError> {
    let chart_type = match model.kind {
        EnumChartKind::Stacked => ChartType::ColumnStacked,
        EnumChartKind::Line => ChartType::Line,
        _ => ChartType::Column,
    };
    let mut chart = Chart::new(chart_type);

    // data block: categories then one column per series; gaps stay blank
    let n_rows = model.categories.len();
    let n_row_last = cast_row_num(n_rows)?;
    worksheet.write_string(0, N_COL_CHART_DATA, "Categoría")?;
    for (n_row, c_category) in model.categories.iter().enumerate() {
        worksheet.write_string(cast_row_num(n_row + 1)?, N_COL_CHART_DATA, sanitize_xml_text(c_category))?;
    }
    worksheet.set_column_hidden(N_COL_CHART_DATA)?;

    for (n_series, series) in model.series.iter().enumerate() {
        let n_col = N_COL_CHART_DATA + 1 + cast_col_num(n_series)?;
        worksheet.write_string(0, n_col, sanitize_xml_text(&series.name))?;
        for (n_row, value) in series.values.iter().enumerate() {
            if let Some(n) = value {
                worksheet.write_number(cast_row_num(n_row + 1)?, n_col, *n)?;
            }
        }
        worksheet.set_column_hidden(n_col)?;

        let chart_series = chart.add_series();
        chart_series
            .set_name((sheet_name, 0, n_col))
            .set_categories((sheet_name, 1, N_COL_CHART_DATA, n_row_last, N_COL_CHART_DATA))
            .set_values((sheet_name, 1, n_col, n_row_last, n_col));
        if model.kind == EnumChartKind::Line {
            chart_series.set_smooth(true);
        }

        let Some(style) = style else { continue };
        if let Some(c_color) = style.series_colors.get(n_series) {
            let c_hex = derive_hex_color(c_color);
            match model.kind {
                EnumChartKind::Line => {
                    chart_series.set_format(
                        ChartFormat::new().set_line(ChartLine::new().set_color(c_hex.as_str()).set_width(2.25)),
                    );
                }
                _ => {
                    chart_series.set_format(
                        ChartFormat::new().set_solid_fill(ChartSolidFill::new().set_color(c_hex.as_str())),
                    );
                }
            }
        }
        if !style.point_colors.is_empty() {
            let l_points: Vec<ChartPoint> = style
                .point_colors
                .iter()
                .map(|c_color| {
                    ChartPoint::new().set_format(
                        ChartFormat::new()
                            .set_solid_fill(ChartSolidFill::new().set_color(derive_hex_color(c_color).as_str())),
                    )
                })
                .collect();
            chart_series.set_points(&l_points);
        }
        if style.if_data_labels {
            let mut data_label = ChartDataLabel::new();
            data_label
                .show_value()
                .set_font(ChartFont::new().set_name(C_FONT_BODY).set_size(8));
            if model.kind != EnumChartKind::Line {
                data_label.set_position(ChartDataLabelPosition::InsideEnd);
            }
            if let Some(c_fmt) = &style.value_num_format {
                data_label.set_num_format(c_fmt);
            }
            chart_series.set_data_label(&data_label);
        }
    }

    chart.show_hidden_data();
    chart.show_empty_cells_as(ChartEmptyCells::Gaps);
    Ok(chart)
}

fn build_scatter_chart(
    worksheet: &mut Worksheet,
    sheet_name: &str,
    model: &SpecChartModel,
    style: Option<&SpecChartStyle>,
) -> Result<Chart, ReportError> {
    let mut chart = Chart::new(ChartType::Scatter);
    let n_size_max = model.points.iter().map(|p| p.size).fold(1.0, f64::max);

    worksheet.write_string(0, N_COL_CHART_DATA, "Etiqueta")?;
    let c_x_title = sanitize_xml_text(model.x_axis_title.as_deref().unwrap_or("X"));
    let c_y_title = sanitize_xml_text(model.y_axis_title.as_deref().unwrap_or("Y"));
    worksheet.write_string(0, N_COL_CHART_DATA + 1, c_x_title)?;
    worksheet.write_string(0, N_COL_CHART_DATA + 2, c_y_title)?;
    for n_col in N_COL_CHART_DATA..N_COL_CHART_DATA + 3 {
        worksheet.set_column_hidden(n_col)?;
    }

    // one series per point so each bubble is named in the legend
    for (n_point, point) in model.points.iter().enumerate() {
        let n_row = cast_row_num(n_point + 1)?;
        worksheet.write_string(n_row, N_COL_CHART_DATA, sanitize_xml_text(&point.label))?;
        worksheet.write_number(n_row, N_COL_CHART_DATA + 1, point.x)?;
        worksheet.write_number(n_row, N_COL_CHART_DATA + 2, point.y)?;

        let n_marker_size = (6.0 + 18.0 * point.size / n_size_max).round() as u8;
        let mut marker = ChartMarker::new();
        marker.set_type(ChartMarkerType::Circle).set_size(n_marker_size);
        if let Some(c_color) = style.and_then(|s| s.series_colors.get(n_point)) {
            marker.set_format(
                ChartFormat::new().set_solid_fill(ChartSolidFill::new().set_color(derive_hex_color(c_color).as_str())),
            );
        }

        chart
            .add_series()
            .set_name((sheet_name, n_row, N_COL_CHART_DATA))
            .set_categories((sheet_name, n_row, N_COL_CHART_DATA + 1, n_row, N_COL_CHART_DATA + 1))
            .set_values((sheet_name, n_row, N_COL_CHART_DATA + 2, n_row, N_COL_CHART_DATA + 2))
            .set_marker(&marker);
    }

    chart.show_hidden_data();
    Ok(chart)
}

/// Title, legend, size and axis titles; applied to every chart.
///
/// Chart text is cached verbatim in the chart part, so XML-illegal
/// characters are dropped first.
fn apply_chart_frame(chart: &mut Chart, model: &SpecChartModel) {
    chart
        .title()
        .set_name(sanitize_xml_text(&model.title).as_str())
        .set_font(ChartFont::new().set_name(C_FONT_TITLE).set_size(14).set_bold());
    chart
        .legend()
        .set_position(ChartLegendPosition::Bottom)
        .set_font(ChartFont::new().set_name(C_FONT_BODY).set_size(9));
    chart.set_width(N_CHART_WIDTH_PX).set_height(N_CHART_HEIGHT_PX);

    if let Some(c_name) = &model.x_axis_title {
        chart.x_axis().set_name(sanitize_xml_text(c_name).as_str());
    }
    if let Some(c_name) = &model.y_axis_title {
        chart.y_axis().set_name(sanitize_xml_text(c_name).as_str());
    }
    if model.kind == EnumChartKind::Line {
        chart.x_axis().set_label_position(ChartAxisLabelPosition::Low);
    }
}

/// Chart-type-specific axis styling.
fn apply_chart_axes(chart: &mut Chart, model: &SpecChartModel, style: &SpecChartStyle) {
    let y_axis = chart.y_axis();
    y_axis.set_font(ChartFont::new().set_name(C_FONT_BODY).set_size(9));
    if let Some(c_fmt) = &style.value_num_format {
        y_axis.set_num_format(c_fmt);
    }
    if let Some(n_unit) = style.value_major_unit {
        y_axis.set_major_unit(n_unit);
    }
    if let Some(n_min) = style.value_min {
        y_axis.set_min(n_min);
    }

    let x_axis = chart.x_axis();
    let mut font = ChartFont::new();
    font.set_name(C_FONT_BODY).set_size(9);
    if let Some(n_rotation) = style.category_label_rotation {
        font.set_rotation(n_rotation);
    }
    x_axis.set_font(&font);
    if let Some(c_fmt) = &style.category_num_format {
        x_axis.set_num_format(c_fmt);
    }
    if model.kind == EnumChartKind::Scatter {
        x_axis.set_min(0.0);
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Cells

fn derive_table_cell_format(
    cell: &SpecTableCell,
    if_alt: bool,
    fmt_text: &SpecCellFormat,
    fmt_number: &SpecCellFormat,
    currency_symbol: &str,
) -> Format {
    let mut cfg_fmt = match cell.align {
        EnumCellAlign::Right => fmt_number.clone(),
        EnumCellAlign::Left | EnumCellAlign::Center => fmt_text.clone(),
    };
    if cell.align == EnumCellAlign::Right {
        cfg_fmt.num_format = derive_xlsx_num_format(cell.tag, currency_symbol);
    }
    if if_alt {
        cfg_fmt.bg_color = Some(C_COLOR_ALT_ROW.to_string());
    }
    derive_rust_xlsx_format(&cfg_fmt)
}

fn write_table_cell(
    worksheet: &mut Worksheet,
    n_row: u32,
    n_col: u16,
    cell: &SpecTableCell,
    format: &Format,
) -> Result<(), XlsxError> {
    match cell.number {
        Some(n) => worksheet.write_number_with_format(n_row, n_col, n, format)?,
        None => worksheet.write_string_with_format(n_row, n_col, &cell.text, format)?,
    };
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if spec.italic.unwrap_or(false) {
        format = format.set_italic();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(derive_hex_color(val).as_str());
    }
    if let Some(val) = &spec.font_color {
        format = format.set_font_color(derive_hex_color(val).as_str());
    }

    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }
    if let Some(val) = &spec.border_color {
        format = format.set_border_color(derive_hex_color(val).as_str());
    }

    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        5 => FormatBorder::Thick,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

fn derive_hex_color(color: &str) -> String {
    format!("#{}", color.trim_start_matches('#'))
}

fn cast_row_num(value: usize) -> Result<u32, ReportError> {
    u32::try_from(value).map_err(|_| ReportError::Render(format!("row index overflow: {value}")))
}

fn cast_col_num(value: usize) -> Result<u16, ReportError> {
    u16::try_from(value).map_err(|_| ReportError::Render(format!("column index overflow: {value}")))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
