//! Shared report specification models.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::conf::{C_MIME_PPTX, C_MIME_XLSX, V_BACKGROUND_PNG_EMBEDDED, V_LOGO_PNG_EMBEDDED};

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification for workbook cells.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Italic style.
    pub italic: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,
    /// Border color for all sides (hex, no `#`).
    pub border_color: Option<String>,
    /// Text wrap.
    pub text_wrap: Option<bool>,

    /// Number format code.
    pub num_format: Option<String>,
    /// Background fill color.
    pub bg_color: Option<String>,
    /// Font color.
    pub font_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            border_color: other
                .border_color
                .clone()
                .or_else(|| self.border_color.clone()),
            text_wrap: other.text_wrap.or(self.text_wrap),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
            font_color: other.font_color.clone().or_else(|| self.font_color.clone()),
        }
    }
}

/// Normalized cell value carried from the payload to the document.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value (JSON `null` or absent key).
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
}

/// Number-format tag resolved by the field classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnumFormatTag {
    /// Money amount in the payload currency.
    Currency,
    /// Ratio rendered as percentage.
    Percent,
    /// Count with thousands separators.
    Integer,
    /// No number formatting.
    Plain,
}

impl EnumFormatTag {
    /// Whether the tag applies a numeric display format.
    pub fn is_numeric(&self) -> bool {
        !matches!(self, EnumFormatTag::Plain)
    }
}

/// Horizontal alignment for a rendered table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumCellAlign {
    /// Text-like cells.
    Left,
    /// Header cells.
    Center,
    /// Numeric-formatted cells.
    Right,
}

/// One table cell after classification and formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecTableCell {
    /// Display text (deck output, fallback for workbook text cells).
    pub text: String,
    /// Numeric value kept for workbook cells.
    pub number: Option<f64>,
    /// Resolved format tag.
    pub tag: EnumFormatTag,
    /// Horizontal alignment.
    pub align: EnumCellAlign,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PayloadModel

/// Requested chart kind for one sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnumChartKind {
    /// Clustered column chart.
    #[default]
    Bar,
    /// Smoothed line chart.
    Line,
    /// Stacked column chart.
    Stacked,
    /// Positioning matrix of (x, y, size) points.
    Scatter,
}

/// One tabular section of the payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecSheet {
    /// Sheet name (also page label).
    pub name: String,
    /// Requested chart kind.
    pub chart_kind: EnumChartKind,
    /// Chart title; defaults to `name`.
    pub chart_title: String,
    /// Ordered header set shared by every row; `headers[0]` is the label key.
    pub headers: Vec<String>,
    /// Row values aligned with `headers`.
    pub rows: Vec<Vec<EnumCellValue>>,
}

impl SpecSheet {
    /// Number of data rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.headers.len()
    }
}

/// Executive summary block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecSummaryMetrics {
    pub total_models: f64,
    pub total_brands: f64,
    pub avg_price: f64,
    pub median_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub price_std_dev: f64,
    pub variation_coefficient: f64,
    pub avg_discount_pct: f64,
    /// Filters applied on the dashboard when the summary was computed.
    pub filters: BTreeMap<String, Vec<String>>,
}

/// Raw vehicle model record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecModelRecord {
    pub brand: String,
    pub model: String,
    pub submodel: String,
    pub estado: String,
    pub tipo_vehiculo: String,
    pub precio_con_bono: f64,
    pub precio_lista: f64,
    pub bono: f64,
}

impl SpecModelRecord {
    /// Bonus over list price; 0 when list price is not positive. Not clamped.
    pub fn discount_pct(&self) -> f64 {
        if self.precio_lista > 0.0 {
            self.bono / self.precio_lista
        } else {
            0.0
        }
    }
}

/// Typed report payload, built once per request and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecReportPayload {
    pub title: String,
    pub subtitle: Option<String>,
    pub currency_symbol: String,
    pub timezone_offset_hours: f64,
    /// Filters in payload order.
    pub filters: Vec<(String, Vec<String>)>,
    pub summary: Option<SpecSummaryMetrics>,
    pub models: Option<Vec<SpecModelRecord>>,
    pub sheets: Vec<SpecSheet>,
    /// Requested attachment filename.
    pub filename: Option<String>,
}

/// Normalizer output: typed payload plus defaulting diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecNormalizedPayload {
    pub payload: SpecReportPayload,
    pub warnings: Vec<String>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ChartModel

/// Coloring strategy; the two modes are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumColorMode {
    /// Distinct color per category (single-series composition/trend charts).
    VaryByCategory,
    /// Brand palette cycled by series index.
    SeriesPalette,
}

/// One named series; `None` is a gap.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecChartSeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// One scatter/bubble point.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecScatterPoint {
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

/// Chart derived from one sheet; consumed once by a back-end.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecChartModel {
    pub title: String,
    pub kind: EnumChartKind,
    pub categories: Vec<String>,
    pub series: Vec<SpecChartSeries>,
    /// Scatter points (only for [`EnumChartKind::Scatter`]).
    pub points: Vec<SpecScatterPoint>,
    pub color_mode: EnumColorMode,
    pub axis_format: EnumFormatTag,
    pub axis_major_unit: Option<f64>,
    pub if_data_labels: bool,
    /// Whether zeros were reinterpreted as gaps.
    pub if_time_evolution: bool,
    pub x_axis_title: Option<String>,
    pub y_axis_title: Option<String>,
    pub currency_symbol: String,
}

/// Chart-type-specific styling derived from a chart model.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecChartStyle {
    /// Value-axis number format (workbook syntax).
    pub value_num_format: Option<String>,
    /// Scatter x-axis number format.
    pub category_num_format: Option<String>,
    pub value_major_unit: Option<f64>,
    pub value_min: Option<f64>,
    /// Category label rotation in degrees.
    pub category_label_rotation: Option<i16>,
    pub if_data_labels: bool,
    /// Per-series colors (hex, no `#`).
    pub series_colors: Vec<String>,
    /// Per-category colors; non-empty only in vary-by-category mode.
    pub point_colors: Vec<String>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region LayoutSpecification

/// Pagination bounds for table pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecPaginationPolicy {
    /// Maximum body rows per page.
    pub rows_per_page: usize,
    /// Maximum data columns per page (label column excluded); `None` disables.
    pub cols_per_page: Option<usize>,
}

/// One bounded table page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecTablePage {
    /// Page title including continuation markers.
    pub title: String,
    /// Inclusive source row start.
    pub row_start_inclusive: usize,
    /// Exclusive source row end.
    pub row_end_exclusive: usize,
    /// Source column indices on this page, label column first.
    pub cols: Vec<usize>,
}

impl SpecTablePage {
    /// Number of body rows on the page.
    pub fn height(&self) -> usize {
        self.row_end_exclusive - self.row_start_inclusive
    }
}

/// Fully resolved table ready for a back-end.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecTableGrid {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<SpecTableCell>>,
    /// Relative column widths (workbook characters).
    pub widths: Vec<f64>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DocumentSpecification

/// Output container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnumDocumentKind {
    /// Spreadsheet workbook (`.xlsx`).
    Workbook,
    /// Slide deck (`.pptx`).
    Deck,
}

impl EnumDocumentKind {
    /// Response content type.
    pub fn content_type(&self) -> &'static str {
        match self {
            EnumDocumentKind::Workbook => C_MIME_XLSX,
            EnumDocumentKind::Deck => C_MIME_PPTX,
        }
    }

    /// File extension including the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            EnumDocumentKind::Workbook => ".xlsx",
            EnumDocumentKind::Deck => ".pptx",
        }
    }
}

/// Immutable brand images shared by every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecBrandAssets {
    pub logo_png: Vec<u8>,
    pub background_png: Vec<u8>,
}

impl Default for SpecBrandAssets {
    fn default() -> Self {
        Self {
            logo_png: V_LOGO_PNG_EMBEDDED.to_vec(),
            background_png: V_BACKGROUND_PNG_EMBEDDED.to_vec(),
        }
    }
}

/// Per-document header facts shown on cover/intro/summary pages.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecReportContext {
    pub title: String,
    pub subtitle: Option<String>,
    /// Local timestamp, already formatted.
    pub generated_at: String,
    pub currency_symbol: String,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Outcome of one assembler stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum EnumStageOutcome {
    /// Stage emitted `pages` pages.
    Rendered { pages: usize },
    /// Stage had nothing to emit.
    Skipped { reason: String },
    /// Stage failed; an error page took its place.
    Placeholder { diagnostic: String },
}

/// Named stage result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecStageResult {
    pub stage: String,
    #[serde(flatten)]
    pub outcome: EnumStageOutcome,
}

/// Per-request render report.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SpecRenderReport {
    /// Page labels in emission order.
    pub pages: Vec<String>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
    /// Stage outcomes in execution order.
    pub stages: Vec<SpecStageResult>,
}

impl SpecRenderReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }

    /// Number of stages that degraded into a placeholder.
    pub fn placeholder_count(&self) -> usize {
        self.stages
            .iter()
            .filter(|stage| matches!(stage.outcome, EnumStageOutcome::Placeholder { .. }))
            .count()
    }
}

/// Final document handed to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecRenderedDocument {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub filename: String,
    pub report: SpecRenderReport,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
