//! Report constants, keyword tables, brand palette and default preset factories.

use std::collections::BTreeMap;

use crate::spec::{EnumDocumentKind, SpecCellFormat, SpecPaginationPolicy};

////////////////////////////////////////////////////////////////////////////////
// #region DocumentLimits

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel sheet name maximum length; also the page label cap for decks.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];
/// Sheet names Excel reserves for itself (compared case-insensitively).
pub const TUP_EXCEL_RESERVED_SHEET_NAMES: [&str; 1] = ["History"];

/// Rows per table page in deck output.
pub const N_ROWS_PAGE_DECK: usize = 12;
/// Data columns (excluding the label column) per table page in deck output.
pub const N_COLS_PAGE_DECK: usize = 8;

/// Suffix appended to titles of row-continuation pages.
pub const C_CONTINUATION_MARKER: &str = " (Cont.)";

/// Spreadsheet workbook MIME type.
pub const C_MIME_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
/// Presentation deck MIME type.
pub const C_MIME_PPTX: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";
/// Last-resort plain text body.
pub const C_MIME_TEXT: &str = "text/plain; charset=utf-8";

/// Attachment stem when the request body cannot be parsed.
pub const C_FILENAME_STEM_PARSE_ERROR: &str = "Error_Report";
/// Attachment stem when rendering failed as a whole.
pub const C_FILENAME_STEM_CRITICAL: &str = "Critical_Error";
/// Page label of the standalone error document.
pub const C_ERROR_PAGE_LABEL: &str = "ERROR REPORT";
/// Error messages are cut to this many characters on the shorter retry.
pub const N_LEN_ERROR_MESSAGE_SHORT: usize = 200;

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PayloadDefaults

/// Default currency symbol.
pub const C_CURRENCY_DEFAULT: &str = "$";
/// Default timezone offset in hours (Chile, UTC-3).
pub const N_TIMEZONE_OFFSET_DEFAULT: f64 = -3.0;
/// Default report title.
pub const C_TITLE_DEFAULT: &str = "REPORTE DE DASHBOARD";
/// Title of the paginated raw-records table.
pub const C_MODELS_TABLE_TITLE: &str = "Detalle de Modelos";
/// Page label of the raw-records table.
pub const C_MODELS_PAGE_LABEL: &str = "Modelos";
/// Headers of the raw-records table, in column order.
pub const TUP_MODELS_HEADERS: [&str; 9] = [
    "Marca",
    "Modelo",
    "Versión",
    "Estado",
    "Tipo Vehículo",
    "Precio c/Bono",
    "Precio Lista",
    "Bono",
    "% Descuento",
];
/// Workbook column widths of the raw-records table.
pub const TUP_MODELS_WIDTHS: [f64; 9] = [15.0, 20.0, 25.0, 12.0, 15.0, 18.0, 18.0, 15.0, 15.0];

/// Summary metric labels, in display order.
pub const TUP_SUMMARY_LABELS: [&str; 9] = [
    "Total Modelos",
    "Total Marcas",
    "Precio Promedio",
    "Precio Mediano",
    "Precio Mínimo",
    "Precio Máximo",
    "Desviación Estándar",
    "Coef. Variación",
    "Descuento Promedio",
];
/// Summary filter rows: (label, filter key, fallback when empty).
pub const TUP_SUMMARY_FILTERS: [(&str, &str, &str); 3] = [
    ("Segmento:", "tipoVehiculo", "Todos"),
    ("Marca:", "brand", "Todas"),
    ("Modelo:", "model", "Todos"),
];

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TableAutofit

/// Minimum inferred column width.
pub const N_WIDTH_CELL_MIN: usize = 10;
/// Maximum inferred column width.
pub const N_WIDTH_CELL_MAX: usize = 50;
/// Padding added after width inference.
pub const N_WIDTH_CELL_PADDING: usize = 2;
/// Body rows inspected for width inference.
pub const N_HEIGHT_BODY_INFERRED_MAX: usize = 2_000;

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Brand

/// Table header fill / slide title color (slate 900).
pub const C_COLOR_DARK_BLUE: &str = "1E293B";
/// Cover background.
pub const C_COLOR_DEEP_NAVY: &str = "0D2841";
/// Secondary text (slate 600).
pub const C_COLOR_LIGHT_BLUE: &str = "475569";
/// Alternate body row fill.
pub const C_COLOR_ALT_ROW: &str = "F1F5F9";
/// Thin table border.
pub const C_COLOR_BORDER: &str = "E2E8F0";
/// Header foreground.
pub const C_COLOR_WHITE: &str = "FFFFFF";
/// Error text.
pub const C_COLOR_ERROR: &str = "DC2626";

/// Ordered brand palette cycled across series.
pub const TUP_BRAND_PALETTE: [&str; 8] = [
    "1E293B", "3B82F6", "64748B", "0EA5E9", "94A3B8", "0D2841", "60A5FA", "334155",
];

/// Body font.
pub const C_FONT_BODY: &str = "Avenir Medium";
/// Title font.
pub const C_FONT_TITLE: &str = "Avenir Black";

/// Logo bytes used when no logo path is configured.
pub static V_LOGO_PNG_EMBEDDED: &[u8] = include_bytes!("../assets/logo.png");
/// Intro background bytes used when no background path is configured.
pub static V_BACKGROUND_PNG_EMBEDDED: &[u8] = include_bytes!("../assets/background.png");

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ChartKeywords

/// Title keywords marking a time-evolution chart (0 means "no data").
pub const TUP_TITLE_EVOLUTION: [&str; 3] = ["evolución", "evolucion", "evolution"];
/// Title keywords selecting per-category coloring.
pub const TUP_TITLE_VARY_COLORS: [&str; 5] =
    ["composición", "composicion", "composition", "tendencia", "trend"];
/// Title keywords for composition (count) charts.
pub const TUP_TITLE_COMPOSITION: [&str; 3] = ["composición", "composicion", "composition"];
/// Title keywords for percent-axis charts.
pub const TUP_TITLE_PERCENT_AXIS: [&str; 8] = [
    "tendencia",
    "trend",
    "volatilidad",
    "volatility",
    "variación",
    "variacion",
    "variation",
    "share",
];
/// Title keywords for currency-axis charts.
pub const TUP_TITLE_CURRENCY_AXIS: [&str; 5] = ["precio", "price", "estructura", "matriz", "benchmark"];
/// Title keywords that turn on data labels.
pub const TUP_TITLE_DATA_LABELS: [&str; 5] = ["precio", "price", "estructura", "tendencia", "trend"];

/// Header tokens treated as metadata, never plotted.
pub const TUP_HEADER_METADATA_TOKENS: [&str; 15] = [
    "marca",
    "brand",
    "modelo",
    "model",
    "versión",
    "version",
    "submodelo",
    "submodel",
    "id",
    "imagen",
    "image",
    "img",
    "url",
    "logo",
    "foto",
];
/// Header tokens whose value disambiguates category labels.
pub const TUP_HEADER_CATEGORY_SUFFIX_TOKENS: [&str; 6] =
    ["modelo", "model", "versión", "version", "submodelo", "submodel"];
/// Scatter x-axis header keywords.
pub const TUP_HEADER_SCATTER_X: [&str; 3] = ["volumen", "volume", "cant"];
/// Scatter y-axis header keywords.
pub const TUP_HEADER_SCATTER_Y: [&str; 2] = ["precio", "price"];

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Presets

/// Build named cell format presets used by the workbook back-end.
pub fn derive_default_xlsx_formats() -> BTreeMap<String, SpecCellFormat> {
    let cfg_base_fmt_spec = SpecCellFormat {
        font_name: Some(C_FONT_BODY.to_string()),
        font_size: Some(10),
        border: Some(1),
        border_color: Some(C_COLOR_BORDER.to_string()),
        align: Some("left".to_string()),
        valign: Some("vcenter".to_string()),
        ..Default::default()
    };

    let mut dict_fmt = BTreeMap::new();
    dict_fmt.insert("text".to_string(), cfg_base_fmt_spec.clone());
    dict_fmt.insert(
        "number".to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            align: Some("right".to_string()),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        "header".to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            font_size: Some(11),
            bold: Some(true),
            align: Some("center".to_string()),
            bg_color: Some(C_COLOR_DARK_BLUE.to_string()),
            font_color: Some(C_COLOR_WHITE.to_string()),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        "title".to_string(),
        SpecCellFormat {
            font_name: Some(C_FONT_TITLE.to_string()),
            font_size: Some(16),
            bold: Some(true),
            ..Default::default()
        },
    );
    dict_fmt.insert(
        "subtitle".to_string(),
        SpecCellFormat {
            font_name: Some(C_FONT_BODY.to_string()),
            font_size: Some(10),
            italic: Some(true),
            font_color: Some("666666".to_string()),
            ..Default::default()
        },
    );
    dict_fmt.insert(
        "label".to_string(),
        SpecCellFormat {
            font_name: Some(C_FONT_BODY.to_string()),
            font_size: Some(10),
            bold: Some(true),
            ..Default::default()
        },
    );
    dict_fmt.insert(
        "error".to_string(),
        SpecCellFormat {
            font_name: Some(C_FONT_TITLE.to_string()),
            font_size: Some(14),
            bold: Some(true),
            font_color: Some(C_COLOR_ERROR.to_string()),
            ..Default::default()
        },
    );

    dict_fmt
}

/// Pagination policy for a document kind.
pub fn derive_default_pagination_policy(kind: EnumDocumentKind) -> SpecPaginationPolicy {
    match kind {
        EnumDocumentKind::Deck => SpecPaginationPolicy {
            rows_per_page: N_ROWS_PAGE_DECK,
            cols_per_page: Some(N_COLS_PAGE_DECK),
        },
        EnumDocumentKind::Workbook => SpecPaginationPolicy {
            rows_per_page: N_NROWS_EXCEL_MAX - 1,
            cols_per_page: None,
        },
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
