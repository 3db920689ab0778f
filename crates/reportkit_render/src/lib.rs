//! `reportkit_render` v1:
//! Report rendering kernel: dashboard payload -> XLSX workbook or PPTX deck.
//!
//! Layout:
//! - `conf`      : constants, keyword tables, brand palette and presets
//! - `spec`      : payload, chart, layout and report models
//! - `util`      : pure helper functions
//! - `normalize` : raw JSON -> typed payload with defaults
//! - `classify`  : header/title/sample -> number-format tag
//! - `chart`     : sheet -> chart model and styling
//! - `layout`    : table pagination and resolved grids
//! - `canvas`    : back-end trait
//! - `writer_*`  : workbook and deck back-ends
//! - `assemble`  : fixed page sequence with per-stage isolation
//! - `fallback`  : minimal error documents
pub mod assemble;
pub mod canvas;
pub mod chart;
pub mod classify;
pub mod conf;
pub mod error;
pub mod fallback;
pub mod layout;
pub mod normalize;
pub mod spec;
pub mod util;
pub mod writer_pptx;
pub mod writer_xlsx;

pub use assemble::{SpecRenderOptions, render_document, render_report};
pub use canvas::{ReportCanvas, create_canvas};
pub use chart::{build_chart_model, derive_chart_style};
pub use classify::classify;
pub use error::ReportError;
pub use fallback::render_error_document;
pub use layout::{generate_row_chunks, plan_table_pages};
pub use normalize::{
    derive_attachment_filename, derive_local_timestamp, normalize_payload, parse_payload,
};
pub use spec::{
    EnumCellValue, EnumChartKind, EnumDocumentKind, EnumFormatTag, EnumStageOutcome,
    SpecBrandAssets, SpecChartModel, SpecNormalizedPayload, SpecPaginationPolicy,
    SpecRenderReport, SpecRenderedDocument, SpecReportPayload, SpecSheet, SpecTablePage,
};
pub use writer_pptx::PptxCanvas;
pub use writer_xlsx::XlsxCanvas;
