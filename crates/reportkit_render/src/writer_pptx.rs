//! Deck back-end: a PresentationML package written with `zip` and string XML.
//!
//! Slides, charts and media are buffered as XML fragments and only packaged in
//! [`ReportCanvas::finish`]. Charts embed their data as literals (`c:strLit`,
//! `c:numLit`) so no workbook part is needed.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Write};

use quick_xml::escape::escape;
use tracing::warn;
use zip::write::SimpleFileOptions;

use crate::canvas::ReportCanvas;
use crate::chart::derive_chart_style;
use crate::conf::{
    C_COLOR_ALT_ROW, C_COLOR_BORDER, C_COLOR_DARK_BLUE, C_COLOR_DEEP_NAVY, C_COLOR_ERROR,
    C_COLOR_LIGHT_BLUE, C_COLOR_WHITE, C_FONT_BODY, C_FONT_TITLE, TUP_BRAND_PALETTE,
    derive_default_pagination_policy,
};
use crate::error::ReportError;
use crate::spec::{
    EnumCellAlign, EnumChartKind, EnumDocumentKind, SpecBrandAssets, SpecChartModel,
    SpecChartStyle, SpecPaginationPolicy, SpecReportContext, SpecTableGrid,
};
use crate::util::{derive_unique_page_label, sanitize_xml_text};

const N_EMU_PER_INCH: f64 = 914_400.0;
/// 16:9 slide, 13.333 x 7.5 in.
const N_SLIDE_WIDTH_EMU: i64 = 12_192_000;
const N_SLIDE_HEIGHT_EMU: i64 = 6_858_000;

const N_LOGO_WIDTH_IN: f64 = 5.5;
const N_TABLE_ROW_HEIGHT_IN: f64 = 0.38;
/// Aspect ratio (height / width) used when an image is not a readable PNG.
const N_IMAGE_ASPECT_FALLBACK: f64 = 1.0 / 3.0;

const C_LANG: &str = "es-CL";

const C_NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const C_NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const C_NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const C_NS_C: &str = "http://schemas.openxmlformats.org/drawingml/2006/chart";
const C_NS_PKG_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

const C_REL_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
const C_REL_CHART: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart";
const C_REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

fn emu(n_inches: f64) -> i64 {
    (n_inches * N_EMU_PER_INCH).round() as i64
}

////////////////////////////////////////////////////////////////////////////////
// #region SlideModel

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EnumBrandImage {
    Logo,
    Background,
}

#[derive(Debug, Clone, Copy)]
enum EnumSlideRel {
    Chart(usize),
    Image(usize),
}

/// Position and size in EMU.
#[derive(Debug, Clone, Copy)]
struct SpecRect {
    x: i64,
    y: i64,
    cx: i64,
    cy: i64,
}

impl SpecRect {
    fn from_inches(x: f64, y: f64, cx: f64, cy: f64) -> Self {
        Self {
            x: emu(x),
            y: emu(y),
            cx: emu(cx),
            cy: emu(cy),
        }
    }

    fn xfrm(&self, tag: &str) -> String {
        format!(
            r#"<{tag}><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></{tag}>"#,
            self.x, self.y, self.cx, self.cy
        )
    }
}

/// One paragraph of a text box.
struct SpecTextLine<'a> {
    text: &'a str,
    n_size_pt: u32,
    bold: bool,
    color: &'a str,
    font: &'a str,
}

/// Escape markup and drop characters XML 1.0 cannot carry.
fn escape_text(text: &str) -> String {
    escape(sanitize_xml_text(text).as_str()).into_owned()
}

#[derive(Debug, Default)]
struct SpecSlide {
    background_color: Option<String>,
    l_shapes: Vec<String>,
    l_rels: Vec<EnumSlideRel>,
    if_hidden: bool,
}

impl SpecSlide {
    fn with_background(color: &str) -> Self {
        Self {
            background_color: Some(color.to_string()),
            ..Default::default()
        }
    }

    /// `rId1` is always the slide layout.
    fn add_rel(&mut self, rel: EnumSlideRel) -> String {
        self.l_rels.push(rel);
        format!("rId{}", self.l_rels.len() + 1)
    }

    fn next_shape_id(&self) -> usize {
        self.l_shapes.len() + 2
    }

    fn push_text_box(&mut self, rect: SpecRect, lines: &[SpecTextLine<'_>], align: &str) {
        let n_id = self.next_shape_id();
        let mut c_paragraphs = String::new();
        for line in lines {
            c_paragraphs.push_str(&format!(
                r#"<a:p><a:pPr algn="{align}"/><a:r>{}<a:t>{}</a:t></a:r></a:p>"#,
                create_run_properties(line.n_size_pt, line.bold, line.color, line.font),
                escape_text(line.text)
            ));
        }
        self.l_shapes.push(format!(
            concat!(
                r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="TextBox {id}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#,
                r#"<p:spPr>{xfrm}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>"#,
                r#"<p:txBody><a:bodyPr wrap="square" rtlCol="0"><a:normAutofit/></a:bodyPr><a:lstStyle/>{paragraphs}</p:txBody></p:sp>"#
            ),
            id = n_id,
            xfrm = rect.xfrm("a:xfrm"),
            paragraphs = c_paragraphs
        ));
    }

    fn push_title(&mut self, title: &str) {
        self.push_text_box(
            SpecRect::from_inches(0.5, 0.3, 12.3, 0.8),
            &[SpecTextLine {
                text: title,
                n_size_pt: 28,
                bold: true,
                color: C_COLOR_DARK_BLUE,
                font: C_FONT_TITLE,
            }],
            "l",
        );
    }

    fn push_picture(&mut self, rect: SpecRect, n_image: usize) {
        let n_id = self.next_shape_id();
        let c_rel_id = self.add_rel(EnumSlideRel::Image(n_image));
        self.l_shapes.push(format!(
            concat!(
                r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="Picture {id}"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>"#,
                r#"<p:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>"#,
                r#"<p:spPr>{xfrm}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#
            ),
            id = n_id,
            rel = c_rel_id,
            xfrm = rect.xfrm("a:xfrm")
        ));
    }

    fn push_chart_frame(&mut self, rect: SpecRect, n_chart: usize) {
        let n_id = self.next_shape_id();
        let c_rel_id = self.add_rel(EnumSlideRel::Chart(n_chart));
        self.l_shapes.push(format!(
            concat!(
                r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="{id}" name="Chart {id}"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr>"#,
                r#"{xfrm}<a:graphic><a:graphicData uri="{ns_c}"><c:chart xmlns:c="{ns_c}" r:id="{rel}"/></a:graphicData></a:graphic></p:graphicFrame>"#
            ),
            id = n_id,
            xfrm = rect.xfrm("p:xfrm"),
            ns_c = C_NS_C,
            rel = c_rel_id
        ));
    }

    fn push_table(&mut self, rect: SpecRect, grid: &SpecTableGrid) {
        let n_id = self.next_shape_id();
        let n_row_height = emu(N_TABLE_ROW_HEIGHT_IN);
        let n_height = n_row_height * (grid.rows.len() as i64 + 1);

        let n_width_total: f64 = grid.widths.iter().sum();
        let mut c_grid_cols = String::new();
        for n_width in &grid.widths {
            let n_col_emu = if n_width_total > 0.0 {
                (rect.cx as f64 * n_width / n_width_total).round() as i64
            } else {
                rect.cx / grid.widths.len().max(1) as i64
            };
            c_grid_cols.push_str(&format!(r#"<a:gridCol w="{n_col_emu}"/>"#));
        }

        let mut c_rows = format!(r#"<a:tr h="{n_row_height}">"#);
        for header in &grid.headers {
            c_rows.push_str(&create_table_cell_xml(
                header,
                "ctr",
                11,
                true,
                C_COLOR_WHITE,
                C_COLOR_DARK_BLUE,
            ));
        }
        c_rows.push_str("</a:tr>");
        for (n_row, row) in grid.rows.iter().enumerate() {
            let c_fill = if n_row % 2 == 1 { C_COLOR_ALT_ROW } else { C_COLOR_WHITE };
            c_rows.push_str(&format!(r#"<a:tr h="{n_row_height}">"#));
            for cell in row {
                let c_align = match cell.align {
                    EnumCellAlign::Left => "l",
                    EnumCellAlign::Center => "ctr",
                    EnumCellAlign::Right => "r",
                };
                c_rows.push_str(&create_table_cell_xml(
                    &cell.text,
                    c_align,
                    10,
                    false,
                    C_COLOR_DARK_BLUE,
                    c_fill,
                ));
            }
            c_rows.push_str("</a:tr>");
        }

        let rect_frame = SpecRect { cy: n_height, ..rect };
        self.l_shapes.push(format!(
            concat!(
                r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="{id}" name="Table {id}"/><p:cNvGraphicFramePr><a:graphicFrameLocks noGrp="1"/></p:cNvGraphicFramePr><p:nvPr/></p:nvGraphicFramePr>"#,
                r#"{xfrm}<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table">"#,
                r#"<a:tbl><a:tblPr firstRow="1" bandRow="1"/><a:tblGrid>{cols}</a:tblGrid>{rows}</a:tbl>"#,
                r#"</a:graphicData></a:graphic></p:graphicFrame>"#
            ),
            id = n_id,
            xfrm = rect_frame.xfrm("p:xfrm"),
            cols = c_grid_cols,
            rows = c_rows
        ));
    }

    fn create_xml(&self) -> String {
        let c_background = self
            .background_color
            .as_ref()
            .map(|color| {
                format!(
                    r#"<p:bg><p:bgPr><a:solidFill><a:srgbClr val="{color}"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>"#
                )
            })
            .unwrap_or_default();
        let c_show = if self.if_hidden { r#" show="0""# } else { "" };
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<p:sld xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}"{show}><p:cSld>{bg}<p:spTree>"#,
                r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
                r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#,
                r#"{shapes}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#
            ),
            a = C_NS_A,
            r = C_NS_R,
            p = C_NS_P,
            show = c_show,
            bg = c_background,
            shapes = self.l_shapes.concat()
        )
    }

    fn create_rels_xml(&self) -> String {
        let mut c_rels = format!(
            r#"<Relationship Id="rId1" Type="{C_REL_SLIDE_LAYOUT}" Target="../slideLayouts/slideLayout1.xml"/>"#
        );
        for (n_idx, rel) in self.l_rels.iter().enumerate() {
            let (c_type, c_target) = match rel {
                EnumSlideRel::Chart(n) => (C_REL_CHART, format!("../charts/chart{n}.xml")),
                EnumSlideRel::Image(n) => (C_REL_IMAGE, format!("../media/image{n}.png")),
            };
            c_rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="{c_type}" Target="{c_target}"/>"#,
                n_idx + 2
            ));
        }
        create_relationships_xml(&c_rels)
    }
}

fn create_run_properties(n_size_pt: u32, bold: bool, color: &str, font: &str) -> String {
    format!(
        r#"<a:rPr lang="{C_LANG}" sz="{}" b="{}" dirty="0"><a:solidFill><a:srgbClr val="{color}"/></a:solidFill><a:latin typeface="{}"/></a:rPr>"#,
        n_size_pt * 100,
        u8::from(bold),
        escape_text(font)
    )
}

fn create_table_cell_xml(
    text: &str,
    align: &str,
    n_size_pt: u32,
    bold: bool,
    font_color: &str,
    fill_color: &str,
) -> String {
    let c_border = |tag: &str| {
        format!(
            r#"<a:{tag} w="6350"><a:solidFill><a:srgbClr val="{C_COLOR_BORDER}"/></a:solidFill></a:{tag}>"#
        )
    };
    format!(
        concat!(
            r#"<a:tc><a:txBody><a:bodyPr/><a:lstStyle/><a:p><a:pPr algn="{align}"/><a:r>{rpr}<a:t>{text}</a:t></a:r></a:p></a:txBody>"#,
            r#"<a:tcPr marL="45720" marR="45720" anchor="ctr">{l}{r}{t}{b}<a:solidFill><a:srgbClr val="{fill}"/></a:solidFill></a:tcPr></a:tc>"#
        ),
        align = align,
        rpr = create_run_properties(n_size_pt, bold, font_color, C_FONT_BODY),
        text = escape_text(text),
        l = c_border("lnL"),
        r = c_border("lnR"),
        t = c_border("lnT"),
        b = c_border("lnB"),
        fill = fill_color
    )
}

fn create_relationships_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{C_NS_PKG_RELS}">{body}</Relationships>"#
    )
}

/// Pixel size from a PNG `IHDR` chunk.
fn derive_png_size(v_png: &[u8]) -> Option<(u32, u32)> {
    if v_png.len() < 24 || &v_png[..8] != b"\x89PNG\r\n\x1a\n" {
        return None;
    }
    let n_width = u32::from_be_bytes(v_png[16..20].try_into().ok()?);
    let n_height = u32::from_be_bytes(v_png[20..24].try_into().ok()?);
    (n_width > 0 && n_height > 0).then_some((n_width, n_height))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Canvas

/// Stateful deck canvas.
pub struct PptxCanvas {
    context: SpecReportContext,
    assets: SpecBrandAssets,
    l_slides: Vec<SpecSlide>,
    l_charts: Vec<String>,
    l_images: Vec<Vec<u8>>,
    dict_image_index: BTreeMap<EnumBrandImage, usize>,
    set_labels_existing: BTreeSet<String>,
    n_covers: usize,
    l_warnings: Vec<String>,
    if_finished: bool,
}

impl PptxCanvas {
    pub fn new(context: SpecReportContext, assets: &SpecBrandAssets) -> Self {
        Self {
            context,
            assets: assets.clone(),
            l_slides: Vec::new(),
            l_charts: Vec::new(),
            l_images: Vec::new(),
            dict_image_index: BTreeMap::new(),
            set_labels_existing: BTreeSet::new(),
            n_covers: 0,
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

    fn push_slide(&mut self, label: &str, slide: SpecSlide) -> Vec<String> {
        let c_label = derive_unique_page_label(&mut self.set_labels_existing, label);
        self.l_slides.push(slide);
        vec![c_label]
    }

    /// Media index of a brand image, 1-based; each image is stored once.
    fn register_image(&mut self, image: EnumBrandImage) -> usize {
        if let Some(n_idx) = self.dict_image_index.get(&image) {
            return *n_idx;
        }
        let v_bytes = match image {
            EnumBrandImage::Logo => self.assets.logo_png.clone(),
            EnumBrandImage::Background => self.assets.background_png.clone(),
        };
        self.l_images.push(v_bytes);
        let n_idx = self.l_images.len();
        self.dict_image_index.insert(image, n_idx);
        n_idx
    }

    fn derive_image_aspect(&mut self, image: EnumBrandImage) -> f64 {
        let v_bytes = match image {
            EnumBrandImage::Logo => &self.assets.logo_png,
            EnumBrandImage::Background => &self.assets.background_png,
        };
        match derive_png_size(v_bytes) {
            Some((n_width, n_height)) => n_height as f64 / n_width as f64,
            None => {
                warn!(image = ?image, "brand image is not a readable PNG; using fallback aspect");
                self.l_warnings
                    .push(format!("brand image {image:?} is not a readable PNG"));
                N_IMAGE_ASPECT_FALLBACK
            }
        }
    }

    fn create_filter_lines_box(slide: &mut SpecSlide, rect: SpecRect, filter_lines: &[(String, String)]) {
        let l_texts: Vec<String> = filter_lines
            .iter()
            .map(|(c_label, c_value)| format!("{c_label} {c_value}"))
            .collect();
        let mut l_lines = vec![SpecTextLine {
            text: "Filtros Aplicados",
            n_size_pt: 16,
            bold: true,
            color: C_COLOR_DARK_BLUE,
            font: C_FONT_TITLE,
        }];
        l_lines.extend(l_texts.iter().map(|c_text| SpecTextLine {
            text: c_text,
            n_size_pt: 12,
            bold: false,
            color: C_COLOR_LIGHT_BLUE,
            font: C_FONT_BODY,
        }));
        slide.push_text_box(rect, &l_lines, "l");
    }

    fn create_package(&self) -> Result<Vec<u8>, ReportError> {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buffer);
            let options =
                SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

            zip.start_file("[Content_Types].xml", options)?;
            zip.write_all(self.create_content_types_xml().as_bytes())?;

            zip.start_file("_rels/.rels", options)?;
            zip.write_all(create_root_rels_xml().as_bytes())?;

            zip.start_file("docProps/core.xml", options)?;
            zip.write_all(create_core_xml(&self.context.title).as_bytes())?;

            zip.start_file("docProps/app.xml", options)?;
            zip.write_all(create_app_xml(self.l_slides.len()).as_bytes())?;

            zip.start_file("ppt/presentation.xml", options)?;
            zip.write_all(self.create_presentation_xml().as_bytes())?;

            zip.start_file("ppt/_rels/presentation.xml.rels", options)?;
            zip.write_all(self.create_presentation_rels_xml().as_bytes())?;

            for (c_path, c_xml) in [
                ("ppt/presProps.xml", create_pres_props_xml()),
                ("ppt/viewProps.xml", create_view_props_xml()),
                ("ppt/tableStyles.xml", create_table_styles_xml()),
                ("ppt/slideMasters/slideMaster1.xml", create_slide_master_xml()),
                ("ppt/slideMasters/_rels/slideMaster1.xml.rels", create_slide_master_rels_xml()),
                ("ppt/slideLayouts/slideLayout1.xml", create_slide_layout_xml()),
                ("ppt/slideLayouts/_rels/slideLayout1.xml.rels", create_slide_layout_rels_xml()),
                ("ppt/theme/theme1.xml", create_theme_xml()),
            ] {
                zip.start_file(c_path, options)?;
                zip.write_all(c_xml.as_bytes())?;
            }

            for (n_idx, slide) in self.l_slides.iter().enumerate() {
                zip.start_file(format!("ppt/slides/slide{}.xml", n_idx + 1), options)?;
                zip.write_all(slide.create_xml().as_bytes())?;
                zip.start_file(format!("ppt/slides/_rels/slide{}.xml.rels", n_idx + 1), options)?;
                zip.write_all(slide.create_rels_xml().as_bytes())?;
            }
            for (n_idx, c_chart) in self.l_charts.iter().enumerate() {
                zip.start_file(format!("ppt/charts/chart{}.xml", n_idx + 1), options)?;
                zip.write_all(c_chart.as_bytes())?;
            }
            for (n_idx, v_image) in self.l_images.iter().enumerate() {
                zip.start_file(format!("ppt/media/image{}.png", n_idx + 1), options)?;
                zip.write_all(v_image)?;
            }

            zip.finish()?;
        }
        Ok(buffer.into_inner())
    }

    fn create_content_types_xml(&self) -> String {
        let mut c_overrides = String::new();
        let mut push_override = |c_part: &str, c_type: &str| {
            c_overrides.push_str(&format!(
                r#"<Override PartName="{c_part}" ContentType="{c_type}"/>"#
            ));
        };
        push_override(
            "/ppt/presentation.xml",
            "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml",
        );
        push_override(
            "/ppt/slideMasters/slideMaster1.xml",
            "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml",
        );
        push_override(
            "/ppt/slideLayouts/slideLayout1.xml",
            "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml",
        );
        push_override("/ppt/theme/theme1.xml", "application/vnd.openxmlformats-officedocument.theme+xml");
        push_override(
            "/ppt/presProps.xml",
            "application/vnd.openxmlformats-officedocument.presentationml.presProps+xml",
        );
        push_override(
            "/ppt/viewProps.xml",
            "application/vnd.openxmlformats-officedocument.presentationml.viewProps+xml",
        );
        push_override(
            "/ppt/tableStyles.xml",
            "application/vnd.openxmlformats-officedocument.presentationml.tableStyles+xml",
        );
        push_override("/docProps/core.xml", "application/vnd.openxmlformats-package.core-properties+xml");
        push_override(
            "/docProps/app.xml",
            "application/vnd.openxmlformats-officedocument.extended-properties+xml",
        );
        for n_idx in 1..=self.l_slides.len() {
            push_override(
                &format!("/ppt/slides/slide{n_idx}.xml"),
                "application/vnd.openxmlformats-officedocument.presentationml.slide+xml",
            );
        }
        for n_idx in 1..=self.l_charts.len() {
            push_override(
                &format!("/ppt/charts/chart{n_idx}.xml"),
                "application/vnd.openxmlformats-officedocument.drawingml.chart+xml",
            );
        }

        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
                r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
                r#"<Default Extension="xml" ContentType="application/xml"/>"#,
                r#"<Default Extension="png" ContentType="image/png"/>"#,
                r#"{overrides}</Types>"#
            ),
            overrides = c_overrides
        )
    }

    fn create_presentation_xml(&self) -> String {
        let c_slide_ids = if self.l_slides.is_empty() {
            String::new()
        } else {
            let c_ids: String = (0..self.l_slides.len())
                .map(|n_idx| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + n_idx, 6 + n_idx))
                .collect();
            format!("<p:sldIdLst>{c_ids}</p:sldIdLst>")
        };
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<p:presentation xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}" saveSubsetFonts="1">"#,
                r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>{ids}"#,
                r#"<p:sldSz cx="{cx}" cy="{cy}"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#
            ),
            a = C_NS_A,
            r = C_NS_R,
            p = C_NS_P,
            ids = c_slide_ids,
            cx = N_SLIDE_WIDTH_EMU,
            cy = N_SLIDE_HEIGHT_EMU
        )
    }

    fn create_presentation_rels_xml(&self) -> String {
        let c_base = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
        let mut c_rels = format!(
            concat!(
                r#"<Relationship Id="rId1" Type="{b}/slideMaster" Target="slideMasters/slideMaster1.xml"/>"#,
                r#"<Relationship Id="rId2" Type="{b}/presProps" Target="presProps.xml"/>"#,
                r#"<Relationship Id="rId3" Type="{b}/viewProps" Target="viewProps.xml"/>"#,
                r#"<Relationship Id="rId4" Type="{b}/theme" Target="theme/theme1.xml"/>"#,
                r#"<Relationship Id="rId5" Type="{b}/tableStyles" Target="tableStyles.xml"/>"#
            ),
            b = c_base
        );
        for n_idx in 0..self.l_slides.len() {
            c_rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="{c_base}/slide" Target="slides/slide{}.xml"/>"#,
                6 + n_idx,
                n_idx + 1
            ));
        }
        create_relationships_xml(&c_rels)
    }
}

impl ReportCanvas for PptxCanvas {
    fn kind(&self) -> EnumDocumentKind {
        EnumDocumentKind::Deck
    }

    fn pagination_policy(&self) -> SpecPaginationPolicy {
        derive_default_pagination_policy(EnumDocumentKind::Deck)
    }

    fn add_cover(&mut self) -> Result<Vec<String>, ReportError> {
        self.ensure_open()?;
        let n_aspect = self.derive_image_aspect(EnumBrandImage::Logo);
        let n_image = self.register_image(EnumBrandImage::Logo);

        let n_slide_width_in = N_SLIDE_WIDTH_EMU as f64 / N_EMU_PER_INCH;
        let n_slide_height_in = N_SLIDE_HEIGHT_EMU as f64 / N_EMU_PER_INCH;
        let n_logo_height_in = N_LOGO_WIDTH_IN * n_aspect;
        let mut slide = SpecSlide::with_background(C_COLOR_DEEP_NAVY);
        slide.push_picture(
            SpecRect::from_inches(
                (n_slide_width_in - N_LOGO_WIDTH_IN) / 2.0,
                (n_slide_height_in - n_logo_height_in) / 2.0,
                N_LOGO_WIDTH_IN,
                n_logo_height_in,
            ),
            n_image,
        );

        self.n_covers += 1;
        let c_label = if self.n_covers == 1 { "Portada" } else { "Cierre" };
        Ok(self.push_slide(c_label, slide))
    }

    fn add_intro(&mut self) -> Result<Vec<String>, ReportError> {
        self.ensure_open()?;
        let n_image = self.register_image(EnumBrandImage::Background);
        let mut slide = SpecSlide::default();
        slide.push_picture(
            SpecRect {
                x: 0,
                y: 0,
                cx: N_SLIDE_WIDTH_EMU,
                cy: N_SLIDE_HEIGHT_EMU,
            },
            n_image,
        );
        slide.push_text_box(
            SpecRect::from_inches(0.8, 2.8, 11.7, 1.2),
            &[SpecTextLine {
                text: &self.context.title,
                n_size_pt: 40,
                bold: true,
                color: "000000",
                font: C_FONT_TITLE,
            }],
            "l",
        );
        let c_generated = format!("Generado: {}", self.context.generated_at);
        let mut l_lines = Vec::new();
        if let Some(c_subtitle) = &self.context.subtitle {
            l_lines.push(SpecTextLine {
                text: c_subtitle,
                n_size_pt: 20,
                bold: false,
                color: C_COLOR_DARK_BLUE,
                font: C_FONT_BODY,
            });
        }
        l_lines.push(SpecTextLine {
            text: &c_generated,
            n_size_pt: 16,
            bold: false,
            color: C_COLOR_LIGHT_BLUE,
            font: C_FONT_BODY,
        });
        slide.push_text_box(SpecRect::from_inches(0.8, 4.0, 11.7, 1.0), &l_lines, "l");
        Ok(self.push_slide("Introducción", slide))
    }

    fn add_summary(
        &mut self,
        grid: &SpecTableGrid,
        filter_lines: &[(String, String)],
    ) -> Result<Vec<String>, ReportError> {
        self.ensure_open()?;
        let mut slide = SpecSlide::default();
        slide.push_title(&grid.title);
        slide.push_table(SpecRect::from_inches(0.5, 1.3, 6.4, 0.0), grid);
        if !filter_lines.is_empty() {
            Self::create_filter_lines_box(&mut slide, SpecRect::from_inches(7.4, 1.3, 5.4, 3.0), filter_lines);
        }
        Ok(self.push_slide(&grid.title, slide))
    }

    fn add_info(&mut self, filter_lines: &[(String, String)]) -> Result<Vec<String>, ReportError> {
        self.ensure_open()?;
        let mut slide = SpecSlide::default();
        slide.push_title("Información");
        slide.push_text_box(
            SpecRect::from_inches(0.5, 1.2, 12.3, 0.5),
            &[SpecTextLine {
                text: &format!("Generado: {}", self.context.generated_at),
                n_size_pt: 14,
                bold: false,
                color: C_COLOR_LIGHT_BLUE,
                font: C_FONT_BODY,
            }],
            "l",
        );
        if !filter_lines.is_empty() {
            Self::create_filter_lines_box(&mut slide, SpecRect::from_inches(0.5, 2.0, 12.3, 4.0), filter_lines);
        }
        Ok(self.push_slide("Información", slide))
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

        self.l_charts.push(create_chart_xml(model, style.as_ref()));
        let n_chart = self.l_charts.len();

        let mut slide = SpecSlide::default();
        slide.push_title(label);
        slide.push_chart_frame(SpecRect::from_inches(0.5, 1.2, 12.3, 5.9), n_chart);
        Ok(self.push_slide(&format!("Gráfico {label}"), slide))
    }

    fn add_table_page(
        &mut self,
        label: &str,
        grid: &SpecTableGrid,
    ) -> Result<Vec<String>, ReportError> {
        self.ensure_open()?;
        let mut slide = SpecSlide::default();
        slide.push_title(&grid.title);
        slide.push_table(SpecRect::from_inches(0.5, 1.2, 12.3, 0.0), grid);
        Ok(self.push_slide(label, slide))
    }

    fn add_error_page(
        &mut self,
        label: &str,
        heading: &str,
        message: &str,
    ) -> Result<Vec<String>, ReportError> {
        self.ensure_open()?;
        let mut slide = SpecSlide::default();
        slide.push_text_box(
            SpecRect::from_inches(0.5, 0.3, 12.3, 0.8),
            &[SpecTextLine {
                text: heading,
                n_size_pt: 28,
                bold: true,
                color: C_COLOR_ERROR,
                font: C_FONT_TITLE,
            }],
            "l",
        );
        slide.push_text_box(
            SpecRect::from_inches(0.5, 1.4, 12.3, 5.6),
            &[SpecTextLine {
                text: message,
                n_size_pt: 14,
                bold: false,
                color: C_COLOR_DARK_BLUE,
                font: C_FONT_BODY,
            }],
            "l",
        );
        Ok(self.push_slide(label, slide))
    }

    /// Hidden trailing slide; it is not a report page and gets no label.
    fn add_debug_log(&mut self, lines: &[String]) -> Result<(), ReportError> {
        self.ensure_open()?;
        let mut slide = SpecSlide {
            if_hidden: true,
            ..Default::default()
        };
        slide.push_title("DEBUG LOG");
        let l_lines: Vec<SpecTextLine<'_>> = lines
            .iter()
            .map(|c_line| SpecTextLine {
                text: c_line.as_str(),
                n_size_pt: 9,
                bold: false,
                color: C_COLOR_DARK_BLUE,
                font: C_FONT_BODY,
            })
            .collect();
        if !l_lines.is_empty() {
            slide.push_text_box(SpecRect::from_inches(0.5, 1.2, 12.3, 6.0), &l_lines, "l");
        }
        self.l_slides.push(slide);
        Ok(())
    }

    fn drain_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.l_warnings)
    }

    fn finish(&mut self) -> Result<Vec<u8>, ReportError> {
        self.ensure_open()?;
        let v_bytes = self.create_package()?;
        self.if_finished = true;
        Ok(v_bytes)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ChartXml

fn create_chart_xml(model: &SpecChartModel, style: Option<&SpecChartStyle>) -> String {
    let c_plot = match model.kind {
        EnumChartKind::Scatter => create_bubble_plot_xml(model, style),
        EnumChartKind::Line => create_line_plot_xml(model, style),
        EnumChartKind::Bar | EnumChartKind::Stacked => create_bar_plot_xml(model, style),
    };
    let c_axes = match model.kind {
        EnumChartKind::Scatter => format!(
            "{}{}",
            create_value_axis_xml(1, 2, "b", model.x_axis_title.as_deref(), style.and_then(|s| s.category_num_format.as_deref()), Some(0.0), None, false),
            create_value_axis_xml(2, 1, "l", model.y_axis_title.as_deref(), style.and_then(|s| s.value_num_format.as_deref()), style.and_then(|s| s.value_min), None, true),
        ),
        _ => format!(
            "{}{}",
            create_category_axis_xml(model, style),
            create_value_axis_xml(
                2,
                1,
                "l",
                model.y_axis_title.as_deref(),
                style.and_then(|s| s.value_num_format.as_deref()),
                style.and_then(|s| s.value_min),
                style.and_then(|s| s.value_major_unit),
                true,
            ),
        ),
    };

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<c:chartSpace xmlns:c="{c}" xmlns:a="{a}" xmlns:r="{r}">"#,
            r#"<c:date1904 val="0"/><c:lang val="{lang}"/><c:roundedCorners val="0"/>"#,
            r#"<c:chart>{title}<c:autoTitleDeleted val="0"/><c:plotArea><c:layout/>{plot}{axes}</c:plotArea>"#,
            r#"<c:legend><c:legendPos val="b"/><c:overlay val="0"/>{legend_tx}</c:legend>"#,
            r#"<c:plotVisOnly val="1"/><c:dispBlanksAs val="gap"/></c:chart>"#,
            r#"<c:txPr><a:bodyPr/><a:lstStyle/><a:p><a:pPr><a:defRPr><a:latin typeface="{font}"/></a:defRPr></a:pPr><a:endParaRPr lang="{lang}"/></a:p></c:txPr>"#,
            r#"</c:chartSpace>"#
        ),
        c = C_NS_C,
        a = C_NS_A,
        r = C_NS_R,
        lang = C_LANG,
        title = create_chart_title_xml(&model.title, 14, true, C_FONT_TITLE),
        plot = c_plot,
        axes = c_axes,
        legend_tx = create_text_properties_xml(9, None),
        font = escape_text(C_FONT_BODY)
    )
}

fn create_chart_title_xml(text: &str, n_size_pt: u32, bold: bool, font: &str) -> String {
    format!(
        concat!(
            r#"<c:title><c:tx><c:rich><a:bodyPr/><a:lstStyle/><a:p><a:pPr><a:defRPr sz="{sz}" b="{b}"/></a:pPr>"#,
            r#"<a:r><a:rPr lang="{lang}" sz="{sz}" b="{b}"><a:latin typeface="{font}"/></a:rPr><a:t>{text}</a:t></a:r></a:p></c:rich></c:tx>"#,
            r#"<c:overlay val="0"/></c:title>"#
        ),
        sz = n_size_pt * 100,
        b = u8::from(bold),
        lang = C_LANG,
        font = escape_text(font),
        text = escape_text(text)
    )
}

/// `c:txPr` with a font size and optional rotation in degrees.
fn create_text_properties_xml(n_size_pt: u32, rotation: Option<i16>) -> String {
    let c_rot = rotation
        .map(|n_deg| format!(r#" rot="{}" vert="horz""#, i64::from(n_deg) * 60_000))
        .unwrap_or_default();
    format!(
        r#"<c:txPr><a:bodyPr{c_rot}/><a:lstStyle/><a:p><a:pPr><a:defRPr sz="{}"/></a:pPr><a:endParaRPr lang="{C_LANG}"/></a:p></c:txPr>"#,
        n_size_pt * 100
    )
}

fn create_num_format_xml(format_code: Option<&str>) -> String {
    format!(
        r#"<c:numFmt formatCode="{}" sourceLinked="0"/>"#,
        escape_text(format_code.unwrap_or("General"))
    )
}

fn create_solid_fill_xml(color: &str) -> String {
    format!(r#"<a:solidFill><a:srgbClr val="{color}"/></a:solidFill>"#)
}

fn create_str_literal_xml(values: &[String]) -> String {
    let c_points: String = values
        .iter()
        .enumerate()
        .map(|(n_idx, c_value)| format!(r#"<c:pt idx="{n_idx}"><c:v>{}</c:v></c:pt>"#, escape_text(c_value.as_str())))
        .collect();
    format!(
        r#"<c:strLit><c:ptCount val="{}"/>{c_points}</c:strLit>"#,
        values.len()
    )
}

/// Gaps and non-finite values are left out of the literal.
fn create_num_literal_xml(values: &[Option<f64>]) -> String {
    let c_points: String = values
        .iter()
        .enumerate()
        .filter_map(|(n_idx, value)| {
            value
                .filter(|x| x.is_finite())
                .map(|x| format!(r#"<c:pt idx="{n_idx}"><c:v>{x}</c:v></c:pt>"#))
        })
        .collect();
    format!(
        r#"<c:numLit><c:formatCode>General</c:formatCode><c:ptCount val="{}"/>{c_points}</c:numLit>"#,
        values.len()
    )
}

fn create_data_labels_xml(style: &SpecChartStyle, position: &str, font_color: Option<&str>) -> String {
    let c_fill = font_color.map(create_solid_fill_xml).unwrap_or_default();
    format!(
        concat!(
            r#"<c:dLbls>{num_fmt}<c:spPr><a:noFill/><a:ln><a:noFill/></a:ln></c:spPr>"#,
            r#"<c:txPr><a:bodyPr/><a:lstStyle/><a:p><a:pPr><a:defRPr sz="800">{fill}</a:defRPr></a:pPr><a:endParaRPr lang="{lang}"/></a:p></c:txPr>"#,
            r#"<c:dLblPos val="{pos}"/><c:showLegendKey val="0"/><c:showVal val="1"/><c:showCatName val="0"/>"#,
            r#"<c:showSerName val="0"/><c:showPercent val="0"/><c:showBubbleSize val="0"/></c:dLbls>"#
        ),
        num_fmt = create_num_format_xml(style.value_num_format.as_deref()),
        fill = c_fill,
        lang = C_LANG,
        pos = position
    )
}

fn create_bar_plot_xml(model: &SpecChartModel, style: Option<&SpecChartStyle>) -> String {
    let if_stacked = model.kind == EnumChartKind::Stacked;
    let if_vary = style.is_some_and(|s| !s.point_colors.is_empty());

    let mut c_series = String::new();
    for (n_idx, series) in model.series.iter().enumerate() {
        c_series.push_str(&format!(
            r#"<c:ser><c:idx val="{n_idx}"/><c:order val="{n_idx}"/><c:tx><c:v>{}</c:v></c:tx>"#,
            escape_text(series.name.as_str())
        ));
        if let Some(c_color) = style.and_then(|s| s.series_colors.get(n_idx)) {
            c_series.push_str(&format!("<c:spPr>{}</c:spPr>", create_solid_fill_xml(c_color)));
        }
        c_series.push_str(r#"<c:invertIfNegative val="0"/>"#);
        if let Some(style) = style {
            for (n_point, c_color) in style.point_colors.iter().enumerate() {
                c_series.push_str(&format!(
                    r#"<c:dPt><c:idx val="{n_point}"/><c:invertIfNegative val="0"/><c:bubble3D val="0"/><c:spPr>{}</c:spPr></c:dPt>"#,
                    create_solid_fill_xml(c_color)
                ));
            }
            if style.if_data_labels {
                c_series.push_str(&create_data_labels_xml(style, "inEnd", Some(C_COLOR_WHITE)));
            }
        }
        c_series.push_str(&format!(
            "<c:cat>{}</c:cat><c:val>{}</c:val></c:ser>",
            create_str_literal_xml(&model.categories),
            create_num_literal_xml(&series.values)
        ));
    }

    format!(
        concat!(
            r#"<c:barChart><c:barDir val="col"/><c:grouping val="{grouping}"/><c:varyColors val="{vary}"/>{series}"#,
            r#"<c:gapWidth val="80"/>{overlap}<c:axId val="1"/><c:axId val="2"/></c:barChart>"#
        ),
        grouping = if if_stacked { "stacked" } else { "clustered" },
        vary = u8::from(if_vary),
        series = c_series,
        overlap = if if_stacked { r#"<c:overlap val="100"/>"# } else { "" }
    )
}

fn create_line_plot_xml(model: &SpecChartModel, style: Option<&SpecChartStyle>) -> String {
    let mut c_series = String::new();
    for (n_idx, series) in model.series.iter().enumerate() {
        c_series.push_str(&format!(
            r#"<c:ser><c:idx val="{n_idx}"/><c:order val="{n_idx}"/><c:tx><c:v>{}</c:v></c:tx>"#,
            escape_text(series.name.as_str())
        ));
        if let Some(c_color) = style.and_then(|s| s.series_colors.get(n_idx)) {
            c_series.push_str(&format!(
                r#"<c:spPr><a:ln w="28575" cap="rnd">{}<a:round/></a:ln></c:spPr>"#,
                create_solid_fill_xml(c_color)
            ));
        }
        c_series.push_str(r#"<c:marker><c:symbol val="circle"/><c:size val="5"/></c:marker>"#);
        if let Some(style) = style
            && style.if_data_labels
        {
            c_series.push_str(&create_data_labels_xml(style, "t", None));
        }
        c_series.push_str(&format!(
            r#"<c:cat>{}</c:cat><c:val>{}</c:val><c:smooth val="1"/></c:ser>"#,
            create_str_literal_xml(&model.categories),
            create_num_literal_xml(&series.values)
        ));
    }

    format!(
        concat!(
            r#"<c:lineChart><c:grouping val="standard"/><c:varyColors val="0"/>{series}"#,
            r#"<c:marker val="1"/><c:axId val="1"/><c:axId val="2"/></c:lineChart>"#
        ),
        series = c_series
    )
}

/// One series per point so every bubble carries its own legend entry.
fn create_bubble_plot_xml(model: &SpecChartModel, style: Option<&SpecChartStyle>) -> String {
    let mut c_series = String::new();
    for (n_idx, point) in model.points.iter().enumerate() {
        let c_color = style
            .and_then(|s| s.series_colors.get(n_idx).cloned())
            .unwrap_or_else(|| TUP_BRAND_PALETTE[n_idx % TUP_BRAND_PALETTE.len()].to_string());
        c_series.push_str(&format!(
            concat!(
                r#"<c:ser><c:idx val="{i}"/><c:order val="{i}"/><c:tx><c:v>{label}</c:v></c:tx>"#,
                r#"<c:spPr><a:solidFill><a:srgbClr val="{color}"><a:alpha val="75000"/></a:srgbClr></a:solidFill></c:spPr>"#,
                r#"<c:invertIfNegative val="0"/><c:xVal>{x}</c:xVal><c:yVal>{y}</c:yVal>"#,
                r#"<c:bubbleSize>{size}</c:bubbleSize><c:bubble3D val="0"/></c:ser>"#
            ),
            i = n_idx,
            label = escape_text(point.label.as_str()),
            color = c_color,
            x = create_num_literal_xml(&[Some(point.x)]),
            y = create_num_literal_xml(&[Some(point.y)]),
            size = create_num_literal_xml(&[Some(point.size)])
        ));
    }

    format!(
        concat!(
            r#"<c:bubbleChart><c:varyColors val="0"/>{series}<c:bubbleScale val="50"/><c:showNegBubbles val="0"/>"#,
            r#"<c:axId val="1"/><c:axId val="2"/></c:bubbleChart>"#
        ),
        series = c_series
    )
}

fn create_category_axis_xml(model: &SpecChartModel, style: Option<&SpecChartStyle>) -> String {
    let c_title = model
        .x_axis_title
        .as_deref()
        .map(|c_name| create_chart_title_xml(c_name, 10, false, C_FONT_BODY))
        .unwrap_or_default();
    let c_label_pos = if model.kind == EnumChartKind::Line { "low" } else { "nextTo" };
    format!(
        concat!(
            r#"<c:catAx><c:axId val="1"/><c:scaling><c:orientation val="minMax"/></c:scaling><c:delete val="0"/>"#,
            r#"<c:axPos val="b"/>{title}{num_fmt}<c:majorTickMark val="none"/><c:minorTickMark val="none"/>"#,
            r#"<c:tickLblPos val="{label_pos}"/>{tx}<c:crossAx val="2"/><c:crosses val="autoZero"/>"#,
            r#"<c:auto val="1"/><c:lblAlgn val="ctr"/><c:lblOffset val="100"/><c:noMultiLvlLbl val="0"/></c:catAx>"#
        ),
        title = c_title,
        num_fmt = create_num_format_xml(None),
        label_pos = c_label_pos,
        tx = create_text_properties_xml(9, style.and_then(|s| s.category_label_rotation))
    )
}

#[allow(clippy::too_many_arguments)]
fn create_value_axis_xml(
    n_axis_id: u32,
    n_cross_axis_id: u32,
    position: &str,
    title: Option<&str>,
    format_code: Option<&str>,
    min: Option<f64>,
    major_unit: Option<f64>,
    if_gridlines: bool,
) -> String {
    let c_min = min.map(|x| format!(r#"<c:min val="{x}"/>"#)).unwrap_or_default();
    let c_gridlines = if if_gridlines {
        format!(
            r#"<c:majorGridlines><c:spPr><a:ln w="6350">{}</a:ln></c:spPr></c:majorGridlines>"#,
            create_solid_fill_xml(C_COLOR_BORDER)
        )
    } else {
        String::new()
    };
    let c_title = title
        .map(|c_name| create_chart_title_xml(c_name, 10, false, C_FONT_BODY))
        .unwrap_or_default();
    let c_major_unit = major_unit
        .map(|x| format!(r#"<c:majorUnit val="{x}"/>"#))
        .unwrap_or_default();
    format!(
        concat!(
            r#"<c:valAx><c:axId val="{id}"/><c:scaling><c:orientation val="minMax"/>{min}</c:scaling><c:delete val="0"/>"#,
            r#"<c:axPos val="{pos}"/>{grid}{title}{num_fmt}<c:majorTickMark val="none"/><c:minorTickMark val="none"/>"#,
            r#"<c:tickLblPos val="nextTo"/>{tx}<c:crossAx val="{cross}"/><c:crosses val="autoZero"/>"#,
            r#"<c:crossBetween val="between"/>{unit}</c:valAx>"#
        ),
        id = n_axis_id,
        min = c_min,
        pos = position,
        grid = c_gridlines,
        title = c_title,
        num_fmt = create_num_format_xml(format_code),
        tx = create_text_properties_xml(9, None),
        cross = n_cross_axis_id,
        unit = c_major_unit
    )
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PackageParts

fn create_root_rels_xml() -> String {
    create_relationships_xml(concat!(
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>"#,
        r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>"#,
        r#"<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>"#
    ))
}

fn create_core_xml(title: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
            r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
            r#"xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            r#"<dc:title>{title}</dc:title><dc:creator>reportkit</dc:creator></cp:coreProperties>"#
        ),
        title = escape_text(title)
    )
}

fn create_app_xml(n_slides: usize) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">"#,
            r#"<Application>reportkit</Application><Slides>{n}</Slides></Properties>"#
        ),
        n = n_slides
    )
}

fn create_pres_props_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:presentationPr xmlns:a="{C_NS_A}" xmlns:r="{C_NS_R}" xmlns:p="{C_NS_P}"/>"#
    )
}

fn create_view_props_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:viewPr xmlns:a="{C_NS_A}" xmlns:r="{C_NS_R}" xmlns:p="{C_NS_P}"/>"#
    )
}

fn create_table_styles_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><a:tblStyleLst xmlns:a="{C_NS_A}" def="{{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}}"/>"#
    )
}

const C_EMPTY_SP_TREE: &str = concat!(
    r#"<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
    r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr></p:spTree>"#
);

fn create_slide_master_xml() -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<p:sldMaster xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}"><p:cSld>{tree}</p:cSld>"#,
            r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" "#,
            r#"accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#,
            r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst></p:sldMaster>"#
        ),
        a = C_NS_A,
        r = C_NS_R,
        p = C_NS_P,
        tree = C_EMPTY_SP_TREE
    )
}

fn create_slide_master_rels_xml() -> String {
    create_relationships_xml(concat!(
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>"#,
        r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="../theme/theme1.xml"/>"#
    ))
}

fn create_slide_layout_xml() -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<p:sldLayout xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}" type="blank" preserve="1">"#,
            r#"<p:cSld name="Blank">{tree}</p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#
        ),
        a = C_NS_A,
        r = C_NS_R,
        p = C_NS_P,
        tree = C_EMPTY_SP_TREE
    )
}

fn create_slide_layout_rels_xml() -> String {
    create_relationships_xml(
        r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="../slideMasters/slideMaster1.xml"/>"#,
    )
}

fn create_theme_xml() -> String {
    let c_accents: String = TUP_BRAND_PALETTE
        .iter()
        .skip(1)
        .take(6)
        .enumerate()
        .map(|(n_idx, c_color)| format!(r#"<a:accent{n}><a:srgbClr val="{c_color}"/></a:accent{n}>"#, n = n_idx + 1))
        .collect();
    let c_fill = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;
    let c_line = format!(r#"<a:ln w="6350">{c_fill}</a:ln>"#);
    let c_effect = "<a:effectStyle><a:effectLst/></a:effectStyle>";
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<a:theme xmlns:a="{a}" name="ReportKit"><a:themeElements>"#,
            r#"<a:clrScheme name="ReportKit"><a:dk1><a:srgbClr val="000000"/></a:dk1><a:lt1><a:srgbClr val="FFFFFF"/></a:lt1>"#,
            r#"<a:dk2><a:srgbClr val="{dk2}"/></a:dk2><a:lt2><a:srgbClr val="{lt2}"/></a:lt2>{accents}"#,
            r#"<a:hlink><a:srgbClr val="3B82F6"/></a:hlink><a:folHlink><a:srgbClr val="64748B"/></a:folHlink></a:clrScheme>"#,
            r#"<a:fontScheme name="ReportKit"><a:majorFont><a:latin typeface="{font_title}"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>"#,
            r#"<a:minorFont><a:latin typeface="{font_body}"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme>"#,
            r#"<a:fmtScheme name="ReportKit"><a:fillStyleLst>{fill}{fill}{fill}</a:fillStyleLst>"#,
            r#"<a:lnStyleLst>{line}{line}{line}</a:lnStyleLst><a:effectStyleLst>{effect}{effect}{effect}</a:effectStyleLst>"#,
            r#"<a:bgFillStyleLst>{fill}{fill}{fill}</a:bgFillStyleLst></a:fmtScheme></a:themeElements></a:theme>"#
        ),
        a = C_NS_A,
        dk2 = C_COLOR_DARK_BLUE,
        lt2 = C_COLOR_ALT_ROW,
        accents = c_accents,
        font_title = C_FONT_TITLE,
        font_body = C_FONT_BODY,
        fill = c_fill,
        line = c_line,
        effect = c_effect
    )
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{EnumColorMode, EnumFormatTag, SpecChartSeries, SpecTableCell};

    fn context() -> SpecReportContext {
        SpecReportContext {
            title: "Reporte <Q1>".to_string(),
            subtitle: None,
            generated_at: "01/01/2024 10:00".to_string(),
            currency_symbol: "$".to_string(),
        }
    }

    fn model(kind: EnumChartKind) -> SpecChartModel {
        SpecChartModel {
            title: "Evolución de Precios".to_string(),
            kind,
            categories: vec!["Ene".to_string(), "Feb".to_string()],
            series: vec![SpecChartSeries {
                name: "Kia".to_string(),
                values: vec![None, Some(120.0)],
            }],
            points: Vec::new(),
            color_mode: EnumColorMode::SeriesPalette,
            axis_format: EnumFormatTag::Currency,
            axis_major_unit: None,
            if_data_labels: true,
            if_time_evolution: true,
            x_axis_title: None,
            y_axis_title: Some("Valor".to_string()),
            currency_symbol: "$".to_string(),
        }
    }

    #[test]
    fn test_png_size_reads_ihdr() {
        assert!(derive_png_size(crate::conf::V_LOGO_PNG_EMBEDDED).is_some());
        assert_eq!(derive_png_size(b"not a png at all, definitely not"), None);
    }

    #[test]
    fn test_num_literal_skips_gaps() {
        let c_xml = create_num_literal_xml(&[None, Some(120.0), Some(f64::NAN)]);
        assert!(c_xml.contains(r#"<c:ptCount val="3"/>"#));
        assert!(!c_xml.contains(r#"idx="0""#));
        assert!(c_xml.contains(r#"<c:pt idx="1"><c:v>120</c:v></c:pt>"#));
        assert!(!c_xml.contains(r#"idx="2""#));
    }

    #[test]
    fn test_chart_xml_escapes_currency_format_and_legend_at_bottom() {
        let style = derive_chart_style(&model(EnumChartKind::Line)).ok();
        let c_xml = create_chart_xml(&model(EnumChartKind::Line), style.as_ref());
        assert!(c_xml.contains("<c:lineChart>"));
        assert!(c_xml.contains(r#"<c:smooth val="1"/>"#));
        assert!(c_xml.contains(r#"<c:legendPos val="b"/>"#));
        assert!(c_xml.contains("&quot;$&quot; #,##0"));
        assert!(c_xml.contains(r#"<c:dispBlanksAs val="gap"/>"#));
    }

    #[test]
    fn test_stacked_chart_uses_overlap() {
        let c_xml = create_chart_xml(&model(EnumChartKind::Stacked), None);
        assert!(c_xml.contains(r#"<c:grouping val="stacked"/>"#));
        assert!(c_xml.contains(r#"<c:overlap val="100"/>"#));
    }

    #[test]
    fn test_package_contains_core_parts_and_escaped_text() {
        let mut canvas = PptxCanvas::new(context(), &SpecBrandAssets::default());
        let l_cover = canvas.add_cover().unwrap_or_default();
        assert_eq!(l_cover, vec!["Portada".to_string()]);
        assert!(canvas.add_intro().is_ok());
        let grid = SpecTableGrid {
            title: "Detalle".to_string(),
            headers: vec!["Marca".to_string(), "Precio".to_string()],
            rows: vec![vec![
                SpecTableCell {
                    text: "Kia & Co".to_string(),
                    number: None,
                    tag: EnumFormatTag::Plain,
                    align: EnumCellAlign::Left,
                },
                SpecTableCell {
                    text: "$ 1.000".to_string(),
                    number: Some(1000.0),
                    tag: EnumFormatTag::Currency,
                    align: EnumCellAlign::Right,
                },
            ]],
            widths: vec![10.0, 12.0],
        };
        assert!(canvas.add_table_page("Detalle", &grid).is_ok());
        assert!(canvas.add_chart_page("Precios", &model(EnumChartKind::Bar)).is_ok());
        assert_eq!(canvas.add_cover().unwrap_or_default(), vec!["Cierre".to_string()]);

        let v_bytes = canvas.finish().unwrap_or_default();
        assert!(matches!(canvas.finish(), Err(ReportError::Finished)));

        let mut archive = zip::ZipArchive::new(Cursor::new(v_bytes)).expect("valid zip");
        for c_part in [
            "[Content_Types].xml",
            "ppt/presentation.xml",
            "ppt/slides/slide5.xml",
            "ppt/charts/chart1.xml",
            "ppt/media/image1.png",
            "ppt/media/image2.png",
            "ppt/theme/theme1.xml",
        ] {
            assert!(archive.by_name(c_part).is_ok(), "missing {c_part}");
        }
        assert!(archive.by_name("ppt/media/image3.png").is_err());

        let mut c_slide = String::new();
        std::io::Read::read_to_string(
            &mut archive.by_name("ppt/slides/slide3.xml").expect("slide 3"),
            &mut c_slide,
        )
        .expect("utf-8");
        assert!(c_slide.contains("Kia &amp; Co"));
        assert!(c_slide.contains(r#"<a:pPr algn="r"/>"#));
    }

    #[test]
    fn test_escape_text_drops_xml_illegal_controls() {
        assert_eq!(escape_text("Kia\u{1} & <Co>\u{7}"), "Kia &amp; &lt;Co&gt;");
        let c_xml = create_chart_title_xml("Precios\u{0}\u{1b}", 14, true, C_FONT_TITLE);
        assert!(c_xml.contains("<a:t>Precios</a:t>"));
    }

    #[test]
    fn test_debug_log_becomes_hidden_unlabelled_slide() {
        let mut canvas = PptxCanvas::new(context(), &SpecBrandAssets::default());
        assert!(canvas.add_intro().is_ok());
        let l_lines = vec!["[INFO] intro rendered".to_string(), "[WARN] <gap> & more".to_string()];
        assert!(canvas.add_debug_log(&l_lines).is_ok());

        let v_bytes = canvas.finish().expect("deck");
        let mut archive = zip::ZipArchive::new(Cursor::new(v_bytes)).expect("valid zip");
        let mut c_slide = String::new();
        std::io::Read::read_to_string(
            &mut archive.by_name("ppt/slides/slide2.xml").expect("debug slide"),
            &mut c_slide,
        )
        .expect("utf-8");
        assert!(c_slide.contains(r#" show="0">"#));
        assert!(c_slide.contains("DEBUG LOG"));
        assert!(c_slide.contains("[WARN] &lt;gap&gt; &amp; more"));

        let mut c_first = String::new();
        std::io::Read::read_to_string(
            &mut archive.by_name("ppt/slides/slide1.xml").expect("intro slide"),
            &mut c_first,
        )
        .expect("utf-8");
        assert!(!c_first.contains(r#"show="0""#));
        assert!(archive.by_name("ppt/slides/slide3.xml").is_err());
    }
}
