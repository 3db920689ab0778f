//! End-to-end rendering: raw JSON body -> document bytes, re-opened as a zip.

use std::io::{Cursor, Read};

use chrono::{DateTime, NaiveDate};
use quick_xml::Reader;
use quick_xml::events::Event;
use reportkit_render::{
    EnumDocumentKind, EnumStageOutcome, SpecBrandAssets, SpecRenderOptions, render_document,
};

fn options() -> SpecRenderOptions {
    SpecRenderOptions {
        now_utc: DateTime::from_timestamp(1_704_103_200, 0).expect("valid timestamp"),
        today: NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date"),
    }
}

fn read_part(v_bytes: &[u8], name: &str) -> Option<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(v_bytes)).ok()?;
    let mut file = archive.by_name(name).ok()?;
    let mut c_text = String::new();
    file.read_to_string(&mut c_text).ok()?;
    Some(c_text)
}

fn body() -> Vec<u8> {
    let models: Vec<serde_json::Value> = (0..25)
        .map(|n_idx| {
            serde_json::json!({
                "brand": "Kia",
                "model": format!("Modelo {n_idx}"),
                "precio_con_bono": 15_000_000,
                "precio_lista": 0,
                "bono": 500
            })
        })
        .collect();
    serde_json::to_vec(&serde_json::json!({
        "title": "Reporte Mensual",
        "summary": {
            "total_models": 25,
            "variation_coefficient": 0.12,
            "filters": { "tipoVehiculo": ["SUV"] }
        },
        "models": models,
        "sheets": [
            {
                "name": "Evolución",
                "chart_type": "line",
                "chart_title": "Evolución de Precios",
                "data": [
                    { "Mes": "Ene", "Kia": 0, "Toyota": 100 },
                    { "Mes": "Feb", "Kia": 120, "Toyota": 110 }
                ]
            },
            {
                "name": "Matriz",
                "chart_type": "scatter",
                "chart_title": "Matriz de Posicionamiento",
                "data": [
                    { "Marca": "Kia", "Volumen": 5, "Precio": 100 },
                    { "Marca": "Mazda", "Volumen": 3, "Precio": null }
                ]
            },
            { "name": "Vacía", "chart_type": "bar", "data": [] }
        ]
    }))
    .expect("serializable payload")
}

#[test]
fn test_workbook_contains_expected_sheets() {
    let doc = render_document(&body(), EnumDocumentKind::Workbook, &SpecBrandAssets::default(), &options());
    assert_eq!(doc.filename, "Report_2024-01-01.xlsx");
    assert_eq!(doc.report.placeholder_count(), 0);
    assert_eq!(
        doc.report.pages,
        vec![
            "Resumen Ejecutivo",
            "Gráfico Evolución",
            "Evolución",
            "Gráfico Matriz",
            "Matriz",
            "Modelos",
        ]
    );

    let c_workbook = read_part(&doc.bytes, "xl/workbook.xml").expect("workbook part");
    assert!(c_workbook.contains("DEBUG LOG"));
    assert!(c_workbook.contains(r#"state="hidden""#));
    assert!(read_part(&doc.bytes, "xl/charts/chart1.xml").is_some());
    assert!(read_part(&doc.bytes, "xl/charts/chart2.xml").is_some());
}

#[test]
fn test_deck_contains_slides_and_native_charts() {
    let doc = render_document(&body(), EnumDocumentKind::Deck, &SpecBrandAssets::default(), &options());
    assert_eq!(doc.filename, "Report_2024-01-01.pptx");
    assert_eq!(doc.report.placeholder_count(), 0);

    let models = doc
        .report
        .stages
        .iter()
        .find(|stage| stage.stage == "models")
        .map(|stage| stage.outcome.clone());
    assert_eq!(models, Some(EnumStageOutcome::Rendered { pages: 3 }));

    // cover, intro, summary, 2 x (chart + table), 3 model pages, closing
    let n_slides = doc.report.pages.len();
    assert_eq!(n_slides, 11);
    assert!(read_part(&doc.bytes, &format!("ppt/slides/slide{n_slides}.xml")).is_some());
    let c_debug = read_part(&doc.bytes, &format!("ppt/slides/slide{}.xml", n_slides + 1)).expect("debug slide");
    assert!(c_debug.contains(r#" show="0">"#));
    assert!(c_debug.contains("STAGE models: rendered (3 pages)"));

    let c_bubble = read_part(&doc.bytes, "ppt/charts/chart2.xml").expect("scatter chart");
    assert!(c_bubble.contains("<c:bubbleChart>"));
    assert_eq!(c_bubble.matches("<c:ser>").count(), 1);

    let c_line = read_part(&doc.bytes, "ppt/charts/chart1.xml").expect("line chart");
    assert!(c_line.contains("<c:lineChart>"));
    assert!(!c_line.contains(r#"<c:pt idx="0"><c:v>0</c:v></c:pt>"#));
}

#[test]
fn test_non_object_body_yields_error_deck() {
    let doc = render_document(b"[1, 2, 3]", EnumDocumentKind::Deck, &SpecBrandAssets::default(), &options());
    assert_eq!(doc.filename, "Error_Report.pptx");
    let c_slide = read_part(&doc.bytes, "ppt/slides/slide1.xml").expect("error slide");
    assert!(c_slide.contains("Critical Error generating Presentation"));
}

#[test]
fn test_awkward_sheet_names_keep_their_tables() {
    let c_long = format!("{}'xyz", "A".repeat(30));
    let v_body = serde_json::to_vec(&serde_json::json!({
        "title": "Reporte",
        "sheets": [
            { "name": c_long, "chart_type": "bar", "data": [{ "Marca": "Kia", "Precio": 10 }] },
            { "name": "History", "chart_type": "bar", "data": [{ "Marca": "Kia", "Precio": 12 }] }
        ]
    }))
    .expect("serializable payload");
    let doc = render_document(&v_body, EnumDocumentKind::Workbook, &SpecBrandAssets::default(), &options());
    assert_eq!(doc.report.placeholder_count(), 0);
    assert_eq!(
        doc.report.pages,
        vec![
            "Información".to_string(),
            format!("Gráfico {}", "A".repeat(23)),
            "A".repeat(30),
            "Gráfico History".to_string(),
            "History_".to_string(),
        ]
    );

    let c_workbook = read_part(&doc.bytes, "xl/workbook.xml").expect("workbook part");
    // five pages plus the hidden debug log
    assert_eq!(c_workbook.matches("<sheet ").count(), 6);
    assert!(!c_workbook.contains(r#"name="Sheet"#));
}

#[test]
fn test_deck_with_control_characters_is_well_formed_xml() {
    let v_body = serde_json::to_vec(&serde_json::json!({
        "title": "Reporte\u{7}X",
        "sheets": [
            {
                "name": "Precios\u{1b}",
                "chart_type": "bar",
                "chart_title": "Precios\u{0}",
                "data": [{ "Marca": "Kia\u{1}", "Precio": 100 }]
            }
        ]
    }))
    .expect("serializable payload");
    let doc = render_document(&v_body, EnumDocumentKind::Deck, &SpecBrandAssets::default(), &options());
    assert_eq!(doc.report.placeholder_count(), 0);

    let mut archive = zip::ZipArchive::new(Cursor::new(doc.bytes.as_slice())).expect("valid zip");
    let l_names: Vec<String> = archive.file_names().map(str::to_string).collect();
    let mut n_checked = 0;
    for c_name in l_names.iter().filter(|c| c.ends_with(".xml") || c.ends_with(".rels")) {
        let mut c_xml = String::new();
        archive
            .by_name(c_name)
            .expect("listed part")
            .read_to_string(&mut c_xml)
            .expect("utf-8 part");
        assert!(
            !c_xml.chars().any(|chr| chr < ' ' && !matches!(chr, '\t' | '\n' | '\r')),
            "{c_name} carries an XML-illegal character"
        );
        let mut reader = Reader::from_str(&c_xml);
        loop {
            match reader.read_event() {
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(err) => panic!("{c_name} is not well-formed: {err}"),
            }
        }
        n_checked += 1;
    }
    assert!(n_checked > 10);

    let c_core = read_part(&doc.bytes, "docProps/core.xml").expect("core part");
    assert!(c_core.contains("<dc:title>ReporteX</dc:title>"));
    let c_chart = read_part(&doc.bytes, "ppt/charts/chart1.xml").expect("chart part");
    assert!(c_chart.contains("<c:v>Kia</c:v>"));
}
