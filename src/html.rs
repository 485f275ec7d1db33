//! Kepler.gl HTML sink: a static template with two literal placeholders.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::report::ReportRow;

const MAPBOX_KEY_PLACEHOLDER: &str = "<MAPBOX_KEY>";
const DATA_PLACEHOLDER: &str = "<DATA>";

/// Renders `template/template.html` with the access key and the serialized
/// row sequence, writing `<output_filename>.html` into `outputs_dir`.
/// Returns the written path.
pub fn write_map_html(
    template_dir: &Path,
    outputs_dir: &Path,
    output_filename: &str,
    mapbox_key: &str,
    rows: &[ReportRow],
) -> Result<PathBuf> {
    let template_path = template_dir.join("template.html");
    let template = fs::read_to_string(&template_path)
        .with_context(|| format!("reading template {}", template_path.display()))?;

    let rendered = template
        .replace(MAPBOX_KEY_PLACEHOLDER, mapbox_key)
        .replace(DATA_PLACEHOLDER, &serialize_rows(rows)?);

    let output_path = outputs_dir.join(format!("{output_filename}.html"));
    fs::write(&output_path, rendered)
        .with_context(|| format!("writing {}", output_path.display()))?;
    Ok(output_path)
}

/// Rows as a JSON array of `[fecha, nombre, comuna, latitud, longitud,
/// subidas]` tuples, the shape the embedded map script consumes.
fn serialize_rows(rows: &[ReportRow]) -> Result<String> {
    let tuples: Vec<serde_json::Value> = rows
        .iter()
        .map(|r| serde_json::json!([r.fecha, r.nombre, r.comuna, r.latitud, r.longitud, r.subidas]))
        .collect();
    Ok(serde_json::to_string(&tuples)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> ReportRow {
        ReportRow {
            fecha: "2020-05-08 00:00:00".to_string(),
            nombre: "PC1106".to_string(),
            comuna: "LAS CONDES".to_string(),
            latitud: -33.41611369,
            longitud: -70.59369329,
            subidas: 3,
        }
    }

    #[test]
    fn test_both_placeholders_substituted() {
        let dir = tempfile::tempdir().unwrap();
        let template_dir = dir.path().join("template");
        std::fs::create_dir_all(&template_dir).unwrap();
        std::fs::write(
            template_dir.join("template.html"),
            "key=<MAPBOX_KEY> data=<DATA>",
        )
        .unwrap();

        let path = write_map_html(&template_dir, dir.path(), "out", "pk.test", &[sample_row()])
            .unwrap();

        let html = std::fs::read_to_string(path).unwrap();
        assert!(html.contains("key=pk.test"));
        assert!(!html.contains("<MAPBOX_KEY>"));
        assert!(!html.contains("<DATA>"));
        assert!(html.contains("\"2020-05-08 00:00:00\",\"PC1106\",\"LAS CONDES\""));
    }

    #[test]
    fn test_serialize_rows_tuple_shape() {
        let json = serialize_rows(&[sample_row()]).unwrap();
        assert_eq!(
            json,
            "[[\"2020-05-08 00:00:00\",\"PC1106\",\"LAS CONDES\",-33.41611369,-70.59369329,3]]"
        );
    }
}
