// CSV export of raw gauge readings
use crate::domain::meter::{Gauge, Meter};
use crate::infrastructure::config::Labels;

const UTF8_BOM: &str = "\u{feff}";
const DELIMITER: u8 = b';';

/// Downloadable CSV file. Fields are written as-is, without quoting.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvExport {
    pub file_name: String,
    pub content: String,
}

impl CsvExport {
    /// File bytes, prefixed with a byte order mark so spreadsheets pick UTF-8
    pub fn into_bytes(self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(UTF8_BOM.len() + self.content.len());
        bytes.extend_from_slice(UTF8_BOM.as_bytes());
        bytes.extend_from_slice(self.content.as_bytes());
        bytes
    }
}

/// Two header lines, then one `timestamp;value` line per reading, newest first.
/// `None` when the gauge has no value list at all.
pub fn export_gauge(
    meter: &Meter,
    gauge: &Gauge,
    labels: &Labels,
    exported_at_ms: i64,
) -> anyhow::Result<Option<CsvExport>> {
    let Some(values) = gauge.gauge_values.as_ref() else {
        return Ok(None);
    };

    let mut wtr = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .quote_style(csv::QuoteStyle::Never)
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .has_headers(false)
        .from_writer(vec![]);

    wtr.write_record([labels.meter_name.as_str(), meter.name.as_str(), gauge.name.as_str()])?;
    wtr.write_record([labels.date.as_str(), labels.value.as_str()])?;
    for v in values.iter().rev() {
        let timestamp: String = v.updated.replacen('T', " ", 1).chars().take(19).collect();
        let value = v.value.as_ref().map(ToString::to_string).unwrap_or_default();
        wtr.write_record([timestamp, value])?;
    }

    let data = wtr
        .into_inner()
        .map_err(|e| anyhow::anyhow!("CSV writer error: {}", e))?;

    Ok(Some(CsvExport {
        file_name: format!("{}_{}_{}.csv", meter.name, gauge.name, exported_at_ms),
        content: String::from_utf8(data)?,
    }))
}

/// How the client can receive a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveCapability {
    /// Browser saves a CSV attachment under the suggested name
    DownloadAttribute,
    /// Client only takes opaque blobs and saves them itself
    BlobSave,
    Unsupported,
}

impl SaveCapability {
    /// Detect from the request's `Accept` header. No header means anything goes.
    pub fn detect(accept: Option<&str>) -> Self {
        let Some(accept) = accept.filter(|a| !a.trim().is_empty()) else {
            return SaveCapability::DownloadAttribute;
        };

        // Media types with a zero quality are refused
        let media_types: Vec<String> = accept
            .split(',')
            .filter_map(|part| {
                let mut params = part.split(';');
                let media = params.next()?.trim().to_ascii_lowercase();
                let refused = params
                    .filter_map(|p| {
                        let p = p.trim();
                        p.strip_prefix("q=").or_else(|| p.strip_prefix("Q="))
                    })
                    .any(|q| q.trim().parse::<f64>().is_ok_and(|q| q <= 0.0));
                (!refused).then_some(media)
            })
            .collect();
        let accepts = |candidates: &[&str]| media_types.iter().any(|m| candidates.contains(&m.as_str()));

        if accepts(&["text/csv", "text/*", "*/*"]) {
            SaveCapability::DownloadAttribute
        } else if accepts(&["application/octet-stream", "application/*"]) {
            SaveCapability::BlobSave
        } else {
            SaveCapability::Unsupported
        }
    }
}
