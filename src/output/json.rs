//! JSON output formatting

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

/// Wrapper for JSON output with metadata
#[derive(Debug, Serialize)]
pub struct JsonOutput<'a> {
    /// Response payload, `null` when the backend returned no content
    pub data: &'a Option<Value>,

    pub meta: Metadata<'a>,
}

/// Metadata included in JSON output
#[derive(Debug, Serialize)]
pub struct Metadata<'a> {
    /// Endpoint the data came from
    pub endpoint: &'a str,

    /// Timestamp of the response
    pub timestamp: String,

    /// CLI version
    pub version: &'static str,
}

impl<'a> JsonOutput<'a> {
    pub fn new(endpoint: &'a str, data: &'a Option<Value>) -> Self {
        Self {
            data,
            meta: Metadata {
                endpoint,
                timestamp: Utc::now().to_rfc3339(),
                version: env!("CARGO_PKG_VERSION"),
            },
        }
    }
}

/// Format a response as pretty-printed JSON
pub fn format_json(endpoint: &str, data: &Option<Value>) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonOutput::new(endpoint, data))
}

/// Print a response to stdout
pub fn print_json(endpoint: &str, data: &Option<Value>) -> anyhow::Result<()> {
    println!("{}", format_json(endpoint, data)?);
    Ok(())
}
