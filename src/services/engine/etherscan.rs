//! Etherscan Source Client
//!
//! Fetches verified contract source through the `getsourcecode` endpoint.
//! Multi-file sources (standard-JSON input, optionally wrapped in an extra
//! pair of braces) are flattened into one text with a `// File:` header per
//! source unit.

use std::time::Duration;

use serde::Deserialize;

use super::{EngineError, EngineResult};

#[derive(Debug, Deserialize)]
struct SourceCodeResponse {
    status: String,
    #[serde(default)]
    message: String,
    result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct SourceCodeEntry {
    #[serde(rename = "SourceCode", default)]
    source_code: String,
    #[serde(rename = "ContractName", default)]
    contract_name: String,
}

#[derive(Debug, Deserialize)]
struct SourceUnit {
    #[serde(default)]
    content: String,
}

/// Client for the Etherscan contract API.
#[derive(Debug, Clone)]
pub struct EtherscanClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl EtherscanClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, timeout_secs: u64) -> EngineResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .map_err(|e| EngineError::Unavailable(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
        })
    }

    /// Verified source of the contract at `address`, flattened.
    pub async fn fetch_source(&self, address: &str) -> EngineResult<String> {
        let mut query = vec![
            ("module", "contract"),
            ("action", "getsourcecode"),
            ("address", address),
        ];
        if let Some(key) = self.api_key.as_deref() {
            query.push(("apikey", key));
        }

        let response = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| EngineError::load(address, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| EngineError::load(address, e.to_string()))?;
        if !status.is_success() {
            return Err(EngineError::load(address, format!("Etherscan HTTP {}", status.as_u16())));
        }

        parse_source_response(address, &body)
    }
}

fn parse_source_response(address: &str, body: &str) -> EngineResult<String> {
    let response: SourceCodeResponse = serde_json::from_str(body)
        .map_err(|e| EngineError::Parse(format!("Etherscan response: {}", e)))?;

    if response.status != "1" {
        let detail = response
            .result
            .as_str()
            .map(String::from)
            .unwrap_or(response.message);
        return Err(EngineError::load(address, detail));
    }

    let entries: Vec<SourceCodeEntry> = serde_json::from_value(response.result)
        .map_err(|e| EngineError::Parse(format!("Etherscan result: {}", e)))?;
    let entry = entries
        .into_iter()
        .next()
        .ok_or_else(|| EngineError::load(address, "empty Etherscan result"))?;

    if entry.source_code.trim().is_empty() {
        return Err(EngineError::load(address, "contract source code is not verified"));
    }

    tracing::debug!(address, contract = %entry.contract_name, "fetched verified source");
    flatten_source(&entry.source_code)
}

/// Flatten an Etherscan `SourceCode` field into plain Solidity.
pub fn flatten_source(raw: &str) -> EngineResult<String> {
    let trimmed = raw.trim();
    if !trimmed.starts_with('{') {
        return Ok(raw.to_string());
    }

    // Standard-JSON input is served wrapped in a second pair of braces.
    let json = if trimmed.starts_with("{{") && trimmed.ends_with("}}") {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| EngineError::Parse(format!("multi-file source: {}", e)))?;
    let sources = value.get("sources").unwrap_or(&value);
    let units: std::collections::BTreeMap<String, SourceUnit> =
        serde_json::from_value(sources.clone())
            .map_err(|e| EngineError::Parse(format!("source units: {}", e)))?;

    let mut flattened = String::new();
    for (path, unit) in units {
        flattened.push_str("// File: ");
        flattened.push_str(&path);
        flattened.push('\n');
        flattened.push_str(&unit.content);
        if !unit.content.ends_with('\n') {
            flattened.push('\n');
        }
        flattened.push('\n');
    }
    Ok(flattened)
}
