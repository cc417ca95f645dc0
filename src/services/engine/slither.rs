//! Slither Engine
//!
//! [`AnalysisEngine`] backed by the Slither command-line tool. Contract
//! source comes from Etherscan; detectors run through
//! `slither <address> --detect a,b --json -` and the JSON report is grouped
//! into one slot per requested detector.

use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use contract_guard_core::CheckDescriptor;
use serde::Deserialize;
use tokio::process::Command;

use super::{
    AnalysisEngine, ContractModel, EngineError, EngineResult, EtherscanClient, RawElement,
    RawIssue, RawParent,
};
use crate::models::settings::EngineSettings;

/// One entry of `slither --list-detectors-json`.
#[derive(Debug, Deserialize)]
struct DetectorListing {
    check: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    impact: String,
    #[serde(default)]
    confidence: String,
    #[serde(default)]
    wiki_url: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    exploit_scenario: String,
    #[serde(default)]
    recommendation: String,
}

impl From<DetectorListing> for CheckDescriptor {
    fn from(d: DetectorListing) -> Self {
        CheckDescriptor {
            argument: d.check,
            help: d.title.clone(),
            impact: d.impact,
            confidence: d.confidence,
            wiki: d.wiki_url,
            wiki_title: d.title,
            wiki_description: d.description,
            wiki_exploit_scenario: d.exploit_scenario,
            wiki_recommendation: d.recommendation,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SlitherReport {
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    results: SlitherResults,
}

#[derive(Debug, Default, Deserialize)]
struct SlitherResults {
    #[serde(default)]
    detectors: Vec<DetectorResult>,
}

#[derive(Debug, Deserialize)]
struct DetectorResult {
    check: String,
    #[serde(default)]
    impact: String,
    #[serde(default)]
    confidence: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    elements: Vec<ReportElement>,
}

#[derive(Debug, Deserialize)]
struct ReportElement {
    #[serde(rename = "type", default)]
    element_type: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    type_specific_fields: Option<TypeSpecificFields>,
}

#[derive(Debug, Deserialize)]
struct TypeSpecificFields {
    #[serde(default)]
    parent: Option<ReportParent>,
}

#[derive(Debug, Deserialize)]
struct ReportParent {
    #[serde(rename = "type", default)]
    element_type: String,
    #[serde(default)]
    name: String,
}

/// Slither CLI engine.
#[derive(Debug, Clone)]
pub struct SlitherEngine {
    slither_path: String,
    etherscan: EtherscanClient,
    etherscan_api_key: Option<String>,
    timeout: Duration,
}

impl SlitherEngine {
    pub fn new(settings: &EngineSettings) -> EngineResult<Self> {
        let etherscan = EtherscanClient::new(
            settings.etherscan_base_url.clone(),
            settings.etherscan_api_key.clone(),
            settings.timeout_secs.min(60),
        )?;
        Ok(Self {
            slither_path: settings.slither_path.clone(),
            etherscan,
            etherscan_api_key: settings.etherscan_api_key.clone(),
            timeout: Duration::from_secs(settings.timeout_secs.max(1)),
        })
    }

    /// Run slither with `args` and return its stdout.
    ///
    /// Slither exits non-zero when detectors report findings, so the exit
    /// status alone does not mean failure; callers inspect the JSON.
    async fn run(&self, args: &[String]) -> EngineResult<String> {
        let mut command = Command::new(&self.slither_path);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(program = %self.slither_path, subcommand = %args.first().map(String::as_str).unwrap_or(""), "running slither");
        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| EngineError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| EngineError::Unavailable(format!("{}: {}", self.slither_path, e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if stdout.trim().is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Execution(format!(
                "slither produced no output (status {}): {}",
                output.status,
                last_line(&stderr)
            )));
        }
        Ok(stdout)
    }
}

fn last_line(text: &str) -> &str {
    text.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("").trim()
}

#[async_trait]
impl AnalysisEngine for SlitherEngine {
    async fn list_checks(&self) -> EngineResult<Vec<CheckDescriptor>> {
        let stdout = self.run(&["--list-detectors-json".to_string()]).await?;
        parse_detector_list(&stdout)
    }

    async fn load(&self, address: &str) -> EngineResult<ContractModel> {
        let source = self.etherscan.fetch_source(address).await?;
        Ok(ContractModel::from_source(address, source))
    }

    async fn run_checks(
        &self,
        model: &ContractModel,
        ids: &[String],
    ) -> EngineResult<Vec<Vec<RawIssue>>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut args = vec![
            model.address.clone(),
            "--detect".to_string(),
            ids.join(","),
            "--json".to_string(),
            "-".to_string(),
        ];
        if let Some(key) = &self.etherscan_api_key {
            args.push("--etherscan-apikey".to_string());
            args.push(key.clone());
        }

        tracing::debug!(address = %model.address, detectors = ids.len(), "running detectors");
        let stdout = self.run(&args).await?;
        parse_detector_output(&stdout, ids)
    }
}

/// Parse `slither --list-detectors-json` output.
fn parse_detector_list(stdout: &str) -> EngineResult<Vec<CheckDescriptor>> {
    let listing: Vec<DetectorListing> = serde_json::from_str(json_payload(stdout))
        .map_err(|e| EngineError::Parse(format!("detector listing: {}", e)))?;
    Ok(listing.into_iter().map(CheckDescriptor::from).collect())
}

/// Parse a `--json -` report into one slot per requested id.
fn parse_detector_output(stdout: &str, ids: &[String]) -> EngineResult<Vec<Vec<RawIssue>>> {
    let report: SlitherReport = serde_json::from_str(json_payload(stdout))
        .map_err(|e| EngineError::Parse(format!("slither report: {}", e)))?;

    if !report.success {
        return Err(EngineError::Execution(
            report.error.unwrap_or_else(|| "slither reported failure".to_string()),
        ));
    }

    let slot_of: HashMap<&str, usize> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();
    let mut slots: Vec<Vec<RawIssue>> = vec![Vec::new(); ids.len()];

    for result in report.results.detectors {
        let Some(&slot) = slot_of.get(result.check.as_str()) else {
            tracing::debug!(check = %result.check, "dropping result for unrequested detector");
            continue;
        };
        slots[slot].push(RawIssue {
            check: result.check,
            impact: result.impact,
            confidence: result.confidence,
            description: result.description,
            elements: result.elements.into_iter().map(raw_element).collect(),
        });
    }

    Ok(slots)
}

fn raw_element(element: ReportElement) -> RawElement {
    let parent = element
        .type_specific_fields
        .and_then(|f| f.parent)
        .map(|p| RawParent {
            element_type: p.element_type,
            name: p.name,
        });
    RawElement {
        element_type: element.element_type,
        name: element.name,
        parent,
    }
}

/// Skip anything printed before the JSON document.
fn json_payload(stdout: &str) -> &str {
    match stdout.find(['{', '[']) {
        Some(start) => &stdout[start..],
        None => stdout,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    const REPORT: &str = r#"{
        "success": true,
        "error": null,
        "results": {
            "detectors": [
                {
                    "check": "reentrancy-eth",
                    "impact": "High",
                    "confidence": "Medium",
                    "description": "Reentrancy in Vault.withdraw()",
                    "elements": [
                        {"type": "function", "name": "withdraw",
                         "type_specific_fields": {"parent": {"type": "contract", "name": "Vault"}}},
                        {"type": "node", "name": "msg.sender.call{value: amount}()"}
                    ]
                },
                {
                    "check": "naming-convention",
                    "impact": "Informational",
                    "confidence": "High",
                    "description": "Parameter _x is not in mixedCase",
                    "elements": []
                },
                {
                    "check": "reentrancy-eth",
                    "impact": "High",
                    "confidence": "Medium",
                    "description": "Reentrancy in Vault.drain()",
                    "elements": []
                }
            ]
        }
    }"#;

    #[test]
    fn test_report_grouped_into_aligned_slots() {
        let slots = parse_detector_output(REPORT, &ids(&["suicidal", "reentrancy-eth"])).unwrap();
        assert_eq!(slots.len(), 2);
        assert!(slots[0].is_empty());
        assert_eq!(slots[1].len(), 2);
        assert_eq!(slots[1][0].description, "Reentrancy in Vault.withdraw()");
        assert_eq!(slots[1][1].description, "Reentrancy in Vault.drain()");
    }

    #[test]
    fn test_element_parent_mapping() {
        let slots = parse_detector_output(REPORT, &ids(&["reentrancy-eth"])).unwrap();
        let elements = &slots[0][0].elements;
        assert_eq!(
            elements[0].parent,
            Some(RawParent {
                element_type: "contract".to_string(),
                name: "Vault".to_string()
            })
        );
        assert_eq!(elements[1].parent, None);
    }

    #[test]
    fn test_empty_results_object() {
        let slots = parse_detector_output(r#"{"success": true, "error": null, "results": {}}"#, &ids(&["a", "b"])).unwrap();
        assert_eq!(slots, vec![Vec::<RawIssue>::new(), Vec::new()]);
    }

    #[test]
    fn test_failed_report() {
        let err = parse_detector_output(
            r#"{"success": false, "error": "Invalid compilation", "results": {}}"#,
            &ids(&["a"]),
        )
        .unwrap_err();
        assert_eq!(err, EngineError::Execution("Invalid compilation".to_string()));
    }

    #[test]
    fn test_garbage_output() {
        assert!(matches!(
            parse_detector_output("Traceback (most recent call last)", &ids(&["a"])),
            Err(EngineError::Parse(_))
        ));
    }

    #[test]
    fn test_detector_list_mapping() {
        let stdout = r#"INFO: listing
        [{"index": 1, "check": "abiencoderv2-array", "title": "Storage abiencoderv2 array",
          "impact": "High", "confidence": "High",
          "wiki_url": "https://github.com/crytic/slither/wiki/Detector-Documentation#storage-abiencoderv2-array",
          "description": "solc versions 0.4.7-0.5.9 contain a compiler bug",
          "exploit_scenario": "...", "recommendation": "Use a compiler >= 0.5.10."}]"#;
        let checks = parse_detector_list(stdout).unwrap();
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].argument, "abiencoderv2-array");
        assert_eq!(checks[0].help, "Storage abiencoderv2 array");
        assert_eq!(checks[0].wiki_recommendation, "Use a compiler >= 0.5.10.");
    }

    #[tokio::test]
    async fn test_no_ids_spawns_nothing() {
        let settings = EngineSettings {
            slither_path: "/nonexistent/slither".to_string(),
            ..Default::default()
        };
        let engine = SlitherEngine::new(&settings).unwrap();
        let model = ContractModel::from_source("0xabc", "");
        assert!(engine.run_checks(&model, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let settings = EngineSettings {
            slither_path: "/nonexistent/slither".to_string(),
            ..Default::default()
        };
        let engine = SlitherEngine::new(&settings).unwrap();
        assert!(matches!(
            engine.list_checks().await,
            Err(EngineError::Unavailable(_))
        ));
    }
}
