//! Report assembly.
//!
//! Turns a [`PipelineOutcome`] into the JSON document handed to downstream
//! consumers: suspicious accounts, annotated rings, clusters, notable
//! anomaly scores, a renderable graph and a run summary.

use crate::pipeline::PipelineOutcome;
use chrono::{DateTime, Utc};
use ringwatch_core::{config::ReportingConfig, error::Result, ring::Ring};
use ringwatch_risk::fusion::{account_patterns, annotate_rings, rank};
use ringwatch_risk::types::{round_to, RiskBreakdown};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Pattern label used for suspicious accounts that are in no ring.
pub const ANOMALY_ONLY_PATTERN: &str = "anomaly";

/// One flagged account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspiciousAccount {
    /// Account id.
    pub account_id: String,
    /// Fused score in [0, 100].
    pub suspicion_score: f64,
    /// Data sufficiency in [0, 1], two decimals.
    pub confidence: f64,
    /// Labels of every ring the account is in, or `["anomaly"]`.
    pub detected_patterns: Vec<String>,
    /// Component values, two decimals.
    pub risk_breakdown: RiskBreakdown,
}

/// Accounts sharing a community.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphCluster {
    /// Community id.
    pub cluster_id: usize,
    /// Member accounts, ascending.
    pub members: Vec<String>,
}

/// Graph node for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Account id.
    pub id: String,
    /// Community id.
    pub community: usize,
}

/// Graph edge for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Sending account.
    pub source: String,
    /// Receiving account.
    pub target: String,
    /// Total amount between the pair.
    pub amount: f64,
    /// Number of transactions between the pair.
    pub weight: u64,
    /// Earliest transaction between the pair.
    pub first_timestamp: DateTime<Utc>,
    /// Latest transaction between the pair.
    pub last_timestamp: DateTime<Utc>,
}

/// Renderable transaction graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphView {
    /// Accounts.
    pub nodes: Vec<GraphNode>,
    /// Aggregated transfers.
    pub edges: Vec<GraphEdge>,
}

/// Run-level counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Unique id of this run.
    pub run_id: Uuid,
    /// Accounts in the graph.
    pub total_accounts_analyzed: usize,
    /// Accounts above the suspicion threshold.
    pub suspicious_accounts_flagged: usize,
    /// Rings across all detectors.
    pub fraud_rings_detected: usize,
    /// Mean score of flagged accounts, two decimals; 0 when none.
    pub avg_risk_score: f64,
    /// Wall time of the run, three decimals.
    pub processing_time_seconds: f64,
}

/// Full analysis report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Flagged accounts, highest score first.
    pub suspicious_accounts: Vec<SuspiciousAccount>,
    /// Rings with their mean member score.
    pub fraud_rings: Vec<Ring>,
    /// Communities, ascending id.
    pub graph_clusters: Vec<GraphCluster>,
    /// Anomaly scores above the reporting threshold, three decimals.
    pub anomaly_scores: BTreeMap<String, f64>,
    /// Renderable graph.
    pub graph: GraphView,
    /// Hub accounts, ascending.
    pub hubs: Vec<String>,
    /// Counters.
    pub summary: ReportSummary,
}

impl AnalysisReport {
    /// Assemble the report for one run.
    pub fn from_outcome(outcome: &PipelineOutcome, reporting: &ReportingConfig) -> Self {
        let threshold = reporting.suspicion_threshold;
        let patterns = account_patterns(&outcome.rings);

        let suspicious_accounts: Vec<SuspiciousAccount> = rank(&outcome.scores)
            .into_iter()
            .filter(|ranked| ranked.risk.score > threshold)
            .map(|ranked| SuspiciousAccount {
                detected_patterns: patterns
                    .get(&ranked.account_id)
                    .cloned()
                    .unwrap_or_else(|| vec![ANOMALY_ONLY_PATTERN.to_string()]),
                suspicion_score: ranked.risk.score,
                confidence: round_to(ranked.risk.confidence, 2),
                risk_breakdown: ranked.risk.breakdown.rounded(2),
                account_id: ranked.account_id,
            })
            .collect();

        let avg_risk_score = if suspicious_accounts.is_empty() {
            0.0
        } else {
            let total: f64 = suspicious_accounts.iter().map(|a| a.suspicion_score).sum();
            round_to(total / suspicious_accounts.len() as f64, 2)
        };

        let graph_clusters = outcome
            .intelligence
            .clusters()
            .into_iter()
            .map(|(cluster_id, members)| GraphCluster {
                cluster_id,
                members,
            })
            .collect();

        let anomaly_scores = outcome
            .anomaly
            .above(reporting.anomaly_report_threshold)
            .map(|(account, score)| (account.to_string(), round_to(score, 3)))
            .collect();

        let graph = &outcome.graph;
        let view = GraphView {
            nodes: graph
                .accounts()
                .iter()
                .map(|id| GraphNode {
                    id: id.clone(),
                    community: outcome
                        .intelligence
                        .community
                        .get(id)
                        .copied()
                        .unwrap_or_default(),
                })
                .collect(),
            edges: graph
                .edges()
                .iter()
                .map(|e| GraphEdge {
                    source: graph.account(e.source).to_string(),
                    target: graph.account(e.target).to_string(),
                    amount: e.amount,
                    weight: e.weight,
                    first_timestamp: e.first_timestamp,
                    last_timestamp: e.last_timestamp,
                })
                .collect(),
        };

        let summary = ReportSummary {
            run_id: Uuid::new_v4(),
            total_accounts_analyzed: graph.node_count(),
            suspicious_accounts_flagged: suspicious_accounts.len(),
            fraud_rings_detected: outcome.rings.len(),
            avg_risk_score,
            processing_time_seconds: round_to(outcome.elapsed.as_secs_f64(), 3),
        };

        Self {
            suspicious_accounts,
            fraud_rings: annotate_rings(&outcome.rings, &outcome.scores, threshold),
            graph_clusters,
            anomaly_scores,
            graph: view,
            hubs: outcome.intelligence.hubs.iter().cloned().collect(),
            summary,
        }
    }

    /// Serialize to JSON.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;
    use chrono::{Duration, TimeZone, Utc};
    use ringwatch_core::transaction::Transaction;

    fn cycle_with_bystander() -> Vec<Transaction> {
        let base = Utc.with_ymd_and_hms(2024, 5, 10, 8, 0, 0).unwrap();
        let t = |id: &str, from: &str, to: &str, amount: f64, h: i64| {
            Transaction::new(id, from, to, amount, base + Duration::hours(h))
        };
        vec![
            t("T1", "A", "B", 900.0, 0),
            t("T2", "B", "C", 880.0, 1),
            t("T3", "C", "A", 860.0, 2),
            t("T4", "Q", "R", 25.0, 3),
        ]
    }

    #[tokio::test]
    async fn test_report_shape() {
        let outcome = Pipeline::default()
            .run(cycle_with_bystander())
            .await
            .unwrap();
        let report = AnalysisReport::from_outcome(&outcome, &ReportingConfig::default());

        assert_eq!(report.summary.total_accounts_analyzed, 5);
        assert_eq!(report.summary.fraud_rings_detected, 1);
        assert_eq!(report.graph.nodes.len(), 5);
        assert_eq!(report.graph.edges.len(), 4);
        assert_eq!(report.summary.suspicious_accounts_flagged, report.suspicious_accounts.len());

        // Cycle members carry the cycle label.
        for account in &report.suspicious_accounts {
            if ["A", "B", "C"].contains(&account.account_id.as_str()) {
                assert_eq!(account.detected_patterns, vec!["cycle_length_3"]);
            } else {
                assert_eq!(account.detected_patterns, vec![ANOMALY_ONLY_PATTERN]);
            }
            assert!(account.suspicion_score > 25.0);
        }

        let cluster_members: usize = report.graph_clusters.iter().map(|c| c.members.len()).sum();
        assert_eq!(cluster_members, 5);
        assert!(report.fraud_rings.iter().all(|r| r.risk_score.is_some()));
        assert!(report.anomaly_scores.values().all(|&s| (0.5..=1.0).contains(&s)));
    }

    #[tokio::test]
    async fn test_suspicious_sorted_and_averaged() {
        let outcome = Pipeline::default()
            .run(cycle_with_bystander())
            .await
            .unwrap();
        let reporting = ReportingConfig {
            suspicion_threshold: 0.0,
            ..ReportingConfig::default()
        };
        let report = AnalysisReport::from_outcome(&outcome, &reporting);

        let scores: Vec<f64> = report
            .suspicious_accounts
            .iter()
            .map(|a| a.suspicion_score)
            .collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));

        if !scores.is_empty() {
            let mean = scores.iter().sum::<f64>() / scores.len() as f64;
            assert!((report.summary.avg_risk_score - mean).abs() <= 0.005 + 1e-9);
        }
    }

    #[tokio::test]
    async fn test_empty_report() {
        let outcome = Pipeline::default().run(Vec::new()).await.unwrap();
        let report = AnalysisReport::from_outcome(&outcome, &ReportingConfig::default());
        assert!(report.suspicious_accounts.is_empty());
        assert_eq!(report.summary.avg_risk_score, 0.0);
        assert_eq!(report.summary.total_accounts_analyzed, 0);

        let json: serde_json::Value =
            serde_json::from_str(&report.to_json(false).unwrap()).unwrap();
        assert!(json["summary"]["run_id"].is_string());
        assert_eq!(json["fraud_rings"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_ring_json_fields() {
        let outcome = Pipeline::default()
            .run(cycle_with_bystander())
            .await
            .unwrap();
        let report = AnalysisReport::from_outcome(&outcome, &ReportingConfig::default());
        let json: serde_json::Value =
            serde_json::from_str(&report.to_json(true).unwrap()).unwrap();

        let ring = &json["fraud_rings"][0];
        assert_eq!(ring["ring_id"], "RING_001");
        assert_eq!(ring["pattern_type"], "cycle_length_3");
        assert_eq!(ring["member_accounts"].as_array().unwrap().len(), 3);
        assert!(ring["risk_score"].is_number());
        assert!(json["graph"]["edges"][0]["weight"].is_u64());
    }

    #[tokio::test]
    async fn test_edge_time_span_and_no_negative_zero() {
        let mut txs = cycle_with_bystander();
        txs.push(Transaction::new(
            "T5",
            "Q",
            "R",
            40.0,
            Utc.with_ymd_and_hms(2024, 5, 11, 9, 30, 0).unwrap(),
        ));
        let outcome = Pipeline::default().run(txs).await.unwrap();
        let report = AnalysisReport::from_outcome(&outcome, &ReportingConfig::default());

        let edge = report
            .graph
            .edges
            .iter()
            .find(|e| e.source == "Q" && e.target == "R")
            .unwrap();
        assert_eq!(edge.weight, 2);
        assert_eq!(
            edge.first_timestamp,
            Utc.with_ymd_and_hms(2024, 5, 10, 11, 0, 0).unwrap()
        );
        assert_eq!(
            edge.last_timestamp,
            Utc.with_ymd_and_hms(2024, 5, 11, 9, 30, 0).unwrap()
        );

        for score in outcome.anomaly.scores.values() {
            assert!(score.is_sign_positive());
        }
        let json = report.to_json(false).unwrap();
        assert!(!json.contains("-0.0"));
    }
}
