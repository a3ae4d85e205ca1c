//! End-to-end analysis pipeline.
//!
//! ```text
//! transactions -> graph -+-> graph intelligence -+
//!                        +-> cycle detection     |
//!                        +-> smurf detection     +-> risk fusion
//!                        +-> shell detection     |
//!                        +-> anomaly scoring ----+
//! ```
//!
//! The five middle stages share the graph through an `Arc` and run on the
//! tokio blocking pool. Fusion starts once all of them have finished.

use ringwatch_core::{
    config::AnalysisConfig,
    error::{AnalysisError, Result},
    ring::Ring,
    transaction::{self, Transaction},
};
use ringwatch_graph::builder::TransactionGraphBuilder;
use ringwatch_graph::intelligence::{GraphIntelligence, GraphIntelligenceResult};
use ringwatch_graph::types::TransactionGraph;
use ringwatch_ml::anomaly::AnomalyScorer;
use ringwatch_ml::types::AnomalyResult;
use ringwatch_patterns::cycle::CycleDetection;
use ringwatch_patterns::shell::ShellDetection;
use ringwatch_patterns::smurf::SmurfDetection;
use ringwatch_risk::fusion::RiskFusion;
use ringwatch_risk::types::RiskResult;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::report::AnalysisReport;

/// Everything one analysis run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Input transactions.
    pub transactions: Arc<Vec<Transaction>>,
    /// Aggregated transaction graph.
    pub graph: Arc<TransactionGraph>,
    /// Communities, components, centralities and hubs.
    pub intelligence: Arc<GraphIntelligenceResult>,
    /// Anomaly score per account.
    pub anomaly: Arc<AnomalyResult>,
    /// Rings in detector order: cycles, smurfing, shell chains.
    pub rings: Vec<Ring>,
    /// Fused risk per account.
    pub scores: BTreeMap<String, RiskResult>,
    /// Wall time of the whole run.
    pub elapsed: Duration,
}

/// Concurrent batch analysis over one transaction set.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: AnalysisConfig,
}

impl Pipeline {
    /// Create a pipeline with the given configuration.
    #[must_use]
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Effective configuration.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run every stage and return the raw outcome.
    ///
    /// This is the trust boundary for library callers: the configuration and
    /// every transaction are validated here, once, before any stage runs.
    /// Stages downstream assume a well-formed ledger.
    pub async fn run(&self, transactions: Vec<Transaction>) -> Result<PipelineOutcome> {
        let start = Instant::now();
        self.config.validate()?;
        transaction::validate_all(&transactions)?;

        let transactions = Arc::new(transactions);
        let graph = {
            let txs = Arc::clone(&transactions);
            Arc::new(
                blocking("graph", move || Ok(TransactionGraphBuilder::compute(&txs))).await?,
            )
        };
        tracing::info!(
            transactions = transactions.len(),
            accounts = graph.node_count(),
            edges = graph.edge_count(),
            "Transaction graph built"
        );

        let intelligence_task = {
            let graph = Arc::clone(&graph);
            let config = self.config.graph.clone();
            blocking("graph-intelligence", move || {
                Ok(GraphIntelligence::compute(&graph, &config))
            })
        };
        let cycle_task = {
            let graph = Arc::clone(&graph);
            let config = self.config.cycles.clone();
            blocking("cycle-detection", move || {
                Ok(CycleDetection::compute(&graph, &config))
            })
        };
        let smurf_task = {
            let txs = Arc::clone(&transactions);
            let config = self.config.smurf.clone();
            blocking("smurf-detection", move || {
                Ok(SmurfDetection::compute(&txs, &config))
            })
        };
        let shell_task = {
            let graph = Arc::clone(&graph);
            let config = self.config.shell.clone();
            blocking("shell-detection", move || {
                ShellDetection::compute(&graph, &config)
            })
        };
        let anomaly_task = {
            let txs = Arc::clone(&transactions);
            let graph = Arc::clone(&graph);
            let config = self.config.anomaly.clone();
            blocking("anomaly-scoring", move || {
                AnomalyScorer::compute(&txs, &graph, &config)
            })
        };

        let (intelligence, cycles, smurfs, shells, anomaly) = tokio::try_join!(
            intelligence_task,
            cycle_task,
            smurf_task,
            shell_task,
            anomaly_task
        )?;
        tracing::info!(
            communities = intelligence.clusters().len(),
            hubs = intelligence.hubs.len(),
            cycle_rings = cycles.len(),
            smurf_rings = smurfs.len(),
            shell_rings = shells.len(),
            outliers = anomaly.outliers.len(),
            "Detection stages complete"
        );

        let mut rings = cycles;
        rings.extend(smurfs);
        rings.extend(shells);

        let scores = RiskFusion::compute(
            &transactions,
            &graph,
            &intelligence,
            &anomaly,
            &rings,
            &self.config.risk,
        );

        let elapsed = start.elapsed();
        tracing::info!(
            accounts = scores.len(),
            rings = rings.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Analysis run complete"
        );

        Ok(PipelineOutcome {
            transactions,
            graph,
            intelligence: Arc::new(intelligence),
            anomaly: Arc::new(anomaly),
            rings,
            scores,
            elapsed,
        })
    }

    /// Run every stage and assemble the report.
    pub async fn analyze(&self, transactions: Vec<Transaction>) -> Result<AnalysisReport> {
        let outcome = self.run(transactions).await?;
        Ok(AnalysisReport::from_outcome(&outcome, &self.config.reporting))
    }
}

/// Run a CPU-bound stage on the blocking pool.
async fn blocking<T, F>(stage: &'static str, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AnalysisError::internal(format!("{stage} stage failed to complete: {e}")))?
}
