//! Transaction graph data structures.

use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use ringwatch_core::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Aggregated sender→receiver relationship.
///
/// There is exactly one aggregate per ordered account pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeAggregate {
    /// Sender node index.
    pub source: usize,
    /// Receiver node index.
    pub target: usize,
    /// Sum of transferred amounts.
    pub amount: f64,
    /// Number of transactions (always ≥ 1).
    pub weight: u64,
    /// Earliest transaction between the pair.
    pub first_timestamp: DateTime<Utc>,
    /// Latest transaction between the pair.
    pub last_timestamp: DateTime<Utc>,
}

/// Per-account money flow totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeFlow {
    /// Total amount received.
    pub in_amount: f64,
    /// Total amount sent.
    pub out_amount: f64,
    /// Number of incoming transactions.
    pub in_count: usize,
    /// Number of outgoing transactions.
    pub out_count: usize,
}

impl NodeFlow {
    /// Total transactions the account took part in.
    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.in_count + self.out_count
    }
}

/// Directed transaction graph in Compressed Sparse Row form.
///
/// Nodes are accounts indexed in ascending account-id order. Edges are
/// stored sorted by `(source, target)`, so the out-edges of a node are a
/// contiguous slice with targets ascending. In-edges are kept as a second
/// CSR index over the same edge array.
#[derive(Debug, Clone, Default)]
pub struct TransactionGraph {
    accounts: Vec<String>,
    index: HashMap<String, usize>,
    edges: Vec<EdgeAggregate>,
    out_offsets: Vec<usize>,
    in_offsets: Vec<usize>,
    in_edge_ids: Vec<usize>,
    flows: Vec<NodeFlow>,
    transaction_count: usize,
}

impl TransactionGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            out_offsets: vec![0],
            in_offsets: vec![0],
            ..Default::default()
        }
    }

    /// Build the graph from a transaction set in one grouped pass.
    #[must_use]
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        if transactions.is_empty() {
            return Self::empty();
        }

        let ids: BTreeSet<&str> = transactions
            .iter()
            .flat_map(|t| [t.sender_id.as_str(), t.receiver_id.as_str()])
            .collect();
        let accounts: Vec<String> = ids.into_iter().map(str::to_string).collect();
        let index: HashMap<String, usize> = accounts
            .iter()
            .enumerate()
            .map(|(i, a)| (a.clone(), i))
            .collect();

        let n = accounts.len();
        let mut flows = vec![NodeFlow::default(); n];
        let mut slots: HashMap<(usize, usize), usize> = HashMap::new();
        let mut edges: Vec<EdgeAggregate> = Vec::new();

        for tx in transactions {
            let u = index[tx.sender_id.as_str()];
            let v = index[tx.receiver_id.as_str()];

            flows[u].out_amount += tx.amount;
            flows[u].out_count += 1;
            flows[v].in_amount += tx.amount;
            flows[v].in_count += 1;

            match slots.get(&(u, v)) {
                Some(&slot) => {
                    let edge = &mut edges[slot];
                    edge.amount += tx.amount;
                    edge.weight += 1;
                    edge.first_timestamp = edge.first_timestamp.min(tx.timestamp);
                    edge.last_timestamp = edge.last_timestamp.max(tx.timestamp);
                }
                None => {
                    slots.insert((u, v), edges.len());
                    edges.push(EdgeAggregate {
                        source: u,
                        target: v,
                        amount: tx.amount,
                        weight: 1,
                        first_timestamp: tx.timestamp,
                        last_timestamp: tx.timestamp,
                    });
                }
            }
        }

        edges.sort_by_key(|e| (e.source, e.target));

        let mut out_offsets = vec![0usize; n + 1];
        let mut in_offsets = vec![0usize; n + 1];
        for e in &edges {
            out_offsets[e.source + 1] += 1;
            in_offsets[e.target + 1] += 1;
        }
        for i in 0..n {
            out_offsets[i + 1] += out_offsets[i];
            in_offsets[i + 1] += in_offsets[i];
        }

        // Stable over the (source, target) order, so sources stay ascending.
        let mut in_edge_ids: Vec<usize> = (0..edges.len()).collect();
        in_edge_ids.sort_by_key(|&id| edges[id].target);

        Self {
            accounts,
            index,
            edges,
            out_offsets,
            in_offsets,
            in_edge_ids,
            flows,
            transaction_count: transactions.len(),
        }
    }

    /// Number of accounts.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.accounts.len()
    }

    /// Number of aggregated edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of transactions the graph was built from.
    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.transaction_count
    }

    /// Returns true if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Account ids in node-index order.
    #[must_use]
    pub fn accounts(&self) -> &[String] {
        &self.accounts
    }

    /// Account id of a node.
    #[must_use]
    pub fn account(&self, node: usize) -> &str {
        &self.accounts[node]
    }

    /// Node index of an account.
    #[must_use]
    pub fn index_of(&self, account: &str) -> Option<usize> {
        self.index.get(account).copied()
    }

    /// All edges sorted by `(source, target)`.
    #[must_use]
    pub fn edges(&self) -> &[EdgeAggregate] {
        &self.edges
    }

    /// Outgoing edges of a node, targets ascending.
    #[must_use]
    pub fn out_edges(&self, node: usize) -> &[EdgeAggregate] {
        &self.edges[self.out_offsets[node]..self.out_offsets[node + 1]]
    }

    /// Incoming edges of a node, sources ascending.
    pub fn in_edges(&self, node: usize) -> impl Iterator<Item = &EdgeAggregate> + '_ {
        self.in_edge_ids[self.in_offsets[node]..self.in_offsets[node + 1]]
            .iter()
            .map(move |&id| &self.edges[id])
    }

    /// Successor node indices, ascending.
    pub fn successors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.out_edges(node).iter().map(|e| e.target)
    }

    /// The aggregate for an ordered pair, if any.
    #[must_use]
    pub fn edge(&self, source: usize, target: usize) -> Option<&EdgeAggregate> {
        let out = self.out_edges(source);
        out.binary_search_by_key(&target, |e| e.target)
            .ok()
            .map(|i| &out[i])
    }

    /// Number of distinct receivers.
    #[must_use]
    pub fn out_degree(&self, node: usize) -> usize {
        self.out_offsets[node + 1] - self.out_offsets[node]
    }

    /// Number of distinct senders.
    #[must_use]
    pub fn in_degree(&self, node: usize) -> usize {
        self.in_offsets[node + 1] - self.in_offsets[node]
    }

    /// In-degree plus out-degree (a self-loop counts twice).
    #[must_use]
    pub fn degree(&self, node: usize) -> usize {
        self.in_degree(node) + self.out_degree(node)
    }

    /// Money flow totals of a node.
    #[must_use]
    pub fn flow(&self, node: usize) -> &NodeFlow {
        &self.flows[node]
    }
}

/// Community detection result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommunityResult {
    /// Community assignment per node.
    pub assignments: Vec<usize>,
    /// Number of communities found.
    pub num_communities: usize,
    /// Modularity of the final partition.
    pub modularity: f64,
    /// Number of contraction levels performed.
    pub levels: usize,
}

/// Centrality scores for every node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CentralityResult {
    /// Score per node index.
    pub scores: Vec<f64>,
    /// Number of iterations (for iterative algorithms).
    pub iterations: Option<u32>,
    /// Whether the algorithm converged.
    pub converged: bool,
}
