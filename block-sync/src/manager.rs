//! `RequestManager`: wires the pending index, scheduler, ingest handlers,
//! promotion engine, and resume path into one embeddable component.

use crate::config::RequestManagerConfig;
use crate::error::RequestManagerError;
use crate::pending::Status;
use crate::promotion;
use crate::scheduler::{self, SyncState};
use crate::traits::{ChainStore, Consensus, Dispatcher};
use chain_types::{Block, BlockHeader, Hash256};
use libp2p::PeerId;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn, Instrument};

/// The Block Request Manager: a concurrent, rate-limited scheduler over a
/// DAG of in-flight block fetches, with expiration, retry, peer selection,
/// and orphan-parent buffering.
///
/// Cheap to clone — every field is an `Arc` (or `Arc`-equivalent), so
/// `start` can hand a clone to its background task without lifetime
/// gymnastics.
#[derive(Clone)]
pub struct RequestManager {
    state: Arc<RwLock<SyncState>>,
    chain_store: Arc<dyn ChainStore>,
    consensus: Arc<dyn Consensus>,
    dispatcher: Arc<dyn Dispatcher>,
    config: Arc<RequestManagerConfig>,
    cancel: CancellationToken,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl RequestManager {
    pub fn new(
        chain_store: Arc<dyn ChainStore>,
        consensus: Arc<dyn Consensus>,
        dispatcher: Arc<dyn Dispatcher>,
        config: RequestManagerConfig,
    ) -> Self {
        Self {
            state: Arc::new(RwLock::new(SyncState::default())),
            chain_store,
            consensus,
            dispatcher,
            config: Arc::new(config),
            cancel: CancellationToken::new(),
            worker: Arc::new(Mutex::new(None)),
        }
    }

    /// Spawns the scheduler loop as a background task. Idempotent only in
    /// the sense that calling it twice spawns two loops sharing state —
    /// callers are expected to call it once per manager instance.
    pub fn start(&self) {
        let manager = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(manager.config.scheduler_tick_interval);
            loop {
                tokio::select! {
                    _ = manager.cancel.cancelled() => {
                        info!("block request manager scheduler observed cancellation");
                        break;
                    }
                    _ = ticker.tick() => {
                        manager.tick(Instant::now()).await;
                    }
                }
            }
        });
        *self.worker.lock().expect("worker mutex poisoned") = Some(handle);
    }

    /// Runs exactly one scheduler pass. `start` drives this on a timer;
    /// exposed directly for embedders (and tests) that want to step the
    /// scheduler deterministically instead of running the background loop.
    ///
    /// Every log event emitted by the pass is scoped under a
    /// `request_manager` span, carrying the consensus engine's node id when
    /// `log_self_id` is configured (§4.J).
    pub async fn tick(&self, now: Instant) {
        let span = if self.config.log_self_id {
            tracing::info_span!("request_manager", node_id = %self.consensus.id())
        } else {
            tracing::info_span!("request_manager")
        };

        async {
            let mut state = self.state.write().await;
            scheduler::run_tick(
                &mut state,
                self.chain_store.as_ref(),
                self.consensus.as_ref(),
                self.dispatcher.as_ref(),
                &self.config,
                now,
            )
            .await;
        }
        .instrument(span)
        .await;
    }

    /// Requests cooperative shutdown of the scheduler loop. Does not cancel
    /// in-flight requests; late responses are tolerated by the ingest
    /// handlers (§5: "in-flight requests are not actively revoked").
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Waits for the scheduler loop to observe cancellation and exit.
    pub async fn wait(&self) {
        let handle = self.worker.lock().expect("worker mutex poisoned").take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                warn!(error = %err, "scheduler task panicked");
            }
        }
    }

    /// A hash is only "done" once the chain store has it past `Pending` —
    /// a store entry that is itself still pending (e.g. left over from an
    /// interrupted session) is exactly what `resume` needs to keep driving
    /// through the normal ingest path, not something to skip over.
    async fn is_admitted(&self, hash: &Hash256) -> bool {
        matches!(self.chain_store.find_block(hash).await, Ok(ext) if !ext.status.is_pending())
    }

    /// Ingest entry point for a hash advertisement (e.g. from inventory
    /// gossip). Thread-safe; callable concurrently from many dispatcher
    /// threads.
    pub async fn add_hash(&self, hash: Hash256, peers: Vec<PeerId>) {
        if self.is_admitted(&hash).await {
            trace!(%hash, "ignoring hash already admitted");
            return;
        }

        let mut state = self.state.write().await;
        if !state.index.contains(&hash) {
            state.index.insert_new(hash, peers);
            return;
        }

        let pb = state.index.get_mut(&hash).expect("just checked contains");
        if pb.body.is_some() {
            return;
        }
        pb.add_peers(peers);
    }

    /// Ingest entry point for a header arriving from a peer.
    pub async fn add_header(&self, header: BlockHeader) {
        let hash = header.hash();
        if self.is_admitted(&hash).await {
            trace!(%hash, "ignoring header for already-admitted block");
            return;
        }

        let mut state = self.state.write().await;
        if !state.index.contains(&hash) {
            state.index.insert_new(hash, vec![]);
        }

        let height = header.height;
        let pb = state.index.get_mut(&hash).expect("just inserted or already present");
        pb.header = Some(header);
        pb.status = Status::WantBody;
        state.index.header_heap.push(height, hash);
    }

    /// Ingest entry point for a full block body arriving from a peer.
    pub async fn add_block(&self, block: Block) {
        let hash = block.hash;
        self.add_hash(hash, Vec::new()).await;

        let mut state = self.state.write().await;
        let Some(pb) = state.index.get_mut(&hash) else {
            // Already admitted: `add_hash` found it in the chain store and
            // made no pending entry for it.
            return;
        };

        if let Some(header) = &pb.header {
            let computed = block.body.tx_root();
            if computed != header.tx_root {
                warn!(%hash, "block body tx-root does not match known header, discarding");
                return;
            }
        }

        pb.body = Some(block.body.clone());
        // Body is known now, so neither Awaiting* status may stand (§8
        // invariant 4: `AwaitingData ⇒ body==nil`, `AwaitingBody ⇒ body==nil`).
        pb.status = if pb.header.is_some() { Status::WantBody } else { Status::WantData };
        let header = pb.header.clone();
        let parent = block.parent_hash();

        match self.chain_store.find_block(&parent).await {
            Ok(ext) if !ext.status.is_pending() => {
                let ready = Block::new(hash, header, block.body);
                promotion::dump_ready_blocks(
                    &mut state.index,
                    self.chain_store.as_ref(),
                    self.dispatcher.as_ref(),
                    ready,
                )
                .await;
            }
            _ => {
                // Orphaned: parent not yet admitted. The block now sits in
                // the parent index with a body attached; the scheduler's
                // download passes skip it outright once `body.is_some()`.
                state.index.add_to_parent_index(parent, hash);
            }
        }
    }

    /// Sweeps every pending block with a known body and promotes any whose
    /// parent is now admitted. A reconciling pass independent of any
    /// specific ingest event.
    pub async fn reconcile(&self) {
        let mut state = self.state.write().await;
        promotion::dump_all_ready_blocks(
            &mut state.index,
            self.chain_store.as_ref(),
            self.dispatcher.as_ref(),
        )
        .await;
    }

    /// Walks the chain store from the last finalized block, re-submitting
    /// the body of any still-`Pending` block so interrupted sync resumes
    /// driving it toward admission.
    ///
    /// A chain-store error encountered while walking an already-known block
    /// is the one case this crate treats as a propagated failure rather
    /// than a silently-dropped event (§7).
    pub async fn resume(&self) -> Result<(), RequestManagerError> {
        let lfb = self.consensus.get_last_finalized_block().await;

        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(lfb.block.hash);
        queue.push_back(lfb.block.hash);

        while let Some(hash) = queue.pop_front() {
            let ext = match self.chain_store.find_block(&hash).await {
                Ok(ext) => ext,
                Err(err) => {
                    tracing::error!(%hash, error = %err, "chain store error walking resume set, aborting resume");
                    return Err(err.into());
                }
            };

            for child in &ext.children {
                if visited.insert(*child) {
                    queue.push_back(*child);
                }
            }

            if ext.status.is_pending() {
                debug!(%hash, "resuming still-pending block");
                self.add_block(ext.block).await;
            }
        }

        Ok(())
    }

    /// Number of blocks currently tracked as pending. Exposed for
    /// observability and tests.
    pub async fn pending_count(&self) -> usize {
        self.state.read().await.index.len()
    }
}
