//! Chain execution surface.
//!
//! Chains are queued on an mpsc channel to a dispatcher task, which spawns
//! each one under a semaphore bound. Results come back on a oneshot per
//! chain.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Semaphore};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::chain::{Chain, ChainContext};
use crate::error::{ChainError, ChainKind};
use crate::orchestrator::Orchestrator;

const QUEUE_DEPTH: usize = 64;

pub type ChainResult = Result<ChainContext, ChainError>;

struct ChainJob {
    chain: Chain,
    respond_to: oneshot::Sender<ChainResult>,
}

/// Handle to a running executor. Dropping every clone stops the dispatcher
/// once the queue drains.
#[derive(Clone)]
pub struct ChainExecutor {
    jobs: mpsc::Sender<ChainJob>,
}

impl ChainExecutor {
    /// Spawn the dispatcher on the current runtime.
    pub fn start(orchestrator: Arc<Orchestrator>, max_concurrent: usize) -> Self {
        let (tx, rx) = mpsc::channel::<ChainJob>(QUEUE_DEPTH);
        let limit = Arc::new(Semaphore::new(max_concurrent.max(1)));
        tokio::spawn(dispatcher(orchestrator, limit, rx));
        Self { jobs: tx }
    }

    pub async fn submit(&self, chain: Chain) -> ChainHandle {
        let (respond_to, rx) = oneshot::channel();
        let id = chain.id;
        let kind = chain.kind;
        if self.jobs.send(ChainJob { chain, respond_to }).await.is_err() {
            warn!(chain = %kind, chain_id = %id, "executor stopped; chain not queued");
        }
        ChainHandle { id, kind, rx }
    }

    /// Submit every chain before waiting on any of them.
    pub async fn submit_group(&self, chains: Vec<Chain>) -> GroupHandle {
        let mut handles = Vec::with_capacity(chains.len());
        for chain in chains {
            handles.push(self.submit(chain).await);
        }
        GroupHandle { handles }
    }
}

async fn dispatcher(
    orchestrator: Arc<Orchestrator>,
    limit: Arc<Semaphore>,
    mut rx: mpsc::Receiver<ChainJob>,
) {
    while let Some(job) = rx.recv().await {
        let Ok(permit) = limit.clone().acquire_owned().await else {
            break;
        };
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move {
            let result = orchestrator.execute(job.chain).await;
            if job.respond_to.send(result).is_err() {
                debug!("chain result dropped; handle no longer awaited");
            }
            drop(permit);
        });
    }
    debug!("chain dispatcher stopped");
}

pub struct ChainHandle {
    id: Uuid,
    kind: ChainKind,
    rx: oneshot::Receiver<ChainResult>,
}

impl ChainHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> ChainKind {
        self.kind
    }

    pub async fn await_result(self) -> ChainResult {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err(ChainError::executor_stopped(self.kind)),
        }
    }
}

pub struct GroupHandle {
    handles: Vec<ChainHandle>,
}

impl GroupHandle {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Every chain's outcome, in submission order.
    pub async fn await_all(self) -> Vec<ChainResult> {
        let mut out = Vec::with_capacity(self.handles.len());
        for handle in self.handles {
            out.push(handle.await_result().await);
        }
        out
    }
}
