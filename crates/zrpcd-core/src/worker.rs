//! Worker pool (§4.3, §4.5 concurrency model).
//!
//! Each worker owns exactly one [`ChildChannel`] for its whole lifetime, but
//! all workers drain the same single bounded queue — whichever worker is
//! free next takes the next request, with no affinity to a particular
//! worker (§2, §4.3, §9 testable property 5). A busy worker never starves
//! an idle one: the queue's one shared capacity (not `num_workers` times
//! that) is the only bound on how far the dispatch loop can run ahead of
//! the pool.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::channel::ChildChannel;
use crate::dispatcher::{Dispatcher, HandlerContext};
use crate::error::DaemonError;
use crate::output::OutputSink;
use crate::protocol::{error_codes, Request, Response};
use crate::stream::StreamManager;

const DEFAULT_QUEUE_CAPACITY: usize = 100;

pub struct WorkerPoolConfig {
    pub num_workers: usize,
    pub queue_capacity: usize,
    pub helper_path: PathBuf,
}

impl WorkerPoolConfig {
    pub fn new(num_workers: usize, helper_path: PathBuf) -> Self {
        Self {
            num_workers,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            helper_path,
        }
    }
}

/// Front door to the pool: a single shared queue every worker drains from,
/// plus a join handle per worker for the daemon's shutdown drain.
pub struct WorkerPool {
    sender: mpsc::Sender<Request>,
    num_workers: usize,
    tasks: Vec<tokio::task::JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns every worker's helper channel up front, all sharing one
    /// bounded queue. Returns `DaemonError::NoWorkersReady` only if every
    /// single spawn failed; a partial failure is logged per-worker and the
    /// pool runs with fewer workers than requested (§4.3: reduced capacity
    /// beats refusing to start when at least one helper is usable).
    pub async fn spawn(
        config: WorkerPoolConfig,
        dispatcher: Arc<Dispatcher>,
        output: Arc<OutputSink>,
    ) -> Result<Self, DaemonError> {
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let queue = Arc::new(Mutex::new(rx));

        let mut tasks = Vec::with_capacity(config.num_workers);
        let mut ready_workers = 0;

        for worker_id in 0..config.num_workers {
            let channel = match ChildChannel::spawn(&config.helper_path, worker_id).await {
                Ok(channel) => channel,
                Err(err) => {
                    tracing::error!(worker_id, error = %err, "worker failed to start, skipping");
                    continue;
                }
            };

            let worker = Worker {
                worker_id,
                channel,
                stream: StreamManager::new(),
                dispatcher: Arc::clone(&dispatcher),
                output: Arc::clone(&output),
            };
            tasks.push(tokio::spawn(worker.run(Arc::clone(&queue))));
            ready_workers += 1;
        }

        if ready_workers == 0 {
            return Err(DaemonError::NoWorkersReady);
        }

        Ok(Self {
            sender: tx,
            num_workers: ready_workers,
            tasks,
        })
    }

    pub fn available(&self) -> usize {
        self.num_workers
    }

    /// Hands the request to the shared queue; whichever worker becomes free
    /// first dequeues it next. No affinity between a request and a worker.
    pub async fn enqueue(&self, request: Request) {
        if self.sender.send(request).await.is_err() {
            tracing::error!("worker queue closed, dropping request");
        }
    }

    /// Drops the sender so workers observe channel closure once the shared
    /// queue drains, then waits for every worker task to exit (§6 Shutdown:
    /// EOF on stdin drains in-flight work before exiting).
    pub async fn shutdown(self) {
        drop(self.sender);
        for task in self.tasks {
            let _ = task.await;
        }
    }
}

struct Worker {
    worker_id: usize,
    channel: ChildChannel,
    stream: StreamManager,
    dispatcher: Arc<Dispatcher>,
    output: Arc<OutputSink>,
}

impl Worker {
    /// Locks the shared queue only to pull the next request, releasing it
    /// immediately so other idle workers can race for the one after —
    /// holding the lock across `handle` would serialize the whole pool.
    async fn run(mut self, queue: Arc<Mutex<mpsc::Receiver<Request>>>) {
        loop {
            let request = {
                let mut queue = queue.lock().await;
                queue.recv().await
            };
            let Some(request) = request else {
                break;
            };
            let response = self.handle(request).await;
            if let Err(err) = self.output.emit(&response) {
                tracing::error!(worker_id = self.worker_id, error = %err, "failed to write response");
            }
        }
    }

    async fn handle(&mut self, request: Request) -> Response {
        let Some(handler) = self.dispatcher.get(&request.method) else {
            return Response::failure(
                Some(request.id),
                error_codes::METHOD_NOT_FOUND,
                format!("Unrecognized command {}", request.method),
            );
        };

        let mut ctx = HandlerContext {
            channel: &mut self.channel,
            stream: &self.stream,
            output: Arc::clone(&self.output),
        };

        match handler(&mut ctx, request.params).await {
            Ok(result) => Response::success(request.id, result),
            Err(handler_error) => Response::failure_with_data(
                Some(request.id),
                handler_error.code,
                handler_error.message,
                handler_error.data,
            ),
        }
    }
}
