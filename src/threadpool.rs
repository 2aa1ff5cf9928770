use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use anyhow::Result;
use tracing::error;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-size pool of worker threads for connection handling.
pub struct ThreadPool {
    workers: Vec<Worker>,
    sender: Option<mpsc::Sender<Job>>,
}

impl ThreadPool {
    pub fn build(size: usize) -> Result<ThreadPool> {
        if size == 0 {
            anyhow::bail!("Pool size must be greater than zero");
        }

        let (sender, receiver) = mpsc::channel();
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..size)
            .map(|id| Worker::new(id, Arc::clone(&receiver)))
            .collect();

        Ok(ThreadPool {
            workers,
            sender: Some(sender),
        })
    }

    pub fn execute<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Some(sender) = &self.sender {
            if sender.send(Box::new(f)).is_err() {
                error!("Worker channel closed; dropping job");
            }
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        // closing the channel makes every worker's recv fail and exit
        drop(self.sender.take());

        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                if thread.join().is_err() {
                    error!("Worker {id} panicked", id = worker.id);
                }
            }
        }
    }
}

struct Worker {
    id: usize,
    thread: Option<thread::JoinHandle<()>>,
}

impl Worker {
    fn new(id: usize, receiver: Arc<Mutex<mpsc::Receiver<Job>>>) -> Worker {
        let thread = thread::spawn(move || loop {
            let job = {
                let receiver = match receiver.lock() {
                    Ok(receiver) => receiver,
                    Err(_) => break,
                };
                receiver.recv()
            };

            match job {
                Ok(job) => job(),
                Err(_) => break,
            }
        });

        Worker {
            id,
            thread: Some(thread),
        }
    }
}
