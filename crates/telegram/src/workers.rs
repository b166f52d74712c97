//! Per-chat ordered delivery.
//!
//! The polling loop must not process a chat's updates concurrently: replies
//! have to come back in the order the messages arrived. Each chat gets a
//! dedicated worker task fed through a channel; delivery into the channel
//! happens on the polling task in update order, so the worker handles one
//! message at a time in arrival order while other chats run in parallel.

use std::{future::Future, pin::Pin, sync::Arc};

use {dashmap::DashMap, tokio::sync::mpsc};

type Handler<T> = Arc<dyn Fn(T) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub(crate) struct ChatWorkers<T> {
    handler: Handler<T>,
    senders: DashMap<i64, mpsc::UnboundedSender<T>>,
}

impl<T: Send + 'static> ChatWorkers<T> {
    pub(crate) fn new(
        handler: impl Fn(T) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Arc::new(handler),
            senders: DashMap::new(),
        }
    }

    /// Queue one item for the chat's worker, spawning the worker on first
    /// use. Items queued from the same task run in queue order.
    pub(crate) fn deliver(&self, chat_id: i64, item: T) {
        let mut item = item;
        // A send only fails if the worker task died; replace it and requeue.
        loop {
            let tx = self
                .senders
                .entry(chat_id)
                .or_insert_with(|| Self::spawn_worker(&self.handler))
                .clone();
            match tx.send(item) {
                Ok(()) => return,
                Err(mpsc::error::SendError(returned)) => {
                    item = returned;
                    self.senders.remove(&chat_id);
                },
            }
        }
    }

    fn spawn_worker(handler: &Handler<T>) -> mpsc::UnboundedSender<T> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handler = Arc::clone(handler);
        tokio::spawn(async move {
            while let Some(item) = rx.recv().await {
                handler(item).await;
            }
        });
        tx
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Mutex, time::Duration};

    use super::*;

    #[tokio::test]
    async fn same_chat_items_run_in_delivery_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let workers = {
            let log = Arc::clone(&log);
            ChatWorkers::new(move |n: u64| {
                let log = Arc::clone(&log);
                Box::pin(async move {
                    // Earlier items sleep longer, so any concurrent handling
                    // would flip the order.
                    tokio::time::sleep(Duration::from_millis(50 - 10 * n)).await;
                    log.lock().unwrap().push(n);
                }) as Pin<Box<dyn Future<Output = ()> + Send>>
            })
        };

        for n in 0..5 {
            workers.deliver(1, n);
        }
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn chats_do_not_block_each_other() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let workers = {
            let log = Arc::clone(&log);
            ChatWorkers::new(move |(chat, slow): (i64, bool)| {
                let log = Arc::clone(&log);
                Box::pin(async move {
                    if slow {
                        tokio::time::sleep(Duration::from_millis(300)).await;
                    }
                    log.lock().unwrap().push(chat);
                }) as Pin<Box<dyn Future<Output = ()> + Send>>
            })
        };

        workers.deliver(1, (1, true));
        workers.deliver(2, (2, false));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*log.lock().unwrap(), vec![2]);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(*log.lock().unwrap(), vec![2, 1]);
    }
}
