//! Single-writer actor engine.
//!
//! One owner thread holds an un-partitioned map and is the only code that
//! ever touches it, so the map needs no lock. Every public operation becomes
//! a [`Command`] with a private one-slot reply channel, pushed onto a bounded
//! inbox. The owner drains the inbox strictly in arrival order and sends
//! exactly one reply per command before taking the next.
//!
//! Because one thread applies every operation, the engine is totally
//! ordered: `get_all` observes every operation that arrived before it and
//! none that arrived after. Records are kept in identifier order, which is
//! also creation order.

use crate::alloc::IdAllocator;
use crate::config::Backend;
use crate::error::{StoreError, StoreResult};
use crate::record::{Record, RecordId};
use crate::store::{Closable, RecordStore};
use crossbeam_channel::{bounded, select, Receiver, Sender};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::thread::{self, JoinHandle};

/// A request to the owner thread.
enum Command {
    Create {
        record: Record,
        reply: Sender<RecordId>,
    },
    Get {
        id: RecordId,
        reply: Sender<StoreResult<Record>>,
    },
    GetAll {
        reply: Sender<Vec<Record>>,
    },
    Update {
        id: RecordId,
        record: Record,
        reply: Sender<StoreResult<()>>,
    },
    Delete {
        id: RecordId,
        reply: Sender<StoreResult<()>>,
    },
}

/// State private to the owner thread.
struct Owner {
    records: BTreeMap<RecordId, Record>,
    ids: IdAllocator,
}

impl Owner {
    fn apply(&mut self, command: Command) {
        // A caller that went away just drops its receiver; ignore send errors.
        match command {
            Command::Create { mut record, reply } => {
                let id = self.ids.allocate();
                record.id = id;
                self.records.insert(id, record);
                let _ = reply.send(id);
            }
            Command::Get { id, reply } => {
                let result = self
                    .records
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| StoreError::not_found(id));
                let _ = reply.send(result);
            }
            Command::GetAll { reply } => {
                let _ = reply.send(self.records.values().cloned().collect());
            }
            Command::Update { id, record, reply } => {
                let result = match self.records.get_mut(&id) {
                    Some(slot) => {
                        *slot = record.with_id(id);
                        Ok(())
                    }
                    None => Err(StoreError::not_found(id)),
                };
                let _ = reply.send(result);
            }
            Command::Delete { id, reply } => {
                let result = match self.records.remove(&id) {
                    Some(_) => Ok(()),
                    None => Err(StoreError::not_found(id)),
                };
                let _ = reply.send(result);
            }
        }
    }

    fn run(mut self, inbox: Receiver<Command>, stop: Receiver<()>) {
        loop {
            select! {
                recv(stop) -> _ => break,
                recv(inbox) -> command => match command {
                    Ok(command) => self.apply(command),
                    Err(_) => break,
                },
            }
        }
        tracing::debug!(records = self.records.len(), "actor owner exited");
    }
}

/// Engine whose state is owned by a single thread.
pub struct ActorStore {
    inbox: Sender<Command>,
    stop: Mutex<Option<Sender<()>>>,
    stopped: Receiver<()>,
    owner: Mutex<Option<JoinHandle<()>>>,
}

impl ActorStore {
    /// Starts the owner thread with an inbox of `queue_capacity` slots.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a zero capacity and `Storage` if the
    /// owner thread cannot be spawned.
    pub fn spawn(queue_capacity: usize) -> StoreResult<Self> {
        if queue_capacity == 0 {
            return Err(StoreError::invalid_argument(
                "actor queue capacity must be at least 1",
            ));
        }

        let (inbox_tx, inbox_rx) = bounded(queue_capacity);
        let (stop_tx, stop_rx) = bounded::<()>(0);
        let owner = Owner {
            records: BTreeMap::new(),
            ids: IdAllocator::new(),
        };

        let handle = thread::Builder::new()
            .name("recdb-actor".into())
            .spawn({
                let stop_rx = stop_rx.clone();
                move || owner.run(inbox_rx, stop_rx)
            })
            .map_err(|e| StoreError::storage(format!("failed to spawn actor owner: {e}")))?;

        tracing::debug!(queue_capacity, "actor store opened");

        Ok(Self {
            inbox: inbox_tx,
            stop: Mutex::new(Some(stop_tx)),
            stopped: stop_rx,
            owner: Mutex::new(Some(handle)),
        })
    }

    /// Number of commands waiting in the inbox.
    pub fn queued(&self) -> usize {
        self.inbox.len()
    }

    /// True until [`ActorStore::shutdown`] runs.
    pub fn is_running(&self) -> bool {
        self.stop.lock().is_some()
    }

    /// Stops the owner thread and waits for it to exit.
    ///
    /// Callers blocked on a queued or in-flight command get `Closed` unless
    /// their reply was already sent.
    pub fn shutdown(&self) {
        let Some(stop) = self.stop.lock().take() else {
            return;
        };
        drop(stop);

        if let Some(handle) = self.owner.lock().take() {
            if handle.join().is_err() {
                tracing::warn!("actor owner panicked");
            }
        }
        tracing::info!("actor store shut down");
    }

    fn call<T>(&self, command: impl FnOnce(Sender<T>) -> Command) -> StoreResult<T> {
        let (reply_tx, reply_rx) = bounded(1);
        let command = command(reply_tx);

        // The stop channel only ever disconnects, so its arm fires once
        // shutdown has started.
        select! {
            send(self.inbox, command) -> sent => sent.map_err(|_| StoreError::Closed)?,
            recv(self.stopped) -> _ => return Err(StoreError::Closed),
        }
        select! {
            recv(reply_rx) -> reply => reply.map_err(|_| StoreError::Closed),
            recv(self.stopped) -> _ => reply_rx.try_recv().map_err(|_| StoreError::Closed),
        }
    }
}

impl RecordStore for ActorStore {
    fn create(&self, record: &mut Record) -> StoreResult<()> {
        if record.id.is_assigned() {
            return Err(StoreError::invalid_argument(format!(
                "record already carries id {}",
                record.id
            )));
        }
        let pending = record.clone();
        let id = self.call(|reply| Command::Create {
            record: pending,
            reply,
        })?;
        record.id = id;
        Ok(())
    }

    fn get_by_id(&self, id: RecordId) -> StoreResult<Record> {
        self.call(|reply| Command::Get { id, reply })?
    }

    fn get_all(&self) -> StoreResult<Vec<Record>> {
        self.call(|reply| Command::GetAll { reply })
    }

    fn update(&self, id: RecordId, record: Record) -> StoreResult<()> {
        self.call(|reply| Command::Update { id, record, reply })?
    }

    fn delete(&self, id: RecordId) -> StoreResult<()> {
        self.call(|reply| Command::Delete { id, reply })?
    }

    fn backend(&self) -> Backend {
        Backend::Actor
    }
}

impl Closable for ActorStore {
    fn close(&self) {
        self.shutdown();
    }
}

impl Drop for ActorStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Status;
    use std::sync::Arc;

    fn store() -> ActorStore {
        ActorStore::spawn(64).unwrap()
    }

    #[test]
    fn create_and_get() {
        let store = store();
        let mut record = Record::new("a", Status::Active);
        store.create(&mut record).unwrap();
        assert_eq!(record.id, RecordId::new(1));
        assert_eq!(store.get_by_id(record.id).unwrap(), record);
    }

    #[test]
    fn missing_ids_not_found() {
        let store = store();
        let id = RecordId::new(7);
        assert!(store.get_by_id(id).unwrap_err().is_not_found());
        assert!(store
            .update(id, Record::new("x", Status::Active))
            .unwrap_err()
            .is_not_found());
        assert!(store.delete(id).unwrap_err().is_not_found());
    }

    #[test]
    fn get_all_reflects_caller_order() {
        let store = store();
        let mut ids = Vec::new();
        for name in ["a", "b", "c", "d"] {
            let mut r = Record::new(name, Status::Inactive);
            store.create(&mut r).unwrap();
            ids.push(r.id);
        }
        store
            .update(ids[1], Record::new("b2", Status::Active))
            .unwrap();
        store.delete(ids[2]).unwrap();

        let names: Vec<_> = store.get_all().unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["a", "b2", "d"]);
    }

    #[test]
    fn update_keeps_id() {
        let store = store();
        let mut record = Record::new("a", Status::Inactive);
        store.create(&mut record).unwrap();

        let moved = Record::new("b", Status::Active).with_id(RecordId::new(500));
        store.update(record.id, moved).unwrap();

        let stored = store.get_by_id(record.id).unwrap();
        assert_eq!(stored.id, record.id);
        assert_eq!(stored.name, "b");
        assert!(store.get_by_id(RecordId::new(500)).is_err());
    }

    #[test]
    fn concurrent_callers_see_own_records() {
        let store = Arc::new(ActorStore::spawn(4).unwrap());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..100 {
                        let mut r = Record::new(format!("{t}-{i}"), Status::Active);
                        store.create(&mut r).unwrap();
                        let back = store.get_by_id(r.id).unwrap();
                        assert_eq!(back.name, format!("{t}-{i}"));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let all = store.get_all().unwrap();
        assert_eq!(all.len(), 800);
        assert!(all.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[test]
    fn closed_after_shutdown() {
        let store = store();
        assert!(store.is_running());
        store.shutdown();
        store.shutdown();
        assert!(!store.is_running());

        let mut record = Record::new("a", Status::Active);
        assert!(matches!(store.create(&mut record), Err(StoreError::Closed)));
        assert!(matches!(store.get_all(), Err(StoreError::Closed)));
    }

    #[test]
    fn shutdown_releases_blocked_callers() {
        use crossbeam_channel::unbounded;
        use std::time::Duration;

        for _ in 0..50 {
            let store = Arc::new(ActorStore::spawn(4).unwrap());
            let (done_tx, done_rx) = unbounded();
            for t in 0..8 {
                let store = Arc::clone(&store);
                let done = done_tx.clone();
                thread::spawn(move || {
                    for i in 0..2_000 {
                        let mut r = Record::new(format!("{t}-{i}"), Status::Active);
                        if store.create(&mut r).is_err() {
                            break;
                        }
                    }
                    done.send(()).unwrap();
                });
            }
            drop(done_tx);

            thread::sleep(Duration::from_millis(2));
            store.shutdown();

            for _ in 0..8 {
                done_rx
                    .recv_timeout(Duration::from_secs(3))
                    .expect("caller still blocked after shutdown");
            }
        }
    }

    #[test]
    fn zero_capacity_rejected() {
        assert!(matches!(
            ActorStore::spawn(0),
            Err(StoreError::InvalidArgument { .. })
        ));
    }
}
