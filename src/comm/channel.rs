use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender};

use super::{Communicator, ROOT};
use crate::error::{MinMaxError, Result};
use crate::pipeline::{Collector, PartitionTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Barrier,
    Min,
    Max,
    Gather,
}

impl Tag {
    fn name(self) -> &'static str {
        match self {
            Self::Barrier => "barrier",
            Self::Min => "all-reduce(min)",
            Self::Max => "all-reduce(max)",
            Self::Gather => "gather",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug)]
enum Payload {
    Signal,
    Scalar(f32),
    Samples(Vec<f32>),
}

#[derive(Debug)]
struct Envelope {
    from: usize,
    tag: Tag,
    // Position of the collective in the worker's call sequence
    epoch: u64,
    payload: Payload,
}

#[derive(Debug)]
enum Message {
    Data(Envelope),
    Abort { from: usize },
    // Sent when an endpoint is dropped, after everything it sent before
    Left { from: usize },
}

/// One worker's endpoint in an in-process message-passing group
///
/// Endpoints are created together by [`ChannelComm::cluster`] and each one is
/// moved into the thread that plays that worker. Messages that belong to a
/// later collective than the one in progress (a fast peer racing ahead) are
/// parked until that collective is entered.
///
/// Dropping an endpoint, also while its thread unwinds, tells every peer it
/// has left. A peer still waiting for its contribution then fails instead of
/// blocking.
#[derive(Debug)]
pub struct ChannelComm {
    rank: usize,
    // `None` at `rank`: an endpoint never holds a sender to its own inbox
    peers: Vec<Option<Sender<Message>>>,
    inbox: Receiver<Message>,
    parked: RefCell<VecDeque<Envelope>>,
    departed: RefCell<Vec<bool>>,
    epoch: Cell<u64>,
}

impl ChannelComm {
    /// Create the `size` connected endpoints of one group, in rank order
    ///
    /// # Errors
    ///
    /// Returns [`MinMaxError::Config`] when `size` is zero
    pub fn cluster(size: usize) -> Result<Vec<Self>> {
        if size == 0 {
            return Err(MinMaxError::Config(
                "a worker group needs at least one worker".to_string(),
            ));
        }

        let (senders, receivers): (Vec<_>, Vec<_>) = (0..size).map(|_| mpsc::channel()).unzip();

        Ok(receivers
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| Self {
                rank,
                peers: senders
                    .iter()
                    .enumerate()
                    .map(|(peer, sender)| (peer != rank).then(|| sender.clone()))
                    .collect(),
                inbox,
                parked: RefCell::new(VecDeque::new()),
                departed: RefCell::new(vec![false; size]),
                epoch: Cell::new(0),
            })
            .collect())
    }

    fn next_epoch(&self) -> u64 {
        let epoch = self.epoch.get();
        self.epoch.set(epoch + 1);
        epoch
    }

    fn others(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.peers.len()).filter(move |&peer| peer != self.rank)
    }

    fn send(&self, to: usize, tag: Tag, epoch: u64, payload: Payload) -> Result<()> {
        let envelope = Envelope {
            from: self.rank,
            tag,
            epoch,
            payload,
        };
        let left = || collective_error(tag, self.rank, format!("worker {to} has left the group"));
        self.peers
            .get(to)
            .and_then(Option::as_ref)
            .ok_or_else(left)?
            .send(Message::Data(envelope))
            .map_err(|_| left())
    }

    /// Message of collective `epoch` from `from`, parking everything else
    fn receive(&self, from: usize, tag: Tag, epoch: u64) -> Result<Envelope> {
        let left = || collective_error(tag, self.rank, format!("worker {from} left the group before {tag}"));

        let mut parked = self.parked.borrow_mut();
        let envelope = match parked.iter().position(|e| e.from == from && e.epoch == epoch) {
            Some(pos) => parked.remove(pos),
            None => None,
        };

        let envelope = match envelope {
            Some(envelope) => envelope,
            // Channels are FIFO per sender: nothing of `from` follows its notice
            None if self.departed.borrow()[from] => return Err(left()),
            None => loop {
                match self.inbox.recv() {
                    Ok(Message::Data(envelope)) if envelope.from == from && envelope.epoch == epoch => break envelope,
                    Ok(Message::Data(envelope)) => parked.push_back(envelope),
                    Ok(Message::Left { from: peer }) => {
                        self.departed.borrow_mut()[peer] = true;
                        if peer == from {
                            return Err(left());
                        }
                    }
                    Ok(Message::Abort { from }) => {
                        return Err(collective_error(
                            tag,
                            self.rank,
                            format!("worker {from} aborted the run"),
                        ));
                    }
                    Err(_) => {
                        return Err(collective_error(tag, self.rank, "every peer has left the group"));
                    }
                }
            },
        };

        if envelope.tag != tag {
            return Err(collective_error(
                tag,
                self.rank,
                format!("worker {} entered {} instead", envelope.from, envelope.tag),
            ));
        }
        Ok(envelope)
    }

    fn notify(&self, message: impl Fn(usize) -> Message) {
        for sender in self.peers.iter().flatten() {
            // Peers that already left do not need the notice
            let _ = sender.send(message(self.rank));
        }
    }

    fn all_reduce(&self, tag: Tag, value: f32, combine: fn(f32, f32) -> f32) -> Result<f32> {
        let epoch = self.next_epoch();
        for peer in self.others() {
            self.send(peer, tag, epoch, Payload::Scalar(value))?;
        }

        let mut contributions = vec![None; self.size()];
        contributions[self.rank] = Some(value);
        for peer in self.others() {
            let envelope = self.receive(peer, tag, epoch)?;
            let Payload::Scalar(v) = envelope.payload else {
                return Err(collective_error(tag, self.rank, "expected a scalar contribution"));
            };
            contributions[envelope.from] = Some(v);
        }

        // Fold in rank order so every worker computes the identical value
        contributions
            .into_iter()
            .flatten()
            .reduce(combine)
            .ok_or_else(|| collective_error(tag, self.rank, "no contributions"))
    }
}

fn collective_error(tag: Tag, rank: usize, reason: impl ToString) -> MinMaxError {
    MinMaxError::collective(tag.name(), rank, reason)
}

impl Communicator for ChannelComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.peers.len()
    }

    fn barrier(&self) -> Result<()> {
        let epoch = self.next_epoch();
        for peer in self.others() {
            self.send(peer, Tag::Barrier, epoch, Payload::Signal)?;
        }
        for peer in self.others() {
            self.receive(peer, Tag::Barrier, epoch)?;
        }
        Ok(())
    }

    fn all_reduce_min(&self, value: f32) -> Result<f32> {
        self.all_reduce(Tag::Min, value, |a, b| if b < a { b } else { a })
    }

    fn all_reduce_max(&self, value: f32) -> Result<f32> {
        self.all_reduce(Tag::Max, value, |a, b| if b > a { b } else { a })
    }

    fn gather_to_root(&self, local: &[f32], table: &PartitionTable) -> Result<Option<Vec<f32>>> {
        let epoch = self.next_epoch();

        if self.rank != ROOT {
            self.send(ROOT, Tag::Gather, epoch, Payload::Samples(local.to_vec()))?;
            return Ok(None);
        }

        let mut collector = Collector::new(table);
        collector.accept(ROOT, local)?;
        for peer in self.others() {
            let envelope = self.receive(peer, Tag::Gather, epoch)?;
            let Payload::Samples(samples) = envelope.payload else {
                return Err(collective_error(Tag::Gather, self.rank, "expected a sample contribution"));
            };
            collector.accept(envelope.from, &samples)?;
        }
        collector.finish().map(Some)
    }

    fn abort(&self) {
        self.notify(|from| Message::Abort { from });
    }
}

impl Drop for ChannelComm {
    fn drop(&mut self) {
        self.notify(|from| Message::Left { from });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::thread;

    fn run_group<T, F>(size: usize, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(ChannelComm) -> T + Sync,
    {
        let endpoints = ChannelComm::cluster(size).unwrap();
        thread::scope(|s| {
            let handles: Vec<_> = endpoints
                .into_iter()
                .map(|comm| {
                    let f = &f;
                    s.spawn(move || f(comm))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        })
    }

    #[test]
    fn test_zero_size_cluster_rejected() {
        assert_matches!(ChannelComm::cluster(0), Err(MinMaxError::Config(_)));
    }

    #[test]
    fn test_all_reduce_is_identical_everywhere() {
        let results = run_group(5, |comm| {
            let value = (comm.rank() as f32 - 2.0) * 3.0;
            let min = comm.all_reduce_min(value).unwrap();
            let max = comm.all_reduce_max(value).unwrap();
            (min, max)
        });
        assert!(results.iter().all(|&r| r == (-6.0, 6.0)));
    }

    #[test]
    fn test_single_worker_needs_no_peers() {
        let results = run_group(1, |comm| {
            comm.barrier().unwrap();
            let min = comm.all_reduce_min(4.0).unwrap();
            let table = PartitionTable::new(2, 1).unwrap();
            let gathered = comm.gather_to_root(&[1.0, 2.0], &table).unwrap();
            (min, gathered)
        });
        assert_eq!(results, vec![(4.0, Some(vec![1.0, 2.0]))]);
    }

    #[test]
    fn test_identity_contributions_are_neutral() {
        let results = run_group(3, |comm| {
            let value = if comm.rank() == 1 { 2.5 } else { f32::INFINITY };
            comm.all_reduce_min(value).unwrap()
        });
        assert_eq!(results, vec![2.5; 3]);
    }

    #[test]
    fn test_gather_orders_by_rank() {
        let table = PartitionTable::new(10, 4).unwrap();
        let results = run_group(4, |comm| {
            let partition = *table.get(comm.rank()).unwrap();
            // Delay low ranks so contributions arrive out of order
            thread::sleep(std::time::Duration::from_millis(5 * (4 - comm.rank() as u64)));
            let local: Vec<f32> = partition.range().map(|i| i as f32).collect();
            comm.gather_to_root(&local, &table).unwrap()
        });

        let expected: Vec<f32> = (0..10).map(|i| i as f32).collect();
        assert_eq!(results[0].as_deref(), Some(expected.as_slice()));
        assert!(results[1..].iter().all(Option::is_none));
    }

    #[test]
    fn test_fast_peer_messages_are_parked() {
        // Rank 1 runs through min and max before rank 0 reads anything
        let results = run_group(2, |comm| {
            if comm.rank() == 0 {
                thread::sleep(std::time::Duration::from_millis(20));
            }
            let min = comm.all_reduce_min(comm.rank() as f32).unwrap();
            let max = comm.all_reduce_max(comm.rank() as f32).unwrap();
            (min, max)
        });
        assert_eq!(results, vec![(0.0, 1.0), (0.0, 1.0)]);
    }

    #[test]
    fn test_abort_fails_waiting_peers() {
        let results = run_group(3, |comm| {
            if comm.rank() == 2 {
                comm.abort();
                return None;
            }
            Some(comm.all_reduce_min(1.0))
        });
        for result in results.into_iter().flatten() {
            assert_matches!(result, Err(MinMaxError::Collective { .. }));
        }
    }

    #[test]
    fn test_peer_dropped_mid_collective_fails_survivor() {
        let mut endpoints = ChannelComm::cluster(2).unwrap();
        let peer = endpoints.pop().unwrap();
        let survivor = endpoints.pop().unwrap();

        let (tx, rx) = std::sync::mpsc::channel();
        let handle = thread::spawn(move || {
            let _ = tx.send(survivor.all_reduce_min(1.0));
        });

        // The survivor's contribution is already delivered when the peer goes away
        thread::sleep(std::time::Duration::from_millis(100));
        drop(peer);

        let result = rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap();
        assert_matches!(result, Err(MinMaxError::Collective { rank: 0, .. }));
        handle.join().unwrap();
    }

    #[test]
    fn test_panicking_peer_fails_whole_group() {
        let endpoints = ChannelComm::cluster(3).unwrap();
        let (tx, rx) = std::sync::mpsc::channel();
        let handles: Vec<_> = endpoints
            .into_iter()
            .map(|comm| {
                let tx = tx.clone();
                thread::spawn(move || {
                    if comm.rank() == 1 {
                        thread::sleep(std::time::Duration::from_millis(50));
                        panic!("worker 1 crashed");
                    }
                    let _ = tx.send(comm.all_reduce_max(comm.rank() as f32));
                })
            })
            .collect();
        drop(tx);

        for _ in 0..2 {
            let result = rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap();
            assert_matches!(result, Err(MinMaxError::Collective { .. }));
        }
        let panicked = handles.into_iter().map(|h| h.join().is_err()).filter(|&p| p).count();
        assert_eq!(panicked, 1);
    }

    #[test]
    fn test_finished_peers_do_not_fail_root() {
        // Non-roots leave right after their gather contribution
        let table = PartitionTable::new(6, 3).unwrap();
        let results = run_group(3, |comm| {
            if comm.rank() == ROOT {
                thread::sleep(std::time::Duration::from_millis(30));
            }
            let local = vec![comm.rank() as f32; 2];
            comm.gather_to_root(&local, &table).unwrap()
        });
        assert_eq!(results[0], Some(vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0]));
    }

    #[test]
    fn test_mismatched_collectives_detected() {
        let results = run_group(2, |comm| {
            if comm.rank() == 0 {
                comm.all_reduce_min(1.0).map(|_| ())
            } else {
                comm.barrier()
            }
        });
        assert!(results.iter().all(Result::is_err));
    }
}
