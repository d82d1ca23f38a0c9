//! Rank-addressed message passing between batch coordinator nodes.
//!
//! [`Communicator`] abstracts the transport so the coordinator logic is
//! testable in-process; [`ChannelComm`] is the crossbeam-channel
//! implementation, one mailbox per rank with any-source receive.

use std::error::Error;
use std::fmt;
use std::sync::{Arc, Barrier};

use crossbeam_channel::{Receiver, Sender, TryRecvError};

/// A node's index within the communicator world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rank(pub usize);

impl Rank {
    /// The coordinating rank. It assigns batches and never simulates.
    pub const MASTER: Rank = Rank(0);
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rank {}", self.0)
    }
}

/// A half-open range of history indices assigned as one batch.
///
/// An empty range is the stop sentinel: a worker receiving one shuts
/// down instead of simulating.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchRange {
    /// First history in the batch.
    pub start: u64,
    /// One past the last history in the batch.
    pub end: u64,
}

impl BatchRange {
    /// The shutdown sentinel sent to workers when no batches remain.
    pub const STOP: BatchRange = BatchRange { start: 1, end: 1 };

    /// Whether this assignment tells the worker to shut down.
    pub fn is_stop(&self) -> bool {
        self.start >= self.end
    }

    /// Number of histories in the batch.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Whether the batch holds no histories.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for BatchRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Coordinator protocol messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Message {
    /// Worker to master: ready for work, with the worker's cumulative
    /// completed-history count.
    Idle {
        /// Histories this worker has completed so far.
        completed: u64,
    },
    /// Master to worker: simulate this batch, or shut down if it is the
    /// stop sentinel.
    Assign(BatchRange),
}

/// Message-passing failures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommError {
    /// A destination rank outside the world.
    InvalidRank {
        /// The offending rank.
        rank: Rank,
        /// Number of ranks in the world.
        world_size: usize,
    },
    /// The destination's mailbox is gone; its node has shut down.
    SendFailed {
        /// The sending rank.
        from: Rank,
        /// The intended destination.
        to: Rank,
    },
    /// This rank's mailbox is empty and every peer has shut down.
    Disconnected {
        /// The receiving rank.
        rank: Rank,
    },
}

impl fmt::Display for CommError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRank { rank, world_size } => {
                write!(f, "{rank} does not exist in a world of {world_size}")
            }
            Self::SendFailed { from, to } => {
                write!(f, "{from} failed to send to {to}: mailbox closed")
            }
            Self::Disconnected { rank } => {
                write!(f, "{rank} has no peers left to receive from")
            }
        }
    }
}

impl Error for CommError {}

/// Rank-addressed message passing.
///
/// `recv` blocks for a message from any source; `try_recv` is its
/// non-blocking probe counterpart for poll loops.
pub trait Communicator: Send {
    /// This node's rank.
    fn rank(&self) -> Rank;

    /// Number of ranks in the world, master included.
    fn world_size(&self) -> usize;

    /// Send `message` to `to`.
    fn send(&self, to: Rank, message: Message) -> Result<(), CommError>;

    /// Block until a message arrives from any rank.
    fn recv(&self) -> Result<(Rank, Message), CommError>;

    /// Return a pending message from any rank, or `None` without
    /// blocking.
    fn try_recv(&self) -> Result<Option<(Rank, Message)>, CommError>;

    /// Block until every rank in the world has reached the barrier.
    fn barrier(&self);
}

/// In-process communicator over crossbeam channels.
///
/// Each rank owns one unbounded receiver; every rank holds senders to
/// all mailboxes. Messages carry their source rank, which makes
/// any-source receive a plain channel read.
pub struct ChannelComm {
    rank: Rank,
    senders: Vec<Sender<(Rank, Message)>>,
    mailbox: Receiver<(Rank, Message)>,
    barrier: Arc<Barrier>,
}

impl ChannelComm {
    /// Build a fully connected world of `world_size` ranks. Each
    /// returned communicator is moved onto its own thread.
    pub fn world(world_size: usize) -> Vec<ChannelComm> {
        assert!(world_size >= 2, "world needs a master and a worker");
        let mut senders = Vec::with_capacity(world_size);
        let mut mailboxes = Vec::with_capacity(world_size);
        for _ in 0..world_size {
            let (tx, rx) = crossbeam_channel::unbounded();
            senders.push(tx);
            mailboxes.push(rx);
        }
        let barrier = Arc::new(Barrier::new(world_size));
        mailboxes
            .into_iter()
            .enumerate()
            .map(|(rank, mailbox)| ChannelComm {
                rank: Rank(rank),
                senders: senders.clone(),
                mailbox,
                barrier: Arc::clone(&barrier),
            })
            .collect()
    }
}

impl Communicator for ChannelComm {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn world_size(&self) -> usize {
        self.senders.len()
    }

    fn send(&self, to: Rank, message: Message) -> Result<(), CommError> {
        let sender = self.senders.get(to.0).ok_or(CommError::InvalidRank {
            rank: to,
            world_size: self.senders.len(),
        })?;
        sender
            .send((self.rank, message))
            .map_err(|_| CommError::SendFailed {
                from: self.rank,
                to,
            })
    }

    fn recv(&self) -> Result<(Rank, Message), CommError> {
        self.mailbox
            .recv()
            .map_err(|_| CommError::Disconnected { rank: self.rank })
    }

    fn try_recv(&self) -> Result<Option<(Rank, Message)>, CommError> {
        match self.mailbox.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(CommError::Disconnected { rank: self.rank }),
        }
    }

    fn barrier(&self) {
        self.barrier.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_sentinel_is_empty() {
        assert!(BatchRange::STOP.is_stop());
        assert!(BatchRange::STOP.is_empty());
        assert!(!BatchRange { start: 0, end: 5 }.is_stop());
        assert_eq!(BatchRange { start: 3, end: 8 }.len(), 5);
    }

    #[test]
    fn messages_carry_source_rank() {
        let world = ChannelComm::world(3);
        world[1].send(Rank::MASTER, Message::Idle { completed: 4 }).unwrap();
        world[2].send(Rank::MASTER, Message::Idle { completed: 9 }).unwrap();

        let mut sources = Vec::new();
        for _ in 0..2 {
            let (from, message) = world[0].recv().unwrap();
            assert!(matches!(message, Message::Idle { .. }));
            sources.push(from);
        }
        sources.sort();
        assert_eq!(sources, vec![Rank(1), Rank(2)]);
    }

    #[test]
    fn try_recv_probes_without_blocking() {
        let world = ChannelComm::world(2);
        assert_eq!(world[0].try_recv().unwrap(), None);

        world[1]
            .send(Rank::MASTER, Message::Assign(BatchRange { start: 0, end: 1 }))
            .unwrap();
        let (from, message) = world[0].try_recv().unwrap().unwrap();
        assert_eq!(from, Rank(1));
        assert_eq!(message, Message::Assign(BatchRange { start: 0, end: 1 }));
    }

    #[test]
    fn send_to_unknown_rank_fails() {
        let world = ChannelComm::world(2);
        let err = world[0]
            .send(Rank(7), Message::Idle { completed: 0 })
            .unwrap_err();
        assert_eq!(
            err,
            CommError::InvalidRank {
                rank: Rank(7),
                world_size: 2
            }
        );
    }
}
