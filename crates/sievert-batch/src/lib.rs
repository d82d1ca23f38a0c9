//! Distributed batch coordination for Sievert transport runs.
//!
//! Splits a run's history range into batches and distributes them
//! dynamically: the master rank assigns the next batch to whichever
//! worker reports idle first, so load balances itself across uneven
//! nodes. The [`Communicator`] trait abstracts the message transport;
//! [`ChannelComm`] runs a whole world in-process over crossbeam
//! channels.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod comm;
pub mod coordinator;
pub mod plan;

pub use comm::{BatchRange, ChannelComm, CommError, Communicator, Message, Rank};
pub use coordinator::{run_distributed, run_master, run_worker, CoordinatorError};
pub use plan::{BatchPlan, PlanError};
