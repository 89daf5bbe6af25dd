//! # Ferrule
//!
//! **Ferrule** is the event loop that sits between a device-management
//! protocol engine and the process hosting it.
//!
//! The engine owns the sockets, the protocol state machines and the job
//! scheduler. Ferrule owns none of that: it repeatedly asks the engine for
//! its active sockets, waits on them with a timeout derived from the
//! scheduler, and hands every readable socket back to the engine.
//!
//! Ferrule is single-threaded by design and offers:
//!
//! - A **poll multiplexer** over `poll(2)` (Unix) and `WSAPoll` (Windows)
//! - A **scheduler-aware wait budget**, capped so scheduled jobs never run late
//!   by more than a configurable ceiling (100 ms by default)
//! - **Bulkhead dispatch**: one failing peer never prevents the others from
//!   being served in the same iteration
//! - **Host integration hooks** to release a host runtime's exclusive claim
//!   for exactly the duration of the blocking poll
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ferrule::{LoopBuilder, NoHooks, Runner, StopSignal, TimerQueue, UdpTransport};
//!
//! let mut transport = UdpTransport::new(|datagram| {
//!     println!("{} bytes from {}", datagram.payload.len(), datagram.peer);
//!     Ok(())
//! });
//! transport.connect("127.0.0.1:5683".parse()?)?;
//!
//! let mut driver = LoopBuilder::new().build(transport, TimerQueue::new(), NoHooks);
//!
//! let stop = StopSignal::new();
//! Runner::new().run(&mut driver, &stop)?;
//! ```
//!
//! ## Modules
//!
//! - [`driver`]: One loop iteration: snapshot, budget, poll, dispatch
//! - [`poller`]: Read-readiness polling over an endpoint snapshot
//! - [`engine`]: Interfaces consumed from the protocol engine and scheduler
//! - [`host`]: Suspension hooks and the shared execution claim
//! - [`runner`]: Repeated driving until a stop signal fires
//! - [`timer`]: A minimal deadline-ordered scheduler
//! - [`net`]: UDP transport and `coap://` URI handling

pub mod budget;
pub mod driver;
pub mod endpoint;
pub mod engine;
pub mod error;
pub mod host;
pub mod net;
pub mod poller;
pub mod runner;
pub mod timer;

pub use budget::{DEFAULT_MAX_WAIT, WaitBudget};
pub use driver::builder::LoopBuilder;
pub use driver::{DispatchFailure, IterationReport, LoopDriver};
pub use endpoint::{Endpoint, EndpointSet};
pub use engine::{Engine, Idle, Scheduler};
pub use error::{LoopError, PollError, ServeError};
pub use host::{ClaimHooks, Exclusive, ExclusiveGuard, NoHooks, SuspendHooks};
pub use net::{Datagram, ServerUri, UdpTransport};
pub use poller::platform::RawFd;
pub use poller::{PollOutcome, PollRecord, Poller};
pub use runner::{RunStats, Runner, StopSignal};
pub use timer::{JobHandle, TimerQueue};
