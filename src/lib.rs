#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod board;
mod common;
mod config;
pub mod protocol;
mod ship;

#[cfg(feature = "std")]
pub mod dispatcher;
#[cfg(feature = "std")]
mod game;
#[cfg(feature = "std")]
mod logging;
#[cfg(feature = "std")]
pub mod registry;
#[cfg(feature = "std")]
mod server;
#[cfg(feature = "std")]
pub mod transport;

pub use board::*;
pub use common::*;
pub use config::*;
pub use protocol::{Message, ProtocolError, Reply, Request};
pub use ship::*;

#[cfg(feature = "std")]
pub use dispatcher::{serve_connection, DispatchError, Dispatcher};
#[cfg(feature = "std")]
pub use game::*;
#[cfg(feature = "std")]
pub use logging::{init_logging, parse_level, LOG_ENV};
#[cfg(feature = "std")]
pub use registry::{Registry, RegistryError};
#[cfg(feature = "std")]
pub use server::Server;
#[cfg(feature = "std")]
pub use transport::tcp::TcpTransport;
#[cfg(feature = "std")]
pub use transport::{Inbound, Outbound, Outbox};
