//! # notewalk
//!
//! Access layer for a large, externally owned notebook store (notebooks → section groups →
//! sections → pages) that is only reachable through a narrow, stateful and occasionally busy
//! host API.
//!
//! ## Overview
//!
//! The host is a single actor: calls are issued one at a time and any call may be turned away
//! with a "busy" status. notewalk wraps that contract and provides the pieces that need real
//! failure handling:
//!
//! - **Retrying invocation**: host calls are retried on busy with linear backoff and otherwise
//!   logged and abandoned, never raised to the caller.
//! - **Cross-reference indexing**: a cancellable, progress-reporting walk over a scoped slice of
//!   the tree that maps each page's identity token to its location.
//! - **Identity by structural diff**: discovering the id of an object a mutation created but did
//!   not report.
//! - **Content validation**: schema checks on outgoing page content, with an automatic fix for
//!   the host's own exponent-notation overflow.
//!
//! ## Architecture
//!
//! - **[`hierarchy`]**: snapshot tree (`HierarchyNode`), node kinds, fetch scopes
//! - **[`host`]**: the `Host` contract and the in-memory `MemoryHost`
//! - **[`retry`]**: `Invoker` and `RetryPolicy`
//! - **[`xref`]**: `Indexer`, `Index`, progress and cancellation collaborators
//! - **[`diff`]**: `DiffDetector`
//! - **[`schema`]**: `ContentElement`, `SchemaRegistry`, `Validator`
//! - **[`config`]**: TOML `Settings`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use notewalk::{
//!     hierarchy::Scope,
//!     host::MemoryHost,
//!     retry::Invoker,
//!     xref::{Indexer, NeverCancel},
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let host = MemoryHost::from_snapshot_file("workspace.json")?;
//!     let indexer = Indexer::new(&host, Invoker::default());
//!
//!     let progress = (
//!         |total: usize| println!("indexing {total} pages"),
//!         || print!("."),
//!     );
//!     let index = indexer
//!         .build_index(Scope::Sections, &NeverCancel, &progress)
//!         .await;
//!
//!     for entry in index.entries() {
//!         println!("{} -> {}", entry.token, entry.full_path);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Host failures do not surface as `Err` from the core operations. A busy host is retried; a
//! permanent failure is logged through `tracing` and the operation returns an empty index,
//! `None`, or an invalid [`schema::ValidationOutcome`]. Cancellation is not an error either: the
//! indexer returns whatever it gathered before the request was seen.

pub mod config;
pub mod diff;
pub mod error;
pub mod hierarchy;
pub mod host;
pub mod retry;
pub mod schema;
#[cfg(test)]
mod tests;
pub mod xref;

pub use error::*;
