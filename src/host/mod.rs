//! The contract this crate expects from the external notebook host.
//!
//! The host is a single logical actor. Calls are issued one at a time and any of them may come
//! back with a [`HOST_BUSY`](crate::error::HOST_BUSY) status instead of blocking. Callers in this
//! crate route host calls through [`Invoker`](crate::retry::Invoker) rather than calling a
//! [`Host`] directly.

use std::future::Future;

use crate::{
    error::HostError,
    hierarchy::{HierarchyNode, Scope},
};

pub mod memory;

pub use memory::MemoryHost;

pub trait Host: Sync {
    /// Hierarchy rooted at `node_id` down to `scope`. `None` addresses the whole workspace.
    ///
    /// Resolves to `Ok(None)` when the id does not name a live object.
    fn fetch_subtree(
        &self,
        node_id: Option<&str>,
        scope: Scope,
    ) -> impl Future<Output = Result<Option<HierarchyNode>, HostError>> + Send;

    /// Opaque link string embedding the identity token of `object_id`.
    fn resolve_cross_reference(
        &self,
        object_id: &str,
        sub_object_id: Option<&str>,
    ) -> impl Future<Output = Result<String, HostError>> + Send;

    /// Apply a structural edit to a container. `snapshot` is the serialized container with its
    /// new child list: children carrying a known id keep their content, children without one are
    /// created, and children left out are removed.
    ///
    /// Does not report the ids of children it created.
    fn mutate_container(
        &self,
        container_id: &str,
        snapshot: &str,
    ) -> impl Future<Output = Result<(), HostError>> + Send;

    /// Create a child object under `parent_id` and return its id.
    fn create_child_object(
        &self,
        parent_id: &str,
    ) -> impl Future<Output = Result<String, HostError>> + Send;

    /// Id of the notebook the user is currently looking at, if any.
    fn current_notebook_id(
        &self,
    ) -> impl Future<Output = Result<Option<String>, HostError>> + Send;
}
