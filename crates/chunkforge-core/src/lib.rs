//! Trigger provisioning for chunkforge.
//!
//! A trigger marker written into an empty region starts a tick-counting
//! machine. On its first eligible tick the region is filled with a copy of
//! a source region. Two ticks later the synchronization router plants
//! triggers in the matching regions of linked spaces, one per tick. From
//! tick twenty entities are spawned and the marker is removed.
//!
//! # Modules
//!
//! - [`auxiliary`] -- Scanner data batch reload from JSON files.
//! - [`config`] -- Configuration loading from `chunkforge-config.yaml` into
//!   strongly-typed structs.
//! - [`machine`] -- The per-trigger [`ProvisioningMachine`].
//! - [`placement`] -- Interactive activation with neighbour fallback and the
//!   placement gameplay rule.
//! - [`router`] -- The [`SynchronizationRouter`].
//! - [`runner`] -- Async scheduling loop with tick and idle bounds.
//! - [`spaces`] -- Logical spaces and their scale transform.
//! - [`tick`] -- The [`Provisioner`] scheduling cycle.
//! - [`trigger`] -- Trigger kinds and source derivation.
//!
//! [`ProvisioningMachine`]: machine::ProvisioningMachine
//! [`SynchronizationRouter`]: router::SynchronizationRouter
//! [`Provisioner`]: tick::Provisioner

pub mod auxiliary;
pub mod config;
pub mod machine;
pub mod placement;
pub mod router;
pub mod runner;
pub mod spaces;
pub mod tick;
pub mod trigger;
