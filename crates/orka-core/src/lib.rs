//! orka core
//!
//! Turns a declarative [`ClusterSpec`] into a running Hadoop/YARN cluster and
//! back again, through any [`orka_cloud::CloudConnector`].
//!
//! The provisioning flow:
//!
//! 1. authenticate, fetch the flavor catalog and a fresh quota snapshot
//! 2. [`validate`] the request; rejections happen before any resource exists
//! 3. create network, master, slaves (concurrently) and the floating IP,
//!    naming every resource with [`naming::name_for`]
//! 4. bootstrap Hadoop/YARN on the master and verify every node
//!
//! If any step fails, everything created so far is torn down again and the
//! caller gets a [`ProvisionFailure`] describing what was cleaned up.

pub mod discovery;
pub mod error;
pub mod naming;
pub mod orchestrator;
pub mod poll;
pub mod record;
pub mod resource;
pub mod spec;
pub mod state;
pub mod status;
pub mod teardown;
pub mod validator;

pub use discovery::ClusterIdentifier;
pub use error::{
    DiscoveryError, ProvisionError, ProvisionFailure, QuotaRejection, QuotaResource,
    SlaveFailure, StepError, ValidationError,
};
pub use naming::{ClusterTag, ResourceName, cluster_name_of, name_for};
pub use orchestrator::{Orchestrator, ProvisionedCluster};
pub use poll::PollConfig;
pub use record::{ClusterField, ClusterRecord};
pub use resource::{ProvisionedResource, ResourceKind, ResourceLedger, Role};
pub use spec::{ClusterSpec, ImageRef, MIN_DISK_GB, NodeResources};
pub use state::ProvisionState;
pub use status::{ClusterStatus, NormalizedStatus};
pub use teardown::{TeardownFailure, TeardownReport, teardown_resources};
pub use validator::{RequiredResources, ValidatedPlan, validate};
