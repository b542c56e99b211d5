//! Validated cluster request

use crate::error::ValidationError;
use crate::resource::Role;
use orka_cloud::DiskTemplate;
use serde::{Deserialize, Serialize};

/// Smallest disk the provider accepts for a VM
pub const MIN_DISK_GB: u32 = 5;

/// Per-role resource request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeResources {
    pub cpu: u32,
    pub ram_mb: u32,
    pub disk_gb: u32,
}

impl NodeResources {
    pub fn new(cpu: u32, ram_mb: u32, disk_gb: u32) -> Self {
        Self {
            cpu,
            ram_mb,
            disk_gb,
        }
    }

    fn validate(&self, role: Role) -> Result<(), ValidationError> {
        if self.cpu == 0 {
            return Err(ValidationError::NotPositive { role, field: "cpu" });
        }
        if self.ram_mb == 0 {
            return Err(ValidationError::NotPositive { role, field: "ram" });
        }
        if self.disk_gb < MIN_DISK_GB {
            return Err(ValidationError::DiskTooSmall {
                role,
                disk_gb: self.disk_gb,
                min: MIN_DISK_GB,
            });
        }
        Ok(())
    }
}

/// Image to boot every node from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub name: String,

    /// Pre-built image that already contains Hadoop/YARN
    pub hadoop_preinstalled: bool,
}

impl ImageRef {
    pub fn os(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hadoop_preinstalled: false,
        }
    }

    pub fn hadoop(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hadoop_preinstalled: true,
        }
    }

    /// Pick the image for a request.
    ///
    /// A requested pre-built Hadoop image always wins over a plain image,
    /// even when both are given; a plain image wins over the default.
    pub fn resolve(image: Option<&str>, hadoop_image: Option<&str>, default_image: &str) -> Self {
        match (hadoop_image, image) {
            (Some(hadoop), _) => Self::hadoop(hadoop),
            (None, Some(image)) => Self::os(image),
            (None, None) => Self::os(default_image),
        }
    }
}

/// Immutable, validated description of the cluster to build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSpec {
    cluster_name: String,
    cluster_size: u32,
    master: NodeResources,
    slave: NodeResources,
    disk_template: DiskTemplate,
    image: ImageRef,
    project_name: String,
}

impl ClusterSpec {
    pub fn new(
        cluster_name: impl Into<String>,
        cluster_size: u32,
        master: NodeResources,
        slave: NodeResources,
        disk_template: DiskTemplate,
        image: ImageRef,
        project_name: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let cluster_name = cluster_name.into();
        let project_name = project_name.into();

        if cluster_name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if !cluster_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(ValidationError::InvalidName(cluster_name));
        }
        if cluster_size < 2 {
            return Err(ValidationError::ClusterTooSmall(cluster_size));
        }
        master.validate(Role::Master)?;
        slave.validate(Role::Slave)?;
        if image.name.trim().is_empty() {
            return Err(ValidationError::EmptyImage);
        }
        if project_name.trim().is_empty() {
            return Err(ValidationError::EmptyProject);
        }

        Ok(Self {
            cluster_name,
            cluster_size,
            master,
            slave,
            disk_template,
            image,
            project_name,
        })
    }

    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    pub fn cluster_size(&self) -> u32 {
        self.cluster_size
    }

    pub fn slave_count(&self) -> u32 {
        self.cluster_size - 1
    }

    pub fn master(&self) -> &NodeResources {
        &self.master
    }

    pub fn slave(&self) -> &NodeResources {
        &self.slave
    }

    pub fn disk_template(&self) -> DiskTemplate {
        self.disk_template
    }

    pub fn image(&self) -> &ImageRef {
        &self.image
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(size: u32, master: NodeResources) -> Result<ClusterSpec, ValidationError> {
        ClusterSpec::new(
            "demo",
            size,
            master,
            NodeResources::new(1, 1024, 10),
            DiskTemplate::Drbd,
            ImageRef::os("Debian Base"),
            "escience",
        )
    }

    #[test]
    fn test_valid_spec() {
        let spec = spec(3, NodeResources::new(2, 2048, 10)).unwrap();
        assert_eq!(spec.slave_count(), 2);
        assert_eq!(spec.cluster_name(), "demo");
    }

    #[test]
    fn test_cluster_too_small() {
        assert_eq!(
            spec(1, NodeResources::new(2, 2048, 10)),
            Err(ValidationError::ClusterTooSmall(1))
        );
    }

    #[test]
    fn test_zero_and_small_resources() {
        assert_eq!(
            spec(2, NodeResources::new(0, 2048, 10)),
            Err(ValidationError::NotPositive {
                role: Role::Master,
                field: "cpu"
            })
        );
        assert_eq!(
            spec(2, NodeResources::new(2, 2048, 4)),
            Err(ValidationError::DiskTooSmall {
                role: Role::Master,
                disk_gb: 4,
                min: MIN_DISK_GB
            })
        );
    }

    #[test]
    fn test_invalid_names() {
        let result = ClusterSpec::new(
            "",
            2,
            NodeResources::new(1, 1024, 5),
            NodeResources::new(1, 1024, 5),
            DiskTemplate::Drbd,
            ImageRef::os("Debian Base"),
            "escience",
        );
        assert_eq!(result, Err(ValidationError::EmptyName));

        let result = ClusterSpec::new(
            "my cluster",
            2,
            NodeResources::new(1, 1024, 5),
            NodeResources::new(1, 1024, 5),
            DiskTemplate::Drbd,
            ImageRef::os("Debian Base"),
            "escience",
        );
        assert!(matches!(result, Err(ValidationError::InvalidName(_))));
    }

    #[test]
    fn test_hadoop_image_wins() {
        let image = ImageRef::resolve(Some("Ubuntu"), Some("HadoopBase"), "Debian Base");
        assert_eq!(image, ImageRef::hadoop("HadoopBase"));

        let image = ImageRef::resolve(Some("Ubuntu"), None, "Debian Base");
        assert_eq!(image, ImageRef::os("Ubuntu"));

        let image = ImageRef::resolve(None, None, "Debian Base");
        assert_eq!(image, ImageRef::os("Debian Base"));
    }
}
