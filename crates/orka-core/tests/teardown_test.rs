mod common;

use common::{FakeBootstrapper, FakeCloud, orchestrator, spec, token};
use orka_core::{
    ClusterIdentifier, DiscoveryError, PollConfig, ResourceKind, Role, teardown_resources,
};

async fn provisioned(cloud: &FakeCloud) -> orka_core::ProvisionedCluster {
    orchestrator(cloud, &FakeBootstrapper::ok())
        .provision(&spec(3), &token())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_teardown_by_tag_in_dependency_order() {
    let cloud = FakeCloud::new();
    let cluster = provisioned(&cloud).await;

    let report = orchestrator(&cloud, &FakeBootstrapper::ok())
        .teardown(&ClusterIdentifier::Tag(cluster.tag.clone()), &token())
        .await
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.deleted.len(), 5);
    assert_eq!(report.deleted[0].kind, ResourceKind::FloatingIp);
    assert_eq!(report.deleted[1].role, Role::Slave);
    assert_eq!(report.deleted[2].role, Role::Slave);
    assert_eq!(report.deleted[3].role, Role::Master);
    assert_eq!(report.deleted[4].kind, ResourceKind::Network);
    assert!(cloud.is_empty());
}

#[tokio::test]
async fn test_teardown_by_master_ip() {
    let cloud = FakeCloud::new();
    let cluster = provisioned(&cloud).await;

    let identifier: ClusterIdentifier = cluster.master_ip.parse().unwrap();
    assert!(matches!(identifier, ClusterIdentifier::Address(_)));

    let report = orchestrator(&cloud, &FakeBootstrapper::ok())
        .teardown(&identifier, &token())
        .await
        .unwrap();

    assert_eq!(report.deleted.len(), 5);
    assert!(cloud.is_empty());
}

#[tokio::test]
async fn test_teardown_by_name_leaves_foreign_resources() {
    let cloud = FakeCloud::new();
    cloud.add_foreign_server("demo-master-1");
    cloud.add_foreign_server("orka-backup");
    provisioned(&cloud).await;

    let report = orchestrator(&cloud, &FakeBootstrapper::ok())
        .teardown(&"demo".parse().unwrap(), &token())
        .await
        .unwrap();

    assert_eq!(report.deleted.len(), 5);
    let mut left = cloud.server_names();
    left.sort();
    assert_eq!(left, vec!["demo-master-1".to_string(), "orka-backup".to_string()]);
}

#[tokio::test]
async fn test_second_teardown_deletes_nothing() {
    let cloud = FakeCloud::new();
    let cluster = provisioned(&cloud).await;
    let orchestrator = orchestrator(&cloud, &FakeBootstrapper::ok());
    let identifier = ClusterIdentifier::Tag(cluster.tag.clone());

    let first = orchestrator.teardown(&identifier, &token()).await.unwrap();
    assert_eq!(first.deleted.len(), 5);

    let second = orchestrator.teardown(&identifier, &token()).await.unwrap();
    assert!(second.deleted.is_empty());
    assert!(second.is_complete());
}

#[tokio::test]
async fn test_replaying_teardown_on_known_resources_is_idempotent() {
    let cloud = FakeCloud::new();
    cloud.fail_server("-slave-2");

    let err = orchestrator(&cloud, &FakeBootstrapper::ok())
        .provision(&spec(3), &token())
        .await
        .unwrap_err();
    let compensation = &err.failure().unwrap().compensation;
    assert_eq!(compensation.deleted.len(), 3);

    let replay = teardown_resources(&cloud, &compensation.deleted, &PollConfig::default()).await;
    assert!(replay.deleted.is_empty());
    assert_eq!(replay.already_absent.len(), 3);
    assert!(replay.is_complete());

    let by_tag = orchestrator(&cloud, &FakeBootstrapper::ok())
        .teardown(&ClusterIdentifier::Tag(err.failure().unwrap().tag.clone()), &token())
        .await
        .unwrap();
    assert!(by_tag.is_empty());
}

#[tokio::test]
async fn test_unknown_cluster_yields_empty_report() {
    let cloud = FakeCloud::new();

    let report = orchestrator(&cloud, &FakeBootstrapper::ok())
        .teardown(&"nosuchcluster".parse().unwrap(), &token())
        .await
        .unwrap();

    assert!(report.is_empty());
    assert!(cloud.mutating_calls().is_empty());
}

#[tokio::test]
async fn test_ambiguous_name_is_rejected() {
    let cloud = FakeCloud::new();
    cloud.add_foreign_server("orka-20260101000000-demo-master-1");
    cloud.add_foreign_server("orka-20260202000000-demo-master-1");

    let err = orchestrator(&cloud, &FakeBootstrapper::ok())
        .teardown(&"demo".parse().unwrap(), &token())
        .await
        .unwrap_err();

    match err {
        DiscoveryError::Ambiguous { candidates, .. } => {
            assert_eq!(
                candidates,
                vec![
                    "orka-20260101000000-demo".to_string(),
                    "orka-20260202000000-demo".to_string()
                ]
            );
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(cloud.mutating_calls().is_empty());
}

#[tokio::test]
async fn test_stuck_server_keeps_network_and_reports_it() {
    let cloud = FakeCloud::new();
    let cluster = provisioned(&cloud).await;
    cloud.fail_delete("-slave-1");

    let report = orchestrator(&cloud, &FakeBootstrapper::ok())
        .teardown(&ClusterIdentifier::Tag(cluster.tag.clone()), &token())
        .await
        .unwrap();

    assert!(!report.is_complete());
    assert_eq!(report.deleted.len(), 3);
    assert_eq!(report.failed.len(), 2);
    assert!(report.failed[0].resource.name.as_deref().unwrap().ends_with("-slave-1"));
    assert_eq!(report.failed[1].resource.kind, ResourceKind::Network);
    assert_eq!(cloud.network_count(), 1);
    assert_eq!(cloud.count("delete_network"), 0);
}

#[tokio::test]
async fn test_private_address_shared_by_two_clusters_is_ambiguous() {
    let cloud = FakeCloud::new();
    cloud.add_server_with_address("orka-20260101000000-alpha-master-1", "192.168.0.2");
    cloud.add_server_with_address("orka-20260202000000-beta-master-1", "192.168.0.2");

    let err = orchestrator(&cloud, &FakeBootstrapper::ok())
        .teardown(&"192.168.0.2".parse().unwrap(), &token())
        .await
        .unwrap_err();

    match err {
        DiscoveryError::Ambiguous { candidates, .. } => {
            assert_eq!(
                candidates,
                vec![
                    "orka-20260101000000-alpha".to_string(),
                    "orka-20260202000000-beta".to_string()
                ]
            );
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(cloud.mutating_calls().is_empty());
    assert_eq!(cloud.server_names().len(), 2);
}

#[tokio::test]
async fn test_private_address_of_one_cluster_resolves() {
    let cloud = FakeCloud::new();
    cloud.add_server_with_address("orka-20260101000000-alpha-master-1", "192.168.0.2");
    cloud.add_server_with_address("my-own-vm", "192.168.0.2");

    let report = orchestrator(&cloud, &FakeBootstrapper::ok())
        .teardown(&"192.168.0.2".parse().unwrap(), &token())
        .await
        .unwrap();

    assert_eq!(report.deleted.len(), 1);
    assert_eq!(cloud.server_names(), vec!["my-own-vm".to_string()]);
}

#[tokio::test]
async fn test_unreleased_floating_ip_keeps_master_for_next_run() {
    let cloud = FakeCloud::new();
    let cluster = provisioned(&cloud).await;
    let identifier = ClusterIdentifier::Tag(cluster.tag.clone());
    cloud.fail_delete(&cluster.master_ip);

    let first = orchestrator(&cloud, &FakeBootstrapper::ok())
        .teardown(&identifier, &token())
        .await
        .unwrap();

    assert_eq!(first.deleted.len(), 2);
    assert!(first.deleted.iter().all(|r| r.role == Role::Slave));
    let failed: Vec<ResourceKind> = first.failed.iter().map(|f| f.resource.kind).collect();
    assert_eq!(
        failed,
        vec![ResourceKind::FloatingIp, ResourceKind::Server, ResourceKind::Network]
    );
    assert_eq!(cloud.floating_ip_count(), 1);

    cloud.allow_delete(&cluster.master_ip);
    let second = orchestrator(&cloud, &FakeBootstrapper::ok())
        .teardown(&identifier, &token())
        .await
        .unwrap();

    assert!(second.is_complete());
    assert_eq!(second.deleted.len(), 3);
    assert_eq!(second.deleted[0].kind, ResourceKind::FloatingIp);
    assert!(cloud.is_empty());
}
