//! Event Emission Tests
//!
//! Every committed mutation emits exactly one `TreeEvent`, after the write
//! succeeds. Rejected operations emit nothing.

#[cfg(test)]
mod event_emission_tests {
    use anyhow::Result;
    use classifieds_core::auth::AuthContext;
    use classifieds_core::db::{DatabaseService, TreeEvent, TursoStore};
    use classifieds_core::models::{DeletePolicy, NewNode, NodeUpdate, TreeKind};
    use classifieds_core::services::TreeService;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::sync::broadcast::Receiver;
    use tokio::time::{timeout, Duration};

    /// Helper to create a location service over a fresh database
    async fn create_service() -> Result<(TreeService, TempDir)> {
        let temp_dir = TempDir::new()?;
        let db = Arc::new(DatabaseService::new(temp_dir.path().join("test.db")).await?);
        let service = TreeService::new(Arc::new(TursoStore::new(db, TreeKind::Location)));
        Ok((service, temp_dir))
    }

    async fn next_event(rx: &mut Receiver<TreeEvent>) -> TreeEvent {
        timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("Event should be emitted within 1 second")
            .expect("Should receive event")
    }

    #[tokio::test]
    async fn test_create_emits_node_created() -> Result<()> {
        let (service, _temp_dir) = create_service().await?;
        let mut rx = service.subscribe();

        let created = service
            .create_node(&AuthContext::admin(1), NewNode::new("Bavaria", None))
            .await?;

        match next_event(&mut rx).await {
            TreeEvent::NodeCreated { kind, node } => {
                assert_eq!(kind, TreeKind::Location);
                assert_eq!(node, created);
            }
            other => panic!("Expected NodeCreated event, got {:?}", other),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_mutations_emit_in_order() -> Result<()> {
        let (service, _temp_dir) = create_service().await?;
        let admin = AuthContext::admin(1);
        let germany = service.create_node(&admin, NewNode::new("Germany", None)).await?;
        let berlin = service.create_node(&admin, NewNode::new("Berlin", None)).await?;
        let munich = service
            .create_node(&admin, NewNode::new("Munich", Some(germany.id)))
            .await?;

        // Subscribe AFTER creation to avoid catching NodeCreated
        let mut rx = service.subscribe();

        service
            .update_node(
                &admin,
                berlin.id,
                NodeUpdate {
                    name: Some("Berlin (city)".to_string()),
                    is_active: None,
                },
            )
            .await?;
        service.move_node(&admin, berlin.id, Some(germany.id)).await?;
        service
            .reorder_siblings(&admin, Some(germany.id), vec![berlin.id, munich.id])
            .await?;
        service
            .delete_node(&admin, germany.id, DeletePolicy::Cascade)
            .await?;

        assert!(matches!(
            next_event(&mut rx).await,
            TreeEvent::NodeUpdated { ref node, .. } if node.name == "Berlin (city)"
        ));
        match next_event(&mut rx).await {
            TreeEvent::NodeMoved {
                node,
                old_parent_id,
                ..
            } => {
                assert_eq!(old_parent_id, None);
                assert_eq!(node.parent_id, Some(germany.id));
            }
            other => panic!("Expected NodeMoved event, got {:?}", other),
        }
        assert_eq!(
            next_event(&mut rx).await,
            TreeEvent::SiblingsReordered {
                kind: TreeKind::Location,
                parent_id: Some(germany.id),
                ordered_ids: vec![berlin.id, munich.id],
            }
        );
        assert_eq!(
            next_event(&mut rx).await,
            TreeEvent::NodeDeleted {
                kind: TreeKind::Location,
                id: germany.id,
                deleted_count: 3,
            }
        );
        assert!(rx.try_recv().is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_rejected_operations_emit_nothing() -> Result<()> {
        let (service, _temp_dir) = create_service().await?;
        let admin = AuthContext::admin(1);
        let parent = service.create_node(&admin, NewNode::new("EU", None)).await?;
        let child = service
            .create_node(&admin, NewNode::new("France", Some(parent.id)))
            .await?;

        let mut rx = service.subscribe();

        assert!(service.move_node(&admin, parent.id, Some(child.id)).await.is_err());
        assert!(service
            .reorder_siblings(&admin, Some(parent.id), vec![])
            .await
            .is_err());
        assert!(service
            .delete_node(&admin, parent.id, DeletePolicy::RequireEmpty)
            .await
            .is_err());
        assert!(service
            .create_node(&AuthContext::guest(), NewNode::new("Spain", None))
            .await
            .is_err());

        assert!(rx.try_recv().is_err());
        Ok(())
    }
}
