//! # Integration Test Flows
//!
//! Repository, token service and connection hub working together without a
//! network in between. Connections are backed by in-process channels.
//!
//! ## Flows Tested:
//!
//! 1. **Group lifecycle**: create, join, rejoin, kick, act on a kicked member
//! 2. **Fan-out**: every mutation reaches every connection of the group once
//! 3. **Concurrency**: parallel joins and parallel hub actions on one group

#[cfg(test)]
mod tests {
    use futures::future::join_all;
    use gp_01_group_repository::{
        GroupRepository, GroupRepositoryApi, InMemoryGroupStore, Membership, RepositoryError,
    };
    use gp_02_capability_tokens::{TokenManager, TokenService};
    use gp_03_api_gateway::domain::codes;
    use gp_03_api_gateway::ws::{Connection, Hub};
    use shared_types::{CoordsBit, Group, MemberDraft, Role};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn repository() -> Arc<GroupRepository<InMemoryGroupStore>> {
        Arc::new(GroupRepository::new(Arc::new(InMemoryGroupStore::new())))
    }

    fn draft(name: &str, device: &str, lat: f32, lng: f32) -> MemberDraft {
        MemberDraft::new(name, device, CoordsBit::now(lat, lng))
    }

    /// Group with a founder and `extra` joined members.
    fn populated(repo: &GroupRepository<InMemoryGroupStore>, extra: usize) -> Group {
        let group = repo.create_group(draft("A", "d0", 0.0, 0.0)).unwrap();
        let mut latest = group;
        for i in 1..=extra {
            latest = repo
                .add_member_to_group(&latest.id, draft("M", &format!("d{}", i), 0.0, 0.0))
                .unwrap()
                .group;
        }
        latest
    }

    /// Register one channel-backed connection per member.
    fn connect_all(
        hub: &Hub,
        group: &Group,
    ) -> Vec<(Arc<Connection>, UnboundedReceiver<String>)> {
        group
            .members
            .iter()
            .map(|member| {
                let (tx, rx) = mpsc::unbounded_channel::<String>();
                let connection = hub.register(group.id.clone(), member.security_pile(), Box::new(tx));
                (connection, rx)
            })
            .collect()
    }

    fn drain(rx: &mut UnboundedReceiver<String>) -> Vec<serde_json::Value> {
        let mut frames = Vec::new();
        while let Ok(text) = rx.try_recv() {
            frames.push(serde_json::from_str(&text).unwrap());
        }
        frames
    }

    // =============================================================================
    // GROUP LIFECYCLE
    // =============================================================================

    #[test]
    fn test_create_join_rejoin_kick_scenario() {
        let repo = repository();

        let group = repo.create_group(draft("A", "d1", 1.0, 1.0)).unwrap();
        let admin = group.members[0].clone();
        assert_eq!(admin.role, Role::Admin);

        let joined = repo
            .add_member_to_group(&group.id, draft("B", "d2", 2.0, 2.0))
            .unwrap();
        let Membership::Created(b) = joined.membership.clone() else {
            panic!("first join must create a member");
        };
        assert_eq!(joined.group.members.len(), 2);
        assert_eq!(b.role, Role::User);

        let rejoined = repo
            .add_member_to_group(&group.id, draft("B", "d2", 9.0, 8.0))
            .unwrap();
        assert_eq!(rejoined.membership, Membership::Rejoined(b.id.clone()));
        assert_eq!(rejoined.group.members.len(), 2);
        let b_after = rejoined.group.member(&b.id).unwrap();
        assert_eq!(b_after.coords_bit.lat, 9.0);
        assert_eq!(b_after.coords_bit.lng, 8.0);

        let after_kick = repo.kick_member(&b.id, &admin.security_pile()).unwrap();
        assert_eq!(after_kick.members.len(), 1);

        let err = repo
            .update_member_role(&b.id, Role::Admin, &admin.security_pile())
            .unwrap_err();
        assert_eq!(err, RepositoryError::MemberNotExists);
    }

    #[test]
    fn test_tokens_issued_for_members_resolve_to_their_pile() {
        let repo = repository();
        let tokens = TokenManager::random();

        let group = repo.create_group(draft("A", "d1", 0.0, 0.0)).unwrap();
        let founder = &group.members[0];
        let token = tokens.create_token(&founder.secret, &founder.device_id).unwrap();

        let pile = tokens.verify(&token).unwrap();
        assert_eq!(pile, founder.security_pile());
        assert!(repo.get_group_by_id(&group.id, &pile).is_ok());

        let other = TokenManager::random();
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_exported_views_never_carry_credentials() {
        let repo = repository();
        let group = populated(&repo, 3);
        let view = repo
            .get_group_by_id(&group.id, &group.members[0].security_pile())
            .unwrap();

        let json = serde_json::to_string(&view).unwrap();
        for member in &group.members {
            assert!(!json.contains(&member.secret));
            assert!(!json.contains(&member.device_id));
        }
        assert!(!json.contains("secret"));
        assert!(!json.contains("deviceId"));
    }

    // =============================================================================
    // FAN-OUT
    // =============================================================================

    #[tokio::test]
    async fn test_mutation_fans_out_once_to_every_connection() {
        let repo = repository();
        let group = populated(&repo, 2);
        let hub = Arc::new(Hub::new(repo.clone()));
        let mut conns = connect_all(&hub, &group);

        let target = &group.members[1].id;
        let frame = format!(
            r#"{{"action":"send_coordinates","payload":{{"memberId":"{}","lat":4.5,"lng":6.5}}}}"#,
            target
        );
        hub.dispatch(&conns[1].0, &frame).unwrap().await.unwrap();

        for (_, rx) in conns.iter_mut() {
            let frames = drain(rx);
            assert_eq!(frames.len(), 1);
            assert_eq!(frames[0]["type"], "update");
            let member = frames[0]["payload"]["members"]
                .as_array()
                .unwrap()
                .iter()
                .find(|m| m["id"] == target.as_str())
                .unwrap();
            assert_eq!(member["coordsBit"]["lat"], 4.5);
        }
    }

    #[tokio::test]
    async fn test_get_answers_requester_only() {
        let repo = repository();
        let group = populated(&repo, 2);
        let hub = Arc::new(Hub::new(repo.clone()));
        let mut conns = connect_all(&hub, &group);

        hub.dispatch(&conns[2].0, r#"{"action":"get"}"#)
            .unwrap()
            .await
            .unwrap();

        assert!(drain(&mut conns[0].1).is_empty());
        assert!(drain(&mut conns[1].1).is_empty());
        let frames = drain(&mut conns[2].1);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["payload"]["members"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_rejected_action_errors_requester_only() {
        let repo = repository();
        let group = populated(&repo, 2);
        let hub = Arc::new(Hub::new(repo.clone()));
        let mut conns = connect_all(&hub, &group);

        // A plain user may not kick someone else.
        let frame = format!(
            r#"{{"action":"kick","payload":{{"memberId":"{}"}}}}"#,
            group.members[2].id
        );
        hub.dispatch(&conns[1].0, &frame).unwrap().await.unwrap();

        assert!(drain(&mut conns[0].1).is_empty());
        assert!(drain(&mut conns[2].1).is_empty());
        let frames = drain(&mut conns[1].1);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["type"], "error");
        assert_eq!(frames[0]["payload"]["code"], codes::NO_SUFFICIENT_PERMISSIONS);
    }

    #[tokio::test]
    async fn test_kicked_member_is_evicted() {
        let repo = repository();
        let group = populated(&repo, 1);
        let hub = Arc::new(Hub::new(repo.clone()));
        let mut conns = connect_all(&hub, &group);

        let kick = format!(
            r#"{{"action":"kick","payload":{{"memberId":"{}"}}}}"#,
            group.members[1].id
        );
        hub.dispatch(&conns[0].0, &kick).unwrap().await.unwrap();

        // The kick update is the last frame the removed member gets.
        let frames = drain(&mut conns[1].1);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["payload"]["members"].as_array().unwrap().len(), 1);
        assert_eq!(hub.connection_count(&group.id), 1);
        assert!(!hub.deregister(&conns[1].0));

        let coords = format!(
            r#"{{"action":"send_coordinates","payload":{{"memberId":"{}","lat":1,"lng":1}}}}"#,
            group.members[0].id
        );
        hub.dispatch(&conns[0].0, &coords).unwrap().await.unwrap();

        assert_eq!(drain(&mut conns[0].1).len(), 2);
        assert!(drain(&mut conns[1].1).is_empty());
    }

    // =============================================================================
    // CONCURRENCY
    // =============================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_actions_fan_out_to_all() {
        const MEMBERS: usize = 16;

        let repo = repository();
        let group = populated(&repo, MEMBERS - 1);
        let hub = Arc::new(Hub::new(repo.clone()));
        let mut conns = connect_all(&hub, &group);

        let handles: Vec<_> = conns
            .iter()
            .zip(group.members.iter())
            .enumerate()
            .map(|(i, ((connection, _), member))| {
                let frame = format!(
                    r#"{{"action":"send_coordinates","payload":{{"memberId":"{}","lat":{},"lng":0}}}}"#,
                    member.id, i
                );
                hub.dispatch(connection, &frame).unwrap()
            })
            .collect();

        for result in join_all(handles).await {
            result.unwrap();
        }

        for (_, rx) in conns.iter_mut() {
            let frames = drain(rx);
            assert_eq!(frames.len(), MEMBERS);
            assert!(frames.iter().all(|f| f["type"] == "update"));
        }

        let final_view = repo
            .get_group_by_id(&group.id, &group.members[0].security_pile())
            .unwrap();
        for (i, member) in final_view.members.iter().enumerate() {
            assert_eq!(member.coords_bit.lat, i as f32);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_joins_are_not_lost() {
        const JOINERS: usize = 32;

        let repo = repository();
        let group = repo.create_group(draft("A", "founder", 0.0, 0.0)).unwrap();

        let tasks: Vec<_> = (0..JOINERS)
            .map(|i| {
                let repo = repo.clone();
                let group_id = group.id.clone();
                tokio::spawn(async move {
                    repo.add_member_to_group(&group_id, draft("M", &format!("dev-{}", i), 0.0, 0.0))
                })
            })
            .collect();
        for result in join_all(tasks).await {
            assert!(result.unwrap().is_ok());
        }

        let view = repo
            .get_group_by_id(&group.id, &group.members[0].security_pile())
            .unwrap();
        assert_eq!(view.members.len(), JOINERS + 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_rejoins_keep_one_member() {
        let repo = repository();
        let group = repo.create_group(draft("A", "founder", 0.0, 0.0)).unwrap();

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let repo = repo.clone();
                let group_id = group.id.clone();
                tokio::spawn(async move {
                    repo.add_member_to_group(&group_id, draft("B", "same-device", i as f32, 0.0))
                })
            })
            .collect();
        let outcomes: Vec<_> = join_all(tasks)
            .await
            .into_iter()
            .map(|r| r.unwrap().unwrap())
            .collect();

        let created = outcomes.iter().filter(|o| o.is_new_member()).count();
        assert_eq!(created, 1);

        let view = repo
            .get_group_by_id(&group.id, &group.members[0].security_pile())
            .unwrap();
        assert_eq!(view.members.len(), 2);
    }

    #[tokio::test]
    async fn test_unparseable_frames_send_nothing() {
        let repo = repository();
        let group = populated(&repo, 0);
        let hub = Arc::new(Hub::new(repo.clone()));
        let mut conns = connect_all(&hub, &group);

        assert!(hub.dispatch(&conns[0].0, "garbage").is_none());
        assert!(hub.dispatch(&conns[0].0, r#"{"action":"teleport"}"#).is_none());
        assert!(hub.dispatch(&conns[0].0, r#"{"action":"kick"}"#).is_none());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(drain(&mut conns[0].1).is_empty());
    }
}
