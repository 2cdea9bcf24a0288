//! End-to-end authorization flow: bootstrap a store, mutate relationships
//! through the manager, and gate on the access controller.

use std::sync::Arc;

use anyhow::Result;

use rebac_domain::model::{ObjectRef, RelationshipTuple, SchemaRegistry, Subject};
use rebac_domain::resolver::PermissionResolver;
use rebac_server::config::BootstrapSettings;
use rebac_server::schema::{
    default_model, ADMIN_RELATION, CREATE_APP_RELATION, EDIT_APP_RELATION, MODERATOR_RELATION,
    ORGANIZATION_RELATION, ORGANIZATION_TYPE, SPACE_TYPE, USER_TYPE,
};
use rebac_server::{
    AccessController, Bootstrap, BootstrapStage, ManagerError, RelationshipManager,
    StoreTupleReader,
};
use rebac_storage::{MemoryTupleStore, TupleFilter, TupleStore};

struct Env {
    store: Arc<MemoryTupleStore>,
    store_id: String,
    manager: RelationshipManager<MemoryTupleStore>,
    access: AccessController<StoreTupleReader<MemoryTupleStore>, SchemaRegistry>,
}

async fn operational_env() -> Result<Env> {
    let store = MemoryTupleStore::new_shared();
    let settings = BootstrapSettings::default();

    let bootstrapped = Bootstrap::new(Arc::clone(&store))
        .run(&settings, default_model())
        .await?;
    assert_eq!(bootstrapped.stage, BootstrapStage::Operational);

    let manager = RelationshipManager::new(
        Arc::clone(&store),
        Arc::clone(&bootstrapped.registry),
        bootstrapped.store_id.clone(),
    );
    let reader = Arc::new(StoreTupleReader::new(
        Arc::clone(&store),
        bootstrapped.store_id.clone(),
    ));
    let access = AccessController::new(PermissionResolver::new(
        reader,
        Arc::clone(&bootstrapped.registry),
    ));

    Ok(Env {
        store,
        store_id: bootstrapped.store_id,
        manager,
        access,
    })
}

fn user(id: &str) -> ObjectRef {
    ObjectRef::new(USER_TYPE, id)
}

fn space(id: &str) -> ObjectRef {
    ObjectRef::new(SPACE_TYPE, id)
}

fn org(id: &str) -> ObjectRef {
    ObjectRef::new(ORGANIZATION_TYPE, id)
}

#[tokio::test]
async fn bootstrap_seeds_a_working_root_admin() -> Result<()> {
    let env = operational_env().await?;

    let allowed = env
        .access
        .allowed(user("root"), ADMIN_RELATION, org("default"))
        .await?;
    assert!(allowed, "the seeded root admin must hold admin on the root org");
    Ok(())
}

#[tokio::test]
async fn org_admin_inherits_space_permissions_through_the_link() -> Result<()> {
    let env = operational_env().await?;

    // Alice administers the organization; the space is linked to it. No
    // direct or moderator tuple exists on the space.
    env.manager
        .apply_batch(
            vec![
                RelationshipTuple::new(
                    Subject::object(USER_TYPE, "alice"),
                    ADMIN_RELATION,
                    org("default"),
                ),
                RelationshipTuple::new(
                    Subject::Object(org("default")),
                    ORGANIZATION_RELATION,
                    space("eng"),
                ),
            ],
            vec![],
        )
        .await?;

    assert!(
        env.access
            .allowed(user("alice"), CREATE_APP_RELATION, space("eng"))
            .await?
    );

    // The alias relation follows the same path.
    assert!(
        env.access
            .allowed(user("alice"), EDIT_APP_RELATION, space("eng"))
            .await?
    );
    Ok(())
}

#[tokio::test]
async fn empty_graph_denies_everyone() -> Result<()> {
    let env = operational_env().await?;

    let allowed = env
        .access
        .allowed(user("bob"), CREATE_APP_RELATION, space("eng"))
        .await?;

    assert!(!allowed);
    assert_eq!(env.access.metrics().snapshot().denied, 1);
    Ok(())
}

#[tokio::test]
async fn moderator_revocation_leaves_inherited_admin_grant_intact() -> Result<()> {
    let env = operational_env().await?;

    env.manager
        .space_created("eng", Subject::object(USER_TYPE, "carol"), "default")
        .await?;
    env.manager
        .org_role_granted("default", Subject::object(USER_TYPE, "carol"), ADMIN_RELATION)
        .await?;

    // Revoke the space-specific role only.
    env.manager
        .apply_batch(
            vec![],
            vec![RelationshipTuple::new(
                Subject::object(USER_TYPE, "carol"),
                MODERATOR_RELATION,
                space("eng"),
            )],
        )
        .await?;

    assert!(
        !env.access
            .allowed(user("carol"), MODERATOR_RELATION, space("eng"))
            .await?,
        "the moderator role itself is gone"
    );
    assert!(
        env.access
            .allowed(user("carol"), CREATE_APP_RELATION, space("eng"))
            .await?,
        "the org-admin union branch must still grant"
    );
    Ok(())
}

#[tokio::test]
async fn add_then_remove_restores_the_original_decision() -> Result<()> {
    let env = operational_env().await?;
    let tuple = RelationshipTuple::new(
        Subject::object(USER_TYPE, "dave"),
        MODERATOR_RELATION,
        space("eng"),
    );

    let before = env
        .access
        .allowed(user("dave"), CREATE_APP_RELATION, space("eng"))
        .await?;
    assert!(!before);

    env.manager.apply_batch(vec![tuple.clone()], vec![]).await?;
    assert!(
        env.access
            .allowed(user("dave"), CREATE_APP_RELATION, space("eng"))
            .await?
    );

    env.manager.apply_batch(vec![], vec![tuple]).await?;
    let after = env
        .access
        .allowed(user("dave"), CREATE_APP_RELATION, space("eng"))
        .await?;
    assert_eq!(before, after);
    Ok(())
}

#[tokio::test]
async fn invalid_tuple_in_a_batch_applies_nothing() -> Result<()> {
    let env = operational_env().await?;

    let valid = RelationshipTuple::new(
        Subject::object(USER_TYPE, "carol"),
        MODERATOR_RELATION,
        space("eng"),
    );
    let unknown_relation = RelationshipTuple::new(
        Subject::object(USER_TYPE, "carol"),
        "publish_app",
        space("eng"),
    );

    let result = env
        .manager
        .apply_batch(vec![valid, unknown_relation], vec![])
        .await;
    assert!(matches!(result, Err(ManagerError::InvalidTuple(_))));

    let remaining = env
        .store
        .read(&env.store_id, &TupleFilter::for_object(&space("eng")))
        .await?;
    assert!(remaining.is_empty(), "all-or-nothing: the valid tuple must not land");
    Ok(())
}

#[tokio::test]
async fn moderator_handover_is_atomic_and_complete() -> Result<()> {
    let env = operational_env().await?;

    env.manager
        .space_created("eng", Subject::object(USER_TYPE, "carol"), "default")
        .await?;
    env.manager
        .moderator_changed(
            "eng",
            Subject::object(USER_TYPE, "carol"),
            Subject::object(USER_TYPE, "dave"),
        )
        .await?;

    assert!(
        env.access
            .allowed(user("dave"), CREATE_APP_RELATION, space("eng"))
            .await?
    );
    assert!(
        !env.access
            .allowed(user("carol"), CREATE_APP_RELATION, space("eng"))
            .await?
    );
    Ok(())
}

#[tokio::test]
async fn deleting_a_space_revokes_everything_on_it() -> Result<()> {
    let env = operational_env().await?;

    env.manager
        .space_created("eng", Subject::object(USER_TYPE, "carol"), "default")
        .await?;
    assert!(
        env.access
            .allowed(user("carol"), CREATE_APP_RELATION, space("eng"))
            .await?
    );

    env.manager.space_deleted("eng").await?;

    assert!(
        !env.access
            .allowed(user("carol"), CREATE_APP_RELATION, space("eng"))
            .await?
    );
    let remaining = env
        .store
        .read(&env.store_id, &TupleFilter::for_object(&space("eng")))
        .await?;
    assert!(remaining.is_empty());
    Ok(())
}

#[tokio::test]
async fn repeated_lifecycle_calls_stay_idempotent() -> Result<()> {
    let env = operational_env().await?;

    env.manager
        .space_created("eng", Subject::object(USER_TYPE, "carol"), "default")
        .await?;
    // A crash-retry of the same lifecycle event writes the same tuples.
    env.manager
        .space_created("eng", Subject::object(USER_TYPE, "carol"), "default")
        .await?;

    let all = env
        .store
        .read(&env.store_id, &TupleFilter::for_object(&space("eng")))
        .await?;
    assert_eq!(all.len(), 2, "moderator + organization link, once each");
    Ok(())
}

#[tokio::test]
async fn userset_delegation_grants_through_group_membership() -> Result<()> {
    let env = operational_env().await?;

    // Every admin of the org moderates the space, as one delegated tuple.
    env.manager
        .apply_batch(
            vec![
                RelationshipTuple::new(
                    Subject::userset(ORGANIZATION_TYPE, "default", ADMIN_RELATION),
                    MODERATOR_RELATION,
                    space("eng"),
                ),
                RelationshipTuple::new(
                    Subject::object(USER_TYPE, "alice"),
                    ADMIN_RELATION,
                    org("default"),
                ),
            ],
            vec![],
        )
        .await?;

    assert!(
        env.access
            .allowed(user("alice"), MODERATOR_RELATION, space("eng"))
            .await?
    );
    assert!(
        !env.access
            .allowed(user("bob"), MODERATOR_RELATION, space("eng"))
            .await?
    );
    Ok(())
}
