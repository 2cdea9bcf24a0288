//! Product vocabulary and the default authorization model.
//!
//! The deployment works over a fixed, small vocabulary: users,
//! organizations, and spaces. Spaces link to exactly one organization via
//! the `organization` relation, and organization admins inherit every
//! space-level permission through that link.

use rebac_domain::model::{AuthorizationModel, TypeDefinition, UsersetExpression};

pub const USER_TYPE: &str = "user";
pub const ORGANIZATION_TYPE: &str = "organization";
pub const SPACE_TYPE: &str = "space";

/// Organization administrator.
pub const ADMIN_RELATION: &str = "admin";
/// Generic organization membership.
pub const MEMBER_RELATION: &str = "member";
/// Space moderator role.
pub const MODERATOR_RELATION: &str = "moderator";
/// Link relation: the organization a space belongs to.
pub const ORGANIZATION_RELATION: &str = "organization";
/// Permission to create an app inside a space.
pub const CREATE_APP_RELATION: &str = "create_app";
/// Permission to edit an app; aliases the broader create check.
pub const EDIT_APP_RELATION: &str = "edit_app";
/// Permission to delete an app; reserved to moderators (and, through the
/// union inside `moderator` checks, org admins via `create_app` paths).
pub const DELETE_APP_RELATION: &str = "delete_app";

/// Builds the authorization model installed at bootstrap.
pub fn default_model() -> AuthorizationModel {
    AuthorizationModel::with_types(
        "1.0",
        vec![
            TypeDefinition::new(USER_TYPE),
            TypeDefinition::new(ORGANIZATION_TYPE)
                .with_relation(ADMIN_RELATION, UsersetExpression::Direct)
                .with_relation(MEMBER_RELATION, UsersetExpression::Direct),
            TypeDefinition::new(SPACE_TYPE)
                .with_relation(ORGANIZATION_RELATION, UsersetExpression::Direct)
                .with_relation(MODERATOR_RELATION, UsersetExpression::Direct)
                .with_relation(
                    CREATE_APP_RELATION,
                    UsersetExpression::Union {
                        children: vec![
                            UsersetExpression::Direct,
                            UsersetExpression::ComputedUserset {
                                relation: MODERATOR_RELATION.to_string(),
                            },
                            UsersetExpression::TupleToUserset {
                                tupleset: ORGANIZATION_RELATION.to_string(),
                                computed: ADMIN_RELATION.to_string(),
                            },
                        ],
                    },
                )
                .with_relation(
                    EDIT_APP_RELATION,
                    UsersetExpression::ComputedUserset {
                        relation: CREATE_APP_RELATION.to_string(),
                    },
                )
                .with_relation(
                    DELETE_APP_RELATION,
                    UsersetExpression::Union {
                        children: vec![
                            UsersetExpression::ComputedUserset {
                                relation: MODERATOR_RELATION.to_string(),
                            },
                            UsersetExpression::TupleToUserset {
                                tupleset: ORGANIZATION_RELATION.to_string(),
                                computed: ADMIN_RELATION.to_string(),
                            },
                        ],
                    },
                ),
        ],
    )
}
