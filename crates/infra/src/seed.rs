//! Development seed: the platform menu, two groups, and one credential per user.

use chrono::Duration;
use tracing::info;

use coursedesk_auth::{
    Action, AdminError, Grant, GrantFlags, IssuedCredential, PermissionGroup, ResourceNode,
    UrlPath, UserAccount, operations::PLATFORM_ROUTES,
};
use coursedesk_core::{DomainError, GroupId, ResourceNodeId, UserId};

use crate::store::AccessStores;

pub const SEED_CREDENTIAL_TTL_HOURS: i64 = 12;

#[derive(Debug, Clone)]
pub struct SeededUser {
    pub user_id: UserId,
    pub group_id: GroupId,
    pub credential: IssuedCredential,
}

#[derive(Debug, Clone)]
pub struct SeedReport {
    pub nodes: Vec<ResourceNode>,
    pub admin: SeededUser,
    pub instructor: SeededUser,
}

fn label_for(segment: &str) -> String {
    segment
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// The menu tree implied by the operation routes.
///
/// Every route becomes a node; the first segment of a nested route becomes a
/// grouping node. Position follows declaration order.
pub fn platform_nodes() -> Result<Vec<ResourceNode>, DomainError> {
    let mut nodes: Vec<ResourceNode> = Vec::new();

    for (position, (raw, _)) in PLATFORM_ROUTES.iter().enumerate() {
        let path = UrlPath::new(raw)?;
        let parent_id = match path.as_str().split_once('/') {
            None => None,
            Some((category, _)) => {
                let category_path = UrlPath::new(category)?;
                match nodes.iter().find(|n| n.url_path == category_path) {
                    Some(existing) => Some(existing.id),
                    None => {
                        let mut group = ResourceNode::new(
                            ResourceNodeId::new(),
                            category_path,
                            None,
                            label_for(category),
                        );
                        group.position = position as i32;
                        let id = group.id;
                        nodes.push(group);
                        Some(id)
                    }
                }
            }
        };

        let leaf = path.as_str().rsplit('/').next().unwrap_or(path.as_str()).to_string();
        let mut node = ResourceNode::new(ResourceNodeId::new(), path, parent_id, label_for(&leaf));
        node.position = position as i32;
        nodes.push(node);
    }

    Ok(nodes)
}

/// Populate an empty store with the platform menu and demo accounts.
pub async fn seed_demo(stores: &AccessStores) -> Result<SeedReport, AdminError> {
    let admin_service = stores.permission_admin();
    let nodes = platform_nodes()?;
    for node in &nodes {
        admin_service.register_resource(node.clone()).await?;
    }

    let administrators = PermissionGroup::new(GroupId::new(), "administrators");
    let instructors = PermissionGroup::new(GroupId::new(), "instructors");
    admin_service.register_group(administrators.clone()).await?;
    admin_service.register_group(instructors.clone()).await?;

    for node in &nodes {
        admin_service
            .set_grant(Grant {
                resource_id: node.id,
                group_id: administrators.id,
                flags: GrantFlags::ALL,
            })
            .await?;

        let instructor_flags = match node.url_path.as_str() {
            "dashboard" => GrantFlags::only(&[Action::View]),
            "academic/courses" | "academic/classes" => {
                GrantFlags::only(&[Action::View, Action::Edit, Action::Upload])
            }
            "academic/students" => GrantFlags::only(&[Action::View]),
            _ => continue,
        };
        admin_service
            .set_grant(Grant {
                resource_id: node.id,
                group_id: instructors.id,
                flags: instructor_flags,
            })
            .await?;
    }

    let admin = seed_user(stores, "Platform Admin", administrators.id).await?;
    let instructor = seed_user(stores, "Demo Instructor", instructors.id).await?;

    info!(
        nodes = nodes.len(),
        admin_user = %admin.user_id,
        instructor_user = %instructor.user_id,
        "demo data seeded"
    );

    Ok(SeedReport {
        nodes,
        admin,
        instructor,
    })
}

async fn seed_user(stores: &AccessStores, name: &str, group_id: GroupId) -> Result<SeededUser, AdminError> {
    let user = UserAccount::new(UserId::new(), name, Some(group_id));
    let user_id = user.id;
    stores.permission_admin().register_user(user).await?;
    let credential = stores
        .credentials
        .issue(user_id, Duration::hours(SEED_CREDENTIAL_TTL_HOURS))
        .await?;
    Ok(SeededUser {
        user_id,
        group_id,
        credential,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursedesk_auth::ResourceTree;

    #[test]
    fn platform_nodes_form_a_valid_tree() {
        let nodes = platform_nodes().unwrap();
        let tree = ResourceTree::new(nodes).unwrap();

        let courses = tree.by_path(&UrlPath::new("academic/courses").unwrap()).unwrap();
        let academic = tree.by_path(&UrlPath::new("academic").unwrap()).unwrap();
        assert_eq!(courses.parent_id, Some(academic.id));
        assert_eq!(academic.label, "Academic");
        assert!(tree.len() > PLATFORM_ROUTES.len());
    }

    #[test]
    fn labels_are_title_cased() {
        assert_eq!(label_for("email-templates"), "Email Templates");
        assert_eq!(label_for("crm"), "Crm");
    }
}
