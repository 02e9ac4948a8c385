//! Role matrix for registry resources.
//!
//! Checks are pure functions over the caller's identity and the target record
//! so handlers can apply them to single reads and list filters alike. A caller
//! acting on their own record is matched before any role rule, and an unknown
//! role is never granted anything.

use crate::models::{Application, Identity, Klink, Registrant, Role};

/// Which fields of a registrant the caller may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateScope {
    /// Name and email.
    Profile,
    /// Profile plus role and active flag.
    Full,
}

fn is_known(actor: &Identity) -> bool {
    actor.role != Role::Unknown
}

// ==================== Registrants ====================

pub fn can_read_registrant(actor: &Identity, target: &Registrant) -> bool {
    if !is_known(actor) {
        return false;
    }
    actor.is(target.id) || actor.role.is_privileged()
}

pub fn registrant_update_scope(actor: &Identity, target: &Registrant) -> Option<UpdateScope> {
    match actor.role {
        Role::Unknown => None,
        Role::Owner => Some(UpdateScope::Full),
        Role::Admin if !actor.is(target.id) && target.role == Role::User => {
            Some(UpdateScope::Full)
        }
        Role::Admin => Some(UpdateScope::Profile),
        Role::User if actor.is(target.id) => Some(UpdateScope::Profile),
        Role::User => None,
    }
}

pub fn can_delete_registrant(actor: &Identity, target: &Registrant) -> bool {
    match actor.role {
        Role::Owner => true,
        Role::Admin => target.role == Role::User,
        Role::User | Role::Unknown => false,
    }
}

pub fn can_create_registrant(actor: &Identity) -> bool {
    actor.role.is_privileged()
}

/// Roles the caller may hand out. Nobody below OWNER grants OWNER.
pub fn can_assign_role(actor: &Identity, role: Role) -> bool {
    match (actor.role, role) {
        (_, Role::Unknown) => false,
        (Role::Owner, _) => true,
        (Role::Admin, Role::User | Role::Admin) => true,
        _ => false,
    }
}

// ==================== Applications ====================

pub fn can_access_application(actor: &Identity, application: &Application) -> bool {
    if !is_known(actor) {
        return false;
    }
    actor.role.is_privileged() || actor.is(application.owner_id)
}

pub fn can_reassign_application_owner(actor: &Identity) -> bool {
    actor.role.is_privileged()
}

// ==================== K-Links ====================

pub fn can_read_klinks(actor: &Identity) -> bool {
    is_known(actor)
}

pub fn can_manage_klinks(actor: &Identity) -> bool {
    actor.role.is_privileged()
}

pub fn can_update_klink(actor: &Identity, klink: &Klink) -> bool {
    if !is_known(actor) {
        return false;
    }
    actor.role.is_privileged() || actor.is(klink.manager_id)
}

// ==================== Permissions ====================

pub fn can_manage_permissions(actor: &Identity) -> bool {
    actor.role.is_privileged()
}
