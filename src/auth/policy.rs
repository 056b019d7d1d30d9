//! Access Policy
//! Mission: Decide, from validated claims alone, what a caller may do and which rows they may see
//!
//! Every protected handler calls [`authorize`] before touching the store. The
//! decision is a pure function of the claims, the operation and the resource
//! kind; nothing here knows about SQL. A granted decision carries a
//! [`ScopeFilter`] that the store turns into a query predicate.

use crate::auth::models::{Claims, UserRole};

/// What the caller wants to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Write,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::Write => "write",
        }
    }
}

/// What the caller wants to do it to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Users,
    Universities,
    Jobs,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Users => "users",
            ResourceKind::Universities => "universities",
            ResourceKind::Jobs => "jobs",
        }
    }
}

/// How much of the job board a role may read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobVisibility {
    /// Every posting
    All,
    /// Postings of the caller's university; everything when unaffiliated
    OwnUniversity,
}

/// Capability table entry for one role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub read_users: bool,
    /// Change another user's role and university affiliation
    pub write_user_access: bool,
    pub read_universities: bool,
    pub read_jobs: bool,
    pub jobs: JobVisibility,
}

const SUPER_ADMIN: Capabilities = Capabilities {
    read_users: true,
    write_user_access: true,
    read_universities: true,
    read_jobs: true,
    jobs: JobVisibility::All,
};

const VIP: Capabilities = Capabilities {
    read_users: false,
    write_user_access: false,
    read_universities: true,
    read_jobs: true,
    jobs: JobVisibility::All,
};

const REGULAR: Capabilities = Capabilities {
    read_users: false,
    write_user_access: false,
    read_universities: true,
    read_jobs: true,
    jobs: JobVisibility::OwnUniversity,
};

impl UserRole {
    pub fn capabilities(&self) -> &'static Capabilities {
        match self {
            UserRole::SuperAdmin => &SUPER_ADMIN,
            UserRole::Vip => &VIP,
            UserRole::Regular => &REGULAR,
        }
    }
}

/// Row restriction attached to a granted read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeFilter {
    Unscoped,
    University(i64),
}

/// Why a request was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenyReason {
    pub role: UserRole,
    pub operation: Operation,
    pub resource: ResourceKind,
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "role '{}' may not {} {}",
            self.role,
            self.operation.as_str(),
            self.resource.as_str()
        )
    }
}

/// Outcome of [`authorize`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow(ScopeFilter),
    Deny(DenyReason),
}

impl Decision {
    pub fn into_result(self) -> Result<ScopeFilter, DenyReason> {
        match self {
            Decision::Allow(scope) => Ok(scope),
            Decision::Deny(reason) => Err(reason),
        }
    }
}

/// Central authorization decision point
pub fn authorize(claims: &Claims, operation: Operation, resource: ResourceKind) -> Decision {
    let caps = claims.role.capabilities();

    let allowed = match (resource, operation) {
        (ResourceKind::Users, Operation::Read) => caps.read_users,
        (ResourceKind::Users, Operation::Write) => caps.write_user_access,
        (ResourceKind::Universities, Operation::Read) => caps.read_universities,
        (ResourceKind::Jobs, Operation::Read) => caps.read_jobs,
        // Catalog is maintained out of band
        (ResourceKind::Universities, Operation::Write) | (ResourceKind::Jobs, Operation::Write) => {
            false
        }
    };

    if !allowed {
        return Decision::Deny(DenyReason {
            role: claims.role,
            operation,
            resource,
        });
    }

    let scope = match (resource, caps.jobs, claims.university_id) {
        (ResourceKind::Jobs, JobVisibility::OwnUniversity, Some(id)) => ScopeFilter::University(id),
        // Unaffiliated regular users fall through to the full board
        _ => ScopeFilter::Unscoped,
    };

    Decision::Allow(scope)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: UserRole, university_id: Option<i64>) -> Claims {
        Claims {
            sub: 1,
            role,
            university_id,
            iat: 0,
            exp: usize::MAX,
        }
    }

    #[test]
    fn test_regular_jobs_scoped_to_university() {
        let decision = authorize(
            &claims(UserRole::Regular, Some(7)),
            Operation::Read,
            ResourceKind::Jobs,
        );
        assert_eq!(decision, Decision::Allow(ScopeFilter::University(7)));
    }

    #[test]
    fn test_regular_without_university_is_unscoped() {
        let decision = authorize(
            &claims(UserRole::Regular, None),
            Operation::Read,
            ResourceKind::Jobs,
        );
        assert_eq!(decision, Decision::Allow(ScopeFilter::Unscoped));
    }

    #[test]
    fn test_vip_and_admin_jobs_unscoped_even_when_affiliated() {
        for role in [UserRole::Vip, UserRole::SuperAdmin] {
            let decision = authorize(&claims(role, Some(3)), Operation::Read, ResourceKind::Jobs);
            assert_eq!(decision, Decision::Allow(ScopeFilter::Unscoped));
        }
    }

    #[test]
    fn test_only_super_admin_reads_and_writes_users() {
        for op in [Operation::Read, Operation::Write] {
            assert_eq!(
                authorize(&claims(UserRole::SuperAdmin, None), op, ResourceKind::Users),
                Decision::Allow(ScopeFilter::Unscoped)
            );
            for role in [UserRole::Vip, UserRole::Regular] {
                let decision = authorize(&claims(role, Some(1)), op, ResourceKind::Users);
                assert!(matches!(decision, Decision::Deny(_)), "{role} {op:?}");
            }
        }
    }

    #[test]
    fn test_universities_readable_by_everyone() {
        for role in UserRole::ALL {
            assert_eq!(
                authorize(&claims(role, Some(2)), Operation::Read, ResourceKind::Universities),
                Decision::Allow(ScopeFilter::Unscoped)
            );
        }
    }

    #[test]
    fn test_catalog_writes_denied_for_every_role() {
        for role in UserRole::ALL {
            for resource in [ResourceKind::Universities, ResourceKind::Jobs] {
                let decision = authorize(&claims(role, None), Operation::Write, resource);
                assert_eq!(
                    decision,
                    Decision::Deny(DenyReason {
                        role,
                        operation: Operation::Write,
                        resource,
                    })
                );
            }
        }
    }

    #[test]
    fn test_deny_reason_message() {
        let reason = authorize(
            &claims(UserRole::Vip, None),
            Operation::Write,
            ResourceKind::Users,
        )
        .into_result()
        .unwrap_err();
        assert_eq!(reason.to_string(), "role 'vip' may not write users");
    }

    #[test]
    fn test_job_reads_follow_capability_table() {
        for role in UserRole::ALL {
            let decision = authorize(&claims(role, None), Operation::Read, ResourceKind::Jobs);
            assert_eq!(
                matches!(decision, Decision::Allow(_)),
                role.capabilities().read_jobs,
                "{role}"
            );
        }
    }

    #[test]
    fn test_capability_table() {
        assert!(UserRole::SuperAdmin.capabilities().write_user_access);
        assert!(!UserRole::Vip.capabilities().read_users);
        assert!(UserRole::ALL.iter().all(|r| r.capabilities().read_jobs));
        assert_eq!(
            UserRole::Regular.capabilities().jobs,
            JobVisibility::OwnUniversity
        );
    }
}
