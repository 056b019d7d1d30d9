//! Startup provisioning: first super_admin and optional demo catalog.

use crate::auth::{models::UserRole, password::PasswordHasher};
use crate::store::Store;
use anyhow::{Context, Result};
use tracing::{info, warn};

/// Make sure at least one super_admin exists.
///
/// With no super_admin in the store, `username` is created as one, or promoted
/// if it already exists as a lower role. Returns whether anything changed.
pub fn ensure_super_admin(
    store: &Store,
    hasher: &PasswordHasher,
    username: &str,
    password: &str,
) -> Result<bool> {
    let admins = store
        .count_users_with_role(UserRole::SuperAdmin)
        .context("Failed to check for super_admin users")?;
    if admins > 0 {
        return Ok(false);
    }

    match store
        .get_user_by_username(username)
        .context("Failed to look up bootstrap admin")?
    {
        Some(existing) => {
            store
                .update_user_access(existing.id, UserRole::SuperAdmin, existing.university_id)
                .context("Failed to promote bootstrap admin")?;
            info!("Promoted existing user '{}' to super_admin", username);
        }
        None => {
            let password_hash = hasher.hash(password)?;
            store
                .create_user(username, &password_hash, UserRole::SuperAdmin)
                .context("Failed to insert bootstrap admin")?;
            info!("Bootstrap super_admin created (username: {})", username);
        }
    }

    Ok(true)
}

const DEMO_CATALOG: &[(&str, &[(&str, &str)])] = &[
    (
        "UQ",
        &[
            ("Research Assistant - Robotics", "https://careers.uq.edu.au/ra-robotics"),
            ("Lecturer in Data Science", "https://careers.uq.edu.au/lecturer-ds"),
        ],
    ),
    (
        "UNSW",
        &[("Postdoctoral Fellow - Climate", "https://www.jobs.unsw.edu.au/pdf-climate")],
    ),
    (
        "Monash",
        &[("Teaching Associate - Software Engineering", "https://careers.monash.edu/ta-se")],
    ),
];

/// Insert demo universities and postings into an empty catalog.
pub fn seed_demo_catalog(store: &Store) -> Result<usize> {
    if !store.list_universities()?.is_empty() {
        warn!("Catalog not empty - skipping demo seed");
        return Ok(0);
    }

    let mut inserted = 0;
    for (university, jobs) in DEMO_CATALOG {
        let uni = store.ensure_university(university)?;
        for (title, link) in *jobs {
            store.add_job(title, link, uni.id)?;
            inserted += 1;
        }
    }

    info!("Seeded {} demo job postings", inserted);
    Ok(inserted)
}
