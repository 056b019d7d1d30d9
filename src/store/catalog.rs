//! Universities and job postings

use super::{is_constraint_violation, Store, StoreError};
use crate::auth::policy::ScopeFilter;
use crate::models::{JobPosting, University};
use rusqlite::{params, params_from_iter, types::Value, OptionalExtension};
use tracing::debug;

/// Read query over job postings.
///
/// Built by handlers from the policy's [`ScopeFilter`] plus optional search
/// terms; only the store knows how it becomes SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobQuery {
    scope: ScopeFilter,
    keyword: Option<String>,
}

impl JobQuery {
    pub fn new(scope: ScopeFilter) -> Self {
        Self {
            scope,
            keyword: None,
        }
    }

    /// Case-insensitive substring match on job title or university name.
    /// Blank keywords are ignored.
    pub fn with_keyword(mut self, keyword: &str) -> Self {
        let keyword = keyword.trim();
        self.keyword = (!keyword.is_empty()).then(|| keyword.to_string());
        self
    }

    fn to_sql(&self) -> (String, Vec<Value>) {
        let mut sql = String::from(
            "SELECT j.id, j.job_title, j.link, j.university_id, u.name
             FROM job_postings j
             JOIN universities u ON j.university_id = u.id
             WHERE 1=1",
        );
        let mut args = Vec::new();

        if let ScopeFilter::University(id) = self.scope {
            sql.push_str(" AND j.university_id = ?");
            args.push(Value::Integer(id));
        }

        if let Some(keyword) = &self.keyword {
            let pattern = format!("%{}%", escape_like(keyword));
            sql.push_str(" AND (j.job_title LIKE ? ESCAPE '\\' OR u.name LIKE ? ESCAPE '\\')");
            args.push(Value::Text(pattern.clone()));
            args.push(Value::Text(pattern));
        }

        sql.push_str(" ORDER BY j.id");
        (sql, args)
    }
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

impl Store {
    pub fn add_university(&self, name: &str) -> Result<University, StoreError> {
        let conn = self.conn.lock();
        conn.execute("INSERT INTO universities (name) VALUES (?1)", params![name])?;
        Ok(University {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    /// Look up a university by name, inserting it when missing.
    pub fn ensure_university(&self, name: &str) -> Result<University, StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR IGNORE INTO universities (name) VALUES (?1)",
            params![name],
        )?;
        let id = conn.query_row(
            "SELECT id FROM universities WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(University {
            id,
            name: name.to_string(),
        })
    }

    pub fn list_universities(&self) -> Result<Vec<University>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT id, name FROM universities ORDER BY id")?;
        let universities = stmt
            .query_map([], |row| {
                Ok(University {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(universities)
    }

    pub fn add_job(
        &self,
        job_title: &str,
        link: &str,
        university_id: i64,
    ) -> Result<JobPosting, StoreError> {
        let conn = self.conn.lock();
        let university_name: Option<String> = conn
            .query_row(
                "SELECT name FROM universities WHERE id = ?1",
                params![university_id],
                |row| row.get(0),
            )
            .optional()?;
        let university_name = university_name.ok_or(StoreError::UnknownUniversity(university_id))?;

        conn.execute(
            "INSERT INTO job_postings (job_title, link, university_id) VALUES (?1, ?2, ?3)",
            params![job_title, link, university_id],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                StoreError::UnknownUniversity(university_id)
            } else {
                e.into()
            }
        })?;

        Ok(JobPosting {
            id: conn.last_insert_rowid(),
            job_title: job_title.to_string(),
            link: link.to_string(),
            university_id,
            university_name,
        })
    }

    /// Job postings visible under the query's scope
    pub fn list_jobs(&self, query: &JobQuery) -> Result<Vec<JobPosting>, StoreError> {
        let (sql, args) = query.to_sql();
        debug!(scope = ?query.scope, keyword = ?query.keyword, "Listing jobs");

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let jobs = stmt
            .query_map(params_from_iter(args), |row| {
                Ok(JobPosting {
                    id: row.get(0)?,
                    job_title: row.get(1)?,
                    link: row.get(2)?,
                    university_id: row.get(3)?,
                    university_name: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_store() -> (Store, University, University) {
        let store = Store::in_memory().unwrap();
        let uq = store.add_university("UQ").unwrap();
        let unsw = store.add_university("UNSW").unwrap();
        store
            .add_job("Research Assistant", "https://uq.example/ra", uq.id)
            .unwrap();
        store
            .add_job("Lecturer in Data Science", "https://uq.example/lds", uq.id)
            .unwrap();
        store
            .add_job("Postdoc 100%_match", "https://unsw.example/pd", unsw.id)
            .unwrap();
        (store, uq, unsw)
    }

    #[test]
    fn test_unscoped_returns_every_job() {
        let (store, _, _) = seeded_store();
        let jobs = store.list_jobs(&JobQuery::new(ScopeFilter::Unscoped)).unwrap();
        assert_eq!(jobs.len(), 3);
        assert_eq!(jobs[0].university_name, "UQ");
        assert_eq!(jobs[2].university_name, "UNSW");
    }

    #[test]
    fn test_university_scope_filters_rows() {
        let (store, uq, unsw) = seeded_store();

        let jobs = store
            .list_jobs(&JobQuery::new(ScopeFilter::University(uq.id)))
            .unwrap();
        assert_eq!(jobs.len(), 2);
        assert!(jobs.iter().all(|j| j.university_id == uq.id));

        let jobs = store
            .list_jobs(&JobQuery::new(ScopeFilter::University(unsw.id)))
            .unwrap();
        assert_eq!(jobs.len(), 1);

        let jobs = store
            .list_jobs(&JobQuery::new(ScopeFilter::University(999)))
            .unwrap();
        assert!(jobs.is_empty());
    }

    #[test]
    fn test_keyword_matches_title_or_university() {
        let (store, uq, _) = seeded_store();

        let q = JobQuery::new(ScopeFilter::Unscoped).with_keyword("lecturer");
        let jobs = store.list_jobs(&q).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job_title, "Lecturer in Data Science");

        let q = JobQuery::new(ScopeFilter::Unscoped).with_keyword("unsw");
        assert_eq!(store.list_jobs(&q).unwrap().len(), 1);

        // Keyword and scope combine
        let q = JobQuery::new(ScopeFilter::University(uq.id)).with_keyword("postdoc");
        assert!(store.list_jobs(&q).unwrap().is_empty());
    }

    #[test]
    fn test_keyword_wildcards_are_literal() {
        let (store, _, _) = seeded_store();

        let q = JobQuery::new(ScopeFilter::Unscoped).with_keyword("%_");
        let jobs = store.list_jobs(&q).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job_title, "Postdoc 100%_match");

        let q = JobQuery::new(ScopeFilter::Unscoped).with_keyword("_");
        assert_eq!(store.list_jobs(&q).unwrap().len(), 1);
    }

    #[test]
    fn test_blank_keyword_ignored() {
        let q = JobQuery::new(ScopeFilter::Unscoped).with_keyword("   ");
        assert_eq!(q, JobQuery::new(ScopeFilter::Unscoped));
    }

    #[test]
    fn test_job_for_unknown_university_rejected() {
        let store = Store::in_memory().unwrap();
        assert!(matches!(
            store.add_job("Tutor", "https://x.example", 5),
            Err(StoreError::UnknownUniversity(5))
        ));
    }

    #[test]
    fn test_ensure_university_is_idempotent() {
        let store = Store::in_memory().unwrap();
        let a = store.ensure_university("UQ").unwrap();
        let b = store.ensure_university("UQ").unwrap();
        assert_eq!(a, b);
        assert_eq!(store.list_universities().unwrap(), vec![a]);
    }
}
