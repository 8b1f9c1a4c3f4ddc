use super::response::{ApiError, ApiResponse, ErrorDetail};
use super::session::Session;
use super::state::{GuardedJobStore, ServerState};
use crate::job_store::JobRecord;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_PAGE_LIMIT: usize = 100;
pub const MAX_PAGE_LIMIT: usize = 200;

#[derive(Deserialize, Debug)]
struct PageParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct PageMeta {
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PageMeta {
    pub fn new(total: usize, page: usize, limit: usize) -> Self {
        let total_pages = total.div_ceil(limit);
        PageMeta {
            total,
            page,
            limit,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
        }
    }
}

impl PageParams {
    fn resolve(&self) -> Result<(usize, usize), ApiError> {
        let mut errors = Vec::new();
        let page = self.page.unwrap_or(1);
        if page < 1 {
            errors.push(ErrorDetail::validation(
                Some("page"),
                "Page must be at least 1",
            ));
        }
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            errors.push(ErrorDetail::validation(
                Some("limit"),
                format!("Limit must be between 1 and {}", MAX_PAGE_LIMIT),
            ));
        }
        if errors.is_empty() {
            Ok((page, limit))
        } else {
            Err(ApiError::Validation(errors))
        }
    }
}

/// Rows to skip before `page`, None when it does not fit in a usize.
fn page_offset(page: usize, limit: usize) -> Option<usize> {
    page.checked_sub(1)?.checked_mul(limit)
}

async fn list_jobs(
    _session: Session,
    State(job_store): State<GuardedJobStore>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<ApiResponse<Vec<JobRecord>>, ApiError> {
    let Query(params) = params?;
    let (page, limit) = params.resolve()?;

    let total = job_store.count_jobs()?;
    let jobs = match page_offset(page, limit) {
        Some(offset) if offset < total => job_store.list_jobs(offset, limit)?,
        _ => Vec::new(),
    };
    let meta = PageMeta::new(total, page, limit);

    let meta = serde_json::to_value(meta).map_err(anyhow::Error::from)?;
    Ok(ApiResponse::success("Jobs fetched successfully", jobs).with_meta(meta))
}

async fn get_job(
    _session: Session,
    State(job_store): State<GuardedJobStore>,
    Path(job_id): Path<String>,
) -> Result<ApiResponse<JobRecord>, ApiError> {
    let id = Uuid::parse_str(&job_id)
        .map_err(|_| ApiError::BadRequest("Invalid job ID".to_string()))?;
    match job_store.get_job(&id)? {
        Some(job) => Ok(ApiResponse::success("Job fetched successfully", job)),
        None => Err(ApiError::NotFound("Job not found".to_string())),
    }
}

pub fn make_job_routes() -> Router<ServerState> {
    Router::new()
        .route("/jobs", get(list_jobs))
        .route("/jobs/{job_id}", get(get_job))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_meta_boundaries() {
        assert_eq!(
            PageMeta::new(0, 1, 100),
            PageMeta {
                total: 0,
                page: 1,
                limit: 100,
                total_pages: 0,
                has_next: false,
                has_previous: false,
            }
        );

        let middle = PageMeta::new(250, 2, 100);
        assert_eq!(middle.total_pages, 3);
        assert!(middle.has_next);
        assert!(middle.has_previous);

        let last = PageMeta::new(250, 3, 100);
        assert!(!last.has_next);
    }

    #[test]
    fn page_offset_does_not_overflow() {
        assert_eq!(page_offset(1, 100), Some(0));
        assert_eq!(page_offset(3, 50), Some(100));
        assert_eq!(page_offset(usize::MAX, 200), None);
        assert_eq!(page_offset(usize::MAX / 100 + 2, 100), None);
    }

    #[test]
    fn page_params_defaults_and_limits() {
        let defaults = PageParams {
            page: None,
            limit: None,
        };
        assert_eq!(defaults.resolve().unwrap(), (1, DEFAULT_PAGE_LIMIT));

        let too_big = PageParams {
            page: Some(1),
            limit: Some(MAX_PAGE_LIMIT + 1),
        };
        assert!(matches!(too_big.resolve(), Err(ApiError::Validation(_))));

        let zero_page = PageParams {
            page: Some(0),
            limit: Some(10),
        };
        match zero_page.resolve() {
            Err(ApiError::Validation(errors)) => {
                assert_eq!(errors[0].field.as_deref(), Some("page"))
            }
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
    }
}
