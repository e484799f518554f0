//! Shared pagination parsing for list endpoints (design §4.10), promoted to
//! one helper since the teacher repeats an inline `req.limit.min(1000)`
//! clamp across five handler families.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 1000;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub limit: usize,
    pub offset: usize,
}

impl Pagination {
    pub fn parse(params: PaginationParams) -> Result<Self, AppError> {
        let limit = match params.limit {
            None => DEFAULT_LIMIT,
            Some(l) if l < 0 => return Err(AppError::BadPagination(format!("limit must not be negative, got {l}"))),
            Some(l) if l as usize > MAX_LIMIT => {
                return Err(AppError::BadPagination(format!("limit {l} exceeds the maximum of {MAX_LIMIT}")))
            }
            Some(l) => l as usize,
        };
        let offset = match params.offset {
            None => 0,
            Some(o) if o < 0 => return Err(AppError::BadPagination(format!("offset must not be negative, got {o}"))),
            Some(o) => o as usize,
        };
        Ok(Self { limit, offset })
    }

    /// Slice `items` to this page and build the envelope, without needing
    /// the caller to juggle `total`/`has_more` bookkeeping itself.
    pub fn paginate<T: Clone>(&self, items: &[T]) -> ListResponse<T> {
        let total = items.len();
        let data = items.iter().skip(self.offset).take(self.limit).cloned().collect();
        let has_more = self.offset + self.limit < total;
        ListResponse { data, total, limit: self.limit, offset: self.offset, has_more }
    }
}

/// The `{data, total, limit, offset, has_more}` envelope every list
/// endpoint returns (design §6).
#[derive(Debug, Clone, Serialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub has_more: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_limit_is_rejected() {
        let err = Pagination::parse(PaginationParams { limit: Some(-1), offset: None });
        assert!(matches!(err, Err(AppError::BadPagination(_))));
    }

    #[test]
    fn limit_above_max_is_rejected() {
        let err = Pagination::parse(PaginationParams { limit: Some(1001), offset: None });
        assert!(matches!(err, Err(AppError::BadPagination(_))));
    }

    #[test]
    fn defaults_are_100_and_0() {
        let pagination = Pagination::parse(PaginationParams { limit: None, offset: None }).unwrap();
        assert_eq!(pagination.limit, 100);
        assert_eq!(pagination.offset, 0);
    }

    #[test]
    fn has_more_reflects_remaining_items() {
        let pagination = Pagination { limit: 2, offset: 0 };
        let page = pagination.paginate(&[1, 2, 3]);
        assert_eq!(page.data, vec![1, 2]);
        assert!(page.has_more);
        assert_eq!(page.total, 3);
    }
}
