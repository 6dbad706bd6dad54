//! Paging for the list endpoints.
//!
//! Every list query (`ListPayeesQuery`, `ListBillsQuery`, `ListPaymentsQuery`, `ListUsersQuery`)
//! flattens a [`Pagination`] next to its own filters. Features turn it into a [`PageWindow`],
//! hand the window to the repository filter and wrap the rows with
//! [`PaginatedResponse::from_rows`].

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// `skip`/`limit` as they arrive in the query string.
///
/// Flattened query structs hand every value over as a string, hence `DisplayFromStr`.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct Pagination {
    /// Rows to skip (default 0)
    #[param(default = 0, minimum = 0)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub skip: Option<i64>,

    /// Rows per page (default 10, at most 100)
    #[param(default = 10, minimum = 1, maximum = 100)]
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub limit: Option<i64>,
}

/// A normalised page: `skip >= 0` and `1 <= limit <= MAX_PAGE_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub skip: i64,
    pub limit: i64,
}

impl Pagination {
    pub fn window(&self) -> PageWindow {
        PageWindow {
            skip: self.skip.unwrap_or(0).max(0),
            limit: self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }
}

/// One page of a list endpoint, with the unpaged total
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T: ToSchema> {
    pub data: Vec<T>,
    /// Rows matching the filters before paging
    pub total_count: i64,
    pub skip: i64,
    pub limit: i64,
}

impl<T: ToSchema> PaginatedResponse<T> {
    /// Map stored rows into their API shape and attach the window they were read with
    pub fn from_rows<R>(rows: Vec<R>, total_count: i64, window: PageWindow) -> Self
    where
        T: From<R>,
    {
        Self {
            data: rows.into_iter().map(T::from).collect(),
            total_count,
            skip: window.skip,
            limit: window.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::bills::ListBillsQuery;
    use crate::api::models::payments::ListPaymentsQuery;
    use crate::db::models::bills::BillStatus;
    use axum::extract::Query;
    use chrono::{TimeZone, Utc};
    use serde::de::DeserializeOwned;
    use uuid::Uuid;

    fn parse<Q: DeserializeOwned>(query: &str) -> Result<Q, String> {
        let uri: axum::http::Uri = format!("http://localhost/api/list?{query}").parse().unwrap();
        Query::<Q>::try_from_uri(&uri).map(|q| q.0).map_err(|e| e.to_string())
    }

    #[test]
    fn test_bill_query_reads_filters_and_paging_together() {
        let query: ListBillsQuery = parse("status=overdue&due_from=2026-10-01T00:00:00Z&skip=20").unwrap();

        assert_eq!(query.status, Some(BillStatus::Overdue));
        assert_eq!(query.due_from, Some(Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap()));
        assert_eq!(query.due_to, None);
        assert_eq!(
            query.pagination.window(),
            PageWindow {
                skip: 20,
                limit: DEFAULT_PAGE_SIZE
            }
        );
    }

    #[test]
    fn test_payment_query_clamps_out_of_range_paging() {
        let bill_id = Uuid::new_v4();
        let query: ListPaymentsQuery = parse(&format!("bill_id={bill_id}&skip=-3&limit=5000")).unwrap();

        assert_eq!(query.bill_id, Some(bill_id));
        assert_eq!(query.pagination.window(), PageWindow { skip: 0, limit: MAX_PAGE_SIZE });

        let query: ListPaymentsQuery = parse("limit=0").unwrap();
        assert_eq!(query.pagination.window().limit, 1);
    }

    #[test]
    fn test_non_numeric_paging_is_rejected() {
        assert!(parse::<ListBillsQuery>("skip=ten").is_err());
        assert!(parse::<ListBillsQuery>("status=settled").is_err());
    }

    #[derive(Debug, ToSchema)]
    struct Label(String);

    impl From<u32> for Label {
        fn from(n: u32) -> Self {
            Label(format!("#{n}"))
        }
    }

    #[test]
    fn test_from_rows_maps_each_row() {
        let window = Pagination {
            skip: Some(2),
            limit: Some(2),
        }
        .window();
        let page = PaginatedResponse::<Label>::from_rows(vec![3u32, 4], 7, window);

        assert_eq!(page.data.iter().map(|l| l.0.as_str()).collect::<Vec<_>>(), ["#3", "#4"]);
        assert_eq!((page.total_count, page.skip, page.limit), (7, 2, 2));
    }
}
