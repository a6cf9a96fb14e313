//! Page/limit pagination for list queries
//!
//! Clients send `{ page, limit }`; storage wants an offset/limit window.

use async_graphql::InputObject;

pub const DEFAULT_LIMIT: i64 = 10;
pub const DEFAULT_PAGE: i64 = 1;

/// Pagination input accepted by every list query.
#[derive(InputObject, Default, Clone, Debug)]
pub struct PaginationInput {
    /// Page size (default: 10)
    pub limit: Option<i32>,

    /// 1-based page number (default: 1)
    pub page: Option<i32>,
}

/// An offset/limit pair handed to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: i64,
    pub limit: i64,
}

impl Default for Window {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Convert a pagination request into a window.
///
/// A missing request, or a request missing either `limit` or `page` (or
/// carrying a zero for one of them), yields the full default window rather
/// than mixing a supplied value with a default one.
pub fn normalize(pagination: Option<&PaginationInput>) -> Window {
    let Some(input) = pagination else {
        return Window::default();
    };

    match (input.limit, input.page) {
        (Some(limit), Some(page)) if limit != 0 && page != 0 => {
            let limit = i64::from(limit);
            let page = i64::from(page);
            Window {
                offset: (page - DEFAULT_PAGE) * limit,
                limit,
            }
        }
        _ => Window::default(),
    }
}
