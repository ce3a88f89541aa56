//! Success envelope and pagination helpers shared by every resource route.

use actix_web::{body::BoxBody, http::StatusCode, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Hard ceiling on any page size a client may request.
pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_LIST_PAGE_SIZE: u32 = 10;
pub const DEFAULT_TASK_PAGE_SIZE: u32 = 20;

/// `{ success: true, status, message, data?, timestamp }`
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub status: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub timestamp: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn with_status(status: StatusCode, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            success: true,
            status: status.as_u16(),
            message: message.into(),
            data,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::with_status(StatusCode::OK, message, Some(data))
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::with_status(StatusCode::CREATED, message, Some(data))
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK)
    }
}

impl ApiResponse<()> {
    /// Envelope without a `data` member.
    pub fn message(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::OK, message, None)
    }
}

impl<T: Serialize> Responder for ApiResponse<T> {
    type Body = BoxBody;

    fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
        HttpResponse::build(self.status_code()).json(self)
    }
}

/// Raw `?page=&limit=` query. Values are kept as strings so that garbage input
/// falls back to defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Clamps the page to at least 1 and the limit into `1..=MAX_PAGE_SIZE`.
    pub fn resolve(query: &PageQuery, default_limit: u32) -> Self {
        let parse = |raw: &Option<String>| raw.as_deref().and_then(|v| v.trim().parse::<i64>().ok());

        let page = match parse(&query.page) {
            Some(p) if p >= 1 => p.min(u32::MAX as i64) as u32,
            _ => 1,
        };
        let limit = match parse(&query.limit) {
            Some(l) if l >= 1 => l.min(MAX_PAGE_SIZE as i64) as u32,
            _ => default_limit.clamp(1, MAX_PAGE_SIZE),
        };
        Self { page, limit }
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            page: request.page,
            limit: request.limit,
            pages: total.div_ceil(request.limit as u64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, limit: Option<&str>) -> PageQuery {
        PageQuery {
            page: page.map(str::to_string),
            limit: limit.map(str::to_string),
        }
    }

    #[test]
    fn test_page_request_defaults() {
        let req = PageRequest::resolve(&PageQuery::default(), DEFAULT_TASK_PAGE_SIZE);
        assert_eq!(req, PageRequest { page: 1, limit: 20 });
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn test_page_request_clamps_invalid_values() {
        let req = PageRequest::resolve(&query(Some("0"), Some("1000")), DEFAULT_LIST_PAGE_SIZE);
        assert_eq!(req, PageRequest { page: 1, limit: 100 });

        let req = PageRequest::resolve(&query(Some("-3"), Some("-1")), DEFAULT_LIST_PAGE_SIZE);
        assert_eq!(req, PageRequest { page: 1, limit: 10 });

        let req = PageRequest::resolve(&query(Some("abc"), Some("x")), DEFAULT_TASK_PAGE_SIZE);
        assert_eq!(req, PageRequest { page: 1, limit: 20 });
    }

    #[test]
    fn test_page_request_offset() {
        let req = PageRequest::resolve(&query(Some("3"), Some("25")), DEFAULT_TASK_PAGE_SIZE);
        assert_eq!(req.offset(), 50);
    }

    #[test]
    fn test_page_counts() {
        let req = PageRequest { page: 1, limit: 100 };
        assert_eq!(Page::new(vec![(); 100], 150, req).pages, 2);
        assert_eq!(Page::<()>::new(vec![], 0, req).pages, 0);
        assert_eq!(Page::<()>::new(vec![], 100, req).pages, 1);
    }

    #[test]
    fn test_success_envelope_omits_missing_data() {
        let json = serde_json::to_value(ApiResponse::message("Logged out successfully")).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["status"], 200);
        assert!(json.get("data").is_none());

        let json = serde_json::to_value(ApiResponse::created("Created", 7)).unwrap();
        assert_eq!(json["status"], 201);
        assert_eq!(json["data"], 7);
    }
}
