//! Write-once audit trail of Spine exchanges.
//!
//! Every outbound request and every Spine reply is copied into an
//! [`AuditRecord`] and handed to an [`AuditSink`]. Recording never blocks
//! and never fails the caller; the file sink does its I/O on a background
//! task and only logs problems.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod file;

pub use file::FileAuditSink;

use chrono::{DateTime, Utc};
use std::fmt;

/// Which side of the exchange a record captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Request,
    Response,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Request => f.write_str("Request"),
            Direction::Response => f.write_str("Response"),
        }
    }
}

/// Immutable snapshot of one direction of one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub direction: Direction,
    pub exchange_id: String,
    pub timestamp: DateTime<Utc>,
    pub payload: String,
}

impl AuditRecord {
    pub fn new(direction: Direction, exchange_id: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            direction,
            exchange_id: exchange_id.into(),
            timestamp: Utc::now(),
            payload: payload.into(),
        }
    }

    /// `yyyy-MM-dd-<exchange id>-<Request|Response>.xml`
    pub fn file_name(&self) -> String {
        format!(
            "{}-{}-{}.xml",
            self.timestamp.format("%Y-%m-%d"),
            self.exchange_id,
            self.direction
        )
    }
}

/// Fire-and-forget destination for audit records.
pub trait AuditSink: Send + Sync {
    /// Queue `record` for writing. Must return immediately and must not panic.
    fn record(&self, record: AuditRecord);
}

/// Sink used when auditing is switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _record: AuditRecord) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_file_name_layout() {
        let mut record = AuditRecord::new(Direction::Request, "ex-42", "<a/>");
        record.timestamp = Utc.with_ymd_and_hms(2015, 6, 3, 10, 0, 0).unwrap();
        assert_eq!(record.file_name(), "2015-06-03-ex-42-Request.xml");

        record.direction = Direction::Response;
        assert_eq!(record.file_name(), "2015-06-03-ex-42-Response.xml");
    }

    #[test]
    fn test_same_second_different_exchanges_do_not_collide() {
        let a = AuditRecord::new(Direction::Request, uuid::Uuid::new_v4().to_string(), "");
        let mut b = AuditRecord::new(Direction::Request, uuid::Uuid::new_v4().to_string(), "");
        b.timestamp = a.timestamp;
        assert_ne!(a.file_name(), b.file_name());
    }
}
