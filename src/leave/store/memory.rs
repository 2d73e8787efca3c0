use std::collections::HashMap;
use std::sync::Mutex;

use crate::leave::audit_trail::AuditFilter;
use crate::leave::lifecycle::Transition;
use crate::leave::period::Month;
use crate::leave::store::{
    AuditStore, HourBudgetStore, QuotaStore, RequestFilter, RequestPage, RequestStore,
    StoreError, TeacherDirectory,
};
use crate::model::audit::AuditEntry;
use crate::model::leave_request::{LeaveRequest, NewLeaveRequest, RequestStatus, RequestType};
use crate::model::teacher::Teacher;

/// In-process store used by the service tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    teachers: HashMap<u64, Teacher>,
    requests: Vec<LeaveRequest>,
    audit: Vec<AuditEntry>,
    unavailable: bool,
    interleave: bool,
}

impl MemoryStore {
    pub fn with_teachers(teachers: impl IntoIterator<Item = Teacher>) -> Self {
        let store = Self::default();
        {
            let mut inner = store.inner.lock().unwrap();
            for teacher in teachers {
                inner.teachers.insert(teacher.id, teacher);
            }
        }
        store
    }

    /// Seeds a request as-is, bypassing validation.
    pub fn seed(&self, mut request: LeaveRequest) -> LeaveRequest {
        let mut inner = self.inner.lock().unwrap();
        request.id = inner.requests.len() as u64 + 1;
        inner.requests.push(request.clone());
        request
    }

    /// Forces a request's stored status, as another process would.
    pub fn overwrite_status(&self, request_id: u64, status: RequestStatus) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(r) = inner.requests.iter_mut().find(|r| r.id == request_id) {
            r.status = status;
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().unwrap().unavailable = unavailable;
    }

    /// Makes quota and hour-budget reads yield before returning, so
    /// concurrent callers polled by one task get to run in between.
    pub fn interleave_budget_reads(&self) {
        self.inner.lock().unwrap().interleave = true;
    }

    async fn pause(&self) {
        let interleave = self.inner.lock().unwrap().interleave;
        if interleave {
            actix_web::rt::task::yield_now().await;
        }
    }

    pub fn audit_log(&self) -> Vec<AuditEntry> {
        self.inner.lock().unwrap().audit.clone()
    }

    fn read<T>(&self, f: impl FnOnce(&Inner) -> T) -> Result<T, StoreError> {
        let inner = self.inner.lock().unwrap();
        if inner.unavailable {
            return Err(StoreError::Unavailable("memory store offline".into()));
        }
        Ok(f(&inner))
    }

    fn write<T>(&self, f: impl FnOnce(&mut Inner) -> Result<T, StoreError>) -> Result<T, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.unavailable {
            return Err(StoreError::Unavailable("memory store offline".into()));
        }
        f(&mut inner)
    }
}

impl TeacherDirectory for MemoryStore {
    async fn teacher(&self, teacher_id: u64) -> Result<Option<Teacher>, StoreError> {
        self.read(|inner| inner.teachers.get(&teacher_id).cloned())
    }
}

impl RequestStore for MemoryStore {
    async fn insert_request(&self, request: NewLeaveRequest) -> Result<LeaveRequest, StoreError> {
        self.write(|inner| {
            let stored = LeaveRequest {
                id: inner.requests.len() as u64 + 1,
                teacher_id: request.teacher_id,
                request_type: request.request_type,
                date: request.date,
                hours: request.hours,
                days: request.days,
                reason: request.reason,
                status: RequestStatus::Pending,
                approved_by: None,
                approved_date: None,
                rejection_reason: None,
                created_at: request.created_at,
                updated_at: request.created_at,
            };
            inner.requests.push(stored.clone());
            Ok(stored)
        })
    }

    async fn request(&self, request_id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        self.read(|inner| inner.requests.iter().find(|r| r.id == request_id).cloned())
    }

    async fn list_requests(&self, filter: &RequestFilter) -> Result<RequestPage, StoreError> {
        self.read(|inner| {
            let mut matching: Vec<_> = inner
                .requests
                .iter()
                .filter(|r| filter.matches(r))
                .cloned()
                .collect();
            matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            let total = matching.len() as i64;
            let data = matching
                .into_iter()
                .skip(filter.offset() as usize)
                .take(filter.per_page() as usize)
                .collect();
            RequestPage {
                data,
                page: filter.page(),
                per_page: filter.per_page(),
                total,
            }
        })
    }

    async fn commit_transition(&self, transition: &Transition) -> Result<(), StoreError> {
        self.write(|inner| {
            let stored = inner
                .requests
                .iter_mut()
                .find(|r| r.id == transition.request.id)
                .ok_or(StoreError::Conflict(transition.request.id))?;
            if stored.status != transition.audit.details.previous_status {
                return Err(StoreError::Conflict(stored.id));
            }
            *stored = transition.request.clone();
            inner.audit.push(transition.audit.clone());
            Ok(())
        })
    }
}

impl QuotaStore for MemoryStore {
    async fn approved_absences(
        &self,
        teacher_id: u64,
        month: Month,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        let approved = self.read(|inner| {
            inner
                .requests
                .iter()
                .filter(|r| {
                    r.teacher_id == teacher_id
                        && r.request_type == RequestType::AuthorizedAbsence
                        && r.status == RequestStatus::Approved
                        && month.overlap_days(r.date, r.end_date()) > 0
                })
                .cloned()
                .collect()
        })?;
        self.pause().await;
        Ok(approved)
    }
}

impl HourBudgetStore for MemoryStore {
    async fn approved_partial_day(
        &self,
        teacher_id: u64,
        month: Month,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        let approved = self.read(|inner| {
            inner
                .requests
                .iter()
                .filter(|r| {
                    r.teacher_id == teacher_id
                        && r.request_type.is_partial_day()
                        && r.status == RequestStatus::Approved
                        && month.contains(r.date)
                })
                .cloned()
                .collect()
        })?;
        self.pause().await;
        Ok(approved)
    }
}

impl AuditStore for MemoryStore {
    async fn audit_entries(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>, StoreError> {
        self.read(|inner| {
            let mut entries: Vec<_> = inner
                .audit
                .iter()
                .filter(|e| filter.matches(e))
                .cloned()
                .collect();
            entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            entries
        })
    }
}
