use serde::Serialize;

/// Status of a one-shot content fetch behind a view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "lowercase")]
pub enum RequestStatus<T> {
    #[default]
    Idle,
    Loading,
    Success(T),
    Error(String),
}

impl<T> RequestStatus<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, RequestStatus::Loading)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            RequestStatus::Success(v) => Some(v),
            _ => None,
        }
    }
}

/// Issued by [`RequestSlot::begin`]; only the latest ticket may settle the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

/// One view's request state. Starting a new request invalidates every ticket
/// issued before it, so a slow earlier reply can never overwrite a newer one.
#[derive(Debug, Clone, Default)]
pub struct RequestSlot<T> {
    generation: u64,
    status: RequestStatus<T>,
}

impl<T> RequestSlot<T> {
    pub fn new() -> Self {
        Self {
            generation: 0,
            status: RequestStatus::Idle,
        }
    }

    pub fn status(&self) -> &RequestStatus<T> {
        &self.status
    }

    pub fn begin(&mut self) -> RequestTicket {
        self.generation += 1;
        self.status = RequestStatus::Loading;
        RequestTicket(self.generation)
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        ticket.0 == self.generation
    }

    /// Apply a result. Returns false (and changes nothing) for a stale ticket.
    pub fn resolve(&mut self, ticket: RequestTicket, value: T) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(ticket = ticket.0, current = self.generation, "dropping stale result");
            return false;
        }
        self.status = RequestStatus::Success(value);
        true
    }

    pub fn fail(&mut self, ticket: RequestTicket, message: impl Into<String>) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(ticket = ticket.0, current = self.generation, "dropping stale error");
            return false;
        }
        self.status = RequestStatus::Error(message.into());
        true
    }

    /// Back to idle. Outstanding tickets become stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.status = RequestStatus::Idle;
    }
}
