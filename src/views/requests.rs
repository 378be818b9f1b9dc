use serde::Serialize;

use crate::constants::limits;
use crate::models::{AccountRequest, RequestStatus};

/// A request as shown to admins. The stored hash is never included.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestCard {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub reason: String,
    pub timestamp: String,
    pub accepted_at: Option<String>,
}

impl From<&AccountRequest> for RequestCard {
    fn from(request: &AccountRequest) -> Self {
        Self {
            id: request.id,
            username: request.username.clone(),
            display_name: request.display_name.clone(),
            reason: request.reason.clone(),
            timestamp: request.timestamp.clone(),
            accepted_at: request.accepted_at.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBoard {
    pub pending: Vec<RequestCard>,
    pub recently_accepted: Vec<RequestCard>,
}

/// Pending requests in submission order, plus the last accepted ones.
#[must_use]
pub fn request_board(requests: &[AccountRequest]) -> RequestBoard {
    let pending = requests
        .iter()
        .filter(|r| r.is_pending())
        .map(RequestCard::from)
        .collect();

    let accepted: Vec<&AccountRequest> = requests
        .iter()
        .filter(|r| r.status == RequestStatus::Accepted)
        .collect();
    let skip = accepted
        .len()
        .saturating_sub(limits::RECENTLY_ACCEPTED_REQUESTS);
    let recently_accepted = accepted
        .into_iter()
        .skip(skip)
        .map(RequestCard::from)
        .collect();

    RequestBoard {
        pending,
        recently_accepted,
    }
}
