//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! The session is the only place the web layer learns who the caller is. It
//! resolves a [`VisitorId`] which handlers then pass explicitly into the
//! booking services.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Error, VisitorId};

pub(crate) const VISITOR_ID_KEY: &str = "visitor_id";

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Remember the visitor for later requests.
    pub fn persist_visitor(&self, visitor_id: VisitorId) -> Result<(), Error> {
        self.0
            .insert(VISITOR_ID_KEY, visitor_id.get())
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Fetch the current visitor id from the session, if present.
    ///
    /// A tampered or non-positive id is treated as no identity.
    pub fn visitor_id(&self) -> Result<Option<VisitorId>, Error> {
        let raw = self
            .0
            .get::<i64>(VISITOR_ID_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?;
        Ok(raw.and_then(|value| match VisitorId::new(value) {
            Ok(id) => Some(id),
            Err(error) => {
                tracing::warn!("invalid visitor id in session cookie: {error}");
                None
            }
        }))
    }

    /// Require a visitor id or return `401 Unauthorized`.
    pub fn require_visitor_id(&self) -> Result<VisitorId, Error> {
        self.visitor_id()?
            .ok_or_else(|| Error::unauthorized("no visitor in session"))
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
