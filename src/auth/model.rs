use crate::user;

/// Authenticated requester identity, attached to the request by the middleware.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Principal(pub user::Id);

impl Principal {
    pub const fn id(&self) -> &user::Id {
        &self.0
    }
}
