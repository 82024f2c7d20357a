//! Contract-violation descriptions for factories and handles.
//!
//! Factories and handles have no recoverable failure modes under correct
//! usage. These variants name the ways calling code can break the contract;
//! they are used as panic messages, and `EmptyHandle` is also returned by
//! [`Handle::try_get`](crate::Handle::try_get).

use crate::store::Identity;

#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum FlyweightError {
    /// The handle holds no factory reference (default, taken, or cleared).
    #[error("empty flyweight handle dereferenced")]
    EmptyHandle,

    /// The identity does not name a live record in this factory.
    #[error("unknown identity {0} for this factory")]
    UnknownIdentity(Identity),

    /// A record's reference count was decremented past zero.
    #[error("reference count underflow for identity {0}")]
    RefCountUnderflow(Identity),

    /// The last reference to a record was released while the factory was
    /// mid-probe (from inside a user `Hash`/`Eq`).
    #[error("identity {0} released while its factory was in use")]
    ReentrantRelease(Identity),

    /// A factory was dropped while records were still referenced.
    #[error("factory dropped with {unique} live records ({total} outstanding references)")]
    OutstandingReferences { unique: usize, total: usize },
}
