/// Platform-specific functionality: user/group name lookup and advisory
/// file locking. Unix only.
pub mod identity;
pub mod lock;

pub use identity::{
    group_or_gid, owner_or_uid, IdentityResolver, StaticIdentityResolver, SystemIdentityResolver,
};
pub use lock::{lock_exclusive, FlockGuard};
