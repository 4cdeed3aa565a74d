/// Owner and group name resolution.
///
/// The extractor asks an [`IdentityResolver`] for symbolic names and falls
/// back to the numeric id when it gets `None`. Keeping this behind a trait
/// lets the diff and log logic run against a fixed identity table in tests.
use compact_str::CompactString;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::ffi::CStr;
use std::{mem, ptr};

/// Initial scratch buffer for the reentrant `getpw*_r` / `getgr*_r` calls.
const LOOKUP_BUF_LEN: usize = 1024;

/// Upper bound for the scratch buffer when the C library keeps asking for more.
const LOOKUP_BUF_MAX: usize = 1 << 20;

/// Maps numeric ids to names. `None` means "no such entry".
pub trait IdentityResolver: Send + Sync {
    fn user_name(&self, uid: u32) -> Option<CompactString>;
    fn group_name(&self, gid: u32) -> Option<CompactString>;
}

/// Owner name for `uid`, or the id rendered as text.
pub fn owner_or_uid(resolver: &dyn IdentityResolver, uid: u32) -> CompactString {
    resolver
        .user_name(uid)
        .unwrap_or_else(|| CompactString::new(uid.to_string()))
}

/// Group name for `gid`, or the id rendered as text.
pub fn group_or_gid(resolver: &dyn IdentityResolver, gid: u32) -> CompactString {
    resolver
        .group_name(gid)
        .unwrap_or_else(|| CompactString::new(gid.to_string()))
}

/// Resolver backed by the system user and group databases.
///
/// Lookups are cached for the lifetime of the resolver, including misses,
/// since every scan asks about the same handful of ids.
#[derive(Default)]
pub struct SystemIdentityResolver {
    users: Mutex<HashMap<u32, Option<CompactString>>>,
    groups: Mutex<HashMap<u32, Option<CompactString>>>,
}

impl SystemIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityResolver for SystemIdentityResolver {
    fn user_name(&self, uid: u32) -> Option<CompactString> {
        if let Some(cached) = self.users.lock().get(&uid) {
            return cached.clone();
        }
        let name = lookup_user(uid);
        self.users.lock().insert(uid, name.clone());
        name
    }

    fn group_name(&self, gid: u32) -> Option<CompactString> {
        if let Some(cached) = self.groups.lock().get(&gid) {
            return cached.clone();
        }
        let name = lookup_group(gid);
        self.groups.lock().insert(gid, name.clone());
        name
    }
}

/// Resolver with a fixed identity table. Ids not in the table resolve to
/// `None`.
#[derive(Debug, Default, Clone)]
pub struct StaticIdentityResolver {
    users: HashMap<u32, CompactString>,
    groups: HashMap<u32, CompactString>,
}

impl StaticIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, uid: u32, name: &str) -> Self {
        self.users.insert(uid, CompactString::new(name));
        self
    }

    pub fn with_group(mut self, gid: u32, name: &str) -> Self {
        self.groups.insert(gid, CompactString::new(name));
        self
    }
}

impl IdentityResolver for StaticIdentityResolver {
    fn user_name(&self, uid: u32) -> Option<CompactString> {
        self.users.get(&uid).cloned()
    }

    fn group_name(&self, gid: u32) -> Option<CompactString> {
        self.groups.get(&gid).cloned()
    }
}

// ─── libc lookups ───────────────────────────────────────────────────────────

fn lookup_user(uid: u32) -> Option<CompactString> {
    let mut buf = vec![0 as libc::c_char; LOOKUP_BUF_LEN];
    let mut passwd = unsafe { mem::zeroed::<libc::passwd>() };
    let mut result = ptr::null_mut::<libc::passwd>();

    loop {
        // SAFETY: all pointers refer to live, correctly sized buffers owned
        // by this frame.
        let r = unsafe {
            libc::getpwuid_r(
                uid as libc::uid_t,
                &mut passwd,
                buf.as_mut_ptr(),
                buf.len(),
                &mut result,
            )
        };
        if r != libc::ERANGE {
            break;
        }
        let newsize = buf.len().checked_mul(2).filter(|&n| n <= LOOKUP_BUF_MAX)?;
        buf.resize(newsize, 0);
    }

    if result.is_null() || passwd.pw_name.is_null() {
        // No such user, or the lookup itself failed.
        return None;
    }

    // SAFETY: pw_name points into `buf`, which is still alive.
    let name = unsafe { CStr::from_ptr(passwd.pw_name) };
    Some(CompactString::new(name.to_string_lossy()))
}

fn lookup_group(gid: u32) -> Option<CompactString> {
    let mut buf = vec![0 as libc::c_char; LOOKUP_BUF_LEN];
    let mut group = unsafe { mem::zeroed::<libc::group>() };
    let mut result = ptr::null_mut::<libc::group>();

    loop {
        // SAFETY: see `lookup_user`.
        let r = unsafe {
            libc::getgrgid_r(
                gid as libc::gid_t,
                &mut group,
                buf.as_mut_ptr(),
                buf.len(),
                &mut result,
            )
        };
        if r != libc::ERANGE {
            break;
        }
        let newsize = buf.len().checked_mul(2).filter(|&n| n <= LOOKUP_BUF_MAX)?;
        buf.resize(newsize, 0);
    }

    if result.is_null() || group.gr_name.is_null() {
        return None;
    }

    // SAFETY: gr_name points into `buf`, which is still alive.
    let name = unsafe { CStr::from_ptr(group.gr_name) };
    Some(CompactString::new(name.to_string_lossy()))
}
