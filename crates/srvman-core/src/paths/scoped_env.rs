//! Serialized environment overrides for path tests.

use std::env;
use std::ffi::{OsStr, OsString};
use std::sync::{Mutex, MutexGuard};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Holds the process-wide env lock and puts every touched variable back
/// on drop, newest change first.
pub struct ScopedEnv {
    saved: Vec<(&'static str, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl ScopedEnv {
    pub fn lock() -> Self {
        // A failed assertion in another env test must not wedge the rest
        let lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Self { saved: Vec::new(), _lock: lock }
    }

    #[allow(unsafe_code)]
    pub fn set(mut self, key: &'static str, value: impl AsRef<OsStr>) -> Self {
        self.saved.push((key, env::var_os(key)));
        unsafe { env::set_var(key, value) };
        self
    }

    #[allow(unsafe_code)]
    pub fn remove(mut self, key: &'static str) -> Self {
        self.saved.push((key, env::var_os(key)));
        unsafe { env::remove_var(key) };
        self
    }
}

impl Drop for ScopedEnv {
    #[allow(unsafe_code)]
    fn drop(&mut self) {
        for (key, previous) in self.saved.drain(..).rev() {
            match previous {
                Some(value) => unsafe { env::set_var(key, value) },
                None => unsafe { env::remove_var(key) },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "SRVMAN_SCOPED_ENV_CHECK";

    #[test]
    fn test_drop_unwinds_every_change() {
        {
            let _env = ScopedEnv::lock().set(KEY, "a").set(KEY, "b");
            assert_eq!(env::var(KEY).unwrap(), "b");
        }
        assert!(env::var_os(KEY).is_none());

        {
            let _env = ScopedEnv::lock().set(KEY, "a").remove(KEY);
            assert!(env::var_os(KEY).is_none());
        }
        assert!(env::var_os(KEY).is_none());
    }
}
