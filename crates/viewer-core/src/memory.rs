//! Process memory introspection.
//!
//! Best effort: platforms without a probe report `None`, which callers treat
//! as no pressure.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryUsage {
    pub used_bytes: u64,
    pub limit_bytes: u64,
}

impl MemoryUsage {
    pub fn new(used_bytes: u64, limit_bytes: u64) -> Self {
        Self { used_bytes, limit_bytes }
    }

    /// Used-to-limit ratio; 0 when there is no limit
    pub fn ratio(&self) -> f64 {
        if self.limit_bytes == 0 {
            0.0
        } else {
            self.used_bytes as f64 / self.limit_bytes as f64
        }
    }
}

pub trait MemoryProbe {
    fn usage(&self) -> Option<MemoryUsage>;
}

/// Resident set size against physical RAM.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessMemoryProbe;

impl MemoryProbe for ProcessMemoryProbe {
    fn usage(&self) -> Option<MemoryUsage> {
        Some(MemoryUsage::new(current_rss_bytes()?, physical_ram_bytes()?))
    }
}

/// Probe reporting whatever it was last told. Clones share the reading.
#[derive(Debug, Clone, Default)]
pub struct FixedMemoryProbe {
    used: Arc<AtomicU64>,
    limit: Arc<AtomicU64>,
}

impl FixedMemoryProbe {
    pub fn new(usage: Option<MemoryUsage>) -> Self {
        let probe = Self::default();
        probe.set(usage);
        probe
    }

    /// `None` makes the probe report no introspection.
    pub fn set(&self, usage: Option<MemoryUsage>) {
        let (used, limit) = usage.map(|usage| (usage.used_bytes, usage.limit_bytes)).unwrap_or((0, 0));
        self.used.store(used, Ordering::SeqCst);
        self.limit.store(limit, Ordering::SeqCst);
    }
}

impl MemoryProbe for FixedMemoryProbe {
    fn usage(&self) -> Option<MemoryUsage> {
        let limit = self.limit.load(Ordering::SeqCst);
        if limit == 0 {
            return None;
        }
        Some(MemoryUsage::new(self.used.load(Ordering::SeqCst), limit))
    }
}

#[cfg(target_os = "macos")]
pub fn physical_ram_bytes() -> Option<u64> {
    use std::ffi::CString;
    use std::mem::size_of;
    use std::ptr;

    let key = CString::new("hw.memsize").ok()?;
    let mut value: u64 = 0;
    let mut len = size_of::<u64>();
    let rc = unsafe {
        libc::sysctlbyname(
            key.as_ptr(),
            &mut value as *mut u64 as *mut libc::c_void,
            &mut len,
            ptr::null_mut(),
            0,
        )
    };
    (rc == 0 && len == size_of::<u64>()).then_some(value)
}

#[cfg(target_os = "linux")]
pub fn physical_ram_bytes() -> Option<u64> {
    let mut info = std::mem::MaybeUninit::<libc::sysinfo>::uninit();
    let rc = unsafe { libc::sysinfo(info.as_mut_ptr()) };
    if rc != 0 {
        return None;
    }
    let info = unsafe { info.assume_init() };
    Some((info.totalram as u64).saturating_mul(info.mem_unit as u64))
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
pub fn physical_ram_bytes() -> Option<u64> {
    None
}

#[cfg(target_os = "macos")]
pub fn current_rss_bytes() -> Option<u64> {
    let mut info = libc::mach_task_basic_info {
        virtual_size: 0,
        resident_size: 0,
        resident_size_max: 0,
        user_time: libc::time_value_t { seconds: 0, microseconds: 0 },
        system_time: libc::time_value_t { seconds: 0, microseconds: 0 },
        policy: 0,
        suspend_count: 0,
    };

    let mut count = libc::MACH_TASK_BASIC_INFO_COUNT;
    #[allow(deprecated)]
    let kr = unsafe {
        libc::task_info(
            libc::mach_task_self(),
            libc::MACH_TASK_BASIC_INFO,
            (&mut info as *mut libc::mach_task_basic_info).cast(),
            &mut count,
        )
    };
    (kr == libc::KERN_SUCCESS).then_some(info.resident_size as u64)
}

#[cfg(target_os = "linux")]
pub fn current_rss_bytes() -> Option<u64> {
    let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
    let rss_pages = statm.split_whitespace().nth(1)?.parse::<u64>().ok()?;
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if page_size <= 0 {
        return None;
    }
    Some(rss_pages.saturating_mul(page_size as u64))
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
pub fn current_rss_bytes() -> Option<u64> {
    None
}
