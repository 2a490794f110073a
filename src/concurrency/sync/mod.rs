//! Platform blocking primitives.
//!
//! Everything in this crate that needs to sleep waits on a single `AtomicU32`
//! word: futex on Linux, `WaitOnAddress` on Windows, and a spin-yield loop on
//! other targets. Callers must treat a return from `wait_on_u32` as a hint
//! and re-check their predicate in a loop.

pub mod gate;

pub use gate::Gate;

use core::sync::atomic::AtomicU32;
#[cfg(not(any(windows, target_os = "linux")))]
use core::sync::atomic::Ordering;

#[cfg(windows)]
use windows_sys::Win32::System::Threading::{
    WaitOnAddress, WakeByAddressAll, WakeByAddressSingle,
};

#[cfg(target_os = "linux")]
use libc::{SYS_futex, FUTEX_PRIVATE_FLAG, FUTEX_WAIT, FUTEX_WAKE};

#[cfg(target_os = "linux")]
#[inline]
fn futex_wait(addr: *const u32, expected: u32) {
    unsafe {
        libc::syscall(
            SYS_futex,
            addr,
            FUTEX_WAIT | FUTEX_PRIVATE_FLAG,
            expected,
            core::ptr::null::<libc::timespec>(),
        );
    }
}

#[cfg(target_os = "linux")]
#[inline]
fn futex_wake(addr: *const u32, count: i32) {
    unsafe {
        libc::syscall(SYS_futex, addr, FUTEX_WAKE | FUTEX_PRIVATE_FLAG, count);
    }
}

/// Blocks the calling thread while `addr` still holds `expected`.
///
/// Spurious wakeups are allowed on every platform.
#[inline]
pub fn wait_on_u32(addr: &AtomicU32, expected: u32) {
    #[cfg(target_os = "linux")]
    {
        futex_wait(addr.as_ptr(), expected);
    }
    #[cfg(windows)]
    unsafe {
        let expected_ptr = core::ptr::from_ref(&expected).cast();
        let addr_ptr = core::ptr::from_ref(addr).cast_mut().cast();
        WaitOnAddress(addr_ptr, expected_ptr, core::mem::size_of::<u32>(), u32::MAX);
    }
    #[cfg(not(any(windows, target_os = "linux")))]
    while addr.load(Ordering::Acquire) == expected {
        std::thread::yield_now();
    }
}

/// Wakes one thread blocked in [`wait_on_u32`] on the given word.
#[inline]
pub fn wake_one_u32(addr: &AtomicU32) {
    #[cfg(target_os = "linux")]
    futex_wake(addr.as_ptr(), 1);
    #[cfg(windows)]
    unsafe {
        WakeByAddressSingle(core::ptr::from_ref(addr).cast());
    }
    #[cfg(not(any(windows, target_os = "linux")))]
    let _ = addr;
}

/// Wakes every thread blocked in [`wait_on_u32`] on the given word.
#[inline]
pub fn wake_all_u32(addr: &AtomicU32) {
    #[cfg(target_os = "linux")]
    futex_wake(addr.as_ptr(), i32::MAX);
    #[cfg(windows)]
    unsafe {
        WakeByAddressAll(core::ptr::from_ref(addr).cast());
    }
    #[cfg(not(any(windows, target_os = "linux")))]
    let _ = addr;
}
