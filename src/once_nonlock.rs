/*!
A write-once cell that never blocks.

The sieve captures its place in the console chain exactly once per lifetime,
no matter how many install/uninstall cycles follow. `OnceNonLock` holds that
capture. Unlike `std::sync::OnceLock` it never waits: while another thread is
initializing, callers get `None` back and carry on, which matters because
capture can run from inside a console call.

States:
- `INITIAL`: nothing captured yet
- `IN_PROGRESS`: a caller is running the initializer
- `DONE`: the value is set and immutable from now on

An initializer returning `None` puts the cell back to `INITIAL` so a later call may retry.
*/

use std::cell::UnsafeCell;
use std::mem::ManuallyDrop;
use std::sync::atomic::{AtomicU8, Ordering};

const ONCE_INITIAL: u8 = 0;
const ONCE_IN_PROGRESS: u8 = 1;
const ONCE_DONE: u8 = 2;

#[derive(Debug)]
pub struct OnceNonLock<T> {
    once: AtomicU8, //the ONCE constants
    value: UnsafeCell<ManuallyDrop<Option<T>>>,
    //explain to Rust we will be dropping this manually
    _marker: std::marker::PhantomData<T>,
}

impl<T> OnceNonLock<T> {
    pub const fn new() -> Self {
        OnceNonLock {
            once: AtomicU8::new(ONCE_INITIAL),
            value: UnsafeCell::new(ManuallyDrop::new(None)),
            _marker: std::marker::PhantomData,
        }
    }

    /// Runs `f` if nothing was captured yet, then returns the captured value.
    ///
    /// Returns `None` while another caller is initializing, or when `f` itself returns `None`.
    pub fn try_get_or_init<F>(&self, f: F) -> Option<&T>
    where
        F: FnOnce() -> Option<T>,
    {
        match self.once.compare_exchange(
            ONCE_INITIAL,
            ONCE_IN_PROGRESS,
            Ordering::AcqRel,
            Ordering::Relaxed,
        ) {
            Ok(_) => {
                let value = f();
                match value {
                    Some(value) => {
                        // SAFETY: IN_PROGRESS gives us exclusive access to the slot
                        unsafe {
                            *self.value.get() = ManuallyDrop::new(Some(value));
                        }
                        self.once.store(ONCE_DONE, Ordering::Release);
                        self.get()
                    }
                    None => {
                        //go back to initial state so a later call may retry
                        self.once.store(ONCE_INITIAL, Ordering::Release);
                        None
                    }
                }
            }
            Err(ONCE_IN_PROGRESS) => None,
            Err(ONCE_DONE) => self.get(),
            Err(other) => panic!("OnceNonLock: try_get_or_init with state {:?}", other),
        }
    }

    /// The captured value, if capture has completed.
    pub fn get(&self) -> Option<&T> {
        match self.once.load(Ordering::Acquire) {
            ONCE_INITIAL | ONCE_IN_PROGRESS => None,
            // SAFETY: DONE is final, the slot is never written again
            ONCE_DONE => unsafe { (*self.value.get()).as_ref() },
            _ => panic!("OnceNonLock: Invalid state on get"),
        }
    }
}

impl<T> Default for OnceNonLock<T> {
    fn default() -> Self {
        OnceNonLock::new()
    }
}

impl<T> Drop for OnceNonLock<T> {
    fn drop(&mut self) {
        match self.once.load(Ordering::Relaxed) {
            ONCE_INITIAL => {}
            ONCE_IN_PROGRESS => panic!("OnceNonLock: Dropping while still in progress"),
            ONCE_DONE => {
                // SAFETY: we own the cell and the slot holds a value
                unsafe {
                    ManuallyDrop::drop(&mut *self.value.get());
                }
            }
            _ => panic!("OnceNonLock: Invalid state on drop"),
        }
    }
}

// SAFETY: the value is only written once, under the IN_PROGRESS state, and
// published with Release ordering before anyone can read it.
unsafe impl<T: Send> Send for OnceNonLock<T> {}
unsafe impl<T: Sync + Send> Sync for OnceNonLock<T> {}
