//! Pointer wrappers that carry the shared grid and the strip registry into
//! worker threads.
//!
//! No lock guards either buffer. Access is phase-disciplined by the
//! generation barrier:
//! - compute phase: every worker reads the grid, worker `i` writes strip `i`;
//! - merge phase (barrier action, all workers parked): the leader reads all
//!   strips and writes the grid.

pub(crate) struct SendPtr<T> {
    inner: *mut T,
}
unsafe impl<T: Send> Send for SendPtr<T> {}
unsafe impl<T: Send> Sync for SendPtr<T> {}
impl<T> Copy for SendPtr<T> {}
impl<T> Clone for SendPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> SendPtr<T> {
    #[inline(always)]
    pub(crate) fn new(ptr: *mut T) -> Self {
        Self { inner: ptr }
    }
    #[inline(always)]
    pub(crate) fn get(&self) -> *mut T {
        self.inner
    }
}

/// Strip registry: `len` strips laid out contiguously, slot `i` owned by
/// worker `i` during the compute phase.
pub(crate) struct StripSlots<T> {
    base: SendPtr<T>,
    len: usize,
}
impl<T> Copy for StripSlots<T> {}
impl<T> Clone for StripSlots<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> StripSlots<T> {
    pub(crate) fn new(slots: &mut [T]) -> Self {
        Self {
            base: SendPtr::new(slots.as_mut_ptr()),
            len: slots.len(),
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// # Safety
    /// Caller must be the only accessor of slot `index` for the lifetime of
    /// the returned reference, and the backing slice must still be alive.
    #[inline(always)]
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn slot_mut(&self, index: usize) -> &mut T {
        debug_assert!(index < self.len);
        unsafe { &mut *self.base.get().add(index) }
    }

    /// # Safety
    /// No slot may be mutably borrowed for the lifetime of the returned
    /// slice, and the backing slice must still be alive.
    #[inline(always)]
    pub(crate) unsafe fn all(&self) -> &[T] {
        unsafe { std::slice::from_raw_parts(self.base.get(), self.len) }
    }
}
