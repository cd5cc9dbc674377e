//! Blocking waits outside an async runtime
//!
//! Hosted builds park the calling thread until the future's waker fires, so
//! a blocked consumer sleeps until the dispatcher wakes it. Bare-metal builds
//! have no threads to park and use `embassy_futures::block_on`.

#[cfg(any(test, feature = "std"))]
mod park {
    use core::future::Future;
    use core::pin::pin;
    use core::task::{Context, Poll, Waker};
    use std::sync::Arc;
    use std::task::Wake;
    use std::thread::{self, Thread};

    struct ThreadWaker(Thread);

    impl Wake for ThreadWaker {
        fn wake(self: Arc<Self>) {
            self.0.unpark();
        }

        fn wake_by_ref(self: &Arc<Self>) {
            self.0.unpark();
        }
    }

    /// Run `fut` to completion on the current thread
    ///
    /// The thread is parked between polls. A wake that races the park leaves
    /// the park token set, so it is never lost.
    pub fn block_on<F: Future>(fut: F) -> F::Output {
        let mut fut = pin!(fut);
        let waker = Waker::from(Arc::new(ThreadWaker(thread::current())));
        let mut cx = Context::from_waker(&waker);

        loop {
            if let Poll::Ready(output) = fut.as_mut().poll(&mut cx) {
                return output;
            }
            thread::park();
        }
    }
}

#[cfg(any(test, feature = "std"))]
pub use park::block_on;

#[cfg(not(any(test, feature = "std")))]
pub use embassy_futures::block_on;
