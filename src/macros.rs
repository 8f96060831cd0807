// Logging shims. With the 'logging' feature disabled these expand to nothing,
// so call sites never need their own cfg attributes.

#[allow(unused_macros)]
macro_rules! trace {
    ($($tt:tt)*) => {
        #[cfg(feature = "logging")]
        {
            log::trace!($($tt)*);
        }
    }
}

#[allow(unused_macros)]
macro_rules! debug {
    ($($tt:tt)*) => {
        #[cfg(feature = "logging")]
        {
            log::debug!($($tt)*);
        }
    }
}
