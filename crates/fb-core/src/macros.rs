/// Return early with a configuration error for `$member`
#[macro_export]
macro_rules! config_bail {
    ($member:expr, $($arg:tt)*) => {
        return Err($crate::error::Error::configuration($member, format!($($arg)*)))
    };
}

/// Ensure a condition holds, or return a configuration error for `$member`
#[macro_export]
macro_rules! config_ensure {
    ($cond:expr, $member:expr, $($arg:tt)*) => {
        if !($cond) {
            $crate::config_bail!($member, $($arg)*);
        }
    };
}

/// Log a debug message
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::tracing::debug!($($arg)*)
    };
}

/// Log an info message
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::tracing::info!($($arg)*)
    };
}
