//! Helper macros used internally by the codecs.

/// Returns early with an error if a condition is not met.
///
/// ```ignore
/// ensure!(lines <= MAX_HEADER_NUM, ParseError::too_many_headers(MAX_HEADER_NUM));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
